//! Recommendation types: Priority, Recommendation, ResolvedTargets,
//! RecommendationSet, SetpointSuggestion

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// A single operator-facing action item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    /// Human-readable evidence, always embeds the measured value and the threshold
    pub rationale: String,
    /// Ordered operator instructions
    pub actions: Vec<String>,
    pub priority: Priority,
    #[serde(default)]
    pub estimated_benefit: Option<String>,
}

impl Recommendation {
    pub fn new<I, S>(title: &str, rationale: String, actions: I, priority: Priority) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.to_string(),
            rationale,
            actions: actions.into_iter().map(Into::into).collect(),
            priority,
            estimated_benefit: None,
        }
    }

    #[must_use]
    pub fn with_benefit(mut self, benefit: &str) -> Self {
        self.estimated_benefit = Some(benefit.to_string());
        self
    }
}

/// Target values resolved for a given bird age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTargets {
    pub temp_c_target: f64,
    /// `[low, high]` comfort band (%)
    pub humidity_pct_range: [f64; 2],
    pub co2_ppm_max: f64,
    pub nh3_ppm_max: f64,
    pub light_lux_target: f64,
}

impl ResolvedTargets {
    pub fn humidity_low(&self) -> f64 {
        self.humidity_pct_range[0]
    }

    pub fn humidity_high(&self) -> f64 {
        self.humidity_pct_range[1]
    }
}

/// Ordered recommendations for one house at one bird age.
///
/// `targets` is `None` when the house had no recent samples; it serializes as
/// an empty JSON object in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub house_id: String,
    pub bird_age_days: u32,
    pub recommendations: Vec<Recommendation>,
    #[serde(
        serialize_with = "serialize_targets",
        deserialize_with = "deserialize_targets",
        default
    )]
    pub targets: Option<ResolvedTargets>,
}

impl RecommendationSet {
    /// Well-formed result for a house with no recent telemetry.
    pub fn empty(house_id: &str, bird_age_days: u32) -> Self {
        Self {
            house_id: house_id.to_string(),
            bird_age_days,
            recommendations: Vec::new(),
            targets: None,
        }
    }

    pub fn titles(&self) -> Vec<&str> {
        self.recommendations.iter().map(|r| r.title.as_str()).collect()
    }
}

fn serialize_targets<S>(targets: &Option<ResolvedTargets>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeMap;
    match targets {
        Some(t) => t.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

fn deserialize_targets<'de, D>(deserializer: D) -> Result<Option<ResolvedTargets>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Empty {}

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Resolved(ResolvedTargets),
        Empty(Empty),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Resolved(t) => Some(t),
        Repr::Empty(_) => None,
    })
}

/// Controller setpoint hints derived from the recent window.
///
/// Absent fields mean the corresponding input (window mean or target) was
/// not available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SetpointSuggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heater_setpoint_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ventilation_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_vent_timer_sec_per_5min: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_serializes_lowercase() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"high\"");
        let parsed: Priority = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Priority::Medium);
    }

    #[test]
    fn test_empty_set_serializes_empty_targets_object() {
        let set = RecommendationSet::empty("H9", 12);
        let v = serde_json::to_value(&set).unwrap();
        assert_eq!(v["targets"], serde_json::json!({}));
        assert_eq!(v["recommendations"], serde_json::json!([]));

        let back: RecommendationSet = serde_json::from_value(v).unwrap();
        assert!(back.targets.is_none());
    }

    #[test]
    fn test_resolved_targets_field_names() {
        let set = RecommendationSet {
            house_id: "H1".to_string(),
            bird_age_days: 7,
            recommendations: vec![],
            targets: Some(ResolvedTargets {
                temp_c_target: 29.0,
                humidity_pct_range: [50.0, 70.0],
                co2_ppm_max: 3000.0,
                nh3_ppm_max: 25.0,
                light_lux_target: 20.0,
            }),
        };
        let v = serde_json::to_value(&set).unwrap();
        assert_eq!(v["targets"]["temp_c_target"], 29.0);
        assert_eq!(v["targets"]["humidity_pct_range"][1], 70.0);
        assert_eq!(v["targets"]["light_lux_target"], 20.0);
    }

    #[test]
    fn test_setpoint_suggestion_omits_missing_fields() {
        let s = SetpointSuggestion {
            heater_setpoint_c: Some(29.0),
            ..Default::default()
        };
        let v = serde_json::to_value(s).unwrap();
        assert!(v.get("heater_setpoint_c").is_some());
        assert!(v.get("ventilation_percent").is_none());
    }
}
