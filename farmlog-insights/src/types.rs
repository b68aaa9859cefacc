//! Core insight types
//!
//! The unified `Insight` record produced by every signal source, the closed
//! enumerations it is built from, and the pure display tables used when
//! normalizing provider payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Confidence score (0.0-1.0)
pub type Confidence = f64;

/// Clamp a confidence into `[0.0, 1.0]`; NaN maps to 0.0
pub fn clamp_confidence(value: f64) -> Confidence {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Raw confidences above this are percentages
const PERCENT_CUTOFF: f64 = 1.5;

/// Normalize a provider confidence that may be a fraction or a percentage
///
/// Values above `PERCENT_CUTOFF` are read as percentages and divided by 100;
/// anything else is clamped as a fraction, so 1.05 becomes 1.0.
pub fn normalize_confidence(raw: f64) -> Confidence {
    if raw > PERCENT_CUTOFF {
        clamp_confidence(raw / 100.0)
    } else {
        clamp_confidence(raw)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Insight category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    PestAlert,
    TaskRecommendation,
    WeatherAdvisory,
    FinancialInsight,
    GrowthOptimization,
    MarketIntelligence,
}

impl InsightType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PestAlert => "pest_alert",
            Self::TaskRecommendation => "task_recommendation",
            Self::WeatherAdvisory => "weather_advisory",
            Self::FinancialInsight => "financial_insight",
            Self::GrowthOptimization => "growth_optimization",
            Self::MarketIntelligence => "market_intelligence",
        }
    }

    /// Default display icon
    pub fn icon(self) -> &'static str {
        match self {
            Self::PestAlert => "bug",
            Self::TaskRecommendation => "clipboard-check",
            Self::WeatherAdvisory => "cloud-sun",
            Self::FinancialInsight => "chart-line",
            Self::GrowthOptimization => "seedling",
            Self::MarketIntelligence => "store",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insight priority, critical highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Severity rank, lower is more severe
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Parse a provider risk/priority label (case-insensitive)
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Action class declared by an insight
///
/// Unrecognized action strings deserialize to `Unknown` so the dispatcher can
/// reject them instead of failing the whole request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Navigate,
    Execute,
    View,
    #[serde(other)]
    Unknown,
}

/// Which tier produced an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    /// Scored provider feed, no enhancement tier
    Direct,
    /// Inference-backed analyzer
    Enhanced,
    /// Rule-based fallback analyzer
    Basic,
}

// ============================================================================
// Insight
// ============================================================================

/// Unified insight record
///
/// Ephemeral: built fresh for every aggregation call, never persisted or mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Unique within one aggregation call
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub priority: Priority,
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub icon: String,
    pub action_label: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_data: serde_json::Value,
    /// Always within `[0.0, 1.0]`
    pub confidence: Confidence,
    pub time_relevant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    pub source: InsightSource,
}

impl Insight {
    /// Create an insight with type defaults for icon and a `view` action
    ///
    /// The confidence is clamped into `[0.0, 1.0]`.
    pub fn new(
        id: impl Into<String>,
        insight_type: InsightType,
        priority: Priority,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            insight_type,
            priority,
            title: title.into(),
            subtitle: subtitle.into(),
            description: None,
            icon: insight_type.icon().to_string(),
            action_label: "View Details".to_string(),
            action_type: ActionType::View,
            action_data: serde_json::Value::Null,
            confidence: clamp_confidence(confidence),
            time_relevant: false,
            expires_at: None,
            tags: BTreeSet::new(),
            data: serde_json::Value::Null,
            source: InsightSource::Direct,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_action(
        mut self,
        action_type: ActionType,
        label: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        self.action_type = action_type;
        self.action_label = label.into();
        self.action_data = data;
        self
    }

    pub fn time_relevant(mut self, time_relevant: bool) -> Self {
        self.time_relevant = time_relevant;
        self
    }

    pub fn expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_source(mut self, source: InsightSource) -> Self {
        self.source = source;
        self
    }

    /// True when `expires_at` is set and strictly before `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}

/// Result of dispatching an insight action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// ============================================================================
// Task display table
// ============================================================================

/// Recommended task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Irrigation,
    Spray,
    Fertigation,
    Harvest,
    Pruning,
    Scouting,
    Weeding,
    Other,
}

/// Display strings for a task category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDisplay {
    pub title: &'static str,
    pub icon: &'static str,
}

impl TaskKind {
    pub fn parse(task_type: &str) -> Self {
        match task_type.trim().to_ascii_lowercase().as_str() {
            "irrigation" | "irrigate" => Self::Irrigation,
            "spray" | "spraying" => Self::Spray,
            "fertigation" | "fertilize" | "fertilization" => Self::Fertigation,
            "harvest" | "harvesting" => Self::Harvest,
            "pruning" | "prune" => Self::Pruning,
            "scouting" | "inspection" => Self::Scouting,
            "weeding" => Self::Weeding,
            _ => Self::Other,
        }
    }

    pub fn display(self) -> TaskDisplay {
        match self {
            Self::Irrigation => TaskDisplay { title: "Irrigation Due", icon: "droplet" },
            Self::Spray => TaskDisplay { title: "Spray Application", icon: "spray-can" },
            Self::Fertigation => TaskDisplay { title: "Fertigation Scheduled", icon: "flask" },
            Self::Harvest => TaskDisplay { title: "Harvest Window", icon: "basket" },
            Self::Pruning => TaskDisplay { title: "Pruning Recommended", icon: "scissors" },
            Self::Scouting => TaskDisplay { title: "Field Scouting", icon: "search" },
            Self::Weeding => TaskDisplay { title: "Weed Control", icon: "leaf" },
            Self::Other => TaskDisplay { title: "Farm Task", icon: "clipboard" },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
    }

    #[test]
    fn test_normalize_confidence_percentages() {
        assert!((normalize_confidence(85.0) - 0.85).abs() < 1e-9);
        assert_eq!(normalize_confidence(0.85), 0.85);
        assert_eq!(normalize_confidence(250.0), 1.0);
        assert_eq!(normalize_confidence(-3.0), 0.0);
    }

    #[test]
    fn test_slightly_over_one_is_clamped_not_scaled() {
        assert_eq!(normalize_confidence(1.05), 1.0);
        assert_eq!(normalize_confidence(1.5), 1.0);
        assert!((normalize_confidence(1.6) - 0.016).abs() < 1e-9);
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Critical.rank() < Priority::High.rank());
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
        assert_eq!(Priority::parse(" HIGH "), Some(Priority::High));
        assert_eq!(Priority::parse("severe"), None);
    }

    #[test]
    fn test_unknown_action_type_deserializes() {
        let action: ActionType = serde_json::from_str("\"teleport\"").unwrap();
        assert_eq!(action, ActionType::Unknown);
        let action: ActionType = serde_json::from_str("\"navigate\"").unwrap();
        assert_eq!(action, ActionType::Navigate);
    }

    #[test]
    fn test_insight_serializes_camel_case() {
        let insight = Insight::new("w-1", InsightType::WeatherAdvisory, Priority::High, "Heat", "Hot", 0.8)
            .time_relevant(true)
            .with_tags(["weather"]);
        let json = serde_json::to_value(&insight).unwrap();

        assert_eq!(json["type"], "weather_advisory");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["timeRelevant"], true);
        assert_eq!(json["actionType"], "view");
        assert_eq!(json["icon"], "cloud-sun");
        assert!(json.get("expiresAt").is_none());
    }

    #[test]
    fn test_insight_new_clamps_confidence() {
        let insight = Insight::new("x", InsightType::PestAlert, Priority::Low, "t", "s", 3.0);
        assert_eq!(insight.confidence, 1.0);
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let base = Insight::new("x", InsightType::PestAlert, Priority::Low, "t", "s", 0.5);
        assert!(!base.clone().is_expired(now));
        assert!(base.clone().expires_at(Some(now - Duration::hours(1))).is_expired(now));
        assert!(!base.expires_at(Some(now + Duration::hours(1))).is_expired(now));
    }

    #[test]
    fn test_task_display_table() {
        assert_eq!(TaskKind::parse("IRRIGATION").display().title, "Irrigation Due");
        assert_eq!(TaskKind::parse("prune"), TaskKind::Pruning);
        assert_eq!(TaskKind::parse("mystery").display().icon, "clipboard");
    }
}
