//! Insight normalizer
//!
//! Pure mapping from provider-native records to `Insight`. Formatting rules
//! (title casing, subtitle truncation) are deterministic and locale-independent.
//! Confidence inputs are percentage-aware and clamped, never rejected.

use crate::analyzers::{Analysis, FinancialAnalysis, GrowthAnalysis, Trend, WeatherAnalysis};
use crate::providers::{PestPrediction, TaskRecommendation};
use crate::types::{
    clamp_confidence, normalize_confidence, ActionType, Confidence, Insight, InsightSource,
    InsightType, Priority, TaskKind,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;

/// Character budget for subtitles built from free text
pub const SUBTITLE_MAX_CHARS: usize = 60;

/// Task priority score at or above which a task is `high`
pub const HIGH_TASK_PRIORITY: f64 = 0.9;

const ELLIPSIS: &str = "...";

/// Which tier produced an analysis and how far to trust it
#[derive(Debug, Clone, Copy)]
pub struct Provenance {
    pub source: InsightSource,
    pub confidence: Confidence,
    pub now: DateTime<Utc>,
}

impl Provenance {
    fn tag(&self) -> Option<&'static str> {
        match self.source {
            InsightSource::Direct => None,
            InsightSource::Enhanced => Some("enhanced"),
            InsightSource::Basic => Some("fallback"),
        }
    }

    fn apply(&self, insight: Insight) -> Insight {
        let insight = insight.with_source(self.source);
        match self.tag() {
            Some(tag) => insight.with_tags([tag]),
            None => insight,
        }
    }
}

// ============================================================================
// Formatting rules
// ============================================================================

/// `powdery_mildew` → `Powdery Mildew`
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

fn onset_phrase(days: i64) -> String {
    match days {
        0 => "onset today".to_string(),
        1 => "onset in 1 day".to_string(),
        d if d > 1 => format!("onset in {} days", d),
        -1 => "onset 1 day ago".to_string(),
        d => format!("onset {} days ago", -d),
    }
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

fn percent(variance: f64) -> i64 {
    (variance.abs() * 100.0).round() as i64
}

// ============================================================================
// Direct feeds
// ============================================================================

/// Pest prediction → insight; `None` when the risk label is not recognized
///
/// Time-relevant when onset is within `onset_window_days`; expires
/// `onset_window_days` after onset, or never when that date is out of range.
pub fn pest_insight(
    prediction: &PestPrediction,
    today: NaiveDate,
    onset_window_days: i64,
) -> Option<Insight> {
    let priority = Priority::parse(&prediction.risk_level)?;
    let days_until_onset = (prediction.predicted_onset_date - today).num_days();
    let pest_name = title_case(&prediction.pest_type);

    let insight = Insight::new(
        format!("pest-{}", prediction.id),
        InsightType::PestAlert,
        priority,
        format!("{} Risk", pest_name),
        format!(
            "{} risk, {}",
            title_case(priority.as_str()),
            onset_phrase(days_until_onset)
        ),
        normalize_confidence(prediction.probability_score),
    )
    .with_description(format!(
        "{} predicted for {}. Review the pest management plan and prepare treatment.",
        pest_name, prediction.predicted_onset_date
    ))
    .with_action(
        ActionType::Navigate,
        "View Pest Plan",
        json!({ "route": "/pest-management", "predictionId": prediction.id }),
    )
    .time_relevant(days_until_onset <= onset_window_days)
    .expires_at(
        Duration::try_days(onset_window_days)
            .and_then(|window| prediction.predicted_onset_date.checked_add_signed(window))
            .and_then(start_of_day),
    )
    .with_tags(["pest".to_string(), priority.as_str().to_string(), prediction.pest_type.clone()])
    .with_data(json!({
        "pestType": prediction.pest_type,
        "riskLevel": prediction.risk_level,
        "daysUntilOnset": days_until_onset,
        "predictedOnsetDate": prediction.predicted_onset_date,
    }));

    Some(insight)
}

/// Task recommendation → insight
pub fn task_insight(recommendation: &TaskRecommendation) -> Insight {
    let kind = TaskKind::parse(&recommendation.task_type);
    let display = kind.display();
    let priority = if normalize_confidence(recommendation.priority_score) >= HIGH_TASK_PRIORITY {
        Priority::High
    } else {
        Priority::Medium
    };

    let subtitle = if recommendation.reasoning.trim().is_empty() {
        title_case(&recommendation.task_type)
    } else {
        truncate_with_ellipsis(&recommendation.reasoning, SUBTITLE_MAX_CHARS)
    };

    let mut insight = Insight::new(
        format!("task-{}", recommendation.id),
        InsightType::TaskRecommendation,
        priority,
        display.title,
        subtitle,
        normalize_confidence(recommendation.confidence_score),
    )
    .with_icon(display.icon)
    .with_action(
        ActionType::Execute,
        "Schedule Task",
        json!({ "recommendationId": recommendation.id, "taskType": recommendation.task_type }),
    )
    .time_relevant(recommendation.weather_dependent)
    .expires_at(recommendation.expires_at)
    .with_tags(["task".to_string(), recommendation.task_type.to_ascii_lowercase()])
    .with_data(json!({
        "priorityScore": recommendation.priority_score,
        "weatherDependent": recommendation.weather_dependent,
    }));

    if !recommendation.reasoning.trim().is_empty() {
        insight = insight.with_description(recommendation.reasoning.trim());
    }
    if recommendation.weather_dependent {
        insight = insight.with_tags(["weather_dependent"]);
    }

    insight
}

// ============================================================================
// Two-tier analyses
// ============================================================================

impl Analysis for WeatherAnalysis {
    fn confidence(&self) -> Confidence {
        self.confidence
    }

    fn to_insights(&self, provenance: &Provenance) -> Vec<Insight> {
        let expires = provenance.now.checked_add_signed(Duration::hours(24));

        self.advisories
            .iter()
            .enumerate()
            .map(|(i, advisory)| {
                let subtitle = if advisory.description.trim().is_empty() {
                    "Current conditions".to_string()
                } else {
                    truncate_with_ellipsis(&advisory.description, SUBTITLE_MAX_CHARS)
                };
                let mut insight = Insight::new(
                    format!("weather-{}", i + 1),
                    InsightType::WeatherAdvisory,
                    advisory.priority,
                    advisory.title.trim(),
                    subtitle,
                    clamp_confidence(provenance.confidence),
                )
                .with_action(ActionType::View, "View Forecast", json!({ "route": "/weather" }))
                .time_relevant(advisory.time_relevant)
                .expires_at(expires)
                .with_tags(["weather"]);

                if !advisory.description.trim().is_empty() {
                    insight = insight.with_description(advisory.description.trim());
                }
                if let Some(category) = &advisory.category {
                    insight = insight.with_tags([category.clone()]);
                }
                provenance.apply(insight)
            })
            .collect()
    }
}

impl Analysis for FinancialAnalysis {
    fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Stable spending with no risk factors yields nothing
    fn to_insights(&self, provenance: &Provenance) -> Vec<Insight> {
        if self.trend == Trend::Stable && self.risk_factors.is_empty() {
            return Vec::new();
        }

        let priority = if self.variance >= 0.5 || self.risk_factors.len() >= 2 {
            Priority::High
        } else if self.variance >= 0.15 || self.risk_factors.len() == 1 {
            Priority::Medium
        } else {
            Priority::Low
        };

        let title = match self.trend {
            Trend::Increasing => format!("Expenses Up {}%", percent(self.variance)),
            Trend::Decreasing => format!("Expenses Down {}%", percent(self.variance)),
            Trend::Stable => "Spending Risk Detected".to_string(),
        };

        let subtitle = match &self.top_category {
            Some(category) => format!("Driven mostly by {}", category),
            None => format!(
                "Last {} days vs previous {} days",
                self.window_days, self.window_days
            ),
        };

        let mut insight = Insight::new(
            "financial-1",
            InsightType::FinancialInsight,
            priority,
            title,
            subtitle,
            clamp_confidence(provenance.confidence),
        )
        .with_action(ActionType::Navigate, "Review Expenses", json!({ "route": "/expenses" }))
        .with_tags(["finance".to_string(), format!("{:?}", self.trend).to_ascii_lowercase()])
        .with_data(json!({
            "trend": self.trend,
            "variance": self.variance,
            "windowDays": self.window_days,
            "riskFactors": self.risk_factors,
            "recommendations": self.recommendations,
        }));

        if !self.recommendations.is_empty() {
            insight = insight.with_description(self.recommendations.join(" "));
        }

        vec![provenance.apply(insight)]
    }
}

impl Analysis for GrowthAnalysis {
    fn confidence(&self) -> Confidence {
        self.confidence
    }

    fn to_insights(&self, provenance: &Provenance) -> Vec<Insight> {
        let flowering = self.is_flowering();
        let priority = if flowering { Priority::Medium } else { Priority::Low };

        let subtitle = self
            .recommendations
            .first()
            .map(|r| truncate_with_ellipsis(r, SUBTITLE_MAX_CHARS))
            .unwrap_or_else(|| "Stage-specific guidance".to_string());

        let mut insight = Insight::new(
            "growth-1",
            InsightType::GrowthOptimization,
            priority,
            format!("{} Stage", title_case(&self.stage)),
            subtitle,
            clamp_confidence(provenance.confidence),
        )
        .with_action(
            ActionType::View,
            "View Growth Guide",
            json!({ "route": "/growth", "stage": self.stage }),
        )
        .time_relevant(flowering)
        .with_tags(["growth".to_string(), self.stage.clone()])
        .with_data(json!({
            "stage": self.stage,
            "recommendations": self.recommendations,
        }));

        if !self.recommendations.is_empty() {
            insight = insight.with_description(self.recommendations.join("; "));
        }

        vec![provenance.apply(insight)]
    }
}
