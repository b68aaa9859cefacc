//! Ranking policy
//!
//! Keys, in order of precedence:
//! 1. priority severity (critical first)
//! 2. time-relevant before not time-relevant
//! 3. confidence, highest first
//!
//! Ties keep insertion order. Insertion order is provider-call order (pest,
//! tasks, weather, financial, growth), so the sort must be stable.

use crate::types::{Insight, InsightType};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Total order over insights
pub fn compare(a: &Insight, b: &Insight) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| b.time_relevant.cmp(&a.time_relevant))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}

/// Stable sort by `compare`
pub fn rank(mut insights: Vec<Insight>) -> Vec<Insight> {
    insights.sort_by(compare);
    insights
}

pub fn rank_and_truncate(insights: Vec<Insight>, limit: usize) -> Vec<Insight> {
    let mut ranked = rank(insights);
    ranked.truncate(limit);
    ranked
}

/// Group already-ranked insights by type, keeping their relative order
pub fn group_by_type(insights: Vec<Insight>) -> BTreeMap<InsightType, Vec<Insight>> {
    let mut groups: BTreeMap<InsightType, Vec<Insight>> = BTreeMap::new();
    for insight in insights {
        groups.entry(insight.insight_type).or_default().push(insight);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn insight(id: &str, priority: Priority, time_relevant: bool, confidence: f64) -> Insight {
        Insight::new(id, InsightType::WeatherAdvisory, priority, id, "", confidence).time_relevant(time_relevant)
    }

    fn ids(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_priority_dominates() {
        let ranked = rank(vec![
            insight("low", Priority::Low, true, 1.0),
            insight("critical", Priority::Critical, false, 0.1),
            insight("medium", Priority::Medium, true, 0.9),
            insight("high", Priority::High, false, 0.2),
        ]);
        assert_eq!(ids(&ranked), vec!["critical", "high", "medium", "low"]);
    }

    #[test]
    fn test_time_relevance_then_confidence() {
        let ranked = rank(vec![
            insight("a", Priority::High, false, 0.99),
            insight("b", Priority::High, true, 0.60),
            insight("c", Priority::High, true, 0.80),
        ]);
        assert_eq!(ids(&ranked), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_full_ties_keep_insertion_order() {
        let ranked = rank(vec![
            insight("first", Priority::Medium, true, 0.5),
            insight("second", Priority::Medium, true, 0.5),
            insight("third", Priority::Medium, true, 0.5),
        ]);
        assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_truncate_keeps_both_criticals_in_call_order() {
        let ranked = rank_and_truncate(
            vec![
                insight("1-low", Priority::Low, false, 0.5),
                insight("2-critical", Priority::Critical, false, 0.5),
                insight("3-high", Priority::High, false, 0.5),
                insight("4-critical", Priority::Critical, false, 0.5),
                insight("5-medium", Priority::Medium, false, 0.5),
            ],
            2,
        );
        assert_eq!(ids(&ranked), vec!["2-critical", "4-critical"]);
    }

    #[test]
    fn test_truncate_to_zero_and_beyond_length() {
        let input = vec![insight("a", Priority::Low, false, 0.5)];
        assert!(rank_and_truncate(input.clone(), 0).is_empty());
        assert_eq!(rank_and_truncate(input, 10).len(), 1);
    }

    #[test]
    fn test_adjacent_pairs_satisfy_ordering() {
        let priorities = [Priority::Low, Priority::High, Priority::Critical, Priority::Medium];
        let input: Vec<Insight> = (0..24)
            .map(|n| {
                insight(
                    &format!("i{}", n),
                    priorities[n % 4],
                    n % 3 == 0,
                    (n % 7) as f64 / 7.0,
                )
            })
            .collect();

        let ranked = rank(input);
        for pair in ranked.windows(2) {
            assert_ne!(compare(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_group_by_type_preserves_order() {
        let pest = |id: &str| Insight::new(id, InsightType::PestAlert, Priority::High, id, "", 0.5);
        let groups = group_by_type(vec![
            pest("p1"),
            insight("w1", Priority::High, false, 0.5),
            pest("p2"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[&InsightType::PestAlert]), vec!["p1", "p2"]);
        assert_eq!(ids(&groups[&InsightType::WeatherAdvisory]), vec!["w1"]);
    }
}
