//! Top-projects ranking
//!
//! Projects ordered by how many academicians the match list suggested them
//! to.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::dataset::{display_title, Dataset};
use crate::profile::{MISSING_FIELD, MISSING_URL};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProject {
    pub id: String,
    pub count: usize,
    pub title: String,
    pub budget: String,
    pub status: String,
    pub url: String,
}

/// The `limit` most-matched projects.
///
/// Equal counts are ordered by project id ascending, numerically when
/// both ids are integers.
pub fn top_projects(dataset: &Dataset, limit: usize) -> Vec<TopProject> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in dataset.matches() {
        *counts.entry(row.project_id.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a_id, a_count), (b_id, b_count)| {
        b_count.cmp(a_count).then_with(|| compare_ids(a_id, b_id))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(id, count)| {
            let project = dataset.project(id);
            TopProject {
                id: id.to_string(),
                count,
                title: display_title(project, id),
                budget: project
                    .and_then(|p| p.overall_budget.clone())
                    .unwrap_or_else(|| MISSING_FIELD.to_string()),
                status: project
                    .and_then(|p| p.status.clone())
                    .unwrap_or_else(|| MISSING_FIELD.to_string()),
                url: project
                    .and_then(|p| p.url.clone())
                    .unwrap_or_else(|| MISSING_URL.to_string()),
            }
        })
        .collect()
}

/// Numeric-aware project id order.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample;
    use crate::dataset::{RawSources, SourceKind};
    use serde_json::{json, Value};

    fn matches_with(counts: &[(&str, usize)]) -> Dataset {
        let rows: Vec<Value> = counts
            .iter()
            .flat_map(|(id, n)| {
                (0..*n).map(move |i| json!({"data": format!("Person {}", i), "Column3": id}))
            })
            .collect();
        Dataset::build(RawSources::new().with(SourceKind::Matches, Value::Array(rows)))
    }

    fn ids(ranked: &[TopProject]) -> Vec<&str> {
        ranked.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn orders_by_count_descending() {
        let dataset = matches_with(&[("p1", 5), ("p2", 9), ("p3", 2)]);
        let ranked = top_projects(&dataset, 50);
        assert_eq!(ids(&ranked), vec!["p2", "p1", "p3"]);
        assert_eq!(ranked[0].count, 9);
    }

    #[test]
    fn ties_break_on_numeric_id() {
        let dataset = matches_with(&[("20", 2), ("3", 2), ("100", 2), ("7", 4)]);
        assert_eq!(ids(&top_projects(&dataset, 50)), vec!["7", "3", "20", "100"]);
    }

    #[test]
    fn limit_is_applied_after_sorting() {
        let dataset = matches_with(&[("a", 1), ("b", 3), ("c", 2)]);
        assert_eq!(ids(&top_projects(&dataset, 2)), vec!["b", "c"]);
        assert!(top_projects(&dataset, 0).is_empty());
    }

    #[test]
    fn entries_are_enriched_with_fallbacks() {
        let ranked = top_projects(&sample(), 50);
        assert_eq!(ids(&ranked), vec!["101", "102", "103", "999"]);
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[0].title, "Green Hydrogen");
        assert_eq!(ranked[0].budget, "2500000");
        assert_eq!(ranked[1].title, "EUPROJ");
        assert_eq!(ranked[1].status, "CLOSED");
        assert_eq!(ranked[2].title, "Proje-103");
        assert_eq!(ranked[3].url, "#");
        assert_eq!(ranked[3].budget, "-");
    }

    #[test]
    fn compare_ids_falls_back_to_text() {
        assert_eq!(compare_ids("9", "10"), Ordering::Less);
        assert_eq!(compare_ids("a", "10"), Ordering::Greater);
        assert_eq!(compare_ids("007", "7"), Ordering::Less);
    }
}
