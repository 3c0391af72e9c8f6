//! Admin dashboard view

use serde::Serialize;

use crate::dataset::{AccessLog, Announcement, Dataset, Decision, DecisionStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicianSummary {
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub field: Option<String>,
    pub matches: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Matches with no decision yet, or an explicit `waiting`
    pub waiting: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardTotals {
    pub academicians: usize,
    pub projects: usize,
    pub matches: usize,
    pub decisions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub totals: DashboardTotals,
    pub academicians: Vec<AcademicianSummary>,
    pub feedback: Vec<Decision>,
    /// Newest first
    pub logs: Vec<AccessLog>,
    pub announcements: Vec<Announcement>,
}

/// Snapshot of the whole portal for the admin screen. At most `log_limit`
/// access log entries are included.
pub fn build_dashboard(dataset: &Dataset, log_limit: usize) -> Dashboard {
    let counts = dataset.counts();

    let academicians = dataset
        .academicians()
        .map(|(_, academician)| {
            let key = academician.name_key();
            let mut summary = AcademicianSummary {
                name: academician.fullname.clone(),
                email: academician.email.clone(),
                title: academician.title.clone(),
                field: academician.field.clone(),
                matches: 0,
                accepted: 0,
                rejected: 0,
                waiting: 0,
            };
            for row in dataset.matches_for(&key) {
                summary.matches += 1;
                match dataset.decision_for(&key, &row.project_id).map(|d| d.decision) {
                    Some(DecisionStatus::Accepted) => summary.accepted += 1,
                    Some(DecisionStatus::Rejected) => summary.rejected += 1,
                    Some(DecisionStatus::Waiting) | None => summary.waiting += 1,
                }
            }
            summary
        })
        .collect();

    Dashboard {
        totals: DashboardTotals {
            academicians: counts.academicians,
            projects: counts.projects,
            matches: counts.matches,
            decisions: counts.decisions,
        },
        academicians,
        feedback: dataset.decisions().to_vec(),
        logs: dataset
            .access_logs()
            .iter()
            .rev()
            .take(log_limit)
            .cloned()
            .collect(),
        announcements: dataset.announcements().to_vec(),
    }
}
