//! Reconciled in-memory dataset
//!
//! Builds consistent tables out of independently exported JSON files:
//! academicians by email, projects by id, the match list, and the
//! decision list, plus the smaller portal tables (announcements,
//! messages, access logs, passwords, web image metadata).
//!
//! Building never fails. A source that is missing or malformed becomes an
//! empty table and is recorded in the [`LoadReport`].

pub mod models;
pub mod sources;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

use crate::normalize::normalize_name;
pub use models::{
    display_title, email_key, AccessLog, Academician, AcademicianId, Announcement, Decision,
    DecisionStatus, MatchRow, Message, Project, WebImage,
};

/// The JSON documents the dataset is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Academicians,
    Projects,
    Matches,
    Decisions,
    AccessLogs,
    Announcements,
    Messages,
    Passwords,
    WebData,
}

impl SourceKind {
    pub const ALL: [SourceKind; 9] = [
        SourceKind::Academicians,
        SourceKind::Projects,
        SourceKind::Matches,
        SourceKind::Decisions,
        SourceKind::AccessLogs,
        SourceKind::Announcements,
        SourceKind::Messages,
        SourceKind::Passwords,
        SourceKind::WebData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Academicians => "academicians",
            SourceKind::Projects => "projects",
            SourceKind::Matches => "matches",
            SourceKind::Decisions => "decisions",
            SourceKind::AccessLogs => "access_logs",
            SourceKind::Announcements => "announcements",
            SourceKind::Messages => "messages",
            SourceKind::Passwords => "passwords",
            SourceKind::WebData => "web_data",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How reading one source went.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded { records: usize },
    Missing,
    Unreadable { error: String },
    Malformed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceOutcome {
    pub source: SourceKind,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Per-source outcome of the last build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub sources: Vec<SourceOutcome>,
}

impl LoadReport {
    pub fn record(&mut self, source: SourceKind, status: SourceStatus) {
        self.sources.retain(|o| o.source != source);
        self.sources.push(SourceOutcome { source, status });
    }

    pub fn status_of(&self, source: SourceKind) -> Option<&SourceStatus> {
        self.sources
            .iter()
            .find(|o| o.source == source)
            .map(|o| &o.status)
    }

    /// Sources that could not be read.
    pub fn degraded(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources
            .iter()
            .filter(|o| !matches!(o.status, SourceStatus::Loaded { .. }))
    }
}

/// Parsed (but not yet reconciled) payloads, one per source.
///
/// `None` means the source could not be read; the reason belongs in the
/// accompanying [`LoadReport`].
#[derive(Debug, Default)]
pub struct RawSources {
    pub payloads: HashMap<SourceKind, Value>,
    pub report: LoadReport,
    /// File names found in the photo folder
    pub photo_files: Vec<String>,
}

impl RawSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable payload.
    pub fn with(mut self, source: SourceKind, payload: Value) -> Self {
        self.insert(source, payload);
        self
    }

    pub fn insert(&mut self, source: SourceKind, payload: Value) {
        self.payloads.insert(source, payload);
    }

    fn take(&mut self, source: SourceKind) -> Option<Value> {
        self.payloads.remove(&source)
    }
}

/// Table counts, reported by readiness and reload endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub academicians: usize,
    pub projects: usize,
    pub matches: usize,
    pub decisions: usize,
    pub announcements: usize,
    pub messages: usize,
    pub access_logs: usize,
}

/// Reconciled tables. Handlers read it through the store's read guard.
#[derive(Debug, Default)]
pub struct Dataset {
    academicians: Vec<Academician>,
    by_email: HashMap<String, AcademicianId>,
    by_name: HashMap<String, AcademicianId>,
    projects: HashMap<String, Project>,
    matches: Vec<MatchRow>,
    pub(crate) decisions: Vec<Decision>,
    pub(crate) announcements: Vec<Announcement>,
    pub(crate) messages: Vec<Message>,
    pub(crate) access_logs: Vec<AccessLog>,
    pub(crate) passwords: HashMap<String, String>,
    web_images: Vec<WebImage>,
    photo_files: Vec<String>,
    report: LoadReport,
}

impl Dataset {
    /// Reconcile raw payloads into tables. Never fails.
    pub fn build(mut raw: RawSources) -> Self {
        let mut dataset = Dataset {
            report: std::mem::take(&mut raw.report),
            photo_files: std::mem::take(&mut raw.photo_files),
            ..Dataset::default()
        };

        if let Some(payload) = raw.take(SourceKind::Academicians) {
            for record in sources::flatten_records(payload) {
                if let Some(academician) = Academician::from_record(&record) {
                    dataset.insert_academician(academician);
                }
            }
        }
        dataset.rebuild_name_index();

        if let Some(payload) = raw.take(SourceKind::Projects) {
            dataset.projects = sources::parse_projects(payload);
        }
        if let Some(payload) = raw.take(SourceKind::Matches) {
            dataset.matches = sources::parse_matches(payload);
        }
        if let Some(payload) = raw.take(SourceKind::Decisions) {
            dataset.decisions = sources::parse_with(payload, Decision::from_record);
            dataset.dedupe_decisions();
        }
        if let Some(payload) = raw.take(SourceKind::AccessLogs) {
            dataset.access_logs = sources::parse_serde("access_logs", payload);
        }
        if let Some(payload) = raw.take(SourceKind::Announcements) {
            dataset.announcements = sources::parse_serde("announcements", payload);
        }
        if let Some(payload) = raw.take(SourceKind::Messages) {
            dataset.messages = sources::parse_serde("messages", payload);
        }
        if let Some(payload) = raw.take(SourceKind::Passwords) {
            dataset.passwords = sources::parse_passwords(payload);
        }
        if let Some(payload) = raw.take(SourceKind::WebData) {
            dataset.web_images = sources::parse_with(payload, WebImage::from_record);
        }

        let counts = dataset.counts();
        info!(
            academicians = counts.academicians,
            projects = counts.projects,
            matches = counts.matches,
            decisions = counts.decisions,
            degraded_sources = dataset.report.degraded().count(),
            "Dataset built"
        );

        dataset
    }

    /// Insert keyed by email; a repeated email replaces the earlier record
    /// in place so ids stay stable.
    fn insert_academician(&mut self, academician: Academician) {
        let key = academician.email_key();
        match self.by_email.get(&key) {
            Some(id) => self.academicians[id.0] = academician,
            None => {
                let id = AcademicianId(self.academicians.len());
                self.academicians.push(academician);
                self.by_email.insert(key, id);
            }
        }
    }

    /// Normalized name → id, built once per load. On a collision the
    /// academician loaded first keeps the key.
    fn rebuild_name_index(&mut self) {
        self.by_name.clear();
        for (index, academician) in self.academicians.iter().enumerate() {
            let key = academician.name_key();
            if key.is_empty() {
                continue;
            }
            if let Some(existing) = self.by_name.get(&key) {
                warn!(
                    name = %academician.fullname,
                    email = %academician.email,
                    kept = %self.academicians[existing.0].email,
                    "Academicians share a normalized name; keeping the first"
                );
                continue;
            }
            self.by_name.insert(key, AcademicianId(index));
        }
    }

    /// Older exports may hold several rows for one pair; keep the last.
    fn dedupe_decisions(&mut self) {
        let mut deduped: Vec<Decision> = Vec::with_capacity(self.decisions.len());
        for decision in self.decisions.drain(..) {
            let key = decision.name_key();
            match deduped.iter_mut().find(|d| d.is_for(&key, &decision.proj_id)) {
                Some(existing) => existing.merge_from(decision),
                None => deduped.push(decision),
            }
        }
        self.decisions = deduped;
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            academicians: self.academicians.len(),
            projects: self.projects.len(),
            matches: self.matches.len(),
            decisions: self.decisions.len(),
            announcements: self.announcements.len(),
            messages: self.messages.len(),
            access_logs: self.access_logs.len(),
        }
    }

    pub fn academicians(&self) -> impl Iterator<Item = (AcademicianId, &Academician)> {
        self.academicians
            .iter()
            .enumerate()
            .map(|(index, a)| (AcademicianId(index), a))
    }

    pub fn academician(&self, id: AcademicianId) -> Option<&Academician> {
        self.academicians.get(id.0)
    }

    pub fn academician_by_email(&self, email: &str) -> Option<&Academician> {
        self.by_email
            .get(&email_key(email))
            .and_then(|id| self.academician(*id))
    }

    /// Lookup by any spelling that normalizes to a stored full name.
    pub fn academician_by_name(&self, name: &str) -> Option<(AcademicianId, &Academician)> {
        self.academician_by_key(&normalize_name(name))
    }

    pub fn academician_by_key(&self, name_key: &str) -> Option<(AcademicianId, &Academician)> {
        let id = *self.by_name.get(name_key)?;
        self.academician(id).map(|a| (id, a))
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.get(project_id.trim())
    }

    pub fn projects(&self) -> &HashMap<String, Project> {
        &self.projects
    }

    pub fn matches(&self) -> &[MatchRow] {
        &self.matches
    }

    /// Matches whose forward-filled name normalizes to `name_key`.
    pub fn matches_for<'a>(&'a self, name_key: &'a str) -> impl Iterator<Item = &'a MatchRow> + 'a {
        self.matches.iter().filter(move |m| m.name_key == name_key)
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn decision_for(&self, name_key: &str, proj_id: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.is_for(name_key, proj_id))
    }

    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn access_logs(&self) -> &[AccessLog] {
        &self.access_logs
    }

    pub fn password_for(&self, email: &str) -> Option<&str> {
        self.passwords.get(&email_key(email)).map(String::as_str)
    }

    pub fn web_image_for(&self, name_key: &str) -> Option<&WebImage> {
        self.web_images.iter().find(|w| w.name_key == name_key)
    }

    pub fn photo_files(&self) -> &[String] {
        &self.photo_files
    }
}

/// Insert or overwrite the decision for its (normalized name, project)
/// pair. Returns `true` when an existing decision was updated.
pub(crate) fn upsert_decision(decisions: &mut Vec<Decision>, decision: Decision) -> bool {
    let key = decision.name_key();
    match decisions.iter_mut().find(|d| d.is_for(&key, &decision.proj_id)) {
        Some(existing) => {
            existing.merge_from(decision);
            true
        }
        None => {
            decisions.push(decision);
            false
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample;
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_all_tables() {
        let dataset = sample();
        let counts = dataset.counts();
        assert_eq!(counts.academicians, 3);
        assert_eq!(counts.projects, 3);
        assert_eq!(counts.matches, 6);
        assert_eq!(counts.decisions, 3);
    }

    #[test]
    fn academicians_resolve_by_email_and_any_name_spelling() {
        let dataset = sample();
        let by_email = dataset.academician_by_email(" AYSE.KAYA@uni.edu.tr").unwrap();
        assert_eq!(by_email.fullname, "Ayşe Kaya");

        let (_, by_name) = dataset.academician_by_name("ahmet  sen").unwrap();
        assert_eq!(by_name.email, "ahmet.sen@uni.edu.tr");
        assert!(dataset.academician_by_name("Nobody").is_none());
    }

    #[test]
    fn repeated_email_replaces_in_place() {
        let dataset = Dataset::build(RawSources::new().with(
            SourceKind::Academicians,
            json!([
                {"Fullname": "Old Name", "Email": "x@uni.edu.tr"},
                {"Fullname": "Other", "Email": "y@uni.edu.tr"},
                {"Fullname": "New Name", "Email": "X@uni.edu.tr "}
            ]),
        ));
        assert_eq!(dataset.counts().academicians, 2);
        assert_eq!(dataset.academician_by_email("x@uni.edu.tr").unwrap().fullname, "New Name");
        assert!(dataset.academician_by_name("Old Name").is_none());
        let (id, _) = dataset.academician_by_name("new name").unwrap();
        assert_eq!(id, AcademicianId(0));
    }

    #[test]
    fn name_collisions_keep_first_academician() {
        let dataset = Dataset::build(RawSources::new().with(
            SourceKind::Academicians,
            json!([
                {"Fullname": "Dr. Ali Veli", "Email": "ali1@uni.edu.tr"},
                {"Fullname": "ALI VELI", "Email": "ali2@uni.edu.tr"}
            ]),
        ));
        let (_, found) = dataset.academician_by_name("Ali Veli").unwrap();
        assert_eq!(found.email, "ali1@uni.edu.tr");
    }

    #[test]
    fn forward_filled_matches_are_joined_by_name_key() {
        let dataset = sample();
        let key = normalize_name("Prof. Ahmet Şen");
        let projects: Vec<_> = dataset
            .matches_for(&key)
            .map(|m| m.project_id.as_str())
            .collect();
        assert_eq!(projects, vec!["101", "102", "999"]);
    }

    #[test]
    fn missing_sources_leave_tables_empty() {
        let mut raw = RawSources::new();
        raw.report.record(SourceKind::Projects, SourceStatus::Missing);
        raw.report.record(
            SourceKind::Matches,
            SourceStatus::Malformed { error: "expected value at line 1".into() },
        );
        let dataset = Dataset::build(raw);
        assert_eq!(dataset.counts().projects, 0);
        assert_eq!(dataset.counts().matches, 0);
        assert_eq!(dataset.report().degraded().count(), 2);
        assert_eq!(dataset.report().status_of(SourceKind::Projects), Some(&SourceStatus::Missing));
    }

    #[test]
    fn decision_upsert_keeps_one_record_per_pair() {
        let mut decisions = Vec::new();
        let first = Decision::new("X", "5", DecisionStatus::Accepted);
        let second = Decision::new("x", "5", DecisionStatus::Rejected);

        assert!(!upsert_decision(&mut decisions, first));
        assert!(upsert_decision(&mut decisions, second));

        let key = normalize_name("X");
        let matching: Vec<_> = decisions
            .iter()
            .filter(|d| d.is_for(&key, "5"))
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].decision, DecisionStatus::Rejected);
    }

    #[test]
    fn stored_duplicate_decisions_collapse_on_load() {
        let dataset = Dataset::build(RawSources::new().with(
            SourceKind::Decisions,
            json!([
                {"academician": "Ayşe Kaya", "projId": "1", "decision": "accepted"},
                {"academician": "AYSE KAYA", "projId": "1", "decision": "rejected"}
            ]),
        ));
        assert_eq!(dataset.decisions().len(), 1);
        assert_eq!(dataset.decisions()[0].decision, DecisionStatus::Rejected);
    }

    #[test]
    fn web_images_resolve_by_normalized_name() {
        let dataset = sample();
        let image = dataset.web_image_for(&normalize_name("Ayşe Kaya")).unwrap();
        assert_eq!(image.url_path(), "images/ayse.jpg");
    }
}
