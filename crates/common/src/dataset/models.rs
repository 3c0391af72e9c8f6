//! Typed records reconciled from the JSON exports
//!
//! Read paths parse loosely (see `sources`), write paths serialize with serde.
//! Records that the portal writes back keep any unknown fields in `extra`
//! so a rewrite never drops data another tool put in the file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::sources::{integer_field, text_field};
use crate::normalize::normalize_name;

/// Stable position of an academician in the dataset, assigned at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AcademicianId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Academician {
    #[serde(rename = "Fullname")]
    pub fullname: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Field", skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "Duties")]
    pub duties: Vec<String>,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Academician {
    /// Parse one export row. Rows without an email are not academicians.
    pub fn from_record(record: &Value) -> Option<Self> {
        let email = text_field(record, &["Email", "email"])?;
        let duties = match record.get("Duties").or_else(|| record.get("duties")) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        };

        Some(Self {
            fullname: text_field(record, &["Fullname", "fullname", "Name"]).unwrap_or_default(),
            email,
            title: text_field(record, &["Title", "title"]),
            field: text_field(record, &["Field", "field"]),
            duties,
            phone: text_field(record, &["Phone", "phone"]),
        })
    }

    /// Lowercase-trimmed email, the identity key of the academician table
    pub fn email_key(&self) -> String {
        email_key(&self.email)
    }

    /// Local part of the email, used as default password and photo prefix
    pub fn email_user(&self) -> String {
        self.email_key()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    pub fn name_key(&self) -> String {
        normalize_name(&self.fullname)
    }
}

pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Project {
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acronym: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Project {
    /// Parse one project record. `fallback_id` is the map key when the
    /// export is shaped `{id: record}`.
    pub fn from_record(record: &Value, fallback_id: Option<&str>) -> Option<Self> {
        let project_id = text_field(record, &["project_id"])
            .or_else(|| fallback_id.map(|id| id.trim().to_string()))
            .filter(|id| !id.is_empty())?;

        Some(Self {
            project_id,
            title: text_field(record, &["title"]),
            acronym: text_field(record, &["acronym", "project_acronym"]),
            status: text_field(record, &["status"]),
            overall_budget: text_field(record, &["overall_budget"]),
            objective: text_field(record, &["objective"]),
            url: text_field(record, &["url"]),
        })
    }
}

/// Display title with the fallback chain title → acronym → `Proje-<id>`.
///
/// A missing project resolves to the placeholder as well.
pub fn display_title(project: Option<&Project>, project_id: &str) -> String {
    project
        .and_then(|p| p.title.clone().or_else(|| p.acronym.clone()))
        .unwrap_or_else(|| format!("Proje-{}", project_id))
}

/// One suggested academician/project pairing after forward-fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    pub academician: String,
    #[serde(skip)]
    pub name_key: String,
    #[serde(rename = "projId")]
    pub project_id: String,
    pub score: i64,
}

impl MatchRow {
    pub fn new(academician: &str, project_id: &str, score: i64) -> Self {
        Self {
            academician: academician.trim().to_string(),
            name_key: normalize_name(academician),
            project_id: project_id.trim().to_string(),
            score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Accepted,
    Rejected,
    #[default]
    Waiting,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Accepted => "accepted",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::Waiting => "waiting",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accepted" => Ok(DecisionStatus::Accepted),
            "rejected" => Ok(DecisionStatus::Rejected),
            "waiting" => Ok(DecisionStatus::Waiting),
            other => Err(format!("unknown decision '{}'", other)),
        }
    }
}

/// An academician's response to one suggested project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub academician: String,
    #[serde(rename = "projId")]
    pub proj_id: String,
    pub decision: DecisionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const DECISION_FIELDS: &[&str] = &[
    "academician",
    "projId",
    "decision",
    "rating",
    "note",
    "updatedAt",
];

impl Decision {
    pub fn new(academician: &str, proj_id: &str, decision: DecisionStatus) -> Self {
        Self {
            academician: academician.trim().to_string(),
            proj_id: proj_id.trim().to_string(),
            decision,
            rating: None,
            note: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Parse a stored decision. Rows without a name or project id are
    /// dropped; an unreadable decision value counts as `waiting`.
    pub fn from_record(record: &Value) -> Option<Self> {
        let academician = text_field(record, &["academician"])?;
        let proj_id = text_field(record, &["projId", "project_id"])?;
        let decision = text_field(record, &["decision"])
            .and_then(|d| d.parse().ok())
            .unwrap_or_default();

        let rating = integer_field(record, &["rating"]).and_then(|r| u8::try_from(r).ok());
        let updated_at = text_field(record, &["updatedAt"])
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        // unparsable rating/updatedAt values stay in `extra` as they were
        let keep = |key: &str, value: &Value| match key {
            "rating" => rating.is_none() && !value.is_null(),
            "updatedAt" => updated_at.is_none() && !value.is_null(),
            _ => !DECISION_FIELDS.contains(&key),
        };
        let extra = record
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .filter(|(key, value)| keep(key, value))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            academician,
            proj_id,
            decision,
            rating,
            note: text_field(record, &["note"]),
            updated_at,
            extra,
        })
    }

    pub fn name_key(&self) -> String {
        normalize_name(&self.academician)
    }

    /// Whether this decision belongs to (`name_key`, `proj_id`).
    pub fn is_for(&self, name_key: &str, proj_id: &str) -> bool {
        self.proj_id == proj_id.trim() && self.name_key() == name_key
    }

    /// Overwrite with a newer decision for the same pair. Optional fields
    /// the newer decision leaves unset keep their stored value.
    pub fn merge_from(&mut self, newer: Decision) {
        self.academician = newer.academician;
        self.decision = newer.decision;
        if newer.rating.is_some() {
            self.rating = newer.rating;
            self.extra.remove("rating");
        }
        if newer.note.is_some() {
            self.note = newer.note;
        }
        if newer.updated_at.is_some() {
            self.updated_at = newer.updated_at;
            self.extra.remove("updatedAt");
        }
        self.extra.extend(newer.extra);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Whether `user` sent or received this message (case-insensitive).
    pub fn involves(&self, user: &str) -> bool {
        let user = user.trim();
        self.from.trim().eq_ignore_ascii_case(user)
            || self.to.trim().eq_ignore_ascii_case(user)
            || normalize_name(&self.from) == normalize_name(user)
            || normalize_name(&self.to) == normalize_name(user)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLog {
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessLog {
    pub fn now(user: &str, role: Option<&str>, action: &str, success: bool) -> Self {
        Self {
            user: user.to_string(),
            role: role.map(str::to_string),
            action: action.to_string(),
            success: Some(success),
            timestamp: Utc::now().to_rfc3339(),
            extra: Map::new(),
        }
    }
}

/// Photo metadata scraped from the university website.
#[derive(Debug, Clone, PartialEq)]
pub struct WebImage {
    pub fullname: String,
    pub name_key: String,
    pub image_path: String,
}

impl WebImage {
    pub fn from_record(record: &Value) -> Option<Self> {
        let fullname = text_field(record, &["Fullname", "fullname"])?;
        let image_path = text_field(record, &["Image_Path", "image_path"])?;
        Some(Self {
            name_key: normalize_name(&fullname),
            fullname,
            image_path,
        })
    }

    /// Relative URL path with Windows separators and leading slashes removed.
    pub fn url_path(&self) -> String {
        self.image_path
            .replace('\\', "/")
            .trim_start_matches("./")
            .trim_start_matches('/')
            .to_string()
    }
}
