//! Shape-tolerant readers for the raw JSON exports
//!
//! Every export is either a flat list of records or a "sheet-like" map
//! whose values are lists (one list per spreadsheet page). Field names
//! drift between exports, so fields are looked up through alias lists.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use super::models::{email_key, MatchRow, Project};
use crate::normalize::is_header_token;

/// Flatten a payload into one list of records.
///
/// A list is returned as is; a map contributes every list-valued top-level
/// entry, concatenated in document order. Anything else is empty.
pub fn flatten_records(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(_, value)| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .flatten()
            .collect(),
        _ => Vec::new(),
    }
}

/// First alias holding a non-empty string or a number, trimmed.
pub fn text_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First alias holding an integer-like value. Floats are truncated and
/// numeric strings are parsed.
pub fn integer_field(record: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| parse_integer(record.get(*key)?))
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// Projects keyed by id; the last record for an id wins.
///
/// Besides the list and sheet shapes, an export keyed by project id
/// (`{"101": {...}}`) is accepted, using the key when a record carries no
/// `project_id` of its own.
pub fn parse_projects(payload: Value) -> HashMap<String, Project> {
    let mut projects = HashMap::new();

    let keyed_by_id = matches!(
        &payload,
        Value::Object(map) if !map.is_empty() && map.values().all(Value::is_object)
    );

    if keyed_by_id {
        if let Value::Object(map) = payload {
            for (id, record) in map {
                if let Some(project) = Project::from_record(&record, Some(&id)) {
                    projects.insert(project.project_id.clone(), project);
                }
            }
        }
        return projects;
    }

    for record in flatten_records(payload) {
        if let Some(project) = Project::from_record(&record, None) {
            projects.insert(project.project_id.clone(), project);
        }
    }
    projects
}

const MATCH_NAME_FIELDS: &[&str] = &["data", "academician_name"];
const MATCH_PROJECT_FIELDS: &[&str] = &["Column3", "project_id"];
const MATCH_SCORE_FIELDS: &[&str] = &["Column7", "score"];

/// Match rows in source order with forward-filled names.
///
/// A blank name inherits the most recent non-blank, non-header name seen
/// earlier in the flattened list, modelling merged spreadsheet cells.
/// Rows whose name or project id is empty or a header label are dropped.
/// Unparsable scores count as 0.
pub fn parse_matches(payload: Value) -> Vec<MatchRow> {
    let mut matches = Vec::new();
    let mut last_name: Option<String> = None;

    for record in flatten_records(payload) {
        let own_name = text_field(&record, MATCH_NAME_FIELDS);

        let name = match own_name {
            Some(name) if is_header_token(&name) => continue,
            Some(name) => {
                last_name = Some(name.clone());
                name
            }
            None => match &last_name {
                Some(name) => name.clone(),
                None => continue,
            },
        };

        let project_id = match text_field(&record, MATCH_PROJECT_FIELDS) {
            Some(id) if !is_header_token(&id) => id,
            _ => continue,
        };

        let score = integer_field(&record, MATCH_SCORE_FIELDS).unwrap_or(0);
        matches.push(MatchRow::new(&name, &project_id, score));
    }

    matches
}

const PASSWORD_EMAIL_FIELDS: &[&str] = &["email", "Email", "username", "user", "mail"];
const PASSWORD_SECRET_FIELDS: &[&str] = &["password", "Password", "pass", "sifre", "şifre"];

/// Passwords keyed by lowercase-trimmed email.
///
/// Accepts a direct `{email: password}` map or a list of records.
pub fn parse_passwords(payload: Value) -> HashMap<String, String> {
    let direct_map = matches!(
        &payload,
        Value::Object(map) if map.values().all(|v| v.is_string())
    );

    if direct_map {
        if let Value::Object(map) = payload {
            return map
                .into_iter()
                .filter_map(|(email, password)| match password {
                    Value::String(p) => Some((email_key(&email), p)),
                    _ => None,
                })
                .filter(|(email, _)| !email.is_empty())
                .collect();
        }
    }

    flatten_records(payload)
        .iter()
        .filter_map(|record| {
            let email = text_field(record, PASSWORD_EMAIL_FIELDS)?;
            let password = text_field(record, PASSWORD_SECRET_FIELDS)?;
            Some((email_key(&email), password))
        })
        .collect()
}

/// Flatten and parse each record with `parse`, dropping the rest.
pub fn parse_with<T>(payload: Value, parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    flatten_records(payload).iter().filter_map(parse).collect()
}

/// Flatten and deserialize each record, logging and skipping bad rows.
pub fn parse_serde<T: DeserializeOwned>(source: &str, payload: Value) -> Vec<T> {
    flatten_records(payload)
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(source, index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}
