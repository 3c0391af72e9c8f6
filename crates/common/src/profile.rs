//! Profile and match resolution
//!
//! Turns a display name into the academician's profile plus every project
//! the match list suggested for them, ranked by score.

use serde::Serialize;

use crate::config::AppConfig;
use crate::dataset::{display_title, Academician, Dataset, DecisionStatus, MatchRow};
use crate::errors::{AppError, Result};
use crate::normalize::normalize_name;

/// Placeholder for project fields the export did not carry.
pub const MISSING_FIELD: &str = "-";
pub const MISSING_URL: &str = "#";
pub const DEFAULT_TITLE: &str = "Akademisyen";

/// Rendering knobs for [`resolve_profile`].
#[derive(Debug, Clone)]
pub struct ProfileOptions {
    pub objective_preview_chars: usize,
    pub public_base_url: String,
    pub photo_folder: String,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            objective_preview_chars: crate::DEFAULT_OBJECTIVE_PREVIEW,
            public_base_url: "http://localhost:8000".to_string(),
            photo_folder: "akademisyen_fotograflari".to_string(),
        }
    }
}

impl From<&AppConfig> for ProfileOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            objective_preview_chars: config.profile.objective_preview_chars,
            public_base_url: config.data.public_base_url.clone(),
            photo_folder: config.data.photo_folder.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileCard {
    #[serde(rename = "Fullname")]
    pub fullname: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Image")]
    pub image: Option<String>,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Field")]
    pub field: Option<String>,
    #[serde(rename = "Phone")]
    pub phone: Option<String>,
    #[serde(rename = "Duties")]
    pub duties: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedProject {
    pub id: String,
    pub score: i64,
    pub title: String,
    pub status: String,
    pub budget: String,
    pub objective: String,
    pub decision: DecisionStatus,
    pub url: String,
    pub collaborators: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub profile: ProfileCard,
    pub projects: Vec<MatchedProject>,
}

/// Resolve `name` to a profile and its matched projects.
///
/// Every match is listed, including ones whose project is absent from the
/// project table. Projects are sorted by descending score; equal scores
/// keep match-list order.
pub fn resolve_profile(dataset: &Dataset, name: &str, options: &ProfileOptions) -> Result<ProfileView> {
    let key = normalize_name(name);
    let (_, academician) = dataset
        .academician_by_key(&key)
        .ok_or_else(|| AppError::AcademicianNotFound { name: name.trim().to_string() })?;

    let mut projects: Vec<MatchedProject> = dataset
        .matches_for(&key)
        .map(|row| matched_project(dataset, &key, row, options))
        .collect();
    projects.sort_by(|a, b| b.score.cmp(&a.score));

    Ok(ProfileView {
        profile: profile_card(dataset, &key, academician, options),
        projects,
    })
}

fn matched_project(
    dataset: &Dataset,
    name_key: &str,
    row: &MatchRow,
    options: &ProfileOptions,
) -> MatchedProject {
    let project = dataset.project(&row.project_id);
    let decision = dataset
        .decision_for(name_key, &row.project_id)
        .map(|d| d.decision)
        .unwrap_or_default();

    MatchedProject {
        id: row.project_id.clone(),
        score: row.score,
        title: display_title(project, &row.project_id),
        status: project
            .and_then(|p| p.status.clone())
            .unwrap_or_else(|| MISSING_FIELD.to_string()),
        budget: project
            .and_then(|p| p.overall_budget.clone())
            .unwrap_or_else(|| MISSING_FIELD.to_string()),
        objective: project
            .and_then(|p| p.objective.as_deref())
            .map(|text| preview(text, options.objective_preview_chars))
            .unwrap_or_default(),
        decision,
        url: project
            .and_then(|p| p.url.clone())
            .unwrap_or_else(|| MISSING_URL.to_string()),
        collaborators: collaborators(dataset, name_key, &row.project_id),
    }
}

/// Other academicians who accepted `project_id`, first occurrence first.
pub fn collaborators(dataset: &Dataset, name_key: &str, project_id: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut names = Vec::new();

    for decision in dataset.decisions() {
        if decision.decision != DecisionStatus::Accepted || decision.proj_id != project_id.trim() {
            continue;
        }
        let other = decision.name_key();
        if other.is_empty() || other == name_key || seen.contains(&other) {
            continue;
        }
        let label = dataset
            .academician_by_key(&other)
            .map(|(_, a)| a.fullname.clone())
            .unwrap_or_else(|| decision.academician.trim().to_string());
        seen.push(other);
        names.push(label);
    }
    names
}

/// First `limit` characters, with `...` appended only when cut.
pub fn preview(text: &str, limit: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn profile_card(
    dataset: &Dataset,
    name_key: &str,
    academician: &Academician,
    options: &ProfileOptions,
) -> ProfileCard {
    ProfileCard {
        fullname: academician.fullname.clone(),
        email: academician.email.clone(),
        image: image_url(dataset, name_key, academician, options),
        title: academician
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        field: academician.field.clone(),
        phone: academician.phone.clone(),
        duties: academician.duties.clone(),
    }
}

/// Website image first, then a photo-folder file named after the email
/// user part.
fn image_url(
    dataset: &Dataset,
    name_key: &str,
    academician: &Academician,
    options: &ProfileOptions,
) -> Option<String> {
    let base = options.public_base_url.trim_end_matches('/');

    if let Some(web) = dataset.web_image_for(name_key) {
        let path = web.url_path();
        if !path.is_empty() {
            return Some(format!("{}/{}", base, path));
        }
    }

    let user = academician.email_user();
    if user.is_empty() {
        return None;
    }
    dataset
        .photo_files()
        .iter()
        .find(|file| file.to_lowercase().starts_with(&user))
        .map(|file| format!("{}/{}/{}", base, options.photo_folder, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{sample, sample_sources};
    use crate::dataset::Dataset;

    fn ids(view: &ProfileView) -> Vec<&str> {
        view.projects.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn projects_are_ranked_by_score() {
        let view = resolve_profile(&sample(), "Ahmet Şen", &ProfileOptions::default()).unwrap();
        assert_eq!(ids(&view), vec!["102", "101", "999"]);
        assert_eq!(view.profile.fullname, "Prof. Dr. Ahmet Şen");
        assert_eq!(view.profile.title, "Profesör");
        assert_eq!(view.profile.duties, vec!["Bölüm Başkanı".to_string()]);
    }

    #[test]
    fn missing_project_is_kept_with_placeholders() {
        let view = resolve_profile(&sample(), "ahmet sen", &ProfileOptions::default()).unwrap();
        let missing = view.projects.iter().find(|p| p.id == "999").unwrap();
        assert_eq!(missing.title, "Proje-999");
        assert_eq!(missing.status, "-");
        assert_eq!(missing.budget, "-");
        assert_eq!(missing.objective, "");
        assert_eq!(missing.url, "#");
        assert_eq!(missing.score, 0);
        assert_eq!(missing.decision, DecisionStatus::Waiting);
    }

    #[test]
    fn decisions_and_collaborators_are_attached() {
        let view = resolve_profile(&sample(), "Ahmet Şen", &ProfileOptions::default()).unwrap();

        let rejected = &view.projects[0];
        assert_eq!(rejected.title, "EUPROJ");
        assert_eq!(rejected.decision, DecisionStatus::Rejected);
        assert!(rejected.collaborators.is_empty());

        let shared = &view.projects[1];
        assert_eq!(shared.budget, "2500000");
        assert_eq!(shared.decision, DecisionStatus::Waiting);
        assert_eq!(shared.collaborators, vec!["Ayşe Kaya", "Mehmet Öz"]);
    }

    #[test]
    fn query_person_is_not_their_own_collaborator() {
        let view = resolve_profile(&sample(), "AYSE KAYA", &ProfileOptions::default()).unwrap();
        assert_eq!(view.projects.len(), 1);
        assert_eq!(view.projects[0].decision, DecisionStatus::Accepted);
        assert_eq!(view.projects[0].collaborators, vec!["Mehmet Öz"]);
        assert_eq!(view.profile.title, "Akademisyen");
    }

    #[test]
    fn unknown_name_is_not_found() {
        let err = resolve_profile(&sample(), "Nobody Here", &ProfileOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::AcademicianNotFound { .. }));
    }

    #[test]
    fn objective_ellipsis_only_when_truncated() {
        assert_eq!(preview("Develop catalysts", 7), "Develop...");
        assert_eq!(preview("short", 300), "short");
        assert_eq!(preview("çğüşöı", 3), "çğü...");
        assert_eq!(preview("exact", 5), "exact");

        let options = ProfileOptions {
            objective_preview_chars: 7,
            ..ProfileOptions::default()
        };
        let view = resolve_profile(&sample(), "Mehmet Öz", &options).unwrap();
        let first = view.projects.iter().find(|p| p.id == "101").unwrap();
        assert_eq!(first.objective, "Develop...");
    }

    #[test]
    fn image_prefers_web_data_then_photo_folder() {
        let options = ProfileOptions {
            public_base_url: "https://portal.example/".to_string(),
            ..ProfileOptions::default()
        };

        let ayse = resolve_profile(&sample(), "Ayşe Kaya", &options).unwrap();
        assert_eq!(
            ayse.profile.image.as_deref(),
            Some("https://portal.example/images/ayse.jpg")
        );

        let mut raw = sample_sources();
        raw.photo_files = vec!["Ahmet.Sen.PNG".to_string(), "mehmet.oz.jpg".to_string()];
        let dataset = Dataset::build(raw);

        let mehmet = resolve_profile(&dataset, "Mehmet Öz", &options).unwrap();
        assert_eq!(
            mehmet.profile.image.as_deref(),
            Some("https://portal.example/akademisyen_fotograflari/mehmet.oz.jpg")
        );
        let ahmet = resolve_profile(&dataset, "Ahmet Şen", &options).unwrap();
        assert_eq!(
            ahmet.profile.image.as_deref(),
            Some("https://portal.example/akademisyen_fotograflari/Ahmet.Sen.PNG")
        );

        let none = resolve_profile(&sample(), "Mehmet Öz", &options).unwrap();
        assert!(none.profile.image.is_none());
    }
}
