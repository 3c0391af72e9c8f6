//! Collaborator network
//!
//! Graph of academicians linked by projects they both accepted.

use serde::Serialize;

use crate::dataset::{Dataset, Decision, DecisionStatus};
use crate::errors::{AppError, Result};
use crate::normalize::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    #[serde(rename = "self")]
    Own,
    Collaborator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Normalized name
    pub id: String,
    pub label: String,
    pub group: NodeGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub projects: Vec<String>,
    pub weight: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollaborationGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Build the collaboration graph around `name`.
pub fn collaboration_graph(dataset: &Dataset, name: &str) -> Result<CollaborationGraph> {
    let key = normalize_name(name);
    let (_, academician) = dataset
        .academician_by_key(&key)
        .ok_or_else(|| AppError::AcademicianNotFound { name: name.trim().to_string() })?;

    let accepted = |d: &&Decision| d.decision == DecisionStatus::Accepted;

    let own_projects: Vec<&str> = dataset
        .decisions()
        .iter()
        .filter(accepted)
        .filter(|d| d.name_key() == key)
        .map(|d| d.proj_id.as_str())
        .collect();

    let mut nodes = vec![GraphNode {
        id: key.clone(),
        label: academician.fullname.clone(),
        group: NodeGroup::Own,
    }];
    let mut edges: Vec<GraphEdge> = Vec::new();

    for decision in dataset.decisions().iter().filter(accepted) {
        let other = decision.name_key();
        if other.is_empty() || other == key || !own_projects.contains(&decision.proj_id.as_str()) {
            continue;
        }

        match edges.iter_mut().find(|e| e.to == other) {
            Some(edge) => {
                if !edge.projects.contains(&decision.proj_id) {
                    edge.projects.push(decision.proj_id.clone());
                    edge.weight = edge.projects.len();
                }
            }
            None => {
                let label = dataset
                    .academician_by_key(&other)
                    .map(|(_, a)| a.fullname.clone())
                    .unwrap_or_else(|| decision.academician.trim().to_string());
                nodes.push(GraphNode {
                    id: other.clone(),
                    label,
                    group: NodeGroup::Collaborator,
                });
                edges.push(GraphEdge {
                    from: key.clone(),
                    to: other,
                    projects: vec![decision.proj_id.clone()],
                    weight: 1,
                });
            }
        }
    }

    Ok(CollaborationGraph { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{sample, sample_sources};
    use crate::dataset::SourceKind;
    use serde_json::json;

    #[test]
    fn links_academicians_sharing_accepted_projects() {
        let graph = collaboration_graph(&sample(), "Ayşe Kaya").unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].group, NodeGroup::Own);
        assert_eq!(graph.nodes[1].label, "Mehmet Öz");
        assert_eq!(graph.edges[0].projects, vec!["101"]);
        assert_eq!(graph.edges[0].weight, 1);
    }

    #[test]
    fn rejected_projects_do_not_link() {
        let graph = collaboration_graph(&sample(), "Ahmet Şen").unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn weight_counts_shared_projects_and_unknown_names_keep_their_label() {
        let raw = sample_sources().with(
            SourceKind::Decisions,
            json!([
                {"academician": "Ayşe Kaya", "projId": "1", "decision": "accepted"},
                {"academician": "Ayşe Kaya", "projId": "2", "decision": "accepted"},
                {"academician": "Zeynep Ak", "projId": "1", "decision": "accepted"},
                {"academician": "ZEYNEP AK", "projId": "2", "decision": "accepted"},
                {"academician": "Zeynep Ak", "projId": "3", "decision": "accepted"}
            ]),
        );
        let graph = collaboration_graph(&Dataset::build(raw), "ayse kaya").unwrap();
        assert_eq!(graph.nodes[1].label, "Zeynep Ak");
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].weight, 2);
        assert_eq!(graph.edges[0].projects, vec!["1", "2"]);
    }

    #[test]
    fn group_serializes_as_self() {
        assert_eq!(serde_json::to_value(NodeGroup::Own).unwrap(), json!("self"));
    }

    #[test]
    fn unknown_academician_is_not_found() {
        assert!(matches!(
            collaboration_graph(&sample(), "Nobody"),
            Err(AppError::AcademicianNotFound { .. })
        ));
    }
}
