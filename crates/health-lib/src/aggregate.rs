//! Aggregated health views
//!
//! Pure functions joining an [`EntityGraph`] with a [`HealthSnapshot`]:
//! - health tree (one node per configured entity)
//! - health summary (counts, percentages and membership per state)
//! - workload health (the root record of the health model)
//!
//! None of these fail. Missing data shows up as `Unknown` or empty results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::EntityGraph;
use crate::models::{EntityType, HealthRecord, HealthState, StateColor};
use crate::ordered::OrderedMap;
use crate::snapshot::HealthSnapshot;

/// `details.kind` value the health model API gives its root entity
pub const WORKLOAD_ROOT_KIND: &str = "System_HealthModelRoot";

/// Dependency edges touching one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencySummary {
    /// Source ids of the edges this entity depends on
    pub depends_on: Vec<String>,
    /// Target ids of the edges that depend on this entity
    pub depended_by: Vec<String>,
}

/// Health tree node for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub state: HealthState,
    pub state_color: StateColor,
    pub timestamp: Option<String>,
    pub parent_id: Option<String>,
    pub signal_refs: BTreeMap<String, String>,
    pub dependency_summary: DependencySummary,
}

/// Entity id -> tree node, in graph insertion order
pub type HealthTree = OrderedMap<TreeNode>;

/// Build the health tree for every entity in the graph
pub fn build_health_tree(graph: &EntityGraph, snapshot: &HealthSnapshot) -> HealthTree {
    graph
        .entities()
        .map(|entity| {
            let record = snapshot.record_for(&entity.id);
            let node = TreeNode {
                name: entity.name.clone(),
                entity_type: entity.entity_type,
                state: record.state,
                state_color: record.state_color,
                timestamp: record.timestamp,
                parent_id: entity.parent_id.clone(),
                signal_refs: entity.signals.clone(),
                dependency_summary: DependencySummary {
                    depends_on: graph
                        .dependencies_of(&entity.id)
                        .into_iter()
                        .map(|d| d.source_id.clone())
                        .collect(),
                    depended_by: graph
                        .dependents_of(&entity.id)
                        .into_iter()
                        .map(|d| d.target_id.clone())
                        .collect(),
                },
            };
            (entity.id.clone(), node)
        })
        .collect()
}

/// Overall workload health
///
/// Returns the record marked as the health model root, else the first
/// record, else an `Unknown` placeholder.
pub fn workload_health(snapshot: &HealthSnapshot) -> HealthRecord {
    snapshot
        .iter()
        .find(|(_, record)| record.kind() == Some(WORKLOAD_ROOT_KIND))
        .or_else(|| snapshot.first())
        .map(|(_, record)| record.clone())
        .unwrap_or_else(HealthRecord::placeholder)
}

/// Entity reference listed under a state bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_id: String,
    pub display_name: String,
}

/// One value per health state bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateBuckets<T> {
    pub healthy: T,
    pub degraded: T,
    pub unhealthy: T,
    pub unknown: T,
}

impl<T> StateBuckets<T> {
    pub fn get(&self, state: HealthState) -> &T {
        match state {
            HealthState::Healthy => &self.healthy,
            HealthState::Degraded => &self.degraded,
            HealthState::Unhealthy => &self.unhealthy,
            HealthState::Unknown => &self.unknown,
        }
    }

    fn get_mut(&mut self, state: HealthState) -> &mut T {
        match state {
            HealthState::Healthy => &mut self.healthy,
            HealthState::Degraded => &mut self.degraded,
            HealthState::Unhealthy => &mut self.unhealthy,
            HealthState::Unknown => &mut self.unknown,
        }
    }
}

/// Counts and percentages of entities per health state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_entities: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub unhealthy_count: usize,
    pub unknown_count: usize,
    pub health_percentages: StateBuckets<f64>,
    pub entities_by_state: StateBuckets<Vec<EntityRef>>,
}

impl HealthSummary {
    pub fn count(&self, state: HealthState) -> usize {
        match state {
            HealthState::Healthy => self.healthy_count,
            HealthState::Degraded => self.degraded_count,
            HealthState::Unhealthy => self.unhealthy_count,
            HealthState::Unknown => self.unknown_count,
        }
    }
}

/// Bucket every record by state and compute per-state percentages
pub fn health_summary(snapshot: &HealthSnapshot) -> HealthSummary {
    let mut members: StateBuckets<Vec<EntityRef>> = StateBuckets::default();

    for (entity_id, record) in snapshot.iter() {
        members.get_mut(record.state).push(EntityRef {
            entity_id: entity_id.to_string(),
            display_name: record.display_name().unwrap_or(entity_id).to_string(),
        });
    }

    let total = snapshot.len();
    let percentage = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    };

    HealthSummary {
        total_entities: total,
        healthy_count: members.healthy.len(),
        degraded_count: members.degraded.len(),
        unhealthy_count: members.unhealthy.len(),
        unknown_count: members.unknown.len(),
        health_percentages: StateBuckets {
            healthy: percentage(members.healthy.len()),
            degraded: percentage(members.degraded.len()),
            unhealthy: percentage(members.unhealthy.len()),
            unknown: percentage(members.unknown.len()),
        },
        entities_by_state: members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Criticality, Dependency, Entity};

    fn graph() -> EntityGraph {
        let mut graph = EntityGraph::new("m", "Model", "", "");
        graph.add_entity(Entity::new("root", "Root", EntityType::Workload, ""));
        graph.add_entity(
            Entity::new("api", "API", EntityType::Api, "")
                .with_parent("root")
                .with_signal("error_rate", "api_error_rate"),
        );
        graph.add_entity(Entity::new("db", "DB", EntityType::Database, "").with_parent("missing"));
        graph.add_dependency(Dependency::new("db", "api").with_criticality(Criticality::High));
        graph.add_dependency(Dependency::new("api", "root").with_criticality(Criticality::Critical));
        graph
    }

    fn snapshot(states: &[(&str, HealthState)]) -> HealthSnapshot {
        states
            .iter()
            .map(|(id, state)| HealthRecord::new(*id, *state))
            .collect()
    }

    #[test]
    fn test_tree_has_one_node_per_entity() {
        let records = snapshot(&[("api", HealthState::Healthy), ("elsewhere", HealthState::Degraded)]);
        let tree = build_health_tree(&graph(), &records);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["root", "api", "db"]);
        assert!(!tree.contains_key("elsewhere"));

        let api = tree.get("api").unwrap();
        assert_eq!(api.state, HealthState::Healthy);
        assert_eq!(api.state_color, StateColor::Green);
        assert_eq!(api.parent_id.as_deref(), Some("root"));
        assert_eq!(api.signal_refs.get("error_rate").map(String::as_str), Some("api_error_rate"));
        assert_eq!(api.dependency_summary.depends_on, vec!["db"]);
        assert_eq!(api.dependency_summary.depended_by, vec!["root"]);

        let db = tree.get("db").unwrap();
        assert_eq!(db.state, HealthState::Unknown);
        assert_eq!(db.state_color, StateColor::Gray);
        assert_eq!(db.timestamp, None);
        assert_eq!(db.parent_id.as_deref(), Some("missing"));
    }

    #[test]
    fn test_tree_with_empty_snapshot() {
        let tree = build_health_tree(&graph(), &HealthSnapshot::new());
        assert_eq!(tree.len(), 3);
        assert!(tree.values().all(|n| n.state == HealthState::Unknown));
    }

    #[test]
    fn test_tree_node_json_keys() {
        let tree = build_health_tree(&graph(), &HealthSnapshot::new());
        let json = serde_json::to_value(&tree).unwrap();
        let node = json["root"].as_object().unwrap();
        let mut keys: Vec<_> = node.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "dependency_summary",
                "name",
                "parent_id",
                "signal_refs",
                "state",
                "state_color",
                "timestamp",
                "type"
            ]
        );
    }

    #[test]
    fn test_workload_prefers_root_marker() {
        let mut records = snapshot(&[("a", HealthState::Healthy), ("b", HealthState::Healthy)]);
        records.insert(
            "model-root",
            HealthRecord::new("model-root", HealthState::Degraded).with_detail("kind", WORKLOAD_ROOT_KIND),
        );
        records.insert("c", HealthRecord::new("c", HealthState::Unhealthy));

        let workload = workload_health(&records);
        assert_eq!(workload.entity_id.as_deref(), Some("model-root"));
        assert_eq!(workload.state, HealthState::Degraded);
    }

    #[test]
    fn test_workload_falls_back_to_first_record() {
        let records = snapshot(&[("z", HealthState::Unhealthy), ("a", HealthState::Healthy)]);
        let workload = workload_health(&records);
        assert_eq!(workload.entity_id.as_deref(), Some("z"));
    }

    #[test]
    fn test_workload_placeholder_when_empty() {
        let workload = workload_health(&HealthSnapshot::new());
        assert_eq!(workload.state, HealthState::Unknown);
        assert_eq!(workload.state_color, StateColor::Gray);
        assert_eq!(workload.entity_id, None);
    }

    #[test]
    fn test_summary_counts_and_percentages() {
        let mut records = snapshot(&[
            ("a", HealthState::Healthy),
            ("b", HealthState::Healthy),
            ("c", HealthState::Degraded),
            ("d", HealthState::Unhealthy),
            ("e", HealthState::Unknown),
            ("f", HealthState::Healthy),
        ]);
        records.insert(
            "g",
            HealthRecord::new("g", HealthState::Degraded).with_detail("displayName", "Gee"),
        );

        let summary = health_summary(&records);
        assert_eq!(summary.total_entities, 7);
        assert_eq!(summary.healthy_count, 3);
        assert_eq!(summary.degraded_count, 2);
        assert_eq!(summary.unhealthy_count, 1);
        assert_eq!(summary.unknown_count, 1);

        let counted = summary.healthy_count
            + summary.degraded_count
            + summary.unhealthy_count
            + summary.unknown_count;
        assert_eq!(counted, summary.total_entities);

        let p = &summary.health_percentages;
        assert!((p.healthy + p.degraded + p.unhealthy + p.unknown - 100.0).abs() < 1e-6);
        assert!((p.healthy - 300.0 / 7.0).abs() < 1e-9);

        let degraded = &summary.entities_by_state.degraded;
        assert_eq!(degraded[0].display_name, "c");
        assert_eq!(degraded[1].entity_id, "g");
        assert_eq!(degraded[1].display_name, "Gee");
    }

    #[test]
    fn test_summary_of_loaded_state_strings() {
        let records: HealthSnapshot = serde_json::from_str(
            r#"{
                "a": {"state": "HEALTHY"},
                "b": {"state": "warning"},
                "c": {"state": ""},
                "d": {}
            }"#,
        )
        .unwrap();

        let summary = health_summary(&records);
        assert_eq!(summary.healthy_count, 1);
        assert_eq!(summary.unknown_count, 3);
    }

    #[test]
    fn test_summary_of_empty_snapshot() {
        let summary = health_summary(&HealthSnapshot::new());
        assert_eq!(summary.total_entities, 0);
        assert_eq!(summary.health_percentages, StateBuckets::default());
        assert!(summary.entities_by_state.unknown.is_empty());
    }

    #[test]
    fn test_end_to_end_three_tier_example() {
        let graph = graph();
        let records = snapshot(&[("api", HealthState::Healthy), ("db", HealthState::Unhealthy)]);

        let summary = health_summary(&records.completed_for(&graph));
        assert_eq!(summary.healthy_count, 1);
        assert_eq!(summary.unhealthy_count, 1);
        assert_eq!(summary.unknown_count, 1);
        assert_eq!(summary.total_entities, 3);
        assert_eq!(summary.entities_by_state.unknown[0].entity_id, "root");

        let impact = crate::impact::dependency_impact(&graph, "db");
        assert_eq!(impact.impact_severity, Criticality::High);
        let affected: Vec<&str> = impact.affected_services.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(affected, vec!["api"]);

        assert_eq!(crate::impact::critical_path(&graph, "root"), vec!["root", "api", "db"]);
    }
}
