//! Dependency impact analysis
//!
//! Answers "what breaks if this entity fails" and traces the chain of
//! critical/high dependencies below an entity.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::graph::EntityGraph;
use crate::models::{Criticality, DependencyType};

/// Entity the critical path walk starts from when none is given
pub const DEFAULT_CRITICAL_PATH_START: &str = "root";

/// A dependent entity affected by a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedService {
    pub id: String,
    pub name: String,
    pub criticality: Criticality,
    pub dependency_type: DependencyType,
}

/// Blast radius of a failing entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyImpact {
    pub failed_entity: String,
    pub affected_services: Vec<AffectedService>,
    pub impact_severity: Criticality,
}

/// Analyze the impact of `entity_id` failing on the entities that depend on it
///
/// Severity is the highest criticality among the dependent edges, or `low`
/// when nothing depends on the entity. Edges whose target is not in the graph
/// still count toward severity but are left out of `affected_services`.
pub fn dependency_impact(graph: &EntityGraph, entity_id: &str) -> DependencyImpact {
    let dependents = graph.dependents_of(entity_id);

    let max_rank = dependents
        .iter()
        .map(|d| d.criticality.rank())
        .max()
        .unwrap_or(Criticality::Low.rank());

    let affected_services = dependents
        .iter()
        .filter_map(|dep| {
            graph.entity(&dep.target_id).map(|entity| AffectedService {
                id: entity.id.clone(),
                name: entity.name.clone(),
                criticality: dep.criticality,
                dependency_type: dep.dependency_type,
            })
        })
        .collect();

    DependencyImpact {
        failed_entity: entity_id.to_string(),
        affected_services,
        impact_severity: Criticality::from_rank(max_rank),
    }
}

/// Depth-first trace of critical and high dependencies starting at `start_id`
///
/// Walks from each entity to what it depends on (edge sources), visiting
/// edges in insertion order. Every id appears once, in visit order; the start
/// id is always first even when it is not in the graph. This is a
/// reachability trace, not a shortest or weighted path.
pub fn critical_path(graph: &EntityGraph, start_id: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    trace_critical(graph, start_id, &mut visited, &mut path);
    path
}

fn trace_critical(
    graph: &EntityGraph,
    entity_id: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
) {
    if !visited.insert(entity_id.to_string()) {
        return;
    }
    path.push(entity_id.to_string());

    for dep in graph.dependencies_of(entity_id) {
        if dep.criticality.is_on_critical_path() {
            trace_critical(graph, &dep.source_id, visited, path);
        }
    }
}
