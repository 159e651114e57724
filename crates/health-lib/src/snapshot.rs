//! Health record snapshot
//!
//! A snapshot is the "current world" handed to the aggregation functions:
//! one record per entity id, in the order the data source produced them.
//! Lookups never come back empty; an absent id yields an `Unknown` record.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ModelError;
use crate::graph::EntityGraph;
use crate::models::HealthRecord;
use crate::ordered::OrderedMap;

/// Health records keyed by entity id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthSnapshot {
    records: OrderedMap<HealthRecord>,
}

impl HealthSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, record: HealthRecord) {
        self.records.insert(entity_id, record);
    }

    pub fn get(&self, entity_id: &str) -> Option<&HealthRecord> {
        self.records.get(entity_id)
    }

    /// Stored record, or an `Unknown`/gray record for an absent id
    pub fn record_for(&self, entity_id: &str) -> HealthRecord {
        self.records
            .get(entity_id)
            .cloned()
            .unwrap_or_else(|| HealthRecord::unknown(entity_id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record in source order
    pub fn first(&self) -> Option<(&str, &HealthRecord)> {
        self.records.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HealthRecord)> {
        self.records.iter()
    }

    /// Copy of this snapshot with an `Unknown` record appended for every
    /// graph entity that has no record yet
    pub fn completed_for(&self, graph: &EntityGraph) -> Self {
        let mut completed = self.clone();
        for entity in graph.entities() {
            if !completed.records.contains_key(&entity.id) {
                let mut record = HealthRecord::unknown(&entity.id);
                record.entity_name = Some(entity.name.clone());
                completed.insert(entity.id.clone(), record);
            }
        }
        completed
    }

    /// Load an offline snapshot (`{entity_id: record}`) from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FromIterator<(String, HealthRecord)> for HealthSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, HealthRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<HealthRecord> for HealthSnapshot {
    /// Keys each record by its `entity_id`; records without one are dropped
    fn from_iter<I: IntoIterator<Item = HealthRecord>>(iter: I) -> Self {
        iter.into_iter()
            .filter_map(|r| r.entity_id.clone().map(|id| (id, r)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entity, EntityType, HealthState, StateColor};

    #[test]
    fn test_record_for_defaults_to_unknown() {
        let snapshot: HealthSnapshot = vec![HealthRecord::new("api", HealthState::Healthy)]
            .into_iter()
            .collect();

        assert_eq!(snapshot.record_for("api").state, HealthState::Healthy);

        let missing = snapshot.record_for("db");
        assert_eq!(missing.state, HealthState::Unknown);
        assert_eq!(missing.state_color, StateColor::Gray);
        assert_eq!(missing.entity_id.as_deref(), Some("db"));
    }

    #[test]
    fn test_completed_for_appends_missing_entities() {
        let mut graph = EntityGraph::new("m", "Model", "", "");
        graph.add_entity(Entity::new("root", "Root", EntityType::Workload, ""));
        graph.add_entity(Entity::new("api", "API", EntityType::Api, ""));

        let snapshot: HealthSnapshot = vec![
            HealthRecord::new("external", HealthState::Degraded),
            HealthRecord::new("api", HealthState::Healthy),
        ]
        .into_iter()
        .collect();

        let completed = snapshot.completed_for(&graph);
        let ids: Vec<_> = completed.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["external", "api", "root"]);
        assert_eq!(completed.get("root").unwrap().state, HealthState::Unknown);
        assert_eq!(completed.get("root").unwrap().entity_name.as_deref(), Some("Root"));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let snapshot: HealthSnapshot = vec![
            HealthRecord::new("b", HealthState::Unhealthy).with_detail("displayName", "B"),
            HealthRecord::new("a", HealthState::Healthy),
        ]
        .into_iter()
        .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        snapshot.save(&path).unwrap();

        let loaded = HealthSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.first().unwrap().0, "b");
    }
}
