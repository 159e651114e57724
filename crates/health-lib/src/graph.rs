//! Entity graph: entity definitions and dependency edges
//!
//! The graph is built once from a static model document (or a sample model
//! factory) and is read-only while queries run. Dependency queries are linear
//! scans over the edge list, which keeps them in insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::ModelError;
use crate::models::{Dependency, Entity};
use crate::ordered::OrderedMap;

fn default_version() -> String {
    "1.0.0".to_string()
}

// Explicit nulls in the document load the same as absent keys.

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_default_version<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_version))
}

fn null_as_now<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    Ok(Option::<DateTime<Utc>>::deserialize(d)?.unwrap_or_else(Utc::now))
}

/// Identity and bookkeeping of a health model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub model_id: String,
    pub model_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub owner_team: String,
    #[serde(default = "default_version", deserialize_with = "null_as_default_version")]
    pub version: String,
    #[serde(default = "Utc::now", deserialize_with = "null_as_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", deserialize_with = "null_as_now")]
    pub last_modified: DateTime<Utc>,
}

/// On-disk model document
#[derive(Deserialize)]
struct ModelDocument {
    #[serde(flatten)]
    info: ModelInfo,
    #[serde(default)]
    entities: OrderedMap<Entity>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

/// Entities and the dependency edges between them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityGraph {
    #[serde(flatten)]
    info: ModelInfo,
    entities: OrderedMap<Entity>,
    dependencies: Vec<Dependency>,
}

impl EntityGraph {
    pub fn new(
        model_id: impl Into<String>,
        model_name: impl Into<String>,
        description: impl Into<String>,
        owner_team: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            info: ModelInfo {
                model_id: model_id.into(),
                model_name: model_name.into(),
                description: description.into(),
                owner_team: owner_team.into(),
                version: default_version(),
                created_at: now,
                last_modified: now,
            },
            entities: OrderedMap::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Insert or overwrite an entity by id. Last write wins.
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
        self.info.last_modified = Utc::now();
    }

    /// Append a dependency edge. Endpoints are not validated.
    pub fn add_dependency(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
        self.info.last_modified = Utc::now();
    }

    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.get(entity_id)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    /// Entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Edges this entity depends on (`target_id == entity_id`)
    pub fn dependencies_of(&self, entity_id: &str) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.target_id == entity_id)
            .collect()
    }

    /// Edges that depend on this entity (`source_id == entity_id`)
    pub fn dependents_of(&self, entity_id: &str) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.source_id == entity_id)
            .collect()
    }

    /// Parse a model document
    ///
    /// Entities are keyed by their own `id`, not the document key. Unknown
    /// entity types, criticalities or dependency types are rejected.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let document: ModelDocument = serde_json::from_str(json)?;
        let ModelInfo {
            created_at,
            last_modified,
            ..
        } = document.info;

        let mut graph = Self {
            info: document.info,
            entities: OrderedMap::new(),
            dependencies: Vec::new(),
        };
        for (_, entity) in document.entities {
            graph.add_entity(entity);
        }
        for dependency in document.dependencies {
            graph.add_dependency(dependency);
        }

        graph.info.created_at = created_at;
        graph.info.last_modified = last_modified;
        Ok(graph)
    }

    /// Load a model document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export the model document to a file
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let content = self.to_json_pretty()?;
        std::fs::write(path, content).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
