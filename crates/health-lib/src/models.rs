//! Core data models for the health model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of monitored unit in the health model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Workload,
    Service,
    Database,
    #[serde(rename = "virtual_machine", alias = "vm")]
    Vm,
    Container,
    Api,
    LoadBalancer,
    Cache,
    MessageQueue,
    Custom,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Workload => "workload",
            EntityType::Service => "service",
            EntityType::Database => "database",
            EntityType::Vm => "virtual_machine",
            EntityType::Container => "container",
            EntityType::Api => "api",
            EntityType::LoadBalancer => "load_balancer",
            EntityType::Cache => "cache",
            EntityType::MessageQueue => "message_queue",
            EntityType::Custom => "custom",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a dependent entity relies on its dependency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    #[default]
    Direct,
    Indirect,
    Optional,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Direct => "direct",
            DependencyType::Indirect => "indirect",
            DependencyType::Optional => "optional",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity rank of a dependency edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Critical,
    #[default]
    High,
    Medium,
    Low,
}

impl Criticality {
    /// Rank used for impact severity: critical 3, high 2, medium 1, low 0
    pub fn rank(&self) -> u8 {
        match self {
            Criticality::Critical => 3,
            Criticality::High => 2,
            Criticality::Medium => 1,
            Criticality::Low => 0,
        }
    }

    /// Inverse of [`Criticality::rank`]; ranks above 3 clamp to critical
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Criticality::Low,
            1 => Criticality::Medium,
            2 => Criticality::High,
            _ => Criticality::Critical,
        }
    }

    /// Critical and high edges form the critical path
    pub fn is_on_critical_path(&self) -> bool {
        matches!(self, Criticality::Critical | Criticality::High)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Critical => "critical",
            Criticality::High => "high",
            Criticality::Medium => "medium",
            Criticality::Low => "low",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity in the health model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub description: String,
    /// Display grouping only, not validated against the graph
    #[serde(rename = "parentEntityId", default)]
    pub parent_id: Option<String>,
    #[serde(rename = "azureResourceId", default)]
    pub resource_id: Option<String>,
    /// Signal role name -> signal definition id
    #[serde(default)]
    pub signals: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_type: EntityType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type,
            description: description.into(),
            parent_id: None,
            resource_id: None,
            signals: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_signal(mut self, role: impl Into<String>, signal_id: impl Into<String>) -> Self {
        self.signals.insert(role.into(), signal_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Directed edge: `target` requires `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The entity being depended upon
    #[serde(rename = "sourceEntityId")]
    pub source_id: String,
    /// The entity that depends
    #[serde(rename = "targetEntityId")]
    pub target_id: String,
    #[serde(rename = "dependencyType", default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub criticality: Criticality,
}

impl Dependency {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            dependency_type: DependencyType::default(),
            criticality: Criticality::default(),
        }
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = criticality;
        self
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }
}

/// Health state reported by the health model API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
    #[default]
    Unknown,
}

impl HealthState {
    /// Case-insensitive parse; anything unrecognised is `Unknown`
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "healthy" => HealthState::Healthy,
            "degraded" => HealthState::Degraded,
            "unhealthy" => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }

    pub fn color(&self) -> StateColor {
        match self {
            HealthState::Healthy => StateColor::Green,
            HealthState::Degraded => StateColor::Amber,
            HealthState::Unhealthy => StateColor::Red,
            HealthState::Unknown => StateColor::Gray,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            HealthState::Healthy => "HEALTHY",
            HealthState::Degraded => "DEGRADED",
            HealthState::Unhealthy => "UNHEALTHY",
            HealthState::Unknown => "UNKNOWN",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "Healthy",
            HealthState::Degraded => "Degraded",
            HealthState::Unhealthy => "Unhealthy",
            HealthState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traffic-light color for a health state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateColor {
    Green,
    Amber,
    Red,
    Gray,
}

impl StateColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateColor::Green => "green",
            StateColor::Amber => "amber",
            StateColor::Red => "red",
            StateColor::Gray => "gray",
        }
    }
}

impl fmt::Display for StateColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time health state of one entity
///
/// `state_color` and `state_code` are always derived from `state`; use the
/// constructors or [`HealthRecord::set_state`] rather than assigning them.
/// Deserialization re-derives both from `state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHealthRecord")]
pub struct HealthRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    pub state: HealthState,
    pub state_code: String,
    pub state_color: StateColor,
    pub timestamp: Option<String>,
    pub signals: Vec<Value>,
    pub details: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Loose on-disk form of a record; any state string is accepted
#[derive(Deserialize)]
struct RawHealthRecord {
    #[serde(default)]
    entity_id: Option<String>,
    #[serde(default)]
    entity_name: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    signals: Vec<Value>,
    #[serde(default)]
    details: Map<String, Value>,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawHealthRecord> for HealthRecord {
    fn from(raw: RawHealthRecord) -> Self {
        let mut record = HealthRecord::placeholder();
        record.set_state(raw.state.as_deref().map(HealthState::parse).unwrap_or_default());
        record.entity_id = raw.entity_id;
        record.entity_name = raw.entity_name;
        record.timestamp = raw.timestamp;
        record.signals = raw.signals;
        record.details = raw.details;
        record.error = raw.error;
        record
    }
}

impl HealthRecord {
    pub fn new(entity_id: impl Into<String>, state: HealthState) -> Self {
        let mut record = Self::placeholder();
        record.entity_id = Some(entity_id.into());
        record.set_state(state);
        record
    }

    /// Default record for an entity with no health data
    pub fn unknown(entity_id: impl Into<String>) -> Self {
        Self::new(entity_id, HealthState::Unknown)
    }

    /// Record with no identity, used when there is nothing to report
    pub fn placeholder() -> Self {
        Self {
            entity_id: None,
            entity_name: None,
            state: HealthState::Unknown,
            state_code: HealthState::Unknown.code().to_string(),
            state_color: StateColor::Gray,
            timestamp: None,
            signals: Vec::new(),
            details: Map::new(),
            error: None,
        }
    }

    /// Unknown record standing in for a failed fetch
    pub fn from_error(entity_id: impl Into<String>, error: impl Into<String>) -> Self {
        let mut record = Self::unknown(entity_id);
        record.error = Some(error.into());
        record.timestamp = Some(chrono::Utc::now().to_rfc3339());
        record
    }

    pub fn set_state(&mut self, state: HealthState) {
        self.state = state;
        self.state_code = state.code().to_string();
        self.state_color = state.color();
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// `details.kind`, if it is a string
    pub fn kind(&self) -> Option<&str> {
        self.details.get("kind").and_then(Value::as_str)
    }

    /// `details.displayName`, if it is a string
    pub fn display_name(&self) -> Option<&str> {
        self.details.get("displayName").and_then(Value::as_str)
    }
}
