//! The five catalog record kinds behind one tagged enum.
//!
//! The publisher never looks inside kind-specific payloads except through
//! the shared accessor surface; everything else rides along untouched so a
//! record round-trips byte-for-byte through the engine.

use crate::tags::TagSet;
use crate::types::{Kind, Phase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kind payloads
// ---------------------------------------------------------------------------

/// A service classification. Keyed by the canonical service name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(default = "default_true")]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(default = "default_true")]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tribe {
    pub id: String,
    pub name: String,
    /// Segment id this tribe belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(default = "default_true")]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    /// Tribe id this environment belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tribe: Option<String>,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(default = "default_true")]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Canonical service name; doubles as the entry id.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tribe: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<String>,
    #[serde(default)]
    pub onboarding_phase: Phase,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(default = "default_true")]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Classification(Classification),
    Segment(Segment),
    Tribe(Tribe),
    Environment(Environment),
    Service(Service),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Record::Classification(_) => Kind::Classification,
            Record::Segment(_) => Kind::Segment,
            Record::Tribe(_) => Kind::Tribe,
            Record::Environment(_) => Kind::Environment,
            Record::Service(_) => Kind::Service,
        }
    }

    /// Globally unique id within the kind. Services and classifications key
    /// on the canonical service name; the rest use registry-assigned ids.
    pub fn id(&self) -> &str {
        match self {
            Record::Classification(c) => &c.name,
            Record::Segment(s) => &s.id,
            Record::Tribe(t) => &t.id,
            Record::Environment(e) => &e.id,
            Record::Service(s) => &s.name,
        }
    }

    /// One-line summary for audit log lines.
    pub fn display_name(&self) -> String {
        match self {
            Record::Classification(c) => format!("classification '{}'", c.name),
            Record::Segment(s) => format!("segment '{}' ({})", s.name, s.id),
            Record::Tribe(t) => format!("tribe '{}' ({})", t.name, t.id),
            Record::Environment(e) => format!("environment '{}' ({})", e.name, e.id),
            Record::Service(s) => format!("service '{}'", s.name),
        }
    }

    pub fn tags(&self) -> &TagSet {
        match self {
            Record::Classification(c) => &c.tags,
            Record::Segment(s) => &s.tags,
            Record::Tribe(t) => &t.tags,
            Record::Environment(e) => &e.tags,
            Record::Service(s) => &s.tags,
        }
    }

    /// Only services carry a phase; everything else is `Unset`.
    pub fn onboarding_phase(&self) -> Phase {
        match self {
            Record::Service(s) => s.onboarding_phase,
            _ => Phase::Unset,
        }
    }

    /// False for records the registry manages natively and refuses writes on.
    pub fn is_updatable(&self) -> bool {
        match self {
            Record::Classification(c) => c.managed,
            Record::Segment(s) => s.managed,
            Record::Tribe(t) => t.managed,
            Record::Environment(e) => e.managed,
            Record::Service(s) => s.managed,
        }
    }

    /// Clear volatile audit fields before diffing. A no-op when publishing
    /// to a staging destination, where those fields are compared as-is.
    pub fn prepare_for_compare(&mut self, staging_only: bool) {
        if staging_only {
            return;
        }
        match self {
            Record::Classification(c) => c.revision = None,
            Record::Segment(s) => s.revision = None,
            Record::Tribe(t) => t.revision = None,
            Record::Environment(e) => e.revision = None,
            Record::Service(s) => {
                s.revision = None;
                s.last_modified = None;
                s.modified_by = None;
            }
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        // Serialization of these types cannot fail: no non-string map keys.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Stable single-line JSON for the audit output stream.
    pub fn to_json_line(&self) -> String {
        self.to_json_value().to_string()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn service(name: &str) -> Record {
        Record::Service(Service {
            name: name.to_string(),
            title: None,
            description: None,
            owner: Some("team-oss".to_string()),
            environment: None,
            tribe: None,
            classifications: Vec::new(),
            onboarding_phase: Phase::Production,
            tags: TagSet::new(),
            managed: true,
            revision: None,
            last_modified: None,
            modified_by: None,
        })
    }

    pub fn service_tagged(name: &str, tags: &[&str]) -> Record {
        let mut r = service(name);
        if let Record::Service(s) = &mut r {
            s.tags = tags.iter().copied().collect();
        }
        r
    }

    pub fn segment(id: &str, name: &str) -> Record {
        Record::Segment(Segment {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            tags: TagSet::new(),
            managed: true,
            revision: None,
        })
    }

    pub fn environment(id: &str, name: &str) -> Record {
        Record::Environment(Environment {
            id: id.to_string(),
            name: name.to_string(),
            tribe: None,
            tags: TagSet::new(),
            managed: true,
            revision: None,
        })
    }
}
