use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The closed set of record kinds, declared in sort precedence order.
/// Lower kinds are referenced by higher kinds (a service points at its
/// segment, tribe and environment), so publishing walks ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Classification,
    Segment,
    Tribe,
    Environment,
    Service,
}

impl Kind {
    pub fn all() -> &'static [Kind] {
        &[
            Kind::Classification,
            Kind::Segment,
            Kind::Tribe,
            Kind::Environment,
            Kind::Service,
        ]
    }

    /// Single-digit sort precedence used as the leading byte of an entry's
    /// sort key.
    pub fn digit(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Classification => "classification",
            Kind::Segment => "segment",
            Kind::Tribe => "tribe",
            Kind::Environment => "environment",
            Kind::Service => "service",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Kind {
    type Err = crate::error::PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classification" => Ok(Kind::Classification),
            "segment" => Ok(Kind::Segment),
            "tribe" => Ok(Kind::Tribe),
            "environment" => Ok(Kind::Environment),
            "service" => Ok(Kind::Service),
            _ => Err(crate::error::PublishError::InvalidKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Service onboarding phase. Only services carry a meaningful value; every
/// other kind reports `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Unset,
    Draft,
    Production,
    Other,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Unset => "unset",
            Phase::Draft => "draft",
            Phase::Production => "production",
            Phase::Other => "other",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Execution mode of a run. Interactive runs plan first, then ask the
/// operator whether to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    ReadOnly,
    ReadWrite,
    Interactive,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::ReadOnly => "read-only",
            Mode::ReadWrite => "read-write",
            Mode::Interactive => "interactive",
        }
    }

    pub fn writes_enabled(self) -> bool {
        matches!(self, Mode::ReadWrite)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WriteScope
// ---------------------------------------------------------------------------

/// Whether a registry write carries subordinate data along with the record
/// itself. Staging destinations take everything; production takes the
/// record only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScope {
    All,
    RecordOnly,
}

impl WriteScope {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteScope::All => "all",
            WriteScope::RecordOnly => "record-only",
        }
    }
}

// ---------------------------------------------------------------------------
// IgnoreReason
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    StagingMarker,
    NonProductionPhase,
    TestEntry,
    Incremental,
}

impl IgnoreReason {
    pub fn all() -> &'static [IgnoreReason] {
        &[
            IgnoreReason::StagingMarker,
            IgnoreReason::NonProductionPhase,
            IgnoreReason::TestEntry,
            IgnoreReason::Incremental,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreReason::StagingMarker => "staging-only marker",
            IgnoreReason::NonProductionPhase => "non-production phase",
            IgnoreReason::TestEntry => "test entry",
            IgnoreReason::Incremental => "incremental: not in source input",
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    NotModified,
    Locked,
    Native,
    Ignore(IgnoreReason),
    Error,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Create => "CREATE",
            ActionKind::Update => "UPDATE",
            ActionKind::Delete => "DELETE",
            ActionKind::NotModified => "NOT_MODIFIED",
            ActionKind::Locked => "LOCKED",
            ActionKind::Native => "NATIVE",
            ActionKind::Ignore(_) => "IGNORE",
            ActionKind::Error => "ERROR",
        }
    }

    /// True for actions that issue a registry write in read-write mode.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            ActionKind::Create | ActionKind::Update | ActionKind::Delete
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Ignore(reason) => write!(f, "IGNORE ({reason})"),
            other => f.write_str(other.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
