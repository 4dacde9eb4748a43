//! Domain types for the strata engine.
//!
//! These types represent the architecture inventory the engine reasons about:
//! - **Entities**: `Application`, `Interface`, `BusinessProcess`, `ChangeRequest`,
//!   `TechnicalProcess`, `Diagram` (stored by an `EntityStore`)
//! - **Edges**: `Relationship` (process hierarchy), `ProcessInterface`
//!   (interface participates in a process), `ImpactLink` (change request
//!   declares it touches an entity)
//! - **Payloads**: `New*` structs handed to the store for inserts
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Ids | Newtype per entity | Prevents passing an interface id where a process id is expected |
//! | Level | Enum not String | Level arithmetic (A→B→C) lives in one place |
//! | Status | Free-form for processes, enum for change requests | Only change-request status drives engine behaviour |
//! | Timestamps | `chrono::DateTime<Utc>` | Stored as RFC 3339 text in `SQLite` |

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Strongly-typed ID wrappers
// ============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Extract the raw i64 value.
            #[must_use]
            pub fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of an `Application` row.
    ApplicationId
);
entity_id!(
    /// Identifier of an `Interface` row.
    InterfaceId
);
entity_id!(
    /// Identifier of a `BusinessProcess` row.
    ProcessId
);
entity_id!(
    /// Identifier of a `ChangeRequest` row.
    ChangeRequestId
);
entity_id!(
    /// Identifier of a `TechnicalProcess` row.
    TechnicalProcessId
);

// ============================================================================
// Enums
// ============================================================================

/// Tier of a business process in the hierarchy.
///
/// Level is derived from position: roots are `A`, their children `B`, and
/// `B`'s children `C`. A level-`C` process is a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Strategic, top of the hierarchy.
    A,
    /// Operational.
    B,
    /// Tactical leaf.
    C,
}

impl Level {
    /// Level a child of this process takes, or `None` for a leaf level.
    #[must_use]
    pub fn child_level(self) -> Option<Self> {
        match self {
            Self::A => Some(Self::B),
            Self::B => Some(Self::C),
            Self::C => None,
        }
    }

    /// Zero-based depth of this level (A = 0).
    #[must_use]
    pub fn depth(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    /// Level found `depth` steps below the root, if the hierarchy is that deep.
    #[must_use]
    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Parse the database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestStatus {
    /// Being written, not yet visible to reviewers
    Draft,
    /// Submitted for review
    Submitted,
    /// Under review
    UnderReview,
    /// Approved, not started
    Approved,
    /// Being implemented
    InProgress,
    /// Done
    Completed,
    /// Rejected
    Rejected,
}

impl ChangeRequestStatus {
    /// Whether a change request in this status counts as an active change.
    ///
    /// Only `submitted`, `approved` and `in_progress` requests are active.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Submitted | Self::Approved | Self::InProgress)
    }

    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of hierarchy edge. Only containment exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// Parent contains child.
    #[default]
    Contains,
}

impl RelationshipType {
    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
        }
    }

    /// Parse the database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// An application in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Primary key.
    pub id: ApplicationId,
    /// Application master list number, unique.
    pub aml_number: String,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: String,
    /// Availability percentage, when measured.
    pub uptime: Option<f64>,
    /// Business criticality.
    pub criticality: Option<String>,
}

/// Data required to insert an application.
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    /// Application master list number.
    pub aml_number: String,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: String,
    /// Availability percentage.
    pub uptime: Option<f64>,
    /// Business criticality.
    pub criticality: Option<String>,
}

/// A directed integration between two applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    /// Primary key.
    pub id: InterfaceId,
    /// Interface master list number, unique.
    pub iml_number: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Application that provides the interface.
    pub provider_application_id: Option<ApplicationId>,
    /// Application that consumes the interface.
    pub consumer_application_id: Option<ApplicationId>,
    /// Technology, e.g. REST.
    pub interface_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Interface version.
    pub version: String,
    /// Last modification time.
    pub last_change_date: DateTime<Utc>,
}

/// Data required to insert an interface.
#[derive(Debug, Clone, Default)]
pub struct NewInterface {
    /// Interface master list number.
    pub iml_number: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Providing application.
    pub provider_application_id: Option<ApplicationId>,
    /// Consuming application.
    pub consumer_application_id: Option<ApplicationId>,
    /// Technology, e.g. REST.
    pub interface_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Interface version.
    pub version: String,
}

/// A business process at some level of the A/B/C hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProcess {
    /// Primary key.
    pub id: ProcessId,
    /// Display name.
    pub name: String,
    /// Line of business.
    pub lob: String,
    /// Product the process belongs to.
    pub product: String,
    /// Process version.
    pub version: String,
    /// Position in the A/B/C hierarchy.
    pub level: Level,
    /// Business owner.
    pub domain_owner: Option<String>,
    /// IT owner.
    pub it_owner: Option<String>,
    /// Vendor contact.
    pub vendor_focal: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a business process.
#[derive(Debug, Clone)]
pub struct NewBusinessProcess {
    /// Display name.
    pub name: String,
    /// Line of business.
    pub lob: String,
    /// Product the process belongs to.
    pub product: String,
    /// Process version.
    pub version: String,
    /// Position in the A/B/C hierarchy.
    pub level: Level,
    /// Business owner.
    pub domain_owner: Option<String>,
    /// IT owner.
    pub it_owner: Option<String>,
    /// Vendor contact.
    pub vendor_focal: Option<String>,
    /// Lifecycle status.
    pub status: String,
}

impl NewBusinessProcess {
    /// Minimal payload: a named process at `level`, version 1.0, active.
    #[must_use]
    pub fn named(name: impl Into<String>, level: Level) -> Self {
        Self {
            name: name.into(),
            lob: String::new(),
            product: String::new(),
            version: "1.0".to_string(),
            level,
            domain_owner: None,
            it_owner: None,
            vendor_focal: None,
            status: "active".to_string(),
        }
    }
}

impl From<&BusinessProcess> for NewBusinessProcess {
    fn from(bp: &BusinessProcess) -> Self {
        Self {
            name: bp.name.clone(),
            lob: bp.lob.clone(),
            product: bp.product.clone(),
            version: bp.version.clone(),
            level: bp.level,
            domain_owner: bp.domain_owner.clone(),
            it_owner: bp.it_owner.clone(),
            vendor_focal: bp.vendor_focal.clone(),
            status: bp.status.clone(),
        }
    }
}

/// A hierarchy edge: `parent` contains `child` at position `sequence_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Primary key.
    pub id: i64,
    /// Containing process.
    pub parent_process_id: ProcessId,
    /// Contained process.
    pub child_process_id: ProcessId,
    /// Kind of edge.
    pub relationship_type: RelationshipType,
    /// Ordering among siblings.
    pub sequence_number: i64,
}

/// Data required to insert a hierarchy edge.
#[derive(Debug, Clone, Copy)]
pub struct NewRelationship {
    /// Containing process.
    pub parent: ProcessId,
    /// Contained process.
    pub child: ProcessId,
    /// Kind of edge.
    pub relationship_type: RelationshipType,
    /// Ordering among siblings.
    pub sequence_number: i64,
}

/// A process reached over one hierarchy edge, annotated with that edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencedProcess {
    /// The reached process.
    #[serde(flatten)]
    pub process: BusinessProcess,
    /// Id of the traversed edge.
    pub relationship_id: i64,
    /// Sequence number of the traversed edge.
    pub sequence_number: i64,
}

/// An interface participating at a given step of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInterface {
    /// Primary key.
    pub id: i64,
    /// Process using the interface.
    pub business_process_id: ProcessId,
    /// Interface used.
    pub interface_id: InterfaceId,
    /// Step within the process.
    pub sequence_number: i64,
    /// Free-form note.
    pub description: Option<String>,
}

/// Data required to insert a process/interface assignment.
#[derive(Debug, Clone)]
pub struct NewProcessInterface {
    /// Process using the interface.
    pub business_process_id: ProcessId,
    /// Interface used.
    pub interface_id: InterfaceId,
    /// Step within the process.
    pub sequence_number: i64,
    /// Free-form note.
    pub description: Option<String>,
}

/// A proposed change to the landscape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    /// Primary key.
    pub id: ChangeRequestId,
    /// Change request number.
    pub cr_number: String,
    /// Short title.
    pub title: String,
    /// Workflow status.
    pub status: ChangeRequestStatus,
    /// Priority label.
    pub priority: Option<String>,
}

/// Data required to insert a change request.
#[derive(Debug, Clone)]
pub struct NewChangeRequest {
    /// Change request number.
    pub cr_number: String,
    /// Short title.
    pub title: String,
    /// Workflow status.
    pub status: ChangeRequestStatus,
    /// Priority label.
    pub priority: Option<String>,
}

/// A batch job or automated flow owned by an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalProcess {
    /// Primary key.
    pub id: TechnicalProcessId,
    /// Display name.
    pub name: String,
    /// Scheduler job name.
    pub job_name: String,
    /// Owning application.
    pub application_id: Option<ApplicationId>,
    /// Criticality label.
    pub criticality: String,
    /// Lifecycle status.
    pub status: String,
}

/// Data required to insert a technical process.
#[derive(Debug, Clone)]
pub struct NewTechnicalProcess {
    /// Display name.
    pub name: String,
    /// Scheduler job name.
    pub job_name: String,
    /// Owning application.
    pub application_id: Option<ApplicationId>,
    /// Criticality label.
    pub criticality: String,
    /// Lifecycle status.
    pub status: String,
}

/// A change request's declared impact on one entity.
///
/// The same shape backs all three impact join tables; `T` is the id type of
/// the impacted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactLink<T> {
    /// Primary key.
    pub id: i64,
    /// Declaring change request.
    pub change_request_id: ChangeRequestId,
    /// Impacted entity.
    pub entity_id: T,
    /// Declared impact type.
    pub impact_type: Option<String>,
    /// Declared impact description.
    pub impact_description: Option<String>,
}

/// Impact row payload used when replacing a change request's declared impacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImpactLink<T> {
    /// Impacted entity.
    pub entity_id: T,
    /// Declared impact type.
    pub impact_type: Option<String>,
    /// Declared impact description.
    pub impact_description: Option<String>,
}

/// A cached rendering of a process's interface flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    /// Primary key.
    pub id: i64,
    /// Process the diagram depicts.
    pub business_process_id: ProcessId,
    /// Serialized diagram source.
    pub diagram_data: String,
    /// Time the diagram was saved.
    pub updated_at: DateTime<Utc>,
}
