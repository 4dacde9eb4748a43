//! Impact report types.
//!
//! Every report serializes to the camelCase JSON document the HTTP layer
//! returns verbatim: the seed entity (or entities), the categorized impacted
//! sets, and an `impactSummary` with the counts and the risk level.

use serde::Serialize;

use crate::risk::RiskLevel;
use crate::types::{
    Application, ApplicationId, BusinessProcess, ChangeRequest, ChangeRequestId, ImpactLink,
    Interface, InterfaceId, TechnicalProcess,
};

/// Name reported for a counterpart application that does not resolve.
pub const UNKNOWN_APPLICATION: &str = "Unknown";

/// Why an entity shows up in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactNote {
    /// Kind of impact, e.g. `direct` or a declared `modification`.
    pub impact_type: Option<String>,
    /// Human-readable reason.
    pub impact_description: Option<String>,
    /// Declaring change request, set only when a report spans several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_request_id: Option<ChangeRequestId>,
}

impl ImpactNote {
    /// A note computed by the engine rather than declared on a change request.
    pub fn derived(impact_type: &str, description: &str) -> Self {
        Self {
            impact_type: Some(impact_type.to_string()),
            impact_description: Some(description.to_string()),
            change_request_id: None,
        }
    }

    /// The note carried by a change-request impact row.
    pub fn declared<T>(link: &ImpactLink<T>, with_change_request: bool) -> Self {
        Self {
            impact_type: link.impact_type.clone(),
            impact_description: link.impact_description.clone(),
            change_request_id: with_change_request.then_some(link.change_request_id),
        }
    }
}

/// An interface with its provider and consumer application names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedInterface {
    /// The interface itself.
    #[serde(flatten)]
    pub interface: Interface,
    /// Provider name, `Unknown` when unresolved.
    pub provider_application_name: String,
    /// Consumer name, `Unknown` when unresolved.
    pub consumer_application_name: String,
    /// Seed application the interface was found through (multi-seed reports).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_application_id: Option<ApplicationId>,
}

/// A technical process with its owning application's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTechnicalProcess {
    /// The technical process itself.
    #[serde(flatten)]
    pub technical_process: TechnicalProcess,
    /// Owning application's name, if any.
    pub application_name: Option<String>,
}

/// An application in a report with the reason it appears.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedApplication {
    /// The impacted application.
    pub application: Application,
    /// Why it is impacted.
    pub impact: ImpactNote,
}

/// An interface in a report with the side the seed sits on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedInterface {
    /// The impacted interface.
    pub interface: AnnotatedInterface,
    /// Why it is impacted.
    pub impact: ImpactNote,
}

/// A technical process declared on a change request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedTechnicalProcess {
    /// The impacted technical process.
    pub technical_process: AnnotatedTechnicalProcess,
    /// Why it is impacted.
    pub impact: ImpactNote,
}

/// How a business process is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessImpact {
    /// Through an interface assignment.
    Direct,
    /// Ancestor of a directly impacted process.
    Parent,
    /// Descendant of a directly impacted process.
    Child,
}

impl ProcessImpact {
    /// Lowercase name used in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }
}

/// A business process touched through an interface assignment or the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedProcess {
    /// The impacted process.
    pub business_process: BusinessProcess,
    /// Interface that led here; for `parent`/`child` rows, the interface of
    /// the direct process the walk started from.
    pub interface_id: InterfaceId,
    /// Step of the interface in the process; `None` for hierarchy rows.
    pub sequence_number: Option<i64>,
    /// How the process was reached.
    pub impact_type: ProcessImpact,
}

/// An active change request touching a seed application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveChangeRequest {
    /// The change request.
    #[serde(flatten)]
    pub change_request: ChangeRequest,
    /// Declared impact type of the join row.
    pub impact_type: Option<String>,
    /// Declared impact description of the join row.
    pub impact_description: Option<String>,
    /// Seed application the row belongs to (multi-seed reports).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_application_id: Option<ApplicationId>,
}

/// A change request declaring impact on one of the seed interfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedChangeRequest {
    /// The change request.
    pub change_request: ChangeRequest,
    /// Seed interface the row declares impact on.
    pub interface_id: InterfaceId,
    /// Declared impact of the row.
    pub impact: ImpactNote,
}

// ============================================================================
// Applications
// ============================================================================

/// Seed of an application report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ApplicationSeed {
    /// Report for one application.
    #[serde(rename = "application")]
    Single(Application),
    /// Report for several applications.
    #[serde(rename = "applications")]
    Many(Vec<Application>),
}

/// Counts and risk of an application report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    /// Provided plus consumed interfaces.
    pub total_interfaces: usize,
    /// Impacted applications.
    pub total_applications: usize,
    /// Related applications, same as `total_applications`.
    pub related_applications: usize,
    /// Active change-request rows.
    pub active_changes: usize,
    /// Distinct impacted processes.
    pub total_business_processes: usize,
    /// Classified risk.
    pub risk_level: RiskLevel,
}

/// Result of an application impact analysis (one or many seeds).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationImpact {
    /// Analysed application(s).
    #[serde(flatten)]
    pub seed: ApplicationSeed,
    /// Interfaces a seed provides.
    pub provided_interfaces: Vec<AnnotatedInterface>,
    /// Interfaces a seed consumes.
    pub consumed_interfaces: Vec<AnnotatedInterface>,
    /// Applications connected to a seed, seeds excluded.
    pub related_applications: Vec<Application>,
    /// Active change-request rows naming a seed.
    pub active_change_requests: Vec<ActiveChangeRequest>,
    /// Related applications tagged direct or indirect.
    pub impacted_applications: Vec<ImpactedApplication>,
    /// Provided and consumed interfaces tagged by side.
    pub impacted_interfaces: Vec<ImpactedInterface>,
    /// Processes using any of the interfaces.
    pub impacted_business_processes: Vec<ImpactedProcess>,
    /// Counts and risk.
    pub impact_summary: ApplicationSummary,
}

impl ApplicationImpact {
    /// Ids of every related application, seeds excluded.
    pub fn related_ids(&self) -> Vec<ApplicationId> {
        self.related_applications.iter().map(|a| a.id).collect()
    }
}

// ============================================================================
// Change requests
// ============================================================================

/// Seed of a change-request report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChangeRequestSeed {
    /// Report for one change request.
    #[serde(rename = "changeRequest")]
    Single(ChangeRequest),
    /// Report for several change requests.
    #[serde(rename = "changeRequests")]
    Many(Vec<ChangeRequest>),
}

/// Counts and risk of a change-request report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestSummary {
    /// Declared application impacts.
    pub total_applications: usize,
    /// Declared interface impacts.
    pub total_interfaces: usize,
    /// Distinct impacted processes.
    pub total_business_processes: usize,
    /// Declared technical-process impacts.
    pub total_technical_processes: usize,
    /// Number of change requests analysed (multi-seed reports only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_changes: Option<usize>,
    /// Classified risk.
    pub risk_level: RiskLevel,
}

/// Result of a change-request impact analysis (one or many seeds).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestImpact {
    /// Analysed change request(s).
    #[serde(flatten)]
    pub seed: ChangeRequestSeed,
    /// Declared application impacts.
    pub impacted_applications: Vec<ImpactedApplication>,
    /// Declared interface impacts.
    pub impacted_interfaces: Vec<ImpactedInterface>,
    /// Direct processes plus their ancestors and descendants.
    pub impacted_business_processes: Vec<ImpactedProcess>,
    /// Declared technical-process impacts.
    pub impacted_technical_processes: Vec<ImpactedTechnicalProcess>,
    /// Counts and risk.
    pub impact_summary: ChangeRequestSummary,
}

// ============================================================================
// Interfaces
// ============================================================================

/// Counts and risk of an interface report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceSummary {
    /// Related applications.
    pub total_applications: usize,
    /// Resolved seed interfaces.
    pub total_interfaces: usize,
    /// Distinct impacted processes.
    pub total_business_processes: usize,
    /// Change-request rows naming a seed.
    pub related_change_requests: usize,
    /// Classified risk.
    pub risk_level: RiskLevel,
}

/// Result of a multi-interface impact analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceImpact {
    /// Resolved seed interfaces.
    pub interfaces: Vec<Interface>,
    /// Change-request rows naming a seed.
    pub related_change_requests: Vec<RelatedChangeRequest>,
    /// Providers and consumers of the seeds.
    pub related_applications: Vec<Application>,
    /// Related applications tagged by side.
    pub impacted_applications: Vec<ImpactedApplication>,
    /// Processes using the seeds.
    pub impacted_business_processes: Vec<ImpactedProcess>,
    /// Counts and risk.
    pub impact_summary: InterfaceSummary,
}

/// Number of distinct processes in `rows`.
pub(crate) fn distinct_processes(rows: &[ImpactedProcess]) -> usize {
    rows.iter()
        .map(|row| row.business_process.id)
        .collect::<std::collections::HashSet<_>>()
        .len()
}
