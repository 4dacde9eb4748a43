//! Impact propagation engine.
//!
//! Given seed applications, interfaces or change requests, an analysis
//! gathers the direct edges of each seed, expands at most one further hop,
//! maps every touched interface to business processes through the
//! assignment table, and classifies the result with a [`RiskTable`](crate::risk::RiskTable).
//!
//! Analyses are read-only and never raise for unknown seeds: they return
//! `Ok(None)` when nothing resolves and silently skip the ids that don't.
//! Only store failures surface as `Err`.
//!
//! ## Module Structure
//!
//! - `application` - single and multi application analyses
//! - `change_request` - single and multi change-request analyses
//! - `interface` - multi-interface analysis
//! - `report` - serializable result types

mod application;
mod change_request;
mod interface;
pub mod report;

pub use report::{
    ActiveChangeRequest, AnnotatedInterface, AnnotatedTechnicalProcess, ApplicationImpact,
    ApplicationSeed, ApplicationSummary, ChangeRequestImpact, ChangeRequestSeed,
    ChangeRequestSummary, ImpactNote, ImpactedApplication, ImpactedInterface, ImpactedProcess,
    ImpactedTechnicalProcess, InterfaceImpact, InterfaceSummary, ProcessImpact,
    RelatedChangeRequest,
};

use std::collections::HashMap;

use tracing::warn;

use crate::error::Result;
use crate::risk::RiskTables;
use crate::store::EntityStore;
use crate::types::{ApplicationId, BusinessProcess, Interface, InterfaceId, ProcessId};
use report::UNKNOWN_APPLICATION;

/// Read-only impact analyses over a store.
pub struct ImpactAnalyzer<'a, S: EntityStore + ?Sized> {
    store: &'a S,
    risk: &'a RiskTables,
}

impl<'a, S: EntityStore + ?Sized> ImpactAnalyzer<'a, S> {
    /// Analyze `store`, classifying risk with `risk`.
    pub fn new(store: &'a S, risk: &'a RiskTables) -> Self {
        Self { store, risk }
    }

    /// Names of `ids`, keyed by id. Unresolved ids are absent.
    fn application_names(
        &self,
        ids: impl IntoIterator<Item = ApplicationId>,
    ) -> Result<HashMap<ApplicationId, String>> {
        let mut ids: Vec<ApplicationId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(self
            .store
            .applications(&ids)?
            .into_iter()
            .map(|app| (app.id, app.name))
            .collect())
    }

    /// Every assignment of `interfaces`, resolved to its process, as `direct` rows.
    ///
    /// Rows appear in assignment id order. Assignments whose process no longer
    /// resolves are skipped.
    fn assigned_processes(&self, interfaces: &[InterfaceId]) -> Result<Vec<ImpactedProcess>> {
        let assignments = self.store.process_interfaces_for_interfaces(interfaces)?;
        let mut cache: HashMap<ProcessId, Option<BusinessProcess>> = HashMap::new();
        let mut rows = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let id = assignment.business_process_id;
            let process = match cache.get(&id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.store.process(id)?;
                    cache.insert(id, fetched.clone());
                    fetched
                }
            };
            let Some(business_process) = process else {
                warn!(
                    assignment_id = assignment.id,
                    process_id = %id,
                    "Interface assignment references a missing business process"
                );
                continue;
            };
            rows.push(ImpactedProcess {
                business_process,
                interface_id: assignment.interface_id,
                sequence_number: Some(assignment.sequence_number),
                impact_type: ProcessImpact::Direct,
            });
        }

        Ok(rows)
    }
}

/// Lookup for provider/consumer names.
fn counterpart_name(
    names: &HashMap<ApplicationId, String>,
    id: Option<ApplicationId>,
) -> String {
    id.and_then(|id| names.get(&id).cloned())
        .unwrap_or_else(|| UNKNOWN_APPLICATION.to_string())
}

/// Annotate `interface` with both counterpart names.
fn annotate(
    interface: Interface,
    names: &HashMap<ApplicationId, String>,
    source_application_id: Option<ApplicationId>,
) -> AnnotatedInterface {
    AnnotatedInterface {
        provider_application_name: counterpart_name(names, interface.provider_application_id),
        consumer_application_name: counterpart_name(names, interface.consumer_application_id),
        interface,
        source_application_id,
    }
}

/// Keep the first row per key, preserving order.
fn dedup_by_key<T, K, F>(rows: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + std::hash::Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = std::collections::HashSet::new();
    rows.into_iter().filter(|row| seen.insert(key(row))).collect()
}
