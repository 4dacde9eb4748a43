//! Application impact: who is affected when one or more applications change.
//!
//! Propagation follows the "provides to" direction only. Consumers of a
//! seed's provided interfaces are direct; consumers of what *those*
//! applications provide are indirect. Providers of a seed's consumed
//! interfaces are direct but never expanded.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use super::report::{
    ActiveChangeRequest, AnnotatedInterface, ApplicationImpact, ApplicationSeed,
    ApplicationSummary, ImpactNote, ImpactedApplication, ImpactedInterface, distinct_processes,
};
use super::{ImpactAnalyzer, annotate, dedup_by_key};
use crate::error::Result;
use crate::risk::{RiskCounts, RiskTable};
use crate::store::EntityStore;
use crate::types::{Application, ApplicationId, ChangeRequestId};

const PROVIDER_NOTE: &str = "Application provides this interface";
const CONSUMER_NOTE: &str = "Application consumes this interface";
const DIRECT_NOTE: &str = "Directly connected through interfaces";
const INDIRECT_NOTE: &str = "Indirectly impacted through interface dependencies";

impl<S: EntityStore + ?Sized> ImpactAnalyzer<'_, S> {
    /// Impact of changing one application.
    ///
    /// Returns `None` if the application does not exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn analyze_application(&self, id: ApplicationId) -> Result<Option<ApplicationImpact>> {
        let Some(application) = self.store.application(id)? else {
            debug!(application_id = %id, "Application impact requested for unknown id");
            return Ok(None);
        };
        let seeds = vec![application.clone()];
        self.collect_applications(&seeds, ApplicationSeed::Single(application), &self.risk.application)
            .map(Some)
    }

    /// Impact of changing several applications at once.
    ///
    /// Ids that don't resolve are ignored; returns `None` if none do.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn analyze_applications(&self, ids: &[ApplicationId]) -> Result<Option<ApplicationImpact>> {
        let seeds = self.store.applications(ids)?;
        if seeds.is_empty() {
            debug!(requested = ids.len(), "No application in impact request resolved");
            return Ok(None);
        }
        self.collect_applications(
            &seeds,
            ApplicationSeed::Many(seeds.clone()),
            &self.risk.multi_application,
        )
        .map(Some)
    }

    fn collect_applications(
        &self,
        seeds: &[Application],
        seed: ApplicationSeed,
        table: &RiskTable,
    ) -> Result<ApplicationImpact> {
        let multi = matches!(seed, ApplicationSeed::Many(_));
        let seed_ids: Vec<ApplicationId> = seeds.iter().map(|a| a.id).collect();
        let is_seed = |id: &ApplicationId| seed_ids.contains(id);
        // Interfaces of a multi-seed report remember the seed they came from.
        let source = |id: Option<ApplicationId>| if multi { id } else { None };

        let provided_raw = self.store.interfaces_provided_by(&seed_ids)?;
        let consumed_raw = self.store.interfaces_consumed_by(&seed_ids)?;

        let names = self.application_names(
            seed_ids.iter().copied().chain(
                provided_raw
                    .iter()
                    .chain(&consumed_raw)
                    .flat_map(|i| [i.provider_application_id, i.consumer_application_id])
                    .flatten(),
            ),
        )?;

        // First hop, both directions.
        let mut related: BTreeSet<ApplicationId> = BTreeSet::new();
        let mut first_hop_consumers: BTreeSet<ApplicationId> = BTreeSet::new();
        for interface in &provided_raw {
            if let Some(consumer) = interface.consumer_application_id.filter(|c| !is_seed(c)) {
                related.insert(consumer);
                first_hop_consumers.insert(consumer);
            }
        }
        for interface in &consumed_raw {
            if let Some(provider) = interface.provider_application_id.filter(|p| !is_seed(p)) {
                related.insert(provider);
            }
        }

        // Second hop, provider direction only.
        let mut indirect: HashSet<ApplicationId> = HashSet::new();
        let hop_ids: Vec<ApplicationId> = first_hop_consumers.iter().copied().collect();
        for interface in self.store.interfaces_provided_by(&hop_ids)? {
            if let Some(consumer) = interface.consumer_application_id.filter(|c| !is_seed(c))
                && related.insert(consumer)
            {
                indirect.insert(consumer);
            }
        }

        let related_ids: Vec<ApplicationId> = related.into_iter().collect();
        let related_applications = self.store.applications(&related_ids)?;

        let provided_interfaces: Vec<AnnotatedInterface> = provided_raw
            .into_iter()
            .map(|i| {
                let from = source(i.provider_application_id);
                annotate(i, &names, from)
            })
            .collect();
        let consumed_interfaces: Vec<AnnotatedInterface> = consumed_raw
            .into_iter()
            .map(|i| {
                let from = source(i.consumer_application_id);
                annotate(i, &names, from)
            })
            .collect();

        let mut interface_ids: Vec<_> = provided_interfaces
            .iter()
            .chain(&consumed_interfaces)
            .map(|i| i.interface.id)
            .collect();
        interface_ids.sort_unstable();
        interface_ids.dedup();
        let impacted_business_processes = self.assigned_processes(&interface_ids)?;

        let active_change_requests = self.active_change_requests(&seed_ids, multi)?;

        let impacted_interfaces: Vec<ImpactedInterface> = provided_interfaces
            .iter()
            .map(|i| ImpactedInterface {
                interface: i.clone(),
                impact: ImpactNote::derived("provider", PROVIDER_NOTE),
            })
            .chain(consumed_interfaces.iter().map(|i| ImpactedInterface {
                interface: i.clone(),
                impact: ImpactNote::derived("consumer", CONSUMER_NOTE),
            }))
            .collect();

        let impacted_applications: Vec<ImpactedApplication> = related_applications
            .iter()
            .map(|app| ImpactedApplication {
                application: app.clone(),
                impact: if indirect.contains(&app.id) {
                    ImpactNote::derived("indirect", INDIRECT_NOTE)
                } else {
                    ImpactNote::derived("direct", DIRECT_NOTE)
                },
            })
            .collect();

        let counts = RiskCounts {
            interfaces: provided_interfaces.len() + consumed_interfaces.len(),
            change_requests: active_change_requests.len(),
            business_processes: distinct_processes(&impacted_business_processes),
            total_impact: 0,
        };
        let risk_level = table.classify(&counts);

        debug!(
            seeds = seed_ids.len(),
            interfaces = counts.interfaces,
            related = related_applications.len(),
            indirect = indirect.len(),
            processes = counts.business_processes,
            risk = %risk_level,
            "Analyzed application impact"
        );

        Ok(ApplicationImpact {
            seed,
            impact_summary: ApplicationSummary {
                total_interfaces: counts.interfaces,
                total_applications: related_applications.len(),
                related_applications: related_applications.len(),
                active_changes: active_change_requests.len(),
                total_business_processes: counts.business_processes,
                risk_level,
            },
            provided_interfaces,
            consumed_interfaces,
            related_applications,
            active_change_requests,
            impacted_applications,
            impacted_interfaces,
            impacted_business_processes,
        })
    }

    /// Active change-request join rows declaring impact on any of `apps`.
    ///
    /// A single seed keeps every row; a multi-seed report keeps one row per
    /// change request.
    fn active_change_requests(
        &self,
        apps: &[ApplicationId],
        multi: bool,
    ) -> Result<Vec<ActiveChangeRequest>> {
        let links = self.store.application_change_links(apps)?;
        let mut cr_ids: Vec<ChangeRequestId> = links.iter().map(|l| l.change_request_id).collect();
        cr_ids.sort_unstable();
        cr_ids.dedup();
        let change_requests = self.store.change_requests(&cr_ids)?;

        let rows = links
            .iter()
            .filter_map(|link| {
                let change_request = change_requests
                    .iter()
                    .find(|cr| cr.id == link.change_request_id)?;
                change_request.status.is_active().then(|| ActiveChangeRequest {
                    change_request: change_request.clone(),
                    impact_type: link.impact_type.clone(),
                    impact_description: link.impact_description.clone(),
                    related_application_id: multi.then_some(link.entity_id),
                })
            })
            .collect();

        if multi {
            Ok(dedup_by_key(rows, |row: &ActiveChangeRequest| row.change_request.id))
        } else {
            Ok(rows)
        }
    }
}
