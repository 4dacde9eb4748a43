//! Change-request impact: what a proposed change has declared it touches.
//!
//! Applications, interfaces and technical processes come straight from the
//! change request's impact rows. Business processes are found through the
//! declared interfaces; a single-request report additionally walks the
//! hierarchy above and below every directly impacted process.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::report::{
    AnnotatedTechnicalProcess, ChangeRequestImpact, ChangeRequestSeed, ChangeRequestSummary,
    ImpactNote, ImpactedApplication, ImpactedInterface, ImpactedProcess, ImpactedTechnicalProcess,
    ProcessImpact, distinct_processes,
};
use super::{ImpactAnalyzer, annotate, dedup_by_key};
use crate::error::Result;
use crate::hierarchy::walk::{Direction, reachable};
use crate::risk::RiskCounts;
use crate::store::EntityStore;
use crate::types::{ApplicationId, ChangeRequestId, InterfaceId, ProcessId, TechnicalProcessId};

/// Declared impact of the requested change requests, resolved to entities.
struct Declared {
    applications: Vec<ImpactedApplication>,
    interfaces: Vec<ImpactedInterface>,
    technical_processes: Vec<ImpactedTechnicalProcess>,
}

impl<S: EntityStore + ?Sized> ImpactAnalyzer<'_, S> {
    /// Impact of one change request, with hierarchical process expansion.
    ///
    /// Returns `None` if the change request does not exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn analyze_change_request(
        &self,
        id: ChangeRequestId,
    ) -> Result<Option<ChangeRequestImpact>> {
        let Some(change_request) = self.store.change_request(id)? else {
            debug!(change_request_id = %id, "Change request impact requested for unknown id");
            return Ok(None);
        };

        let declared = self.declared(&[id], false)?;
        let interface_ids = distinct_interfaces(&declared.interfaces);
        let direct = self.assigned_processes(&interface_ids)?;
        let impacted_business_processes = self.expand_hierarchy(direct)?;

        let total_technical_processes = distinct(
            declared
                .technical_processes
                .iter()
                .map(|t| t.technical_process.technical_process.id),
        );
        let counts = RiskCounts {
            total_impact: declared.applications.len()
                + declared.interfaces.len()
                + total_technical_processes,
            business_processes: distinct_processes(&impacted_business_processes),
            ..RiskCounts::default()
        };
        let risk_level = self.risk.change_request.classify(&counts);

        debug!(
            change_request_id = %id,
            applications = declared.applications.len(),
            interfaces = declared.interfaces.len(),
            processes = counts.business_processes,
            risk = %risk_level,
            "Analyzed change request impact"
        );

        Ok(Some(ChangeRequestImpact {
            seed: ChangeRequestSeed::Single(change_request),
            impact_summary: ChangeRequestSummary {
                total_applications: declared.applications.len(),
                total_interfaces: declared.interfaces.len(),
                total_business_processes: counts.business_processes,
                total_technical_processes,
                active_changes: None,
                risk_level,
            },
            impacted_applications: declared.applications,
            impacted_interfaces: declared.interfaces,
            impacted_business_processes,
            impacted_technical_processes: declared.technical_processes,
        }))
    }

    /// Combined impact of several change requests.
    ///
    /// Impacted entities are listed once each; the hierarchy is not expanded.
    /// Ids that don't resolve are ignored; returns `None` if none do.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn analyze_change_requests(
        &self,
        ids: &[ChangeRequestId],
    ) -> Result<Option<ChangeRequestImpact>> {
        let change_requests = self.store.change_requests(ids)?;
        if change_requests.is_empty() {
            debug!(requested = ids.len(), "No change request in impact request resolved");
            return Ok(None);
        }
        let resolved: Vec<ChangeRequestId> = change_requests.iter().map(|cr| cr.id).collect();

        let declared = self.declared(&resolved, true)?;
        let applications =
            dedup_by_key(declared.applications, |row: &ImpactedApplication| row.application.id);
        let interfaces =
            dedup_by_key(declared.interfaces, |row: &ImpactedInterface| row.interface.interface.id);
        let technical_processes = dedup_by_key(
            declared.technical_processes,
            |row: &ImpactedTechnicalProcess| row.technical_process.technical_process.id,
        );

        let interface_ids = distinct_interfaces(&interfaces);
        let impacted_business_processes = self.assigned_processes(&interface_ids)?;

        let counts = RiskCounts {
            total_impact: applications.len() + interfaces.len() + technical_processes.len(),
            business_processes: distinct_processes(&impacted_business_processes),
            change_requests: change_requests.len(),
            ..RiskCounts::default()
        };
        let risk_level = self.risk.multi_change_request.classify(&counts);

        debug!(
            change_requests = change_requests.len(),
            total_impact = counts.total_impact,
            risk = %risk_level,
            "Analyzed multi change request impact"
        );

        Ok(Some(ChangeRequestImpact {
            seed: ChangeRequestSeed::Many(change_requests),
            impact_summary: ChangeRequestSummary {
                total_applications: applications.len(),
                total_interfaces: interfaces.len(),
                total_business_processes: counts.business_processes,
                total_technical_processes: technical_processes.len(),
                active_changes: Some(counts.change_requests),
                risk_level,
            },
            impacted_applications: applications,
            impacted_interfaces: interfaces,
            impacted_business_processes,
            impacted_technical_processes: technical_processes,
        }))
    }

    /// Resolve the impact rows of `change_requests`. Rows whose entity no
    /// longer exists are dropped.
    fn declared(&self, change_requests: &[ChangeRequestId], multi: bool) -> Result<Declared> {
        let app_links = self.store.change_request_applications(change_requests)?;
        let interface_links = self.store.change_request_interfaces(change_requests)?;
        let tp_links = self.store.change_request_technical_processes(change_requests)?;

        let apps: HashMap<ApplicationId, _> = self
            .store
            .applications(&app_links.iter().map(|l| l.entity_id).collect::<Vec<_>>())?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let interfaces: HashMap<InterfaceId, _> = self
            .store
            .interfaces(&interface_links.iter().map(|l| l.entity_id).collect::<Vec<_>>())?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();
        let technical: HashMap<TechnicalProcessId, _> = self
            .store
            .technical_processes(&tp_links.iter().map(|l| l.entity_id).collect::<Vec<_>>())?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let names = self.application_names(
            interfaces
                .values()
                .flat_map(|i| [i.provider_application_id, i.consumer_application_id])
                .chain(technical.values().map(|t| t.application_id))
                .flatten(),
        )?;

        let mut dropped = 0usize;
        let applications = app_links
            .iter()
            .filter_map(|l| match apps.get(&l.entity_id) {
                Some(app) => Some(ImpactedApplication {
                    application: app.clone(),
                    impact: ImpactNote::declared(l, multi),
                }),
                None => {
                    dropped += 1;
                    None
                }
            })
            .collect();
        let impacted_interfaces = interface_links
            .iter()
            .filter_map(|l| match interfaces.get(&l.entity_id) {
                Some(interface) => Some(ImpactedInterface {
                    interface: annotate(interface.clone(), &names, None),
                    impact: ImpactNote::declared(l, multi),
                }),
                None => {
                    dropped += 1;
                    None
                }
            })
            .collect();
        let technical_processes = tp_links
            .iter()
            .filter_map(|l| match technical.get(&l.entity_id) {
                Some(tp) => Some(ImpactedTechnicalProcess {
                    technical_process: AnnotatedTechnicalProcess {
                        application_name: tp.application_id.and_then(|a| names.get(&a).cloned()),
                        technical_process: tp.clone(),
                    },
                    impact: ImpactNote::declared(l, multi),
                }),
                None => {
                    dropped += 1;
                    None
                }
            })
            .collect();

        if dropped > 0 {
            warn!(dropped, "Change request impact rows reference missing entities");
        }

        Ok(Declared {
            applications,
            interfaces: impacted_interfaces,
            technical_processes,
        })
    }

    /// Append every ancestor (`parent`) and descendant (`child`) of each
    /// direct process. A process is reported once, direct rows first.
    fn expand_hierarchy(&self, direct: Vec<ImpactedProcess>) -> Result<Vec<ImpactedProcess>> {
        let mut reported: HashSet<ProcessId> =
            direct.iter().map(|row| row.business_process.id).collect();
        let mut expanded = Vec::new();
        let mut walked = HashSet::new();

        for row in &direct {
            let origin = row.business_process.id;
            if !walked.insert(origin) {
                continue;
            }
            for (direction, impact_type) in [
                (Direction::Up, ProcessImpact::Parent),
                (Direction::Down, ProcessImpact::Child),
            ] {
                for process in reachable(self.store, origin, direction)? {
                    if reported.insert(process.id) {
                        expanded.push(ImpactedProcess {
                            business_process: process,
                            interface_id: row.interface_id,
                            sequence_number: None,
                            impact_type,
                        });
                    }
                }
            }
        }

        debug!(
            direct = walked.len(),
            expanded = expanded.len(),
            "Expanded impacted processes through hierarchy"
        );
        let mut rows = direct;
        rows.extend(expanded);
        Ok(rows)
    }
}

fn distinct_interfaces(rows: &[ImpactedInterface]) -> Vec<InterfaceId> {
    let mut ids: Vec<InterfaceId> = rows.iter().map(|r| r.interface.interface.id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn distinct<T: Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> usize {
    items.collect::<HashSet<_>>().len()
}
