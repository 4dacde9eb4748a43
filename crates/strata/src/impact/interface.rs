//! Interface impact: who depends on a set of interfaces.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use super::report::{
    ImpactNote, ImpactedApplication, InterfaceImpact, InterfaceSummary, RelatedChangeRequest,
    distinct_processes,
};
use super::ImpactAnalyzer;
use crate::error::Result;
use crate::risk::RiskCounts;
use crate::store::EntityStore;
use crate::types::{ApplicationId, ChangeRequestId, InterfaceId};

const RELATED_NOTE: &str = "Application is related through selected interfaces";

impl<S: EntityStore + ?Sized> ImpactAnalyzer<'_, S> {
    /// Combined impact of several interfaces.
    ///
    /// Risk is keyed off the number of distinct change requests declaring
    /// impact on the interfaces. Ids that don't resolve are ignored; returns
    /// `None` if none do.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn analyze_interfaces(&self, ids: &[InterfaceId]) -> Result<Option<InterfaceImpact>> {
        let interfaces = self.store.interfaces(ids)?;
        if interfaces.is_empty() {
            debug!(requested = ids.len(), "No interface in impact request resolved");
            return Ok(None);
        }
        let resolved: Vec<InterfaceId> = interfaces.iter().map(|i| i.id).collect();

        let links = self.store.interface_change_links(&resolved)?;
        let cr_ids: BTreeSet<ChangeRequestId> = links.iter().map(|l| l.change_request_id).collect();
        let change_requests = self
            .store
            .change_requests(&cr_ids.into_iter().collect::<Vec<_>>())?;
        let related_change_requests: Vec<RelatedChangeRequest> = links
            .iter()
            .filter_map(|link| {
                let change_request = change_requests
                    .iter()
                    .find(|cr| cr.id == link.change_request_id);
                if change_request.is_none() {
                    warn!(link_id = link.id, "Interface impact row references a missing change request");
                }
                Some(RelatedChangeRequest {
                    change_request: change_request?.clone(),
                    interface_id: link.entity_id,
                    impact: ImpactNote::declared(link, false),
                })
            })
            .collect();
        let distinct_change_requests = related_change_requests
            .iter()
            .map(|r| r.change_request.id)
            .collect::<HashSet<_>>()
            .len();

        let app_ids: BTreeSet<ApplicationId> = interfaces
            .iter()
            .flat_map(|i| [i.provider_application_id, i.consumer_application_id])
            .flatten()
            .collect();
        let related_applications = self
            .store
            .applications(&app_ids.into_iter().collect::<Vec<_>>())?;
        let impacted_applications = related_applications
            .iter()
            .map(|app| ImpactedApplication {
                application: app.clone(),
                impact: ImpactNote::derived("related", RELATED_NOTE),
            })
            .collect();

        let impacted_business_processes = self.assigned_processes(&resolved)?;

        let counts = RiskCounts {
            change_requests: distinct_change_requests,
            interfaces: interfaces.len(),
            business_processes: distinct_processes(&impacted_business_processes),
            ..RiskCounts::default()
        };
        let risk_level = self.risk.multi_interface.classify(&counts);

        debug!(
            interfaces = interfaces.len(),
            change_requests = distinct_change_requests,
            processes = counts.business_processes,
            risk = %risk_level,
            "Analyzed interface impact"
        );

        Ok(Some(InterfaceImpact {
            impact_summary: InterfaceSummary {
                total_applications: related_applications.len(),
                total_interfaces: interfaces.len(),
                total_business_processes: counts.business_processes,
                related_change_requests: distinct_change_requests,
                risk_level,
            },
            interfaces,
            related_change_requests,
            related_applications,
            impacted_applications,
            impacted_business_processes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{RiskLevel, RiskTables};
    use crate::store::InMemoryStore;
    use crate::types::{
        ChangeRequestStatus, NewApplication, NewChangeRequest, NewImpactLink, NewInterface,
    };

    #[test]
    fn risk_follows_distinct_change_requests() {
        let mut store = InMemoryStore::new();
        let provider = store
            .create_application(NewApplication {
                aml_number: "AML-1".into(),
                name: "Billing".into(),
                status: "active".into(),
                ..NewApplication::default()
            })
            .expect("app");
        let interface = store
            .create_interface(NewInterface {
                iml_number: "IML-1".into(),
                provider_application_id: Some(provider.id),
                interface_type: "REST".into(),
                status: "active".into(),
                version: "1.0".into(),
                ..NewInterface::default()
            })
            .expect("interface");
        for n in 0..3 {
            let cr = store
                .create_change_request(NewChangeRequest {
                    cr_number: format!("CR-{n}"),
                    title: format!("change {n}"),
                    status: ChangeRequestStatus::Submitted,
                    priority: None,
                })
                .expect("cr");
            store
                .replace_change_request_interfaces(
                    cr.id,
                    vec![NewImpactLink {
                        entity_id: interface.id,
                        impact_type: Some("modification".into()),
                        impact_description: None,
                    }],
                )
                .expect("links");
        }
        let tables = RiskTables::default();

        let report = ImpactAnalyzer::new(&store, &tables)
            .analyze_interfaces(&[interface.id, InterfaceId(999)])
            .expect("analyze")
            .expect("report");

        assert_eq!(report.interfaces.len(), 1);
        assert_eq!(report.impact_summary.related_change_requests, 3);
        assert_eq!(report.impact_summary.risk_level, RiskLevel::Medium);
        assert_eq!(report.related_applications.len(), 1);
        assert_eq!(
            report.impacted_applications[0].impact.impact_type.as_deref(),
            Some("related")
        );
    }
}
