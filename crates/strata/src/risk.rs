//! Named risk threshold tables.
//!
//! Every impact analysis ends by classifying a handful of counts into a
//! [`RiskLevel`]. The thresholds live here as data, one [`RiskTable`] per
//! analysis kind, so they can be tuned from configuration without touching
//! the analyses themselves.
//!
//! A table is an ordered list of bands, most severe first. The first band
//! with any metric strictly above its limit wins; when none trips, the
//! table's baseline applies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity reported in `impactSummary.riskLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Nothing crossed a limit.
    Low,
    /// Moderate spread.
    Medium,
    /// Wide spread.
    High,
    /// Multi-seed spread beyond the high tier.
    Critical,
}

impl RiskLevel {
    /// Lowercase name used in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A count an analysis feeds into its risk table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Interfaces touched.
    Interfaces,
    /// Active (or related) change requests.
    ChangeRequests,
    /// Distinct business processes touched.
    BusinessProcesses,
    /// Applications + interfaces + technical processes declared on change requests.
    TotalImpact,
}

/// Counts gathered by an analysis, ready for classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskCounts {
    /// Interfaces touched.
    pub interfaces: usize,
    /// Active or related change requests.
    pub change_requests: usize,
    /// Distinct business processes touched.
    pub business_processes: usize,
    /// Declared applications, interfaces and technical processes.
    pub total_impact: usize,
}

impl RiskCounts {
    fn get(&self, metric: Metric) -> usize {
        match metric {
            Metric::Interfaces => self.interfaces,
            Metric::ChangeRequests => self.change_requests,
            Metric::BusinessProcesses => self.business_processes,
            Metric::TotalImpact => self.total_impact,
        }
    }
}

/// One severity tier: tripped when any listed metric exceeds its limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBand {
    /// Level reported when the band trips.
    pub level: RiskLevel,
    /// Largest count per metric that does not trip the band.
    pub limits: BTreeMap<Metric, usize>,
}

impl RiskBand {
    /// Build a band from `(metric, limit)` pairs.
    #[must_use]
    pub fn new(level: RiskLevel, limits: &[(Metric, usize)]) -> Self {
        Self {
            level,
            limits: limits.iter().copied().collect(),
        }
    }

    /// Whether any metric in `counts` is strictly above this band's limit.
    #[must_use]
    pub fn is_exceeded_by(&self, counts: &RiskCounts) -> bool {
        self.limits
            .iter()
            .any(|(metric, limit)| counts.get(*metric) > *limit)
    }
}

/// Ordered bands plus the level reported when none trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTable {
    /// Bands checked in order; the first that trips wins.
    pub bands: Vec<RiskBand>,
    /// Level when no band trips.
    pub baseline: RiskLevel,
}

impl RiskTable {
    /// Classify `counts`. Bands are checked in order.
    #[must_use]
    pub fn classify(&self, counts: &RiskCounts) -> RiskLevel {
        self.bands
            .iter()
            .find(|band| band.is_exceeded_by(counts))
            .map_or(self.baseline, |band| band.level)
    }

    fn app_bands(critical: Option<[usize; 3]>) -> Vec<RiskBand> {
        let band = |level, [i, c, b]: [usize; 3]| {
            RiskBand::new(
                level,
                &[
                    (Metric::Interfaces, i),
                    (Metric::ChangeRequests, c),
                    (Metric::BusinessProcesses, b),
                ],
            )
        };
        critical
            .map(|limits| band(RiskLevel::Critical, limits))
            .into_iter()
            .chain([
                band(RiskLevel::High, [10, 3, 5]),
                band(RiskLevel::Medium, [5, 1, 2]),
            ])
            .collect()
    }

    /// Single-application analysis.
    #[must_use]
    pub fn application() -> Self {
        Self {
            bands: Self::app_bands(None),
            baseline: RiskLevel::Low,
        }
    }

    /// Multi-application analysis: adds a critical tier.
    #[must_use]
    pub fn multi_application() -> Self {
        Self {
            bands: Self::app_bands(Some([15, 5, 8])),
            baseline: RiskLevel::Low,
        }
    }

    /// Single change request: never below medium.
    #[must_use]
    pub fn change_request() -> Self {
        Self {
            bands: vec![RiskBand::new(RiskLevel::High, &[(Metric::TotalImpact, 8)])],
            baseline: RiskLevel::Medium,
        }
    }

    /// Multiple change requests.
    #[must_use]
    pub fn multi_change_request() -> Self {
        Self {
            bands: vec![
                RiskBand::new(RiskLevel::Critical, &[(Metric::TotalImpact, 15)]),
                RiskBand::new(RiskLevel::High, &[(Metric::TotalImpact, 8)]),
                RiskBand::new(RiskLevel::Medium, &[(Metric::TotalImpact, 3)]),
            ],
            baseline: RiskLevel::Low,
        }
    }

    /// Multiple interfaces, keyed off related change requests only.
    #[must_use]
    pub fn multi_interface() -> Self {
        Self {
            bands: vec![
                RiskBand::new(RiskLevel::High, &[(Metric::ChangeRequests, 5)]),
                RiskBand::new(RiskLevel::Medium, &[(Metric::ChangeRequests, 2)]),
            ],
            baseline: RiskLevel::Low,
        }
    }
}

/// One table per analysis kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskTables {
    /// Single application.
    pub application: RiskTable,
    /// Several applications.
    pub multi_application: RiskTable,
    /// Single change request.
    pub change_request: RiskTable,
    /// Several change requests.
    pub multi_change_request: RiskTable,
    /// Several interfaces.
    pub multi_interface: RiskTable,
}

impl Default for RiskTables {
    fn default() -> Self {
        Self {
            application: RiskTable::application(),
            multi_application: RiskTable::multi_application(),
            change_request: RiskTable::change_request(),
            multi_change_request: RiskTable::multi_change_request(),
            multi_interface: RiskTable::multi_interface(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn app_counts(interfaces: usize, change_requests: usize, processes: usize) -> RiskCounts {
        RiskCounts {
            interfaces,
            change_requests,
            business_processes: processes,
            total_impact: 0,
        }
    }

    fn total(total_impact: usize) -> RiskCounts {
        RiskCounts {
            total_impact,
            ..RiskCounts::default()
        }
    }

    #[rstest]
    #[case(app_counts(1, 0, 0), RiskLevel::Low)]
    #[case(app_counts(5, 1, 2), RiskLevel::Low)]
    #[case(app_counts(6, 0, 0), RiskLevel::Medium)]
    #[case(app_counts(0, 2, 0), RiskLevel::Medium)]
    #[case(app_counts(0, 0, 3), RiskLevel::Medium)]
    #[case(app_counts(11, 0, 0), RiskLevel::High)]
    #[case(app_counts(0, 4, 0), RiskLevel::High)]
    #[case(app_counts(0, 0, 6), RiskLevel::High)]
    #[case(app_counts(100, 100, 100), RiskLevel::High)]
    fn application_bands(#[case] counts: RiskCounts, #[case] expected: RiskLevel) {
        assert_eq!(RiskTable::application().classify(&counts), expected);
    }

    #[rstest]
    #[case(app_counts(16, 0, 0), RiskLevel::Critical)]
    #[case(app_counts(0, 6, 0), RiskLevel::Critical)]
    #[case(app_counts(0, 0, 9), RiskLevel::Critical)]
    #[case(app_counts(15, 5, 8), RiskLevel::High)]
    #[case(app_counts(3, 0, 0), RiskLevel::Low)]
    fn multi_application_adds_critical(#[case] counts: RiskCounts, #[case] expected: RiskLevel) {
        assert_eq!(RiskTable::multi_application().classify(&counts), expected);
    }

    #[rstest]
    #[case(0, RiskLevel::Medium)]
    #[case(8, RiskLevel::Medium)]
    #[case(9, RiskLevel::High)]
    fn change_request_never_low(#[case] impact: usize, #[case] expected: RiskLevel) {
        assert_eq!(RiskTable::change_request().classify(&total(impact)), expected);
    }

    #[rstest]
    #[case(0, RiskLevel::Low)]
    #[case(3, RiskLevel::Low)]
    #[case(4, RiskLevel::Medium)]
    #[case(9, RiskLevel::High)]
    #[case(16, RiskLevel::Critical)]
    fn multi_change_request_bands(#[case] impact: usize, #[case] expected: RiskLevel) {
        assert_eq!(
            RiskTable::multi_change_request().classify(&total(impact)),
            expected
        );
    }

    #[rstest]
    #[case(0, RiskLevel::Low)]
    #[case(3, RiskLevel::Medium)]
    #[case(6, RiskLevel::High)]
    fn multi_interface_keys_off_change_requests(
        #[case] change_requests: usize,
        #[case] expected: RiskLevel,
    ) {
        let counts = RiskCounts {
            change_requests,
            interfaces: 50,
            ..RiskCounts::default()
        };
        assert_eq!(RiskTable::multi_interface().classify(&counts), expected);
    }

    #[test]
    fn tables_deserialize_from_yaml_with_defaults() {
        let yaml = r"
application:
  baseline: medium
  bands:
    - level: high
      limits:
        interfaces: 2
";
        let tables: RiskTables = serde_yaml::from_str(yaml).expect("valid yaml");

        assert_eq!(tables.application.baseline, RiskLevel::Medium);
        assert_eq!(
            tables.application.classify(&app_counts(3, 0, 0)),
            RiskLevel::High
        );
        assert_eq!(tables.multi_interface, RiskTable::multi_interface());
    }
}
