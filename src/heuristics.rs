//! Quota planning for stratified sampling.
//!
//! The plan is computed from stratum sizes alone (no draws), so callers can
//! inspect how a sample of a given size would be allocated before taking it.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::ngd::NgdCategory;
use crate::types::GroupKey;

/// Member indices per NGD category, then per secondary group key.
pub type Strata = BTreeMap<NgdCategory, BTreeMap<GroupKey, Vec<usize>>>;

/// Even share of `total` across `groups`, rounded down. Zero groups yield
/// zero.
pub fn quota_per_group(total: usize, groups: usize) -> usize {
    total.checked_div(groups).unwrap_or(0)
}

/// Planned allocation for one `(NGD, group)` stratum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StratumQuota {
    pub ngd: NgdCategory,
    pub group: GroupKey,
    /// Records in the stratum.
    pub members: usize,
    /// Per-stratum quota, `floor(ngd_quota / groups_in_ngd)`.
    pub quota: usize,
}

impl StratumQuota {
    /// Records the stratified pass will actually take.
    pub fn planned(&self) -> usize {
        self.quota.min(self.members)
    }

    /// `NGD/group` label used in reports.
    pub fn label(&self) -> String {
        stratum_label(self.ngd, &self.group)
    }
}

/// Planned allocation for one NGD category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NgdQuota {
    pub ngd: NgdCategory,
    pub members: usize,
    /// `floor(target / ngd_groups)`.
    pub quota: usize,
    pub strata: Vec<StratumQuota>,
}

/// Full allocation plan for one sampling call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuotaPlan {
    /// `min(requested, population)`.
    pub target: usize,
    pub population: usize,
    pub groups: Vec<NgdQuota>,
}

impl QuotaPlan {
    /// Build the plan for a target size over `strata`.
    pub fn build(target: usize, strata: &Strata) -> Self {
        let population: usize = strata
            .values()
            .flat_map(|groups| groups.values())
            .map(Vec::len)
            .sum();
        let target = target.min(population);
        let ngd_quota = quota_per_group(target, strata.len());
        let groups = strata
            .iter()
            .map(|(ngd, groups)| {
                let stratum_quota = quota_per_group(ngd_quota, groups.len());
                let strata = groups
                    .iter()
                    .map(|(group, members)| StratumQuota {
                        ngd: *ngd,
                        group: group.clone(),
                        members: members.len(),
                        quota: stratum_quota,
                    })
                    .collect::<Vec<_>>();
                NgdQuota {
                    ngd: *ngd,
                    members: strata.iter().map(|stratum| stratum.members).sum(),
                    quota: ngd_quota,
                    strata,
                }
            })
            .collect();
        Self {
            target,
            population,
            groups,
        }
    }

    /// Iterate all strata in plan order.
    pub fn strata(&self) -> impl Iterator<Item = &StratumQuota> {
        self.groups.iter().flat_map(|group| group.strata.iter())
    }

    /// Quota for one stratum (0 when absent).
    pub fn quota_for(&self, ngd: NgdCategory, group: &str) -> usize {
        self.strata()
            .find(|stratum| stratum.ngd == ngd && stratum.group == group)
            .map(|stratum| stratum.quota)
            .unwrap_or(0)
    }

    /// Records the stratified pass will take before the shortfall fill.
    pub fn planned_draws(&self) -> usize {
        self.strata().map(StratumQuota::planned).sum()
    }

    /// Records the uniform fill pass will add.
    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.planned_draws())
    }

    /// Strata whose quota rounded down to zero.
    pub fn zero_quota_strata(&self) -> usize {
        self.strata().filter(|stratum| stratum.quota == 0).count()
    }
}

/// `NGD/group` label, e.g. `Grower/Gold`.
pub fn stratum_label(ngd: NgdCategory, group: &str) -> String {
    format!("{}/{}", ngd.as_str(), group)
}
