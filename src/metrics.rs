use serde::Serialize;
use std::collections::HashMap;

use crate::data::FieldSource;
use crate::ngd::uses_fallback_thresholds;
use crate::scoring::PriorityScorer;
use crate::tier::{TierBasis, resolve_tier};

/// Aggregate skew metrics for per-stratum sample counts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StratumSkew {
    pub total: usize,
    pub strata: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub max_share: f64,
    pub min_share: f64,
    pub ratio: f64,
    pub per_stratum: Vec<StratumShare>,
}

/// Per-stratum share of a sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StratumShare {
    pub stratum: String,
    pub count: usize,
    pub share: f64,
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Compute skew metrics from per-stratum counts.
/// The map keys are `NGD/group` labels (see [`crate::sampler::stratum_counts`]).
pub fn stratum_skew(counts: &HashMap<String, usize>) -> Option<StratumSkew> {
    let min = *counts.values().min()?;
    let max = *counts.values().max()?;
    let total: usize = counts.values().sum();
    let strata = counts.len();
    let mean = total as f64 / strata as f64;
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let mut per_stratum: Vec<StratumShare> = counts
        .iter()
        .map(|(stratum, count)| StratumShare {
            stratum: stratum.clone(),
            count: *count,
            share: share(*count, total),
        })
        .collect();
    per_stratum.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.stratum.cmp(&b.stratum)));
    Some(StratumSkew {
        total,
        strata,
        min,
        max,
        mean,
        max_share: share(max, total),
        min_share: share(min, total),
        ratio,
        per_stratum,
    })
}

/// How often records fell back to defaults instead of their own data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FallbackCounts {
    pub records: usize,
    /// Tier defaulted to bronze (no label or flag matched).
    pub default_tier: usize,
    /// Tier resolved from a flag rather than the label.
    pub flag_tier: usize,
    /// Classified with the generic decile row (decile outside 1..=3).
    pub fallback_decile: usize,
    pub coerced_growth_probability: usize,
    pub coerced_lift: usize,
    pub coerced_ngd_decile: usize,
    pub coerced_trx_growth: usize,
    /// Records with at least one coerced scoring input.
    pub any_coerced: usize,
}

impl FallbackCounts {
    /// Tally fallbacks over a population using `scorer`'s lift sources.
    pub fn from_population<F: FieldSource>(scorer: &PriorityScorer, population: &[F]) -> Self {
        let mut counts = Self::default();
        for record in population {
            counts.add(scorer, record);
        }
        counts
    }

    fn add<F: FieldSource + ?Sized>(&mut self, scorer: &PriorityScorer, record: &F) {
        self.records += 1;
        match resolve_tier(record).basis {
            TierBasis::Default => self.default_tier += 1,
            TierBasis::Flag => self.flag_tier += 1,
            TierBasis::Label => {}
        }
        if uses_fallback_thresholds(record) {
            self.fallback_decile += 1;
        }
        let coerced = scorer.breakdown(record).coerced;
        self.coerced_growth_probability += usize::from(coerced.growth_probability);
        self.coerced_lift += usize::from(coerced.lift);
        self.coerced_ngd_decile += usize::from(coerced.ngd_decile);
        self.coerced_trx_growth += usize::from(coerced.trx_growth);
        self.any_coerced += usize::from(coerced.any());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::fields::{
        FORECASTED_LIFT, GOLD_FLAG, GROWTH_PROBABILITY, NGD_DECILE, TIER_RAW, TRX_GROWTH,
    };
    use crate::data::Record;

    #[test]
    fn stratum_skew_reports_balance() {
        let mut counts = HashMap::new();
        counts.insert("Grower/Gold".to_string(), 2);
        counts.insert("Stable/Gold".to_string(), 2);
        let skew = stratum_skew(&counts).expect("skew");
        assert_eq!(skew.total, 4);
        assert_eq!(skew.strata, 2);
        assert_eq!(skew.min, 2);
        assert_eq!(skew.max, 2);
        assert!((skew.max_share - 0.5).abs() < 1e-6);
        assert!((skew.ratio - 1.0).abs() < 1e-6);
        assert!(
            skew.per_stratum
                .iter()
                .all(|entry| (entry.share - 0.5).abs() < 1e-6)
        );
    }

    #[test]
    fn stratum_skew_reports_imbalance() {
        let mut counts = HashMap::new();
        counts.insert("New/Gold".to_string(), 4);
        counts.insert("New/Bronze".to_string(), 2);
        counts.insert("Stable/Bronze".to_string(), 2);
        let skew = stratum_skew(&counts).expect("skew");
        assert_eq!(skew.total, 8);
        assert_eq!(skew.strata, 3);
        assert!((skew.ratio - 2.0).abs() < 1e-6);
        assert_eq!(skew.per_stratum[0].stratum, "New/Gold");
        assert_eq!(skew.per_stratum[1].stratum, "New/Bronze");
    }

    #[test]
    fn stratum_skew_handles_empty_and_zero_counts() {
        assert!(stratum_skew(&HashMap::new()).is_none());
        let mut counts = HashMap::new();
        counts.insert("New/Gold".to_string(), 0);
        counts.insert("New/Bronze".to_string(), 3);
        let skew = stratum_skew(&counts).expect("skew");
        assert!(skew.ratio.is_infinite());
        assert_eq!(skew.min_share, 0.0);
    }

    #[test]
    fn fallback_counts_tally_each_kind() {
        let population = vec![
            Record::new("full")
                .with(TIER_RAW, "Tier 1")
                .with(NGD_DECILE, 2)
                .with(TRX_GROWTH, 0.2)
                .with(GROWTH_PROBABILITY, 0.5)
                .with(FORECASTED_LIFT, 10.0),
            Record::new("flagged")
                .with(GOLD_FLAG, "Y")
                .with(NGD_DECILE, 7)
                .with(TRX_GROWTH, 0.0)
                .with(GROWTH_PROBABILITY, "n/a"),
            Record::new("empty"),
        ];
        let counts = FallbackCounts::from_population(&PriorityScorer::default(), &population);
        assert_eq!(counts.records, 3);
        assert_eq!(counts.flag_tier, 1);
        assert_eq!(counts.default_tier, 1);
        assert_eq!(counts.fallback_decile, 2);
        assert_eq!(counts.coerced_growth_probability, 2);
        assert_eq!(counts.coerced_lift, 2);
        assert_eq!(counts.coerced_ngd_decile, 1);
        assert_eq!(counts.coerced_trx_growth, 1);
        assert_eq!(counts.any_coerced, 2);
    }
}
