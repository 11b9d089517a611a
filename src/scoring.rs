//! Composite priority scoring.
//!
//! `composite = w_g * growth_prob' + w_l * rx_lift + w_t * tier_weight + w_n * ngd_weight`
//! where `growth_prob'` is the clamped model probability after the
//! grower/new override, and `rx_lift` is the clamped, field-specific
//! normalization of the forecasted lift. The composite is then bucketed into
//! a [`PriorityLevel`] using inclusive lower bounds.
//!
//! Scoring never fails: absent or malformed inputs count as zero at the
//! point of use, and the coercion is reported in [`ScoreBreakdown::coerced`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::trace;

use crate::config::{PriorityBins, ScoringConfig};
use crate::constants::fields::{GROWTH_PROBABILITY, NGD_DECILE, TRX_GROWTH, TRX_QTD_GROWTH};
use crate::data::FieldSource;
use crate::errors::EngineError;
use crate::ngd::{NgdCategory, classify_record};
use crate::tier::{CanonicalTier, normalize_tier};
use crate::types::FieldName;

/// Ordinal priority, 1 (lowest) to 5 (highest).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PriorityLevel(u8);

impl PriorityLevel {
    /// Level 1.
    pub const LOWEST: PriorityLevel = PriorityLevel(1);
    /// Level 5.
    pub const HIGHEST: PriorityLevel = PriorityLevel(5);

    /// Bucket a composite score. A score equal to a bound belongs to the
    /// upper bin; `NaN` falls through to the lowest level.
    pub fn from_composite(composite: f64, bins: &PriorityBins) -> Self {
        bins.bounds()
            .into_iter()
            .find(|(lower, _)| composite >= *lower)
            .map(|(_, level)| PriorityLevel(level))
            .unwrap_or(Self::LOWEST)
    }

    /// Numeric level.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Composite score and its bucket.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    /// Weighted blend; nominally in `[0, 1]`.
    pub composite_score: f64,
    /// Bucketed level.
    pub priority_level: PriorityLevel,
}

/// Which scoring inputs were absent or malformed and counted as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercedInputs {
    pub growth_probability: bool,
    pub lift: bool,
    pub ngd_decile: bool,
    pub trx_growth: bool,
}

impl CoercedInputs {
    /// True when any input was coerced.
    pub fn any(&self) -> bool {
        self.growth_probability || self.lift || self.ngd_decile || self.trx_growth
    }
}

/// Every intermediate of one scoring pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub tier: CanonicalTier,
    pub ngd: NgdCategory,
    /// Clamped model probability before the override.
    pub growth_probability: f64,
    /// Probability used in the blend.
    pub adjusted_growth_probability: f64,
    /// Whether the grower/new floor replaced the model probability.
    pub override_applied: bool,
    /// Lift field that supplied the raw lift, if any did.
    pub lift_field: Option<FieldName>,
    /// Raw lift before normalization (0 when coerced).
    pub raw_lift: f64,
    /// Normalized, clamped lift.
    pub rx_lift: f64,
    pub tier_weight: f64,
    pub ngd_weight: f64,
    pub composite_score: f64,
    pub priority_level: PriorityLevel,
    pub coerced: CoercedInputs,
}

impl ScoreBreakdown {
    /// Score and level only.
    pub fn score(&self) -> PriorityScore {
        PriorityScore {
            composite_score: self.composite_score,
            priority_level: self.priority_level,
        }
    }
}

/// A borrowed record annotated with its classification and score.
#[derive(Debug)]
pub struct ScoredRecord<'a, F: ?Sized> {
    pub record: &'a F,
    pub tier: CanonicalTier,
    pub ngd: NgdCategory,
    pub score: PriorityScore,
}

impl<F: ?Sized> Clone for ScoredRecord<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: ?Sized> Copy for ScoredRecord<'_, F> {}

impl<F: ?Sized> ScoredRecord<'_, F> {
    pub fn composite_score(&self) -> f64 {
        self.score.composite_score
    }

    pub fn priority_level(&self) -> PriorityLevel {
        self.score.priority_level
    }
}

/// Priority scorer bound to one validated [`ScoringConfig`].
#[derive(Clone, Debug, Default)]
pub struct PriorityScorer {
    config: ScoringConfig,
}

impl PriorityScorer {
    /// Build a scorer after validating `config`.
    pub fn new(config: ScoringConfig) -> Result<Self, EngineError> {
        Ok(Self {
            config: config.validated()?,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Full scoring pass with intermediates.
    pub fn breakdown<F: FieldSource + ?Sized>(&self, record: &F) -> ScoreBreakdown {
        let config = &self.config;
        let tier = normalize_tier(record);
        let ngd = classify_record(record);

        let mut coerced = CoercedInputs {
            ngd_decile: record.number(NGD_DECILE).is_none(),
            trx_growth: record.first_number(&[TRX_GROWTH, TRX_QTD_GROWTH]).is_none(),
            ..CoercedInputs::default()
        };

        let growth_probability = match record.number(GROWTH_PROBABILITY) {
            Some(value) => value.clamp(0.0, 1.0),
            None => {
                coerced.growth_probability = true;
                0.0
            }
        };
        let (adjusted_growth_probability, override_applied) =
            match config.override_rule.apply(ngd, growth_probability) {
                Some(floor) => (floor, true),
                None => (growth_probability, false),
            };

        let lift_hit = config
            .lift_sources
            .iter()
            .find_map(|source| record.number(&source.field).map(|lift| (source, lift)));
        let (lift_field, raw_lift, rx_lift) = match lift_hit {
            Some((source, lift)) => (
                Some(source.field.clone()),
                lift,
                clamp_unit(source.normalization.normalize(lift)),
            ),
            None => {
                coerced.lift = true;
                let rx_lift = config
                    .lift_sources
                    .first()
                    .map(|source| clamp_unit(source.normalization.normalize(0.0)))
                    .unwrap_or(0.0);
                (None, 0.0, rx_lift)
            }
        };

        let tier_weight = config.tier_weights.weight(tier);
        let ngd_weight = config.ngd_weights.weight(ngd);
        let blend = &config.blend;
        let composite_score = blend.growth_probability * adjusted_growth_probability
            + blend.rx_lift * rx_lift
            + blend.tier * tier_weight
            + blend.ngd * ngd_weight;
        let priority_level = PriorityLevel::from_composite(composite_score, &config.bins);

        if coerced.any() {
            trace!(
                record = record.record_id(),
                ?coerced,
                "scoring inputs coerced to zero"
            );
        }

        ScoreBreakdown {
            tier,
            ngd,
            growth_probability,
            adjusted_growth_probability,
            override_applied,
            lift_field,
            raw_lift,
            rx_lift,
            tier_weight,
            ngd_weight,
            composite_score,
            priority_level,
            coerced,
        }
    }

    /// Composite score and level.
    pub fn score<F: FieldSource + ?Sized>(&self, record: &F) -> PriorityScore {
        self.breakdown(record).score()
    }

    /// Annotate one record.
    pub fn scored<'a, F: FieldSource + ?Sized>(&self, record: &'a F) -> ScoredRecord<'a, F> {
        let breakdown = self.breakdown(record);
        ScoredRecord {
            record,
            tier: breakdown.tier,
            ngd: breakdown.ngd,
            score: breakdown.score(),
        }
    }

    /// Annotate every record, preserving input order.
    pub fn score_population<'a, F: FieldSource>(
        &self,
        population: &'a [F],
    ) -> Vec<ScoredRecord<'a, F>> {
        population.iter().map(|record| self.scored(record)).collect()
    }

    /// Annotate every record and sort by composite score, highest first.
    /// Ties break on record id for a stable order.
    pub fn rank_population<'a, F: FieldSource>(
        &self,
        population: &'a [F],
    ) -> Vec<ScoredRecord<'a, F>> {
        let mut scored = self.score_population(population);
        scored.sort_by(|a, b| {
            b.composite_score()
                .partial_cmp(&a.composite_score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.record_id().cmp(b.record.record_id()))
        });
        scored
    }
}

/// Score a record with the default configuration.
pub fn compute_priority<F: FieldSource + ?Sized>(record: &F) -> PriorityScore {
    PriorityScorer::default().score(record)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
