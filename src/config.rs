use serde::{Deserialize, Serialize};

use crate::constants::fields::{FORECASTED_LIFT, FORECASTED_LIFT_PCT};
use crate::constants::sampler::PRIORITY_WEIGHT_FLOOR;
use crate::constants::scoring::{
    BLEND_GROWTH_PROBABILITY, BLEND_NGD, BLEND_RX_LIFT, BLEND_SUM_EPSILON, BLEND_TIER,
    CENTERED_LIFT_OFFSET, LIFT_SCALE, NGD_WEIGHTS, OVERRIDE_FLOOR_GROWER, OVERRIDE_FLOOR_NEW,
    OVERRIDE_THRESHOLD, PRIORITY_BINS, TIER_WEIGHTS,
};
use crate::errors::EngineError;
use crate::ngd::NgdCategory;
use crate::tier::CanonicalTier;
use crate::types::FieldName;

/// Weights of the four signals in the composite blend. Must sum to `1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    /// Weight on the override-adjusted growth probability.
    pub growth_probability: f64,
    /// Weight on the normalized rx lift.
    pub rx_lift: f64,
    /// Weight on the tier weight.
    pub tier: f64,
    /// Weight on the NGD weight.
    pub ngd: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            growth_probability: BLEND_GROWTH_PROBABILITY,
            rx_lift: BLEND_RX_LIFT,
            tier: BLEND_TIER,
            ngd: BLEND_NGD,
        }
    }
}

impl BlendWeights {
    fn sum(&self) -> f64 {
        self.growth_probability + self.rx_lift + self.tier + self.ngd
    }
}

/// Per-tier contribution to the composite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    pub platinum: f64,
    pub gold: f64,
    pub silver: f64,
    pub bronze: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        let [platinum, gold, silver, bronze] = TIER_WEIGHTS;
        Self {
            platinum,
            gold,
            silver,
            bronze,
        }
    }
}

impl TierWeights {
    /// Weight for `tier`.
    pub fn weight(&self, tier: CanonicalTier) -> f64 {
        match tier {
            CanonicalTier::Platinum => self.platinum,
            CanonicalTier::Gold => self.gold,
            CanonicalTier::Silver => self.silver,
            CanonicalTier::Bronze => self.bronze,
        }
    }

    fn values(&self) -> [f64; 4] {
        [self.platinum, self.gold, self.silver, self.bronze]
    }
}

/// Per-category contribution to the composite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NgdWeights {
    pub grower: f64,
    pub new: f64,
    pub stable: f64,
    pub decliner: f64,
}

impl Default for NgdWeights {
    fn default() -> Self {
        let [grower, new, stable, decliner] = NGD_WEIGHTS;
        Self {
            grower,
            new,
            stable,
            decliner,
        }
    }
}

impl NgdWeights {
    /// Weight for `category`.
    pub fn weight(&self, category: NgdCategory) -> f64 {
        match category {
            NgdCategory::Grower => self.grower,
            NgdCategory::New => self.new,
            NgdCategory::Stable => self.stable,
            NgdCategory::Decliner => self.decliner,
        }
    }

    fn values(&self) -> [f64; 4] {
        [self.grower, self.new, self.stable, self.decliner]
    }
}

/// Growth-probability floor for records with strong historical momentum but
/// low model confidence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideRule {
    /// Probabilities strictly below this are replaced by the floor.
    pub threshold: f64,
    /// Floor for growers.
    pub grower_floor: f64,
    /// Floor for new writers.
    pub new_floor: f64,
}

impl Default for OverrideRule {
    fn default() -> Self {
        Self {
            threshold: OVERRIDE_THRESHOLD,
            grower_floor: OVERRIDE_FLOOR_GROWER,
            new_floor: OVERRIDE_FLOOR_NEW,
        }
    }
}

impl OverrideRule {
    /// Floor for `category`, if the category is eligible.
    pub fn floor_for(&self, category: NgdCategory) -> Option<f64> {
        match category {
            NgdCategory::Grower => Some(self.grower_floor),
            NgdCategory::New => Some(self.new_floor),
            NgdCategory::Stable | NgdCategory::Decliner => None,
        }
    }

    /// Adjusted probability when the rule fires, `None` otherwise.
    pub fn apply(&self, category: NgdCategory, growth_probability: f64) -> Option<f64> {
        if growth_probability < self.threshold {
            self.floor_for(category)
        } else {
            None
        }
    }
}

/// How a lift field's native range maps into `[0, 1]` (before clamping).
///
/// The two forms are not interchangeable: pick the one that matches the
/// field's native range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiftNormalization {
    /// `(lift + offset) / scale`, for signed lifts around zero.
    Centered { offset: f64, scale: f64 },
    /// `lift / scale`, for lifts already on a non-negative scale.
    Scaled { scale: f64 },
}

impl LiftNormalization {
    /// Normalize a raw lift. The caller clamps.
    pub fn normalize(&self, lift: f64) -> f64 {
        match *self {
            LiftNormalization::Centered { offset, scale } => (lift + offset) / scale,
            LiftNormalization::Scaled { scale } => lift / scale,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let (offset, scale) = match *self {
            LiftNormalization::Centered { offset, scale } => (offset, scale),
            LiftNormalization::Scaled { scale } => (0.0, scale),
        };
        if !offset.is_finite() {
            return Err("lift offset must be finite".to_string());
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err("lift scale must be a positive finite number".to_string());
        }
        Ok(())
    }
}

/// A lift field and the normalization matching its native range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiftSource {
    /// Record field holding the lift.
    pub field: FieldName,
    /// Normalization for that field.
    pub normalization: LiftNormalization,
}

impl LiftSource {
    /// `(lift + 50) / 100` source for a field in `[-50, 50]`.
    pub fn centered(field: impl Into<FieldName>) -> Self {
        Self {
            field: field.into(),
            normalization: LiftNormalization::Centered {
                offset: CENTERED_LIFT_OFFSET,
                scale: LIFT_SCALE,
            },
        }
    }

    /// `lift / 100` source for a field in `[0, 100]`.
    pub fn scaled(field: impl Into<FieldName>) -> Self {
        Self {
            field: field.into(),
            normalization: LiftNormalization::Scaled { scale: LIFT_SCALE },
        }
    }
}

/// Inclusive lower bounds of priority levels 5 down to 2. Anything below
/// `level_2` is level 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityBins {
    pub level_5: f64,
    pub level_4: f64,
    pub level_3: f64,
    pub level_2: f64,
}

impl Default for PriorityBins {
    fn default() -> Self {
        let [level_5, level_4, level_3, level_2] = PRIORITY_BINS;
        Self {
            level_5,
            level_4,
            level_3,
            level_2,
        }
    }
}

impl PriorityBins {
    /// Lower bounds paired with their level, highest first.
    pub fn bounds(&self) -> [(f64, u8); 4] {
        [
            (self.level_5, 5),
            (self.level_4, 4),
            (self.level_3, 3),
            (self.level_2, 2),
        ]
    }
}

/// Scoring configuration: every tuned constant the priority scorer uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Composite blend weights.
    pub blend: BlendWeights,
    /// Tier contribution table.
    pub tier_weights: TierWeights,
    /// NGD contribution table.
    pub ngd_weights: NgdWeights,
    /// Low-confidence override for growers and new writers.
    pub override_rule: OverrideRule,
    /// Lift fields tried in order; the first holding a finite number wins.
    /// When none does, the raw lift is 0 under the first source's
    /// normalization.
    pub lift_sources: Vec<LiftSource>,
    /// Priority level bins.
    pub bins: PriorityBins,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            blend: BlendWeights::default(),
            tier_weights: TierWeights::default(),
            ngd_weights: NgdWeights::default(),
            override_rule: OverrideRule::default(),
            lift_sources: vec![
                LiftSource::centered(FORECASTED_LIFT),
                LiftSource::scaled(FORECASTED_LIFT_PCT),
            ],
            bins: PriorityBins::default(),
        }
    }
}

impl ScoringConfig {
    /// Validate weights, floors, lift sources, and bins.
    pub fn validated(self) -> Result<Self, EngineError> {
        let blend = [
            self.blend.growth_probability,
            self.blend.rx_lift,
            self.blend.tier,
            self.blend.ngd,
        ];
        if blend.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(configuration("blend weights must be non-negative and finite"));
        }
        if (self.blend.sum() - 1.0).abs() > BLEND_SUM_EPSILON {
            return Err(configuration("blend weights must sum to 1.0"));
        }
        let tables = self
            .tier_weights
            .values()
            .into_iter()
            .chain(self.ngd_weights.values());
        for weight in tables {
            if !weight.is_finite() || weight < 0.0 {
                return Err(configuration("tier and NGD weights must be non-negative and finite"));
            }
        }
        let rule = self.override_rule;
        for value in [rule.threshold, rule.grower_floor, rule.new_floor] {
            if !(0.0..=1.0).contains(&value) {
                return Err(configuration("override threshold and floors must lie in [0, 1]"));
            }
        }
        if self.lift_sources.is_empty() {
            return Err(configuration("at least one lift source is required"));
        }
        for source in &self.lift_sources {
            source.normalization.validate().map_err(|reason| {
                configuration(&format!("lift source '{}': {reason}", source.field))
            })?;
        }
        let bounds = self.bins.bounds();
        if bounds.iter().any(|(bound, _)| !bound.is_finite()) {
            return Err(configuration("priority bins must be finite"));
        }
        if bounds.windows(2).any(|pair| pair[0].0 <= pair[1].0) {
            return Err(configuration("priority bins must be strictly descending"));
        }
        Ok(self)
    }

    /// Parse a (possibly partial) JSON document and validate it. Missing
    /// sections keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let config: ScoringConfig = serde_json::from_str(raw)?;
        config.validated()
    }
}

/// Secondary grouping dimension used inside each NGD group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryDimension {
    /// Canonical tier.
    #[default]
    Tier,
    /// `specialty` field.
    Specialty,
    /// `territory` field, falling back to `state`.
    Territory,
}

/// How records are ordered inside a stratum before quotas are taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityWeighting {
    /// Uniform random permutation.
    #[default]
    Uniform,
    /// Random permutation biased toward higher composite scores.
    Priority,
}

/// Stratified sampler configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Dimension used to sub-partition each NGD group.
    pub secondary: SecondaryDimension,
    /// Within-stratum ordering.
    pub weighting: DiversityWeighting,
    /// Added to composite scores under [`DiversityWeighting::Priority`] so
    /// every record keeps a positive draw weight.
    pub priority_weight_floor: f64,
    /// Scoring used for priority weighting.
    pub scoring: ScoringConfig,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            secondary: SecondaryDimension::default(),
            weighting: DiversityWeighting::default(),
            priority_weight_floor: PRIORITY_WEIGHT_FLOOR,
            scoring: ScoringConfig::default(),
        }
    }
}

impl SamplerConfig {
    /// Validate the weight floor and the nested scoring configuration.
    pub fn validated(self) -> Result<Self, EngineError> {
        if !self.priority_weight_floor.is_finite() || self.priority_weight_floor <= 0.0 {
            return Err(configuration("priority weight floor must be positive and finite"));
        }
        let scoring = self.scoring.validated()?;
        Ok(Self { scoring, ..self })
    }

    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let config: SamplerConfig = serde_json::from_str(raw)?;
        config.validated()
    }
}

fn configuration(reason: &str) -> EngineError {
    EngineError::Configuration(reason.to_string())
}
