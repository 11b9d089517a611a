#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Scoring and sampler configuration types.
pub mod config;
/// Centralized field names, markers, thresholds, and weights.
pub mod constants;
/// Record and field value types.
pub mod data;
/// Reusable example runners shared by downstream crates.
pub mod example_apps;
/// Quota planning for stratified sampling.
pub mod heuristics;
/// Caller-built field lookups layered over records.
pub mod lookup;
/// Aggregate metrics helpers.
pub mod metrics;
/// NGD (new/grower/stable/decliner) classification.
pub mod ngd;
/// Stratified sampler and deterministic RNG.
pub mod sampler;
/// Composite priority scoring.
pub mod scoring;
/// Tier normalization.
pub mod tier;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

mod errors;

pub use config::{
    BlendWeights, DiversityWeighting, LiftNormalization, LiftSource, NgdWeights, OverrideRule,
    PriorityBins, SamplerConfig, ScoringConfig, SecondaryDimension, TierWeights,
};
pub use data::{FieldSource, FieldValue, Record};
pub use errors::EngineError;
pub use heuristics::{QuotaPlan, Strata, StratumQuota};
pub use lookup::{FieldLookup, Overlaid};
pub use metrics::{FallbackCounts, StratumSkew, stratum_skew};
pub use ngd::{NgdCategory, classify_ngd, classify_record};
pub use sampler::{DeterministicRng, SampleReport, StratifiedSampler, sample};
pub use scoring::{
    PriorityLevel, PriorityScore, PriorityScorer, ScoreBreakdown, ScoredRecord, compute_priority,
};
pub use tier::{CanonicalTier, TierBasis, TierResolution, normalize_tier, resolve_tier};
pub use types::{FieldName, GroupKey, RecordId};
