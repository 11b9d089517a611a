//! Canonical tier normalization.
//!
//! Raw tier labels arrive in many spellings (`Tier 1`, `PLATINUM`,
//! `Non-Target`, ...) and sometimes only as boolean flag columns. Resolution
//! is total: anything unrecognized lands in [`CanonicalTier::Bronze`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::constants::fields::{GOLD_FLAG, PLATINUM_FLAG, SILVER_FLAG, TIER_RAW};
use crate::constants::tier::{
    BRONZE_MARKERS, GOLD_MARKERS, NON_TARGET_MARKER, PLATINUM_MARKERS, SILVER_MARKERS,
};
use crate::data::FieldSource;
use crate::utils::{canonical_label, contains_any};

/// Ordinal tier, declared lowest first so `Platinum > Gold > Silver > Bronze`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CanonicalTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl CanonicalTier {
    /// All tiers, highest first.
    pub const ALL: [CanonicalTier; 4] = [
        CanonicalTier::Platinum,
        CanonicalTier::Gold,
        CanonicalTier::Silver,
        CanonicalTier::Bronze,
    ];

    /// Display label.
    pub const fn as_str(self) -> &'static str {
        match self {
            CanonicalTier::Platinum => "Platinum",
            CanonicalTier::Gold => "Gold",
            CanonicalTier::Silver => "Silver",
            CanonicalTier::Bronze => "Bronze",
        }
    }
}

impl fmt::Display for CanonicalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TierBasis {
    /// Matched a marker in the raw tier label.
    Label,
    /// Derived from a tier flag column.
    Flag,
    /// Nothing matched; universal bronze fallback.
    Default,
}

/// Tier plus the rule that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierResolution {
    pub tier: CanonicalTier,
    pub basis: TierBasis,
}

/// Canonical tier for a record. Total; never fails.
pub fn normalize_tier<F: FieldSource + ?Sized>(record: &F) -> CanonicalTier {
    resolve_tier(record).tier
}

/// Resolve a tier and report which rule fired.
///
/// Order: label markers (platinum, gold, silver, bronze, non-target), then
/// flags (platinum, gold, silver), then the bronze default.
pub fn resolve_tier<F: FieldSource + ?Sized>(record: &F) -> TierResolution {
    if let Some(tier) = record.text(TIER_RAW).and_then(tier_from_label) {
        return TierResolution {
            tier,
            basis: TierBasis::Label,
        };
    }

    let flagged = [
        (PLATINUM_FLAG, CanonicalTier::Platinum),
        (GOLD_FLAG, CanonicalTier::Gold),
        (SILVER_FLAG, CanonicalTier::Silver),
    ]
    .into_iter()
    .find(|(flag, _)| record.flag(flag));
    if let Some((_, tier)) = flagged {
        return TierResolution {
            tier,
            basis: TierBasis::Flag,
        };
    }

    trace!(record = record.record_id(), "no tier label or flag; defaulting to bronze");
    TierResolution {
        tier: CanonicalTier::Bronze,
        basis: TierBasis::Default,
    }
}

/// Match a raw tier label against the marker table.
pub fn tier_from_label(raw: &str) -> Option<CanonicalTier> {
    let label = canonical_label(raw);
    if contains_any(&label, &PLATINUM_MARKERS) {
        Some(CanonicalTier::Platinum)
    } else if contains_any(&label, &GOLD_MARKERS) {
        Some(CanonicalTier::Gold)
    } else if contains_any(&label, &SILVER_MARKERS) {
        Some(CanonicalTier::Silver)
    } else if contains_any(&label, &BRONZE_MARKERS) || label.contains(NON_TARGET_MARKER) {
        Some(CanonicalTier::Bronze)
    } else {
        None
    }
}
