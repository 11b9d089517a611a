//! NGD lifecycle classification (New / Grower / Stable / Decliner).
//!
//! Thresholds depend on the historical decile and are deliberately
//! asymmetric. Deciles other than 1, 2, and 3 (including 0 and missing) use
//! the fallback row, which covers most of a typical population.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::fields::{NGD_DECILE, TRX_GROWTH, TRX_QTD_GROWTH};
use crate::constants::ngd::{
    DECILE_1_DECLINE_BELOW, DECILE_2_DECLINE_BELOW, DECILE_2_GROW_ABOVE, DECILE_3_DECLINE_BELOW,
    DECILE_3_GROW_ABOVE, FALLBACK_DECLINE_BELOW, FALLBACK_GROW_ABOVE,
};
use crate::data::FieldSource;

/// Lifecycle category derived from decile and TRx growth.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum NgdCategory {
    New,
    Grower,
    Stable,
    Decliner,
}

impl NgdCategory {
    /// All categories in declaration order.
    pub const ALL: [NgdCategory; 4] = [
        NgdCategory::New,
        NgdCategory::Grower,
        NgdCategory::Stable,
        NgdCategory::Decliner,
    ];

    /// Display label.
    pub const fn as_str(self) -> &'static str {
        match self {
            NgdCategory::New => "New",
            NgdCategory::Grower => "Grower",
            NgdCategory::Stable => "Stable",
            NgdCategory::Decliner => "Decliner",
        }
    }
}

impl fmt::Display for NgdCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a decile and a fractional growth rate (`-0.31` = -31%).
///
/// Growth is compared in percent. Non-finite growth counts as zero.
pub fn classify_ngd(decile: i64, growth_fraction: f64) -> NgdCategory {
    let growth_fraction = if growth_fraction.is_finite() {
        growth_fraction
    } else {
        0.0
    };
    let growth_percent = growth_fraction * 100.0;
    match decile {
        1 => {
            if growth_percent < DECILE_1_DECLINE_BELOW {
                NgdCategory::Decliner
            } else {
                NgdCategory::New
            }
        }
        2 => banded(growth_percent, DECILE_2_GROW_ABOVE, DECILE_2_DECLINE_BELOW),
        3 => banded(growth_percent, DECILE_3_GROW_ABOVE, DECILE_3_DECLINE_BELOW),
        _ => banded(growth_percent, FALLBACK_GROW_ABOVE, FALLBACK_DECLINE_BELOW),
    }
}

fn banded(growth_percent: f64, grow_above: f64, decline_below: f64) -> NgdCategory {
    if growth_percent > grow_above {
        NgdCategory::Grower
    } else if growth_percent < decline_below {
        NgdCategory::Decliner
    } else {
        NgdCategory::Stable
    }
}

/// Decile read from `ngd_decile`; missing or malformed is 0, fractions
/// truncate toward zero.
pub fn record_decile<F: FieldSource + ?Sized>(record: &F) -> i64 {
    record
        .number(NGD_DECILE)
        .map(|value| value.trunc() as i64)
        .unwrap_or(0)
}

/// Growth fraction from `trx_growth`, falling back to `trx_qtd_growth`;
/// missing or malformed is 0.
pub fn record_growth<F: FieldSource + ?Sized>(record: &F) -> f64 {
    record
        .first_number(&[TRX_GROWTH, TRX_QTD_GROWTH])
        .unwrap_or(0.0)
}

/// Whether the record's decile falls outside the special-cased 1..=3 rows.
pub fn uses_fallback_thresholds<F: FieldSource + ?Sized>(record: &F) -> bool {
    !(1..=3).contains(&record_decile(record))
}

/// Classify a record from its own decile and growth fields.
pub fn classify_record<F: FieldSource + ?Sized>(record: &F) -> NgdCategory {
    classify_ngd(record_decile(record), record_growth(record))
}
