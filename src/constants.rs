/// Record field names read by the normalizers, scorer, and sampler.
pub mod fields {
    /// Raw tier label (e.g. `Tier 1`, `GOLD`, `Non-Target`).
    pub const TIER_RAW: &str = "tier_raw";
    /// Boolean-ish platinum tier flag.
    pub const PLATINUM_FLAG: &str = "platinum_flag";
    /// Boolean-ish gold tier flag.
    pub const GOLD_FLAG: &str = "gold_flag";
    /// Boolean-ish silver tier flag.
    pub const SILVER_FLAG: &str = "silver_flag";
    /// Model growth probability, nominally in `[0, 1]`.
    pub const GROWTH_PROBABILITY: &str = "growth_probability";
    /// Forecasted prescription lift, native range roughly `[-50, +50]`.
    pub const FORECASTED_LIFT: &str = "forecasted_lift";
    /// Forecasted prescription lift already expressed on a `[0, 100]` scale.
    pub const FORECASTED_LIFT_PCT: &str = "forecasted_lift_pct";
    /// Historical NGD decile, nominally `1..=10`.
    pub const NGD_DECILE: &str = "ngd_decile";
    /// Fractional TRx growth (`-0.31` is -31%).
    pub const TRX_GROWTH: &str = "trx_growth";
    /// Quarter-to-date TRx growth, read when `trx_growth` is missing.
    pub const TRX_QTD_GROWTH: &str = "trx_qtd_growth";
    /// Specialty grouping dimension.
    pub const SPECIALTY: &str = "specialty";
    /// Territory grouping dimension.
    pub const TERRITORY: &str = "territory";
    /// State grouping dimension, read when `territory` is missing.
    pub const STATE: &str = "state";
}

/// Raw tier label markers, matched case-insensitively as substrings.
pub mod tier {
    /// Markers resolving to platinum.
    pub const PLATINUM_MARKERS: [&str; 2] = ["TIER 1", "PLATINUM"];
    /// Markers resolving to gold.
    pub const GOLD_MARKERS: [&str; 2] = ["TIER 2", "GOLD"];
    /// Markers resolving to silver.
    pub const SILVER_MARKERS: [&str; 2] = ["TIER 3", "SILVER"];
    /// Markers resolving to bronze.
    pub const BRONZE_MARKERS: [&str; 2] = ["TIER 4", "BRONZE"];
    /// Marker for explicitly untargeted records (bronze).
    pub const NON_TARGET_MARKER: &str = "NON-TARGET";
    /// Text values treated as a set flag.
    pub const TRUTHY_FLAG_VALUES: [&str; 6] = ["TRUE", "T", "YES", "Y", "1", "X"];
}

/// NGD decile breakpoints, in growth percent.
pub mod ngd {
    /// Decile 1 records below this growth percent are decliners.
    pub const DECILE_1_DECLINE_BELOW: f64 = -10.0;
    /// Decile 2 growth above this is a grower.
    pub const DECILE_2_GROW_ABOVE: f64 = 15.0;
    /// Decile 2 growth below this is a decliner.
    pub const DECILE_2_DECLINE_BELOW: f64 = -10.0;
    /// Decile 3 growth above this is a grower.
    pub const DECILE_3_GROW_ABOVE: f64 = 10.0;
    /// Decile 3 growth below this is a decliner.
    pub const DECILE_3_DECLINE_BELOW: f64 = -15.0;
    /// Fallback growth above this is a grower.
    pub const FALLBACK_GROW_ABOVE: f64 = 15.0;
    /// Fallback growth below this is a decliner.
    pub const FALLBACK_DECLINE_BELOW: f64 = -10.0;
}

/// Tuned scoring constants. Kept verbatim; there is no derivation for them.
pub mod scoring {
    /// Blend weight on the (override-adjusted) growth probability.
    pub const BLEND_GROWTH_PROBABILITY: f64 = 0.6;
    /// Blend weight on the normalized rx lift.
    pub const BLEND_RX_LIFT: f64 = 0.3;
    /// Blend weight on the tier weight.
    pub const BLEND_TIER: f64 = 0.05;
    /// Blend weight on the NGD weight.
    pub const BLEND_NGD: f64 = 0.05;

    /// Tier weights: platinum, gold, silver, bronze.
    pub const TIER_WEIGHTS: [f64; 4] = [1.0, 0.8, 0.6, 0.4];
    /// NGD weights: grower, new, stable, decliner.
    pub const NGD_WEIGHTS: [f64; 4] = [1.0, 0.9, 0.7, 0.4];

    /// Growth probabilities below this are lifted for growers and new writers.
    pub const OVERRIDE_THRESHOLD: f64 = 0.3;
    /// Override floor applied to growers.
    pub const OVERRIDE_FLOOR_GROWER: f64 = 0.6;
    /// Override floor applied to new writers.
    pub const OVERRIDE_FLOOR_NEW: f64 = 0.5;

    /// Inclusive lower bounds for priority levels 5, 4, 3, 2.
    pub const PRIORITY_BINS: [f64; 4] = [0.8, 0.6, 0.4, 0.2];

    /// Offset re-centering `forecasted_lift` from `[-50, 50]` to `[0, 100]`.
    pub const CENTERED_LIFT_OFFSET: f64 = 50.0;
    /// Scale mapping a `[0, 100]` lift into `[0, 1]`.
    pub const LIFT_SCALE: f64 = 100.0;

    /// Tolerance used when validating that blend weights sum to one.
    pub const BLEND_SUM_EPSILON: f64 = 1e-6;
}

/// Sampler defaults.
pub mod sampler {
    /// Group key used for records missing a text grouping dimension.
    pub const UNKNOWN_STRATUM: &str = "unknown";
    /// Weight floor added to composite scores under priority weighting, so
    /// zero-score records can still be drawn.
    pub const PRIORITY_WEIGHT_FLOOR: f64 = 0.05;
}
