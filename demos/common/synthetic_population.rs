use hcp_priority::Record;
use hcp_priority::constants::fields::{
    FORECASTED_LIFT, FORECASTED_LIFT_PCT, GOLD_FLAG, GROWTH_PROBABILITY, NGD_DECILE, SPECIALTY,
    STATE, TERRITORY, TIER_RAW, TRX_GROWTH, TRX_QTD_GROWTH,
};
use hcp_priority::sampler::DeterministicRng;
use rand::Rng;
use rand::seq::IndexedRandom;

const TIER_LABELS: &[&str] = &[
    "Tier 1 - Platinum",
    "tier 2",
    "GOLD",
    "Tier 3 (Silver)",
    "Tier 4",
    "Non-Target",
    "",
    "unclassified",
];
const SPECIALTIES: &[&str] = &["Cardiology", "Oncology", "Family Medicine", "Endocrinology"];
const TERRITORIES: &[&str] = &["North-01", "North-02", "South-01", "West-03"];
const STATES: &[&str] = &["CA", "TX", "NY", "FL"];

/// Seeded synthetic HCP population with realistic gaps: missing tiers,
/// malformed probabilities, and lift reported on either scale.
pub fn build_population(size: usize, seed: u64) -> Vec<Record> {
    let mut rng = DeterministicRng::new(seed ^ 0x5EED);
    (0..size)
        .map(|idx| {
            let mut record = Record::new(format!("hcp::{idx:05}"));
            if let Some(label) = TIER_LABELS.choose(&mut rng) {
                if !label.is_empty() {
                    record.set(TIER_RAW, *label);
                }
            }
            if rng.random_bool(0.1) {
                record.set(GOLD_FLAG, "Y");
            }

            if rng.random_bool(0.95) {
                record.set(NGD_DECILE, rng.random_range(1..=10i64));
            }
            let growth = rng.random_range(-0.4..0.4f64);
            if rng.random_bool(0.8) {
                record.set(TRX_GROWTH, growth);
            } else {
                record.set(TRX_QTD_GROWTH, growth);
            }

            match rng.random_range(0..20) {
                0 => record.set(GROWTH_PROBABILITY, "n/a"),
                1 => {}
                _ => record.set(GROWTH_PROBABILITY, rng.random_range(-0.05..1.05f64)),
            }
            if rng.random_bool(0.7) {
                record.set(FORECASTED_LIFT, rng.random_range(-50.0..50.0f64));
            } else if rng.random_bool(0.8) {
                record.set(FORECASTED_LIFT_PCT, rng.random_range(0.0..100.0f64));
            }

            if let Some(specialty) = SPECIALTIES.choose(&mut rng) {
                record.set(SPECIALTY, *specialty);
            }
            if rng.random_bool(0.6) {
                if let Some(territory) = TERRITORIES.choose(&mut rng) {
                    record.set(TERRITORY, *territory);
                }
            } else if let Some(state) = STATES.choose(&mut rng) {
                record.set(STATE, *state);
            }
            record
        })
        .collect()
}
