//! Property and scenario tests for the stratified sampler.

use std::collections::{HashMap, HashSet};

use hcp_priority::sampler::stratum_counts;
use hcp_priority::{
    DeterministicRng, DiversityWeighting, FieldLookup, FieldValue, NgdCategory, Record,
    SamplerConfig, SecondaryDimension, StratifiedSampler, classify_record, normalize_tier, sample,
};
use proptest::prelude::*;

/// Decile/growth pairs landing in each NGD category.
fn ngd_fields(ngd: NgdCategory) -> (i64, f64) {
    match ngd {
        NgdCategory::New => (1, 0.05),
        NgdCategory::Grower => (6, 0.25),
        NgdCategory::Stable => (6, 0.0),
        NgdCategory::Decliner => (6, -0.25),
    }
}

fn hcp(idx: usize, ngd: NgdCategory, tier: &str) -> Record {
    let (decile, growth) = ngd_fields(ngd);
    Record::new(format!("hcp::{idx:05}"))
        .with("tier_raw", tier)
        .with("ngd_decile", decile)
        .with("trx_growth", growth)
        .with("growth_probability", (idx % 11) as f64 / 10.0)
}

/// Population shaped by `(category, tier, count)` rows.
fn population(shape: &[(NgdCategory, &str, usize)]) -> Vec<Record> {
    let mut records = Vec::new();
    for (ngd, tier, count) in shape {
        for _ in 0..*count {
            let idx = records.len();
            records.push(hcp(idx, *ngd, tier));
        }
    }
    records
}

fn arbitrary_population(size: usize, salt: u64) -> Vec<Record> {
    let tiers = ["Tier 1", "Tier 2", "Tier 3", "Tier 4", "", "Non-Target"];
    (0..size)
        .map(|idx| {
            let mix = (idx as u64).wrapping_mul(0x9E37_79B9).wrapping_add(salt);
            let ngd = NgdCategory::ALL[(mix % 4) as usize];
            hcp(idx, ngd, tiers[((mix >> 3) % tiers.len() as u64) as usize])
        })
        .collect()
}

fn addresses(sample: &[&Record]) -> HashSet<*const Record> {
    sample.iter().map(|record| *record as *const Record).collect()
}

proptest! {
    /// |sample| = min(n, |population|), with no record drawn twice.
    #[test]
    fn sample_size_and_uniqueness(
        size in 0usize..160,
        n in 0usize..220,
        salt in any::<u64>(),
        seed in any::<u64>(),
        weighted in any::<bool>(),
        secondary in prop::sample::select(vec![
            SecondaryDimension::Tier,
            SecondaryDimension::Specialty,
            SecondaryDimension::Territory,
        ]),
    ) {
        let population = arbitrary_population(size, salt);
        let config = SamplerConfig {
            secondary,
            weighting: if weighted { DiversityWeighting::Priority } else { DiversityWeighting::Uniform },
            ..SamplerConfig::default()
        };
        let sampler = StratifiedSampler::new(config).unwrap();
        let (picked, report) = sampler.sample_with_report(
            &population,
            n,
            &mut DeterministicRng::new(seed),
        );
        prop_assert_eq!(picked.len(), n.min(size));
        prop_assert_eq!(addresses(&picked).len(), picked.len());
        prop_assert_eq!(report.total(), picked.len());
        prop_assert!(picked
            .iter()
            .all(|record| population.iter().any(|p| std::ptr::eq(p, *record))));
    }

    /// Each stratum contributes at least min(quota, stratum size).
    #[test]
    fn every_stratum_meets_its_planned_draw(
        size in 1usize..160,
        n in 1usize..160,
        salt in any::<u64>(),
        seed in any::<u64>(),
    ) {
        let population = arbitrary_population(size, salt);
        let sampler = StratifiedSampler::default();
        let plan = sampler.plan_quotas(&population, n);
        let picked = sampler.sample_seeded(&population, n, seed);
        let counts = stratum_counts(&sampler, &picked);
        for stratum in plan.strata() {
            let got = counts.get(&stratum.label()).copied().unwrap_or(0);
            prop_assert!(got >= stratum.planned(), "{} got {} planned {}", stratum.label(), got, stratum.planned());
        }
    }
}

#[test]
fn empty_population_yields_empty_sample() {
    let empty: Vec<Record> = Vec::new();
    let mut rng = DeterministicRng::new(1);
    assert!(sample(&empty, 25, &mut rng).is_empty());
    let (picked, report) = StratifiedSampler::default().sample_with_report(&empty, 25, &mut rng);
    assert!(picked.is_empty());
    assert_eq!(report.plan.target, 0);
    assert!(report.draws.is_empty());
}

#[test]
fn balanced_categories_are_all_represented() {
    let shape: Vec<(NgdCategory, &str, usize)> = NgdCategory::ALL
        .into_iter()
        .map(|ngd| (ngd, "Tier 2", 25))
        .collect();
    let population = population(&shape);
    let sampler = StratifiedSampler::default();
    for seed in 0..20 {
        let picked = sampler.sample_seeded(&population, 40, seed);
        assert_eq!(picked.len(), 40);
        let mut per_category: HashMap<NgdCategory, usize> = HashMap::new();
        for record in &picked {
            *per_category.entry(classify_record(*record)).or_insert(0) += 1;
        }
        assert_eq!(per_category.len(), 4);
        // Quotas divide evenly, so no shortfall fill is needed.
        assert!(per_category.values().all(|count| *count == 10));
    }
}

#[test]
fn oversized_request_returns_whole_population() {
    let population = population(&[
        (NgdCategory::Grower, "Tier 1", 3),
        (NgdCategory::Decliner, "Tier 4", 2),
    ]);
    let picked = StratifiedSampler::default().sample_seeded(&population, 50, 3);
    assert_eq!(picked.len(), population.len());
    assert_eq!(addresses(&picked).len(), population.len());
}

#[test]
fn rare_tier_gets_its_quota_within_a_category() {
    let population = population(&[
        (NgdCategory::Stable, "Tier 4", 200),
        (NgdCategory::Stable, "Tier 1", 5),
    ]);
    let sampler = StratifiedSampler::default();
    for seed in 0..10 {
        let picked = sampler.sample_seeded(&population, 10, seed);
        let platinum = picked
            .iter()
            .filter(|record| normalize_tier(**record).as_str() == "Platinum")
            .count();
        assert!(platinum >= 5, "seed {seed}: only {platinum} platinum records");
    }
}

#[test]
fn same_seed_same_sample_across_calls() {
    let population = arbitrary_population(300, 17);
    let sampler = StratifiedSampler::default();
    let ids = |seed| -> Vec<String> {
        sampler
            .sample_seeded(&population, 60, seed)
            .into_iter()
            .map(|record| record.id.clone())
            .collect()
    };
    assert_eq!(ids(5), ids(5));
    assert_ne!(ids(5), ids(6));
}

#[test]
fn overlaid_population_is_sampled_by_overlay_fields() {
    let population: Vec<Record> = (0..40)
        .map(|idx| Record::new(format!("hcp::{idx}")).with("tier_raw", "Tier 3"))
        .collect();
    // Mark the first eight as decile-1 new writers through the lookup only.
    let lookup = FieldLookup::from_entries((0..8).map(|idx| {
        (
            format!("hcp::{idx}"),
            vec![("ngd_decile".to_string(), FieldValue::from(1i64))],
        )
    }));
    let views = lookup.overlay_all(&population);
    let sampler = StratifiedSampler::default();
    let picked = sampler.sample_seeded(&views, 8, 2);
    let new_writers = picked
        .iter()
        .filter(|view| classify_record(*view) == NgdCategory::New)
        .count();
    // Two NGD groups, quota 4 each.
    assert_eq!(new_writers, 4);
}
