use rand::prelude::*;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::config::{DiversityWeighting, SamplerConfig, SecondaryDimension};
use crate::constants::fields::{SPECIALTY, STATE, TERRITORY};
use crate::constants::sampler::UNKNOWN_STRATUM;
use crate::data::FieldSource;
use crate::errors::EngineError;
use crate::heuristics::{QuotaPlan, Strata, stratum_label};
use crate::ngd::{NgdCategory, classify_record};
use crate::scoring::PriorityScorer;
use crate::tier::normalize_tier;
use crate::types::GroupKey;
use crate::utils::canonical_label;

#[derive(Debug, Clone)]
/// Small deterministic RNG (splitmix64) for reproducible sampling.
///
/// Any `rand::Rng` can drive the sampler; this one is cheap to construct
/// from a seed and its state can be saved and restored.
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Seeded generator.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Resume from a saved [`state`](Self::state).
    pub fn from_state(state: u64) -> Self {
        Self { state }
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.state
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl rand::RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64_internal() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut offset = 0;
        while offset < dest.len() {
            let value = self.next_u64_internal();
            let bytes = value.to_le_bytes();
            let remaining = dest.len() - offset;
            let copy_len = remaining.min(bytes.len());
            dest[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
            offset += copy_len;
        }
    }
}

/// How many records one stratum contributed to a sample.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StratumDraw {
    pub ngd: NgdCategory,
    pub group: GroupKey,
    pub members: usize,
    pub quota: usize,
    pub taken: usize,
}

impl StratumDraw {
    /// `NGD/group` label.
    pub fn label(&self) -> String {
        stratum_label(self.ngd, &self.group)
    }
}

/// What a sampling call did: the plan, per-stratum draws, and the fill.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SampleReport {
    /// Size asked for by the caller.
    pub requested: usize,
    /// Quota plan the stratified pass followed.
    pub plan: QuotaPlan,
    /// Per-stratum draws, in plan order.
    pub draws: Vec<StratumDraw>,
    /// Records added by the uniform shortfall fill.
    pub shortfall_filled: usize,
}

impl SampleReport {
    /// Records taken by the stratified pass.
    pub fn stratified(&self) -> usize {
        self.draws.iter().map(|draw| draw.taken).sum()
    }

    /// Total records in the sample.
    pub fn total(&self) -> usize {
        self.stratified() + self.shortfall_filled
    }
}

/// Multi-dimensional stratified sampler without replacement.
///
/// Records are partitioned by NGD category, then by a secondary dimension
/// (canonical tier unless configured otherwise). Each NGD category gets
/// `floor(n / k)` slots and each secondary group inside it
/// `floor(ngd_quota / t)`. Whatever integer division leaves over is filled
/// uniformly from the records not yet chosen.
///
/// Randomness comes from the caller's `Rng`; the sampler holds no mutable
/// state, so one instance can serve concurrent calls.
#[derive(Clone, Debug, Default)]
pub struct StratifiedSampler {
    config: SamplerConfig,
    scorer: PriorityScorer,
}

impl StratifiedSampler {
    /// Build a sampler after validating `config`.
    pub fn new(config: SamplerConfig) -> Result<Self, EngineError> {
        let config = config.validated()?;
        let scorer = PriorityScorer::new(config.scoring.clone())?;
        Ok(Self { config, scorer })
    }

    /// Active configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Scorer used for priority weighting.
    pub fn scorer(&self) -> &PriorityScorer {
        &self.scorer
    }

    /// Secondary group key for one record.
    pub fn group_key<F: FieldSource + ?Sized>(&self, record: &F) -> GroupKey {
        let text = match self.config.secondary {
            SecondaryDimension::Tier => return normalize_tier(record).as_str().to_string(),
            SecondaryDimension::Specialty => record.first_text(&[SPECIALTY]),
            SecondaryDimension::Territory => record.first_text(&[TERRITORY, STATE]),
        };
        text.map(canonical_label)
            .unwrap_or_else(|| UNKNOWN_STRATUM.to_string())
    }

    /// Partition population indices by NGD category and secondary group.
    pub fn stratify<F: FieldSource>(&self, population: &[F]) -> Strata {
        let mut strata = Strata::new();
        for (idx, record) in population.iter().enumerate() {
            strata
                .entry(classify_record(record))
                .or_default()
                .entry(self.group_key(record))
                .or_default()
                .push(idx);
        }
        strata
    }

    /// Quota plan for a sample of `sample_size`, without drawing.
    pub fn plan_quotas<F: FieldSource>(&self, population: &[F], sample_size: usize) -> QuotaPlan {
        QuotaPlan::build(sample_size, &self.stratify(population))
    }

    /// Draw `min(sample_size, population.len())` distinct records.
    ///
    /// The result borrows from `population`; order is not meaningful.
    pub fn sample<'a, F, R>(&self, population: &'a [F], sample_size: usize, rng: &mut R) -> Vec<&'a F>
    where
        F: FieldSource,
        R: Rng + ?Sized,
    {
        self.sample_with_report(population, sample_size, rng).0
    }

    /// [`sample`](Self::sample) driven by a [`DeterministicRng`] seeded with
    /// `seed`.
    pub fn sample_seeded<'a, F: FieldSource>(
        &self,
        population: &'a [F],
        sample_size: usize,
        seed: u64,
    ) -> Vec<&'a F> {
        self.sample(population, sample_size, &mut DeterministicRng::new(seed))
    }

    /// [`sample`](Self::sample) plus a report of how the sample was built.
    pub fn sample_with_report<'a, F, R>(
        &self,
        population: &'a [F],
        sample_size: usize,
        rng: &mut R,
    ) -> (Vec<&'a F>, SampleReport)
    where
        F: FieldSource,
        R: Rng + ?Sized,
    {
        let strata = self.stratify(population);
        let plan = QuotaPlan::build(sample_size, &strata);
        let target = plan.target;

        let mut chosen = vec![false; population.len()];
        let mut selected: Vec<usize> = Vec::with_capacity(target);
        let mut draws = Vec::with_capacity(plan.strata().count());

        for stratum in plan.strata() {
            let members = strata
                .get(&stratum.ngd)
                .and_then(|groups| groups.get(&stratum.group))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let take = stratum.quota.min(members.len());
            let mut taken = 0usize;
            if take > 0 {
                for idx in self.permute(population, members, rng).into_iter().take(take) {
                    if !chosen[idx] {
                        chosen[idx] = true;
                        selected.push(idx);
                        taken += 1;
                    }
                }
            }
            draws.push(StratumDraw {
                ngd: stratum.ngd,
                group: stratum.group.clone(),
                members: stratum.members,
                quota: stratum.quota,
                taken,
            });
        }

        let need = target.saturating_sub(selected.len());
        let mut shortfall_filled = 0usize;
        if need > 0 {
            let remaining: Vec<usize> = (0..population.len()).filter(|idx| !chosen[*idx]).collect();
            for idx in remaining.choose_multiple(rng, need) {
                chosen[*idx] = true;
                selected.push(*idx);
                shortfall_filled += 1;
            }
        }

        debug!(
            population = population.len(),
            requested = sample_size,
            target,
            ngd_groups = plan.groups.len(),
            strata = draws.len(),
            zero_quota_strata = plan.zero_quota_strata(),
            shortfall_filled,
            "stratified sample drawn"
        );

        let sample = selected.into_iter().map(|idx| &population[idx]).collect();
        let report = SampleReport {
            requested: sample_size,
            plan,
            draws,
            shortfall_filled,
        };
        (sample, report)
    }

    /// Random permutation of one stratum's member indices.
    fn permute<F, R>(&self, population: &[F], members: &[usize], rng: &mut R) -> Vec<usize>
    where
        F: FieldSource,
        R: Rng + ?Sized,
    {
        match self.config.weighting {
            DiversityWeighting::Uniform => {
                let mut order = members.to_vec();
                order.shuffle(rng);
                order
            }
            DiversityWeighting::Priority => {
                // Efraimidis-Spirakis: sort by ln(u) / w, largest first.
                let floor = self.config.priority_weight_floor;
                let mut keyed: Vec<(usize, f64)> = members
                    .iter()
                    .map(|&idx| {
                        let composite = self.scorer.score(&population[idx]).composite_score;
                        let weight = composite.max(0.0) + floor;
                        let u: f64 = rng.random();
                        (idx, u.ln() / weight)
                    })
                    .collect();
                keyed.sort_by(|a, b| b.1.total_cmp(&a.1));
                keyed.into_iter().map(|(idx, _)| idx).collect()
            }
        }
    }
}

/// Sample with the default configuration (NGD x tier, uniform).
pub fn sample<'a, F, R>(population: &'a [F], sample_size: usize, rng: &mut R) -> Vec<&'a F>
where
    F: FieldSource,
    R: Rng + ?Sized,
{
    StratifiedSampler::default().sample(population, sample_size, rng)
}

/// Per-stratum counts of a sample, keyed by `NGD/group` label.
pub fn stratum_counts<F: FieldSource + ?Sized>(
    sampler: &StratifiedSampler,
    sample: &[&F],
) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for record in sample {
        let label = stratum_label(classify_record(*record), &sampler.group_key(*record));
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::fields::{GROWTH_PROBABILITY, NGD_DECILE, TIER_RAW, TRX_GROWTH};
    use crate::data::Record;
    use std::collections::HashSet;

    /// Growth fractions that land each category under the fallback decile row.
    fn growth_for(ngd: NgdCategory) -> (i64, f64) {
        match ngd {
            NgdCategory::New => (1, 0.0),
            NgdCategory::Grower => (5, 0.3),
            NgdCategory::Stable => (5, 0.0),
            NgdCategory::Decliner => (5, -0.3),
        }
    }

    fn build_record(idx: usize, ngd: NgdCategory, tier: &str) -> Record {
        let (decile, growth) = growth_for(ngd);
        Record::new(format!("hcp::{idx:04}"))
            .with(TIER_RAW, tier)
            .with(NGD_DECILE, decile)
            .with(TRX_GROWTH, growth)
            .with(GROWTH_PROBABILITY, (idx % 10) as f64 / 10.0)
    }

    fn balanced_population(per_category: usize) -> Vec<Record> {
        let tiers = ["Tier 1", "Tier 2", "Tier 3", "Tier 4"];
        let mut population = Vec::new();
        for ngd in NgdCategory::ALL {
            for i in 0..per_category {
                let idx = population.len();
                population.push(build_record(idx, ngd, tiers[i % tiers.len()]));
            }
        }
        population
    }

    fn ids(sample: &[&Record]) -> Vec<String> {
        sample.iter().map(|record| record.id.clone()).collect()
    }

    #[test]
    fn deterministic_rng_state_roundtrip_and_fill_bytes_are_stable() {
        let mut rng_a = DeterministicRng::new(123);
        let first = rng_a.next_u64();
        let saved = rng_a.state();

        let mut rng_b = DeterministicRng::from_state(saved);
        assert_eq!(rng_a.next_u64(), rng_b.next_u64());
        assert_ne!(first, 0);

        let mut bytes_a = [0u8; 13];
        let mut bytes_b = [0u8; 13];
        let mut rng_c = DeterministicRng::new(999);
        let mut rng_d = DeterministicRng::new(999);
        rng_c.fill_bytes(&mut bytes_a);
        rng_d.fill_bytes(&mut bytes_b);
        assert_eq!(bytes_a, bytes_b);
        assert!(bytes_a.iter().any(|b| *b != 0));
    }

    #[test]
    fn sample_size_is_min_of_request_and_population() {
        let population = balanced_population(5);
        let sampler = StratifiedSampler::default();
        for n in [0, 1, 7, 20, 21, 500] {
            let sample = sampler.sample_seeded(&population, n, 9);
            assert_eq!(sample.len(), n.min(population.len()));
        }
        let empty: Vec<Record> = Vec::new();
        assert!(sampler.sample_seeded(&empty, 10, 9).is_empty());
    }

    #[test]
    fn sample_has_no_duplicates_and_comes_from_population() {
        let population = balanced_population(13);
        let sample = StratifiedSampler::default().sample_seeded(&population, 30, 4);
        let unique: HashSet<*const Record> = sample.iter().map(|r| *r as *const Record).collect();
        assert_eq!(unique.len(), sample.len());
        for record in &sample {
            assert!(population.iter().any(|p| std::ptr::eq(p, *record)));
        }
    }

    #[test]
    fn every_category_is_covered_in_balanced_population() {
        let population = balanced_population(25);
        let sampler = StratifiedSampler::default();
        for seed in [1, 2, 3, 42] {
            let (sample, report) = sampler.sample_with_report(
                &population,
                40,
                &mut DeterministicRng::new(seed),
            );
            let categories: HashSet<NgdCategory> =
                sample.iter().map(|r| classify_record(*r)).collect();
            assert_eq!(categories.len(), 4);
            // 40 / 4 = 10 per category, 10 / 4 tiers = 2 per stratum.
            assert!(report.draws.iter().all(|draw| draw.quota == 2 && draw.taken == 2));
            assert_eq!(report.stratified(), 32);
            assert_eq!(report.shortfall_filled, 8);
            assert_eq!(report.total(), 40);
        }
    }

    #[test]
    fn same_seed_reproduces_same_sample() {
        let population = balanced_population(20);
        let sampler = StratifiedSampler::default();
        let a = ids(&sampler.sample_seeded(&population, 25, 77));
        let b = ids(&sampler.sample_seeded(&population, 25, 77));
        let c = ids(&sampler.sample_seeded(&population, 25, 78));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn small_strata_are_exhausted_then_filled() {
        let mut population = balanced_population(0);
        population.push(build_record(0, NgdCategory::New, "Tier 1"));
        for idx in 1..30 {
            population.push(build_record(idx, NgdCategory::Stable, "Tier 4"));
        }
        let (sample, report) = StratifiedSampler::default().sample_with_report(
            &population,
            10,
            &mut DeterministicRng::new(5),
        );
        assert_eq!(sample.len(), 10);
        assert!(sample.iter().any(|r| r.id == "hcp::0000"));
        // quota 5 per category; New/Platinum only has one member.
        assert_eq!(report.stratified(), 6);
        assert_eq!(report.shortfall_filled, 4);
    }

    #[test]
    fn secondary_dimension_groups_by_text_field() {
        let population: Vec<Record> = (0..12)
            .map(|idx| {
                let record = build_record(idx, NgdCategory::Stable, "Tier 2");
                match idx % 3 {
                    0 => record.with(SPECIALTY, "cardiology"),
                    1 => record.with(SPECIALTY, "Oncology "),
                    _ => record,
                }
            })
            .collect();
        let sampler = StratifiedSampler::new(SamplerConfig {
            secondary: SecondaryDimension::Specialty,
            ..SamplerConfig::default()
        })
        .unwrap();
        let plan = sampler.plan_quotas(&population, 6);
        let groups: Vec<&str> = plan.strata().map(|s| s.group.as_str()).collect();
        assert_eq!(groups, vec!["CARDIOLOGY", "ONCOLOGY", UNKNOWN_STRATUM]);
        assert!(plan.strata().all(|s| s.quota == 2));

        let sample = sampler.sample_seeded(&population, 6, 3);
        let counts = stratum_counts(&sampler, &sample);
        assert_eq!(counts.get("Stable/CARDIOLOGY"), Some(&2));
        assert_eq!(counts.get("Stable/unknown"), Some(&2));
    }

    #[test]
    fn territory_falls_back_to_state() {
        let sampler = StratifiedSampler::new(SamplerConfig {
            secondary: SecondaryDimension::Territory,
            ..SamplerConfig::default()
        })
        .unwrap();
        let record = Record::new("x").with(STATE, "tx");
        assert_eq!(sampler.group_key(&record), "TX");
        let record = record.with(TERRITORY, "South-04");
        assert_eq!(sampler.group_key(&record), "SOUTH-04");
    }

    #[test]
    fn priority_weighting_prefers_high_scores() {
        // One stratum: 10 high-probability records and 90 zero-probability ones.
        let population: Vec<Record> = (0..100)
            .map(|idx| {
                let prob = if idx < 10 { 1.0 } else { 0.0 };
                Record::new(format!("hcp::{idx:04}"))
                    .with(TIER_RAW, "Tier 4")
                    .with(NGD_DECILE, 5)
                    .with(TRX_GROWTH, 0.0)
                    .with(GROWTH_PROBABILITY, prob)
                    .with(crate::constants::fields::FORECASTED_LIFT, -50.0)
            })
            .collect();
        let weighted = StratifiedSampler::new(SamplerConfig {
            weighting: DiversityWeighting::Priority,
            ..SamplerConfig::default()
        })
        .unwrap();
        let uniform = StratifiedSampler::default();

        let mut weighted_hits = 0usize;
        let mut uniform_hits = 0usize;
        for seed in 0..50 {
            let is_high = |r: &&Record| r.number(GROWTH_PROBABILITY) == Some(1.0);
            weighted_hits += weighted
                .sample_seeded(&population, 10, seed)
                .into_iter()
                .filter(is_high)
                .count();
            uniform_hits += uniform
                .sample_seeded(&population, 10, seed)
                .into_iter()
                .filter(is_high)
                .count();
        }
        assert!(
            weighted_hits > uniform_hits * 2,
            "weighted={weighted_hits} uniform={uniform_hits}"
        );
    }

    #[test]
    fn free_function_uses_default_config() {
        let population = balanced_population(10);
        let mut rng_a = DeterministicRng::new(11);
        let mut rng_b = DeterministicRng::new(11);
        let a = ids(&sample(&population, 12, &mut rng_a));
        let b = ids(&StratifiedSampler::default().sample(&population, 12, &mut rng_b));
        assert_eq!(a, b);
    }
}
