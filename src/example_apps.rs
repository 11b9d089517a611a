use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::{DiversityWeighting, SamplerConfig, SecondaryDimension};
use crate::data::Record;
use crate::metrics::{FallbackCounts, stratum_skew};
use crate::sampler::{DeterministicRng, SampleReport, StratifiedSampler, stratum_counts};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SecondaryArg {
    Tier,
    Specialty,
    Territory,
}

impl From<SecondaryArg> for SecondaryDimension {
    fn from(value: SecondaryArg) -> Self {
        match value {
            SecondaryArg::Tier => SecondaryDimension::Tier,
            SecondaryArg::Specialty => SecondaryDimension::Specialty,
            SecondaryArg::Territory => SecondaryDimension::Territory,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WeightingArg {
    Uniform,
    Priority,
}

impl From<WeightingArg> for DiversityWeighting {
    fn from(value: WeightingArg) -> Self {
        match value {
            WeightingArg::Uniform => DiversityWeighting::Uniform,
            WeightingArg::Priority => DiversityWeighting::Priority,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "priority_report",
    disable_help_subcommand = true,
    about = "Score, stratify, and sample an HCP population",
    long_about = "Classify every record by tier and NGD category, draw a stratified sample, and print the quota plan, per-stratum skew, fallback counts, and the top-ranked sampled records.",
    after_help = "Set RUST_LOG=hcp_priority=debug to see the sampler summary, or =trace for per-record fallbacks."
)]
/// CLI for `priority_report_demo`.
///
/// Common usage:
/// - Default run: 400 synthetic records, sample of 40
/// - Group by specialty instead of tier: `--secondary specialty`
/// - Bias draws toward high scores: `--weighting priority`
/// - Load tuned weights: `--config weights.json`
struct PriorityReportCli {
    #[arg(
        long = "population",
        default_value_t = 400,
        value_parser = parse_positive_usize,
        help = "Number of synthetic records to generate"
    )]
    population: usize,
    #[arg(
        long = "sample-size",
        default_value_t = 40,
        value_parser = parse_positive_usize,
        help = "Requested sample size"
    )]
    sample_size: usize,
    #[arg(long, default_value_t = 7, help = "Deterministic seed for generation and sampling")]
    seed: u64,
    #[arg(long, value_enum, help = "Secondary stratification dimension (default: tier)")]
    secondary: Option<SecondaryArg>,
    #[arg(long, value_enum, help = "Within-stratum ordering (default: uniform)")]
    weighting: Option<WeightingArg>,
    #[arg(
        long = "top",
        default_value_t = 10,
        help = "How many top-ranked sampled records to print"
    )]
    top: usize,
    #[arg(
        long = "config",
        value_name = "PATH",
        help = "Optional JSON sampler/scoring configuration; CLI flags override it"
    )]
    config: Option<PathBuf>,
}

/// Run the priority report over a population produced by `build_population`.
///
/// `build_population` receives the requested population size and the seed.
pub fn run_priority_report<Build, I>(
    args_iter: I,
    build_population: Build,
) -> Result<(), Box<dyn Error>>
where
    Build: FnOnce(usize, u64) -> Vec<Record>,
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<PriorityReportCli, _>(
        std::iter::once("priority_report".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(path) => SamplerConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => SamplerConfig::default(),
    };
    if let Some(secondary) = cli.secondary {
        config.secondary = secondary.into();
    }
    if let Some(weighting) = cli.weighting {
        config.weighting = weighting.into();
    }
    let sampler = StratifiedSampler::new(config)?;

    let population = build_population(cli.population, cli.seed);
    let mut rng = DeterministicRng::new(cli.seed);
    let (sample, report) = sampler.sample_with_report(&population, cli.sample_size, &mut rng);

    println!("=== priority report ===");
    println!("population: {}", population.len());
    println!("requested sample: {}", cli.sample_size);
    println!("seed: {}", cli.seed);
    println!(
        "secondary: {:?}, weighting: {:?}",
        sampler.config().secondary,
        sampler.config().weighting
    );
    println!();

    print_plan(&report);
    print_fallbacks(&FallbackCounts::from_population(sampler.scorer(), &population));

    let counts = stratum_counts(&sampler, &sample);
    println!("[SAMPLE BY STRATUM]");
    match stratum_skew(&counts) {
        Some(skew) => {
            for entry in &skew.per_stratum {
                println!(
                    "  {}: count={} share={:.2}",
                    entry.stratum, entry.count, entry.share
                );
            }
            println!(
                "  skew: strata={} total={} min={} max={} mean={:.2} ratio={:.2}",
                skew.strata, skew.total, skew.min, skew.max, skew.mean, skew.ratio
            );
        }
        None => println!("  (empty sample)"),
    }
    println!();

    let ranked = sampler.scorer().rank_population(&sample);
    println!("[TOP {} SAMPLED]", cli.top.min(ranked.len()));
    for (rank, scored) in ranked.iter().take(cli.top).enumerate() {
        println!(
            "  #{:<3} {:<12} {:<9} {:<8} score={:.4} {}",
            rank + 1,
            scored.record.id,
            scored.tier.as_str(),
            scored.ngd.as_str(),
            scored.composite_score(),
            scored.priority_level()
        );
    }

    Ok(())
}

fn print_plan(report: &SampleReport) {
    let plan = &report.plan;
    println!("[QUOTA PLAN]");
    println!(
        "  target={} ngd_groups={} strata={} zero_quota_strata={}",
        plan.target,
        plan.groups.len(),
        report.draws.len(),
        plan.zero_quota_strata()
    );
    for group in &plan.groups {
        println!(
            "  {} members={} quota={}",
            group.ngd, group.members, group.quota
        );
    }
    for draw in &report.draws {
        println!(
            "    {:<24} members={:<5} quota={:<4} taken={}",
            draw.label(),
            draw.members,
            draw.quota,
            draw.taken
        );
    }
    println!(
        "  stratified={} shortfall_filled={} total={}",
        report.stratified(),
        report.shortfall_filled,
        report.total()
    );
    println!();
}

fn print_fallbacks(counts: &FallbackCounts) {
    println!("[FALLBACKS]");
    println!("  records:                    {}", counts.records);
    println!("  default (bronze) tier:      {}", counts.default_tier);
    println!("  flag-derived tier:          {}", counts.flag_tier);
    println!("  generic decile thresholds:  {}", counts.fallback_decile);
    println!(
        "  coerced probability/lift/decile/growth: {}/{}/{}/{}",
        counts.coerced_growth_probability,
        counts.coerced_lift,
        counts.coerced_ngd_decile,
        counts.coerced_trx_growth
    );
    println!("  any coerced input:          {}", counts.any_coerced);
    println!();
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
