//! SimLab CLI — run sweeps and comparisons from TOML configs.
//!
//! Commands:
//! - `sweep` — run one parametric sweep and write the result tensor + summary
//! - `compare` — run measures against shared signals and correlate them
//! - `store status` — report stored artifact count
//! - `store clear` — drop every stored artifact

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use simlab_core::{ParamIter, ParamSampler, SeedHierarchy, ValueSampler};
use simlab_runner::{
    compute_all_corrs, export_corr_csv, export_summary_csv, export_tensor_json, run_comparisons,
    run_sweep, run_sweep_parallel_with_progress, BootstrapConfig, CompareConfig, ParamSource,
    Reduction, SignalStore, SweepConfig,
};

#[derive(Parser)]
#[command(name = "simlab", about = "SimLab CLI — parametric sweeps over simulated time series")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one parametric sweep from a TOML config file.
    Sweep {
        /// Path to a TOML sweep config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        out: PathBuf,

        /// Run serially instead of on the worker pool.
        #[arg(long, default_value_t = false)]
        serial: bool,

        /// Override the configured worker count (-1 = all cores).
        #[arg(long)]
        jobs: Option<i32>,

        /// How to collapse the repetition axis in the summary.
        #[arg(long, default_value = "mean")]
        reduction: String,
    },
    /// Run a comparison (many measures, same signals) and correlate results.
    Compare {
        /// Path to a TOML comparison config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// Artifact store management.
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Report stored artifact count.
    Status {
        /// Store directory.
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },
    /// Remove every stored artifact.
    Clear {
        /// Store directory.
        #[arg(long, default_value = "data")]
        dir: PathBuf,

        /// Actually delete (without this flag, only reports what would go).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            config,
            out,
            serial,
            jobs,
            reduction,
        } => run_sweep_cmd(&config, &out, serial, jobs, &reduction),
        Commands::Compare { config, out } => run_compare_cmd(&config, &out),
        Commands::Store { action } => match action {
            StoreAction::Status { dir } => run_store_status(&dir),
            StoreAction::Clear { dir, confirm } => run_store_clear(&dir, confirm),
        },
    }
}

fn run_sweep_cmd(
    config_path: &Path,
    out_dir: &Path,
    serial: bool,
    jobs: Option<i32>,
    reduction: &str,
) -> Result<()> {
    let reduction: Reduction = reduction.parse()?;
    let doc = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config = SweepConfig::from_toml_str(&doc).context("failed to parse sweep config")?;
    config.validate()?;

    let generator = config.generator.build();
    let measure = config.measure.build();
    let iter = ParamIter::new(&config.base_params, config.slot.clone(), config.values.clone())?;
    let n_jobs = jobs.unwrap_or(config.n_jobs);

    println!(
        "sweep '{}': {} values x {} reps, run id {}",
        config.name,
        iter.len(),
        config.n_reps,
        &config.run_id()[..12]
    );

    let tensor = if serial {
        run_sweep(
            generator.as_ref(),
            &iter,
            measure.as_ref(),
            config.n_reps,
            config.seed,
            &config.name,
        )?
    } else {
        run_sweep_parallel_with_progress(
            generator.as_ref(),
            &iter,
            measure.as_ref(),
            config.n_reps,
            n_jobs,
            config.seed,
            &config.name,
            |done, total| {
                if done % 50 == 0 || done == total {
                    println!("  {done}/{total} cells");
                }
            },
        )?
    };

    if tensor.failures > 0 {
        println!("warning: {} measure calls failed (NaN cells)", tensor.failures);
    }

    std::fs::create_dir_all(out_dir).context("failed to create output directory")?;
    let tensor_path = out_dir.join(format!("{}.tensor.json", config.name));
    std::fs::write(&tensor_path, export_tensor_json(&tensor)?)?;
    let summary_path = out_dir.join(format!("{}.summary.csv", config.name));
    std::fs::write(&summary_path, export_summary_csv(&tensor, reduction)?)?;

    println!("wrote {}", tensor_path.display());
    println!("wrote {}", summary_path.display());
    Ok(())
}

fn run_compare_cmd(config_path: &Path, out_dir: &Path) -> Result<()> {
    let doc = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config = CompareConfig::from_toml_str(&doc).context("failed to parse compare config")?;
    config.validate()?;

    let generator = config.generator.build();
    let measures: Vec<_> = config.measures.iter().map(|m| m.build()).collect();

    let source = if config.samplers.is_empty() {
        ParamSource::Fixed(config.base_params.clone())
    } else {
        let seeds = SeedHierarchy::new(config.seed);
        let samplers = config
            .samplers
            .iter()
            .enumerate()
            .map(|(index, def)| {
                let sampler = ValueSampler::new(
                    def.values.clone(),
                    def.probs.clone(),
                    None,
                    seeds.sub_seed("sampler", index as u64),
                )?;
                Ok((def.slot.clone(), sampler))
            })
            .collect::<Result<Vec<_>>>()?;
        ParamSource::Sampled(ParamSampler::new(&config.base_params, samplers)?)
    };

    println!(
        "comparison '{}': {} measures x {} trials",
        config.name,
        measures.len(),
        config.n_trials
    );

    let results = run_comparisons(
        generator.as_ref(),
        source,
        &measures,
        config.n_trials,
        config.seed,
        config.collect_params,
        &config.name,
    )?;

    for (name, count) in &results.failures {
        if *count > 0 {
            println!("warning: measure '{name}' failed on {count} trials");
        }
    }

    let table = compute_all_corrs(&results.results, None, &BootstrapConfig::default())?;

    std::fs::create_dir_all(out_dir).context("failed to create output directory")?;
    let results_path = out_dir.join(format!("{}.results.json", config.name));
    std::fs::write(&results_path, serde_json::to_string_pretty(&results)?)?;
    let corrs_path = out_dir.join(format!("{}.corrs.csv", config.name));
    std::fs::write(&corrs_path, export_corr_csv(&table)?)?;

    for (a, b, stats) in table.pairs() {
        println!(
            "  {a} ~ {b}: r = {:+.3} [{:+.3}, {:+.3}], p = {:.4}",
            stats.r, stats.ci_low, stats.ci_high, stats.p
        );
    }
    println!("wrote {}", results_path.display());
    println!("wrote {}", corrs_path.display());
    Ok(())
}

fn run_store_status(dir: &Path) -> Result<()> {
    if !dir.exists() {
        bail!("store directory {} does not exist", dir.display());
    }
    let store = SignalStore::new(dir)?;
    println!("{} artifacts in {}", store.len()?, dir.display());
    Ok(())
}

fn run_store_clear(dir: &Path, confirm: bool) -> Result<()> {
    if !dir.exists() {
        bail!("store directory {} does not exist", dir.display());
    }
    let store = SignalStore::new(dir)?;
    let count = store.len()?;
    if !confirm {
        println!("would remove {count} artifacts from {} (pass --confirm)", dir.display());
        return Ok(());
    }
    store.clear()?;
    println!("removed {count} artifacts from {}", dir.display());
    Ok(())
}
