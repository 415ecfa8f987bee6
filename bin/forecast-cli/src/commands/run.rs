// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `forecast-rt run` command: run a staged forecast and write every step.
//!
//! Walks the driver's type-state pipeline:
//! ```text
//! ForecastDriver<Idle> → plan → <Planned> → run → RunReport
//! ```

use anyhow::Context;
use forecast_ir::StateLoader;
use runtime::{AffineModelProvider, ForecastDriver, RuntimeConfig, SafeTensorsSink};
use std::path::PathBuf;
use std::time::Duration;

/// Exit status when the deadline passes, as with coreutils `timeout`.
const DEADLINE_EXIT_CODE: i32 = 124;

#[derive(clap::Args)]
pub struct RunArgs {
    /// Directory holding one `<stage>.safetensors` per stage. Required
    /// unless the config file sets `model_dir`.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Initial state (`.safetensors`).
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for per-step outputs.
    #[arg(short, long, default_value = "output")]
    save_dir: PathBuf,

    /// Steps per stage, in stage order (e.g. `20 20 20`).
    #[arg(short, long, num_args = 1..)]
    num_steps: Option<Vec<usize>>,

    /// Hours between steps.
    #[arg(long)]
    freq_hours: Option<u32>,

    /// Threads a model may use inside one step.
    #[arg(short, long)]
    threads: Option<usize>,

    /// Execution device: cpu or cuda.
    #[arg(short, long)]
    device: Option<String>,

    /// Abort if the run takes longer than this many seconds.
    #[arg(long)]
    deadline_secs: Option<u64>,
}

pub async fn execute(config_path: Option<PathBuf>, args: RunArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           forecast-rt · Staged Forecast Run          ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Configuration ──────────────────────────────────────────
    let config = resolve_config(config_path, &args)?;

    println!("  Config:");
    println!("   Model:    {}", config.model_dir.display());
    println!("   Input:    {}", args.input.display());
    println!("   Output:   {}", args.save_dir.display());
    println!("   Device:   {}", config.device);
    println!("   Threads:  {}", config.resolve_threads());
    println!("   Step:     {}h", config.freq_hours);
    println!();

    // ── Type-State Pipeline ────────────────────────────────────
    //
    // Step 1: Idle → Planned (validate config + build stage plan).
    println!("  [1/3] Planning stages...");
    let driver = ForecastDriver::new(config.clone()).plan(&config.num_steps)?;
    println!("        {}", driver.stage_plan().summary());
    println!();

    // Step 2: read the initial state.
    println!("  [2/3] Loading initial state...");
    let state = StateLoader::load(&args.input)
        .with_context(|| format!("failed to load state from '{}'", args.input.display()))?;
    println!("        {}", super::truncate(&state.summary(), 100));
    println!();

    // Step 3: Planned → RunReport (blocking work off the async runtime).
    println!("  [3/3] Running forecast...");
    let provider = AffineModelProvider::from_config(&config);
    let mut sink = SafeTensorsSink::new(&args.save_dir)?;

    let handle = tokio::task::spawn_blocking(move || {
        let report = driver.run(&provider, state, &mut sink)?;
        Ok::<_, runtime::RuntimeError>((report, sink))
    });

    let joined = match args.deadline_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // The blocking task cannot be cancelled; exit instead of
                // waiting for it on runtime shutdown.
                tracing::error!("forecast exceeded the {secs}s deadline");
                eprintln!("  error: forecast exceeded the {secs}s deadline");
                std::process::exit(DEADLINE_EXIT_CODE);
            }
        },
        None => handle.await,
    };
    let (report, sink) = joined.context("forecast task panicked")??;

    println!();
    println!("  Results:");
    println!("   Steps saved: {}", report.steps_saved);
    if let (Some(first), Some(last)) = (sink.written().first(), sink.written().last()) {
        println!("   Files:       {} .. {}", first.display(), last.display());
    }
    for stage in &report.metrics.stage_metrics {
        println!(
            "   {:<10} {:>4} steps, load {:>8.3}s, inference {:>8.3}s",
            stage.stage,
            stage.steps,
            stage.load_duration.as_secs_f64(),
            stage.inference_duration.as_secs_f64(),
        );
    }
    println!();
    println!("  Metrics:");
    println!("   {}", report.metrics.summary());
    println!();

    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(config_path: Option<PathBuf>, args: &RunArgs) -> anyhow::Result<RuntimeConfig> {
    let mut config = match config_path {
        Some(path) => RuntimeConfig::from_file(&path)?,
        None if args.model.is_none() => {
            anyhow::bail!("--model is required when no --config file is given")
        }
        None => RuntimeConfig::default(),
    };

    if let Some(model) = &args.model {
        config.model_dir = model.clone();
    }
    if let Some(steps) = &args.num_steps {
        config.num_steps = steps.clone();
    }
    if let Some(freq) = args.freq_hours {
        config.freq_hours = freq;
    }
    if let Some(threads) = args.threads {
        config.intra_op_threads = Some(threads);
    }
    if let Some(device) = &args.device {
        config.device = device.parse()?;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::Device;

    fn args() -> RunArgs {
        RunArgs {
            model: None,
            input: PathBuf::from("input.safetensors"),
            save_dir: PathBuf::from("output"),
            num_steps: None,
            freq_hours: None,
            threads: None,
            device: None,
            deadline_secs: None,
        }
    }

    fn config_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("forecast.toml");
        std::fs::write(
            &path,
            "model_dir = \"/models/from-file\"\nfreq_hours = 3\nnum_steps = [4, 2]\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_config_file_model_dir_kept_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(Some(config_file(&dir)), &args()).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/models/from-file"));
        assert_eq!(config.freq_hours, 3);
        assert_eq!(config.num_steps, vec![4, 2]);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = RunArgs {
            model: Some(PathBuf::from("/models/from-flag")),
            num_steps: Some(vec![1]),
            threads: Some(2),
            device: Some("cuda".into()),
            ..args()
        };
        let config = resolve_config(Some(config_file(&dir)), &overrides).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/models/from-flag"));
        assert_eq!(config.num_steps, vec![1]);
        assert_eq!(config.intra_op_threads, Some(2));
        assert_eq!(config.device, Device::Cuda);
        assert_eq!(config.freq_hours, 3);
    }

    #[test]
    fn test_model_flag_without_config_file() {
        let with_model = RunArgs {
            model: Some(PathBuf::from("/models/fuxi")),
            ..args()
        };
        let config = resolve_config(None, &with_model).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/models/fuxi"));
        assert_eq!(config.num_steps, RuntimeConfig::default().num_steps);
    }

    #[test]
    fn test_model_required_without_config_file() {
        let err = resolve_config(None, &args()).unwrap_err();
        assert!(err.to_string().contains("--model is required"));
    }
}
