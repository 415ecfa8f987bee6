// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # forecast-rt
//!
//! Command-line interface for the staged forecast runtime.
//!
//! ## Usage
//! ```bash
//! # Run a 15-day forecast: 20 steps each on the short, medium and long models
//! forecast-rt run --model ./models/fuxi --input ./input/2024-01-01-00-00.safetensors \
//!     --num-steps 20 20 20 --save-dir ./output
//!
//! # Inspect an initial state file
//! forecast-rt inspect --input ./input/2024-01-01-00-00.safetensors
//!
//! # Print the temporal embeddings for a run
//! forecast-rt embed --init 2024-01-01T00:00 --steps 4 --json
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "forecast-rt",
    about = "Staged autoregressive weather forecast runtime",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI arguments override it).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a staged forecast from an initial state.
    Run(commands::run::RunArgs),

    /// Inspect an initial state file: shape, grid, times, value ranges.
    Inspect {
        /// Path to the initial state (`.safetensors`).
        #[arg(short, long)]
        input: std::path::PathBuf,
    },

    /// Print the temporal embeddings for a forecast run.
    Embed {
        /// Initial time, e.g. `2024-01-01T00:00`.
        #[arg(long)]
        init: String,

        /// Number of global steps.
        #[arg(short, long)]
        steps: usize,

        /// Hours between steps.
        #[arg(long, default_value_t = time_encoding::DEFAULT_FREQ_HOURS)]
        freq_hours: u32,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::execute(cli.config, args).await,
        Commands::Inspect { input } => commands::inspect::execute(input).await,
        Commands::Embed {
            init,
            steps,
            freq_hours,
            json,
        } => commands::embed::execute(init, steps, freq_hours, json).await,
    }
}
