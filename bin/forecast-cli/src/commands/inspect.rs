// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `forecast-rt inspect` command: display an initial state file.
//!
//! Prints the field shape, grid, timestamps and per-variable value ranges
//! of the latest time slice, and whether the state passes validation.

use forecast_ir::StateLoader;
use std::path::PathBuf;
use tensor_core::{mean, min_max, select};

pub async fn execute(input: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            forecast-rt · State Inspector             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let state = StateLoader::load(&input).map_err(|e| {
        anyhow::anyhow!("failed to load state from '{}': {e}", input.display())
    })?;

    // ── Summary ────────────────────────────────────────────────
    let grid = state.grid();
    println!("  Source: {}", state.source().unwrap_or("-"));
    println!("  Shape:  {}", state.data().shape());
    println!("  Grid:   {grid}");
    println!(
        "  Size:   {:.2} MB",
        state.data().size_bytes() as f64 / (1024.0 * 1024.0),
    );
    println!("  Times:");
    for t in state.times() {
        println!("   {t}");
    }
    println!();

    // ── Per-Variable Ranges ────────────────────────────────────
    let latest = match state.data().dims().first() {
        Some(&n) if n > 0 => Some(select(state.data(), 0, n - 1)?),
        _ => None,
    };
    if let Some(latest) = latest {
        println!(
            "  {:<4} {:<24} {:>12} {:>12} {:>12}",
            "Idx", "Variable", "Min", "Mean", "Max",
        );
        println!("  {}", "-".repeat(69));
        for (i, name) in grid.variables().iter().enumerate() {
            let Ok(field) = select(&latest, 0, i) else {
                break;
            };
            let (lo, hi) = min_max(&field).unwrap_or((f32::NAN, f32::NAN));
            println!(
                "  {:<4} {:<24} {:>12.3} {:>12.3} {:>12.3}",
                i,
                super::truncate(name, 24),
                lo,
                mean(&field),
                hi,
            );
        }
        println!();
    }

    // ── Validation ─────────────────────────────────────────────
    match state.validate() {
        Ok(valid) => println!("  Valid: yes (initial time {})", valid.init_time()),
        Err(e) => println!("  Valid: no ({e})"),
    }
    println!();
    Ok(())
}
