// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `forecast-rt embed` command: print the temporal embeddings of a run.

use chrono::TimeDelta;
use time_encoding::{parse_timestamp, truncate_to_hour, TimeEncoder};

pub async fn execute(init: String, steps: usize, freq_hours: u32, json: bool) -> anyhow::Result<()> {
    let init = parse_timestamp(&init)?;
    let encoder = TimeEncoder::new(freq_hours)?;
    let embeddings = encoder.encode(init, steps)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&embeddings)?);
        return Ok(());
    }

    let base = truncate_to_hour(init);
    println!("  Initial time: {base} ({steps} steps every {freq_hours}h)");
    println!();
    for e in &embeddings {
        let lead = (e.step() as i64 + 1) * i64::from(freq_hours);
        let valid = TimeDelta::try_hours(lead)
            .and_then(|d| base.checked_add_signed(d))
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        let values: Vec<String> = e.as_slice().iter().map(|v| format!("{v:+.4}")).collect();
        println!("  {:03} {valid}  [{}]", e.step(), values.join(", "));
    }
    Ok(())
}
