// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Cyclic phase values and timestamp helpers.

use crate::TimeEncodingError;
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Day-of-year normaliser. Leap and non-leap years share one scale.
const DAYS_PER_YEAR: f32 = 366.0;

const HOURS_PER_DAY: f32 = 24.0;

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Returns `[day_of_year / 366, hour / 24]` for a timestamp.
///
/// Day of year is 1-based, so 1 January maps to `1 / 366`.
///
/// # Examples
/// ```
/// use time_encoding::{cyclic_phases, parse_timestamp};
/// let ts = parse_timestamp("2024-01-01T06:00").unwrap();
/// assert_eq!(cyclic_phases(ts), [1.0 / 366.0, 0.25]);
/// ```
pub fn cyclic_phases(ts: NaiveDateTime) -> [f32; 2] {
    [
        ts.ordinal() as f32 / DAYS_PER_YEAR,
        ts.hour() as f32 / HOURS_PER_DAY,
    ]
}

/// Drops minutes, seconds and sub-second parts.
pub fn truncate_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or(ts)
}

/// Parses a naive UTC timestamp such as `2024-01-01T00:00` or
/// `2024-01-01 00:00:00`.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, TimeEncodingError> {
    let trimmed = input.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TimeEncodingError::InvalidTimestamp {
            input: input.to_string(),
        })
}
