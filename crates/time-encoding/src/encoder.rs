// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sequence encoder producing one [`TemporalEmbedding`] per global step.

use crate::phase::{cyclic_phases, truncate_to_hour};
use crate::TimeEncodingError;
use chrono::{NaiveDateTime, TimeDelta};

/// Default spacing between forecast steps.
pub const DEFAULT_FREQ_HOURS: u32 = 6;

/// Offsets (in steps) around the current step that contribute features.
const STEP_OFFSETS: [i64; 3] = [-1, 0, 1];

/// Features per embedding: 3 offsets × 2 phases × {sin, cos}.
pub const EMBEDDING_DIM: usize = STEP_OFFSETS.len() * 2 * 2;

/// Temporal features for a single forecast step.
///
/// Layout, per offset row `k` in `(previous, current, next)`:
/// `[sin(doy_k), sin(hour_k), cos(doy_k), cos(hour_k)]`, rows concatenated.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct TemporalEmbedding {
    step: usize,
    values: [f32; EMBEDDING_DIM],
}

impl TemporalEmbedding {
    /// Global step index this embedding belongs to.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Shape expected by step functions: one row of [`EMBEDDING_DIM`].
    pub fn shape(&self) -> [usize; 2] {
        [1, EMBEDDING_DIM]
    }

    fn from_phases(step: usize, phases: &[[f32; 2]; 3]) -> Self {
        let mut values = [0.0f32; EMBEDDING_DIM];
        for (row, [doy, hour]) in phases.iter().enumerate() {
            let base = row * 4;
            values[base] = doy.sin();
            values[base + 1] = hour.sin();
            values[base + 2] = doy.cos();
            values[base + 3] = hour.cos();
        }
        Self { step, values }
    }
}

/// Generates temporal embeddings for a forecast run.
///
/// Pure and deterministic: the same `(init, total_steps, freq_hours)`
/// always yields bit-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEncoder {
    freq_hours: u32,
}

impl Default for TimeEncoder {
    fn default() -> Self {
        Self {
            freq_hours: DEFAULT_FREQ_HOURS,
        }
    }
}

impl TimeEncoder {
    /// Creates an encoder with the given step spacing in hours.
    pub fn new(freq_hours: u32) -> Result<Self, TimeEncodingError> {
        if freq_hours == 0 {
            return Err(TimeEncodingError::InvalidFrequency(freq_hours));
        }
        Ok(Self { freq_hours })
    }

    pub fn freq_hours(&self) -> u32 {
        self.freq_hours
    }

    /// Encodes `total_steps` embeddings starting from `init`.
    ///
    /// `init` is truncated to the hour before offsets are applied.
    pub fn encode(
        &self,
        init: NaiveDateTime,
        total_steps: usize,
    ) -> Result<Vec<TemporalEmbedding>, TimeEncodingError> {
        let base = truncate_to_hour(init);
        let embeddings = (0..total_steps)
            .map(|step| {
                let phases = self.phases_at(base, step)?;
                Ok(TemporalEmbedding::from_phases(step, &phases))
            })
            .collect::<Result<Vec<_>, TimeEncodingError>>()?;

        tracing::debug!(
            "encoded {} temporal embeddings from {} every {}h",
            embeddings.len(),
            base,
            self.freq_hours,
        );
        Ok(embeddings)
    }

    /// Raw `(doy / 366, hour / 24)` phases for the previous, current and
    /// next times around `step`, before the sine/cosine transform.
    pub fn phases_at(
        &self,
        init: NaiveDateTime,
        step: usize,
    ) -> Result<[[f32; 2]; 3], TimeEncodingError> {
        let base = truncate_to_hour(init);
        let mut phases = [[0.0f32; 2]; 3];
        for (slot, offset) in phases.iter_mut().zip(STEP_OFFSETS) {
            let ts = self.offset_time(base, step, offset)?;
            *slot = cyclic_phases(ts);
        }
        Ok(phases)
    }

    fn offset_time(
        &self,
        base: NaiveDateTime,
        step: usize,
        offset: i64,
    ) -> Result<NaiveDateTime, TimeEncodingError> {
        let out_of_range = |offset_hours: i64| TimeEncodingError::OutOfRange {
            base: base.to_string(),
            offset_hours,
        };

        let hours = i64::try_from(step)
            .ok()
            .and_then(|s| s.checked_add(offset))
            .and_then(|s| s.checked_mul(i64::from(self.freq_hours)))
            .ok_or_else(|| out_of_range(i64::MAX))?;

        TimeDelta::try_hours(hours)
            .and_then(|delta| base.checked_add_signed(delta))
            .ok_or_else(|| out_of_range(hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_timestamp;

    fn new_year() -> NaiveDateTime {
        parse_timestamp("2024-01-01T00:00").unwrap()
    }

    #[test]
    fn test_length_and_dim() {
        let embeddings = TimeEncoder::default().encode(new_year(), 7).unwrap();
        assert_eq!(embeddings.len(), 7);
        for (i, e) in embeddings.iter().enumerate() {
            assert_eq!(e.step(), i);
            assert_eq!(e.as_slice().len(), EMBEDDING_DIM);
        }
        assert_eq!(EMBEDDING_DIM, 12);
    }

    #[test]
    fn test_zero_steps() {
        let embeddings = TimeEncoder::default().encode(new_year(), 0).unwrap();
        assert!(embeddings.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let enc = TimeEncoder::new(6).unwrap();
        let a = enc.encode(new_year(), 40).unwrap();
        let b = enc.encode(new_year(), 40).unwrap();
        let bits = |v: &[TemporalEmbedding]| -> Vec<u32> {
            v.iter()
                .flat_map(|e| e.as_slice().iter().map(|x| x.to_bits()))
                .collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_first_step_phases_by_hand() {
        let enc = TimeEncoder::default();
        let phases = enc.phases_at(new_year(), 0).unwrap();
        // -6h lands on 2023-12-31T18:00, day 365 of a non-leap year.
        assert_eq!(phases[0], [365.0 / 366.0, 18.0 / 24.0]);
        assert_eq!(phases[1], [1.0 / 366.0, 0.0]);
        assert_eq!(phases[2], [1.0 / 366.0, 6.0 / 24.0]);
    }

    #[test]
    fn test_first_step_features_by_hand() {
        let e = TimeEncoder::default().encode(new_year(), 1).unwrap()[0];
        let v = e.as_slice();
        let prev_doy: f32 = 365.0 / 366.0;
        assert_eq!(v[0], prev_doy.sin());
        assert_eq!(v[1], 0.75f32.sin());
        assert_eq!(v[2], prev_doy.cos());
        assert_eq!(v[3], 0.75f32.cos());
        assert_eq!(v[5], 0.0);
        assert_eq!(v[7], 1.0);
    }

    #[test]
    fn test_sin_cos_pairs_on_unit_circle() {
        let embeddings = TimeEncoder::default().encode(new_year(), 12).unwrap();
        for e in &embeddings {
            let v = e.as_slice();
            for row in 0..3 {
                let base = row * 4;
                for phase in 0..2 {
                    let s = v[base + phase];
                    let c = v[base + 2 + phase];
                    assert!((s * s + c * c - 1.0).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_neighbouring_steps_share_times() {
        // Step i's "next" equals step i+1's "current".
        let enc = TimeEncoder::default();
        let a = enc.phases_at(new_year(), 3).unwrap();
        let b = enc.phases_at(new_year(), 4).unwrap();
        assert_eq!(a[2], b[1]);
        assert_eq!(a[1], b[0]);
    }

    #[test]
    fn test_init_truncated_to_hour() {
        let enc = TimeEncoder::default();
        let exact = enc.encode(new_year(), 3).unwrap();
        let offset = enc
            .encode(parse_timestamp("2024-01-01T00:45:30").unwrap(), 3)
            .unwrap();
        assert_eq!(exact, offset);
    }

    #[test]
    fn test_custom_frequency() {
        let enc = TimeEncoder::new(1).unwrap();
        let phases = enc.phases_at(new_year(), 0).unwrap();
        assert_eq!(phases[0], [365.0 / 366.0, 23.0 / 24.0]);
        assert_eq!(phases[2], [1.0 / 366.0, 1.0 / 24.0]);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        assert!(matches!(
            TimeEncoder::new(0),
            Err(TimeEncodingError::InvalidFrequency(0))
        ));
    }

    #[test]
    fn test_out_of_range() {
        let end = chrono::NaiveDate::MAX.and_hms_opt(18, 0, 0).unwrap();
        let result = TimeEncoder::default().encode(end, 2);
        assert!(matches!(result, Err(TimeEncodingError::OutOfRange { .. })));
    }

    #[test]
    fn test_serialises_to_json() {
        let e = TimeEncoder::default().encode(new_year(), 1).unwrap()[0];
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"step\":0"));
        assert!(json.contains("\"values\":["));
    }
}
