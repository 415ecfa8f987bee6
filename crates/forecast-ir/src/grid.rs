// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Grid coordinates of a gridded atmospheric field.

use crate::IrError;
use std::fmt;

/// Absolute tolerance when comparing stored pole latitudes to ±90°.
const POLE_TOLERANCE: f32 = 1e-4;

/// Coordinates of the `variable`, `lat` and `lon` axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    latitudes: Vec<f32>,
    longitudes: Vec<f32>,
    variables: Vec<String>,
}

impl Grid {
    pub fn new(latitudes: Vec<f32>, longitudes: Vec<f32>, variables: Vec<String>) -> Self {
        Self {
            latitudes,
            longitudes,
            variables,
        }
    }

    /// Builds a grid whose variables are named `var0`, `var1`, ...
    pub fn with_unnamed_variables(
        latitudes: Vec<f32>,
        longitudes: Vec<f32>,
        num_variables: usize,
    ) -> Self {
        let variables = (0..num_variables).map(|i| format!("var{i}")).collect();
        Self::new(latitudes, longitudes, variables)
    }

    /// Regular global grid with `resolution` degree spacing, latitudes from
    /// +90 to -90 and longitudes from 0 eastwards.
    ///
    /// # Panics
    /// If `resolution` is not a positive finite number.
    pub fn regular(resolution: f32, num_variables: usize) -> Self {
        assert!(
            resolution.is_finite() && resolution > 0.0,
            "grid resolution must be positive, got {resolution}"
        );
        let n_lat = (180.0 / resolution).round() as usize + 1;
        let n_lon = (360.0 / resolution).round() as usize;
        let latitudes = (0..n_lat).map(|i| 90.0 - i as f32 * resolution).collect();
        let longitudes = (0..n_lon).map(|i| i as f32 * resolution).collect();
        Self::with_unnamed_variables(latitudes, longitudes, num_variables)
    }

    pub fn latitudes(&self) -> &[f32] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f32] {
        &self.longitudes
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// `(num_variables, num_lat, num_lon)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (
            self.variables.len(),
            self.latitudes.len(),
            self.longitudes.len(),
        )
    }

    /// First and last latitude, in storage order.
    pub fn latitude_range(&self) -> Option<(f32, f32)> {
        Some((*self.latitudes.first()?, *self.latitudes.last()?))
    }

    /// Checks that latitudes are finite, start at +90, end at -90 and
    /// strictly decrease.
    pub fn check_latitude_order(&self) -> Result<(), IrError> {
        let (first, last) = self.latitude_range().ok_or_else(|| IrError::LatitudeOrder {
            first: f32::NAN,
            last: f32::NAN,
            detail: "latitude axis is empty".into(),
        })?;

        let fail = |detail: String| IrError::LatitudeOrder {
            first,
            last,
            detail,
        };

        if let Some(i) = self.latitudes.iter().position(|lat| !lat.is_finite()) {
            return Err(fail(format!(
                "latitude at index {i} is {}, expected a finite value",
                self.latitudes[i]
            )));
        }
        if (first - 90.0).abs() > POLE_TOLERANCE {
            return Err(fail(format!("first latitude is {first}, expected 90")));
        }
        if (last + 90.0).abs() > POLE_TOLERANCE {
            return Err(fail(format!("last latitude is {last}, expected -90")));
        }
        if let Some(i) = self.latitudes.windows(2).position(|w| w[1] >= w[0]) {
            return Err(fail(format!(
                "latitude {} at index {} does not decrease from {}",
                self.latitudes[i + 1],
                i + 1,
                self.latitudes[i],
            )));
        }
        Ok(())
    }

    /// Joins variable names with commas, as stored in file metadata.
    pub fn variables_csv(&self) -> String {
        self.variables.join(",")
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (v, h, w) = self.dims();
        write!(f, "{v} variables on {h}×{w}")?;
        if let Some((first, last)) = self.latitude_range() {
            write!(f, " (lat {first} .. {last})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_grid_north_to_south() {
        let g = Grid::regular(0.25, 70);
        assert_eq!(g.dims(), (70, 721, 1440));
        assert_eq!(g.latitude_range(), Some((90.0, -90.0)));
        assert!(g.check_latitude_order().is_ok());
    }

    #[test]
    fn test_ascending_latitudes_rejected() {
        let g = Grid::with_unnamed_variables(vec![-90.0, 0.0, 90.0], vec![0.0], 1);
        let err = g.check_latitude_order().unwrap_err();
        assert!(matches!(err, IrError::LatitudeOrder { first, .. } if first == -90.0));
    }

    #[test]
    fn test_partial_latitudes_rejected() {
        let g = Grid::with_unnamed_variables(vec![90.0, 45.0, 0.0], vec![0.0], 1);
        assert!(g.check_latitude_order().is_err());
    }

    #[test]
    fn test_non_monotonic_latitudes_rejected() {
        let g = Grid::with_unnamed_variables(vec![90.0, 10.0, 20.0, -90.0], vec![0.0], 1);
        let err = g.check_latitude_order().unwrap_err();
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn test_empty_latitudes_rejected() {
        let g = Grid::with_unnamed_variables(vec![], vec![0.0], 1);
        assert!(g.check_latitude_order().is_err());
    }

    #[test]
    fn test_nan_latitudes_rejected() {
        let all_nan = Grid::with_unnamed_variables(vec![f32::NAN; 3], vec![0.0], 1);
        assert!(matches!(
            all_nan.check_latitude_order(),
            Err(IrError::LatitudeOrder { .. })
        ));

        let interior =
            Grid::with_unnamed_variables(vec![90.0, f32::NAN, 50.0, -90.0], vec![0.0], 1);
        let err = interior.check_latitude_order().unwrap_err();
        assert!(err.to_string().contains("index 1"));

        let pole = Grid::with_unnamed_variables(vec![90.0, 0.0, f32::NAN], vec![0.0], 1);
        assert!(pole.check_latitude_order().is_err());
    }

    #[test]
    fn test_infinite_latitude_rejected() {
        let g = Grid::with_unnamed_variables(vec![f32::INFINITY, 0.0, -90.0], vec![0.0], 1);
        assert!(g.check_latitude_order().is_err());
    }

    #[test]
    #[should_panic(expected = "grid resolution must be positive")]
    fn test_regular_rejects_zero_resolution() {
        let _ = Grid::regular(0.0, 1);
    }

    #[test]
    #[should_panic(expected = "grid resolution must be positive")]
    fn test_regular_rejects_negative_resolution() {
        let _ = Grid::regular(-0.25, 1);
    }

    #[test]
    fn test_display() {
        let g = Grid::regular(90.0, 2);
        assert_eq!(format!("{g}"), "2 variables on 3×4 (lat 90 .. -90)");
        assert_eq!(g.variables_csv(), "var0,var1");
    }
}
