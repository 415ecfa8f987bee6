// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Stage plan: the ordered list of stages a forecast run executes.
//!
//! The plan is the contract between configuration and the driver. Step
//! counts are matched to stage names by position; if fewer counts than
//! names are given only the leading stages run.

use crate::{IrError, Stage, StageName};

/// The full run plan. `total_steps` is the sum of every stage's steps.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    /// Pairs `step_counts` with `names` by position and validates the
    /// result.
    ///
    /// # Errors
    /// [`IrError::InvalidPlan`] if `step_counts` is empty, contains a zero,
    /// or is longer than `names`.
    pub fn new(names: &[StageName], step_counts: &[usize]) -> Result<Self, IrError> {
        if step_counts.is_empty() {
            return Err(IrError::InvalidPlan("no stage step counts given".into()));
        }
        if step_counts.len() > names.len() {
            return Err(IrError::InvalidPlan(format!(
                "{} step counts given but only {} stages are available ({})",
                step_counts.len(),
                names.len(),
                names
                    .iter()
                    .map(StageName::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            )));
        }

        let mut first_step = 0;
        let stages = step_counts
            .iter()
            .zip(names)
            .enumerate()
            .map(|(index, (&steps, name))| {
                let stage = Stage {
                    index,
                    name: name.clone(),
                    steps,
                    first_step,
                };
                first_step += steps;
                stage
            })
            .collect();

        let plan = Self { stages };
        plan.validate()?;
        Ok(plan)
    }

    /// Plan over the canonical `short`, `medium`, `long` stages.
    pub fn canonical(step_counts: &[usize]) -> Result<Self, IrError> {
        Self::new(&StageName::canonical(), step_counts)
    }

    /// Validates the plan.
    ///
    /// Checks:
    /// - Plan is non-empty.
    /// - Stage indices are consecutive starting from 0.
    /// - Every stage runs at least one step.
    /// - Stage step ranges are contiguous from global step 0.
    pub fn validate(&self) -> Result<(), IrError> {
        if self.stages.is_empty() {
            return Err(IrError::InvalidPlan("plan has no stages".into()));
        }

        let mut expected_first = 0;
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.index != i {
                return Err(IrError::InvalidPlan(format!(
                    "expected stage index {i}, got {}",
                    stage.index
                )));
            }
            if stage.steps == 0 {
                return Err(IrError::InvalidPlan(format!(
                    "stage '{}' has zero steps",
                    stage.name
                )));
            }
            if stage.first_step != expected_first {
                return Err(IrError::InvalidPlan(format!(
                    "stage '{}' starts at global step {}, expected {expected_first}",
                    stage.name, stage.first_step
                )));
            }
            expected_first += stage.steps;
        }
        Ok(())
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Sum of all stages' step counts.
    pub fn total_steps(&self) -> usize {
        self.stages.iter().map(|s| s.steps).sum()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    /// The stage that runs `global_step`, if any.
    pub fn stage_for_step(&self, global_step: usize) -> Option<&Stage> {
        self.stages.iter().find(|s| s.contains_step(global_step))
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .stages
            .iter()
            .map(|s| format!("{}×{}", s.name, s.steps))
            .collect();
        format!(
            "Plan: {} stages, {} steps total [{}]",
            self.num_stages(),
            self.total_steps(),
            parts.join(", "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_two_stages() {
        let plan = StagePlan::canonical(&[2, 3]).unwrap();
        assert_eq!(plan.num_stages(), 2);
        assert_eq!(plan.total_steps(), 5);
        assert_eq!(plan.stages()[0].name.as_str(), "short");
        assert_eq!(plan.stages()[1].name.as_str(), "medium");
        assert_eq!(plan.stages()[1].step_range(), 2..5);
    }

    #[test]
    fn test_stage_for_step() {
        let plan = StagePlan::canonical(&[2, 3, 1]).unwrap();
        assert_eq!(plan.stage_for_step(0).unwrap().name.as_str(), "short");
        assert_eq!(plan.stage_for_step(1).unwrap().name.as_str(), "short");
        assert_eq!(plan.stage_for_step(2).unwrap().name.as_str(), "medium");
        assert_eq!(plan.stage_for_step(5).unwrap().name.as_str(), "long");
        assert!(plan.stage_for_step(6).is_none());
    }

    #[test]
    fn test_empty_counts_rejected() {
        assert!(matches!(
            StagePlan::canonical(&[]),
            Err(IrError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let err = StagePlan::canonical(&[4, 0]).unwrap_err();
        assert!(err.to_string().contains("'medium' has zero steps"));
    }

    #[test]
    fn test_too_many_stages_rejected() {
        let err = StagePlan::canonical(&[1, 1, 1, 1]).unwrap_err();
        assert!(err.to_string().contains("only 3 stages"));
    }

    #[test]
    fn test_custom_names() {
        let names = vec![StageName::new("nowcast"), StageName::new("extended")];
        let plan = StagePlan::new(&names, &[8, 4]).unwrap();
        assert_eq!(plan.stages()[1].name.as_str(), "extended");
        assert_eq!(plan.stages()[1].first_step, 8);
    }

    #[test]
    fn test_validate_catches_gap() {
        let mut plan = StagePlan::canonical(&[2, 2]).unwrap();
        plan.stages[1].first_step = 3;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_summary() {
        let s = StagePlan::canonical(&[20, 20]).unwrap().summary();
        assert!(s.contains("2 stages"));
        assert!(s.contains("40 steps"));
        assert!(s.contains("short×20"));
    }
}
