use crate::cut::Sense;
use crate::error::PrunerError;
use crate::pruner::{
    AvgCutPruner, CutPruner, DecayCutPruner, LevelOneCutPruner,
};
use crate::territory::LevelOneTrust;
use crate::trust::{AverageTrust, DecayTrust};
use serde::Deserialize;
use std::fs;

/// Pruner parameters as read from a JSON description. Optional fields
/// fall back to the variant defaults; `max_cuts` of `-1` means
/// unbounded.
#[derive(Deserialize)]
pub struct PrunerInput {
    pub variant: String,
    pub dimension: usize,
    pub sense: String,
    pub max_cuts: i64,
    pub tolerance: Option<f64>,
    pub new_cut_trust: Option<f64>,
    pub my_cut_bonus: Option<f64>,
    pub lambda: Option<f64>,
}

pub fn read_pruner_input(filepath: &str) -> PrunerInput {
    let contents =
        fs::read_to_string(filepath).expect("Error while reading pruner file");
    let parsed: PrunerInput = serde_json::from_str(&contents).unwrap();
    parsed
}

/// A pruner built from a runtime variant name.
pub enum BuiltPruner {
    Average(AvgCutPruner),
    Decay(DecayCutPruner),
    LevelOne(LevelOneCutPruner),
}

impl BuiltPruner {
    pub fn ncuts(&self) -> usize {
        match self {
            BuiltPruner::Average(pruner) => pruner.ncuts(),
            BuiltPruner::Decay(pruner) => pruner.ncuts(),
            BuiltPruner::LevelOne(pruner) => pruner.ncuts(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ncuts() == 0
    }

    pub fn get_sense(&self) -> Sense {
        match self {
            BuiltPruner::Average(pruner) => pruner.get_sense(),
            BuiltPruner::Decay(pruner) => pruner.get_sense(),
            BuiltPruner::LevelOne(pruner) => pruner.get_sense(),
        }
    }

    pub fn get_trust(&self) -> &[f64] {
        match self {
            BuiltPruner::Average(pruner) => pruner.get_trust(),
            BuiltPruner::Decay(pruner) => pruner.get_trust(),
            BuiltPruner::LevelOne(pruner) => pruner.get_trust(),
        }
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        match self {
            BuiltPruner::Average(pruner) => pruner.set_tolerance(tolerance),
            BuiltPruner::Decay(pruner) => pruner.set_tolerance(tolerance),
            BuiltPruner::LevelOne(pruner) => pruner.set_tolerance(tolerance),
        }
    }

    pub fn add_cuts(
        &mut self,
        coefficients: &[Vec<f64>],
        offsets: &[f64],
        is_my_cut: &[bool],
    ) -> Result<Vec<Option<usize>>, PrunerError> {
        match self {
            BuiltPruner::Average(pruner) => {
                pruner.add_cuts(coefficients, offsets, is_my_cut)
            }
            BuiltPruner::Decay(pruner) => {
                pruner.add_cuts(coefficients, offsets, is_my_cut)
            }
            BuiltPruner::LevelOne(pruner) => {
                pruner.add_cuts(coefficients, offsets, is_my_cut)
            }
        }
    }
}

impl PrunerInput {
    fn build_max_cuts(&self) -> Result<Option<usize>, PrunerError> {
        match self.max_cuts {
            -1 => Ok(None),
            capacity if capacity > 0 => Ok(Some(capacity as usize)),
            capacity => Err(PrunerError::Configuration(format!(
                "invalid cut capacity {}",
                capacity
            ))),
        }
    }

    pub fn build_pruner(&self) -> Result<BuiltPruner, PrunerError> {
        let sense = Sense::from_name(&self.sense)?;
        let max_cuts = self.build_max_cuts()?;
        let new_cut_trust = self.new_cut_trust.unwrap_or(0.5);
        let my_cut_bonus = self.my_cut_bonus.unwrap_or(0.0);

        let mut built = match self.variant.as_str() {
            "avg" => BuiltPruner::Average(CutPruner::new(
                self.dimension,
                sense,
                max_cuts,
                AverageTrust::new(new_cut_trust, my_cut_bonus)?,
            )?),
            "decay" => BuiltPruner::Decay(CutPruner::new(
                self.dimension,
                sense,
                max_cuts,
                DecayTrust::new(
                    self.lambda.unwrap_or(0.9),
                    new_cut_trust,
                    my_cut_bonus,
                )?,
            )?),
            "level1" => BuiltPruner::LevelOne(CutPruner::new(
                self.dimension,
                sense,
                max_cuts,
                LevelOneTrust::new(),
            )?),
            name => {
                return Err(PrunerError::Configuration(format!(
                    "unknown variant '{}'",
                    name
                )))
            }
        };
        if let Some(tolerance) = self.tolerance {
            built.set_tolerance(tolerance);
        }
        Ok(built)
    }
}
