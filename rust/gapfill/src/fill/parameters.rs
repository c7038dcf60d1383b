use crate::errors::GapFillError;
use crate::models::{
    OriginalFeatureListOption,
    Tolerance,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Settings of a gap filling run.
///
/// Every field has a default so partial JSON configs work:
/// ```
/// use gapfill::GapFillParameters;
///
/// let params: GapFillParameters =
///     serde_json::from_str(r#"{"intensity_tolerance": 0.3, "parallel": true}"#).unwrap();
/// assert_eq!(params.intensity_tolerance, 0.3);
/// assert_eq!(params.suffix, "gap-filled");
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapFillParameters {
    /// Allowed relative intensity change while following a peak shape.
    pub intensity_tolerance: f32,
    pub tolerance: Tolerance,
    /// Re-center every gap using an RT regression against a master file.
    pub rt_correction: bool,
    /// Process raw files on the rayon pool. Not compatible with `rt_correction`.
    pub parallel: bool,
    pub suffix: String,
    pub handle_original: OriginalFeatureListOption,
    /// Seed for picking the master file; drawn from entropy when absent.
    pub rt_correction_seed: Option<u64>,
    /// Fewest scans a reconstructed peak may span.
    pub min_points: usize,
}

impl Default for GapFillParameters {
    fn default() -> Self {
        Self {
            intensity_tolerance: 0.2,
            tolerance: Tolerance::default(),
            rt_correction: false,
            parallel: false,
            suffix: "gap-filled".to_string(),
            handle_original: OriginalFeatureListOption::Keep,
            rt_correction_seed: None,
            min_points: 1,
        }
    }
}

impl GapFillParameters {
    pub fn validate(&self) -> Result<(), GapFillError> {
        let tol = self.intensity_tolerance;
        if !(0.0..1.0).contains(&tol) {
            return Err(GapFillError::InvalidParameter {
                name: "intensity_tolerance",
                value: tol.to_string(),
                reason: "must be in [0, 1)",
            });
        }
        if !self.tolerance.mz.is_valid() {
            return Err(GapFillError::InvalidParameter {
                name: "tolerance.mz",
                value: format!("{:?}", self.tolerance.mz),
                reason: "must be finite and non-negative",
            });
        }
        if !self.tolerance.rt.is_valid() {
            return Err(GapFillError::InvalidParameter {
                name: "tolerance.rt",
                value: format!("{:?}", self.tolerance.rt),
                reason: "must be finite and non-negative",
            });
        }
        if self.min_points == 0 {
            return Err(GapFillError::InvalidParameter {
                name: "min_points",
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        if self.rt_correction && self.parallel {
            return Err(GapFillError::IncompatibleOptions(
                "RT correction needs the files processed in order, disable 'parallel'",
            ));
        }
        Ok(())
    }
}
