use crate::utils::TupleRange;
use serde::{
    Deserialize,
    Serialize,
};

/// A single centroid, m/z and intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub mz: f64,
    pub intensity: f32,
}

/// How a feature came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    /// Found by a feature detector.
    #[default]
    Detected,
    /// Reconstructed from raw data by gap filling.
    Estimated,
    /// Drawn by hand.
    Manual,
}

/// A chromatographic peak for one (row, raw file) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub mz: f64,
    /// Retention time of the apex.
    pub rt_seconds: f32,
    pub height: f32,
    /// Trapezoidal area, intensity x seconds.
    #[serde(default)]
    pub area: f64,
    pub rt_range: TupleRange<f32>,
    pub mz_range: TupleRange<f64>,
    pub intensity_range: TupleRange<f32>,
    #[serde(default)]
    pub scan_numbers: Vec<u32>,
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
    #[serde(default)]
    pub representative_scan: Option<u32>,
    #[serde(default)]
    pub fragment_scan: Option<u32>,
    #[serde(default)]
    pub status: FeatureStatus,
}

impl Feature {
    /// Minimal detector-style feature with point-sized ranges.
    pub fn detected(mz: f64, rt_seconds: f32, height: f32) -> Self {
        Self {
            mz,
            rt_seconds,
            height,
            area: 0.0,
            rt_range: TupleRange::singleton(rt_seconds),
            mz_range: TupleRange::singleton(mz),
            intensity_range: TupleRange::singleton(height),
            scan_numbers: Vec::new(),
            data_points: Vec::new(),
            representative_scan: None,
            fragment_scan: None,
            status: FeatureStatus::Detected,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.status == FeatureStatus::Estimated
    }

    pub fn num_points(&self) -> usize {
        self.scan_numbers.len()
    }
}
