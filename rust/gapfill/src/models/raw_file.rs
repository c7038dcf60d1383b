use crate::errors::{
    DataProcessingError,
    DataReadingError,
};
use crate::models::DataPoint;
use crate::traits::{
    RawFileLike,
    ScanLike,
};
use crate::utils::{
    binary_search_range_by_key,
    TupleRange,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::sync::Arc;

/// Name of a raw file, cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RawFileId(Arc<str>);

impl RawFileId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RawFileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RawFileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A centroided MS1 scan with its peaks sorted by m/z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidedScan {
    scan_number: u32,
    rt_seconds: f32,
    mz: Vec<f64>,
    intensity: Vec<f32>,
}

impl CentroidedScan {
    pub fn try_new(
        scan_number: u32,
        rt_seconds: f32,
        mz: Vec<f64>,
        intensity: Vec<f32>,
    ) -> Result<Self, DataProcessingError> {
        if mz.len() != intensity.len() {
            return Err(DataProcessingError::ExpectedVectorSameLength {
                real: intensity.len(),
                expected: mz.len(),
                context: "scan intensities vs m/z values",
            });
        }
        if !rt_seconds.is_finite() {
            return Err(DataProcessingError::ExpectedFiniteData {
                context: format!("retention time of scan {}", scan_number),
            });
        }

        let mut order: Vec<usize> = (0..mz.len()).collect();
        order.sort_by(|&a, &b| mz[a].total_cmp(&mz[b]));
        let (mz, intensity): (Vec<f64>, Vec<f32>) = order.into_iter().map(|i| (mz[i], intensity[i])).unzip();

        Ok(Self {
            scan_number,
            rt_seconds,
            mz,
            intensity,
        })
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    pub fn mz(&self) -> &[f64] {
        &self.mz
    }

    pub fn intensity(&self) -> &[f32] {
        &self.intensity
    }
}

impl ScanLike for CentroidedScan {
    fn scan_number(&self) -> u32 {
        self.scan_number
    }

    fn rt_seconds(&self) -> f32 {
        self.rt_seconds
    }

    fn find_base_peak(&self, mz_range: TupleRange<f64>) -> Option<DataPoint> {
        let range = binary_search_range_by_key(&self.mz, mz_range.as_inclusive_range(), |x| *x);
        let mut best: Option<DataPoint> = None;
        for i in range {
            let intensity = self.intensity[i];
            if best.map_or(true, |b| intensity > b.intensity) {
                best = Some(DataPoint {
                    mz: self.mz[i],
                    intensity,
                });
            }
        }
        best
    }
}

/// Precursor summary of a fragmentation scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FragmentScanInfo {
    pub scan_number: u32,
    pub rt_seconds: f32,
    pub precursor_mz: f64,
    /// Total ion current of the fragment spectrum.
    pub tic: f32,
}

/// Picks the fragmentation scan whose precursor falls in both windows,
/// preferring the one with the highest total ion current.
pub fn best_fragment_scan(
    fragment_scans: &[FragmentScanInfo],
    mz_range: TupleRange<f64>,
    rt_range: TupleRange<f32>,
) -> Option<u32> {
    fragment_scans
        .iter()
        .filter(|s| mz_range.contains(s.precursor_mz) && rt_range.contains(s.rt_seconds))
        .fold(None::<&FragmentScanInfo>, |best, s| match best {
            Some(b) if b.tic >= s.tic => Some(b),
            _ => Some(s),
        })
        .map(|s| s.scan_number)
}

/// An in-memory raw file holding centroided MS1 scans.
#[derive(Debug, Clone)]
pub struct CentroidedRawFile {
    id: RawFileId,
    scans: Vec<CentroidedScan>,
    fragment_scans: Vec<FragmentScanInfo>,
}

impl CentroidedRawFile {
    /// Builds a raw file, ordering the scans by retention time
    /// (scan number breaks ties).
    pub fn new(
        id: RawFileId,
        mut scans: Vec<CentroidedScan>,
        fragment_scans: Vec<FragmentScanInfo>,
    ) -> Self {
        scans.sort_by(|a, b| {
            a.rt_seconds
                .total_cmp(&b.rt_seconds)
                .then(a.scan_number.cmp(&b.scan_number))
        });
        Self {
            id,
            scans,
            fragment_scans,
        }
    }

    pub fn scans(&self) -> &[CentroidedScan] {
        &self.scans
    }
}

impl RawFileLike for CentroidedRawFile {
    type Scan = CentroidedScan;

    fn id(&self) -> &RawFileId {
        &self.id
    }

    fn num_ms1_scans(&self) -> usize {
        self.scans.len()
    }

    fn ms1_scans(&self) -> Result<impl Iterator<Item = &Self::Scan>, DataReadingError> {
        Ok(self.scans.iter())
    }

    fn fragment_scans(&self) -> &[FragmentScanInfo] {
        &self.fragment_scans
    }
}
