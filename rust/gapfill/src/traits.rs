use crate::errors::DataReadingError;
use crate::models::{
    DataPoint,
    FragmentScanInfo,
    RawFileId,
};
use crate::utils::TupleRange;

/// A single MS1 scan as seen by a gap search.
pub trait ScanLike {
    fn scan_number(&self) -> u32;
    fn rt_seconds(&self) -> f32;

    /// Most intense data point inside the (inclusive) m/z window, if any.
    fn find_base_peak(&self, mz_range: TupleRange<f64>) -> Option<DataPoint>;
}

/// Read-only access to the scans of one raw file.
///
/// Implementations are shared between worker threads, so they must be `Sync`.
pub trait RawFileLike: Sync {
    type Scan: ScanLike;

    fn id(&self) -> &RawFileId;

    /// Number of MS1 scans, used for progress accounting.
    fn num_ms1_scans(&self) -> usize;

    /// MS1 scans in chronological order.
    fn ms1_scans(&self) -> Result<impl Iterator<Item = &Self::Scan>, DataReadingError>;

    /// Precursor information of the fragmentation scans, if the file has any.
    fn fragment_scans(&self) -> &[FragmentScanInfo] {
        &[]
    }
}
