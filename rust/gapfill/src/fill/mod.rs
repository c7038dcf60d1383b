//! Filling every missing cell of a feature list from raw data.
//!
//! [`GapFiller`] opens one [`GapSearchWindow`] per missing (row, raw file)
//! cell, streams the MS1 scans of each raw file once through all windows of
//! that file and assembles a new feature list holding the original features
//! plus the reconstructed ones.

pub mod parameters;
pub mod progress;
mod rt_correction;

pub use parameters::GapFillParameters;
pub use progress::{
    CancellationToken,
    FillProgress,
    TaskOutcome,
};

use crate::errors::{
    DataProcessingError,
    GapFillError,
};
use crate::gap::{
    GapSearchSpec,
    GapSearchWindow,
};
use crate::models::{
    best_fragment_scan,
    AppliedMethod,
    Feature,
    FeatureList,
    FeatureListRow,
};
use crate::traits::RawFileLike;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

pub const GAP_FILLING_METHOD: &str = "Gap filling";

/// A reconstructed feature and the cell it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct FilledCell {
    pub row_index: usize,
    pub file_index: usize,
    pub feature: Feature,
}

/// Runs gap filling over a feature list.
///
/// ```
/// use gapfill::models::{CentroidedRawFile, FeatureList, FeatureListRow};
/// use gapfill::{GapFillParameters, GapFiller};
///
/// let raw = CentroidedRawFile::new("a.mzML".into(), vec![], vec![]);
/// let list = FeatureList::try_new(
///     "aligned",
///     vec!["a.mzML".into()],
///     vec![FeatureListRow::new(1, 300.0, 60.0, 1)],
/// )
/// .unwrap();
///
/// let filled = GapFiller::new(GapFillParameters::default())
///     .run(&list, &[raw])
///     .unwrap()
///     .finished()
///     .unwrap();
/// assert_eq!(filled.name(), "aligned gap-filled");
/// // Nothing to find in a file without scans.
/// assert_eq!(filled.num_missing(), 1);
/// ```
pub struct GapFiller {
    params: GapFillParameters,
    cancel: CancellationToken,
    progress: Arc<FillProgress>,
}

impl GapFiller {
    pub fn new(params: GapFillParameters) -> Self {
        Self {
            params,
            cancel: CancellationToken::new(),
            progress: Arc::new(FillProgress::new()),
        }
    }

    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    pub fn with_progress(self, progress: Arc<FillProgress>) -> Self {
        Self { progress, ..self }
    }

    pub fn params(&self) -> &GapFillParameters {
        &self.params
    }

    pub fn progress(&self) -> &FillProgress {
        &self.progress
    }

    /// Fills `list` using `raw_files`, which must contain every raw file the
    /// list references (extra files are ignored).
    ///
    /// The source list is never modified; a cancelled run returns
    /// [`TaskOutcome::Cancelled`].
    pub fn run<R: RawFileLike>(
        &self,
        list: &FeatureList,
        raw_files: &[R],
    ) -> Result<TaskOutcome<FeatureList>, GapFillError> {
        self.params.validate()?;
        if list.raw_files().is_empty() {
            return Err(GapFillError::EmptyFeatureList);
        }
        list.validate()?;
        let files = resolve_raw_files(list, raw_files)?;

        let total_scans = files.iter().map(|f| f.num_ms1_scans()).sum();
        self.progress.set_total(total_scans);

        let num_gaps = list.num_missing();
        info!(
            "Gap filling '{}': {} rows, {} raw files, {} missing cells",
            list.name(),
            list.num_rows(),
            files.len(),
            num_gaps
        );
        if self.cancel.is_cancelled() {
            info!("Gap filling of '{}' cancelled", list.name());
            return Ok(TaskOutcome::Cancelled);
        }

        let start = Instant::now();
        let mut rows = list.rows().to_vec();
        let outcome = if self.params.rt_correction {
            rt_correction::fill_with_rt_correction(self, list, &files, &mut rows)?
        } else {
            self.fill_uncorrected(&files, &mut rows)?
        };
        let num_filled = match outcome {
            TaskOutcome::Finished(n) => n,
            TaskOutcome::Cancelled => {
                info!("Gap filling of '{}' cancelled", list.name());
                return Ok(TaskOutcome::Cancelled);
            }
        };
        self.progress.finish();

        info!(
            "Filled {} of {} gaps in '{}' in {:?}",
            num_filled,
            num_gaps,
            list.name(),
            start.elapsed()
        );
        Ok(TaskOutcome::Finished(self.assemble(list, rows)?))
    }

    fn fill_uncorrected<R: RawFileLike>(
        &self,
        files: &[&R],
        rows: &mut [FeatureListRow],
    ) -> Result<TaskOutcome<usize>, GapFillError> {
        let mut jobs: Vec<(&R, Vec<GapSearchWindow>)> = Vec::with_capacity(files.len());
        for (file_index, raw) in files.iter().enumerate() {
            match self.open_gaps(rows, file_index, |row| row.average_rt_seconds) {
                TaskOutcome::Finished(gaps) => jobs.push((*raw, gaps)),
                TaskOutcome::Cancelled => return Ok(TaskOutcome::Cancelled),
            }
        }

        let results: Vec<TaskOutcome<Vec<FilledCell>>> = if self.params.parallel {
            jobs.into_par_iter()
                .map(|(raw, gaps)| self.stream_file(raw, gaps))
                .collect::<Result<_, _>>()?
        } else {
            jobs.into_iter()
                .map(|(raw, gaps)| self.stream_file(raw, gaps))
                .collect::<Result<_, _>>()?
        };

        let mut num_filled = 0;
        for result in results {
            match result {
                TaskOutcome::Finished(cells) => num_filled += apply_cells(rows, cells),
                TaskOutcome::Cancelled => return Ok(TaskOutcome::Cancelled),
            }
        }
        Ok(TaskOutcome::Finished(num_filled))
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// One search window per row missing a feature in `file_index`, centered
    /// on `rt_center(row)`.
    pub(crate) fn open_gaps(
        &self,
        rows: &[FeatureListRow],
        file_index: usize,
        rt_center: impl Fn(&FeatureListRow) -> f32,
    ) -> TaskOutcome<Vec<GapSearchWindow>> {
        let mut gaps = Vec::new();
        for (row_index, row) in rows.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return TaskOutcome::Cancelled;
            }
            if !row.has_feature(file_index) {
                gaps.push(self.open_gap(row, row_index, file_index, rt_center(row)));
            }
        }
        TaskOutcome::Finished(gaps)
    }

    /// Search window for the cell of `row` in `file_index`, centered on
    /// `rt_center`.
    pub(crate) fn open_gap(
        &self,
        row: &FeatureListRow,
        row_index: usize,
        file_index: usize,
        rt_center: f32,
    ) -> GapSearchWindow {
        let tolerance = &self.params.tolerance;
        GapSearchWindow::new(GapSearchSpec {
            row_index,
            file_index,
            mz_range: tolerance.mz_range(row.average_mz),
            rt_range: tolerance.rt_range_seconds(rt_center),
            intensity_tolerance: self.params.intensity_tolerance,
        })
    }

    /// Streams every MS1 scan of `raw` through `gaps` and collects the
    /// features found.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "debug")
    )]
    pub(crate) fn stream_file<R: RawFileLike>(
        &self,
        raw: &R,
        mut gaps: Vec<GapSearchWindow>,
    ) -> Result<TaskOutcome<Vec<FilledCell>>, GapFillError> {
        if self.cancel.is_cancelled() {
            return Ok(TaskOutcome::Cancelled);
        }
        if gaps.is_empty() {
            debug!("No gaps in {}, skipping its scans", raw.id());
            self.progress.advance(raw.num_ms1_scans());
            return Ok(TaskOutcome::Finished(Vec::new()));
        }

        let num_gaps = gaps.len();
        for scan in raw.ms1_scans()? {
            if self.cancel.is_cancelled() {
                return Ok(TaskOutcome::Cancelled);
            }
            for gap in gaps.iter_mut() {
                gap.offer(scan);
            }
            self.progress.advance(1);
        }

        let min_points = self.params.min_points;
        let fragment_scans = raw.fragment_scans();
        let mut cells = Vec::new();
        for gap in gaps {
            if self.cancel.is_cancelled() {
                return Ok(TaskOutcome::Cancelled);
            }
            let spec = *gap.spec();
            let Some(mut feature) = gap.finalize(min_points) else {
                continue;
            };
            feature.fragment_scan =
                best_fragment_scan(fragment_scans, spec.mz_range, feature.rt_range);
            cells.push(FilledCell {
                row_index: spec.row_index,
                file_index: spec.file_index,
                feature,
            });
        }

        debug!(
            "Filled {} of {} gaps in {}",
            cells.len(),
            num_gaps,
            raw.id()
        );
        Ok(TaskOutcome::Finished(cells))
    }

    fn assemble(
        &self,
        source: &FeatureList,
        rows: Vec<FeatureListRow>,
    ) -> Result<FeatureList, GapFillError> {
        let name = format!("{} {}", source.name(), self.params.suffix);
        let mut out = FeatureList::try_new(name, source.raw_files().to_vec(), rows)?;
        for method in source.applied_methods() {
            out.add_applied_method(method.clone());
        }
        let parameters = serde_json::to_value(&self.params)
            .map_err(|e| DataProcessingError::Serialization(e.to_string()))?;
        out.add_applied_method(AppliedMethod {
            description: GAP_FILLING_METHOD.to_string(),
            parameters,
        });
        Ok(out)
    }
}

/// Raw files in the column order of `list`.
fn resolve_raw_files<'a, R: RawFileLike>(
    list: &FeatureList,
    raw_files: &'a [R],
) -> Result<Vec<&'a R>, GapFillError> {
    list.raw_files()
        .iter()
        .map(|id| {
            raw_files
                .iter()
                .find(|raw| raw.id() == id)
                .ok_or_else(|| GapFillError::MissingRawFile(id.clone()))
        })
        .collect()
}

/// Places filled features into their cells, returns how many were placed.
pub(crate) fn apply_cells(rows: &mut [FeatureListRow], cells: Vec<FilledCell>) -> usize {
    let num_cells = cells.len();
    for cell in cells {
        debug_assert!(!rows[cell.row_index].has_feature(cell.file_index));
        rows[cell.row_index].set_feature(cell.file_index, cell.feature);
    }
    num_cells
}
