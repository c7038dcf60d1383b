//! Gap filling with retention time correction.
//!
//! One raw file is picked as the master. Gaps of every other file are
//! centered on the master's RT mapped through a regression fitted on the
//! rows both files share. Gaps left in the master are then centered the
//! other way around, once for every other file holding a feature for the
//! row. The first of those files (in list order) whose window finds a peak
//! fills the cell.

use super::{
    apply_cells,
    GapFiller,
    TaskOutcome,
};
use crate::errors::GapFillError;
use crate::models::{
    FeatureList,
    FeatureListRow,
};
use crate::traits::RawFileLike;
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use rtregression::{
    PolynomialCurve,
    RegressionBuilder,
    RegressionError,
};
use std::collections::HashSet;
use tracing::{
    debug,
    info,
    warn,
};

/// Draws the master file index uniformly from `0..num_files`.
///
/// The same seed always picks the same file.
pub(crate) fn pick_master(num_files: usize, seed: Option<u64>) -> usize {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen_range(0..num_files)
}

/// Fits `rt(to_file) = f(rt(from_file))` on the rows holding a feature in
/// both files.
pub(crate) fn fit_rt_curve(
    rows: &[FeatureListRow],
    from_file: usize,
    to_file: usize,
) -> Result<PolynomialCurve, RegressionError> {
    let mut builder = RegressionBuilder::new();
    for row in rows {
        if let (Some(from), Some(to)) = (row.feature(from_file), row.feature(to_file)) {
            builder.add(from.rt_seconds as f64, to.rt_seconds as f64);
        }
    }
    builder.fit()
}

/// Predicted RT, or `None` when the curve is missing or the prediction fails.
fn predict_rt(curve: Option<&PolynomialCurve>, rt_seconds: f32) -> Option<f32> {
    let curve = curve?;
    match curve.predict(rt_seconds as f64) {
        Ok(rt) => Some(rt as f32),
        Err(e) => {
            debug!("RT prediction at {} failed: {}", rt_seconds, e);
            None
        }
    }
}

pub(crate) fn fill_with_rt_correction<R: RawFileLike>(
    filler: &GapFiller,
    source: &FeatureList,
    files: &[&R],
    rows: &mut [FeatureListRow],
) -> Result<TaskOutcome<usize>, GapFillError> {
    let master = pick_master(files.len(), filler.params().rt_correction_seed);
    info!(
        "RT correction against master file {} ({})",
        master,
        files[master].id()
    );
    let mut num_filled = 0;

    // Pass 1: every other file, regressed against the master on the source rows.
    for (file_index, raw) in files.iter().enumerate() {
        if file_index == master {
            continue;
        }
        let curve = match fit_rt_curve(source.rows(), master, file_index) {
            Ok(curve) => {
                debug!(
                    "RT curve {} -> {}: degree {}, rmse {:.3}",
                    files[master].id(),
                    raw.id(),
                    curve.degree(),
                    curve.rmse()
                );
                Some(curve)
            }
            Err(e) => {
                warn!(
                    "No RT correction for {}, using average row RTs: {}",
                    raw.id(),
                    e
                );
                None
            }
        };

        let gaps = match filler.open_gaps(rows, file_index, |row| {
            row.feature(master)
                .and_then(|f| predict_rt(curve.as_ref(), f.rt_seconds))
                .unwrap_or(row.average_rt_seconds)
        }) {
            TaskOutcome::Finished(gaps) => gaps,
            TaskOutcome::Cancelled => return Ok(TaskOutcome::Cancelled),
        };

        match filler.stream_file(*raw, gaps)? {
            TaskOutcome::Finished(cells) => num_filled += apply_cells(rows, cells),
            TaskOutcome::Cancelled => return Ok(TaskOutcome::Cancelled),
        }
    }

    // Pass 2: the master itself, one candidate window per source file.
    let curves: Vec<Option<PolynomialCurve>> = (0..files.len())
        .map(|source_file| {
            if source_file == master {
                return None;
            }
            fit_rt_curve(rows, source_file, master)
                .inspect_err(|e| {
                    debug!(
                        "No RT curve {} -> {}: {}",
                        files[source_file].id(),
                        files[master].id(),
                        e
                    )
                })
                .ok()
        })
        .collect();

    // Ordered by source file, so the first cell found for a row comes from
    // the earliest source.
    let mut source_gaps = Vec::new();
    let mut fallback_gaps = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        if filler.is_cancelled() {
            return Ok(TaskOutcome::Cancelled);
        }
        if row.has_feature(master) {
            continue;
        }
        let mut has_candidate = false;
        for (source_file, curve) in curves.iter().enumerate() {
            if source_file == master {
                continue;
            }
            let Some(feature) = row.feature(source_file) else {
                continue;
            };
            if let Some(center) = predict_rt(curve.as_ref(), feature.rt_seconds) {
                source_gaps.push((
                    source_file,
                    filler.open_gap(row, row_index, master, center),
                ));
                has_candidate = true;
            }
        }
        if !has_candidate {
            let center = row.average_rt_seconds;
            fallback_gaps.push(filler.open_gap(row, row_index, master, center));
        }
    }
    source_gaps.sort_by_key(|(source_file, _)| *source_file);
    let gaps: Vec<_> = source_gaps
        .into_iter()
        .map(|(_, gap)| gap)
        .chain(fallback_gaps)
        .collect();

    match filler.stream_file(files[master], gaps)? {
        TaskOutcome::Finished(cells) => {
            let mut seen_rows = HashSet::new();
            let cells = cells
                .into_iter()
                .filter(|cell| seen_rows.insert(cell.row_index))
                .collect();
            num_filled += apply_cells(rows, cells);
        }
        TaskOutcome::Cancelled => return Ok(TaskOutcome::Cancelled),
    }
    Ok(TaskOutcome::Finished(num_filled))
}
