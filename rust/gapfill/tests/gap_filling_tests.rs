use gapfill::errors::{
    DataReadingError,
    GapFillError,
};
use gapfill::models::{
    AppliedMethod,
    CentroidedRawFile,
    CentroidedScan,
    Feature,
    FeatureIdentity,
    FeatureStatus,
    FragmentScanInfo,
};
use gapfill::{
    CancellationToken,
    FeatureList,
    FeatureListRow,
    FillProgress,
    GapFillParameters,
    GapFiller,
    OriginalFeatureListOption,
    Project,
    RawFileId,
    RawFileLike,
    TaskOutcome,
};
use std::sync::Arc;

const SIGMA: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
struct Peak {
    mz: f64,
    apex_rt: f32,
    height: f32,
}

/// One scan per second from 0 to `rt_max`, each peak drawn as a gaussian
/// and cut where it drops below 1.
fn synthetic_raw_file(name: &str, peaks: &[Peak], rt_max: u32) -> CentroidedRawFile {
    let scans = (0..=rt_max)
        .map(|i| {
            let rt = i as f32;
            let mut mz = Vec::new();
            let mut intensity = Vec::new();
            for p in peaks {
                let d = rt - p.apex_rt;
                let value = p.height * (-(d * d) / (2.0 * SIGMA * SIGMA)).exp();
                if value >= 1.0 {
                    mz.push(p.mz);
                    intensity.push(value);
                }
            }
            CentroidedScan::try_new(i + 1, rt, mz, intensity).unwrap()
        })
        .collect();
    CentroidedRawFile::new(name.into(), scans, vec![])
}

fn file_ids(n: usize) -> Vec<RawFileId> {
    (0..n)
        .map(|i| RawFileId::new(format!("sample_{}.mzML", i)))
        .collect()
}

fn run_to_end<R: RawFileLike>(
    params: GapFillParameters,
    list: &FeatureList,
    raw_files: &[R],
) -> FeatureList {
    match GapFiller::new(params).run(list, raw_files).unwrap() {
        TaskOutcome::Finished(filled) => filled,
        TaskOutcome::Cancelled => panic!("Fill was not expected to be cancelled"),
    }
}

/// A row detected in files 0-2, with a clean peak in file 3 and nothing at
/// its m/z in file 4.
fn five_file_fixture() -> (FeatureList, Vec<CentroidedRawFile>) {
    let ids = file_ids(5);
    let target = Peak {
        mz: 400.0,
        apex_rt: 30.0,
        height: 1e4,
    };
    let other = Peak {
        mz: 410.0,
        apex_rt: 30.0,
        height: 5e3,
    };

    let mut row = FeatureListRow::new(1, 400.0, 30.0, 5);
    for i in 0..3 {
        row = row.with_feature(i, Feature::detected(400.0, 30.0, 1e4));
    }
    let list = FeatureList::try_new("aligned", ids.clone(), vec![row]).unwrap();

    let raw_files = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let peaks: Vec<Peak> = if i == 4 {
                vec![other]
            } else {
                vec![target, other]
            };
            synthetic_raw_file(id.as_str(), &peaks, 60)
        })
        .collect();
    (list, raw_files)
}

#[test]
fn test_fills_clean_peak_and_leaves_empty_trace_empty() {
    let (list, raw_files) = five_file_fixture();
    let filled = run_to_end(GapFillParameters::default(), &list, &raw_files);

    let row = &filled.rows()[0];
    let feature = row.feature(3).expect("peak in file 3 should be filled");
    assert_eq!(feature.status, FeatureStatus::Estimated);
    assert_eq!(feature.height, 1e4);
    assert_eq!(feature.rt_seconds, 30.0);
    assert_eq!(feature.mz, 400.0);
    assert_eq!(feature.rt_range.as_tuple(), (22.0, 38.0));
    assert_eq!(feature.scan_numbers.len(), 17);
    assert!(feature.area > 0.0);

    assert!(!row.has_feature(4));
    assert_eq!(filled.num_missing(), 1);
}

#[test]
fn test_filled_segment_stays_near_window() {
    let (list, raw_files) = five_file_fixture();
    let params = GapFillParameters::default();
    let window = params.tolerance.rt_range_seconds(30.0);
    let filled = run_to_end(params, &list, &raw_files);

    let feature = filled.rows()[0].feature(3).unwrap();
    assert!(window.contains(feature.rt_seconds));
    assert!(feature.rt_range.start() >= window.start());
    assert!(feature.rt_range.end() <= window.end());
}

fn many_rows_fixture() -> (FeatureList, Vec<CentroidedRawFile>) {
    let num_files = 4;
    let ids = file_ids(num_files);
    let num_rows = 20;

    let rows: Vec<FeatureListRow> = (0..num_rows)
        .map(|i| {
            let mz = 200.0 + 7.3 * i as f64;
            let rt = 20.0 + 25.0 * i as f32;
            let mut row = FeatureListRow::new(i as u32 + 100, mz, rt, num_files);
            for f in 0..num_files {
                if (i + f) % 3 != 0 {
                    row = row.with_feature(f, Feature::detected(mz, rt + f as f32, 1e3));
                }
            }
            row
        })
        .collect();
    let list = FeatureList::try_new("aligned", ids.clone(), rows).unwrap();

    let raw_files = ids
        .iter()
        .enumerate()
        .map(|(f, id)| {
            let peaks: Vec<Peak> = (0..num_rows)
                .filter(|i| i % 4 != 0)
                .map(|i| Peak {
                    mz: 200.0 + 7.3 * i as f64,
                    apex_rt: 20.0 + 25.0 * i as f32 + f as f32,
                    height: 1e3 * (1.0 + f as f32),
                })
                .collect();
            synthetic_raw_file(id.as_str(), &peaks, 560)
        })
        .collect();
    (list, raw_files)
}

#[test]
fn test_parallel_matches_sequential() {
    let (list, raw_files) = many_rows_fixture();
    let sequential = run_to_end(GapFillParameters::default(), &list, &raw_files);
    let parallel = run_to_end(
        GapFillParameters {
            parallel: true,
            ..Default::default()
        },
        &list,
        &raw_files,
    );

    assert_eq!(sequential.rows(), parallel.rows());
    // Rows without a peak in the raw data stay empty, the rest get filled.
    assert!(sequential.num_missing() > 0);
    assert!(sequential.num_missing() < list.num_missing());
}

#[test]
fn test_cancelled_before_start() {
    let (list, raw_files) = many_rows_fixture();
    let snapshot = list.clone();
    let token = CancellationToken::new();
    let progress = Arc::new(FillProgress::new());
    let filler = GapFiller::new(GapFillParameters::default())
        .with_cancellation(token.clone())
        .with_progress(Arc::clone(&progress));

    token.cancel();
    let outcome = filler.run(&list, &raw_files).unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(progress.processed(), 0);
    assert_eq!(list, snapshot);
}

/// Hands out the scans of `inner` and sets `token` once `cancel_after` scans
/// have been read.
struct CancellingRawFile {
    inner: CentroidedRawFile,
    token: CancellationToken,
    cancel_after: usize,
}

impl RawFileLike for CancellingRawFile {
    type Scan = CentroidedScan;

    fn id(&self) -> &RawFileId {
        self.inner.id()
    }

    fn num_ms1_scans(&self) -> usize {
        self.inner.num_ms1_scans()
    }

    fn ms1_scans(&self) -> Result<impl Iterator<Item = &CentroidedScan>, DataReadingError> {
        Ok(self.inner.scans().iter().enumerate().map(move |(i, scan)| {
            if i + 1 == self.cancel_after {
                self.token.cancel();
            }
            scan
        }))
    }

    fn fragment_scans(&self) -> &[FragmentScanInfo] {
        self.inner.fragment_scans()
    }
}

#[test]
fn test_cancelled_while_streaming() {
    for parallel in [false, true] {
        let (list, raw_files) = many_rows_fixture();
        let snapshot = list.clone();
        let token = CancellationToken::new();
        let raw_files: Vec<CancellingRawFile> = raw_files
            .into_iter()
            .map(|inner| CancellingRawFile {
                inner,
                token: token.clone(),
                cancel_after: 100,
            })
            .collect();
        let progress = Arc::new(FillProgress::new());
        let params = GapFillParameters {
            parallel,
            ..Default::default()
        };
        let filler = GapFiller::new(params)
            .with_cancellation(token.clone())
            .with_progress(Arc::clone(&progress));

        let outcome = filler.run(&list, &raw_files).unwrap();
        assert!(outcome.is_cancelled(), "parallel: {}", parallel);
        assert!(token.is_cancelled());
        assert_eq!(progress.total(), 4 * 561);
        assert!(progress.processed() >= 100);
        assert!(progress.processed() < progress.total());
        assert_eq!(list, snapshot);
    }
}

#[test]
fn test_progress_reaches_total() {
    let (list, raw_files) = many_rows_fixture();
    let progress = Arc::new(FillProgress::new());
    GapFiller::new(GapFillParameters::default())
        .with_progress(Arc::clone(&progress))
        .run(&list, &raw_files)
        .unwrap();
    assert_eq!(progress.total(), 4 * 561);
    assert_eq!(progress.processed(), progress.total());
    assert_eq!(progress.fraction(), 1.0);
}

/// Six rows seen in three files whose retention times drift by 0, 20 and 40
/// seconds. Row 3 is missing in the most shifted file.
fn shifted_fixture() -> (FeatureList, Vec<CentroidedRawFile>) {
    let shifts = [0.0f32, 20.0, 40.0];
    let ids = file_ids(shifts.len());
    let row_peaks: Vec<(f64, f32)> = (0..6)
        .map(|i| (300.0 + 10.0 * i as f64, 100.0 + 80.0 * i as f32))
        .collect();

    let rows = row_peaks
        .iter()
        .enumerate()
        .map(|(i, &(mz, rt))| {
            let present: Vec<usize> = (0..shifts.len()).filter(|&f| !(i == 3 && f == 2)).collect();
            let average_rt =
                present.iter().map(|&f| rt + shifts[f]).sum::<f32>() / present.len() as f32;
            let mut row = FeatureListRow::new(i as u32, mz, average_rt, shifts.len());
            for f in present {
                row = row.with_feature(f, Feature::detected(mz, rt + shifts[f], 5e3));
            }
            row
        })
        .collect();
    let list = FeatureList::try_new("aligned", ids.clone(), rows).unwrap();

    let raw_files = ids
        .iter()
        .zip(shifts.iter())
        .map(|(id, shift)| {
            let peaks: Vec<Peak> = row_peaks
                .iter()
                .map(|&(mz, rt)| Peak {
                    mz,
                    apex_rt: rt + shift,
                    height: 5e3,
                })
                .collect();
            synthetic_raw_file(id.as_str(), &peaks, 600)
        })
        .collect();
    (list, raw_files)
}

#[test]
fn test_rt_correction_finds_shifted_peak() {
    let (list, raw_files) = shifted_fixture();

    let uncorrected = run_to_end(GapFillParameters::default(), &list, &raw_files);
    assert!(!uncorrected.rows()[3].has_feature(2));

    for seed in [0, 1, 2, 3, 17] {
        let params = GapFillParameters {
            rt_correction: true,
            rt_correction_seed: Some(seed),
            ..Default::default()
        };
        let corrected = run_to_end(params, &list, &raw_files);
        let feature = corrected.rows()[3]
            .feature(2)
            .expect("RT correction should move the window onto the peak");
        assert_eq!(feature.rt_seconds, 380.0);
        assert_eq!(feature.height, 5e3);
    }
}

#[test]
fn test_same_seed_same_result() {
    let (list, raw_files) = many_rows_fixture();
    let params = GapFillParameters {
        rt_correction: true,
        rt_correction_seed: Some(42),
        ..Default::default()
    };
    let first = run_to_end(params.clone(), &list, &raw_files);
    let second = run_to_end(params, &list, &raw_files);
    assert_eq!(first, second);
}

#[test]
fn test_rt_correction_with_parallel_rejected() {
    let (list, raw_files) = shifted_fixture();
    let params = GapFillParameters {
        rt_correction: true,
        parallel: true,
        ..Default::default()
    };
    let res = GapFiller::new(params).run(&list, &raw_files);
    assert!(matches!(res, Err(GapFillError::IncompatibleOptions(_))));
}

#[test]
fn test_result_keeps_row_metadata_and_history() {
    let (list, raw_files) = five_file_fixture();
    let row = list.rows()[0]
        .clone()
        .with_comment("internal standard")
        .with_identity(FeatureIdentity {
            name: "caffeine".to_string(),
            formula: Some("C8H10N4O2".to_string()),
            method: Some("library match".to_string()),
        });
    let mut list = FeatureList::try_new("aligned", list.raw_files().to_vec(), vec![row]).unwrap();
    list.add_applied_method(AppliedMethod {
        description: "Join aligner".to_string(),
        parameters: serde_json::json!({"mz_weight": 3}),
    });

    let params = GapFillParameters {
        suffix: "filled".to_string(),
        ..Default::default()
    };
    let filled = run_to_end(params, &list, &raw_files);

    assert_eq!(filled.name(), "aligned filled");
    assert_eq!(filled.raw_files(), list.raw_files());
    let (before, after) = (&list.rows()[0], &filled.rows()[0]);
    assert_eq!(after.id, before.id);
    assert_eq!(after.average_mz, before.average_mz);
    assert_eq!(after.average_rt_seconds, before.average_rt_seconds);
    assert_eq!(after.comment, before.comment);
    assert_eq!(after.identities, before.identities);
    assert_eq!(after.preferred_identity, Some(0));

    let methods = filled.applied_methods();
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0], list.applied_methods()[0]);
    assert_eq!(methods[1].description, "Gap filling");
    assert_eq!(methods[1].parameters["suffix"], "filled");
    // The source history is untouched.
    assert_eq!(list.applied_methods().len(), 1);
}

#[test]
fn test_replace_original_in_project() {
    let (list, raw_files) = five_file_fixture();
    let mut project = Project::new();
    project.add(list.clone());

    let params = GapFillParameters {
        handle_original: OriginalFeatureListOption::Replace,
        ..Default::default()
    };
    let option = params.handle_original;
    let filled = run_to_end(params, &list, &raw_files);
    project.apply_processed(list.name(), filled, option).unwrap();

    assert_eq!(project.feature_lists().len(), 1);
    assert!(project.get("aligned").is_none());
    assert_eq!(project.get("aligned gap-filled").unwrap().num_missing(), 1);
}

#[test]
fn test_fragment_scan_attached() {
    let (list, mut raw_files) = five_file_fixture();
    let fragments = vec![
        FragmentScanInfo {
            scan_number: 1000,
            rt_seconds: 30.5,
            precursor_mz: 400.0005,
            tic: 5e5,
        },
        FragmentScanInfo {
            scan_number: 1001,
            rt_seconds: 55.0,
            precursor_mz: 400.0,
            tic: 9e6,
        },
    ];
    let rebuilt = CentroidedRawFile::new(
        raw_files[3].id().clone(),
        raw_files[3].scans().to_vec(),
        fragments,
    );
    raw_files[3] = rebuilt;

    let filled = run_to_end(GapFillParameters::default(), &list, &raw_files);
    assert_eq!(filled.rows()[0].feature(3).unwrap().fragment_scan, Some(1000));
}

/// A raw file whose scans cannot be read.
struct UnreadableRawFile {
    id: RawFileId,
}

impl RawFileLike for UnreadableRawFile {
    type Scan = CentroidedScan;

    fn id(&self) -> &RawFileId {
        &self.id
    }

    fn num_ms1_scans(&self) -> usize {
        10
    }

    fn ms1_scans(&self) -> Result<impl Iterator<Item = &CentroidedScan>, DataReadingError> {
        Err::<std::iter::Empty<&CentroidedScan>, _>(DataReadingError::custom(
            "truncated scan block",
        ))
    }
}

#[test]
fn test_read_failure_aborts_fill() {
    let ids = file_ids(2);
    let row = FeatureListRow::new(1, 400.0, 30.0, 2).with_feature(0, Feature::detected(400.0, 30.0, 1e4));
    let list = FeatureList::try_new("aligned", ids.clone(), vec![row]).unwrap();
    let raw_files: Vec<UnreadableRawFile> = ids
        .into_iter()
        .map(|id| UnreadableRawFile { id })
        .collect();

    let res = GapFiller::new(GapFillParameters::default()).run(&list, &raw_files);
    assert!(matches!(res, Err(GapFillError::DataReadingError(_))));
}
