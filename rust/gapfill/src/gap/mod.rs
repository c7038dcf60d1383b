//! Reconstruction of a single missing (row, raw file) cell.
//!
//! A [`GapSearchWindow`] is fed the MS1 scans of one raw file in retention
//! time order. For every scan it records the most intense centroid inside
//! the row's m/z window and grows a contiguous run of samples as long as the
//! trace keeps a plausible chromatographic shape:
//!
//! - before the RT window, only a rising approach continues the run,
//! - inside the RT window, every sample continues the run,
//! - after the RT window, only a falling tail continues the run.
//!
//! When the shape breaks, the finished run is searched for its highest
//! local maximum inside the RT window and trimmed to the tolerance-bounded
//! peak around it. The highest such peak seen so far is kept as the best
//! candidate and turned into a feature when the stream ends.

mod segment;

pub use segment::{
    build_feature,
    ScanSample,
};

use crate::models::Feature;
use crate::traits::ScanLike;
use crate::utils::TupleRange;
use segment::{
    find_apex,
    peak_bounds,
};

/// Where to look for a missing feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSearchSpec {
    pub row_index: usize,
    pub file_index: usize,
    pub mz_range: TupleRange<f64>,
    pub rt_range: TupleRange<f32>,
    /// Fraction in `[0, 1)` of intensity change still considered part of
    /// the same peak shape.
    pub intensity_tolerance: f32,
}

/// Incremental peak search for one gap.
///
/// Buffers are owned by the window and reused between runs.
#[derive(Debug, Clone)]
pub struct GapSearchWindow {
    spec: GapSearchSpec,
    current: Vec<ScanSample>,
    best: Vec<ScanSample>,
    best_height: Option<f32>,
    closed: bool,
    last_rt: f32,
}

impl GapSearchWindow {
    pub fn new(spec: GapSearchSpec) -> Self {
        Self {
            spec,
            current: Vec::new(),
            best: Vec::new(),
            best_height: None,
            closed: false,
            last_rt: f32::NEG_INFINITY,
        }
    }

    pub fn spec(&self) -> &GapSearchSpec {
        &self.spec
    }

    /// True once a run ended after the RT window; later scans are ignored.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Samples of the best peak found so far.
    pub fn best_segment(&self) -> &[ScanSample] {
        &self.best
    }

    /// Offers the next scan of the raw file.
    ///
    /// Scans must come in non-decreasing retention time order.
    pub fn offer<S: ScanLike>(&mut self, scan: &S) {
        if self.closed {
            return;
        }
        let rt = scan.rt_seconds();
        debug_assert!(
            rt >= self.last_rt,
            "Scans offered out of order: {} after {}",
            rt,
            self.last_rt
        );
        self.last_rt = rt;

        let rt_range = self.spec.rt_range;
        if self.current.is_empty() && !rt_range.contains(rt) {
            return;
        }

        let sample = match scan.find_base_peak(self.spec.mz_range) {
            Some(peak) => ScanSample {
                scan_number: scan.scan_number(),
                mz: peak.mz,
                rt_seconds: rt,
                intensity: peak.intensity,
            },
            None => ScanSample {
                scan_number: scan.scan_number(),
                mz: self.spec.mz_range.center(),
                rt_seconds: rt,
                intensity: 0.0,
            },
        };

        if self.current.is_empty() || self.shape_continues(&sample) {
            self.current.push(sample);
            return;
        }

        self.evaluate_run();
        self.current.clear();
        if rt > rt_range.end() {
            self.closed = true;
        } else {
            self.current.push(sample);
        }
    }

    fn shape_continues(&self, sample: &ScanSample) -> bool {
        let rt_range = self.spec.rt_range;
        let tol = self.spec.intensity_tolerance;
        let prev = match self.current.last() {
            Some(x) => x.intensity,
            None => return true,
        };

        if sample.rt_seconds < rt_range.start() {
            sample.intensity > prev * (1.0 - tol)
        } else if sample.rt_seconds <= rt_range.end() {
            true
        } else {
            sample.intensity < prev * (1.0 + tol)
        }
    }

    /// Checks the current run for a peak and keeps it if it beats the best one.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    fn evaluate_run(&mut self) {
        let Some(apex) = find_apex(&self.current, self.spec.rt_range) else {
            return;
        };
        let height = self.current[apex].intensity;
        if self.best_height.is_some_and(|best| height <= best) {
            return;
        }

        let (start, stop) = peak_bounds(&self.current, apex, self.spec.intensity_tolerance);
        self.best.clear();
        self.best.extend_from_slice(&self.current[start..=stop]);
        self.best_height = Some(height);
    }

    /// Ends the stream and returns the best peak if it spans at least
    /// `min_points` scans.
    ///
    /// Not finding a feature is a normal outcome.
    pub fn finalize(mut self, min_points: usize) -> Option<Feature> {
        if !self.current.is_empty() {
            self.evaluate_run();
            self.current.clear();
        }
        if self.best_height.is_none() || self.best.len() < min_points {
            return None;
        }
        build_feature(&self.best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;

    struct TestScan {
        scan_number: u32,
        rt: f32,
        peak: Option<DataPoint>,
    }

    impl ScanLike for TestScan {
        fn scan_number(&self) -> u32 {
            self.scan_number
        }

        fn rt_seconds(&self) -> f32 {
            self.rt
        }

        fn find_base_peak(&self, mz_range: TupleRange<f64>) -> Option<DataPoint> {
            self.peak.filter(|p| mz_range.contains(p.mz))
        }
    }

    fn scans(points: &[(f32, f32)]) -> Vec<TestScan> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(rt, intensity))| TestScan {
                scan_number: i as u32 + 1,
                rt,
                peak: if intensity > 0.0 {
                    Some(DataPoint {
                        mz: 300.0,
                        intensity,
                    })
                } else {
                    None
                },
            })
            .collect()
    }

    fn window(rt: (f32, f32), tol: f32) -> GapSearchWindow {
        GapSearchWindow::new(GapSearchSpec {
            row_index: 0,
            file_index: 0,
            mz_range: TupleRange::try_new(299.99, 300.01).unwrap(),
            rt_range: TupleRange::try_new(rt.0, rt.1).unwrap(),
            intensity_tolerance: tol,
        })
    }

    fn offer_all(gap: &mut GapSearchWindow, scans: &[TestScan]) {
        for s in scans {
            gap.offer(s);
        }
    }

    #[test]
    fn test_symmetric_peak_segment() {
        let scans = scans(&[
            (10.0, 0.0),
            (11.0, 50.0),
            (12.0, 100.0),
            (13.0, 50.0),
            (14.0, 0.0),
        ]);
        let mut gap = window((11.0, 13.0), 0.1);
        offer_all(&mut gap, &scans);

        let feature = gap.finalize(1).unwrap();
        assert_eq!(feature.rt_range.as_tuple(), (11.0, 13.0));
        assert_eq!(feature.scan_numbers, vec![2, 3, 4]);
        assert_eq!(feature.rt_seconds, 12.0);
        assert_eq!(feature.height, 100.0);
    }

    #[test]
    fn test_open_run_evaluated_on_finalize() {
        let scans = scans(&[(11.0, 0.0), (12.0, 100.0), (13.0, 90.0)]);
        let mut gap = window((11.0, 13.0), 0.1);
        offer_all(&mut gap, &scans);
        let tail = TestScan {
            scan_number: 9,
            rt: 13.5,
            peak: Some(DataPoint {
                mz: 300.0,
                intensity: 10.0,
            }),
        };
        gap.offer(&tail);
        assert!(gap.best_segment().is_empty());

        let feature = gap.finalize(1).unwrap();
        assert_eq!(feature.scan_numbers, vec![2, 3, 9]);
    }

    #[test]
    fn test_two_point_segment_below_three() {
        // The rise at 14 s ends the run, leaving [100, 90] as the best peak.
        let scans = scans(&[(11.0, 0.0), (12.0, 100.0), (13.0, 90.0), (14.0, 200.0)]);
        let mut gap = window((11.0, 13.0), 0.1);
        offer_all(&mut gap, &scans);
        assert!(gap.is_closed());
        assert_eq!(gap.best_segment().len(), 2);
        assert!(gap.clone().finalize(2).is_some());
        assert!(gap.finalize(3).is_none());
    }

    #[test]
    fn test_scans_outside_window_ignored() {
        let scans = scans(&[(1.0, 500.0), (2.0, 600.0), (30.0, 900.0)]);
        let mut gap = window((11.0, 13.0), 0.1);
        offer_all(&mut gap, &scans);
        assert!(!gap.is_closed());
        assert!(gap.finalize(1).is_none());
    }

    #[test]
    fn test_tail_decay_extends_past_window() {
        let scans = scans(&[
            (10.0, 0.0),
            (11.0, 40.0),
            (12.0, 100.0),
            (13.0, 80.0),
            (14.0, 60.0),
            (15.0, 30.0),
            (16.0, 90.0),
            (17.0, 20.0),
        ]);
        let mut gap = window((11.0, 13.0), 0.1);
        offer_all(&mut gap, &scans);
        // The rise at 16 s breaks the tail and closes the window.
        assert!(gap.is_closed());
        let feature = gap.finalize(1).unwrap();
        assert_eq!(feature.rt_range.as_tuple(), (11.0, 15.0));
        for rt in feature.scan_numbers.iter().map(|n| scans[*n as usize - 1].rt) {
            assert!(rt >= 11.0);
        }
    }

    #[test]
    fn test_highest_maximum_selected() {
        let scans = scans(&[
            (10.0, 0.0),
            (11.0, 30.0),
            (12.0, 60.0),
            (13.0, 30.0),
            (14.0, 100.0),
            (15.0, 300.0),
            (16.0, 120.0),
            (17.0, 0.0),
        ]);
        let mut gap = window((11.0, 17.0), 0.1);
        offer_all(&mut gap, &scans);
        let feature = gap.finalize(1).unwrap();
        assert_eq!(feature.height, 300.0);
        // Walks down 300 -> 100 -> 30 and stops at the rise back to 60.
        assert_eq!(feature.rt_range.as_tuple(), (13.0, 16.0));
    }

    #[test]
    fn test_rt_equal_to_window_end_is_inside() {
        // A steep rise exactly at the window end would break a tail, but the
        // end is inclusive so the run continues.
        let scans = scans(&[(11.0, 0.0), (12.0, 100.0), (13.0, 500.0), (14.0, 0.0)]);
        let mut gap = window((11.0, 13.0), 0.1);
        offer_all(&mut gap, &scans);
        assert!(!gap.is_closed());
        let feature = gap.finalize(1).unwrap();
        assert_eq!(feature.height, 500.0);
        assert_eq!(feature.scan_numbers, vec![2, 3]);
    }
}
