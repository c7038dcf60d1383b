use crate::models::{
    DataPoint,
    Feature,
    FeatureStatus,
};
use crate::utils::TupleRange;

/// What a gap recorded when it was offered a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSample {
    pub scan_number: u32,
    pub mz: f64,
    pub rt_seconds: f32,
    pub intensity: f32,
}

/// Index of the highest local maximum strictly inside the run whose RT lies
/// in `rt_range`.
///
/// A local maximum is `>=` both neighbours. Zero-intensity maxima are not
/// apexes. The first of several equally high maxima wins.
pub(crate) fn find_apex(run: &[ScanSample], rt_range: TupleRange<f32>) -> Option<usize> {
    let mut apex = None;
    let mut apex_height = 0.0f32;
    for (offset, w) in run.windows(3).enumerate() {
        let (prev, mid, next) = (w[0], w[1], w[2]);
        if !rt_range.contains(mid.rt_seconds) {
            continue;
        }
        if mid.intensity >= prev.intensity
            && mid.intensity >= next.intensity
            && mid.intensity > apex_height
        {
            apex = Some(offset + 1);
            apex_height = mid.intensity;
        }
    }
    apex
}

/// Walks outward from `apex` while the shape keeps falling within tolerance.
///
/// A neighbour joins the peak when it is non-zero and at most
/// `(1 + tolerance)` times the point it is adjacent to on the apex side.
/// Returns inclusive `(start, stop)` indices.
pub(crate) fn peak_bounds(run: &[ScanSample], apex: usize, tolerance: f32) -> (usize, usize) {
    let joins = |inner: f32, outer: f32| outer > 0.0 && outer <= inner * (1.0 + tolerance);

    let mut start = apex;
    while start > 0 && joins(run[start].intensity, run[start - 1].intensity) {
        start -= 1;
    }
    let mut stop = apex;
    while stop + 1 < run.len() && joins(run[stop].intensity, run[stop + 1].intensity) {
        stop += 1;
    }
    (start, stop)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Builds an estimated feature out of a peak segment.
///
/// m/z is the median of the segment, the apex is the first most intense
/// sample and the area is the trapezoidal integral over retention time
/// in seconds.
pub fn build_feature(segment: &[ScanSample]) -> Option<Feature> {
    let first = segment.first()?;

    let mut rt_range = TupleRange::singleton(first.rt_seconds);
    let mut mz_range = TupleRange::singleton(first.mz);
    let mut intensity_range = TupleRange::singleton(first.intensity);
    let mut apex = *first;
    let mut area = 0.0f64;

    for (i, s) in segment.iter().enumerate() {
        rt_range.extend_to(s.rt_seconds);
        mz_range.extend_to(s.mz);
        intensity_range.extend_to(s.intensity);
        if s.intensity > apex.intensity {
            apex = *s;
        }
        if i > 0 {
            let prev = segment[i - 1];
            area += (s.rt_seconds - prev.rt_seconds) as f64
                * (s.intensity + prev.intensity) as f64
                / 2.0;
        }
    }

    let mut mzs: Vec<f64> = segment.iter().map(|s| s.mz).collect();

    Some(Feature {
        mz: median(&mut mzs),
        rt_seconds: apex.rt_seconds,
        height: apex.intensity,
        area,
        rt_range,
        mz_range,
        intensity_range,
        scan_numbers: segment.iter().map(|s| s.scan_number).collect(),
        data_points: segment
            .iter()
            .map(|s| DataPoint {
                mz: s.mz,
                intensity: s.intensity,
            })
            .collect(),
        representative_scan: Some(apex.scan_number),
        fragment_scan: None,
        status: FeatureStatus::Estimated,
    })
}
