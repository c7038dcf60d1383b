use crate::utils::TupleRange;
use serde::{
    Deserialize,
    Serialize,
};

/// Tolerance settings used to open a search window around a row.
///
/// Example:
/// ```
/// use gapfill::Tolerance;
///
/// let tolerance = Tolerance::default();
/// let mz_range = tolerance.mz_range(500.0);
/// assert!(mz_range.contains(500.0));
/// ```
///
/// Convention:
/// Ranges are given in terms of positive values. A tolerance of (1, 1) on a
/// value of 10 means a range of (9, 11).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tolerance {
    pub mz: MzTolerance,
    pub rt: RtTolerance,
}

/// m/z tolerance combining an absolute and a relative component.
///
/// The wider of the two wins, so small masses are covered by the absolute
/// part and large ones by the ppm part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MzTolerance {
    #[serde(default)]
    pub da: f64,
    #[serde(default)]
    pub ppm: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum RtTolerance {
    #[serde(rename = "seconds")]
    Seconds((f32, f32)),
    #[serde(rename = "percent")]
    Pct((f32, f32)),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            mz: MzTolerance {
                da: 0.001,
                ppm: 5.0,
            },
            rt: RtTolerance::Seconds((12.0, 12.0)),
        }
    }
}

impl MzTolerance {
    /// Half width of the window at `mz`.
    pub fn half_width(&self, mz: f64) -> f64 {
        self.da.max(mz * self.ppm / 1e6)
    }

    pub fn is_valid(&self) -> bool {
        self.da.is_finite() && self.ppm.is_finite() && self.da >= 0.0 && self.ppm >= 0.0
    }
}

impl RtTolerance {
    pub fn is_valid(&self) -> bool {
        let (low, high) = match self {
            RtTolerance::Seconds(x) => x,
            RtTolerance::Pct(x) => x,
        };
        low.is_finite() && high.is_finite() && *low >= 0.0 && *high >= 0.0
    }
}

impl Tolerance {
    /// m/z window around `mz`.
    ///
    /// ```
    /// use gapfill::Tolerance;
    /// use gapfill::models::tolerance::{MzTolerance, RtTolerance};
    ///
    /// let tol = Tolerance {
    ///     mz: MzTolerance { da: 0.002, ppm: 10.0 },
    ///     rt: RtTolerance::Seconds((6.0, 6.0)),
    /// };
    /// // 10 ppm of 500 is 0.005, wider than 0.002
    /// let range = tol.mz_range(500.0);
    /// assert!((range.start() - 499.995).abs() < 1e-9);
    /// assert!((range.end() - 500.005).abs() < 1e-9);
    ///
    /// // 10 ppm of 100 is 0.001, the absolute part wins
    /// let range = tol.mz_range(100.0);
    /// assert!((range.end() - 100.002).abs() < 1e-9);
    /// ```
    pub fn mz_range(&self, mz: f64) -> TupleRange<f64> {
        let half_width = self.mz.half_width(mz);
        TupleRange::from_unordered(mz - half_width, mz + half_width)
    }

    /// Retention time window around `rt_seconds`, in seconds.
    pub fn rt_range_seconds(&self, rt_seconds: f32) -> TupleRange<f32> {
        match self.rt {
            RtTolerance::Seconds((low, high)) => {
                TupleRange::from_unordered(rt_seconds - low, rt_seconds + high)
            }
            RtTolerance::Pct((low, high)) => {
                let low = rt_seconds * low / 100.0;
                let high = rt_seconds * high / 100.0;
                TupleRange::from_unordered(rt_seconds - low, rt_seconds + high)
            }
        }
    }

    /// Create a new `Tolerance` with modified RT tolerance (builder pattern).
    pub fn with_rt_tolerance(self, rt: RtTolerance) -> Self {
        Self { rt, ..self }
    }

    pub fn with_mz_tolerance(self, mz: MzTolerance) -> Self {
        Self { mz, ..self }
    }
}
