use std::ops::RangeInclusive;
use thiserror::Error;

/// Finds the index range of elements in a sorted slice whose keys fall within the specified range.
///
/// The slice must be sorted by `key_fn`. The returned range can be used directly
/// with slice indexing and is empty when nothing matches.
///
/// # Examples
///
/// ```
/// use gapfill::utils::binary_search_range_by_key;
///
/// let mzs = [100.0, 100.5, 101.0, 101.5, 102.0];
/// let range = binary_search_range_by_key(&mzs, 100.4..=101.5, |x| *x);
/// assert_eq!(&mzs[range], &[100.5, 101.0, 101.5]);
/// ```
pub fn binary_search_range_by_key<T, K, F>(
    slice: &[T],
    key_range: RangeInclusive<K>,
    key_fn: F,
) -> std::ops::Range<usize>
where
    F: Fn(&T) -> K,
    K: PartialOrd,
{
    let start_idx = slice.partition_point(|x| key_fn(x) < *key_range.start());
    let end_idx = start_idx + slice[start_idx..].partition_point(|x| key_fn(x) <= *key_range.end());

    start_idx..end_idx
}

/// TupleRange represents a closed-closed range [a, b].
///
/// The first element is always less than or equal to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TupleRange<T: Copy + PartialOrd>(T, T);

#[derive(Error, Debug)]
pub enum TupleRangeError<T: Copy + PartialOrd + std::fmt::Debug> {
    #[error(
        "Expected the first element to be less than or equal to the second, got ({0:?}, {1:?})"
    )]
    ExpectedOrderedRange(T, T),
}

impl<T: Copy + PartialOrd + std::fmt::Debug> TupleRange<T> {
    /// Creates a new `TupleRange`, failing if `left > right`.
    pub fn try_new(left: T, right: T) -> Result<Self, TupleRangeError<T>> {
        if left > right {
            Err(TupleRangeError::ExpectedOrderedRange(left, right))
        } else {
            Ok(Self(left, right))
        }
    }

    /// Creates a range spanning both values, in whatever order they come.
    pub fn from_unordered(a: T, b: T) -> Self {
        if b < a {
            Self(b, a)
        } else {
            Self(a, b)
        }
    }

    pub fn singleton(x: T) -> Self {
        Self(x, x)
    }

    pub fn as_tuple(&self) -> (T, T) {
        (self.0, self.1)
    }

    pub fn as_inclusive_range(&self) -> RangeInclusive<T> {
        self.0..=self.1
    }

    pub fn contains(&self, x: T) -> bool {
        self.0 <= x && x <= self.1
    }

    pub fn start(&self) -> T {
        self.0
    }

    pub fn end(&self) -> T {
        self.1
    }

    /// Grows the range so it covers `x`.
    pub fn extend_to(&mut self, x: T) {
        if x < self.0 {
            self.0 = x;
        }
        if x > self.1 {
            self.1 = x;
        }
    }

    pub fn intersects(&self, other: Self) -> bool {
        !(self.end() < other.start() || other.end() < self.start())
    }
}

impl TupleRange<f64> {
    pub fn center(&self) -> f64 {
        (self.0 + self.1) / 2.0
    }
}

impl TupleRange<f32> {
    pub fn center(&self) -> f32 {
        (self.0 + self.1) / 2.0
    }
}

impl<T> TryInto<TupleRange<T>> for (T, T)
where
    T: Copy + PartialOrd + std::fmt::Debug,
{
    type Error = TupleRangeError<T>;

    fn try_into(self) -> Result<TupleRange<T>, Self::Error> {
        TupleRange::try_new(self.0, self.1)
    }
}
