#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::fill::{
    CancellationToken,
    FillProgress,
    GapFillParameters,
    GapFiller,
    TaskOutcome,
};
pub use crate::gap::{
    GapSearchSpec,
    GapSearchWindow,
};
pub use crate::models::{
    Feature,
    FeatureList,
    FeatureListRow,
    OriginalFeatureListOption,
    Project,
    RawFileId,
    Tolerance,
};

// Re-export traits
pub use crate::traits::{
    RawFileLike,
    ScanLike,
};

// Declare modules
pub mod errors;
pub mod fill;
pub mod gap;
pub mod io;
pub mod models;
pub mod traits;
pub mod utils;
pub use crate::utils::TupleRange;

// Re-export errors
pub use crate::errors::{
    DataProcessingError,
    DataReadingError,
    GapFillError,
};

pub use rtregression;
