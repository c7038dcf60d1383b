pub mod feature;
pub mod feature_list;
pub mod project;
pub mod raw_file;
pub mod tolerance;

pub use feature::{
    DataPoint,
    Feature,
    FeatureStatus,
};
pub use feature_list::{
    AppliedMethod,
    FeatureIdentity,
    FeatureList,
    FeatureListRow,
};
pub use project::{
    OriginalFeatureListOption,
    Project,
};
pub use raw_file::{
    best_fragment_scan,
    CentroidedRawFile,
    CentroidedScan,
    FragmentScanInfo,
    RawFileId,
};
pub use tolerance::Tolerance;
