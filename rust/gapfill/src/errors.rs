use crate::models::RawFileId;
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug)]
pub enum GapFillError {
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    IncompatibleOptions(&'static str),
    EmptyFeatureList,
    MissingRawFile(RawFileId),
    FeatureListNotFound(String),
    DataReadingError(DataReadingError),
    DataProcessingError(DataProcessingError),
}

impl Display for GapFillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter {
                name,
                value,
                reason,
            } => write!(f, "Invalid value {} for '{}': {}", value, name, reason),
            Self::IncompatibleOptions(msg) => write!(f, "Incompatible options: {}", msg),
            Self::EmptyFeatureList => write!(f, "Feature list has no raw files"),
            Self::MissingRawFile(id) => write!(f, "Raw file '{}' was not provided", id),
            Self::FeatureListNotFound(name) => write!(f, "No feature list named '{}'", name),
            Self::DataReadingError(e) => write!(f, "{}", e),
            Self::DataProcessingError(e) => write!(f, "{:?}", e),
        }
    }
}

impl std::error::Error for GapFillError {}

impl From<DataReadingError> for GapFillError {
    fn from(e: DataReadingError) -> Self {
        GapFillError::DataReadingError(e)
    }
}

impl From<DataProcessingError> for GapFillError {
    fn from(e: DataProcessingError) -> Self {
        GapFillError::DataProcessingError(e)
    }
}

#[derive(Debug)]
pub enum DataReadingError {
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    InvalidData {
        source: DataProcessingError,
        path: PathBuf,
    },
    Other(String),
}

impl DataReadingError {
    pub fn custom(msg: impl Display) -> Self {
        Self::Other(msg.to_string())
    }
}

impl Display for DataReadingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { source, path } => {
                write!(f, "Error reading file {}: {}", path.display(), source)
            }
            Self::Json { source, path } => {
                write!(f, "Error parsing file {}: {}", path.display(), source)
            }
            Self::InvalidData { source, path } => {
                write!(f, "Invalid data in file {}: {:?}", path.display(), source)
            }
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DataReadingError {}

#[derive(Debug)]
pub enum DataProcessingError {
    ExpectedVectorSameLength {
        real: usize,
        expected: usize,
        context: &'static str,
    },
    RowWidthMismatch {
        row_id: u32,
        real: usize,
        expected: usize,
    },
    DuplicateRowId(u32),
    DuplicateRawFile(RawFileId),
    ExpectedFiniteData {
        context: String,
    },
    Serialization(String),
}
