use gapfill::errors::{
    DataReadingError,
    GapFillError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Gap filling error: {0}")]
    GapFill(#[from] GapFillError),

    #[error("Data reading error: {0}")]
    DataReading(#[from] DataReadingError),

    #[error("Progress bar template error: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error("Error interpreting the config: {0}")]
    Config(String),
}
