use gapfill::GapFillParameters;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::{
    Path,
    PathBuf,
};

use crate::cli::FillArgs;
use crate::error::CliError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub input: Option<InputConfig>,
    #[serde(default)]
    pub gap_filling: GapFillParameters,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InputConfig {
    pub feature_list: PathBuf,
    pub raw_files: Vec<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let config: Config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        Ok(config)
    }

    /// Lets command line arguments take precedence over the config file.
    pub fn with_cli_args(mut self, args: &FillArgs) -> Result<Self, CliError> {
        if let (Some(feature_list), Some(raw_files)) = (&args.feature_list, &args.raw_files) {
            self.input = Some(InputConfig {
                feature_list: feature_list.clone(),
                raw_files: raw_files.clone(),
            });
        }
        let input = self.input.as_mut().ok_or_else(|| {
            CliError::Config(
                "No input in the config, pass both --feature-list and --raw-files".to_string(),
            )
        })?;
        if let Some(feature_list) = &args.feature_list {
            input.feature_list = feature_list.clone();
        }
        if let Some(raw_files) = &args.raw_files {
            input.raw_files = raw_files.clone();
        }

        if let Some(directory) = &args.output_dir {
            self.output = Some(OutputConfig {
                directory: directory.clone(),
            });
        }
        if self.output.is_none() {
            return Err(CliError::Config(
                "No output directory in the config, pass --output-dir".to_string(),
            ));
        }

        if args.parallel {
            self.gap_filling.parallel = true;
        }
        Ok(self)
    }
}
