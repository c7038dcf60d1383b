use gapfill::io::{
    read_feature_list,
    read_raw_file,
    write_feature_list,
};
use gapfill::{
    FillProgress,
    GapFiller,
    Project,
    TaskOutcome,
};
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{
    info,
    instrument,
    warn,
};

use crate::cli::{
    FillArgs,
    WriteTemplateArgs,
};
use crate::config::Config;
use crate::error::CliError;

/// Main function for the 'fill' subcommand.
#[instrument]
pub fn main_fill(args: FillArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config)?.with_cli_args(&args)?;
    info!("Using gap filling parameters: {:#?}", config.gap_filling);
    let (Some(input), Some(output)) = (&config.input, &config.output) else {
        return Err(CliError::Config(
            "Both input and output need to be set".to_string(),
        ));
    };

    let start = Instant::now();
    let list = read_feature_list(&input.feature_list)?;
    let raw_files = input
        .raw_files
        .iter()
        .map(read_raw_file)
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        "Loaded {} raw files in {:?}",
        raw_files.len(),
        start.elapsed()
    );

    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} scans ({eta})",
    )?;
    let progress = Arc::new(FillProgress::with_progress_bar(
        ProgressBar::new(0).with_style(style),
    ));
    let outcome = GapFiller::new(config.gap_filling.clone())
        .with_progress(progress)
        .run(&list, &raw_files)?;
    let filled = match outcome {
        TaskOutcome::Finished(filled) => filled,
        TaskOutcome::Cancelled => {
            warn!("Gap filling was cancelled, nothing written");
            return Ok(());
        }
    };
    println!(
        "Filled {} of {} missing features in {:?}",
        list.num_missing() - filled.num_missing(),
        list.num_missing(),
        start.elapsed()
    );

    let mut project = Project::new();
    project.add(list.clone());
    project.apply_processed(list.name(), filled, config.gap_filling.handle_original)?;

    std::fs::create_dir_all(&output.directory)?;
    for feature_list in project.feature_lists() {
        let path = output
            .directory
            .join(format!("{}.json", feature_list.name().replace(' ', "_")));
        write_feature_list(feature_list, &path)?;
        info!("Wrote '{}' to {}", feature_list.name(), path.display());
    }
    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"{
  "input": {
    "feature_list": "aligned_feature_list.json",
    "raw_files": ["sample_1.json", "sample_2.json"]
  },
  "gap_filling": {
    "intensity_tolerance": 0.2,
    "tolerance": {
      "mz": { "da": 0.001, "ppm": 5.0 },
      "rt": { "seconds": [12.0, 12.0] }
    },
    "rt_correction": false,
    "parallel": false,
    "suffix": "gap-filled",
    "handle_original": "keep",
    "rt_correction_seed": null,
    "min_points": 1
  },
  "output": { "directory": "gapfill_results" }
}"#;

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join("gapfill_config_template.json");
    std::fs::write(&config_path, CONFIG_TEMPLATE)?;
    println!("Wrote config template to: {}", config_path.display());
    Ok(())
}
