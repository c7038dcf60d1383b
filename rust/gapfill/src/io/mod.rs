//! JSON input and output of feature lists and centroided raw files.

use crate::errors::DataReadingError;
use crate::models::{
    CentroidedRawFile,
    CentroidedScan,
    FeatureList,
    FragmentScanInfo,
    RawFileId,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
    Write,
};
use std::path::Path;
use tracing::info;

/// On-disk layout of one MS1 scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_number: u32,
    pub rt_seconds: f32,
    pub mz: Vec<f64>,
    pub intensity: Vec<f32>,
}

/// On-disk layout of a centroided raw file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFileRecord {
    pub name: String,
    pub scans: Vec<ScanRecord>,
    #[serde(default)]
    pub fragment_scans: Vec<FragmentScanInfo>,
}

fn open(path: &Path) -> Result<BufReader<File>, DataReadingError> {
    let file = File::open(path).map_err(|source| DataReadingError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    Ok(BufReader::new(file))
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, DataReadingError> {
    serde_json::from_reader(open(path)?).map_err(|source| DataReadingError::Json {
        source,
        path: path.to_path_buf(),
    })
}

/// Reads and validates a feature list.
pub fn read_feature_list<T: AsRef<Path>>(path: T) -> Result<FeatureList, DataReadingError> {
    let path = path.as_ref();
    info!("Reading feature list from {}", path.display());
    let list: FeatureList = parse(path)?;
    list.validate()
        .map_err(|source| DataReadingError::InvalidData {
            source,
            path: path.to_path_buf(),
        })?;
    info!(
        "Loaded feature list '{}' with {} rows over {} raw files",
        list.name(),
        list.num_rows(),
        list.raw_files().len()
    );
    Ok(list)
}

/// Reads a centroided raw file.
pub fn read_raw_file<T: AsRef<Path>>(path: T) -> Result<CentroidedRawFile, DataReadingError> {
    let path = path.as_ref();
    let record: RawFileRecord = parse(path)?;
    let scans = record
        .scans
        .into_iter()
        .map(|s| CentroidedScan::try_new(s.scan_number, s.rt_seconds, s.mz, s.intensity))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| DataReadingError::InvalidData {
            source,
            path: path.to_path_buf(),
        })?;
    info!(
        "Loaded raw file '{}' with {} MS1 scans from {}",
        record.name,
        scans.len(),
        path.display()
    );
    Ok(CentroidedRawFile::new(
        RawFileId::new(record.name),
        scans,
        record.fragment_scans,
    ))
}

/// Writes `list` as pretty-printed JSON.
pub fn write_feature_list<T: AsRef<Path>>(
    list: &FeatureList,
    path: T,
) -> Result<(), DataReadingError> {
    let path = path.as_ref();
    let io_err = |source| DataReadingError::Io {
        source,
        path: path.to_path_buf(),
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, list).map_err(|source| DataReadingError::Json {
        source,
        path: path.to_path_buf(),
    })?;
    writer.flush().map_err(io_err)?;
    Ok(())
}
