use crate::errors::DataProcessingError;
use crate::models::{
    Feature,
    RawFileId,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashSet;

/// An annotation attached to a row (compound name, formula ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureIdentity {
    pub name: String,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// One aligned ion across all raw files of a feature list.
///
/// `features` is column-aligned with the raw files of the owning list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureListRow {
    pub id: u32,
    pub average_mz: f64,
    pub average_rt_seconds: f32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub identities: Vec<FeatureIdentity>,
    /// Index into `identities`.
    #[serde(default)]
    pub preferred_identity: Option<usize>,
    features: Vec<Option<Feature>>,
}

impl FeatureListRow {
    /// Row with no features for `num_files` raw files.
    pub fn new(id: u32, average_mz: f64, average_rt_seconds: f32, num_files: usize) -> Self {
        Self {
            id,
            average_mz,
            average_rt_seconds,
            comment: None,
            identities: Vec::new(),
            preferred_identity: None,
            features: vec![None; num_files],
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_identity(mut self, identity: FeatureIdentity) -> Self {
        self.identities.push(identity);
        if self.preferred_identity.is_none() {
            self.preferred_identity = Some(self.identities.len() - 1);
        }
        self
    }

    pub fn with_feature(mut self, file_index: usize, feature: Feature) -> Self {
        self.set_feature(file_index, feature);
        self
    }

    pub fn feature(&self, file_index: usize) -> Option<&Feature> {
        self.features.get(file_index).and_then(|f| f.as_ref())
    }

    pub fn has_feature(&self, file_index: usize) -> bool {
        self.feature(file_index).is_some()
    }

    /// Places `feature` in the cell for `file_index`, replacing what was there.
    ///
    /// # Panics
    ///
    /// Panics if `file_index` is not a column of this row.
    pub fn set_feature(&mut self, file_index: usize, feature: Feature) {
        self.features[file_index] = Some(feature);
    }

    pub fn features(&self) -> &[Option<Feature>] {
        &self.features
    }

    pub fn num_files(&self) -> usize {
        self.features.len()
    }

    pub fn num_missing(&self) -> usize {
        self.features.iter().filter(|f| f.is_none()).count()
    }
}

/// A processing step recorded in a feature list's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMethod {
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Table of features aligned across raw files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureList {
    name: String,
    raw_files: Vec<RawFileId>,
    rows: Vec<FeatureListRow>,
    #[serde(default)]
    applied_methods: Vec<AppliedMethod>,
}

impl FeatureList {
    pub fn try_new(
        name: impl Into<String>,
        raw_files: Vec<RawFileId>,
        rows: Vec<FeatureListRow>,
    ) -> Result<Self, DataProcessingError> {
        let out = Self {
            name: name.into(),
            raw_files,
            rows,
            applied_methods: Vec::new(),
        };
        out.validate()?;
        Ok(out)
    }

    /// Checks that raw files and row ids are unique and that every row has
    /// one cell per raw file.
    pub fn validate(&self) -> Result<(), DataProcessingError> {
        let mut seen_files = HashSet::with_capacity(self.raw_files.len());
        for file in self.raw_files.iter() {
            if !seen_files.insert(file) {
                return Err(DataProcessingError::DuplicateRawFile(file.clone()));
            }
        }

        let mut seen_ids = HashSet::with_capacity(self.rows.len());
        for row in self.rows.iter() {
            if !seen_ids.insert(row.id) {
                return Err(DataProcessingError::DuplicateRowId(row.id));
            }
            if row.num_files() != self.raw_files.len() {
                return Err(DataProcessingError::RowWidthMismatch {
                    row_id: row.id,
                    real: row.num_files(),
                    expected: self.raw_files.len(),
                });
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_files(&self) -> &[RawFileId] {
        &self.raw_files
    }

    pub fn file_index(&self, id: &RawFileId) -> Option<usize> {
        self.raw_files.iter().position(|f| f == id)
    }

    pub fn rows(&self) -> &[FeatureListRow] {
        &self.rows
    }

    pub fn row_by_id(&self, id: u32) -> Option<&FeatureListRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn applied_methods(&self) -> &[AppliedMethod] {
        &self.applied_methods
    }

    pub fn add_applied_method(&mut self, method: AppliedMethod) {
        self.applied_methods.push(method);
    }

    /// Number of (row, raw file) cells without a feature.
    pub fn num_missing(&self) -> usize {
        self.rows.iter().map(|r| r.num_missing()).sum()
    }
}
