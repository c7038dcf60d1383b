use crate::errors::GapFillError;
use crate::models::FeatureList;
use serde::{
    Deserialize,
    Serialize,
};

/// What to do with the source list once a processed copy exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginalFeatureListOption {
    #[default]
    Keep,
    Replace,
}

/// The feature lists a processing session works on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    feature_lists: Vec<FeatureList>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, list: FeatureList) {
        self.feature_lists.push(list);
    }

    pub fn get(&self, name: &str) -> Option<&FeatureList> {
        self.feature_lists.iter().find(|l| l.name() == name)
    }

    pub fn feature_lists(&self) -> &[FeatureList] {
        &self.feature_lists
    }

    /// Registers a processed list derived from `source_name`.
    ///
    /// `Keep` appends it, `Replace` puts it where the source list was.
    pub fn apply_processed(
        &mut self,
        source_name: &str,
        processed: FeatureList,
        option: OriginalFeatureListOption,
    ) -> Result<(), GapFillError> {
        let position = self
            .feature_lists
            .iter()
            .position(|l| l.name() == source_name)
            .ok_or_else(|| GapFillError::FeatureListNotFound(source_name.to_string()))?;
        match option {
            OriginalFeatureListOption::Keep => self.feature_lists.push(processed),
            OriginalFeatureListOption::Replace => self.feature_lists[position] = processed,
        }
        Ok(())
    }
}
