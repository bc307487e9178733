//! Print metadata document
//!
//! A YAML file describing the reference data, prints and batches to push
//! into AM-Vision. Model file paths inside it are relative to the file.

use crate::error::ImportError;
use crate::models::{Batch, MaterialReference, PrintAttribute, PrintRecord, Query, View};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Directory that model file paths are resolved against
    #[serde(skip)]
    pub root: PathBuf,
    pub material_references: Vec<MaterialReference>,
    pub views: Vec<View>,
    pub print_attributes: Vec<PrintAttribute>,
    pub queries: Vec<Query>,
    pub prints: Vec<PrintRecord>,
    pub batches: Vec<Batch>,
}

impl Metadata {
    /// Load a metadata file; its directory becomes the model root
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ImportError::MetadataRead {
                    path: path.to_path_buf(),
                    source,
                })?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_yaml(&content, root).map_err(|source| ImportError::MetadataParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a metadata document held in memory
    pub fn from_yaml(content: &str, root: impl Into<PathBuf>) -> Result<Self, serde_yaml::Error> {
        let mut meta: Metadata = serde_yaml::from_str(content)?;
        meta.root = root.into();
        Ok(meta)
    }

    /// Distinct model ids referenced by the prints, in sorted order
    pub fn model_ids(&self) -> Vec<String> {
        self.prints
            .iter()
            .map(|p| p.model_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct material ids referenced by the prints, in sorted order
    pub fn material_ids(&self) -> Vec<String> {
        self.prints
            .iter()
            .map(|p| p.material_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Absolute location of a print's model file
    pub fn model_path(&self, print: &PrintRecord) -> PathBuf {
        self.root.join(&print.model_fn)
    }
}
