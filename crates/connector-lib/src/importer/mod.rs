//! Bulk importer for print metadata
//!
//! Pushes reference data, model files, prints and batches into AM-Vision.
//! Every step is an upsert or guarded by an existence lookup, so a failed
//! run is recovered by running it again from the start.

use crate::api::AmVisionApi;
use crate::error::ImportError;
use crate::metadata::Metadata;
use crate::models::{DesignMaterial, PrintUpload, RemoteId};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};


/// Summary of a full import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub designs_uploaded: usize,
    pub designs_skipped: usize,
    pub design_materials: usize,
    pub prints: usize,
    pub batches: usize,
}

type DesignMaterialKey = (RemoteId, RemoteId);

/// Imports metadata documents through an AM-Vision API
#[derive(Clone)]
pub struct Importer {
    api: Arc<dyn AmVisionApi>,
}

impl Importer {
    pub fn new(api: Arc<dyn AmVisionApi>) -> Self {
        Self { api }
    }

    /// Replace the static reference data: material references, views,
    /// print attributes and queries.
    pub async fn one_time_imports(&self, meta: &Metadata) -> Result<(), ImportError> {
        info!("Running one-time imports");
        self.api
            .put_material_references(&meta.material_references)
            .await?;
        self.api.put_views(&meta.views).await?;
        self.api.put_print_attributes(&meta.print_attributes).await?;
        self.api.put_queries(&meta.queries).await?;
        Ok(())
    }

    /// Load a metadata file and run the one-time imports
    pub async fn one_time_imports_from(&self, path: impl AsRef<Path>) -> Result<(), ImportError> {
        let meta = Metadata::load(path).await?;
        self.one_time_imports(&meta).await
    }

    /// Upload designs, design materials, prints and batches, then
    /// repopulate the batches.
    pub async fn import_all(&self, meta: &Metadata) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();

        if !meta.prints.is_empty() {
            let designs = self.upload_designs(meta, &mut report).await?;
            let materials = self.find_materials(meta).await?;
            let design_materials = self
                .upload_design_materials(meta, &designs, &materials, &mut report)
                .await?;
            self.upload_prints(meta, &designs, &materials, &design_materials, &mut report)
                .await?;
        }

        info!("Uploading batches");
        self.api.put_batches(&meta.batches).await?;
        report.batches = meta.batches.len();
        // batch membership is query based and must follow the print data
        self.api.populate_batches().await?;

        info!(
            designs_uploaded = report.designs_uploaded,
            designs_skipped = report.designs_skipped,
            design_materials = report.design_materials,
            prints = report.prints,
            batches = report.batches,
            "Import completed"
        );
        Ok(report)
    }

    /// Load a metadata file and run a full import
    pub async fn import_all_from(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<ImportReport, ImportError> {
        let meta = Metadata::load(path).await?;
        self.import_all(&meta).await
    }

    /// Map every model id to its design, uploading models AM-Vision lacks.
    async fn upload_designs(
        &self,
        meta: &Metadata,
        report: &mut ImportReport,
    ) -> Result<HashMap<String, RemoteId>, ImportError> {
        info!("Uploading designs");
        let model_ids = meta.model_ids();
        let mut designs = HashMap::new();
        for reference in self.api.search_design_references(&model_ids).await? {
            let design = reference
                .design
                .ok_or_else(|| ImportError::DesignMissing(reference.id.clone()))?;
            designs.insert(reference.id, design);
        }
        report.designs_skipped = model_ids
            .iter()
            .filter(|id| designs.contains_key(*id))
            .count();

        for print in &meta.prints {
            if designs.contains_key(&print.model_id) {
                continue;
            }
            let path = meta.model_path(print);
            let contents = tokio::fs::read(&path)
                .await
                .map_err(|source| ImportError::ModelFile {
                    path: path.clone(),
                    source,
                })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| print.model_id.clone());

            debug!(model_id = %print.model_id, path = ?path, "Uploading model");
            let reference = self
                .api
                .upload_design_reference(&print.model_id, &file_name, contents)
                .await?;
            let design = reference
                .design
                .ok_or_else(|| ImportError::DesignMissing(print.model_id.clone()))?;
            designs.insert(print.model_id.clone(), design);
            report.designs_uploaded += 1;
        }
        Ok(designs)
    }

    /// Map every local material id to its AM-Vision material
    async fn find_materials(
        &self,
        meta: &Metadata,
    ) -> Result<HashMap<String, RemoteId>, ImportError> {
        info!("Find materials");
        let material_ids = meta.material_ids();
        let references = self.api.search_material_references(&material_ids).await?;
        Ok(references
            .into_iter()
            .filter_map(|r| r.material.map(|m| (r.id, m)))
            .collect())
    }

    async fn upload_design_materials(
        &self,
        meta: &Metadata,
        designs: &HashMap<String, RemoteId>,
        materials: &HashMap<String, RemoteId>,
        report: &mut ImportReport,
    ) -> Result<HashMap<DesignMaterialKey, RemoteId>, ImportError> {
        info!("Uploading design materials");
        let mut seen = HashSet::new();
        let mut combinations = Vec::new();
        for print in &meta.prints {
            let key = resolve_key(&print.model_id, &print.material_id, designs, materials)?;
            if seen.insert(key.clone()) {
                combinations.push(DesignMaterial {
                    id: None,
                    design: key.0,
                    material: key.1,
                });
            }
        }

        let created = self.api.put_design_materials(&combinations).await?;
        report.design_materials = combinations.len();
        Ok(created
            .into_iter()
            .filter_map(|dm| dm.id.map(|id| ((dm.design, dm.material), id)))
            .collect())
    }

    async fn upload_prints(
        &self,
        meta: &Metadata,
        designs: &HashMap<String, RemoteId>,
        materials: &HashMap<String, RemoteId>,
        design_materials: &HashMap<DesignMaterialKey, RemoteId>,
        report: &mut ImportReport,
    ) -> Result<(), ImportError> {
        info!("Uploading prints");
        let mut prints = Vec::with_capacity(meta.prints.len());
        for print in &meta.prints {
            let key = resolve_key(&print.model_id, &print.material_id, designs, materials)?;
            let design_material = design_materials.get(&key).cloned().ok_or_else(|| {
                ImportError::UnknownDesignMaterial {
                    design: key.0.to_string(),
                    material: key.1.to_string(),
                }
            })?;
            prints.push(PrintUpload {
                id: print.raw_id(),
                copies: print.copies,
                title: print.title.clone(),
                attributes: print.record.clone(),
                design_material,
            });
        }

        self.api.put_prints(&prints).await?;
        report.prints = prints.len();
        Ok(())
    }
}

fn resolve_key(
    model_id: &str,
    material_id: &str,
    designs: &HashMap<String, RemoteId>,
    materials: &HashMap<String, RemoteId>,
) -> Result<DesignMaterialKey, ImportError> {
    let design = designs
        .get(model_id)
        .cloned()
        .ok_or_else(|| ImportError::DesignMissing(model_id.to_string()))?;
    let material = materials
        .get(material_id)
        .cloned()
        .ok_or_else(|| ImportError::UnknownMaterial(material_id.to_string()))?;
    Ok((design, material))
}
