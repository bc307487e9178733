//! In-memory AM-Vision API used by unit tests

use crate::api::AmVisionApi;
use crate::error::ApiError;
use crate::models::{
    Batch, DesignMaterial, DesignReference, MaterialReference, PrintAttribute, PrintUpload, Query,
    RemoteId, View, WebhookRegistration,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    /// Names of the trait methods in call order
    pub calls: Vec<String>,
    pub material_references: Vec<MaterialReference>,
    pub views: Vec<View>,
    pub print_attributes: Vec<PrintAttribute>,
    pub queries: Vec<Query>,
    pub designs: HashMap<String, RemoteId>,
    /// Design references that exist without a design attached
    pub orphan_references: HashSet<String>,
    pub uploads: Vec<(String, String, Vec<u8>)>,
    pub materials: HashMap<String, RemoteId>,
    pub design_materials: Vec<DesignMaterial>,
    pub prints: Vec<PrintUpload>,
    pub batches: Vec<Batch>,
    pub populations: usize,
    pub webhooks: Vec<WebhookRegistration>,
    pub reject_webhooks: bool,
    next_id: i64,
}

impl FakeState {
    fn next_id(&mut self, base: i64) -> RemoteId {
        self.next_id += 1;
        RemoteId::Int(base + self.next_id)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material(self, id: &str, material: i64) -> Self {
        self.state()
            .materials
            .insert(id.to_string(), RemoteId::Int(material));
        self
    }

    pub fn with_design(self, model_id: &str, design: i64) -> Self {
        self.state()
            .designs
            .insert(model_id.to_string(), RemoteId::Int(design));
        self
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn record(&self, call: &str) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls.push(call.to_string());
        state
    }
}

#[async_trait]
impl AmVisionApi for FakeApi {
    async fn put_material_references(
        &self,
        references: &[MaterialReference],
    ) -> Result<(), ApiError> {
        let mut state = self.record("put_material_references");
        for reference in references {
            if let Some(material) = &reference.material {
                state
                    .materials
                    .insert(reference.id.clone(), material.clone());
            }
        }
        state.material_references = references.to_vec();
        Ok(())
    }

    async fn put_views(&self, views: &[View]) -> Result<(), ApiError> {
        self.record("put_views").views = views.to_vec();
        Ok(())
    }

    async fn put_print_attributes(&self, attributes: &[PrintAttribute]) -> Result<(), ApiError> {
        self.record("put_print_attributes").print_attributes = attributes.to_vec();
        Ok(())
    }

    async fn put_queries(&self, queries: &[Query]) -> Result<(), ApiError> {
        self.record("put_queries").queries = queries.to_vec();
        Ok(())
    }

    async fn search_design_references(
        &self,
        model_ids: &[String],
    ) -> Result<Vec<DesignReference>, ApiError> {
        let state = self.record("search_design_references");
        Ok(model_ids
            .iter()
            .filter_map(|id| {
                if state.orphan_references.contains(id) {
                    return Some(DesignReference {
                        id: id.clone(),
                        design: None,
                    });
                }
                state.designs.get(id).map(|design| DesignReference {
                    id: id.clone(),
                    design: Some(design.clone()),
                })
            })
            .collect())
    }

    async fn upload_design_reference(
        &self,
        model_id: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<DesignReference, ApiError> {
        let mut state = self.record("upload_design_reference");
        let design = state.next_id(100);
        state.designs.insert(model_id.to_string(), design.clone());
        state
            .uploads
            .push((model_id.to_string(), file_name.to_string(), contents));
        Ok(DesignReference {
            id: model_id.to_string(),
            design: Some(design),
        })
    }

    async fn search_material_references(
        &self,
        material_ids: &[String],
    ) -> Result<Vec<MaterialReference>, ApiError> {
        let state = self.record("search_material_references");
        Ok(material_ids
            .iter()
            .filter_map(|id| {
                state.materials.get(id).map(|material| MaterialReference {
                    id: id.clone(),
                    material: Some(material.clone()),
                })
            })
            .collect())
    }

    async fn put_design_materials(
        &self,
        combinations: &[DesignMaterial],
    ) -> Result<Vec<DesignMaterial>, ApiError> {
        let mut state = self.record("put_design_materials");
        let mut stored = Vec::with_capacity(combinations.len());
        for combination in combinations {
            let existing = state
                .design_materials
                .iter()
                .find(|dm| dm.design == combination.design && dm.material == combination.material)
                .cloned();
            let dm = match existing {
                Some(dm) => dm,
                None => {
                    let dm = DesignMaterial {
                        id: Some(state.next_id(500)),
                        design: combination.design.clone(),
                        material: combination.material.clone(),
                    };
                    state.design_materials.push(dm.clone());
                    dm
                }
            };
            stored.push(dm);
        }
        Ok(stored)
    }

    async fn put_prints(&self, prints: &[PrintUpload]) -> Result<(), ApiError> {
        let mut state = self.record("put_prints");
        for print in prints {
            state.prints.retain(|p| p.id != print.id);
            state.prints.push(print.clone());
        }
        Ok(())
    }

    async fn put_batches(&self, batches: &[Batch]) -> Result<(), ApiError> {
        let mut state = self.record("put_batches");
        for batch in batches {
            state.batches.retain(|b| b.id != batch.id);
            state.batches.push(batch.clone());
        }
        Ok(())
    }

    async fn populate_batches(&self) -> Result<(), ApiError> {
        self.record("populate_batches").populations += 1;
        Ok(())
    }

    async fn register_webhook(&self, registration: &WebhookRegistration) -> Result<(), ApiError> {
        let mut state = self.record("register_webhook");
        if state.reject_webhooks {
            return Err(ApiError::Client {
                method: "POST".to_string(),
                url: "http://amv.test/webhook/".to_string(),
                status: 400,
                body: r#"{"target": ["invalid"]}"#.to_string(),
            });
        }
        state.webhooks.push(registration.clone());
        Ok(())
    }
}
