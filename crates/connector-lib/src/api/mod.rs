//! AM-Vision REST API access
//!
//! `AmVisionApi` names every resource/verb combination the connector uses.
//! `ApiClient` implements it on top of a generic collection + verb request
//! builder, so importers and webhook dispatchers only depend on the trait.

mod client;

pub use client::ApiClient;

use crate::error::ApiError;
use crate::models::{
    Batch, DesignMaterial, DesignReference, MaterialReference, PrintAttribute, PrintUpload, Query,
    View, WebhookRegistration,
};
use async_trait::async_trait;

/// Remote collection names
pub mod collections {
    pub const MATERIAL_REFERENCE: &str = "material_reference";
    pub const VIEW: &str = "view";
    pub const PRINT_ATTRIBUTE: &str = "print_attribute";
    pub const QUERY: &str = "query";
    pub const DESIGN_REFERENCE: &str = "design_reference";
    pub const DESIGN_MATERIAL: &str = "design_material";
    pub const PRINT: &str = "print";
    pub const BATCH: &str = "batch";
    pub const WEBHOOK: &str = "webhook";
}

/// Operations offered by the AM-Vision API
#[async_trait]
pub trait AmVisionApi: Send + Sync {
    /// Replace all material references
    async fn put_material_references(&self, references: &[MaterialReference])
        -> Result<(), ApiError>;

    /// Replace all views
    async fn put_views(&self, views: &[View]) -> Result<(), ApiError>;

    /// Replace all print attributes
    async fn put_print_attributes(&self, attributes: &[PrintAttribute]) -> Result<(), ApiError>;

    /// Replace all queries
    async fn put_queries(&self, queries: &[Query]) -> Result<(), ApiError>;

    /// Look up design references by local model id
    async fn search_design_references(
        &self,
        model_ids: &[String],
    ) -> Result<Vec<DesignReference>, ApiError>;

    /// Upload a model file, creating its design reference
    async fn upload_design_reference(
        &self,
        model_id: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<DesignReference, ApiError>;

    /// Look up material references by local material id
    async fn search_material_references(
        &self,
        material_ids: &[String],
    ) -> Result<Vec<MaterialReference>, ApiError>;

    /// Upsert design/material combinations, returning them with their ids
    async fn put_design_materials(
        &self,
        combinations: &[DesignMaterial],
    ) -> Result<Vec<DesignMaterial>, ApiError>;

    /// Upsert prints
    async fn put_prints(&self, prints: &[PrintUpload]) -> Result<(), ApiError>;

    /// Upsert batches
    async fn put_batches(&self, batches: &[Batch]) -> Result<(), ApiError>;

    /// Recompute the membership of every batch
    async fn populate_batches(&self) -> Result<(), ApiError>;

    /// Ask AM-Vision to deliver an event to a callback URL
    async fn register_webhook(&self, registration: &WebhookRegistration) -> Result<(), ApiError>;
}
