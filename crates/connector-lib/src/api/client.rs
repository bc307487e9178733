//! HTTP client for the AM-Vision API
//!
//! Every request carries the `Authorization: Token <token>` header and is
//! logged with its latency. Client errors (4xx) additionally log the
//! response body as a warning. There are no retries.

use super::{collections, AmVisionApi};
use crate::error::ApiError;
use crate::models::{
    Batch, DesignMaterial, DesignReference, MaterialReference, PrintAttribute, PrintUpload, Query,
    SearchPage, View, WebhookRegistration,
};
use crate::observability::ConnectorMetrics;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

/// Authenticated client for the AM-Vision REST API
pub struct ApiClient {
    client: Client,
    base_url: Url,
    auth_header: String,
    metrics: ConnectorMetrics,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, token: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url).map_err(|source| ApiError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url,
            auth_header: format!("Token {}", token),
            metrics: ConnectorMetrics::new(),
        })
    }

    /// Get the normalized base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/<segment>/<segment>/.../`
    pub fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let path: String = segments
            .iter()
            .map(|s| format!("{}/", s.trim_matches('/')))
            .collect();
        self.base_url.join(&path).map_err(|source| ApiError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            source,
        })
    }

    /// Fetch a collection, or one item of it
    pub async fn get(&self, collection: &str, id: Option<&str>) -> Result<Value, ApiError> {
        let url = match id {
            Some(id) => self.url(&[collection, id])?,
            None => self.url(&[collection])?,
        };
        let builder = self.client.get(url.clone());
        self.send(builder, Method::GET, &url).await
    }

    /// Create a single item
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        collection: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.url(&[collection])?;
        let builder = self.client.post(url.clone()).json(body);
        self.send(builder, Method::POST, &url).await
    }

    /// Bulk upsert or replace items
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        collection: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.url(&[collection])?;
        let builder = self.client.put(url.clone()).json(body);
        self.send(builder, Method::PUT, &url).await
    }

    /// Search a collection for a set of identifiers, requesting them all in one page
    pub async fn search(&self, collection: &str, ids: &[String]) -> Result<Value, ApiError> {
        let url = self.url(&[collection, "search"])?;
        let builder = self
            .client
            .post(url.clone())
            .query(&[("page_size", ids.len())])
            .json(&json!({ "id": ids.join(",") }));
        self.send(builder, Method::POST, &url).await
    }

    /// Trigger a side-effecting action on a collection
    pub async fn action(&self, collection: &str, action: &str) -> Result<Value, ApiError> {
        let url = self.url(&[collection, action])?;
        let builder = self.client.post(url.clone());
        self.send(builder, Method::POST, &url).await
    }

    /// Create an item from text fields plus one uploaded file
    pub async fn upload(
        &self,
        collection: &str,
        fields: &[(&str, &str)],
        file_field: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Value, ApiError> {
        let url = self.url(&[collection])?;
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        form = form.part(
            file_field.to_string(),
            Part::bytes(contents).file_name(file_name.to_string()),
        );
        let builder = self.client.post(url.clone()).multipart(form);
        self.send(builder, Method::POST, &url).await
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: Method,
        url: &Url,
    ) -> Result<Value, ApiError> {
        let start = Instant::now();
        let response = builder
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let elapsed = start.elapsed();
        info!(
            "[AM-Vision API] {} {} {} {}ms",
            method,
            url,
            status.as_u16(),
            elapsed.as_millis()
        );
        self.metrics
            .observe_api_request(method.as_str(), status.as_u16(), elapsed.as_secs_f64());

        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        if status.is_client_error() {
            warn!(status = status.as_u16(), body = %body, "AM-Vision error message");
            return Err(ApiError::Client {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        if status.is_server_error() {
            return Err(ApiError::Server {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn decode<T: DeserializeOwned>(&self, collection: &str, value: Value) -> Result<T, ApiError> {
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            url: format!("{}{}/", self.base_url, collection),
            source,
        })
    }
}

#[async_trait]
impl AmVisionApi for ApiClient {
    async fn put_material_references(
        &self,
        references: &[MaterialReference],
    ) -> Result<(), ApiError> {
        self.put(collections::MATERIAL_REFERENCE, references).await?;
        Ok(())
    }

    async fn put_views(&self, views: &[View]) -> Result<(), ApiError> {
        self.put(collections::VIEW, views).await?;
        Ok(())
    }

    async fn put_print_attributes(&self, attributes: &[PrintAttribute]) -> Result<(), ApiError> {
        self.put(collections::PRINT_ATTRIBUTE, attributes).await?;
        Ok(())
    }

    async fn put_queries(&self, queries: &[Query]) -> Result<(), ApiError> {
        self.put(collections::QUERY, queries).await?;
        Ok(())
    }

    async fn search_design_references(
        &self,
        model_ids: &[String],
    ) -> Result<Vec<DesignReference>, ApiError> {
        let value = self.search(collections::DESIGN_REFERENCE, model_ids).await?;
        let page: SearchPage<DesignReference> =
            self.decode(collections::DESIGN_REFERENCE, value)?;
        Ok(page.results)
    }

    async fn upload_design_reference(
        &self,
        model_id: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<DesignReference, ApiError> {
        let value = self
            .upload(
                collections::DESIGN_REFERENCE,
                &[("id", model_id)],
                "stl",
                file_name,
                contents,
            )
            .await?;
        self.decode(collections::DESIGN_REFERENCE, value)
    }

    async fn search_material_references(
        &self,
        material_ids: &[String],
    ) -> Result<Vec<MaterialReference>, ApiError> {
        let value = self
            .search(collections::MATERIAL_REFERENCE, material_ids)
            .await?;
        let page: SearchPage<MaterialReference> =
            self.decode(collections::MATERIAL_REFERENCE, value)?;
        Ok(page.results)
    }

    async fn put_design_materials(
        &self,
        combinations: &[DesignMaterial],
    ) -> Result<Vec<DesignMaterial>, ApiError> {
        let value = self.put(collections::DESIGN_MATERIAL, combinations).await?;
        self.decode(collections::DESIGN_MATERIAL, value)
    }

    async fn put_prints(&self, prints: &[PrintUpload]) -> Result<(), ApiError> {
        self.put(collections::PRINT, prints).await?;
        Ok(())
    }

    async fn put_batches(&self, batches: &[Batch]) -> Result<(), ApiError> {
        self.put(collections::BATCH, batches).await?;
        Ok(())
    }

    async fn populate_batches(&self) -> Result<(), ApiError> {
        self.action(collections::BATCH, "populate_all").await?;
        Ok(())
    }

    async fn register_webhook(&self, registration: &WebhookRegistration) -> Result<(), ApiError> {
        self.post(collections::WEBHOOK, registration).await?;
        Ok(())
    }
}
