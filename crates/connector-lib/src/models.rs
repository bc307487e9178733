//! Core data models exchanged with the AM-Vision API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Identifier assigned by the AM-Vision API (numeric or textual)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Int(i64),
    Str(String),
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Int(id) => write!(f, "{}", id),
            RemoteId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RemoteId {
    fn from(id: i64) -> Self {
        RemoteId::Int(id)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        RemoteId::Str(id.to_string())
    }
}

/// Accepts local identifiers written either as strings or as integers.
pub(crate) fn local_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(i) => i.to_string(),
    })
}

/// A page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage<T> {
    pub results: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Maps a local material identifier to an AM-Vision material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialReference {
    #[serde(deserialize_with = "local_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<RemoteId>,
}

/// Maps a local model identifier to an uploaded AM-Vision design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReference {
    #[serde(deserialize_with = "local_id")]
    pub id: String,
    #[serde(default)]
    pub design: Option<RemoteId>,
}

/// A (design, material) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub design: RemoteId,
    pub material: RemoteId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    #[serde(deserialize_with = "local_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Column definition for print attributes shown in AM-Vision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintAttribute {
    #[serde(deserialize_with = "local_id")]
    pub id: String,
    pub datatype: String,
    pub field: String,
    #[serde(default)]
    pub filtering: bool,
    #[serde(default)]
    pub summary: bool,
    #[serde(default)]
    pub detail: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(deserialize_with = "local_id")]
    pub id: String,
    pub query: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A print job as described in the metadata file.
///
/// The typed fields drive the import; `record` is the entry exactly as
/// read and is what gets serialized back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct PrintRecord {
    pub id: String,
    pub title: String,
    pub copies: u32,
    pub model_id: String,
    /// Model file path, relative to the metadata file
    pub model_fn: PathBuf,
    pub material_id: String,
    pub record: Value,
}

#[derive(Deserialize)]
struct PrintFields {
    #[serde(deserialize_with = "local_id")]
    id: String,
    title: String,
    copies: u32,
    #[serde(deserialize_with = "local_id")]
    model_id: String,
    model_fn: PathBuf,
    #[serde(deserialize_with = "local_id")]
    material_id: String,
}

impl PrintRecord {
    /// The print's `id` as written in the metadata file
    pub fn raw_id(&self) -> Value {
        self.record.get("id").cloned().unwrap_or(Value::Null)
    }
}

impl TryFrom<Value> for PrintRecord {
    type Error = serde_json::Error;

    fn try_from(record: Value) -> Result<Self, Self::Error> {
        let fields = PrintFields::deserialize(&record)?;
        Ok(Self {
            id: fields.id,
            title: fields.title,
            copies: fields.copies,
            model_id: fields.model_id,
            model_fn: fields.model_fn,
            material_id: fields.material_id,
            record,
        })
    }
}

impl From<PrintRecord> for Value {
    fn from(print: PrintRecord) -> Self {
        print.record
    }
}

/// Print payload sent to the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintUpload {
    pub id: Value,
    pub copies: u32,
    pub title: String,
    pub attributes: Value,
    pub design_material: RemoteId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(deserialize_with = "local_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Webhook subscription for a single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub event: String,
    pub target: String,
}
