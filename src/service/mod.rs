//! Remote LCA services
//!
//! Wire types mirror the JSON the remote endpoints speak (camelCase). Every
//! response is validated here, at the boundary, before it becomes one of the
//! typed entities the wizard works with.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::categorize::CategoryTaxonomy;
use crate::entities::material::{MaterialClass, MaterialLine};
use crate::entities::process::{ManufacturingProcess, ProcessAssignment};
use crate::entities::product::ProductDraft;

pub use http::HttpLcaService;

/// Errors from remote service calls
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: &'static str, reason: String },
}

impl ServiceError {
    fn invalid(endpoint: &'static str, reason: impl Into<String>) -> Self {
        ServiceError::InvalidResponse {
            endpoint,
            reason: reason.into(),
        }
    }
}

// ===== Requests =====

/// Body for `POST /api/classify-bom`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BomClassificationRequest {
    pub name: String,
    pub description: String,
    pub product_code: String,
    pub weight: String,
}

impl BomClassificationRequest {
    pub fn from_draft(draft: &ProductDraft) -> Self {
        Self {
            name: draft.info.name.clone(),
            description: draft.info.description.clone(),
            product_code: draft.info.code.clone(),
            weight: draft.categorization.total_weight.clone(),
        }
    }
}

/// Body for `POST /api/classify-product`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductClassificationRequest {
    pub name: String,
    pub description: String,
    pub product_code: String,
}

impl ProductClassificationRequest {
    pub fn from_draft(draft: &ProductDraft) -> Self {
        Self {
            name: draft.info.name.clone(),
            description: draft.info.description.clone(),
            product_code: draft.info.code.clone(),
        }
    }
}

/// A material line as the remote API spells it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMaterial {
    pub material_class: String,
    pub specific_material: String,
    pub weight: String,
    pub unit: String,
}

impl From<&MaterialLine> for WireMaterial {
    fn from(line: &MaterialLine) -> Self {
        Self {
            material_class: line.material_class.to_string(),
            specific_material: line.specific_display().to_string(),
            weight: line.weight.clone(),
            unit: line.unit.to_string(),
        }
    }
}

/// Body for `POST /api/classify-manufacturing-process`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessClassificationRequest {
    pub product_code: String,
    pub name: String,
    pub description: String,
    pub bom: Vec<WireMaterial>,
}

impl ProcessClassificationRequest {
    pub fn from_draft(draft: &ProductDraft) -> Self {
        Self {
            product_code: draft.info.code.clone(),
            name: draft.info.name.clone(),
            description: draft.info.description.clone(),
            bom: draft.materials.iter().map(WireMaterial::from).collect(),
        }
    }
}

/// A process group as the remote API spells it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireProcessGroup {
    pub category: String,
    #[serde(default)]
    pub processes: Vec<String>,
}

impl From<&ProcessAssignment> for WireProcessGroup {
    fn from(assignment: &ProcessAssignment) -> Self {
        Self {
            category: assignment.manufacturing_process.to_string(),
            processes: assignment.sub_processes.clone(),
        }
    }
}

/// One material line with its processes, as sent on product creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMaterialProcesses {
    pub material_class: String,
    pub specific_material: String,
    pub weight: String,
    pub manufacturing_processes: Vec<WireProcessGroup>,
}

/// Body for `POST /api/products`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub code: String,
    pub name: String,
    pub description: String,
    pub weight: String,
    pub category: String,
    pub sub_category: String,
    pub brand_name: String,
    pub supplier_name: String,
    pub country_of_origin: String,
    pub materials: Vec<WireMaterial>,
    pub product_manufacturing_process: Vec<WireMaterialProcesses>,
}

impl ProductPayload {
    pub fn from_draft(draft: &ProductDraft) -> Self {
        let c = &draft.categorization;
        Self {
            code: draft.info.code.clone(),
            name: draft.info.name.clone(),
            description: draft.info.description.clone(),
            weight: c.total_weight.clone(),
            category: c.category.clone(),
            sub_category: c.sub_category.clone(),
            brand_name: c.brand_name.clone(),
            supplier_name: c.supplier_name.clone(),
            country_of_origin: c.country.map(|c| c.code().to_string()).unwrap_or_default(),
            materials: draft.materials.iter().map(WireMaterial::from).collect(),
            product_manufacturing_process: draft
                .materials
                .iter()
                .enumerate()
                .map(|(i, line)| WireMaterialProcesses {
                    material_class: line.material_class.to_string(),
                    specific_material: line.specific_display().to_string(),
                    weight: line.weight.clone(),
                    manufacturing_processes: draft
                        .processes_for(i)
                        .iter()
                        .map(WireProcessGroup::from)
                        .collect(),
                })
                .collect(),
        }
    }
}

// ===== Responses =====

/// Raw `classify-bom` item before validation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterial {
    pub material_class: String,
    #[serde(default)]
    pub specific_material: Option<String>,
    #[serde(default)]
    pub weight: Option<serde_json::Value>,
}

/// Raw `classify-product` response before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategorySuggestion {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// Raw `classify-manufacturing-process` item before validation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterialProcesses {
    pub material_class: String,
    #[serde(default)]
    pub manufacturing_processes: Vec<WireProcessGroup>,
}

/// Validated process suggestion for every line of one material class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialProcesses {
    pub material_class: MaterialClass,
    pub assignments: Vec<ProcessAssignment>,
}

/// Weights arrive as numbers or strings; normalise to a string
fn weight_to_string(value: Option<&serde_json::Value>) -> Result<String, String> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("weight must be a number or string, got {}", other)),
    }
}

/// Validate a `classify-bom` response. Any bad item rejects the whole list.
pub fn materials_from_wire(items: Vec<RawMaterial>) -> Result<Vec<MaterialLine>, ServiceError> {
    const ENDPOINT: &str = "classify-bom";
    items
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let class: MaterialClass = raw
                .material_class
                .parse()
                .map_err(|e| ServiceError::invalid(ENDPOINT, format!("item {}: {}", i, e)))?;
            let weight = weight_to_string(raw.weight.as_ref())
                .map_err(|e| ServiceError::invalid(ENDPOINT, format!("item {}: {}", i, e)))?;
            MaterialLine::new(class, raw.specific_material.as_deref(), &weight)
                .map_err(|e| ServiceError::invalid(ENDPOINT, format!("item {}: {}", i, e)))
        })
        .collect()
}

/// Validate a `classify-manufacturing-process` response
pub fn processes_from_wire(
    items: Vec<RawMaterialProcesses>,
) -> Result<Vec<MaterialProcesses>, ServiceError> {
    const ENDPOINT: &str = "classify-manufacturing-process";
    items
        .into_iter()
        .map(|raw| {
            let material_class: MaterialClass = raw
                .material_class
                .parse()
                .map_err(|e| ServiceError::invalid(ENDPOINT, format!("{}", e)))?;
            let assignments = raw
                .manufacturing_processes
                .iter()
                .map(|group| {
                    let process: ManufacturingProcess = group.category.parse()?;
                    ProcessAssignment::new(process, &group.processes)
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    ServiceError::invalid(ENDPOINT, format!("{}: {}", material_class, e))
                })?;
            Ok(MaterialProcesses {
                material_class,
                assignments,
            })
        })
        .collect()
}

/// A product as listed by `GET /api/products`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProduct {
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: String,
    #[serde(default)]
    pub country_of_origin: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub co2_emission: String,
}

impl RemoteProduct {
    /// Product code, falling back to the listing title
    pub fn code(&self) -> &str {
        if self.product_code.is_empty() {
            &self.title
        } else {
            &self.product_code
        }
    }

    /// Case-insensitive filter. `search` looks at code, name and category;
    /// `category` must be contained in the product's category.
    pub fn matches(&self, search: Option<&str>, category: Option<&str>) -> bool {
        let contains =
            |field: &str, needle: &str| field.to_lowercase().contains(&needle.to_lowercase());
        let search_ok = search.is_none_or(|q| {
            contains(self.code(), q) || contains(&self.name, q) || contains(&self.category, q)
        });
        let category_ok = category.is_none_or(|c| contains(&self.category, c));
        search_ok && category_ok
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    weight_to_string(value.as_ref()).map_err(serde::de::Error::custom)
}

/// The remote LCA endpoints
#[async_trait]
pub trait LcaService: Send + Sync {
    /// Suggest a bill of materials for the product
    async fn classify_bom(
        &self,
        request: &BomClassificationRequest,
    ) -> Result<Vec<MaterialLine>, ServiceError>;

    /// Fetch the category → sub-category taxonomy
    async fn product_categories(&self) -> Result<CategoryTaxonomy, ServiceError>;

    /// Suggest a category and sub-category for the product
    async fn classify_product(
        &self,
        request: &ProductClassificationRequest,
    ) -> Result<CategorySuggestion, ServiceError>;

    /// Suggest manufacturing processes per material class
    async fn classify_processes(
        &self,
        request: &ProcessClassificationRequest,
    ) -> Result<Vec<MaterialProcesses>, ServiceError>;

    /// Create the product remotely; returns the created record as sent back
    async fn submit_product(&self, payload: &ProductPayload)
        -> Result<serde_json::Value, ServiceError>;

    /// Products already stored by the remote service
    async fn list_products(&self) -> Result<Vec<RemoteProduct>, ServiceError>;
}
