//! Product entity - the aggregate assembled by the product wizard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::material::MaterialLine;
use crate::entities::process::ProcessAssignment;

/// Process assignments keyed by position in the material list
pub type ProcessPlan = BTreeMap<usize, Vec<ProcessAssignment>>;

/// Country of manufacture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "CN")]
    China,
    #[serde(rename = "VD")]
    Vietnam,
    #[serde(rename = "GL")]
    Global,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::China, Country::Vietnam, Country::Global];

    pub fn code(&self) -> &'static str {
        match self {
            Country::China => "CN",
            Country::Vietnam => "VD",
            Country::Global => "GL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Country::China => "China",
            Country::Vietnam => "Vietnam",
            Country::Global => "Global",
        }
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Country::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s) || c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid country: {}. Use CN, VD, or GL", s))
    }
}

/// Step 1: basic product information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ProductInfo {
    pub fn new(code: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Code and name are required before the step may advance
    pub fn is_complete(&self) -> bool {
        !self.code.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// Step 2: categorization and supply details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategoryInfo {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub number_of_units: String,
    #[serde(default)]
    pub total_weight: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
}

/// In-progress product owned by the wizard controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(default)]
    pub info: ProductInfo,

    #[serde(default)]
    pub categorization: ProductCategoryInfo,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialLine>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub processes_by_material_index: ProcessPlan,
}

impl ProductDraft {
    /// Processes assigned to the material at `index`
    pub fn processes_for(&self, index: usize) -> &[ProcessAssignment] {
        self.processes_by_material_index
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A stored product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: EntityId,

    pub info: ProductInfo,

    #[serde(default)]
    pub categorization: ProductCategoryInfo,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialLine>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub processes_by_material_index: ProcessPlan,

    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who ran the wizard)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Product {
    const PREFIX: &'static str = "PRD";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.info.name
    }

    fn status(&self) -> &str {
        match self.status {
            Status::Draft => "draft",
            Status::Submitted => "submitted",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Product {
    /// Freeze a finished draft into a storable product
    pub fn from_draft(draft: ProductDraft, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Prd),
            info: draft.info,
            categorization: draft.categorization,
            materials: draft.materials,
            processes_by_material_index: draft.processes_by_material_index,
            status: Status::default(),
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// Rebuild the draft view (used for summaries of stored products)
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            info: self.info.clone(),
            categorization: self.categorization.clone(),
            materials: self.materials.clone(),
            processes_by_material_index: self.processes_by_material_index.clone(),
        }
    }
}
