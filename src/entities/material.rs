//! Bill-of-materials line items

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Material class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialClass {
    Wood,
    Metal,
    Plastic,
}

impl MaterialClass {
    pub const ALL: [MaterialClass; 3] = [MaterialClass::Wood, MaterialClass::Metal, MaterialClass::Plastic];

    /// Specific materials that may be chosen for this class
    pub fn specific_materials(&self) -> &'static [&'static str] {
        match self {
            MaterialClass::Wood => &["Oak", "Maple"],
            MaterialClass::Metal => &["Stainless Steel", "Aluminium"],
            MaterialClass::Plastic => &["Polypropylene", "Polyvinyl Chloride"],
        }
    }

    /// Look up a specific material by name (case-insensitive), returning the canonical spelling
    pub fn find_specific(&self, name: &str) -> Option<&'static str> {
        self.specific_materials()
            .iter()
            .copied()
            .find(|m| m.eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for MaterialClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialClass::Wood => write!(f, "Wood"),
            MaterialClass::Metal => write!(f, "Metal"),
            MaterialClass::Plastic => write!(f, "Plastic"),
        }
    }
}

impl std::str::FromStr for MaterialClass {
    type Err = MaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wood" => Ok(MaterialClass::Wood),
            "metal" => Ok(MaterialClass::Metal),
            "plastic" => Ok(MaterialClass::Plastic),
            _ => Err(MaterialError::UnknownClass(s.to_string())),
        }
    }
}

/// Mass unit. Only kilograms are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    #[default]
    Kg,
}

impl std::fmt::Display for MassUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MassUnit::Kg => write!(f, "kg"),
        }
    }
}

impl std::str::FromStr for MassUnit {
    type Err = MaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(MassUnit::Kg),
            _ => Err(MaterialError::UnknownUnit(s.to_string())),
        }
    }
}

/// Errors raised while building material lines
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaterialError {
    #[error("Unknown material class '{0}'. Use Wood, Metal, or Plastic")]
    UnknownClass(String),

    #[error("'{material}' is not a {class} material (expected one of: {options})")]
    SpecificMismatch {
        class: MaterialClass,
        material: String,
        options: String,
    },

    #[error("Weight must be a non-negative number, got '{0}'")]
    InvalidWeight(String),

    #[error("Unknown unit '{0}'. Only 'kg' is supported")]
    UnknownUnit(String),

    #[error("Material spec '{0}' must look like CLASS[:MATERIAL[:WEIGHT]]")]
    BadSpec(String),
}

/// Check that a weight string is empty or a finite non-negative number
pub fn validate_weight(weight: &str) -> Result<String, MaterialError> {
    let trimmed = weight.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(trimmed.to_string()),
        _ => Err(MaterialError::InvalidWeight(weight.to_string())),
    }
}

/// One line of the bill of materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub material_class: MaterialClass,

    /// Specific material, always a member of the class's list when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_material: Option<String>,

    /// Weight as entered (numeric string, may be empty)
    #[serde(default)]
    pub weight: String,

    #[serde(default)]
    pub unit: MassUnit,
}

impl MaterialLine {
    /// Build a validated material line
    pub fn new(
        material_class: MaterialClass,
        specific_material: Option<&str>,
        weight: &str,
    ) -> Result<Self, MaterialError> {
        let specific_material = match specific_material.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(name) => Some(
                material_class
                    .find_specific(name)
                    .ok_or_else(|| MaterialError::SpecificMismatch {
                        class: material_class,
                        material: name.to_string(),
                        options: material_class.specific_materials().join(", "),
                    })?
                    .to_string(),
            ),
        };

        Ok(Self {
            material_class,
            specific_material,
            weight: validate_weight(weight)?,
            unit: MassUnit::Kg,
        })
    }

    /// Weight in kilograms, if one was entered
    pub fn weight_kg(&self) -> Option<f64> {
        self.weight.parse().ok()
    }

    /// Specific material for display ("" when unset)
    pub fn specific_display(&self) -> &str {
        self.specific_material.as_deref().unwrap_or("")
    }
}

impl std::str::FromStr for MaterialLine {
    type Err = MaterialError;

    /// Parse `CLASS[:MATERIAL[:WEIGHT]]`, e.g. `Wood:Oak:2.5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.is_empty() || parts.len() > 3 || parts[0].trim().is_empty() {
            return Err(MaterialError::BadSpec(s.to_string()));
        }
        let class: MaterialClass = parts[0].parse()?;
        let specific = parts.get(1).copied();
        let weight = parts.get(2).copied().unwrap_or("");
        MaterialLine::new(class, specific, weight)
    }
}
