//! Product categorization step
//!
//! Categories come from a remote taxonomy; the sub-category list is derived
//! from the chosen category. An assisted suggestion may pre-fill both.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::cancel::CancelToken;
use crate::entities::material::validate_weight;
use crate::entities::product::{Country, ProductCategoryInfo};
use crate::service::{CategorySuggestion, LcaService, ProductClassificationRequest};

/// Category → sub-categories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTaxonomy(pub BTreeMap<String, Vec<String>>);

impl CategoryTaxonomy {
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn sub_categories(&self, category: &str) -> &[String] {
        self.0.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.contains_key(category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Errors raised by categorization inputs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("'{sub_category}' is not a sub-category of '{category}'")]
    SubCategoryMismatch { category: String, sub_category: String },

    #[error("Select a category before choosing a sub-category")]
    NoCategory,

    #[error("{field} must be a non-negative number, got '{value}'")]
    NotNumeric { field: &'static str, value: String },
}

/// Editable copy of the categorization slice of the draft
#[derive(Debug, Clone, Default)]
pub struct CategorizationForm {
    taxonomy: CategoryTaxonomy,
    data: ProductCategoryInfo,
}

impl CategorizationForm {
    pub fn new(taxonomy: CategoryTaxonomy, initial: ProductCategoryInfo) -> Self {
        Self {
            taxonomy,
            data: initial,
        }
    }

    pub fn taxonomy(&self) -> &CategoryTaxonomy {
        &self.taxonomy
    }

    pub fn data(&self) -> &ProductCategoryInfo {
        &self.data
    }

    /// Sub-categories offered for the current category
    pub fn sub_category_options(&self) -> &[String] {
        self.taxonomy.sub_categories(&self.data.category)
    }

    /// Choose a category; always clears the sub-category.
    /// With an empty taxonomy any free-text category is accepted.
    pub fn select_category(&mut self, category: &str) -> Result<(), CategoryError> {
        if !self.taxonomy.is_empty() && !self.taxonomy.contains(category) {
            return Err(CategoryError::UnknownCategory(category.to_string()));
        }
        self.data.category = category.to_string();
        self.data.sub_category.clear();
        Ok(())
    }

    pub fn select_sub_category(&mut self, sub_category: &str) -> Result<(), CategoryError> {
        if self.data.category.is_empty() {
            return Err(CategoryError::NoCategory);
        }
        if !self.taxonomy.is_empty()
            && !self.sub_category_options().iter().any(|s| s == sub_category)
        {
            return Err(CategoryError::SubCategoryMismatch {
                category: self.data.category.clone(),
                sub_category: sub_category.to_string(),
            });
        }
        self.data.sub_category = sub_category.to_string();
        Ok(())
    }

    pub fn set_number_of_units(&mut self, value: &str) -> Result<(), CategoryError> {
        self.data.number_of_units = numeric("Number of units", value)?;
        Ok(())
    }

    pub fn set_total_weight(&mut self, value: &str) -> Result<(), CategoryError> {
        self.data.total_weight = numeric("Total weight", value)?;
        Ok(())
    }

    pub fn set_brand_name(&mut self, value: &str) {
        self.data.brand_name = value.trim().to_string();
    }

    pub fn set_supplier_name(&mut self, value: &str) {
        self.data.supplier_name = value.trim().to_string();
    }

    pub fn set_country(&mut self, country: Option<Country>) {
        self.data.country = country;
    }

    /// Apply a suggestion, keeping only the parts the taxonomy knows.
    /// Returns true when the category was taken.
    pub fn apply_suggestion(&mut self, suggestion: &CategorySuggestion) -> bool {
        let Some(category) = suggestion.category.as_deref().filter(|c| !c.is_empty()) else {
            return false;
        };
        if self.select_category(category).is_err() {
            debug!(category, "suggested category not in taxonomy");
            return false;
        }
        if let Some(sub) = suggestion.subcategory.as_deref().filter(|s| !s.is_empty()) {
            if self.select_sub_category(sub).is_err() {
                debug!(sub_category = sub, "suggested sub-category not in taxonomy");
            }
        }
        true
    }

    /// Ask the classifier for a suggestion and apply it.
    /// Failures are logged and leave the form unchanged.
    pub async fn suggest(
        &mut self,
        service: &dyn LcaService,
        request: &ProductClassificationRequest,
        cancel: &CancelToken,
    ) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            r = service.classify_product(request) => r,
        };
        match result {
            Ok(suggestion) => self.apply_suggestion(&suggestion),
            Err(e) => {
                warn!(error = %e, "product classification failed");
                false
            }
        }
    }

    pub fn finish(&self) -> ProductCategoryInfo {
        self.data.clone()
    }
}

fn numeric(field: &'static str, value: &str) -> Result<String, CategoryError> {
    validate_weight(value).map_err(|_| CategoryError::NotNumeric {
        field,
        value: value.to_string(),
    })
}
