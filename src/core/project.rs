//! Project discovery and the on-disk product store
//!
//! A project is any directory containing `.lca/`. Products live under
//! `products/` as one `<ID>.lca.yaml` file each.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::entity::Entity;
use crate::entities::product::Product;
use crate::yaml::{parse_yaml_file, YamlError};

/// Marker directory for a project root
pub const PROJECT_DIR: &str = ".lca";

pub const PRODUCTS_DIR: &str = "products";

pub const PRODUCT_EXTENSION: &str = ".lca.yaml";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not inside an LCA project (no .lca/ found in {0} or any parent). Run `lca init` first")]
    NotFound(PathBuf),

    #[error("An LCA project already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("No product matches '{0}'")]
    ProductNotFound(String),

    #[error("'{query}' matches {count} products; use more of the ID")]
    Ambiguous { query: String, count: usize },

    #[error("Failed to serialize product: {0}")]
    Serialize(#[from] serde_yml::Error),

    #[error(transparent)]
    Yaml(#[from] YamlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Walk up from the current directory to the nearest project root
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_DIR).is_dir())
            .map(|root| Self {
                root: root.to_path_buf(),
            })
            .ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create the project skeleton in `root`
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        if root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }
        fs::create_dir_all(root.join(PROJECT_DIR))?;
        fs::create_dir_all(root.join(PRODUCTS_DIR))?;
        fs::write(
            root.join(PROJECT_DIR).join("config.yaml"),
            "# LCA project configuration\n# author: Your Name\n# api_base_url: http://localhost:8000\n",
        )?;
        debug!(root = %root.display(), "initialized project");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("config.yaml")
    }

    pub fn products_dir(&self) -> PathBuf {
        self.root.join(PRODUCTS_DIR)
    }

    pub fn product_path(&self, product: &Product) -> PathBuf {
        self.products_dir()
            .join(format!("{}{}", product.id(), PRODUCT_EXTENSION))
    }

    /// Every `*.lca.yaml` under `products/`, sorted by path
    pub fn iter_product_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(self.products_dir())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(PRODUCT_EXTENSION))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    pub fn save_product(&self, product: &Product) -> Result<PathBuf, ProjectError> {
        fs::create_dir_all(self.products_dir())?;
        let path = self.product_path(product);
        fs::write(&path, serde_yml::to_string(product)?)?;
        debug!(path = %path.display(), "saved product");
        Ok(path)
    }

    pub fn load_product(&self, path: &Path) -> Result<Product, ProjectError> {
        Ok(parse_yaml_file(path)?)
    }

    /// Load every stored product, skipping unreadable files with a warning
    pub fn load_products(&self) -> Vec<Product> {
        self.iter_product_files()
            .into_iter()
            .filter_map(|path| match self.load_product(&path) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable product");
                    None
                }
            })
            .collect()
    }

    /// Resolve a product by full ID, ID prefix or product code
    pub fn find_product(&self, query: &str) -> Result<Product, ProjectError> {
        let q = query.trim().to_uppercase();
        let mut matches: Vec<Product> = self
            .load_products()
            .into_iter()
            .filter(|p| {
                let id = p.id().to_string();
                id == q || id.starts_with(&q) || p.info.code.eq_ignore_ascii_case(query.trim())
            })
            .collect();
        match matches.len() {
            0 => Err(ProjectError::ProductNotFound(query.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(ProjectError::Ambiguous {
                query: query.to_string(),
                count,
            }),
        }
    }
}
