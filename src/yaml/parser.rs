//! Typed YAML loading with located errors

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse `content` as `T`; `filename` only labels the diagnostic
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, content, filename).into())
}

pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::Product;
    use crate::entities::MaterialClass;

    const PRODUCT: &str = r#"
id: PRD-01HZX3V6JQ2M4N5P6R7S8T9V0W
info:
  code: P1
  name: Chair
  description: Wood chair
materials:
  - material_class: Wood
    specific_material: Oak
    weight: "2.5"
    unit: kg
status: draft
created: 2024-01-01T00:00:00Z
author: tester
"#;

    #[test]
    fn test_parse_product() {
        let product: Product = parse_yaml(PRODUCT, "PRD.lca.yaml").unwrap();
        assert_eq!(product.info.name, "Chair");
        assert_eq!(product.materials[0].material_class, MaterialClass::Wood);
        assert!(product.processes_by_material_index.is_empty());
    }

    #[test]
    fn test_unknown_material_class_is_syntax_error() {
        let bad = PRODUCT.replace("material_class: Wood", "material_class: Glass");
        let err = parse_yaml::<Product>(&bad, "PRD.lca.yaml").unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_yaml_file::<Product>(Path::new("/nonexistent/PRD.lca.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io(_)));
    }
}
