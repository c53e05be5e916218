use crate::model::{validate_catalog, Catalog};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// Catalog location: `BAZAAR_TUI_CATALOG` when set, otherwise the bundled
/// demo file next to the binary's working directory.
pub fn catalog_path() -> PathBuf {
    std::env::var("BAZAAR_TUI_CATALOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/catalog.yaml"))
}

pub fn parse_catalog(text: &str) -> Result<Catalog> {
    let catalog: Catalog = serde_yaml::from_str(text).context("malformed catalog YAML")?;
    validate_catalog(&catalog).map_err(|e| anyhow!(e))?;
    Ok(catalog)
}

pub fn load_default() -> Result<Catalog> {
    let path = catalog_path();
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    parse_catalog(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParamType;

    #[test]
    fn parses_a_catalog_with_published_parameters() {
        let yaml = r#"
assets:
  - did: "did:op:abc"
    name: "Gradient Boost Trainer"
    price: "0"
    symbol: "GBT"
    parameters:
      - type: text
        name: iterations
        label: Iterations
        description: "Number of boosting rounds."
        required: true
        default: "100"
      - type: select
        name: loss
        label: "Loss function"
        description: ""
        required: false
        default: ""
        options:
          - squared: "Squared error"
          - absolute: "Absolute error"
"#;
        let catalog = parse_catalog(yaml).unwrap();
        assert_eq!(catalog.assets.len(), 1);
        let params = &catalog.assets[0].parameters;
        assert_eq!(params[0].ptype, ParamType::Text);
        assert_eq!(params[1].ptype, ParamType::Select);
        let opts = params[1].options.as_ref().unwrap();
        assert_eq!(opts[0].key, "squared");
        assert_eq!(opts[0].value, "Squared error");
    }

    #[test]
    fn rejects_duplicate_dids() {
        let yaml = r#"
assets:
  - { did: "did:op:x", name: "A", price: "0", symbol: "A" }
  - { did: "did:op:x", name: "B", price: "1", symbol: "B" }
"#;
        let err = parse_catalog(yaml).unwrap_err();
        assert!(format!("{err}").contains("duplicate asset did"));
    }

    #[test]
    fn rejects_multi_key_option_entries() {
        let yaml = r#"
assets:
  - did: "did:op:y"
    name: "C"
    price: "0"
    symbol: "C"
    parameters:
      - type: select
        name: pick
        label: ""
        description: ""
        required: false
        default: ""
        options:
          - a: "One"
            b: "Two"
"#;
        assert!(parse_catalog(yaml).is_err());
    }

    #[test]
    fn empty_document_is_an_empty_catalog() {
        let catalog = parse_catalog("assets: []").unwrap();
        assert!(catalog.assets.is_empty());
    }
}
