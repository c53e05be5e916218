use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Kind of a user-defined parameter. `Unset` is the state of a freshly
/// added editor row and is serialized as the empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParamType {
    #[default]
    Unset,
    Text,
    Select,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Unset => "",
            ParamType::Text => "text",
            ParamType::Select => "select",
        }
    }

    /// Parse a wire literal. `"options"` is a legacy alias for `"select"`
    /// still present in older published assets.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(ParamType::Unset),
            "text" => Some(ParamType::Text),
            "select" | "options" => Some(ParamType::Select),
            _ => None,
        }
    }
}

impl Serialize for ParamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ParamType::parse(&s)
            .ok_or_else(|| de::Error::custom(format!("unknown parameter type: '{s}'")))
    }
}

/// One selectable choice of a `select` parameter. In memory this is a plain
/// two-field record; on the wire it is a single-entry map `{key: value}`,
/// the shape the submission pipeline expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamOption {
    pub key: String,
    pub value: String,
}

impl ParamOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Serialize for ParamOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionVisitor;

        impl<'de> Visitor<'de> for OptionVisitor {
            type Value = ParamOption;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a single-entry map of option key to label")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let (key, value): (String, String) = access
                    .next_entry()?
                    .ok_or_else(|| de::Error::custom("option entry must not be empty"))?;
                if access.next_entry::<String, String>()?.is_some() {
                    return Err(de::Error::custom("option entry must have exactly one key"));
                }
                Ok(ParamOption { key, value })
            }
        }

        deserializer.deserialize_map(OptionVisitor)
    }
}

/// One user-defined configurable input of a compute algorithm. Field names
/// and optionality are part of the wire contract with the submission
/// pipeline: `options` is present iff `type == "select"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub ptype: ParamType,
    pub name: String,
    pub label: String,
    pub description: String,
    pub required: bool,
    #[serde(rename = "default")]
    pub default_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ParamOption>>,
}

/// One catalog entry shown in the asset-selection list. `parameters` is the
/// same record shape the editor publishes, viewed after persistence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Asset {
    pub did: String,
    pub name: String,
    pub price: String,
    pub symbol: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Sanity-check a loaded catalog: DIDs must be unique and published
/// parameters must be complete (non-empty name/type; select parameters
/// carry at least one option and no blank option keys). Parameter names
/// are not required to be unique per asset.
pub(crate) fn validate_catalog(catalog: &Catalog) -> Result<(), String> {
    use std::collections::HashSet;
    let mut dids = HashSet::new();
    for (i, asset) in catalog.assets.iter().enumerate() {
        if !dids.insert(&asset.did) {
            return Err(format!("duplicate asset did: '{}' at index {}", asset.did, i));
        }
        for (j, p) in asset.parameters.iter().enumerate() {
            if p.name.is_empty() {
                return Err(format!("asset '{}' parameters[{j}] has empty name", asset.did));
            }
            if p.ptype == ParamType::Unset {
                return Err(format!(
                    "asset '{}' parameter '{}' has empty type",
                    asset.did, p.name
                ));
            }
            match (&p.ptype, &p.options) {
                (ParamType::Select, Some(opts)) => {
                    if opts.is_empty() {
                        return Err(format!(
                            "asset '{}' parameter '{}' is select with no options",
                            asset.did, p.name
                        ));
                    }
                    if opts.iter().any(|o| o.key.is_empty()) {
                        return Err(format!(
                            "asset '{}' parameter '{}' has a blank option key",
                            asset.did, p.name
                        ));
                    }
                }
                (ParamType::Select, None) => {
                    return Err(format!(
                        "asset '{}' parameter '{}' is select with no options",
                        asset.did, p.name
                    ));
                }
                (_, Some(_)) => {
                    return Err(format!(
                        "asset '{}' parameter '{}' carries options but is not select",
                        asset.did, p.name
                    ));
                }
                _ => {}
            }
        }
    }
    Ok(())
}
