use std::{collections::BTreeMap, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{declaration::SourceDeclaration, ParseError};

/// Contents of `sourcefetch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceDeclaration>,
}

impl Descriptor {
    pub fn from_file(path: &Path) -> Result<Descriptor, ParseError> {
        debug!(
            "Attempting to read descriptor from sourcefetch file {}",
            path.display()
        );
        let contents = std::fs::read_to_string(path)?;
        Descriptor::from_toml_str(&contents)
    }

    pub fn from_toml_str(data: &str) -> Result<Descriptor, ParseError> {
        Ok(toml::from_str(data)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
