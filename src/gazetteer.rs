use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::{ConvertError, Result};

/// Region gazetteer backing the address decomposition. The source file is a
/// JSON object of administrative area code to display name; only the names
/// take part in matching.
#[derive(Debug)]
pub struct Gazetteer {
    names_by_lowercase: HashMap<String, String>,
}

impl Gazetteer {
    /// Loads the gazetteer, failing the whole run if the file is missing or
    /// not an object of strings. An unreadable gazetteer would silently
    /// strip every region from the output, so there is no fallback.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!(
                "failed to read gazetteer {}: {e}",
                path.display()
            ))
        })?;
        let by_code: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
            ConvertError::Config(format!(
                "gazetteer {} is not a JSON object of code to name: {e}",
                path.display()
            ))
        })?;
        info!(path = %path.display(), regions = by_code.len(), "Loaded region gazetteer");
        Ok(Self::from_names(by_code.into_values()))
    }

    pub fn from_names<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let names_by_lowercase = names
            .into_iter()
            .map(|name| (name.to_lowercase(), name))
            .collect();
        Self { names_by_lowercase }
    }

    /// Canonical region name for an address line, matched case-insensitively
    /// against the whole line. The gazetteer's spelling wins over the input's.
    pub fn find(&self, line: &str) -> Option<&str> {
        self.names_by_lowercase
            .get(&line.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names_by_lowercase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names_by_lowercase.is_empty()
    }
}
