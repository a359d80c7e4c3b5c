use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::{LisuError, Result};

/// A manga as listed by a remote provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: String,
    pub provider_id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Manga {
    pub fn display_authors(&self) -> String {
        if self.authors.is_empty() {
            "(Unknown)".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}

/// A remote manga source hosted by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub lang: String,
    #[serde(default)]
    pub is_searchable: bool,
    /// Filters accepted by the latest list.
    #[serde(default)]
    pub filters: Vec<ProviderFilter>,
}

impl Provider {
    pub fn display_filters(&self) -> String {
        self.filters
            .iter()
            .map(ProviderFilter::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One filter a provider understands, with its allowed values when the
/// provider lists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFilter {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl fmt::Display for ProviderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}=[{}]", self.name, self.values.join("|"))
        }
    }
}

/// Filter option-set sent with latest-list requests, kept ordered so the
/// generated query string is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions(BTreeMap<String, String>);

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses `name=value` pairs, as given on the command line.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| LisuError::Other(format!("Invalid filter option: {}", pair)))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(LisuError::Other(format!("Invalid filter option: {}", pair)));
            }
            options.insert(name, value.trim());
        }
        Ok(options)
    }
}
