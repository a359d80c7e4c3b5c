use serde::{Deserialize, Serialize};

/// A saved manga server the user can browse.
///
/// `position` is the user-chosen sort order; `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerBookmark {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub position: i64,
}

impl ServerBookmark {
    pub fn new(name: String, address: String) -> Self {
        Self {
            id: 0,
            name,
            address,
            position: 0,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.address
        } else {
            &self.name
        }
    }

    /// Address with a trailing slash, suitable as a base for relative API paths.
    pub fn base_address(&self) -> String {
        if self.address.ends_with('/') {
            self.address.clone()
        } else {
            format!("{}/", self.address)
        }
    }
}
