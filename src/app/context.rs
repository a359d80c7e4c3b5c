use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{LisuError, Result};
use crate::config::Config;
use crate::domain::ServerBookmark;
use crate::remote::HttpRemote;
use crate::store::sqlite::SqliteStore;
use crate::store::LibraryStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.library.database_path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        tracing::debug!("Opened library at {}", db_path.display());

        Ok(Self { config, store })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self { config, store })
    }

    /// Looks up the bookmark named by `server_id`, falling back to the
    /// configured default server.
    pub fn resolve_server(&self, server_id: Option<i64>) -> Result<ServerBookmark> {
        let id = server_id
            .or(self.config.library.default_server)
            .ok_or_else(|| {
                LisuError::Config("No server given and no default_server configured".into())
            })?;

        self.store
            .get_server(id)?
            .ok_or(LisuError::ServerNotFound(id))
    }

    pub fn remote_for(&self, server: &ServerBookmark) -> Result<HttpRemote> {
        HttpRemote::new(&server.address, &self.config.remote)
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| LisuError::Config("Could not find data directory".into()))?;
        let lisu_dir = data_dir.join("lisu");
        std::fs::create_dir_all(&lisu_dir)?;
        Ok(lisu_dir.join("lisu.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_server_explicit_and_default() {
        let mut config = Config::default();
        let ctx = AppContext::in_memory(config.clone()).unwrap();
        let id = ctx.store.add_server("Home", "http://localhost:8080").unwrap();

        assert_eq!(ctx.resolve_server(Some(id)).unwrap().name, "Home");
        assert!(matches!(
            ctx.resolve_server(None),
            Err(LisuError::Config(_))
        ));

        config.library.default_server = Some(id);
        let ctx = AppContext {
            config,
            store: ctx.store.clone(),
        };
        assert_eq!(ctx.resolve_server(None).unwrap().id, id);
        assert!(matches!(
            ctx.resolve_server(Some(id + 1)),
            Err(LisuError::ServerNotFound(_))
        ));
    }

    #[test]
    fn test_opens_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.library.database_path = Some(dir.path().join("library.db"));

        let ctx = AppContext::new(config).unwrap();
        ctx.store.add_server("Home", "http://localhost").unwrap();
        assert!(dir.path().join("library.db").exists());
    }

    #[test]
    fn test_remote_for_server() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let id = ctx.store.add_server("Home", "http://localhost:8080/lisu").unwrap();
        let server = ctx.store.get_server(id).unwrap().unwrap();

        let remote = ctx.remote_for(&server).unwrap();
        assert_eq!(remote.base().as_str(), "http://localhost:8080/lisu/");
    }
}
