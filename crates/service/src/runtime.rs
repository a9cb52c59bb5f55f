//! Runtime wiring
//!
//! Builds the shared store, the fetch wrapper and the active project from an [`AppConfig`].

use std::sync::Arc;

use configs::AppConfig;
use tracing::info;

use crate::data_storage::LocalDataStorage;
use crate::fetch::{AceFetch, ReqwestFetch};
use crate::simvars::ActiveProject;

pub struct HostServices {
    pub storage: Arc<LocalDataStorage>,
    pub fetch: AceFetch<ReqwestFetch>,
    pub project: Arc<ActiveProject>,
}

impl HostServices {
    pub async fn bootstrap(cfg: &AppConfig) -> anyhow::Result<Self> {
        common::env::ensure_data_dir(&cfg.storage.data_dir).await?;
        let path = cfg.storage.path();
        let storage = LocalDataStorage::open_with_quota(&path, cfg.storage.quota_bytes).await?;
        let client = ReqwestFetch::new(&cfg.fetch.user_agent)?;
        let fetch = AceFetch::new(cfg.host.platform.as_str(), client);
        let project = Arc::new(ActiveProject::new());
        if let Some(dir) = &cfg.host.project_dir {
            project.load(dir).await;
        }
        info!(
            event = "bootstrap",
            platform = %cfg.host.platform,
            store = %path.display(),
            origin = crate::fetch::local_origin(fetch.platform()),
            project = cfg.host.project_dir.as_deref().unwrap_or("-"),
            "host services ready"
        );
        Ok(Self { storage, fetch, project })
    }
}
