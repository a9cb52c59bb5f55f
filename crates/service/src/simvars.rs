//! Simulation variable presets, stored per project in `<project>/.ace/simvars.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// Location of the presets file relative to the project root.
pub const SIMVARS_DIR: &str = ".ace";
pub const SIMVARS_FILE: &str = "simvars.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimVarType {
    A,
    E,
    L,
}

/// How the frontend edits a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Control {
    Numeric,
    Text,
    Slider { min: f64, max: f64 },
}

/// A bare JSON number, string or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimVarValue {
    Number(f64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimVar {
    #[serde(rename = "type")]
    pub var_type: SimVarType,
    pub name: String,
    pub index: u8,
    pub unit: String,
    pub value: SimVarValue,
    pub control: Control,
    pub pinned: Option<bool>,
}

pub type SimVarConfig = Vec<SimVar>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub path: PathBuf,
}

impl Project {
    pub fn simvars_path(&self) -> PathBuf {
        self.path.join(SIMVARS_DIR).join(SIMVARS_FILE)
    }
}

/// The project the host currently has open, if any.
#[derive(Debug, Default)]
pub struct ActiveProject(RwLock<Option<Project>>);

impl ActiveProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, path: impl Into<PathBuf>) {
        let project = Project { path: path.into() };
        debug!(path = %project.path.display(), "project loaded");
        *self.0.write().await = Some(project);
    }

    pub async fn unload(&self) {
        *self.0.write().await = None;
    }

    pub async fn current(&self) -> Option<Project> {
        self.0.read().await.clone()
    }

    async fn require(&self) -> Result<Project, ServiceError> {
        self.current().await.ok_or(ServiceError::NoActiveProject)
    }
}

/// Read the active project's presets. A project without the file has none.
pub async fn load_simvars(active: &ActiveProject) -> Result<SimVarConfig, ServiceError> {
    let project = active.require().await?;
    read_simvars(&project.simvars_path()).await
}

/// Overwrite the active project's presets, creating `.ace/` if needed.
pub async fn save_simvars(
    active: &ActiveProject,
    simvars: &SimVarConfig,
) -> Result<(), ServiceError> {
    let project = active.require().await?;
    let path = project.simvars_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await.map_err(ServiceError::storage)?;
    }
    let data = serde_json::to_string_pretty(simvars)
        .map_err(|e| ServiceError::Decode(e.to_string()))?;
    fs::write(&path, data).await.map_err(ServiceError::storage)?;
    debug!(path = %path.display(), count = simvars.len(), "simvars saved");
    Ok(())
}

async fn read_simvars(path: &Path) -> Result<SimVarConfig, ServiceError> {
    match fs::read_to_string(path).await {
        Ok(data) => {
            serde_json::from_str(&data).map_err(|e| ServiceError::Decode(e.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(SimVarConfig::default()),
        Err(e) => Err(ServiceError::storage(e)),
    }
}
