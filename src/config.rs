use crate::classify::NodeClassifier;
use crate::error::BridgeResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Directory holding the built editor pages.
    pub root: PathBuf,
    pub bind: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("mesh2motion-ui"),
            bind: "127.0.0.1:8190".to_string(),
        }
    }
}

/// Class names appended to the built-in allowlists.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model_nodes: Vec<String>,
    pub image_nodes: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub server_url: String,
    pub api_prefix: String,
    pub log_level: String,
    pub ui: UiConfig,
    pub classifier: ClassifierConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8188".to_string(),
            api_prefix: "/api".to_string(),
            log_level: "info".to_string(),
            ui: UiConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_yaml(text: &str) -> BridgeResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads `path` if given, then applies `.env` and `MESH2MOTION_*` overrides.
    pub fn load(path: Option<&Path>) -> BridgeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        dotenvy::dotenv().ok();
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("MESH2MOTION_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("MESH2MOTION_UI_ROOT") {
            self.ui.root = PathBuf::from(v);
        }
        if let Some(v) = lookup("MESH2MOTION_BIND") {
            self.ui.bind = v;
        }
        if let Some(v) = lookup("MESH2MOTION_LOG") {
            self.log_level = v;
        }
    }

    pub fn classifier(&self) -> NodeClassifier {
        NodeClassifier::new(
            self.classifier.model_nodes.clone(),
            self.classifier.image_nodes.clone(),
        )
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
