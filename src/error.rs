use crate::node::NodeId;
use crate::sync::SyncStage;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("upload rejected with status {status}: {body}")]
    UploadRejected { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server response: {0}")]
    InvalidResponse(String),
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    Url(String),
    #[error("node {0} not found")]
    UnknownNode(NodeId),
    /// A staged write-back that stopped; `stages` ends with `SyncStage::Failed`.
    #[error("{task} sync failed: {source}")]
    Sync {
        task: &'static str,
        stages: Vec<SyncStage>,
        source: Box<BridgeError>,
    },
}

impl BridgeError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn url(msg: impl Into<String>) -> Self {
        Self::Url(msg.into())
    }

    /// The underlying failure, looking through a `Sync` wrapper.
    pub fn cause(&self) -> &BridgeError {
        match self {
            Self::Sync { source, .. } => source.cause(),
            other => other,
        }
    }

    /// Stages a failed write-back went through, if this came from one.
    pub fn stages(&self) -> &[SyncStage] {
        match self {
            Self::Sync { stages, .. } => stages,
            _ => &[],
        }
    }
}
