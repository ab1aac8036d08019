pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod extension;
pub mod graph;
pub mod locator;
pub mod node;
pub mod reference;
pub mod selection;
pub mod server;
pub mod session;
pub mod sync;

pub use api::{ComfyClient, HostApi, UploadForm, UploadReceipt, UploadResponse};
pub use classify::{NodeClass, NodeClassifier};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use extension::{ExtensionAction, MenuEntry, Mesh2MotionExtension, Toolbar, ToolbarButton};
pub use graph::{Graph, GraphNode, HostGraph};
pub use locator::{locate_asset, locate_asset_url};
pub use node::{HostNode, NodeId, Thumbnail, Widget, WidgetOptions};
pub use reference::AssetRef;
pub use selection::find_fallback_image_node;
pub use session::{Editor, EditorMode, EditorSession, MountPoint, SaveHandlers};
pub use sync::{ImageExport, ImageSource, ModelExport, SyncReport, SyncStage, WriteBack};
