//! One editor per host session, created on first use.

use crate::error::BridgeResult;
use crate::node::NodeId;
use crate::sync::{ImageExport, ModelExport, SyncReport};
use futures::future::BoxFuture;
use reqwest::Url;
use tracing::info;

pub const MOUNT_ELEMENT_ID: &str = "mesh2motion-editor-root";

/// The element the editor attaches itself under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub element_id: String,
}

/// Which editor page to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Edit,
    Explore,
}

pub type SaveFuture = BoxFuture<'static, BridgeResult<SyncReport>>;
pub type ModelSaveHandler = Box<dyn Fn(ModelExport, Option<NodeId>) -> SaveFuture + Send + Sync>;
pub type ImageSaveHandler = Box<dyn Fn(ImageExport, Option<NodeId>) -> SaveFuture + Send + Sync>;

/// Callbacks the editor invokes when the user saves.
pub struct SaveHandlers {
    pub model: ModelSaveHandler,
    pub image: ImageSaveHandler,
}

/// The embedded 3D editor, seen from the bridge.
pub trait Editor: Send {
    fn mount(&mut self, mount: &MountPoint);
    fn set_save_handlers(&mut self, handlers: SaveHandlers);
    fn load_model(&mut self, mode: EditorMode, url: Url, node: Option<NodeId>);
    fn open_new(&mut self, mode: EditorMode, node: Option<NodeId>);
}

type EditorFactory<E> = Box<dyn Fn() -> E + Send>;
type HandlerFactory = Box<dyn Fn() -> SaveHandlers + Send>;

struct Live<E> {
    editor: E,
    mount: MountPoint,
}

/// Lazily built editor instance plus its mount point.
pub struct EditorSession<E: Editor> {
    make_editor: EditorFactory<E>,
    make_handlers: HandlerFactory,
    live: Option<Live<E>>,
}

impl<E: Editor> EditorSession<E> {
    pub fn new(
        make_editor: impl Fn() -> E + Send + 'static,
        make_handlers: impl Fn() -> SaveHandlers + Send + 'static,
    ) -> Self {
        Self {
            make_editor: Box::new(make_editor),
            make_handlers: Box::new(make_handlers),
            live: None,
        }
    }

    /// Returns the editor, creating, mounting and wiring it on first call.
    pub fn ensure_instance(&mut self) -> &mut E {
        let live = self.live.get_or_insert_with(|| {
            let mount = MountPoint {
                element_id: MOUNT_ELEMENT_ID.to_string(),
            };
            let mut editor = (self.make_editor)();
            editor.mount(&mount);
            editor.set_save_handlers((self.make_handlers)());
            info!(target: "mesh2motion", mount = %mount.element_id, "editor instance created");
            Live { editor, mount }
        });
        &mut live.editor
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn mount_point(&self) -> Option<&MountPoint> {
        self.live.as_ref().map(|l| &l.mount)
    }

    /// Drops the live editor. Hosts never call this; the next `ensure_instance` builds anew.
    pub fn reset(&mut self) -> Option<E> {
        self.live.take().map(|l| l.editor)
    }
}
