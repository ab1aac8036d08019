//! What the host sees: the registration name, toolbar button, node menu and open entry points.

use crate::graph::HostGraph;
use crate::locator::locate_asset_url;
use crate::node::{HostNode, NodeId};
use crate::session::{Editor, EditorMode, EditorSession, SaveHandlers};
use crate::sync::WriteBack;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub const EXTENSION_NAME: &str = "ComfyUI.Mesh2Motion";
pub const MENU_LABEL: &str = "Open in Mesh2Motion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionAction {
    OpenEditor {
        mode: EditorMode,
        node: Option<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    pub icon: &'static str,
    pub tooltip: &'static str,
    pub content: &'static str,
    pub action: ExtensionAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Separator,
    Item {
        content: &'static str,
        action: ExtensionAction,
    },
}

pub trait Toolbar {
    fn append(&mut self, button: ToolbarButton);
}

pub struct Mesh2MotionExtension<E: Editor, G: HostGraph> {
    session: EditorSession<E>,
    write_back: WriteBack,
    graph: Arc<Mutex<G>>,
}

impl<E: Editor, G: HostGraph + 'static> Mesh2MotionExtension<E, G> {
    pub fn new(
        make_editor: impl Fn() -> E + Send + 'static,
        write_back: WriteBack,
        graph: Arc<Mutex<G>>,
    ) -> Self {
        let handlers = {
            let write_back = write_back.clone();
            let graph = graph.clone();
            move || save_handlers(write_back.clone(), graph.clone())
        };
        Self {
            session: EditorSession::new(make_editor, handlers),
            write_back,
            graph,
        }
    }

    pub fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    pub fn setup(&self, toolbar: &mut dyn Toolbar) {
        toolbar.append(ToolbarButton {
            icon: "cube",
            tooltip: "Mesh2Motion 3D Editor",
            content: "Mesh2Motion",
            action: ExtensionAction::OpenEditor {
                mode: EditorMode::Edit,
                node: None,
            },
        });
        info!(target: "mesh2motion", extension = EXTENSION_NAME, "toolbar button registered");
    }

    pub fn node_menu_items(&self, node: &dyn HostNode) -> Vec<MenuEntry> {
        if !self.write_back.classifier().classify(node).is_supported() {
            return Vec::new();
        }
        vec![
            MenuEntry::Separator,
            MenuEntry::Item {
                content: MENU_LABEL,
                action: ExtensionAction::OpenEditor {
                    mode: EditorMode::Edit,
                    node: Some(node.id()),
                },
            },
        ]
    }

    pub async fn dispatch(&mut self, action: ExtensionAction) {
        match action {
            ExtensionAction::OpenEditor { mode, node } => self.open(mode, node).await,
        }
    }

    pub async fn open_for_editing(&mut self, node: Option<NodeId>) {
        self.open(EditorMode::Edit, node).await
    }

    pub async fn open_for_exploration(&mut self, node: Option<NodeId>) {
        self.open(EditorMode::Explore, node).await
    }

    async fn open(&mut self, mode: EditorMode, node: Option<NodeId>) {
        let url = match node {
            Some(id) => {
                let graph = self.graph.lock().await;
                graph.node(id).and_then(|n| {
                    locate_asset_url(self.write_back.api(), self.write_back.classifier(), n)
                })
            }
            None => None,
        };

        let editor = self.session.ensure_instance();
        match url {
            Some(url) => editor.load_model(mode, url, node),
            None => editor.open_new(mode, node),
        }
    }

    pub fn session(&self) -> &EditorSession<E> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession<E> {
        &mut self.session
    }
}

fn save_handlers<G: HostGraph + 'static>(
    write_back: WriteBack,
    graph: Arc<Mutex<G>>,
) -> SaveHandlers {
    let (model_wb, model_graph) = (write_back.clone(), graph.clone());
    SaveHandlers {
        model: Box::new(move |export, node| {
            let write_back = model_wb.clone();
            let graph = model_graph.clone();
            Box::pin(async move {
                let mut graph = graph.lock().await;
                write_back.save_model(&mut *graph, export, node).await
            })
        }),
        image: Box::new(move |export, node| {
            let write_back = write_back.clone();
            let graph = graph.clone();
            Box::pin(async move {
                let mut graph = graph.lock().await;
                write_back.save_image(&mut *graph, export, node).await
            })
        }),
    }
}
