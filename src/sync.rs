//! Write-back of edited assets: upload, then point the host node at the stored copy.

use crate::api::{HostApi, UploadForm, UploadReceipt};
use crate::classify::NodeClassifier;
use crate::error::{BridgeError, BridgeResult};
use crate::graph::HostGraph;
use crate::locator::{IMAGE_REFERENCE_WIDGETS, MODEL_REFERENCE_WIDGETS};
use crate::node::{HostNode, NodeId, Thumbnail};
use crate::reference::{AssetRef, INPUT};
use crate::selection::find_fallback_image_node;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

pub const COMPONENT_NAME: &str = "mesh2motion";
pub const UPLOAD_SUBFOLDER: &str = "mesh2motion";
pub const MODEL_MIME: &str = "model/gltf-binary";
/// Used when the exported bytes are not a format `image` recognizes.
pub const IMAGE_MIME: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Uploading,
    ApplyingReference,
    RefreshingThumbnail,
    Done,
    Failed,
}

/// An edited model handed back by the editor.
#[derive(Debug, Clone)]
pub struct ModelExport {
    pub data: Vec<u8>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    /// Exported image that still has to be fetched, absolute or server-relative.
    Url(String),
}

#[derive(Debug, Clone)]
pub struct ImageExport {
    pub source: ImageSource,
    pub filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub reference: AssetRef,
    pub widget_value: String,
    /// Node that received the reference. `None` if there was none or it vanished mid-upload.
    pub target: Option<NodeId>,
    pub stages: Vec<SyncStage>,
    pub thumbnail_error: Option<String>,
}

impl SyncReport {
    pub fn final_stage(&self) -> Option<SyncStage> {
        self.stages.last().copied()
    }
}

struct SyncTask {
    label: &'static str,
    stages: Vec<SyncStage>,
}

impl SyncTask {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            stages: Vec::new(),
        }
    }

    fn enter(&mut self, stage: SyncStage) {
        debug!(target: "mesh2motion", task = self.label, ?stage, "sync stage");
        self.stages.push(stage);
    }
}

/// Uploads edited assets and synchronizes the owning node.
#[derive(Clone)]
pub struct WriteBack {
    api: Arc<dyn HostApi>,
    classifier: Arc<NodeClassifier>,
}

impl WriteBack {
    pub fn new(api: Arc<dyn HostApi>, classifier: Arc<NodeClassifier>) -> Self {
        Self { api, classifier }
    }

    pub fn api(&self) -> &dyn HostApi {
        self.api.as_ref()
    }

    pub fn classifier(&self) -> &NodeClassifier {
        &self.classifier
    }

    pub async fn save_model<G: HostGraph>(
        &self,
        graph: &mut G,
        export: ModelExport,
        target: Option<NodeId>,
    ) -> BridgeResult<SyncReport> {
        let mut task = SyncTask::new("model");
        let filename = export
            .filename
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| fallback_filename("glb"));

        let receipt = self.upload(&mut task, filename, MODEL_MIME, export.data).await?;
        let reference = AssetRef::input(receipt.name, receipt.subfolder);
        let widget_value = reference.to_widget_value();

        let target = match target {
            Some(id) => {
                task.enter(SyncStage::ApplyingReference);
                apply_to_graph(graph, id, &reference, MODEL_REFERENCE_WIDGETS)
            }
            None => None,
        };
        if target.is_some() {
            graph.mark_canvas_dirty();
        }

        task.enter(SyncStage::Done);
        info!(target: "mesh2motion", %widget_value, node = ?target, "model saved");
        Ok(SyncReport {
            reference,
            widget_value,
            target,
            stages: task.stages,
            thumbnail_error: None,
        })
    }

    pub async fn save_image<G: HostGraph>(
        &self,
        graph: &mut G,
        export: ImageExport,
        target: Option<NodeId>,
    ) -> BridgeResult<SyncReport> {
        let mut task = SyncTask::new("image");
        let bytes = match export.source {
            ImageSource::Bytes(bytes) => bytes,
            ImageSource::Url(url) => self.api.fetch_bytes(&url).await?,
        };
        let (mime, ext) = image_kind(&bytes);
        let filename = export
            .filename
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| fallback_filename(ext));
        let target = target.or_else(|| find_fallback_image_node(&*graph, &self.classifier));

        let receipt = self.upload(&mut task, filename, mime, bytes.clone()).await?;
        let reference = AssetRef::input(receipt.name, receipt.subfolder);
        let widget_value = reference.to_widget_value();

        let mut thumbnail_error = None;
        let target = match target {
            Some(id) => {
                task.enter(SyncStage::ApplyingReference);
                apply_to_graph(graph, id, &reference, IMAGE_REFERENCE_WIDGETS)
            }
            None => None,
        };

        if let Some(id) = target {
            task.enter(SyncStage::RefreshingThumbnail);
            match decode_thumbnail(bytes).await {
                Ok(thumbnail) => match graph.node_mut(id) {
                    Some(node) => node.set_thumbnails(vec![thumbnail]),
                    None => warn!(target: "mesh2motion", node = id, "node gone before thumbnail"),
                },
                Err(e) => {
                    warn!(target: "mesh2motion", node = id, error = %e, "thumbnail refresh failed");
                    thumbnail_error = Some(e.to_string());
                }
            }
            graph.mark_canvas_dirty();
        }

        task.enter(SyncStage::Done);
        info!(target: "mesh2motion", %widget_value, node = ?target, "image saved");
        Ok(SyncReport {
            reference,
            widget_value,
            target,
            stages: task.stages,
            thumbnail_error,
        })
    }

    async fn upload(
        &self,
        task: &mut SyncTask,
        filename: String,
        mime: &str,
        bytes: Vec<u8>,
    ) -> BridgeResult<UploadReceipt> {
        task.enter(SyncStage::Uploading);
        let form = UploadForm {
            filename,
            mime: mime.to_string(),
            bytes,
            kind: INPUT.to_string(),
            subfolder: UPLOAD_SUBFOLDER.to_string(),
            overwrite: true,
        };

        self.send_upload(form).await.map_err(|e| {
            task.enter(SyncStage::Failed);
            error!(target: "mesh2motion", task = task.label, error = %e, "upload failed");
            BridgeError::Sync {
                task: task.label,
                stages: std::mem::take(&mut task.stages),
                source: Box::new(e),
            }
        })
    }

    async fn send_upload(&self, form: UploadForm) -> BridgeResult<UploadReceipt> {
        let response = self.api.upload(form).await?;
        if !response.ok {
            return Err(BridgeError::UploadRejected {
                status: response.status,
                body: response.body_text(),
            });
        }
        let receipt = response.json()?;
        if receipt.name.is_empty() {
            return Err(BridgeError::invalid_response("upload receipt has no name"));
        }
        Ok(receipt)
    }
}

fn apply_to_graph<G: HostGraph>(
    graph: &mut G,
    id: NodeId,
    reference: &AssetRef,
    widget_names: &[&str],
) -> Option<NodeId> {
    match graph.node_mut(id) {
        Some(node) => {
            apply_reference(node, reference, widget_names);
            Some(id)
        }
        None => {
            warn!(target: "mesh2motion", node = id, "target node is gone; reference not written");
            None
        }
    }
}

/// Points `node` at `reference`: replaces its `images` record and updates the matching
/// widget, growing its choice list and firing its change hook.
pub fn apply_reference<N: HostNode + ?Sized>(
    node: &mut N,
    reference: &AssetRef,
    widget_names: &[&str],
) -> String {
    let value = reference.to_widget_value();
    let id = node.id();
    node.set_images(vec![reference.clone()]);
    match node.widget_named_mut(widget_names) {
        Some(widget) => {
            widget.offer_choice(&value);
            widget.set_value(value.clone());
        }
        None => debug!(target: "mesh2motion", node = id, "no reference widget to update"),
    }
    value
}

async fn decode_thumbnail(bytes: Vec<u8>) -> BridgeResult<Thumbnail> {
    let image =
        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes).map(|i| i.to_rgba8()))
            .await
            .map_err(std::io::Error::from)??;
    Ok(Thumbnail {
        image: Arc::new(image),
    })
}

/// MIME type and file extension sniffed from the encoded bytes.
fn image_kind(bytes: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(bytes) {
        Ok(format) => (
            format.to_mime_type(),
            format.extensions_str().first().copied().unwrap_or("png"),
        ),
        Err(_) => (IMAGE_MIME, "png"),
    }
}

fn fallback_filename(ext: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{COMPONENT_NAME}-{millis}.{ext}")
}
