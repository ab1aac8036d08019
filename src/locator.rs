use crate::api::HostApi;
use crate::classify::{NodeClass, NodeClassifier};
use crate::node::HostNode;
use crate::reference::{AssetRef, INPUT, OUTPUT};
use reqwest::Url;

pub const PREVIEW_3D: &str = "Preview3D";
/// Property where preview nodes remember the last generated model.
pub const LAST_MODEL_PROPERTY: &str = "Last Time Model File";

pub const MODEL_REFERENCE_WIDGETS: &[&str] = &["model_file", "mesh", "3d_model", "model"];
pub const IMAGE_REFERENCE_WIDGETS: &[&str] = &["image"];

/// Widgets that may hold the asset reference for nodes of this class.
pub fn reference_widgets(class: NodeClass) -> &'static [&'static str] {
    match class {
        NodeClass::Image => IMAGE_REFERENCE_WIDGETS,
        NodeClass::Model3d | NodeClass::Unsupported => MODEL_REFERENCE_WIDGETS,
    }
}

/// Finds the asset a node currently points at. First match wins:
/// a preview node's last output, then the node's `images` record, then a reference widget.
pub fn locate_asset(node: &dyn HostNode, class: NodeClass) -> Option<AssetRef> {
    if node.type_tag() == Some(PREVIEW_3D) {
        let last = node
            .property(LAST_MODEL_PROPERTY)
            .and_then(|v| v.as_str())
            .and_then(|v| AssetRef::parse(v, OUTPUT));
        if last.is_some() {
            return last;
        }
    }

    if let Some(image) = node.images().first() {
        return Some(AssetRef::new(
            image.filename.clone(),
            image.subfolder.clone(),
            image.kind_or_input(),
        ));
    }

    node.widget_named(reference_widgets(class))
        .and_then(|w| w.as_str())
        .filter(|v| !v.is_empty())
        .and_then(|v| AssetRef::parse(v, INPUT))
}

/// Retrievable URL of the node's asset, or `None` when the editor should start a new one.
pub fn locate_asset_url(
    api: &dyn HostApi,
    classifier: &NodeClassifier,
    node: &dyn HostNode,
) -> Option<Url> {
    let class = classifier.classify(node);
    locate_asset(node, class).map(|asset| api.view_url(&asset))
}
