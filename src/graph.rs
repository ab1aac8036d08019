//! ComfyUI/LiteGraph workflow adapter.
//!
//! A workflow node stores its widget values positionally (`widgets_values`). Here the
//! ordered widget list is the only store; `widgets_values` is rebuilt from it whenever the
//! node is serialized, so the two can never drift apart.

use crate::error::BridgeResult;
use crate::node::{HostNode, NodeId, Thumbnail, Widget, WidgetOptions};
use crate::reference::AssetRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Live graph accessor the host exposes.
pub trait HostGraph: Send {
    type Node: HostNode;

    fn selected_node_ids(&self) -> Vec<NodeId>;
    /// Every node id, in the host's own order.
    fn node_ids(&self) -> Vec<NodeId>;
    fn node(&self, id: NodeId) -> Option<&Self::Node>;
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Self::Node>;
    fn mark_canvas_dirty(&mut self);
}

fn known_widget_names(type_tag: Option<&str>) -> &'static [&'static str] {
    match type_tag {
        Some("Load3D") => &["model_file", "image", "width", "height"],
        Some("Preview3D") => &["model_file"],
        Some("SaveGLB") => &["filename_prefix"],
        Some("LoadImage") => &["image", "upload"],
        Some("LoadImageMask") => &["image", "channel", "upload"],
        _ => &[],
    }
}

#[derive(Serialize, Deserialize)]
struct RawWidget {
    name: String,
    #[serde(default)]
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<WidgetOptions>,
}

#[derive(Serialize, Deserialize)]
struct RawNode {
    id: NodeId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    type_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    widgets: Option<Vec<RawWidget>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    widgets_values: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<AssetRef>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValuesShape {
    Positional,
    Keyed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct GraphNode {
    pub id: NodeId,
    pub type_tag: Option<String>,
    pub widgets: Vec<Widget>,
    pub images: Vec<AssetRef>,
    pub properties: Map<String, Value>,
    pub imgs: Vec<Thumbnail>,
    /// Shape of the loaded `widgets_values`; `None` when the key was absent.
    shape: Option<ValuesShape>,
    named: bool,
    extra: Map<String, Value>,
}

impl GraphNode {
    pub fn new(id: NodeId, type_tag: impl Into<String>) -> Self {
        Self {
            id,
            type_tag: Some(type_tag.into()),
            ..Default::default()
        }
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    pub fn with_image(mut self, image: AssetRef) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Positional mirror of the widget values, as the workflow format stores them.
    pub fn widgets_values(&self) -> Vec<Value> {
        self.widgets.iter().map(|w| w.value.clone()).collect()
    }
}

impl From<RawNode> for GraphNode {
    fn from(raw: RawNode) -> Self {
        let named = raw.widgets.is_some();
        let shape = raw.widgets_values.as_ref().map(|values| match values {
            Value::Object(_) => ValuesShape::Keyed,
            _ => ValuesShape::Positional,
        });
        let widgets = match (raw.widgets, raw.widgets_values) {
            (Some(widgets), _) => widgets
                .into_iter()
                .map(|w| Widget::new(w.name, w.value).with_options(w.options))
                .collect(),
            (None, Some(Value::Array(values))) => {
                let names = known_widget_names(raw.type_tag.as_deref());
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| match names.get(i) {
                        Some(name) => Widget::new(*name, value),
                        None => Widget::new(format!("widget_{i}"), value),
                    })
                    .collect()
            }
            (None, Some(Value::Object(values))) => values
                .into_iter()
                .map(|(name, value)| Widget::new(name, value))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            id: raw.id,
            type_tag: raw.type_tag,
            widgets,
            images: raw.images,
            properties: raw.properties,
            imgs: Vec::new(),
            shape,
            named,
            extra: raw.extra,
        }
    }
}

impl From<GraphNode> for RawNode {
    fn from(node: GraphNode) -> Self {
        let shape = match node.shape {
            Some(shape) => Some(shape),
            None if !node.widgets.is_empty() => Some(ValuesShape::Positional),
            None => None,
        };
        let widgets_values = shape.map(|shape| match shape {
            ValuesShape::Positional => Value::Array(node.widgets_values()),
            ValuesShape::Keyed => Value::Object(
                node.widgets
                    .iter()
                    .map(|w| (w.name.clone(), w.value.clone()))
                    .collect(),
            ),
        });
        let widgets = node.named.then(|| {
            node.widgets
                .into_iter()
                .map(|w| RawWidget {
                    name: w.name,
                    value: w.value,
                    options: w.options,
                })
                .collect()
        });

        Self {
            id: node.id,
            type_tag: node.type_tag,
            widgets,
            widgets_values,
            images: node.images,
            properties: node.properties,
            extra: node.extra,
        }
    }
}

impl HostNode for GraphNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn type_tag(&self) -> Option<&str> {
        self.type_tag.as_deref()
    }

    fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    fn widgets_mut(&mut self) -> &mut [Widget] {
        &mut self.widgets
    }

    fn images(&self) -> &[AssetRef] {
        &self.images
    }

    fn set_images(&mut self, images: Vec<AssetRef>) {
        self.images = images;
    }

    fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    fn set_thumbnails(&mut self, thumbnails: Vec<Thumbnail>) {
        self.imgs = thumbnails;
    }
}

/// A workflow graph plus the transient canvas state the host keeps beside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(skip)]
    selected: Vec<NodeId>,
    #[serde(skip)]
    dirty: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Graph {
    pub fn new(nodes: Vec<GraphNode>) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }

    pub fn from_json(text: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> BridgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn select(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selected = ids.into_iter().collect();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns and clears the dirty flag, as a repaint would.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl HostGraph for Graph {
    type Node = GraphNode;

    fn selected_node_ids(&self) -> Vec<NodeId> {
        self.selected.clone()
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn mark_canvas_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positional_values_get_known_names() {
        let node: GraphNode = serde_json::from_value(json!({
            "id": 3,
            "type": "LoadImage",
            "widgets_values": ["cat.png", "image", 7]
        }))
        .unwrap();
        let names: Vec<_> = node.widgets.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["image", "upload", "widget_2"]);
        assert_eq!(node.widgets[0].as_str(), Some("cat.png"));
    }

    #[test]
    fn widgets_values_is_derived_on_save() {
        let mut node: GraphNode = serde_json::from_value(json!({
            "id": 1,
            "type": "Load3D",
            "widgets_values": ["old.glb [input]", "", 1024, 1024],
            "pos": [10, 20]
        }))
        .unwrap();
        node.widgets[0].set_value("new.glb [input]");

        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["widgets_values"], json!(["new.glb [input]", "", 1024, 1024]));
        assert_eq!(out["pos"], json!([10, 20]));
        assert!(out.get("widgets").is_none());
    }

    #[test]
    fn keyed_values_keep_their_shape() {
        let node: GraphNode = serde_json::from_value(json!({
            "id": 9,
            "type": "VHS_LoadVideo",
            "widgets_values": {"video": "clip.mp4", "frame_rate": 24}
        }))
        .unwrap();
        assert!(node.widget_named(&["video"]).is_some());
        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["widgets_values"]["frame_rate"], json!(24));
    }

    #[test]
    fn empty_values_survive_a_save() {
        let node: GraphNode =
            serde_json::from_value(json!({"id": 1, "type": "Note", "widgets_values": []})).unwrap();
        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["widgets_values"], json!([]));

        let bare: GraphNode = serde_json::from_value(json!({"id": 2, "type": "Note"})).unwrap();
        assert!(serde_json::to_value(&bare).unwrap().get("widgets_values").is_none());
    }

    #[test]
    fn keyed_values_stay_keyed_beside_named_widgets() {
        let node: GraphNode = serde_json::from_value(json!({
            "id": 2,
            "type": "Custom",
            "widgets": [{"name": "a", "value": 1}],
            "widgets_values": {"a": 1}
        }))
        .unwrap();
        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["widgets_values"], json!({"a": 1}));
        assert_eq!(out["widgets"][0]["name"], json!("a"));
    }

    #[test]
    fn named_widgets_round_trip_with_options() {
        let text = r#"{"nodes":[{"id":2,"type":"Custom","widgets":[
            {"name":"mesh","value":"a.glb","options":{"values":["a.glb"]}}]}],"version":0.4}"#;
        let graph = Graph::from_json(text).unwrap();
        let node = graph.node(2).unwrap();
        assert_eq!(node.widgets[0].choices().unwrap(), ["a.glb"]);

        let out: Value = serde_json::from_str(&graph.to_json_pretty().unwrap()).unwrap();
        assert_eq!(out["nodes"][0]["widgets"][0]["name"], json!("mesh"));
        assert_eq!(out["nodes"][0]["widgets_values"], json!(["a.glb"]));
        assert_eq!(out["version"], json!(0.4));
    }

    #[test]
    fn dirty_flag_is_taken_once() {
        let mut graph = Graph::default();
        graph.mark_canvas_dirty();
        assert!(graph.take_dirty());
        assert!(!graph.take_dirty());
    }
}
