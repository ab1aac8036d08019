use crate::node::HostNode;

pub const MODEL_3D_NODES: &[&str] = &["Load3D", "Preview3D", "SaveGLB"];
pub const IMAGE_NODES: &[&str] = &["LoadImage", "LoadImageMask"];

/// Widget names that mark a node as carrying a 3D model.
pub const MODEL_WIDGETS: &[&str] = &["model_file", "mesh", "3d_model"];
pub const MODEL_EXTENSIONS: &[&str] = &[".glb", ".gltf", ".fbx", ".obj"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Model3d,
    Image,
    Unsupported,
}

impl NodeClass {
    pub fn is_supported(self) -> bool {
        self != NodeClass::Unsupported
    }
}

/// Decides what kind of asset a host node holds.
///
/// Class names come first. Only 3D nodes have a structural fallback: host plugins rename
/// model loaders often, while image loaders are a small stable set.
#[derive(Debug, Clone)]
pub struct NodeClassifier {
    model_nodes: Vec<String>,
    image_nodes: Vec<String>,
}

impl Default for NodeClassifier {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl NodeClassifier {
    /// Built-in allowlists extended with `extra_*` class names.
    pub fn new(extra_model_nodes: Vec<String>, extra_image_nodes: Vec<String>) -> Self {
        let mut model_nodes: Vec<String> = MODEL_3D_NODES.iter().map(|s| s.to_string()).collect();
        model_nodes.extend(extra_model_nodes);
        let mut image_nodes: Vec<String> = IMAGE_NODES.iter().map(|s| s.to_string()).collect();
        image_nodes.extend(extra_image_nodes);
        Self {
            model_nodes,
            image_nodes,
        }
    }

    pub fn classify(&self, node: &dyn HostNode) -> NodeClass {
        if let Some(tag) = node.type_tag() {
            if self.model_nodes.iter().any(|n| n == tag) {
                return NodeClass::Model3d;
            }
            if self.image_nodes.iter().any(|n| n == tag) {
                return NodeClass::Image;
            }
        }
        if looks_like_model(node) {
            return NodeClass::Model3d;
        }
        NodeClass::Unsupported
    }
}

fn looks_like_model(node: &dyn HostNode) -> bool {
    node.widgets().iter().any(|w| {
        MODEL_WIDGETS.contains(&w.name.as_str()) || w.as_str().is_some_and(has_model_extension)
    })
}

fn has_model_extension(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    MODEL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;
    use crate::node::Widget;

    #[test]
    fn allowlisted_model_node_needs_no_widgets() {
        let node = GraphNode::new(1, "Preview3D");
        assert_eq!(NodeClassifier::default().classify(&node), NodeClass::Model3d);
    }

    #[test]
    fn allowlisted_image_node() {
        let node = GraphNode::new(1, "LoadImage");
        assert_eq!(NodeClassifier::default().classify(&node), NodeClass::Image);
    }

    #[test]
    fn mesh_widget_is_a_structural_match() {
        let node =
            GraphNode::new(1, "SomePluginLoader").with_widget(Widget::new("mesh", "foo.glb"));
        assert_eq!(NodeClassifier::default().classify(&node), NodeClass::Model3d);
    }

    #[test]
    fn model_extension_matches_case_insensitively() {
        let node = GraphNode::new(1, "Whatever").with_widget(Widget::new("path", "Rig.FBX"));
        assert_eq!(NodeClassifier::default().classify(&node), NodeClass::Model3d);
    }

    #[test]
    fn image_has_no_structural_fallback() {
        let node =
            GraphNode::new(1, "CustomImageThing").with_widget(Widget::new("image", "cat.png"));
        assert_eq!(NodeClassifier::default().classify(&node), NodeClass::Unsupported);
    }

    #[test]
    fn non_string_values_are_ignored() {
        let node = GraphNode::new(1, "KSampler").with_widget(Widget::new("seed", 42));
        assert!(!NodeClassifier::default().classify(&node).is_supported());
    }

    #[test]
    fn extra_class_names_extend_the_allowlists() {
        let classifier =
            NodeClassifier::new(vec!["Hy3DLoad".into()], vec!["LoadImageFromUrl".into()]);
        assert_eq!(classifier.classify(&GraphNode::new(1, "Hy3DLoad")), NodeClass::Model3d);
        assert_eq!(classifier.classify(&GraphNode::new(2, "LoadImageFromUrl")), NodeClass::Image);
    }
}
