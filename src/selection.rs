use crate::classify::{NodeClass, NodeClassifier};
use crate::graph::HostGraph;
use crate::node::NodeId;

/// Picks a target for an image export that arrived without one.
///
/// Selected nodes are tried first, then every node in graph order. The first image node
/// found wins; there is no other tie-break.
pub fn find_fallback_image_node<G: HostGraph>(
    graph: &G,
    classifier: &NodeClassifier,
) -> Option<NodeId> {
    let is_image = |id: NodeId| {
        graph
            .node(id)
            .is_some_and(|node| classifier.classify(node) == NodeClass::Image)
    };

    graph
        .selected_node_ids()
        .into_iter()
        .find(|id| is_image(*id))
        .or_else(|| graph.node_ids().into_iter().find(|id| is_image(*id)))
}
