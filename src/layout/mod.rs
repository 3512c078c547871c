//! Deterministic layered graph layout.
//!
//! Nodes are grouped into horizontal layers by kind, layers ordered
//! lexicographically top-to-bottom, and nodes spread evenly within a
//! layer in their original model order. No randomness and no hidden
//! state: identical input always yields identical positions, so a
//! re-layout on every filter change cannot make the surviving nodes
//! jitter.

use std::collections::BTreeMap;

use crate::models::GraphNode;

/// 2D position on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Compute a position per node id for the given canvas dimensions.
///
/// Layer `i` of `K` sits at `y = height * (i+1) / (K+1)`; within a
/// layer of `m` nodes, node `j` sits at `x = width * (j+1) / (m+1)`.
/// Zero nodes produce an empty mapping.
pub fn layout(nodes: &[GraphNode], width: f64, height: f64) -> BTreeMap<String, Position> {
    // BTreeMap keys give the lexicographic layer order for free; node
    // order within each layer is the model's original order.
    let mut layers: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
    for node in nodes {
        layers.entry(node.kind.as_str()).or_default().push(node);
    }

    let layer_count = layers.len();
    let mut positions = BTreeMap::new();
    for (layer_index, (_, members)) in layers.into_iter().enumerate() {
        let y = height * (layer_index + 1) as f64 / (layer_count + 1) as f64;
        let count = members.len();
        for (slot, node) in members.into_iter().enumerate() {
            let x = width * (slot + 1) as f64 / (count + 1) as f64;
            positions.insert(node.id.clone(), Position::new(x, y));
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;

    fn node(id: &str, kind: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: NodeKind::from(kind.to_string()),
            title: None,
            tags: Vec::new(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_layout_empty() {
        assert!(layout(&[], 300.0, 200.0).is_empty());
    }

    #[test]
    fn test_layout_two_layers_centered() {
        // One capability and one doc on a 300x200 canvas: capability is
        // layer 1 of 2 (y ~= 66.67), doc is layer 2 (y ~= 133.33), and
        // each singleton layer is centered horizontally.
        let nodes = vec![node("cap-1", "capability"), node("doc-1", "doc")];
        let positions = layout(&nodes, 300.0, 200.0);

        let cap = positions["cap-1"];
        assert!(approx(cap.x, 150.0));
        assert!(approx(cap.y, 200.0 * 1.0 / 3.0));

        let doc = positions["doc-1"];
        assert!(approx(doc.x, 150.0));
        assert!(approx(doc.y, 200.0 * 2.0 / 3.0));
    }

    #[test]
    fn test_layout_spreads_within_layer() {
        let nodes = vec![
            node("a", "capability"),
            node("b", "capability"),
            node("c", "capability"),
        ];
        let positions = layout(&nodes, 400.0, 100.0);

        assert!(approx(positions["a"].x, 100.0));
        assert!(approx(positions["b"].x, 200.0));
        assert!(approx(positions["c"].x, 300.0));
        // Single layer sits at the vertical midpoint.
        assert!(approx(positions["a"].y, 50.0));
    }

    #[test]
    fn test_layout_layer_order_is_lexicographic() {
        // Model order has doc first, but "capability" < "doc" so the
        // capability layer comes out on top.
        let nodes = vec![node("doc-1", "doc"), node("cap-1", "capability")];
        let positions = layout(&nodes, 300.0, 300.0);
        assert!(positions["cap-1"].y < positions["doc-1"].y);
    }

    #[test]
    fn test_layout_is_pure() {
        let nodes = vec![
            node("a", "capability"),
            node("b", "doc"),
            node("c", "capability"),
        ];
        let first = layout(&nodes, 640.0, 480.0);
        let second = layout(&nodes, 640.0, 480.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_layout_swap_within_kind_keeps_layer() {
        let nodes = vec![node("a", "capability"), node("b", "capability")];
        let swapped = vec![node("b", "capability"), node("a", "capability")];

        let before = layout(&nodes, 300.0, 200.0);
        let after = layout(&swapped, 300.0, 200.0);

        // Same layer, only the horizontal slots trade places.
        assert_eq!(before["a"].y, after["a"].y);
        assert_eq!(before["a"].x, after["b"].x);
        assert_eq!(before["b"].x, after["a"].x);
    }
}
