//! Node and edge types of a module's frame and cross geometry.
//!
//! Nodes and edges live in per-module arenas and refer to each other by
//! index. A node is identified by its [`NodeId`], never by its position: two
//! nodes may share a location and remain distinct. [`Node::coincides`] is the
//! explicit geometric test.

use std::fmt;
use tqec_pack_core::geometry::{Axis, Point3, Vector3};
use tqec_pack_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a node inside its module's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub usize);

/// Index of an edge inside its module's edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeId(pub usize);

/// Semantic tag carried by nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    /// Injector pin.
    Pin,
    /// Injector cap.
    Cap,
    /// Untagged.
    #[default]
    None,
    /// Primal defect.
    Primal,
    /// Dual defect.
    Dual,
}

impl NodeKind {
    /// Returns true for the injector kinds.
    pub fn is_injector(self) -> bool {
        matches!(self, NodeKind::Pin | NodeKind::Cap)
    }

    /// Swaps primal and dual; other kinds are unchanged.
    pub fn opposite(self) -> Self {
        match self {
            NodeKind::Primal => NodeKind::Dual,
            NodeKind::Dual => NodeKind::Primal,
            other => other,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Pin => "pin",
            NodeKind::Cap => "cap",
            NodeKind::None => "none",
            NodeKind::Primal => "primal",
            NodeKind::Dual => "dual",
        };
        f.write_str(name)
    }
}

/// Structural role of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EdgeCategory {
    /// Plain frame or cross segment.
    #[default]
    Edge,
    /// Injector rung carrying a pin.
    Pin,
    /// Injector rung carrying a cap.
    Cap,
}

/// A lattice point of a module.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    id: NodeId,
    label: i64,
    kind: NodeKind,
    pos: Point3,
    color: f64,
    connected: Vec<NodeId>,
}

impl Node {
    /// Creates a new node at `pos`.
    pub fn new(id: NodeId, label: i64, kind: NodeKind, pos: Point3) -> Self {
        Self {
            id,
            label,
            kind,
            pos,
            color: 0.0,
            connected: Vec::new(),
        }
    }

    /// Index of this node in its module.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Loop or cross id this node was created for.
    pub fn label(&self) -> i64 {
        self.label
    }

    /// Semantic tag.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Current position.
    pub fn pos(&self) -> &Point3 {
        &self.pos
    }

    /// Display color.
    pub fn color(&self) -> f64 {
        self.color
    }

    /// Nodes joined to this one by an edge.
    pub fn connected(&self) -> &[NodeId] {
        &self.connected
    }

    /// Retags the node.
    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    /// Sets the display color.
    pub fn set_color(&mut self, color: f64) {
        self.color = color;
    }

    /// Moves the node to `pos`.
    pub fn assign(&mut self, pos: Point3) {
        self.pos = pos;
    }

    /// Moves the node by `delta`.
    pub fn move_by(&mut self, delta: &Vector3) {
        self.pos += *delta;
    }

    /// Records a connection; repeated connections are kept once.
    pub fn add_connected(&mut self, other: NodeId) {
        if !self.connected.contains(&other) {
            self.connected.push(other);
        }
    }

    /// Removes a connection.
    pub fn remove_connected(&mut self, other: NodeId) -> Result<()> {
        match self.connected.iter().position(|&n| n == other) {
            Some(idx) => {
                self.connected.remove(idx);
                Ok(())
            }
            None => Err(Error::InvalidGeometryOperation(format!(
                "node {} is not connected to node {}",
                self.id.0, other.0
            ))),
        }
    }

    /// Returns true if both nodes sit at the same position.
    pub fn coincides(&self, other: &Node) -> bool {
        self.pos == other.pos
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}) {} #{}",
            self.pos.x, self.pos.y, self.pos.z, self.kind, self.label
        )
    }
}

/// Axis along which two points differ (X first, then Y, else Z).
pub fn direction_between(a: &Point3, b: &Point3) -> Axis {
    if a.x != b.x {
        Axis::X
    } else if a.y != b.y {
        Axis::Y
    } else {
        Axis::Z
    }
}

/// A segment between two nodes of the same module.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Edge {
    id: EdgeId,
    label: i64,
    kind: NodeKind,
    category: EdgeCategory,
    dir: Axis,
    node1: NodeId,
    node2: NodeId,
    cross_edges: Vec<EdgeId>,
    color: f64,
}

impl Edge {
    /// Creates an edge between two nodes of `nodes`.
    ///
    /// The edge takes its kind from `node1` and its direction from the
    /// endpoint positions.
    pub fn new(id: EdgeId, label: i64, nodes: &[Node], node1: NodeId, node2: NodeId) -> Self {
        let a = &nodes[node1.0];
        let b = &nodes[node2.0];
        Self {
            id,
            label,
            kind: a.kind(),
            category: EdgeCategory::Edge,
            dir: direction_between(a.pos(), b.pos()),
            node1,
            node2,
            cross_edges: Vec::new(),
            color: 0.0,
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: EdgeCategory) -> Self {
        self.category = category;
        self
    }

    /// Index of this edge in its module.
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Loop or cross id this edge was created for.
    pub fn label(&self) -> i64 {
        self.label
    }

    /// Tag inherited from `node1` at construction.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Structural role.
    pub fn category(&self) -> EdgeCategory {
        self.category
    }

    /// Axis the edge runs along.
    pub fn dir(&self) -> Axis {
        self.dir
    }

    /// First endpoint.
    pub fn node1(&self) -> NodeId {
        self.node1
    }

    /// Second endpoint.
    pub fn node2(&self) -> NodeId {
        self.node2
    }

    /// Display color.
    pub fn color(&self) -> f64 {
        self.color
    }

    /// Sets the display color.
    pub fn set_color(&mut self, color: f64) {
        self.color = color;
    }

    /// Edges this edge crosses.
    pub fn cross_edges(&self) -> &[EdgeId] {
        &self.cross_edges
    }

    /// Links a crossed edge.
    pub fn add_cross_edge(&mut self, other: EdgeId) {
        if !self.cross_edges.contains(&other) {
            self.cross_edges.push(other);
        }
    }

    /// Returns true for pin and cap edges.
    pub fn is_injector(&self) -> bool {
        self.kind.is_injector()
    }

    /// Returns the endpoint opposite to `node`.
    pub fn alt_node(&self, node: NodeId) -> Result<NodeId> {
        if node == self.node1 {
            Ok(self.node2)
        } else if node == self.node2 {
            Ok(self.node1)
        } else {
            Err(Error::InvalidGeometryOperation(format!(
                "node {} is not an endpoint of edge {}",
                node.0, self.id.0
            )))
        }
    }

    /// Midpoint of the two endpoints.
    pub fn midpoint(&self, nodes: &[Node]) -> Point3 {
        let a = nodes[self.node1.0].pos();
        let b = nodes[self.node2.0].pos();
        nalgebra::center(a, b)
    }

    /// Recomputes the direction after the endpoints moved.
    pub fn refresh_dir(&mut self, nodes: &[Node]) {
        self.dir = direction_between(nodes[self.node1.0].pos(), nodes[self.node2.0].pos());
    }
}
