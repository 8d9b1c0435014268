//! Rigid 3D modules: the unit the placer moves and rotates.

use crate::graph::{Edge, EdgeCategory, EdgeId, Node, NodeId, NodeKind};
use crate::loops::LoopType;
use std::fmt;
use tqec_pack_core::geometry::{is_odd, quarter_turn, Axis, Point3, RotationState, Vector3};
use tqec_pack_core::placement::{ModuleId, Placement};
use tqec_pack_core::transform::AABB3D;
use tqec_pack_core::{Error, Result};

/// Clearance around frame nodes included in the module boxes.
const FRAME_MARGIN: f64 = 1.0;

/// The geometric realization of one loop.
///
/// A module owns its node and edge arenas. The cached boxes are refreshed by
/// [`Module::update`], which every geometric mutator calls; code that moves
/// nodes through [`Module::node_mut`] must call it itself.
#[derive(Debug, Clone)]
pub struct Module {
    id: ModuleId,
    loop_type: LoopType,
    pins: u32,
    caps: u32,

    nodes: Vec<Node>,
    edges: Vec<Edge>,
    frame_nodes: Vec<NodeId>,
    cross_nodes: Vec<NodeId>,
    frame_edges: Vec<EdgeId>,
    cross_edges: Vec<EdgeId>,
    cross_ids: Vec<i64>,

    /// Corner and extents of the full box (cross nodes and inflated frame).
    pos: Point3,
    size: Vector3,
    /// Corner and extents of the inflated frame alone.
    inner_pos: Point3,
    inner_size: Vector3,

    rotation: RotationState,
}

impl Module {
    /// Creates an empty module.
    pub fn new(id: ModuleId, loop_type: LoopType, pins: u32, caps: u32) -> Self {
        Self {
            id,
            loop_type,
            pins,
            caps,
            nodes: Vec::new(),
            edges: Vec::new(),
            frame_nodes: Vec::new(),
            cross_nodes: Vec::new(),
            frame_edges: Vec::new(),
            cross_edges: Vec::new(),
            cross_ids: Vec::new(),
            pos: Point3::origin(),
            size: Vector3::zeros(),
            inner_pos: Point3::origin(),
            inner_size: Vector3::zeros(),
            rotation: RotationState::identity(),
        }
    }

    fn push_node(&mut self, label: i64, kind: NodeKind, pos: Point3) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, label, kind, pos));
        id
    }

    fn push_edge(&mut self, label: i64, n1: NodeId, n2: NodeId, category: EdgeCategory) -> EdgeId {
        let id = EdgeId(self.edges.len());
        let edge = Edge::new(id, label, &self.nodes, n1, n2).with_category(category);
        self.edges.push(edge);
        self.nodes[n1.0].add_connected(n2);
        self.nodes[n2.0].add_connected(n1);
        id
    }

    /// Adds a frame node.
    pub fn add_frame_node(&mut self, label: i64, kind: NodeKind, pos: Point3) -> NodeId {
        let id = self.push_node(label, kind, pos);
        self.frame_nodes.push(id);
        id
    }

    /// Adds a cross node.
    pub fn add_cross_node(&mut self, label: i64, kind: NodeKind, pos: Point3) -> NodeId {
        let id = self.push_node(label, kind, pos);
        self.cross_nodes.push(id);
        id
    }

    /// Adds a frame edge and records the connection on both endpoints.
    pub fn add_frame_edge(
        &mut self,
        label: i64,
        n1: NodeId,
        n2: NodeId,
        category: EdgeCategory,
    ) -> EdgeId {
        let id = self.push_edge(label, n1, n2, category);
        self.frame_edges.push(id);
        id
    }

    /// Adds a cross edge for crossed loop `cross_id`.
    pub fn add_cross_edge(&mut self, cross_id: i64, n1: NodeId, n2: NodeId) -> EdgeId {
        let id = self.push_edge(cross_id, n1, n2, EdgeCategory::Edge);
        self.cross_edges.push(id);
        self.cross_ids.push(cross_id);
        id
    }

    /// Links two edges that cross each other.
    pub fn link_crossing(&mut self, a: EdgeId, b: EdgeId) {
        self.edges[a.0].add_cross_edge(b);
        self.edges[b.0].add_cross_edge(a);
    }

    /// Id of the loop this module was built from.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Type of the source loop.
    pub fn loop_type(&self) -> LoopType {
        self.loop_type
    }

    /// Number of pin injectors.
    pub fn pins(&self) -> u32 {
        self.pins
    }

    /// Number of cap injectors.
    pub fn caps(&self) -> u32 {
        self.caps
    }

    /// Returns true if the module has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node arena.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edge arena.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Looks up a node by index.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Mutable node access. Call [`Module::update`] after moving nodes.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Looks up an edge by index.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    /// Mutable edge access. Call [`Edge::refresh_dir`] after moving its nodes.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0)
    }

    /// Nodes of the frame ladder.
    pub fn frame_nodes(&self) -> &[NodeId] {
        &self.frame_nodes
    }

    /// Endpoints of the cross edges.
    pub fn cross_nodes(&self) -> &[NodeId] {
        &self.cross_nodes
    }

    /// Rails, closing rungs and injector rungs.
    pub fn frame_edges(&self) -> &[EdgeId] {
        &self.frame_edges
    }

    /// Edges threaded between the rails, one per crossing.
    pub fn cross_edges(&self) -> &[EdgeId] {
        &self.cross_edges
    }

    /// Crossed loop ids, one per cross edge.
    pub fn cross_ids(&self) -> &[i64] {
        &self.cross_ids
    }

    /// Injector edges (pin and cap rungs) of the frame.
    pub fn injector_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.frame_edges
            .iter()
            .map(move |id| &self.edges[id.0])
            .filter(|e| e.category() != EdgeCategory::Edge)
    }

    /// Positions of every frame and cross node.
    pub fn positions(&self) -> impl Iterator<Item = &Point3> + '_ {
        self.frame_nodes
            .iter()
            .chain(self.cross_nodes.iter())
            .map(move |id| self.nodes[id.0].pos())
    }

    /// Quarter turns applied so far.
    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    /// Minimum corner of the full box.
    pub fn pos(&self) -> &Point3 {
        &self.pos
    }

    /// Extents of the full box.
    pub fn size(&self) -> &Vector3 {
        &self.size
    }

    /// Minimum corner of the box around the nodes alone.
    pub fn inner_pos(&self) -> &Point3 {
        &self.inner_pos
    }

    /// Extents of the box around the nodes alone.
    pub fn inner_size(&self) -> &Vector3 {
        &self.inner_size
    }

    /// Extent along X.
    pub fn width(&self) -> f64 {
        self.size.x
    }

    /// Extent along Y.
    pub fn height(&self) -> f64 {
        self.size.y
    }

    /// Extent along Z.
    pub fn depth(&self) -> f64 {
        self.size.z
    }

    /// Extent of the full box along `axis`.
    pub fn extent(&self, axis: Axis) -> f64 {
        self.size[axis.index()]
    }

    /// The full box as of the last update.
    pub fn bounds(&self) -> AABB3D<f64> {
        AABB3D::from_corner(&self.pos, &self.size)
    }

    /// The inflated frame box as of the last update.
    pub fn inner_bounds(&self) -> AABB3D<f64> {
        AABB3D::from_corner(&self.inner_pos, &self.inner_size)
    }

    /// Returns true if the full boxes share positive volume.
    pub fn overlaps(&self, other: &Module) -> bool {
        self.bounds().overlaps(&other.bounds())
    }

    /// Recomputes both cached boxes from the node positions.
    pub fn try_update(&mut self) -> Result<()> {
        let frame = self.frame_nodes.iter().map(|id| self.nodes[id.0].pos());
        let inner = AABB3D::from_points(frame, FRAME_MARGIN).ok_or_else(|| {
            Error::InvalidGeometryOperation(format!("module {} has no frame nodes", self.id))
        })?;

        let cross = self.cross_nodes.iter().map(|id| self.nodes[id.0].pos());
        let outer = match AABB3D::from_points(cross, 0.0) {
            Some(cross_box) => inner.union(&cross_box),
            None => inner,
        };

        self.inner_pos = inner.min_corner();
        self.inner_size = inner.size();
        self.pos = outer.min_corner();
        self.size = outer.size();
        Ok(())
    }

    /// Recomputes both cached boxes from the node positions.
    ///
    /// # Panics
    ///
    /// Panics if the module has no frame nodes.
    pub fn update(&mut self) {
        if let Err(e) = self.try_update() {
            panic!("cannot compute module bounds: {}", e);
        }
    }

    /// Moves every node by `delta`.
    pub fn translate(&mut self, delta: &Vector3) {
        for node in &mut self.nodes {
            node.move_by(delta);
        }
        self.update();
    }

    /// Sets the box corner.
    ///
    /// With `replace` the nodes move along; without it only the cached
    /// corner changes.
    pub fn set_pos(&mut self, pos: Point3, replace: bool) {
        if replace {
            let delta = pos - self.pos;
            self.translate(&delta);
        } else {
            self.pos = pos;
        }
    }

    /// Checks whether a quarter turn about `axis` keeps every frame node on
    /// its parity lattice.
    pub fn can_rotate(&self, axis: Axis) -> Result<()> {
        let center = self.bounds().center();
        let c = axis.parity_component();
        for id in &self.frame_nodes {
            let rel = self.nodes[id.0].pos() - center;
            let turned = quarter_turn(axis, &rel);
            if is_odd(rel[c]) != is_odd(turned[c]) {
                return Err(Error::RotationRejected {
                    module: self.id,
                    axis,
                });
            }
        }
        Ok(())
    }

    /// Rotates the module by 90° about `axis` through its box center.
    ///
    /// On rejection nothing is modified.
    pub fn rotate(&mut self, axis: Axis) -> Result<()> {
        self.can_rotate(axis)?;

        let center = self.bounds().center();
        for node in &mut self.nodes {
            let rel = node.pos() - center;
            node.assign(center + quarter_turn(axis, &rel));
        }
        for edge in &mut self.edges {
            edge.refresh_dir(&self.nodes);
        }
        self.update();
        self.rotation.turn(axis);
        Ok(())
    }

    /// Final placement record of this module.
    pub fn placement(&self) -> Placement {
        Placement::new(self.id, self.pos, self.size).with_rotation(self.rotation)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.id)?;
        writeln!(f, "pos: ({}, {}, {})", self.pos.x, self.pos.y, self.pos.z)?;
        writeln!(f, "width: {}", self.width())?;
        writeln!(f, "height: {}", self.height())?;
        write!(f, "depth: {}", self.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ModuleFactory;
    use crate::loops::Loop;
    use approx::assert_relative_eq;

    fn plain_module() -> Module {
        ModuleFactory::new().create(&Loop::new(1, LoopType::Primal))
    }

    fn positions(module: &Module) -> Vec<Point3> {
        module.nodes().iter().map(|n| *n.pos()).collect()
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut module = plain_module();
        let before = (module.bounds(), module.inner_bounds());
        module.update();
        module.update();
        assert_eq!((module.bounds(), module.inner_bounds()), before);
    }

    #[test]
    fn test_translate_and_set_pos() {
        let mut module = plain_module();
        let size = *module.size();

        module.set_pos(Point3::new(4.0, 0.0, 10.0), true);
        assert_eq!(module.pos(), &Point3::new(4.0, 0.0, 10.0));
        assert_eq!(module.size(), &size);
        assert!(module
            .positions()
            .all(|p| module.bounds().contains_point(p)));

        let nodes = positions(&module);
        module.set_pos(Point3::origin(), false);
        assert_eq!(module.pos(), &Point3::origin());
        assert_eq!(positions(&module), nodes);
    }

    #[test]
    fn test_rotation_round_trip() {
        let mut module = plain_module();
        let start = positions(&module);
        let bounds = module.bounds();

        for _ in 0..4 {
            module.rotate(Axis::X).unwrap();
        }

        assert_eq!(positions(&module), start);
        assert_eq!(module.bounds(), bounds);
        assert!(module.rotation().is_identity());
    }

    #[test]
    fn test_rejected_rotation_leaves_module_untouched() {
        let mut module = plain_module();
        let start = positions(&module);
        let bounds = module.bounds();

        let result = module.rotate(Axis::Z);
        assert!(matches!(
            result,
            Err(Error::RotationRejected { module: 1, axis: Axis::Z })
        ));
        assert_eq!(positions(&module), start);
        assert_eq!(module.bounds(), bounds);
        assert!(module.rotation().is_identity());
    }

    #[test]
    fn test_rotation_refreshes_edge_direction() {
        let mut module = plain_module();
        let rail = module.frame_edges()[0];
        assert_eq!(module.edge(rail).unwrap().dir(), Axis::Z);

        module.rotate(Axis::X).unwrap();
        assert_eq!(module.edge(rail).unwrap().dir(), Axis::Y);
        assert_relative_eq!(module.height(), 4.0);
        assert_relative_eq!(module.depth(), 4.0);
    }

    #[test]
    fn test_empty_module() {
        let mut module = Module::new(9, LoopType::Dual, 0, 0);
        assert!(module.is_empty());
        assert!(matches!(
            module.try_update(),
            Err(Error::InvalidGeometryOperation(_))
        ));
    }

    #[test]
    #[should_panic(expected = "cannot compute module bounds")]
    fn test_empty_module_update_panics() {
        Module::new(9, LoopType::Dual, 0, 0).update();
    }

    #[test]
    fn test_display() {
        let text = plain_module().to_string();
        assert!(text.starts_with("--- 1 ---"));
        assert!(text.contains("pos: (-1, -1, -1)"));
        assert!(text.ends_with("depth: 4"));
    }
}
