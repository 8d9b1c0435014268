//! Builds modules from loop records.
//!
//! A module is a ladder in the x = 0 plane: two rails running along Z
//! (lower at y = 0, upper at y = 2) with nodes every 2 units, closed by rungs
//! at both ends. Crossed loops become short X-direction cross edges threaded
//! between the rails, one per lattice cell, followed by injector rungs that
//! carry two pins or caps each.

use crate::graph::{EdgeCategory, NodeKind};
use crate::loops::Loop;
use crate::module::Module;
use tqec_pack_core::geometry::Point3;

const RAIL_SPACING: f64 = 2.0;
const CELL: f64 = 2.0;

/// Creates modules from loops.
#[derive(Debug, Clone)]
pub struct ModuleFactory {
    frame_color: f64,
    cross_color: f64,
}

impl Default for ModuleFactory {
    fn default() -> Self {
        Self {
            frame_color: 0.0,
            cross_color: 1.0,
        }
    }
}

impl ModuleFactory {
    /// Creates a factory with default display colors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display colors of frame and cross geometry.
    pub fn with_colors(mut self, frame: f64, cross: f64) -> Self {
        self.frame_color = frame;
        self.cross_color = cross;
        self
    }

    /// Number of lattice cells along the rails for `source`.
    pub fn frame_length(source: &Loop) -> usize {
        let cross_len = source.cross().len().max(1);
        let injector_rungs = (source.injectors() as usize).div_ceil(2);
        cross_len + injector_rungs
    }

    /// Builds the module for one loop.
    pub fn create(&self, source: &Loop) -> Module {
        let id = source.id();
        let kind = source.loop_type().node_kind();
        let cross_len = source.cross().len().max(1);
        let length = Self::frame_length(source);

        let mut module = Module::new(id, source.loop_type(), source.pins(), source.caps());

        let mut lower = Vec::with_capacity(length + 1);
        let mut upper = Vec::with_capacity(length + 1);
        for k in 0..=length {
            let z = CELL * k as f64;
            lower.push(module.add_frame_node(id, kind, Point3::new(0.0, 0.0, z)));
            upper.push(module.add_frame_node(id, kind, Point3::new(0.0, RAIL_SPACING, z)));
        }

        let mut lower_rail = Vec::with_capacity(length);
        let mut upper_rail = Vec::with_capacity(length);
        for k in 0..length {
            lower_rail.push(module.add_frame_edge(id, lower[k], lower[k + 1], EdgeCategory::Edge));
            upper_rail.push(module.add_frame_edge(id, upper[k], upper[k + 1], EdgeCategory::Edge));
        }
        module.add_frame_edge(id, upper[0], lower[0], EdgeCategory::Edge);
        module.add_frame_edge(id, upper[length], lower[length], EdgeCategory::Edge);

        // Pins first, then caps, two per rung with the upper node first.
        let mut slots = std::iter::repeat(NodeKind::Pin)
            .take(source.pins() as usize)
            .chain(std::iter::repeat(NodeKind::Cap).take(source.caps() as usize));
        let mut k = cross_len;
        while let Some(first) = slots.next() {
            let second = slots.next();
            if let Some(node) = module.node_mut(upper[k]) {
                node.set_kind(first);
            }
            if let (Some(kind), Some(node)) = (second, module.node_mut(lower[k])) {
                node.set_kind(kind);
            }
            let category = if first == NodeKind::Pin {
                EdgeCategory::Pin
            } else {
                EdgeCategory::Cap
            };
            module.add_frame_edge(id, upper[k], lower[k], category);
            k += 1;
        }

        let cross_kind = kind.opposite();
        for (i, &cross_id) in source.cross().iter().enumerate() {
            let z = CELL * i as f64 + CELL / 2.0;
            let front = module.add_cross_node(cross_id, cross_kind, Point3::new(1.0, 1.0, z));
            let back = module.add_cross_node(cross_id, cross_kind, Point3::new(-1.0, 1.0, z));
            let edge = module.add_cross_edge(cross_id, front, back);
            module.link_crossing(edge, lower_rail[i]);
            module.link_crossing(edge, upper_rail[i]);
        }

        self.paint(&mut module);
        module.update();
        log::trace!(
            "built module {}: {} nodes, {} edges",
            id,
            module.nodes().len(),
            module.edges().len()
        );
        module
    }

    /// Builds one module per loop, in input order.
    pub fn create_all(&self, loops: &[Loop]) -> Vec<Module> {
        loops.iter().map(|l| self.create(l)).collect()
    }

    fn paint(&self, module: &mut Module) {
        let frame: Vec<_> = module.frame_nodes().to_vec();
        let cross: Vec<_> = module.cross_nodes().to_vec();
        for (ids, color) in [(frame, self.frame_color), (cross, self.cross_color)] {
            for id in ids {
                if let Some(node) = module.node_mut(id) {
                    node.set_color(color);
                }
            }
        }

        let frame: Vec<_> = module.frame_edges().to_vec();
        let cross: Vec<_> = module.cross_edges().to_vec();
        for (ids, color) in [(frame, self.frame_color), (cross, self.cross_color)] {
            for id in ids {
                if let Some(edge) = module.edge_mut(id) {
                    edge.set_color(color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loops::LoopType;
    use approx::assert_relative_eq;
    use tqec_pack_core::geometry::Axis;

    #[test]
    fn test_plain_loop_is_closed_frame() {
        let module = ModuleFactory::new().create(&Loop::new(0, LoopType::Primal));

        assert_eq!(module.frame_nodes().len(), 4);
        assert_eq!(module.frame_edges().len(), 4);
        assert!(module.cross_nodes().is_empty());
        assert_eq!(module.injector_edges().count(), 0);
        assert!(module
            .nodes()
            .iter()
            .all(|n| n.connected().len() == 2));

        assert_eq!(module.pos(), &Point3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(module.width(), 2.0);
        assert_relative_eq!(module.height(), 4.0);
        assert_relative_eq!(module.depth(), 4.0);
    }

    #[test]
    fn test_cross_and_injectors() {
        let source = Loop::new(5, LoopType::Dual)
            .with_cross(vec![1, 2])
            .with_pins(1)
            .with_caps(1);
        let module = ModuleFactory::new().create(&source);

        assert_eq!(ModuleFactory::frame_length(&source), 3);
        assert_eq!(module.cross_nodes().len(), 4);
        assert_eq!(module.cross_ids(), &[1, 2]);
        assert_relative_eq!(module.depth(), 8.0);

        let injectors: Vec<_> = module.injector_edges().collect();
        assert_eq!(injectors.len(), 1);
        assert_eq!(injectors[0].category(), EdgeCategory::Pin);
        assert_eq!(injectors[0].kind(), NodeKind::Pin);
        assert_eq!(injectors[0].dir(), Axis::Y);
        let lower = module.node(injectors[0].node2()).unwrap();
        assert_eq!(lower.kind(), NodeKind::Cap);
        assert_relative_eq!(lower.pos().z, 4.0);

        for &edge_id in module.cross_edges() {
            let edge = module.edge(edge_id).unwrap();
            assert_eq!(edge.dir(), Axis::X);
            assert_eq!(edge.cross_edges().len(), 2);
            let node = module.node(edge.node1()).unwrap();
            assert_eq!(node.kind(), NodeKind::Primal);
        }
    }

    #[test]
    fn test_odd_injector_count_rounds_up() {
        let source = Loop::new(2, LoopType::Primal).with_caps(3);
        let module = ModuleFactory::new().create(&source);

        assert_eq!(ModuleFactory::frame_length(&source), 3);
        let categories: Vec<_> = module.injector_edges().map(|e| e.category()).collect();
        assert_eq!(categories, vec![EdgeCategory::Cap, EdgeCategory::Cap]);
    }

    #[test]
    fn test_factory_is_deterministic() {
        let source = Loop::new(3, LoopType::Primal).with_cross(vec![4]).with_pins(2);
        let factory = ModuleFactory::new();
        let a = factory.create(&source);
        let b = factory.create(&source);
        let pa: Vec<_> = a.nodes().iter().map(|n| *n.pos()).collect();
        let pb: Vec<_> = b.nodes().iter().map(|n| *n.pos()).collect();
        assert_eq!(pa, pb);
        assert_eq!(a.bounds(), b.bounds());
    }

    #[test]
    fn test_colors_reach_nodes_and_edges() {
        let source = Loop::new(1, LoopType::Primal).with_cross(vec![2]).with_pins(1);
        let module = ModuleFactory::new().with_colors(0.25, 0.75).create(&source);

        for &id in module.frame_nodes() {
            assert_relative_eq!(module.node(id).unwrap().color(), 0.25);
        }
        for &id in module.frame_edges() {
            assert_relative_eq!(module.edge(id).unwrap().color(), 0.25);
        }
        for &id in module.cross_nodes() {
            assert_relative_eq!(module.node(id).unwrap().color(), 0.75);
        }
        for &id in module.cross_edges() {
            assert_relative_eq!(module.edge(id).unwrap().color(), 0.75);
        }
    }
}
