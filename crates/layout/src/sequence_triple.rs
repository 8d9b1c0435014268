//! Sequence-triple encoding of a 3D module arrangement.
//!
//! Three permutations of the modules fix, for every pair, one axis along
//! which the earlier module precedes the later one. For modules `a` before
//! `b` in the first permutation:
//!
//! - `b` before `a` in the third permutation: `a` precedes `b` along Y;
//! - otherwise `a` before `b` in the second permutation: along Z;
//! - otherwise: along X.
//!
//! Every relation points forward in the first permutation, so the three
//! constraint graphs are acyclic and coordinates are the longest weighted
//! chains through them. The resulting boxes never overlap and each sits
//! either at zero or against a predecessor's far face.
//!
//! The encoding keeps a committed state and a working copy. Neighborhood
//! moves touch only the working copy; [`SequenceTriple::apply`] commits it
//! and [`SequenceTriple::recover`] discards it.

use crate::module::Module;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use tqec_pack_core::geometry::{Axis, Point3, RotationState};
use tqec_pack_core::placement::ModuleId;
use tqec_pack_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A permutation of module indices with its inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Permutation {
    order: Vec<usize>,
    rank: Vec<usize>,
}

impl Permutation {
    /// Builds a permutation from an ordering of `0..order.len()`.
    ///
    /// Entries outside that range are kept in the order but get no rank, so
    /// [`Permutation::is_bijection`] reports them.
    pub fn from_order(order: Vec<usize>) -> Self {
        let mut rank = vec![usize::MAX; order.len()];
        for (pos, &item) in order.iter().enumerate() {
            if let Some(r) = rank.get_mut(item) {
                *r = pos;
            }
        }
        Self { order, rank }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Module indices in sequence order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Position of `item` in the sequence.
    pub fn rank(&self, item: usize) -> usize {
        self.rank[item]
    }

    /// Returns true if `a` comes before `b`.
    pub fn before(&self, a: usize, b: usize) -> bool {
        self.rank[a] < self.rank[b]
    }

    /// Returns true if the order lists every index in `0..n` exactly once and
    /// the rank map inverts it.
    pub fn is_bijection(&self, n: usize) -> bool {
        if self.order.len() != n || self.rank.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for (pos, &item) in self.order.iter().enumerate() {
            if item >= n || seen[item] || self.rank[item] != pos {
                return false;
            }
            seen[item] = true;
        }
        true
    }

    /// Exchanges the positions of two items.
    pub fn swap_items(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.rank[a], self.rank[b]);
        self.order.swap(ra, rb);
        self.rank[a] = rb;
        self.rank[b] = ra;
    }

    /// Removes `item` and reinserts it at `target` (clamped to the last slot).
    pub fn move_item(&mut self, item: usize, target: usize) {
        if self.order.is_empty() {
            return;
        }
        let from = self.rank[item];
        let to = target.min(self.order.len() - 1);
        if from == to {
            return;
        }
        self.order.remove(from);
        self.order.insert(to, item);
        for pos in from.min(to)..=from.max(to) {
            self.rank[self.order[pos]] = pos;
        }
    }
}

/// Permutations and rotation states of one encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceState {
    /// The three sequences.
    pub permutations: [Permutation; 3],
    /// Accumulated rotation per module index.
    pub rotations: Vec<RotationState>,
}

impl SequenceState {
    /// Axis along which `a` precedes `b`; `a` must come before `b` in the
    /// first permutation.
    pub fn precedence(&self, a: usize, b: usize) -> Axis {
        let [_, p2, p3] = &self.permutations;
        if p3.before(b, a) {
            Axis::Y
        } else if p2.before(a, b) {
            Axis::Z
        } else {
            Axis::X
        }
    }

    /// Returns true if all three permutations are bijections over `0..n`.
    pub fn is_consistent(&self, n: usize) -> bool {
        self.permutations.iter().all(|p| p.is_bijection(n)) && self.rotations.len() == n
    }
}

/// Perturbation applied by [`SequenceTriple::create_neighborhood`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborMove {
    /// Two modules exchanged places in every sequence.
    Swap {
        /// First module.
        a: ModuleId,
        /// Second module.
        b: ModuleId,
    },
    /// One module moved within two of the sequences.
    Shift {
        /// Moved module.
        module: ModuleId,
        /// Indices of the two sequences touched.
        pair: (usize, usize),
    },
    /// One module turned a quarter about an axis.
    Rotate {
        /// Rotated module.
        module: ModuleId,
        /// Rotation axis.
        axis: Axis,
    },
}

impl fmt::Display for NeighborMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighborMove::Swap { a, b } => write!(f, "swap {} <-> {}", a, b),
            NeighborMove::Shift { module, pair } => {
                write!(f, "shift {} in P{}/P{}", module, pair.0 + 1, pair.1 + 1)
            }
            NeighborMove::Rotate { module, axis } => write!(f, "rotate {} about {}", module, axis),
        }
    }
}

const SHIFT_PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

/// Sequence-triple with committed and working states.
#[derive(Debug, Clone)]
pub struct SequenceTriple {
    ids: Vec<ModuleId>,
    committed: SequenceState,
    working: SequenceState,
    pending_rotations: Vec<(usize, Axis)>,
}

impl SequenceTriple {
    /// Encodes the current arrangement of `modules`.
    ///
    /// The first and third sequences sort by ascending Z then X, the second
    /// by descending X then ascending Z. Remaining ties go to the lower
    /// module id.
    pub fn new(modules: &[Module]) -> Result<Self> {
        if modules.is_empty() {
            return Err(Error::MalformedInput(
                "cannot encode an empty module list".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(modules.len());
        for m in modules {
            if !seen.insert(m.id()) {
                return Err(Error::MalformedInput(format!(
                    "duplicate module id {}",
                    m.id()
                )));
            }
        }

        let mut ascending: Vec<usize> = (0..modules.len()).collect();
        ascending.sort_by(|&a, &b| {
            let (pa, pb) = (modules[a].pos(), modules[b].pos());
            pa.z.total_cmp(&pb.z)
                .then(pa.x.total_cmp(&pb.x))
                .then(modules[a].id().cmp(&modules[b].id()))
        });

        let mut descending: Vec<usize> = (0..modules.len()).collect();
        descending.sort_by(|&a, &b| {
            let (pa, pb) = (modules[a].pos(), modules[b].pos());
            pb.x.total_cmp(&pa.x)
                .then(pa.z.total_cmp(&pb.z))
                .then(modules[a].id().cmp(&modules[b].id()))
        });

        let state = SequenceState {
            permutations: [
                Permutation::from_order(ascending.clone()),
                Permutation::from_order(descending),
                Permutation::from_order(ascending),
            ],
            rotations: modules.iter().map(|m| m.rotation()).collect(),
        };

        Ok(Self {
            ids: modules.iter().map(|m| m.id()).collect(),
            working: state.clone(),
            committed: state,
            pending_rotations: Vec::new(),
        })
    }

    /// Number of encoded modules.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Module ids by index.
    pub fn ids(&self) -> &[ModuleId] {
        &self.ids
    }

    /// State of the last applied candidate.
    pub fn committed(&self) -> &SequenceState {
        &self.committed
    }

    /// State being perturbed by the current move.
    pub fn working(&self) -> &SequenceState {
        &self.working
    }

    /// Rotations recorded on the working copy but not yet applied.
    pub fn pending_rotations(&self) -> &[(usize, Axis)] {
        &self.pending_rotations
    }

    /// Perturbs a fresh working copy of the committed state.
    ///
    /// Picks Swap, Shift or Rotate uniformly. A rotation the module refuses
    /// fails with [`Error::RotationRejected`]; the caller should then
    /// [`recover`](Self::recover).
    pub fn create_neighborhood<R: Rng + ?Sized>(
        &mut self,
        modules: &[Module],
        rng: &mut R,
    ) -> Result<NeighborMove> {
        self.recover();
        let n = self.ids.len();

        match rng.gen_range(0..3) {
            0 => {
                let p1 = &self.working.permutations[0];
                let a = p1.order()[rng.gen_range(0..n)];
                let b = p1.order()[rng.gen_range(0..n)];
                for p in &mut self.working.permutations {
                    p.swap_items(a, b);
                }
                Ok(NeighborMove::Swap {
                    a: self.ids[a],
                    b: self.ids[b],
                })
            }
            1 => {
                let m = rng.gen_range(0..n);
                let pair = SHIFT_PAIRS[rng.gen_range(0..SHIFT_PAIRS.len())];
                for idx in [pair.0, pair.1] {
                    let target = rng.gen_range(0..n);
                    self.working.permutations[idx].move_item(m, target);
                }
                Ok(NeighborMove::Shift {
                    module: self.ids[m],
                    pair,
                })
            }
            _ => {
                let m = rng.gen_range(0..n);
                let axis = Axis::ALL[rng.gen_range(0..Axis::ALL.len())];
                let module = modules.get(m).ok_or_else(|| {
                    Error::InfeasiblePlacement(format!("no module at index {}", m))
                })?;
                module.can_rotate(axis)?;
                self.pending_rotations.push((m, axis));
                self.working.rotations[m].turn(axis);
                Ok(NeighborMove::Rotate {
                    module: self.ids[m],
                    axis,
                })
            }
        }
    }

    fn check_modules(&self, modules: &[Module]) -> Result<()> {
        if modules.len() != self.ids.len() {
            return Err(Error::InfeasiblePlacement(format!(
                "encoding covers {} modules, got {}",
                self.ids.len(),
                modules.len()
            )));
        }
        if let Some((m, id)) = modules
            .iter()
            .zip(&self.ids)
            .find(|(m, id)| m.id() != **id)
        {
            return Err(Error::InfeasiblePlacement(format!(
                "module {} found where {} was encoded",
                m.id(),
                id
            )));
        }
        Ok(())
    }

    /// Computes the arrangement encoded by the working copy.
    ///
    /// Returns repositioned clones of `modules` with pending rotations
    /// applied; `modules` itself is not touched.
    pub fn recalculate_coordinate(&self, modules: &[Module]) -> Result<Vec<Module>> {
        self.check_modules(modules)?;
        let n = self.ids.len();
        if !self.working.is_consistent(n) {
            return Err(Error::InfeasiblePlacement(
                "working sequences are not permutations of the module set".to_string(),
            ));
        }

        let mut placed = modules.to_vec();
        for &(m, axis) in &self.pending_rotations {
            placed[m].rotate(axis)?;
        }

        let order = self.working.permutations[0].order();
        let mut coords = vec![[0.0_f64; 3]; n];
        for (q, &b) in order.iter().enumerate() {
            for &a in &order[..q] {
                let axis = self.working.precedence(a, b);
                let i = axis.index();
                let reach = coords[a][i] + placed[a].extent(axis);
                if reach > coords[b][i] {
                    coords[b][i] = reach;
                }
            }
        }

        for (module, c) in placed.iter_mut().zip(&coords) {
            module.set_pos(Point3::new(c[0], c[1], c[2]), true);
        }
        Ok(placed)
    }

    /// Commits the working copy and moves `modules` into the `candidate`
    /// arrangement.
    ///
    /// Pending rotations are checked before anything moves, so an error
    /// leaves `modules` and the committed state untouched.
    pub fn apply(&mut self, modules: &mut [Module], candidate: &[Module]) -> Result<()> {
        self.check_modules(modules)?;
        self.check_modules(candidate)?;
        for &(m, axis) in &self.pending_rotations {
            modules[m].can_rotate(axis)?;
        }

        for &(m, axis) in &self.pending_rotations {
            modules[m].rotate(axis)?;
        }
        for (module, placed) in modules.iter_mut().zip(candidate) {
            module.set_pos(*placed.pos(), true);
        }

        self.committed = self.working.clone();
        self.pending_rotations.clear();
        Ok(())
    }

    /// Discards the working copy.
    pub fn recover(&mut self) {
        self.working.clone_from(&self.committed);
        self.pending_rotations.clear();
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> SequenceState {
        self.committed.clone()
    }

    /// Replaces the committed state and discards the working copy.
    pub fn restore(&mut self, state: SequenceState) {
        self.committed = state;
        self.recover();
    }
}
