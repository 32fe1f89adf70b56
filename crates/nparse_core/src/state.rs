//! Analysis states.
//!
//! A state is one node of the search tree the traveller grows over the
//! acceptor network: it records the arc it was produced through, the range
//! that arc's acceptor consumed, the portion of the target node's bunch
//! still unexpanded, and the innermost invocation frame (*callee*) it runs
//! under. States only ever point *upward*, so the tree is acyclic even
//! though the network is not.
//!
//! Four variants exist. A *common* state is an ordinary transition. The
//! three *split* variants are synthesized when a nested frame reaches an
//! endpoint and the caller resumes: a plain split (assertion return, no
//! consumption), a shifted split (invocation return, callee's range) and an
//! extended split (invocation return, range stretched from the invocation
//! start to the callee's end).
//!
//! States live in a dense store backed by the byte pool of `nparse-base`;
//! identifiers are allocation-ordered, which gives the engine its cheapest
//! invariant: every ancestor has a smaller identifier than its descendants.

use crate::model::{ArcId, ArcKind, NodeId, Range};
use nparse_base::{Result, StatePool};
use std::fmt;
use std::mem;
use std::path::PathBuf;

/// Index of a state within its [`StateStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    /// Sink sentinel for probe spectra; never resolves to a stored state.
    pub const DISCARD: StateId = StateId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The variant of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Common,
    Split,
    SplitShifted,
    SplitExtended,
}

/// One node of the search tree. Immutable after spawning except for the
/// blocked flag and the bunch cursor.
#[derive(Debug, Clone)]
pub struct State {
    pub kind: StateKind,
    ancestor: Option<StateId>,
    blocked: bool,
    pub arc: ArcId,
    pub range: Range,
    /// Node whose bunch this state expands.
    pub bunch_node: NodeId,
    /// Next unconsumed arc within the bunch.
    pub bunch_next: u32,
    pub callee: Option<StateId>,
    pub caller: Option<StateId>,
    /// Final callee state, for shifted and extended splits.
    pub shift: Option<StateId>,
}

impl State {
    /// Pool charge per state.
    pub const ALLOC_SIZE: usize = mem::size_of::<State>();

    pub fn is_split(&self) -> bool {
        self.kind != StateKind::Common
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

/// Dense, pool-governed storage for analysis states.
///
/// The pool owns the byte budget (heap region or swap file); state records
/// live in a vector in allocation order. The strict last-in eviction
/// discipline keeps the vector and the pool cursor aligned.
pub struct StateStore {
    states: Vec<State>,
    pool: StatePool,
}

impl StateStore {
    pub fn new() -> Self {
        StateStore {
            states: Vec::new(),
            pool: StatePool::new(),
        }
    }

    pub fn set_capacity(&mut self, bytes: usize) -> Result<()> {
        self.pool.set_capacity(bytes)
    }

    pub fn set_swap_file(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.pool.set_swap_file(path)
    }

    pub fn pool(&self) -> &StatePool {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn get_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.index()]
    }

    /// Spawns a common state produced by traversing `arc` from `ancestor`.
    ///
    /// A non-simple arc opens a new invocation frame, so the spawned state
    /// becomes its own callee; otherwise the callee is inherited.
    pub fn alloc_common(
        &mut self,
        ancestor: Option<StateId>,
        arc: ArcId,
        arc_kind: ArcKind,
        target: NodeId,
        range: Range,
    ) -> Result<StateId> {
        let id = StateId(self.states.len() as u32);
        let callee = if arc_kind != ArcKind::Simple {
            Some(id)
        } else {
            ancestor.and_then(|a| self.get(a).callee)
        };
        debug_assert!(ancestor.map_or(true, |a| a < id));
        self.pool.allocate(State::ALLOC_SIZE)?;
        self.states.push(State {
            kind: StateKind::Common,
            ancestor,
            blocked: false,
            arc,
            range,
            bunch_node: target,
            bunch_next: 0,
            callee,
            caller: None,
            shift: None,
        });
        Ok(id)
    }

    /// Spawns an assertion-return split: the caller resumes with its own
    /// range, bunch position and frame.
    pub fn alloc_split(&mut self, caller: StateId) -> Result<StateId> {
        let c = self.get(caller).clone();
        self.alloc_split_inner(StateKind::Split, caller, &c, c.range, None)
    }

    /// Spawns an invocation-return split carrying the callee's range.
    pub fn alloc_split_shifted(&mut self, caller: StateId, shift: StateId) -> Result<StateId> {
        let c = self.get(caller).clone();
        let range = self.get(shift).range;
        self.alloc_split_inner(StateKind::SplitShifted, caller, &c, range, Some(shift))
    }

    /// Spawns an invocation-return split whose range spans from the caller's
    /// end to the callee's end.
    pub fn alloc_split_extended(&mut self, caller: StateId, shift: StateId) -> Result<StateId> {
        let c = self.get(caller).clone();
        let range = Range::new(c.range.last, self.get(shift).range.last);
        self.alloc_split_inner(StateKind::SplitExtended, caller, &c, range, Some(shift))
    }

    fn alloc_split_inner(
        &mut self,
        kind: StateKind,
        caller: StateId,
        c: &State,
        range: Range,
        shift: Option<StateId>,
    ) -> Result<StateId> {
        let id = StateId(self.states.len() as u32);
        let ancestor = self.ancestor_of(caller);
        self.pool.allocate(State::ALLOC_SIZE)?;
        self.states.push(State {
            kind,
            ancestor,
            blocked: false,
            arc: c.arc,
            range,
            bunch_node: c.bunch_node,
            bunch_next: c.bunch_next,
            callee: c.callee,
            caller: Some(caller),
            shift,
        });
        Ok(id)
    }

    /// The ancestor used by tracing, filtering and context lookup: shifted
    /// splits chain through their final callee state.
    pub fn ancestor_of(&self, id: StateId) -> Option<StateId> {
        let s = self.get(id);
        match s.kind {
            StateKind::SplitShifted | StateKind::SplitExtended => s.shift,
            _ => {
                if s.blocked {
                    None
                } else {
                    s.ancestor
                }
            }
        }
    }

    /// The stored ancestor, disregarding the shift indirection; used by the
    /// entanglement spawner walk, which stays in the caller's frame nesting.
    pub fn stored_ancestor(&self, id: StateId) -> Option<StateId> {
        let s = self.get(id);
        if s.blocked {
            None
        } else {
            s.ancestor
        }
    }

    /// Ancestor for diagnostics rendering; ignores the blocked flag.
    pub fn path_ancestor(&self, id: StateId) -> Option<StateId> {
        let s = self.get(id);
        match s.kind {
            StateKind::SplitShifted | StateKind::SplitExtended => s.shift,
            _ => s.ancestor,
        }
    }

    /// Blocks a state; returns false if it already was.
    pub fn block(&mut self, id: StateId) -> bool {
        let s = self.get_mut(id);
        if s.blocked {
            false
        } else {
            s.blocked = true;
            true
        }
    }

    /// Whether `id` lies in the subtree rooted at `ancestor`. Exploits the
    /// allocation-order invariant: ancestors always have smaller ids.
    pub fn is_descendant(&self, id: StateId, ancestor: StateId) -> bool {
        let mut p = id;
        while p > ancestor {
            match self.ancestor_of(p) {
                Some(q) => p = q,
                None => return false,
            }
        }
        p == ancestor
    }

    /// Evicts the most recently spawned state; fails for any other.
    pub fn evict_last(&mut self, id: StateId) -> bool {
        if id.index() + 1 != self.states.len() {
            return false;
        }
        let offset = id.index() * State::ALLOC_SIZE;
        if self.pool.evict(offset, State::ALLOC_SIZE) {
            self.states.pop();
            true
        } else {
            false
        }
    }

    /// Destroys every state and resets the pool statistics.
    pub fn clear(&mut self) {
        self.states.clear();
        self.pool.clear();
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity_states: usize) -> StateStore {
        let mut s = StateStore::new();
        s.set_capacity(capacity_states * State::ALLOC_SIZE).unwrap();
        s
    }

    fn common(
        s: &mut StateStore,
        ancestor: Option<StateId>,
        kind: ArcKind,
        from: usize,
        to: usize,
    ) -> StateId {
        s.alloc_common(ancestor, ArcId(0), kind, NodeId(0), Range::new(from, to))
            .unwrap()
    }

    #[test]
    fn ancestors_precede_descendants() {
        let mut s = store(8);
        let root = common(&mut s, None, ArcKind::Simple, 0, 0);
        let child = common(&mut s, Some(root), ArcKind::Simple, 0, 2);
        let grand = common(&mut s, Some(child), ArcKind::Simple, 2, 3);
        assert!(root < child && child < grand);
        assert_eq!(s.ancestor_of(grand), Some(child));
        assert_eq!(s.ancestor_of(root), None);
    }

    #[test]
    fn simple_arcs_inherit_callee() {
        let mut s = store(8);
        let root = common(&mut s, None, ArcKind::Simple, 0, 0);
        let frame = common(&mut s, Some(root), ArcKind::Invoke, 0, 1);
        let inner = common(&mut s, Some(frame), ArcKind::Simple, 1, 2);
        assert_eq!(s.get(root).callee, None);
        assert_eq!(s.get(frame).callee, Some(frame));
        assert_eq!(s.get(inner).callee, Some(frame));
    }

    #[test]
    fn blocking_hides_the_ancestor() {
        let mut s = store(8);
        let root = common(&mut s, None, ArcKind::Simple, 0, 0);
        let child = common(&mut s, Some(root), ArcKind::Simple, 0, 1);
        assert!(s.block(child));
        assert!(!s.block(child));
        assert_eq!(s.ancestor_of(child), None);
        assert!(!s.is_descendant(child, root));
    }

    #[test]
    fn shifted_split_chains_through_the_callee() {
        let mut s = store(8);
        let root = common(&mut s, None, ArcKind::Simple, 0, 0);
        let frame = common(&mut s, Some(root), ArcKind::Invoke, 0, 1);
        let split = s.alloc_split_shifted(root, frame).unwrap();
        assert_eq!(s.get(split).kind, StateKind::SplitShifted);
        assert_eq!(s.ancestor_of(split), Some(frame));
        assert_eq!(s.stored_ancestor(split), None);
        assert_eq!(s.get(split).range, Range::new(0, 1));
        assert_eq!(s.get(split).caller, Some(root));
    }

    #[test]
    fn extended_split_spans_caller_end_to_callee_end() {
        let mut s = store(8);
        let root = common(&mut s, None, ArcKind::Simple, 0, 2);
        let frame = common(&mut s, Some(root), ArcKind::Extend, 2, 5);
        let split = s.alloc_split_extended(root, frame).unwrap();
        assert_eq!(s.get(split).kind, StateKind::SplitExtended);
        assert_eq!(s.get(split).range, Range::new(2, 5));
    }

    #[test]
    fn plain_split_keeps_the_caller_range() {
        let mut s = store(8);
        let root = common(&mut s, None, ArcKind::Simple, 0, 3);
        let split = s.alloc_split(root).unwrap();
        assert_eq!(s.get(split).kind, StateKind::Split);
        assert_eq!(s.get(split).range, Range::new(0, 3));
        assert!(s.get(split).is_split());
    }

    #[test]
    fn descendant_walk_uses_the_shift_chain() {
        let mut s = store(8);
        let root = common(&mut s, None, ArcKind::Simple, 0, 0);
        let frame = common(&mut s, Some(root), ArcKind::Invoke, 0, 1);
        let split = s.alloc_split_shifted(root, frame).unwrap();
        assert!(s.is_descendant(split, frame));
        assert!(s.is_descendant(split, root));
    }

    #[test]
    fn evict_accepts_only_the_newest_state() {
        let mut s = store(4);
        let a = common(&mut s, None, ArcKind::Simple, 0, 0);
        let b = common(&mut s, Some(a), ArcKind::Simple, 0, 1);
        assert!(!s.evict_last(a));
        assert!(s.evict_last(b));
        assert_eq!(s.len(), 1);
        assert_eq!(s.pool().evicted_size(), State::ALLOC_SIZE);
    }

    #[test]
    fn pool_exhaustion_surfaces_as_overflow() {
        let mut s = store(1);
        let a = common(&mut s, None, ArcKind::Simple, 0, 0);
        let err = s
            .alloc_common(Some(a), ArcId(0), ArcKind::Simple, NodeId(0), Range::new(0, 1))
            .unwrap_err();
        assert_eq!(err.kind, nparse_base::ErrorKind::PoolOverflow);
    }
}
