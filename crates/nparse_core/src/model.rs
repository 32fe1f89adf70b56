//! The acceptor network: nodes, arcs, labels.
//!
//! A network is a directed (and usually cyclic) graph of [`Node`]s joined
//! by labelled [`Arc`]s. Nodes, arcs, semantic actions and acceptors are
//! stored in index arenas owned by the [`Network`] value, so the graph can
//! be cyclic while ownership stays flat; everything is immutable during a
//! parse. The grammar compiler builds a network once per grammar and the
//! traveller runs it as given.

use crate::acceptor::Acceptor;
use crate::dsel::Action;
use rustc_hash::FxHashMap;
use std::fmt;

/// A position in the analyzed input, as a byte offset.
pub type Pos = usize;

/// A half-open interval `[first, last)` over the analyzed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub first: Pos,
    pub last: Pos,
}

impl Range {
    pub fn new(first: Pos, last: Pos) -> Self {
        Range { first, last }
    }

    pub fn len(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.last == self.first
    }

    /// The covered slice of the input.
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.first..self.last]
    }
}

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`Node`] within its [`Network`].
    NodeId
);
arena_id!(
    /// Index of an [`Arc`] within its [`Network`].
    ArcId
);
arena_id!(
    /// Index of a semantic [`Action`] within its [`Network`].
    ActionId
);
arena_id!(
    /// Index of an acceptor within its [`Network`].
    AcceptorId
);

impl ArcId {
    /// The synthetic entry arc a traveller fabricates for its root state.
    /// Never present in any bunch.
    pub const ENTRY: ArcId = ArcId(u32::MAX);
}

/// How an arc affects the traveller when traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcKind {
    /// Ordinary transition.
    Simple,
    /// Opens an invocation frame; returns with the callee's range.
    Invoke,
    /// Opens an invocation frame; returns with the range extended from the
    /// invocation start to the callee's end.
    Extend,
    /// Positive lookahead: the caller resumes without consumption.
    Positive,
    /// Negative lookahead: reaching an endpoint blocks the caller.
    Negative,
}

/// A semantic label attached to an arc: an integer tag plus an optional
/// action evaluated on entry to states produced through the arc.
#[derive(Debug, Clone, Copy, Default)]
pub struct Label {
    pub tag: i32,
    pub action: Option<ActionId>,
}

impl Label {
    pub fn new(tag: i32) -> Self {
        Label { tag, action: None }
    }

    pub fn with_action(tag: i32, action: ActionId) -> Self {
        Label {
            tag,
            action: Some(action),
        }
    }

    /// A label is *actual* when it carries an action or a non-zero tag;
    /// trace enumeration skips the rest.
    pub fn is_actual(&self) -> bool {
        self.tag != 0 || self.action.is_some()
    }
}

/// A labelled transition between two nodes.
#[derive(Debug, Clone)]
pub struct Arc {
    pub target: NodeId,
    pub acceptor: AcceptorId,
    pub kind: ArcKind,
    pub label: Label,
    /// Ordering among entangled alternatives; lower wins.
    pub priority: i32,
    /// Entanglement group this arc *spawns* (0 = none).
    pub entanglement: u32,
}

/// A vertex of the acceptor network.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: Option<String>,
    endpoint: bool,
    /// Entanglement group whose members defer on entering this node
    /// (0 = none).
    pub entanglement: u32,
    /// Outgoing arcs, consumed in order during state expansion.
    pub bunch: Vec<ArcId>,
}

/// A compiled acceptor network.
///
/// Produced by a grammar provider (or assembled by hand through the builder
/// methods) and shared read-only with travellers.
pub struct Network {
    nodes: Vec<Node>,
    arcs: Vec<Arc>,
    actions: Vec<Action>,
    acceptors: Vec<Box<dyn Acceptor>>,
    names: FxHashMap<String, NodeId>,
}

impl Network {
    pub fn new() -> Self {
        Network {
            nodes: Vec::new(),
            arcs: Vec::new(),
            actions: Vec::new(),
            acceptors: Vec::new(),
            names: FxHashMap::default(),
        }
    }

    /// Adds an anonymous node.
    pub fn node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::default());
        id
    }

    /// Adds a named node, addressable through [`Network::cluster`].
    pub fn named_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.node();
        let name = name.into();
        self.nodes[id.index()].name = Some(name.clone());
        self.names.insert(name, id);
        id
    }

    /// Marks a node as an explicit endpoint.
    pub fn mark_endpoint(&mut self, node: NodeId) {
        self.nodes[node.index()].endpoint = true;
    }

    /// Assigns the entanglement group whose members defer on entering
    /// `node`.
    pub fn set_entanglement(&mut self, node: NodeId, group: u32) {
        self.nodes[node.index()].entanglement = group;
    }

    /// Registers an acceptor instance for use by arcs.
    pub fn acceptor(&mut self, acceptor: impl Acceptor + 'static) -> AcceptorId {
        let id = AcceptorId(self.acceptors.len() as u32);
        self.acceptors.push(Box::new(acceptor));
        id
    }

    /// Registers a boxed acceptor, e.g. one built by a factory.
    pub fn boxed_acceptor(&mut self, acceptor: Box<dyn Acceptor>) -> AcceptorId {
        let id = AcceptorId(self.acceptors.len() as u32);
        self.acceptors.push(acceptor);
        id
    }

    /// Registers a semantic action for use by labels.
    pub fn action(&mut self, action: Action) -> ActionId {
        let id = ActionId(self.actions.len() as u32);
        self.actions.push(action);
        id
    }

    /// Links `from` to `to` with the given acceptor, arc kind and label
    /// tag, appending the arc to `from`'s bunch.
    pub fn link(
        &mut self,
        from: NodeId,
        to: NodeId,
        acceptor: AcceptorId,
        kind: ArcKind,
        tag: i32,
    ) -> ArcId {
        self.link_with(from, to, acceptor, kind, Label::new(tag))
    }

    /// Like [`link`](Self::link) with a full label.
    pub fn link_with(
        &mut self,
        from: NodeId,
        to: NodeId,
        acceptor: AcceptorId,
        kind: ArcKind,
        label: Label,
    ) -> ArcId {
        let id = ArcId(self.arcs.len() as u32);
        self.arcs.push(Arc {
            target: to,
            acceptor,
            kind,
            label,
            priority: 0,
            entanglement: 0,
        });
        self.nodes[from.index()].bunch.push(id);
        id
    }

    /// Sets the entanglement priority of an arc.
    pub fn set_priority(&mut self, arc: ArcId, priority: i32) {
        self.arcs[arc.index()].priority = priority;
    }

    /// Marks an arc as the spawner of an entanglement group.
    pub fn set_arc_entanglement(&mut self, arc: ArcId, group: u32) {
        self.arcs[arc.index()].entanglement = group;
    }

    /// Attaches a semantic action to an arc's label.
    pub fn set_label_action(&mut self, arc: ArcId, action: ActionId) {
        self.arcs[arc.index()].label.action = Some(action);
    }

    /// Resolves the entry node of a named rule.
    pub fn cluster(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn get_node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_arc(&self, id: ArcId) -> &Arc {
        &self.arcs[id.index()]
    }

    pub fn get_action(&self, id: ActionId) -> &Action {
        &self.actions[id.index()]
    }

    pub fn get_acceptor(&self, id: AcceptorId) -> &dyn Acceptor {
        self.acceptors[id.index()].as_ref()
    }

    /// A node terminates a rule when flagged explicitly or when it has no
    /// outgoing arcs.
    pub fn is_endpoint(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.index()];
        node.endpoint || node.bunch.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptors::Unconditional;

    #[test]
    fn link_appends_to_bunch_in_order() {
        let mut net = Network::new();
        let a = net.node();
        let b = net.node();
        let pass = net.acceptor(Unconditional);
        let first = net.link(a, b, pass, ArcKind::Simple, 1);
        let second = net.link(a, b, pass, ArcKind::Simple, 2);
        assert_eq!(net.get_node(a).bunch, vec![first, second]);
    }

    #[test]
    fn node_without_arcs_is_endpoint() {
        let mut net = Network::new();
        let a = net.node();
        let b = net.node();
        let pass = net.acceptor(Unconditional);
        net.link(a, b, pass, ArcKind::Simple, 1);
        assert!(!net.is_endpoint(a));
        assert!(net.is_endpoint(b));
    }

    #[test]
    fn named_nodes_resolve_as_clusters() {
        let mut net = Network::new();
        let entry = net.named_node("S");
        assert_eq!(net.cluster("S"), Some(entry));
        assert_eq!(net.cluster("T"), None);
    }

    #[test]
    fn label_actuality() {
        assert!(!Label::new(0).is_actual());
        assert!(Label::new(3).is_actual());
        assert!(Label::new(-1).is_actual());
        assert!(Label::with_action(0, ActionId(0)).is_actual());
    }

    #[test]
    fn range_text_slices_input() {
        let r = Range::new(2, 5);
        assert_eq!(r.text("abcdef"), "cde");
        assert_eq!(r.len(), 3);
        assert!(!r.is_empty());
        assert!(Range::new(4, 4).is_empty());
    }
}
