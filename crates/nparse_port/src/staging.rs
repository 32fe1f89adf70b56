//! Grammar providers.
//!
//! The engine consumes compiled networks through the [`Staging`] trait: a
//! grammar compiler hands over the network, resolves named rules to their
//! entry nodes, and maps input offsets of the grammar source back to
//! file/line/column for error decoration. [`PrebuiltStaging`] wraps a
//! network assembled by hand, which is what embeddings and tests use when
//! no grammar language is involved.

use nparse_base::{Error, KeyTable, SourceLoc};
use nparse_core::{AcceptorRegistry, Network, NodeId};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A compiled-grammar provider.
pub trait Staging {
    /// The compiled network.
    fn network(&self) -> Rc<Network>;

    /// Entry node of a named rule.
    fn cluster(&self, name: &str) -> Option<NodeId>;

    /// Grammar source location for an offset into the grammar text.
    fn identify(&self, offset: usize) -> Option<SourceLoc>;

    /// Decorates an error with staging context.
    fn extend(&self, error: &mut Error);
}

/// Staging over a hand-assembled network.
pub struct PrebuiltStaging {
    net: Rc<Network>,
    source_name: Option<String>,
    locations: Vec<(usize, SourceLoc)>,
}

impl PrebuiltStaging {
    pub fn new(net: Network) -> Self {
        PrebuiltStaging {
            net: Rc::new(net),
            source_name: None,
            locations: Vec::new(),
        }
    }

    pub fn shared(net: Rc<Network>) -> Self {
        PrebuiltStaging {
            net,
            source_name: None,
            locations: Vec::new(),
        }
    }

    /// Names the grammar source for error decoration.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Supplies an offset-to-location table for [`Staging::identify`];
    /// entries must be sorted by offset.
    pub fn with_locations(mut self, locations: Vec<(usize, SourceLoc)>) -> Self {
        self.locations = locations;
        self
    }
}

impl Staging for PrebuiltStaging {
    fn network(&self) -> Rc<Network> {
        Rc::clone(&self.net)
    }

    fn cluster(&self, name: &str) -> Option<NodeId> {
        self.net.cluster(name)
    }

    fn identify(&self, offset: usize) -> Option<SourceLoc> {
        self.locations
            .iter()
            .take_while(|(at, _)| *at <= offset)
            .last()
            .map(|(_, loc)| loc.clone())
    }

    fn extend(&self, error: &mut Error) {
        if error.location.is_none() {
            if let Some(name) = &self.source_name {
                error.location = Some(SourceLoc::new(name.clone(), 0, 0));
            }
        }
    }
}

/// Produces a staging from grammar source text; embeddings plug their
/// grammar compiler in here.
pub type StagingFactory = Box<dyn Fn(&Engine, &str) -> nparse_base::Result<Box<dyn Staging>>>;

/// The explicit engine value: the key interner, the acceptor factory
/// registry and the compiled-grammar cache, shared by everything one
/// parser instance does. Multiple engines coexist freely in one process.
pub struct Engine {
    keys: Rc<RefCell<KeyTable>>,
    registry: AcceptorRegistry,
    cache: FxHashMap<String, Rc<Network>>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            keys: Rc::new(RefCell::new(KeyTable::new())),
            registry: AcceptorRegistry::standard(),
            cache: FxHashMap::default(),
        }
    }

    pub fn keys(&self) -> &Rc<RefCell<KeyTable>> {
        &self.keys
    }

    pub fn registry(&self) -> &AcceptorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AcceptorRegistry {
        &mut self.registry
    }

    /// Looks up a previously compiled network by grammar identity.
    pub fn cached(&self, key: &str) -> Option<Rc<Network>> {
        self.cache.get(key).cloned()
    }

    /// Caches a compiled network.
    pub fn cache(&mut self, key: impl Into<String>, net: Rc<Network>) {
        self.cache.insert(key.into(), net);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prebuilt_staging_resolves_clusters() {
        let mut net = Network::new();
        let entry = net.named_node("S");
        let staging = PrebuiltStaging::new(net);
        assert_eq!(staging.cluster("S"), Some(entry));
        assert_eq!(staging.cluster("X"), None);
    }

    #[test]
    fn identify_picks_the_nearest_preceding_location() {
        let staging = PrebuiltStaging::new(Network::new()).with_locations(vec![
            (0, SourceLoc::new("g.ng", 1, 1)),
            (10, SourceLoc::new("g.ng", 2, 1)),
        ]);
        assert_eq!(staging.identify(5).unwrap().line, 1);
        assert_eq!(staging.identify(15).unwrap().line, 2);
    }

    #[test]
    fn engine_caches_compiled_networks() {
        let mut engine = Engine::new();
        assert!(engine.cached("g").is_none());
        engine.cache("g", Rc::new(Network::new()));
        assert!(engine.cached("g").is_some());
    }
}
