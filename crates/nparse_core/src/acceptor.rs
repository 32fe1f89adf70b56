//! The acceptor contract.
//!
//! An acceptor examines the input following the previously accepted
//! element and *pushes* zero or more candidate sub-ranges into a spectrum.
//! Pushing nothing is how an acceptor rejects — rejection is never an
//! error. Acceptors are pure: configuration lives in the acceptor value,
//! and the spectrum is the sole output channel, so one acceptor instance
//! can serve any number of concurrent branches.
//!
//! Pushing a range spawns a descendant state and schedules it in one step.
//! Acceptors that need to decorate a descendant before it runs (the regex
//! acceptor seeds named captures as trace variables) use the two-step
//! [`spawn`](Spectrum::spawn) / [`seed`](Spectrum::seed) /
//! [`enqueue`](Spectrum::enqueue) form instead.

use crate::model::{ArcId, Pos, Range};
use crate::state::StateId;
use crate::variable::Value;
use nparse_base::{Error, ErrorKind, KeyTable, Result, Symbol};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// Output channel of an acceptor.
pub trait Spectrum {
    /// Accepts `[from, to)`: spawns a descendant state and schedules it.
    fn push(&mut self, from: Pos, to: Pos) -> Result<()>;

    /// Spawns a descendant without scheduling it, so trace variables can
    /// be seeded first.
    fn spawn(&mut self, from: Pos, to: Pos) -> Result<StateId>;

    /// Schedules a previously spawned descendant.
    fn enqueue(&mut self, state: StateId);

    /// Seeds a trace variable on a spawned descendant.
    fn seed(&mut self, state: StateId, key: Symbol, value: Value);

    /// `(arc, range)` pairs from the expanding state up its ancestor
    /// chain; used by the recursion guard.
    fn trail(&self) -> Vec<(ArcId, Range)> {
        Vec::new()
    }

    /// Number of same-arc same-range re-entries tolerated before the
    /// recursion guard raises.
    fn lr_tolerance(&self) -> u32 {
        0
    }
}

/// A predicate over the analyzed input.
///
/// `c` is the full analyzed range, `e` the previously accepted element;
/// candidates normally start at `e.last`.
pub trait Acceptor {
    fn accept(&self, input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()>;
}

/// Factory signature for registry-created acceptors: a configuration
/// string plus the key table for acceptors that intern variable names.
pub type AcceptorFactory =
    Box<dyn Fn(&str, &RefCell<KeyTable>) -> Result<Box<dyn Acceptor>>>;

/// String-keyed acceptor factories.
///
/// Grammar providers look acceptors up by identifier; the registry treats
/// the produced objects as opaque predicates.
pub struct AcceptorRegistry {
    factories: FxHashMap<String, AcceptorFactory>,
}

impl AcceptorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        AcceptorRegistry {
            factories: FxHashMap::default(),
        }
    }

    /// A registry pre-populated with the standard acceptor family.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        crate::acceptors::register_standard(&mut registry);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: AcceptorFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiates the named acceptor with a configuration string.
    pub fn create(
        &self,
        name: &str,
        config: &str,
        keys: &RefCell<KeyTable>,
    ) -> Result<Box<dyn Acceptor>> {
        match self.factories.get(name) {
            Some(factory) => factory(config, keys),
            None => Err(Error::new(
                ErrorKind::Grammar,
                format!("unknown acceptor '{}'", name),
            )),
        }
    }
}

impl Default for AcceptorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_knows_the_family() {
        let registry = AcceptorRegistry::standard();
        for name in [
            "pass", "symbol", "string", "class", "range", "test", "end", "regex", "check",
            "not", "once", "skip", "clip",
        ] {
            assert!(registry.contains(name), "missing acceptor '{}'", name);
        }
    }

    #[test]
    fn unknown_acceptor_is_a_grammar_error() {
        let registry = AcceptorRegistry::new();
        let keys = RefCell::new(KeyTable::new());
        let err = registry.create("nope", "", &keys).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Grammar);
    }

    struct Record(Vec<(Pos, Pos)>);

    impl Spectrum for Record {
        fn push(&mut self, from: Pos, to: Pos) -> Result<()> {
            self.0.push((from, to));
            Ok(())
        }
        fn spawn(&mut self, from: Pos, to: Pos) -> Result<StateId> {
            self.0.push((from, to));
            Ok(StateId(self.0.len() as u32 - 1))
        }
        fn enqueue(&mut self, _: StateId) {}
        fn seed(&mut self, _: StateId, _: Symbol, _: Value) {}
    }

    #[test]
    fn created_acceptors_are_usable() {
        let registry = AcceptorRegistry::standard();
        let keys = RefCell::new(KeyTable::new());
        let acceptor = registry.create("string", "alpha", &keys).unwrap();

        let mut sink = Record(Vec::new());
        acceptor
            .accept("alphabet", Range::new(0, 8), Range::new(0, 0), &mut sink)
            .unwrap();
        assert_eq!(sink.0, vec![(0, 5)]);
    }

    #[test]
    fn wrappers_take_their_wrapped_acceptor_as_configuration() {
        let registry = AcceptorRegistry::standard();
        let keys = RefCell::new(KeyTable::new());

        let guard = registry.create("not", "string:let", &keys).unwrap();
        let mut sink = Record(Vec::new());
        guard
            .accept("value", Range::new(0, 5), Range::new(0, 0), &mut sink)
            .unwrap();
        assert_eq!(sink.0, vec![(0, 0)]);
        let mut sink = Record(Vec::new());
        guard
            .accept("letter", Range::new(0, 6), Range::new(0, 0), &mut sink)
            .unwrap();
        assert!(sink.0.is_empty());

        let exact = registry.create("check", "regex:[a-z]+", &keys).unwrap();
        let mut sink = Record(Vec::new());
        exact
            .accept("alpha5", Range::new(0, 6), Range::new(0, 5), &mut sink)
            .unwrap();
        assert_eq!(sink.0, vec![(0, 5)]);

        let window = registry.create("clip", "1,-2", &keys).unwrap();
        let mut sink = Record(Vec::new());
        window
            .accept("abc", Range::new(0, 3), Range::new(0, 3), &mut sink)
            .unwrap();
        assert_eq!(sink.0, vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn wrapper_without_a_wrapped_acceptor_is_rejected() {
        let registry = AcceptorRegistry::standard();
        let keys = RefCell::new(KeyTable::new());
        let err = registry.create("not", "", &keys).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Grammar);
    }
}
