//! Assertion wrappers over other acceptors.
//!
//! [`Not`] succeeds (with an empty range) exactly when the wrapped
//! acceptor would have failed; [`Check`] succeeds only when the wrapped
//! acceptor accepts the current element *exactly*. Both run the inner
//! acceptor against a substitute spectrum, so no state is ever spawned on
//! the probing path and rejection stays a non-event.

use crate::acceptor::{Acceptor, Spectrum};
use crate::model::{ArcId, Pos, Range};
use crate::state::StateId;
use crate::variable::Value;
use nparse_base::{Result, Symbol};

/// Records whether the wrapped acceptor accepted anything.
struct Probe {
    hit: bool,
}

impl Spectrum for Probe {
    fn push(&mut self, _from: Pos, _to: Pos) -> Result<()> {
        self.hit = true;
        Ok(())
    }

    fn spawn(&mut self, _from: Pos, _to: Pos) -> Result<StateId> {
        Ok(StateId::DISCARD)
    }

    fn enqueue(&mut self, _state: StateId) {
        self.hit = true;
    }

    fn seed(&mut self, _state: StateId, _key: Symbol, _value: Value) {}
}

/// Succeeds iff the wrapped acceptor would have failed; consumes nothing.
pub struct Not {
    inner: Box<dyn Acceptor>,
}

impl Not {
    pub fn new(inner: impl Acceptor + 'static) -> Self {
        Not {
            inner: Box::new(inner),
        }
    }

    pub fn boxed(inner: Box<dyn Acceptor>) -> Self {
        Not { inner }
    }
}

impl Acceptor for Not {
    fn accept(&self, input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        let mut probe = Probe { hit: false };
        self.inner.accept(input, c, e, &mut probe)?;
        if !probe.hit {
            s.push(e.last, e.last)?;
        }
        Ok(())
    }
}

/// Forwards only candidates covering `element` exactly.
struct Exact<'a> {
    element: Range,
    inner: &'a mut dyn Spectrum,
}

impl Exact<'_> {
    fn is_exact(&self, from: Pos, to: Pos) -> bool {
        from == self.element.first && to == self.element.last
    }
}

impl Spectrum for Exact<'_> {
    fn push(&mut self, from: Pos, to: Pos) -> Result<()> {
        if self.is_exact(from, to) {
            self.inner.push(from, to)?;
        }
        Ok(())
    }

    fn spawn(&mut self, from: Pos, to: Pos) -> Result<StateId> {
        if self.is_exact(from, to) {
            self.inner.spawn(from, to)
        } else {
            Ok(StateId::DISCARD)
        }
    }

    fn enqueue(&mut self, state: StateId) {
        if state != StateId::DISCARD {
            self.inner.enqueue(state);
        }
    }

    fn seed(&mut self, state: StateId, key: Symbol, value: Value) {
        if state != StateId::DISCARD {
            self.inner.seed(state, key, value);
        }
    }

    fn trail(&self) -> Vec<(ArcId, Range)> {
        self.inner.trail()
    }

    fn lr_tolerance(&self) -> u32 {
        self.inner.lr_tolerance()
    }
}

/// Succeeds iff the wrapped acceptor matches the current element exactly;
/// used for boundary-exact grammar rules.
pub struct Check {
    inner: Box<dyn Acceptor>,
}

impl Check {
    pub fn new(inner: impl Acceptor + 'static) -> Self {
        Check {
            inner: Box::new(inner),
        }
    }

    pub fn boxed(inner: Box<dyn Acceptor>) -> Self {
        Check { inner }
    }
}

impl Acceptor for Check {
    fn accept(&self, input: &str, _c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        let mut exact = Exact {
            element: e,
            inner: s,
        };
        // The wrapped acceptor sees the element as the whole analyzed
        // range and starts from its beginning.
        self.inner
            .accept(input, e, Range::new(e.first, e.first), &mut exact)
    }
}
