//! Trace enumeration.
//!
//! After a run, the traveller holds the terminal states of every
//! successful parse. The tracer is a pull-based cursor over them:
//! [`next`](Tracer::next) advances to the next trace, [`step`](Tracer::step)
//! walks the trace's states in source order, skipping transitions whose
//! labels carry nothing. Split states are reported with type 2 — they
//! close an invocation frame, the "closing parenthesis" of a tree view.
//!
//! The tracer holds no borrow of the traveller; every call takes it as an
//! argument, so an embedding can own both side by side.

use crate::model::Range;
use crate::state::StateId;
use crate::traveller::Traveller;

/// Cursor over the traces of a completed traveller.
pub struct Tracer {
    trace_index: usize,
    trace: Vec<StateId>,
    step_index: usize,
    started: bool,
    stepping: bool,
}

impl Tracer {
    pub fn new() -> Self {
        Tracer {
            trace_index: 0,
            trace: Vec::new(),
            step_index: 0,
            started: false,
            stepping: false,
        }
    }

    /// Advances to the next trace; false when exhausted.
    pub fn next(&mut self, tr: &Traveller) -> bool {
        let traced = tr.traced();
        let start = if self.started { self.trace_index + 1 } else { 0 };
        for index in start..traced.len() {
            self.trace.clear();
            let mut cursor = Some(traced[index]);
            while let Some(id) = cursor {
                let state = tr.states().get(id);
                debug_assert!(!state.is_blocked());
                if state.is_split() || tr.arc(state.arc).label.is_actual() {
                    self.trace.push(id);
                }
                cursor = tr.states().ancestor_of(id);
            }
            self.trace_index = index;
            self.started = true;
            self.stepping = false;
            return true;
        }
        self.started = false;
        false
    }

    /// Advances to the next state within the current trace, in source
    /// order; false at the end of the trace (or without a current trace).
    pub fn step(&mut self, _tr: &Traveller) -> bool {
        if !self.started {
            return false;
        }
        if !self.stepping {
            if self.trace.is_empty() {
                return false;
            }
            self.stepping = true;
            self.step_index = self.trace.len();
        }
        if self.step_index == 0 {
            self.stepping = false;
            return false;
        }
        self.step_index -= 1;
        true
    }

    /// Forgets the current position; the next [`next`](Tracer::next)
    /// starts from the first trace again.
    pub fn rewind(&mut self) {
        self.started = false;
        self.stepping = false;
        self.trace.clear();
    }

    /// The current state: the stepped-to state, or the trace's terminal
    /// state when stepping has not begun.
    pub fn current(&self, tr: &Traveller) -> Option<StateId> {
        if !self.started {
            return None;
        }
        if self.stepping {
            self.trace.get(self.step_index).copied()
        } else {
            tr.traced().get(self.trace_index).copied()
        }
    }

    /// Significance of the current state: 0 = skipped transition,
    /// 1 = actual labelled transition, 2 = split frame.
    pub fn kind(&self, tr: &Traveller) -> i32 {
        match self.current(tr) {
            Some(id) => {
                let state = tr.states().get(id);
                if state.is_split() {
                    2
                } else if tr.arc(state.arc).label.is_actual() {
                    1
                } else {
                    0
                }
            }
            None => 0,
        }
    }

    /// Label tag of the current state's arc.
    pub fn label(&self, tr: &Traveller) -> i32 {
        self.current(tr)
            .map(|id| tr.arc(tr.states().get(id).arc).label.tag)
            .unwrap_or(0)
    }

    /// Name of the current state's target node, when named.
    pub fn node_name<'a>(&self, tr: &'a Traveller) -> Option<&'a str> {
        let id = self.current(tr)?;
        tr.network()
            .get_node(tr.states().get(id).bunch_node)
            .name
            .as_deref()
    }

    /// The accepted range of the current state.
    pub fn range(&self, tr: &Traveller) -> Option<Range> {
        self.current(tr).map(|id| tr.states().get(id).range)
    }

    /// The accepted text of the current state.
    pub fn text<'a>(&self, tr: &'a Traveller) -> &'a str {
        match self.range(tr) {
            Some(range) => range.text(tr.input()),
            None => "",
        }
    }

    /// Navigates from the current state along a compact relative path:
    /// `<` ancestor, `:` callee, `!` caller. Unknown characters are
    /// ignored.
    pub fn relative(&self, tr: &Traveller, path: &str) -> Option<StateId> {
        let mut cursor = self.current(tr)?;
        for step in path.chars() {
            let next = match step {
                '<' => tr.states().ancestor_of(cursor),
                ':' => tr.states().get(cursor).callee,
                '!' => tr.states().get(cursor).caller,
                _ => Some(cursor),
            };
            cursor = next?;
        }
        Some(cursor)
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}
