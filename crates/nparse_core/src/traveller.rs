//! The acceptor-network traveller.
//!
//! The traveller explores every parse of an input against a network by
//! growing a tree of analysis states. One iteration of the inner loop
//! pulls a state from the queue, runs its entry action, and either records
//! a finished trace, returns from a nested frame through a split state, or
//! expands the state's remaining arcs by running their acceptors — each
//! accepted range spawning a pool-allocated descendant.
//!
//! Scheduling is depth-first until a negative assertion enters the
//! picture; from then on the inner loop drains breadth-first, so the
//! negation concludes before its potential victims multiply. When the
//! queue runs dry, deferred entangled states are resolved by spawner-arc
//! priority and the loop goes round again.
//!
//! ```text
//!   init ─▶ [queue] ─▶ pull ─▶ entry ─▶ endpoint? ──▶ trace / split / block
//!              ▲                           │
//!              │                           ▼
//!              └──── spawn ◀── acceptors ◀─┘ (bunch expansion)
//! ```

use crate::acceptor::Spectrum;
use crate::context::ContextStore;
use crate::dsel::Evaluator;
use crate::model::{Arc, ArcId, ArcKind, Label, Network, NodeId, Pos, Range};
use crate::observer::{EngineView, Event, NullObserver, Observer, StatusReport};
use crate::state::{StateId, StateStore};
use crate::variable::Value;
use nparse_base::{Error, ErrorKind, KeyTable, Result, Symbol};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

/// The spectrum a traveller hands to acceptors during expansion.
struct Sink<'a> {
    states: &'a mut StateStore,
    contexts: &'a mut ContextStore,
    queue: &'a mut VecDeque<StateId>,
    deferred: &'a mut Vec<StateId>,
    observer: &'a mut dyn Observer,
    net: &'a Network,
    entry_arc: &'a Arc,
    current: StateId,
    arc: ArcId,
    arc_kind: ArcKind,
    target: NodeId,
    lr_tolerance: u32,
}

impl Sink<'_> {
    fn notify(&mut self, event: Event, state: StateId) {
        let view = EngineView {
            states: self.states,
            net: self.net,
            entry_arc: self.entry_arc,
        };
        self.observer.notify(event, state, &view);
    }
}

impl Spectrum for Sink<'_> {
    fn push(&mut self, from: Pos, to: Pos) -> Result<()> {
        let state = self.spawn(from, to)?;
        self.enqueue(state);
        Ok(())
    }

    fn spawn(&mut self, from: Pos, to: Pos) -> Result<StateId> {
        self.states.alloc_common(
            Some(self.current),
            self.arc,
            self.arc_kind,
            self.target,
            Range::new(from, to),
        )
    }

    fn enqueue(&mut self, state: StateId) {
        if state == StateId::DISCARD {
            return;
        }
        let group = self.net.get_node(self.states.get(state).bunch_node).entanglement;
        if group == 0 {
            self.queue.push_back(state);
            self.notify(Event::Push, state);
        } else {
            self.deferred.push(state);
            self.notify(Event::Defer, state);
        }
    }

    fn seed(&mut self, state: StateId, key: Symbol, value: Value) {
        if state != StateId::DISCARD {
            self.contexts.set(self.states, state, key, value);
        }
    }

    fn trail(&self) -> Vec<(ArcId, Range)> {
        let mut trail = Vec::new();
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let s = self.states.get(id);
            trail.push((s.arc, s.range));
            cursor = self.states.ancestor_of(id);
        }
        trail
    }

    fn lr_tolerance(&self) -> u32 {
        self.lr_tolerance
    }
}

/// Resolution record for one deferred entangled state.
struct Spawner {
    state: StateId,
    root: Option<StateId>,
    priority: i32,
}

/// The analysis state traveller.
pub struct Traveller {
    net: Rc<Network>,
    keys: Rc<RefCell<KeyTable>>,
    entry_arc: Arc,
    input: String,
    c: Range,
    states: StateStore,
    contexts: ContextStore,
    queue: VecDeque<StateId>,
    traced: Vec<StateId>,
    deferred: Vec<StateId>,
    current: Option<StateId>,
    observer: Box<dyn Observer>,
    lr_tolerance: u32,
    max_queue: Option<usize>,
    strict_vars: bool,
    iterations_total: u64,
}

impl Traveller {
    /// Creates a traveller for `net`, entering at `entry` with the given
    /// entry-arc label. Call [`set_capacity`](Self::set_capacity) before
    /// parsing.
    pub fn new(
        net: Rc<Network>,
        keys: Rc<RefCell<KeyTable>>,
        entry: NodeId,
        entry_label: Label,
    ) -> Self {
        Traveller {
            net,
            keys,
            entry_arc: Arc {
                target: entry,
                // Never dereferenced: the entry arc sits in no bunch.
                acceptor: crate::model::AcceptorId(u32::MAX),
                kind: ArcKind::Simple,
                label: entry_label,
                priority: 0,
                entanglement: 0,
            },
            input: String::new(),
            c: Range::default(),
            states: StateStore::new(),
            contexts: ContextStore::new(),
            queue: VecDeque::new(),
            traced: Vec::new(),
            deferred: Vec::new(),
            current: None,
            observer: Box::new(NullObserver),
            lr_tolerance: 0,
            max_queue: None,
            strict_vars: false,
            iterations_total: 0,
        }
    }

    pub fn set_capacity(&mut self, bytes: usize) -> Result<()> {
        self.states.set_capacity(bytes)
    }

    pub fn set_swap_file(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.states.set_swap_file(path)
    }

    /// Number of same-arc same-range re-entries the recursion guard
    /// tolerates.
    pub fn set_lr_tolerance(&mut self, tolerance: u32) {
        self.lr_tolerance = tolerance;
    }

    /// Optional bound on the search queue; exceeding it aborts the parse.
    pub fn set_max_queue(&mut self, bound: Option<usize>) {
        self.max_queue = bound;
    }

    /// Strict mode turns reads of undefined trace variables into errors.
    pub fn set_strict_vars(&mut self, strict: bool) {
        self.strict_vars = strict;
    }

    pub fn set_observer(&mut self, observer: Box<dyn Observer>) {
        self.observer = observer;
    }

    /// Prepares a parse: stores the input and spawns the root state.
    ///
    /// The root becomes the current state, so trace variables can be
    /// seeded through [`seed_var`](Self::seed_var) before [`run`](Self::run).
    pub fn init(&mut self, input: &str) -> Result<()> {
        self.input.clear();
        self.input.push_str(input);
        self.c = Range::new(0, input.len());
        let root = self.states.alloc_common(
            None,
            ArcId::ENTRY,
            ArcKind::Simple,
            self.entry_arc.target,
            Range::new(0, 0),
        )?;
        self.current = Some(root);
        self.schedule(root);
        Ok(())
    }

    /// Seeds an initial trace variable on the root state.
    pub fn seed_var(&mut self, key: Symbol, value: Value) -> Result<()> {
        match self.current {
            Some(root) => {
                self.contexts.set(&self.states, root, key, value);
                Ok(())
            }
            None => Err(Error::new(
                ErrorKind::Logic,
                "seed_var requires an initialized traveller",
            )),
        }
    }

    /// Runs the traversal to convergence; returns the iteration count.
    pub fn run(&mut self) -> Result<u64> {
        let mut iterations = 0;
        loop {
            iterations += self.run_inner(iterations)?;
            if self.deferred.is_empty() {
                break;
            }
            self.resolve_entanglement()?;
        }
        self.iterations_total += iterations;
        log::debug!(
            target: "nparse",
            "run complete: {} iterations, {} traces, pool {}/{}",
            iterations,
            self.traced.len(),
            self.states.pool().usage(),
            self.states.pool().capacity()
        );
        Ok(iterations)
    }

    /// Initializes and runs in one step.
    pub fn run_on(&mut self, input: &str) -> Result<u64> {
        self.init(input)?;
        self.run()
    }

    /// Resets to the pristine state; the pool capacity is kept.
    pub fn reset(&mut self) {
        self.states.clear();
        self.contexts.clear();
        self.queue.clear();
        self.traced.clear();
        self.deferred.clear();
        self.current = None;
        self.input.clear();
        self.c = Range::default();
        self.iterations_total = 0;
        self.observer.reset();
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn network(&self) -> &Rc<Network> {
        &self.net
    }

    pub fn keys(&self) -> &Rc<RefCell<KeyTable>> {
        &self.keys
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn traced(&self) -> &[StateId] {
        &self.traced
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    /// Iterations accumulated since the last reset.
    pub fn iterations(&self) -> u64 {
        self.iterations_total
    }

    /// Resolves an arc, including the synthetic entry arc.
    pub fn arc(&self, id: ArcId) -> &Arc {
        if id == ArcId::ENTRY {
            &self.entry_arc
        } else {
            self.net.get_arc(id)
        }
    }

    /// Reads a trace variable as visible from `state`.
    pub fn val(&self, state: StateId, key: Symbol) -> Value {
        self.contexts.val(&self.states, state, key)
    }

    pub fn view(&self) -> EngineView<'_> {
        EngineView {
            states: &self.states,
            net: &self.net,
            entry_arc: &self.entry_arc,
        }
    }

    // ------------------------------------------------------------------
    // The algorithm
    // ------------------------------------------------------------------

    fn notify(&mut self, event: Event, state: StateId) {
        log::trace!(target: "nparse", "{:?} {}", event, state);
        let view = EngineView {
            states: &self.states,
            net: &self.net,
            entry_arc: &self.entry_arc,
        };
        self.observer.notify(event, state, &view);
    }

    /// Queues a freshly spawned state, or defers it when its target node
    /// belongs to an entanglement group.
    fn schedule(&mut self, state: StateId) {
        let group = self.net.get_node(self.states.get(state).bunch_node).entanglement;
        if group == 0 {
            self.queue.push_back(state);
            self.notify(Event::Push, state);
        } else {
            self.deferred.push(state);
            self.notify(Event::Defer, state);
        }
    }

    /// Rolls back the in-flight state before propagating an error.
    fn roll_back(&mut self, state: StateId) {
        self.states.block(state);
        if state.index() + 1 == self.states.len() {
            self.notify(Event::Evict, state);
            self.states.evict_last(state);
            self.contexts.truncate(self.states.len());
        }
    }

    /// The inner loop: drains the queue, spawning descendants as it goes.
    fn run_inner(&mut self, iteration_base: u64) -> Result<u64> {
        let net = Rc::clone(&self.net);
        let mut has_negations = false;
        let mut iterations = 0u64;

        while !self.queue.is_empty() {
            if let Some(bound) = self.max_queue {
                if self.queue.len() > bound {
                    return Err(Error::new(
                        ErrorKind::QueueOverflow,
                        format!("search queue exceeded {} states", bound),
                    ));
                }
            }
            self.observer.status(&StatusReport {
                iteration: iteration_base + iterations,
                queue_len: self.queue.len(),
                pool_usage: self.states.pool().usage(),
                trace_count: self.traced.len(),
                deferred_count: self.deferred.len(),
            })?;
            iterations += 1;

            // Depth-first normally; breadth-first once a negation is in
            // flight, so it can conclude before descendants spread.
            let state = if has_negations {
                self.queue.pop_front()
            } else {
                self.queue.pop_back()
            };
            let state = match state {
                Some(state) => state,
                None => break,
            };
            self.current = Some(state);
            self.notify(Event::Pull, state);

            // Entry: run the semantic action of the producing arc.
            let label = self.arc(self.states.get(state).arc).label;
            if let Some(action_id) = label.action {
                let action = net.get_action(action_id);
                let outcome = Evaluator::new(
                    &self.states,
                    &mut self.contexts,
                    self.keys.as_ref(),
                    state,
                )
                .strict(self.strict_vars)
                .run(action);
                match outcome {
                    Ok(Value::Boolean(false)) => {
                        self.states.block(state);
                        self.notify(Event::Deny, state);
                        continue;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        self.roll_back(state);
                        return Err(err);
                    }
                }
            }
            self.notify(Event::Entry, state);

            // Endpoint: complete a trace or return from the nested frame.
            let mut expand = state;
            if net.is_endpoint(self.states.get(state).bunch_node) {
                let callee = self.states.get(state).callee;
                let caller = callee.and_then(|c| self.states.ancestor_of(c));
                match (callee, caller) {
                    (Some(callee), Some(caller)) => {
                        let callee_kind = self.arc(self.states.get(callee).arc).kind;
                        match callee_kind {
                            ArcKind::Invoke => {
                                expand = self.states.alloc_split_shifted(caller, state)?;
                            }
                            ArcKind::Extend => {
                                expand = self.states.alloc_split_extended(caller, state)?;
                            }
                            ArcKind::Positive => {
                                expand = self.states.alloc_split(caller)?;
                            }
                            ArcKind::Negative => {
                                if self.states.block(caller) {
                                    self.notify(Event::Block, caller);
                                    self.filter_descendants(caller);
                                }
                                continue;
                            }
                            ArcKind::Simple => continue,
                        }
                        self.notify(Event::Split, expand);
                    }
                    _ => {
                        // No enclosing frame: a surface trace.
                        self.traced.push(state);
                        self.notify(Event::Trace, state);
                        continue;
                    }
                }
            }

            // Expand the remaining bunch, spawning descendants.
            loop {
                let (bunch_node, bunch_next, e) = {
                    let s = self.states.get(expand);
                    (s.bunch_node, s.bunch_next as usize, s.range)
                };
                let bunch = &net.get_node(bunch_node).bunch;
                if bunch_next >= bunch.len() {
                    break;
                }
                let arc_id = bunch[bunch_next];
                self.states.get_mut(expand).bunch_next += 1;
                let arc = net.get_arc(arc_id);

                let mut sink = Sink {
                    states: &mut self.states,
                    contexts: &mut self.contexts,
                    queue: &mut self.queue,
                    deferred: &mut self.deferred,
                    observer: &mut *self.observer,
                    net: &net,
                    entry_arc: &self.entry_arc,
                    current: expand,
                    arc: arc_id,
                    arc_kind: arc.kind,
                    target: arc.target,
                    lr_tolerance: self.lr_tolerance,
                };
                let accepted = net
                    .get_acceptor(arc.acceptor)
                    .accept(&self.input, self.c, e, &mut sink);
                if let Err(err) = accepted {
                    self.roll_back(expand);
                    return Err(err);
                }

                match arc.kind {
                    // The outgoing decision is committed to the call.
                    ArcKind::Invoke | ArcKind::Extend | ArcKind::Positive => break,
                    ArcKind::Negative => has_negations = true,
                    ArcKind::Simple => {}
                }
            }
        }

        Ok(iterations)
    }

    /// Removes every descendant of `ancestor` from the queue, the trace
    /// list and the deferred list, blocking each; reclaims what sits at
    /// the pool tail.
    fn filter_descendants(&mut self, ancestor: StateId) {
        let mut dropped: Vec<StateId> = Vec::new();
        {
            let states = &self.states;
            self.queue.retain(|&id| {
                if states.is_descendant(id, ancestor) {
                    dropped.push(id);
                    false
                } else {
                    true
                }
            });
        }
        {
            let states = &self.states;
            self.traced.retain(|&id| {
                if states.is_descendant(id, ancestor) {
                    dropped.push(id);
                    false
                } else {
                    true
                }
            });
        }
        {
            let states = &self.states;
            self.deferred.retain(|&id| {
                if states.is_descendant(id, ancestor) {
                    dropped.push(id);
                    false
                } else {
                    true
                }
            });
        }

        for &id in &dropped {
            self.states.block(id);
            self.notify(Event::Block, id);
        }

        // Dropped states are leaves, so a tail run of them can be handed
        // back to the pool.
        dropped.sort_unstable_by(|a, b| b.cmp(a));
        for &id in &dropped {
            if id.index() + 1 != self.states.len() {
                break;
            }
            self.notify(Event::Evict, id);
            if !self.states.evict_last(id) {
                break;
            }
        }
        self.contexts.truncate(self.states.len());
    }

    /// Picks which deferred entangled states advance: for each state, the
    /// spawner arc is found by a level-counted ancestor walk; the states
    /// of the most recent root with the best (lowest) spawner priority
    /// return to the queue, lower-priority alternatives of the same root
    /// are dropped, and other roots stay deferred for the next round.
    fn resolve_entanglement(&mut self) -> Result<()> {
        let mut spawners: Vec<Spawner> = Vec::with_capacity(self.deferred.len());
        for i in 0..self.deferred.len() {
            let deferred = self.deferred[i];
            let group = self
                .net
                .get_node(self.states.get(deferred).bunch_node)
                .entanglement;
            debug_assert!(group != 0);

            let mut level = 0i32;
            let mut cursor = Some(deferred);
            let mut spawner = None;
            while let Some(id) = cursor {
                let arc = self.arc(self.states.get(id).arc);
                if self.net.get_node(arc.target).entanglement == group {
                    level += 1;
                }
                if arc.entanglement == group {
                    level -= 1;
                }
                if level == 0 {
                    spawner = Some(id);
                    break;
                }
                cursor = self.states.stored_ancestor(id);
            }
            let spawner = spawner.ok_or_else(|| {
                Error::new(
                    ErrorKind::Grammar,
                    format!("entanglement group {} has no spawner arc", group),
                )
            })?;
            spawners.push(Spawner {
                state: deferred,
                root: self.states.stored_ancestor(spawner),
                priority: self.arc(self.states.get(spawner).arc).priority,
            });
        }
        self.deferred.clear();

        // Most recent root first, then ascending priority.
        spawners.sort_by(|a, b| {
            b.root
                .cmp(&a.root)
                .then_with(|| a.priority.cmp(&b.priority))
        });

        let mut it = spawners.into_iter();
        if let Some(top) = it.next() {
            let top_root = top.root;
            let top_priority = top.priority;
            self.queue.push_back(top.state);
            self.notify(Event::Push, top.state);

            let mut rest = None;
            for sp in it.by_ref() {
                if sp.root != top_root {
                    rest = Some(sp);
                    break;
                }
                if sp.priority == top_priority {
                    self.queue.push_back(sp.state);
                    self.notify(Event::Push, sp.state);
                }
            }

            // Other roots keep only their own best priority, re-deferred
            // for the next outer iteration.
            let mut root = top_root;
            let mut priority = top_priority;
            for sp in rest.into_iter().chain(it) {
                if sp.root != root {
                    root = sp.root;
                    priority = sp.priority;
                }
                if sp.priority == priority {
                    self.deferred.push(sp.state);
                }
            }
        }
        Ok(())
    }
}
