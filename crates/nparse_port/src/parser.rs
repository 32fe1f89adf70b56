//! The embedding parser facade.
//!
//! [`Parser`] wraps a traveller and a tracer behind a small stateful
//! surface: load a grammar, parse inputs, walk the found traces, read and
//! seed trace variables, and inspect diagnostics. Its status machine
//! mirrors the engine lifecycle:
//!
//! ```text
//! Ready ──load──▶ Steady ──parse──▶ Running ──▶ Completed
//!   │                ▲                              │
//!   │                └────────── reset ◀────────────┘
//!   └──────────▶ (error states, cleared by reset)
//! ```

use crate::staging::{Engine, Staging, StagingFactory};
use nparse_base::{Error, ErrorKind, Result, SourceLoc};
use nparse_core::{
    Deadlock, DeadlockObserver, EngineView, Event, Label, Network, Observer, StateId,
    StatusReport, Tracer, Traveller, Value,
};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Parser status, also referred to as the internal parser state — not to
/// be confused with analysis states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Ready to load a grammar.
    Ready,
    /// Grammar loaded, ready to parse.
    Steady,
    /// A parser task is running.
    Running,
    /// A parser task has completed.
    Completed,
    /// An operation was invoked in the wrong status.
    LogicError,
    /// The input did not match the grammar.
    SyntaxError,
    /// The input matched ambiguously where uniqueness was demanded.
    SyntaxAmbiguity,
    /// The grammar failed to compile.
    CompileError,
    /// A runtime failure terminated the parse.
    RuntimeError,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ready => "ready",
            Status::Steady => "steady",
            Status::Running => "running",
            Status::Completed => "completed",
            Status::LogicError => "logic error",
            Status::SyntaxError => "syntax error",
            Status::SyntaxAmbiguity => "syntax ambiguity",
            Status::CompileError => "compile error",
            Status::RuntimeError => "runtime error",
        }
    }
}

/// A diagnostic message with an optional grammar source location.
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub location: Option<SourceLoc>,
}

/// Delegating observer so the parser keeps a handle on the diagnostics
/// heap while the traveller owns the observer slot.
struct SharedObserver(Rc<RefCell<DeadlockObserver>>);

impl Observer for SharedObserver {
    fn notify(&mut self, event: Event, state: StateId, view: &EngineView<'_>) {
        self.0.borrow_mut().notify(event, state, view);
    }

    fn status(&mut self, report: &StatusReport) -> Result<()> {
        self.0.borrow_mut().status(report)
    }

    fn reset(&mut self) {
        self.0.borrow_mut().reset();
    }
}

/// The main parser interface.
pub struct Parser {
    engine: Engine,
    factory: Option<StagingFactory>,
    staging: Option<Box<dyn Staging>>,
    traveller: Option<Traveller>,
    tracer: Tracer,
    diagnostics: Rc<RefCell<DeadlockObserver>>,

    // settings
    entry_point: String,
    entry_label: i32,
    input_pool: usize,
    input_swap: Option<PathBuf>,
    lr_tolerance: u32,

    // initial trace variables
    init_vars: Vec<(String, Value)>,

    // stats
    status: Status,
    messages: Vec<Message>,
    iteration_count: u64,
    first_trace: bool,
    shift: i32,
    trace_no: u64,
    state_no: u64,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            engine: Engine::new(),
            factory: None,
            staging: None,
            traveller: None,
            tracer: Tracer::new(),
            diagnostics: Rc::new(RefCell::new(DeadlockObserver::new())),
            entry_point: "S".to_string(),
            entry_label: 1,
            input_pool: 16 << 20,
            input_swap: None,
            lr_tolerance: 64,
            init_vars: Vec::new(),
            status: Status::Ready,
            messages: Vec::new(),
            iteration_count: 0,
            first_trace: false,
            shift: 0,
            trace_no: 0,
            state_no: 0,
        }
    }

    /// A parser that compiles grammar sources through `factory`.
    pub fn with_factory(factory: StagingFactory) -> Self {
        let mut parser = Self::new();
        parser.factory = Some(factory);
        parser
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Names the rule whose cluster is the parse entry point.
    pub fn set_entry_point(&mut self, name: impl Into<String>) {
        self.entry_point = name.into();
    }

    pub fn set_entry_label(&mut self, label: i32) {
        self.entry_label = label;
    }

    /// Input state pool capacity in bytes.
    pub fn set_input_pool(&mut self, bytes: usize) {
        self.input_pool = bytes;
    }

    /// Swap file backing the input state pool.
    pub fn set_input_swap(&mut self, path: impl Into<PathBuf>) {
        self.input_swap = Some(path.into());
    }

    pub fn set_lr_tolerance(&mut self, tolerance: u32) {
        self.lr_tolerance = tolerance;
    }

    /// Bounds the diagnostics heap (deepest-reached states on failure).
    pub fn set_max_trace_count(&mut self, count: usize) {
        self.diagnostics.borrow_mut().set_max_trace_count(count);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn status_str(&self) -> &'static str {
        self.status.as_str()
    }

    fn validate(&mut self, expected: Status) -> bool {
        if self.status == expected {
            true
        } else {
            self.status = Status::LogicError;
            false
        }
    }

    fn report(&mut self, mut error: Error, status: Status) {
        if let Some(staging) = &self.staging {
            staging.extend(&mut error);
        }
        self.messages.push(Message {
            text: match &error.function {
                Some(function) => format!("{}: {}", function, error.message),
                None => error.message.clone(),
            },
            location: error.location.clone(),
        });
        self.status = status;
        log::debug!(target: "nparse", "reported: {}", error);
    }

    /// Loads a grammar by compiling `source` through the staging factory.
    pub fn load(&mut self, source: &str) -> bool {
        if !self.validate(Status::Ready) {
            return false;
        }
        let factory = match self.factory.take() {
            Some(factory) => factory,
            None => {
                self.report(
                    Error::new(ErrorKind::Grammar, "no grammar compiler attached"),
                    Status::CompileError,
                );
                return false;
            }
        };
        let produced = factory(&self.engine, source);
        self.factory = Some(factory);
        match produced {
            Ok(staging) => self.install(staging),
            Err(err) => {
                self.report(err, Status::CompileError);
                false
            }
        }
    }

    /// Loads a pre-compiled network directly.
    pub fn load_network(&mut self, net: Network) -> bool {
        if !self.validate(Status::Ready) {
            return false;
        }
        self.install(Box::new(crate::staging::PrebuiltStaging::new(net)))
    }

    /// Loads a grammar through an explicit staging collaborator.
    pub fn load_staging(&mut self, staging: Box<dyn Staging>) -> bool {
        if !self.validate(Status::Ready) {
            return false;
        }
        self.install(staging)
    }

    fn install(&mut self, staging: Box<dyn Staging>) -> bool {
        self.staging = Some(staging);
        match self.activate() {
            Ok(()) => {
                self.status = Status::Steady;
                log::debug!(target: "nparse", "grammar loaded, entry '{}'", self.entry_point);
                true
            }
            Err(err) => {
                self.staging = None;
                self.report(err, Status::CompileError);
                false
            }
        }
    }

    fn activate(&mut self) -> Result<()> {
        let staging = self.staging.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Logic, "no grammar loaded")
        })?;
        let entry = staging.cluster(&self.entry_point).ok_or_else(|| {
            Error::new(
                ErrorKind::Grammar,
                format!("unresolved entry rule '{}'", self.entry_point),
            )
        })?;
        let mut traveller = Traveller::new(
            staging.network(),
            Rc::clone(self.engine.keys()),
            entry,
            Label::new(self.entry_label),
        );
        if let Some(swap) = &self.input_swap {
            traveller.set_swap_file(swap.clone())?;
        }
        traveller.set_capacity(self.input_pool)?;
        traveller.set_lr_tolerance(self.lr_tolerance);
        traveller.set_observer(Box::new(SharedObserver(Rc::clone(&self.diagnostics))));
        self.traveller = Some(traveller);
        self.tracer = Tracer::new();
        Ok(())
    }

    /// Runs the traveller over `input`. True iff at least one trace was
    /// found.
    pub fn parse(&mut self, input: &str) -> bool {
        if !self.validate(Status::Steady) {
            return false;
        }
        self.status = Status::Running;

        let keys = Rc::clone(self.engine.keys());
        let outcome = (|| -> Result<u64> {
            let traveller = self
                .traveller
                .as_mut()
                .ok_or_else(|| Error::new(ErrorKind::Logic, "no grammar loaded"))?;
            traveller.init(input)?;
            for (name, value) in &self.init_vars {
                let key = keys.borrow_mut().intern(name);
                traveller.seed_var(key, value.clone())?;
            }
            traveller.run()
        })();

        match outcome {
            Ok(iterations) => {
                self.iteration_count = iterations;
                self.first_trace = match &mut self.traveller {
                    Some(traveller) => self.tracer.next(traveller),
                    None => false,
                };
                self.trace_no = 0;
                self.state_no = 0;
                self.status = Status::Completed;
                self.first_trace || self.trace_count() > 0
            }
            Err(err) => {
                self.report(err, Status::RuntimeError);
                false
            }
        }
    }

    /// Like [`parse`](Self::parse), but demands a unique surface trace.
    ///
    /// No trace reports a syntax error carrying the deepest-reached
    /// positions as grammar rule paths; more than one trace reports a
    /// syntax ambiguity. Either failure leaves the message list
    /// populated.
    pub fn parse_unique(&mut self, input: &str) -> bool {
        if !self.parse(input) {
            if self.status == Status::Completed {
                let deadlocks = self.deadlocks();
                if deadlocks.is_empty() {
                    self.messages.push(Message {
                        text: "syntax error".to_string(),
                        location: None,
                    });
                } else {
                    for deadlock in deadlocks {
                        let location = self
                            .staging
                            .as_ref()
                            .and_then(|staging| staging.identify(deadlock.offset));
                        let text = if deadlock.path.is_empty() {
                            format!("syntax error at offset {}", deadlock.offset)
                        } else {
                            format!(
                                "syntax error at offset {} in {}",
                                deadlock.offset, deadlock.path
                            )
                        };
                        self.messages.push(Message { text, location });
                    }
                }
                self.status = Status::SyntaxError;
            }
            return false;
        }
        if self.trace_count() > 1 {
            self.messages.push(Message {
                text: "syntax ambiguity".to_string(),
                location: None,
            });
            self.status = Status::SyntaxAmbiguity;
            return false;
        }
        true
    }

    /// Advances to the next trace.
    pub fn next(&mut self) -> bool {
        if !self.validate(Status::Completed) {
            return false;
        }
        self.trace_no += 1;
        self.state_no = 0;
        if self.first_trace {
            self.first_trace = false;
            return true;
        }
        match &self.traveller {
            Some(traveller) => self.tracer.next(traveller),
            None => false,
        }
    }

    /// Advances to the next *actual* state of the current trace, counting
    /// closed named frames into [`shift`](Self::shift).
    pub fn step(&mut self) -> bool {
        if !self.validate(Status::Completed) {
            return false;
        }
        let traveller = match &self.traveller {
            Some(traveller) => traveller,
            None => return false,
        };
        self.shift = 0;
        while self.tracer.step(traveller) {
            self.state_no += 1;
            match self.tracer.kind(traveller) {
                1 => return true,
                2 => {
                    // A closing parenthesis; count it when the closed
                    // frame belongs to a named rule.
                    if let Some(state) = self.tracer.relative(traveller, "<:") {
                        let node = traveller.states().get(state).bunch_node;
                        if traveller.network().get_node(node).name.is_some() {
                            self.shift += 1;
                        }
                    }
                }
                _ => {}
            }
        }
        self.shift += 1;
        false
    }

    /// Restarts trace enumeration of the completed parse.
    pub fn rewind(&mut self) {
        if !self.validate(Status::Completed) {
            return;
        }
        self.tracer.rewind();
        self.trace_no = 0;
        self.state_no = 0;
        self.first_trace = match &self.traveller {
            Some(traveller) => self.tracer.next(traveller),
            None => false,
        };
    }

    /// Returns the parser to `Steady`, clearing results and messages.
    pub fn reset(&mut self) {
        match self.status {
            Status::Ready | Status::Running => return,
            Status::LogicError
            | Status::SyntaxError
            | Status::SyntaxAmbiguity
            | Status::CompileError
            | Status::RuntimeError => {
                self.messages.clear();
                self.status = Status::Steady;
            }
            Status::Completed => {
                self.status = Status::Steady;
            }
            Status::Steady => {}
        }
        self.tracer.rewind();
        if let Some(traveller) = &mut self.traveller {
            traveller.reset();
        }
        self.first_trace = false;
        self.iteration_count = 0;
        self.shift = 0;
        self.trace_no = 0;
        self.state_no = 0;
    }

    // ------------------------------------------------------------------
    // Trace inspection
    // ------------------------------------------------------------------

    /// Integer label of the current state's arc.
    pub fn label(&self) -> i32 {
        match &self.traveller {
            Some(traveller) => self.tracer.label(traveller),
            None => 0,
        }
    }

    /// Name of the current state's target node.
    pub fn node(&self) -> String {
        match &self.traveller {
            Some(traveller) => self.tracer.node_name(traveller).unwrap_or("").to_string(),
            None => String::new(),
        }
    }

    /// Accepted text of the current state.
    pub fn text(&self) -> String {
        match &self.traveller {
            Some(traveller) => self.tracer.text(traveller).to_string(),
            None => String::new(),
        }
    }

    /// Closed named frames since the last actual state.
    pub fn shift(&self) -> i32 {
        self.shift
    }

    /// Significance of the current state (0 skip, 1 actual, 2 split).
    pub fn state_kind(&self) -> i32 {
        match &self.traveller {
            Some(traveller) => self.tracer.kind(traveller),
            None => 0,
        }
    }

    /// 1-based index of the current trace.
    pub fn trace_index(&self) -> u64 {
        self.trace_no
    }

    /// 1-based index of the current state within its trace.
    pub fn state_index(&self) -> u64 {
        self.state_no
    }

    /// Reads a trace variable visible from the current trace state.
    pub fn get(&self, name: &str) -> Value {
        let traveller = match &self.traveller {
            Some(traveller) => traveller,
            None => return Value::Null,
        };
        let state = match self.tracer.current(traveller) {
            Some(state) => state,
            None => return Value::Null,
        };
        let key = match traveller.keys().borrow().lookup(name) {
            Some(key) => key,
            None => return Value::Null,
        };
        traveller.val(state, key)
    }

    /// The full visible context of the current trace state as an array
    /// value.
    pub fn get_root(&self) -> Value {
        let traveller = match &self.traveller {
            Some(traveller) => traveller,
            None => return Value::Null,
        };
        let state = match self.tracer.current(traveller) {
            Some(state) => state,
            None => return Value::Null,
        };
        let snapshot = nparse_core::new_array();
        if let Value::Array(ctx) = &snapshot {
            let mut ctx = ctx.borrow_mut();
            for (key, value) in traveller.contexts().list(traveller.states(), state, false) {
                ctx.set(key, value);
            }
        }
        snapshot
    }

    /// Visible bindings of the current trace state, sorted by key name.
    pub fn list_visible(&self) -> Vec<(String, Value)> {
        let traveller = match &self.traveller {
            Some(traveller) => traveller,
            None => return Vec::new(),
        };
        let state = match self.tracer.current(traveller) {
            Some(state) => state,
            None => return Vec::new(),
        };
        let keys = traveller.keys().borrow();
        let mut out: Vec<(String, Value)> = traveller
            .contexts()
            .list(traveller.states(), state, false)
            .into_iter()
            .map(|(key, value)| (keys.resolve(key).to_string(), value))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Seeds an initial trace variable for subsequent parses.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.init_vars.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.init_vars.push((name, value)),
        }
    }

    /// Drops all seeded variables.
    pub fn clear(&mut self) {
        self.init_vars.clear();
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Deepest-reached positions of the last parse, deepest first; the
    /// failure locations to show when no trace was found.
    pub fn deadlocks(&self) -> Vec<Deadlock> {
        match &self.traveller {
            Some(traveller) => self.diagnostics.borrow().analyze(&traveller.view()),
            None => Vec::new(),
        }
    }

    pub fn trace_count(&self) -> usize {
        self.traveller
            .as_ref()
            .map(|traveller| traveller.traced().len())
            .unwrap_or(0)
    }

    pub fn iteration_count(&self) -> u64 {
        self.iteration_count
    }

    pub fn context_count(&self) -> u64 {
        self.traveller
            .as_ref()
            .map(|traveller| traveller.contexts().frames_created())
            .unwrap_or(0)
    }

    pub fn pool_usage(&self) -> usize {
        self.traveller
            .as_ref()
            .map(|traveller| traveller.states().pool().usage())
            .unwrap_or(0)
    }

    pub fn pool_peak_usage(&self) -> usize {
        self.traveller
            .as_ref()
            .map(|traveller| traveller.states().pool().peak_usage())
            .unwrap_or(0)
    }

    pub fn pool_capacity(&self) -> usize {
        self.traveller
            .as_ref()
            .map(|traveller| traveller.states().pool().capacity())
            .unwrap_or(0)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
