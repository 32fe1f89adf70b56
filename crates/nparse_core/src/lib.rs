//! # nparse-core
//!
//! The nParse execution engine: a nondeterministic acceptor-network
//! traveller.
//!
//! A grammar compiles to a [`Network`] of nodes and labelled arcs, each
//! arc carrying an acceptor predicate and an optional semantic action.
//! The [`Traveller`] explores every parse of an input over that network,
//! spawning pool-allocated analysis states as acceptors accept; the
//! [`Tracer`] then enumerates the successful parses.
//!
//! ## Architecture
//!
//! ```text
//!  Network (nodes, arcs, labels)      Acceptors (predicates)
//!        │                                  │
//!        ▼                                  ▼
//!  ┌───────────────────────────────────────────┐
//!  │                 Traveller                 │
//!  │   queue ─ states ─ contexts ─ observers   │
//!  └─────────────────────┬─────────────────────┘
//!                        │ terminal states
//!                        ▼
//!                     Tracer ──▶ enumerable parses
//! ```
//!
//! ## Modules
//!
//! - [`model`]: the acceptor network — nodes, arcs, labels
//! - [`acceptor`]/[`acceptors`]: the predicate contract and the standard
//!   family
//! - [`variable`]: trace variable values and coercions
//! - [`context`]: per-branch copy-on-write variable frames
//! - [`dsel`]: semantic-action expression trees and their evaluator
//! - [`state`]: analysis states and their pool-backed store
//! - [`traveller`]: the state-spawning search loop
//! - [`observer`]: scheduling hooks and failure diagnostics
//! - [`tracer`]: enumeration of accepting parses
//!
//! ## Example
//!
//! ```
//! use nparse_core::acceptors::{End, Text};
//! use nparse_core::{ArcKind, Label, Network, State, Tracer, Traveller};
//! use nparse_base::KeyTable;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut net = Network::new();
//! let entry = net.node();
//! let exit = net.node();
//! let term = net.node();
//! let word = net.acceptor(Text::new("word"));
//! let end = net.acceptor(End);
//! net.link(entry, exit, word, ArcKind::Simple, 1);
//! net.link(exit, term, end, ArcKind::Simple, 2);
//!
//! let keys = Rc::new(RefCell::new(KeyTable::new()));
//! let mut traveller = Traveller::new(Rc::new(net), keys, entry, Label::default());
//! traveller.set_capacity(1024 * State::ALLOC_SIZE).unwrap();
//! traveller.run_on("word").unwrap();
//!
//! let mut tracer = Tracer::new();
//! assert!(tracer.next(&traveller));
//! ```

pub mod acceptor;
pub mod acceptors;
pub mod context;
pub mod dsel;
pub mod model;
pub mod observer;
pub mod state;
pub mod tracer;
pub mod traveller;
pub mod variable;

pub use acceptor::{Acceptor, AcceptorRegistry, Spectrum};
pub use context::ContextStore;
pub use dsel::{Action, BinaryOp, Builtin, Expr, UnaryOp};
pub use model::{
    AcceptorId, ActionId, Arc, ArcId, ArcKind, Label, Network, Node, NodeId, Pos, Range,
};
pub use observer::{
    Deadlock, DeadlockObserver, EngineView, Event, NullObserver, Observer, StatusReport,
};
pub use state::{State, StateId, StateKind, StateStore};
pub use tracer::Tracer;
pub use traveller::Traveller;
pub use variable::{new_array, priority_tag, ArrayContext, ArrayRef, Tag, Value};
