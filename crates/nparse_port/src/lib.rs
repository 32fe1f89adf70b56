//! # nparse-port
//!
//! The embedding surface of nParse.
//!
//! [`Parser`] is the whole story for most embeddings: load a grammar
//! (through a [`Staging`] collaborator or a hand-built network), parse
//! inputs, enumerate traces, read trace variables, inspect diagnostics.
//! [`Engine`] carries what a parser instance shares across parses — the
//! key interner, the acceptor factory registry and the compiled-grammar
//! cache — so independent parsers never touch global state.
//!
//! ## Example
//!
//! ```
//! use nparse_core::acceptors::{End, Text};
//! use nparse_core::{ArcKind, Network};
//! use nparse_port::Parser;
//!
//! let mut net = Network::new();
//! let entry = net.named_node("S");
//! let exit = net.node();
//! let term = net.node();
//! let word = net.acceptor(Text::new("word"));
//! let end = net.acceptor(End);
//! net.link(entry, exit, word, ArcKind::Simple, 1);
//! net.link(exit, term, end, ArcKind::Simple, 2);
//!
//! let mut parser = Parser::new();
//! assert!(parser.load_network(net));
//! assert!(parser.parse("word"));
//! assert!(parser.next());
//! while parser.step() {
//!     let _ = (parser.label(), parser.node(), parser.text());
//! }
//! ```

pub mod format;
pub mod parser;
pub mod staging;

pub use format::TraceFormat;
pub use parser::{Message, Parser, Status};
pub use staging::{Engine, PrebuiltStaging, Staging, StagingFactory};
