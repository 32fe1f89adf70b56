//! # nparse-base
//!
//! Structural atoms for the nParse ecosystem.
//!
//! This crate provides the foundational types used throughout nParse:
//!
//! - [`StatePool`] — Bump allocation with last-in eviction for analysis states
//! - [`KeyTable`]/[`Symbol`] — Canonical trace-variable keys with O(1) equality
//! - [`SourceLoc`] — Grammar source location tracking
//! - [`Error`]/[`Result`] — Structured errors with kind and location
//!
//! # Design Principles
//!
//! This crate has **no knowledge of acceptor networks or grammars**. It
//! provides only generic, reusable infrastructure that the engine crates
//! build upon.
//!
//! # Example
//!
//! ```
//! use nparse_base::{KeyTable, StatePool};
//!
//! let mut pool = StatePool::new();
//! pool.set_capacity(1024).unwrap();
//! let offset = pool.allocate(64).unwrap();
//! assert_eq!(offset, 0);
//! assert_eq!(pool.usage(), 64);
//!
//! let mut keys = KeyTable::new();
//! let x = keys.intern("x");
//! assert_eq!(keys.resolve(x), "x");
//! ```

pub mod error;
pub mod intern;
pub mod pool;
pub mod span;

pub use error::{Error, ErrorKind, Result};
pub use intern::{KeyTable, Symbol};
pub use pool::StatePool;
pub use span::SourceLoc;
