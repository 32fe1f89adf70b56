//! The standard acceptor family.
//!
//! Each acceptor is a small, self-contained predicate over the analyzed
//! input. The family mirrors what grammars actually need: literal
//! matching ([`Symbol`], [`Text`], [`CharRange`]), character-class tests
//! with quantifier flags ([`Test`], [`class`]), boundary matching
//! ([`End`]), regular expressions ([`RegEx`]), assertion wrappers
//! ([`Check`], [`Not`]), the recursion guard ([`Once`]) and explicit
//! length windows ([`Skip`], [`Clip`]).

mod clip;
mod once;
mod regex;
mod simple;
mod test;
mod wrap;

pub use clip::{Clip, Skip};
pub use once::Once;
pub use regex::RegEx;
pub use simple::{CharRange, End, Symbol, Text, Unconditional};
pub use test::{alpha, class, digit, lower, punct, space, upper, Test};
pub use test::{ACCEPT_EMPTY, GREEDY, NEGATE, SINGLE};
pub use wrap::{Check, Not};

use crate::acceptor::{Acceptor, AcceptorRegistry};
use crate::model::Pos;
use nparse_base::{Error, ErrorKind, KeyTable, Result};
use std::cell::RefCell;

/// Advances `from` by up to `n` characters, staying within `limit`.
/// Returns `None` when fewer than `n` characters remain.
pub(crate) fn advance_chars(input: &str, from: Pos, limit: Pos, n: usize) -> Option<Pos> {
    let mut pos = from;
    for _ in 0..n {
        let ch = input[pos..limit].chars().next()?;
        pos += ch.len_utf8();
    }
    Some(pos)
}

/// Identifiers of the standard family.
const STANDARD_NAMES: &[&str] = &[
    "pass", "symbol", "string", "class", "range", "test", "end", "regex", "check", "not",
    "once", "skip", "clip",
];

/// Builds one member of the standard family from its identifier and
/// configuration string.
///
/// The wrapper acceptors take their wrapped acceptor as the configuration,
/// in the same `name` or `name:config` form — e.g. `check` with
/// `string:alpha`, or `not` with `regex:[0-9]+`.
pub fn standard_acceptor(
    name: &str,
    config: &str,
    keys: &RefCell<KeyTable>,
) -> Result<Box<dyn Acceptor>> {
    match name {
        "pass" => Ok(Box::new(Unconditional)),
        "symbol" => {
            let ch = config.chars().next().ok_or_else(|| {
                Error::new(ErrorKind::Grammar, "symbol acceptor needs one character")
            })?;
            Ok(Box::new(Symbol::new(ch)))
        }
        "string" => Ok(Box::new(Text::new(config))),
        "class" => Ok(Box::new(class(config, SINGLE | GREEDY))),
        "range" => {
            let mut chars = config.chars();
            match (chars.next(), chars.next(), chars.next(), chars.next()) {
                (Some(lo), Some('-'), Some(hi), None) => Ok(Box::new(CharRange::new(lo, hi))),
                _ => Err(Error::new(
                    ErrorKind::Grammar,
                    "range acceptor needs a 'lo-hi' configuration",
                )),
            }
        }
        "test" => Ok(match config {
            "alpha" => Box::new(alpha()),
            "digit" => Box::new(digit()),
            "lower" => Box::new(lower()),
            "upper" => Box::new(upper()),
            "punct" => Box::new(punct()),
            "space" => Box::new(space()),
            other => {
                return Err(Error::new(
                    ErrorKind::Grammar,
                    format!("unknown character test '{}'", other),
                ))
            }
        }),
        "end" => Ok(Box::new(End)),
        "regex" => Ok(Box::new(RegEx::new(config, keys)?)),
        "check" => Ok(Box::new(Check::boxed(wrapped_acceptor(config, keys)?))),
        "not" => Ok(Box::new(Not::boxed(wrapped_acceptor(config, keys)?))),
        "once" => Ok(Box::new(Once)),
        "skip" => Ok(Box::new(Skip::new(parse_lengths(config)?))),
        "clip" => Ok(Box::new(Clip::new(parse_lengths(config)?))),
        other => Err(Error::new(
            ErrorKind::Grammar,
            format!("unknown acceptor '{}'", other),
        )),
    }
}

/// Resolves a wrapper's configuration into the acceptor it wraps.
fn wrapped_acceptor(config: &str, keys: &RefCell<KeyTable>) -> Result<Box<dyn Acceptor>> {
    let (name, config) = match config.split_once(':') {
        Some((name, rest)) => (name, rest),
        None => (config, ""),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::new(
            ErrorKind::Grammar,
            "wrapper acceptor needs a wrapped acceptor as its configuration",
        ));
    }
    standard_acceptor(name, config, keys)
}

fn parse_lengths(config: &str) -> Result<Vec<i32>> {
    let mut lengths = Vec::new();
    for part in config.split(',').filter(|p| !p.trim().is_empty()) {
        let n: i32 = part.trim().parse().map_err(|_| {
            Error::new(ErrorKind::Grammar, "length windows need integer lengths")
        })?;
        lengths.push(n);
    }
    Ok(lengths)
}

/// Registers the standard family under its canonical identifiers.
pub fn register_standard(registry: &mut AcceptorRegistry) {
    for &name in STANDARD_NAMES {
        registry.register(
            name,
            Box::new(move |config, keys| standard_acceptor(name, config, keys)),
        );
    }
}

#[cfg(test)]
pub(crate) mod support {
    use crate::acceptor::Spectrum;
    use crate::model::{Pos, Range};
    use crate::state::StateId;
    use crate::variable::Value;
    use nparse_base::{Result, Symbol};

    /// Test spectrum recording pushed ranges and seeded variables.
    pub struct Record {
        pub pushed: Vec<(Pos, Pos)>,
        pub seeded: Vec<(Symbol, Value)>,
    }

    impl Record {
        pub fn new() -> Self {
            Record {
                pushed: Vec::new(),
                seeded: Vec::new(),
            }
        }
    }

    impl Spectrum for Record {
        fn push(&mut self, from: Pos, to: Pos) -> Result<()> {
            self.pushed.push((from, to));
            Ok(())
        }

        fn spawn(&mut self, from: Pos, to: Pos) -> Result<StateId> {
            self.pushed.push((from, to));
            Ok(StateId(self.pushed.len() as u32 - 1))
        }

        fn enqueue(&mut self, _: StateId) {}

        fn seed(&mut self, _: StateId, key: Symbol, value: Value) {
            self.seeded.push((key, value));
        }
    }

    /// Runs an acceptor over the whole input with an empty element at
    /// `at`, returning the pushed ranges.
    pub fn run(
        acceptor: &dyn crate::acceptor::Acceptor,
        input: &str,
        at: Pos,
    ) -> Vec<(Pos, Pos)> {
        let mut sink = Record::new();
        acceptor
            .accept(
                input,
                Range::new(0, input.len()),
                Range::new(at, at),
                &mut sink,
            )
            .unwrap();
        sink.pushed
    }
}
