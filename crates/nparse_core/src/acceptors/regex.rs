//! Regular-expression acceptor.
//!
//! Two modes: *search* looks for the pattern in the unconsumed suffix and
//! accepts the matched sub-range; *boundary* requires the pattern to cover
//! the current element exactly. In both modes, named capture groups seed
//! trace variables of the same names on the spawned state.

use crate::acceptor::{Acceptor, Spectrum};
use crate::model::Range;
use crate::variable::Value;
use nparse_base::{Error, ErrorKind, KeyTable, Result, Symbol};
use std::cell::RefCell;

pub struct RegEx {
    re: regex::Regex,
    boundary: bool,
    /// Pre-interned names of the pattern's named capture groups.
    captures: Vec<(String, Symbol)>,
}

impl RegEx {
    /// Search mode.
    pub fn new(pattern: &str, keys: &RefCell<KeyTable>) -> Result<Self> {
        Self::compile(pattern, false, keys)
    }

    /// Boundary mode: the pattern must cover the current element exactly.
    pub fn matching(pattern: &str, keys: &RefCell<KeyTable>) -> Result<Self> {
        Self::compile(pattern, true, keys)
    }

    fn compile(pattern: &str, boundary: bool, keys: &RefCell<KeyTable>) -> Result<Self> {
        let anchored;
        let source = if boundary {
            anchored = format!("^(?:{})$", pattern);
            anchored.as_str()
        } else {
            pattern
        };
        let re = regex::Regex::new(source)
            .map_err(|err| Error::new(ErrorKind::Grammar, err.to_string()))?;
        let captures = re
            .capture_names()
            .flatten()
            .map(|name| (name.to_string(), keys.borrow_mut().intern(name)))
            .collect();
        Ok(RegEx {
            re,
            boundary,
            captures,
        })
    }

    fn seed_captures(
        &self,
        caps: &regex::Captures<'_>,
        state: crate::state::StateId,
        s: &mut dyn Spectrum,
    ) {
        for (name, key) in &self.captures {
            if let Some(group) = caps.name(name) {
                s.seed(state, *key, Value::String(group.as_str().to_string()));
            }
        }
    }
}

impl Acceptor for RegEx {
    fn accept(&self, input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        if self.boundary {
            if let Some(caps) = self.re.captures(e.text(input)) {
                let state = s.spawn(e.first, e.last)?;
                self.seed_captures(&caps, state, s);
                s.enqueue(state);
            }
        } else if let Some(caps) = self.re.captures(&input[e.last..c.last]) {
            let group = caps.get(0).ok_or_else(|| {
                Error::new(ErrorKind::Runtime, "regex match without a whole-match group")
            })?;
            let state = s.spawn(e.last + group.start(), e.last + group.end())?;
            self.seed_captures(&caps, state, s);
            s.enqueue(state);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptors::support::{run, Record};

    fn keys() -> RefCell<KeyTable> {
        RefCell::new(KeyTable::new())
    }

    #[test]
    fn search_accepts_the_matched_subrange() {
        let keys = keys();
        let re = RegEx::new(r"[0-9]+", &keys).unwrap();
        assert_eq!(run(&re, "ab123cd", 2), vec![(2, 5)]);
    }

    #[test]
    fn search_may_start_past_the_cursor() {
        let keys = keys();
        let re = RegEx::new(r"[0-9]+", &keys).unwrap();
        assert_eq!(run(&re, "ab123cd", 0), vec![(2, 5)]);
    }

    #[test]
    fn boundary_mode_requires_exact_cover() {
        let keys = keys();
        let re = RegEx::matching(r"[a-z]+", &keys).unwrap();
        let mut sink = Record::new();
        re.accept("alpha5", Range::new(0, 6), Range::new(0, 5), &mut sink)
            .unwrap();
        assert_eq!(sink.pushed, vec![(0, 5)]);

        let mut sink = Record::new();
        re.accept("alpha5", Range::new(0, 6), Range::new(0, 6), &mut sink)
            .unwrap();
        assert!(sink.pushed.is_empty());
    }

    #[test]
    fn named_captures_seed_trace_variables() {
        let keys = keys();
        let re = RegEx::new(r"(?P<word>[a-z]+)=(?P<num>[0-9]+)", &keys).unwrap();
        let mut sink = Record::new();
        re.accept("x=42;", Range::new(0, 5), Range::new(0, 0), &mut sink)
            .unwrap();
        assert_eq!(sink.pushed, vec![(0, 4)]);
        let word = keys.borrow_mut().intern("word");
        let num = keys.borrow_mut().intern("num");
        assert!(sink
            .seeded
            .contains(&(word, Value::String("x".into()))));
        assert!(sink.seeded.contains(&(num, Value::String("42".into()))));
    }

    #[test]
    fn invalid_patterns_are_grammar_errors() {
        let keys = keys();
        let err = RegEx::new(r"(unclosed", &keys).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Grammar);
    }
}
