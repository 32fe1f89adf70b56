//! Literal and boundary acceptors.

use crate::acceptor::{Acceptor, Spectrum};
use crate::model::Range;
use nparse_base::Result;

/// Accepts the empty range at the current position, always.
///
/// Used for epsilon transitions and as the acceptor of the synthetic
/// entry arc.
pub struct Unconditional;

impl Acceptor for Unconditional {
    fn accept(&self, _input: &str, _c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        s.push(e.last, e.last)
    }
}

/// Accepts exactly one given character.
pub struct Symbol {
    ch: char,
}

impl Symbol {
    pub fn new(ch: char) -> Self {
        Symbol { ch }
    }
}

impl Acceptor for Symbol {
    fn accept(&self, input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        if e.last < c.last && input[e.last..c.last].starts_with(self.ch) {
            s.push(e.last, e.last + self.ch.len_utf8())?;
        }
        Ok(())
    }
}

/// Accepts one character within an inclusive range.
pub struct CharRange {
    lo: char,
    hi: char,
}

impl CharRange {
    pub fn new(lo: char, hi: char) -> Self {
        CharRange { lo, hi }
    }
}

impl Acceptor for CharRange {
    fn accept(&self, input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        if let Some(ch) = input[e.last..c.last].chars().next() {
            if self.lo <= ch && ch <= self.hi {
                s.push(e.last, e.last + ch.len_utf8())?;
            }
        }
        Ok(())
    }
}

/// Literal string matching with exact or partial semantics.
///
/// The default is an exact greedy match. Partial mode accepts the longest
/// matched prefix (or any prefix when not greedy), optionally including
/// the empty one.
pub struct Text {
    text: String,
    partial: bool,
    accept_empty: bool,
    greedy: bool,
}

impl Text {
    /// Exact match of `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Text {
            text: text.into(),
            partial: false,
            accept_empty: false,
            greedy: true,
        }
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn accept_empty(mut self) -> Self {
        self.accept_empty = true;
        self
    }

    /// Enumerate every matched prefix instead of the longest one.
    pub fn generous(mut self) -> Self {
        self.greedy = false;
        self
    }
}

impl Acceptor for Text {
    fn accept(&self, input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        if !self.partial && self.text.len() > c.last - e.last {
            return Ok(());
        }

        let tail = &input[e.last..c.last];
        if self.greedy {
            let mut matched = 0;
            for (t, i) in self.text.chars().zip(tail.chars()) {
                if t != i {
                    break;
                }
                matched += t.len_utf8();
            }
            let full = matched == self.text.len();
            if full || (self.partial && (self.accept_empty || matched > 0)) {
                s.push(e.last, e.last + matched)?;
            }
        } else {
            if self.accept_empty {
                s.push(e.last, e.last)?;
            }
            let mut matched = 0;
            for (t, i) in self.text.chars().zip(tail.chars()) {
                if t != i {
                    break;
                }
                matched += t.len_utf8();
                s.push(e.last, e.last + matched)?;
            }
        }
        Ok(())
    }
}

/// Accepts exactly at the end of the analyzed range.
pub struct End;

impl Acceptor for End {
    fn accept(&self, _input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        if e.last == c.last {
            s.push(e.last, c.last)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptors::support::run;

    #[test]
    fn unconditional_pushes_the_empty_range() {
        assert_eq!(run(&Unconditional, "abc", 1), vec![(1, 1)]);
    }

    #[test]
    fn symbol_matches_a_single_character() {
        let pound = Symbol::new('#');
        assert_eq!(run(&pound, "#x", 0), vec![(0, 1)]);
        assert_eq!(run(&pound, "x#", 0), vec![]);
        assert_eq!(run(&pound, "#", 1), vec![]);
    }

    #[test]
    fn symbol_handles_multibyte_characters() {
        let arrow = Symbol::new('→');
        assert_eq!(run(&arrow, "→x", 0), vec![(0, 3)]);
    }

    #[test]
    fn char_range_is_inclusive() {
        let digit = CharRange::new('0', '9');
        assert_eq!(run(&digit, "7a", 0), vec![(0, 1)]);
        assert_eq!(run(&digit, "a7", 0), vec![]);
    }

    #[test]
    fn text_matches_exactly_by_default() {
        let alpha = Text::new("alpha");
        assert_eq!(run(&alpha, "alphabet", 0), vec![(0, 5)]);
        assert_eq!(run(&alpha, "alp", 0), vec![]);
        assert_eq!(run(&alpha, "gamma", 0), vec![]);
    }

    #[test]
    fn partial_text_accepts_the_longest_prefix() {
        let alpha = Text::new("alpha").partial();
        assert_eq!(run(&alpha, "alpine", 0), vec![(0, 3)]);
        assert_eq!(run(&alpha, "xyz", 0), vec![]);
        let with_empty = Text::new("alpha").partial().accept_empty();
        assert_eq!(run(&with_empty, "xyz", 0), vec![(0, 0)]);
    }

    #[test]
    fn generous_text_enumerates_prefixes() {
        let alpha = Text::new("ab").generous().accept_empty();
        assert_eq!(run(&alpha, "abc", 0), vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn end_accepts_only_at_the_boundary() {
        assert_eq!(run(&End, "ab", 2), vec![(2, 2)]);
        assert_eq!(run(&End, "ab", 1), vec![]);
    }
}
