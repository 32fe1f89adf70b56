//! Explicit length windows.
//!
//! [`Skip`] accepts forward runs of fixed character lengths; [`Clip`]
//! accepts head-anchored sub-ranges of the already accepted element. Both
//! take a length program: a non-negative entry is a single length, and a
//! negative entry `-n` extends the previous length up through `n`, one
//! candidate per length.

use super::advance_chars;
use crate::acceptor::{Acceptor, Spectrum};
use crate::model::Range;
use nparse_base::Result;

fn expand_lengths(program: &[i32]) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut previous = 0usize;
    for &entry in program {
        if entry >= 0 {
            lengths.push(entry as usize);
            previous = entry as usize;
        } else {
            let upper = (-entry) as usize;
            while previous < upper {
                previous += 1;
                lengths.push(previous);
            }
        }
    }
    lengths
}

/// Accepts runs of the programmed character lengths after the element.
pub struct Skip {
    lengths: Vec<usize>,
}

impl Skip {
    pub fn new(program: impl AsRef<[i32]>) -> Self {
        Skip {
            lengths: expand_lengths(program.as_ref()),
        }
    }
}

impl Acceptor for Skip {
    fn accept(&self, input: &str, c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        for &n in &self.lengths {
            if let Some(to) = advance_chars(input, e.last, c.last, n) {
                s.push(e.last, to)?;
            }
        }
        Ok(())
    }
}

/// Accepts head-anchored sub-ranges of the current element with the
/// programmed character lengths.
pub struct Clip {
    lengths: Vec<usize>,
}

impl Clip {
    pub fn new(program: impl AsRef<[i32]>) -> Self {
        Clip {
            lengths: expand_lengths(program.as_ref()),
        }
    }
}

impl Acceptor for Clip {
    fn accept(&self, input: &str, _c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        for &n in &self.lengths {
            if let Some(to) = advance_chars(input, e.first, e.last, n) {
                s.push(e.first, to)?;
            }
        }
        Ok(())
    }
}
