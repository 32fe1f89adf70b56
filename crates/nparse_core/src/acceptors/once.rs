//! Left-recursion guard.
//!
//! Placed on a rule's entry arc, [`Once`] re-accepts the current element
//! unchanged but first walks the ancestor trail: finding the same arc
//! already entered at the same range means the rule is recursing without
//! consuming, which can never terminate. With the traveller's tolerance
//! at zero the first such re-entry raises the left-recursion error; a
//! nonzero tolerance instead admits that many re-entries and then prunes
//! the branch silently, so bounded recursive grammars still enumerate
//! their valid partitions.

use crate::acceptor::{Acceptor, Spectrum};
use crate::model::Range;
use nparse_base::{Error, ErrorKind, Result};

pub struct Once;

impl Acceptor for Once {
    fn accept(&self, _input: &str, _c: Range, e: Range, s: &mut dyn Spectrum) -> Result<()> {
        let trail = s.trail();
        if let Some(&(own_arc, _)) = trail.first() {
            let mut re_entries = 0u32;
            for &(arc, range) in &trail[1..] {
                if arc == own_arc {
                    if range == e {
                        re_entries += 1;
                        if re_entries > s.lr_tolerance() {
                            if s.lr_tolerance() == 0 {
                                return Err(Error::new(
                                    ErrorKind::LeftRecursion,
                                    "rule re-entered at the same position",
                                ));
                            }
                            // Past the tolerance the branch is pruned.
                            return Ok(());
                        }
                    } else {
                        // The recursion consumed input; it is progressing.
                        break;
                    }
                }
            }
        }
        s.push(e.first, e.last)
    }
}
