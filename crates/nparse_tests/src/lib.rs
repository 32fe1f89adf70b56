//! Shared fixtures for the nParse integration tests.
//!
//! The [`Runner::parse`] helper runs an acceptor network over an input
//! and renders the outcome as `"<iterations> | <labels> | <labels> ..."`
//! — one `|`-separated group of non-zero arc labels per found trace.
//! Most transition tests compare against these fingerprints, which pin
//! down the iteration count, the trace count and the taken arcs in one
//! string.

use nparse_base::KeyTable;
use nparse_core::acceptors::{self, End, Symbol, Test, Text, Unconditional};
use nparse_core::{AcceptorId, ArcKind, Label, Network, NodeId, State, Tracer, Traveller};
use std::cell::RefCell;
use std::rc::Rc;

/// Default state-pool size for test runs, in states.
pub const POOL_STATES: usize = 4096;

/// The common three-node skeleton with the stock acceptor set.
pub struct Fixture {
    pub net: Network,
    pub entry: NodeId,
    pub exit: NodeId,
    pub term: NodeId,
    pub pass: AcceptorId,
    pub end: AcceptorId,
    pub pound: AcceptorId,
    pub alpha: AcceptorId,
    pub omega: AcceptorId,
    pub num12345: AcceptorId,
    pub letters: AcceptorId,
    pub lowercase: AcceptorId,
    pub digits: AcceptorId,
    pub punct: AcceptorId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut net = Network::new();
        let entry = net.node();
        let exit = net.node();
        let term = net.node();
        let pass = net.acceptor(Unconditional);
        let end = net.acceptor(End);
        let pound = net.acceptor(Symbol::new('#'));
        let alpha = net.acceptor(Text::new("alpha"));
        let omega = net.acceptor(Text::new("omega"));
        let num12345 = net.acceptor(Text::new("12345"));
        let letters = net.acceptor(Test::new(char::is_alphabetic, acceptors::GREEDY));
        let lowercase = net.acceptor(Test::new(char::is_lowercase, acceptors::GREEDY));
        let digits = net.acceptor(Test::new(
            |ch: char| ch.is_ascii_digit(),
            acceptors::GREEDY,
        ));
        let punct = net.acceptor(Test::new(
            |ch: char| ch.is_ascii_punctuation(),
            acceptors::SINGLE,
        ));
        Fixture {
            net,
            entry,
            exit,
            term,
            pass,
            end,
            pound,
            alpha,
            omega,
            num12345,
            letters,
            lowercase,
            digits,
            punct,
        }
    }

    /// Shorthand for linking within the fixture network.
    pub fn link(&mut self, from: NodeId, to: NodeId, acceptor: AcceptorId, kind: ArcKind, tag: i32) {
        self.net.link(from, to, acceptor, kind, tag);
    }

    /// Freezes the network for parsing.
    pub fn seal(self) -> Runner {
        Runner::new(self.net, self.entry)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A sealed network ready to parse any number of inputs.
pub struct Runner {
    net: Rc<Network>,
    entry: NodeId,
    keys: Rc<RefCell<KeyTable>>,
}

impl Runner {
    pub fn new(net: Network, entry: NodeId) -> Self {
        Runner {
            net: Rc::new(net),
            entry,
            keys: Rc::new(RefCell::new(KeyTable::new())),
        }
    }

    pub fn with_keys(net: Network, entry: NodeId, keys: Rc<RefCell<KeyTable>>) -> Self {
        Runner {
            net: Rc::new(net),
            entry,
            keys,
        }
    }

    pub fn keys(&self) -> &Rc<RefCell<KeyTable>> {
        &self.keys
    }

    /// A fresh traveller over the sealed network.
    pub fn traveller(&self) -> Traveller {
        let mut tr = Traveller::new(
            Rc::clone(&self.net),
            Rc::clone(&self.keys),
            self.entry,
            Label::default(),
        );
        tr.set_capacity(POOL_STATES * State::ALLOC_SIZE)
            .expect("fresh traveller accepts a capacity");
        tr
    }

    /// Iteration count plus per-trace label sequences.
    pub fn parse(&self, input: &str) -> String {
        let mut tr = self.traveller();
        let iterations = tr.run_on(input).expect("test networks run to convergence");
        render_fingerprint(&tr, iterations)
    }

    /// Number of traces the network yields over an input.
    pub fn traces(&self, input: &str) -> usize {
        let mut tr = self.traveller();
        tr.run_on(input).expect("test networks run to convergence");
        tr.traced().len()
    }
}

/// Fingerprint rendering over an already-run traveller.
pub fn render_fingerprint(tr: &Traveller, iterations: u64) -> String {
    let mut out = iterations.to_string();
    let mut tracer = Tracer::new();
    while tracer.next(tr) {
        out.push_str(" |");
        while tracer.step(tr) {
            let label = tracer.label(tr);
            if label != 0 {
                out.push(' ');
                out.push_str(&label.to_string());
            }
        }
    }
    out
}

/// Appends a chain of `count` nodes linked by unconditional arcs with
/// labels `first_label`, `first_label + 1`, ...; returns the node ids.
pub fn chain(
    net: &mut Network,
    pass: AcceptorId,
    count: usize,
    first_label: i32,
) -> Vec<NodeId> {
    let nodes: Vec<NodeId> = (0..count).map(|_| net.node()).collect();
    for i in 1..count {
        net.link(
            nodes[i - 1],
            nodes[i],
            pass,
            ArcKind::Simple,
            first_label + (i as i32) - 1,
        );
    }
    nodes
}
