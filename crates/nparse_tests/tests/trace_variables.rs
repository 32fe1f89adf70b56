//! Trace variables across branching parses: copy-on-write isolation,
//! inheritance, entry actions and denial, regex capture seeding.

use nparse_base::ErrorKind;
use nparse_core::acceptors::{End, RegEx, Unconditional};
use nparse_core::ArcKind::Simple;
use nparse_core::{
    ActionId, BinaryOp, Expr, Label, Network, State, Tracer, Traveller, Value,
};
use nparse_base::KeyTable;
use std::cell::RefCell;
use std::rc::Rc;

fn action(net: &mut Network, expr: Expr) -> ActionId {
    net.action(nparse_core::Action::new(expr))
}

fn traveller(net: Network, entry: nparse_core::NodeId, keys: Rc<RefCell<KeyTable>>) -> Traveller {
    let mut tr = Traveller::new(Rc::new(net), keys, entry, Label::default());
    tr.set_capacity(1024 * State::ALLOC_SIZE).unwrap();
    tr
}

/// A writer in one branch must not leak into its sibling, and both
/// branches inherit the ancestor's binding.
#[test]
fn branch_writes_stay_isolated() {
    let keys = Rc::new(RefCell::new(KeyTable::new()));
    let x = keys.borrow_mut().intern("x");
    let y = keys.borrow_mut().intern("y");

    let mut net = Network::new();
    let entry = net.node();
    let n1 = net.node();
    let exit = net.node();
    let term = net.node();
    let pass = net.acceptor(Unconditional);
    let end = net.acceptor(End);

    let set_x1 = action(&mut net, Expr::assign(x, Expr::integer(1)));
    let set_x2 = action(&mut net, Expr::assign(x, Expr::integer(2)));
    let copy_x = action(&mut net, Expr::assign(y, Expr::var(x)));

    let a0 = net.link(entry, n1, pass, Simple, 1);
    net.set_label_action(a0, set_x1);
    let a1 = net.link(n1, exit, pass, Simple, 2);
    net.set_label_action(a1, set_x2);
    let a2 = net.link(n1, exit, pass, Simple, 3);
    net.set_label_action(a2, copy_x);
    net.link(exit, term, end, Simple, 4);

    let mut tr = traveller(net, entry, keys);
    tr.run_on("").unwrap();
    assert_eq!(tr.traced().len(), 2);

    // Collect (x, y) per trace keyed by the branch label.
    let mut outcomes = Vec::new();
    let mut tracer = Tracer::new();
    while tracer.next(&tr) {
        let terminal = tracer.current(&tr).unwrap();
        outcomes.push((tr.val(terminal, x), tr.val(terminal, y)));
    }
    outcomes.sort_by_key(|(x, _)| x.as_integer().unwrap());
    assert_eq!(
        outcomes,
        vec![
            (Value::Integer(1), Value::Integer(1)), // reader branch: sees x=1
            (Value::Integer(2), Value::Null),       // writer branch: shadows x
        ]
    );
}

/// Variables seeded before the run are visible to every branch.
#[test]
fn seeded_variables_are_inherited() {
    let keys = Rc::new(RefCell::new(KeyTable::new()));
    let limit = keys.borrow_mut().intern("limit");

    let mut net = Network::new();
    let entry = net.node();
    let term = net.node();
    let end = net.acceptor(End);
    net.link(entry, term, end, Simple, 1);

    let mut tr = traveller(net, entry, keys);
    tr.init("").unwrap();
    tr.seed_var(limit, Value::Integer(42)).unwrap();
    tr.run().unwrap();

    let terminal = tr.traced()[0];
    assert_eq!(tr.val(terminal, limit), Value::Integer(42));
}

/// An entry action evaluating to false denies the branch.
#[test]
fn false_entry_action_denies_the_branch() {
    let keys = Rc::new(RefCell::new(KeyTable::new()));

    let mut net = Network::new();
    let entry = net.node();
    let exit = net.node();
    let term = net.node();
    let pass = net.acceptor(Unconditional);
    let end = net.acceptor(End);

    let deny = action(
        &mut net,
        Expr::binary(BinaryOp::Lt, Expr::integer(5), Expr::integer(3)),
    );
    let blocked = net.link(entry, exit, pass, Simple, 1);
    net.set_label_action(blocked, deny);
    net.link(entry, exit, pass, Simple, 2);
    net.link(exit, term, end, Simple, 3);

    let mut tr = traveller(net, entry, keys);
    tr.run_on("").unwrap();

    // Only the unguarded alternative survives.
    assert_eq!(tr.traced().len(), 1);
    let mut tracer = Tracer::new();
    tracer.next(&tr);
    let mut labels = Vec::new();
    while tracer.step(&tr) {
        if tracer.label(&tr) != 0 {
            labels.push(tracer.label(&tr));
        }
    }
    assert_eq!(labels, vec![2, 3]);
}

/// A failing action (here: division by zero) aborts the whole parse.
#[test]
fn erroring_entry_action_aborts_the_parse() {
    let keys = Rc::new(RefCell::new(KeyTable::new()));

    let mut net = Network::new();
    let entry = net.node();
    let term = net.node();
    let pass = net.acceptor(Unconditional);

    let broken = action(
        &mut net,
        Expr::binary(BinaryOp::Div, Expr::integer(1), Expr::integer(0)),
    );
    let arc = net.link(entry, term, pass, Simple, 1);
    net.set_label_action(arc, broken);

    let mut tr = traveller(net, entry, keys);
    let err = tr.run_on("").unwrap_err();
    assert_eq!(err.kind, ErrorKind::DivByZero);
}

/// Named regex captures become trace variables of the spawned state.
#[test]
fn regex_captures_seed_variables() {
    let keys = Rc::new(RefCell::new(KeyTable::new()));

    let mut net = Network::new();
    let entry = net.node();
    let exit = net.node();
    let term = net.node();
    let assign = net.acceptor(RegEx::new(r"(?P<name>[a-z]+)=(?P<value>[0-9]+)", &keys).unwrap());
    let end = net.acceptor(End);
    net.link(entry, exit, assign, Simple, 1);
    net.link(exit, term, end, Simple, 2);

    let name = keys.borrow_mut().intern("name");
    let value = keys.borrow_mut().intern("value");

    let mut tr = traveller(net, entry, Rc::clone(&keys));
    tr.run_on("count=17").unwrap();
    assert_eq!(tr.traced().len(), 1);

    let terminal = tr.traced()[0];
    assert_eq!(tr.val(terminal, name), Value::String("count".into()));
    assert_eq!(tr.val(terminal, value), Value::String("17".into()));
}

/// Strict mode turns an undefined read in an entry action into an error.
#[test]
fn strict_mode_reports_undefined_reads() {
    let keys = Rc::new(RefCell::new(KeyTable::new()));
    let ghost = keys.borrow_mut().intern("ghost");

    let mut net = Network::new();
    let entry = net.node();
    let term = net.node();
    let pass = net.acceptor(Unconditional);
    let read = action(&mut net, Expr::var(ghost));
    let arc = net.link(entry, term, pass, Simple, 1);
    net.set_label_action(arc, read);

    let mut tr = traveller(net, entry, keys);
    tr.set_strict_vars(true);
    let err = tr.run_on("").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
}

/// Actions run per branch: an accumulator incremented along a chain sees
/// one increment per traversed arc.
#[test]
fn actions_accumulate_along_a_trace() {
    let keys = Rc::new(RefCell::new(KeyTable::new()));
    let n = keys.borrow_mut().intern("n");

    let mut net = Network::new();
    let entry = net.node();
    let mid = net.node();
    let term = net.node();
    let pass = net.acceptor(Unconditional);
    let end = net.acceptor(End);

    let bump = Expr::assign(
        n,
        Expr::binary(BinaryOp::Add, Expr::var(n), Expr::integer(1)),
    );
    let bump1 = action(&mut net, bump.clone());
    let bump2 = action(&mut net, bump);

    let a0 = net.link(entry, mid, pass, Simple, 1);
    net.set_label_action(a0, bump1);
    net.link(mid, term, end, Simple, 3);
    let a2 = net.link(entry, mid, pass, Simple, 4);
    net.set_label_action(a2, bump2);

    let mut tr = traveller(net, entry, keys);
    tr.init("").unwrap();
    tr.seed_var(n, Value::Integer(0)).unwrap();
    tr.run().unwrap();

    let mut tracer = Tracer::new();
    while tracer.next(&tr) {
        let terminal = tracer.current(&tr).unwrap();
        assert_eq!(tr.val(terminal, n), Value::Integer(1));
    }
}
