//! Scheduling observers.
//!
//! Every scheduling decision the traveller makes is dispatched to an
//! observer: states entering and leaving the queue, entry denials,
//! completed traces, blocking cascades, split returns, deferrals and pool
//! evictions. The default observer ignores everything; the
//! [`DeadlockObserver`] keeps the deepest-reached states so a failed parse
//! can report "the parser got up to here" with grammar rule paths.
//!
//! The per-iteration [`status`](Observer::status) submission returns a
//! `Result`, which is the sanctioned place for embeddings to enforce
//! iteration or memory budgets: returning an error aborts the parse.

use crate::model::{Arc, ArcId, Network, Pos};
use crate::state::{StateId, StateStore};
use nparse_base::Result;

/// A scheduling event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// State entered the queue.
    Push,
    /// State left the queue for expansion.
    Pull,
    /// Entry action evaluated to false; state blocked.
    Deny,
    /// Entry completed.
    Entry,
    /// State recorded as a surface trace.
    Trace,
    /// Caller state blocked by a negative assertion.
    Block,
    /// Split return state created.
    Split,
    /// Entangled state deferred.
    Defer,
    /// State memory returned to the pool.
    Evict,
}

/// Read access to the engine for observers.
pub struct EngineView<'a> {
    pub states: &'a StateStore,
    pub net: &'a Network,
    pub entry_arc: &'a Arc,
}

impl<'a> EngineView<'a> {
    /// Resolves an arc, including the synthetic entry arc.
    pub fn arc(&self, id: ArcId) -> &Arc {
        if id == ArcId::ENTRY {
            self.entry_arc
        } else {
            self.net.get_arc(id)
        }
    }
}

/// Per-iteration traveller status.
#[derive(Debug, Clone, Copy)]
pub struct StatusReport {
    pub iteration: u64,
    pub queue_len: usize,
    pub pool_usage: usize,
    pub trace_count: usize,
    pub deferred_count: usize,
}

/// Receives scheduling events and status submissions.
pub trait Observer {
    fn notify(&mut self, event: Event, state: StateId, view: &EngineView<'_>);

    /// Called once per inner-loop iteration; an error aborts the parse.
    fn status(&mut self, report: &StatusReport) -> Result<()> {
        let _ = report;
        Ok(())
    }

    fn reset(&mut self) {}
}

/// Observer that ignores everything.
pub struct NullObserver;

impl Observer for NullObserver {
    fn notify(&mut self, _event: Event, _state: StateId, _view: &EngineView<'_>) {}
}

/// A deepest-reach record: where the parser got to and through which
/// grammar rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deadlock {
    /// Input offset of the deepest accepted position.
    pub offset: Pos,
    /// Rule path rendered as `name:label > name:label > ...`.
    pub path: String,
}

struct Item {
    /// Live state, or None once the path has been snapshotted.
    state: Option<StateId>,
    offset: Pos,
    path: String,
}

/// Tracks the N deepest-reached states for failure diagnostics.
///
/// States are recorded as they are pushed, keyed by the end of their
/// accepted range; when the tracked set outgrows its bound the shallowest
/// entry is dropped. A state evicted from the pool has its rule path
/// snapshotted while its memory is still valid.
pub struct DeadlockObserver {
    max_count: usize,
    max_depth: usize,
    items: Vec<Item>,
}

impl DeadlockObserver {
    pub fn new() -> Self {
        DeadlockObserver {
            max_count: 1,
            max_depth: 16,
            items: Vec::new(),
        }
    }

    /// Bounds the number of tracked states.
    pub fn set_max_trace_count(&mut self, count: usize) {
        self.max_count = count.max(1);
    }

    /// Bounds the rendered rule-path depth.
    pub fn set_max_trace_depth(&mut self, depth: usize) {
        self.max_depth = depth.max(1);
    }

    fn render(&self, state: StateId, view: &EngineView<'_>) -> (Pos, String) {
        let mut segments: Vec<String> = Vec::new();
        let mut first_named = None;
        let mut cursor = Some(state);
        while let Some(id) = cursor {
            if segments.len() >= self.max_depth {
                break;
            }
            let s = view.states.get(id);
            let node = view.net.get_node(s.bunch_node);
            if let Some(name) = &node.name {
                let label = view.arc(s.arc).label.tag;
                segments.push(format!("{}:{}", name, label));
                if first_named.is_none() {
                    first_named = Some(id);
                }
            }
            cursor = view.states.path_ancestor(id);
        }
        segments.reverse();
        let anchor = first_named.unwrap_or(state);
        (view.states.get(anchor).range.last, segments.join(" > "))
    }

    /// The tracked deepest positions, deepest first.
    pub fn analyze(&self, view: &EngineView<'_>) -> Vec<Deadlock> {
        let mut out: Vec<Deadlock> = self
            .items
            .iter()
            .map(|item| match item.state {
                Some(state) => {
                    let (offset, path) = self.render(state, view);
                    Deadlock { offset, path }
                }
                None => Deadlock {
                    offset: item.offset,
                    path: item.path.clone(),
                },
            })
            .collect();
        out.sort_by(|a, b| b.offset.cmp(&a.offset));
        out
    }
}

impl Default for DeadlockObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for DeadlockObserver {
    fn notify(&mut self, event: Event, state: StateId, view: &EngineView<'_>) {
        match event {
            Event::Push => {
                self.items.push(Item {
                    state: Some(state),
                    offset: view.states.get(state).range.last,
                    path: String::new(),
                });
                if self.items.len() > self.max_count {
                    // Drop the shallowest entry to keep the bound.
                    if let Some((shallowest, _)) = self
                        .items
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, item)| item.offset)
                    {
                        self.items.swap_remove(shallowest);
                    }
                }
            }
            Event::Evict => {
                if let Some(index) = self
                    .items
                    .iter()
                    .position(|item| item.state == Some(state))
                {
                    let (offset, path) = self.render(state, view);
                    let item = &mut self.items[index];
                    item.state = None;
                    item.offset = offset;
                    item.path = path;
                }
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.items.clear();
    }
}
