//! Per-branch trace variable contexts.
//!
//! Every state owns (at most) one context frame holding the variables
//! written while that state was current. Reading a variable walks the
//! state's ancestor chain and returns the nearest definition, so a branch
//! sees everything its ancestry wrote without any copying; writing
//! materializes a binding in the asking state's own frame, leaving siblings
//! and ancestors untouched. A write that would rebind a variable to the
//! value it already inherits is elided.
//!
//! Frames are created lazily: most states never write and cost nothing.

use crate::state::{StateId, StateStore};
use crate::variable::{ArrayContext, ArrayRef, Value};
use nparse_base::{Error, ErrorKind, Result, Symbol};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

type Frame = FxHashMap<Symbol, Value>;

/// Lazily materialized variable frames, parallel to the state store.
pub struct ContextStore {
    frames: Vec<Option<Frame>>,
    created: u64,
}

impl ContextStore {
    pub fn new() -> Self {
        ContextStore {
            frames: Vec::new(),
            created: 0,
        }
    }

    /// Number of frames materialized since the last clear; reported by the
    /// embedding surface as the context count.
    pub fn frames_created(&self) -> u64 {
        self.created
    }

    fn local(&self, state: StateId, key: Symbol) -> Option<&Value> {
        self.frames
            .get(state.index())
            .and_then(|f| f.as_ref())
            .and_then(|f| f.get(&key))
    }

    /// Reads `key` as visible from `state`: the nearest definition on the
    /// ancestor chain, or null.
    pub fn val(&self, states: &StateStore, state: StateId, key: Symbol) -> Value {
        let mut cursor = Some(state);
        while let Some(id) = cursor {
            if let Some(value) = self.local(id, key) {
                return value.clone();
            }
            cursor = states.ancestor_of(id);
        }
        Value::Null
    }

    /// Whether `key` has any visible definition from `state`.
    pub fn is_defined(&self, states: &StateStore, state: StateId, key: Symbol) -> bool {
        let mut cursor = Some(state);
        while let Some(id) = cursor {
            if self.local(id, key).is_some() {
                return true;
            }
            cursor = states.ancestor_of(id);
        }
        false
    }

    /// Writes `key` into `state`'s own frame. No-op writes (rebinding to
    /// the inherited value) are elided.
    pub fn set(&mut self, states: &StateStore, state: StateId, key: Symbol, value: Value) {
        if self.val(states, state, key) == value {
            return;
        }
        let index = state.index();
        if self.frames.len() <= index {
            self.frames.resize_with(index + 1, || None);
        }
        let slot = &mut self.frames[index];
        let frame = match slot {
            Some(frame) => frame,
            None => {
                self.created += 1;
                slot.insert(Frame::default())
            }
        };
        frame.insert(key, value);
    }

    /// Enumerates bindings visible from `state`, or only the locally
    /// written ones. Order is unspecified; callers needing stability sort
    /// by key.
    pub fn list(
        &self,
        states: &StateStore,
        state: StateId,
        local_only: bool,
    ) -> Vec<(Symbol, Value)> {
        if local_only {
            return self
                .frames
                .get(state.index())
                .and_then(|f| f.as_ref())
                .map(|f| f.iter().map(|(k, v)| (*k, v.clone())).collect())
                .unwrap_or_default();
        }
        let mut seen: FxHashMap<Symbol, Value> = FxHashMap::default();
        let mut cursor = Some(state);
        while let Some(id) = cursor {
            if let Some(frame) = self.frames.get(id.index()).and_then(|f| f.as_ref()) {
                for (k, v) in frame {
                    seen.entry(*k).or_insert_with(|| v.clone());
                }
            }
            cursor = states.ancestor_of(id);
        }
        seen.into_iter().collect()
    }

    /// Obtains the child array context stored under `key`, materializing an
    /// empty one when the variable is unset. Non-array values refuse.
    pub fn context(
        &mut self,
        states: &StateStore,
        state: StateId,
        key: Symbol,
    ) -> Result<ArrayRef> {
        match self.val(states, state, key) {
            Value::Array(a) => Ok(a),
            Value::Null => {
                let handle: ArrayRef = Rc::new(RefCell::new(ArrayContext::new()));
                self.set(states, state, key, Value::Array(handle.clone()));
                Ok(handle)
            }
            other => Err(Error::new(
                ErrorKind::BadCast,
                format!("variable holds {}, not an array", other.tag()),
            )),
        }
    }

    /// Drops frames belonging to evicted states.
    pub fn truncate(&mut self, live_states: usize) {
        if self.frames.len() > live_states {
            self.frames.truncate(live_states);
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.created = 0;
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}
