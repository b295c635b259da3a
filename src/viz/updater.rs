//! Layout negotiation: a queue of (patch, continuation) pairs applied against a
//! live surface until no continuation asks for more.

use super::surface::ChartSurface;
use crate::error::RenderError;
use serde_json::{Map, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Upper bound on apply rounds for one `process` call.
pub const MAX_ROUNDS: usize = 16;

/// Runs after a batch has been applied; may measure the surface and ask for more.
pub type Continuation = Box<dyn FnOnce(&dyn ChartSurface) -> Vec<LayoutUpdate>>;

pub struct LayoutUpdate {
    pub patch: Value,
    pub then: Option<Continuation>,
}

impl LayoutUpdate {
    pub fn patch(patch: Value) -> Self {
        Self { patch, then: None }
    }

    pub fn with_continuation(patch: Value, then: Continuation) -> Self {
        Self {
            patch,
            then: Some(then),
        }
    }
}

impl std::fmt::Debug for LayoutUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutUpdate")
            .field("patch", &self.patch)
            .field("then", &self.then.is_some())
            .finish()
    }
}

/// Merge `patch` into `target`: objects recursively, everything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(t), Value::Object(p)) => {
            for (key, value) in p {
                match t.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_patch(existing, value)
                    }
                    _ => {
                        t.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (t, p) => *t = p.clone(),
    }
}

/// Shared liveness state of one chart instance. A pass holds a [`RenderGuard`]
/// taken when it started and stops as soon as it is stale.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    destroyed: Rc<Cell<bool>>,
    revision: Rc<Cell<u64>>,
}

impl RenderState {
    /// Start a new pass; earlier guards become stale.
    pub fn begin(&self) -> RenderGuard {
        self.revision.set(self.revision.get() + 1);
        self.guard()
    }

    /// Guard for the current pass without superseding it.
    pub fn guard(&self) -> RenderGuard {
        RenderGuard {
            state: self.clone(),
            revision: self.revision.get(),
        }
    }

    pub fn destroy(&self) {
        self.destroyed.set(true);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

#[derive(Debug, Clone)]
pub struct RenderGuard {
    state: RenderState,
    revision: u64,
}

impl RenderGuard {
    pub fn is_current(&self) -> bool {
        !self.state.is_destroyed() && self.state.revision.get() == self.revision
    }
}

#[derive(Debug, Default)]
pub struct LayoutUpdater {
    queue: Vec<LayoutUpdate>,
}

impl LayoutUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue updates. Patches that are not JSON objects are dropped.
    pub fn append(&mut self, updates: impl IntoIterator<Item = LayoutUpdate>) -> &mut Self {
        for update in updates {
            if update.patch.is_object() {
                self.queue.push(update);
            } else {
                log::debug!("ignoring non-object layout patch {}", update.patch);
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Apply queued patches in merged batches, one relayout per batch, then run the
    /// batch's continuations. Returns early, without error, once `guard` is stale.
    pub fn process<S: ChartSurface>(
        &mut self,
        surface: &mut S,
        guard: &RenderGuard,
    ) -> Result<(), RenderError> {
        let mut rounds = 0;
        while !self.queue.is_empty() {
            if !guard.is_current() {
                log::debug!("dropping {} stale layout updates", self.queue.len());
                self.queue.clear();
                return Ok(());
            }
            rounds += 1;
            if rounds > MAX_ROUNDS {
                self.queue.clear();
                return Err(RenderError::Unsettled(MAX_ROUNDS));
            }

            let mut merged = Value::Object(Map::new());
            let mut continuations = Vec::new();
            for update in self.queue.drain(..) {
                merge_patch(&mut merged, &update.patch);
                continuations.extend(update.then);
            }
            if let Err(e) = surface.relayout(&merged) {
                self.queue.clear();
                return Err(e);
            }

            for then in continuations {
                if !guard.is_current() {
                    break;
                }
                let more = then(&*surface);
                self.append(more);
            }
        }
        Ok(())
    }
}
