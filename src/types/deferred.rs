use std::collections::HashMap;

use super::context::Context;
use super::error::VoidSite;
use super::ty::Type;
use crate::ast::{FunCall, Span};

/// Stamped on a [`FunCall`] node when its typing has to wait for the callee's
/// declaration. Used to find the node again when writing results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeferredId(pub u32);

/// Set when the call's result must not be Void, e.g. an initializer or an
/// operand. Checked once the callee is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidGuard {
    pub site: VoidSite,
    pub span: Span,
}

impl VoidGuard {
    pub fn new(site: VoidSite, span: Span) -> Self {
        VoidGuard { site, span }
    }
}

/// A call seen before its callee was declared, with everything needed to type
/// it later.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub id: DeferredId,
    pub call: FunCall,
    pub context: Context,
    pub expected: Type,
    pub void_guard: Option<VoidGuard>,
}

/// Pending calls keyed by callee name.
#[derive(Debug, Default)]
pub struct DeferredCalls {
    pending: HashMap<String, Vec<PendingCall>>,
    next_id: u32,
}

impl DeferredCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `call` and return the id that was stamped on it.
    pub fn defer(
        &mut self,
        call: &mut FunCall,
        context: Context,
        expected: Type,
        void_guard: Option<VoidGuard>,
    ) -> DeferredId {
        let id = DeferredId(self.next_id);
        self.next_id += 1;
        call.deferred = Some(id);

        self.pending
            .entry(call.name.value.clone())
            .or_default()
            .push(PendingCall {
                id,
                call: call.clone(),
                context,
                expected,
                void_guard,
            });
        id
    }

    /// Remove and return every call waiting on `name`, leaving other callees
    /// untouched.
    pub fn take(&mut self, name: &str) -> Vec<PendingCall> {
        self.pending.remove(name).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Drain everything still pending, ordered by callee name and then by the
    /// order the calls were seen.
    pub fn drain_unresolved(&mut self) -> Vec<PendingCall> {
        let mut names: Vec<_> = self.pending.keys().cloned().collect();
        names.sort();
        names
            .into_iter()
            .flat_map(|name| self.take(&name))
            .collect()
    }
}
