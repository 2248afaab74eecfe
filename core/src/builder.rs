//! Condition slots and explicit kind selection.
//!
//! A [`ConditionSlot`] is a place in the tree that may hold a node: the single
//! child of `not` and `namespaced`, or the root of a [`Switch`](crate::Switch).
//! Its state only moves through explicit actions:
//!
//! ```text
//!              select                 edit
//! Unselected ─────────► SelectedUntouched ─────► SelectedEdited
//!     ▲                        │                        │
//!     └──────── clear ─────────┴──────── clear ─────────┘
//! ```
//!
//! Loading from wire data yields `SelectedUntouched`. Validation and save
//! failures never change slot state.

use tracing::warn;

use crate::{Condition, Kind, Node, Registry};

/// Where a [`ConditionSlot`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// No kind chosen yet.
    #[default]
    Unselected,
    /// A node is present and has not been edited.
    SelectedUntouched,
    /// A node is present and the operator has edited it.
    SelectedEdited,
}

/// A place that may hold one condition node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionSlot {
    node: Option<Box<Condition>>,
    state: SlotState,
}

impl ConditionSlot {
    /// An unselected slot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A slot holding a node loaded from wire data.
    #[must_use]
    pub fn loaded(condition: Condition) -> Self {
        Self {
            node: Some(Box::new(condition)),
            state: SlotState::SelectedUntouched,
        }
    }

    /// Choose a kind for this slot, replacing whatever it held.
    ///
    /// The previous node (if any) is handed to the builder, so a switch to
    /// `raw` carries its JSON across.
    pub fn select(&mut self, builder: &ConditionBuilder<'_>, kind: &str) -> &mut Condition {
        let previous = self.node.as_deref_mut();
        let fresh = builder.select_kind(kind, previous);
        self.state = SlotState::SelectedUntouched;
        self.node.insert(Box::new(fresh))
    }

    /// Drop the held node, returning it.
    pub fn clear(&mut self) -> Option<Condition> {
        self.state = SlotState::Unselected;
        self.node.take().map(|boxed| *boxed)
    }

    /// Edit the held node. Marks the slot edited; returns `None` if unselected.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Condition) -> R) -> Option<R> {
        let node = self.node.as_deref_mut()?;
        self.state = SlotState::SelectedEdited;
        Some(f(node))
    }

    /// The held node, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.node.as_deref()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Returns `true` if a node is present.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.node.is_some()
    }

    /// Mutable access without touching the state (validation only).
    pub(crate) fn get_mut(&mut self) -> Option<&mut Condition> {
        self.node.as_deref_mut()
    }
}

impl From<Condition> for ConditionSlot {
    fn from(condition: Condition) -> Self {
        Self::loaded(condition)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Creates nodes for operator kind selections.
///
/// The only place a node is ever converted into another: choosing `raw` over a
/// node that currently validates seeds the raw payload with that node's JSON.
#[derive(Debug, Clone, Copy)]
pub struct ConditionBuilder<'r> {
    registry: &'r Registry,
}

impl<'r> ConditionBuilder<'r> {
    /// A builder over `registry`.
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// The registry kinds are resolved against.
    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// A fresh node for `kind` (an internal name or a wire alias).
    ///
    /// Unknown kinds fall back to a fresh `raw`. When the result is `raw` and
    /// `previous` validates, the raw payload becomes `previous`'s wire form.
    #[must_use]
    pub fn select_kind(&self, kind: &str, previous: Option<&mut Condition>) -> Condition {
        let resolved = self.registry.resolve_kind(kind);
        let mut fresh = match self.registry.instantiate(resolved) {
            Ok(condition) => condition,
            Err(err) => {
                warn!(kind, error = %err, "falling back to raw condition");
                Kind::Raw.fresh()
            }
        };
        if let (Node::Raw(raw), Some(previous)) = (fresh.node_mut(), previous) {
            if previous.validate() {
                raw.set_data(previous.to_wire());
            }
        }
        fresh
    }
}
