//! Composite nodes: `multiple` (and/or), `not` and `namespaced`.
//!
//! Composites exclusively own their children. Validation visits **every**
//! child, never stopping at the first failure, so the operator sees all
//! problems at once.

use serde_json::{json, Value};

use crate::{Condition, ConditionBuilder, ConditionSlot};

/// Validate an optional child, mapping an empty slot to `missing`.
fn check_slot(slot: &mut ConditionSlot, missing: impl FnOnce() -> String) -> Result<(), String> {
    let Some(child) = slot.get_mut() else {
        return Err(missing());
    };
    if child.validate() {
        Ok(())
    } else {
        Err(child.error().unwrap_or_default().to_owned())
    }
}

fn slot_wire(slot: &ConditionSlot) -> Value {
    slot.condition().map_or(Value::Null, Condition::to_wire)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Multiple
// ═══════════════════════════════════════════════════════════════════════════════

/// How a [`Multiple`] combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    /// All children must hold (wire `"and"`).
    #[default]
    And,
    /// Any child must hold (wire `"or"`).
    Or,
}

impl Combinator {
    /// The wire `condition_type` for this combinator.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

/// Stable identity of a child within one [`Multiple`].
///
/// Ids are handed out monotonically and never reused, so they stay valid
/// while siblings are added and removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildId(u64);

/// One child of a [`Multiple`].
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    id: ChildId,
    condition: Condition,
}

impl Child {
    /// This child's stable id.
    #[must_use]
    pub fn id(&self) -> ChildId {
        self.id
    }

    /// The child condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Mutable access to the child condition.
    pub fn condition_mut(&mut self) -> &mut Condition {
        &mut self.condition
    }
}

/// All (`and`) or any (`or`) of an ordered list of children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Multiple {
    combinator: Combinator,
    children: Vec<Child>,
    next_id: u64,
}

impl Multiple {
    /// An empty list with the given combinator.
    #[must_use]
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            ..Self::default()
        }
    }

    /// Builder-style: append a child.
    #[must_use]
    pub fn with(mut self, condition: impl Into<Condition>) -> Self {
        self.push(condition);
        self
    }

    /// The combinator.
    #[must_use]
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Change between `and` and `or`.
    pub fn set_combinator(&mut self, combinator: Combinator) {
        self.combinator = combinator;
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a child, returning its id.
    pub fn push(&mut self, condition: impl Into<Condition>) -> ChildId {
        let id = ChildId(self.next_id);
        self.next_id += 1;
        self.children.push(Child {
            id,
            condition: condition.into(),
        });
        id
    }

    /// Append a fresh child of `kind` (the "Add condition" action).
    pub fn add(&mut self, builder: &ConditionBuilder<'_>, kind: &str) -> ChildId {
        self.push(builder.select_kind(kind, None))
    }

    /// Remove the child with `id`, returning it.
    pub fn remove(&mut self, id: ChildId) -> Option<Condition> {
        let index = self.children.iter().position(|c| c.id == id)?;
        Some(self.children.remove(index).condition)
    }

    /// The child with `id`.
    #[must_use]
    pub fn child(&self, id: ChildId) -> Option<&Condition> {
        self.children
            .iter()
            .find(|c| c.id == id)
            .map(|c| &c.condition)
    }

    /// Mutable access to the child with `id`.
    pub fn child_mut(&mut self, id: ChildId) -> Option<&mut Condition> {
        self.children
            .iter_mut()
            .find(|c| c.id == id)
            .map(|c| &mut c.condition)
    }

    /// Replace the child with `id` by a fresh node of `kind`.
    pub fn select_child(
        &mut self,
        builder: &ConditionBuilder<'_>,
        id: ChildId,
        kind: &str,
    ) -> Option<&mut Condition> {
        let child = self.children.iter_mut().find(|c| c.id == id)?;
        child.condition = builder.select_kind(kind, Some(&mut child.condition));
        Some(&mut child.condition)
    }

    pub(crate) fn check(&mut self) -> Result<(), String> {
        if self.children.is_empty() {
            return Err("No conditions selected for and/or".to_owned());
        }
        let errors: Vec<String> = self
            .children
            .iter_mut()
            .filter_map(|child| {
                if child.condition.validate() {
                    None
                } else {
                    Some(child.condition.error().unwrap_or_default().to_owned())
                }
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    /// Wire form: `{"condition_type": "and"|"or", "conditions": [...]}`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let conditions: Vec<Value> = self.children.iter().map(|c| c.condition.to_wire()).collect();
        json!({
            "condition_type": self.combinator.wire_name(),
            "conditions": conditions,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Not
// ═══════════════════════════════════════════════════════════════════════════════

/// Negation of exactly one child.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Not {
    condition: ConditionSlot,
}

impl Not {
    /// Negate `condition`.
    #[must_use]
    pub fn new(condition: impl Into<Condition>) -> Self {
        Self {
            condition: ConditionSlot::loaded(condition.into()),
        }
    }

    pub(crate) fn from_slot(condition: ConditionSlot) -> Self {
        Self { condition }
    }

    /// The negated child slot.
    #[must_use]
    pub fn slot(&self) -> &ConditionSlot {
        &self.condition
    }

    /// Mutable access to the child slot.
    pub fn slot_mut(&mut self) -> &mut ConditionSlot {
        &mut self.condition
    }

    pub(crate) fn check(&mut self) -> Result<(), String> {
        check_slot(&mut self.condition, || {
            "No condition selected on \"NOT\"".to_owned()
        })
    }

    /// Wire form: `{"condition_type": "not", "condition": ...}`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        json!({
            "condition_type": "not",
            "condition": slot_wire(&self.condition),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Namespaced
// ═══════════════════════════════════════════════════════════════════════════════

/// One child applied to the context field named `attr`.
///
/// `fallback` is the result when the field is absent; it is carried through
/// untouched and never validated against the child.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Namespaced {
    attr: String,
    fallback: bool,
    condition: ConditionSlot,
}

impl Namespaced {
    /// Apply `condition` to field `attr`.
    #[must_use]
    pub fn new(attr: impl Into<String>, condition: impl Into<Condition>) -> Self {
        Self {
            attr: attr.into(),
            fallback: false,
            condition: ConditionSlot::loaded(condition.into()),
        }
    }

    pub(crate) fn from_parts(attr: String, fallback: bool, condition: ConditionSlot) -> Self {
        Self {
            attr,
            fallback,
            condition,
        }
    }

    /// Builder-style: set the fallback.
    #[must_use]
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// The field name.
    #[must_use]
    pub fn attr(&self) -> &str {
        &self.attr
    }

    /// Set the field name.
    pub fn set_attr(&mut self, attr: impl Into<String>) {
        self.attr = attr.into();
    }

    /// Result when the field is absent.
    #[must_use]
    pub fn fallback(&self) -> bool {
        self.fallback
    }

    /// Set the fallback.
    pub fn set_fallback(&mut self, fallback: bool) {
        self.fallback = fallback;
    }

    /// The inner condition slot.
    #[must_use]
    pub fn slot(&self) -> &ConditionSlot {
        &self.condition
    }

    /// Mutable access to the inner condition slot.
    pub fn slot_mut(&mut self) -> &mut ConditionSlot {
        &mut self.condition
    }

    pub(crate) fn check(&mut self) -> Result<(), String> {
        if self.attr.is_empty() {
            return Err("No field specified for namespaced condition".to_owned());
        }
        let attr = &self.attr;
        check_slot(&mut self.condition, || {
            format!("No condition selected for namespacing on field {attr}")
        })
    }

    /// Wire form: `{"condition_type": "namespaced", "attr", "condition", "fallback"}`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        json!({
            "condition_type": "namespaced",
            "attr": self.attr,
            "condition": slot_wire(&self.condition),
            "fallback": self.fallback,
        })
    }
}
