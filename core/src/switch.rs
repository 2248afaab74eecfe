//! Switch: a named root condition with save/cancel/revert bookkeeping.

use serde_json::Value;

use crate::{Condition, ConditionBuilder, Registry, SwitchRecord};

/// A feature switch: name, root condition, and the last saved wire form.
///
/// The clean snapshot is what the backend last accepted (or what was fetched).
/// Any mutable access to the root marks the switch dirty; a successful save
/// clears the flag and takes a new snapshot; a revert reloads the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    name: String,
    condition: Condition,
    clean: Value,
    dirty: bool,
    lock: Option<u64>,
    fetched: bool,
}

impl Switch {
    /// A switch whose clean snapshot is `condition`'s current wire form.
    #[must_use]
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        let clean = condition.to_wire();
        Self {
            name: name.into(),
            condition,
            clean,
            dirty: false,
            lock: None,
            fetched: false,
        }
    }

    /// Load a fetched record.
    #[must_use]
    pub fn from_record(registry: &Registry, record: &SwitchRecord) -> Self {
        Self {
            name: record.name.clone(),
            condition: registry.load(&record.condition),
            clean: record.condition.clone(),
            dirty: false,
            lock: None,
            fetched: true,
        }
    }

    /// The switch name. Immutable once created.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Mutable access to the root condition. Marks the switch dirty.
    pub fn condition_mut(&mut self) -> &mut Condition {
        self.dirty = true;
        &mut self.condition
    }

    /// Replace the root condition. Marks the switch dirty.
    pub fn replace_condition(&mut self, condition: Condition) {
        self.dirty = true;
        self.condition = condition;
    }

    /// Choose a new kind for the root (see [`ConditionBuilder::select_kind`]).
    pub fn select_kind(&mut self, builder: &ConditionBuilder<'_>, kind: &str) -> &mut Condition {
        let fresh = builder.select_kind(kind, Some(&mut self.condition));
        self.replace_condition(fresh);
        &mut self.condition
    }

    /// Wire form at the last successful save or fetch.
    #[must_use]
    pub fn clean_snapshot(&self) -> &Value {
        &self.clean
    }

    /// Returns `true` if the root has been touched since the last save or revert.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` while an update or delete is in flight.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Id of the request holding the lock.
    pub(crate) fn lock_id(&self) -> Option<u64> {
        self.lock
    }

    pub(crate) fn set_lock(&mut self, lock: Option<u64>) {
        self.lock = lock;
    }

    /// Whether this switch counts towards the directory's paging offset.
    pub(crate) fn was_fetched(&self) -> bool {
        self.fetched
    }

    /// Count this switch towards the paging offset: the backend listed it.
    pub(crate) fn set_fetched(&mut self) {
        self.fetched = true;
    }

    /// Discard edits: reload the root from the clean snapshot.
    pub fn revert(&mut self, registry: &Registry) {
        self.condition = registry.load(&self.clean);
        self.dirty = false;
    }

    /// Validate the tree and return its wire form.
    ///
    /// # Errors
    ///
    /// Returns the aggregated validation error. The tree is left as is.
    pub fn prepare_save(&mut self) -> Result<Value, String> {
        if self.condition.validate() {
            Ok(self.condition.to_wire())
        } else {
            Err(self.condition.error().unwrap_or_default().to_owned())
        }
    }

    /// Record that `wire` was accepted by the backend.
    pub fn mark_saved(&mut self, wire: Value) {
        self.clean = wire;
        self.dirty = false;
    }

    /// The switch as a wire record (current tree, not the snapshot).
    #[must_use]
    pub fn to_record(&self) -> SwitchRecord {
        SwitchRecord::new(self.name.clone(), self.condition.to_wire())
    }
}
