//! Switch directory: the client-side list of switches and its lifecycle protocol.
//!
//! The directory only knows what it fetched or created locally. Remote calls go
//! through a [`Transport`]; every operation has a one-shot form (`update`,
//! `delete`) and a two-phase form (`begin_*` / `complete_*`) for callers that
//! drive the transport themselves.
//!
//! # Locking
//!
//! Between `begin_update`/`begin_delete` and the matching `complete_*` the
//! switch is locked: [`edit`](SwitchDirectory::edit), [`cancel`](SwitchDirectory::cancel)
//! and further `begin_*` calls fail with [`DirectoryError::Locked`]. Each ticket
//! carries the id of the lock it took; completing a ticket whose lock is no
//! longer held (the switch disappeared, or the directory was reset and the
//! switch re-locked) is a logged no-op.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{Condition, Registry, Switch, Transport, TransportError};

/// Errors from directory operations. Each is scoped to one switch and retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// A switch name must not be empty.
    #[error("switch name must not be empty")]
    EmptyName,
    /// A switch with this name is already present.
    #[error("switch \"{name}\" already exists")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },
    /// No switch with this name is present.
    #[error("no switch named \"{name}\"")]
    NotFound {
        /// The missing name.
        name: String,
    },
    /// The switch has an update or delete in flight.
    #[error("switch \"{name}\" is locked by a request in flight")]
    Locked {
        /// The locked switch.
        name: String,
    },
    /// The condition tree did not validate. Nothing was sent.
    #[error("switch \"{name}\" is invalid: {reason}")]
    Invalid {
        /// The switch name.
        name: String,
        /// Aggregated validation errors, one per line.
        reason: String,
    },
    /// The transport reported a failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A validated update waiting for its transport call.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a ticket keeps its switch locked until completed"]
pub struct UpdateTicket {
    name: String,
    wire: Value,
    lock: u64,
}

impl UpdateTicket {
    /// The switch being updated.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The condition to send.
    #[must_use]
    pub fn wire(&self) -> &Value {
        &self.wire
    }
}

/// A delete waiting for its transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a ticket keeps its switch locked until completed"]
pub struct DeleteTicket {
    name: String,
    lock: u64,
}

impl DeleteTicket {
    /// The switch being deleted.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered, paged, client-side list of switches.
#[derive(Debug)]
pub struct SwitchDirectory<'r> {
    registry: &'r Registry,
    switches: Vec<Switch>,
    offset: usize,
    exhausted: bool,
    /// Last lock id handed out. Survives `reset`.
    locks: u64,
}

impl<'r> SwitchDirectory<'r> {
    /// An empty directory loading conditions through `registry`.
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            switches: Vec::new(),
            offset: 0,
            exhausted: false,
            locks: 0,
        }
    }

    /// The registry conditions are loaded with.
    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Reading
    // ═══════════════════════════════════════════════════════════════════════════

    /// The switch named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Switch> {
        self.switches.iter().find(|s| s.name() == name)
    }

    /// Switches in display order (created first, then fetched).
    pub fn iter(&self) -> impl Iterator<Item = &Switch> {
        self.switches.iter()
    }

    /// Switch names in display order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.switches.iter().map(Switch::name).collect()
    }

    /// Number of switches held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.switches.len()
    }

    /// Returns `true` if no switches are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// Backend offset of the next page.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` once a fetch returned an empty page.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Forget everything and start paging from the beginning.
    pub fn reset(&mut self) {
        self.switches.clear();
        self.offset = 0;
        self.exhausted = false;
    }

    fn position(&self, name: &str) -> Result<usize, DirectoryError> {
        self.switches
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| DirectoryError::NotFound {
                name: name.to_owned(),
            })
    }

    fn unlocked_mut(&mut self, name: &str) -> Result<&mut Switch, DirectoryError> {
        let index = self.position(name)?;
        let switch = &mut self.switches[index];
        if switch.is_locked() {
            return Err(DirectoryError::Locked {
                name: name.to_owned(),
            });
        }
        Ok(switch)
    }

    /// The unlocked switch `name` and a fresh lock id for it.
    fn lock(&mut self, name: &str) -> Result<(&mut Switch, u64), DirectoryError> {
        self.locks += 1;
        let lock = self.locks;
        let switch = self.unlocked_mut(name)?;
        Ok((switch, lock))
    }

    /// The switch still locked by `lock`.
    fn locked_by(&self, name: &str, lock: u64) -> Option<usize> {
        self.switches
            .iter()
            .position(|s| s.name() == name && s.lock_id() == Some(lock))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Paging
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fetch the next page and append it. Returns how many switches were added.
    ///
    /// Records whose name is already present are skipped, but the present
    /// switch now counts towards the offset. An empty page marks the directory
    /// exhausted.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Transport`]; the directory is unchanged.
    pub fn fetch_page(
        &mut self,
        transport: &(impl Transport + ?Sized),
    ) -> Result<usize, DirectoryError> {
        let page = transport.list(self.offset).inspect_err(|err| {
            warn!(offset = self.offset, error = %err, "failed to list switches");
        })?;
        if page.is_empty() {
            debug!(offset = self.offset, "switch list exhausted");
            self.exhausted = true;
            return Ok(0);
        }

        self.offset += page.len();
        let mut added = 0;
        for record in &page {
            if let Some(present) = self.switches.iter_mut().find(|s| s.name() == record.name) {
                debug!(name = %record.name, "skipping switch already present");
                present.set_fetched();
                continue;
            }
            self.switches.push(Switch::from_record(self.registry, record));
            added += 1;
        }
        debug!(added, offset = self.offset, "fetched switch page");
        Ok(added)
    }

    /// Fetch pages until the backend runs out. Returns how many were added.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Transport`]; pages fetched before the failure are kept.
    pub fn fetch_all(
        &mut self,
        transport: &(impl Transport + ?Sized),
    ) -> Result<usize, DirectoryError> {
        let mut added = 0;
        while !self.exhausted {
            added += self.fetch_page(transport)?;
        }
        Ok(added)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Create
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create a switch remotely and prepend it locally.
    ///
    /// The condition defaults to always-off.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::EmptyName`] / [`DirectoryError::DuplicateName`]
    /// - [`DirectoryError::Invalid`]: nothing was sent
    /// - [`DirectoryError::Transport`]: nothing was added
    pub fn create(
        &mut self,
        transport: &(impl Transport + ?Sized),
        name: &str,
        condition: Option<Condition>,
    ) -> Result<&Switch, DirectoryError> {
        if name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }
        if self.get(name).is_some() {
            return Err(DirectoryError::DuplicateName {
                name: name.to_owned(),
            });
        }

        let mut switch = Switch::new(name, condition.unwrap_or_else(Condition::off));
        let wire = switch
            .prepare_save()
            .map_err(|reason| DirectoryError::Invalid {
                name: name.to_owned(),
                reason,
            })?;
        transport.save(name, &wire).inspect_err(|err| {
            warn!(name, error = %err, "failed to create switch");
        })?;

        switch.mark_saved(wire);
        self.switches.insert(0, switch);
        info!(name, "created switch");
        Ok(&self.switches[0])
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Edit / cancel
    // ═══════════════════════════════════════════════════════════════════════════

    /// Mutable access to an unlocked switch for editing.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] or [`DirectoryError::Locked`].
    pub fn edit(&mut self, name: &str) -> Result<&mut Switch, DirectoryError> {
        self.unlocked_mut(name)
    }

    /// Discard edits, restoring the tree from the clean snapshot. No transport.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] or [`DirectoryError::Locked`].
    pub fn cancel(&mut self, name: &str) -> Result<(), DirectoryError> {
        let registry = self.registry;
        self.unlocked_mut(name)?.revert(registry);
        debug!(name, "cancelled edits");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Update
    // ═══════════════════════════════════════════════════════════════════════════

    /// Validate and serialize a switch, locking it until the ticket completes.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::NotFound`] / [`DirectoryError::Locked`]
    /// - [`DirectoryError::Invalid`]: the switch stays unlocked and untouched
    pub fn begin_update(&mut self, name: &str) -> Result<UpdateTicket, DirectoryError> {
        let (switch, lock) = self.lock(name)?;
        let wire = switch
            .prepare_save()
            .map_err(|reason| DirectoryError::Invalid {
                name: name.to_owned(),
                reason,
            })?;
        switch.set_lock(Some(lock));
        Ok(UpdateTicket {
            name: name.to_owned(),
            wire,
            lock,
        })
    }

    /// Apply the transport outcome of an update.
    ///
    /// On success the clean snapshot becomes the sent condition and the dirty
    /// flag clears. On failure the editing state is untouched.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Transport`] carrying `result`'s failure.
    pub fn complete_update(
        &mut self,
        ticket: UpdateTicket,
        result: Result<(), TransportError>,
    ) -> Result<(), DirectoryError> {
        let UpdateTicket { name, wire, lock } = ticket;
        let Some(index) = self.locked_by(&name, lock) else {
            debug!(name = %name, lock, "update completed for a lock no longer held");
            return result.map_err(DirectoryError::from);
        };

        let switch = &mut self.switches[index];
        switch.set_lock(None);
        match result {
            Ok(()) => {
                switch.mark_saved(wire);
                info!(name = %name, "updated switch");
                Ok(())
            }
            Err(err) => {
                warn!(name = %name, error = %err, "failed to update switch");
                Err(err.into())
            }
        }
    }

    /// Validate, send and record an update.
    ///
    /// # Errors
    ///
    /// See [`begin_update`](Self::begin_update) and
    /// [`complete_update`](Self::complete_update).
    pub fn update(
        &mut self,
        transport: &(impl Transport + ?Sized),
        name: &str,
    ) -> Result<(), DirectoryError> {
        let ticket = self.begin_update(name)?;
        let result = transport.save(ticket.name(), ticket.wire());
        self.complete_update(ticket, result)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Delete
    // ═══════════════════════════════════════════════════════════════════════════

    /// Lock a switch for deletion.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] or [`DirectoryError::Locked`].
    pub fn begin_delete(&mut self, name: &str) -> Result<DeleteTicket, DirectoryError> {
        let (switch, lock) = self.lock(name)?;
        switch.set_lock(Some(lock));
        Ok(DeleteTicket {
            name: name.to_owned(),
            lock,
        })
    }

    /// Apply the transport outcome of a delete: remove on success, keep on failure.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Transport`] carrying `result`'s failure.
    pub fn complete_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<(), TransportError>,
    ) -> Result<(), DirectoryError> {
        let DeleteTicket { name, lock } = ticket;
        let Some(index) = self.locked_by(&name, lock) else {
            debug!(name = %name, lock, "delete completed for a lock no longer held");
            return result.map_err(DirectoryError::from);
        };

        match result {
            Ok(()) => {
                let removed = self.switches.remove(index);
                if removed.was_fetched() {
                    self.offset = self.offset.saturating_sub(1);
                }
                info!(name = %name, "deleted switch");
                Ok(())
            }
            Err(err) => {
                self.switches[index].set_lock(None);
                warn!(name = %name, error = %err, "failed to delete switch");
                Err(err.into())
            }
        }
    }

    /// Delete a switch remotely and locally.
    ///
    /// # Errors
    ///
    /// See [`begin_delete`](Self::begin_delete) and
    /// [`complete_delete`](Self::complete_delete).
    pub fn delete(
        &mut self,
        transport: &(impl Transport + ?Sized),
        name: &str,
    ) -> Result<(), DirectoryError> {
        let ticket = self.begin_delete(name)?;
        let result = transport.delete(ticket.name());
        self.complete_delete(ticket, result)
    }
}
