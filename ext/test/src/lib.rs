//! flippy-test: In-memory backend and conformance fixtures
//!
//! Provides a [`MemoryBackend`] implementing [`Transport`] so directory flows
//! can be exercised without a server, and a YAML fixture runner for the
//! condition codec.
//!
//! # Example
//!
//! ```
//! use flippy_test::prelude::*;
//! use serde_json::json;
//!
//! let backend = MemoryBackend::new()
//!     .with_record("beta", json!({ "condition_type": "true" }));
//!
//! let mut directory = SwitchDirectory::new(Registry::standard());
//! directory.fetch_all(&backend).unwrap();
//! assert_eq!(directory.names(), vec!["beta"]);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;

use flippy::{SwitchRecord, Transport, TransportError};
use serde_json::Value;
use tracing::trace;

pub mod fixture;

/// Page size used by [`MemoryBackend::new`].
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A request the backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `list(offset)`.
    List {
        /// Requested offset.
        offset: usize,
    },
    /// `save(name, ..)`.
    Save {
        /// Switch name.
        name: String,
    },
    /// `delete(name)`.
    Delete {
        /// Switch name.
        name: String,
    },
}

#[derive(Debug, Default)]
struct State {
    records: Vec<SwitchRecord>,
    failures: VecDeque<TransportError>,
    calls: Vec<Call>,
}

/// Switch backend held in memory.
///
/// Records are kept in insertion order and served in pages. Saving an unknown
/// name appends it; saving a known name replaces its condition in place.
/// Queued failures are returned (in order) by the next calls, whatever they are.
#[derive(Debug)]
pub struct MemoryBackend {
    state: RefCell<State>,
    page_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// An empty backend serving pages of [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Serve pages of `page_size` records (at least one).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Seed a record (builder pattern).
    #[must_use]
    pub fn with_record(self, name: impl Into<String>, condition: Value) -> Self {
        self.insert(name, condition);
        self
    }

    /// Store a record directly, bypassing the failure queue and call log.
    pub fn insert(&self, name: impl Into<String>, condition: Value) {
        upsert(&mut self.state.borrow_mut().records, name.into(), condition);
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: TransportError) {
        self.state.borrow_mut().failures.push_back(error);
    }

    /// The stored condition for `name`.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<Value> {
        self.state
            .borrow()
            .records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.condition.clone())
    }

    /// Stored names, in backend order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.state
            .borrow()
            .records
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Every call received so far, including failed ones.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Log `call` and pop a queued failure, if any.
    fn receive(&self, call: Call) -> Result<std::cell::RefMut<'_, State>, TransportError> {
        let mut state = self.state.borrow_mut();
        trace!(?call, "memory backend call");
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn upsert(records: &mut Vec<SwitchRecord>, name: String, condition: Value) {
    match records.iter_mut().find(|r| r.name == name) {
        Some(record) => record.condition = condition,
        None => records.push(SwitchRecord::new(name, condition)),
    }
}

impl Transport for MemoryBackend {
    fn list(&self, offset: usize) -> Result<Vec<SwitchRecord>, TransportError> {
        let state = self.receive(Call::List { offset })?;
        let page = state
            .records
            .iter()
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .collect();
        Ok(page)
    }

    fn save(&self, name: &str, condition: &Value) -> Result<(), TransportError> {
        let mut state = self.receive(Call::Save {
            name: name.to_owned(),
        })?;
        upsert(&mut state.records, name.to_owned(), condition.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), TransportError> {
        let mut state = self.receive(Call::Delete {
            name: name.to_owned(),
        })?;
        let before = state.records.len();
        state.records.retain(|r| r.name != name);
        if state.records.len() == before {
            return Err(TransportError::Status {
                status: 404,
                message: format!("no switch named \"{name}\""),
            });
        }
        Ok(())
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{Call, MemoryBackend};
    pub use flippy::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn on() -> Value {
        json!({ "condition_type": "true" })
    }

    #[test]
    fn pages_in_insertion_order() {
        let backend = MemoryBackend::new()
            .with_page_size(2)
            .with_record("a", on())
            .with_record("b", on())
            .with_record("c", on());

        let names = |page: Vec<SwitchRecord>| page.into_iter().map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(names(backend.list(0).unwrap()), vec!["a", "b"]);
        assert_eq!(names(backend.list(2).unwrap()), vec!["c"]);
        assert!(backend.list(3).unwrap().is_empty());
        assert!(backend.list(99).unwrap().is_empty());
    }

    #[test]
    fn save_upserts() {
        let backend = MemoryBackend::new().with_record("a", on());
        backend
            .save("a", &json!({ "condition_type": "false" }))
            .unwrap();
        backend.save("b", &on()).unwrap();

        assert_eq!(backend.names(), vec!["a", "b"]);
        assert_eq!(
            backend.record("a"),
            Some(json!({ "condition_type": "false" }))
        );
    }

    #[test]
    fn delete_missing_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.delete("ghost").unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[test]
    fn queued_failures_apply_in_order() {
        let backend = MemoryBackend::new();
        backend.fail_next(TransportError::Network {
            message: "down".into(),
        });
        backend.fail_next(TransportError::Status {
            status: 500,
            message: "boom".into(),
        });

        assert!(matches!(
            backend.save("a", &on()),
            Err(TransportError::Network { .. })
        ));
        assert!(matches!(
            backend.list(0),
            Err(TransportError::Status { status: 500, .. })
        ));
        backend.save("a", &on()).unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                Call::Save { name: "a".into() },
                Call::List { offset: 0 },
                Call::Save { name: "a".into() },
            ]
        );
        assert_eq!(backend.names(), vec!["a"]);
    }
}
