//! Switch lifecycle against the in-memory backend
//!
//! Run with: cargo test -p flippy-test --test directory

use flippy::{Combinator, ConditionBuilder, Node};
use flippy_test::prelude::*;
use serde_json::json;

fn builder() -> ConditionBuilder<'static> {
    ConditionBuilder::new(Registry::standard())
}

fn off() -> serde_json::Value {
    json!({ "condition_type": "false" })
}

fn seeded(count: usize, page_size: usize) -> MemoryBackend {
    (0..count).fold(MemoryBackend::new().with_page_size(page_size), |b, i| {
        b.with_record(format!("switch_{i}"), off())
    })
}

#[test]
fn create_edit_update_delete() {
    let backend = MemoryBackend::new().with_record("existing", off());
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.fetch_all(&backend).unwrap();

    // Create: defaults to always-off and lands first.
    directory.create(&backend, "feature_x", None).unwrap();
    assert_eq!(directory.names(), vec!["feature_x", "existing"]);
    assert_eq!(backend.record("feature_x"), Some(off()));

    // Edit the root into a 25% rollout.
    let switch = directory.edit("feature_x").unwrap();
    if let Node::Proportion(p) = switch.select_kind(&builder(), "proportion").node_mut() {
        p.set_text("25");
    }
    assert!(directory.get("feature_x").unwrap().is_dirty());

    directory.update(&backend, "feature_x").unwrap();
    let saved = json!({ "condition_type": "proportion", "proportion": 0.25 });
    assert_eq!(backend.record("feature_x"), Some(saved.clone()));
    let switch = directory.get("feature_x").unwrap();
    assert!(!switch.is_dirty());
    assert_eq!(switch.clean_snapshot(), &saved);

    // A fresh listing sees the saved condition.
    let mut fresh = SwitchDirectory::new(Registry::standard());
    fresh.fetch_all(&backend).unwrap();
    assert_eq!(
        fresh.get("feature_x").unwrap().condition().to_wire(),
        saved
    );

    directory.delete(&backend, "feature_x").unwrap();
    assert!(directory.get("feature_x").is_none());
    assert_eq!(backend.names(), vec!["existing"]);
}

#[test]
fn compound_condition_round_trips_through_backend() {
    let backend = MemoryBackend::new();
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.create(&backend, "beta_users", None).unwrap();

    let b = builder();
    let root = directory
        .edit("beta_users")
        .unwrap()
        .select_kind(&b, "multiple");
    let Node::Multiple(list) = root.node_mut() else {
        panic!("expected a multiple");
    };
    list.set_combinator(Combinator::Or);
    let users = list.add(&b, "namespaced");
    let Node::Namespaced(field) = list.child_mut(users).unwrap().node_mut() else {
        panic!("expected namespaced");
    };
    field.set_attr("user");
    if let Node::OneOf(options) = field.slot_mut().select(&b, "one_of").node_mut() {
        options.set_bulk("carol\nalice, bob");
    }
    list.add(&b, "on");

    directory.update(&backend, "beta_users").unwrap();
    assert_eq!(
        backend.record("beta_users"),
        Some(json!({
            "condition_type": "or",
            "conditions": [
                {
                    "condition_type": "namespaced",
                    "attr": "user",
                    "condition": { "condition_type": "string:oneof", "options": ["alice", "bob", "carol"] },
                    "fallback": false
                },
                { "condition_type": "true" }
            ]
        }))
    );
}

#[test]
fn invalid_update_sends_nothing() {
    let backend = MemoryBackend::new();
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.create(&backend, "x", None).unwrap();
    directory.edit("x").unwrap().select_kind(&builder(), "not");

    let err = directory.update(&backend, "x").unwrap_err();
    assert!(matches!(err, DirectoryError::Invalid { .. }), "{err}");
    assert_eq!(backend.calls(), vec![Call::Save { name: "x".into() }]);
    assert!(!directory.get("x").unwrap().is_locked());
}

#[test]
fn failed_update_keeps_edits() {
    let backend = MemoryBackend::new();
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.create(&backend, "x", None).unwrap();
    directory
        .edit("x")
        .unwrap()
        .replace_condition(flippy::Condition::on());

    backend.fail_next(TransportError::Status {
        status: 500,
        message: "database is down".into(),
    });
    let err = directory.update(&backend, "x").unwrap_err();
    assert_eq!(err.to_string(), "backend returned status 500: database is down");

    let switch = directory.get("x").unwrap();
    assert!(switch.is_dirty());
    assert!(!switch.is_locked());
    assert_eq!(switch.clean_snapshot(), &off());
    assert_eq!(backend.record("x"), Some(off()));

    // Retry succeeds.
    directory.update(&backend, "x").unwrap();
    assert_eq!(backend.record("x"), Some(json!({ "condition_type": "true" })));
}

#[test]
fn cancel_restores_snapshot() {
    let backend = MemoryBackend::new().with_record("x", json!({ "condition_type": "true" }));
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.fetch_all(&backend).unwrap();

    directory.edit("x").unwrap().select_kind(&builder(), "off");
    directory.cancel("x").unwrap();

    let switch = directory.get("x").unwrap();
    assert!(!switch.is_dirty());
    assert_eq!(
        switch.condition().to_wire(),
        json!({ "condition_type": "true" })
    );
}

#[test]
fn two_phase_update_locks_switch() {
    let backend = MemoryBackend::new();
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.create(&backend, "x", None).unwrap();

    let ticket = directory.begin_update("x").unwrap();
    assert!(matches!(
        directory.edit("x"),
        Err(DirectoryError::Locked { .. })
    ));
    assert!(matches!(
        directory.begin_delete("x"),
        Err(DirectoryError::Locked { .. })
    ));

    let result = backend.save(ticket.name(), ticket.wire());
    directory.complete_update(ticket, result).unwrap();
    assert!(directory.edit("x").is_ok());
}

#[test]
fn failed_delete_keeps_switch() {
    let backend = MemoryBackend::new();
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.create(&backend, "x", None).unwrap();

    backend.fail_next(TransportError::Network {
        message: "connection reset".into(),
    });
    assert!(directory.delete(&backend, "x").is_err());
    assert!(!directory.get("x").unwrap().is_locked());
    assert_eq!(backend.names(), vec!["x"]);
}

#[test]
fn duplicate_and_empty_names_are_rejected_locally() {
    let backend = MemoryBackend::new();
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.create(&backend, "x", None).unwrap();

    assert_eq!(
        directory.create(&backend, "x", None).unwrap_err(),
        DirectoryError::DuplicateName { name: "x".into() }
    );
    assert_eq!(
        directory.create(&backend, "", None).unwrap_err(),
        DirectoryError::EmptyName
    );
    assert_eq!(backend.calls().len(), 1);
}

#[test]
fn paging_fetches_every_switch_once() {
    let backend = seeded(5, 2);
    let mut directory = SwitchDirectory::new(Registry::standard());

    assert_eq!(directory.fetch_page(&backend).unwrap(), 2);
    assert_eq!(directory.offset(), 2);
    assert!(!directory.is_exhausted());

    assert_eq!(directory.fetch_all(&backend).unwrap(), 3);
    assert!(directory.is_exhausted());
    assert_eq!(directory.len(), 5);
    assert_eq!(
        backend.calls(),
        vec![
            Call::List { offset: 0 },
            Call::List { offset: 2 },
            Call::List { offset: 4 },
            Call::List { offset: 5 },
        ]
    );
}

#[test]
fn delete_between_pages_does_not_skip_records() {
    let backend = seeded(4, 2);
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.fetch_page(&backend).unwrap();

    directory.delete(&backend, "switch_0").unwrap();
    directory.fetch_all(&backend).unwrap();

    assert_eq!(
        directory.names(),
        vec!["switch_1", "switch_2", "switch_3"]
    );
}

#[test]
fn fetch_failure_leaves_directory_unchanged() {
    let backend = seeded(3, 2);
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.fetch_page(&backend).unwrap();

    backend.fail_next(TransportError::Network {
        message: "timeout".into(),
    });
    assert!(directory.fetch_page(&backend).is_err());
    assert_eq!(directory.len(), 2);
    assert_eq!(directory.offset(), 2);

    directory.fetch_all(&backend).unwrap();
    assert_eq!(directory.len(), 3);
}

#[test]
fn opaque_conditions_survive_a_save() {
    let opaque = json!({ "condition_type": "geo:country", "countries": ["NZ"] });
    let backend = MemoryBackend::new().with_record("geo", opaque.clone());
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.fetch_all(&backend).unwrap();

    directory.edit("geo").unwrap();
    directory.update(&backend, "geo").unwrap();
    assert_eq!(backend.record("geo"), Some(opaque));
}

#[test]
fn created_switch_listed_later_keeps_paging_aligned() {
    let backend = MemoryBackend::new().with_page_size(2).with_record("a", off());
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.create(&backend, "new", None).unwrap();
    backend.insert("b", off());
    backend.insert("c", off());
    assert_eq!(backend.names(), vec!["a", "new", "b", "c"]);

    // The first page lists `new` again; it is skipped but still counted.
    assert_eq!(directory.fetch_page(&backend).unwrap(), 1);
    directory.delete(&backend, "new").unwrap();
    assert_eq!(directory.offset(), 1);

    directory.fetch_all(&backend).unwrap();
    assert!(directory.is_exhausted());
    assert_eq!(directory.names(), vec!["a", "b", "c"]);
}

#[test]
fn ticket_from_before_a_reset_is_ignored() {
    let backend = MemoryBackend::new().with_record("x", off());
    let mut directory = SwitchDirectory::new(Registry::standard());
    directory.fetch_all(&backend).unwrap();
    let stale = directory.begin_delete("x").unwrap();

    directory.reset();
    directory.fetch_all(&backend).unwrap();
    let current = directory.begin_delete("x").unwrap();

    directory.complete_delete(stale, Ok(())).unwrap();
    assert!(directory.get("x").is_some_and(|s| s.is_locked()));

    let result = backend.delete(current.name());
    directory.complete_delete(current, result).unwrap();
    assert!(directory.get("x").is_none());
    assert!(backend.names().is_empty());
}
