//! flippy - condition trees for feature-flag switches
//!
//! A switch is a named boolean predicate evaluated (elsewhere) against a request
//! context. This crate owns the **condition expression model**: a recursive, tagged
//! tree of predicate nodes that is edited incrementally, validates itself bottom-up,
//! and round-trips through a stable JSON wire grammar.
//!
//! # Architecture
//!
//! - [`Kind`]: Closed set of node kinds, with labels and scope catalogues
//! - [`Registry`]: Wire name → kind aliases; the deserialization entry point
//! - [`Condition`]: One node (a [`Node`] variant plus its last validation error)
//! - [`ConditionSlot`] / [`ConditionBuilder`]: Child slots and explicit kind selection
//! - [`Switch`]: Name + root condition + clean snapshot + dirty flag
//! - [`SwitchDirectory`]: Paged client-side list driving a [`Transport`]
//!
//! # Key Design Insights
//!
//! 1. **Unknown data is never corrupted**: anything the registry cannot map onto a
//!    known kind's grammar loads as [`Raw`] and re-serializes verbatim.
//!
//! 2. **Validation never short-circuits**: composites validate every child and join
//!    the child errors with `"\n"`.
//!
//! 3. **Lossy conversion is explicit**: only [`ConditionBuilder::select_kind`]
//!    replaces a node, and only a switch to `raw` carries the old node's JSON across.
//!
//! # Example
//!
//! ```
//! use flippy::prelude::*;
//! use serde_json::json;
//!
//! let registry = Registry::standard();
//! let mut condition = registry.load(&json!({
//!     "condition_type": "namespaced",
//!     "attr": "user",
//!     "fallback": false,
//!     "condition": { "condition_type": "string:oneof", "options": ["bob", "alice"] }
//! }));
//!
//! assert_eq!(condition.kind(), Kind::Namespaced);
//! assert!(condition.validate());
//! assert_eq!(condition.to_wire()["condition"]["options"], json!(["alice", "bob"]));
//! ```
//!
//! # Extensions
//!
//! - [`flippy-http`](https://docs.rs/flippy-http): Blocking HTTP [`Transport`]
//! - [`flippy-test`](https://docs.rs/flippy-test): In-memory backend and conformance fixtures (internal)

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod builder;
mod composite;
mod condition;
mod directory;
mod kind;
mod leaf;
mod raw;
mod registry;
mod switch;
mod transport;
mod wire;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use condition::{Condition, Node};
pub use kind::{Catalogue, CatalogueEntry, Kind, Scope, DEFAULT_PLACEHOLDER};
pub use registry::{register_standard_kinds, Registry, RegistryBuilder};

// Node kinds
pub use composite::{Child, ChildId, Combinator, Multiple, Namespaced, Not};
pub use leaf::{Equals, IpRange, OneOf, Proportion, Regex, Substring};
pub use raw::Raw;

// Editing
pub use builder::{ConditionBuilder, ConditionSlot, SlotState};
pub use switch::Switch;

// Directory protocol
pub use directory::{DeleteTicket, DirectoryError, SwitchDirectory, UpdateTicket};
pub use transport::{Transport, TransportError};
pub use wire::SwitchRecord;

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use flippy::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Editing
        ConditionBuilder,
        ConditionSlot,
        // Core types
        Condition,
        // Errors
        ConditionError,
        DirectoryError,
        Kind,
        Node,
        Registry,
        Scope,
        Switch,
        SwitchDirectory,
        SwitchRecord,
        // Traits
        Transport,
        TransportError,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from loading conditions and instantiating kinds.
///
/// Validation failures are not errors: they are stored on the node and read
/// back with [`Condition::error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    /// Condition text is not JSON.
    #[error("malformed condition: {detail}")]
    Malformed {
        /// The underlying parse error.
        detail: String,
    },
    /// A kind name is not registered.
    #[error(
        "unknown condition kind \"{kind}\"; registered kinds: {}",
        .available.join(", ")
    )]
    UnknownKind {
        /// The unregistered kind name.
        kind: String,
        /// Kind names that ARE registered.
        available: Vec<String>,
    },
}
