//! Kind registry for wire-driven condition construction.
//!
//! The registry maps wire `condition_type` names onto internal [`Kind`]s and is
//! the single entry point for turning wire JSON into a [`Condition`] tree.
//!
//! # Wire aliases
//!
//! | Wire name | Kind |
//! |-----------|------|
//! | `and`, `or` | `multiple` |
//! | `true` | `on` |
//! | `false` | `off` |
//! | `string:substring` | `substring` |
//! | `string:regex` | `regex` |
//! | `string:oneof` | `one_of` |
//! | `networking:iprange` | `ip_range` |
//!
//! Names without an alias resolve to themselves (`not`, `namespaced`,
//! `equals`, `proportion`, ...).
//!
//! # Loading never fails
//!
//! [`Registry::load`] maps anything it cannot interpret onto a [`Raw`](crate::Raw)
//! node holding the data verbatim: a missing `condition_type`, an unregistered
//! kind, or a payload that does not match its kind's grammar.
//!
//! # Example
//!
//! ```
//! use flippy::{Kind, RegistryBuilder};
//!
//! let registry = RegistryBuilder::new()
//!     .kind(Kind::On)
//!     .kind(Kind::Off)
//!     .alias("true", Kind::On)
//!     .alias("false", Kind::Off)
//!     .build();
//!
//! assert_eq!(registry.resolve_kind("true"), "on");
//! assert!(registry.instantiate("equals").is_err());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use serde_json::Value;
use tracing::{debug, warn};

use crate::wire::{
    decode, ConstantWire, EqualsWire, IpRangeWire, MultipleWire, NamespacedWire, NotWire,
    OneOfWire, ProportionWire, RegexWire, SubstringWire,
};
use crate::{
    Catalogue, CatalogueEntry, Combinator, Condition, ConditionError, ConditionSlot, Equals,
    IpRange, Kind, Multiple, Namespaced, Not, OneOf, Proportion, Regex, Scope, Substring,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for constructing a [`Registry`].
///
/// Register kinds and wire aliases, then call [`build()`](Self::build) to
/// produce an immutable `Registry`. `raw` is always available, registered or not.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    kinds: BTreeSet<Kind>,
    aliases: HashMap<String, Kind>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind under its internal name.
    #[must_use]
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kinds.insert(kind);
        self
    }

    /// Map a wire name onto a kind.
    #[must_use]
    pub fn alias(mut self, wire_name: &str, kind: Kind) -> Self {
        self.aliases.insert(wire_name.to_owned(), kind);
        self
    }

    /// Freeze the registry. No further registration is possible.
    #[must_use]
    pub fn build(mut self) -> Registry {
        self.kinds.insert(Kind::Raw);
        Registry {
            kinds: self.kinds,
            aliases: self.aliases,
        }
    }
}

/// Register every built-in kind and the standard wire aliases.
///
/// ```ignore
/// let registry = flippy::register_standard_kinds(RegistryBuilder::new()).build();
/// ```
#[must_use]
pub fn register_standard_kinds(builder: RegistryBuilder) -> RegistryBuilder {
    Kind::ALL
        .into_iter()
        .fold(builder, RegistryBuilder::kind)
        .alias("and", Kind::Multiple)
        .alias("or", Kind::Multiple)
        .alias("true", Kind::On)
        .alias("false", Kind::Off)
        .alias("string:substring", Kind::Substring)
        .alias("string:regex", Kind::Regex)
        .alias("string:oneof", Kind::OneOf)
        .alias("networking:iprange", Kind::IpRange)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable mapping from wire names to condition kinds.
///
/// Constructed via [`RegistryBuilder`], or use the process-wide
/// [`Registry::standard()`]. Pass it by reference to everything that loads or
/// creates conditions.
#[derive(Debug)]
pub struct Registry {
    kinds: BTreeSet<Kind>,
    aliases: HashMap<String, Kind>,
}

impl Registry {
    /// The registry with every built-in kind and alias.
    #[must_use]
    pub fn standard() -> &'static Registry {
        static STANDARD: OnceLock<Registry> = OnceLock::new();
        STANDARD.get_or_init(|| register_standard_kinds(RegistryBuilder::new()).build())
    }

    /// Resolve a wire name to an internal kind name.
    ///
    /// Unknown names pass through unchanged.
    #[must_use]
    pub fn resolve_kind<'a>(&self, wire_name: &'a str) -> &'a str {
        match self.aliases.get(wire_name) {
            Some(kind) => kind.name(),
            None => wire_name,
        }
    }

    /// Returns `true` if `kind` (an internal name) is registered.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        Kind::from_name(kind).is_some_and(|k| self.kinds.contains(&k))
    }

    /// Registered internal kind names, sorted.
    #[must_use]
    pub fn kind_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.kinds.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names
    }

    fn registered(&self, kind: &str) -> Option<Kind> {
        Kind::from_name(kind).filter(|k| self.kinds.contains(k))
    }

    /// A fresh, empty node of a registered kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::UnknownKind`] (listing the registered kinds) if
    /// `kind` is not registered. `raw` always succeeds.
    pub fn instantiate(&self, kind: &str) -> Result<Condition, ConditionError> {
        self.registered(kind)
            .map(Kind::fresh)
            .ok_or_else(|| ConditionError::UnknownKind {
                kind: kind.to_owned(),
                available: self.kind_names().into_iter().map(str::to_owned).collect(),
            })
    }

    /// Selectable kinds at `scope`, with labels and the default placeholder.
    ///
    /// Only registered kinds are listed.
    #[must_use]
    pub fn catalogue(&self, scope: Scope) -> Catalogue {
        let entries = scope
            .kinds()
            .iter()
            .filter(|k| self.kinds.contains(*k))
            .map(|&kind| CatalogueEntry {
                kind,
                label: kind.label(),
            })
            .collect();
        Catalogue::new(scope, entries)
    }

    /// Load a condition tree from wire JSON.
    ///
    /// Never fails: anything that cannot be interpreted as a registered kind
    /// loads as `raw`, preserving the data verbatim.
    #[must_use]
    pub fn load(&self, wire: &Value) -> Condition {
        let Some(wire_name) = wire.get("condition_type").and_then(Value::as_str) else {
            debug!("condition without a condition_type, keeping as raw");
            return Condition::raw(wire.clone());
        };
        let resolved = self.resolve_kind(wire_name);
        let Some(kind) = self.registered(resolved) else {
            debug!(condition_type = wire_name, "unregistered condition kind, keeping as raw");
            return Condition::raw(wire.clone());
        };
        match self.load_kind(kind, wire_name, wire) {
            Ok(condition) => condition,
            Err(err) => {
                warn!(
                    condition_type = wire_name,
                    error = %err,
                    "condition does not match its kind, keeping as raw"
                );
                Condition::raw(wire.clone())
            }
        }
    }

    /// Parse condition JSON text and load it.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::Malformed`] if `text` is not JSON.
    pub fn load_str(&self, text: &str) -> Result<Condition, ConditionError> {
        let wire: Value = serde_json::from_str(text).map_err(|e| ConditionError::Malformed {
            detail: e.to_string(),
        })?;
        Ok(self.load(&wire))
    }

    fn load_slot(&self, child: Option<&Value>) -> ConditionSlot {
        match child {
            Some(Value::Null) | None => ConditionSlot::empty(),
            Some(wire) => ConditionSlot::loaded(self.load(wire)),
        }
    }

    fn load_kind(
        &self,
        kind: Kind,
        wire_name: &str,
        wire: &Value,
    ) -> Result<Condition, serde_json::Error> {
        let condition = match kind {
            Kind::On => {
                decode::<ConstantWire>(wire)?;
                Condition::on()
            }
            Kind::Off => {
                decode::<ConstantWire>(wire)?;
                Condition::off()
            }
            Kind::Multiple => {
                let w: MultipleWire = decode(wire)?;
                let combinator = if wire_name == "or" {
                    Combinator::Or
                } else {
                    Combinator::And
                };
                w.conditions
                    .iter()
                    .fold(Multiple::new(combinator), |m, child| m.with(self.load(child)))
                    .into()
            }
            Kind::Not => {
                let w: NotWire = decode(wire)?;
                Not::from_slot(self.load_slot(w.condition.as_ref())).into()
            }
            Kind::Namespaced => {
                let w: NamespacedWire = decode(wire)?;
                let slot = self.load_slot(w.condition.as_ref());
                Namespaced::from_parts(w.attr, w.fallback, slot).into()
            }
            Kind::Equals => {
                let w: EqualsWire = decode(wire)?;
                if w.value.is_array() || w.value.is_object() {
                    return Err(serde::de::Error::custom(
                        "equals value must be a string, number, bool or null",
                    ));
                }
                Equals::with_value(w.value).into()
            }
            Kind::Substring => Substring::new(decode::<SubstringWire>(wire)?.value).into(),
            Kind::Regex => Regex::new(decode::<RegexWire>(wire)?.pattern).into(),
            Kind::OneOf => OneOf::from_options(decode::<OneOfWire>(wire)?.options).into(),
            Kind::IpRange => IpRange::new(decode::<IpRangeWire>(wire)?.range).into(),
            Kind::Proportion => {
                Proportion::from_wire(decode::<ProportionWire>(wire)?.proportion).into()
            }
            Kind::Raw => Condition::raw(wire.clone()),
        };
        Ok(condition)
    }
}
