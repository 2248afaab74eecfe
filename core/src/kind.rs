//! Kind: the closed set of condition node kinds.
//!
//! Wire names (`"and"`, `"string:oneof"`, ...) resolve to a [`Kind`] through the
//! [`Registry`](crate::Registry) alias table. Every kind has an internal name
//! (what catalogues and kind selection use) and a human-readable label.
//!
//! | Kind | Internal name | Label |
//! |------|---------------|-------|
//! | [`Kind::On`] | `on` | `on` |
//! | [`Kind::Off`] | `off` | `off` |
//! | [`Kind::Multiple`] | `multiple` | `and/or` |
//! | [`Kind::Not`] | `not` | `not` |
//! | [`Kind::Namespaced`] | `namespaced` | `field must match...` |
//! | [`Kind::Equals`] | `equals` | `equals` |
//! | [`Kind::Substring`] | `substring` | `substring` |
//! | [`Kind::Regex`] | `regex` | `regex` |
//! | [`Kind::OneOf`] | `one_of` | `one of` |
//! | [`Kind::IpRange`] | `ip_range` | `IPv4 range` |
//! | [`Kind::Proportion`] | `proportion` | `percentage` |
//! | [`Kind::Raw`] | `raw` | `(edit as JSON)` |

use std::fmt;

use crate::{
    Condition, Equals, IpRange, Multiple, Namespaced, Not, OneOf, Proportion, Raw, Regex,
    Substring,
};

/// Internal kind of a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// Always on (wire `"true"`).
    On,
    /// Always off (wire `"false"`).
    Off,
    /// All / any of a list of conditions (wire `"and"` / `"or"`).
    Multiple,
    /// Negation of one condition.
    Not,
    /// One condition applied to a named field of the context.
    Namespaced,
    /// Equality with a literal.
    Equals,
    /// String contains a substring.
    Substring,
    /// String matches a regular expression.
    Regex,
    /// String is one of a list of options.
    OneOf,
    /// Address lies in an IPv4 range.
    IpRange,
    /// Percentage gate.
    Proportion,
    /// Opaque JSON, kept verbatim.
    Raw,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 12] = [
        Kind::On,
        Kind::Off,
        Kind::Multiple,
        Kind::Not,
        Kind::Namespaced,
        Kind::Equals,
        Kind::Substring,
        Kind::Regex,
        Kind::OneOf,
        Kind::IpRange,
        Kind::Proportion,
        Kind::Raw,
    ];

    /// Internal name used by catalogues and kind selection.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Kind::On => "on",
            Kind::Off => "off",
            Kind::Multiple => "multiple",
            Kind::Not => "not",
            Kind::Namespaced => "namespaced",
            Kind::Equals => "equals",
            Kind::Substring => "substring",
            Kind::Regex => "regex",
            Kind::OneOf => "one_of",
            Kind::IpRange => "ip_range",
            Kind::Proportion => "proportion",
            Kind::Raw => "raw",
        }
    }

    /// Look up a kind by its internal name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Human-readable label. Defaults to the internal name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Kind::OneOf => "one of",
            Kind::IpRange => "IPv4 range",
            Kind::Multiple => "and/or",
            Kind::Namespaced => "field must match...",
            Kind::Proportion => "percentage",
            Kind::Raw => "(edit as JSON)",
            other => other.name(),
        }
    }

    /// Returns `true` for kinds that own child conditions.
    #[must_use]
    pub fn is_composite(self) -> bool {
        matches!(self, Kind::Multiple | Kind::Not | Kind::Namespaced)
    }

    /// A freshly constructed, empty node of this kind.
    pub(crate) fn fresh(self) -> Condition {
        match self {
            Kind::On => Condition::on(),
            Kind::Off => Condition::off(),
            Kind::Multiple => Multiple::default().into(),
            Kind::Not => Not::default().into(),
            Kind::Namespaced => Namespaced::default().into(),
            Kind::Equals => Equals::default().into(),
            Kind::Substring => Substring::default().into(),
            Kind::Regex => Regex::default().into(),
            Kind::OneOf => OneOf::default().into(),
            Kind::IpRange => IpRange::default().into(),
            Kind::Proportion => Proportion::default().into(),
            Kind::Raw => Raw::default().into(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Catalogue
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a condition is being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The root condition of a switch.
    Root,
    /// A condition nested inside a composite.
    Nested,
}

impl Scope {
    /// Kinds legal at this scope, in presentation order.
    #[must_use]
    pub fn kinds(self) -> &'static [Kind] {
        match self {
            Scope::Root => &[
                Kind::Namespaced,
                Kind::Multiple,
                Kind::Not,
                Kind::On,
                Kind::Off,
                Kind::Raw,
            ],
            Scope::Nested => &[
                Kind::Equals,
                Kind::Namespaced,
                Kind::Multiple,
                Kind::Not,
                Kind::Regex,
                Kind::Substring,
                Kind::OneOf,
                Kind::IpRange,
                Kind::Proportion,
                Kind::Raw,
            ],
        }
    }
}

/// Placeholder shown before any kind is chosen.
pub const DEFAULT_PLACEHOLDER: &str = "Change condition";

/// One selectable kind in a [`Catalogue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueEntry {
    /// The kind.
    pub kind: Kind,
    /// Display label for the kind.
    pub label: &'static str,
}

/// Descriptive list of kinds selectable at a [`Scope`].
///
/// Presentation metadata only. Validation never consults it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogue {
    scope: Scope,
    placeholder: String,
    entries: Vec<CatalogueEntry>,
}

impl Catalogue {
    pub(crate) fn new(scope: Scope, entries: Vec<CatalogueEntry>) -> Self {
        Self {
            scope,
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            entries,
        }
    }

    /// Replace the placeholder label (e.g. `"Select condition"`, `"Add condition"`).
    #[must_use]
    pub fn with_placeholder(mut self, label: impl Into<String>) -> Self {
        self.placeholder = label.into();
        self
    }

    /// The scope this catalogue was built for.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Label of the empty "nothing chosen" option.
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Selectable kinds in presentation order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    /// Returns `true` if `kind` is selectable here.
    #[must_use]
    pub fn contains(&self, kind: Kind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }
}
