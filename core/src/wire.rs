//! Wire types for the condition JSON grammar.
//!
//! These mirror the runtime node types but are serde-deserializable. The
//! [`Registry`](crate::Registry) dispatches on `condition_type`, then
//! deserializes the matching wire struct straight from the borrowed JSON.
//!
//! | `condition_type` | Wire type | Runtime type |
//! |------------------|-----------|--------------|
//! | `and` / `or` | [`MultipleWire`] | [`Multiple`](crate::Multiple) |
//! | `not` | [`NotWire`] | [`Not`](crate::Not) |
//! | `namespaced` | [`NamespacedWire`] | [`Namespaced`](crate::Namespaced) |
//! | `equals` | [`EqualsWire`] | [`Equals`](crate::Equals) |
//! | `string:substring` | [`SubstringWire`] | [`Substring`](crate::Substring) |
//! | `string:regex` | [`RegexWire`] | [`Regex`](crate::Regex) |
//! | `string:oneof` | [`OneOfWire`] | [`OneOf`](crate::OneOf) |
//! | `networking:iprange` | [`IpRangeWire`] | [`IpRange`](crate::IpRange) |
//! | `proportion` | [`ProportionWire`] | [`Proportion`](crate::Proportion) |
//!
//! Every wire struct denies unknown fields: a payload carrying anything the
//! runtime node would drop on re-serialization is not that kind's grammar.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A switch as it travels over the wire: `{ "name": ..., "condition": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchRecord {
    /// Unique switch name.
    pub name: String,
    /// Root condition in wire form.
    pub condition: Value,
}

impl SwitchRecord {
    /// Create a record from a name and a wire condition.
    #[must_use]
    pub fn new(name: impl Into<String>, condition: Value) -> Self {
        Self {
            name: name.into(),
            condition,
        }
    }
}

/// Deserialize `T` from borrowed wire JSON.
pub(crate) fn decode<T: DeserializeOwned>(wire: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(wire)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MultipleWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    pub conditions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NotWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    /// `None` for a missing or `null` child: an empty slot.
    pub condition: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NamespacedWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    pub attr: String,
    pub condition: Option<Value>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EqualsWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SubstringWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RegexWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    pub pattern: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OneOfWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct IpRangeWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    pub range: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProportionWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
    /// `None` for `null`: a proportion that was never given a number.
    pub proportion: Option<Number>,
}

/// Wire form of a constant (`"true"` / `"false"`): nothing but the tag.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConstantWire {
    #[serde(rename = "condition_type")]
    _tag: IgnoredAny,
}
