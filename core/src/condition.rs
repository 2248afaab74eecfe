//! Condition: one node of a condition tree.

use serde_json::{json, Value};

use crate::{
    Equals, IpRange, Kind, Multiple, Namespaced, Not, OneOf, Proportion, Raw, Regex, Substring,
};

/// The kind-specific payload of a [`Condition`].
///
/// Exhaustive: every kind the editor understands has a variant, and everything
/// else lands in [`Node::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Always on.
    On,
    /// Always off.
    Off,
    /// All / any of a list of children.
    Multiple(Multiple),
    /// Negation of one child.
    Not(Not),
    /// One child applied to a named field.
    Namespaced(Namespaced),
    /// Equality with a literal.
    Equals(Equals),
    /// Substring match.
    Substring(Substring),
    /// Regular expression match.
    Regex(Regex),
    /// Membership in a list of options.
    OneOf(OneOf),
    /// IPv4 range membership.
    IpRange(IpRange),
    /// Percentage gate.
    Proportion(Proportion),
    /// Opaque JSON.
    Raw(Raw),
}

/// A condition node together with the error from its last validation.
///
/// Nodes are built by [`Registry::load`](crate::Registry::load) from wire data,
/// by [`ConditionBuilder::select_kind`](crate::ConditionBuilder::select_kind), or
/// directly from a node type via `From`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    node: Node,
    error: Option<String>,
}

impl Condition {
    /// Wrap a node. No validation error is recorded yet.
    #[must_use]
    pub fn new(node: Node) -> Self {
        Self { node, error: None }
    }

    /// The always-on constant.
    #[must_use]
    pub fn on() -> Self {
        Self::new(Node::On)
    }

    /// The always-off constant. Default root of a new switch.
    #[must_use]
    pub fn off() -> Self {
        Self::new(Node::Off)
    }

    /// An opaque node holding `data` verbatim.
    #[must_use]
    pub fn raw(data: Value) -> Self {
        Raw::from_value(data).into()
    }

    /// The internal kind of this node.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match &self.node {
            Node::On => Kind::On,
            Node::Off => Kind::Off,
            Node::Multiple(_) => Kind::Multiple,
            Node::Not(_) => Kind::Not,
            Node::Namespaced(_) => Kind::Namespaced,
            Node::Equals(_) => Kind::Equals,
            Node::Substring(_) => Kind::Substring,
            Node::Regex(_) => Kind::Regex,
            Node::OneOf(_) => Kind::OneOf,
            Node::IpRange(_) => Kind::IpRange,
            Node::Proportion(_) => Kind::Proportion,
            Node::Raw(_) => Kind::Raw,
        }
    }

    /// The kind-specific payload.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Mutable access to the kind-specific payload.
    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    /// Validate this node and, for composites, every descendant.
    ///
    /// Returns `true` if the tree is well formed. On failure the reason is kept
    /// and available through [`error()`](Self::error) until the next validation.
    /// Leaf kinds with pending edited text commit it here (equals re-infers its
    /// literal, proportion recomputes its fraction, raw re-parses its JSON).
    pub fn validate(&mut self) -> bool {
        let outcome = match &mut self.node {
            Node::On | Node::Off => Ok(()),
            Node::Multiple(m) => m.check(),
            Node::Not(n) => n.check(),
            Node::Namespaced(n) => n.check(),
            Node::Equals(e) => e.check(),
            Node::Substring(_) | Node::Regex(_) | Node::IpRange(_) => Ok(()),
            Node::OneOf(o) => o.check(),
            Node::Proportion(p) => p.check(),
            Node::Raw(r) => r.check(),
        };
        match outcome {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(reason) => {
                self.error = Some(reason);
                false
            }
        }
    }

    /// Error text from the last failed validation, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Canonical wire form of this node.
    ///
    /// Serializing a tree that failed validation is allowed: empty slots become
    /// `null`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match &self.node {
            Node::On => json!({ "condition_type": "true" }),
            Node::Off => json!({ "condition_type": "false" }),
            Node::Multiple(m) => m.to_wire(),
            Node::Not(n) => n.to_wire(),
            Node::Namespaced(n) => n.to_wire(),
            Node::Equals(e) => e.to_wire(),
            Node::Substring(s) => s.to_wire(),
            Node::Regex(r) => r.to_wire(),
            Node::OneOf(o) => o.to_wire(),
            Node::IpRange(r) => r.to_wire(),
            Node::Proportion(p) => p.to_wire(),
            Node::Raw(r) => r.to_wire(),
        }
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::off()
    }
}

impl From<Node> for Condition {
    fn from(node: Node) -> Self {
        Self::new(node)
    }
}

macro_rules! node_conversions {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Condition {
                fn from(inner: $ty) -> Self {
                    Self::new(Node::$ty(inner))
                }
            }
        )*
    };
}

node_conversions!(
    Multiple, Not, Namespaced, Equals, Substring, Regex, OneOf, IpRange, Proportion, Raw,
);
