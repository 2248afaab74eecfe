//! Leaf nodes: matchers over a single context value.
//!
//! `substring`, `regex` and `ip_range` are always valid here; the evaluator
//! owns pattern compilation and range parsing. `equals` and `proportion` keep
//! the operator's text separately from the committed value and only re-derive
//! the value from edited text when validated.

use std::sync::LazyLock;

use serde_json::{json, Number, Value};

// Constant literals: compilation cannot fail.
static FLOAT_LITERAL: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[0-9]+\.[0-9]+$").expect("static pattern"));
static INTEGER_LITERAL: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[0-9]+$").expect("static pattern"));
static PERCENTAGE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[0-9]*\.?[0-9]+$").expect("static pattern"));

// ═══════════════════════════════════════════════════════════════════════════════
// Equals
// ═══════════════════════════════════════════════════════════════════════════════

/// Equality with a JSON literal (string, number, bool or null).
///
/// Loaded values keep their literal JSON type. Text typed by the operator is
/// type-inferred on the next validation:
///
/// | Text | Value |
/// |------|-------|
/// | `42` | integer (float beyond `u64`) |
/// | `3.14` | float |
/// | `true` / `false` | bool |
/// | `null` | null |
/// | anything else | the text as a string |
#[derive(Debug, Clone, PartialEq)]
pub struct Equals {
    text: String,
    value: Value,
    pending: bool,
}

impl Default for Equals {
    fn default() -> Self {
        Self::with_value(Value::String(String::new()))
    }
}

impl Equals {
    /// Compare against `value`.
    #[must_use]
    pub fn with_value(value: Value) -> Self {
        Self {
            text: display_literal(&value),
            value,
            pending: false,
        }
    }

    /// Operator-facing text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Inferred into a value on the next validation.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.pending = true;
    }

    /// The committed literal.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn check(&mut self) -> Result<(), String> {
        if self.pending {
            self.value = infer_literal(&self.text);
            self.pending = false;
        }
        Ok(())
    }

    /// Wire form: `{"condition_type": "equals", "value": ...}`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        json!({ "condition_type": "equals", "value": self.value })
    }
}

fn display_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn infer_literal(text: &str) -> Value {
    let number = if FLOAT_LITERAL.is_match(text) {
        text.parse::<f64>().ok().and_then(Number::from_f64)
    } else if INTEGER_LITERAL.is_match(text) {
        match text.parse::<u64>() {
            Ok(n) => Some(Number::from(n)),
            Err(_) => text.parse::<f64>().ok().and_then(Number::from_f64),
        }
    } else {
        None
    };
    if let Some(number) = number {
        return Value::Number(number);
    }
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::String(text.to_owned()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Substring / Regex / IpRange
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! text_leaf {
    ($(#[$doc:meta])* $name:ident, $field:ident, $key:literal, $wire:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            $field: String,
        }

        impl $name {
            #[doc = concat!("Create from the `", stringify!($field), "` text.")]
            #[must_use]
            pub fn new($field: impl Into<String>) -> Self {
                Self { $field: $field.into() }
            }

            #[doc = concat!("The `", stringify!($field), "` text.")]
            #[must_use]
            pub fn $field(&self) -> &str {
                &self.$field
            }

            #[doc = concat!("Replace the `", stringify!($field), "` text.")]
            pub fn set(&mut self, $field: impl Into<String>) {
                self.$field = $field.into();
            }

            #[doc = concat!("Wire form: `{\"condition_type\": \"", $wire, "\", \"", stringify!($field), "\": ...}`.")]
            #[must_use]
            pub fn to_wire(&self) -> Value {
                json!({ "condition_type": $wire, $key: self.$field })
            }
        }
    };
}

text_leaf!(
    /// String contains `value`.
    Substring,
    value,
    "value",
    "string:substring"
);

text_leaf!(
    /// String matches `pattern`. The pattern is not compiled here.
    Regex,
    pattern,
    "pattern",
    "string:regex"
);

text_leaf!(
    /// Address lies in `range`. Only presence is checked here.
    IpRange,
    range,
    "range",
    "networking:iprange"
);

// ═══════════════════════════════════════════════════════════════════════════════
// OneOf
// ═══════════════════════════════════════════════════════════════════════════════

/// String is one of `options`.
///
/// Validation drops blank options and sorts the rest. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OneOf {
    options: Vec<String>,
}

impl OneOf {
    /// Create from a list of options.
    #[must_use]
    pub fn from_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Current options, in editing order until validated.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Append one option.
    pub fn push(&mut self, option: impl Into<String>) {
        self.options.push(option.into());
    }

    /// Replace the option at `index`. Returns `false` if out of range.
    pub fn set_option(&mut self, index: usize, option: impl Into<String>) -> bool {
        match self.options.get_mut(index) {
            Some(slot) => {
                *slot = option.into();
                true
            }
            None => false,
        }
    }

    /// Remove the option at `index`.
    pub fn remove_option(&mut self, index: usize) -> Option<String> {
        (index < self.options.len()).then(|| self.options.remove(index))
    }

    /// Replace all options from bulk text.
    ///
    /// Entries are separated by commas or newlines and trimmed; blank entries
    /// are dropped.
    pub fn set_bulk(&mut self, text: &str) {
        self.options = text
            .split([',', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
    }

    /// Bulk text for the current options: their comma join.
    #[must_use]
    pub fn bulk_text(&self) -> String {
        self.canonical().join(",")
    }

    fn canonical(&self) -> Vec<String> {
        let mut kept: Vec<String> = self
            .options
            .iter()
            .filter(|o| !o.is_empty())
            .cloned()
            .collect();
        kept.sort();
        kept
    }

    pub(crate) fn check(&mut self) -> Result<(), String> {
        let kept = self.canonical();
        if kept.is_empty() {
            return Err("No options specified for \"one of\" field".to_owned());
        }
        self.options = kept;
        Ok(())
    }

    /// Wire form: `{"condition_type": "string:oneof", "options": [...]}`, sorted.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        json!({ "condition_type": "string:oneof", "options": self.canonical() })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Proportion
// ═══════════════════════════════════════════════════════════════════════════════

/// Percentage gate. Entered as a percentage, stored as a fraction.
///
/// No clamping: `150` becomes `1.5`. A loaded fraction keeps its JSON number
/// as is (`1` stays an integer) until the text is edited.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Proportion {
    text: String,
    fraction: Option<Number>,
    pending: bool,
}

impl Proportion {
    /// Create from a committed fraction (e.g. `0.25` for 25%).
    ///
    /// A non-finite fraction leaves the proportion without a value.
    #[must_use]
    pub fn from_fraction(fraction: f64) -> Self {
        Self::from_wire(Number::from_f64(fraction))
    }

    pub(crate) fn from_wire(fraction: Option<Number>) -> Self {
        match fraction {
            Some(number) => Self {
                text: number.as_f64().map(display_percentage).unwrap_or_default(),
                fraction: Some(number),
                pending: false,
            },
            None => Self::default(),
        }
    }

    /// Operator-facing percentage text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the percentage text. Converted on the next validation.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.pending = true;
    }

    /// The committed fraction, if any.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        self.fraction.as_ref().and_then(Number::as_f64)
    }

    pub(crate) fn check(&mut self) -> Result<(), String> {
        if !self.pending && self.fraction.is_some() {
            return Ok(());
        }
        let fraction = PERCENTAGE
            .is_match(&self.text)
            .then(|| self.text.parse::<f64>().ok())
            .flatten()
            .and_then(|percentage| Number::from_f64(percentage / 100.0))
            .ok_or_else(|| "Non-numeric proportion given".to_owned())?;
        self.fraction = Some(fraction);
        self.pending = false;
        Ok(())
    }

    /// Wire form: `{"condition_type": "proportion", "proportion": <fraction>}`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        json!({ "condition_type": "proportion", "proportion": self.fraction })
    }
}

fn display_percentage(fraction: f64) -> String {
    let percentage = (fraction * 100.0 * 1e9).round() / 1e9;
    format!("{percentage}")
}
