//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the condition codec.
//!
//! Each case starts from exactly one of `wire` (loaded with
//! [`Registry::load`]), `source` (JSON text through [`Registry::load_str`]) or
//! `select` (a fresh node of that kind), optionally types `input` into the
//! root node, validates, and checks the expectations.
//!
//! ```yaml
//! name: proportion
//! cases:
//!   - name: percentage becomes a fraction
//!     select: proportion
//!     input: "25"
//!     expect:
//!       wire: { condition_type: proportion, proportion: 0.25 }
//! ```

use flippy::prelude::*;
use serde::Deserialize;
use serde_json::Value;

/// A complete test fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cases: Vec<TestCase>,
}

/// Test case
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub wire: Option<Value>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub select: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub expect: Expect,
}

/// What a case must produce
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expect {
    /// Internal kind name of the root after loading.
    pub kind: Option<String>,
    /// Outcome of validation.
    pub valid: bool,
    /// Substring of the validation error.
    pub error: Option<String>,
    /// Wire form after validation.
    pub wire: Option<Value>,
    /// Substring of the `load_str` error; the case stops there.
    pub load_error: Option<String>,
}

impl Default for Expect {
    fn default() -> Self {
        Self {
            kind: None,
            valid: true,
            error: None,
            wire: None,
            load_error: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Case execution
// ═══════════════════════════════════════════════════════════════════════════════

impl TestCase {
    /// Build the starting condition.
    ///
    /// `Ok(None)` means loading failed as the case expected.
    fn start(&self, registry: &Registry) -> Result<Option<Condition>, String> {
        match (&self.wire, &self.source, &self.select) {
            (Some(wire), None, None) => Ok(Some(registry.load(wire))),
            (None, Some(source), None) => match (registry.load_str(source), &self.expect.load_error) {
                (Ok(condition), None) => Ok(Some(condition)),
                (Ok(_), Some(expected)) => Err(format!("expected load error containing {expected:?}")),
                (Err(err), Some(expected)) if err.to_string().contains(expected.as_str()) => Ok(None),
                (Err(err), _) => Err(format!("unexpected load error: {err}")),
            },
            (None, None, Some(kind)) => {
                Ok(Some(ConditionBuilder::new(registry).select_kind(kind, None)))
            }
            _ => Err("case needs exactly one of wire, source or select".to_owned()),
        }
    }

    /// Run the case, collecting every mismatch.
    pub fn run(&self, registry: &Registry) -> Vec<String> {
        let mut condition = match self.start(registry) {
            Ok(Some(condition)) => condition,
            Ok(None) => return Vec::new(),
            Err(failure) => return vec![failure],
        };

        let mut failures = Vec::new();
        if let Some(kind) = &self.expect.kind {
            if condition.kind().name() != kind {
                failures.push(format!("kind: expected {kind}, got {}", condition.kind()));
            }
        }
        if let Some(text) = &self.input {
            if let Err(failure) = type_into(&mut condition, text) {
                return vec![failure];
            }
        }

        let valid = condition.validate();
        if valid != self.expect.valid {
            failures.push(format!(
                "valid: expected {}, got {valid} (error: {:?})",
                self.expect.valid,
                condition.error()
            ));
        }
        if let Some(expected) = &self.expect.error {
            match condition.error() {
                Some(actual) if actual.contains(expected.as_str()) => {}
                actual => failures.push(format!("error: expected {expected:?}, got {actual:?}")),
            }
        }
        if let Some(expected) = &self.expect.wire {
            let actual = condition.to_wire();
            if &actual != expected {
                failures.push(format!("wire: expected {expected}, got {actual}"));
            }
        }
        failures
    }
}

/// Type `text` into the root node's editable field.
fn type_into(condition: &mut Condition, text: &str) -> Result<(), String> {
    let kind = condition.kind();
    match condition.node_mut() {
        Node::Equals(n) => n.set_text(text),
        Node::Proportion(n) => n.set_text(text),
        Node::Raw(n) => n.set_text(text),
        Node::OneOf(n) => n.set_bulk(text),
        Node::Substring(n) => n.set(text),
        Node::Regex(n) => n.set(text),
        Node::IpRange(n) => n.set(text),
        Node::Namespaced(n) => n.set_attr(text),
        _ => return Err(format!("{kind} has no text input")),
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub failures: Vec<String>,
}

impl CaseResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    pub fn run(&self, registry: &Registry) -> Vec<CaseResult> {
        self.cases
            .iter()
            .map(|case| CaseResult {
                case_name: case.name.clone(),
                failures: case.run(registry),
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self, registry: &Registry) {
        for result in self.run(registry) {
            assert!(
                result.passed(),
                "Fixture '{}' case '{}' failed:\n  {}",
                self.name,
                result.case_name,
                result.failures.join("\n  ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: smoke
cases:
  - name: constant
    wire: { condition_type: "true" }
    expect: { kind: "on" }
  - name: bad text
    source: "{ nope"
    expect: { load_error: malformed }
---
name: second
cases:
  - name: empty not
    select: not
    expect: { valid: false, error: NOT }
"#;

    #[test]
    fn parses_and_runs_multi_document() {
        let fixtures = Fixture::from_yaml_multi(FIXTURE).unwrap();
        assert_eq!(fixtures.len(), 2);
        for fixture in &fixtures {
            fixture.run_and_assert(Registry::standard());
        }
    }

    #[test]
    fn reports_mismatches() {
        let fixture = Fixture::from_yaml(
            r#"
name: wrong
cases:
  - name: expects the wrong kind
    wire: { condition_type: "false" }
    expect: { kind: "on", valid: false }
  - name: no starting point
    input: "x"
"#,
        )
        .unwrap();
        let results = fixture.run(Registry::standard());
        assert_eq!(results[0].failures.len(), 2);
        assert_eq!(
            results[1].failures,
            vec!["case needs exactly one of wire, source or select"]
        );
    }

    #[test]
    fn rejects_input_for_constants() {
        let fixture = Fixture::from_yaml(
            r#"
name: constant input
cases:
  - name: typing into on
    select: "on"
    input: "x"
"#,
        )
        .unwrap();
        let results = fixture.run(Registry::standard());
        assert_eq!(results[0].failures, vec!["on has no text input"]);
    }
}
