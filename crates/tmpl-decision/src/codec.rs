//! Snapshot codec
//!
//! A [`Snapshot`] carries the decision records of one reconciliation run
//! across a navigation boundary. The transport form is a versioned JSON
//! envelope:
//!
//! ```text
//! {"version":1,"snapshot":{"run_id":"01H…","templates":[…],"diagnostics":[…]}}
//! ```
//!
//! Schemas travel with their templates, so definitions (placeholders
//! included) are rebuilt on decode exactly as they were before encoding.

use crate::choice::TemplateChoice;
use crate::diagnostic::Diagnostic;
use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Current envelope version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Identifier of one reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Ulid);

impl RunId {
    /// Fresh, time-ordered run id
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Wrap an existing ULID
    #[inline]
    #[must_use]
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Decision records of one run plus page-level diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    run_id: RunId,

    /// One record per template instance, in page order
    pub templates: Vec<TemplateChoice>,

    /// Page-level diagnostics
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Snapshot {
    /// Empty snapshot for a new run
    #[must_use]
    pub fn new() -> Self {
        Self::with_run_id(RunId::generate())
    }

    /// Empty snapshot tagged with `run_id`
    #[must_use]
    pub fn with_run_id(run_id: RunId) -> Self {
        Self {
            run_id,
            templates: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Run this snapshot belongs to
    #[inline]
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Attach a page-level diagnostic
    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Encode to transport text
    ///
    /// # Errors
    /// Returns [`CodecError::Malformed`] if a value cannot be serialized
    pub fn encode(&self) -> CodecResult<String> {
        serialize(self)
    }

    /// Decode from transport text
    ///
    /// # Errors
    /// See [`deserialize`]
    pub fn decode(text: &str) -> CodecResult<Self> {
        deserialize(text)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    snapshot: &'a Snapshot,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    snapshot: serde_json::Value,
}

/// Encode a snapshot into its versioned envelope
///
/// # Errors
/// Returns [`CodecError::Malformed`] if a value cannot be serialized
pub fn serialize(snapshot: &Snapshot) -> CodecResult<String> {
    let text = serde_json::to_string(&EnvelopeRef {
        version: SNAPSHOT_VERSION,
        snapshot,
    })?;
    tracing::debug!(run_id = %snapshot.run_id, bytes = text.len(), "Encoded snapshot");
    Ok(text)
}

/// Decode a snapshot from its versioned envelope
///
/// # Errors
/// - [`CodecError::Malformed`] for text that is not an envelope, or whose
///   schemas fail to rebuild
/// - [`CodecError::UnsupportedVersion`] for any other envelope version
pub fn deserialize(text: &str) -> CodecResult<Snapshot> {
    let envelope: Envelope = serde_json::from_str(text)?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: envelope.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    let snapshot: Snapshot = serde_json::from_value(envelope.snapshot)?;
    tracing::debug!(
        run_id = %snapshot.run_id,
        templates = snapshot.templates.len(),
        "Decoded snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use tmpl_schema::{ParamKey, ParameterDefinition, Schema};

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "Infobox journal",
                [
                    ParameterDefinition::new("title").required(),
                    ParameterDefinition::new("frequency")
                        .suggested()
                        .with_autovalue("Quarterly"),
                    ParameterDefinition::new("language").with_aliases(["lang"]),
                ],
                ["title", "frequency"],
            )
            .unwrap(),
        )
    }

    fn sample() -> Snapshot {
        let mut template = TemplateChoice::new(schema());
        {
            let c = template.choice(&ParamKey::new("title"));
            c.original_key = Some("title".into());
            c.original_value = Some(String::new());
            c.proposed_value = Some("Journal of Tests".into());
            c.prefer_original = false;
        }
        template
            .choice(&ParamKey::new("foo"))
            .push(Diagnostic::notice("No schema for this parameter"));
        template.push(Diagnostic::warning("instance level"));

        let mut snapshot = Snapshot::new();
        snapshot.templates.push(template);
        snapshot.push(Diagnostic::notice("page level"));
        snapshot
    }

    #[test]
    fn round_trip_preserves_everything() {
        let snapshot = sample();
        let back = deserialize(&serialize(&snapshot).unwrap()).unwrap();
        assert_eq!(back, snapshot);

        let template = &back.templates[0];
        let title = template.get("title").unwrap();
        assert_eq!(title.original_value.as_deref(), Some(""));
        assert!(!title.prefer_original);
        assert!(!template.get("foo").unwrap().definition().is_declared());
        assert_eq!(template.schema().canonicalize("lang").as_str(), "language");
    }

    #[test]
    fn encoding_is_deterministic() {
        let snapshot = sample();
        assert_eq!(snapshot.encode().unwrap(), snapshot.encode().unwrap());
        let back = Snapshot::decode(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(back.encode().unwrap(), snapshot.encode().unwrap());
    }

    #[test]
    fn rejects_other_versions() {
        let err = deserialize(r#"{"version":7,"snapshot":{}}"#).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedVersion { found: 7, expected: 1 }
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(deserialize("not json"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn rejects_invalid_schema() {
        let text = r#"{"version":1,"snapshot":{"run_id":"01ARZ3NDEKTSV4RRFFQ69G5FAV","templates":[
            {"schema":{"title":"T","params":{
                "a":{"aliases":["x"]},
                "b":{"aliases":["x"]}}},
             "choices":{}}]}}"#;
        assert!(matches!(deserialize(text), Err(CodecError::Malformed(_))));
    }

    fn value() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[ a-zA-Z0-9|=–-]{0,12}")
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            fields in proptest::collection::vec(
                ("[a-z]{1,8}", value(), value(), value(), any::<bool>(), proptest::option::of("[a-z ]{0,16}")),
                0..6,
            )
        ) {
            let mut template = TemplateChoice::new(schema());
            for (key, original_key, original, proposed, prefer, note) in fields {
                let c = template.choice(&ParamKey::new(&key));
                c.original_key = original_key;
                c.original_value = original;
                c.proposed_value = proposed;
                c.prefer_original = prefer;
                if let Some(note) = note {
                    c.push(Diagnostic::warning(note));
                }
            }
            let mut snapshot = Snapshot::new();
            snapshot.templates.push(template);

            let back = deserialize(&serialize(&snapshot).unwrap()).unwrap();
            prop_assert_eq!(&back, &snapshot);
            prop_assert_eq!(back.templates[0].final_values(), snapshot.templates[0].final_values());
        }
    }
}
