//! Template schemas
//!
//! A [`Schema`] is one template's full parameter configuration: canonical
//! definitions, the declared display order, and the alias table derived from
//! the definitions at construction time.

use crate::definition::ParameterDefinition;
use crate::error::{SchemaError, SchemaResult};
use crate::key::{normalize_key, ParamKey};
use crate::templatedata::TemplateDataDocument;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Named group of parameters (TemplateData `sets`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSet {
    /// Set label
    pub label: String,
    /// Canonical keys in the set
    pub params: Vec<String>,
}

/// One template's parameter schema
///
/// # Invariants
/// - every definition is stored under its own canonical key
/// - no alias maps to two canonical keys
/// - no alias equals a canonical key, so canonicalization is idempotent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaRecord", into = "SchemaRecord")]
pub struct Schema {
    title: String,
    description: Option<String>,
    format: Option<String>,
    maps: BTreeMap<String, serde_json::Value>,
    sets: Vec<ParamSet>,
    params: BTreeMap<ParamKey, Arc<ParameterDefinition>>,
    param_order: Vec<ParamKey>,
    aliases: HashMap<String, ParamKey>,
}

impl Schema {
    /// Build schema from definitions and a (possibly partial) display order
    ///
    /// # Errors
    /// - [`SchemaError::EmptyKey`] for a definition with an empty key
    /// - [`SchemaError::DuplicateParameter`] for a key defined twice
    /// - [`SchemaError::ConflictingAlias`] when two keys claim one alias
    /// - [`SchemaError::AliasShadowsParameter`] when an alias is itself a key
    pub fn new(
        title: impl Into<String>,
        definitions: impl IntoIterator<Item = ParameterDefinition>,
        param_order: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> SchemaResult<Self> {
        let mut params = BTreeMap::new();
        for def in definitions {
            if def.key().is_empty() {
                return Err(SchemaError::EmptyKey);
            }
            let key = def.key().clone();
            if params.insert(key.clone(), Arc::new(def)).is_some() {
                return Err(SchemaError::DuplicateParameter(key));
            }
        }

        let aliases = build_alias_table(&params)?;

        let mut seen = HashSet::new();
        let param_order = param_order
            .into_iter()
            .map(|k| canonical_in(&params, &aliases, k.as_ref()))
            .filter(|k| seen.insert(k.clone()))
            .collect();

        Ok(Self {
            title: title.into(),
            description: None,
            format: None,
            maps: BTreeMap::new(),
            sets: Vec::new(),
            params,
            param_order,
            aliases,
        })
    }

    /// Schema with no parameters, used when the template has no schema data
    #[must_use]
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            format: None,
            maps: BTreeMap::new(),
            sets: Vec::new(),
            params: BTreeMap::new(),
            param_order: Vec::new(),
            aliases: HashMap::new(),
        }
    }

    /// Build schema from a TemplateData JSON document
    ///
    /// # Errors
    /// Malformed JSON or any configuration error from [`Schema::new`]
    pub fn from_templatedata_json(title: impl Into<String>, json: &str) -> SchemaResult<Self> {
        TemplateDataDocument::from_json(json)?.into_schema(title)
    }

    /// Set the template description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the declared layout format
    #[must_use]
    pub fn with_format(mut self, format: Option<String>) -> Self {
        self.format = format;
        self
    }

    /// Set the name-mapping table
    #[must_use]
    pub fn with_maps(mut self, maps: BTreeMap<String, serde_json::Value>) -> Self {
        self.maps = maps;
        self
    }

    /// Set the parameter groups
    #[must_use]
    pub fn with_sets(mut self, sets: Vec<ParamSet>) -> Self {
        self.sets = sets;
        self
    }

    /// Template title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Template description
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared layout format (`inline`, `block`, or a custom format string)
    #[inline]
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Consumer name-mapping table
    #[inline]
    #[must_use]
    pub fn maps(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.maps
    }

    /// Parameter groups
    #[inline]
    #[must_use]
    pub fn sets(&self) -> &[ParamSet] {
        &self.sets
    }

    /// Declared display order (canonical keys, possibly incomplete)
    #[inline]
    #[must_use]
    pub fn param_order(&self) -> &[ParamKey] {
        &self.param_order
    }

    /// Check if the schema declares no parameters
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// All declared definitions, in key order
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<ParameterDefinition>> {
        self.params.values()
    }

    /// Resolve a written key to its canonical key
    ///
    /// Normalizes the key, then maps aliases to their canonical key. Unknown
    /// keys come back normalized but otherwise unchanged.
    #[must_use]
    pub fn canonicalize(&self, key: &str) -> ParamKey {
        canonical_in(&self.params, &self.aliases, key)
    }

    /// Definition for a canonical key, or an undeclared placeholder
    #[must_use]
    pub fn definition_for(&self, key: &str) -> Arc<ParameterDefinition> {
        match self.params.get(key) {
            Some(def) => Arc::clone(def),
            None => Arc::new(ParameterDefinition::placeholder(key)),
        }
    }

    /// Check if a canonical key is declared
    #[inline]
    #[must_use]
    pub fn declares(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Deterministic ordered view of a canonical-key mapping
    ///
    /// Keys from the declared order come first, in that order; the rest follow
    /// in lexicographic order. The result depends only on the key set, never
    /// on insertion order. Duplicate input keys keep the last value.
    pub fn order<V>(&self, mapping: impl IntoIterator<Item = (ParamKey, V)>) -> IndexMap<ParamKey, V> {
        let mut remaining: BTreeMap<ParamKey, V> = mapping.into_iter().collect();
        let mut ordered = IndexMap::with_capacity(remaining.len());
        for key in &self.param_order {
            if let Some(value) = remaining.remove(key) {
                ordered.insert(key.clone(), value);
            }
        }
        ordered.extend(remaining);
        ordered
    }
}

fn canonical_in(
    params: &BTreeMap<ParamKey, Arc<ParameterDefinition>>,
    aliases: &HashMap<String, ParamKey>,
    key: &str,
) -> ParamKey {
    let normalized = normalize_key(key);
    if let Some(canonical) = aliases.get(&normalized) {
        return canonical.clone();
    }
    match params.get_key_value(normalized.as_str()) {
        Some((canonical, _)) => canonical.clone(),
        None => ParamKey::from(normalized),
    }
}

fn build_alias_table(
    params: &BTreeMap<ParamKey, Arc<ParameterDefinition>>,
) -> SchemaResult<HashMap<String, ParamKey>> {
    let mut aliases: HashMap<String, ParamKey> = HashMap::new();
    for (key, def) in params {
        for raw in def.aliases() {
            let alias = normalize_key(raw);
            if alias.is_empty() || alias == key.as_str() {
                continue;
            }
            if params.contains_key(alias.as_str()) {
                return Err(SchemaError::AliasShadowsParameter {
                    alias,
                    owner: key.clone(),
                });
            }
            if let Some(previous) = aliases.get(&alias) {
                if previous != key {
                    return Err(SchemaError::conflicting_alias(alias, previous.clone(), key.clone()));
                }
                continue;
            }
            aliases.insert(alias, key.clone());
        }
    }
    Ok(aliases)
}

/// Serialized form of a schema: title plus its TemplateData document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaRecord {
    title: String,
    #[serde(flatten)]
    document: TemplateDataDocument,
}

impl TryFrom<SchemaRecord> for Schema {
    type Error = SchemaError;

    fn try_from(record: SchemaRecord) -> Result<Self, Self::Error> {
        record.document.into_schema(record.title)
    }
}

impl From<Schema> for SchemaRecord {
    fn from(schema: Schema) -> Self {
        Self {
            document: TemplateDataDocument::from_schema(&schema),
            title: schema.title,
        }
    }
}
