//! Internal `$ref` resolution for schemas.
//!
//! References are followed recursively with a stack of the references
//! currently being expanded. A reference already on the stack closes a cycle
//! and is replaced by a placeholder object, so resolution always terminates.
//! Missing targets degrade to a generic object and are reported as warnings.
//!
//! Expansion is also bounded for acyclic documents: references nest at most
//! [`MAX_REFERENCE_DEPTH`] deep, and one call to [`SchemaResolver::resolve`]
//! expands at most [`MAX_EXPANSIONS`] references. A schema reached through
//! many routes therefore cannot grow the output exponentially.

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::report::LoadWarning;

const REF_KEY: &str = "$ref";

/// Deepest chain of nested references that is expanded.
pub const MAX_REFERENCE_DEPTH: usize = 10;

/// Most references expanded while resolving one schema.
pub const MAX_EXPANSIONS: usize = 500;

/// Resolves references against a single document.
#[derive(Debug)]
pub struct SchemaResolver<'doc> {
    spec: &'doc str,
    document: &'doc Value,
    warnings: Vec<LoadWarning>,
    expansions: usize,
}

impl<'doc> SchemaResolver<'doc> {
    /// Creates a resolver for `document`, labelling warnings with `spec`.
    #[must_use]
    pub fn new(spec: &'doc str, document: &'doc Value) -> Self {
        Self {
            spec,
            document,
            warnings: Vec::new(),
            expansions: 0,
        }
    }

    /// Returns a fully resolved copy of `schema`.
    pub fn resolve(&mut self, schema: &Value) -> Value {
        let mut visiting = Vec::new();
        self.expansions = 0;
        self.resolve_inner(schema, &mut visiting)
    }

    /// Follows a local reference (`#/...`) without resolving the target.
    #[must_use]
    pub fn lookup(&self, reference: &str) -> Option<&'doc Value> {
        let pointer = reference.strip_prefix('#')?;
        self.document.pointer(pointer)
    }

    /// Records a warning alongside those produced by resolution.
    pub fn push_warning(&mut self, warning: LoadWarning) {
        if !self.warnings.contains(&warning) {
            warn!(%warning, "spec degradation");
            self.warnings.push(warning);
        }
    }

    /// Drains the collected warnings.
    pub fn take_warnings(&mut self) -> Vec<LoadWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn resolve_inner(&mut self, schema: &Value, visiting: &mut Vec<String>) -> Value {
        let Value::Object(map) = schema else {
            return schema.clone();
        };

        if let Some(Value::String(reference)) = map.get(REF_KEY) {
            let mut resolved = self.resolve_reference(reference, visiting);
            let siblings = self.resolve_keywords(map, visiting);
            if let Value::Object(target) = &mut resolved {
                for (key, value) in siblings {
                    target.insert(key, value);
                }
            }
            return resolved;
        }

        let own = self.resolve_keywords(map, visiting);
        match map.get("allOf") {
            Some(Value::Array(members)) => {
                let mut merged = Map::new();
                for member in members {
                    if let Value::Object(member) = self.resolve_inner(member, visiting) {
                        merge_schema(&mut merged, member);
                    }
                }
                merge_schema(&mut merged, own);
                Value::Object(merged)
            }
            _ => Value::Object(own),
        }
    }

    fn resolve_keywords(&mut self, map: &Map<String, Value>, visiting: &mut Vec<String>) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in map {
            let resolved = match (key.as_str(), value) {
                (REF_KEY | "allOf", _) => continue,
                ("properties", Value::Object(properties)) => Value::Object(
                    properties
                        .iter()
                        .map(|(name, schema)| (name.clone(), self.resolve_inner(schema, visiting)))
                        .collect(),
                ),
                ("items" | "additionalProperties" | "not", Value::Object(_)) => {
                    self.resolve_inner(value, visiting)
                }
                ("oneOf" | "anyOf", Value::Array(options)) => Value::Array(
                    options
                        .iter()
                        .map(|option| self.resolve_inner(option, visiting))
                        .collect(),
                ),
                _ => value.clone(),
            };
            out.insert(key.clone(), resolved);
        }
        out
    }

    fn resolve_reference(&mut self, reference: &str, visiting: &mut Vec<String>) -> Value {
        let name = reference_name(reference);

        if visiting.iter().any(|seen| seen == reference) {
            self.push_warning(LoadWarning::CircularReference {
                spec: self.spec.to_owned(),
                reference: reference.to_owned(),
            });
            return json!({
                "type": "object",
                "description": format!("Circular reference to {name}"),
                "x-circular-ref": reference,
            });
        }

        let Some(target) = self.lookup(reference) else {
            self.push_warning(LoadWarning::UnresolvedReference {
                spec: self.spec.to_owned(),
                reference: reference.to_owned(),
            });
            return json!({
                "type": "object",
                "description": format!("Referenced schema not found: {name}"),
            });
        };

        if visiting.len() >= MAX_REFERENCE_DEPTH || self.expansions >= MAX_EXPANSIONS {
            self.push_warning(LoadWarning::ExpansionLimit {
                spec: self.spec.to_owned(),
                reference: reference.to_owned(),
            });
            return json!({
                "type": "object",
                "description": format!("Nested schema {name} not expanded"),
                "x-unexpanded-ref": reference,
            });
        }
        self.expansions += 1;

        visiting.push(reference.to_owned());
        let mut resolved = self.resolve_inner(target, visiting);
        visiting.pop();

        // a title inherited through allOf does not count as the target's own
        if let Value::Object(schema) = &mut resolved {
            if target.get("title").is_none() {
                schema.insert("title".to_owned(), Value::String(name.to_owned()));
            }
        }
        resolved
    }
}

/// Last path segment of a reference, e.g. `Payment` for
/// `#/components/schemas/Payment`.
#[must_use]
pub fn reference_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn merge_schema(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, value) in from {
        match (key.as_str(), value) {
            ("properties", Value::Object(properties)) => {
                let slot = into
                    .entry("properties")
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(existing) = slot {
                    existing.extend(properties);
                } else {
                    *slot = Value::Object(properties);
                }
            }
            ("required", Value::Array(required)) => {
                let slot = into
                    .entry("required")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(existing) = slot {
                    for name in required {
                        if !existing.contains(&name) {
                            existing.push(name);
                        }
                    }
                } else {
                    *slot = Value::Array(required);
                }
            }
            (_, value) => {
                into.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Value {
        json!({
            "components": {
                "schemas": {
                    "Money": {
                        "type": "object",
                        "properties": {
                            "amount": { "type": "number", "minimum": 0 },
                            "currency": { "type": "string", "enum": ["EUR", "USD"], "default": "EUR" }
                        },
                        "required": ["amount"]
                    },
                    "Payment": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Money" },
                            {
                                "type": "object",
                                "properties": { "reference": { "type": "string", "pattern": "^PAY-" } },
                                "required": ["reference"]
                            }
                        ],
                        "description": "A payment"
                    },
                    "Node": {
                        "type": "object",
                        "properties": {
                            "next": { "$ref": "#/components/schemas/Edge" }
                        }
                    },
                    "Edge": {
                        "type": "object",
                        "properties": {
                            "target": { "$ref": "#/components/schemas/Node" }
                        }
                    },
                    "Either": {
                        "oneOf": [
                            { "$ref": "#/components/schemas/Money" },
                            { "type": "string" }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn nested_references_resolve_and_keep_constraints() {
        let doc = document();
        let mut resolver = SchemaResolver::new("pay", &doc);
        let resolved = resolver.resolve(&json!({ "$ref": "#/components/schemas/Money" }));

        assert_eq!(resolved["title"], json!("Money"));
        assert_eq!(resolved["properties"]["amount"]["minimum"], json!(0));
        assert_eq!(resolved["properties"]["currency"]["enum"], json!(["EUR", "USD"]));
        assert_eq!(resolved["properties"]["currency"]["default"], json!("EUR"));
        assert!(resolver.take_warnings().is_empty());
    }

    #[test]
    fn all_of_members_are_merged() {
        let doc = document();
        let mut resolver = SchemaResolver::new("pay", &doc);
        let resolved = resolver.resolve(&json!({ "$ref": "#/components/schemas/Payment" }));

        assert!(resolved.get("allOf").is_none());
        assert_eq!(resolved["required"], json!(["amount", "reference"]));
        assert_eq!(resolved["properties"]["reference"]["pattern"], json!("^PAY-"));
        assert_eq!(resolved["properties"]["amount"]["type"], json!("number"));
        assert_eq!(resolved["description"], json!("A payment"));
        assert_eq!(resolved["title"], json!("Payment"));
    }

    #[test]
    fn cycles_terminate_with_placeholder() {
        let doc = document();
        let mut resolver = SchemaResolver::new("graph", &doc);
        let resolved = resolver.resolve(&json!({ "$ref": "#/components/schemas/Node" }));

        let placeholder = &resolved["properties"]["next"]["properties"]["target"];
        assert_eq!(placeholder["type"], json!("object"));
        assert_eq!(placeholder["x-circular-ref"], json!("#/components/schemas/Node"));
        assert_eq!(
            resolver.take_warnings(),
            vec![LoadWarning::CircularReference {
                spec: "graph".into(),
                reference: "#/components/schemas/Node".into(),
            }]
        );
    }

    #[test]
    fn missing_reference_degrades_to_object() {
        let doc = document();
        let mut resolver = SchemaResolver::new("pay", &doc);
        let resolved = resolver.resolve(&json!({
            "type": "array",
            "items": { "$ref": "#/components/schemas/Missing" }
        }));

        assert_eq!(
            resolved["items"],
            json!({ "type": "object", "description": "Referenced schema not found: Missing" })
        );
        assert_eq!(resolver.take_warnings().len(), 1);
    }

    #[test]
    fn one_of_options_are_resolved_in_place() {
        let doc = document();
        let mut resolver = SchemaResolver::new("pay", &doc);
        let resolved = resolver.resolve(&json!({ "$ref": "#/components/schemas/Either" }));
        assert_eq!(resolved["oneOf"][0]["title"], json!("Money"));
        assert_eq!(resolved["oneOf"][1], json!({ "type": "string" }));
    }

    /// `S0..=S20`, where `a` and `b` of each schema both point at the next.
    fn shared_chain(depth: usize) -> Value {
        let schemas: Map<String, Value> = (0..=depth)
            .map(|i| {
                let next = json!({ "$ref": format!("#/components/schemas/S{}", i + 1) });
                let schema = if i == depth {
                    json!({ "type": "string" })
                } else {
                    json!({ "type": "object", "properties": { "a": next.clone(), "b": next } })
                };
                (format!("S{i}"), schema)
            })
            .collect();
        json!({ "components": { "schemas": schemas } })
    }

    fn count_nodes(value: &Value) -> usize {
        match value {
            Value::Object(map) => 1 + map.values().map(count_nodes).sum::<usize>(),
            Value::Array(items) => 1 + items.iter().map(count_nodes).sum::<usize>(),
            _ => 1,
        }
    }

    #[test]
    fn shared_references_stay_bounded() {
        let doc = shared_chain(20);
        let mut resolver = SchemaResolver::new("dag", &doc);
        let resolved = resolver.resolve(&json!({ "$ref": "#/components/schemas/S0" }));

        assert!(count_nodes(&resolved) < MAX_EXPANSIONS * 16);
        assert!(resolver
            .take_warnings()
            .iter()
            .any(|warning| matches!(warning, LoadWarning::ExpansionLimit { .. })));
        assert_eq!(resolved["properties"]["a"]["title"], json!("S1"));
    }

    #[test]
    fn deep_chains_stop_at_depth_limit() {
        let schemas: Map<String, Value> = (0..20)
            .map(|i| {
                let next = json!({ "$ref": format!("#/components/schemas/L{}", i + 1) });
                (format!("L{i}"), json!({ "type": "object", "properties": { "next": next } }))
            })
            .collect();
        let doc = json!({ "components": { "schemas": schemas } });
        let mut resolver = SchemaResolver::new("chain", &doc);
        let mut node = resolver.resolve(&json!({ "$ref": "#/components/schemas/L0" }));

        let mut depth = 0;
        while node["properties"]["next"].get("title").is_some() {
            node = node["properties"]["next"].take();
            depth += 1;
        }
        assert_eq!(depth, MAX_REFERENCE_DEPTH - 1);
        let cut = format!("#/components/schemas/L{MAX_REFERENCE_DEPTH}");
        assert_eq!(node["properties"]["next"]["x-unexpanded-ref"], json!(cut));
    }

    #[test]
    fn budget_resets_between_schemas() {
        let doc = shared_chain(20);
        let mut resolver = SchemaResolver::new("dag", &doc);
        let _ = resolver.resolve(&json!({ "$ref": "#/components/schemas/S0" }));
        let again = resolver.resolve(&json!({ "$ref": "#/components/schemas/S19" }));
        assert_eq!(again["properties"]["b"]["title"], json!("S20"));
    }

    #[test]
    fn sibling_reuse_is_not_a_cycle() {
        let doc = document();
        let mut resolver = SchemaResolver::new("pay", &doc);
        let resolved = resolver.resolve(&json!({
            "type": "object",
            "properties": {
                "a": { "$ref": "#/components/schemas/Money" },
                "b": { "$ref": "#/components/schemas/Money" }
            }
        }));
        assert_eq!(resolved["properties"]["b"]["title"], json!("Money"));
        assert!(resolver.take_warnings().is_empty());
    }
}
