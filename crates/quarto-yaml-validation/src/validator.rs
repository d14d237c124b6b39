// YAML validation engine

use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::annotated::AnnotatedParse;
use crate::error::{InstancePath, PathSegment, SchemaError, ValidationError};
use crate::schema::{
    ArraySchema, EnumSchema, NumberSchema, ObjectSchema, Schema, SchemaRegistry, StringSchema,
    walk_schema,
};

/// A compiled validator for one schema.
///
/// Construction checks that every `$ref` resolves and compiles every
/// regex in the schema, so `validate` itself cannot fail.
#[derive(Debug)]
pub struct Validator {
    schema: Arc<Schema>,
    definitions: Arc<Vec<Schema>>,
    patterns: HashMap<String, Regex>,
}

impl Validator {
    pub fn new(schema: Arc<Schema>, definitions: Arc<Vec<Schema>>) -> Result<Self, SchemaError> {
        let patterns = compile_patterns(&schema, &definitions)?;
        tracing::debug!(
            definitions = definitions.len(),
            patterns = patterns.len(),
            "compiled validator"
        );
        Ok(Validator {
            schema,
            definitions,
            patterns,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate an annotated document, collecting every error
    pub fn validate(&self, annotation: &AnnotatedParse) -> Vec<ValidationError> {
        let mut registry = SchemaRegistry::new();
        for def in self.definitions.iter() {
            registry.register_tree(def);
        }
        registry.register_tree(&self.schema);

        let mut context = ValidationContext::new(&registry, &self.patterns);
        validate_generic(annotation, &self.schema, &mut context);
        context.errors
    }
}

/// Check every reference and compile every regex reachable from the schema
fn compile_patterns(
    schema: &Schema,
    definitions: &[Schema],
) -> Result<HashMap<String, Regex>, SchemaError> {
    let mut registry = SchemaRegistry::new();
    for def in definitions {
        registry.register_tree(def);
    }
    registry.register_tree(schema);

    let mut patterns = HashMap::new();
    let mut failure = None;
    let mut check = |s: &Schema| {
        if failure.is_some() {
            return true;
        }
        let mut sources: Vec<&String> = Vec::new();
        match s {
            Schema::String(StringSchema {
                pattern: Some(p), ..
            }) => sources.push(p),
            Schema::Object(o) => sources.extend(o.pattern_properties.keys()),
            Schema::Ref(r) if !registry.contains(&r.reference) => {
                failure = Some(SchemaError::UnresolvedRef(r.reference.clone()));
            }
            _ => {}
        }
        for p in sources {
            if patterns.contains_key(p) {
                continue;
            }
            match Regex::new(p) {
                Ok(re) => {
                    patterns.insert(p.clone(), re);
                }
                Err(e) => {
                    failure = Some(SchemaError::InvalidPattern {
                        pattern: p.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        false
    };
    for def in definitions {
        walk_schema(def, None, &mut check);
    }
    walk_schema(schema, None, &mut check);

    match failure {
        Some(err) => Err(err),
        None => Ok(patterns),
    }
}

/// Validation context tracks state during validation
struct ValidationContext<'a> {
    registry: &'a SchemaRegistry<'a>,
    patterns: &'a HashMap<String, Regex>,
    instance_path: InstancePath,
    schema_path: Vec<String>,
    errors: Vec<ValidationError>,
}

impl<'a> ValidationContext<'a> {
    fn new(registry: &'a SchemaRegistry<'a>, patterns: &'a HashMap<String, Regex>) -> Self {
        Self {
            registry,
            patterns,
            instance_path: InstancePath::new(),
            schema_path: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// A fresh context at the same position, for trial validation
    fn branch(&self) -> Self {
        Self {
            registry: self.registry,
            patterns: self.patterns,
            instance_path: self.instance_path.clone(),
            schema_path: self.schema_path.clone(),
            errors: Vec::new(),
        }
    }

    fn add_error(&mut self, node: &AnnotatedParse, message: String) {
        self.errors.push(ValidationError {
            message,
            instance_path: self.instance_path.clone(),
            schema_path: self.schema_path.clone(),
            start: node.start,
            end: node.end,
        });
    }

    /// Report that `node` does not have the shape `schema` describes
    fn add_mismatch(&mut self, node: &AnnotatedParse, schema: &Schema, expected: &str) {
        let message = match &schema.annotations().error_message {
            Some(custom) => custom.clone(),
            None => format!(
                "{} has value {}, which must be {}",
                describe_location(&self.instance_path),
                node.result,
                schema
                    .annotations()
                    .description
                    .as_deref()
                    .unwrap_or(expected)
            ),
        };
        self.add_error(node, message);
    }

    fn with_instance_path<F, R>(&mut self, segment: PathSegment, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.instance_path.push(segment);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    fn with_schema_path<F, R>(&mut self, segment: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.schema_path.push(segment.into());
        let result = f(self);
        self.schema_path.pop();
        result
    }
}

fn describe_location(path: &InstancePath) -> String {
    match path.segments().last() {
        None => "Document".to_string(),
        Some(PathSegment::Key(k)) => format!("Field `{}`", k),
        Some(PathSegment::Index(i)) => format!("Item {} of `{}`", i, path),
    }
}

/// Main validation dispatcher; returns whether `value` conforms
fn validate_generic(value: &AnnotatedParse, schema: &Schema, context: &mut ValidationContext) -> bool {
    match schema {
        Schema::True | Schema::Any(_) => true,
        Schema::False => {
            let message = format!("{} is not allowed", describe_location(&context.instance_path));
            context.add_error(value, message);
            false
        }
        Schema::Boolean(_) => context.with_schema_path("boolean", |ctx| {
            expect_type(value, schema, "boolean", "a boolean", ctx)
        }),
        Schema::Number(s) => {
            context.with_schema_path("number", |ctx| validate_number(value, schema, s, ctx))
        }
        Schema::String(s) => {
            context.with_schema_path("string", |ctx| validate_string(value, schema, s, ctx))
        }
        Schema::Null(_) => context.with_schema_path("null", |ctx| {
            expect_type(value, schema, "null", "empty", ctx)
        }),
        Schema::Enum(s) => {
            context.with_schema_path("enum", |ctx| validate_enum(value, schema, s, ctx))
        }
        Schema::AnyOf(s) => context.with_schema_path("anyOf", |ctx| {
            validate_any_of(value, schema, &s.schemas, ctx)
        }),
        Schema::OneOf(s) => context.with_schema_path("oneOf", |ctx| {
            validate_one_of(value, schema, &s.schemas, ctx)
        }),
        Schema::AllOf(s) => context.with_schema_path("allOf", |ctx| {
            let mut ok = true;
            for subschema in &s.schemas {
                ok &= validate_generic(value, subschema, ctx);
            }
            ok
        }),
        Schema::Array(s) => {
            context.with_schema_path("array", |ctx| validate_array(value, schema, s, ctx))
        }
        Schema::Object(s) => {
            context.with_schema_path("object", |ctx| validate_object(value, schema, s, ctx))
        }
        Schema::Ref(r) => match context.registry.resolve(schema) {
            Ok(resolved) => context.with_schema_path(r.reference.clone(), |ctx| {
                validate_generic(value, resolved, ctx)
            }),
            Err(e) => {
                context.add_error(value, e.to_string());
                false
            }
        },
    }
}

fn expect_type(
    value: &AnnotatedParse,
    schema: &Schema,
    json_type: &str,
    expected: &str,
    context: &mut ValidationContext,
) -> bool {
    if value_type_name(&value.result) == json_type {
        true
    } else {
        context.add_mismatch(value, schema, expected);
        false
    }
}

fn validate_number(
    value: &AnnotatedParse,
    schema: &Schema,
    s: &NumberSchema,
    context: &mut ValidationContext,
) -> bool {
    let expected = if s.integer { "an integer" } else { "a number" };
    let Some(num) = value.result.as_f64() else {
        context.add_mismatch(value, schema, expected);
        return false;
    };

    let mut problems = Vec::new();
    if s.integer && num.fract() != 0.0 {
        problems.push("an integer".to_string());
    }
    if let Some(min) = s.minimum
        && num < min
    {
        problems.push(format!("at least {}", min));
    }
    if let Some(max) = s.maximum
        && num > max
    {
        problems.push(format!("at most {}", max));
    }
    if let Some(min) = s.exclusive_minimum
        && num <= min
    {
        problems.push(format!("greater than {}", min));
    }
    if let Some(max) = s.exclusive_maximum
        && num >= max
    {
        problems.push(format!("less than {}", max));
    }
    if let Some(multiple) = s.multiple_of
        && (num % multiple).abs() > f64::EPSILON
    {
        problems.push(format!("a multiple of {}", multiple));
    }

    match problems.first() {
        Some(problem) => {
            context.add_mismatch(value, schema, problem);
            false
        }
        None => true,
    }
}

fn validate_string(
    value: &AnnotatedParse,
    schema: &Schema,
    s: &StringSchema,
    context: &mut ValidationContext,
) -> bool {
    let Some(text) = value.result.as_str() else {
        context.add_mismatch(value, schema, "a string");
        return false;
    };
    let length = text.chars().count();

    if let Some(min) = s.min_length
        && length < min
    {
        context.add_mismatch(value, schema, &format!("at least {} characters long", min));
        return false;
    }
    if let Some(max) = s.max_length
        && length > max
    {
        context.add_mismatch(value, schema, &format!("at most {} characters long", max));
        return false;
    }
    if let Some(pattern) = &s.pattern
        && let Some(re) = context.patterns.get(pattern)
        && !re.is_match(text)
    {
        context.add_mismatch(value, schema, &format!("a string matching {}", pattern));
        return false;
    }
    true
}

fn validate_enum(
    value: &AnnotatedParse,
    schema: &Schema,
    s: &EnumSchema,
    context: &mut ValidationContext,
) -> bool {
    if s.values.contains(&value.result) {
        return true;
    }
    let allowed: Vec<String> = s.values.iter().map(Value::to_string).collect();
    context.add_mismatch(value, schema, &format!("one of {}", allowed.join(", ")));
    false
}

/// Validate anyOf (at least one schema must match).
///
/// When every branch fails, errors from branches that accepted the value's
/// shape (and failed only deeper inside it) are preferred, since they point
/// at the actual mistake. Otherwise a single error lists what was expected.
fn validate_any_of(
    value: &AnnotatedParse,
    schema: &Schema,
    branches: &[Schema],
    context: &mut ValidationContext,
) -> bool {
    let depth = context.instance_path.len();
    let mut best: Option<Vec<ValidationError>> = None;

    for branch in branches {
        let mut sub_context = context.branch();
        if validate_generic(value, branch, &mut sub_context) {
            return true;
        }
        let deeper = sub_context
            .errors
            .iter()
            .all(|e| e.instance_path.len() > depth);
        let better = match &best {
            Some(current) => sub_context.errors.len() < current.len(),
            None => true,
        };
        if deeper && better {
            best = Some(sub_context.errors);
        }
    }

    match best {
        Some(errors) => context.errors.extend(errors),
        None => {
            let expected = describe_alternatives(branches, context.registry);
            context.add_mismatch(value, schema, &expected);
        }
    }
    false
}

fn validate_one_of(
    value: &AnnotatedParse,
    schema: &Schema,
    branches: &[Schema],
    context: &mut ValidationContext,
) -> bool {
    let matching = branches
        .iter()
        .filter(|branch| validate_generic(value, branch, &mut context.branch()))
        .count();
    match matching {
        1 => true,
        0 => validate_any_of(value, schema, branches, context),
        _ => {
            context.add_mismatch(value, schema, "exactly one of the allowed alternatives");
            false
        }
    }
}

fn validate_array(
    value: &AnnotatedParse,
    schema: &Schema,
    s: &ArraySchema,
    context: &mut ValidationContext,
) -> bool {
    if !value.kind.is_sequence() {
        context.add_mismatch(value, schema, "an array");
        return false;
    }
    let items = &value.components;
    let mut ok = true;

    if let Some(min) = s.min_items
        && items.len() < min
    {
        context.add_mismatch(value, schema, &format!("an array with at least {} items", min));
        ok = false;
    }
    if let Some(max) = s.max_items
        && items.len() > max
    {
        context.add_mismatch(value, schema, &format!("an array with at most {} items", max));
        ok = false;
    }
    if s.unique_items == Some(true) {
        let mut seen = HashSet::new();
        if !items.iter().all(|item| seen.insert(item.result.to_string())) {
            context.add_mismatch(value, schema, "an array of unique items");
            ok = false;
        }
    }

    if let Some(item_schema) = &s.items {
        for (i, item) in items.iter().enumerate() {
            ok &= context.with_instance_path(PathSegment::Index(i), |ctx| {
                validate_generic(item, item_schema, ctx)
            });
        }
    }
    ok
}

fn validate_object(
    value: &AnnotatedParse,
    schema: &Schema,
    s: &ObjectSchema,
    context: &mut ValidationContext,
) -> bool {
    if !value.kind.is_mapping() {
        context.add_mismatch(value, schema, "an object");
        return false;
    }
    let mut ok = true;
    let keys: HashSet<String> = value.entries().map(|(k, _)| k.key_text()).collect();

    for required in &s.required {
        if !keys.contains(required) {
            let message = format!(
                "{} is missing required property `{}`",
                describe_location(&context.instance_path),
                required
            );
            context.add_error(value, message);
            ok = false;
        }
    }
    if let Some(min) = s.min_properties
        && keys.len() < min
    {
        context.add_mismatch(value, schema, &format!("an object with at least {} properties", min));
        ok = false;
    }
    if let Some(max) = s.max_properties
        && keys.len() > max
    {
        context.add_mismatch(value, schema, &format!("an object with at most {} properties", max));
        ok = false;
    }

    for (key_node, value_node) in value.entries() {
        let key = key_node.key_text();

        if let Some(names) = &s.property_names {
            ok &= context.with_schema_path("propertyNames", |ctx| {
                validate_generic(key_node, names, ctx)
            });
        }

        let property_schema = s.properties.get(&key).or_else(|| {
            let mut patterns: Vec<(&String, &Schema)> = s.pattern_properties.iter().collect();
            patterns.sort_by(|a, b| a.0.cmp(b.0));
            patterns.into_iter().find_map(|(pattern, property)| {
                context
                    .patterns
                    .get(pattern)
                    .filter(|re| re.is_match(&key))
                    .map(|_| property)
            })
        });

        match (property_schema, &s.additional_properties) {
            (Some(property), _) => {
                ok &= context.with_instance_path(PathSegment::Key(key), |ctx| {
                    validate_generic(value_node, property, ctx)
                });
            }
            (None, _) if s.rejects_additional() => {
                let message = format!("property name `{}` is not allowed", key);
                context.add_error(key_node, message);
                ok = false;
            }
            (None, Some(additional)) => {
                ok &= context.with_instance_path(PathSegment::Key(key), |ctx| {
                    validate_generic(value_node, additional, ctx)
                });
            }
            (None, None) => {}
        }
    }
    ok
}

fn describe_alternatives(branches: &[Schema], registry: &SchemaRegistry<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    for branch in branches {
        let resolved = registry.resolve(branch).unwrap_or(branch);
        let part = match &resolved.annotations().description {
            Some(d) => d.clone(),
            None => article_type(resolved).to_string(),
        };
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    parts.join(" or ")
}

fn article_type(schema: &Schema) -> &'static str {
    match schema {
        Schema::Boolean(_) => "a boolean",
        Schema::Number(n) if n.integer => "an integer",
        Schema::Number(_) => "a number",
        Schema::String(_) => "a string",
        Schema::Null(_) => "empty",
        Schema::Enum(_) => "one of the allowed values",
        Schema::Array(_) => "an array",
        Schema::Object(_) => "an object",
        Schema::False => "nothing",
        Schema::True
        | Schema::Any(_)
        | Schema::AnyOf(_)
        | Schema::OneOf(_)
        | Schema::AllOf(_)
        | Schema::Ref(_) => "a valid value",
    }
}

/// JSON type name of a decoded value
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
