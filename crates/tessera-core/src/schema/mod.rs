//! Schema nodes and the composition algebra.
//!
//! A [`Schema`] is a closed tree of [`SchemaKind`] variants. Endpoints and
//! middlewares declare their inputs and outputs with it; the engine validates
//! requests through [`Schema::parse`] and the documentation generator walks
//! the same tree without ever running effects.
//!
//! # Example
//!
//! ```
//! use tessera_core::schema::{ObjectSchema, Schema};
//! use serde_json::json;
//!
//! let input = Schema::object(
//!     ObjectSchema::new()
//!         .field("id", Schema::integer().coerce().describe("User id"))
//!         .field("name", Schema::string().optional()),
//! );
//!
//! let parsed = input.parse(&json!({"id": "42"})).unwrap();
//! assert_eq!(parsed, json!({"id": 42}));
//! ```

mod algebra;
mod compat;
mod fingerprint;
mod meta;
mod parse;

pub use algebra::{
    copy_metadata, final_input_schema, flatten_to_object_variants, intersect, union, SchemaError,
};
pub use fingerprint::digest;
pub use meta::Metadata;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate used by refinements and custom leaves.
pub type CheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Value transformation applied after successful validation.
pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// A user-supplied step wrapped around a schema.
///
/// Effects only run during request validation, never during introspection.
#[derive(Clone)]
pub enum Effect {
    /// Extra check on the validated value.
    Refine {
        /// The predicate.
        check: CheckFn,
        /// Message reported when the predicate fails.
        message: String,
    },
    /// Replaces the validated value.
    Transform(TransformFn),
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refine { message, .. } => f
                .debug_struct("Refine")
                .field("message", message)
                .finish_non_exhaustive(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// How an object treats keys it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Drop undeclared keys from the output.
    #[default]
    Strip,
    /// Keep undeclared keys as they are.
    Passthrough,
    /// Reject undeclared keys.
    Strict,
}

/// Value kinds that have no JSON encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unrepresentable {
    /// Arbitrary precision integers.
    BigInt,
    /// Native date objects.
    Date,
    /// Functions.
    Function,
    /// Symbols.
    Symbol,
}

impl Unrepresentable {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BigInt => "bigint",
            Self::Date => "date",
            Self::Function => "function",
            Self::Symbol => "symbol",
        }
    }
}

/// A named leaf validated by a user predicate.
#[derive(Clone)]
pub struct CustomSchema {
    name: String,
    check: CheckFn,
    json_compatible: bool,
}

impl CustomSchema {
    /// Returns the name of this custom type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether values of this type survive JSON encoding.
    #[must_use]
    pub const fn is_json_compatible(&self) -> bool {
        self.json_compatible
    }

    pub(crate) fn accepts(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for CustomSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSchema")
            .field("name", &self.name)
            .field("json_compatible", &self.json_compatible)
            .finish_non_exhaustive()
    }
}

/// An object with named fields.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, Schema>,
    unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// Creates an empty object schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.insert(name.into(), schema);
        self
    }

    /// Rejects undeclared keys.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    /// Keeps undeclared keys.
    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    /// Returns the declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, Schema> {
        &self.fields
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields.get(name)
    }

    /// Returns the unknown-keys policy.
    #[must_use]
    pub const fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    /// Returns a copy without the named fields.
    #[must_use]
    pub fn without(&self, names: &[String]) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|(name, _)| !names.contains(name))
                .map(|(name, schema)| (name.clone(), schema.clone()))
                .collect(),
            unknown_keys: self.unknown_keys,
        }
    }

    pub(crate) fn fields_mut(&mut self) -> &mut IndexMap<String, Schema> {
        &mut self.fields
    }
}

/// The closed set of schema node kinds.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Accepts anything, including a missing value.
    Any,
    /// A string.
    String {
        /// Convert numbers and booleans to strings.
        coerce: bool,
    },
    /// A number.
    Number {
        /// Reject non-integral values.
        integer: bool,
        /// Parse numbers from strings and booleans.
        coerce: bool,
    },
    /// A boolean.
    Boolean {
        /// Convert any value by truthiness.
        coerce: bool,
    },
    /// Exactly one JSON value.
    Literal(Value),
    /// One of a fixed set of strings.
    Enum(Vec<String>),
    /// An array of items.
    Array(Box<Schema>),
    /// An object with named fields.
    Object(ObjectSchema),
    /// The wrapped schema, or a missing value.
    Optional(Box<Schema>),
    /// The wrapped schema, or `null`.
    Nullable(Box<Schema>),
    /// The first matching variant.
    Union(Vec<Schema>),
    /// Both schemas; outputs are merged.
    Intersection(Box<Schema>, Box<Schema>),
    /// Object variants selected by the literal value of one field.
    DiscriminatedUnion {
        /// The selecting field.
        discriminator: String,
        /// The candidate variants.
        variants: Vec<ObjectSchema>,
    },
    /// A schema wrapped with a refinement or transformation.
    Effect {
        /// The wrapped schema.
        inner: Box<Schema>,
        /// The effect.
        effect: Effect,
    },
    /// Binary payloads such as uploaded files or raw bodies.
    Binary,
    /// A named leaf checked by a user predicate.
    Custom(CustomSchema),
    /// A value kind with no JSON encoding.
    Unrepresentable(Unrepresentable),
}

/// A schema node: a kind plus documentation metadata.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: SchemaKind,
    meta: Metadata,
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Self::object(object)
    }
}

impl Schema {
    /// Wraps a kind with empty metadata.
    #[must_use]
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            meta: Metadata::default(),
        }
    }

    /// Accepts anything.
    #[must_use]
    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    /// A string.
    #[must_use]
    pub fn string() -> Self {
        Self::new(SchemaKind::String { coerce: false })
    }

    /// A number.
    #[must_use]
    pub fn number() -> Self {
        Self::new(SchemaKind::Number {
            integer: false,
            coerce: false,
        })
    }

    /// An integral number.
    #[must_use]
    pub fn integer() -> Self {
        Self::new(SchemaKind::Number {
            integer: true,
            coerce: false,
        })
    }

    /// A boolean.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean { coerce: false })
    }

    /// Exactly the given value.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(SchemaKind::Literal(value.into()))
    }

    /// One of the given strings.
    #[must_use]
    pub fn enumeration<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(SchemaKind::Enum(options.into_iter().map(Into::into).collect()))
    }

    /// An array of `items`.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::new(SchemaKind::Array(Box::new(items)))
    }

    /// An object.
    #[must_use]
    pub fn object(object: ObjectSchema) -> Self {
        Self::new(SchemaKind::Object(object))
    }

    /// An object without fields.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::object(ObjectSchema::new())
    }

    /// Object variants selected by `discriminator`.
    #[must_use]
    pub fn discriminated_union(
        discriminator: impl Into<String>,
        variants: Vec<ObjectSchema>,
    ) -> Self {
        Self::new(SchemaKind::DiscriminatedUnion {
            discriminator: discriminator.into(),
            variants,
        })
    }

    /// A binary payload.
    #[must_use]
    pub fn binary() -> Self {
        Self::new(SchemaKind::Binary)
    }

    /// The shape of a non-JSON request body: `{ raw: <binary> }`.
    #[must_use]
    pub fn raw() -> Self {
        Self::object(ObjectSchema::new().field("raw", Self::binary()))
    }

    /// A named leaf checked by `check`.
    #[must_use]
    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(SchemaKind::Custom(CustomSchema {
            name: name.into(),
            check: Arc::new(check),
            json_compatible: true,
        }))
    }

    /// A value kind with no JSON encoding.
    #[must_use]
    pub fn unrepresentable(kind: Unrepresentable) -> Self {
        Self::new(SchemaKind::Unrepresentable(kind))
    }

    /// Marks a custom leaf as having no JSON encoding. Other kinds are unchanged.
    #[must_use]
    pub fn non_json(mut self) -> Self {
        if let SchemaKind::Custom(custom) = &mut self.kind {
            custom.json_compatible = false;
        }
        self
    }

    /// Allows the value to be missing.
    #[must_use]
    pub fn optional(self) -> Self {
        Self::new(SchemaKind::Optional(Box::new(self)))
    }

    /// Allows the value to be `null`.
    #[must_use]
    pub fn nullable(self) -> Self {
        Self::new(SchemaKind::Nullable(Box::new(self)))
    }

    /// Intersects with `other`.
    #[must_use]
    pub fn and(self, other: Schema) -> Self {
        intersect(self, other)
    }

    /// Enables coercion on string, number and boolean leaves.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        match &mut self.kind {
            SchemaKind::String { coerce }
            | SchemaKind::Number { coerce, .. }
            | SchemaKind::Boolean { coerce } => *coerce = true,
            _ => {}
        }
        self
    }

    /// Adds a refinement.
    #[must_use]
    pub fn refine<F>(self, check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(SchemaKind::Effect {
            inner: Box::new(self),
            effect: Effect::Refine {
                check: Arc::new(check),
                message: message.into(),
            },
        })
    }

    /// Adds a transformation.
    #[must_use]
    pub fn transform<F>(self, transform: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::new(SchemaKind::Effect {
            inner: Box::new(self),
            effect: Effect::Transform(Arc::new(transform)),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// Appends an example value.
    #[must_use]
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.meta.examples.push(example.into());
        self
    }

    /// Marks the node as deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.meta.deprecated = true;
        self
    }

    /// Sets the value used when the input omits this field.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.meta.default = Some(value.into());
        self
    }

    /// Replaces the metadata.
    #[must_use]
    pub fn with_metadata(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    /// Returns the node kind.
    #[must_use]
    pub const fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Returns the metadata.
    #[must_use]
    pub const fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.meta.description.as_deref()
    }

    /// Returns the examples.
    #[must_use]
    pub fn examples(&self) -> &[Value] {
        &self.meta.examples
    }

    /// Returns the object schema when this node is a plain object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns `true` for string, number and boolean leaves with coercion on.
    #[must_use]
    pub const fn has_coercion(&self) -> bool {
        matches!(
            self.kind,
            SchemaKind::String { coerce: true }
                | SchemaKind::Number { coerce: true, .. }
                | SchemaKind::Boolean { coerce: true }
        )
    }

    /// Returns `true` when validation succeeds on a missing value.
    ///
    /// Coerced leaves count as accepting a missing value: they pass it
    /// through untouched.
    #[must_use]
    pub fn accepts_missing(&self) -> bool {
        if self.meta.default.is_some() || self.has_coercion() {
            return true;
        }
        match &self.kind {
            SchemaKind::Any | SchemaKind::Optional(_) => true,
            SchemaKind::Effect { inner, .. } | SchemaKind::Nullable(inner) => {
                inner.accepts_missing()
            }
            SchemaKind::Union(variants) => variants.iter().any(Self::accepts_missing),
            SchemaKind::Intersection(left, right) => {
                left.accepts_missing() && right.accepts_missing()
            }
            _ => false,
        }
    }

    /// Returns `true` when validation succeeds on `null`.
    #[must_use]
    pub fn accepts_null(&self) -> bool {
        match &self.kind {
            SchemaKind::Any | SchemaKind::Nullable(_) => true,
            SchemaKind::Literal(value) => value.is_null(),
            SchemaKind::String { coerce } | SchemaKind::Boolean { coerce } => *coerce,
            SchemaKind::Number { coerce, .. } => *coerce,
            SchemaKind::Effect { inner, .. } | SchemaKind::Optional(inner) => inner.accepts_null(),
            SchemaKind::Union(variants) => variants.iter().any(Self::accepts_null),
            _ => false,
        }
    }

    pub(crate) fn meta_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }
}
