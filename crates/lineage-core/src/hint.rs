//! Type hints and the hint matcher
//!
//! A hint is either a primitive kind tag or a blueprint reference meaning
//! "an instance whose delegation chain includes this blueprint".

use std::fmt;
use std::str::FromStr;

use crate::blueprint::Blueprint;
use crate::error::{LineageError, Requirement, Result};
use crate::value::Value;

/// Primitive kind tags accepted in hint declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `function`
    Function,
    /// `array`
    Array,
}

impl PrimitiveKind {
    /// Every recognized kind
    pub const ALL: [PrimitiveKind; 5] = [
        PrimitiveKind::String,
        PrimitiveKind::Number,
        PrimitiveKind::Boolean,
        PrimitiveKind::Function,
        PrimitiveKind::Array,
    ];

    /// Tag as written in declarations
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Function => "function",
            PrimitiveKind::Array => "array",
        }
    }

    /// Runtime classification test
    ///
    /// Blueprints are constructors, so they classify as functions.
    pub fn test(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Number, Value::Number(_))
                | (PrimitiveKind::Boolean, Value::Bool(_))
                | (PrimitiveKind::Function, Value::Function(_) | Value::Blueprint(_))
                | (PrimitiveKind::Array, Value::Array(_))
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveKind {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LineageError::InvalidHint { hint: s.to_string() })
    }
}

/// Declared expectation for an argument or return value
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHint {
    /// Primitive kind test
    Kind(PrimitiveKind),
    /// Delegation-chain membership test
    Lineage(Blueprint),
}

impl TypeHint {
    /// Parse a kind tag
    pub fn parse(tag: &str) -> Result<Self> {
        tag.parse().map(TypeHint::Kind)
    }

    /// Interpret a declared hint value
    ///
    /// `undefined` and `null` declare no hint for that slot. A host function
    /// names the blueprint it backs.
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Undefined | Value::Null => Ok(None),
            Value::String(tag) => TypeHint::parse(tag).map(Some),
            Value::Blueprint(blueprint) => Ok(Some(TypeHint::Lineage(blueprint.clone()))),
            Value::Function(method) => Ok(Some(TypeHint::Lineage(Blueprint::from_function(method)))),
            other => Err(LineageError::InvalidHint {
                hint: format!("<{}>", other.kind_name()),
            }),
        }
    }

    /// Expected shape for diagnostics
    pub fn requirement(&self) -> Requirement {
        match self {
            TypeHint::Kind(kind) => Requirement::Kind(*kind),
            TypeHint::Lineage(blueprint) => Requirement::Lineage(blueprint.name().to_string()),
        }
    }
}

impl From<PrimitiveKind> for TypeHint {
    fn from(kind: PrimitiveKind) -> Self {
        TypeHint::Kind(kind)
    }
}

impl From<&Blueprint> for TypeHint {
    fn from(blueprint: &Blueprint) -> Self {
        TypeHint::Lineage(blueprint.clone())
    }
}

impl From<Blueprint> for TypeHint {
    fn from(blueprint: Blueprint) -> Self {
        TypeHint::Lineage(blueprint)
    }
}

/// Whether `value` satisfies `hint`
pub fn matches(value: &Value, hint: &TypeHint) -> bool {
    match hint {
        TypeHint::Kind(kind) => kind.test(value),
        TypeHint::Lineage(blueprint) => value
            .as_instance()
            .is_some_and(|instance| instance.is_instance_of(blueprint)),
    }
}

/// Match against a hint still in declared (value) form
///
/// Fails with [`LineageError::InvalidHint`] when the declaration is malformed.
pub fn matches_declared(value: &Value, hint: &Value) -> Result<bool> {
    Ok(match TypeHint::from_value(hint)? {
        Some(hint) => matches(value, &hint),
        None => true,
    })
}

/// Parse an ordered sequence of declared hints
pub(crate) fn parse_slots(declared: &Value, context: &str) -> Result<Vec<Option<TypeHint>>> {
    let items = declared.as_array().ok_or_else(|| {
        LineageError::argument(format!(
            "{} must be a sequence of type hints, got {}",
            context,
            declared.kind_name()
        ))
    })?;
    items.iter().map(TypeHint::from_value).collect()
}
