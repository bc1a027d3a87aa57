//! Interface and contract declarations

use std::fmt;
use std::sync::Arc;

use crate::error::{LineageError, Result};
use crate::hint::{parse_slots, TypeHint};
use crate::instance::Instance;
use crate::method::Method;
use crate::value::Value;

const ON_ENTRY_KEY: &str = "onEntry";
const VALIDATORS_KEY: &str = "validators";
const ON_EXIT_KEY: &str = "onExit";

type PredicateFn = dyn Fn(&Instance, &Value) -> Result<bool> + Send + Sync;

/// Custom range check for one argument position
#[derive(Clone)]
pub struct Validator(Arc<PredicateFn>);

impl Validator {
    /// Validator from a plain predicate over the argument
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Validator(Arc::new(move |_, value| Ok(predicate(value))))
    }

    /// Validator calling a host method; a truthy result accepts the argument
    pub fn from_method(method: Method) -> Self {
        Validator(Arc::new(move |receiver, value| {
            Ok(method.invoke(receiver, std::slice::from_ref(value))?.is_truthy())
        }))
    }

    /// Run the check for a call on `receiver`
    pub fn check(&self, receiver: &Instance, value: &Value) -> Result<bool> {
        (self.0)(receiver, value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator")
    }
}

/// Required methods and their positional argument hints
#[derive(Debug, Clone, Default)]
pub struct Interface {
    methods: Vec<(String, Vec<Option<TypeHint>>)>,
}

impl Interface {
    /// Empty interface
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `name`, hinting its leading arguments in order
    pub fn method<I, H>(mut self, name: impl Into<String>, hints: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<TypeHint>,
    {
        let slots = hints.into_iter().map(|h| Some(h.into())).collect();
        self.methods.push((name.into(), slots));
        self
    }

    /// Declared methods in order
    pub fn methods(&self) -> impl Iterator<Item = (&str, &[Option<TypeHint>])> {
        self.methods.iter().map(|(name, slots)| (name.as_str(), slots.as_slice()))
    }

    /// Parse the mapping form: method name → sequence of hints
    pub fn from_value(value: &Value) -> Result<Self> {
        let table = value.as_map().ok_or_else(|| {
            LineageError::argument(format!(
                "'implements' must be a mapping of method names, got {}",
                value.kind_name()
            ))
        })?;
        let methods = table
            .iter()
            .map(|(name, declared)| {
                let slots = parse_slots(declared, &format!("Interface entry '{}'", name))?;
                Ok((name.to_string(), slots))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Interface { methods })
    }
}

/// Entry hints, validators and exit hint for one method
#[derive(Debug, Clone, Default)]
pub struct MethodContract {
    pub(crate) on_entry: Vec<Option<TypeHint>>,
    pub(crate) validators: Vec<Option<Validator>>,
    pub(crate) on_exit: Option<TypeHint>,
}

impl MethodContract {
    /// Contract with no checks
    pub fn new() -> Self {
        Self::default()
    }

    /// Hint the leading arguments in order
    pub fn on_entry<I, H>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<TypeHint>,
    {
        self.on_entry = hints.into_iter().map(|h| Some(h.into())).collect();
        self
    }

    /// Hint a single argument (0-based `index`)
    pub fn entry_at(mut self, index: usize, hint: impl Into<TypeHint>) -> Self {
        if self.on_entry.len() <= index {
            self.on_entry.resize(index + 1, None);
        }
        self.on_entry[index] = Some(hint.into());
        self
    }

    /// Attach a validator to a single argument (0-based `index`)
    pub fn validator(mut self, index: usize, validator: Validator) -> Self {
        if self.validators.len() <= index {
            self.validators.resize(index + 1, None);
        }
        self.validators[index] = Some(validator);
        self
    }

    /// Hint the return value
    pub fn on_exit(mut self, hint: impl Into<TypeHint>) -> Self {
        self.on_exit = Some(hint.into());
        self
    }

    pub(crate) fn entry_only(on_entry: Vec<Option<TypeHint>>) -> Self {
        Self {
            on_entry,
            ..Self::default()
        }
    }

    /// Parse either a bare hint sequence or an `onEntry`/`validators`/`onExit` record
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Array(_) => Ok(Self::entry_only(parse_slots(
                value,
                &format!("Contract entry '{}'", name),
            )?)),
            Value::Map(record) => {
                if let Some(key) = record
                    .keys()
                    .find(|key| ![ON_ENTRY_KEY, VALIDATORS_KEY, ON_EXIT_KEY].contains(key))
                {
                    return Err(LineageError::argument(format!(
                        "Contract entry '{}' has unknown key '{}'",
                        name, key
                    )));
                }

                let on_entry = match record.get(ON_ENTRY_KEY) {
                    Some(declared) if !declared.is_nullish() => {
                        parse_slots(declared, &format!("'{}' of contract entry '{}'", ON_ENTRY_KEY, name))?
                    }
                    _ => Vec::new(),
                };

                let validators = match record.get(VALIDATORS_KEY) {
                    Some(declared) if !declared.is_nullish() => parse_validators(name, declared)?,
                    _ => Vec::new(),
                };

                let on_exit = match record.get(ON_EXIT_KEY) {
                    Some(declared) => TypeHint::from_value(declared)?,
                    None => None,
                };

                Ok(MethodContract {
                    on_entry,
                    validators,
                    on_exit,
                })
            }
            other => Err(LineageError::argument(format!(
                "Contract entry '{}' must be a hint sequence or a record, got {}",
                name,
                other.kind_name()
            ))),
        }
    }
}

fn parse_validators(name: &str, declared: &Value) -> Result<Vec<Option<Validator>>> {
    let items = declared.as_array().ok_or_else(|| {
        LineageError::argument(format!(
            "'{}' of contract entry '{}' must be a sequence, got {}",
            VALIDATORS_KEY,
            name,
            declared.kind_name()
        ))
    })?;
    items
        .iter()
        .map(|item| match item {
            Value::Function(method) => Ok(Some(Validator::from_method(method.clone()))),
            other if other.is_nullish() => Ok(None),
            other => Err(LineageError::argument(format!(
                "Validators of contract entry '{}' must be functions, got {}",
                name,
                other.kind_name()
            ))),
        })
        .collect()
}

/// Method contracts keyed by method name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Contract {
    methods: Vec<(String, MethodContract)>,
}

impl Contract {
    /// Empty contract
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a full method contract
    pub fn method(mut self, name: impl Into<String>, contract: MethodContract) -> Self {
        self.methods.push((name.into(), contract));
        self
    }

    /// Shorthand for an entry-only contract
    pub fn entry<I, H>(self, name: impl Into<String>, hints: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<TypeHint>,
    {
        self.method(name, MethodContract::new().on_entry(hints))
    }

    /// Declared methods in order
    pub fn methods(&self) -> impl Iterator<Item = (&str, &MethodContract)> {
        self.methods.iter().map(|(name, contract)| (name.as_str(), contract))
    }

    /// Parse the mapping form: method name → hint sequence or record
    pub fn from_value(value: &Value) -> Result<Self> {
        let table = value.as_map().ok_or_else(|| {
            LineageError::argument(format!(
                "'contract' must be a mapping of method names, got {}",
                value.kind_name()
            ))
        })?;
        let methods = table
            .iter()
            .map(|(name, declared)| Ok((name.to_string(), MethodContract::from_value(name, declared)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Contract { methods })
    }
}
