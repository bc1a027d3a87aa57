//! Factory call surface
//!
//! A [`Factory`] owns a configuration and a hook registry. Creation resolves
//! the delegation chain, then dispatches every applicable hook on the new
//! instance. The process-wide factory backs the crate-level functions.

use std::sync::LazyLock;

use tracing::debug;

use crate::blueprint::{Blueprint, ANONYMOUS_BLUEPRINT};
use crate::config::{ConfigError, FactoryConfig};
use crate::enforce::{ContractHook, InterfaceHook};
use crate::error::{LineageError, Result};
use crate::hooks::{Hook, HookRegistry};
use crate::instance::Instance;
use crate::mixin::MixinHook;
use crate::resolver::Resolver;
use crate::value::{Members, Value};

/// Arguments of one creation, as seen by the constructor hooks and every dispatched hook
#[derive(Debug, Clone, Default)]
pub struct CreateCall {
    args: Vec<Value>,
    extra: Option<Members>,
}

impl CreateCall {
    /// A call with no arguments and no extra properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the constructor arguments
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the extra properties composed onto the most-derived level
    pub fn extra(mut self, props: Members) -> Self {
        self.extra = Some(props);
        self
    }

    /// Constructor arguments
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Extra properties, if the caller supplied any
    pub fn extra_props(&self) -> Option<&Members> {
        self.extra.as_ref()
    }

    /// Check if the caller supplied extra properties
    pub fn has_extra(&self) -> bool {
        self.extra.is_some()
    }
}

/// Creates instances from blueprints and runs the hook pipeline on them
#[derive(Debug)]
pub struct Factory {
    config: FactoryConfig,
    hooks: HookRegistry,
}

static GLOBAL: LazyLock<Factory> = LazyLock::new(Factory::new);

impl Factory {
    /// Factory with the default configuration
    pub fn new() -> Self {
        Self::assemble(FactoryConfig::default())
    }

    /// Factory registering the builtin hooks the configuration selects
    ///
    /// The configuration is validated first. Mixins register first so
    /// mixed-in methods can satisfy interfaces and contracts, then
    /// interfaces, then contracts.
    pub fn with_config(config: FactoryConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config))
    }

    fn assemble(config: FactoryConfig) -> Self {
        let hooks = HookRegistry::new();
        if config.hooks.mixins {
            hooks.register(MixinHook);
        }
        if config.hooks.interface {
            hooks.register(InterfaceHook);
        }
        if config.hooks.contract {
            hooks.register(ContractHook);
        }
        Self { config, hooks }
    }

    /// The process-wide factory
    pub fn global() -> &'static Factory {
        &GLOBAL
    }

    /// Active configuration
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Registered hooks
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Append a hook; it runs after every hook registered before it
    pub fn register_hook(&self, hook: impl Hook + 'static) {
        self.hooks.register(hook);
    }

    /// Build an instance of `blueprint` and dispatch the hooks on it
    pub fn create(&self, blueprint: &Blueprint, call: CreateCall) -> Result<Instance> {
        let instance = Resolver::new(&self.config).build(blueprint, call.args(), call.extra_props())?;
        self.hooks.dispatch(&instance, &call)?;
        debug!(
            blueprint = blueprint.name(),
            instance = instance.id(),
            "created instance"
        );
        Ok(instance)
    }

    /// Positional form: `(blueprint | function | mapping, args | extraProps?, extraProps?)`
    pub fn create_from_values(&self, inputs: &[Value]) -> Result<Instance> {
        let (blueprint, call) = parse_inputs(inputs)?;
        self.create(&blueprint, call)
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_inputs(inputs: &[Value]) -> Result<(Blueprint, CreateCall)> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| LineageError::argument("create requires a blueprint, function or mapping"))?;
    if rest.len() > 2 {
        return Err(LineageError::argument(format!(
            "create accepts at most 3 inputs, got {}",
            inputs.len()
        )));
    }

    let blueprint = match first {
        Value::Blueprint(blueprint) => blueprint.clone(),
        Value::Function(function) => Blueprint::from_function(function),
        Value::Map(members) => Blueprint::from_members(ANONYMOUS_BLUEPRINT, members.clone())?,
        other => {
            return Err(LineageError::argument(format!(
                "first input must be a blueprint, function or mapping, got {}",
                other.kind_name()
            )))
        }
    };

    let second = rest.first().filter(|v| !v.is_nullish());
    let third = rest.get(1).filter(|v| !v.is_nullish());
    let mut call = CreateCall::new();

    match second {
        Some(Value::Array(args)) => {
            call.args = args.clone();
            match third {
                None => {}
                Some(Value::Map(props)) => call.extra = Some(props.clone()),
                Some(other) => {
                    return Err(LineageError::argument(format!(
                        "extra properties must be a mapping, got {}",
                        other.kind_name()
                    )))
                }
            }
        }
        Some(Value::Map(props)) => {
            if third.is_some() {
                return Err(LineageError::argument(
                    "no input may follow extra properties",
                ));
            }
            call.extra = Some(props.clone());
        }
        Some(other) => {
            return Err(LineageError::argument(format!(
                "second input must be an argument list or a mapping, got {}",
                other.kind_name()
            )))
        }
        None => {
            if third.is_some() {
                return Err(LineageError::argument(
                    "extra properties require an argument list before them",
                ));
            }
        }
    }
    Ok((blueprint, call))
}
