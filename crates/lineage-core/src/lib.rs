//! Lineage object composition engine
//!
//! This crate builds objects from declarative blueprints:
//! - Type hints for runtime argument checks (primitive kinds and chain membership)
//! - Last-write-wins member composition over ordered member tables
//! - Single-parent delegation chains, resolved bottom-up with cycle and depth limits
//! - An ordered, capability-checked post-construction hook pipeline
//! - Interface and contract enforcement through guarded method wrappers
//! - Ordered mixin application
//!
//! ```ignore
//! use lineage_core::{Blueprint, CreateCall, Factory, Interface, PrimitiveKind, Value};
//!
//! let greeter = Blueprint::builder("Greeter")
//!     .implements(Interface::new().method("greet", [PrimitiveKind::String]))
//!     .method("greet", |_, args| Ok(args[0].clone()))
//!     .build()?;
//! let instance = Factory::new().create(&greeter, CreateCall::new())?;
//! instance.call("greet", &[Value::from("hello")])?;
//! ```

#![warn(missing_docs)]

pub mod blueprint;
pub mod compose;
pub mod config;
pub mod enforce;
pub mod error;
pub mod factory;
pub mod hint;
pub mod hooks;
pub mod instance;
pub mod method;
pub mod mixin;
mod resolver;
pub mod value;

pub use blueprint::{
    Blueprint, BlueprintBuilder, BlueprintId, ConstructorHook, Declarations, Parent, ANONYMOUS_BLUEPRINT,
    RESERVED_KEYS,
};
pub use compose::compose;
pub use config::{BuiltinHooks, ConfigError, FactoryConfig};
pub use enforce::{Contract, ContractHook, Interface, InterfaceHook, MethodContract, Validator};
pub use error::{GuardOrigin, LineageError, Requirement, Result, ViolationKind};
pub use factory::{CreateCall, Factory};
pub use hint::{matches, PrimitiveKind, TypeHint};
pub use hooks::{Capability, FnHook, Hook, HookMeta, HookRegistry};
pub use instance::{Chain, Instance};
pub use method::Method;
pub use mixin::MixinHook;
pub use value::{Members, Value};

/// Create an instance through the process-wide factory
pub fn create(blueprint: &Blueprint, call: CreateCall) -> Result<Instance> {
    Factory::global().create(blueprint, call)
}

/// Positional creation through the process-wide factory
pub fn create_from_values(inputs: &[Value]) -> Result<Instance> {
    Factory::global().create_from_values(inputs)
}

/// Append a hook to the process-wide factory
pub fn register_hook(hook: impl Hook + 'static) {
    Factory::global().register_hook(hook);
}
