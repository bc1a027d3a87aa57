//! Post-construction hook pipeline
//!
//! Hooks are registered into an append-only, ordered registry and run once
//! per created instance, in registration order. Each hook declares the
//! [`Capability`] an instance must expose; the registry checks it before
//! invoking the hook, so hooks never inspect instances they do not apply to.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::blueprint::Blueprint;
use crate::error::Result;
use crate::factory::CreateCall;
use crate::instance::Instance;

/// Static metadata for a hook
#[derive(Debug, Clone)]
pub struct HookMeta {
    /// Hook name, e.g. "contract"
    pub name: Cow<'static, str>,
    /// Human-readable description
    pub description: Cow<'static, str>,
}

/// What an instance must expose for a hook to run on it
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    /// Every instance
    Always,
    /// The chain declares `implements`
    DeclaresInterface,
    /// The chain declares `contract`
    DeclaresContract,
    /// The chain declares `mixins`
    DeclaresMixins,
    /// The chain includes the given blueprint
    Lineage(Blueprint),
}

impl Capability {
    /// Check the requirement against an instance
    pub fn is_satisfied_by(&self, instance: &Instance) -> bool {
        let chain = instance.chain();
        match self {
            Capability::Always => true,
            Capability::DeclaresInterface => chain.nearest(|d| d.implements.as_ref()).is_some(),
            Capability::DeclaresContract => chain.nearest(|d| d.contract.as_ref()).is_some(),
            Capability::DeclaresMixins => chain.nearest(|d| d.mixins.as_ref()).is_some(),
            Capability::Lineage(blueprint) => chain.contains(blueprint),
        }
    }
}

/// Trait every post-construction hook implements
pub trait Hook: Send + Sync {
    /// Static metadata for this hook
    fn meta(&self) -> &HookMeta;

    /// Requirement checked before [`Hook::apply`] runs
    fn capability(&self) -> Capability {
        Capability::Always
    }

    /// Inspect or mutate a freshly created instance
    fn apply(&self, instance: &Instance, call: &CreateCall) -> Result<()>;
}

type HookFn = dyn Fn(&Instance, &CreateCall) -> Result<()> + Send + Sync;

/// Closure-backed hook
pub struct FnHook {
    meta: HookMeta,
    capability: Capability,
    body: Box<HookFn>,
}

impl FnHook {
    /// Hook running on every instance
    pub fn new<F>(name: impl Into<Cow<'static, str>>, body: F) -> Self
    where
        F: Fn(&Instance, &CreateCall) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            meta: HookMeta {
                name: name.into(),
                description: Cow::Borrowed("closure hook"),
            },
            capability: Capability::Always,
            body: Box::new(body),
        }
    }

    /// Hook running only on instances whose chain includes `blueprint`
    pub fn for_lineage<F>(name: impl Into<Cow<'static, str>>, blueprint: &Blueprint, body: F) -> Self
    where
        F: Fn(&Instance, &CreateCall) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            capability: Capability::Lineage(blueprint.clone()),
            ..Self::new(name, body)
        }
    }
}

impl Hook for FnHook {
    fn meta(&self) -> &HookMeta {
        &self.meta
    }

    fn capability(&self) -> Capability {
        self.capability.clone()
    }

    fn apply(&self, instance: &Instance, call: &CreateCall) -> Result<()> {
        (self.body)(instance, call)
    }
}

/// Append-only ordered hook list
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn Hook>>>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook
    pub fn register(&self, hook: impl Hook + 'static) {
        self.register_arc(Arc::new(hook));
    }

    /// Append a shared hook; the same hook may be registered more than once
    pub fn register_arc(&self, hook: Arc<dyn Hook>) {
        debug!(hook = %hook.meta().name, "registering hook");
        self.hooks.write().push(hook);
    }

    /// Number of registered hooks
    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    /// Check if no hook is registered
    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    /// Hook names in registration order
    pub fn names(&self) -> Vec<String> {
        self.hooks.read().iter().map(|h| h.meta().name.to_string()).collect()
    }

    /// Run every applicable hook on `instance`, in registration order
    ///
    /// The list is snapshotted first, so hooks may register further hooks;
    /// those apply from the next creation on. The first error aborts dispatch.
    pub fn dispatch(&self, instance: &Instance, call: &CreateCall) -> Result<()> {
        let hooks: Vec<Arc<dyn Hook>> = self.hooks.read().clone();
        for hook in hooks {
            if !hook.capability().is_satisfied_by(instance) {
                continue;
            }
            trace!(hook = %hook.meta().name, instance = instance.id(), "dispatching hook");
            hook.apply(instance, call)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry").field("hooks", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Level;
    use crate::error::LineageError;
    use crate::instance::Chain;
    use crate::value::{Members, Value};
    use parking_lot::Mutex;

    fn instance_of(blueprint: &Blueprint) -> Instance {
        Instance::new(Chain::root(blueprint.clone(), Level::new(blueprint, Members::new())))
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = HookRegistry::new();
        for name in ["first", "second", "third"] {
            let log = log.clone();
            registry.register(FnHook::new(name, move |_, _| {
                log.lock().push(name);
                Ok(())
            }));
        }

        let instance = instance_of(&Blueprint::marker("Any", None));
        registry.dispatch(&instance, &CreateCall::new()).unwrap();
        registry.dispatch(&instance, &CreateCall::new()).unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first", "second", "third", "first", "second", "third"]
        );
        assert_eq!(registry.names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_capability_gates_dispatch() {
        let marker = Blueprint::marker("Marked", None);
        let registry = HookRegistry::new();
        registry.register(FnHook::for_lineage("tag", &marker, |instance, _| {
            instance.set("tagged", true);
            Ok(())
        }));

        let marked = instance_of(&marker);
        let other = instance_of(&Blueprint::marker("Other", None));
        registry.dispatch(&marked, &CreateCall::new()).unwrap();
        registry.dispatch(&other, &CreateCall::new()).unwrap();

        assert_eq!(marked.get("tagged"), Some(Value::Bool(true)));
        assert!(other.get("tagged").is_none());
    }

    #[test]
    fn test_error_stops_dispatch() {
        let registry = HookRegistry::new();
        registry.register(FnHook::new("fail", |_, _| Err(LineageError::raised("boom"))));
        registry.register(FnHook::new("after", |instance, _| {
            instance.set("after", true);
            Ok(())
        }));

        let instance = instance_of(&Blueprint::marker("Any", None));
        let err = registry.dispatch(&instance, &CreateCall::new()).unwrap_err();
        assert_eq!(err, LineageError::Raised("boom".to_string()));
        assert!(instance.get("after").is_none());
    }

    #[test]
    fn test_no_deduplication() {
        let hook: Arc<dyn Hook> = Arc::new(FnHook::new("same", |_, _| Ok(())));
        let registry = HookRegistry::new();
        registry.register_arc(hook.clone());
        registry.register_arc(hook);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_hook_sees_extra_props() {
        let registry = HookRegistry::new();
        registry.register(FnHook::new("extras", |instance, call| {
            instance.set("hadExtras", call.extra_props().is_some());
            Ok(())
        }));
        let instance = instance_of(&Blueprint::marker("Any", None));
        let call = CreateCall::new().extra([("x", 1)].into_iter().collect());
        registry.dispatch(&instance, &call).unwrap();
        assert_eq!(instance.get("hadExtras"), Some(Value::Bool(true)));
    }
}
