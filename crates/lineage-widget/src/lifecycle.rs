//! Lifecycle sequence for base-derived instances

use std::borrow::Cow;

use lineage_core::{Capability, CreateCall, Hook, HookMeta, Instance, Result};
use tracing::trace;

use crate::markers::base_abstract;

/// Methods invoked on creation, in order
pub const LIFECYCLE_METHODS: [&str; 4] = ["init", "renderUi", "bindUi", "syncUi"];

/// Calls each lifecycle method the instance defines
pub struct LifecycleHook;

static META: HookMeta = HookMeta {
    name: Cow::Borrowed("lifecycle"),
    description: Cow::Borrowed("Call init, renderUi, bindUi and syncUi when defined"),
};

impl Hook for LifecycleHook {
    fn meta(&self) -> &HookMeta {
        &META
    }

    fn capability(&self) -> Capability {
        Capability::Lineage(base_abstract().clone())
    }

    fn apply(&self, instance: &Instance, _call: &CreateCall) -> Result<()> {
        for name in LIFECYCLE_METHODS {
            if instance.get(name).map_or(true, |v| v.is_undefined()) {
                continue;
            }
            trace!(method = name, instance = instance.id(), "lifecycle step");
            instance.call(name, &[])?;
        }
        Ok(())
    }
}
