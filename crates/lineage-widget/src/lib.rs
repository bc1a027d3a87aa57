//! UI lifecycle binder for lineage instances
//!
//! Instances delegating to [`widget_abstract`] get their bounding element and
//! named elements resolved into a `node` member. Instances delegating to
//! [`base_abstract`] (widgets included) then run `init`, `renderUi`,
//! `bindUi` and `syncUi`, skipping the ones they do not define.

#![warn(missing_docs)]

pub mod binding;
pub mod lifecycle;
pub mod markers;

use std::sync::Arc;

use lineage_core::Factory;

pub use binding::{QuerySelector, WidgetBindingHook, BOUNDING_BOX_KEY, ELEMENTS_KEY, NODE_KEY};
pub use lifecycle::{LifecycleHook, LIFECYCLE_METHODS};
pub use markers::{base_abstract, widget_abstract};

/// Register the binder on `factory`; element binding runs before the lifecycle
pub fn install(factory: &Factory, query: impl QuerySelector + 'static) {
    factory.register_hook(WidgetBindingHook::new(Arc::new(query)));
    factory.register_hook(LifecycleHook);
}
