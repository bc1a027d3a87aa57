//! Bounding element and named element resolution

use std::borrow::Cow;
use std::sync::Arc;

use lineage_core::{
    Capability, CreateCall, Hook, HookMeta, Instance, LineageError, Members, Result, Value,
};
use tracing::debug;

use crate::markers::widget_abstract;

/// Member holding the bounding element selector
pub const BOUNDING_BOX_KEY: &str = "boundingBox";
/// Member mapping element names to selectors
pub const ELEMENTS_KEY: &str = "elements";
/// Own member receiving the resolved elements
pub const NODE_KEY: &str = "node";

/// Host element lookup
///
/// `context` is the bounding element when resolving named elements, and
/// `None` when resolving the bounding element itself.
pub trait QuerySelector: Send + Sync {
    /// Resolve `selector` to an element
    fn query(&self, selector: &Value, context: Option<&Value>) -> Result<Value>;
}

impl<F> QuerySelector for F
where
    F: Fn(&Value, Option<&Value>) -> Result<Value> + Send + Sync,
{
    fn query(&self, selector: &Value, context: Option<&Value>) -> Result<Value> {
        self(selector, context)
    }
}

/// Resolves the elements of every widget
pub struct WidgetBindingHook {
    query: Arc<dyn QuerySelector>,
}

static META: HookMeta = HookMeta {
    name: Cow::Borrowed("widget-binding"),
    description: Cow::Borrowed("Resolve the bounding element and named elements into `node`"),
};

impl WidgetBindingHook {
    /// Binder resolving elements through `query`
    pub fn new(query: Arc<dyn QuerySelector>) -> Self {
        Self { query }
    }
}

impl Hook for WidgetBindingHook {
    fn meta(&self) -> &HookMeta {
        &META
    }

    fn capability(&self) -> Capability {
        Capability::Lineage(widget_abstract().clone())
    }

    fn apply(&self, instance: &Instance, _call: &CreateCall) -> Result<()> {
        let bounding_selector = match instance.get(BOUNDING_BOX_KEY) {
            Some(value) if !value.is_undefined() => value,
            _ => {
                return Err(LineageError::argument(format!(
                    "Widget '{}' requires settings with a '{}' property",
                    instance.blueprint().name(),
                    BOUNDING_BOX_KEY
                )))
            }
        };

        let bounding_box = self.query.query(&bounding_selector, None)?;
        let mut node = Members::new();
        node.insert(BOUNDING_BOX_KEY, bounding_box.clone());

        if let Some(elements) = instance.get(ELEMENTS_KEY).and_then(|v| v.as_map().cloned()) {
            for (name, selector) in elements.iter() {
                node.insert(name, self.query.query(selector, Some(&bounding_box))?);
            }
        }

        debug!(
            widget = instance.blueprint().name(),
            elements = node.len(),
            "bound widget elements"
        );
        instance.set(NODE_KEY, node);
        Ok(())
    }
}
