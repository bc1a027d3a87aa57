//! Mixin application hook

use std::borrow::Cow;

use crate::error::Result;
use crate::factory::CreateCall;
use crate::hooks::{Capability, Hook, HookMeta};
use crate::instance::Instance;

/// Copies each declared trait onto the instance, in declaration order
///
/// Traits land in own members, so they shadow same-named chain members and
/// later traits override earlier ones. Undefined trait entries are skipped.
pub struct MixinHook;

static META: HookMeta = HookMeta {
    name: Cow::Borrowed("mixins"),
    description: Cow::Borrowed("Compose declared traits onto new instances"),
};

impl Hook for MixinHook {
    fn meta(&self) -> &HookMeta {
        &META
    }

    fn capability(&self) -> Capability {
        Capability::DeclaresMixins
    }

    fn apply(&self, instance: &Instance, _call: &CreateCall) -> Result<()> {
        let Some(mixins) = instance.chain().nearest(|d| d.mixins.as_ref()) else {
            return Ok(());
        };
        for mixin in mixins {
            instance.compose_own(mixin, |value| !value.is_undefined());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Blueprint;
    use crate::factory::Factory;
    use crate::value::{Members, Value};

    #[test]
    fn test_later_mixin_wins() {
        let blueprint = Blueprint::builder("Silo")
            .member("ownProperty", "own")
            .mixin([("p", "a"), ("propertyA", "A")].into_iter().collect())
            .mixin([("p", "b"), ("propertyB", "B")].into_iter().collect())
            .build()
            .unwrap();
        let instance = Factory::new().create(&blueprint, CreateCall::new()).unwrap();

        assert_eq!(instance.get("p"), Some(Value::from("b")));
        assert_eq!(instance.get("ownProperty"), Some(Value::from("own")));
        assert_eq!(instance.get("propertyA"), Some(Value::from("A")));
        assert_eq!(instance.get("propertyB"), Some(Value::from("B")));
    }

    #[test]
    fn test_mixin_shadows_chain_member() {
        let base = Blueprint::builder("Base").member("greet", "base").build().unwrap();
        let derived = Blueprint::builder("Derived")
            .parent(&base)
            .mixin([("greet", "mixin")].into_iter().collect())
            .build()
            .unwrap();
        let instance = Factory::new().create(&derived, CreateCall::new()).unwrap();
        assert_eq!(instance.get("greet"), Some(Value::from("mixin")));
        assert!(instance.has_own("greet"));
    }

    #[test]
    fn test_undefined_never_overwrites() {
        let mut mixin = Members::new();
        mixin.insert("greet", Value::Undefined);
        let blueprint = Blueprint::builder("Keep")
            .member("greet", "chain")
            .mixin(mixin)
            .build()
            .unwrap();
        let instance = Factory::new().create(&blueprint, CreateCall::new()).unwrap();
        assert_eq!(instance.get("greet"), Some(Value::from("chain")));
    }

    #[test]
    fn test_inherited_mixins_apply() {
        let base = Blueprint::builder("Base")
            .mixin([("trait", true)].into_iter().collect())
            .build()
            .unwrap();
        let derived = Blueprint::builder("Derived").parent(&base).build().unwrap();
        let instance = Factory::new().create(&derived, CreateCall::new()).unwrap();
        assert!(instance.has_own("trait"));
    }
}
