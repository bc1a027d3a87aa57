//! Interface and contract enforcement
//!
//! Both hooks resolve their declaration through the delegation chain (the
//! nearest declaring blueprint wins), fail at creation time when a declared
//! method is missing, and otherwise replace each declared method with a
//! [`guard::GuardedMethod`] that checks calls at invocation time.

mod declaration;
mod guard;

pub use declaration::{Contract, Interface, MethodContract, Validator};
pub(crate) use guard::GuardedMethod;

use std::borrow::Cow;

use crate::error::{GuardOrigin, Result};
use crate::factory::CreateCall;
use crate::hooks::{Capability, Hook, HookMeta};
use crate::instance::Instance;

/// Guards methods declared through `implements`
pub struct InterfaceHook;

static INTERFACE_META: HookMeta = HookMeta {
    name: Cow::Borrowed("interface"),
    description: Cow::Borrowed("Require declared methods and check argument hints"),
};

impl Hook for InterfaceHook {
    fn meta(&self) -> &HookMeta {
        &INTERFACE_META
    }

    fn capability(&self) -> Capability {
        Capability::DeclaresInterface
    }

    fn apply(&self, instance: &Instance, _call: &CreateCall) -> Result<()> {
        let Some(interface) = instance.chain().nearest(|d| d.implements.as_ref()) else {
            return Ok(());
        };
        for (name, hints) in interface.methods() {
            guard::install_guard(
                instance,
                name,
                GuardOrigin::Interface,
                MethodContract::entry_only(hints.to_vec()),
            )?;
        }
        Ok(())
    }
}

/// Guards methods declared through `contract`
pub struct ContractHook;

static CONTRACT_META: HookMeta = HookMeta {
    name: Cow::Borrowed("contract"),
    description: Cow::Borrowed("Check entry hints, validators and exit hints of declared methods"),
};

impl Hook for ContractHook {
    fn meta(&self) -> &HookMeta {
        &CONTRACT_META
    }

    fn capability(&self) -> Capability {
        Capability::DeclaresContract
    }

    fn apply(&self, instance: &Instance, _call: &CreateCall) -> Result<()> {
        let Some(contract) = instance.chain().nearest(|d| d.contract.as_ref()) else {
            return Ok(());
        };
        for (name, method_contract) in contract.methods() {
            guard::install_guard(instance, name, GuardOrigin::Contract, method_contract.clone())?;
        }
        Ok(())
    }
}
