//! Guarded method wrapper

use tracing::trace;

use super::declaration::MethodContract;
use crate::error::{GuardOrigin, LineageError, Result, ViolationKind};
use crate::hint::matches;
use crate::instance::Instance;
use crate::method::Method;
use crate::value::Value;

/// Wrapper owning the original callable and checking calls around it
///
/// Per call: each supplied, defined argument is checked against its entry
/// hint and then its validator; the original runs only if all pass; the
/// return value is checked against the exit hint last.
pub(crate) struct GuardedMethod {
    name: String,
    origin: GuardOrigin,
    contract: MethodContract,
    inner: Method,
}

impl GuardedMethod {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn invoke(&self, receiver: &Instance, args: &[Value]) -> Result<Value> {
        trace!(method = %self.name, origin = ?self.origin, argc = args.len(), "guarded call");

        for (index, arg) in args.iter().enumerate() {
            if arg.is_undefined() {
                continue;
            }
            if let Some(Some(hint)) = self.contract.on_entry.get(index) {
                if !matches(arg, hint) {
                    return Err(LineageError::TypeMismatch {
                        method: self.name.clone(),
                        position: index + 1,
                        requirement: hint.requirement(),
                        origin: self.origin,
                    });
                }
            }
            if let Some(Some(validator)) = self.contract.validators.get(index) {
                if !validator.check(receiver, arg)? {
                    return Err(LineageError::RangeViolation {
                        method: self.name.clone(),
                        position: index + 1,
                    });
                }
            }
        }

        let result = self.inner.invoke(receiver, args)?;

        if let Some(hint) = &self.contract.on_exit {
            if !matches(&result, hint) {
                return Err(LineageError::ReturnTypeMismatch {
                    method: self.name.clone(),
                    requirement: hint.requirement(),
                });
            }
        }
        Ok(result)
    }
}

/// Replace the instance's `name` member with a guarded wrapper around it
pub(crate) fn install_guard(
    instance: &Instance,
    name: &str,
    origin: GuardOrigin,
    contract: MethodContract,
) -> Result<()> {
    let inner = match instance.get(name) {
        Some(Value::Function(method)) => method,
        None | Some(Value::Undefined) => {
            return Err(LineageError::ContractViolation {
                kind: ViolationKind::MissingMethod,
                method: name.to_string(),
                origin,
            })
        }
        Some(_) => {
            return Err(LineageError::ContractViolation {
                kind: ViolationKind::NotCallable,
                method: name.to_string(),
                origin,
            })
        }
    };

    let guarded = GuardedMethod {
        name: name.to_string(),
        origin,
        contract,
        inner,
    };
    instance.set(name, Value::Function(Method::guarded(guarded)));
    Ok(())
}
