//! Callable members

use std::fmt;
use std::sync::Arc;

use crate::enforce::GuardedMethod;
use crate::error::Result;
use crate::instance::Instance;
use crate::value::Value;

/// Signature of a native method body: receiver instance plus positional arguments
pub type NativeFn = dyn Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync;

enum MethodKind {
    Native(Box<NativeFn>),
    Guarded(GuardedMethod),
}

/// Shared callable stored as an instance member
///
/// A method is either a native body or a guard that owns another method and
/// checks arguments and return values around it.
#[derive(Clone)]
pub struct Method(Arc<MethodKind>);

impl Method {
    /// Wrap a native body
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Method(Arc::new(MethodKind::Native(Box::new(body))))
    }

    pub(crate) fn guarded(guard: GuardedMethod) -> Self {
        Method(Arc::new(MethodKind::Guarded(guard)))
    }

    /// Invoke with `receiver` as the instance the method was looked up on
    pub fn invoke(&self, receiver: &Instance, args: &[Value]) -> Result<Value> {
        match &*self.0 {
            MethodKind::Native(body) => body(receiver, args),
            MethodKind::Guarded(guard) => guard.invoke(receiver, args),
        }
    }

    /// Invoke without a receiver
    ///
    /// The body sees a fresh instance with no members, the way a host
    /// function used as a blueprint is called.
    pub fn call_detached(&self, args: &[Value]) -> Result<Value> {
        self.invoke(&Instance::detached(), args)
    }

    /// Whether this method is an enforcement wrapper
    pub fn is_guarded(&self) -> bool {
        matches!(&*self.0, MethodKind::Guarded(_))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            MethodKind::Native(_) => write!(f, "[function]"),
            MethodKind::Guarded(guard) => write!(f, "[function {} (guarded)]", guard.name()),
        }
    }
}
