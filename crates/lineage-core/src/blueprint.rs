//! Blueprints: member sources plus typed declarations
//!
//! A blueprint describes the members of the instances built from it and
//! carries optional declarations (parent, constructor hook, interface,
//! contract, mixins). Declarations are explicit fields; the plain-mapping
//! form with reserved keys is converted and validated by
//! [`Declarations::extract`], once in [`Blueprint::from_members`] and again
//! for every table a member function, host function or caller's extra
//! properties produce at creation time.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::compose::compose;
use crate::enforce::{Contract, Interface};
use crate::error::{LineageError, Result};
use crate::instance::Instance;
use crate::method::Method;
use crate::value::{Members, Value};

/// Reserved member key declaring the delegation parent
pub const PARENT_KEY: &str = "parent";
/// Reserved member key declaring the constructor hook
pub const CONSTRUCTOR_KEY: &str = "constructorHook";
/// Reserved member key declaring an interface
pub const IMPLEMENTS_KEY: &str = "implements";
/// Reserved member key declaring a contract
pub const CONTRACT_KEY: &str = "contract";
/// Reserved member key declaring mixins
pub const MIXINS_KEY: &str = "mixins";

/// All reserved member keys
pub const RESERVED_KEYS: [&str; 5] = [PARENT_KEY, CONSTRUCTOR_KEY, IMPLEMENTS_KEY, CONTRACT_KEY, MIXINS_KEY];

/// Name given to blueprints created from plain mappings and host functions
pub const ANONYMOUS_BLUEPRINT: &str = "Anonymous";

static NEXT_BLUEPRINT_ID: AtomicU64 = AtomicU64::new(1);

/// Blueprints backing host functions, keyed by function identity
///
/// Entries live for the process, which keeps each function's address
/// reserved for its blueprint.
static HOST_BLUEPRINTS: LazyLock<Mutex<FxHashMap<usize, Blueprint>>> = LazyLock::new(Default::default);

fn generate_blueprint_id() -> BlueprintId {
    BlueprintId(NEXT_BLUEPRINT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Process-unique blueprint identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlueprintId(u64);

impl BlueprintId {
    /// Raw identifier
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Callable member source: constructor arguments in, member table out
pub type MembersFn = dyn Fn(&[Value]) -> Result<Members> + Send + Sync;

/// Constructor hook body: the assembled instance plus constructor arguments
pub type ConstructorFn = dyn Fn(&Instance, &[Value]) -> Result<()> + Send + Sync;

enum MemberSource {
    Static(Members),
    Callable(Box<MembersFn>),
    /// Host function called without a receiver; must produce a mapping
    Host(Method),
}

/// Side-effecting initializer run on every freshly assembled level
#[derive(Clone)]
pub struct ConstructorHook(Arc<ConstructorFn>);

impl ConstructorHook {
    /// Wrap a native initializer
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        ConstructorHook(Arc::new(body))
    }

    /// Use a method as initializer, discarding its return value
    pub fn from_method(method: Method) -> Self {
        ConstructorHook::new(move |instance, args| method.invoke(instance, args).map(|_| ()))
    }

    /// Run the initializer
    pub fn call(&self, instance: &Instance, args: &[Value]) -> Result<()> {
        (self.0)(instance, args)
    }
}

impl fmt::Debug for ConstructorHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstructorHook")
    }
}

/// Delegation parent reference
#[derive(Clone)]
pub enum Parent {
    /// Parent known when the blueprint is declared
    Direct(Blueprint),
    /// Parent looked up at resolution time, for forward references
    Deferred(Arc<dyn Fn() -> Blueprint + Send + Sync>),
}

impl Parent {
    /// The parent blueprint
    pub fn resolve(&self) -> Blueprint {
        match self {
            Parent::Direct(blueprint) => blueprint.clone(),
            Parent::Deferred(lookup) => lookup(),
        }
    }
}

impl fmt::Debug for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Direct(blueprint) => f.debug_tuple("Direct").field(blueprint).finish(),
            Parent::Deferred(_) => write!(f, "Deferred"),
        }
    }
}

/// Typed declarations carried by a blueprint
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    /// Single delegation parent
    pub parent: Option<Parent>,
    /// Initializer run on the assembled level
    pub constructor_hook: Option<ConstructorHook>,
    /// Required methods with positional argument hints
    pub implements: Option<Interface>,
    /// Method contracts
    pub contract: Option<Contract>,
    /// Traits copied onto instances after construction
    pub mixins: Option<Vec<Members>>,
}

impl Declarations {
    /// Move reserved keys out of a plain mapping into typed declarations
    pub fn extract(members: &mut Members) -> Result<Self> {
        let parent = match members.remove(PARENT_KEY) {
            None => None,
            Some(value) if value.is_nullish() => None,
            Some(Value::Blueprint(blueprint)) => Some(Parent::Direct(blueprint)),
            Some(Value::Function(method)) => Some(Parent::Direct(Blueprint::from_function(&method))),
            Some(other) => {
                return Err(LineageError::argument(format!(
                    "'{}' must reference a blueprint or function, got {}",
                    PARENT_KEY,
                    other.kind_name()
                )))
            }
        };

        let constructor_hook = match members.remove(CONSTRUCTOR_KEY) {
            None => None,
            Some(value) if value.is_nullish() => None,
            Some(Value::Function(method)) => Some(ConstructorHook::from_method(method)),
            Some(other) => {
                return Err(LineageError::argument(format!(
                    "'{}' must be a function, got {}",
                    CONSTRUCTOR_KEY,
                    other.kind_name()
                )))
            }
        };

        let implements = match members.remove(IMPLEMENTS_KEY) {
            Some(value) if !value.is_nullish() => Some(Interface::from_value(&value)?),
            _ => None,
        };

        let contract = match members.remove(CONTRACT_KEY) {
            Some(value) if !value.is_nullish() => Some(Contract::from_value(&value)?),
            _ => None,
        };

        let mixins = match members.remove(MIXINS_KEY) {
            None => None,
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Map(mixin) => Some(mixin),
                        other => {
                            warn!(kind = other.kind_name(), "skipping mixin that is not a member mapping");
                            None
                        }
                    })
                    .collect(),
            ),
            Some(other) => {
                if !other.is_nullish() {
                    warn!(kind = other.kind_name(), "ignoring mixins declaration that is not a sequence");
                }
                None
            }
        };

        Ok(Declarations {
            parent,
            constructor_hook,
            implements,
            contract,
            mixins,
        })
    }

    /// Whether nothing is declared
    pub fn is_empty(&self) -> bool {
        self.parent.is_none()
            && self.constructor_hook.is_none()
            && self.implements.is_none()
            && self.contract.is_none()
            && self.mixins.is_none()
    }

    /// Stack `over` on top; every declaration it makes replaces this one's
    pub fn overlay(self, over: Declarations) -> Declarations {
        Declarations {
            parent: over.parent.or(self.parent),
            constructor_hook: over.constructor_hook.or(self.constructor_hook),
            implements: over.implements.or(self.implements),
            contract: over.contract.or(self.contract),
            mixins: over.mixins.or(self.mixins),
        }
    }
}

/// One delegation level being assembled: members plus effective declarations
///
/// Starts from the blueprint's own declarations; tables overlaid at creation
/// time may add or replace them for this construction only.
pub(crate) struct Level {
    pub(crate) members: Members,
    pub(crate) declarations: Arc<Declarations>,
}

impl Level {
    pub(crate) fn new(blueprint: &Blueprint, members: Members) -> Self {
        Level {
            members,
            declarations: blueprint.0.declarations.clone(),
        }
    }

    /// Compose `members` over this level, moving reserved keys into declarations
    pub(crate) fn overlay(&mut self, mut members: Members) -> Result<()> {
        let declared = Declarations::extract(&mut members)?;
        if !declared.is_empty() {
            self.declarations = Arc::new(Declarations::clone(&self.declarations).overlay(declared));
        }
        compose(&mut self.members, &members);
        Ok(())
    }
}

/// Fail when builder static members carry reserved keys
pub(crate) fn reject_reserved(members: &Members, context: &str) -> Result<()> {
    match RESERVED_KEYS.iter().find(|key| members.contains_key(key)) {
        Some(key) => Err(LineageError::argument(format!(
            "{} may not declare reserved member '{}'",
            context, key
        ))),
        None => Ok(()),
    }
}

struct BlueprintDef {
    id: BlueprintId,
    name: String,
    source: MemberSource,
    declarations: Arc<Declarations>,
}

/// Immutable, shared description of an object's members
///
/// Equality and hashing use the blueprint's identity, never its contents.
#[derive(Clone)]
pub struct Blueprint(Arc<BlueprintDef>);

impl Blueprint {
    /// Start declaring a blueprint
    pub fn builder(name: impl Into<String>) -> BlueprintBuilder {
        BlueprintBuilder::new(name)
    }

    /// Convert the plain-mapping form, extracting reserved keys
    pub fn from_members(name: impl Into<String>, mut members: Members) -> Result<Self> {
        let declarations = Declarations::extract(&mut members)?;
        Ok(Self::assemble(name.into(), MemberSource::Static(members), declarations))
    }

    /// Blueprint backed by a host function
    ///
    /// The function is called without a receiver and must return a member
    /// mapping, whose reserved keys declare this level. The same function
    /// always yields the same blueprint.
    pub fn from_function(function: &Method) -> Self {
        HOST_BLUEPRINTS
            .lock()
            .entry(function.addr())
            .or_insert_with(|| {
                Self::assemble(
                    ANONYMOUS_BLUEPRINT.to_string(),
                    MemberSource::Host(function.clone()),
                    Declarations::default(),
                )
            })
            .clone()
    }

    /// Memberless blueprint used purely as a lineage marker
    pub fn marker(name: impl Into<String>, parent: Option<&Blueprint>) -> Self {
        let declarations = Declarations {
            parent: parent.map(|p| Parent::Direct(p.clone())),
            ..Declarations::default()
        };
        Self::assemble(name.into(), MemberSource::Static(Members::new()), declarations)
    }

    fn assemble(name: String, source: MemberSource, declarations: Declarations) -> Self {
        Blueprint(Arc::new(BlueprintDef {
            id: generate_blueprint_id(),
            name,
            source,
            declarations: Arc::new(declarations),
        }))
    }

    /// Unique identity
    pub fn id(&self) -> BlueprintId {
        self.0.id
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Typed declarations
    pub fn declarations(&self) -> &Declarations {
        &self.0.declarations
    }

    /// Whether members are produced by a callable
    pub fn is_callable(&self) -> bool {
        matches!(self.0.source, MemberSource::Callable(_) | MemberSource::Host(_))
    }

    /// Produce a fresh level for one construction
    pub(crate) fn produce(&self, args: &[Value]) -> Result<Level> {
        match &self.0.source {
            MemberSource::Static(members) => Ok(Level::new(self, members.clone())),
            MemberSource::Callable(produce) => {
                let mut level = Level::new(self, Members::new());
                level.overlay(produce(args)?)?;
                Ok(level)
            }
            MemberSource::Host(function) => {
                let mut level = Level::new(self, Members::new());
                match function.call_detached(args)? {
                    Value::Map(members) => level.overlay(members)?,
                    value if value.is_nullish() => {}
                    other => {
                        return Err(LineageError::argument(format!(
                            "Blueprint function must produce a member mapping, got {}",
                            other.kind_name()
                        )))
                    }
                }
                Ok(level)
            }
        }
    }
}

impl PartialEq for Blueprint {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Blueprint {}

impl Hash for Blueprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blueprint({}#{})", self.0.name, self.0.id.0)
    }
}

/// Builder for [`Blueprint`]
pub struct BlueprintBuilder {
    name: String,
    members: Members,
    produce: Option<Box<MembersFn>>,
    declarations: Declarations,
}

impl BlueprintBuilder {
    /// Create a builder with no members and no declarations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Members::new(),
            produce: None,
            declarations: Declarations::default(),
        }
    }

    /// Add a static member
    pub fn member(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(key, value);
        self
    }

    /// Add a static method
    pub fn method<F>(self, key: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.member(key, Method::new(body))
    }

    /// Produce members from the constructor arguments instead of a static table
    ///
    /// The closure is the place for state private to one construction.
    pub fn members_fn<F>(mut self, produce: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Members> + Send + Sync + 'static,
    {
        self.produce = Some(Box::new(produce));
        self
    }

    /// Delegate to `parent`
    pub fn parent(mut self, parent: &Blueprint) -> Self {
        self.declarations.parent = Some(Parent::Direct(parent.clone()));
        self
    }

    /// Delegate to a parent looked up at resolution time
    pub fn parent_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn() -> Blueprint + Send + Sync + 'static,
    {
        self.declarations.parent = Some(Parent::Deferred(Arc::new(lookup)));
        self
    }

    /// Initializer run on the assembled instance with the constructor arguments
    pub fn constructor<F>(mut self, body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        self.declarations.constructor_hook = Some(ConstructorHook::new(body));
        self
    }

    /// Declare an interface
    pub fn implements(mut self, interface: Interface) -> Self {
        self.declarations.implements = Some(interface);
        self
    }

    /// Declare a contract
    pub fn contract(mut self, contract: Contract) -> Self {
        self.declarations.contract = Some(contract);
        self
    }

    /// Append a mixin
    pub fn mixin(mut self, mixin: Members) -> Self {
        self.declarations.mixins.get_or_insert_with(Vec::new).push(mixin);
        self
    }

    /// Finish the blueprint
    ///
    /// Fails when static members use a reserved key, or when both static
    /// members and a member-producing closure were given.
    pub fn build(self) -> Result<Blueprint> {
        reject_reserved(&self.members, &format!("Blueprint '{}'", self.name))?;
        let source = match self.produce {
            Some(produce) if self.members.is_empty() => MemberSource::Callable(produce),
            Some(_) => {
                return Err(LineageError::argument(format!(
                    "Blueprint '{}' declares both static members and a member function",
                    self.name
                )))
            }
            None => MemberSource::Static(self.members),
        };
        Ok(Blueprint::assemble(self.name, source, self.declarations))
    }
}
