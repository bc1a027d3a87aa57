//! Instances and their materialized delegation chains

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::blueprint::{Blueprint, Declarations, Level};
use crate::compose::{compose, compose_filtered};
use crate::error::{LineageError, Result};
use crate::value::{Members, Value};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

static DETACHED: LazyLock<Blueprint> = LazyLock::new(|| Blueprint::marker("Detached", None));

fn generate_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Resolved delegation chain of one instance
///
/// Built once, bottom-up, and never mutated afterwards. `table` holds the
/// members of every level flattened together, most-derived winning.
/// `declarations` runs parallel to `lineage` and holds what each level
/// declared for this construction.
#[derive(Debug)]
pub struct Chain {
    lineage: Vec<Blueprint>,
    declarations: Vec<Arc<Declarations>>,
    table: Members,
}

impl Chain {
    pub(crate) fn root(blueprint: Blueprint, level: Level) -> Self {
        Self {
            lineage: vec![blueprint],
            declarations: vec![level.declarations],
            table: level.members,
        }
    }

    /// Stack `level` on top of everything `parent` exposes
    pub(crate) fn derive(blueprint: Blueprint, parent: &Instance, level: Level) -> Self {
        let mut table = parent.flatten();
        compose(&mut table, &level.members);
        let parent_chain = parent.chain();
        let mut lineage = Vec::with_capacity(parent_chain.lineage.len() + 1);
        lineage.push(blueprint);
        lineage.extend(parent_chain.lineage.iter().cloned());
        let mut declarations = Vec::with_capacity(lineage.len());
        declarations.push(level.declarations);
        declarations.extend(parent_chain.declarations.iter().cloned());
        Self {
            lineage,
            declarations,
            table,
        }
    }

    /// Blueprints from most-derived to root
    pub fn lineage(&self) -> &[Blueprint] {
        &self.lineage
    }

    /// Flattened members of every level
    pub fn table(&self) -> &Members {
        &self.table
    }

    /// Chain membership test
    pub fn contains(&self, blueprint: &Blueprint) -> bool {
        self.lineage.iter().any(|b| b == blueprint)
    }

    /// First declaration found walking from the most-derived level up
    pub fn nearest<T>(&self, select: impl Fn(&Declarations) -> Option<&T>) -> Option<&T> {
        self.declarations.iter().find_map(|d| select(d.as_ref()))
    }
}

struct InstanceInner {
    id: u64,
    chain: Chain,
    own: RwLock<Members>,
}

/// Object produced by a factory
///
/// Member lookup checks own members first, then the resolved chain.
/// Writes always land in own members; the chain stays shared and read-only.
#[derive(Clone)]
pub struct Instance(Arc<InstanceInner>);

impl Instance {
    pub(crate) fn new(chain: Chain) -> Self {
        Instance(Arc::new(InstanceInner {
            id: generate_instance_id(),
            chain,
            own: RwLock::new(Members::new()),
        }))
    }

    /// Memberless instance outside any user chain, used as a stand-in receiver
    pub(crate) fn detached() -> Self {
        Instance::new(Chain::root(DETACHED.clone(), Level::new(&DETACHED, Members::new())))
    }

    /// Unique instance id
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Blueprint the instance was created from
    pub fn blueprint(&self) -> &Blueprint {
        &self.0.chain.lineage[0]
    }

    /// Resolved delegation chain
    pub fn chain(&self) -> &Chain {
        &self.0.chain
    }

    /// Blueprints from most-derived to root
    pub fn lineage(&self) -> &[Blueprint] {
        self.0.chain.lineage()
    }

    /// Whether `blueprint` is on this instance's delegation chain
    pub fn is_instance_of(&self, blueprint: &Blueprint) -> bool {
        self.0.chain.contains(blueprint)
    }

    /// Look up a member
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.0.own.read().get(name) {
            return Some(value.clone());
        }
        self.0.chain.table.get(name).cloned()
    }

    /// Whether a member is visible, own or inherited
    pub fn has(&self, name: &str) -> bool {
        self.0.own.read().contains_key(name) || self.0.chain.table.contains_key(name)
    }

    /// Set an own member
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.own.write().insert(name, value);
    }

    /// Remove an own member, revealing the chain's member of the same name
    pub fn remove_own(&self, name: &str) -> Option<Value> {
        self.0.own.write().remove(name)
    }

    /// Whether `name` is an own member
    pub fn has_own(&self, name: &str) -> bool {
        self.0.own.read().contains_key(name)
    }

    /// Own member names in insertion order
    pub fn own_keys(&self) -> Vec<String> {
        self.0.own.read().keys().map(str::to_string).collect()
    }

    /// Every visible member name: own first, then inherited
    pub fn keys(&self) -> Vec<String> {
        let own = self.0.own.read();
        let mut keys: Vec<String> = own.keys().map(str::to_string).collect();
        keys.extend(
            self.0
                .chain
                .table
                .keys()
                .filter(|key| !own.contains_key(key))
                .map(str::to_string),
        );
        keys
    }

    /// Call a member with this instance as receiver
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.get(name) {
            Some(Value::Function(method)) => method.invoke(self, args),
            _ => Err(LineageError::NotCallable {
                member: name.to_string(),
            }),
        }
    }

    /// Copy members onto own members, keeping only those accepted by `keep`
    pub(crate) fn compose_own(&self, src: &Members, keep: impl Fn(&Value) -> bool) {
        compose_filtered(&mut self.0.own.write(), src, keep);
    }

    /// Chain table with own members stacked on top
    pub(crate) fn flatten(&self) -> Members {
        let mut table = self.0.chain.table.clone();
        compose(&mut table, &self.0.own.read());
        table
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({}#{})", self.blueprint().name(), self.0.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    fn flat(name: &str, members: Members) -> Instance {
        let blueprint = Blueprint::marker(name, None);
        Instance::new(Chain::root(blueprint.clone(), Level::new(&blueprint, members)))
    }

    #[test]
    fn test_own_shadows_chain() {
        let instance = flat("Point", [("x", 1)].into_iter().collect());
        assert_eq!(instance.get("x"), Some(Value::Number(1.0)));
        assert!(!instance.has_own("x"));

        instance.set("x", 5);
        assert_eq!(instance.get("x"), Some(Value::Number(5.0)));
        assert!(instance.has_own("x"));

        instance.remove_own("x");
        assert_eq!(instance.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_keys_dedupe_own_and_inherited() {
        let instance = flat("Point", [("x", 1), ("y", 2)].into_iter().collect());
        instance.set("z", 3);
        instance.set("x", 4);
        assert_eq!(instance.keys(), vec!["z", "x", "y"]);
        assert_eq!(instance.own_keys(), vec!["z", "x"]);
    }

    #[test]
    fn test_call_passes_receiver() {
        let instance = flat(
            "Counter",
            [("count", Value::from(2)), (
                "double",
                Value::Function(Method::new(|this, _| {
                    let n = this.get("count").and_then(|v| v.as_number()).unwrap_or(0.0);
                    Ok(Value::Number(n * 2.0))
                })),
            )]
            .into_iter()
            .collect(),
        );
        assert_eq!(instance.call("double", &[]).unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_call_non_function() {
        let instance = flat("Point", [("x", 1)].into_iter().collect());
        assert_eq!(
            instance.call("x", &[]).unwrap_err(),
            LineageError::NotCallable { member: "x".to_string() }
        );
        assert!(instance.call("nope", &[]).is_err());
    }

    #[test]
    fn test_derive_stacks_levels() {
        let base = Blueprint::marker("Base", None);
        let parent = Instance::new(Chain::root(
            base.clone(),
            Level::new(&base, [("a", 1), ("b", 1)].into_iter().collect()),
        ));
        parent.set("c", 1);

        let child_bp = Blueprint::marker("Child", Some(&base));
        let child = Instance::new(Chain::derive(
            child_bp.clone(),
            &parent,
            Level::new(&child_bp, [("b", 2)].into_iter().collect()),
        ));

        assert_eq!(child.get("a"), Some(Value::Number(1.0)));
        assert_eq!(child.get("b"), Some(Value::Number(2.0)));
        assert_eq!(child.get("c"), Some(Value::Number(1.0)));
        assert!(child.is_instance_of(&base));
        assert!(child.is_instance_of(&child_bp));
        assert_eq!(child.blueprint(), &child_bp);
    }
}
