//! Delegation resolver
//!
//! Builds an instance bottom-up: the root ancestor is resolved first and each
//! descendant stacks its members on top, so every instance carries one
//! materialized member table. Every level receives the same constructor
//! arguments; extra properties only apply to the most-derived level, where
//! their reserved keys replace that level's declarations.

use tracing::debug;

use crate::blueprint::Blueprint;
use crate::config::FactoryConfig;
use crate::error::{LineageError, Result};
use crate::instance::{Chain, Instance};
use crate::value::{Members, Value};

pub(crate) struct Resolver<'a> {
    config: &'a FactoryConfig,
    visiting: Vec<Blueprint>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(config: &'a FactoryConfig) -> Self {
        Self {
            config,
            visiting: Vec::new(),
        }
    }

    pub(crate) fn build(
        &mut self,
        blueprint: &Blueprint,
        args: &[Value],
        extra: Option<&Members>,
    ) -> Result<Instance> {
        if self.config.detect_cycles && self.visiting.contains(blueprint) {
            let mut chain: Vec<String> = self.visiting.iter().map(|b| b.name().to_string()).collect();
            chain.push(blueprint.name().to_string());
            return Err(LineageError::CyclicDelegation { chain });
        }
        if self.visiting.len() >= self.config.max_chain_depth {
            let root = self.visiting.first().unwrap_or(blueprint);
            return Err(LineageError::ChainTooDeep {
                blueprint: root.name().to_string(),
                limit: self.config.max_chain_depth,
            });
        }
        self.visiting.push(blueprint.clone());

        let mut level = blueprint.produce(args)?;
        if let Some(extra) = extra {
            level.overlay(extra.clone())?;
        }

        let declarations = level.declarations.clone();
        let chain = match &declarations.parent {
            Some(parent) => {
                let parent = self.build(&parent.resolve(), args, None)?;
                Chain::derive(blueprint.clone(), &parent, level)
            }
            None => Chain::root(blueprint.clone(), level),
        };

        let instance = Instance::new(chain);
        debug!(
            blueprint = blueprint.name(),
            depth = instance.lineage().len(),
            instance = instance.id(),
            "resolved delegation level"
        );

        if let Some(hook) = &declarations.constructor_hook {
            hook.call(&instance, args)?;
        }
        Ok(instance)
    }
}
