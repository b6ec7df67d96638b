//! Two-phase stack construction.
//!
//! Phase one collects declarations whose cross-references are still
//! unresolved [`Ref`](crate::decl::Ref)s. Phase two checks every reference,
//! parent and provider against the collected set and orders the graph so a
//! declaration always follows everything it points at.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::{
    decl::{Declaration, Kind, ResourceType},
    deps::{topo_sort, DepNode},
    error::{Result, StackError},
};

#[derive(Debug, Default)]
pub struct StackBuilder {
    name: String,
    decls: BTreeMap<String, Declaration>,
}

impl StackBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decls: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, decl: Declaration) -> Result<()> {
        if self.decls.contains_key(&decl.name) {
            return Err(StackError::DuplicateDeclaration { name: decl.name });
        }
        self.decls.insert(decl.name.clone(), decl);
        Ok(())
    }

    pub fn build(self) -> Result<Stack> {
        let mut nodes = Vec::with_capacity(self.decls.len());

        for decl in self.decls.values() {
            let mut requires = BTreeSet::new();

            for (field, r) in decl.references() {
                if !self.decls.contains_key(&r.resource) {
                    return Err(StackError::UnresolvedReference {
                        from: decl.name.clone(),
                        field: field.to_string(),
                        target: r.resource.clone(),
                    });
                }
                requires.insert(r.resource.clone());
            }

            if let Some(parent) = &decl.parent {
                if !self.decls.contains_key(parent) {
                    return Err(StackError::UnknownParent {
                        name: decl.name.clone(),
                        parent: parent.clone(),
                    });
                }
                requires.insert(parent.clone());
            }

            if let Some(provider) = &decl.provider {
                let is_provider = self
                    .decls
                    .get(provider)
                    .is_some_and(|p| p.kind == Kind::Provider);
                if !is_provider {
                    return Err(StackError::UnknownProvider {
                        name: decl.name.clone(),
                        provider: provider.clone(),
                    });
                }
                requires.insert(provider.clone());
            }

            nodes.push(DepNode {
                key: decl.name.clone(),
                requires,
            });
        }

        let order = topo_sort(&nodes)?;
        let deps: BTreeMap<String, BTreeSet<String>> =
            nodes.into_iter().map(|n| (n.key, n.requires)).collect();

        let mut decls = self.decls;
        let ordered: Vec<Declaration> = order
            .iter()
            .filter_map(|name| decls.remove(name))
            .collect();

        debug!(stack = %self.name, declarations = ordered.len(), "stack resolved");

        Ok(Stack {
            name: self.name,
            decls: ordered,
            deps,
        })
    }
}

/// Immutable, validated declaration set in dependency order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    name: String,
    decls: Vec<Declaration>,
    deps: BTreeMap<String, BTreeSet<String>>,
}

impl Stack {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every declaration after everything it references.
    pub fn declarations(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.decls.iter().find(|d| d.name == name)
    }

    pub fn dependencies_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.deps.get(name)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Declaration> {
        self.of_type(ResourceType::BucketObject)
    }

    pub fn of_type(&self, rtype: ResourceType) -> impl Iterator<Item = &Declaration> {
        self.decls.iter().filter(move |d| d.rtype == rtype)
    }
}
