//! Ready-made [`AccessGate`] implementations.

use std::collections::{BTreeMap, BTreeSet};

use crate::traits::AccessGate;

/// Grants every caller the configure capability on every entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessGate for AllowAll {
    fn has_permission(&self, _entity: &str) -> bool {
        true
    }
}

/// A fixed access list evaluated for one principal.
///
/// A principal may configure an entity when it appears in the global grant
/// list or in the grant list of the entity itself or of any enclosing folder
/// (`team` covers `team/app`). Anonymous callers are never granted anything.
#[derive(Debug, Clone, Default)]
pub struct StaticAcl {
    principal: Option<String>,
    global: BTreeSet<String>,
    entities: BTreeMap<String, BTreeSet<String>>,
}

impl StaticAcl {
    pub fn new(principal: Option<String>) -> Self {
        Self {
            principal,
            ..Self::default()
        }
    }

    /// Allow `user` to configure every entity.
    pub fn grant_all(mut self, user: impl Into<String>) -> Self {
        self.global.insert(user.into());
        self
    }

    /// Allow `user` to configure `entity` and everything below it.
    pub fn grant(mut self, entity: impl Into<String>, user: impl Into<String>) -> Self {
        self.entities
            .entry(entity.into())
            .or_default()
            .insert(user.into());
        self
    }

    fn granted_on(&self, entity: &str, user: &str) -> bool {
        let mut scope = entity;
        loop {
            if self
                .entities
                .get(scope)
                .is_some_and(|users| users.contains(user))
            {
                return true;
            }
            match scope.rfind('/') {
                Some(idx) => scope = &scope[..idx],
                None => return false,
            }
        }
    }
}

impl AccessGate for StaticAcl {
    fn has_permission(&self, entity: &str) -> bool {
        let Some(user) = self.principal.as_deref() else {
            return false;
        };
        self.global.contains(user) || self.granted_on(entity, user)
    }

    fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }
}
