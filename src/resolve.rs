use std::{collections::BTreeMap, fmt};

use crate::{model::Flag, BoxError};

/// Supplies a value for a flag before the command line is scanned.
///
/// A resolved value counts as set, so it satisfies `required`.
pub trait Resolver: fmt::Debug + Send + Sync {
    fn resolve(&self, flag: &Flag) -> Result<Option<String>, BoxError>;
}

/// A fixed map from flag name to value, e.g. a config file loaded upfront.
impl Resolver for BTreeMap<String, String> {
    fn resolve(&self, flag: &Flag) -> Result<Option<String>, BoxError> {
        Ok(self.get(&flag.name).cloned())
    }
}

/// Environment source for the `env` tag.
#[derive(Debug, Clone, Default)]
pub struct Env {
    fixed: Option<BTreeMap<String, String>>,
}

impl Env {
    /// The process environment.
    pub fn process() -> Env {
        Env { fixed: None }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        match &self.fixed {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Env {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Env {
        Env { fixed: Some(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()) }
    }
}

impl Resolver for Env {
    /// First variable of the flag's `env` list that is present.
    fn resolve(&self, flag: &Flag) -> Result<Option<String>, BoxError> {
        Ok(flag.envs.iter().find_map(|name| self.get(name)))
    }
}
