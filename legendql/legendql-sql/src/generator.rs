//! Process-wide registry of SQL string generators, keyed by database type.
//!
//! Built-in [Dialect]s are registered when the registry is first touched.
//! Hosts add their own with [register]. A lookup must match exactly one
//! provider; the instance it creates is cached and handed out for every later
//! lookup of the same tag.
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock, RwLock};

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::ast::QuerySpecification;
use crate::dialect::{Dialect, DialectExtension};
use crate::format::SqlToStringConfig;
use crate::{Error, Result};

pub trait SqlToStringGenerator: Debug + Send + Sync {
    fn database_type(&self) -> &str;

    fn db_extension(&self) -> &dyn DialectExtension;

    fn generate_sql_string(
        &self,
        query: &QuerySpecification,
        config: &SqlToStringConfig,
    ) -> Result<String> {
        log::trace!("generating {} sql", self.database_type());
        self.db_extension()
            .process_query_specification(query, config, false)
    }
}

/// Generator backed by one of the built-in dialects.
#[derive(Debug)]
pub struct DialectGenerator {
    database_type: String,
    extension: Box<dyn DialectExtension>,
}

impl DialectGenerator {
    pub fn new(dialect: Dialect) -> Self {
        DialectGenerator {
            database_type: dialect.to_string(),
            extension: dialect.extension(),
        }
    }
}

impl SqlToStringGenerator for DialectGenerator {
    fn database_type(&self) -> &str {
        &self.database_type
    }

    fn db_extension(&self) -> &dyn DialectExtension {
        self.extension.as_ref()
    }
}

type Factory = Box<dyn Fn() -> Arc<dyn SqlToStringGenerator> + Send + Sync>;

struct Provider {
    database_type: String,
    factory: Factory,
}

#[derive(Default)]
struct Registry {
    providers: Vec<Provider>,
    cache: HashMap<String, Arc<dyn SqlToStringGenerator>>,
}

impl Registry {
    fn with_builtin_dialects() -> Self {
        let mut registry = Registry::default();
        for dialect in Dialect::iter() {
            registry.providers.push(Provider {
                database_type: dialect.to_string(),
                factory: Box::new(move || Arc::new(DialectGenerator::new(dialect))),
            });
        }
        registry
    }
}

fn registry() -> &'static RwLock<Registry> {
    static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Registry::with_builtin_dialects()))
}

fn poisoned<T>(_: T) -> Error {
    Error::new_assert("sql generator registry lock is poisoned")
}

/// Registers a provider of generators for `database_type`.
///
/// Registering a second provider for a tag that already has one makes
/// lookups of that tag fail until the process restarts.
pub fn register<F>(database_type: &str, factory: F) -> Result<()>
where
    F: Fn() -> Arc<dyn SqlToStringGenerator> + Send + Sync + 'static,
{
    let mut registry = registry().write().map_err(poisoned)?;
    log::debug!("registering sql generator provider for {database_type}");
    registry.cache.remove(database_type);
    registry.providers.push(Provider {
        database_type: database_type.to_string(),
        factory: Box::new(factory),
    });
    Ok(())
}

/// Finds the generator for `database_type`.
pub fn find(database_type: &str) -> Result<Arc<dyn SqlToStringGenerator>> {
    {
        let registry = registry().read().map_err(poisoned)?;
        if let Some(generator) = registry.cache.get(database_type) {
            return Ok(generator.clone());
        }
    }

    let mut registry = registry().write().map_err(poisoned)?;
    // another thread may have won the race for the write lock
    if let Some(generator) = registry.cache.get(database_type) {
        return Ok(generator.clone());
    }

    let matching = registry
        .providers
        .iter()
        .filter(|p| p.database_type == database_type)
        .collect_vec();
    if matching.len() != 1 {
        return Err(Error::unknown_dialect(format!(
            "Found no (or multiple) sql to string generators for database type '{database_type}'. Found generators: [{}]",
            matching.iter().map(|p| &p.database_type).join(", ")
        )));
    }

    log::debug!("creating sql generator for {database_type}");
    let generator = (matching[0].factory)();
    registry
        .cache
        .insert(database_type.to_string(), generator.clone());
    Ok(generator)
}
