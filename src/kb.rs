//! Read-only knowledge-base capability.
//!
//! The evaluation engine never owns or mutates the knowledge base; it is an
//! injected, caller-owned collaborator. Lookup misses are not errors: an
//! entity id absent from the knowledge base is treated as type
//! [`TYPE_OTHER`](crate::label::TYPE_OTHER) and evaluation proceeds.

use crate::label::TYPE_OTHER;
use std::collections::{HashMap, HashSet};

/// Read-only view of the entity knowledge base.
///
/// Implementations must be deterministic; `most_popular_candidate` depends on
/// it for stable tie-breaking.
pub trait KnowledgeBase {
    /// True if the knowledge base contains the entity.
    fn contains_entity(&self, entity_id: &str) -> bool;

    /// Canonical name of an entity; `None` if absent (reported as "Unknown").
    fn entity_name(&self, entity_id: &str) -> Option<String>;

    /// Whitelist type ids of an entity; `[OTHER]` if absent.
    fn entity_types(&self, entity_id: &str) -> Vec<String>;

    /// True if the entity is a quantity.
    fn is_quantity(&self, entity_id: &str) -> bool;

    /// True if the entity is a point in time.
    fn is_datetime(&self, entity_id: &str) -> bool;

    /// Number of encyclopedia-project pages referencing the entity
    /// (popularity proxy).
    fn sitelink_count(&self, entity_id: &str) -> usize;

    /// Entities the alias could refer to.
    fn candidates(&self, alias: &str) -> HashSet<String>;

    /// True if the text is a known demonym ("French", "Brazilian").
    fn is_demonym(&self, text: &str) -> bool;

    /// Entities a demonym can refer to.
    fn entities_for_demonym(&self, text: &str) -> Vec<String>;
}

/// The candidate for an alias with the highest sitelink count.
///
/// Ties are broken lexicographically on the entity id so the result is
/// deterministic across runs.
#[must_use]
pub fn most_popular_candidate<K: KnowledgeBase + ?Sized>(kb: &K, alias: &str) -> Option<String> {
    kb.candidates(alias)
        .into_iter()
        .max_by(|a, b| {
            kb.sitelink_count(a)
                .cmp(&kb.sitelink_count(b))
                .then_with(|| b.cmp(a))
        })
}

/// A simple in-memory knowledge base for tests and small corpora.
///
/// # Example
///
/// ```
/// use linkeval::kb::{InMemoryKb, KnowledgeBase, most_popular_candidate};
///
/// let mut kb = InMemoryKb::new();
/// kb.add_entity("Q142", vec!["Q6256"], 300); // France
/// kb.add_entity("Q90", vec!["Q515"], 250);   // Paris
/// kb.add_alias("Paris", "Q90");
/// assert_eq!(most_popular_candidate(&kb, "Paris"), Some("Q90".to_string()));
/// assert_eq!(kb.entity_types("Q999"), vec!["OTHER".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryKb {
    names: HashMap<String, String>,
    types: HashMap<String, Vec<String>>,
    sitelinks: HashMap<String, usize>,
    quantities: HashSet<String>,
    datetimes: HashSet<String>,
    aliases: HashMap<String, HashSet<String>>,
    demonyms: HashMap<String, Vec<String>>,
}

impl InMemoryKb {
    /// Create an empty knowledge base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity with its whitelist types and sitelink count.
    pub fn add_entity(
        &mut self,
        entity_id: impl Into<String>,
        types: Vec<&str>,
        sitelinks: usize,
    ) {
        let id = entity_id.into();
        self.types
            .insert(id.clone(), types.into_iter().map(String::from).collect());
        self.sitelinks.insert(id, sitelinks);
    }

    /// Set the canonical name of an entity.
    pub fn add_name(&mut self, entity_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(entity_id.into(), name.into());
    }

    /// Mark an entity as a quantity.
    pub fn add_quantity(&mut self, entity_id: impl Into<String>) {
        self.quantities.insert(entity_id.into());
    }

    /// Mark an entity as a point in time.
    pub fn add_datetime(&mut self, entity_id: impl Into<String>) {
        self.datetimes.insert(entity_id.into());
    }

    /// Register an alias → entity mapping.
    pub fn add_alias(&mut self, alias: impl Into<String>, entity_id: impl Into<String>) {
        self.aliases
            .entry(alias.into())
            .or_default()
            .insert(entity_id.into());
    }

    /// Register a demonym and the entities it can refer to.
    pub fn add_demonym(&mut self, text: impl Into<String>, entities: Vec<&str>) {
        self.demonyms
            .insert(text.into(), entities.into_iter().map(String::from).collect());
    }
}

impl KnowledgeBase for InMemoryKb {
    fn contains_entity(&self, entity_id: &str) -> bool {
        self.types.contains_key(entity_id)
    }

    fn entity_name(&self, entity_id: &str) -> Option<String> {
        self.names.get(entity_id).cloned()
    }

    fn entity_types(&self, entity_id: &str) -> Vec<String> {
        match self.types.get(entity_id) {
            Some(types) if !types.is_empty() => types.clone(),
            _ => vec![TYPE_OTHER.to_string()],
        }
    }

    fn is_quantity(&self, entity_id: &str) -> bool {
        self.quantities.contains(entity_id)
    }

    fn is_datetime(&self, entity_id: &str) -> bool {
        self.datetimes.contains(entity_id)
    }

    fn sitelink_count(&self, entity_id: &str) -> usize {
        self.sitelinks.get(entity_id).copied().unwrap_or(0)
    }

    fn candidates(&self, alias: &str) -> HashSet<String> {
        self.aliases.get(alias).cloned().unwrap_or_default()
    }

    fn is_demonym(&self, text: &str) -> bool {
        self.demonyms.contains_key(text)
    }

    fn entities_for_demonym(&self, text: &str) -> Vec<String> {
        self.demonyms.get(text).cloned().unwrap_or_default()
    }
}
