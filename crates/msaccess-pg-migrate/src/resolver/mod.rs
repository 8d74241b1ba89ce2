//! Load-order resolution over the captured relationship graph.
//!
//! Produces an ordering of the ordinary tables such that every referenced
//! table appears at or before its referencing table, so the upsert pass
//! can load parents before children. The algorithm is fixed-point
//! layering: seed with the tables that reference nothing, then peel off
//! rounds of tables whose references are all already placed. A table
//! referencing only itself is eligible as soon as its other references
//! are placed.
//!
//! The order is computed once per run and treated as immutable thereafter.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::error::{MigrateError, Result};

/// Iteration cap: exceeding it means a cycle or a dangling reference.
/// Cyclic foreign keys need deferred-constraint handling outside this
/// system, so this is a hard failure, not a retry condition.
pub const MAX_ROUNDS: usize = 100;

/// Resolved load order.
#[derive(Debug, Clone)]
pub struct LoadOrder {
    /// Ordinary table names, referenced-before-referencing.
    pub tables: Vec<String>,
    /// Number of layering rounds taken after the seed round.
    pub rounds: usize,
}

impl LoadOrder {
    /// Position of a table within the order, if present.
    pub fn index_of(&self, table: &str) -> Option<usize> {
        self.tables.iter().position(|t| t == table)
    }
}

/// Compute the table load order from the captured catalog.
pub fn load_order(catalog: &SchemaCatalog) -> Result<LoadOrder> {
    let tables: Vec<String> = catalog
        .ordinary_tables()?
        .into_iter()
        .map(|t| t.name)
        .collect();

    // Outgoing references per table, self-references excluded since a
    // table can always satisfy its own key.
    let mut deps: BTreeMap<&str, BTreeSet<String>> =
        tables.iter().map(|t| (t.as_str(), BTreeSet::new())).collect();
    for rel in catalog.relationships()? {
        if rel.references_table == rel.referenced_table {
            continue;
        }
        if let Some(set) = deps.get_mut(rel.references_table.as_str()) {
            set.insert(rel.referenced_table.clone());
        }
    }

    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut order: Vec<String> = Vec::with_capacity(tables.len());

    // Seed round: tables that reference nothing, in name order. The
    // catalog already reads in name order so iteration order is the
    // tie-break.
    for table in &tables {
        if deps[table.as_str()].is_empty() {
            placed.insert(table);
            order.push(table.clone());
        }
    }
    debug!("Load order seed round placed {} tables", order.len());

    let mut rounds = 0;
    while placed.len() < tables.len() {
        if rounds >= MAX_ROUNDS {
            break;
        }
        rounds += 1;

        // Snapshot eligibility against the previous rounds only, so every
        // table in a round depends solely on earlier rounds.
        let eligible: Vec<&String> = tables
            .iter()
            .filter(|t| !placed.contains(t.as_str()))
            .filter(|t| deps[t.as_str()].iter().all(|d| placed.contains(d.as_str())))
            .collect();

        if eligible.is_empty() {
            break;
        }
        debug!("Load order round {} placed {} tables", rounds, eligible.len());
        for table in eligible {
            placed.insert(table);
            order.push(table.clone());
        }
    }

    if placed.len() < tables.len() {
        let unresolved: Vec<String> = tables
            .iter()
            .filter(|t| !placed.contains(t.as_str()))
            .cloned()
            .collect();
        return Err(MigrateError::UnresolvedOrder {
            rounds: MAX_ROUNDS,
            unresolved,
        });
    }

    Ok(LoadOrder { tables: order, rounds })
}
