//! Dependency graph over schema change records and apply planning

use crate::error::{CoreError, CoreResult};
use crate::migration_key::MigrationKey;
use crate::record::SchemaChangeRecord;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A directed acyclic graph of migration dependencies.
///
/// Dependencies that name a record outside the catalog are kept aside as
/// *external*; only the applied ledger can satisfy them.
#[derive(Debug)]
pub struct MigrationGraph {
    /// Edges run from dependency to dependent
    graph: DiGraph<MigrationKey, ()>,

    node_map: HashMap<MigrationKey, NodeIndex>,

    records: BTreeMap<MigrationKey, SchemaChangeRecord>,

    external: BTreeSet<MigrationKey>,
}

impl MigrationGraph {
    /// Build the graph from a catalog of records.
    ///
    /// Every record is validated; duplicate keys and cycles are rejected.
    pub fn build(records: Vec<SchemaChangeRecord>) -> CoreResult<Self> {
        let mut by_key = BTreeMap::new();
        for record in records {
            record.validate()?;
            let key = record.key()?;
            if by_key.contains_key(&key) {
                return Err(CoreError::DuplicateMigration {
                    key: key.to_string(),
                });
            }
            by_key.insert(key, record);
        }

        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        // BTreeMap iteration keeps node indices in key order
        for key in by_key.keys() {
            let idx = graph.add_node(key.clone());
            node_map.insert(key.clone(), idx);
        }

        let mut external = BTreeSet::new();
        for (key, record) in &by_key {
            let to_idx = node_map[key];
            for dep in &record.dependencies {
                match node_map.get(dep) {
                    Some(&from_idx) => {
                        graph.add_edge(from_idx, to_idx, ());
                    }
                    None => {
                        external.insert(dep.clone());
                    }
                }
            }
        }

        let dag = Self {
            graph,
            node_map,
            records: by_key,
            external,
        };
        dag.validate()?;
        Ok(dag)
    }

    /// Validate the graph has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(CoreError::CircularDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }),
        }
    }

    /// Walk forward from `start` until a node repeats, for error reporting
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Records in apply order: dependencies first, ties broken by key.
    pub fn topological_order(&self) -> CoreResult<Vec<&MigrationKey>> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                (
                    idx,
                    self.graph.edges_directed(idx, Direction::Incoming).count(),
                )
            })
            .collect();

        let mut ready: BTreeSet<(&MigrationKey, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(&idx, _)| (&self.graph[idx], idx))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(entry) = ready.pop_first() {
            let (key, idx) = entry;
            order.push(key);
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let target = edge.target();
                if let Some(deg) = in_degree.get_mut(&target) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert((&self.graph[target], target));
                    }
                }
            }
        }

        if order.len() != self.graph.node_count() {
            self.validate()?;
        }
        Ok(order)
    }

    /// Unapplied records in apply order.
    ///
    /// With `target`, only the target and its ancestors are considered.
    pub fn plan<F>(
        &self,
        is_applied: F,
        target: Option<&MigrationKey>,
    ) -> CoreResult<Vec<&SchemaChangeRecord>>
    where
        F: Fn(&MigrationKey) -> bool,
    {
        let scope: Option<HashSet<MigrationKey>> = match target {
            Some(key) => {
                if !self.contains(key) {
                    return Err(CoreError::MigrationNotFound {
                        key: key.to_string(),
                    });
                }
                let mut scope: HashSet<MigrationKey> = self.ancestors(key).into_iter().collect();
                scope.insert(key.clone());
                Some(scope)
            }
            None => None,
        };

        Ok(self
            .topological_order()?
            .into_iter()
            .filter(|key| scope.as_ref().map_or(true, |s| s.contains(*key)))
            .filter(|key| !is_applied(key))
            .map(|key| &self.records[key])
            .collect())
    }

    /// Get a record by key
    pub fn get(&self, key: &MigrationKey) -> Option<&SchemaChangeRecord> {
        self.records.get(key)
    }

    /// Look up a record, failing with `MigrationNotFound`
    pub fn require(&self, key: &MigrationKey) -> CoreResult<&SchemaChangeRecord> {
        self.get(key).ok_or_else(|| CoreError::MigrationNotFound {
            key: key.to_string(),
        })
    }

    /// Check if a record is in the catalog
    pub fn contains(&self, key: &MigrationKey) -> bool {
        self.node_map.contains_key(key)
    }

    /// All records, ordered by key
    pub fn records(&self) -> impl Iterator<Item = &SchemaChangeRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dependencies named by some record but absent from the catalog
    pub fn external_dependencies(&self) -> &BTreeSet<MigrationKey> {
        &self.external
    }

    /// In-catalog records that directly depend on `key`
    pub fn dependents(&self, key: &MigrationKey) -> Vec<MigrationKey> {
        let Some(&idx) = self.node_map.get(key) else {
            return Vec::new();
        };
        let mut out: Vec<MigrationKey> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| self.graph[e.target()].clone())
            .collect();
        out.sort();
        out
    }

    /// All in-catalog transitive dependencies of `key`
    pub fn ancestors(&self, key: &MigrationKey) -> Vec<MigrationKey> {
        let Some(&start) = self.node_map.get(key) else {
            return Vec::new();
        };
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        let mut result = Vec::new();
        while let Some(idx) = stack.pop() {
            for edge in self.graph.edges_directed(idx, Direction::Incoming) {
                let source = edge.source();
                if visited.insert(source) {
                    result.push(self.graph[source].clone());
                    stack.push(source);
                }
            }
        }
        result.sort();
        result
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
