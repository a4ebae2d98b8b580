//! Dependency graph between derived fields and their parents.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{FormsError, Result};
use crate::types::FormField;

/// Directed graph keyed by field id: each derived field points at the
/// fields it is computed from.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    fields: BTreeSet<String>,
    parents: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph for a schema's fields. Only fields with an active
    /// derivation contribute edges.
    pub fn from_fields(fields: &[FormField]) -> Self {
        let mut graph = Self::default();
        for field in fields {
            graph.fields.insert(field.id.clone());
            if let Some(config) = field.derivation() {
                graph
                    .parents
                    .insert(field.id.clone(), config.parent_fields.clone());
            }
        }
        graph
    }

    /// Parents of `field_id`, empty for non-derived fields.
    pub fn parents_of(&self, field_id: &str) -> &[String] {
        self.parents.get(field_id).map_or(&[], Vec::as_slice)
    }

    /// `(derived field, parent id)` pairs whose parent is not in the schema.
    pub fn dangling_parents(&self) -> Vec<(&str, &str)> {
        let known = &self.fields;
        self.parents
            .iter()
            .flat_map(move |(id, parents)| {
                parents
                    .iter()
                    .filter(move |p| !known.contains(p.as_str()))
                    .map(move |p| (id.as_str(), p.as_str()))
            })
            .collect()
    }

    /// Every field that takes part in a dependency cycle, including fields
    /// listed as their own parent.
    pub fn cyclic_fields(&self) -> BTreeSet<String> {
        let mut tarjan = Tarjan::new(self);
        for id in self.parents.keys() {
            if !tarjan.index.contains_key(id.as_str()) {
                tarjan.visit(id);
            }
        }
        tarjan.cyclic
    }

    /// Fail with [`FormsError::DependencyCycle`] if any cycle exists.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let cyclic = self.cyclic_fields();
        if cyclic.is_empty() {
            Ok(())
        } else {
            Err(FormsError::DependencyCycle {
                fields: cyclic.into_iter().collect(),
            })
        }
    }
}

/// Tarjan's strongly connected components, recording members of every
/// component that forms a cycle.
struct Tarjan<'g> {
    graph: &'g DependencyGraph,
    next_index: usize,
    index: HashMap<&'g str, usize>,
    low: HashMap<&'g str, usize>,
    stack: Vec<&'g str>,
    on_stack: BTreeSet<&'g str>,
    cyclic: BTreeSet<String>,
}

impl<'g> Tarjan<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            next_index: 0,
            index: HashMap::new(),
            low: HashMap::new(),
            stack: Vec::new(),
            on_stack: BTreeSet::new(),
            cyclic: BTreeSet::new(),
        }
    }

    fn visit(&mut self, node: &'g str) {
        self.index.insert(node, self.next_index);
        self.low.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let graph = self.graph;
        for parent in graph.parents_of(node) {
            let parent = parent.as_str();
            if !self.index.contains_key(parent) {
                self.visit(parent);
                let low = self.low[node].min(self.low[parent]);
                self.low.insert(node, low);
            } else if self.on_stack.contains(parent) {
                let low = self.low[node].min(self.index[parent]);
                self.low.insert(node, low);
            }
        }

        if self.low[node] == self.index[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(member);
                component.push(member);
                if member == node {
                    break;
                }
            }
            let self_loop = graph.parents_of(node).iter().any(|p| p == node);
            if component.len() > 1 || self_loop {
                self.cyclic
                    .extend(component.into_iter().map(str::to_string));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComputationKind, DerivedFieldConfig, FieldType};

    fn plain(id: &str) -> FormField {
        FormField::new(id, FieldType::Number, id)
    }

    fn sum_of(id: &str, parents: &[&str]) -> FormField {
        plain(id).derived(DerivedFieldConfig::new(
            ComputationKind::Sum,
            parents.iter().copied(),
        ))
    }

    #[test]
    fn acyclic_chain() {
        let fields = vec![
            plain("a"),
            plain("b"),
            sum_of("subtotal", &["a", "b"]),
            sum_of("total", &["subtotal"]),
        ];
        let graph = DependencyGraph::from_fields(&fields);
        assert!(graph.cyclic_fields().is_empty());
        assert!(graph.ensure_acyclic().is_ok());
        assert_eq!(graph.parents_of("subtotal"), ["a", "b"]);
        assert!(graph.parents_of("a").is_empty());
        assert_eq!(graph.parents_of("total"), ["subtotal"]);
    }

    #[test]
    fn two_field_cycle() {
        let fields = vec![sum_of("x", &["y"]), sum_of("y", &["x"]), plain("z")];
        let graph = DependencyGraph::from_fields(&fields);
        let cyclic: Vec<_> = graph.cyclic_fields().into_iter().collect();
        assert_eq!(cyclic, ["x", "y"]);
        match graph.ensure_acyclic() {
            Err(FormsError::DependencyCycle { fields }) => assert_eq!(fields, ["x", "y"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let graph = DependencyGraph::from_fields(&[sum_of("me", &["me"])]);
        assert!(graph.cyclic_fields().contains("me"));
    }

    #[test]
    fn field_feeding_a_cycle_is_not_cyclic() {
        let fields = vec![
            plain("seed"),
            sum_of("p", &["q", "seed"]),
            sum_of("q", &["r"]),
            sum_of("r", &["p"]),
            sum_of("downstream", &["p"]),
        ];
        let cyclic = DependencyGraph::from_fields(&fields).cyclic_fields();
        assert_eq!(cyclic.len(), 3);
        assert!(!cyclic.contains("seed"));
        assert!(!cyclic.contains("downstream"));
    }

    #[test]
    fn inactive_derivation_adds_no_edges() {
        let mut y = sum_of("y", &["x"]);
        y.is_derived = false;
        let graph = DependencyGraph::from_fields(&[sum_of("x", &["y"]), y]);
        assert!(graph.cyclic_fields().is_empty());
    }

    #[test]
    fn dangling_parents_reported() {
        let graph = DependencyGraph::from_fields(&[plain("a"), sum_of("t", &["a", "gone"])]);
        assert_eq!(graph.dangling_parents(), [("t", "gone")]);
    }
}
