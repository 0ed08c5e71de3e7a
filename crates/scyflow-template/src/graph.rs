//! Builds the `depends_on` graph among a template's blocks, checks
//! acyclicity, and assigns canvas positions by topological level.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::schema::TemplateBlock;
use crate::TemplateError;

/// Canvas position assigned to one template block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// X = level * 500.
    pub x: f64,
    /// Y = index-within-level * 400.
    pub y: f64,
}

/// Topological order plus assigned positions, keyed by block name.
pub struct LayoutResult {
    /// Block names in an order where every `depends_on` upstream appears
    /// before its downstream.
    pub order: Vec<String>,
    /// Canvas position for every block name.
    pub positions: HashMap<String, Position>,
}

/// Builds the dependency graph, rejects cycles, and computes positions.
pub fn layout(blocks: &[TemplateBlock]) -> Result<LayoutResult, TemplateError> {
    let mut graph = DiGraph::<String, ()>::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();

    for block in blocks {
        let idx = graph.add_node(block.name.clone());
        nodes.insert(block.name.clone(), idx);
    }

    for block in blocks {
        for input in &block.inputs {
            if let Some(dep) = &input.depends_on {
                let (Some(&from), Some(&to)) = (nodes.get(&dep.block), nodes.get(&block.name)) else {
                    return Err(TemplateError::Semantic(format!(
                        "block '{}' depends on unknown block '{}'",
                        block.name, dep.block
                    )));
                };
                graph.add_edge(from, to, ());
            }
        }
    }

    let order = toposort(&graph, None).map_err(|_| TemplateError::Cyclic)?;

    // Level = longest path from a root to this node, computed in
    // topological order so every predecessor's level is already final.
    let mut level: HashMap<NodeIndex, usize> = HashMap::new();
    for &idx in &order {
        let lvl = graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .map(|pred| level.get(&pred).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        level.insert(idx, lvl);
    }

    let mut per_level_counter: HashMap<usize, usize> = HashMap::new();
    let mut positions = HashMap::new();
    let mut ordered_names = Vec::with_capacity(order.len());
    for idx in order {
        let name = graph[idx].clone();
        let lvl = level[&idx];
        let index_in_level = per_level_counter.entry(lvl).or_insert(0);
        positions.insert(
            name.clone(),
            Position {
                x: (lvl * 500) as f64,
                y: (*index_in_level * 400) as f64,
            },
        );
        *index_in_level += 1;
        ordered_names.push(name);
    }

    Ok(LayoutResult {
        order: ordered_names,
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DependsOn, TemplateInput};
    use scyflow_core::model::ConfigMap;

    fn block(name: &str, deps: Vec<(&str, &str)>) -> TemplateBlock {
        TemplateBlock {
            name: name.to_string(),
            repo_url: "https://example.invalid/x.git".into(),
            entrypoint: "main".into(),
            envs: ConfigMap::new(),
            inputs: deps
                .into_iter()
                .map(|(b, o)| TemplateInput {
                    identifier: format!("in_{o}"),
                    settings: ConfigMap::new(),
                    depends_on: Some(DependsOn {
                        block: b.to_string(),
                        output: o.to_string(),
                    }),
                })
                .collect(),
            outputs: vec![],
        }
    }

    #[test]
    fn linear_chain_gets_increasing_levels() {
        let blocks = vec![
            block("a", vec![]),
            block("b", vec![("a", "out")]),
            block("c", vec![("b", "out")]),
        ];
        let result = layout(&blocks).unwrap();
        assert_eq!(result.positions["a"].x, 0.0);
        assert_eq!(result.positions["b"].x, 500.0);
        assert_eq!(result.positions["c"].x, 1000.0);
    }

    #[test]
    fn cycle_is_rejected() {
        let blocks = vec![block("a", vec![("b", "out")]), block("b", vec![("a", "out")])];
        assert!(matches!(layout(&blocks), Err(TemplateError::Cyclic)));
    }

    #[test]
    fn siblings_at_the_same_level_get_distinct_y() {
        let blocks = vec![
            block("a", vec![]),
            block("b", vec![("a", "out")]),
            block("c", vec![("a", "out")]),
        ];
        let result = layout(&blocks).unwrap();
        assert_eq!(result.positions["b"].x, result.positions["c"].x);
        assert_ne!(result.positions["b"].y, result.positions["c"].y);
    }
}
