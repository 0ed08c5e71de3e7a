//! Builds the block-dependency graph for one project, and checks the two
//! structural invariants the compiler enforces before rendering: the graph
//! must be acyclic, and every block must be weakly connected to the rest of
//! the project (no islands).

use std::collections::HashMap;

use petgraph::algo::{connected_components, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use uuid::Uuid;

use crate::error::CompileError;
use scyflow_store::ProjectGraph;

/// A project's block-dependency graph, with blocks addressable by id.
pub struct CompileGraph {
    pub(crate) graph: DiGraph<Uuid, ()>,
    pub(crate) nodes: HashMap<Uuid, NodeIndex>,
    /// Block ids in an order where every upstream block precedes its
    /// downstream blocks.
    pub(crate) order: Vec<Uuid>,
}

/// Builds the graph from a project's blocks and edges, and verifies
/// acyclicity and connectivity.
pub fn build(project: &ProjectGraph) -> Result<CompileGraph, CompileError> {
    let mut graph = DiGraph::<Uuid, ()>::new();
    let mut nodes: HashMap<Uuid, NodeIndex> = HashMap::new();

    for block in &project.blocks {
        let idx = graph.add_node(block.id);
        nodes.insert(block.id, idx);
    }

    for edge in &project.edges {
        let from = nodes[&edge.upstream_block_id];
        let to = nodes[&edge.downstream_block_id];
        graph.add_edge(from, to, ());
    }

    let order: Vec<Uuid> = toposort(&graph, None)
        .map_err(|_| CompileError::Cyclic)?
        .into_iter()
        .map(|idx| graph[idx])
        .collect();

    if project.blocks.len() > 1 && connected_components(&graph) > 1 {
        let isolated = find_isolated_block(&graph, &nodes, project);
        return Err(CompileError::Disconnected(isolated));
    }

    Ok(CompileGraph { graph, nodes, order })
}

/// Picks a human-identifiable name for one block in a minority component,
/// for the error message.
fn find_isolated_block(
    graph: &DiGraph<Uuid, ()>,
    nodes: &HashMap<Uuid, NodeIndex>,
    project: &ProjectGraph,
) -> String {
    let mut visited = vec![false; graph.node_count()];
    let start = NodeIndex::new(0);
    let mut stack = vec![start];
    visited[start.index()] = true;
    while let Some(idx) = stack.pop() {
        for neighbor in graph.neighbors_undirected(idx) {
            if !visited[neighbor.index()] {
                visited[neighbor.index()] = true;
                stack.push(neighbor);
            }
        }
    }

    for block in &project.blocks {
        let idx = nodes[&block.id];
        if !visited[idx.index()] {
            return block.custom_name.clone();
        }
    }
    "<unknown>".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scyflow_core::model::{Block, Edge, SchedulingHints};

    fn block(id: Uuid, name: &str) -> Block {
        Block {
            id,
            project_id: Uuid::new_v4(),
            name: name.to_string(),
            custom_name: name.to_string(),
            description: None,
            author: None,
            docker_image: "example/image:latest".into(),
            repo_url: "https://example.invalid/x.git".into(),
            x_pos: 0.0,
            y_pos: 0.0,
            selected_entrypoint_id: None,
            scheduling: SchedulingHints::default(),
        }
    }

    #[test]
    fn linear_chain_is_acyclic_and_connected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let project = ProjectGraph {
            blocks: vec![block(a, "a"), block(b, "b")],
            entrypoints: vec![],
            ports: vec![],
            edges: vec![Edge {
                upstream_block_id: a,
                upstream_output_id: Uuid::new_v4(),
                downstream_block_id: b,
                downstream_input_id: Uuid::new_v4(),
            }],
        };
        let compiled = build(&project).unwrap();
        assert_eq!(compiled.order, vec![a, b]);
    }

    #[test]
    fn isolated_block_is_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let project = ProjectGraph {
            blocks: vec![block(a, "a"), block(b, "b"), block(c, "island")],
            entrypoints: vec![],
            ports: vec![],
            edges: vec![Edge {
                upstream_block_id: a,
                upstream_output_id: Uuid::new_v4(),
                downstream_block_id: b,
                downstream_input_id: Uuid::new_v4(),
            }],
        };
        match build(&project) {
            Err(CompileError::Disconnected(name)) => assert_eq!(name, "island"),
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[test]
    fn cycle_is_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let project = ProjectGraph {
            blocks: vec![block(a, "a"), block(b, "b")],
            entrypoints: vec![],
            ports: vec![],
            edges: vec![
                Edge {
                    upstream_block_id: a,
                    upstream_output_id: Uuid::new_v4(),
                    downstream_block_id: b,
                    downstream_input_id: Uuid::new_v4(),
                },
                Edge {
                    upstream_block_id: b,
                    upstream_output_id: Uuid::new_v4(),
                    downstream_block_id: a,
                    downstream_input_id: Uuid::new_v4(),
                },
            ],
        };
        assert!(matches!(build(&project), Err(CompileError::Cyclic)));
    }
}
