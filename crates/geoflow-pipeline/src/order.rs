//! Execution ordering.

use std::collections::{HashMap, HashSet};

use geoflow_types::{OperationId, Workflow};

use crate::error::{PipelineError, Result};

/// Order a workflow's operations so every producer precedes its consumers.
///
/// Sinks (operations that feed nothing) are seeded in declaration order and
/// the graph is walked upstream from each of them. Each producer is emitted
/// once, after all of its own producers, and the sinks follow in declaration
/// order. Connection endpoints are validated and cycles rejected before the
/// walk.
pub fn execution_order(workflow: &Workflow) -> Result<Vec<OperationId>> {
    let ids: HashSet<&str> = workflow.operations.iter().map(|op| op.id.as_str()).collect();
    for connection in &workflow.connections {
        for endpoint in [&connection.from_operation, &connection.to_operation] {
            if !ids.contains(endpoint.as_str()) {
                return Err(PipelineError::UnknownOperation(endpoint.clone()));
            }
        }
    }

    detect_cycles(workflow)?;

    let mut upstream: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut producers: HashSet<&str> = HashSet::new();
    for connection in &workflow.connections {
        upstream
            .entry(connection.to_operation.as_str())
            .or_default()
            .push(connection.from_operation.as_str());
        producers.insert(connection.from_operation.as_str());
    }

    let sinks: Vec<&str> = workflow
        .operations
        .iter()
        .map(|op| op.id.as_str())
        .filter(|id| !producers.contains(id))
        .collect();

    let mut visited: HashSet<&str> = sinks.iter().copied().collect();
    let mut order = Vec::with_capacity(workflow.operations.len());
    for sink in &sinks {
        walk_upstream(&upstream, &mut visited, &mut order, sink);
    }
    order.extend(sinks.iter().map(|id| id.to_string()));
    Ok(order)
}

/// Emit every unvisited producer of `id` after its own producers.
fn walk_upstream<'a>(
    upstream: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    order: &mut Vec<OperationId>,
    id: &str,
) {
    let Some(producers) = upstream.get(id) else {
        return;
    };
    for &producer in producers {
        if visited.insert(producer) {
            walk_upstream(upstream, visited, order, producer);
            order.push(producer.to_string());
        }
    }
}

/// Kahn's algorithm over the connection graph.
fn detect_cycles(workflow: &Workflow) -> Result<()> {
    let index: HashMap<&str, usize> = workflow
        .operations
        .iter()
        .enumerate()
        .map(|(i, op)| (op.id.as_str(), i))
        .collect();

    let n = workflow.operations.len();
    let mut in_degree = vec![0usize; n];
    let mut adjacent: Vec<Vec<usize>> = vec![vec![]; n];

    for connection in &workflow.connections {
        let (Some(&from), Some(&to)) = (
            index.get(connection.from_operation.as_str()),
            index.get(connection.to_operation.as_str()),
        ) else {
            continue;
        };
        adjacent[from].push(to);
        in_degree[to] += 1;
    }

    let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut visited = 0;

    while let Some(node) = queue.pop() {
        visited += 1;
        for &neighbor in &adjacent[node] {
            in_degree[neighbor] -= 1;
            if in_degree[neighbor] == 0 {
                queue.push(neighbor);
            }
        }
    }

    if visited != n {
        let remaining = workflow
            .operations
            .iter()
            .zip(&in_degree)
            .filter(|(_, degree)| **degree > 0)
            .map(|(op, _)| op.id.clone())
            .collect();
        return Err(PipelineError::CyclicWorkflow(remaining));
    }

    Ok(())
}
