//! Assertion checking for scenario expectations

use super::parser::{IntentExpectation, ScenarioExpectations};
use crate::ai::{AgentNavState, MovementIntent, NavGraph, NodeId, find_path};

/// Error when an assertion fails
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n    Expected: {}\n    Actual: {}", self.message, self.expected, self.actual)
    }
}

/// Check one tick's intent against the group expectation
pub fn check_intent(
    tick: u64,
    expected: &IntentExpectation,
    actual: &MovementIntent,
) -> Result<(), AssertionError> {
    let fields = [
        ("move_left", expected.move_left, actual.move_left),
        ("move_right", expected.move_right, actual.move_right),
        ("jump", expected.jump, actual.jump),
    ];
    for (name, want, got) in fields {
        if let Some(want) = want {
            if want != got {
                return Err(AssertionError {
                    message: format!("Tick {}: intent.{} mismatch", tick, name),
                    expected: want.to_string(),
                    actual: format!("{:?}", actual),
                });
            }
        }
    }
    Ok(())
}

/// Resolve a platform label to its node
fn node_for(graph: &NavGraph, label: &str) -> Result<NodeId, AssertionError> {
    graph.node_for_platform(label).ok_or_else(|| AssertionError {
        message: format!("Platform '{}' is not a graph node", label),
        expected: format!("walkable platform '{}'", label),
        actual: format!(
            "nodes: {:?}",
            graph.nodes.iter().map(|n| &n.platform_id).collect::<Vec<_>>()
        ),
    })
}

/// Check edge and reachability expectations against the built graph
pub fn check_graph(
    expect: &ScenarioExpectations,
    graph: &NavGraph,
) -> Result<(), AssertionError> {
    for [from, to] in &expect.edges {
        let (a, b) = (node_for(graph, from)?, node_for(graph, to)?);
        if !graph.has_edge(a, b) {
            return Err(AssertionError {
                message: format!("Missing edge {} -> {}", from, to),
                expected: "edge".to_string(),
                actual: format!("neighbors of {}: {:?}", from, neighbor_labels(graph, a)),
            });
        }
    }

    for [from, to] in &expect.no_edges {
        let (a, b) = (node_for(graph, from)?, node_for(graph, to)?);
        if let Some(edge) = graph.edge(a, b) {
            return Err(AssertionError {
                message: format!("Unexpected edge {} -> {}", from, to),
                expected: "no edge".to_string(),
                actual: format!("{:?} edge, gap {:.1}", edge.edge_type, edge.gap),
            });
        }
    }

    for [from, to] in &expect.reachable {
        let (a, b) = (node_for(graph, from)?, node_for(graph, to)?);
        if a != b && find_path(graph, a, b).is_empty() {
            return Err(AssertionError {
                message: format!("{} cannot reach {}", from, to),
                expected: "a path".to_string(),
                actual: "no path".to_string(),
            });
        }
    }

    for [from, to] in &expect.unreachable {
        let (a, b) = (node_for(graph, from)?, node_for(graph, to)?);
        let path = find_path(graph, a, b);
        if a == b || !path.is_empty() {
            return Err(AssertionError {
                message: format!("{} can reach {}", from, to),
                expected: "no path".to_string(),
                actual: format!("path {:?}", labels(graph, &path)),
            });
        }
    }

    Ok(())
}

/// Check the bot's final state and jump count
pub fn check_final_state(
    expect: &ScenarioExpectations,
    graph: &NavGraph,
    state: Option<&AgentNavState>,
    jumps: u32,
) -> Result<(), AssertionError> {
    if let Some(expected) = expect.jumps {
        if jumps != expected {
            return Err(AssertionError {
                message: "Jump count mismatch".to_string(),
                expected: expected.to_string(),
                actual: jumps.to_string(),
            });
        }
    }

    if expect.mode.is_none() && expect.path.is_none() {
        return Ok(());
    }

    let state = state.ok_or_else(|| AssertionError {
        message: "Bot has no navigation state".to_string(),
        expected: "at least one tick".to_string(),
        actual: "none".to_string(),
    })?;

    if let Some(mode) = &expect.mode {
        let actual = format!("{:?}", state.mode);
        if &actual != mode {
            return Err(AssertionError {
                message: "Bot mode mismatch".to_string(),
                expected: mode.clone(),
                actual,
            });
        }
    }

    if let Some(path) = &expect.path {
        let actual = labels(graph, &state.current_path);
        if &actual != path {
            return Err(AssertionError {
                message: "Remaining path mismatch".to_string(),
                expected: format!("{:?}", path),
                actual: format!("{:?}", actual),
            });
        }
    }

    Ok(())
}

fn labels(graph: &NavGraph, path: &[NodeId]) -> Vec<String> {
    path.iter()
        .filter_map(|&id| graph.node(id))
        .map(|n| n.platform_id.clone())
        .collect()
}

fn neighbor_labels(graph: &NavGraph, id: NodeId) -> Vec<String> {
    labels(graph, &graph.neighbors(id).collect::<Vec<_>>())
}
