//! A* pathfinding for bot navigation
//!
//! Finds shortest routes through the navigation graph. Edge cost and the
//! heuristic are both Euclidean distance between node anchors, so the
//! heuristic never overestimates.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use bevy::prelude::*;

use crate::ai::navigation::{NavGraph, NodeId};

/// Node in the A* search priority queue
#[derive(Clone, Copy)]
struct SearchNode {
    /// Index into nav graph nodes
    node_index: NodeId,
    /// Cost from start to this node (g-score)
    g_cost: f32,
    /// Estimated total cost (f-score = g + h)
    f_cost: f32,
    /// Push order, breaks f-cost ties so earlier entries win
    seq: u64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (lower f_cost = higher priority)
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Result of pathfinding
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    /// Nodes to visit after the start, ending with the goal
    pub nodes: Vec<NodeId>,
    /// Total path cost
    pub total_cost: f32,
}

/// Find the node sequence from `start` to `goal`.
/// The result excludes `start` and ends with `goal`; it is empty when the
/// goal is unreachable or equal to the start.
pub fn find_path(graph: &NavGraph, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    find_path_with_cost(graph, start, goal)
        .map(|result| result.nodes)
        .unwrap_or_default()
}

/// A* search returning the path and its cost, or None when unreachable.
/// `start == goal` yields an empty path with zero cost.
pub fn find_path_with_cost(graph: &NavGraph, start: NodeId, goal: NodeId) -> Option<PathResult> {
    let node_count = graph.nodes.len();
    if start >= node_count || goal >= node_count {
        return None;
    }
    if start == goal {
        return Some(PathResult {
            nodes: Vec::new(),
            total_cost: 0.0,
        });
    }

    let goal_pos = graph.nodes[goal].anchor;
    let mut open_set = BinaryHeap::new();
    let mut came_from: Vec<Option<NodeId>> = vec![None; node_count];
    let mut g_scores = vec![f32::INFINITY; node_count];
    let mut closed = vec![false; node_count];
    let mut seq = 0u64;

    g_scores[start] = 0.0;
    open_set.push(SearchNode {
        node_index: start,
        g_cost: 0.0,
        f_cost: heuristic(graph.nodes[start].anchor, goal_pos),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if closed[current.node_index] {
            continue;
        }
        closed[current.node_index] = true;

        if current.node_index == goal {
            return Some(PathResult {
                nodes: reconstruct_path(&came_from, start, goal),
                total_cost: current.g_cost,
            });
        }

        for edge in &graph.edges[current.node_index] {
            if closed[edge.to_node] {
                continue;
            }
            let tentative_g = current.g_cost + edge.cost;
            if tentative_g < g_scores[edge.to_node] {
                g_scores[edge.to_node] = tentative_g;
                came_from[edge.to_node] = Some(current.node_index);
                seq += 1;
                open_set.push(SearchNode {
                    node_index: edge.to_node,
                    g_cost: tentative_g,
                    f_cost: tentative_g + heuristic(graph.nodes[edge.to_node].anchor, goal_pos),
                    seq,
                });
            }
        }
    }

    // No path found
    None
}

/// Breadth-first search for the path with the fewest edges, ignoring cost.
/// Same result contract as `find_path`.
pub fn find_path_fewest_hops(graph: &NavGraph, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let node_count = graph.nodes.len();
    if start >= node_count || goal >= node_count || start == goal {
        return Vec::new();
    }

    let mut came_from: Vec<Option<NodeId>> = vec![None; node_count];
    let mut visited = vec![false; node_count];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return reconstruct_path(&came_from, start, goal);
        }
        for next in graph.neighbors(current) {
            if !visited[next] {
                visited[next] = true;
                came_from[next] = Some(current);
                queue.push_back(next);
            }
        }
    }

    Vec::new()
}

/// Route to the reachable node whose anchor is farthest from `threat`.
/// Dijkstra over edge cost from `start`; among equally far nodes the cheaper
/// route wins, then the lower id. Empty when no reachable node is farther
/// from the threat than `start` itself.
pub fn find_flee_path(graph: &NavGraph, start: NodeId, threat: Vec2) -> Vec<NodeId> {
    let node_count = graph.nodes.len();
    if start >= node_count {
        return Vec::new();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: Vec<Option<NodeId>> = vec![None; node_count];
    let mut g_scores = vec![f32::INFINITY; node_count];
    let mut closed = vec![false; node_count];
    let mut seq = 0u64;

    g_scores[start] = 0.0;
    open_set.push(SearchNode {
        node_index: start,
        g_cost: 0.0,
        f_cost: 0.0,
        seq,
    });

    while let Some(current) = open_set.pop() {
        if closed[current.node_index] {
            continue;
        }
        closed[current.node_index] = true;

        for edge in &graph.edges[current.node_index] {
            if closed[edge.to_node] {
                continue;
            }
            let tentative_g = current.g_cost + edge.cost;
            if tentative_g < g_scores[edge.to_node] {
                g_scores[edge.to_node] = tentative_g;
                came_from[edge.to_node] = Some(current.node_index);
                seq += 1;
                open_set.push(SearchNode {
                    node_index: edge.to_node,
                    g_cost: tentative_g,
                    f_cost: tentative_g,
                    seq,
                });
            }
        }
    }

    let distance = |id: NodeId| graph.nodes[id].anchor.distance(threat);
    let farthest = (0..node_count)
        .filter(|&id| closed[id])
        .max_by(|&a, &b| {
            distance(a)
                .total_cmp(&distance(b))
                .then(g_scores[b].total_cmp(&g_scores[a]))
                .then(b.cmp(&a))
        });

    match farthest {
        Some(goal) if goal != start && distance(goal) > distance(start) => {
            reconstruct_path(&came_from, start, goal)
        }
        _ => Vec::new(),
    }
}

/// Heuristic function for A* (Euclidean distance)
fn heuristic(from: Vec2, to: Vec2) -> f32 {
    from.distance(to)
}

/// Walk `came_from` back from the goal; the start itself is not included
fn reconstruct_path(came_from: &[Option<NodeId>], start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(parent) = came_from[current] {
        if parent == start {
            break;
        }
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::capabilities::JumpProfile;
    use crate::ai::navigation::{EdgeType, NavEdge, NavNode};
    use crate::levels::Platform;

    fn node(id: NodeId, x: f32, y: f32) -> NavNode {
        NavNode {
            id,
            platform_id: format!("platform-{id}"),
            anchor: Vec2::new(x, y),
            left_x: x - 50.0,
            right_x: x + 50.0,
            top_y: y,
            slope: 0.0,
        }
    }

    /// Graph from explicit node positions and directed pairs
    fn graph_from(positions: &[(f32, f32)], links: &[(NodeId, NodeId)]) -> NavGraph {
        let nodes: Vec<NavNode> = positions
            .iter()
            .enumerate()
            .map(|(i, (x, y))| node(i, *x, *y))
            .collect();
        let mut edges = vec![Vec::new(); nodes.len()];
        for &(from, to) in links {
            edges[from].push(NavEdge {
                to_node: to,
                edge_type: EdgeType::Walk,
                gap: 0.0,
                cost: nodes[from].anchor.distance(nodes[to].anchor),
            });
        }
        NavGraph {
            nodes,
            edges,
            ..default()
        }
    }

    #[test]
    fn test_same_node_is_empty() {
        let graph = graph_from(&[(0.0, 0.0), (100.0, 0.0)], &[(0, 1)]);
        assert!(find_path(&graph, 0, 0).is_empty());
    }

    #[test]
    fn test_unreachable_is_empty() {
        let graph = graph_from(&[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0)], &[(0, 1), (1, 0)]);
        assert!(find_path(&graph, 0, 2).is_empty());
        assert!(find_path_with_cost(&graph, 0, 2).is_none());
        // Out of range ids never panic
        assert!(find_path(&graph, 0, 99).is_empty());
    }

    #[test]
    fn test_path_excludes_start_and_ends_at_goal() {
        let graph = graph_from(
            &[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0)],
            &[(0, 1), (1, 2), (2, 1), (1, 0)],
        );
        assert_eq!(find_path(&graph, 0, 2), vec![1, 2]);
        assert_eq!(find_path(&graph, 2, 0), vec![1, 0]);
    }

    #[test]
    fn test_prefers_cheaper_route_over_fewer_hops() {
        // 0 -> 3 directly is a long detour far off to the side,
        // 0 -> 1 -> 2 -> 3 hugs the straight line.
        let graph = graph_from(
            &[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (300.0, 0.0), (150.0, 2000.0)],
            &[(0, 1), (1, 2), (2, 3), (0, 4), (4, 3)],
        );
        assert_eq!(find_path(&graph, 0, 3), vec![1, 2, 3]);
        assert_eq!(find_path_fewest_hops(&graph, 0, 3), vec![4, 3]);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        // Symmetric diamond: 0 -> {1, 2} -> 3
        let graph = graph_from(
            &[(0.0, 0.0), (100.0, -100.0), (100.0, 100.0), (200.0, 0.0)],
            &[(0, 1), (0, 2), (1, 3), (2, 3)],
        );
        assert_eq!(find_path(&graph, 0, 3), vec![1, 3]);
    }

    #[test]
    fn test_terminates_on_cycles() {
        let graph = graph_from(
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (500.0, 500.0)],
            &[(0, 1), (1, 2), (2, 3), (3, 0), (1, 0), (2, 1), (3, 2), (0, 3)],
        );
        assert!(find_path(&graph, 0, 4).is_empty());
        assert_eq!(find_path(&graph, 0, 2).len(), 2);
    }

    #[test]
    fn test_flee_path_heads_for_farthest_reachable_node() {
        // 0 - 1 - 2 in a row, 3 far off but unreachable
        let graph = graph_from(
            &[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (5000.0, 0.0)],
            &[(0, 1), (1, 0), (1, 2), (2, 1)],
        );
        // Threat on the left: run right
        assert_eq!(find_flee_path(&graph, 0, Vec2::new(-100.0, 0.0)), vec![1, 2]);
        // Threat on the right: run left
        assert_eq!(find_flee_path(&graph, 2, Vec2::new(300.0, 0.0)), vec![1, 0]);
    }

    #[test]
    fn test_flee_path_empty_when_already_farthest() {
        let graph = graph_from(&[(0.0, 0.0), (100.0, 0.0)], &[(0, 1), (1, 0)]);
        assert!(find_flee_path(&graph, 0, Vec2::new(200.0, 0.0)).is_empty());
        assert!(find_flee_path(&graph, 9, Vec2::ZERO).is_empty());
    }

    #[test]
    fn test_built_graph_paths_are_valid() {
        // A staircase: each step 100 higher and 150 to the right of the last
        let platforms: Vec<Platform> = (0..6)
            .map(|i| {
                Platform::new(
                    format!("platform-step-{i}"),
                    Vec2::new(i as f32 * 250.0, 2000.0 - i as f32 * 100.0),
                    100.0,
                    20.0,
                )
            })
            .collect();
        let graph = NavGraph::build(&platforms, JumpProfile::new(200.0, 150.0));

        for start in 0..graph.nodes.len() {
            for goal in 0..graph.nodes.len() {
                let path = find_path(&graph, start, goal);
                if path.is_empty() {
                    continue;
                }
                assert!(graph.has_edge(start, path[0]));
                for pair in path.windows(2) {
                    assert!(graph.has_edge(pair[0], pair[1]));
                }
                assert_eq!(*path.last().unwrap(), goal);
            }
        }
        // Top step is reachable from the bottom one
        assert_eq!(find_path(&graph, 0, 5), vec![1, 2, 3, 4, 5]);
    }
}
