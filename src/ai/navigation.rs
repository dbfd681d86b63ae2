//! Bot navigation graph - platform nodes and reachability edges
//!
//! Built once per level: each walkable platform becomes a node, with directed
//! edges for every platform reachable by walking, jumping or falling.
//! The graph is immutable after construction and shared between bots.
//!
//! Coordinates are screen space (+y down). A node's anchor is the middle of
//! its top edge.

use bevy::prelude::*;

use crate::ai::capabilities::JumpProfile;
use crate::ai::errors::NavError;
use crate::constants::*;
use crate::levels::{Platform, PlatformRegistry};

/// Index of a node in `NavGraph::nodes`
pub type NodeId = usize;

/// A node in the navigation graph representing a walkable surface
#[derive(Clone, Debug, PartialEq)]
pub struct NavNode {
    /// Unique identifier for this node (index into the graph)
    pub id: NodeId,
    /// Label of the platform this node was built from
    pub platform_id: String,
    /// Middle of the top edge
    pub anchor: Vec2,
    /// Left edge X coordinate
    pub left_x: f32,
    /// Right edge X coordinate
    pub right_x: f32,
    /// Top Y coordinate (surface bodies stand on) at the anchor
    pub top_y: f32,
    /// dy/dx of the surface, 0.0 for flat platforms
    pub slope: f32,
}

impl NavNode {
    fn from_platform(id: NodeId, platform: &Platform) -> Self {
        let left_x = platform.left_x().min(platform.right_x());
        let right_x = platform.left_x().max(platform.right_x());
        let top_y = platform.top_y();
        Self {
            id,
            platform_id: platform.id.clone(),
            anchor: Vec2::new((left_x + right_x) / 2.0, top_y),
            left_x,
            right_x,
            top_y,
            slope: platform.slope(),
        }
    }

    /// Surface height at `x`, clamped to the platform's span
    pub fn surface_y_at(&self, x: f32) -> f32 {
        self.top_y + (x.clamp(self.left_x, self.right_x) - self.anchor.x) * self.slope
    }

    /// How much higher `other` is than this node where the two face each other:
    /// the nearest edges across a gap, or the middle of the shared span.
    /// Positive = `other` is higher.
    pub fn rise_to(&self, other: &NavNode) -> f32 {
        let (from_x, to_x) = if other.left_x >= self.right_x {
            (self.right_x, other.left_x)
        } else if self.left_x >= other.right_x {
            (self.left_x, other.right_x)
        } else {
            let mid = (self.left_x.max(other.left_x) + self.right_x.min(other.right_x)) / 2.0;
            (mid, mid)
        };
        self.surface_y_at(from_x) - other.surface_y_at(to_x)
    }

    /// Check if an x coordinate is over this platform, widened by `tolerance`
    pub fn contains_x(&self, x: f32, tolerance: f32) -> bool {
        x >= self.left_x - tolerance && x <= self.right_x + tolerance
    }

    pub fn width(&self) -> f32 {
        self.right_x - self.left_x
    }

    /// Closest x on this platform to `x`, kept `margin` away from the edges.
    /// Platforms narrower than two margins use their center.
    pub fn approach_x(&self, x: f32, margin: f32) -> f32 {
        if self.width() <= margin * 2.0 {
            self.anchor.x
        } else {
            x.clamp(self.left_x + margin, self.right_x - margin)
        }
    }

    /// Gap between the nearest edges of two nodes (0.0 when they overlap)
    pub fn horizontal_gap(&self, other: &NavNode) -> f32 {
        if other.left_x > self.right_x {
            other.left_x - self.right_x
        } else if self.left_x > other.right_x {
            self.left_x - other.right_x
        } else {
            0.0
        }
    }

    /// Do the two spans share some open interval of x?
    pub fn overlaps_x(&self, other: &NavNode) -> bool {
        other.left_x < self.right_x && self.left_x < other.right_x
    }
}

/// Type of edge connecting two navigation nodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeType {
    /// Walk across touching or overlapping surfaces at about the same height
    Walk,
    /// Jump up, or hop a gap
    Jump,
    /// Fall to a lower platform
    Drop,
    /// Link authored in level data
    Link,
}

/// An edge in the navigation graph connecting two nodes
#[derive(Clone, Debug, PartialEq)]
pub struct NavEdge {
    /// Target node index
    pub to_node: NodeId,
    /// Type of traversal
    pub edge_type: EdgeType,
    /// Horizontal gap between the platforms' nearest edges
    pub gap: f32,
    /// Euclidean distance between anchors
    pub cost: f32,
}

/// Tolerances for mapping a body's feet to a node
#[derive(Clone, Copy, Debug)]
pub struct LocateTolerance {
    /// Span widening on each side
    pub lateral: f32,
    /// Max height of the feet above a top edge
    pub standing: f32,
}

impl Default for LocateTolerance {
    fn default() -> Self {
        Self {
            lateral: LATERAL_TOLERANCE,
            standing: STANDING_TOLERANCE,
        }
    }
}

/// Navigation graph for one platform set
#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    /// All navigation nodes, in platform input order
    pub nodes: Vec<NavNode>,
    /// Adjacency list of edges (edges[i] = edges from node i, sorted by target)
    pub edges: Vec<Vec<NavEdge>>,
    /// Jump profile the edges were computed with
    pub profile: JumpProfile,
    /// Registry revision this graph was built from (0 = not from a registry)
    pub built_for_revision: u64,
}

impl NavGraph {
    /// Build a graph from platform records. Non-walkable platforms are skipped.
    pub fn build(platforms: &[Platform], profile: JumpProfile) -> Self {
        let nodes: Vec<NavNode> = platforms
            .iter()
            .filter(|p| p.walkable)
            .enumerate()
            .map(|(id, p)| NavNode::from_platform(id, p))
            .collect();

        let mut edges = vec![Vec::new(); nodes.len()];
        for from in &nodes {
            for to in &nodes {
                if from.id == to.id {
                    continue;
                }
                if let Some(edge) = calculate_edge(from, to, &profile) {
                    edges[from.id].push(edge);
                }
            }
        }

        Self {
            nodes,
            edges,
            profile,
            built_for_revision: 0,
        }
    }

    /// Build from the registry, including authored links
    pub fn build_from_registry(registry: &PlatformRegistry, profile: JumpProfile) -> Self {
        let mut graph = Self::build(&registry.platforms, profile);
        for link in &registry.links {
            let (Some(from), Some(to)) = (
                graph.node_for_platform(&link.from),
                graph.node_for_platform(&link.to),
            ) else {
                warn!(
                    "Skipping link {} -> {}: not a walkable platform in level '{}'",
                    link.from, link.to, registry.level_name
                );
                continue;
            };
            graph.add_link(from, to);
        }
        graph.built_for_revision = registry.revision;
        graph.log_summary(&registry.level_name);
        graph
    }

    /// Add an authored edge unless the pair is already connected
    fn add_link(&mut self, from: NodeId, to: NodeId) {
        if from == to || self.has_edge(from, to) {
            return;
        }
        let edge = NavEdge {
            to_node: to,
            edge_type: EdgeType::Link,
            gap: self.nodes[from].horizontal_gap(&self.nodes[to]),
            cost: self.nodes[from].anchor.distance(self.nodes[to].anchor),
        };
        let list = &mut self.edges[from];
        let pos = list.partition_point(|e| e.to_node < to);
        list.insert(pos, edge);
    }

    pub fn node(&self, id: NodeId) -> Option<&NavNode> {
        self.nodes.get(id)
    }

    /// Find the node built from a platform label
    pub fn node_for_platform(&self, platform_id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.platform_id == platform_id)
    }

    /// Nodes directly reachable from `id`
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .get(id)
            .into_iter()
            .flat_map(|list| list.iter().map(|e| e.to_node))
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&NavEdge> {
        self.edges.get(from)?.iter().find(|e| e.to_node == to)
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edge(from, to).is_some()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|e| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find which node a body's feet are resting on (if any).
    /// Returns None when airborne between platforms.
    pub fn locate(&self, feet: Vec2, tolerance: &LocateTolerance) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.contains_x(feet.x, tolerance.lateral))
            .filter_map(|node| {
                // Positive = feet above the surface
                let height_above = node.surface_y_at(feet.x) - feet.y;
                if height_above >= -PENETRATION_ALLOWANCE && height_above <= tolerance.standing {
                    Some((node.id, height_above.abs()))
                } else {
                    None
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Find the nearest node at or below a position, i.e. the platform a
    /// falling body would land on.
    pub fn locate_support(&self, feet: Vec2, lateral_tolerance: f32) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.contains_x(feet.x, lateral_tolerance))
            .filter_map(|node| {
                let depth = node.surface_y_at(feet.x) - feet.y;
                if depth >= -PENETRATION_ALLOWANCE {
                    Some((node.id, depth))
                } else {
                    None
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Check that this graph was built from the registry's current platform set
    pub fn check_fresh(&self, registry: &PlatformRegistry) -> Result<(), NavError> {
        if self.built_for_revision == registry.revision {
            Ok(())
        } else {
            Err(NavError::StaleGraph {
                built_for: self.built_for_revision,
                current: registry.revision,
            })
        }
    }

    fn log_summary(&self, level_name: &str) {
        info!(
            "Nav graph built for '{}': {} nodes, {} total edges",
            level_name,
            self.nodes.len(),
            self.edge_count()
        );

        for node in &self.nodes {
            let edge_summary: Vec<String> = self.edges[node.id]
                .iter()
                .map(|e| {
                    let kind = match e.edge_type {
                        EdgeType::Walk => "W",
                        EdgeType::Jump => "J",
                        EdgeType::Drop => "D",
                        EdgeType::Link => "L",
                    };
                    format!("{}->{}({})", node.id, e.to_node, kind)
                })
                .collect();
            debug!(
                "  Node {} '{}' @ ({:.0}, {:.0}) x:[{:.0}, {:.0}] edges=[{}]",
                node.id,
                node.platform_id,
                node.anchor.x,
                node.top_y,
                node.left_x,
                node.right_x,
                edge_summary.join(", ")
            );
        }
    }
}

/// Calculate if an edge exists from one node to another and what type
fn calculate_edge(from: &NavNode, to: &NavNode, profile: &JumpProfile) -> Option<NavEdge> {
    // Positive = target is lower
    let vertical_delta = -from.rise_to(to);
    let gap = from.horizontal_gap(to);
    let cost = from.anchor.distance(to.anchor);

    // Falling onto a platform underneath needs no jump
    if vertical_delta > 0.0 && from.overlaps_x(to) && profile.can_fall(vertical_delta) {
        return Some(NavEdge {
            to_node: to.id,
            edge_type: EdgeType::Drop,
            gap,
            cost,
        });
    }

    if !profile.can_span(gap) || !profile.within_vertical_band(vertical_delta) {
        return None;
    }

    let margin = profile.jump_margin;
    let edge_type = if vertical_delta < -margin || gap > 0.0 && vertical_delta <= margin {
        EdgeType::Jump
    } else if vertical_delta > margin {
        EdgeType::Drop
    } else {
        EdgeType::Walk
    };

    Some(NavEdge {
        to_node: to.id,
        edge_type,
        gap,
        cost,
    })
}
