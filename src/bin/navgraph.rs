//! Nav Graph Tool - Inspect the navigation graph for a level
//!
//! Builds the platform graph with the current bot tuning and prints its
//! nodes and edges, optional paths between two platforms, the walkability
//! grid, and an all-pairs reachability matrix.
//!
//! Usage:
//!   cargo run --bin navgraph
//!   cargo run --bin navgraph -- --level Gaps --path platform-west platform-perch
//!   cargo run --bin navgraph -- assets/levels.txt --reachability --grid

use rayon::prelude::*;

use tagbot::ai::{
    EdgeType, NavGraph, NodeId, WalkGrid, find_path, find_path_fewest_hops, find_path_with_cost,
};
use tagbot::constants::LEVELS_FILE;
use tagbot::levels::{LevelDatabase, PlatformRegistry};
use tagbot::tuning::{BOT_TUNING_FILE, load_bot_tuning};

fn main() {
    let config = NavGraphConfig::from_args();

    if config.show_help {
        print_help();
        return;
    }

    let level_db = LevelDatabase::load_from_file(&config.levels_file);
    let level = match &config.level {
        Some(name) => level_db.find(name),
        None => level_db.get(0),
    };
    let Some(level) = level else {
        eprintln!(
            "Level {:?} not found. Available: {:?}",
            config.level,
            level_db.levels.iter().map(|l| &l.name).collect::<Vec<_>>()
        );
        std::process::exit(1);
    };

    let tuning = load_bot_tuning(&config.tuning_file);
    let registry = PlatformRegistry::from_level(level);
    let graph = NavGraph::build_from_registry(&registry, tuning.jump_profile());

    println!("============================================================");
    println!(
        "Level '{}' ({:.0} x {:.0}): {} nodes, {} edges",
        registry.level_name,
        registry.world_size.x,
        registry.world_size.y,
        graph.nodes.len(),
        graph.edge_count()
    );
    println!(
        "Jump reach {:.0}, height {:.0}, max fall {}",
        graph.profile.max_reach,
        graph.profile.max_height,
        graph
            .profile
            .max_fall
            .map_or("unbounded".to_string(), |f| format!("{:.0}", f))
    );
    println!("============================================================\n");
    print_graph(&graph);

    if let Some((from, to)) = &config.path {
        print_paths(&graph, from, to);
        if config.grid {
            print_grid_path(&graph, &registry, from, to);
        }
    }

    if config.grid {
        let grid = WalkGrid::from_registry(&registry);
        println!(
            "\nWalk grid {} x {} (cell {:.0}), {} open cells:",
            grid.cols,
            grid.rows,
            grid.cell_size,
            grid.open_count()
        );
        print!("{}", grid.to_ascii());
    }

    if config.reachability {
        print_reachability(&graph);
    }
}

/// Configuration for the navgraph tool
struct NavGraphConfig {
    levels_file: String,
    tuning_file: String,
    level: Option<String>,
    path: Option<(String, String)>,
    grid: bool,
    reachability: bool,
    show_help: bool,
}

impl Default for NavGraphConfig {
    fn default() -> Self {
        Self {
            levels_file: LEVELS_FILE.to_string(),
            tuning_file: BOT_TUNING_FILE.to_string(),
            level: None,
            path: None,
            grid: false,
            reachability: false,
            show_help: false,
        }
    }
}

impl NavGraphConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--level" | "-l" => {
                    if i + 1 < args.len() {
                        config.level = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--tuning" => {
                    if i + 1 < args.len() {
                        config.tuning_file = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--path" | "-p" => {
                    if i + 2 < args.len() {
                        config.path = Some((args[i + 1].clone(), args[i + 2].clone()));
                        i += 2;
                    }
                }
                "--grid" => {
                    config.grid = true;
                }
                "--reachability" | "-r" => {
                    config.reachability = true;
                }
                "--help" | "-h" => {
                    config.show_help = true;
                }
                arg if !arg.starts_with('-') => {
                    // Positional argument: levels file
                    config.levels_file = arg.to_string();
                }
                _ => {}
            }
            i += 1;
        }

        config
    }
}

fn print_help() {
    println!(
        r#"Nav Graph Tool - Inspect the navigation graph for a level

USAGE:
    cargo run --bin navgraph -- [LEVELS_FILE] [OPTIONS]

ARGUMENTS:
    LEVELS_FILE              Levels file (default: assets/levels.txt)

OPTIONS:
    --level, -l <NAME>       Level to inspect (default: first level)
    --tuning <FILE>          Bot tuning JSON (default: config/bot_tuning.json)
    --path, -p <FROM> <TO>   Print A* and fewest-hop paths between two platforms
    --grid                   Print the walkability grid (and grid path with --path)
    --reachability, -r       Print the all-pairs reachability matrix
    --help, -h               Show this help
"#
    );
}

fn edge_symbol(edge_type: EdgeType) -> &'static str {
    match edge_type {
        EdgeType::Walk => "walk",
        EdgeType::Jump => "jump",
        EdgeType::Drop => "drop",
        EdgeType::Link => "link",
    }
}

fn print_graph(graph: &NavGraph) {
    for node in &graph.nodes {
        println!(
            "[{:2}] {:<28} x:[{:6.0}, {:6.0}] top {:6.0} slope {:+.2}",
            node.id, node.platform_id, node.left_x, node.right_x, node.top_y, node.slope
        );
        for edge in &graph.edges[node.id] {
            let target = &graph.nodes[edge.to_node];
            println!(
                "       -> [{:2}] {:<28} {:<4} gap {:5.0} cost {:6.0}",
                target.id,
                target.platform_id,
                edge_symbol(edge.edge_type),
                edge.gap,
                edge.cost
            );
        }
    }
}

fn lookup(graph: &NavGraph, label: &str) -> Option<NodeId> {
    let node = graph.node_for_platform(label);
    if node.is_none() {
        eprintln!("'{}' is not a walkable platform in this level", label);
    }
    node
}

fn path_labels(graph: &NavGraph, path: &[NodeId]) -> String {
    path.iter()
        .map(|&id| graph.nodes[id].platform_id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn print_paths(graph: &NavGraph, from: &str, to: &str) {
    let (Some(start), Some(goal)) = (lookup(graph, from), lookup(graph, to)) else {
        return;
    };

    println!("\nPath {} -> {}:", from, to);
    match find_path_with_cost(graph, start, goal) {
        Some(result) if start == goal => {
            println!("  Already there (cost {:.0})", result.total_cost);
        }
        Some(result) => {
            println!(
                "  A*   ({} hops, cost {:.0}): {}",
                result.nodes.len(),
                result.total_cost,
                path_labels(graph, &result.nodes)
            );
        }
        None => println!("  A*   no path"),
    }

    let hops = find_path_fewest_hops(graph, start, goal);
    if hops.is_empty() {
        println!("  BFS  no path");
    } else {
        println!("  BFS  ({} hops): {}", hops.len(), path_labels(graph, &hops));
    }
}

fn print_grid_path(graph: &NavGraph, registry: &PlatformRegistry, from: &str, to: &str) {
    let (Some(start), Some(goal)) = (lookup(graph, from), lookup(graph, to)) else {
        return;
    };

    let grid = WalkGrid::from_registry(registry);
    // Cells just below the top edge lie inside the platform body
    let inside = |id: NodeId| graph.nodes[id].anchor + bevy::math::Vec2::new(0.0, 1.0);
    let start_cell = grid.world_to_grid(inside(start));
    let goal_cell = grid.world_to_grid(inside(goal));

    let cells = grid.find_grid_path(start_cell, goal_cell);
    if cells.is_empty() && start_cell != goal_cell {
        println!("  Grid no path between {:?} and {:?}", start_cell, goal_cell);
    } else {
        println!("  Grid ({} cells) {:?} -> {:?}", cells.len(), start_cell, goal_cell);
    }
}

fn print_reachability(graph: &NavGraph) {
    let n = graph.nodes.len();
    let rows: Vec<Vec<bool>> = (0..n)
        .into_par_iter()
        .map(|from| {
            (0..n)
                .map(|to| from == to || !find_path(graph, from, to).is_empty())
                .collect()
        })
        .collect();

    println!("\nReachability (row = from, col = to):");
    let header: String = (0..n).map(|i| format!("{:3}", i)).collect();
    println!("     {}", header);
    for (from, row) in rows.iter().enumerate() {
        let cells: String = row
            .iter()
            .map(|&reachable| if reachable { "  X" } else { "  ." })
            .collect();
        println!("[{:2}] {}", from, cells);
    }

    let unreachable: usize = rows.iter().flatten().filter(|&&r| !r).count();
    println!("\n{} of {} ordered pairs unreachable", unreachable, n * n);
}
