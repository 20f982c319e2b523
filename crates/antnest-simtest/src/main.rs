//! AntNest Headless Harness
//!
//! Builds nests in-process and validates routing, the route cache, the
//! builder strategy and save/load. No rendering, no game loop.
//!
//! Usage:
//!   cargo run -p antnest-simtest
//!   cargo run -p antnest-simtest -- --verbose
//!   cargo run -p antnest-simtest -- --seed 42 --overlay overlay.json

use antnest_core::debug::{DebugPanel, GridLayout};
use antnest_core::persistence::{self, SaveError};
use antnest_core::prelude::*;
use antnest_core::systems::choose_build_target;
use antnest_logic::find_route;
use rand::rngs::StdRng;
use rand::SeedableRng;

const DEFAULT_SEED: u64 = 0x5eed;
const RANDOM_PROBES: usize = 500;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let seed = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    let overlay_path = arg_value(&args, "--overlay");
    println!("=== AntNest Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Routes on the debug grid
    results.extend(validate_grid_routes(verbose));

    // 2. Route cache invalidation
    results.extend(validate_route_cache(verbose));

    // 3. Builder strategy and engine
    results.extend(validate_builder_strategy(verbose));

    // 4. Save/load
    results.extend(validate_persistence(verbose));

    // 5. Random route sweep
    results.extend(validate_random_routes(verbose, seed, overlay_path.as_deref()));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn grid(config: &NestConfig) -> Result<(NestRegistry, DebugPanel, GridLayout), String> {
    let mut registry = NestRegistry::with_config(config);
    let mut panel = DebugPanel::new(config);
    let layout = panel
        .rebuild_test_grid(&mut registry, config.grid_width, config.grid_height)
        .map_err(|e| e.to_string())?;
    Ok((registry, panel, layout))
}

fn setup_failure(name: &str, detail: String) -> Vec<TestResult> {
    vec![TestResult {
        name: name.into(),
        passed: false,
        detail,
    }]
}

fn center(registry: &NestRegistry, layout: &GridLayout, x: u32, y: u32) -> Option<NodeId> {
    registry.find_node(layout.room_at(x, y)?, "center")
}

fn is_edge_chain(registry: &NestRegistry, route: &Route) -> bool {
    route
        .nodes()
        .windows(2)
        .all(|w| registry.graph().is_linked(w[0], w[1]))
}

// ── 1. Grid routes ──────────────────────────────────────────────────────

fn validate_grid_routes(verbose: bool) -> Vec<TestResult> {
    println!("--- Grid Routes ---");
    let config = NestConfig::default();
    let (mut registry, panel, layout) = match grid(&config) {
        Ok(g) => g,
        Err(e) => return setup_failure("grid_build", e),
    };
    let mut results = Vec::new();

    let stats = panel.stats(&registry);
    let expected_roads = (config.grid_width - 1) * config.grid_height
        + config.grid_width * (config.grid_height - 1);
    results.push(TestResult {
        name: "grid_shape".into(),
        passed: layout.rooms.len() == (config.grid_width * config.grid_height) as usize
            && layout.roads.len() == expected_roads as usize
            && stats.element_edges == 2 * expected_roads as usize,
        detail: format!(
            "{} rooms, {} roads, {} element edges, {} nodes",
            layout.rooms.len(),
            layout.roads.len(),
            stats.element_edges,
            stats.nodes
        ),
    });

    let (w, h) = (config.grid_width - 1, config.grid_height - 1);
    let (Some(from), Some(to)) = (center(&registry, &layout, 0, 0), center(&registry, &layout, w, h)) else {
        results.push(TestResult {
            name: "grid_corners".into(),
            passed: false,
            detail: "corner rooms have no center node".into(),
        });
        return results;
    };

    let route = registry.find_route(from, to);
    let (passed, detail) = match &route {
        Ok(Some(r)) => {
            let steps = (w + h) as usize;
            let cost = r.cost(registry.graph());
            let expected_cost = w as f32 * config.grid_spacing_x + h as f32 * config.grid_spacing_y;
            (
                r.origin() == from
                    && r.destination() == to
                    && r.len() == 1 + 5 * steps
                    && (cost - expected_cost).abs() < 1e-3
                    && is_edge_chain(&registry, r),
                format!("{} nodes, cost {:.2} (expected {:.2})", r.len(), cost, expected_cost),
            )
        }
        Ok(None) => (false, "corners disconnected".into()),
        Err(e) => (false, e.to_string()),
    };
    results.push(TestResult {
        name: "grid_corner_route".into(),
        passed,
        detail,
    });

    if verbose {
        if let Ok(Some(r)) = &route {
            let names: Vec<String> = r
                .nodes()
                .iter()
                .filter_map(|&n| registry.node(n))
                .map(|n| format!("{}:{}", n.host, n.name))
                .collect();
            println!("  corner route: {}", names.join(" → "));
        }
    }

    let same = registry.find_route(from, from);
    results.push(TestResult {
        name: "grid_same_node".into(),
        passed: matches!(&same, Ok(Some(r)) if r.len() == 1 && r.origin() == from),
        detail: "from == to → single-node route".into(),
    });

    let fresh = find_route(registry.graph(), from, to);
    results.push(TestResult {
        name: "grid_deterministic".into(),
        passed: fresh == route,
        detail: "repeat search matches".into(),
    });

    results
}

// ── 2. Route cache ──────────────────────────────────────────────────────

fn validate_route_cache(_verbose: bool) -> Vec<TestResult> {
    println!("--- Route Cache ---");
    let config = NestConfig::default();
    let (mut registry, _, layout) = match grid(&config) {
        Ok(g) => g,
        Err(e) => return setup_failure("cache_grid_build", e),
    };
    let mut results = Vec::new();

    let (Some(from), Some(to)) = (center(&registry, &layout, 0, 0), center(&registry, &layout, 1, 0)) else {
        return setup_failure("cache_nodes", "grid rooms have no center node".into());
    };

    let first = registry.find_route(from, to);
    let hits = registry.cache().hits();
    let second = registry.find_route(from, to);
    results.push(TestResult {
        name: "cache_hit_transparent".into(),
        passed: first == second && registry.cache().hits() == hits + 1,
        detail: format!("{} hits, {} misses", registry.cache().hits(), registry.cache().misses()),
    });

    // Cut every road out of the corner room
    let corner = layout.room_at(0, 0);
    let touching: Vec<ElementId> = registry
        .element_edges()
        .filter(|e| corner.is_some_and(|c| e.touches(c)))
        .map(|e| if Some(e.a_host) == corner { e.b_host } else { e.a_host })
        .collect();
    let mut removal_ok = true;
    for road in touching {
        removal_ok &= registry.remove_element(road).is_ok();
        removal_ok &= registry.cache().is_empty();
    }
    results.push(TestResult {
        name: "cache_cleared_on_removal".into(),
        passed: removal_ok,
        detail: "cache empty after each road removal".into(),
    });

    let isolated = registry.find_route(from, to);
    results.push(TestResult {
        name: "cache_no_stale_route".into(),
        passed: isolated == Ok(None),
        detail: "isolated room → no route".into(),
    });

    results
}

// ── 3. Builder strategy ─────────────────────────────────────────────────

fn validate_builder_strategy(_verbose: bool) -> Vec<TestResult> {
    println!("--- Builder Strategy ---");
    let mut results = Vec::new();
    let mut engine = NestEngine::default();
    let mut panel = DebugPanel::new(&engine.config);
    let layout = match panel.rebuild_test_grid(&mut engine.registry, 2, 1) {
        Ok(l) => l,
        Err(e) => return setup_failure("strategy_grid_build", e.to_string()),
    };
    let Some(home) = center(&engine.registry, &layout, 0, 0) else {
        return setup_failure("strategy_home", "home room has no center".into());
    };

    results.push(TestResult {
        name: "strategy_no_sites".into(),
        passed: choose_build_target(&mut engine.registry, Some(home)).is_none(),
        detail: "nothing under construction → stay idle".into(),
    });

    let lone = engine
        .registry
        .add_element(ElementRecord::new(ElementData::room(Vec3::planar(0.0, 20.0), true)), true);
    results.push(TestResult {
        name: "strategy_unreachable_site".into(),
        passed: lone.is_some() && choose_build_target(&mut engine.registry, Some(home)).is_none(),
        detail: "disconnected site → stay idle".into(),
    });

    // Connect a second site above the right room and let a builder walk there
    let site = engine
        .registry
        .add_element(ElementRecord::new(ElementData::room(Vec3::planar(2.0, 4.0), true)), true);
    let linked = site.and_then(|s| {
        let top = engine.registry.find_node(layout.room_at(1, 0)?, "top")?;
        let bottom = engine.registry.find_node(s, "bottom")?;
        engine.registry.connect(top, bottom).ok()
    });
    let start = engine.registry.node(home).map(|n| n.position).unwrap_or_default();
    let ant = engine
        .registry
        .add_agent(AgentRecord::new(AgentData::Builder, start), true);
    let entity = ant.and_then(|id| engine.registry.agent(id)).map(|a| a.entity);

    for _ in 0..120 {
        engine.update(0.25);
    }
    let building = entity
        .and_then(|e| engine.registry.world().get::<&Behavior>(e).ok().map(|b| (*b).clone()));
    results.push(TestResult {
        name: "strategy_builder_arrives".into(),
        passed: linked.is_some() && site.is_some() && building == site.map(|s| Behavior::Building { element: s }),
        detail: format!("after {:.1}s: {:?}", engine.sim_time(), building),
    });

    let completed = site.map(|s| engine.registry.complete_construction(s));
    engine.update(0.25);
    let released = entity
        .and_then(|e| engine.registry.world().get::<&Behavior>(e).ok().map(|b| b.is_idle()))
        .unwrap_or(false);
    results.push(TestResult {
        name: "strategy_builder_released".into(),
        passed: completed == Some(Ok(true)) && released,
        detail: "completed site → builder idle".into(),
    });

    results
}

// ── 4. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let config = NestConfig::default();
    let (mut registry, mut panel, _) = match grid(&config) {
        Ok(g) => g,
        Err(e) => return setup_failure("persist_grid_build", e),
    };
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
    panel.spawn_debug_ant(&mut registry, &mut rng);
    registry.add_agent(
        AgentRecord::new(AgentData::Ergate(ErgateData::default()), Vec3::ZERO),
        true,
    );
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    let binary = persistence::save_nest(&mut buffer, registry.data(), 3.0)
        .and_then(|_| persistence::load_nest(&buffer[..]));
    results.push(TestResult {
        name: "persist_binary_roundtrip".into(),
        passed: matches!(&binary, Ok(l) if &l.nest == registry.data()),
        detail: format!("{} bytes", buffer.len()),
    });

    let json = persistence::export_json(registry.data(), 3.0);
    let imported = json.as_ref().map_err(|e| e.to_string()).and_then(|j| {
        persistence::import_json(j).map_err(|e| e.to_string())
    });
    results.push(TestResult {
        name: "persist_json_roundtrip".into(),
        passed: matches!(&imported, Ok(l) if &l.nest == registry.data()),
        detail: json.as_ref().map(|j| format!("{} chars", j.len())).unwrap_or_default(),
    });

    let tampered = json
        .unwrap_or_default()
        .replacen("\"version\": 1", "\"version\": 0", 1);
    results.push(TestResult {
        name: "persist_version_check".into(),
        passed: matches!(
            persistence::import_json(&tampered),
            Err(SaveError::VersionMismatch { found: 0, .. })
        ),
        detail: "old save rejected".into(),
    });

    let mut reloaded = NestRegistry::with_config(&config);
    reloaded.load(registry.data().clone());
    results.push(TestResult {
        name: "persist_reload_counts".into(),
        passed: reloaded.element_count() == registry.element_count()
            && reloaded.edge_count() == registry.edge_count()
            && reloaded.agent_count() == registry.agent_count(),
        detail: format!(
            "{} elements, {} edges, {} ants",
            reloaded.element_count(),
            reloaded.edge_count(),
            reloaded.agent_count()
        ),
    });

    results
}

// ── 5. Random routes ────────────────────────────────────────────────────

fn validate_random_routes(verbose: bool, seed: u64, overlay_path: Option<&str>) -> Vec<TestResult> {
    println!("--- Random Routes (seed {}) ---", seed);
    let config = NestConfig::default();
    let (mut registry, mut panel, _) = match grid(&config) {
        Ok(g) => g,
        Err(e) => return setup_failure("random_grid_build", e),
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let mut results = Vec::new();

    let mut failures = Vec::new();
    for i in 0..RANDOM_PROBES {
        match panel.random_route_test(&mut registry, &mut rng) {
            Ok(Some(sample)) => {
                let ok = sample.route.as_ref().is_some_and(|r| {
                    r.origin() == sample.from && r.destination() == sample.to && is_edge_chain(&registry, r)
                });
                let uncached = find_route(registry.graph(), sample.from, sample.to);
                if !ok || uncached != Ok(sample.route.clone()) {
                    failures.push(format!("#{} {} → {}", i, sample.from, sample.to));
                }
            }
            Ok(None) => failures.push(format!("#{} empty nest", i)),
            Err(e) => failures.push(format!("#{} {}", i, e)),
        }
    }
    let stats = panel.stats(&registry);
    results.push(TestResult {
        name: "random_routes_valid".into(),
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            format!(
                "{} samples, {} cached, {} hits",
                RANDOM_PROBES, stats.cached_routes, stats.cache_hits
            )
        } else {
            format!("{} bad: {}", failures.len(), failures.join(", "))
        },
    });

    if verbose {
        if let Some(route) = panel.latest_route() {
            println!("  latest route: {} hops", route.hops());
        }
    }

    if let Some(path) = overlay_path {
        let overlay = panel.graph_overlay(&registry);
        let written = serde_json::to_string_pretty(&overlay)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        results.push(TestResult {
            name: "overlay_written".into(),
            passed: written.is_ok(),
            detail: match written {
                Ok(()) => format!(
                    "{}: {} local, {} element, {} route segments",
                    path,
                    overlay.local_edges.len(),
                    overlay.element_edges.len(),
                    overlay.latest_route.len()
                ),
                Err(e) => e,
            },
        });
    }

    results
}
