mod common;

use common::cult_world;
use lore_gen::interp::{ExecutionContext, find_candidates, select};
use lore_gen::model::{Prominence, SelectionRule};
use lore_gen::testutil::{GraphBuilder, rng};

fn rule(json: &str) -> SelectionRule {
    serde_json::from_str(json).expect("selection JSON should parse")
}

#[test]
fn by_prominence_floor_excludes_below_includes_above() {
    // Populations of every rank; the floor must cut exactly between
    // marginal and recognized.
    let mut b = GraphBuilder::new();
    let mut below = Vec::new();
    let mut at_or_above = Vec::new();
    for (i, rank) in [
        Prominence::Forgotten,
        Prominence::Marginal,
        Prominence::Recognized,
        Prominence::Renowned,
        Prominence::Mythic,
    ]
    .iter()
    .enumerate()
    {
        for j in 0..3 {
            let id = b.npc(&format!("npc-{i}-{j}")).prominence(*rank).id();
            if *rank >= Prominence::Recognized {
                at_or_above.push(id);
            } else {
                below.push(id);
            }
        }
    }
    let mut graph = b.build();
    let mut seed = rng(1);
    let mut ctx = ExecutionContext::new(&mut graph, &mut seed, None);

    let selected = select(
        &rule(r#"{"strategy": "by_prominence", "kind": "npc", "min_prominence": "recognized"}"#),
        &mut ctx,
    );
    for id in &below {
        assert!(!selected.contains(id), "rank below floor leaked in: {id}");
    }
    for id in &at_or_above {
        assert!(selected.contains(id), "rank at/above floor missing: {id}");
    }
}

#[test]
fn proximity_selection_uses_reference_coordinates() {
    let mut world = cult_world();
    let mut seed = rng(2);
    let mut ctx = ExecutionContext::new(&mut world.graph, &mut seed, None);

    // The prophet stands near the shrine; the hermit is far away
    let near_shrine = select(
        &rule(&format!(
            r#"{{"strategy": "by_proximity", "kind": "npc", "reference": {}, "radius": 25.0}}"#,
            world.shrine
        )),
        &mut ctx,
    );
    assert_eq!(near_shrine, vec![world.prophet]);
}

#[test]
fn filter_chain_composes_with_strategy() {
    let mut world = cult_world();
    let mut seed = rng(3);
    let mut ctx = ExecutionContext::new(&mut world.graph, &mut seed, None);

    // NPCs lacking a faction membership
    let unaffiliated = find_candidates(
        &rule(
            r#"{
                "strategy": "by_kind", "kind": "npc",
                "filters": [{"type": "lacks_relationship", "relationship": "member_of"}]
            }"#,
        ),
        &mut ctx,
    );
    assert_eq!(unaffiliated, vec![world.hermit]);

    // Graph-path filter: NPCs whose membership leads to a cult
    let cultists = find_candidates(
        &rule(
            r#"{
                "strategy": "by_kind", "kind": "npc",
                "filters": [{"type": "graph_path", "path": {
                    "steps": [{"relationship": "member_of", "direction": "out",
                               "target_subtype": "cult"}],
                    "check": {"type": "exists"}
                }}]
            }"#,
        ),
        &mut ctx,
    );
    assert_eq!(cultists, vec![world.prophet]);
}

#[test]
fn preference_order_walks_subtype_priorities() {
    let mut world = cult_world();
    let mut seed = rng(4);
    let mut ctx = ExecutionContext::new(&mut world.graph, &mut seed, None);

    // No "witch" exists, so the hermit wins the second priority
    let picked = select(
        &rule(
            r#"{"strategy": "by_preference_order", "kind": "npc",
                "preference": ["witch", "hermit", "prophet"]}"#,
        ),
        &mut ctx,
    );
    assert_eq!(picked, vec![world.hermit]);
}

#[test]
fn pick_policies_shape_the_result() {
    let mut b = GraphBuilder::new();
    let ids: Vec<u64> = (0..5).map(|i| b.npc(&format!("N{i}")).id()).collect();
    let mut graph = b.build();
    let mut seed = rng(5);
    let mut ctx = ExecutionContext::new(&mut graph, &mut seed, None);

    let all = select(&rule(r#"{"strategy": "by_kind", "kind": "npc"}"#), &mut ctx);
    assert_eq!(all, ids);

    let first = select(
        &rule(r#"{"strategy": "by_kind", "kind": "npc", "pick": "first"}"#),
        &mut ctx,
    );
    assert_eq!(first, vec![ids[0]]);

    for _ in 0..10 {
        let random = select(
            &rule(r#"{"strategy": "by_kind", "kind": "npc", "pick": "random"}"#),
            &mut ctx,
        );
        assert_eq!(random.len(), 1);
        assert!(ids.contains(&random[0]));
    }
}
