mod common;

use common::{cult_world, parse_template};
use lore_gen::interp::Endpoint;
use lore_gen::model::*;
use lore_gen::testutil::{GraphBuilder, rng};
use lore_gen::{GraphView, TemplateAdapter, TemplateError, commit_expansion};

#[test]
fn single_npc_world_applies_and_targets_it() {
    // One applicability rule, by_kind selection with random pick, one NPC.
    let template = parse_template(
        r#"{
            "id": "t", "name": "T",
            "applicability": [{"type": "entity_count_min", "kind": "npc", "min": 1}],
            "selection": {"strategy": "by_kind", "kind": "npc", "pick": "random"}
        }"#,
    );
    let adapter = TemplateAdapter::new(template);
    let mut b = GraphBuilder::new();
    let only = b.npc("Sole").id();
    let mut graph = b.build();
    let mut seed = rng(1);

    assert!(adapter.can_apply(&mut graph, &mut seed));
    assert_eq!(adapter.find_targets(&mut graph, &mut seed), vec![only]);
}

#[test]
fn count_range_two_two_always_two_unique_placeholders() {
    let template = parse_template(
        r#"{
            "id": "t", "name": "T",
            "selection": {"strategy": "by_kind", "kind": "npc"},
            "creations": [{"kind": "npc", "count": {"min": 2, "max": 2},
                           "subtype": {"type": "literal", "value": "cultist"}}]
        }"#,
    );
    let adapter = TemplateAdapter::new(template);
    let mut b = GraphBuilder::new();
    let target = b.npc("T").id();
    let mut graph = b.build();

    for seed in 0..10 {
        let mut seeded = rng(seed);
        let result = adapter.expand(&mut graph, &mut seeded, target).unwrap();
        assert_eq!(result.entities.len(), 2);
        assert_ne!(result.entities[0].placeholder, result.entities[1].placeholder);
    }
}

#[test]
fn empty_culture_spec_fails_synchronously_never_defaults() {
    let template = parse_template(
        r#"{
            "id": "t", "name": "T",
            "selection": {"strategy": "by_kind", "kind": "npc"},
            "creations": [{"kind": "npc", "culture": {}}]
        }"#,
    );
    let adapter = TemplateAdapter::new(template);
    let mut b = GraphBuilder::new();
    let target = b.npc("T").id();
    let mut graph = b.build();
    let mut seed = rng(1);

    let err = adapter.expand(&mut graph, &mut seed, target).unwrap_err();
    assert!(matches!(err, TemplateError::InvalidCultureSpec { .. }));
}

#[test]
fn bidirectional_rules_always_pair_up() {
    let template = parse_template(
        r#"{
            "id": "t", "name": "T",
            "selection": {"strategy": "by_kind", "kind": "npc"},
            "creations": [{"kind": "npc", "label": "newcomers", "count": 3}],
            "relationships": [{"kind": "allied_with", "source": "new:newcomers",
                               "dest": "$target", "bidirectional": true}]
        }"#,
    );
    let adapter = TemplateAdapter::new(template);
    let mut b = GraphBuilder::new();
    let target = b.npc("T").id();
    let mut graph = b.build();
    let mut seed = rng(7);

    let result = adapter.expand(&mut graph, &mut seed, target).unwrap();
    assert_eq!(result.relationships.len() % 2, 0);
    for pair in result.relationships.chunks(2) {
        assert_eq!(pair[0].kind, pair[1].kind);
        assert_eq!(pair[0].source, pair[1].dest);
        assert_eq!(pair[0].dest, pair[1].source);
    }
}

#[test]
fn full_cult_rising_expansion_commits_cleanly() {
    let template = parse_template(
        r#"{
            "id": "cult_rising",
            "name": "Cult Rising",
            "variables": [
                {"name": "patron", "source": "global", "kind": "npc",
                 "subtype": "prophet", "pick": "first", "fallback": "$target"}
            ],
            "applicability": [
                {"type": "pressure_threshold", "pressure": "dread", "min": 0.3},
                {"type": "entity_count_min", "kind": "location", "subtype": "shrine", "min": 1}
            ],
            "selection": {"strategy": "by_kind", "kind": "location",
                          "subtypes": ["shrine"], "pick": "first"},
            "creations": [
                {"kind": "faction", "label": "cult",
                 "subtype": {"type": "from_pressure", "map": [
                     {"pressure": "dread", "subtype": "doom_cult"},
                     {"pressure": "hope", "subtype": "mystery_cult"}]},
                 "culture": {"inherit": "$patron", "fixed": "drifters"},
                 "description": {"type": "template",
                                 "text": "Gathered around $patron.name at $target.name"}},
                {"kind": "npc", "label": "devotees", "count": {"min": 2, "max": 2},
                 "subtype": {"type": "literal", "value": "cultist"},
                 "placement": {"anchor": "entity", "entity": "$target", "max_distance": 10.0}}
            ],
            "relationships": [
                {"kind": "member_of", "source": "$patron", "dest": "new:cult"},
                {"kind": "member_of", "source": "new:devotees", "dest": "new:cult",
                 "catalyst": "$patron"},
                {"kind": "located_in", "source": "new:cult", "dest": "$target"}
            ],
            "state_updates": [
                {"type": "rate_limit_bump"},
                {"type": "pressure_delta", "pressure": "dread", "delta": -0.2}
            ]
        }"#,
    );
    let adapter = TemplateAdapter::new(template);
    let mut world = cult_world();
    let mut seed = rng(11);

    assert!(adapter.can_apply(&mut world.graph, &mut seed));
    let targets = adapter.find_targets(&mut world.graph, &mut seed);
    assert_eq!(targets, vec![world.shrine]);

    let result = adapter.expand(&mut world.graph, &mut seed, world.shrine).unwrap();
    // 1 faction + 2 devotees
    assert_eq!(result.entities.len(), 3);
    let cult = &result.entities[0];
    assert_eq!(cult.subtype, "doom_cult");
    assert_eq!(cult.culture.as_deref(), Some("mirefolk"));
    assert_eq!(cult.description, "Gathered around Vesna at Sunken Shrine");
    // Devotees were placed near the shrine inside the Mirefen region
    for devotee in &result.entities[1..] {
        assert!(devotee.position.is_some());
        assert_eq!(devotee.region_ids, vec![world.region]);
    }
    // patron->cult, 2x devotee->cult, cult->shrine
    assert_eq!(result.relationships.len(), 4);
    let catalyzed = result
        .relationships
        .iter()
        .filter(|r| r.catalyst == Some(Endpoint::Existing(world.prophet)))
        .count();
    assert_eq!(catalyzed, 2);

    // Side effects land immediately
    assert_eq!(world.graph.last_creation_tick("cult_rising"), Some(10));
    lore_gen::testutil::assert_approx(
        world.graph.pressure("dread"),
        0.4,
        1e-9,
        "dread after delta",
    );

    // Committing allocates permanent ids and re-resolves placeholders
    let before = world.graph.entities.len();
    let ids = commit_expansion(&mut world.graph, &result);
    assert_eq!(world.graph.entities.len(), before + 3);
    assert!(world.graph.has_relationship(
        world.prophet,
        &RelationshipKind::MemberOf,
        Direction::Out,
        Some(ids[0])
    ));
    assert!(world.graph.has_relationship(
        ids[1],
        &RelationshipKind::MemberOf,
        Direction::Out,
        Some(ids[0])
    ));
    assert!(world.graph.has_relationship(
        ids[0],
        &RelationshipKind::LocatedIn,
        Direction::Out,
        Some(world.shrine)
    ));
}

#[test]
fn reference_misses_keep_failure_local_to_one_rule() {
    // The second relationship rule references an unset variable; the first
    // still lands, and state updates against missing entities are skipped.
    let template = parse_template(
        r#"{
            "id": "t", "name": "T",
            "selection": {"strategy": "by_kind", "kind": "npc"},
            "creations": [{"kind": "location", "label": "camp"}],
            "relationships": [
                {"kind": "located_in", "source": "$target", "dest": "new:camp"},
                {"kind": "member_of", "source": "$missing_var", "dest": "new:camp"}
            ],
            "state_updates": [
                {"type": "set_tag", "entity": "$missing_var", "tag": "x", "value": 1},
                {"type": "pressure_delta", "pressure": "strife", "delta": 0.5}
            ]
        }"#,
    );
    let adapter = TemplateAdapter::new(template);
    let mut b = GraphBuilder::new();
    let target = b.npc("T").id();
    let mut graph = b.build();
    let mut seed = rng(13);

    let result = adapter.expand(&mut graph, &mut seed, target).unwrap();
    assert_eq!(result.relationships.len(), 1);
    assert_eq!(result.relationships[0].source, Endpoint::Existing(target));
    // The pressure update after the skipped one still ran
    lore_gen::testutil::assert_approx(graph.pressure("strife"), 0.5, 1e-9, "strife");
}

#[test]
fn archived_relationships_drop_out_of_traversal() {
    let template = parse_template(
        r#"{
            "id": "t", "name": "T",
            "selection": {"strategy": "by_kind", "kind": "npc"},
            "state_updates": [
                {"type": "archive_relationship", "source": "$target",
                 "dest": "$rival", "kind": "rival_of"}
            ],
            "variables": [
                {"name": "rival", "source": "related", "from": "$target",
                 "relationship": "rival_of", "direction": "out", "pick": "first"}
            ]
        }"#,
    );
    let adapter = TemplateAdapter::new(template);
    let mut b = GraphBuilder::new();
    let a = b.npc("A").id();
    let r = b.npc("R").id();
    b.relate(a, RelationshipKind::RivalOf, r);
    let mut graph = b.build();
    let mut seed = rng(17);

    adapter.expand(&mut graph, &mut seed, a).unwrap();
    assert!(!graph.has_relationship(a, &RelationshipKind::RivalOf, Direction::Out, Some(r)));
    // The record survives as history
    assert_eq!(graph.relationships.len(), 1);
    assert!(graph.relationships[0].archived);
}
