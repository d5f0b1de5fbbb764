use lore_gen::model::*;
use lore_gen::testutil::GraphBuilder;
use lore_gen::{MemoryGraph, Template};

pub struct CultWorld {
    pub graph: MemoryGraph,
    pub prophet: u64,
    pub hermit: u64,
    pub shrine: u64,
    pub faction: u64,
    pub region: u64,
}

/// A small world: one region, a shrine in it, a prophet and a hermit, and a
/// faction the prophet belongs to. Dread pressure is elevated.
pub fn cult_world() -> CultWorld {
    let mut b = GraphBuilder::at_tick(10);
    b.era("age_of_ash").pressure("dread", 0.6);
    let region = b.region("Mirefen", 100.0, 100.0);
    let shrine = b
        .location("Sunken Shrine")
        .subtype("shrine")
        .position(110.0, 90.0)
        .prominence(Prominence::Recognized)
        .id();
    let prophet = b
        .npc("Vesna")
        .subtype("prophet")
        .culture("mirefolk")
        .position(105.0, 95.0)
        .id();
    let hermit = b.npc("Orrin").subtype("hermit").position(400.0, 400.0).id();
    let faction = b.faction("Ashen Circle").subtype("cult").id();
    b.relate(prophet, RelationshipKind::MemberOf, faction);
    b.relate(shrine, RelationshipKind::LocatedIn, region);
    CultWorld {
        graph: b.build(),
        prophet,
        hermit,
        shrine,
        faction,
        region,
    }
}

pub fn parse_template(json: &str) -> Template {
    serde_json::from_str(json).expect("template JSON should parse")
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
