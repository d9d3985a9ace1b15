//! Default collection used when no usable snapshot exists.

use crate::model::technology::{Resource, Technology};
use uuid::Uuid;

/// Fixed ids so that a seeded collection is identical across processes.
const SEED_IDS: [Uuid; 4] = [
    Uuid::from_u128(0x5ee0_0000_0000_4000_8000_0000_0000_0001),
    Uuid::from_u128(0x5ee0_0000_0000_4000_8000_0000_0000_0002),
    Uuid::from_u128(0x5ee0_0000_0000_4000_8000_0000_0000_0003),
    Uuid::from_u128(0x5ee0_0000_0000_4000_8000_0000_0000_0004),
];

/// Returns the deterministic seed collection.
pub fn seed_technologies() -> Vec<Technology> {
    vec![
        seeded(
            SEED_IDS[0],
            "React",
            "Component-based UI library: JSX, hooks, state management.",
            vec![Resource::new("Official docs", "https://react.dev")],
        ),
        seeded(
            SEED_IDS[1],
            "Node.js",
            "JavaScript runtime for servers, tooling and scripts.",
            vec![Resource::new("Learn Node.js", "https://nodejs.org/en/learn")],
        ),
        seeded(
            SEED_IDS[2],
            "TypeScript",
            "Static typing for JavaScript projects.",
            vec![Resource::new(
                "Handbook",
                "https://www.typescriptlang.org/docs/handbook/",
            )],
        ),
        seeded(
            SEED_IDS[3],
            "Rust",
            "Systems programming with ownership and zero-cost abstractions.",
            vec![
                Resource::new("The Book", "https://doc.rust-lang.org/book/"),
                Resource::new("Rust by Example", "https://doc.rust-lang.org/rust-by-example/"),
            ],
        ),
    ]
}

fn seeded(id: Uuid, title: &str, description: &str, resources: Vec<Resource>) -> Technology {
    let mut technology = Technology::with_id(id, title);
    technology.description = Some(description.to_string());
    technology.resources = resources;
    technology
}
