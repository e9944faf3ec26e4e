//! Built-in harbor town used when no roster is configured

use saltwake_core::Cell;
use saltwake_game::{parse_roster, ContentError, InteractionKind, NpcRecord};
use saltwake_world::{GridError, LocationTable, ObstacleMap};

/// `#` walls, `~` water, `.` walkable
const HARBOR: &str = "
    ################################
    #......#.......#.......#.......#
    #......#.......#.......#.......#
    #......###.#####.......###.#####
    #..............................#
    #..............................#
    ####.#####.........#######.#####
    #........#.........#...........#
    #........#.........#...........#
    #........####.######...........#
    #..............................#
    #..............................#
    ~~~~~..~~~~~~~~~~~~..~~~~~~~~~~~
    ~~~~~..~~~~~~~~~~~~..~~~~~~~~~~~
    ~~~~~..~~~~~~~~~~~~..~~~~~~~~~~~
    ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
";

const PLACES: &[(&str, Cell)] = &[
    ("tavern", Cell::new(4, 4)),
    ("tavern_bar", Cell::new(2, 2)),
    ("tavern_kitchen", Cell::new(5, 1)),
    ("tavern_room", Cell::new(1, 1)),
    ("market_stall", Cell::new(12, 5)),
    ("fish_market", Cell::new(8, 10)),
    ("plaza_center", Cell::new(15, 8)),
    ("mansion_gate", Cell::new(27, 4)),
    ("barracks", Cell::new(24, 8)),
    ("dock_main", Cell::new(5, 11)),
    ("pier_end_1", Cell::new(5, 14)),
    ("pier_end_2", Cell::new(20, 14)),
    ("beach_path", Cell::new(28, 11)),
    ("hideout", Cell::new(29, 7)),
    ("cottage_a", Cell::new(9, 1)),
    ("cottage_b", Cell::new(12, 2)),
    ("cottage_c", Cell::new(19, 1)),
];

const ROSTER: &str = r#"[
    {
        "name": "Marta",
        "archetype": "merchant",
        "home": "cottage_a",
        "loved_gifts": ["silk"],
        "disliked_gifts": ["bilge_water"]
    },
    {
        "name": "Old Finn",
        "archetype": "fisherman",
        "home": "cottage_b",
        "loved_gifts": ["pearl"],
        "disliked_gifts": ["seaweed"],
        "stats": { "speed": 2.5 }
    },
    { "name": "Bess", "archetype": "tavern_keeper", "home": "tavern_room" },
    { "name": "Gus", "archetype": "guard", "home": "barracks" },
    { "name": "Red Ned", "archetype": "pirate", "home": "hideout" },
    { "name": "Pip", "archetype": "villager", "home": "cottage_c" }
]"#;

/// Where the player starts
pub const PLAYER_START: Cell = Cell::new(14, 10);

/// What the scripted player does to an NPC
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Interact(InteractionKind),
    Gift(&'static str),
    EndDialogue,
}

/// Scripted player: (tick, NPC name, action)
pub const SCRIPT: &[(u64, &str, Action)] = &[
    (5, "Pip", Action::Interact(InteractionKind::Talk)),
    (8, "Pip", Action::EndDialogue),
    (20, "Old Finn", Action::Gift("pearl")),
    (25, "Marta", Action::Interact(InteractionKind::Compliment)),
    (40, "Gus", Action::Interact(InteractionKind::Insult)),
];

pub fn harbor_map() -> Result<ObstacleMap, GridError> {
    ObstacleMap::from_ascii(HARBOR)
}

pub fn harbor_locations() -> LocationTable {
    let mut table = LocationTable::new();
    for (name, cell) in PLACES {
        table.insert(*name, *cell);
    }
    table
}

pub fn roster() -> Result<Vec<NpcRecord>, ContentError> {
    parse_roster(ROSTER)
}
