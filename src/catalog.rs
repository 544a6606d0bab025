//! Static game data: zones, badges, natures and localized labels
//!
//! Zone order is load-bearing: a zone's position in [`ZONES`] is the
//! Pokémon-card slot it occupies in every run block.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Every encounter zone of the Run & Bun romhack, in card order.
pub const ZONES: [&str; 75] = [
    "Starter",
    "Littleroot Town",
    "Route 101",
    "Oldale Town",
    "Route 103",
    "Route 102",
    "Petalburg City",
    "Route 104",
    "Dewford Town",
    "Route 107",
    "Route 106",
    "Granite Cave",
    "Route 109",
    "Slateport City",
    "Route 110",
    "Petalburg Woods",
    "Rustboro City",
    "Route 115",
    "Route 116",
    "Rusturf Tunnel",
    "Verdanturf Town",
    "Route 117",
    "Mauville City",
    "Route 111",
    "Route 118",
    "Altering Cave",
    "Mirage Tower",
    "Route 113",
    "Fallarbor Town",
    "Desert Underpass",
    "Route 114",
    "Meteor Falls",
    "Route 112",
    "Fiery Path",
    "Mt. Chimney",
    "Jagged Pass",
    "Lavaridge Town",
    "Route 134",
    "New Mauville",
    "Route 105",
    "Route 108",
    "Abandoned Ship",
    "Route 119",
    "Fortree City",
    "Route 120",
    "Scorched Slab",
    "Route 121",
    "Safari Zone",
    "Lilycove City",
    "Route 122",
    "Route 123",
    "Mt. Pyre",
    "Magma Hideout",
    "Aqua Hideout",
    "Route 124",
    "Mossdeep City",
    "Route 125",
    "Shoal Cave",
    "Route 127",
    "Route 124 Underwater",
    "Route 126",
    "Route 126 Underwater",
    "Sootopolis City",
    "Route 128",
    "Route 129",
    "Ever Grande City",
    "Seafloor Cavern",
    "Cave of Origin",
    "Route 130",
    "Route 131",
    "Pacifidlog Town",
    "Route 132",
    "Route 133",
    "Sky Pillar",
    "Victory Road",
];

/// Gym badges in the order they are earned. The names are keys of the
/// `Sprites` lookup sheet.
pub const BADGES: [&str; 8] = [
    "Knuckle Badge",
    "Stone Badge",
    "Dynamo Badge",
    "Balance Badge",
    "Heat Badge",
    "Feather Badge",
    "Mind Badge",
    "Rain Badge",
];

/// Slot of a zone in the catalog, if it exists.
pub fn zone_index(zone: &str) -> Option<usize> {
    ZONE_INDEX.get(zone).copied()
}

lazy_static::lazy_static! {
    static ref ZONE_INDEX: HashMap<&'static str, usize> =
        ZONES.iter().enumerate().map(|(i, z)| (*z, i)).collect();

    static ref NATURE_BY_NAME: HashMap<&'static str, Nature> = Nature::ALL
        .iter()
        .flat_map(|n| [(n.name(Lang::En), *n), (n.name(Lang::Fr), *n)])
        .collect();
}

/// Display language requested by the companion app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Lang {
    #[default]
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "FR")]
    Fr,
}

impl Lang {
    pub fn run_start(self) -> &'static str {
        match self {
            Lang::En => "Run start",
            Lang::Fr => "Début de la run",
        }
    }

    pub fn run_end(self) -> &'static str {
        match self {
            Lang::En => "Run end",
            Lang::Fr => "Fin de la run",
        }
    }

    pub fn won_battles(self) -> &'static str {
        match self {
            Lang::En => "Won battles",
            Lang::Fr => "Combats gagnés",
        }
    }

    pub fn dead_pokemon(self) -> &'static str {
        match self {
            Lang::En => "Dead Pokémon",
            Lang::Fr => "Pokémons morts",
        }
    }

    pub fn gym_badges(self) -> &'static str {
        match self {
            Lang::En => "Gym Badges",
            Lang::Fr => "Badges",
        }
    }

    pub fn level(self) -> &'static str {
        match self {
            Lang::En => "Level",
            Lang::Fr => "Niveau",
        }
    }

    /// Short stat labels, indexed like [`Stat::index`].
    pub fn stat_names(self) -> [&'static str; 6] {
        match self {
            Lang::En => ["HP", "Attack", "Defense", "Sp. Atk", "Sp. Def", "Speed"],
            Lang::Fr => ["PV", "Attaque", "Défense", "Atq. Spé", "Def. Spé", "Vitesse"],
        }
    }
}

/// The six battle stats, in the order IVs are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Hp,
    Attack,
    Defense,
    SpAtk,
    SpDef,
    Speed,
}

impl Stat {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Pokémon nature. Each non-neutral nature raises one stat and lowers another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nature {
    Hardy,
    Lonely,
    Brave,
    Adamant,
    Naughty,
    Bold,
    Docile,
    Relaxed,
    Impish,
    Lax,
    Timid,
    Hasty,
    Serious,
    Jolly,
    Naive,
    Modest,
    Mild,
    Quiet,
    Bashful,
    Rash,
    Calm,
    Gentle,
    Sassy,
    Careful,
    Quirky,
}

impl Nature {
    pub const ALL: [Nature; 25] = [
        Nature::Hardy,
        Nature::Lonely,
        Nature::Brave,
        Nature::Adamant,
        Nature::Naughty,
        Nature::Bold,
        Nature::Docile,
        Nature::Relaxed,
        Nature::Impish,
        Nature::Lax,
        Nature::Timid,
        Nature::Hasty,
        Nature::Serious,
        Nature::Jolly,
        Nature::Naive,
        Nature::Modest,
        Nature::Mild,
        Nature::Quiet,
        Nature::Bashful,
        Nature::Rash,
        Nature::Calm,
        Nature::Gentle,
        Nature::Sassy,
        Nature::Careful,
        Nature::Quirky,
    ];

    /// Look a nature up by its English or French name.
    pub fn from_name(name: &str) -> Option<Nature> {
        NATURE_BY_NAME.get(name.trim()).copied()
    }

    /// `(buffed, debuffed)` stats. Neutral natures return `(None, None)`.
    pub fn modifiers(self) -> (Option<Stat>, Option<Stat>) {
        use Nature::*;
        use Stat::*;
        let (up, down) = match self {
            Hardy | Docile | Serious | Bashful | Quirky => return (None, None),
            Lonely => (Attack, Defense),
            Brave => (Attack, Speed),
            Adamant => (Attack, SpAtk),
            Naughty => (Attack, SpDef),
            Bold => (Defense, Attack),
            Relaxed => (Defense, Speed),
            Impish => (Defense, SpAtk),
            Lax => (Defense, SpDef),
            Timid => (Speed, Attack),
            Hasty => (Speed, Defense),
            Jolly => (Speed, SpAtk),
            Naive => (Speed, SpDef),
            Modest => (SpAtk, Attack),
            Mild => (SpAtk, Defense),
            Quiet => (SpAtk, Speed),
            Rash => (SpAtk, SpDef),
            Calm => (SpDef, Attack),
            Gentle => (SpDef, Defense),
            Sassy => (SpDef, Speed),
            Careful => (SpDef, SpAtk),
        };
        (Some(up), Some(down))
    }

    pub fn name(self, lang: Lang) -> &'static str {
        use Nature::*;
        match lang {
            Lang::En => match self {
                Hardy => "Hardy",
                Lonely => "Lonely",
                Brave => "Brave",
                Adamant => "Adamant",
                Naughty => "Naughty",
                Bold => "Bold",
                Docile => "Docile",
                Relaxed => "Relaxed",
                Impish => "Impish",
                Lax => "Lax",
                Timid => "Timid",
                Hasty => "Hasty",
                Serious => "Serious",
                Jolly => "Jolly",
                Naive => "Naive",
                Modest => "Modest",
                Mild => "Mild",
                Quiet => "Quiet",
                Bashful => "Bashful",
                Rash => "Rash",
                Calm => "Calm",
                Gentle => "Gentle",
                Sassy => "Sassy",
                Careful => "Careful",
                Quirky => "Quirky",
            },
            Lang::Fr => match self {
                Hardy => "Hardi",
                Lonely => "Solo",
                Brave => "Brave",
                Adamant => "Rigide",
                Naughty => "Mauvais",
                Bold => "Assuré",
                Docile => "Docile",
                Relaxed => "Relax",
                Impish => "Malin",
                Lax => "Lâche",
                Timid => "Timide",
                Hasty => "Pressé",
                Serious => "Sérieux",
                Jolly => "Jovial",
                Naive => "Naïf",
                Modest => "Modeste",
                Mild => "Doux",
                Quiet => "Discret",
                Bashful => "Pudique",
                Rash => "Foufou",
                Calm => "Calme",
                Gentle => "Gentil",
                Sassy => "Malpoli",
                Careful => "Prudent",
                Quirky => "Bizarre",
            },
        }
    }
}
