use once_cell::sync::Lazy;
use serde::Deserialize;

/// Elemental type of a Pokémon or a move.
///
/// `Typeless` covers anything the engine reports that is not one of the
/// eighteen real types; it is neutral in both directions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
    #[serde(other)]
    Typeless,
}

impl Type {
    pub const COUNT: usize = 19;

    /// Number of real elemental types; `Typeless` sorts after them.
    pub const ELEMENTAL: usize = 18;

    pub const ALL: [Type; Type::COUNT] = [
        Type::Normal,
        Type::Fire,
        Type::Water,
        Type::Electric,
        Type::Grass,
        Type::Ice,
        Type::Fighting,
        Type::Poison,
        Type::Ground,
        Type::Flying,
        Type::Psychic,
        Type::Bug,
        Type::Rock,
        Type::Ghost,
        Type::Dragon,
        Type::Dark,
        Type::Steel,
        Type::Fairy,
        Type::Typeless,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn parse(name: &str) -> Option<Type> {
        match name.to_ascii_lowercase().as_str() {
            "normal" => Some(Type::Normal),
            "fire" => Some(Type::Fire),
            "water" => Some(Type::Water),
            "electric" => Some(Type::Electric),
            "grass" => Some(Type::Grass),
            "ice" => Some(Type::Ice),
            "fighting" => Some(Type::Fighting),
            "poison" => Some(Type::Poison),
            "ground" => Some(Type::Ground),
            "flying" => Some(Type::Flying),
            "psychic" => Some(Type::Psychic),
            "bug" => Some(Type::Bug),
            "rock" => Some(Type::Rock),
            "ghost" => Some(Type::Ghost),
            "dragon" => Some(Type::Dragon),
            "dark" => Some(Type::Dark),
            "steel" => Some(Type::Steel),
            "fairy" => Some(Type::Fairy),
            "typeless" | "???" => Some(Type::Typeless),
            _ => None,
        }
    }
}

/// Largest multiplier a single move can reach against a dual-type defender.
pub const MAX_EFFECTIVENESS: f32 = 4.0;

// Ref: pokemon-showdown/sim/dex-data.ts: type chart multipliers, indexed [attacker][defender].
static TYPE_CHART: Lazy<[[f32; Type::COUNT]; Type::COUNT]> = Lazy::new(|| {
    let mut chart = [[1.0; Type::COUNT]; Type::COUNT];
    for attacking in Type::ALL {
        for defending in Type::ALL {
            chart[attacking.index()][defending.index()] = chart_entry(attacking, defending);
        }
    }
    chart
});

pub fn effectiveness(attacking: Type, defending: Type) -> f32 {
    TYPE_CHART[attacking.index()][defending.index()]
}

/// Multiplier of a move type against every type of the defender, multiplied together.
pub fn type_effectiveness(move_type: Type, target_types: &[Type]) -> f32 {
    target_types
        .iter()
        .take(2)
        .map(|&defending| effectiveness(move_type, defending))
        .product()
}

/// Best multiplier any of `attacker_types` reaches against any of `defender_types`.
///
/// Returns 0 when either side has no types.
pub fn best_single_matchup(attacker_types: &[Type], defender_types: &[Type]) -> f32 {
    let mut best = 0.0f32;
    for &attacking in attacker_types.iter().take(2) {
        for &defending in defender_types.iter().take(2) {
            best = best.max(effectiveness(attacking, defending));
        }
    }
    best
}

fn chart_entry(attacking: Type, defending: Type) -> f32 {
    use Type::*;
    match attacking {
        Normal => match defending {
            Rock | Steel => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Fire => match defending {
            Fire | Water | Rock | Dragon => 0.5,
            Grass | Ice | Bug | Steel => 2.0,
            _ => 1.0,
        },
        Water => match defending {
            Water | Grass | Dragon => 0.5,
            Fire | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Electric => match defending {
            Electric | Grass | Dragon => 0.5,
            Water | Flying => 2.0,
            Ground => 0.0,
            _ => 1.0,
        },
        Grass => match defending {
            Fire | Grass | Poison | Flying | Bug | Dragon | Steel => 0.5,
            Water | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Ice => match defending {
            Fire | Water | Ice | Steel => 0.5,
            Grass | Ground | Flying | Dragon => 2.0,
            _ => 1.0,
        },
        Fighting => match defending {
            Normal | Ice | Rock | Dark | Steel => 2.0,
            Poison | Flying | Psychic | Bug | Fairy => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Poison => match defending {
            Grass | Fairy => 2.0,
            Poison | Ground | Rock | Ghost => 0.5,
            Steel => 0.0,
            _ => 1.0,
        },
        Ground => match defending {
            Fire | Electric | Poison | Rock | Steel => 2.0,
            Grass | Bug => 0.5,
            Flying => 0.0,
            _ => 1.0,
        },
        Flying => match defending {
            Grass | Fighting | Bug => 2.0,
            Electric | Rock | Steel => 0.5,
            _ => 1.0,
        },
        Psychic => match defending {
            Fighting | Poison => 2.0,
            Psychic | Steel => 0.5,
            Dark => 0.0,
            _ => 1.0,
        },
        Bug => match defending {
            Grass | Psychic | Dark => 2.0,
            Fire | Fighting | Poison | Flying | Ghost | Steel | Fairy => 0.5,
            _ => 1.0,
        },
        Rock => match defending {
            Fire | Ice | Flying | Bug => 2.0,
            Fighting | Ground | Steel => 0.5,
            _ => 1.0,
        },
        Ghost => match defending {
            Ghost | Psychic => 2.0,
            Dark => 0.5,
            Normal => 0.0,
            _ => 1.0,
        },
        Dragon => match defending {
            Dragon => 2.0,
            Steel => 0.5,
            Fairy => 0.0,
            _ => 1.0,
        },
        Dark => match defending {
            Psychic | Ghost => 2.0,
            Fighting | Dark | Fairy => 0.5,
            _ => 1.0,
        },
        Steel => match defending {
            Rock | Ice | Fairy => 2.0,
            Fire | Water | Electric | Steel => 0.5,
            _ => 1.0,
        },
        Fairy => match defending {
            Fighting | Dragon | Dark => 2.0,
            Fire | Poison | Steel => 0.5,
            _ => 1.0,
        },
        Typeless => 1.0,
    }
}
