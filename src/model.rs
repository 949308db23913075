use crate::types::Type;
use serde::Deserialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    pub fn parse(name: &str) -> Option<Side> {
        match name.to_ascii_lowercase().as_str() {
            "a" | "0" | "team1" => Some(Side::A),
            "b" | "1" | "team2" => Some(Side::B),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonVolatileStatus {
    #[default]
    None,
    Burn,
    Paralysis,
    Poison,
    Toxic,
    Sleep,
    Freeze,
    #[serde(other)]
    Unknown,
}

impl NonVolatileStatus {
    /// Statuses with a dedicated one-hot slot, in encoding order.
    pub const ENCODED: [NonVolatileStatus; 6] = [
        NonVolatileStatus::Burn,
        NonVolatileStatus::Paralysis,
        NonVolatileStatus::Toxic,
        NonVolatileStatus::Poison,
        NonVolatileStatus::Sleep,
        NonVolatileStatus::Freeze,
    ];

    pub fn is_none(self) -> bool {
        matches!(self, NonVolatileStatus::None)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Stat {
    Hp,
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    Accuracy,
    Evasion,
}

impl Stat {
    pub const STAGED: [Stat; 7] = [
        Stat::Atk,
        Stat::Def,
        Stat::Spa,
        Stat::Spd,
        Stat::Spe,
        Stat::Accuracy,
        Stat::Evasion,
    ];

    /// Stats compared as current/initial ratios.
    pub const BATTLE: [Stat; 5] = [Stat::Atk, Stat::Def, Stat::Spa, Stat::Spd, Stat::Spe];

    pub fn is_offensive(self) -> bool {
        matches!(self, Stat::Atk | Stat::Spa | Stat::Spe)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub hp: i32,
    #[serde(default)]
    pub atk: i32,
    #[serde(default)]
    pub def: i32,
    #[serde(default)]
    pub spa: i32,
    #[serde(default)]
    pub spd: i32,
    #[serde(default)]
    pub spe: i32,
    #[serde(default)]
    pub acc: i32,
    #[serde(default)]
    pub eva: i32,
}

impl Stats {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Atk => self.atk,
            Stat::Def => self.def,
            Stat::Spa => self.spa,
            Stat::Spd => self.spd,
            Stat::Spe => self.spe,
            Stat::Accuracy => self.acc,
            Stat::Evasion => self.eva,
        }
    }
}

/// Stage modifiers, each in `[-6, 6]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StatBoosts {
    #[serde(default)]
    pub atk: i8,
    #[serde(default)]
    pub def: i8,
    #[serde(default)]
    pub spa: i8,
    #[serde(default)]
    pub spd: i8,
    #[serde(default)]
    pub spe: i8,
    #[serde(default)]
    pub acc: i8,
    #[serde(default)]
    pub eva: i8,
}

pub const MIN_STAGE: i8 = -6;
pub const MAX_STAGE: i8 = 6;

impl StatBoosts {
    /// Stage of `stat`, clamped to the legal range. HP has no stage.
    pub fn get(&self, stat: Stat) -> i8 {
        let raw = match stat {
            Stat::Hp => 0,
            Stat::Atk => self.atk,
            Stat::Def => self.def,
            Stat::Spa => self.spa,
            Stat::Spd => self.spd,
            Stat::Spe => self.spe,
            Stat::Accuracy => self.acc,
            Stat::Evasion => self.eva,
        };
        raw.clamp(MIN_STAGE, MAX_STAGE)
    }

    pub fn offensive_total(&self) -> i32 {
        [Stat::Atk, Stat::Spa, Stat::Spe]
            .iter()
            .map(|&stat| self.get(stat) as i32)
            .sum()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum VolatileFlag {
    Confused,
    Flinched,
    Seeded,
    Trapped,
    FocusEnergy,
    Substitute,
}

impl VolatileFlag {
    pub const TRACKED: [VolatileFlag; 6] = [
        VolatileFlag::Confused,
        VolatileFlag::Flinched,
        VolatileFlag::Seeded,
        VolatileFlag::Trapped,
        VolatileFlag::FocusEnergy,
        VolatileFlag::Substitute,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct VolatileFlags {
    #[serde(default)]
    pub confused: bool,
    #[serde(default)]
    pub flinched: bool,
    #[serde(default)]
    pub seeded: bool,
    #[serde(default)]
    pub trapped: bool,
    #[serde(default)]
    pub focus_energy: bool,
    #[serde(default)]
    pub substitute: bool,
}

impl VolatileFlags {
    pub fn has(&self, flag: VolatileFlag) -> bool {
        match flag {
            VolatileFlag::Confused => self.confused,
            VolatileFlag::Flinched => self.flinched,
            VolatileFlag::Seeded => self.seeded,
            VolatileFlag::Trapped => self.trapped,
            VolatileFlag::FocusEnergy => self.focus_energy,
            VolatileFlag::Substitute => self.substitute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Move {
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: Type,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub accuracy: Option<u32>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub disabled_turns: u8,
}

fn default_level() -> u8 {
    50
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pokemon {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default)]
    pub types: Vec<Type>,
    pub initial: Stats,
    pub current: Stats,
    #[serde(default)]
    pub stages: StatBoosts,
    #[serde(default)]
    pub status: NonVolatileStatus,
    #[serde(default)]
    pub volatile: VolatileFlags,
    #[serde(default)]
    pub moves: Vec<Move>,
}

impl Pokemon {
    pub fn is_fainted(&self) -> bool {
        self.current.hp <= 0
    }

    /// Current/initial HP in `[0, 1]`; 0 when the initial HP is not positive.
    pub fn hp_fraction(&self) -> f32 {
        self.stat_ratio(Stat::Hp)
    }

    pub fn stat_ratio(&self, stat: Stat) -> f32 {
        let initial = self.initial.get(stat);
        if initial <= 0 {
            return 0.0;
        }
        (self.current.get(stat) as f32 / initial as f32).clamp(0.0, 1.0)
    }

    /// At most the first two types; the engine may pad with duplicates.
    pub fn typing(&self) -> &[Type] {
        let len = self.types.len().min(2);
        if len == 2 && self.types[0] == self.types[1] {
            &self.types[..1]
        } else {
            &self.types[..len]
        }
    }

    pub fn has_type(&self, t: Type) -> bool {
        self.typing().contains(&t)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Team {
    /// `None` marks a slot whose occupant has not been revealed.
    #[serde(default)]
    pub slots: Vec<Option<Pokemon>>,
    #[serde(default)]
    pub active: Option<usize>,
}

pub const MAX_TEAM_SIZE: usize = 6;

impl Team {
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, idx: usize) -> Option<&Pokemon> {
        self.slots.get(idx).and_then(|slot| slot.as_ref())
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.filter(|&idx| self.get(idx).is_some())
    }

    pub fn active_pokemon(&self) -> Option<&Pokemon> {
        self.active.and_then(|idx| self.get(idx))
    }

    pub fn members(&self) -> impl Iterator<Item = (usize, &Pokemon)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|p| (idx, p)))
    }

    pub fn alive(&self) -> impl Iterator<Item = (usize, &Pokemon)> {
        self.members().filter(|(_, p)| !p.is_fainted())
    }

    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    pub fn is_fully_fainted(&self) -> bool {
        self.alive_count() == 0
    }

    pub fn total_hp(&self) -> i64 {
        self.alive().map(|(_, p)| p.current.hp.max(0) as i64).sum()
    }

    /// Initial HP summed over members that have not fainted.
    pub fn total_initial_hp(&self) -> i64 {
        self.alive().map(|(_, p)| p.initial.hp.max(0) as i64).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BattleState {
    pub teams: [Team; 2],
    #[serde(default)]
    pub is_over: bool,
}

impl BattleState {
    pub fn new(team_a: Team, team_b: Team) -> Self {
        Self {
            teams: [team_a, team_b],
            is_over: false,
        }
    }

    pub fn team(&self, side: Side) -> &Team {
        &self.teams[side.index()]
    }

    pub fn active(&self, side: Side) -> Option<&Pokemon> {
        self.team(side).active_pokemon()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Move(Move),
    Switch(usize),
}

impl Action {
    pub fn as_move(&self) -> Option<&Move> {
        match self {
            Action::Move(mv) => Some(mv),
            Action::Switch(_) => None,
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Action::Switch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hp: i32) -> Stats {
        Stats {
            hp,
            atk: 100,
            def: 100,
            spa: 100,
            spd: 100,
            spe: 100,
            acc: 100,
            eva: 100,
        }
    }

    fn mon(current_hp: i32) -> Pokemon {
        Pokemon {
            name: "Eevee".to_string(),
            level: 50,
            types: vec![Type::Normal, Type::Normal],
            initial: stats(100),
            current: stats(current_hp),
            stages: StatBoosts::default(),
            status: NonVolatileStatus::None,
            volatile: VolatileFlags::default(),
            moves: Vec::new(),
        }
    }

    #[test]
    fn fainted_is_derived_from_hp() {
        assert!(mon(0).is_fainted());
        assert!(mon(-5).is_fainted());
        assert!(!mon(1).is_fainted());
    }

    #[test]
    fn hp_fraction_is_clamped_and_guarded() {
        assert_eq!(mon(150).hp_fraction(), 1.0);
        assert_eq!(mon(-10).hp_fraction(), 0.0);
        let mut broken = mon(10);
        broken.initial.hp = 0;
        assert_eq!(broken.hp_fraction(), 0.0);
    }

    #[test]
    fn duplicated_type_counts_once() {
        assert_eq!(mon(10).typing(), &[Type::Normal]);
    }

    #[test]
    fn stages_are_clamped() {
        let boosts = StatBoosts {
            atk: 9,
            eva: -8,
            ..StatBoosts::default()
        };
        assert_eq!(boosts.get(Stat::Atk), 6);
        assert_eq!(boosts.get(Stat::Evasion), -6);
        assert_eq!(boosts.get(Stat::Hp), 0);
    }

    #[test]
    fn team_ignores_hidden_and_fainted_slots() {
        let team = Team {
            slots: vec![Some(mon(40)), None, Some(mon(0)), Some(mon(60))],
            active: Some(0),
        };
        assert_eq!(team.size(), 4);
        assert_eq!(team.alive_count(), 2);
        assert_eq!(team.total_hp(), 100);
        assert_eq!(team.total_initial_hp(), 200);
        assert!(!team.is_fully_fainted());
        let hidden_active = Team {
            active: Some(1),
            ..team
        };
        assert!(hidden_active.active_pokemon().is_none());
    }

    #[test]
    fn snapshot_parses_from_engine_json() {
        let raw = r#"{
            "teams": [
                {"slots": [{"name": "Charizard", "types": ["fire", "flying"],
                            "initial": {"hp": 150, "spe": 100},
                            "current": {"hp": 75, "spe": 100},
                            "status": "burn",
                            "volatile": {"confused": true},
                            "moves": [{"name": "Flamethrower", "type": "fire",
                                       "category": "special", "power": 90, "accuracy": 100}]}],
                 "active": 0},
                {"slots": [null], "active": null}
            ],
            "is_over": false
        }"#;
        let state: BattleState = serde_json::from_str(raw).expect("snapshot parses");
        let me = state.active(Side::A).expect("active present");
        assert_eq!(me.level, 50);
        assert_eq!(me.status, NonVolatileStatus::Burn);
        assert!(me.volatile.has(VolatileFlag::Confused));
        assert_eq!(me.moves[0].priority, 0);
        assert_eq!(me.hp_fraction(), 0.5);
        assert!(state.active(Side::B).is_none());
    }

    #[test]
    fn unknown_enum_values_fall_back() {
        let status: NonVolatileStatus = serde_json::from_str("\"frostbite\"").expect("parses");
        assert_eq!(status, NonVolatileStatus::Unknown);
        let category: MoveCategory = serde_json::from_str("\"z-move\"").expect("parses");
        assert_eq!(category, MoveCategory::Unknown);
    }

    #[test]
    fn actions_parse_externally_tagged() {
        let action: Action = serde_json::from_str(r#"{"switch": 3}"#).expect("parses");
        assert_eq!(action, Action::Switch(3));
        assert!(action.as_move().is_none());
    }
}
