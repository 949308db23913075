//! Fixed-length observation vectors for the value function.
//!
//! Layout of the default 85-wide vector (groups never move; padding or
//! truncation to a configured width only touches the tail):
//!
//! | range  | group                                                  |
//! |--------|--------------------------------------------------------|
//! | 0..20  | own active Pokémon                                     |
//! | 20..40 | opposing active Pokémon                                |
//! | 40..44 | own team aggregates                                    |
//! | 44..48 | opposing team aggregates                               |
//! | 48..54 | matchup between the two active Pokémon                 |
//! | 54..60 | own volatile flags                                     |
//! | 60..66 | opposing volatile flags                                |
//! | 66..82 | candidate action                                       |
//! | 82..85 | battle context                                         |

use crate::model::{
    Action, BattleState, MoveCategory, NonVolatileStatus, Pokemon, Side, Stat, Team, VolatileFlag,
    MAX_STAGE, MAX_TEAM_SIZE, MIN_STAGE,
};
use crate::types::{best_single_matchup, type_effectiveness, Type, MAX_EFFECTIVENESS};
use phf::phf_set;
use serde::Deserialize;

pub const POKEMON_FEATURES: usize = 1 + Stat::BATTLE.len() + 1 + NonVolatileStatus::ENCODED.len() + Stat::STAGED.len();
pub const TEAM_FEATURES: usize = 4;
pub const MATCHUP_FEATURES: usize = 6;
pub const VOLATILE_FEATURES: usize = VolatileFlag::TRACKED.len();
pub const ACTION_FEATURES: usize = 16;
pub const CONTEXT_FEATURES: usize = 3;

/// Width of every group laid end to end.
pub const NATURAL_LEN: usize = 2 * POKEMON_FEATURES
    + 2 * TEAM_FEATURES
    + MATCHUP_FEATURES
    + 2 * VOLATILE_FEATURES
    + ACTION_FEATURES
    + CONTEXT_FEATURES;

pub const FEATURE_LEN: usize = NATURAL_LEN;

pub const ACTION_OFFSET: usize =
    2 * POKEMON_FEATURES + 2 * TEAM_FEATURES + MATCHUP_FEATURES + 2 * VOLATILE_FEATURES;

pub const MAX_LEVEL: f32 = 100.0;
pub const POWER_CEILING: f32 = 250.0;
pub const LOW_POWER_THRESHOLD: u32 = 40;

const PRIORITY_SHIFT: f32 = 7.0;
const PRIORITY_SPAN: f32 = 12.0;

// Lowercased substrings; both display names and engine ids are covered.
static PIVOT_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "u-turn",
    "uturn",
    "volt switch",
    "voltswitch",
    "flip turn",
    "flipturn",
};

static SETUP_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "dance",
    "swords",
    "calm mind",
    "calmmind",
    "quiver",
};

fn name_matches(name: &str, keywords: &phf::Set<&'static str>) -> bool {
    let lowered = name.to_ascii_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}

pub fn is_pivot_move(name: &str) -> bool {
    name_matches(name, &PIVOT_KEYWORDS)
}

pub fn is_setup_move(name: &str) -> bool {
    name_matches(name, &SETUP_KEYWORDS)
}

/// Damaging move weaker than `threshold`.
pub fn is_low_power(power: Option<u32>, threshold: u32) -> bool {
    matches!(power, Some(p) if p > 0 && p < threshold)
}

/// Maps a stage in `[-6, 6]` onto `[0, 1]`.
pub fn normalize_stage(stage: i8) -> f32 {
    let clamped = stage.clamp(MIN_STAGE, MAX_STAGE) as f32;
    (clamped - MIN_STAGE as f32) / (MAX_STAGE - MIN_STAGE) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub feature_len: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            feature_len: FEATURE_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEncoder {
    side: Side,
    feature_len: usize,
}

impl FeatureEncoder {
    pub fn new(side: Side, config: EncoderConfig) -> Self {
        Self {
            side,
            feature_len: config.feature_len,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.feature_len
    }

    pub fn is_empty(&self) -> bool {
        self.feature_len == 0
    }

    pub fn encode(&self, state: &BattleState, action: Option<&Action>) -> Vec<f32> {
        let my_team = state.team(self.side);
        let opp_team = state.team(self.side.opponent());
        let mine = my_team.active_pokemon();
        let theirs = opp_team.active_pokemon();

        let mut out = FeatureWriter::with_capacity(NATURAL_LEN.max(self.feature_len));
        pokemon_features(&mut out, mine);
        pokemon_features(&mut out, theirs);
        team_features(&mut out, my_team);
        team_features(&mut out, opp_team);
        matchup_features(&mut out, mine, theirs);
        volatile_features(&mut out, mine);
        volatile_features(&mut out, theirs);
        action_features(&mut out, action, mine, theirs);

        out.flag(state.is_over);
        out.flag(mine.is_some_and(|p| !p.is_fainted()));
        out.flag(theirs.is_some_and(|p| !p.is_fainted()));

        debug_assert_eq!(out.values.len(), NATURAL_LEN);
        out.finish(self.feature_len)
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(NATURAL_LEN);
        for prefix in ["my", "opp"] {
            names.push(format!("{prefix}_hp"));
            for stat in Stat::BATTLE {
                names.push(format!("{prefix}_{}_ratio", stat_label(stat)));
            }
            names.push(format!("{prefix}_level"));
            for status in NonVolatileStatus::ENCODED {
                names.push(format!("{prefix}_status_{}", status_label(status)));
            }
            for stat in Stat::STAGED {
                names.push(format!("{prefix}_{}_stage", stat_label(stat)));
            }
        }
        for prefix in ["my_team", "opp_team"] {
            for label in ["alive_frac", "hp_ratio", "has_reserve", "alive_norm"] {
                names.push(format!("{prefix}_{label}"));
            }
        }
        for label in [
            "faster",
            "my_best_type",
            "opp_best_type",
            "my_hp",
            "opp_hp",
            "boost_lead",
        ] {
            names.push(format!("matchup_{label}"));
        }
        for prefix in ["my", "opp"] {
            for flag in VolatileFlag::TRACKED {
                names.push(format!("{prefix}_{}", flag_label(flag)));
            }
        }
        for label in [
            "is_switch",
            "power",
            "accuracy",
            "priority",
            "physical",
            "special",
            "status",
            "stab",
            "type",
            "effectiveness",
            "super_effective",
            "not_very_effective",
            "immune",
            "pivot",
            "setup",
            "low_power",
        ] {
            names.push(format!("action_{label}"));
        }
        names.extend(["battle_over", "my_alive", "opp_alive"].map(String::from));

        names.truncate(self.feature_len);
        let natural = names.len();
        names.extend((natural..self.feature_len).map(|idx| format!("pad_{idx}")));
        names
    }
}

struct FeatureWriter {
    values: Vec<f32>,
}

impl FeatureWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: f32) {
        self.values.push(value);
    }

    fn flag(&mut self, on: bool) {
        self.values.push(if on { 1.0 } else { 0.0 });
    }

    fn zeros(&mut self, count: usize) {
        self.values.extend(std::iter::repeat(0.0).take(count));
    }

    fn finish(mut self, len: usize) -> Vec<f32> {
        self.values.resize(len, 0.0);
        self.values
    }
}

fn pokemon_features(out: &mut FeatureWriter, pokemon: Option<&Pokemon>) {
    let Some(p) = pokemon else {
        out.zeros(POKEMON_FEATURES);
        return;
    };
    out.push(p.hp_fraction());
    for stat in Stat::BATTLE {
        out.push(p.stat_ratio(stat));
    }
    out.push((p.level as f32 / MAX_LEVEL).clamp(0.0, 1.0));
    for status in NonVolatileStatus::ENCODED {
        out.flag(p.status == status);
    }
    for stat in Stat::STAGED {
        out.push(normalize_stage(p.stages.get(stat)));
    }
}

fn team_features(out: &mut FeatureWriter, team: &Team) {
    let alive = team.alive_count();
    let initial = team.total_initial_hp();
    out.push(alive as f32 / team.size().max(1) as f32);
    out.push(if initial > 0 {
        (team.total_hp() as f32 / initial as f32).clamp(0.0, 1.0)
    } else {
        0.0
    });
    out.flag(alive > 1);
    out.push((alive as f32 / MAX_TEAM_SIZE as f32).min(1.0));
}

fn matchup_features(out: &mut FeatureWriter, mine: Option<&Pokemon>, theirs: Option<&Pokemon>) {
    let (me, opp) = match (mine, theirs) {
        (Some(me), Some(opp)) if !me.is_fainted() && !opp.is_fainted() => (me, opp),
        _ => {
            out.zeros(MATCHUP_FEATURES);
            return;
        }
    };
    out.flag(me.current.spe > opp.current.spe);
    out.push(best_single_matchup(me.typing(), opp.typing()) / MAX_EFFECTIVENESS);
    out.push(best_single_matchup(opp.typing(), me.typing()) / MAX_EFFECTIVENESS);
    out.push(me.hp_fraction());
    out.push(opp.hp_fraction());
    out.flag(me.stages.offensive_total() > opp.stages.offensive_total());
}

fn volatile_features(out: &mut FeatureWriter, pokemon: Option<&Pokemon>) {
    match pokemon {
        Some(p) => {
            for flag in VolatileFlag::TRACKED {
                out.flag(p.volatile.has(flag));
            }
        }
        None => out.zeros(VOLATILE_FEATURES),
    }
}

fn action_features(
    out: &mut FeatureWriter,
    action: Option<&Action>,
    attacker: Option<&Pokemon>,
    defender: Option<&Pokemon>,
) {
    let mv = match action {
        None => {
            out.zeros(ACTION_FEATURES);
            return;
        }
        Some(Action::Switch(_)) => {
            out.flag(true);
            out.zeros(ACTION_FEATURES - 1);
            return;
        }
        Some(Action::Move(mv)) => mv,
    };

    out.flag(false);
    out.push(mv.power.map_or(0.0, |p| (p as f32 / POWER_CEILING).min(1.0)));
    out.push(mv.accuracy.map_or(0.0, |a| (a as f32 / 100.0).min(1.0)));
    out.push(((mv.priority as f32 + PRIORITY_SHIFT) / PRIORITY_SPAN).clamp(0.0, 1.0));

    out.flag(mv.category == MoveCategory::Physical);
    out.flag(mv.category == MoveCategory::Special);
    out.flag(mv.category == MoveCategory::Status);

    out.flag(attacker.is_some_and(|p| p.has_type(mv.move_type)));
    out.push(type_ordinal(mv.move_type));

    // An unseen defender is treated as neutral.
    let multiplier = defender.map_or(1.0, |p| type_effectiveness(mv.move_type, p.typing()));
    out.push(multiplier / MAX_EFFECTIVENESS);
    out.flag(multiplier > 1.0);
    out.flag(multiplier < 1.0);
    out.flag(multiplier == 0.0);

    out.flag(is_pivot_move(&mv.name));
    out.flag(is_setup_move(&mv.name));
    out.flag(is_low_power(mv.power, LOW_POWER_THRESHOLD));
}

// Real types map to (index + 1) / 18 so that Normal stays distinct from Typeless at 0.
fn type_ordinal(t: Type) -> f32 {
    match t {
        Type::Typeless => 0.0,
        other => (other.index() + 1) as f32 / Type::ELEMENTAL as f32,
    }
}

fn stat_label(stat: Stat) -> &'static str {
    match stat {
        Stat::Hp => "hp",
        Stat::Atk => "atk",
        Stat::Def => "def",
        Stat::Spa => "spa",
        Stat::Spd => "spd",
        Stat::Spe => "spe",
        Stat::Accuracy => "acc",
        Stat::Evasion => "eva",
    }
}

fn status_label(status: NonVolatileStatus) -> &'static str {
    match status {
        NonVolatileStatus::None => "none",
        NonVolatileStatus::Burn => "brn",
        NonVolatileStatus::Paralysis => "par",
        NonVolatileStatus::Poison => "psn",
        NonVolatileStatus::Toxic => "tox",
        NonVolatileStatus::Sleep => "slp",
        NonVolatileStatus::Freeze => "frz",
        NonVolatileStatus::Unknown => "unknown",
    }
}

fn flag_label(flag: VolatileFlag) -> &'static str {
    match flag {
        VolatileFlag::Confused => "confused",
        VolatileFlag::Flinched => "flinched",
        VolatileFlag::Seeded => "seeded",
        VolatileFlag::Trapped => "trapped",
        VolatileFlag::FocusEnergy => "focus_energy",
        VolatileFlag::Substitute => "substitute",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_widths_add_up() {
        assert_eq!(POKEMON_FEATURES, 20);
        assert_eq!(NATURAL_LEN, 85);
        assert_eq!(ACTION_OFFSET, 66);
    }

    #[test]
    fn stage_normalization_endpoints() {
        assert_eq!(normalize_stage(-6), 0.0);
        assert_eq!(normalize_stage(0), 0.5);
        assert_eq!(normalize_stage(6), 1.0);
        assert_eq!(normalize_stage(12), 1.0);
        for stage in MIN_STAGE..=MAX_STAGE {
            let v = normalize_stage(stage);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        assert!(is_pivot_move("U-Turn"));
        assert!(is_pivot_move("voltswitch"));
        assert!(!is_pivot_move("Tackle"));
        assert!(is_setup_move("Swords Dance"));
        assert!(is_setup_move("Quiver Dance"));
        assert!(is_setup_move("Calm Mind"));
        assert!(!is_setup_move("Surf"));
    }

    #[test]
    fn low_power_excludes_zero_and_missing() {
        assert!(is_low_power(Some(20), 40));
        assert!(!is_low_power(Some(40), 40));
        assert!(!is_low_power(Some(0), 40));
        assert!(!is_low_power(None, 40));
    }

    #[test]
    fn feature_names_follow_configured_width() {
        let natural = FeatureEncoder::new(Side::A, EncoderConfig::default());
        assert_eq!(natural.feature_names().len(), NATURAL_LEN);
        let wide = FeatureEncoder::new(Side::A, EncoderConfig { feature_len: 90 });
        let names = wide.feature_names();
        assert_eq!(names.len(), 90);
        assert_eq!(names[89], "pad_89");
        let narrow = FeatureEncoder::new(Side::A, EncoderConfig { feature_len: 10 });
        assert_eq!(narrow.feature_names()[0], "my_hp");
        assert_eq!(narrow.feature_names().len(), 10);
    }

    #[test]
    fn type_ordinal_separates_normal_from_typeless() {
        assert_eq!(type_ordinal(Type::Typeless), 0.0);
        assert!((type_ordinal(Type::Normal) - 1.0 / 18.0).abs() < 1e-6);
        assert_eq!(type_ordinal(Type::Fairy), 1.0);
    }

    #[test]
    fn empty_state_is_all_zero() {
        let encoder = FeatureEncoder::new(Side::A, EncoderConfig::default());
        let features = encoder.encode(&BattleState::default(), None);
        assert_eq!(features.len(), FEATURE_LEN);
        assert!(features.iter().all(|&v| v == 0.0));
    }
}
