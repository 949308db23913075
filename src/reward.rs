use crate::encoder::is_low_power;
use crate::model::{Action, BattleState, NonVolatileStatus, Pokemon, Side, Stat, Team};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RewardTerms {
    pub faint: bool,
    pub status: bool,
    pub boosts: bool,
    pub team_hp: bool,
    pub move_quality: bool,
    pub forced_switch: bool,
}

impl Default for RewardTerms {
    fn default() -> Self {
        Self {
            faint: true,
            status: true,
            boosts: true,
            team_hp: true,
            move_quality: true,
            forced_switch: true,
        }
    }
}

impl RewardTerms {
    /// Terminal outcome and HP delta only.
    pub fn minimal() -> Self {
        Self {
            faint: false,
            status: false,
            boosts: false,
            team_hp: false,
            move_quality: false,
            forced_switch: false,
        }
    }
}

/// Reward for inflicting each status; escalating or disabling ones weigh more.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatusSeverity {
    pub burn: f32,
    pub paralysis: f32,
    pub poison: f32,
    pub toxic: f32,
    pub sleep: f32,
    pub freeze: f32,
}

impl Default for StatusSeverity {
    fn default() -> Self {
        Self {
            burn: 90.0,
            paralysis: 90.0,
            poison: 70.0,
            toxic: 120.0,
            sleep: 100.0,
            freeze: 100.0,
        }
    }
}

impl StatusSeverity {
    pub fn value(&self, status: NonVolatileStatus) -> f32 {
        match status {
            NonVolatileStatus::Burn => self.burn,
            NonVolatileStatus::Paralysis => self.paralysis,
            NonVolatileStatus::Poison => self.poison,
            NonVolatileStatus::Toxic => self.toxic,
            NonVolatileStatus::Sleep => self.sleep,
            NonVolatileStatus::Freeze => self.freeze,
            NonVolatileStatus::None | NonVolatileStatus::Unknown => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub min: f32,
    pub max: f32,
    /// Magnitude of the win (+) and loss (-) reward.
    pub terminal: f32,
    pub faint: f32,
    /// Reward per HP point of damage dealt, penalty per point taken.
    pub hp_coefficient: f32,
    pub status: StatusSeverity,
    pub boost_per_stage: f32,
    /// Extra factor for attack, special attack and speed stages.
    pub offensive_boost_weight: f32,
    pub team_hp_coefficient: f32,
    pub low_power_threshold: u32,
    pub low_power_penalty: f32,
    pub forced_switch: f32,
    pub terms: RewardTerms,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            min: -1000.0,
            max: 1000.0,
            terminal: 800.0,
            faint: 400.0,
            hp_coefficient: 0.8,
            status: StatusSeverity::default(),
            boost_per_stage: 15.0,
            offensive_boost_weight: 1.3,
            team_hp_coefficient: 1.0 / 50.0,
            low_power_threshold: 40,
            low_power_penalty: 10.0,
            forced_switch: 80.0,
            terms: RewardTerms::default(),
        }
    }
}

/// Every term of one reward evaluation; `total` is the clamped sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardBreakdown {
    pub terminal: f32,
    pub faint: f32,
    pub hp_delta: f32,
    pub status: f32,
    pub boosts: f32,
    pub team_hp: f32,
    pub move_quality: f32,
    pub forced_switch: f32,
    pub total: f32,
}

impl RewardBreakdown {
    pub fn unclamped(&self) -> f32 {
        self.terminal
            + self.faint
            + self.hp_delta
            + self.status
            + self.boosts
            + self.team_hp
            + self.move_quality
            + self.forced_switch
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardShaper {
    side: Side,
    config: RewardConfig,
}

impl RewardShaper {
    pub fn new(side: Side, config: RewardConfig) -> Self {
        Self { side, config }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.config.min, self.config.max)
    }

    pub fn score(&self, state: &BattleState, action: Option<&Action>, next: &BattleState) -> f32 {
        self.breakdown(state, action, next).total
    }

    pub fn breakdown(
        &self,
        state: &BattleState,
        action: Option<&Action>,
        next: &BattleState,
    ) -> RewardBreakdown {
        let cfg = &self.config;
        let mut parts = RewardBreakdown::default();

        let my_before = state.team(self.side);
        let opp_before = state.team(self.side.opponent());
        let my_after = next.team(self.side);
        let opp_after = next.team(self.side.opponent());

        if next.is_over {
            parts.terminal = if opp_after.is_fully_fainted() {
                cfg.terminal
            } else if my_after.is_fully_fainted() {
                -cfg.terminal
            } else {
                0.0
            };
            parts.total = self.clamp(parts.terminal);
            tracing::trace!(side = ?self.side, reward = parts.total, "terminal transition");
            return parts;
        }

        let mine = active_transition(my_before, my_after);
        let theirs = active_transition(opp_before, opp_after);

        if cfg.terms.faint {
            if let Some((before, after)) = theirs {
                if !before.is_fainted() && after.is_fainted() {
                    parts.faint += cfg.faint;
                }
            }
            if let Some((before, after)) = mine {
                if !before.is_fainted() && after.is_fainted() {
                    parts.faint -= cfg.faint;
                }
            }
        }

        let hp_lost = |(before, after): (&Pokemon, &Pokemon)| {
            (before.current.hp.max(0) - after.current.hp.max(0)) as f32
        };
        parts.hp_delta = (theirs.map_or(0.0, hp_lost) - mine.map_or(0.0, hp_lost)) * cfg.hp_coefficient;

        if cfg.terms.status {
            let onset = |(before, after): (&Pokemon, &Pokemon)| {
                if before.status.is_none() && !after.status.is_none() {
                    cfg.status.value(after.status)
                } else {
                    0.0
                }
            };
            parts.status = theirs.map_or(0.0, onset) - mine.map_or(0.0, onset);
        }

        if cfg.terms.boosts {
            parts.boosts = mine.map_or(0.0, |t| self.boost_delta(t))
                - theirs.map_or(0.0, |t| self.boost_delta(t));
        }

        if cfg.terms.team_hp {
            let my_loss = my_before.total_hp() - my_after.total_hp();
            let opp_loss = opp_before.total_hp() - opp_after.total_hp();
            parts.team_hp = (opp_loss - my_loss) as f32 * cfg.team_hp_coefficient;
        }

        if cfg.terms.move_quality {
            if let Some(mv) = action.and_then(Action::as_move) {
                if is_low_power(mv.power, cfg.low_power_threshold) {
                    parts.move_quality = -cfg.low_power_penalty;
                }
            }
        }

        if cfg.terms.forced_switch && was_switched_out(opp_before, opp_after) {
            parts.forced_switch = cfg.forced_switch;
        }

        parts.total = self.clamp(parts.unclamped());
        tracing::trace!(side = ?self.side, ?parts, "shaped reward");
        parts
    }

    fn boost_delta(&self, (before, after): (&Pokemon, &Pokemon)) -> f32 {
        Stat::STAGED
            .iter()
            .map(|&stat| {
                let diff = (after.stages.get(stat) - before.stages.get(stat)) as f32;
                let weight = if stat.is_offensive() {
                    self.config.offensive_boost_weight
                } else {
                    1.0
                };
                diff * self.config.boost_per_stage * weight
            })
            .sum()
    }

    // Written with min/max so a misconfigured range never panics.
    fn clamp(&self, value: f32) -> f32 {
        value.max(self.config.min).min(self.config.max)
    }
}

fn active_transition<'a>(before: &'a Team, after: &'a Team) -> Option<(&'a Pokemon, &'a Pokemon)> {
    let idx = before.active_index()?;
    Some((before.get(idx)?, after.get(idx)?))
}

/// Active Pokémon left the field while still standing.
fn was_switched_out(before: &Team, after: &Team) -> bool {
    let Some(idx) = before.active_index() else {
        return false;
    };
    let Some(previous) = before.get(idx) else {
        return false;
    };
    if previous.is_fainted() {
        return false;
    }
    let still_standing = after.get(idx).map_or(true, |p| !p.is_fainted());
    let replaced = match after.active_pokemon() {
        Some(current) => after.active_index() != Some(idx) || current.name != previous.name,
        None => false,
    };
    still_standing && replaced
}
