use crate::encoder::FeatureEncoder;
use crate::error::PolicyError;
use crate::model::{Action, BattleState, Pokemon, Team};
use crate::types::{effectiveness, Type};
use crate::value::ValueFunction;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decay {
    #[default]
    Linear,
    /// Constant ratio towards a positive floor. Config validation rejects a
    /// zero floor; an unvalidated one decays quadratically to zero instead.
    Geometric,
}

/// Epsilon as a function of training turns taken.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplorationSchedule {
    pub start: f32,
    pub floor: f32,
    /// Turns until epsilon reaches `floor`.
    pub horizon: u64,
    pub decay: Decay,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            start: 0.6,
            floor: 0.1,
            horizon: 500_000,
            decay: Decay::Linear,
        }
    }
}

impl ExplorationSchedule {
    /// Non-increasing in `steps`; equals `floor` from `horizon` on.
    pub fn epsilon(&self, steps: u64) -> f32 {
        if self.horizon == 0 || steps >= self.horizon || self.start <= self.floor {
            return self.floor;
        }
        let start = self.start as f64;
        let floor = self.floor as f64;
        let progress = steps as f64 / self.horizon as f64;
        let eps = match self.decay {
            Decay::Linear => start + (floor - start) * progress,
            Decay::Geometric if floor > 0.0 => start * (floor / start).powf(progress),
            // Quadratic ramp; a ratio towards zero collapses at the first step.
            Decay::Geometric => start * (1.0 - progress).powi(2),
        };
        (eps as f32).max(self.floor).min(self.start)
    }
}

/// Alternating training and pure-exploitation windows, counted in turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrainingCycle {
    pub train_turns: u64,
    pub eval_turns: u64,
}

impl Default for TrainingCycle {
    fn default() -> Self {
        Self {
            train_turns: 150,
            eval_turns: 20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SwitchWeights {
    pub type_advantage: f32,
    pub hp_fraction: f32,
}

impl Default for SwitchWeights {
    fn default() -> Self {
        Self {
            type_advantage: 0.4,
            hp_fraction: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub exploration: ExplorationSchedule,
    pub cycle: Option<TrainingCycle>,
    pub switch: SwitchWeights,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurnMode {
    Training { epsilon: f32 },
    Evaluation,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExplorationState {
    steps: u64,
    cycle_position: u64,
    evaluation: bool,
}

impl ExplorationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume(steps: u64) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Forces pure exploitation without consuming decay budget.
    pub fn set_evaluation(&mut self, on: bool) {
        self.evaluation = on;
    }

    pub fn is_evaluation(&self) -> bool {
        self.evaluation
    }

    /// Epsilon the next training turn would use, ignoring evaluation windows.
    pub fn current_epsilon(&self, schedule: &ExplorationSchedule) -> f32 {
        if self.evaluation {
            0.0
        } else {
            schedule.epsilon(self.steps.saturating_add(1))
        }
    }

    /// Moves the counters forward by one decision and reports the mode to use.
    pub fn advance(&mut self, config: &PolicyConfig) -> TurnMode {
        if self.evaluation {
            return TurnMode::Evaluation;
        }
        if let Some(cycle) = config.cycle {
            let period = cycle.train_turns + cycle.eval_turns;
            if period > 0 {
                let position = self.cycle_position % period;
                self.cycle_position = (position + 1) % period;
                if position >= cycle.train_turns {
                    return TurnMode::Evaluation;
                }
            }
        }
        self.steps = self.steps.saturating_add(1);
        TurnMode::Training {
            epsilon: config.exploration.epsilon(self.steps),
        }
    }
}

/// Offensive coverage of `mine` against `theirs` minus the reverse.
///
/// Each defending type contributes the best multiplier any attacking type
/// reaches against it.
pub fn type_advantage(mine: &[Type], theirs: &[Type]) -> f32 {
    coverage(mine, theirs) - coverage(theirs, mine)
}

fn coverage(attacking: &[Type], defending: &[Type]) -> f32 {
    defending
        .iter()
        .map(|&d| {
            attacking
                .iter()
                .map(|&a| effectiveness(a, d))
                .fold(0.0f32, f32::max)
        })
        .sum()
}

pub fn validate_switch(team: &Team, slot: usize) -> Result<(), PolicyError> {
    let reason = match team.get(slot) {
        None => "empty or unknown slot",
        Some(_) if team.active == Some(slot) => "already active",
        Some(p) if p.is_fainted() => "fainted",
        Some(_) => return Ok(()),
    };
    Err(PolicyError::IllegalSwitchTarget { slot, reason })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionPolicy {
    encoder: FeatureEncoder,
    config: PolicyConfig,
}

impl DecisionPolicy {
    pub fn new(encoder: FeatureEncoder, config: PolicyConfig) -> Self {
        Self { encoder, config }
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Picks this turn's action from `legal`.
    ///
    /// The returned reference always points into `legal`.
    pub fn select_move<'a, V, R>(
        &self,
        state: &BattleState,
        legal: &'a [Action],
        exploration: &mut ExplorationState,
        value_fn: &V,
        rng: &mut R,
    ) -> Result<&'a Action, PolicyError>
    where
        V: ValueFunction + ?Sized,
        R: Rng,
    {
        if legal.is_empty() {
            return Err(PolicyError::NoLegalActions);
        }
        if let TurnMode::Training { epsilon } = exploration.advance(&self.config) {
            if rng.gen::<f32>() < epsilon {
                let pick = legal.choose(rng).ok_or(PolicyError::NoLegalActions)?;
                tracing::debug!(
                    epsilon,
                    steps = exploration.steps(),
                    action = ?pick,
                    "exploring"
                );
                return Ok(pick);
            }
        }
        self.greedy(state, legal, value_fn)
            .ok_or(PolicyError::NoLegalActions)
    }

    /// Legal action with the highest estimated value; the first one wins ties.
    pub fn greedy<'a, V>(
        &self,
        state: &BattleState,
        legal: &'a [Action],
        value_fn: &V,
    ) -> Option<&'a Action>
    where
        V: ValueFunction + ?Sized,
    {
        let mut best: Option<(f32, &'a Action)> = None;
        for action in legal {
            let features = self.encoder.encode(state, Some(action));
            let value = value_fn.estimate(&features);
            match best {
                None => best = Some((value, action)),
                Some((current, _)) if value > current || (current.is_nan() && !value.is_nan()) => {
                    best = Some((value, action))
                }
                _ => {}
            }
        }
        if let Some((value, action)) = best {
            tracing::debug!(value, action = ?action, "exploiting");
        }
        best.map(|(_, action)| action)
    }

    /// Reserve to send in, or `None` when nobody can come in.
    ///
    /// Never returns the active slot, an unknown slot or a fainted Pokémon.
    pub fn choose_switch(&self, state: &BattleState) -> Option<usize> {
        let side = self.encoder.side();
        let team = state.team(side);
        let mut candidates = team
            .alive()
            .filter(|(idx, _)| team.active != Some(*idx));

        let Some(opponent) = state.active(side.opponent()) else {
            let fallback = candidates.next().map(|(idx, _)| idx);
            tracing::debug!(?fallback, "opponent unknown, taking first healthy reserve");
            return fallback;
        };

        let mut best: Option<(f32, usize)> = None;
        for (idx, candidate) in candidates {
            let score = self.switch_score(candidate, opponent);
            match best {
                Some((current, _)) if score <= current => {}
                _ => best = Some((score, idx)),
            }
        }
        if let Some((score, slot)) = best {
            tracing::debug!(slot, score, opponent = %opponent.name, "switch-in chosen");
        }
        best.map(|(_, idx)| idx)
    }

    pub fn switch_score(&self, candidate: &Pokemon, opponent: &Pokemon) -> f32 {
        let weights = &self.config.switch;
        weights.type_advantage * type_advantage(candidate.typing(), opponent.typing())
            + weights.hp_fraction * candidate.hp_fraction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_schedule_hits_endpoints() {
        let schedule = ExplorationSchedule {
            start: 0.6,
            floor: 0.1,
            horizon: 100,
            decay: Decay::Linear,
        };
        assert!((schedule.epsilon(0) - 0.6).abs() < 1e-6);
        assert!((schedule.epsilon(50) - 0.35).abs() < 1e-6);
        assert_eq!(schedule.epsilon(100), 0.1);
        assert_eq!(schedule.epsilon(u64::MAX), 0.1);
    }

    #[test]
    fn geometric_schedule_is_monotone() {
        for floor in [0.05, 0.0] {
            let schedule = ExplorationSchedule {
                start: 0.8,
                floor,
                horizon: 1_000,
                decay: Decay::Geometric,
            };
            let mut previous = f32::INFINITY;
            for step in (0..=1_200).step_by(7) {
                let eps = schedule.epsilon(step);
                assert!(eps <= previous, "step {step}: {eps} > {previous}");
                assert!(eps >= floor);
                previous = eps;
            }
            assert_eq!(schedule.epsilon(1_000), floor);
        }
    }

    #[test]
    fn zero_horizon_starts_at_floor() {
        let schedule = ExplorationSchedule {
            horizon: 0,
            ..ExplorationSchedule::default()
        };
        assert_eq!(schedule.epsilon(0), schedule.floor);
    }

    #[test]
    fn cycle_alternates_and_spares_decay_budget() {
        let config = PolicyConfig {
            cycle: Some(TrainingCycle {
                train_turns: 3,
                eval_turns: 2,
            }),
            ..PolicyConfig::default()
        };
        let mut state = ExplorationState::new();
        let modes: Vec<bool> = (0..10)
            .map(|_| matches!(state.advance(&config), TurnMode::Training { .. }))
            .collect();
        assert_eq!(
            modes,
            vec![true, true, true, false, false, true, true, true, false, false]
        );
        assert_eq!(state.steps(), 6);
    }

    #[test]
    fn forced_evaluation_freezes_counters() {
        let config = PolicyConfig::default();
        let mut state = ExplorationState::resume(10);
        state.set_evaluation(true);
        for _ in 0..5 {
            assert_eq!(state.advance(&config), TurnMode::Evaluation);
        }
        assert_eq!(state.steps(), 10);
        assert_eq!(state.current_epsilon(&config.exploration), 0.0);
        state.set_evaluation(false);
        assert!(matches!(state.advance(&config), TurnMode::Training { .. }));
        assert_eq!(state.steps(), 11);
    }

    #[test]
    fn current_epsilon_matches_next_training_turn() {
        let config = PolicyConfig {
            exploration: ExplorationSchedule {
                start: 0.6,
                floor: 0.1,
                horizon: 10,
                decay: Decay::Linear,
            },
            ..PolicyConfig::default()
        };
        let mut state = ExplorationState::new();
        for _ in 0..12 {
            let expected = state.current_epsilon(&config.exploration);
            match state.advance(&config) {
                TurnMode::Training { epsilon } => assert_eq!(epsilon, expected),
                TurnMode::Evaluation => panic!("no evaluation window configured"),
            }
        }
    }

    #[test]
    fn type_advantage_is_antisymmetric() {
        let water = [Type::Water];
        let fire = [Type::Fire];
        assert_eq!(type_advantage(&water, &fire), 1.5);
        assert_eq!(type_advantage(&fire, &water), -1.5);
        assert_eq!(type_advantage(&water, &water), 0.0);
    }
}
