use crate::model::{Action, BattleState};
use crate::policy::DecisionPolicy;
use crate::reward::{RewardBreakdown, RewardShaper};
use rayon::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Transition {
    pub state: BattleState,
    #[serde(default)]
    pub action: Option<Action>,
    pub next_state: BattleState,
}

#[derive(Debug, Clone)]
pub struct TransitionReport {
    pub features: Vec<f32>,
    pub reward: RewardBreakdown,
    /// Reserve the policy would send in when the agent's active fainted.
    pub switch_in: Option<usize>,
}

/// Scores and encodes every transition independently, preserving order.
pub fn evaluate_transitions(
    transitions: &[Transition],
    policy: &DecisionPolicy,
    shaper: &RewardShaper,
) -> Vec<TransitionReport> {
    let side = shaper.side();
    transitions
        .par_iter()
        .map(|t| {
            let features = policy.encoder().encode(&t.state, t.action.as_ref());
            let reward = shaper.breakdown(&t.state, t.action.as_ref(), &t.next_state);
            let needs_switch = !t.next_state.is_over
                && t.next_state.active(side).is_some_and(|p| p.is_fainted());
            let switch_in = if needs_switch {
                policy.choose_switch(&t.next_state)
            } else {
                None
            };
            TransitionReport {
                features,
                reward,
                switch_in,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeSummary {
    pub transitions: usize,
    pub total_reward: f64,
    pub mean_reward: f64,
    pub min_reward: f64,
    pub max_reward: f64,
    pub wins: usize,
    pub losses: usize,
}

pub fn summarize(reports: &[TransitionReport]) -> EpisodeSummary {
    if reports.is_empty() {
        return EpisodeSummary::default();
    }
    let mut summary = EpisodeSummary {
        transitions: reports.len(),
        min_reward: f64::INFINITY,
        max_reward: f64::NEG_INFINITY,
        ..EpisodeSummary::default()
    };
    for report in reports {
        let r = report.reward.total as f64;
        summary.total_reward += r;
        summary.min_reward = summary.min_reward.min(r);
        summary.max_reward = summary.max_reward.max(r);
        if report.reward.terminal > 0.0 {
            summary.wins += 1;
        } else if report.reward.terminal < 0.0 {
            summary.losses += 1;
        }
    }
    summary.mean_reward = summary.total_reward / reports.len() as f64;
    summary
}

pub fn write_csv(header: &[String], rows: &[Vec<f32>], path: &std::path::Path) -> anyhow::Result<()> {
    let mut out = String::new();
    out.push_str(&header.join(","));
    for row in rows {
        out.push('\n');
        for (col_idx, value) in row.iter().enumerate() {
            if col_idx > 0 {
                out.push(',');
            }
            out.push_str(&format!("{value:.4}"));
        }
    }
    std::fs::write(path, out)?;
    Ok(())
}

pub fn reward_header() -> Vec<String> {
    [
        "terminal",
        "faint",
        "hp_delta",
        "status",
        "boosts",
        "team_hp",
        "move_quality",
        "forced_switch",
        "total",
    ]
    .map(String::from)
    .to_vec()
}

pub fn reward_row(reward: &RewardBreakdown) -> Vec<f32> {
    vec![
        reward.terminal,
        reward.faint,
        reward.hp_delta,
        reward.status,
        reward.boosts,
        reward.team_hp,
        reward.move_quality,
        reward.forced_switch,
        reward.total,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(total: f32, terminal: f32) -> TransitionReport {
        TransitionReport {
            features: Vec::new(),
            reward: RewardBreakdown {
                terminal,
                total,
                ..RewardBreakdown::default()
            },
            switch_in: None,
        }
    }

    #[test]
    fn summary_counts_outcomes() {
        let summary = summarize(&[report(10.0, 0.0), report(-30.0, 0.0), report(800.0, 800.0)]);
        assert_eq!(summary.transitions, 3);
        assert_eq!(summary.wins, 1);
        assert_eq!(summary.losses, 0);
        assert_eq!(summary.min_reward, -30.0);
        assert_eq!(summary.max_reward, 800.0);
        assert!((summary.mean_reward - 260.0).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(summarize(&[]), EpisodeSummary::default());
    }

    #[test]
    fn reward_row_matches_header() {
        assert_eq!(reward_row(&RewardBreakdown::default()).len(), reward_header().len());
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        let header = vec!["a".to_string(), "b".to_string()];
        write_csv(&header, &[vec![0.5, 1.0], vec![0.0, 0.25]], &path).expect("write");
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "a,b\n0.5000,1.0000\n0.0000,0.2500");
    }
}
