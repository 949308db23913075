pub mod batch;
pub mod config;
pub mod encoder;
pub mod error;
pub mod model;
pub mod policy;
pub mod reward;
pub mod types;
pub mod value;

use crate::batch::{evaluate_transitions, reward_header, reward_row, summarize, Transition};
use crate::config::AgentConfig;
use crate::encoder::FeatureEncoder;
use crate::model::Side;
use crate::policy::{validate_switch, DecisionPolicy};
use crate::reward::RewardShaper;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub use crate::encoder::{EncoderConfig, FEATURE_LEN};
pub use crate::error::{ConfigError, PolicyError};
pub use crate::model::{Action, BattleState, Move, Pokemon, Team};
pub use crate::policy::{ExplorationState, PolicyConfig};
pub use crate::reward::RewardConfig;
pub use crate::value::{LinearValue, ValueFunction};

pub fn build_agent(side: Side, config: &AgentConfig) -> (DecisionPolicy, RewardShaper) {
    let encoder = FeatureEncoder::new(side, config.encoder);
    let policy = DecisionPolicy::new(encoder, config.policy);
    let shaper = RewardShaper::new(side, config.reward);
    (policy, shaper)
}

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub transitions_path: PathBuf,
    pub side: Side,
    pub config_path: Option<PathBuf>,
    pub features_out: Option<PathBuf>,
    pub rewards_out: Option<PathBuf>,
}

pub fn load_transitions(path: &Path) -> anyhow::Result<Vec<Transition>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transitions file at {}", path.display()))?;
    let parsed: Vec<Transition> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    Ok(parsed)
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    let config = match &opts.config_path {
        Some(path) => AgentConfig::load_or_default(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AgentConfig::default(),
    };
    let transitions = load_transitions(&opts.transitions_path)?;
    if transitions.is_empty() {
        anyhow::bail!("{} contains no transitions", opts.transitions_path.display());
    }

    let (policy, shaper) = build_agent(opts.side, &config);
    let reports = evaluate_transitions(&transitions, &policy, &shaper);
    tracing::info!(transitions = reports.len(), side = ?opts.side, "episode evaluated");

    if let Some(path) = &opts.features_out {
        let rows: Vec<Vec<f32>> = reports.iter().map(|r| r.features.clone()).collect();
        batch::write_csv(&policy.encoder().feature_names(), &rows, path)
            .with_context(|| format!("Failed to write features to {}", path.display()))?;
        println!("Wrote {}x{} features to {}", rows.len(), policy.encoder().len(), path.display());
    }
    if let Some(path) = &opts.rewards_out {
        let rows: Vec<Vec<f32>> = reports.iter().map(|r| reward_row(&r.reward)).collect();
        batch::write_csv(&reward_header(), &rows, path)
            .with_context(|| format!("Failed to write rewards to {}", path.display()))?;
        println!("Wrote {} rewards to {}", rows.len(), path.display());
    }

    for (idx, (transition, report)) in transitions.iter().zip(&reports).enumerate() {
        if let Some(slot) = report.switch_in {
            validate_switch(transition.next_state.team(opts.side), slot)?;
            println!("step {idx}: active fainted, switch in slot {slot}");
        }
    }

    let summary = summarize(&reports);
    println!(
        "transitions={} total={:.2} mean={:.2} min={:.2} max={:.2} wins={} losses={}",
        summary.transitions,
        summary.total_reward,
        summary.mean_reward,
        summary.min_reward,
        summary.max_reward,
        summary.wins,
        summary.losses
    );
    Ok(())
}
