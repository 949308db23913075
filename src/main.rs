use pokemon_battle_policy::model::Side;
use pokemon_battle_policy::{run, CliOptions};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- [--transitions episode.json] [--side a|b] [--config agent.json] \
[--features-out features.csv] [--rewards-out rewards.csv]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut transitions_path = PathBuf::from("episode.json");
    let mut side = Side::A;
    let mut config_path = None;
    let mut features_out = None;
    let mut rewards_out = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--transitions" => {
                transitions_path = args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--transitions requires a path (e.g. --transitions episode.json)")
                })?;
            }
            "--side" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--side requires a or b"))?;
                side = Side::parse(&val)
                    .ok_or_else(|| anyhow::anyhow!("Unknown side {val} (use a or b)"))?;
            }
            "--config" => {
                config_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--config requires a path (e.g. --config agent.json)")
                })?);
            }
            "--features-out" => {
                features_out = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--features-out requires a path (e.g. --features-out features.csv)")
                })?);
            }
            "--rewards-out" => {
                rewards_out = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--rewards-out requires a path (e.g. --rewards-out rewards.csv)")
                })?);
            }
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok(CliOptions {
        transitions_path,
        side,
        config_path,
        features_out,
        rewards_out,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let opts = parse_args()?;
    run(opts)
}
