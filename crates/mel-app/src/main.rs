use clap::Parser;
use mel_app::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Logs sur stderr : stdout reste réservé à la table.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::debug!("{cli:?}");
    mel_app::pipeline::run(&cli)
}
