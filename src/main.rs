use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::FeeSentinel::parse();
    env_logger::builder()
        .filter_module("reqwest::connect", log::LevelFilter::Off)
        .filter_level(args.config.log_level())
        .init();

    if !cli::start(args).await? {
        std::process::exit(1);
    }
    Ok(())
}
