use clap::Parser;
use ingo_to_zimbra::config::Config;

fn main() -> anyhow::Result<()> {
    // Database credentials may come from a .env file
    dotenvy::dotenv().ok();

    // stdout carries the script, keep the log quiet unless asked
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::parse();
    if let Err(errors) = config.validate() {
        anyhow::bail!(errors.join("; "));
    }

    ingo_to_zimbra::run(&config)?;

    Ok(())
}
