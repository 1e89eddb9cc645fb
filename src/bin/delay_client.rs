//! Demo harness: replays a few delay ranges against a running server and
//! sleeps for each delay it gets back.

use anyhow::Context;
use random_delay_service::common::config::load_client_config;
use random_delay_service::DelayClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].clone());
    let mut client_config = load_client_config(config_path.as_deref())?;
    if let Some(addr) = args.windows(2).find(|w| w[0] == "--server").map(|w| w[1].clone()) {
        client_config.server_addr = addr;
    }

    let mut client = DelayClient::connect(&client_config)
        .await
        .with_context(|| format!("cannot reach delay server at {}", client_config.server_addr))?;

    for range in &client_config.ranges {
        let delay = client
            .request(range)
            .await
            .with_context(|| format!("request for {} failed", range))?;
        log::info!("Simulating {:.2} second delay...", delay);
        client.simulate(delay).await;
        log::info!("Done waiting");
    }

    log::info!("All {} exchanges completed", client_config.ranges.len());
    Ok(())
}
