use random_delay_service::server_start;

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = flag_value(&args, "--config");
    let bind = flag_value(&args, "--bind");
    server_start(config_path.as_deref(), bind.as_deref()).await
}
