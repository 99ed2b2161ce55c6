use std::env;

use dotenvy::dotenv;
use finance_transparency::{backend, cli, config::AppConfig, database, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = AppConfig::from_env();

    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str);
    if matches!(mode, Some("server") | Some("seed")) {
        telemetry::init_tracing(config.log_json);
    }

    let pool = database::db::connection::get_db_pool(&config).await?;
    database::db::migrate::run_migrations(&pool).await?;

    match mode {
        Some("server") => {
            info!(addr = %config.bind_addr, "starting backend server");
            backend::run_server(pool, config).await?;
        }
        Some("seed") => {
            if database::db::seed::seed_demo_data(&pool).await? {
                info!("demo data loaded");
            } else {
                info!("store already has departments; nothing seeded");
            }
        }
        _ => cli::run(pool, &config).await?,
    }
    Ok(())
}
