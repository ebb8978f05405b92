use anyhow::Context;
use blogicum_server::data::Repositories;
use blogicum_server::infrastructure::config::AppConfig;
use blogicum_server::infrastructure::database::{create_pool, run_migrations};
use blogicum_server::infrastructure::logging::init_logging;
use blogicum_server::infrastructure::security::JwtKeys;
use blogicum_server::presentation::server::{AppServices, start_rest_server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = create_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let services = AppServices::new(
        Repositories::postgres(pool),
        JwtKeys::new(config.jwt_secret.clone(), config.jwt_ttl_minutes),
        config.posts_per_page,
    );

    start_rest_server(config, services).await
}
