use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use quillpad::config::Config;
use quillpad::routes;
use quillpad::state::AppState;
use quillpad::store::postgres::PgStore;

fn startup_error(context: &str, error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, error))
}

async fn build_state(config: &Config) -> io::Result<AppState> {
    if config.uses_memory_store() {
        log::warn!("DATABASE_URL=memory: data is kept in process and lost on exit");
        return AppState::in_memory(config.bcrypt_cost)
            .map_err(|e| startup_error("failed to build state", e));
    }

    let store = PgStore::connect(
        &config.database_url,
        config.db_max_connections,
        config.db_timeout,
    )
    .await
    .map_err(|e| startup_error("failed to connect to database", e))?;
    store
        .migrate()
        .await
        .map_err(|e| startup_error("failed to run migrations", e))?;
    log::info!("database migrations applied");

    AppState::from_store(Arc::new(store), config.bcrypt_cost)
        .map_err(|e| startup_error("failed to build state", e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;
    let state = web::Data::new(build_state(&config).await?);

    log::info!("Starting quillpad server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::configure_app(state.clone()))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
