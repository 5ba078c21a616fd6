use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};

use rendezvous::config::AppConfig;
use rendezvous::decision::{Finalizer, scheduler};
use rendezvous::store::{PgStore, VoteStore};
use rendezvous::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv = dotenvy::dotenv();
    env_logger::init();
    match dotenv {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(e) => log::debug!("No .env file loaded: {}", e),
    }

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let pool = db::init_pool(&config.database).await.map_err(std::io::Error::other)?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;

    let store: Arc<dyn VoteStore> = Arc::new(PgStore::new(pool));
    let finalizer = Arc::new(Finalizer::new(store, config.finalize.clone()));

    scheduler::spawn_deadline_sweep(finalizer.clone(), config.sweep_interval);
    log::info!("Deadline sweep every {}s", config.sweep_interval.as_secs());

    let finalizer = web::Data::from(finalizer);

    let cors_origins = config.cors_allowed_origins.clone();
    log::info!("CORS allowed origins: {}", cors_origins.join(", "));
    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(handlers::cors(&cors_origins))
            .wrap(middleware::Logger::default())
            .app_data(finalizer.clone())
            .configure(handlers::configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
