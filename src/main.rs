use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};

use starter_kit::config::Config;
use starter_kit::repository::PgUserRepository;
use starter_kit::routes::{self, health};
use starter_kit::{db, UserService};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = db::connect(&config)
        .await
        .map_err(|e| startup_error("Database unavailable", e))?;
    db::migrate(&pool)
        .await
        .map_err(|e| startup_error("Database migration failed", e))?;

    let repository = Arc::new(PgUserRepository::new(pool));
    let service = UserService::new(repository, config.auth.clone());

    if let Some(admin) = &config.admin {
        service
            .seed_admin(admin)
            .await
            .map_err(|e| startup_error("Failed to create admin user", e))?;
    }

    let service = web::Data::new(service);
    let auth = config.auth.clone();

    info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .configure(|cfg| routes::config(cfg, &auth))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
