#![deny(missing_docs)]
//! RepoPulse server executable.
//!
//! Hosts HTTP endpoints for contributor activity and code quality analysis.

mod analyzer;
mod config;
mod github;
mod openapi;
mod routes;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpServer, http::header, web};
#[cfg(not(test))]
use dotenvy::dotenv;

#[cfg(not(test))]
use crate::config::ServerConfig;
#[cfg(not(test))]
use crate::routes::{AppState, configure};

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    let state = web::Data::new(AppState::from_config(&config));
    if config.openai.api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set; analysis requests will fail");
    }

    let allowed_origins = config.ui_origins.clone();
    let listen_addr = config.host.clone();
    let listen_port = config.port;
    log::info!("starting repopulse-server on {listen_addr}:{listen_port}");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(state.clone())
                .configure(configure)
        })
        .bind((listen_addr, listen_port))?
        .run()
        .await
    })
}

#[cfg(test)]
fn main() {}
