use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::fs;
use std::sync::Arc;

mod config;
mod controllers;
mod models;
mod store;

use config::Config;
use store::MemoryStore;

pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let host = config.host.clone();
    let port = config.port;

    // The static and upload directories must exist before the Files
    // services mount them.
    fs::create_dir_all(&config.static_dir)?;
    fs::create_dir_all(config.upload_dir("images"))?;
    fs::create_dir_all(config.upload_dir("audio"))?;

    log::info!("Loading memory store from {}", config.data_file);
    let store = Arc::new(MemoryStore::open(&config.data_file));
    log::info!("Loaded {} memories", store.len());

    log::info!("Starting Memory Mosaic server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                store: Arc::clone(&store),
                config: config.clone(),
            }))
            .app_data(web::JsonConfig::default().limit(2 * 1024 * 1024))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::memories::config)
            .configure(controllers::index::config)
            .service(Files::new("/static", &config.static_dir))
            .service(Files::new("/uploads", &config.uploads_dir))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
