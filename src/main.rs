#[macro_use]
extern crate rocket;

mod config;
mod models;
mod routes;
mod services;
mod utils;

use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::fs::FileServer;
use rocket::{Build, Rocket};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::models::error::ComicError;
use crate::services::catalog::JsonCatalog;
use crate::services::comic_service::ComicService;
use crate::services::page_store::PageStore;
use crate::utils::cors::Cors;

/// Assemble the server: load the catalog, wire the services, mount the
/// routes and the static page files.
pub fn build_server(config: AppConfig) -> Result<Rocket<Build>, ComicError> {
    std::fs::create_dir_all(&config.uploads_dir)?;

    let catalog = Arc::new(JsonCatalog::load(
        &config.catalog_path,
        config.allow_duplicate_names,
    )?);
    let service = ComicService::new(catalog, PageStore::new(&config.uploads_dir));

    Ok(rocket::build()
        .attach(Cors)
        .attach(AdHoc::on_liftoff("Storage reconciliation", |rocket| {
            Box::pin(async move {
                if let Some(service) = rocket.state::<ComicService>() {
                    if let Err(e) = service.reconcile().await {
                        warn!(error = %e, "storage reconciliation failed");
                    }
                }
            })
        }))
        .manage(service)
        .mount("/uploads", FileServer::from(&config.uploads_dir))
        .mount(
            "/",
            routes![
                routes::comics::upload_comic,
                routes::comics::list_comics,
                routes::comics::get_comic,
                routes::comics::get_comic_details,
                routes::comics::set_thumbnail_page,
                routes::comics::delete_comic,
                routes::comics::upload_options,
                routes::comics::thumbnail_options,
                routes::comics::delete_options,
            ],
        ))
}

#[launch]
fn rocket() -> rocket::Rocket<rocket::Build> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env();
    build_server(config).expect("Failed to initialize comic server")
}
