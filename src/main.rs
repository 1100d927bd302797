#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use rostersync::{
    handlers::{health, run_sync},
    settings::RostersyncSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Loads Settings.toml and environment overrides; also loads .env and
    // initializes the logger
    let settings = RostersyncSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    start_server(settings).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: RostersyncSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(settings.clone()))
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Administrative sync endpoint
        .route("/admin/sync/run", web::post().to(run_sync))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &RostersyncSettings) {
    println!("Starting rostersync on http://{bind_address}");
    println!();
    println!("Endpoints:");
    println!("  POST /admin/sync/run?offset=N - Run one reconciliation pass (admin token required)");
    println!("  GET  /ping                    - Health check");
    println!();
    println!("Target group: {}", settings.google.group_email);
    println!(
        "Batch size {} with {} ms between records, {} ms between batches",
        settings.sync.batch_size, settings.sync.record_delay_ms, settings.sync.batch_delay_ms
    );
    if settings.admin.api_token.is_empty() {
        println!("WARNING: admin.api_token is empty; the sync endpoint is disabled");
    }
}
