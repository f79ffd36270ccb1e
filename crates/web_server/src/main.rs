//! Main entry point for the van rental booking server.
//! Wires the database pool, the booking pipeline and the REST endpoints.

use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use booking::{BookingService, PricingPolicy};
use postgres::PgReservationStore;
use postgres::database::*;
use postgres::schema::init_schema;
use web_handlers::*;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚐 Starting van rental booking server...");

    // Create database connection pool
    let pool = match create_connection_pool().await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Make sure PostgreSQL is running and DATABASE_URL is set");
            std::process::exit(1);
        }
    };

    // The schema carries the no-overlap exclusion constraint; without
    // it the booking core cannot defend its invariant.
    if let Err(e) = init_schema(&pool).await {
        log::error!("❌ Failed to apply booking schema: {}", e);
        std::process::exit(1);
    }

    let store = Arc::new(PgReservationStore::new(pool));
    let prefix =
        std::env::var("BOOKING_NUMBER_PREFIX").unwrap_or_else(|_| "VAN".to_string());
    let service = web::Data::new(BookingService::new(
        store,
        prefix,
        PricingPolicy::default(),
    ));

    log::info!("🌐 Server will be available at: http://0.0.0.0:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .route("/availability/check", web::post().to(check_availability))
                    .route("/reservations", web::post().to(create_reservation)),
            )
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await
}
