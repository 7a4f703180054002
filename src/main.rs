mod api;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3002".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    log::info!("🚀 Starting Recipe Service...");

    // Initialize MongoDB connection (creates indexes on startup)
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db);

    log::info!("✅ MongoDB connected successfully");

    // Per-route limiter for analytics ingest, independent from the global one
    let analytics_limiter = web::Data::new(middleware::RateLimiter::new(
        middleware::RateLimitConfig::analytics_from_env(),
    ));

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&app_url)
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(analytics_limiter.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::BotGuard)
            .wrap(middleware::RateLimit)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Liveness (exempt from rate limiting)
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Readiness: actually pings the database
            .route(
                "/api/v1/database/health",
                web::get().to(api::health::database_health),
            )
            // Auth endpoints
            .service(
                web::scope("/api/v1/auth")
                    .route("/login", web::post().to(api::auth::login))
                    .route("/register", web::post().to(api::auth::register))
                    .route("/refresh", web::post().to(api::auth::refresh_token))
                    .route("/google", web::get().to(api::auth::google_auth))
                    .route("/callback", web::get().to(api::auth::google_callback))
                    .route("/verify", web::get().to(api::auth::verify_token))
                    .route("/me", web::get().to(api::auth::get_me))
                    .route("/delete-account", web::delete().to(api::auth::delete_account)),
            )
            // Search
            .service(
                web::scope("/api/v1/search")
                    .route("", web::get().to(api::search::search_recipes)),
            )
            // Recipes: reads are public, writes check the token in the handler
            .service(
                web::scope("/api/v1/recipes")
                    .service(
                        web::resource("")
                            .route(web::get().to(api::recipes::list_recipes))
                            .route(web::post().to(api::recipes::create_recipe)),
                    )
                    .service(
                        web::resource("/{id}/rating")
                            .route(web::post().to(api::recipes::rate_recipe)),
                    )
                    .service(
                        web::resource("/{id}/save")
                            .route(web::get().to(api::social::save_status))
                            .route(web::post().to(api::social::save_recipe))
                            .route(web::delete().to(api::social::unsave_recipe)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(api::recipes::get_recipe))
                            .route(web::put().to(api::recipes::update_recipe))
                            .route(web::delete().to(api::recipes::delete_recipe)),
                    ),
            )
            // Users: profiles and follow edges; /me must come before the catch-all
            .service(
                web::scope("/api/v1/users")
                    .service(
                        web::resource("/me").route(web::put().to(api::users::update_me)),
                    )
                    .service(
                        web::resource("/{id}/follow")
                            .route(web::get().to(api::social::follow_status))
                            .route(web::post().to(api::social::follow_user))
                            .route(web::delete().to(api::social::unfollow_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(api::users::get_profile)),
                    ),
            )
            // Activity feed - Requires JWT
            .service(
                web::scope("/api/v1/feed")
                    .wrap(middleware::AuthMiddleware)
                    .route("", web::get().to(api::users::get_feed)),
            )
            // Collections - Requires JWT
            .service(
                web::scope("/api/v1/collections")
                    .wrap(middleware::AuthMiddleware)
                    .service(
                        web::resource("")
                            .route(web::get().to(api::collections::list_collections))
                            .route(web::post().to(api::collections::create_collection)),
                    )
                    .service(
                        web::resource("/{id}/recipes/{recipe_id}")
                            .route(web::delete().to(api::collections::remove_recipe)),
                    )
                    .service(
                        web::resource("/{id}/recipes")
                            .route(web::get().to(api::collections::list_recipes))
                            .route(web::post().to(api::collections::add_recipe)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(api::collections::get_collection))
                            .route(web::put().to(api::collections::update_collection))
                            .route(web::delete().to(api::collections::delete_collection)),
                    ),
            )
            // Analytics ingest (per-route rate limit inside the handler)
            .service(
                web::scope("/api/v1/analytics")
                    .route("/events", web::post().to(api::analytics::record_event)),
            )
            // Identity provider sync
            .service(
                web::scope("/api/v1/webhooks")
                    .route("/identity", web::post().to(api::webhooks::identity_webhook)),
            )
            // Scheduled maintenance (cron secret, not user JWTs)
            .service(
                web::scope("/api/v1/maintenance")
                    .route(
                        "/recompute-ratings",
                        web::post().to(api::maintenance::recompute_ratings),
                    ),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
