use actix_session::{
    config::PersistentSession, storage::CookieSessionStore, SessionMiddleware,
};
use actix_web::cookie::{time, Key, SameSite};
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::{DefaultHeaders, ErrorHandlers, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use bandtogether::middleware::ClientCtx;
use bandtogether::storage::StorageBackend;
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.");
    let db = bandtogether::db::connect(&database_url)
        .await
        .expect("Failed to connect to the database");
    bandtogether::db::create_schema(&db)
        .await
        .expect("Failed to create the database schema");
    bandtogether::taxonomy::seed_defaults(&db)
        .await
        .expect("Failed to seed reference data");

    let config = bandtogether::app_config::get_config();
    bandtogether::rate_limit::init_rate_limits(&config.rate_limit);

    let storage: Arc<dyn StorageBackend> = Arc::new(
        bandtogether::storage::from_config(&config.storage)
            .expect("Failed to initialize picture storage"),
    );

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        result => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!("SECRET_KEY was invalid ({}).\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted. A secret key must be at least 64 bytes to be accepted.\r\n\r\nNeed a key? How about:\r\n{}",
                match result {
                    Ok(_) => "too short".to_owned(),
                    Err(err) => err.to_string(),
                },
                random_string
            );
            Key::from(random_string.as_bytes())
        }
    };

    // Spawn rate limiter cleanup task
    actix_web::rt::spawn(async {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            bandtogether::rate_limit::prune();
            log::debug!("Rate limiter cleanup completed");
        }
    });

    let bind_address = config.site.bind_address.clone();
    let media_path = config.storage.local_path.clone();
    let media_url = config.storage.public_url.trim_end_matches('/').to_owned();
    let max_upload_bytes = config.storage.max_upload_size_mb as usize * 1024 * 1024;
    let security = config.security.clone();

    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        // However, services are read top->down, higher traffic routes should be
        // placed higher
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::from(storage.clone()))
            .app_data(actix_web::web::PayloadConfig::new(max_upload_bytes + 64 * 1024))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("X-XSS-Protection", "0")) // Disable legacy XSS filter
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
                    .add((
                        "Permissions-Policy",
                        "geolocation=(), microphone=(), camera=()",
                    )),
            )
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, bandtogether::web::error::render_400)
                    .handler(StatusCode::FORBIDDEN, bandtogether::web::error::render_403)
                    .handler(StatusCode::NOT_FOUND, bandtogether::web::error::render_404)
                    .handler(
                        StatusCode::TOO_MANY_REQUESTS,
                        bandtogether::web::error::render_429,
                    )
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        bandtogether::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(security.cookie_secure)
                    .session_lifecycle(
                        PersistentSession::default()
                            .session_ttl(time::Duration::days(security.session_days as i64)),
                    )
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %{User-Agent}i"))
            .service(actix_files::Files::new("/static", "./static"))
            .service(actix_files::Files::new(&media_url, &media_path))
            .configure(bandtogether::web::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env is fine; the environment may be set directly.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
/// Panics
pub fn init_our_mods() {
    bandtogether::app_config::init();
}
