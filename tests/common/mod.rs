#![allow(dead_code)]

pub mod database;
pub mod fixtures;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test::TestRequest;
use once_cell::sync::Lazy;
use regex::Regex;

/// Builds the full application around `$db` with a throwaway media dir.
#[macro_export]
macro_rules! test_app {
    ($db:expr) => {{
        let storage: std::sync::Arc<dyn bandtogether::storage::StorageBackend> = std::sync::Arc::new(
            bandtogether::storage::local::LocalStorage::new(
                std::env::temp_dir().join("bandtogether-test-media"),
            )
            .expect("Failed to create media dir"),
        );
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::from(storage))
                .wrap(bandtogether::middleware::ClientCtx::default())
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::from(&[7u8; 64]),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .configure(bandtogether::web::configure),
        )
        .await
    }};
}

static CSRF_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="csrf-token" content="([A-Za-z0-9]+)""#).unwrap());

/// Carries the session cookie between requests like a browser would.
#[derive(Default)]
pub struct Browser {
    session: Option<Cookie<'static>>,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &str) -> TestRequest {
        self.attach(TestRequest::get().uri(uri))
    }

    pub fn post(&self, uri: &str) -> TestRequest {
        self.attach(TestRequest::post().uri(uri))
    }

    /// A GET as htmx sends it.
    pub fn hx_get(&self, uri: &str) -> TestRequest {
        self.get(uri).insert_header(("HX-Request", "true"))
    }

    fn attach(&self, req: TestRequest) -> TestRequest {
        match &self.session {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        }
    }

    /// Keeps the newest session cookie from a response.
    pub fn remember<B>(&mut self, res: &ServiceResponse<B>) {
        for cookie in res.response().cookies() {
            if cookie.name() == "id" {
                self.session = Some(cookie.into_owned());
            }
        }
    }
}

/// The CSRF token a rendered page carries in its meta tag.
pub fn csrf_token(body: &str) -> String {
    CSRF_META
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .expect("page has no csrf token")
}

pub fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `application/x-www-form-urlencoded` body from pairs, repeated keys allowed.
pub fn form_body(pairs: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
