pub mod accounts;
pub mod admin;
pub mod advertisements;
pub mod bookmarks;
pub mod error;
pub mod inbox;
pub mod openmics;
pub mod pages;
pub mod profiles;
pub mod reports;

use crate::content::ContentKind;
use crate::forms::FormFields;
use crate::middleware::ClientCtx;
use crate::taxonomy::Choices;
use actix_web::http::header;
use actix_web::{error as web_error, Error, HttpResponse};
use sea_orm::DatabaseConnection;
use std::collections::HashMap;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    pages::configure(conf);
    accounts::configure(conf);
    profiles::configure(conf);
    advertisements::configure(conf);
    openmics::configure(conf);
    bookmarks::configure(conf);
    reports::configure(conf);
    inbox::configure(conf);
    admin::configure(conf);
}

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_owned()))
        .finish()
}

/// Logs a database failure and hides it behind a generic 500.
pub fn db_error(err: sea_orm::DbErr) -> Error {
    log::error!("{}", err);
    web_error::ErrorInternalServerError("Database error")
}

/// The viewer's bookmark on one object, for detail pages.
pub async fn viewer_bookmark(
    db: &DatabaseConnection,
    client: &ClientCtx,
    kind: ContentKind,
    object_id: i32,
) -> Result<Option<i32>, Error> {
    match client.get_profile_id() {
        Some(viewer) => Ok(crate::bookmarks::find(db, viewer, kind, object_id)
            .await
            .map_err(db_error)?
            .map(|b| b.id)),
        None => Ok(None),
    }
}

/// Object id to bookmark id for a page of cards. Empty for guests.
pub async fn viewer_bookmarks(
    db: &DatabaseConnection,
    client: &ClientCtx,
    kind: ContentKind,
    object_ids: &[i32],
) -> Result<HashMap<i32, i32>, Error> {
    match client.get_profile_id() {
        Some(viewer) => crate::bookmarks::bookmarked_map(db, viewer, kind, object_ids)
            .await
            .map_err(db_error),
        None => Ok(HashMap::new()),
    }
}

pub async fn load_choices(db: &DatabaseConnection) -> Result<Choices, Error> {
    crate::taxonomy::load_choices(db)
        .await
        .map_err(web_error::ErrorInternalServerError)
}

/// `?page=` as a 1-based number; anything unparseable is a 404.
pub fn page_number(fields: &FormFields) -> Result<u64, Error> {
    crate::listing::parse_page(fields.get("page"))
        .ok_or_else(|| web_error::ErrorNotFound("Invalid page."))
}

pub fn page_size() -> u64 {
    crate::app_config::limits().page_size.max(1) as u64
}

/// Where to send the user after a form: `next` when it is a local path.
/// Browsers read `/\host` as `//host`, so backslashes are refused outright.
pub fn safe_next(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(next) if is_local_path(next) => next.to_owned(),
        _ => fallback.to_owned(),
    }
}

fn is_local_path(next: &str) -> bool {
    let mut chars = next.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/') | Some('\\'))
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite() {
        assert_eq!(safe_next(Some("/ads/"), "/"), "/ads/");
        assert_eq!(safe_next(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_next(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_next(Some("/\\evil.example"), "/"), "/");
        assert_eq!(safe_next(Some("/ads/\\x"), "/"), "/");
        assert_eq!(safe_next(Some("/\t/evil.example"), "/"), "/");
        assert_eq!(safe_next(Some("/"), "/inbox/"), "/");
        assert_eq!(safe_next(None, "/inbox/"), "/inbox/");
    }
}
