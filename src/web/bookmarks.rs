//! Bookmark buttons and the per-kind bookmark lists.
//!
//! Create and delete come in two variants. The "detail" routes redirect
//! back to the bookmarked object with a flash. The "list" routes answer
//! htmx with the re-rendered button so a card can toggle in place, and
//! fall back to a redirect for plain form posts.

use super::db_error;
use crate::advertisements::{self, AdvertisementCard};
use crate::bookmarks;
use crate::content::{self, ContentKind};
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::htmx::is_htmx;
use crate::middleware::ClientCtx;
use crate::openmics::{self, OpenMicCard};
use crate::profiles::{self, ProfileCard};
use crate::session::{push_flash, FlashLevel};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_bookmarked_profiles)
        .service(view_bookmarked_ads)
        .service(view_bookmarked_openmics)
        .service(create_detail_bookmark)
        .service(delete_detail_bookmark)
        .service(create_list_bookmark)
        .service(delete_list_bookmark);
}

#[derive(Deserialize)]
pub struct BookmarkForm {
    #[serde(default)]
    pub csrf_token: String,
    /// Where a non-htmx list post lands.
    pub next: Option<String>,
}

#[derive(Template)]
#[template(path = "bookmarks/profiles.html")]
struct BookmarkedProfilesTemplate {
    client: ClientCtx,
    cards: Vec<ProfileCard>,
}

#[derive(Template)]
#[template(path = "bookmarks/ads.html")]
struct BookmarkedAdsTemplate {
    client: ClientCtx,
    cards: Vec<AdvertisementCard>,
}

#[derive(Template)]
#[template(path = "bookmarks/openmics.html")]
struct BookmarkedOpenMicsTemplate {
    client: ClientCtx,
    cards: Vec<OpenMicCard>,
}

/// The toggle shown on list cards.
#[derive(Template)]
#[template(path = "bookmarks/button.html")]
struct BookmarkButtonTemplate {
    client: ClientCtx,
    target: String,
    bookmark_id: Option<i32>,
}

#[get("/bookmarks/profiles/")]
pub async fn view_bookmarked_profiles(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let choices = super::load_choices(&db).await?;
    let rows = bookmarks::bookmarked_profiles(db.get_ref(), profile_id)
        .await
        .map_err(db_error)?;
    let mut cards = profiles::cards(db.get_ref(), rows, &choices)
        .await
        .map_err(db_error)?;

    let ids: Vec<i32> = cards.iter().map(|c| c.id).collect();
    let marks = super::viewer_bookmarks(&db, &client, ContentKind::Profile, &ids).await?;
    for card in cards.iter_mut() {
        card.bookmark_id = marks.get(&card.id).copied();
    }

    Ok(BookmarkedProfilesTemplate { client, cards }.to_response())
}

#[get("/bookmarks/ads/")]
pub async fn view_bookmarked_ads(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let choices = super::load_choices(&db).await?;
    let rows = bookmarks::bookmarked_advertisements(db.get_ref(), profile_id)
        .await
        .map_err(db_error)?;
    let mut cards = advertisements::cards(db.get_ref(), rows, &choices)
        .await
        .map_err(db_error)?;

    let ids: Vec<i32> = cards.iter().map(|c| c.id).collect();
    let marks = super::viewer_bookmarks(&db, &client, ContentKind::Advertisement, &ids).await?;
    for card in cards.iter_mut() {
        card.bookmark_id = marks.get(&card.id).copied();
    }

    Ok(BookmarkedAdsTemplate { client, cards }.to_response())
}

#[get("/bookmarks/openmics/")]
pub async fn view_bookmarked_openmics(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let choices = super::load_choices(&db).await?;
    let rows = bookmarks::bookmarked_openmics(db.get_ref(), profile_id)
        .await
        .map_err(db_error)?;
    let mut cards = openmics::cards(db.get_ref(), rows, &choices)
        .await
        .map_err(db_error)?;

    let ids: Vec<i32> = cards.iter().map(|c| c.id).collect();
    let marks = super::viewer_bookmarks(&db, &client, ContentKind::OpenMic, &ids).await?;
    for card in cards.iter_mut() {
        card.bookmark_id = marks.get(&card.id).copied();
    }

    Ok(BookmarkedOpenMicsTemplate { client, cards }.to_response())
}

fn parse_kind(app_label: &str, model_name: &str) -> Result<ContentKind, Error> {
    ContentKind::from_path(app_label, model_name)
        .ok_or_else(|| error::ErrorNotFound("Unknown content type."))
}

/// Object URL for a bookmark's target, or the kind's bookmark list when
/// the target is gone.
async fn target_url(db: &DatabaseConnection, kind: ContentKind, object_id: i32) -> Result<String, Error> {
    Ok(content::resolve(db, kind, object_id)
        .await
        .map_err(db_error)?
        .map(|target| target.url)
        .unwrap_or_else(|| list_url(kind).to_owned()))
}

fn list_url(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Profile => "/bookmarks/profiles/",
        ContentKind::Advertisement => "/bookmarks/ads/",
        ContentKind::OpenMic => "/bookmarks/openmics/",
    }
}

fn flash_created(session: &Session, created: bool) {
    if created {
        push_flash(session, FlashLevel::Success, "Successfully bookmarked!");
    } else {
        push_flash(session, FlashLevel::Info, "Already bookmarked.");
    }
}

#[post("/bookmarks/create/detail/{app_label}/{model_name}/{object_id}/")]
pub async fn create_detail_bookmark(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, String, i32)>,
    form: web::Form<BookmarkForm>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    validate_csrf_token(&session, &form.csrf_token)?;

    let (app_label, model_name, object_id) = path.into_inner();
    let kind = parse_kind(&app_label, &model_name)?;
    let (_, created) = bookmarks::get_or_create(db.get_ref(), profile_id, kind, object_id).await?;

    flash_created(&session, created);
    Ok(super::redirect(&target_url(&db, kind, object_id).await?))
}

#[post("/bookmarks/delete/detail/{bookmark_id}/")]
pub async fn delete_detail_bookmark(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<BookmarkForm>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    validate_csrf_token(&session, &form.csrf_token)?;

    let bookmark = bookmarks::delete_owned(db.get_ref(), profile_id, path.into_inner()).await?;
    push_flash(&session, FlashLevel::Success, "Successfully removed bookmark!");

    let location = match ContentKind::from_model_name(&bookmark.content_type) {
        Some(kind) => target_url(&db, kind, bookmark.object_id).await?,
        None => "/".to_owned(),
    };
    Ok(super::redirect(&location))
}

fn button(client: ClientCtx, kind: ContentKind, object_id: i32, bookmark_id: Option<i32>) -> HttpResponse {
    BookmarkButtonTemplate {
        client,
        target: kind.path(object_id),
        bookmark_id,
    }
    .to_response()
}

#[post("/bookmarks/create/list/{app_label}/{model_name}/{object_id}/")]
pub async fn create_list_bookmark(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, String, i32)>,
    form: web::Form<BookmarkForm>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    validate_csrf_token(&session, &form.csrf_token)?;

    let (app_label, model_name, object_id) = path.into_inner();
    let kind = parse_kind(&app_label, &model_name)?;
    let (bookmark, created) =
        bookmarks::get_or_create(db.get_ref(), profile_id, kind, object_id).await?;

    if is_htmx(&req) {
        return Ok(button(client, kind, object_id, Some(bookmark.id)));
    }
    flash_created(&session, created);
    Ok(super::redirect(&super::safe_next(
        form.next.as_deref(),
        &target_url(&db, kind, object_id).await?,
    )))
}

#[post("/bookmarks/delete/list/{bookmark_id}/")]
pub async fn delete_list_bookmark(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<BookmarkForm>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    validate_csrf_token(&session, &form.csrf_token)?;

    let bookmark = bookmarks::delete_owned(db.get_ref(), profile_id, path.into_inner()).await?;
    let kind = ContentKind::from_model_name(&bookmark.content_type);

    match kind {
        Some(kind) if is_htmx(&req) => Ok(button(client, kind, bookmark.object_id, None)),
        Some(kind) => {
            push_flash(&session, FlashLevel::Success, "Successfully removed bookmark!");
            Ok(super::redirect(&super::safe_next(form.next.as_deref(), list_url(kind))))
        }
        None => Ok(super::redirect("/")),
    }
}
