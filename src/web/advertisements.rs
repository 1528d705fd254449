use super::db_error;
use crate::advertisements::{self, AdvertisementCard, AdvertisementDetail, AdvertisementForm};
use crate::comments::{self, CommentParent};
use crate::content::{ContentError, ContentKind};
use crate::forms::{FieldErrors, FormFields};
use crate::listing::{self, AdvertisementFilter, Page};
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::htmx::require_htmx;
use crate::middleware::ClientCtx;
use crate::session::{push_flash, FlashLevel};
use crate::taxonomy::Choices;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_ads)
        .service(get_ads)
        .service(view_new_ad)
        .service(create_ad)
        .service(delete_comment)
        .service(view_ad)
        .service(create_comment)
        .service(view_edit_ad)
        .service(update_ad)
        .service(view_delete_ad)
        .service(delete_ad);
}

#[derive(Template)]
#[template(path = "ads/list.html")]
struct AdListTemplate {
    client: ClientCtx,
    choices: Choices,
    filter: AdvertisementFilter,
    page: Page<AdvertisementCard>,
    query: String,
}

#[derive(Template)]
#[template(path = "ads/cards.html")]
struct AdCardsTemplate {
    client: ClientCtx,
    page: Page<AdvertisementCard>,
    query: String,
}

#[derive(Template)]
#[template(path = "ads/form.html")]
struct AdFormTemplate {
    client: ClientCtx,
    choices: Choices,
    form: AdvertisementForm,
    errors: FieldErrors,
    /// `None` while creating.
    ad_id: Option<i32>,
}

#[derive(Template)]
#[template(path = "ads/detail.html")]
struct AdDetailTemplate {
    client: ClientCtx,
    detail: AdvertisementDetail,
    bookmark_id: Option<i32>,
    report_path: String,
    comment_body: String,
    comment_errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "ads/delete.html")]
struct AdDeleteTemplate {
    client: ClientCtx,
    ad_id: i32,
    title: String,
}

async fn ad_page(
    db: &DatabaseConnection,
    client: &ClientCtx,
    filter: &AdvertisementFilter,
    number: u64,
    choices: &Choices,
) -> Result<Page<AdvertisementCard>, Error> {
    let mut page = listing::fetch_page(db, filter.select(), number, super::page_size())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Invalid page."))?;
    let models = std::mem::take(&mut page.items);
    let mut cards = advertisements::cards(db, models, choices)
        .await
        .map_err(db_error)?;

    let ids: Vec<i32> = cards.iter().map(|c| c.id).collect();
    let marks = super::viewer_bookmarks(db, client, ContentKind::Advertisement, &ids).await?;
    for card in cards.iter_mut() {
        card.bookmark_id = marks.get(&card.id).copied();
    }
    Ok(page.with_items(cards))
}

#[get("/ads/")]
pub async fn view_ads(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let filter = AdvertisementFilter::from_fields(&FormFields::from_query(req.query_string()));
    let choices = super::load_choices(&db).await?;
    let page = ad_page(&db, &client, &filter, 1, &choices).await?;

    Ok(AdListTemplate {
        client,
        query: filter.to_query(),
        choices,
        filter,
        page,
    }
    .to_response())
}

#[get("/ads/get-ads/")]
pub async fn get_ads(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;

    let fields = FormFields::from_query(req.query_string());
    let number = super::page_number(&fields)?;
    let filter = AdvertisementFilter::from_fields(&fields);
    let choices = super::load_choices(&db).await?;
    let page = ad_page(&db, &client, &filter, number, &choices).await?;

    Ok(AdCardsTemplate {
        client,
        query: filter.to_query(),
        page,
    }
    .to_response())
}

#[get("/ads/new/")]
pub async fn view_new_ad(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    client.require_profile(&session)?;
    Ok(AdFormTemplate {
        client,
        choices: super::load_choices(&db).await?,
        form: AdvertisementForm::default(),
        errors: FieldErrors::new(),
        ad_id: None,
    }
    .to_response())
}

#[post("/ads/new/")]
pub async fn create_ad(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let author_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let choices = super::load_choices(&db).await?;
    let form = AdvertisementForm::from_fields(&fields);

    match advertisements::create_advertisement(db.get_ref(), author_id, &form, &choices).await {
        Ok(ad) => {
            push_flash(&session, FlashLevel::Success, "Successfully created ad!");
            Ok(super::redirect(&format!("/ads/{}/", ad.id)))
        }
        Err(ContentError::Invalid(errors)) => Ok(AdFormTemplate {
            client,
            choices,
            form,
            errors,
            ad_id: None,
        }
        .to_response()),
        Err(err) => Err(err.into()),
    }
}

async fn render_detail(
    client: ClientCtx,
    db: &DatabaseConnection,
    ad_id: i32,
    comment_body: String,
    comment_errors: FieldErrors,
) -> Result<AdDetailTemplate, Error> {
    let choices = super::load_choices(db).await?;
    let detail = advertisements::load_detail(db, ad_id, &choices).await?;
    let bookmark_id = super::viewer_bookmark(db, &client, ContentKind::Advertisement, ad_id).await?;

    Ok(AdDetailTemplate {
        client,
        detail,
        bookmark_id,
        report_path: ContentKind::Advertisement.path(ad_id),
        comment_body,
        comment_errors,
    })
}

#[get("/ads/{id}/")]
pub async fn view_ad(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let ad_id = path.into_inner();
    Ok(render_detail(client, &db, ad_id, String::new(), FieldErrors::new())
        .await?
        .to_response())
}

#[post("/ads/{id}/comment/")]
pub async fn create_comment(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let author_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let ad_id = path.into_inner();
    let text = fields.text("body");

    match comments::create_comment(db.get_ref(), CommentParent::Advertisement, ad_id, author_id, &text)
        .await
    {
        Ok(_) => Ok(super::redirect(&format!("/ads/{}/", ad_id))),
        Err(ContentError::Invalid(errors)) => Ok(render_detail(client, &db, ad_id, text, errors)
            .await?
            .to_response()),
        Err(err) => Err(err.into()),
    }
}

#[post("/ads/comments/{id}/delete/")]
pub async fn delete_comment(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let ad_id = comments::delete_comment(
        db.get_ref(),
        CommentParent::Advertisement,
        path.into_inner(),
        profile_id,
    )
    .await?;
    Ok(super::redirect(&format!("/ads/{}/", ad_id)))
}

#[get("/ads/{id}/edit/")]
pub async fn view_edit_ad(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let ad = advertisements::get_owned(db.get_ref(), path.into_inner(), profile_id).await?;
    let genres = advertisements::genre_ids(db.get_ref(), ad.id)
        .await
        .map_err(db_error)?;
    let skills = advertisements::skill_ids(db.get_ref(), ad.id)
        .await
        .map_err(db_error)?;

    Ok(AdFormTemplate {
        client,
        choices: super::load_choices(&db).await?,
        form: AdvertisementForm::from_model(&ad, genres, skills),
        errors: FieldErrors::new(),
        ad_id: Some(ad.id),
    }
    .to_response())
}

#[post("/ads/{id}/edit/")]
pub async fn update_ad(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let ad_id = path.into_inner();
    let choices = super::load_choices(&db).await?;
    let form = AdvertisementForm::from_fields(&fields);

    match advertisements::update_advertisement(db.get_ref(), ad_id, profile_id, &form, &choices).await
    {
        Ok(ad) => {
            push_flash(&session, FlashLevel::Success, "Successfully edited ad!");
            Ok(super::redirect(&format!("/ads/{}/", ad.id)))
        }
        Err(ContentError::Invalid(errors)) => Ok(AdFormTemplate {
            client,
            choices,
            form,
            errors,
            ad_id: Some(ad_id),
        }
        .to_response()),
        Err(err) => Err(err.into()),
    }
}

#[get("/ads/{id}/delete/")]
pub async fn view_delete_ad(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let ad = advertisements::get_owned(db.get_ref(), path.into_inner(), profile_id).await?;

    Ok(AdDeleteTemplate {
        client,
        ad_id: ad.id,
        title: ad.title,
    }
    .to_response())
}

#[post("/ads/{id}/delete/")]
pub async fn delete_ad(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    advertisements::delete_advertisement(db.get_ref(), path.into_inner(), Some(profile_id)).await?;
    push_flash(&session, FlashLevel::Success, "Successfully deleted ad!");
    Ok(super::redirect("/ads/"))
}
