use super::db_error;
use crate::comments::{self, CommentParent};
use crate::content::{ContentError, ContentKind};
use crate::forms::{FieldErrors, FormFields};
use crate::listing::{self, OpenMicFilter, Page};
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::htmx::require_htmx;
use crate::middleware::ClientCtx;
use crate::openmics::{self, OpenMicCard, OpenMicDetail, OpenMicForm};
use crate::session::{push_flash, FlashLevel};
use crate::taxonomy::Choices;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_openmics)
        .service(get_openmics)
        .service(view_new_openmic)
        .service(create_openmic)
        .service(delete_comment)
        .service(view_openmic)
        .service(create_comment)
        .service(view_edit_openmic)
        .service(update_openmic)
        .service(view_delete_openmic)
        .service(delete_openmic);
}

#[derive(Template)]
#[template(path = "openmics/list.html")]
struct OpenMicListTemplate {
    client: ClientCtx,
    choices: Choices,
    filter: OpenMicFilter,
    page: Page<OpenMicCard>,
    query: String,
}

#[derive(Template)]
#[template(path = "openmics/cards.html")]
struct OpenMicCardsTemplate {
    client: ClientCtx,
    page: Page<OpenMicCard>,
    query: String,
}

#[derive(Template)]
#[template(path = "openmics/form.html")]
struct OpenMicFormTemplate {
    client: ClientCtx,
    choices: Choices,
    form: OpenMicForm,
    errors: FieldErrors,
    openmic_id: Option<i32>,
}

#[derive(Template)]
#[template(path = "openmics/detail.html")]
struct OpenMicDetailTemplate {
    client: ClientCtx,
    detail: OpenMicDetail,
    bookmark_id: Option<i32>,
    report_path: String,
    comment_body: String,
    comment_errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "openmics/delete.html")]
struct OpenMicDeleteTemplate {
    client: ClientCtx,
    openmic_id: i32,
    title: String,
}

async fn openmic_page(
    db: &DatabaseConnection,
    client: &ClientCtx,
    filter: &OpenMicFilter,
    number: u64,
    choices: &Choices,
) -> Result<Page<OpenMicCard>, Error> {
    let mut page = listing::fetch_page(db, filter.select(), number, super::page_size())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Invalid page."))?;
    let models = std::mem::take(&mut page.items);
    let mut cards = openmics::cards(db, models, choices)
        .await
        .map_err(db_error)?;

    let ids: Vec<i32> = cards.iter().map(|c| c.id).collect();
    let marks = super::viewer_bookmarks(db, client, ContentKind::OpenMic, &ids).await?;
    for card in cards.iter_mut() {
        card.bookmark_id = marks.get(&card.id).copied();
    }
    Ok(page.with_items(cards))
}

#[get("/openmics/")]
pub async fn view_openmics(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let filter = OpenMicFilter::from_fields(&FormFields::from_query(req.query_string()));
    let choices = super::load_choices(&db).await?;
    let page = openmic_page(&db, &client, &filter, 1, &choices).await?;

    Ok(OpenMicListTemplate {
        client,
        query: filter.to_query(),
        choices,
        filter,
        page,
    }
    .to_response())
}

#[get("/openmics/get-openmics/")]
pub async fn get_openmics(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;

    let fields = FormFields::from_query(req.query_string());
    let number = super::page_number(&fields)?;
    let filter = OpenMicFilter::from_fields(&fields);
    let choices = super::load_choices(&db).await?;
    let page = openmic_page(&db, &client, &filter, number, &choices).await?;

    Ok(OpenMicCardsTemplate {
        client,
        query: filter.to_query(),
        page,
    }
    .to_response())
}

#[get("/openmics/new/")]
pub async fn view_new_openmic(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    client.require_profile(&session)?;
    Ok(OpenMicFormTemplate {
        client,
        choices: super::load_choices(&db).await?,
        form: OpenMicForm::empty(),
        errors: FieldErrors::new(),
        openmic_id: None,
    }
    .to_response())
}

#[post("/openmics/new/")]
pub async fn create_openmic(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let author_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let choices = super::load_choices(&db).await?;
    let form = OpenMicForm::from_fields(&fields);
    let now = client.local_now();

    match openmics::create_openmic(db.get_ref(), author_id, &form, &choices, now).await {
        Ok(openmic) => {
            push_flash(&session, FlashLevel::Success, "Successfully created open mic!");
            Ok(super::redirect(&format!("/openmics/{}/", openmic.id)))
        }
        Err(ContentError::Invalid(errors)) => Ok(OpenMicFormTemplate {
            client,
            choices,
            form,
            errors,
            openmic_id: None,
        }
        .to_response()),
        Err(err) => Err(err.into()),
    }
}

async fn render_detail(
    client: ClientCtx,
    db: &DatabaseConnection,
    openmic_id: i32,
    comment_body: String,
    comment_errors: FieldErrors,
) -> Result<OpenMicDetailTemplate, Error> {
    let choices = super::load_choices(db).await?;
    let detail = openmics::load_detail(db, openmic_id, &choices).await?;
    let bookmark_id = super::viewer_bookmark(db, &client, ContentKind::OpenMic, openmic_id).await?;

    Ok(OpenMicDetailTemplate {
        client,
        detail,
        bookmark_id,
        report_path: ContentKind::OpenMic.path(openmic_id),
        comment_body,
        comment_errors,
    })
}

#[get("/openmics/{id}/")]
pub async fn view_openmic(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    Ok(
        render_detail(client, &db, path.into_inner(), String::new(), FieldErrors::new())
            .await?
            .to_response(),
    )
}

#[post("/openmics/{id}/comment/")]
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

    let openmic_id = path.into_inner();
    let text = fields.text("body");

    match comments::create_comment(db.get_ref(), CommentParent::OpenMic, openmic_id, author_id, &text)
        .await
    {
        Ok(_) => Ok(super::redirect(&format!("/openmics/{}/", openmic_id))),
        Err(ContentError::Invalid(errors)) => Ok(render_detail(client, &db, openmic_id, text, errors)
            .await?
            .to_response()),
        Err(err) => Err(err.into()),
    }
}

#[post("/openmics/comments/{id}/delete/")]
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

    let openmic_id =
        comments::delete_comment(db.get_ref(), CommentParent::OpenMic, path.into_inner(), profile_id)
            .await?;
    Ok(super::redirect(&format!("/openmics/{}/", openmic_id)))
}

#[get("/openmics/{id}/edit/")]
pub async fn view_edit_openmic(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let openmic = openmics::get_owned(db.get_ref(), path.into_inner(), profile_id).await?;
    let genres = openmics::genre_ids(db.get_ref(), openmic.id)
        .await
        .map_err(db_error)?;

    Ok(OpenMicFormTemplate {
        client,
        choices: super::load_choices(&db).await?,
        form: OpenMicForm::from_model(&openmic, genres),
        errors: FieldErrors::new(),
        openmic_id: Some(openmic.id),
    }
    .to_response())
}

#[post("/openmics/{id}/edit/")]
pub async fn update_openmic(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let openmic_id = path.into_inner();
    let choices = super::load_choices(&db).await?;
    let form = OpenMicForm::from_fields(&fields);
    let now = client.local_now();

    match openmics::update_openmic(db.get_ref(), openmic_id, profile_id, &form, &choices, now).await {
        Ok(openmic) => {
            push_flash(&session, FlashLevel::Success, "Successfully edited open mic!");
            Ok(super::redirect(&format!("/openmics/{}/", openmic.id)))
        }
        Err(ContentError::Invalid(errors)) => Ok(OpenMicFormTemplate {
            client,
            choices,
            form,
            errors,
            openmic_id: Some(openmic_id),
        }
        .to_response()),
        Err(err) => Err(err.into()),
    }
}

#[get("/openmics/{id}/delete/")]
pub async fn view_delete_openmic(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let openmic = openmics::get_owned(db.get_ref(), path.into_inner(), profile_id).await?;

    Ok(OpenMicDeleteTemplate {
        client,
        openmic_id: openmic.id,
        title: openmic.title,
    }
    .to_response())
}

#[post("/openmics/{id}/delete/")]
pub async fn delete_openmic(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    openmics::delete_openmic(db.get_ref(), path.into_inner(), Some(profile_id)).await?;
    push_flash(&session, FlashLevel::Success, "Successfully deleted open mic!");
    Ok(super::redirect("/openmics/"))
}
