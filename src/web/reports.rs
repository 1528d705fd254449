use crate::constants::REPORT_FRAGMENT_ONLY_MESSAGE;
use crate::content::{self, ContentError, ContentKind};
use crate::forms::FieldErrors;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::htmx::require_htmx_with;
use crate::middleware::ClientCtx;
use crate::reports;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_report_form).service(create_report);
}

#[derive(Deserialize)]
pub struct ReportForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub description: String,
}

/// Modal body swapped in by htmx, both before and after submitting.
#[derive(Template)]
#[template(path = "reports/form.html")]
struct ReportFormTemplate {
    client: ClientCtx,
    target: String,
    title: String,
    description: String,
    errors: FieldErrors,
    success_message: Option<&'static str>,
}

async fn resolve_target(
    db: &DatabaseConnection,
    app_label: &str,
    model_name: &str,
    object_id: i32,
) -> Result<content::ContentTarget, Error> {
    let kind = ContentKind::from_path(app_label, model_name)
        .ok_or_else(|| error::ErrorNotFound("Unknown content type."))?;
    content::resolve(db, kind, object_id)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Not found"))
}

#[get("/reports/create/{app_label}/{model_name}/{object_id}/")]
pub async fn view_report_form(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, String, i32)>,
) -> Result<impl Responder, Error> {
    require_htmx_with(&req, REPORT_FRAGMENT_ONLY_MESSAGE)?;
    client.require_profile(&session)?;

    let (app_label, model_name, object_id) = path.into_inner();
    let target = resolve_target(&db, &app_label, &model_name, object_id).await?;

    Ok(ReportFormTemplate {
        client,
        target: target.kind.path(target.id),
        title: target.title,
        description: String::new(),
        errors: FieldErrors::new(),
        success_message: None,
    }
    .to_response())
}

#[post("/reports/create/{app_label}/{model_name}/{object_id}/")]
pub async fn create_report(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, String, i32)>,
    form: web::Form<ReportForm>,
) -> Result<impl Responder, Error> {
    require_htmx_with(&req, REPORT_FRAGMENT_ONLY_MESSAGE)?;
    let profile_id = client.require_profile(&session)?.id;
    validate_csrf_token(&session, &form.csrf_token)?;

    if let Err(err) = crate::rate_limit::check_report_rate_limit(profile_id) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many reports. Please try again in {} seconds.",
            err.retry_after_seconds
        )));
    }

    let (app_label, model_name, object_id) = path.into_inner();
    let target = resolve_target(&db, &app_label, &model_name, object_id).await?;

    let result =
        reports::create_report(db.get_ref(), profile_id, target.kind, target.id, &form.description)
            .await;
    match result {
        Ok(_) => Ok(ReportFormTemplate {
            client,
            target: target.kind.path(target.id),
            title: target.title,
            description: String::new(),
            errors: FieldErrors::new(),
            success_message: Some("Report submitted successfully!"),
        }
        .to_response()),
        Err(ContentError::Invalid(errors)) => Ok(ReportFormTemplate {
            client,
            target: target.kind.path(target.id),
            title: target.title,
            description: form.description.trim().to_owned(),
            errors,
            success_message: None,
        }
        .to_response()),
        Err(err) => Err(err.into()),
    }
}
