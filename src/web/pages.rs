//! Static pages and the feedback form.

use crate::feedback::{self, FeedbackError, FeedbackForm};
use crate::forms::FieldErrors;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::session::{push_flash, FlashLevel};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_home)
        .service(view_about)
        .service(view_privacy)
        .service(view_terms)
        .service(view_feedback)
        .service(create_feedback);
}

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomeTemplate {
    client: ClientCtx,
    site: crate::app_config::SiteConfig,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
struct AboutTemplate {
    client: ClientCtx,
    site: crate::app_config::SiteConfig,
}

#[derive(Template)]
#[template(path = "pages/privacy.html")]
struct PrivacyTemplate {
    client: ClientCtx,
    site: crate::app_config::SiteConfig,
}

#[derive(Template)]
#[template(path = "pages/terms.html")]
struct TermsTemplate {
    client: ClientCtx,
    site: crate::app_config::SiteConfig,
}

#[derive(Template)]
#[template(path = "pages/feedback.html")]
struct FeedbackTemplate {
    client: ClientCtx,
    form: FeedbackForm,
    errors: FieldErrors,
}

#[get("/")]
pub async fn view_home(client: ClientCtx) -> impl Responder {
    HomeTemplate {
        client,
        site: crate::app_config::site(),
    }
    .to_response()
}

#[get("/about/")]
pub async fn view_about(client: ClientCtx) -> impl Responder {
    AboutTemplate {
        client,
        site: crate::app_config::site(),
    }
    .to_response()
}

#[get("/privacy/")]
pub async fn view_privacy(client: ClientCtx) -> impl Responder {
    PrivacyTemplate {
        client,
        site: crate::app_config::site(),
    }
    .to_response()
}

#[get("/terms/")]
pub async fn view_terms(client: ClientCtx) -> impl Responder {
    TermsTemplate {
        client,
        site: crate::app_config::site(),
    }
    .to_response()
}

#[get("/feedback/")]
pub async fn view_feedback(client: ClientCtx) -> impl Responder {
    let form = FeedbackForm {
        email: client
            .get_user()
            .map(|u| u.email.to_owned())
            .unwrap_or_default(),
        ..Default::default()
    };
    FeedbackTemplate {
        client,
        form,
        errors: FieldErrors::new(),
    }
    .to_response()
}

#[post("/feedback/")]
pub async fn create_feedback(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    form: web::Form<FeedbackForm>,
) -> Result<impl Responder, Error> {
    validate_csrf_token(&session, &form.csrf_token)?;

    let ip = crate::ip::client_key(&req);
    if let Err(err) = crate::rate_limit::check_feedback_rate_limit(&ip) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too much feedback. Please try again in {} seconds.",
            err.retry_after_seconds
        )));
    }

    match feedback::submit_feedback(db.get_ref(), &form).await {
        Ok(_) => {
            push_flash(&session, FlashLevel::Success, "Successfully submitted Feedback!");
            Ok(super::redirect("/feedback/"))
        }
        Err(FeedbackError::Invalid(errors)) => Ok(FeedbackTemplate {
            client,
            form: form.trimmed(),
            errors,
        }
        .to_response()),
        Err(FeedbackError::Db(err)) => {
            log::error!("Unable to store feedback: {}", err);
            Err(error::ErrorInternalServerError("Unable to store feedback."))
        }
    }
}
