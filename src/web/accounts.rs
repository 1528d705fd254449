//! Sign up, log in and log out.

use crate::accounts::{self, AccountError};
use crate::forms::FieldErrors;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::session::{push_flash, FlashLevel};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(view_signup)
        .service(post_signup)
        .service(post_logout);
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub csrf_token: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub csrf_token: String,
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Template)]
#[template(path = "accounts/login.html")]
struct LoginTemplate<'a> {
    client: ClientCtx,
    username: &'a str,
    next: &'a str,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "accounts/signup.html")]
struct SignupTemplate<'a> {
    client: ClientCtx,
    username: &'a str,
    email: &'a str,
    errors: FieldErrors,
}

#[get("/accounts/login/")]
pub async fn view_login(
    client: ClientCtx,
    query: web::Query<NextQuery>,
) -> Result<impl Responder, Error> {
    let next = super::safe_next(query.next.as_deref(), "/");
    if client.is_user() {
        return Ok(super::redirect(&next));
    }

    Ok(LoginTemplate {
        client,
        username: "",
        next: &next,
        error: None,
    }
    .to_response())
}

#[post("/accounts/login/")]
pub async fn post_login(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, Error> {
    validate_csrf_token(&session, &form.csrf_token)?;

    let ip = crate::ip::client_key(&req);
    let username = form.username.trim();
    let next = super::safe_next(Some(&form.next), "/");

    if let Err(err) = crate::rate_limit::check_login_rate_limit(&ip, username) {
        log::warn!("Login rate limit hit for {} from {}", username, ip);
        return Ok(LoginTemplate {
            client,
            username,
            next: &next,
            error: Some(format!(
                "Too many login attempts. Please try again in {} seconds.",
                err.retry_after_seconds
            )),
        }
        .to_response());
    }

    let user = accounts::authenticate(db.get_ref(), username, &form.password)
        .await
        .map_err(error::ErrorInternalServerError)?;

    match user {
        Some(user) => {
            crate::rate_limit::clear_login_attempts(&ip, username);
            crate::session::login(&session, user.id)?;
            log::info!("User {} logged in", user.id);
            Ok(super::redirect(&next))
        }
        None => Ok(LoginTemplate {
            client,
            username,
            next: &next,
            error: Some(
                "Please enter a correct username and password. Note that both fields may be case-sensitive."
                    .to_owned(),
            ),
        }
        .to_response()),
    }
}

#[get("/accounts/signup/")]
pub async fn view_signup(client: ClientCtx) -> Result<impl Responder, Error> {
    if client.is_user() {
        return Ok(super::redirect("/"));
    }

    Ok(SignupTemplate {
        client,
        username: "",
        email: "",
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/accounts/signup/")]
pub async fn post_signup(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    form: web::Form<SignupForm>,
) -> Result<impl Responder, Error> {
    validate_csrf_token(&session, &form.csrf_token)?;

    let ip = crate::ip::client_key(&req);
    if let Err(err) = crate::rate_limit::check_registration_rate_limit(&ip) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many sign ups from this address. Please try again in {} seconds.",
            err.retry_after_seconds
        )));
    }

    let render = |errors: FieldErrors| {
        SignupTemplate {
            client: client.clone(),
            username: form.username.trim(),
            email: form.email.trim(),
            errors,
        }
        .to_response()
    };

    if form.password1 != form.password2 {
        let mut errors = FieldErrors::new();
        errors.add("password2", "The two password fields didn't match.");
        return Ok(render(errors));
    }

    match accounts::create_user(db.get_ref(), &form.username, &form.email, &form.password1).await {
        Ok(user) => {
            crate::session::login(&session, user.id)?;
            push_flash(
                &session,
                FlashLevel::Success,
                "Welcome! Create your profile to get started.",
            );
            Ok(super::redirect("/profiles/new/"))
        }
        Err(AccountError::Taken(field)) => {
            let mut errors = FieldErrors::new();
            match field {
                "email" => errors.add("email", "A user with that email already exists."),
                _ => errors.add("username", "A user with that username already exists."),
            }
            Ok(render(errors))
        }
        Err(AccountError::Invalid(errors)) => {
            let mut errors = errors;
            // The form calls it password1.
            for message in errors.get("password") {
                errors.add("password1", message);
            }
            Ok(render(errors))
        }
        Err(err) => {
            log::error!("Sign up failed: {}", err);
            Err(error::ErrorInternalServerError("Unable to create account."))
        }
    }
}

#[derive(Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

#[post("/accounts/logout/")]
pub async fn post_logout(
    session: Session,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    validate_csrf_token(&session, &form.csrf_token)?;
    crate::session::logout(&session);
    Ok(super::redirect("/"))
}
