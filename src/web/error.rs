use crate::middleware::{htmx::is_htmx, ClientCtx};
use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{error, HttpMessage, HttpResponse, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    client: ClientCtx,
    status: u16,
    title: &'static str,
    message: String,
    /// htmx swaps only the message in.
    fragment: bool,
}

/// Replaces an error response body with the error page. With `keep_plain`,
/// responses a handler built itself (re-rendered fragment forms) pass
/// through untouched.
fn render_error<B>(
    res: ServiceResponse<B>,
    title: &'static str,
    expose_message: bool,
    keep_plain: bool,
) -> Result<ErrorHandlerResponse<B>> {
    let message = match res.response().error() {
        Some(err) if expose_message => err.to_string(),
        Some(_) => title.to_owned(),
        None if keep_plain => {
            return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()))
        }
        None => title.to_owned(),
    };

    let (req, res) = res.into_parts();
    let status = res.status();
    let client = ClientCtx::get_or_default_from_extensions(&mut req.extensions_mut());
    let fragment = is_htmx(&req);

    let body = ErrorTemplate {
        client,
        status: status.as_u16(),
        title,
        message,
        fragment,
    }
    .render()
    .map_err(error::ErrorInternalServerError)?;

    let res = HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body);
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res).map_into_right_body(),
    ))
}

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Bad Request", true, true)
}

pub fn render_403<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Forbidden", true, true)
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Not Found", true, false)
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Internal Server Error", false, false)
}

pub fn render_429<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Too Many Requests", true, false)
}
