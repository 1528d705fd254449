//! htmx request detection.
//!
//! Fragment endpoints answer only requests carrying `HX-Request: true`; a
//! plain browser hit gets a 400 so half-pages are never rendered standalone.

use crate::constants::FRAGMENT_ONLY_MESSAGE;
use actix_web::http::header;
use actix_web::{error, Error, HttpRequest, HttpResponse};

pub const HX_REQUEST: &str = "HX-Request";
pub const HX_REDIRECT: &str = "HX-Redirect";

pub fn is_htmx(req: &HttpRequest) -> bool {
    req.headers()
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.eq_ignore_ascii_case("true"))
}

/// `Err(400)` unless the request came from htmx.
pub fn require_htmx(req: &HttpRequest) -> Result<(), Error> {
    require_htmx_with(req, FRAGMENT_ONLY_MESSAGE)
}

pub fn require_htmx_with(req: &HttpRequest, message: &'static str) -> Result<(), Error> {
    if is_htmx(req) {
        Ok(())
    } else {
        Err(error::ErrorBadRequest(message))
    }
}

/// A 302 for plain requests. htmx swaps whatever a redirect resolves to
/// into its target, so it is told to navigate with `HX-Redirect` instead.
pub fn redirect(req: &HttpRequest, location: &str) -> HttpResponse {
    if is_htmx(req) {
        HttpResponse::Ok()
            .insert_header((HX_REDIRECT, location.to_owned()))
            .finish()
    } else {
        HttpResponse::Found()
            .insert_header((header::LOCATION, location.to_owned()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_header_detection() {
        let plain = TestRequest::default().to_http_request();
        assert!(!is_htmx(&plain));
        assert!(require_htmx(&plain).is_err());

        let hx = TestRequest::default()
            .insert_header((HX_REQUEST, "true"))
            .to_http_request();
        assert!(is_htmx(&hx));
        assert!(require_htmx(&hx).is_ok());

        let other = TestRequest::default()
            .insert_header((HX_REQUEST, "false"))
            .to_http_request();
        assert!(!is_htmx(&other));
    }

    #[test]
    fn test_redirect_for_htmx() {
        let plain = TestRequest::default().to_http_request();
        let res = redirect(&plain, "/inbox/3/");
        assert_eq!(res.status(), actix_web::http::StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/inbox/3/");

        let hx = TestRequest::default()
            .insert_header((HX_REQUEST, "true"))
            .to_http_request();
        let res = redirect(&hx, "/inbox/3/");
        assert_eq!(res.status(), actix_web::http::StatusCode::OK);
        assert_eq!(res.headers().get(HX_REDIRECT).unwrap(), "/inbox/3/");
    }
}
