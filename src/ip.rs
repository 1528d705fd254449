//! Client IP extraction for rate limiting.

use actix_web::HttpRequest;
use std::net::IpAddr;

/// The address a request came from, trusting the proxy headers first:
/// the first hop of `X-Forwarded-For`, then `X-Real-IP`, then the socket peer.
/// Header values that don't parse as an IP are skipped.
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let header_ip = |name: &str, pick: fn(&str) -> Option<&str>| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(pick)
            .map(str::trim)
            .filter(|ip| ip.parse::<IpAddr>().is_ok())
            .map(str::to_owned)
    };

    header_ip("x-forwarded-for", |chain| chain.split(',').next())
        .or_else(|| header_ip("x-real-ip", |value| Some(value)))
        .or_else(|| req.peer_addr().map(|peer| peer.ip().to_string()))
}

/// Rate limiter key for the request; "unknown" when no address is available.
pub fn client_key(req: &HttpRequest) -> String {
    extract_client_ip(req).unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_invalid_forwarded_for_falls_back_to_real_ip() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "not-an-ip"))
            .insert_header(("x-real-ip", "198.51.100.4"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req).as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn test_no_address_is_unknown() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(client_key(&req), "unknown");
    }
}
