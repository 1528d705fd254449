//! Integration tests driving the HTTP routes end to end

#[macro_use]
mod common;
use serial_test::serial;

use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use bandtogether::orm::feedback;
use common::{csrf_token, database::*, fixtures::*, form_body, location, Browser};
use sea_orm::{EntityTrait, PaginatorTrait};

const FORM: (header::HeaderName, &str) = (header::CONTENT_TYPE, "application/x-www-form-urlencoded");

/// Logs `$username` in through the login form.
macro_rules! log_in {
    ($app:expr, $browser:expr, $username:expr) => {{
        let res = test::call_service($app, $browser.get("/accounts/login/").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        $browser.remember(&res);
        let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 body");
        let token = csrf_token(&body);

        let res = test::call_service(
            $app,
            $browser
                .post("/accounts/login/")
                .insert_header(FORM)
                .set_payload(form_body(&[
                    ("csrf_token", token.as_str()),
                    ("username", $username),
                    ("password", TEST_PASSWORD),
                    ("next", "/inbox/"),
                ]))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/inbox/");
        $browser.remember(&res);
    }};
}

#[actix_rt::test]
#[serial]
async fn test_public_pages_render() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let app = test_app!(db);

    for uri in ["/", "/about/", "/privacy/", "/terms/", "/feedback/", "/ads/", "/openmics/", "/profiles/"] {
        let res = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "GET {}", uri);
    }
}

#[actix_rt::test]
#[serial]
async fn test_fragments_require_htmx() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let app = test_app!(db);
    let browser = Browser::new();

    for uri in ["/profiles/get-profiles/", "/ads/get-ads/", "/openmics/get-openmics/"] {
        let res = test::call_service(&app, browser.get(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "plain GET {}", uri);

        let res = test::call_service(&app, browser.hx_get(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "htmx GET {}", uri);

        let past_end = format!("{}?page=2", uri);
        let res = test::call_service(&app, browser.hx_get(&past_end).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "htmx GET {}", past_end);
    }

    let res = test::call_service(&app, browser.get("/ads/get-ads/").to_request()).await;
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 body");
    assert!(body.contains("This endpoint only accepts HTMX requests."));

    let res = test::call_service(
        &app,
        browser.get("/reports/create/profiles/profile/1/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 body");
    assert!(body.contains("This endpoint only supports HTMX requests."));
}

#[actix_rt::test]
#[serial]
async fn test_guest_redirected_to_login() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let app = test_app!(db);

    let res = test::call_service(&app, TestRequest::get().uri("/inbox/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/accounts/login/?next=%2Finbox%2F");

    let res = test::call_service(&app, TestRequest::get().uri("/ads/new/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert!(location(&res).starts_with("/accounts/login/"));
}

#[actix_rt::test]
#[serial]
async fn test_signup_then_profile_required() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let app = test_app!(db);
    let mut browser = Browser::new();

    let res = test::call_service(&app, browser.get("/accounts/signup/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    browser.remember(&res);
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 body");
    let token = csrf_token(&body);

    let res = test::call_service(
        &app,
        browser
            .post("/accounts/signup/")
            .insert_header(FORM)
            .set_payload(form_body(&[
                ("csrf_token", token.as_str()),
                ("username", "newcomer"),
                ("email", "newcomer@example.com"),
                ("password1", TEST_PASSWORD),
                ("password2", TEST_PASSWORD),
            ]))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profiles/new/");
    browser.remember(&res);

    // Logged in, but the inbox needs a profile.
    let res = test::call_service(&app, browser.get("/inbox/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profiles/new/");
}

#[actix_rt::test]
#[serial]
async fn test_login_opens_inbox() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    create_test_profile(&db, "Inbox Owner").await;
    let app = test_app!(db);
    let mut browser = Browser::new();

    log_in!(&app, browser, "inboxowner");

    let res = test::call_service(&app, browser.get("/inbox/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(&app, browser.get("/inbox/999/").to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
#[serial]
async fn test_login_ignores_offsite_next() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    create_test_user(&db, "wanderer").await;
    let app = test_app!(db);
    let mut browser = Browser::new();

    let res = test::call_service(&app, browser.get("/accounts/login/").to_request()).await;
    browser.remember(&res);
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 body");
    let token = csrf_token(&body);

    let res = test::call_service(
        &app,
        browser
            .post("/accounts/login/")
            .insert_header(FORM)
            .set_payload(form_body(&[
                ("csrf_token", token.as_str()),
                ("username", "wanderer"),
                ("password", TEST_PASSWORD),
                ("next", "/\\evil.example"),
            ]))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
}

#[actix_rt::test]
#[serial]
async fn test_login_rejects_bad_password() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    create_test_user(&db, "forgetful").await;
    let app = test_app!(db);
    let mut browser = Browser::new();

    let res = test::call_service(&app, browser.get("/accounts/login/").to_request()).await;
    browser.remember(&res);
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 body");
    let token = csrf_token(&body);

    let res = test::call_service(
        &app,
        browser
            .post("/accounts/login/")
            .insert_header(FORM)
            .set_payload(form_body(&[
                ("csrf_token", token.as_str()),
                ("username", "forgetful"),
                ("password", "wrong password"),
            ]))
            .to_request(),
    )
    .await;
    // The form is shown again instead of redirecting.
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_rt::test]
#[serial]
async fn test_admin_is_staff_only() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let member = create_test_profile(&db, "Plain Member").await;
    let staff = create_test_profile(&db, "Site Staff").await;
    bandtogether::accounts::set_staff(&db, staff.user_id, true)
        .await
        .expect("Failed to grant staff");
    let app = test_app!(db);

    let res = test::call_service(&app, TestRequest::get().uri("/admin/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let mut browser = Browser::new();
    log_in!(&app, browser, "plainmember");
    let res = test::call_service(&app, browser.get("/admin/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(member.id > 0);

    let mut browser = Browser::new();
    log_in!(&app, browser, "sitestaff");
    let res = test::call_service(&app, browser.get("/admin/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = test::call_service(&app, browser.get("/admin/profiles/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_rt::test]
#[serial]
async fn test_location_autocomplete() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let app = test_app!(db);

    let res = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profiles/location-autocomplete/?q=port")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    let results = body.as_array().expect("JSON array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["label"], "Portland, Oregon, United States");
    assert!(results[0]["id"].is_number());

    let res = test::call_service(
        &app,
        TestRequest::get()
            .uri("/profiles/location-autocomplete/")
            .to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body, serde_json::json!([]));
}

#[actix_rt::test]
#[serial]
async fn test_detail_pages() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let author = create_test_profile(&db, "Detail Band").await;
    let ad = create_test_ad(&db, author.id, "Sax player wanted").await;
    let openmic = create_test_openmic(&db, author.id, "Sunday Songs").await;
    let app = test_app!(db);

    let ok = [
        author.get_url(),
        format!("/profiles/{}/ads/", author.slug),
        format!("/ads/{}/", ad.id),
        format!("/openmics/{}/", openmic.id),
    ];
    for uri in ok.iter() {
        let res = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "GET {}", uri);
    }

    for uri in ["/profiles/nobody/about/", "/ads/9999/", "/openmics/9999/"] {
        let res = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "GET {}", uri);
    }
}

#[actix_rt::test]
#[serial]
async fn test_feedback_form() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    let app = test_app!(db);
    let mut browser = Browser::new();

    // No token, no feedback.
    let res = test::call_service(
        &app,
        TestRequest::post()
            .uri("/feedback/")
            .insert_header(FORM)
            .set_payload(form_body(&[
                ("email", "fan@example.com"),
                ("subject", "Hello"),
                ("message", "Great site"),
            ]))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(&app, browser.get("/feedback/").to_request()).await;
    browser.remember(&res);
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 body");
    let token = csrf_token(&body);

    let res = test::call_service(
        &app,
        browser
            .post("/feedback/")
            .insert_header(FORM)
            .set_payload(form_body(&[
                ("csrf_token", token.as_str()),
                ("email", "fan@example.com"),
                ("subject", "Hello"),
                ("message", "Great site"),
            ]))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/feedback/");

    assert_eq!(
        feedback::Entity::find()
            .count(&db)
            .await
            .expect("Failed to count"),
        1
    );
}
