//! Integration tests for moderation reports

mod common;
use serial_test::serial;

use bandtogether::content::{self, ContentError, ContentKind};
use bandtogether::reports;
use common::{database::*, fixtures::*};

#[actix_rt::test]
#[serial]
async fn test_report_captures_target_title() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let reported = create_test_profile(&db, "Suspicious Band").await;
    let reporter = create_test_profile(&db, "Watchful Fan").await;
    let openmic = create_test_openmic(&db, reported.id, "Free Money").await;

    let report = reports::create_report(
        &db,
        reporter.id,
        ContentKind::Profile,
        reported.id,
        "  Fake profile selling gear.  ",
    )
    .await
    .expect("Failed to report profile");
    assert_eq!(report.profile_id, reporter.id);
    assert_eq!(report.content_type, "profile");
    assert_eq!(report.object_type, "profile");
    assert_eq!(report.description, "Fake profile selling gear.");
    assert_eq!(report.object_title, "Suspicious Band - suspiciousband@example.com");

    let report = reports::create_report(
        &db,
        reporter.id,
        ContentKind::OpenMic,
        openmic.id,
        "Not a real open mic event.",
    )
    .await
    .expect("Failed to report open mic");
    assert_eq!(
        report.object_title,
        "Free Money Open Mic - suspiciousband@example.com"
    );
}

#[actix_rt::test]
#[serial]
async fn test_report_validation() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Reported Author").await;
    let reporter = create_test_profile(&db, "Hasty Reporter").await;
    let ad = create_test_ad(&db, author.id, "Roadie wanted").await;

    let short = reports::create_report(&db, reporter.id, ContentKind::Advertisement, ad.id, "bad").await;
    match short {
        Err(ContentError::Invalid(errors)) => assert_eq!(
            errors.get("description"),
            vec!["Description must be at least 10 characters long.".to_string()]
        ),
        other => panic!("Expected validation error, got {:?}", other.map(|r| r.id)),
    }

    let missing = reports::create_report(
        &db,
        reporter.id,
        ContentKind::Advertisement,
        ad.id + 100,
        "This ad does not exist anyway.",
    )
    .await;
    assert!(matches!(missing, Err(ContentError::NotFound)));
}

#[actix_rt::test]
#[serial]
async fn test_resolve_content_targets() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Resolver").await;
    let ad = create_test_ad(&db, author.id, "Mandolin wanted").await;

    let target = content::resolve(&db, ContentKind::Advertisement, ad.id)
        .await
        .expect("Failed to resolve")
        .expect("Ad should resolve");
    assert_eq!(target.title, "Mandolin wanted");
    assert_eq!(target.url, format!("/ads/{}/", ad.id));
    assert_eq!(target.owner_id, author.id);

    let profile = content::resolve(&db, ContentKind::Profile, author.id)
        .await
        .expect("Failed to resolve")
        .expect("Profile should resolve");
    assert_eq!(profile.url, "/profiles/resolver/about/");

    assert!(content::resolve(&db, ContentKind::OpenMic, 4242)
        .await
        .expect("Failed to resolve")
        .is_none());
}

#[test]
fn test_content_kind_paths() {
    assert_eq!(
        ContentKind::from_path("advertisements", "advertisement"),
        Some(ContentKind::Advertisement)
    );
    assert_eq!(ContentKind::from_path("openmics", "openmic"), Some(ContentKind::OpenMic));
    assert_eq!(ContentKind::from_path("profiles", "openmic"), None);
    assert_eq!(ContentKind::from_model_name("profile"), Some(ContentKind::Profile));
    assert_eq!(ContentKind::Profile.path(7), "profiles/profile/7");
}
