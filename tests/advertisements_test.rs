//! Integration tests for band and musician ads

mod common;
use serial_test::serial;

use bandtogether::advertisements;
use bandtogether::bookmarks;
use bandtogether::content::{ContentError, ContentKind};
use bandtogether::orm::{bookmarks as bookmark_orm, reports as report_orm};
use bandtogether::reports;
use common::{database::*, fixtures::*};
use sea_orm::EntityTrait;

#[actix_rt::test]
#[serial]
async fn test_create_advertisement_with_facets() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Garage Band").await;
    let choices = choices(&db).await;
    let form = ad_form(&choices, "Looking for a drummer");

    let ad = advertisements::create_advertisement(&db, author.id, &form, &choices)
        .await
        .expect("Failed to create ad");
    assert_eq!(ad.title, "Looking for a drummer");
    assert_eq!(ad.author_id, author.id);

    let mut genres = advertisements::genre_ids(&db, ad.id).await.expect("Failed to query");
    genres.sort_unstable();
    let mut expected = form.genres.clone();
    expected.sort_unstable();
    assert_eq!(genres, expected);
    assert_eq!(
        advertisements::skill_ids(&db, ad.id).await.expect("Failed to query"),
        form.skills
    );
}

#[actix_rt::test]
#[serial]
async fn test_advertisement_requires_type_and_location() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Picky Band").await;
    let choices = choices(&db).await;
    let mut form = ad_form(&choices, "");
    form.ad_type_id = None;
    form.city_id = None;

    match advertisements::create_advertisement(&db, author.id, &form, &choices).await {
        Err(ContentError::Invalid(errors)) => {
            assert!(errors.has("title"));
            assert!(errors.has("ad_type"));
            assert!(errors.has("location"));
            assert!(!errors.has("description"));
        }
        other => panic!("Expected validation errors, got {:?}", other.map(|ad| ad.id)),
    }
}

#[actix_rt::test]
#[serial]
async fn test_advertisement_title_length() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Wordy Band").await;
    let choices = choices(&db).await;

    let too_long = ad_form(&choices, &"a".repeat(101));
    match advertisements::create_advertisement(&db, author.id, &too_long, &choices).await {
        Err(ContentError::Invalid(errors)) => assert_eq!(
            errors.get("title"),
            vec!["Ensure this value has at most 100 characters.".to_string()]
        ),
        other => panic!("Expected a title error, got {:?}", other.map(|ad| ad.id)),
    }

    let longest = ad_form(&choices, &"a".repeat(100));
    advertisements::create_advertisement(&db, author.id, &longest, &choices)
        .await
        .expect("100 characters should be accepted");
}

#[actix_rt::test]
#[serial]
async fn test_only_author_edits_advertisement() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Ad Author").await;
    let other = create_test_profile(&db, "Ad Stranger").await;
    let ad = create_test_ad(&db, author.id, "Keyboardist wanted").await;
    let choices = choices(&db).await;

    let mut form = ad_form(&choices, "Keyboardist still wanted");
    form.genres.truncate(1);
    form.skills.clear();

    let result = advertisements::update_advertisement(&db, ad.id, other.id, &form, &choices).await;
    assert!(matches!(result, Err(ContentError::Forbidden)));

    let updated = advertisements::update_advertisement(&db, ad.id, author.id, &form, &choices)
        .await
        .expect("Author should be able to edit");
    assert_eq!(updated.title, "Keyboardist still wanted");
    assert!(updated.last_updated >= ad.last_updated);
    assert_eq!(
        advertisements::genre_ids(&db, ad.id).await.expect("Failed to query"),
        form.genres
    );
    assert!(advertisements::skill_ids(&db, ad.id)
        .await
        .expect("Failed to query")
        .is_empty());

    let missing = advertisements::update_advertisement(&db, ad.id + 100, author.id, &form, &choices).await;
    assert!(matches!(missing, Err(ContentError::NotFound)));
}

#[actix_rt::test]
#[serial]
async fn test_delete_advertisement_purges_attachments() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Deleting Band").await;
    let fan = create_test_profile(&db, "Loyal Fan").await;
    let ad = create_test_ad(&db, author.id, "Singer needed").await;
    let kept = create_test_ad(&db, author.id, "Guitarist needed").await;

    bookmarks::get_or_create(&db, fan.id, ContentKind::Advertisement, ad.id)
        .await
        .expect("Failed to bookmark");
    bookmarks::get_or_create(&db, fan.id, ContentKind::Advertisement, kept.id)
        .await
        .expect("Failed to bookmark");
    reports::create_report(
        &db,
        fan.id,
        ContentKind::Advertisement,
        ad.id,
        "This ad looks like spam to me.",
    )
    .await
    .expect("Failed to report");

    let denied = advertisements::delete_advertisement(&db, ad.id, Some(fan.id)).await;
    assert!(matches!(denied, Err(ContentError::Forbidden)));

    advertisements::delete_advertisement(&db, ad.id, Some(author.id))
        .await
        .expect("Failed to delete");

    let missing = advertisements::get(&db, ad.id).await;
    assert!(matches!(missing, Err(ContentError::NotFound)));

    let remaining = bookmark_orm::Entity::find()
        .all(&db)
        .await
        .expect("Failed to query");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].object_id, kept.id);

    let reports = report_orm::Entity::find()
        .all(&db)
        .await
        .expect("Failed to query");
    assert!(reports.is_empty());
}

#[actix_rt::test]
#[serial]
async fn test_staff_delete_skips_owner_check() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Spam Band").await;
    let ad = create_test_ad(&db, author.id, "Buy followers").await;

    advertisements::delete_advertisement(&db, ad.id, None)
        .await
        .expect("Staff delete should succeed");
    assert!(matches!(
        advertisements::delete_advertisement(&db, ad.id, None).await,
        Err(ContentError::NotFound)
    ));
}
