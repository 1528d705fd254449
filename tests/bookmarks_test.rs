//! Integration tests for bookmarks

mod common;
use serial_test::serial;

use bandtogether::bookmarks;
use bandtogether::content::{ContentError, ContentKind};
use common::{database::*, fixtures::*};

#[actix_rt::test]
#[serial]
async fn test_bookmark_is_idempotent() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Bookmarked Band").await;
    let fan = create_test_profile(&db, "Bookmarking Fan").await;
    let ad = create_test_ad(&db, author.id, "Horn section wanted").await;

    let (bookmark, created) = bookmarks::get_or_create(&db, fan.id, ContentKind::Advertisement, ad.id)
        .await
        .expect("Failed to bookmark");
    assert!(created);
    assert_eq!(bookmark.object_id, ad.id);
    assert_eq!(bookmark.content_type, "advertisement");

    let (again, created) = bookmarks::get_or_create(&db, fan.id, ContentKind::Advertisement, ad.id)
        .await
        .expect("Failed to bookmark");
    assert!(!created);
    assert_eq!(again.id, bookmark.id);

    let found = bookmarks::find(&db, fan.id, ContentKind::Advertisement, ad.id)
        .await
        .expect("Failed to query");
    assert_eq!(found.map(|b| b.id), Some(bookmark.id));

    // Same id, other kind: a different target.
    assert!(bookmarks::find(&db, fan.id, ContentKind::OpenMic, ad.id)
        .await
        .expect("Failed to query")
        .is_none());
}

#[actix_rt::test]
#[serial]
async fn test_bookmark_missing_target() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let fan = create_test_profile(&db, "Lost Fan").await;
    let result = bookmarks::get_or_create(&db, fan.id, ContentKind::OpenMic, 9999).await;
    assert!(matches!(result, Err(ContentError::NotFound)));
}

#[actix_rt::test]
#[serial]
async fn test_bookmark_lists_by_kind() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Busy Band").await;
    let fan = create_test_profile(&db, "Collector").await;
    let first = create_test_ad(&db, author.id, "First ad").await;
    let second = create_test_ad(&db, author.id, "Second ad").await;
    let openmic = create_test_openmic(&db, author.id, "Monday Mic").await;

    bookmarks::get_or_create(&db, fan.id, ContentKind::Advertisement, first.id)
        .await
        .expect("Failed to bookmark");
    bookmarks::get_or_create(&db, fan.id, ContentKind::Advertisement, second.id)
        .await
        .expect("Failed to bookmark");
    bookmarks::get_or_create(&db, fan.id, ContentKind::OpenMic, openmic.id)
        .await
        .expect("Failed to bookmark");
    bookmarks::get_or_create(&db, fan.id, ContentKind::Profile, author.id)
        .await
        .expect("Failed to bookmark");

    let ads = bookmarks::bookmarked_advertisements(&db, fan.id)
        .await
        .expect("Failed to list");
    let mut ad_ids: Vec<i32> = ads.iter().map(|ad| ad.id).collect();
    ad_ids.sort_unstable();
    assert_eq!(ad_ids, vec![first.id, second.id]);

    let openmics = bookmarks::bookmarked_openmics(&db, fan.id)
        .await
        .expect("Failed to list");
    assert_eq!(openmics.iter().map(|o| o.id).collect::<Vec<_>>(), vec![openmic.id]);

    let profiles = bookmarks::bookmarked_profiles(&db, fan.id)
        .await
        .expect("Failed to list");
    assert_eq!(profiles.iter().map(|p| p.id).collect::<Vec<_>>(), vec![author.id]);

    // The author has bookmarked nothing.
    assert!(bookmarks::bookmarked_profiles(&db, author.id)
        .await
        .expect("Failed to list")
        .is_empty());
}

#[actix_rt::test]
#[serial]
async fn test_delete_only_own_bookmark() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Target Band").await;
    let fan = create_test_profile(&db, "Owner Fan").await;
    let other = create_test_profile(&db, "Nosy Fan").await;

    let (bookmark, _) = bookmarks::get_or_create(&db, fan.id, ContentKind::Profile, author.id)
        .await
        .expect("Failed to bookmark");

    let denied = bookmarks::delete_owned(&db, other.id, bookmark.id).await;
    assert!(matches!(denied, Err(ContentError::NotFound)));

    let deleted = bookmarks::delete_owned(&db, fan.id, bookmark.id)
        .await
        .expect("Owner should be able to delete");
    assert_eq!(deleted.id, bookmark.id);
    assert!(bookmarks::find(&db, fan.id, ContentKind::Profile, author.id)
        .await
        .expect("Failed to query")
        .is_none());
}
