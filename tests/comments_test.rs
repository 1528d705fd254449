//! Integration tests for comments on ads and open mics

mod common;
use serial_test::serial;

use bandtogether::comments::{self, CommentParent};
use bandtogether::content::ContentError;
use bandtogether::profiles;
use common::{database::*, fixtures::*};

#[actix_rt::test]
#[serial]
async fn test_comment_on_advertisement() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Comment Band").await;
    let fan = create_test_profile(&db, "Chatty Fan").await;
    let ad = create_test_ad(&db, author.id, "Trumpet player wanted").await;

    let first = comments::create_comment(&db, CommentParent::Advertisement, ad.id, fan.id, "  Is this still open?  ")
        .await
        .expect("Failed to comment");
    let second = comments::create_comment(&db, CommentParent::Advertisement, ad.id, author.id, "Yes it is!")
        .await
        .expect("Failed to comment");

    let listed = comments::list_for(&db, CommentParent::Advertisement, ad.id)
        .await
        .expect("Failed to list");
    assert_eq!(listed.len(), 2);
    // Newest first
    assert_eq!(listed[0].id, second);
    assert_eq!(listed[1].id, first);
    assert_eq!(listed[1].body, "Is this still open?");
    assert_eq!(listed[1].author_name, "Chatty Fan");
    assert!(listed[1].is_author(Some(fan.id)));
    assert!(!listed[1].is_author(None));

    // Comments on other parents stay separate.
    assert!(comments::list_for(&db, CommentParent::OpenMic, ad.id)
        .await
        .expect("Failed to list")
        .is_empty());
}

#[actix_rt::test]
#[serial]
async fn test_comment_body_limits() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let host = create_test_profile(&db, "Limit Host").await;
    let openmic = create_test_openmic(&db, host.id, "Jazz Jam").await;

    let empty = comments::create_comment(&db, CommentParent::OpenMic, openmic.id, host.id, "   ").await;
    assert!(matches!(empty, Err(ContentError::Invalid(_))));

    let long = "a".repeat(151);
    let too_long = comments::create_comment(&db, CommentParent::OpenMic, openmic.id, host.id, &long).await;
    assert!(matches!(too_long, Err(ContentError::Invalid(_))));

    let exact = "a".repeat(150);
    comments::create_comment(&db, CommentParent::OpenMic, openmic.id, host.id, &exact)
        .await
        .expect("150 characters should be accepted");

    let missing = comments::create_comment(&db, CommentParent::OpenMic, openmic.id + 100, host.id, "hi").await;
    assert!(matches!(missing, Err(ContentError::NotFound)));
}

#[actix_rt::test]
#[serial]
async fn test_only_author_deletes_comment() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Ad Owner").await;
    let fan = create_test_profile(&db, "Comment Writer").await;
    let ad = create_test_ad(&db, author.id, "Cellist needed").await;
    let comment = comments::create_comment(&db, CommentParent::Advertisement, ad.id, fan.id, "Interested!")
        .await
        .expect("Failed to comment");

    // Owning the ad does not grant deleting others' comments.
    let denied = comments::delete_comment(&db, CommentParent::Advertisement, comment, author.id).await;
    assert!(matches!(denied, Err(ContentError::Forbidden)));

    let parent = comments::delete_comment(&db, CommentParent::Advertisement, comment, fan.id)
        .await
        .expect("Author should be able to delete");
    assert_eq!(parent, ad.id);

    let again = comments::delete_comment(&db, CommentParent::Advertisement, comment, fan.id).await;
    assert!(matches!(again, Err(ContentError::NotFound)));
}

#[actix_rt::test]
#[serial]
async fn test_comment_outlives_its_author() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let host = create_test_profile(&db, "Staying Host").await;
    let fan = create_test_profile(&db, "Leaving Fan").await;
    let openmic = create_test_openmic(&db, host.id, "Acoustic Night").await;
    let comment = comments::create_comment(&db, CommentParent::OpenMic, openmic.id, fan.id, "See you there")
        .await
        .expect("Failed to comment");

    profiles::delete_profile(&db, fan.id)
        .await
        .expect("Failed to delete profile");

    let listed = comments::list_for(&db, CommentParent::OpenMic, openmic.id)
        .await
        .expect("Failed to list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].author_id, None);
    assert_eq!(listed[0].author_name, "");
    assert_eq!(listed[0].body, "See you there");

    // Orphaned comments cannot be deleted through the author path.
    let denied = comments::delete_comment(&db, CommentParent::OpenMic, comment, host.id).await;
    assert!(matches!(denied, Err(ContentError::Forbidden)));

    // Staff removal still works.
    assert!(comments::remove_comment(&db, CommentParent::OpenMic, comment)
        .await
        .expect("Failed to remove"));
}
