//! Integration tests for musician profiles

mod common;
use serial_test::serial;

use bandtogether::bookmarks;
use bandtogether::content::ContentKind;
use bandtogether::orm::{advertisements, bookmarks as bookmark_orm, profiles as profile_orm};
use bandtogether::profiles::{self, GeneralInfo, ProfileError};
use common::{database::*, fixtures::*};
use sea_orm::EntityTrait;

#[actix_rt::test]
#[serial]
async fn test_create_profile_sets_slug_and_url() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let profile = create_test_profile(&db, "The Night Owls").await;
    assert_eq!(profile.slug, "the-night-owls");
    assert_eq!(profile.get_url(), "/profiles/the-night-owls/about/");

    let found = profiles::find_by_slug(&db, "the-night-owls")
        .await
        .expect("Failed to query")
        .expect("Profile should exist");
    assert_eq!(found.id, profile.id);

    let by_user = profiles::find_by_user(&db, profile.user_id)
        .await
        .expect("Failed to query");
    assert_eq!(by_user.map(|p| p.id), Some(profile.id));
}

#[actix_rt::test]
#[serial]
async fn test_slug_collisions_get_suffix() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let first = create_test_profile(&db, "Blue Note").await;
    let user = create_test_user(&db, "bluenote2").await;
    let second = create_profile_for(&db, user.id, "Blue  Note!").await;
    let user = create_test_user(&db, "bluenote3").await;
    let third = create_profile_for(&db, user.id, "blue note").await;

    assert_eq!(first.slug, "blue-note");
    assert_eq!(second.slug, "blue-note-1");
    assert_eq!(third.slug, "blue-note-2");
}

#[actix_rt::test]
#[serial]
async fn test_slug_transliterates_accents() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let profile = create_test_profile(&db, "Café Noir").await;
    assert_eq!(profile.slug, "cafe-noir");
    assert_eq!(profile.get_url(), "/profiles/cafe-noir/about/");
}

#[actix_rt::test]
#[serial]
async fn test_slug_without_letters_falls_back() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let user = create_test_user(&db, "symbols").await;
    let profile = create_profile_for(&db, user.id, "!!!").await;
    assert_eq!(profile.slug, "profile");
}

#[actix_rt::test]
#[serial]
async fn test_one_profile_per_user() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let profile = create_test_profile(&db, "Solo Act").await;
    let choices = choices(&db).await;
    let info = GeneralInfo {
        display_name: "Second Act".to_string(),
        ..Default::default()
    };

    let result = profiles::create_profile(&db, profile.user_id, &info, &choices).await;
    assert!(matches!(result, Err(ProfileError::AlreadyExists)));
}

#[actix_rt::test]
#[serial]
async fn test_general_info_validation() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let user = create_test_user(&db, "invalid").await;
    let choices = choices(&db).await;
    let info = GeneralInfo {
        display_name: String::new(),
        profile_type_id: Some(-1),
        city_id: None,
        bio: String::new(),
    };

    match profiles::create_profile(&db, user.id, &info, &choices).await {
        Err(ProfileError::Invalid(errors)) => {
            assert!(errors.has("display_name"));
            assert!(errors.has("profile_type"));
            assert!(!errors.has("location"));
        }
        other => panic!("Expected validation errors, got {:?}", other.map(|p| p.id)),
    }
}

#[actix_rt::test]
#[serial]
async fn test_edit_keeps_slug() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let profile = create_test_profile(&db, "Old Name").await;
    let choices = choices(&db).await;
    let mut info = GeneralInfo::from_profile(&profile);
    info.display_name = "New Name".to_string();

    let updated = profiles::update_general_info(&db, profile, &info, &choices)
        .await
        .expect("Failed to update");
    assert_eq!(updated.display_name, "New Name");
    assert_eq!(updated.slug, "old-name");
}

#[actix_rt::test]
#[serial]
async fn test_set_genres_replaces_selection() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let profile = create_test_profile(&db, "Genre Hopper").await;
    let choices = choices(&db).await;
    let first: Vec<i32> = choices.genres.iter().take(3).map(|g| g.id).collect();
    let second: Vec<i32> = choices.genres.iter().skip(3).take(1).map(|g| g.id).collect();

    profiles::set_genres(&db, profile.id, &first)
        .await
        .expect("Failed to set genres");
    let mut stored = profiles::genre_ids(&db, profile.id).await.expect("Failed to query");
    stored.sort_unstable();
    let mut expected = first.clone();
    expected.sort_unstable();
    assert_eq!(stored, expected);

    profiles::set_genres(&db, profile.id, &second)
        .await
        .expect("Failed to set genres");
    assert_eq!(
        profiles::genre_ids(&db, profile.id).await.expect("Failed to query"),
        second
    );
}

#[actix_rt::test]
#[serial]
async fn test_delete_profile_cascades() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let leaving = create_test_profile(&db, "Leaving Band").await;
    let staying = create_test_profile(&db, "Staying Band").await;
    let ad = create_test_ad(&db, leaving.id, "Need a bassist").await;

    // Someone else's bookmarks on the profile and its ad go too.
    bookmarks::get_or_create(&db, staying.id, ContentKind::Profile, leaving.id)
        .await
        .expect("Failed to bookmark profile");
    bookmarks::get_or_create(&db, staying.id, ContentKind::Advertisement, ad.id)
        .await
        .expect("Failed to bookmark ad");
    // The leaving profile's own bookmark goes with it.
    bookmarks::get_or_create(&db, leaving.id, ContentKind::Profile, staying.id)
        .await
        .expect("Failed to bookmark profile");

    assert!(profiles::delete_profile(&db, leaving.id)
        .await
        .expect("Failed to delete"));

    assert!(profile_orm::Entity::find_by_id(leaving.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .is_none());
    assert!(advertisements::Entity::find_by_id(ad.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .is_none());
    let remaining = bookmark_orm::Entity::find()
        .all(&db)
        .await
        .expect("Failed to query");
    assert!(remaining.is_empty());

    // Deleting again reports nothing removed.
    assert!(!profiles::delete_profile(&db, leaving.id)
        .await
        .expect("Failed to delete"));
}
