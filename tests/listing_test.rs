//! Integration tests for filtered, paginated lists

mod common;
use serial_test::serial;

use bandtogether::advertisements;
use bandtogether::forms::FormFields;
use bandtogether::listing::{fetch_page, AdvertisementFilter, OpenMicFilter, ProfileFilter};
use common::{database::*, fixtures::*};

#[actix_rt::test]
#[serial]
async fn test_pages_of_ten_newest_first() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Prolific Poster").await;
    let mut ids = Vec::new();
    for i in 0..12 {
        ids.push(create_test_ad(&db, author.id, &format!("Ad number {}", i)).await.id);
    }

    let filter = AdvertisementFilter::default();
    let first = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total, 12);
    assert_eq!(first.num_pages, 2);
    assert!(first.has_next());
    assert_eq!(first.next_number(), 2);
    // Newest first
    assert_eq!(first.items[0].id, ids[11]);

    let second = fetch_page(&db, filter.select(), 2, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 2 exists");
    assert_eq!(second.items.len(), 2);
    assert!(!second.has_next());
    assert_eq!(second.items[1].id, ids[0]);

    let past_end = fetch_page(&db, filter.select(), 3, 10)
        .await
        .expect("Failed to fetch");
    assert!(past_end.is_none());
}

#[actix_rt::test]
#[serial]
async fn test_empty_list_has_first_page() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let page = fetch_page(&db, OpenMicFilter::default().select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 of nothing still renders");
    assert!(page.is_empty());
    assert!(!page.has_next());

    assert!(fetch_page(&db, OpenMicFilter::default().select(), 2, 10)
        .await
        .expect("Failed to fetch")
        .is_none());
}

#[actix_rt::test]
#[serial]
async fn test_ad_filters_match_any_selected_genre() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Filter Band").await;
    let choices = choices(&db).await;
    let genre_a = choices.genres[0].id;
    let genre_b = choices.genres[1].id;
    let genre_c = choices.genres[2].id;

    let mut form = ad_form(&choices, "Funk drummer wanted");
    form.genres = vec![genre_a];
    let funk = advertisements::create_advertisement(&db, author.id, &form, &choices)
        .await
        .expect("Failed to create ad");

    form.title = "Soul singer wanted".to_string();
    form.genres = vec![genre_b];
    let soul = advertisements::create_advertisement(&db, author.id, &form, &choices)
        .await
        .expect("Failed to create ad");

    form.title = "Polka accordion wanted".to_string();
    form.genres = vec![genre_c];
    advertisements::create_advertisement(&db, author.id, &form, &choices)
        .await
        .expect("Failed to create ad");

    let query = format!("genres={}&genres={}", genre_a, genre_b);
    let filter = AdvertisementFilter::from_fields(&FormFields::from_query(&query));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    let mut found: Vec<i32> = page.items.iter().map(|ad| ad.id).collect();
    found.sort_unstable();
    assert_eq!(found, vec![funk.id, soul.id]);

    let filter = AdvertisementFilter::from_fields(&FormFields::from_query("title=WANTED"));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(page.total, 3);

    let filter = AdvertisementFilter::from_fields(&FormFields::from_query("title=soul"));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(page.items.iter().map(|ad| ad.id).collect::<Vec<_>>(), vec![soul.id]);
}

#[actix_rt::test]
#[serial]
async fn test_title_search_matches_wildcard_characters_literally() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let author = create_test_profile(&db, "Bass Heads").await;
    let underscored = create_test_ad(&db, author.id, "drum_n_bass crew").await;
    create_test_ad(&db, author.id, "drum n bass crew").await;
    let percent = create_test_ad(&db, author.id, "100% original covers").await;
    create_test_ad(&db, author.id, "1000 covers").await;

    let filter = AdvertisementFilter::from_fields(&FormFields::from_query("title=drum_n"));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(page.items.iter().map(|ad| ad.id).collect::<Vec<_>>(), vec![underscored.id]);

    let filter = AdvertisementFilter::from_fields(&FormFields::from_query("title=100%25"));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(page.items.iter().map(|ad| ad.id).collect::<Vec<_>>(), vec![percent.id]);
}

#[actix_rt::test]
#[serial]
async fn test_profile_filters() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    let choices = choices(&db).await;
    let band = create_test_profile(&db, "Harbor Lights").await;
    let other = create_test_profile(&db, "Desert Wind").await;
    let genre = choices.genres[0].id;
    bandtogether::profiles::set_genres(&db, band.id, &[genre])
        .await
        .expect("Failed to set genres");

    let filter = ProfileFilter::from_fields(&FormFields::from_query(&format!("genres={}", genre)));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(page.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![band.id]);

    let filter = ProfileFilter::from_fields(&FormFields::from_query("display_name=wind"));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(page.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![other.id]);

    // Nobody has uploaded a picture yet.
    let filter = ProfileFilter::from_fields(&FormFields::from_query("has_profile_picture=on"));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert!(page.is_empty());

    let filter = ProfileFilter::from_fields(&FormFields::from_query("order_by=last_login"));
    let page = fetch_page(&db, filter.select(), 1, 10)
        .await
        .expect("Failed to fetch")
        .expect("Page 1 exists");
    assert_eq!(page.total, 2);
}
