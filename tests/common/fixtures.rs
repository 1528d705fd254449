//! Test fixtures for creating test data
#![allow(dead_code)]

use bandtogether::advertisements::{self, AdvertisementForm};
use bandtogether::openmics::{self, OpenMicForm};
use bandtogether::orm::{advertisements as ad_orm, open_mics, profiles, users};
use bandtogether::profiles::GeneralInfo;
use bandtogether::taxonomy::{self, Choices};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_orm::DatabaseConnection;

pub const TEST_PASSWORD: &str = "correct horse battery";

pub async fn choices(db: &DatabaseConnection) -> Choices {
    taxonomy::load_choices(db).await.expect("Failed to load choices")
}

/// Create a test user with known credentials
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> users::Model {
    bandtogether::accounts::create_user(
        db,
        username,
        &format!("{}@example.com", username),
        TEST_PASSWORD,
    )
    .await
    .expect("Failed to create test user")
}

/// Create a user and a musician profile for them
pub async fn create_test_profile(db: &DatabaseConnection, display_name: &str) -> profiles::Model {
    let username: String = display_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    let user = create_test_user(db, &username).await;
    create_profile_for(db, user.id, display_name).await
}

pub async fn create_profile_for(db: &DatabaseConnection, user_id: i32, display_name: &str) -> profiles::Model {
    let choices = choices(db).await;
    let info = GeneralInfo {
        display_name: display_name.to_string(),
        profile_type_id: choices.profile_types.first().map(|t| t.id),
        city_id: choices.cities.first().map(|c| c.id),
        bio: format!("{} plays music.", display_name),
    };
    bandtogether::profiles::create_profile(db, user_id, &info, &choices)
        .await
        .expect("Failed to create profile")
}

pub fn ad_form(choices: &Choices, title: &str) -> AdvertisementForm {
    AdvertisementForm {
        title: title.to_string(),
        ad_type_id: choices.ad_types.first().map(|t| t.id),
        description: format!("{} needs you.", title),
        city_id: choices.cities.first().map(|c| c.id),
        genres: choices.genres.iter().take(2).map(|g| g.id).collect(),
        skills: choices.skills.iter().take(1).map(|s| s.id).collect(),
    }
}

pub async fn create_test_ad(db: &DatabaseConnection, author_id: i32, title: &str) -> ad_orm::Model {
    let choices = choices(db).await;
    advertisements::create_advertisement(db, author_id, &ad_form(&choices, title), &choices)
        .await
        .expect("Failed to create ad")
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn tomorrow() -> NaiveDate {
    (now() + Duration::days(1)).date()
}

pub fn openmic_form(choices: &Choices, title: &str) -> OpenMicForm {
    let date = tomorrow();
    let mut form = OpenMicForm::empty();
    form.title = title.to_string();
    form.description = format!("{} welcomes every act.", title);
    form.city_id = choices.cities.first().map(|c| c.id);
    form.address = "12 Main St".to_string();
    form.event_date = Some(date);
    form.start_time = NaiveTime::from_hms_opt(19, 0, 0);
    form.end_time = NaiveTime::from_hms_opt(21, 0, 0);
    form.raw_event_date = date.format("%Y-%m-%d").to_string();
    form.raw_start_time = "19:00".to_string();
    form.raw_end_time = "21:00".to_string();
    form.genres = choices.genres.iter().take(1).map(|g| g.id).collect();
    form
}

pub async fn create_test_openmic(db: &DatabaseConnection, author_id: i32, title: &str) -> open_mics::Model {
    let choices = choices(db).await;
    openmics::create_openmic(db, author_id, &openmic_form(&choices, title), &choices, now())
        .await
        .expect("Failed to create open mic")
}
