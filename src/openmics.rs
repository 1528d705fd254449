//! Open mic event listings.

use crate::comments::{self, CommentDisplay, CommentParent};
use crate::constants::MAX_TITLE_LENGTH;
use crate::content::{check_owner, purge_attachments, ContentError, ContentKind};
use crate::forms::{FieldErrors, FormFields};
use crate::orm::{open_mic_genres, open_mics, profiles};
use crate::taxonomy::Choices;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, ConnectionTrait, DbErr, TransactionTrait,
};
use std::collections::HashMap;

/// Form-wide errors are filed under this key.
pub const NON_FIELD_ERRORS: &str = "__all__";

static MAPS_COORDINATES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").expect("static regex"));

/// `(lat, lng)` from the `@lat,lng` part of a Google Maps link.
pub fn coordinates(google_maps_link: &str) -> Option<(f64, f64)> {
    let captures = MAPS_COORDINATES.captures(google_maps_link)?;
    let lat = captures.get(1)?.as_str().parse().ok()?;
    let lng = captures.get(2)?.as_str().parse().ok()?;
    Some((lat, lng))
}

/// Checks an event against the author's local clock. Only same-day events
/// must end after they start; a later event may run past midnight.
pub fn validate_schedule(
    event_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    now: NaiveDateTime,
) -> Result<(), &'static str> {
    if event_date < now.date() {
        return Err("Event date cannot be in the past.");
    }
    if event_date == now.date() {
        if start_time < now.time() {
            return Err("Start time cannot be in the past.");
        }
        if end_time < start_time {
            return Err("End time cannot be before start time.");
        }
    }
    Ok(())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Create and edit form.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenMicForm {
    pub title: String,
    pub description: String,
    pub city_id: Option<i32>,
    pub address: String,
    pub google_maps_link: Option<String>,
    pub venue_phone_number: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub genres: Vec<i32>,
    /// Raw date and time inputs, echoed back when they fail to parse.
    pub raw_event_date: String,
    pub raw_start_time: String,
    pub raw_end_time: String,
}

impl OpenMicForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        let raw_event_date = fields.text("event_date");
        let raw_start_time = fields.text("start_time");
        let raw_end_time = fields.text("end_time");
        Self {
            title: fields.text("title"),
            description: fields.text("description"),
            city_id: fields.id("location"),
            address: fields.text("address"),
            google_maps_link: fields.optional_text("google_maps_link"),
            venue_phone_number: fields.optional_text("venue_phone_number"),
            event_date: NaiveDate::parse_from_str(&raw_event_date, "%Y-%m-%d").ok(),
            start_time: parse_time(&raw_start_time),
            end_time: parse_time(&raw_end_time),
            genres: fields.ids("genres"),
            raw_event_date,
            raw_start_time,
            raw_end_time,
        }
    }

    pub fn from_model(openmic: &open_mics::Model, genres: Vec<i32>) -> Self {
        Self {
            title: openmic.title.clone(),
            description: openmic.description.clone(),
            city_id: openmic.city_id,
            address: openmic.address.clone(),
            google_maps_link: openmic.google_maps_link.clone(),
            venue_phone_number: openmic.venue_phone_number.clone(),
            event_date: Some(openmic.event_date),
            start_time: Some(openmic.start_time),
            end_time: Some(openmic.end_time),
            genres,
            raw_event_date: openmic.event_date.format("%Y-%m-%d").to_string(),
            raw_start_time: openmic.start_time.format("%H:%M").to_string(),
            raw_end_time: openmic.end_time.format("%H:%M").to_string(),
        }
    }

    pub fn empty() -> Self {
        Self::from_fields(&FormFields::default())
    }

    /// Field checks plus, when `check_schedule` is set, the schedule against `now`.
    pub fn validate(&self, choices: &Choices, now: NaiveDateTime, check_schedule: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.title.is_empty() {
            errors.add("title", "This field is required.");
        } else if self.title.chars().count() > MAX_TITLE_LENGTH {
            errors.add(
                "title",
                format!("Ensure this value has at most {} characters.", MAX_TITLE_LENGTH),
            );
        }
        if self.description.is_empty() {
            errors.add("description", "This field is required.");
        }
        if self.address.is_empty() {
            errors.add("address", "This field is required.");
        }
        match self.city_id {
            None => errors.add("location", "This field is required."),
            Some(id) if !choices.cities.iter().any(|c| c.id == id) => {
                errors.add("location", "Select a valid choice.")
            }
            Some(_) => {}
        }
        if let Some(link) = &self.google_maps_link {
            if url::Url::parse(link).is_err() {
                errors.add("google_maps_link", "Enter a valid URL.");
            }
        }
        if let Some(phone) = &self.venue_phone_number {
            let valid = phone.chars().count() <= 20
                && phone
                    .chars()
                    .all(|c| c.is_ascii_digit() || " +-().".contains(c));
            if !valid {
                errors.add("venue_phone_number", "Enter a valid phone number.");
            }
        }
        if self.genres.iter().any(|id| !choices.genres.iter().any(|g| g.id == *id)) {
            errors.add("genres", "Select a valid choice.");
        }

        let fields = [
            ("event_date", self.event_date.is_some(), &self.raw_event_date, "Enter a valid date."),
            ("start_time", self.start_time.is_some(), &self.raw_start_time, "Enter a valid time."),
            ("end_time", self.end_time.is_some(), &self.raw_end_time, "Enter a valid time."),
        ];
        for (name, parsed, raw, message) in fields {
            if raw.is_empty() {
                errors.add(name, "This field is required.");
            } else if !parsed {
                errors.add(name, message);
            }
        }

        if let (Some(date), Some(start), Some(end)) = (self.event_date, self.start_time, self.end_time) {
            if check_schedule {
                if let Err(message) = validate_schedule(date, start, end, now) {
                    errors.add(NON_FIELD_ERRORS, message);
                }
            }
        }

        errors.into_result()
    }

    /// Whether the date or either time differs from `openmic`.
    pub fn schedule_changed(&self, openmic: &open_mics::Model) -> bool {
        self.event_date != Some(openmic.event_date)
            || self.start_time != Some(openmic.start_time)
            || self.end_time != Some(openmic.end_time)
    }

    pub fn is_city(&self, id: &i32) -> bool {
        self.city_id == Some(*id)
    }

    pub fn has_genre(&self, id: &i32) -> bool {
        self.genres.contains(id)
    }

    pub fn google_maps_link_value(&self) -> String {
        self.google_maps_link.clone().unwrap_or_default()
    }

    pub fn venue_phone_number_value(&self) -> String {
        self.venue_phone_number.clone().unwrap_or_default()
    }
}

async fn replace_genres<C>(db: &C, openmic_id: i32, genres: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    open_mic_genres::Entity::delete_many()
        .filter(open_mic_genres::Column::OpenMicId.eq(openmic_id))
        .exec(db)
        .await?;
    for genre_id in genres {
        open_mic_genres::ActiveModel {
            open_mic_id: Set(openmic_id),
            genre_id: Set(*genre_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

fn required<T>(value: Option<T>) -> Result<T, ContentError> {
    value.ok_or_else(|| ContentError::Invalid(FieldErrors::new()))
}

/// `now` is the author's local time, used for the schedule check.
pub async fn create_openmic<C>(
    db: &C,
    author_id: i32,
    form: &OpenMicForm,
    choices: &Choices,
    now: NaiveDateTime,
) -> Result<open_mics::Model, ContentError>
where
    C: TransactionTrait,
{
    form.validate(choices, now, true)?;

    let created = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;
    let openmic = open_mics::ActiveModel {
        title: Set(form.title.clone()),
        description: Set(form.description.clone()),
        author_id: Set(author_id),
        city_id: Set(form.city_id),
        address: Set(form.address.clone()),
        google_maps_link: Set(form.google_maps_link.clone()),
        venue_phone_number: Set(form.venue_phone_number.clone()),
        event_date: Set(required(form.event_date)?),
        start_time: Set(required(form.start_time)?),
        end_time: Set(required(form.end_time)?),
        created: Set(created),
        last_updated: Set(created),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    replace_genres(&txn, openmic.id, &form.genres).await?;
    txn.commit().await?;

    log::info!("Profile {} created open mic {}", author_id, openmic.id);
    Ok(openmic)
}

pub async fn get<C>(db: &C, openmic_id: i32) -> Result<open_mics::Model, ContentError>
where
    C: ConnectionTrait,
{
    open_mics::Entity::find_by_id(openmic_id)
        .one(db)
        .await?
        .ok_or(ContentError::NotFound)
}

pub async fn get_owned<C>(db: &C, openmic_id: i32, profile_id: i32) -> Result<open_mics::Model, ContentError>
where
    C: ConnectionTrait,
{
    let openmic = get(db, openmic_id).await?;
    check_owner(openmic.author_id, profile_id)?;
    Ok(openmic)
}

/// The schedule is only rechecked when it changed, so past events stay editable.
pub async fn update_openmic<C>(
    db: &C,
    openmic_id: i32,
    profile_id: i32,
    form: &OpenMicForm,
    choices: &Choices,
    now: NaiveDateTime,
) -> Result<open_mics::Model, ContentError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let openmic = get_owned(db, openmic_id, profile_id).await?;
    form.validate(choices, now, form.schedule_changed(&openmic))?;

    let txn = db.begin().await?;
    let mut active: open_mics::ActiveModel = openmic.into();
    active.title = Set(form.title.clone());
    active.description = Set(form.description.clone());
    active.city_id = Set(form.city_id);
    active.address = Set(form.address.clone());
    active.google_maps_link = Set(form.google_maps_link.clone());
    active.venue_phone_number = Set(form.venue_phone_number.clone());
    active.event_date = Set(required(form.event_date)?);
    active.start_time = Set(required(form.start_time)?);
    active.end_time = Set(required(form.end_time)?);
    active.last_updated = Set(chrono::Utc::now().naive_utc());
    let openmic = active.update(&txn).await?;
    replace_genres(&txn, openmic.id, &form.genres).await?;
    txn.commit().await?;

    log::info!("Profile {} edited open mic {}", profile_id, openmic.id);
    Ok(openmic)
}

/// Deletes the open mic with its bookmarks and reports. Staff pass `None`.
pub async fn delete_openmic<C>(db: &C, openmic_id: i32, actor: Option<i32>) -> Result<(), ContentError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let openmic = get(db, openmic_id).await?;
    if let Some(profile_id) = actor {
        check_owner(openmic.author_id, profile_id)?;
    }

    let txn = db.begin().await?;
    purge_attachments(&txn, ContentKind::OpenMic, &[openmic.id]).await?;
    open_mics::Entity::delete_by_id(openmic.id).exec(&txn).await?;
    txn.commit().await?;

    log::info!("Deleted open mic {} ({:?})", openmic.id, actor);
    Ok(())
}

pub async fn genre_ids<C>(db: &C, openmic_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(open_mic_genres::Entity::find()
        .filter(open_mic_genres::Column::OpenMicId.eq(openmic_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.genre_id)
        .collect())
}

/// An open mic in a listing.
#[derive(Clone, Debug)]
pub struct OpenMicCard {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub city: String,
    pub address: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub genres: Vec<String>,
    pub author_name: String,
    pub author_url: String,
    pub bookmark_id: Option<i32>,
}

pub async fn cards<C>(
    db: &C,
    openmics: Vec<open_mics::Model>,
    choices: &Choices,
) -> Result<Vec<OpenMicCard>, DbErr>
where
    C: ConnectionTrait,
{
    if openmics.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = openmics.iter().map(|o| o.id).collect();
    let author_ids: Vec<i32> = openmics.iter().map(|o| o.author_id).collect();

    let mut genres: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in open_mic_genres::Entity::find()
        .filter(open_mic_genres::Column::OpenMicId.is_in(ids))
        .all(db)
        .await?
    {
        genres.entry(row.open_mic_id).or_default().push(row.genre_id);
    }
    let authors: HashMap<i32, profiles::Model> = profiles::Entity::find()
        .filter(profiles::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(openmics
        .into_iter()
        .map(|openmic| {
            let author = authors.get(&openmic.author_id);
            OpenMicCard {
                id: openmic.id,
                url: format!("/openmics/{}/", openmic.id),
                city: choices.city_label(openmic.city_id),
                event_date: openmic.event_date,
                start_time: openmic.start_time,
                end_time: openmic.end_time,
                genres: choices.genre_names(genres.get(&openmic.id).map(Vec::as_slice).unwrap_or_default()),
                author_name: author.map(|a| a.display_name.clone()).unwrap_or_default(),
                author_url: author.map(|a| a.get_url()).unwrap_or_default(),
                bookmark_id: None,
                title: openmic.title,
                address: openmic.address,
            }
        })
        .collect())
}

#[derive(Clone, Debug)]
pub struct OpenMicDetail {
    pub openmic: open_mics::Model,
    pub author: Option<profiles::Model>,
    pub city: String,
    pub genres: Vec<String>,
    pub coordinates: Option<(f64, f64)>,
    pub comments: Vec<CommentDisplay>,
}

impl OpenMicDetail {
    pub fn is_author(&self, profile_id: Option<i32>) -> bool {
        profile_id == Some(self.openmic.author_id)
    }

    pub fn author_name(&self) -> String {
        self.author
            .as_ref()
            .map(|a| a.display_name.clone())
            .unwrap_or_default()
    }

    pub fn author_url(&self) -> String {
        self.author.as_ref().map(|a| a.get_url()).unwrap_or_default()
    }

    pub fn google_maps_link(&self) -> String {
        self.openmic.google_maps_link.clone().unwrap_or_default()
    }

    pub fn venue_phone_number(&self) -> String {
        self.openmic.venue_phone_number.clone().unwrap_or_default()
    }

    /// OpenStreetMap embed centred on the venue.
    pub fn map_embed_url(&self) -> Option<String> {
        self.coordinates.map(|(lat, lng)| {
            format!(
                "https://www.openstreetmap.org/export/embed.html?bbox={},{},{},{}&layer=mapnik&marker={},{}",
                lng - 0.005,
                lat - 0.005,
                lng + 0.005,
                lat + 0.005,
                lat,
                lng
            )
        })
    }
}

pub async fn load_detail<C>(db: &C, openmic_id: i32, choices: &Choices) -> Result<OpenMicDetail, ContentError>
where
    C: ConnectionTrait,
{
    let openmic = get(db, openmic_id).await?;
    let author = profiles::Entity::find_by_id(openmic.author_id).one(db).await?;
    let genres = choices.genre_names(&genre_ids(db, openmic.id).await?);
    let comments = comments::list_for(db, CommentParent::OpenMic, openmic.id).await?;

    Ok(OpenMicDetail {
        city: choices.city_label(openmic.city_id),
        coordinates: openmic.google_maps_link.as_deref().and_then(coordinates),
        author,
        genres,
        comments,
        openmic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(
            coordinates("https://www.google.com/maps/place/Venue/@30.2672,-97.7431,17z/data=x"),
            Some((30.2672, -97.7431))
        );
        assert_eq!(coordinates("https://maps.app.goo.gl/abc123"), None);
        assert_eq!(coordinates("@30,-97"), None);
    }

    #[test]
    fn test_schedule() {
        let now = at("2024-06-10", "18:00");
        assert!(validate_schedule(d("2024-06-11"), t("10:00"), t("12:00"), now).is_ok());
        assert!(validate_schedule(d("2024-06-10"), t("19:00"), t("21:00"), now).is_ok());
        assert_eq!(
            validate_schedule(d("2024-06-09"), t("19:00"), t("21:00"), now),
            Err("Event date cannot be in the past.")
        );
        assert_eq!(
            validate_schedule(d("2024-06-10"), t("17:00"), t("21:00"), now),
            Err("Start time cannot be in the past.")
        );
        assert_eq!(
            validate_schedule(d("2024-06-10"), t("21:00"), t("19:00"), now),
            Err("End time cannot be before start time.")
        );
        // overnight on a later date
        assert!(validate_schedule(d("2024-06-20"), t("22:00"), t("01:00"), now).is_ok());
    }

    #[test]
    fn test_form_reports_unparseable_inputs() {
        let fields = FormFields::from_query("title=Jam&event_date=tomorrow&start_time=19%3A00");
        let form = OpenMicForm::from_fields(&fields);
        assert_eq!(form.start_time, Some(t("19:00")));
        let errors = form
            .validate(&Choices::default(), at("2024-06-10", "12:00"), true)
            .unwrap_err();
        assert_eq!(errors.get("event_date"), vec!["Enter a valid date.".to_owned()]);
        assert_eq!(errors.get("end_time"), vec!["This field is required.".to_owned()]);
        assert!(errors.has("location"));
        assert!(!errors.has(NON_FIELD_ERRORS));
    }
}
