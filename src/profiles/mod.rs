//! Musician and band profiles.
//!
//! A profile extends a user account one-to-one. Every login-only feature
//! beyond account settings acts through the profile, so a user without one
//! is sent to `/profiles/new/` first.

pub mod youtube;

use crate::content::{purge_attachments, ContentKind};
use crate::forms::{FieldErrors, FormFields};
use crate::orm::profiles::{Availability, Commitment, GigsPlayed, NightsGig, PracticeFrequency};
use crate::orm::{advertisements, genres, open_mics, profile_genres, profile_skills, profiles, skills, users};
use crate::taxonomy::Choices;
use chrono::{Datelike, NaiveDate};
use sea_orm::{
    entity::*, query::*, ActiveEnum, ActiveValue::Set, ConnectionTrait, DbErr, TransactionTrait,
};
use std::collections::HashMap;
use std::str::FromStr;
use youtube::Video;

pub const MAX_DISPLAY_NAME_LENGTH: usize = 255;
pub const VIDEO_SLOTS: usize = 6;

#[derive(Debug)]
pub enum ProfileError {
    /// The user already has a profile.
    AlreadyExists,
    Invalid(FieldErrors),
    Db(DbErr),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "profile already exists"),
            Self::Invalid(errors) => write!(f, "invalid profile data: {}", errors),
            Self::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<DbErr> for ProfileError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

impl From<FieldErrors> for ProfileError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// Transliterates to ASCII, lowercases, maps runs of anything but letters
/// and digits to one `-`, and trims dashes from both ends.
pub fn slugify(input: &str) -> String {
    slug::slugify(input)
}

/// Slug for `display_name` not used by any other profile. Collisions get
/// `-1`, `-2`, ... appended.
pub async fn unique_slug<C>(db: &C, display_name: &str, exclude_id: Option<i32>) -> Result<String, DbErr>
where
    C: ConnectionTrait,
{
    let mut base = slugify(display_name);
    if base.is_empty() {
        base = "profile".to_owned();
    }

    let mut candidate = base.clone();
    let mut suffix = 0;
    loop {
        let mut query = profiles::Entity::find().filter(profiles::Column::Slug.eq(candidate.as_str()));
        if let Some(id) = exclude_id {
            query = query.filter(profiles::Column::Id.ne(id));
        }
        if query.one(db).await?.is_none() {
            return Ok(candidate);
        }
        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }
}

/// Whole years between `birthday` and `today`.
pub fn age(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        years -= 1;
    }
    years
}

pub fn validate_birthday(birthday: NaiveDate, today: NaiveDate) -> Result<(), &'static str> {
    if birthday > today {
        Err("Birthday cannot be in the future.")
    } else {
        Ok(())
    }
}

pub fn validate_timezone(name: &str) -> bool {
    chrono_tz::Tz::from_str(name).is_ok()
}

/// Every IANA zone name, sorted.
pub fn timezone_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = chrono_tz::TZ_VARIANTS.iter().map(|tz| tz.name()).collect();
    names.sort_unstable();
    names
}

/// Current date in `timezone`, falling back to UTC for unknown names.
pub fn today_in(timezone: &str) -> NaiveDate {
    let now = chrono::Utc::now();
    match chrono_tz::Tz::from_str(timezone) {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => now.date_naive(),
    }
}

pub async fn find_by_user<C>(db: &C, user_id: i32) -> Result<Option<profiles::Model>, DbErr>
where
    C: ConnectionTrait,
{
    profiles::Entity::find()
        .filter(profiles::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn find_by_slug<C>(db: &C, slug: &str) -> Result<Option<profiles::Model>, DbErr>
where
    C: ConnectionTrait,
{
    profiles::Entity::find()
        .filter(profiles::Column::Slug.eq(slug))
        .one(db)
        .await
}

fn check_choice(errors: &mut FieldErrors, field: &str, id: Option<i32>, known: bool) {
    if id.is_some() && !known {
        errors.add(field, "Select a valid choice.");
    }
}

/// Display name, type, location and bio. Used by creation and the
/// general-info edit section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneralInfo {
    pub display_name: String,
    pub profile_type_id: Option<i32>,
    pub city_id: Option<i32>,
    pub bio: String,
}

impl GeneralInfo {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            display_name: fields.text("display_name"),
            profile_type_id: fields.id("profile_type"),
            city_id: fields.id("location"),
            bio: fields.text("bio"),
        }
    }

    pub fn from_profile(profile: &profiles::Model) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            profile_type_id: profile.profile_type_id,
            city_id: profile.city_id,
            bio: profile.bio.clone(),
        }
    }

    pub fn validate(&self, choices: &Choices) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.display_name.is_empty() {
            errors.add("display_name", "This field is required.");
        } else if self.display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            errors.add(
                "display_name",
                format!("Ensure this value has at most {} characters.", MAX_DISPLAY_NAME_LENGTH),
            );
        }
        check_choice(
            &mut errors,
            "profile_type",
            self.profile_type_id,
            choices.profile_types.iter().any(|t| Some(t.id) == self.profile_type_id),
        );
        check_choice(
            &mut errors,
            "location",
            self.city_id,
            choices.cities.iter().any(|c| Some(c.id) == self.city_id),
        );
        errors.into_result()
    }

    pub fn is_profile_type(&self, id: &i32) -> bool {
        self.profile_type_id == Some(*id)
    }

    pub fn is_city(&self, id: &i32) -> bool {
        self.city_id == Some(*id)
    }
}

fn parse_enum<T: ActiveEnum<Value = String>>(
    fields: &FormFields,
    key: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    let raw = fields.optional_text(key)?;
    match T::try_from_value(&raw) {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(key, "Select a valid choice.");
            None
        }
    }
}

/// Birthday, influences and the fixed-choice fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdditionalInfo {
    pub birthday: Option<NaiveDate>,
    pub influences: String,
    pub gigs_played: Option<GigsPlayed>,
    pub practice_frequency: Option<PracticeFrequency>,
    pub nights_gig: Option<NightsGig>,
    pub availability: Option<Availability>,
    pub commitment: Option<Commitment>,
}

impl AdditionalInfo {
    pub fn parse(fields: &FormFields, today: NaiveDate) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let birthday = match fields.optional_text("birthday") {
            None => None,
            Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) => {
                    if let Err(message) = validate_birthday(date, today) {
                        errors.add("birthday", message);
                    }
                    Some(date)
                }
                Err(_) => {
                    errors.add("birthday", "Enter a valid date.");
                    None
                }
            },
        };

        let info = Self {
            birthday,
            influences: fields.text("influences"),
            gigs_played: parse_enum(fields, "gigs_played", &mut errors),
            practice_frequency: parse_enum(fields, "practice_frequency", &mut errors),
            nights_gig: parse_enum(fields, "nights_gig", &mut errors),
            availability: parse_enum(fields, "availability", &mut errors),
            commitment: parse_enum(fields, "commitment", &mut errors),
        };
        errors.into_result().map(|_| info)
    }

    pub fn from_profile(profile: &profiles::Model) -> Self {
        Self {
            birthday: profile.birthday,
            influences: profile.influences.clone(),
            gigs_played: profile.gigs_played,
            practice_frequency: profile.practice_frequency,
            nights_gig: profile.nights_gig,
            availability: profile.availability,
            commitment: profile.commitment,
        }
    }
}

/// Up to six YouTube video links, kept in slot order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MusicVideos {
    pub links: [Option<String>; VIDEO_SLOTS],
}

impl MusicVideos {
    pub fn field_name(slot: usize) -> String {
        format!("youtube_link_{}", slot + 1)
    }

    pub fn parse(fields: &FormFields) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut links: [Option<String>; VIDEO_SLOTS] = Default::default();
        for (slot, link) in links.iter_mut().enumerate() {
            let name = Self::field_name(slot);
            if let Some(raw) = fields.optional_text(&name) {
                if youtube::video_id(&raw).is_none() {
                    errors.add(&name, "Enter a valid YouTube video URL.");
                }
                *link = Some(raw);
            }
        }
        errors.into_result().map(|_| Self { links })
    }

    pub fn from_profile(profile: &profiles::Model) -> Self {
        Self {
            links: [
                profile.youtube_link_1.clone(),
                profile.youtube_link_2.clone(),
                profile.youtube_link_3.clone(),
                profile.youtube_link_4.clone(),
                profile.youtube_link_5.clone(),
                profile.youtube_link_6.clone(),
            ],
        }
    }

    /// `(field name, current value)` per slot, for the edit form.
    pub fn slots(&self) -> Vec<(String, String)> {
        self.links
            .iter()
            .enumerate()
            .map(|(slot, link)| (Self::field_name(slot), link.clone().unwrap_or_default()))
            .collect()
    }
}

pub const SOCIAL_FIELDS: [(&str, &str); 5] = [
    ("personal_website_social_link", "Website"),
    ("facebook_social_link", "Facebook"),
    ("youtube_social_link", "YouTube"),
    ("instagram_social_link", "Instagram"),
    ("soundcloud_social_link", "SoundCloud"),
];

fn is_web_url(raw: &str) -> bool {
    matches!(url::Url::parse(raw), Ok(url) if (url.scheme() == "http" || url.scheme() == "https") && url.host_str().is_some())
}

/// Social links in `SOCIAL_FIELDS` order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Socials {
    pub links: [Option<String>; 5],
}

impl Socials {
    pub fn parse(fields: &FormFields) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut links: [Option<String>; 5] = Default::default();
        for ((name, _), link) in SOCIAL_FIELDS.iter().zip(links.iter_mut()) {
            if let Some(raw) = fields.optional_text(name) {
                if !is_web_url(&raw) {
                    errors.add(name, "Enter a valid URL.");
                }
                *link = Some(raw);
            }
        }
        errors.into_result().map(|_| Self { links })
    }

    pub fn from_profile(profile: &profiles::Model) -> Self {
        Self {
            links: [
                profile.personal_website_social_link.clone(),
                profile.facebook_social_link.clone(),
                profile.youtube_social_link.clone(),
                profile.instagram_social_link.clone(),
                profile.soundcloud_social_link.clone(),
            ],
        }
    }

    /// `(field name, label, current value)` for the edit form.
    pub fn rows(&self) -> Vec<(&'static str, &'static str, String)> {
        SOCIAL_FIELDS
            .iter()
            .zip(self.links.iter())
            .map(|((name, label), link)| (*name, *label, link.clone().unwrap_or_default()))
            .collect()
    }

    /// `(label, url)` for links that are set.
    pub fn present(&self) -> Vec<(&'static str, String)> {
        SOCIAL_FIELDS
            .iter()
            .zip(self.links.iter())
            .filter_map(|((_, label), link)| link.clone().map(|url| (*label, url)))
            .collect()
    }
}

/// Replacement for one picture slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PictureChange {
    Keep,
    Replace(String),
    Clear,
}

impl PictureChange {
    fn apply(self, current: Option<String>) -> Option<String> {
        match self {
            Self::Keep => current,
            Self::Replace(key) => Some(key),
            Self::Clear => None,
        }
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

async fn save<C>(db: &C, mut active: profiles::ActiveModel) -> Result<profiles::Model, DbErr>
where
    C: ConnectionTrait,
{
    active.last_updated = Set(now());
    active.update(db).await
}

/// Creates the user's profile. One per user.
pub async fn create_profile<C>(
    db: &C,
    user_id: i32,
    info: &GeneralInfo,
    choices: &Choices,
) -> Result<profiles::Model, ProfileError>
where
    C: ConnectionTrait,
{
    info.validate(choices)?;

    if find_by_user(db, user_id).await?.is_some() {
        return Err(ProfileError::AlreadyExists);
    }

    let slug = unique_slug(db, &info.display_name, None).await?;
    let created = now();
    let profile = profiles::ActiveModel {
        user_id: Set(user_id),
        profile_type_id: Set(info.profile_type_id),
        display_name: Set(info.display_name.clone()),
        bio: Set(info.bio.clone()),
        birthday: Set(None),
        city_id: Set(info.city_id),
        profile_picture: Set(None),
        cover_picture: Set(None),
        influences: Set(String::new()),
        slug: Set(slug),
        created: Set(created),
        last_updated: Set(created),
        youtube_link_1: Set(None),
        youtube_link_2: Set(None),
        youtube_link_3: Set(None),
        youtube_link_4: Set(None),
        youtube_link_5: Set(None),
        youtube_link_6: Set(None),
        personal_website_social_link: Set(None),
        facebook_social_link: Set(None),
        youtube_social_link: Set(None),
        instagram_social_link: Set(None),
        soundcloud_social_link: Set(None),
        gigs_played: Set(None),
        practice_frequency: Set(None),
        nights_gig: Set(None),
        availability: Set(None),
        commitment: Set(None),
        timezone: Set(crate::constants::DEFAULT_TIMEZONE.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Created profile {} for user {}", profile.slug, user_id);
    Ok(profile)
}

/// The slug is fixed at creation and does not follow display name edits.
pub async fn update_general_info<C>(
    db: &C,
    profile: profiles::Model,
    info: &GeneralInfo,
    choices: &Choices,
) -> Result<profiles::Model, ProfileError>
where
    C: ConnectionTrait,
{
    info.validate(choices)?;

    let mut active: profiles::ActiveModel = profile.into();
    active.display_name = Set(info.display_name.clone());
    active.profile_type_id = Set(info.profile_type_id);
    active.city_id = Set(info.city_id);
    active.bio = Set(info.bio.clone());
    Ok(save(db, active).await?)
}

pub async fn update_additional_info<C>(
    db: &C,
    profile: profiles::Model,
    info: &AdditionalInfo,
) -> Result<profiles::Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut active: profiles::ActiveModel = profile.into();
    active.birthday = Set(info.birthday);
    active.influences = Set(info.influences.clone());
    active.gigs_played = Set(info.gigs_played);
    active.practice_frequency = Set(info.practice_frequency);
    active.nights_gig = Set(info.nights_gig);
    active.availability = Set(info.availability);
    active.commitment = Set(info.commitment);
    save(db, active).await
}

pub async fn update_music_videos<C>(
    db: &C,
    profile: profiles::Model,
    videos: &MusicVideos,
) -> Result<profiles::Model, DbErr>
where
    C: ConnectionTrait,
{
    let [a, b, c, d, e, f] = videos.links.clone();
    let mut active: profiles::ActiveModel = profile.into();
    active.youtube_link_1 = Set(a);
    active.youtube_link_2 = Set(b);
    active.youtube_link_3 = Set(c);
    active.youtube_link_4 = Set(d);
    active.youtube_link_5 = Set(e);
    active.youtube_link_6 = Set(f);
    save(db, active).await
}

pub async fn update_socials<C>(
    db: &C,
    profile: profiles::Model,
    socials: &Socials,
) -> Result<profiles::Model, DbErr>
where
    C: ConnectionTrait,
{
    let [website, facebook, youtube, instagram, soundcloud] = socials.links.clone();
    let mut active: profiles::ActiveModel = profile.into();
    active.personal_website_social_link = Set(website);
    active.facebook_social_link = Set(facebook);
    active.youtube_social_link = Set(youtube);
    active.instagram_social_link = Set(instagram);
    active.soundcloud_social_link = Set(soundcloud);
    save(db, active).await
}

pub async fn update_pictures<C>(
    db: &C,
    profile: profiles::Model,
    profile_picture: PictureChange,
    cover_picture: PictureChange,
) -> Result<profiles::Model, DbErr>
where
    C: ConnectionTrait,
{
    let picture = profile_picture.apply(profile.profile_picture.clone());
    let cover = cover_picture.apply(profile.cover_picture.clone());
    let mut active: profiles::ActiveModel = profile.into();
    active.profile_picture = Set(picture);
    active.cover_picture = Set(cover);
    save(db, active).await
}

pub async fn update_timezone<C>(
    db: &C,
    profile: profiles::Model,
    timezone: &str,
) -> Result<profiles::Model, ProfileError>
where
    C: ConnectionTrait,
{
    if !validate_timezone(timezone) {
        let mut errors = FieldErrors::new();
        errors.add("timezone", "Select a valid choice.");
        return Err(ProfileError::Invalid(errors));
    }

    let mut active: profiles::ActiveModel = profile.into();
    active.timezone = Set(timezone.to_owned());
    Ok(save(db, active).await?)
}

pub async fn genre_ids<C>(db: &C, profile_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(profile_genres::Entity::find()
        .filter(profile_genres::Column::ProfileId.eq(profile_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.genre_id)
        .collect())
}

pub async fn skill_ids<C>(db: &C, profile_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(profile_skills::Entity::find()
        .filter(profile_skills::Column::ProfileId.eq(profile_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.skill_id)
        .collect())
}

/// Replaces the profile's genres. Unknown ids are dropped.
pub async fn set_genres<C>(db: &C, profile_id: i32, ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let known: Vec<i32> = genres::Entity::find()
        .filter(genres::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|g| g.id)
        .collect();

    let txn = db.begin().await?;
    profile_genres::Entity::delete_many()
        .filter(profile_genres::Column::ProfileId.eq(profile_id))
        .exec(&txn)
        .await?;
    for genre_id in known {
        profile_genres::ActiveModel {
            profile_id: Set(profile_id),
            genre_id: Set(genre_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    touch(&txn, profile_id).await?;
    txn.commit().await
}

/// Replaces the profile's skills. Unknown ids are dropped.
pub async fn set_skills<C>(db: &C, profile_id: i32, ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let known: Vec<i32> = skills::Entity::find()
        .filter(skills::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let txn = db.begin().await?;
    profile_skills::Entity::delete_many()
        .filter(profile_skills::Column::ProfileId.eq(profile_id))
        .exec(&txn)
        .await?;
    for skill_id in known {
        profile_skills::ActiveModel {
            profile_id: Set(profile_id),
            skill_id: Set(skill_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    touch(&txn, profile_id).await?;
    txn.commit().await
}

async fn touch<C>(db: &C, profile_id: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    profiles::Entity::update_many()
        .col_expr(
            profiles::Column::LastUpdated,
            sea_orm::sea_query::Expr::value(now()),
        )
        .filter(profiles::Column::Id.eq(profile_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Deletes the profile and everything it authored. Bookmarks and reports
/// pointing at the profile or its ads and open mics go in the same
/// transaction; the rest follows the foreign keys.
pub async fn delete_profile<C>(db: &C, profile_id: i32) -> Result<bool, DbErr>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;

    let ad_ids: Vec<i32> = advertisements::Entity::find()
        .filter(advertisements::Column::AuthorId.eq(profile_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|ad| ad.id)
        .collect();
    let openmic_ids: Vec<i32> = open_mics::Entity::find()
        .filter(open_mics::Column::AuthorId.eq(profile_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|openmic| openmic.id)
        .collect();

    purge_attachments(&txn, ContentKind::Advertisement, &ad_ids).await?;
    purge_attachments(&txn, ContentKind::OpenMic, &openmic_ids).await?;
    purge_attachments(&txn, ContentKind::Profile, &[profile_id]).await?;

    let result = profiles::Entity::delete_by_id(profile_id).exec(&txn).await?;
    txn.commit().await?;

    if result.rows_affected > 0 {
        log::info!(
            "Deleted profile {} with {} ads and {} open mics",
            profile_id,
            ad_ids.len(),
            openmic_ids.len()
        );
    }
    Ok(result.rows_affected > 0)
}

/// Genre names per profile id, one query for a whole page.
pub async fn genre_names_for<C>(
    db: &C,
    profile_ids: &[i32],
    choices: &Choices,
) -> Result<HashMap<i32, Vec<String>>, DbErr>
where
    C: ConnectionTrait,
{
    let mut names: HashMap<i32, Vec<String>> = HashMap::new();
    if profile_ids.is_empty() {
        return Ok(names);
    }
    let rows = profile_genres::Entity::find()
        .filter(profile_genres::Column::ProfileId.is_in(profile_ids.to_vec()))
        .all(db)
        .await?;
    for row in rows {
        if let Some(genre) = choices.genres.iter().find(|g| g.id == row.genre_id) {
            names.entry(row.profile_id).or_default().push(genre.name.clone());
        }
    }
    for list in names.values_mut() {
        list.sort();
    }
    Ok(names)
}

/// A profile in a listing.
#[derive(Clone, Debug)]
pub struct ProfileCard {
    pub id: i32,
    pub slug: String,
    pub display_name: String,
    pub url: String,
    pub picture_url: Option<String>,
    pub profile_type: String,
    pub city: String,
    pub genres: Vec<String>,
    /// The viewer's bookmark on this profile.
    pub bookmark_id: Option<i32>,
}

pub async fn cards<C>(
    db: &C,
    profiles: Vec<profiles::Model>,
    choices: &Choices,
) -> Result<Vec<ProfileCard>, DbErr>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = profiles.iter().map(|p| p.id).collect();
    let mut genres = genre_names_for(db, &ids, choices).await?;
    Ok(profiles
        .into_iter()
        .map(|profile| ProfileCard {
            id: profile.id,
            url: profile.get_url(),
            picture_url: profile.profile_picture.as_deref().map(crate::storage::media_url),
            profile_type: choices.profile_type_name(profile.profile_type_id),
            city: choices.city_label(profile.city_id),
            genres: genres.remove(&profile.id).unwrap_or_default(),
            bookmark_id: None,
            slug: profile.slug,
            display_name: profile.display_name,
        })
        .collect())
}

/// Everything the about tab shows.
#[derive(Clone, Debug)]
pub struct ProfileDetail {
    pub profile: profiles::Model,
    pub last_login: Option<chrono::NaiveDateTime>,
    pub profile_type: String,
    pub city: String,
    pub genres: Vec<String>,
    pub skills: Vec<String>,
    pub age: Option<i32>,
    pub videos: Vec<Video>,
    pub socials: Vec<(&'static str, String)>,
    pub picture_url: Option<String>,
    pub cover_url: Option<String>,
}

impl ProfileDetail {
    pub fn gigs_played(&self) -> &'static str {
        self.profile.gigs_played.map(|c| c.label()).unwrap_or_default()
    }

    pub fn practice_frequency(&self) -> &'static str {
        self.profile.practice_frequency.map(|c| c.label()).unwrap_or_default()
    }

    pub fn nights_gig(&self) -> &'static str {
        self.profile.nights_gig.map(|c| c.label()).unwrap_or_default()
    }

    pub fn availability(&self) -> &'static str {
        self.profile.availability.map(|c| c.label()).unwrap_or_default()
    }

    pub fn commitment(&self) -> &'static str {
        self.profile.commitment.map(|c| c.label()).unwrap_or_default()
    }
}

pub async fn load_detail<C>(
    db: &C,
    profile: profiles::Model,
    choices: &Choices,
    today: NaiveDate,
) -> Result<ProfileDetail, DbErr>
where
    C: ConnectionTrait,
{
    let last_login = users::Entity::find_by_id(profile.user_id)
        .one(db)
        .await?
        .and_then(|user| user.last_login);
    let genres = choices.genre_names(&genre_ids(db, profile.id).await?);
    let skills = choices.skill_names(&skill_ids(db, profile.id).await?);

    Ok(ProfileDetail {
        last_login,
        profile_type: choices.profile_type_name(profile.profile_type_id),
        city: choices.city_label(profile.city_id),
        genres,
        skills,
        age: profile.birthday.map(|birthday| age(birthday, today)),
        videos: profile
            .youtube_links()
            .into_iter()
            .filter_map(Video::from_link)
            .collect(),
        socials: Socials::from_profile(&profile).present(),
        picture_url: profile.profile_picture.as_deref().map(crate::storage::media_url),
        cover_url: profile.cover_picture.as_deref().map(crate::storage::media_url),
        profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Midnight Owls"), "the-midnight-owls");
        assert_eq!(slugify("  AC/DC -- Tribute!  "), "ac-dc-tribute");
        assert_eq!(slugify("Björk"), "bjork");
        assert_eq!(slugify("Café Noir"), "cafe-noir");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_age() {
        let birthday = date(2000, 6, 15);
        assert_eq!(age(birthday, date(2024, 6, 14)), 23);
        assert_eq!(age(birthday, date(2024, 6, 15)), 24);
        assert_eq!(age(birthday, date(2024, 12, 1)), 24);
        assert_eq!(age(date(2000, 2, 29), date(2023, 2, 28)), 22);
    }

    #[test]
    fn test_birthday_in_future_is_rejected() {
        let today = date(2024, 1, 1);
        assert!(validate_birthday(date(2023, 12, 31), today).is_ok());
        assert!(validate_birthday(today, today).is_ok());
        assert_eq!(
            validate_birthday(date(2024, 1, 2), today),
            Err("Birthday cannot be in the future.")
        );
    }

    #[test]
    fn test_timezones() {
        assert!(validate_timezone("America/Chicago"));
        assert!(validate_timezone("UTC"));
        assert!(!validate_timezone("Mars/Olympus_Mons"));
        assert!(timezone_names().contains(&"Europe/Berlin"));
    }

    #[test]
    fn test_additional_info_parse() {
        let today = date(2024, 5, 1);
        let fields = FormFields::from_query(
            "birthday=1990-03-04&influences=Miles&commitment=committed&gigs_played=over_100",
        );
        let info = AdditionalInfo::parse(&fields, today).unwrap();
        assert_eq!(info.birthday, Some(date(1990, 3, 4)));
        assert_eq!(info.commitment, Some(Commitment::Committed));
        assert_eq!(info.gigs_played, Some(GigsPlayed::Over100));
        assert_eq!(info.availability, None);

        let fields = FormFields::from_query("birthday=2030-01-01&availability=always");
        let errors = AdditionalInfo::parse(&fields, today).unwrap_err();
        assert_eq!(errors.get("birthday"), vec!["Birthday cannot be in the future.".to_owned()]);
        assert!(errors.has("availability"));
    }

    #[test]
    fn test_music_videos_parse() {
        let fields = FormFields::from_query(
            "youtube_link_1=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ&youtube_link_3=https%3A%2F%2Fexample.com",
        );
        let errors = MusicVideos::parse(&fields).unwrap_err();
        assert!(!errors.has("youtube_link_1"));
        assert!(errors.has("youtube_link_3"));

        let fields = FormFields::from_query("youtube_link_2=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ");
        let videos = MusicVideos::parse(&fields).unwrap();
        assert_eq!(videos.links[0], None);
        assert!(videos.links[1].is_some());
    }

    #[test]
    fn test_socials_parse() {
        let fields = FormFields::from_query(
            "facebook_social_link=https%3A%2F%2Ffacebook.com%2Fband&instagram_social_link=javascript%3Aalert(1)",
        );
        let errors = Socials::parse(&fields).unwrap_err();
        assert!(errors.has("instagram_social_link"));
        assert!(!errors.has("facebook_social_link"));
    }
}
