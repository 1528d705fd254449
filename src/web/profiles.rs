//! Profile pages: directory, creation, about/ads tabs, section editors and settings.

use super::db_error;
use crate::advertisements::{self, AdvertisementCard};
use crate::content::ContentKind;
use crate::forms::{FieldErrors, FormFields};
use crate::listing::{self, Page, ProfileFilter, ProfileOrder};
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::htmx::require_htmx;
use crate::middleware::ClientCtx;
use crate::orm::profiles::{self as profile_orm, Availability, Commitment, GigsPlayed, NightsGig, PracticeFrequency};
use crate::profiles::{
    self, AdditionalInfo, GeneralInfo, MusicVideos, PictureChange, ProfileCard, ProfileDetail,
    ProfileError, Socials,
};
use crate::session::{push_flash, FlashLevel};
use crate::storage::StorageBackend;
use crate::taxonomy::Choices;
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{ActiveEnum, DatabaseConnection, Iterable};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Order matters: literal paths before slug paths
    conf.service(view_profiles)
        .service(get_profiles)
        .service(location_autocomplete)
        .service(view_new_profile)
        .service(create_profile)
        .service(view_settings)
        .service(update_settings)
        .service(view_profile_about)
        .service(view_profile_ads)
        .service(edit_general_info)
        .service(update_general_info)
        .service(edit_additional_info)
        .service(update_additional_info)
        .service(edit_pictures)
        .service(update_pictures)
        .service(edit_genres)
        .service(update_genres)
        .service(edit_skills)
        .service(update_skills)
        .service(edit_music_videos)
        .service(update_music_videos)
        .service(edit_socials)
        .service(update_socials)
        .service(delete_profile);
}

/// One `<option>` or checkbox.
#[derive(Clone, Debug)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A select over one of the fixed profile choice lists.
#[derive(Clone, Debug)]
pub struct ChoiceField {
    pub name: &'static str,
    pub label: &'static str,
    pub options: Vec<ChoiceOption>,
}

fn enum_field<T>(
    name: &'static str,
    label: &'static str,
    current: Option<&str>,
    describe: fn(&T) -> &'static str,
) -> ChoiceField
where
    T: ActiveEnum<Value = String> + Iterable,
{
    ChoiceField {
        name,
        label,
        options: T::iter()
            .map(|choice| {
                let value = choice.to_value();
                ChoiceOption {
                    selected: current == Some(value.as_str()),
                    label: describe(&choice).to_owned(),
                    value,
                }
            })
            .collect(),
    }
}

/// The additional-info selects. `current` reads a submitted or stored value by field name.
fn additional_fields(current: impl Fn(&str) -> Option<String>) -> Vec<ChoiceField> {
    vec![
        enum_field::<GigsPlayed>(
            "gigs_played",
            "Gigs played",
            current("gigs_played").as_deref(),
            GigsPlayed::label,
        ),
        enum_field::<PracticeFrequency>(
            "practice_frequency",
            "Practice frequency",
            current("practice_frequency").as_deref(),
            PracticeFrequency::label,
        ),
        enum_field::<NightsGig>(
            "nights_gig",
            "Nights gigging",
            current("nights_gig").as_deref(),
            NightsGig::label,
        ),
        enum_field::<Availability>(
            "availability",
            "Availability",
            current("availability").as_deref(),
            Availability::label,
        ),
        enum_field::<Commitment>(
            "commitment",
            "Commitment",
            current("commitment").as_deref(),
            Commitment::label,
        ),
    ]
}

#[derive(Template)]
#[template(path = "profiles/list.html")]
struct ProfileListTemplate {
    client: ClientCtx,
    choices: Choices,
    filter: ProfileFilter,
    orders: [ProfileOrder; 2],
    page: Page<ProfileCard>,
    query: String,
}

#[derive(Template)]
#[template(path = "profiles/cards.html")]
struct ProfileCardsTemplate {
    client: ClientCtx,
    page: Page<ProfileCard>,
    query: String,
}

#[derive(Template)]
#[template(path = "profiles/general_info.html")]
struct GeneralInfoTemplate {
    client: ClientCtx,
    choices: Choices,
    form: GeneralInfo,
    errors: FieldErrors,
    /// Empty while creating.
    slug: String,
    section: &'static str,
}

#[derive(Template)]
#[template(path = "profiles/additional_info.html")]
struct AdditionalInfoTemplate {
    client: ClientCtx,
    slug: String,
    section: &'static str,
    birthday: String,
    influences: String,
    fields: Vec<ChoiceField>,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profiles/pictures.html")]
struct PicturesTemplate {
    client: ClientCtx,
    slug: String,
    section: &'static str,
    picture_url: Option<String>,
    cover_url: Option<String>,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profiles/facets.html")]
struct FacetsTemplate {
    client: ClientCtx,
    slug: String,
    section: &'static str,
    title: &'static str,
    field: &'static str,
    options: Vec<ChoiceOption>,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profiles/music_videos.html")]
struct MusicVideosTemplate {
    client: ClientCtx,
    slug: String,
    section: &'static str,
    slots: Vec<(String, String)>,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profiles/socials.html")]
struct SocialsTemplate {
    client: ClientCtx,
    slug: String,
    section: &'static str,
    rows: Vec<(&'static str, &'static str, String)>,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profiles/settings.html")]
struct SettingsTemplate {
    client: ClientCtx,
    slug: String,
    timezones: Vec<ChoiceOption>,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profiles/about.html")]
struct ProfileAboutTemplate {
    client: ClientCtx,
    detail: ProfileDetail,
    bookmark_id: Option<i32>,
    tab: &'static str,
}

#[derive(Template)]
#[template(path = "profiles/ads.html")]
struct ProfileAdsTemplate {
    client: ClientCtx,
    detail: ProfileDetail,
    bookmark_id: Option<i32>,
    tab: &'static str,
    ads: Vec<AdvertisementCard>,
}

/// Loads one page of the directory, bookmark state included.
async fn profile_page(
    db: &DatabaseConnection,
    client: &ClientCtx,
    filter: &ProfileFilter,
    number: u64,
    choices: &Choices,
) -> Result<Page<ProfileCard>, Error> {
    let mut page = listing::fetch_page(db, filter.select(), number, super::page_size())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Invalid page."))?;
    let models = std::mem::take(&mut page.items);
    let mut cards = profiles::cards(db, models, choices).await.map_err(db_error)?;

    let ids: Vec<i32> = cards.iter().map(|c| c.id).collect();
    let marks = super::viewer_bookmarks(db, client, ContentKind::Profile, &ids).await?;
    for card in cards.iter_mut() {
        card.bookmark_id = marks.get(&card.id).copied();
    }
    Ok(page.with_items(cards))
}

#[get("/profiles/")]
pub async fn view_profiles(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let fields = FormFields::from_query(req.query_string());
    let filter = ProfileFilter::from_fields(&fields);
    let choices = super::load_choices(&db).await?;
    let page = profile_page(&db, &client, &filter, 1, &choices).await?;

    Ok(ProfileListTemplate {
        client,
        query: filter.to_query(),
        choices,
        filter,
        orders: ProfileFilter::ORDERS,
        page,
    }
    .to_response())
}

/// Later pages of the directory for infinite scroll.
#[get("/profiles/get-profiles/")]
pub async fn get_profiles(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;

    let fields = FormFields::from_query(req.query_string());
    let number = super::page_number(&fields)?;
    let filter = ProfileFilter::from_fields(&fields);
    let choices = super::load_choices(&db).await?;
    let page = profile_page(&db, &client, &filter, number, &choices).await?;

    Ok(ProfileCardsTemplate {
        client,
        query: filter.to_query(),
        page,
    }
    .to_response())
}

#[derive(Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
struct LocationResult {
    id: i32,
    label: String,
}

#[get("/profiles/location-autocomplete/")]
pub async fn location_autocomplete(
    db: web::Data<DatabaseConnection>,
    query: web::Query<AutocompleteQuery>,
) -> Result<impl Responder, Error> {
    let limit = crate::app_config::limits().location_search_limit as u64;
    let results: Vec<LocationResult> = crate::taxonomy::search_cities(db.get_ref(), &query.q, limit)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|city| LocationResult {
            label: city.label(),
            id: city.id,
        })
        .collect();
    Ok(HttpResponse::Ok().json(results))
}

#[get("/profiles/new/")]
pub async fn view_new_profile(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    client.require_login()?;
    if let Some(url) = client.get_profile_url() {
        return Ok(super::redirect(&url));
    }

    Ok(GeneralInfoTemplate {
        client,
        choices: super::load_choices(&db).await?,
        form: GeneralInfo::default(),
        errors: FieldErrors::new(),
        slug: String::new(),
        section: "new",
    }
    .to_response())
}

#[post("/profiles/new/")]
pub async fn create_profile(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?.id;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let choices = super::load_choices(&db).await?;
    let form = GeneralInfo::from_fields(&fields);

    match profiles::create_profile(db.get_ref(), user_id, &form, &choices).await {
        Ok(profile) => {
            push_flash(&session, FlashLevel::Success, "Successfully created profile!");
            Ok(super::redirect(&profile.get_url()))
        }
        Err(ProfileError::AlreadyExists) => Ok(super::redirect(
            &client.get_profile_url().unwrap_or_else(|| "/".to_owned()),
        )),
        Err(ProfileError::Invalid(errors)) => Ok(GeneralInfoTemplate {
            client,
            choices,
            form,
            errors,
            slug: String::new(),
            section: "new",
        }
        .to_response()),
        Err(ProfileError::Db(err)) => Err(db_error(err)),
    }
}

/// The viewer's profile, when `slug` names it. Someone else's is 403.
async fn owned_profile(
    client: &ClientCtx,
    session: &Session,
    db: &DatabaseConnection,
    slug: &str,
) -> Result<profile_orm::Model, Error> {
    let own = client.require_profile(session)?;
    if own.slug == slug {
        return Ok(own.clone());
    }
    match profiles::find_by_slug(db, slug).await.map_err(db_error)? {
        Some(_) => Err(error::ErrorForbidden("You do not have permission to do that.")),
        None => Err(error::ErrorNotFound("Profile not found")),
    }
}

async fn public_profile(db: &DatabaseConnection, slug: &str) -> Result<profile_orm::Model, Error> {
    profiles::find_by_slug(db, slug)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Profile not found"))
}

#[get("/profiles/{slug}/about/")]
pub async fn view_profile_about(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = public_profile(&db, &slug).await?;
    let choices = super::load_choices(&db).await?;
    let today = client.local_now().date();
    let bookmark_id = super::viewer_bookmark(&db, &client, ContentKind::Profile, profile.id).await?;
    let detail = profiles::load_detail(db.get_ref(), profile, &choices, today)
        .await
        .map_err(db_error)?;

    Ok(ProfileAboutTemplate {
        client,
        detail,
        bookmark_id,
        tab: "about",
    }
    .to_response())
}

#[get("/profiles/{slug}/ads/")]
pub async fn view_profile_ads(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = public_profile(&db, &slug).await?;
    let choices = super::load_choices(&db).await?;
    let today = client.local_now().date();
    let bookmark_id = super::viewer_bookmark(&db, &client, ContentKind::Profile, profile.id).await?;
    let ads = advertisements::by_author(db.get_ref(), profile.id)
        .await
        .map_err(db_error)?;
    let ads = advertisements::cards(db.get_ref(), ads, &choices)
        .await
        .map_err(db_error)?;
    let detail = profiles::load_detail(db.get_ref(), profile, &choices, today)
        .await
        .map_err(db_error)?;

    Ok(ProfileAdsTemplate {
        client,
        detail,
        bookmark_id,
        tab: "ads",
        ads,
    }
    .to_response())
}

fn updated(session: &Session, profile: &profile_orm::Model) -> HttpResponse {
    push_flash(session, FlashLevel::Success, "Successfully updated profile!");
    super::redirect(&profile.get_url())
}

#[get("/profiles/{slug}/edit/general-info/")]
pub async fn edit_general_info(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    Ok(GeneralInfoTemplate {
        client,
        choices: super::load_choices(&db).await?,
        form: GeneralInfo::from_profile(&profile),
        errors: FieldErrors::new(),
        slug: profile.slug,
        section: "general-info",
    }
    .to_response())
}

#[post("/profiles/{slug}/edit/general-info/")]
pub async fn update_general_info(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let choices = super::load_choices(&db).await?;
    let form = GeneralInfo::from_fields(&fields);
    let slug = profile.slug.clone();

    match profiles::update_general_info(db.get_ref(), profile, &form, &choices).await {
        Ok(profile) => Ok(updated(&session, &profile)),
        Err(ProfileError::Invalid(errors)) => Ok(GeneralInfoTemplate {
            client,
            choices,
            form,
            errors,
            slug,
            section: "general-info",
        }
        .to_response()),
        Err(ProfileError::Db(err)) => Err(db_error(err)),
        Err(ProfileError::AlreadyExists) => Err(error::ErrorBadRequest("Profile already exists")),
    }
}

#[get("/profiles/{slug}/edit/additional-info/")]
pub async fn edit_additional_info(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let info = AdditionalInfo::from_profile(&profile);
    let fields = additional_fields(|name| match name {
        "gigs_played" => info.gigs_played.map(|c| c.to_value()),
        "practice_frequency" => info.practice_frequency.map(|c| c.to_value()),
        "nights_gig" => info.nights_gig.map(|c| c.to_value()),
        "availability" => info.availability.map(|c| c.to_value()),
        "commitment" => info.commitment.map(|c| c.to_value()),
        _ => None,
    });

    Ok(AdditionalInfoTemplate {
        client,
        slug: profile.slug,
        section: "additional-info",
        birthday: info
            .birthday
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        influences: info.influences,
        fields,
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/profiles/{slug}/edit/additional-info/")]
pub async fn update_additional_info(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let today = client.local_now().date();
    match AdditionalInfo::parse(&fields, today) {
        Ok(info) => {
            let profile = profiles::update_additional_info(db.get_ref(), profile, &info)
                .await
                .map_err(db_error)?;
            Ok(updated(&session, &profile))
        }
        Err(errors) => Ok(AdditionalInfoTemplate {
            client,
            slug: profile.slug,
            section: "additional-info",
            birthday: fields.text("birthday"),
            influences: fields.text("influences"),
            fields: additional_fields(|name| fields.optional_text(name)),
            errors,
        }
        .to_response()),
    }
}

#[get("/profiles/{slug}/edit/pictures/")]
pub async fn edit_pictures(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    Ok(PicturesTemplate {
        client,
        picture_url: profile.profile_picture.as_deref().map(crate::storage::media_url),
        cover_url: profile.cover_picture.as_deref().map(crate::storage::media_url),
        slug: profile.slug,
        section: "pictures",
        errors: FieldErrors::new(),
    }
    .to_response())
}

/// An uploaded file held in memory until the whole form is read.
struct Upload {
    data: Vec<u8>,
    mime: Option<mime::Mime>,
}

/// Reads one multipart field, giving up once it passes `limit` bytes.
async fn read_field(field: &mut actix_multipart::Field, limit: usize) -> Result<Vec<u8>, Error> {
    use futures::StreamExt;

    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("update_pictures: multipart read error: {}", e);
            error::ErrorBadRequest("Error interpreting user input.")
        })?;
        if buf.len() + bytes.len() > limit {
            // Keep one byte over the limit so the size check can report it.
            buf.extend_from_slice(&bytes[..(limit + 1).saturating_sub(buf.len()).min(bytes.len())]);
            while field.next().await.is_some() {}
            break;
        }
        buf.extend_from_slice(&bytes);
    }
    Ok(buf)
}

#[post("/profiles/{slug}/edit/pictures/")]
pub async fn update_pictures(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    slug: web::Path<String>,
    mut payload: Multipart,
) -> Result<impl Responder, Error> {
    use futures::TryStreamExt;

    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let max_bytes = crate::app_config::storage().max_upload_size_mb as usize * 1024 * 1024;

    let mut csrf_token = String::new();
    let mut clear_picture = false;
    let mut clear_cover = false;
    let mut picture: Option<Upload> = None;
    let mut cover: Option<Upload> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_owned();
        let mime = field.content_type().cloned();
        match name.as_str() {
            "csrf_token" => {
                let data = read_field(&mut field, 256).await?;
                csrf_token = String::from_utf8_lossy(&data).into_owned();
            }
            "clear_profile_picture" => {
                read_field(&mut field, 16).await?;
                clear_picture = true;
            }
            "clear_cover_picture" => {
                read_field(&mut field, 16).await?;
                clear_cover = true;
            }
            "profile_picture" | "cover_picture" => {
                let data = read_field(&mut field, max_bytes).await?;
                // Browsers send an empty part for an untouched file input.
                if !data.is_empty() {
                    let upload = Some(Upload { data, mime });
                    if name == "profile_picture" {
                        picture = upload;
                    } else {
                        cover = upload;
                    }
                }
            }
            _ => {
                read_field(&mut field, 0).await?;
            }
        }
    }

    validate_csrf_token(&session, &csrf_token)?;

    let mut errors = FieldErrors::new();
    let mut changes = Vec::with_capacity(2);
    for (field, upload, clear) in [
        ("profile_picture", picture, clear_picture),
        ("cover_picture", cover, clear_cover),
    ] {
        let change = match upload {
            Some(upload) => {
                match crate::storage::prepare_image(&upload.data, upload.mime.as_ref(), max_bytes) {
                    Ok(key) => {
                        if !storage.exists(&key).await.unwrap_or(false) {
                            storage.put_object(upload.data, &key).await.map_err(|e| {
                                log::error!("Unable to store upload {}: {}", key, e);
                                error::ErrorInternalServerError("Unable to store upload.")
                            })?;
                        }
                        PictureChange::Replace(key)
                    }
                    Err(err) => {
                        errors.add(field, err.to_string());
                        PictureChange::Keep
                    }
                }
            }
            None if clear => PictureChange::Clear,
            None => PictureChange::Keep,
        };
        changes.push(change);
    }

    if !errors.is_empty() {
        return Ok(PicturesTemplate {
            client,
            picture_url: profile.profile_picture.as_deref().map(crate::storage::media_url),
            cover_url: profile.cover_picture.as_deref().map(crate::storage::media_url),
            slug: profile.slug,
            section: "pictures",
            errors,
        }
        .to_response());
    }

    let cover_change = changes.pop().unwrap_or(PictureChange::Keep);
    let picture_change = changes.pop().unwrap_or(PictureChange::Keep);
    let profile = profiles::update_pictures(db.get_ref(), profile, picture_change, cover_change)
        .await
        .map_err(db_error)?;
    Ok(updated(&session, &profile))
}

fn facet_options(items: Vec<(i32, String)>, selected: &[i32]) -> Vec<ChoiceOption> {
    items
        .into_iter()
        .map(|(id, name)| ChoiceOption {
            value: id.to_string(),
            label: name,
            selected: selected.contains(&id),
        })
        .collect()
}

fn genre_options(choices: &Choices, selected: &[i32]) -> Vec<ChoiceOption> {
    facet_options(
        choices.genres.iter().map(|g| (g.id, g.name.clone())).collect(),
        selected,
    )
}

fn skill_options(choices: &Choices, selected: &[i32]) -> Vec<ChoiceOption> {
    facet_options(
        choices.skills.iter().map(|s| (s.id, s.name.clone())).collect(),
        selected,
    )
}

#[get("/profiles/{slug}/edit/genres/")]
pub async fn edit_genres(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let choices = super::load_choices(&db).await?;
    let selected = profiles::genre_ids(db.get_ref(), profile.id)
        .await
        .map_err(db_error)?;

    Ok(FacetsTemplate {
        client,
        slug: profile.slug,
        section: "genres",
        title: "Genres",
        field: "genres",
        options: genre_options(&choices, &selected),
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/profiles/{slug}/edit/genres/")]
pub async fn update_genres(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let choices = super::load_choices(&db).await?;
    let ids = fields.ids("genres");
    if ids.iter().any(|id| !choices.genres.iter().any(|g| g.id == *id)) {
        let mut errors = FieldErrors::new();
        errors.add("genres", "Select a valid choice.");
        return Ok(FacetsTemplate {
            client,
            slug: profile.slug,
            section: "genres",
            title: "Genres",
            field: "genres",
            options: genre_options(&choices, &ids),
            errors,
        }
        .to_response());
    }

    profiles::set_genres(db.get_ref(), profile.id, &ids)
        .await
        .map_err(db_error)?;
    Ok(updated(&session, &profile))
}

#[get("/profiles/{slug}/edit/skills/")]
pub async fn edit_skills(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let choices = super::load_choices(&db).await?;
    let selected = profiles::skill_ids(db.get_ref(), profile.id)
        .await
        .map_err(db_error)?;

    Ok(FacetsTemplate {
        client,
        slug: profile.slug,
        section: "skills",
        title: "Skills",
        field: "skills",
        options: skill_options(&choices, &selected),
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/profiles/{slug}/edit/skills/")]
pub async fn update_skills(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let choices = super::load_choices(&db).await?;
    let ids = fields.ids("skills");
    if ids.iter().any(|id| !choices.skills.iter().any(|s| s.id == *id)) {
        let mut errors = FieldErrors::new();
        errors.add("skills", "Select a valid choice.");
        return Ok(FacetsTemplate {
            client,
            slug: profile.slug,
            section: "skills",
            title: "Skills",
            field: "skills",
            options: skill_options(&choices, &ids),
            errors,
        }
        .to_response());
    }

    profiles::set_skills(db.get_ref(), profile.id, &ids)
        .await
        .map_err(db_error)?;
    Ok(updated(&session, &profile))
}

#[get("/profiles/{slug}/edit/music-videos/")]
pub async fn edit_music_videos(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    Ok(MusicVideosTemplate {
        client,
        slots: MusicVideos::from_profile(&profile).slots(),
        slug: profile.slug,
        section: "music-videos",
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/profiles/{slug}/edit/music-videos/")]
pub async fn update_music_videos(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    match MusicVideos::parse(&fields) {
        Ok(videos) => {
            let profile = profiles::update_music_videos(db.get_ref(), profile, &videos)
                .await
                .map_err(db_error)?;
            Ok(updated(&session, &profile))
        }
        Err(errors) => Ok(MusicVideosTemplate {
            client,
            slots: (0..profiles::VIDEO_SLOTS)
                .map(|slot| {
                    let name = MusicVideos::field_name(slot);
                    let value = fields.text(&name);
                    (name, value)
                })
                .collect(),
            slug: profile.slug,
            section: "music-videos",
            errors,
        }
        .to_response()),
    }
}

#[get("/profiles/{slug}/edit/socials/")]
pub async fn edit_socials(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    Ok(SocialsTemplate {
        client,
        rows: Socials::from_profile(&profile).rows(),
        slug: profile.slug,
        section: "socials",
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/profiles/{slug}/edit/socials/")]
pub async fn update_socials(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    match Socials::parse(&fields) {
        Ok(socials) => {
            let profile = profiles::update_socials(db.get_ref(), profile, &socials)
                .await
                .map_err(db_error)?;
            Ok(updated(&session, &profile))
        }
        Err(errors) => Ok(SocialsTemplate {
            client,
            rows: profiles::SOCIAL_FIELDS
                .iter()
                .map(|(name, label)| (*name, *label, fields.text(name)))
                .collect(),
            slug: profile.slug,
            section: "socials",
            errors,
        }
        .to_response()),
    }
}

fn timezone_options(current: &str) -> Vec<ChoiceOption> {
    profiles::timezone_names()
        .into_iter()
        .map(|name| ChoiceOption {
            value: name.to_owned(),
            label: name.replace('_', " "),
            selected: name == current,
        })
        .collect()
}

#[get("/profiles/settings/")]
pub async fn view_settings(client: ClientCtx, session: Session) -> Result<impl Responder, Error> {
    let profile = client.require_profile(&session)?.clone();
    Ok(SettingsTemplate {
        client,
        timezones: timezone_options(&profile.timezone),
        slug: profile.slug,
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/profiles/settings/")]
pub async fn update_settings(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = client.require_profile(&session)?.clone();
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    let timezone = fields.text("timezone");
    match profiles::update_timezone(db.get_ref(), profile.clone(), &timezone).await {
        Ok(_) => {
            push_flash(&session, FlashLevel::Success, "Successfully updated settings!");
            Ok(super::redirect("/profiles/settings/"))
        }
        Err(ProfileError::Invalid(errors)) => Ok(SettingsTemplate {
            client,
            timezones: timezone_options(&profile.timezone),
            slug: profile.slug,
            errors,
        }
        .to_response()),
        Err(ProfileError::Db(err)) => Err(db_error(err)),
        Err(ProfileError::AlreadyExists) => Err(error::ErrorBadRequest("Profile already exists")),
    }
}

#[post("/profiles/{slug}/delete/")]
pub async fn delete_profile(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, Error> {
    let profile = owned_profile(&client, &session, &db, &slug).await?;
    let fields = FormFields::parse(&body);
    validate_csrf_token(&session, fields.csrf_token())?;

    profiles::delete_profile(db.get_ref(), profile.id)
        .await
        .map_err(db_error)?;
    push_flash(&session, FlashLevel::Success, "Successfully deleted profile!");
    Ok(super::redirect("/"))
}
