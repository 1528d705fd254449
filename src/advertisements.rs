//! Classified ads: "looking for band" and "looking for musician" posts.

use crate::comments::{self, CommentDisplay, CommentParent};
use crate::constants::MAX_TITLE_LENGTH;
use crate::content::{check_owner, purge_attachments, ContentError, ContentKind};
use crate::forms::{FieldErrors, FormFields};
use crate::orm::{advertisement_genres, advertisement_skills, advertisements, profiles};
use crate::taxonomy::Choices;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, ConnectionTrait, DbErr, TransactionTrait,
};
use std::collections::HashMap;

/// Create and edit form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdvertisementForm {
    pub title: String,
    pub ad_type_id: Option<i32>,
    pub description: String,
    pub city_id: Option<i32>,
    pub genres: Vec<i32>,
    pub skills: Vec<i32>,
}

impl AdvertisementForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            title: fields.text("title"),
            ad_type_id: fields.id("ad_type"),
            description: fields.text("description"),
            city_id: fields.id("location"),
            genres: fields.ids("genres"),
            skills: fields.ids("skills"),
        }
    }

    pub fn from_model(ad: &advertisements::Model, genres: Vec<i32>, skills: Vec<i32>) -> Self {
        Self {
            title: ad.title.clone(),
            ad_type_id: ad.ad_type_id,
            description: ad.description.clone(),
            city_id: ad.city_id,
            genres,
            skills,
        }
    }

    pub fn validate(&self, choices: &Choices) -> Result<(), FieldErrors> {
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
        match self.ad_type_id {
            None => errors.add("ad_type", "This field is required."),
            Some(id) if !choices.ad_types.iter().any(|t| t.id == id) => {
                errors.add("ad_type", "Select a valid choice.")
            }
            Some(_) => {}
        }
        match self.city_id {
            None => errors.add("location", "This field is required."),
            Some(id) if !choices.cities.iter().any(|c| c.id == id) => {
                errors.add("location", "Select a valid choice.")
            }
            Some(_) => {}
        }
        if self.genres.iter().any(|id| !choices.genres.iter().any(|g| g.id == *id)) {
            errors.add("genres", "Select a valid choice.");
        }
        if self.skills.iter().any(|id| !choices.skills.iter().any(|s| s.id == *id)) {
            errors.add("skills", "Select a valid choice.");
        }

        errors.into_result()
    }

    pub fn is_ad_type(&self, id: &i32) -> bool {
        self.ad_type_id == Some(*id)
    }

    pub fn is_city(&self, id: &i32) -> bool {
        self.city_id == Some(*id)
    }

    pub fn has_genre(&self, id: &i32) -> bool {
        self.genres.contains(id)
    }

    pub fn has_skill(&self, id: &i32) -> bool {
        self.skills.contains(id)
    }
}

async fn replace_facets<C>(db: &C, ad_id: i32, genres: &[i32], skills: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    advertisement_genres::Entity::delete_many()
        .filter(advertisement_genres::Column::AdvertisementId.eq(ad_id))
        .exec(db)
        .await?;
    advertisement_skills::Entity::delete_many()
        .filter(advertisement_skills::Column::AdvertisementId.eq(ad_id))
        .exec(db)
        .await?;

    for genre_id in genres {
        advertisement_genres::ActiveModel {
            advertisement_id: Set(ad_id),
            genre_id: Set(*genre_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    for skill_id in skills {
        advertisement_skills::ActiveModel {
            advertisement_id: Set(ad_id),
            skill_id: Set(*skill_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

pub async fn create_advertisement<C>(
    db: &C,
    author_id: i32,
    form: &AdvertisementForm,
    choices: &Choices,
) -> Result<advertisements::Model, ContentError>
where
    C: TransactionTrait,
{
    form.validate(choices)?;

    let now = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;
    let ad = advertisements::ActiveModel {
        title: Set(form.title.clone()),
        ad_type_id: Set(form.ad_type_id),
        description: Set(form.description.clone()),
        author_id: Set(author_id),
        city_id: Set(form.city_id),
        created: Set(now),
        last_updated: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    replace_facets(&txn, ad.id, &form.genres, &form.skills).await?;
    txn.commit().await?;

    log::info!("Profile {} created ad {}", author_id, ad.id);
    Ok(ad)
}

pub async fn get<C>(db: &C, ad_id: i32) -> Result<advertisements::Model, ContentError>
where
    C: ConnectionTrait,
{
    advertisements::Entity::find_by_id(ad_id)
        .one(db)
        .await?
        .ok_or(ContentError::NotFound)
}

/// The ad, if `profile_id` wrote it.
pub async fn get_owned<C>(db: &C, ad_id: i32, profile_id: i32) -> Result<advertisements::Model, ContentError>
where
    C: ConnectionTrait,
{
    let ad = get(db, ad_id).await?;
    check_owner(ad.author_id, profile_id)?;
    Ok(ad)
}

pub async fn update_advertisement<C>(
    db: &C,
    ad_id: i32,
    profile_id: i32,
    form: &AdvertisementForm,
    choices: &Choices,
) -> Result<advertisements::Model, ContentError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let ad = get_owned(db, ad_id, profile_id).await?;
    form.validate(choices)?;

    let txn = db.begin().await?;
    let mut active: advertisements::ActiveModel = ad.into();
    active.title = Set(form.title.clone());
    active.ad_type_id = Set(form.ad_type_id);
    active.description = Set(form.description.clone());
    active.city_id = Set(form.city_id);
    active.last_updated = Set(chrono::Utc::now().naive_utc());
    let ad = active.update(&txn).await?;
    replace_facets(&txn, ad.id, &form.genres, &form.skills).await?;
    txn.commit().await?;

    log::info!("Profile {} edited ad {}", profile_id, ad.id);
    Ok(ad)
}

/// Deletes the ad with its bookmarks and reports. `actor` is the profile
/// acting, checked for ownership; staff pass `None`.
pub async fn delete_advertisement<C>(db: &C, ad_id: i32, actor: Option<i32>) -> Result<(), ContentError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let ad = get(db, ad_id).await?;
    if let Some(profile_id) = actor {
        check_owner(ad.author_id, profile_id)?;
    }

    let txn = db.begin().await?;
    purge_attachments(&txn, ContentKind::Advertisement, &[ad.id]).await?;
    advertisements::Entity::delete_by_id(ad.id).exec(&txn).await?;
    txn.commit().await?;

    log::info!("Deleted ad {} ({:?})", ad.id, actor);
    Ok(())
}

pub async fn genre_ids<C>(db: &C, ad_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(advertisement_genres::Entity::find()
        .filter(advertisement_genres::Column::AdvertisementId.eq(ad_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.genre_id)
        .collect())
}

pub async fn skill_ids<C>(db: &C, ad_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(advertisement_skills::Entity::find()
        .filter(advertisement_skills::Column::AdvertisementId.eq(ad_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.skill_id)
        .collect())
}

/// Ads written by one profile, newest-updated first.
pub async fn by_author<C>(db: &C, profile_id: i32) -> Result<Vec<advertisements::Model>, DbErr>
where
    C: ConnectionTrait,
{
    advertisements::Entity::find()
        .filter(advertisements::Column::AuthorId.eq(profile_id))
        .order_by_desc(advertisements::Column::LastUpdated)
        .order_by_desc(advertisements::Column::Id)
        .all(db)
        .await
}

/// An ad in a listing.
#[derive(Clone, Debug)]
pub struct AdvertisementCard {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub description: String,
    pub ad_type: String,
    pub city: String,
    pub genres: Vec<String>,
    pub skills: Vec<String>,
    pub author_name: String,
    pub author_url: String,
    pub author_picture_url: Option<String>,
    pub last_updated: chrono::NaiveDateTime,
    pub bookmark_id: Option<i32>,
}

pub async fn cards<C>(
    db: &C,
    ads: Vec<advertisements::Model>,
    choices: &Choices,
) -> Result<Vec<AdvertisementCard>, DbErr>
where
    C: ConnectionTrait,
{
    if ads.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = ads.iter().map(|ad| ad.id).collect();
    let author_ids: Vec<i32> = ads.iter().map(|ad| ad.author_id).collect();

    let mut genres: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in advertisement_genres::Entity::find()
        .filter(advertisement_genres::Column::AdvertisementId.is_in(ids.clone()))
        .all(db)
        .await?
    {
        genres.entry(row.advertisement_id).or_default().push(row.genre_id);
    }
    let mut skills: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in advertisement_skills::Entity::find()
        .filter(advertisement_skills::Column::AdvertisementId.is_in(ids))
        .all(db)
        .await?
    {
        skills.entry(row.advertisement_id).or_default().push(row.skill_id);
    }
    let authors: HashMap<i32, profiles::Model> = profiles::Entity::find()
        .filter(profiles::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(ads
        .into_iter()
        .map(|ad| {
            let author = authors.get(&ad.author_id);
            AdvertisementCard {
                id: ad.id,
                url: format!("/ads/{}/", ad.id),
                ad_type: choices.ad_type_name(ad.ad_type_id),
                city: choices.city_label(ad.city_id),
                genres: choices.genre_names(genres.get(&ad.id).map(Vec::as_slice).unwrap_or_default()),
                skills: choices.skill_names(skills.get(&ad.id).map(Vec::as_slice).unwrap_or_default()),
                author_name: author.map(|a| a.display_name.clone()).unwrap_or_default(),
                author_url: author.map(|a| a.get_url()).unwrap_or_default(),
                author_picture_url: author
                    .and_then(|a| a.profile_picture.as_deref())
                    .map(crate::storage::media_url),
                last_updated: ad.last_updated,
                bookmark_id: None,
                title: ad.title,
                description: ad.description,
            }
        })
        .collect())
}

/// Everything the detail page shows except viewer state.
#[derive(Clone, Debug)]
pub struct AdvertisementDetail {
    pub ad: advertisements::Model,
    pub author: Option<profiles::Model>,
    pub ad_type: String,
    pub city: String,
    pub genres: Vec<String>,
    pub skills: Vec<String>,
    pub comments: Vec<CommentDisplay>,
}

impl AdvertisementDetail {
    pub fn is_author(&self, profile_id: Option<i32>) -> bool {
        profile_id == Some(self.ad.author_id)
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
}

pub async fn load_detail<C>(db: &C, ad_id: i32, choices: &Choices) -> Result<AdvertisementDetail, ContentError>
where
    C: ConnectionTrait,
{
    let ad = get(db, ad_id).await?;
    let author = profiles::Entity::find_by_id(ad.author_id).one(db).await?;
    let genres = choices.genre_names(&genre_ids(db, ad.id).await?);
    let skills = choices.skill_names(&skill_ids(db, ad.id).await?);
    let comments = comments::list_for(db, CommentParent::Advertisement, ad.id).await?;

    Ok(AdvertisementDetail {
        ad_type: choices.ad_type_name(ad.ad_type_id),
        city: choices.city_label(ad.city_id),
        author,
        genres,
        skills,
        comments,
        ad,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::{ad_types, cities, genres};

    fn choices() -> Choices {
        Choices {
            ad_types: vec![ad_types::Model {
                id: 1,
                name: "Looking for Band".to_owned(),
            }],
            cities: vec![cities::Model {
                id: 7,
                name: "Austin".to_owned(),
                region: "Texas".to_owned(),
                country: "United States".to_owned(),
            }],
            genres: vec![genres::Model {
                id: 3,
                name: "Blues".to_owned(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_form_validation() {
        let fields = FormFields::from_query("title=Need+a+bassist&ad_type=1&location=7&description=Weekly+jams&genres=3");
        let form = AdvertisementForm::from_fields(&fields);
        assert!(form.validate(&choices()).is_ok());

        let fields = FormFields::from_query(&format!("title={}&ad_type=9&genres=4", "x".repeat(101)));
        let errors = AdvertisementForm::from_fields(&fields)
            .validate(&choices())
            .unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("description"));
        assert!(errors.has("ad_type"));
        assert!(errors.has("location"));
        assert!(errors.has("genres"));
        assert!(!errors.has("skills"));
    }
}
