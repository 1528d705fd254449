//! Generic `(content_type, object_id)` addressing for bookmarks and reports.
//!
//! URLs name a target by `{app_label}/{model_name}/{object_id}`. The
//! `content_type` column stores the model name.

use crate::forms::FieldErrors;
use crate::orm::{advertisements, bookmarks, open_mics, profiles, reports, users};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// Failure of a mutation on ads, open mics, comments, bookmarks or reports.
#[derive(Debug)]
pub enum ContentError {
    NotFound,
    /// The acting profile does not own the row.
    Forbidden,
    Invalid(FieldErrors),
    Db(DbErr),
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Forbidden => write!(f, "permission denied"),
            Self::Invalid(errors) => write!(f, "invalid input: {}", errors),
            Self::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl std::error::Error for ContentError {}

impl From<DbErr> for ContentError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

impl From<FieldErrors> for ContentError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

impl From<ContentError> for actix_web::Error {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound => actix_web::error::ErrorNotFound("Not found"),
            ContentError::Forbidden => {
                actix_web::error::ErrorForbidden("You do not have permission to do that.")
            }
            ContentError::Invalid(errors) => actix_web::error::ErrorBadRequest(errors.to_string()),
            ContentError::Db(err) => {
                log::error!("{}", err);
                actix_web::error::ErrorInternalServerError("Database error")
            }
        }
    }
}

/// `Forbidden` unless `owner_id` is `actor_id`.
pub fn check_owner(owner_id: i32, actor_id: i32) -> Result<(), ContentError> {
    if owner_id == actor_id {
        Ok(())
    } else {
        Err(ContentError::Forbidden)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Profile,
    Advertisement,
    OpenMic,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [Self::Profile, Self::Advertisement, Self::OpenMic];

    pub fn app_label(&self) -> &'static str {
        match self {
            Self::Profile => "profiles",
            Self::Advertisement => "advertisements",
            Self::OpenMic => "openmics",
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Advertisement => "advertisement",
            Self::OpenMic => "openmic",
        }
    }

    pub fn verbose_name(&self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::Advertisement => "Ad",
            Self::OpenMic => "Open Mic",
        }
    }

    /// Resolves a URL `(app_label, model_name)` pair.
    pub fn from_path(app_label: &str, model_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.app_label() == app_label && kind.model_name() == model_name)
    }

    /// Resolves a stored `content_type` value.
    pub fn from_model_name(model_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.model_name() == model_name)
    }

    /// `{app_label}/{model_name}/{object_id}` as used by bookmark and report routes.
    pub fn path(&self, object_id: i32) -> String {
        format!("{}/{}/{}", self.app_label(), self.model_name(), object_id)
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_name())
    }
}

/// A resolved attachment target.
#[derive(Clone, Debug)]
pub struct ContentTarget {
    pub kind: ContentKind,
    pub id: i32,
    /// Display string captured by reports.
    pub title: String,
    pub url: String,
    /// Profile that owns the target. A profile owns itself.
    pub owner_id: i32,
}

/// Looks the target up; `None` when the row does not exist.
pub async fn resolve<C>(db: &C, kind: ContentKind, id: i32) -> Result<Option<ContentTarget>, DbErr>
where
    C: ConnectionTrait,
{
    let target = match kind {
        ContentKind::Profile => profiles::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(db)
            .await?
            .map(|(profile, user)| ContentTarget {
                kind,
                id,
                title: profile_title(&profile, user.as_ref()),
                url: profile.get_url(),
                owner_id: profile.id,
            }),
        ContentKind::Advertisement => {
            advertisements::Entity::find_by_id(id)
                .one(db)
                .await?
                .map(|ad| ContentTarget {
                    kind,
                    id,
                    title: ad.title.clone(),
                    url: format!("/ads/{}/", ad.id),
                    owner_id: ad.author_id,
                })
        }
        ContentKind::OpenMic => {
            match open_mics::Entity::find_by_id(id).one(db).await? {
                Some(openmic) => {
                    let email = author_email(db, openmic.author_id).await?;
                    Some(ContentTarget {
                        kind,
                        id,
                        title: format!("{} Open Mic - {}", openmic.title, email),
                        url: format!("/openmics/{}/", openmic.id),
                        owner_id: openmic.author_id,
                    })
                }
                None => None,
            }
        }
    };
    Ok(target)
}

/// "{display_name} - {email}"
pub fn profile_title(profile: &profiles::Model, user: Option<&users::Model>) -> String {
    match user {
        Some(user) => format!("{} - {}", profile.display_name, user.email),
        None => profile.display_name.clone(),
    }
}

async fn author_email<C>(db: &C, profile_id: i32) -> Result<String, DbErr>
where
    C: ConnectionTrait,
{
    let user = profiles::Entity::find_by_id(profile_id)
        .find_also_related(users::Entity)
        .one(db)
        .await?
        .and_then(|(_, user)| user);
    Ok(user.map(|u| u.email).unwrap_or_default())
}

/// Deletes bookmarks and reports pointing at a removed target.
///
/// Run inside the transaction that deletes the target itself.
pub async fn purge_attachments<C>(db: &C, kind: ContentKind, ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(());
    }

    let bookmarks = bookmarks::Entity::delete_many()
        .filter(bookmarks::Column::ContentType.eq(kind.model_name()))
        .filter(bookmarks::Column::ObjectId.is_in(ids.to_vec()))
        .exec(db)
        .await?;
    let reports = reports::Entity::delete_many()
        .filter(reports::Column::ContentType.eq(kind.model_name()))
        .filter(reports::Column::ObjectId.is_in(ids.to_vec()))
        .exec(db)
        .await?;

    log::debug!(
        "Purged {} bookmarks and {} reports for {} {:?}",
        bookmarks.rows_affected,
        reports.rows_affected,
        kind,
        ids
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_round_trip() {
        for kind in ContentKind::ALL {
            assert_eq!(
                ContentKind::from_path(kind.app_label(), kind.model_name()),
                Some(kind)
            );
            assert_eq!(ContentKind::from_model_name(kind.model_name()), Some(kind));
        }
        assert_eq!(ContentKind::from_path("openmics", "profile"), None);
        assert_eq!(ContentKind::OpenMic.path(4), "openmics/openmic/4");
    }

    #[test]
    fn test_check_owner() {
        assert!(check_owner(3, 3).is_ok());
        assert!(matches!(check_owner(3, 4), Err(ContentError::Forbidden)));
    }
}
