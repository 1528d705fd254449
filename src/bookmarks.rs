//! Bookmarks: a profile's saved profiles, ads and open mics.

use crate::content::{self, ContentError, ContentKind};
use crate::orm::{advertisements, bookmarks, open_mics, profiles};
use sea_orm::{entity::*, query::*, ActiveValue::Set, ConnectionTrait, DbErr};
use std::collections::HashMap;

/// Returns the bookmark and whether it was created by this call.
/// `NotFound` when the target does not exist.
pub async fn get_or_create<C>(
    db: &C,
    profile_id: i32,
    kind: ContentKind,
    object_id: i32,
) -> Result<(bookmarks::Model, bool), ContentError>
where
    C: ConnectionTrait,
{
    content::resolve(db, kind, object_id)
        .await?
        .ok_or(ContentError::NotFound)?;

    if let Some(existing) = find(db, profile_id, kind, object_id).await? {
        return Ok((existing, false));
    }

    let inserted = bookmarks::ActiveModel {
        profile_id: Set(profile_id),
        content_type: Set(kind.model_name().to_owned()),
        object_id: Set(object_id),
        created: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(bookmark) => {
            log::debug!("Profile {} bookmarked {} {}", profile_id, kind, object_id);
            Ok((bookmark, true))
        }
        // Lost a race against the unique index.
        Err(err) => match find(db, profile_id, kind, object_id).await? {
            Some(existing) => Ok((existing, false)),
            None => Err(err.into()),
        },
    }
}

/// Deletes a bookmark belonging to `profile_id`. Anyone else's bookmark is
/// `NotFound`, same as a missing one.
pub async fn delete_owned<C>(db: &C, profile_id: i32, bookmark_id: i32) -> Result<bookmarks::Model, ContentError>
where
    C: ConnectionTrait,
{
    let bookmark = bookmarks::Entity::find_by_id(bookmark_id)
        .filter(bookmarks::Column::ProfileId.eq(profile_id))
        .one(db)
        .await?
        .ok_or(ContentError::NotFound)?;

    bookmarks::Entity::delete_by_id(bookmark.id).exec(db).await?;
    Ok(bookmark)
}

pub async fn find<C>(
    db: &C,
    profile_id: i32,
    kind: ContentKind,
    object_id: i32,
) -> Result<Option<bookmarks::Model>, DbErr>
where
    C: ConnectionTrait,
{
    bookmarks::Entity::find()
        .filter(bookmarks::Column::ProfileId.eq(profile_id))
        .filter(bookmarks::Column::ContentType.eq(kind.model_name()))
        .filter(bookmarks::Column::ObjectId.eq(object_id))
        .one(db)
        .await
}

/// Object id to bookmark id, for the objects on one list page.
pub async fn bookmarked_map<C>(
    db: &C,
    profile_id: i32,
    kind: ContentKind,
    object_ids: &[i32],
) -> Result<HashMap<i32, i32>, DbErr>
where
    C: ConnectionTrait,
{
    if object_ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(bookmarks::Entity::find()
        .filter(bookmarks::Column::ProfileId.eq(profile_id))
        .filter(bookmarks::Column::ContentType.eq(kind.model_name()))
        .filter(bookmarks::Column::ObjectId.is_in(object_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.object_id, b.id))
        .collect())
}

/// Ids of everything `profile_id` bookmarked of one kind, most recent first.
async fn bookmarked_ids<C>(db: &C, profile_id: i32, kind: ContentKind) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(bookmarks::Entity::find()
        .filter(bookmarks::Column::ProfileId.eq(profile_id))
        .filter(bookmarks::Column::ContentType.eq(kind.model_name()))
        .order_by_desc(bookmarks::Column::Created)
        .order_by_desc(bookmarks::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.object_id)
        .collect())
}

/// Reorders rows to follow `ids`.
fn in_order<T>(ids: &[i32], rows: Vec<T>, id_of: impl Fn(&T) -> i32) -> Vec<T> {
    let mut by_id: HashMap<i32, T> = rows.into_iter().map(|row| (id_of(&row), row)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

pub async fn bookmarked_profiles<C>(db: &C, profile_id: i32) -> Result<Vec<profiles::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = bookmarked_ids(db, profile_id, ContentKind::Profile).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = profiles::Entity::find()
        .filter(profiles::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?;
    Ok(in_order(&ids, rows, |p| p.id))
}

pub async fn bookmarked_advertisements<C>(db: &C, profile_id: i32) -> Result<Vec<advertisements::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = bookmarked_ids(db, profile_id, ContentKind::Advertisement).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = advertisements::Entity::find()
        .filter(advertisements::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?;
    Ok(in_order(&ids, rows, |ad| ad.id))
}

pub async fn bookmarked_openmics<C>(db: &C, profile_id: i32) -> Result<Vec<open_mics::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = bookmarked_ids(db, profile_id, ContentKind::OpenMic).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = open_mics::Entity::find()
        .filter(open_mics::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?;
    Ok(in_order(&ids, rows, |o| o.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order_follows_ids() {
        let rows = vec![(1, "a"), (2, "b"), (3, "c")];
        let ordered = in_order(&[3, 1, 9], rows, |row| row.0);
        assert_eq!(ordered, vec![(3, "c"), (1, "a")]);
    }
}
