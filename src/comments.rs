//! Short comments under ads and open mics.
//!
//! Each parent type has its own table. A comment outlives its author with
//! `author_id` set to null, and dies with its parent.

use crate::content::{check_owner, ContentError};
use crate::forms::FieldErrors;
use crate::orm::{advertisement_comments, advertisements, open_mic_comments, open_mics, profiles};
use sea_orm::{entity::*, query::*, ActiveValue::Set, ConnectionTrait, DbErr};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentParent {
    Advertisement,
    OpenMic,
}

/// A comment ready for rendering.
#[derive(Clone, Debug)]
pub struct CommentDisplay {
    pub id: i32,
    pub author_id: Option<i32>,
    /// Empty when the author deleted their profile.
    pub author_name: String,
    pub author_url: Option<String>,
    pub author_picture_url: Option<String>,
    pub body: String,
    pub created: chrono::NaiveDateTime,
}

impl CommentDisplay {
    pub fn is_author(&self, profile_id: Option<i32>) -> bool {
        profile_id.is_some() && self.author_id == profile_id
    }
}

/// Trims and checks `1..=max_length` characters.
pub fn validate_body(body: &str, max_length: usize) -> Result<String, FieldErrors> {
    let body = body.trim();
    let mut errors = FieldErrors::new();
    if body.is_empty() {
        errors.add("body", "This field is required.");
    } else if body.chars().count() > max_length {
        errors.add(
            "body",
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max_length,
                body.chars().count()
            ),
        );
    }
    errors.into_result().map(|_| body.to_owned())
}

fn max_length() -> usize {
    crate::app_config::limits().comment_max_length as usize
}

/// Adds a comment by `author_id`. `NotFound` when the parent is gone.
pub async fn create_comment<C>(
    db: &C,
    parent: CommentParent,
    parent_id: i32,
    author_id: i32,
    body: &str,
) -> Result<i32, ContentError>
where
    C: ConnectionTrait,
{
    let body = validate_body(body, max_length())?;
    let created = chrono::Utc::now().naive_utc();

    let id = match parent {
        CommentParent::Advertisement => {
            advertisements::Entity::find_by_id(parent_id)
                .one(db)
                .await?
                .ok_or(ContentError::NotFound)?;
            advertisement_comments::ActiveModel {
                author_id: Set(Some(author_id)),
                advertisement_id: Set(parent_id),
                body: Set(body),
                created: Set(created),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        CommentParent::OpenMic => {
            open_mics::Entity::find_by_id(parent_id)
                .one(db)
                .await?
                .ok_or(ContentError::NotFound)?;
            open_mic_comments::ActiveModel {
                author_id: Set(Some(author_id)),
                open_mic_id: Set(parent_id),
                body: Set(body),
                created: Set(created),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
    };

    log::debug!("Profile {} commented {} on {:?} {}", author_id, id, parent, parent_id);
    Ok(id)
}

/// Deletes a comment written by `profile_id` and returns its parent id.
/// Comments by anyone else, including orphaned ones, are `Forbidden`.
pub async fn delete_comment<C>(
    db: &C,
    parent: CommentParent,
    comment_id: i32,
    profile_id: i32,
) -> Result<i32, ContentError>
where
    C: ConnectionTrait,
{
    let (author_id, parent_id) = match parent {
        CommentParent::Advertisement => advertisement_comments::Entity::find_by_id(comment_id)
            .one(db)
            .await?
            .map(|c| (c.author_id, c.advertisement_id)),
        CommentParent::OpenMic => open_mic_comments::Entity::find_by_id(comment_id)
            .one(db)
            .await?
            .map(|c| (c.author_id, c.open_mic_id)),
    }
    .ok_or(ContentError::NotFound)?;

    match author_id {
        Some(author_id) => check_owner(author_id, profile_id)?,
        None => return Err(ContentError::Forbidden),
    }

    remove_comment(db, parent, comment_id).await?;
    Ok(parent_id)
}

/// Deletes without an author check, for staff.
pub async fn remove_comment<C>(db: &C, parent: CommentParent, comment_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let result = match parent {
        CommentParent::Advertisement => {
            advertisement_comments::Entity::delete_by_id(comment_id)
                .exec(db)
                .await?
        }
        CommentParent::OpenMic => open_mic_comments::Entity::delete_by_id(comment_id).exec(db).await?,
    };
    Ok(result.rows_affected > 0)
}

/// Comments on one parent, newest first.
pub async fn list_for<C>(
    db: &C,
    parent: CommentParent,
    parent_id: i32,
) -> Result<Vec<CommentDisplay>, DbErr>
where
    C: ConnectionTrait,
{
    let rows: Vec<(i32, Option<i32>, String, chrono::NaiveDateTime)> = match parent {
        CommentParent::Advertisement => advertisement_comments::Entity::find()
            .filter(advertisement_comments::Column::AdvertisementId.eq(parent_id))
            .order_by_desc(advertisement_comments::Column::Created)
            .order_by_desc(advertisement_comments::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.author_id, c.body, c.created))
            .collect(),
        CommentParent::OpenMic => open_mic_comments::Entity::find()
            .filter(open_mic_comments::Column::OpenMicId.eq(parent_id))
            .order_by_desc(open_mic_comments::Column::Created)
            .order_by_desc(open_mic_comments::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.author_id, c.body, c.created))
            .collect(),
    };

    let author_ids: Vec<i32> = rows.iter().filter_map(|row| row.1).collect();
    let authors: HashMap<i32, profiles::Model> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(author_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    Ok(rows
        .into_iter()
        .map(|(id, author_id, body, created)| {
            let author = author_id.and_then(|id| authors.get(&id));
            CommentDisplay {
                id,
                author_id,
                author_name: author.map(|a| a.display_name.clone()).unwrap_or_default(),
                author_url: author.map(|a| a.get_url()),
                author_picture_url: author
                    .and_then(|a| a.profile_picture.as_deref())
                    .map(crate::storage::media_url),
                body,
                created,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_body() {
        assert_eq!(validate_body("  nice set  ", 150).unwrap(), "nice set");
        assert!(validate_body("   ", 150).unwrap_err().has("body"));
        assert!(validate_body(&"a".repeat(150), 150).is_ok());
        assert!(validate_body(&"a".repeat(151), 150).is_err());
    }

    #[test]
    fn test_is_author() {
        let comment = CommentDisplay {
            id: 1,
            author_id: None,
            author_name: String::new(),
            author_url: None,
            author_picture_url: None,
            body: "hi".to_owned(),
            created: chrono::Utc::now().naive_utc(),
        };
        assert!(!comment.is_author(None));
        assert!(!comment.is_author(Some(1)));
    }
}
