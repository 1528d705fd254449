//! Moderation reports against profiles, ads and open mics.

use crate::content::{self, ContentError, ContentKind};
use crate::forms::FieldErrors;
use crate::orm::reports;
use sea_orm::{entity::*, ActiveValue::Set, ConnectionTrait};

pub fn validate_description(description: &str, min_length: usize) -> Result<String, FieldErrors> {
    let description = description.trim();
    let mut errors = FieldErrors::new();
    if description.chars().count() < min_length {
        errors.add(
            "description",
            format!("Description must be at least {} characters long.", min_length),
        );
    }
    errors.into_result().map(|_| description.to_owned())
}

/// Files a report. The target's display title and model name are copied
/// onto the report so it still reads correctly after the target changes.
pub async fn create_report<C>(
    db: &C,
    profile_id: i32,
    kind: ContentKind,
    object_id: i32,
    description: &str,
) -> Result<reports::Model, ContentError>
where
    C: ConnectionTrait,
{
    let target = content::resolve(db, kind, object_id)
        .await?
        .ok_or(ContentError::NotFound)?;
    let description = validate_description(
        description,
        crate::app_config::limits().report_min_length as usize,
    )?;

    let report = reports::ActiveModel {
        profile_id: Set(profile_id),
        content_type: Set(kind.model_name().to_owned()),
        object_id: Set(object_id),
        description: Set(description),
        created: Set(chrono::Utc::now().naive_utc()),
        object_title: Set(target.title),
        object_type: Set(kind.model_name().to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!(
        "Profile {} reported {} {} (report {})",
        profile_id,
        kind,
        object_id,
        report.id
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_minimum() {
        assert!(validate_description("too short", 10).is_err());
        assert!(validate_description("   padded   ", 10).is_err());
        assert_eq!(
            validate_description(" spam spam spam ", 10).unwrap(),
            "spam spam spam"
        );
        let errors = validate_description("", 10).unwrap_err();
        assert_eq!(
            errors.get("description"),
            vec!["Description must be at least 10 characters long.".to_owned()]
        );
    }
}
