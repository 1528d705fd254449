//! Site feedback from the contact form. Anyone may submit.

use crate::forms::FieldErrors;
use crate::orm::feedback;
use sea_orm::{entity::*, ActiveValue::Set, ConnectionTrait, DbErr};
use serde::Deserialize;
use validator::Validate;

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct FeedbackForm {
    #[serde(default)]
    pub csrf_token: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Subject is required and must be at most 100 characters."
    ))]
    pub subject: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub message: String,
}

impl FeedbackForm {
    pub fn trimmed(&self) -> Self {
        Self {
            csrf_token: self.csrf_token.clone(),
            email: self.email.trim().to_owned(),
            subject: self.subject.trim().to_owned(),
            message: self.message.trim().to_owned(),
        }
    }

    pub fn check(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(FieldErrors::from)
    }
}

#[derive(Debug)]
pub enum FeedbackError {
    Invalid(FieldErrors),
    Db(DbErr),
}

impl From<DbErr> for FeedbackError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

pub async fn submit_feedback<C>(db: &C, form: &FeedbackForm) -> Result<feedback::Model, FeedbackError>
where
    C: ConnectionTrait,
{
    let form = form.trimmed();
    form.check().map_err(FeedbackError::Invalid)?;

    let row = feedback::ActiveModel {
        email: Set(form.email),
        subject: Set(form.subject),
        message: Set(form.message),
        created: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Feedback {} received", row.id);
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, subject: &str, message: &str) -> FeedbackForm {
        FeedbackForm {
            csrf_token: String::new(),
            email: email.to_owned(),
            subject: subject.to_owned(),
            message: message.to_owned(),
        }
    }

    #[test]
    fn test_feedback_validation() {
        assert!(form("a@example.com", "Hi", "Love the site").trimmed().check().is_ok());

        let errors = form("nope", "", "  ").trimmed().check().unwrap_err();
        assert!(errors.has("email"));
        assert!(errors.has("subject"));
        assert!(errors.has("message"));

        let long = "x".repeat(101);
        assert!(form("a@example.com", &long, "m").trimmed().check().is_err());
    }
}
