//! User accounts: sign up and credential checks.

use crate::forms::FieldErrors;
use crate::orm::users;
use crate::session::{hash_password, verify_password};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ActiveValue::Set, ConnectionTrait, DbErr};
use validator::Validate;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.+-]+$").expect("static regex"));

#[derive(Debug)]
pub enum AccountError {
    /// Username or email already registered. Carries the offending field.
    Taken(&'static str),
    Invalid(FieldErrors),
    Hash(String),
    Db(DbErr),
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Taken(field) => write!(f, "{} is already taken", field),
            Self::Invalid(errors) => write!(f, "invalid account data: {}", errors),
            Self::Hash(err) => write!(f, "password hashing failed: {}", err),
            Self::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl std::error::Error for AccountError {}

impl From<DbErr> for AccountError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

#[derive(Debug, Validate)]
pub struct NewUser {
    #[validate(
        length(min = 3, max = 30, message = "Username must be between 3 and 30 characters."),
        regex(
            path = "USERNAME_RE",
            message = "Usernames may only contain letters, numbers and _ . + -"
        )
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
}

async fn username_taken<C>(db: &C, username: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    Ok(users::Entity::find()
        .filter(Expr::cust_with_values(
            "LOWER(\"users\".\"username\") = ?",
            vec![username.to_lowercase()],
        ))
        .one(db)
        .await?
        .is_some())
}

async fn email_taken<C>(db: &C, email: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    Ok(users::Entity::find()
        .filter(Expr::cust_with_values(
            "LOWER(\"users\".\"email\") = ?",
            vec![email.to_lowercase()],
        ))
        .one(db)
        .await?
        .is_some())
}

/// Validates and inserts a new account. Usernames and emails are unique
/// regardless of case.
pub async fn create_user<C>(
    db: &C,
    username: &str,
    email: &str,
    password: &str,
) -> Result<users::Model, AccountError>
where
    C: ConnectionTrait,
{
    let username = username.trim();
    let email = email.trim();

    NewUser {
        username: username.to_owned(),
        email: email.to_owned(),
        password: password.to_owned(),
    }
    .validate()
    .map_err(|e| AccountError::Invalid(e.into()))?;

    if username_taken(db, username).await? {
        return Err(AccountError::Taken("username"));
    }
    if email_taken(db, email).await? {
        return Err(AccountError::Taken("email"));
    }

    let password = hash_password(password).map_err(|e| AccountError::Hash(e.to_string()))?;

    let user = users::ActiveModel {
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password: Set(password),
        is_staff: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Created user {} ({})", user.username, user.id);
    Ok(user)
}

/// Checks credentials and stamps `last_login`. `None` for any mismatch.
pub async fn authenticate<C>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<Option<users::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let user = users::Entity::find()
        .filter(Expr::cust_with_values(
            "LOWER(\"users\".\"username\") = ?",
            vec![username.trim().to_lowercase()],
        ))
        .one(db)
        .await?;

    let user = match user {
        Some(user) if verify_password(password, &user.password) => user,
        _ => return Ok(None),
    };

    let mut active: users::ActiveModel = user.into();
    active.last_login = Set(Some(chrono::Utc::now().naive_utc()));
    Ok(Some(active.update(db).await?))
}

/// Grants or revokes access to the admin screens.
pub async fn set_staff<C>(db: &C, user_id: i32, is_staff: bool) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    users::Entity::update_many()
        .col_expr(users::Column::IsStaff, Expr::value(is_staff))
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}
