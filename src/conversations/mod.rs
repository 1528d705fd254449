//! Inbox conversations between profiles.
//!
//! A conversation holds any number of participants, though the inbox only
//! ever opens them between two. `is_seen` belongs to the conversation, not to
//! a participant: sending clears it and the first participant other than the
//! latest sender to open the conversation sets it.

use crate::forms::FieldErrors;
use crate::orm::{conversation_participants, conversations, inbox_messages, profiles};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, DbErr,
    TransactionTrait,
};
use std::collections::HashMap;

#[derive(Debug)]
pub enum ConversationError {
    /// A profile tried to message itself.
    SelfMessage,
    NotFound,
    NotParticipant,
    Invalid(FieldErrors),
    Db(DbErr),
}

impl std::fmt::Display for ConversationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfMessage => write!(f, "cannot message yourself"),
            Self::NotFound => write!(f, "conversation not found"),
            Self::NotParticipant => write!(f, "not a participant in this conversation"),
            Self::Invalid(errors) => write!(f, "invalid message: {}", errors),
            Self::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl std::error::Error for ConversationError {}

impl From<DbErr> for ConversationError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

impl From<ConversationError> for actix_web::Error {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::SelfMessage => {
                actix_web::error::ErrorBadRequest("You cannot send a message to yourself.")
            }
            // Outsiders learn nothing about a conversation's existence.
            ConversationError::NotFound | ConversationError::NotParticipant => {
                actix_web::error::ErrorNotFound("Conversation not found")
            }
            ConversationError::Invalid(errors) => actix_web::error::ErrorBadRequest(errors.to_string()),
            ConversationError::Db(err) => {
                log::error!("{}", err);
                actix_web::error::ErrorInternalServerError("Database error")
            }
        }
    }
}

pub fn validate_body(body: &str) -> Result<String, FieldErrors> {
    let body = body.trim();
    let mut errors = FieldErrors::new();
    if body.is_empty() {
        errors.add("body", "This field is required.");
    }
    errors.into_result().map(|_| body.to_owned())
}

/// Verify that a profile is a participant in a conversation
pub async fn is_participant<C>(db: &C, conversation_id: i32, profile_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    Ok(conversation_participants::Entity::find()
        .filter(conversation_participants::Column::ConversationId.eq(conversation_id))
        .filter(conversation_participants::Column::ProfileId.eq(profile_id))
        .one(db)
        .await?
        .is_some())
}

async fn conversation_ids_of<C>(db: &C, profile_id: i32) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(conversation_participants::Entity::find()
        .filter(conversation_participants::Column::ProfileId.eq(profile_id))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.conversation_id)
        .collect())
}

/// The oldest conversation both profiles take part in.
pub async fn conversation_between<C>(db: &C, a: i32, b: i32) -> Result<Option<conversations::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = conversation_ids_of(db, a).await?;
    if ids.is_empty() {
        return Ok(None);
    }
    let shared = conversation_participants::Entity::find()
        .filter(conversation_participants::Column::ProfileId.eq(b))
        .filter(conversation_participants::Column::ConversationId.is_in(ids))
        .order_by_asc(conversation_participants::Column::ConversationId)
        .one(db)
        .await?;
    match shared {
        Some(row) => conversations::Entity::find_by_id(row.conversation_id).one(db).await,
        None => Ok(None),
    }
}

/// Reuses the existing conversation between `a` and `b`, or opens one.
/// The flag is true when a conversation was created.
pub async fn find_or_create_between<C>(
    db: &C,
    a: i32,
    b: i32,
) -> Result<(conversations::Model, bool), ConversationError>
where
    C: ConnectionTrait,
{
    if a == b {
        return Err(ConversationError::SelfMessage);
    }
    if let Some(existing) = conversation_between(db, a, b).await? {
        return Ok((existing, false));
    }

    let conversation = conversations::ActiveModel {
        lastmessage_created: Set(chrono::Utc::now().naive_utc()),
        is_seen: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for profile_id in [a, b] {
        conversation_participants::ActiveModel {
            conversation_id: Set(conversation.id),
            profile_id: Set(profile_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    log::info!("Opened conversation {} between {} and {}", conversation.id, a, b);
    Ok((conversation, true))
}

async fn insert_message<C>(
    db: &C,
    conversation_id: i32,
    sender_id: i32,
    body: String,
) -> Result<inbox_messages::Model, DbErr>
where
    C: ConnectionTrait,
{
    let created = chrono::Utc::now().naive_utc();
    let message = inbox_messages::ActiveModel {
        sender_id: Set(sender_id),
        conversation_id: Set(conversation_id),
        body: Set(body),
        created: Set(created),
        ..Default::default()
    }
    .insert(db)
    .await?;

    conversations::Entity::update_many()
        .col_expr(conversations::Column::LastmessageCreated, Expr::value(created))
        .col_expr(conversations::Column::IsSeen, Expr::value(false))
        .filter(conversations::Column::Id.eq(conversation_id))
        .exec(db)
        .await?;

    Ok(message)
}

/// Appends a message. Marks the conversation unseen and bumps it to the
/// top of both inboxes.
pub async fn send_message<C>(
    db: &C,
    conversation_id: i32,
    sender_id: i32,
    body: &str,
) -> Result<inbox_messages::Model, ConversationError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let body = validate_body(body).map_err(ConversationError::Invalid)?;

    conversations::Entity::find_by_id(conversation_id)
        .one(db)
        .await?
        .ok_or(ConversationError::NotFound)?;
    if !is_participant(db, conversation_id, sender_id).await? {
        return Err(ConversationError::NotParticipant);
    }

    let txn = db.begin().await?;
    let message = insert_message(&txn, conversation_id, sender_id, body).await?;
    txn.commit().await?;

    Ok(message)
}

/// First message from `sender_id` to `recipient_id`, reusing their
/// conversation if one exists. Returns the conversation id.
pub async fn message_profile<C>(
    db: &C,
    sender_id: i32,
    recipient_id: i32,
    body: &str,
) -> Result<i32, ConversationError>
where
    C: TransactionTrait,
{
    let body = validate_body(body).map_err(ConversationError::Invalid)?;

    let txn = db.begin().await?;
    let (conversation, _) = find_or_create_between(&txn, sender_id, recipient_id).await?;
    insert_message(&txn, conversation.id, sender_id, body).await?;
    txn.commit().await?;

    Ok(conversation.id)
}

pub async fn latest_message<C>(db: &C, conversation_id: i32) -> Result<Option<inbox_messages::Model>, DbErr>
where
    C: ConnectionTrait,
{
    inbox_messages::Entity::find()
        .filter(inbox_messages::Column::ConversationId.eq(conversation_id))
        .order_by_desc(inbox_messages::Column::Created)
        .order_by_desc(inbox_messages::Column::Id)
        .one(db)
        .await
}

fn unseen_by(conversation: &conversations::Model, latest: Option<&inbox_messages::Model>, viewer: i32) -> bool {
    !conversation.is_seen && matches!(latest, Some(message) if message.sender_id != viewer)
}

/// True when someone else sent the latest message and nobody has opened it.
pub async fn has_unseen<C>(db: &C, conversation_id: i32, viewer: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let conversation = match conversations::Entity::find_by_id(conversation_id).one(db).await? {
        Some(conversation) => conversation,
        None => return Ok(false),
    };
    let latest = latest_message(db, conversation_id).await?;
    Ok(unseen_by(&conversation, latest.as_ref(), viewer))
}

/// Sets `is_seen` when `viewer` is not the latest sender. Returns whether
/// the flag changed.
pub async fn mark_seen<C>(db: &C, conversation_id: i32, viewer: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    if !has_unseen(db, conversation_id, viewer).await? {
        return Ok(false);
    }
    conversations::Entity::update_many()
        .col_expr(conversations::Column::IsSeen, Expr::value(true))
        .filter(conversations::Column::Id.eq(conversation_id))
        .exec(db)
        .await?;
    Ok(true)
}

/// Conversations holding a message `profile_id` has not seen.
pub async fn count_unseen<C>(db: &C, profile_id: i32) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let ids = conversation_ids_of(db, profile_id).await?;
    if ids.is_empty() {
        return Ok(0);
    }
    let pending = conversations::Entity::find()
        .filter(conversations::Column::Id.is_in(ids))
        .filter(conversations::Column::IsSeen.eq(false))
        .all(db)
        .await?;

    let mut count = 0;
    for conversation in pending {
        let latest = latest_message(db, conversation.id).await?;
        if unseen_by(&conversation, latest.as_ref(), profile_id) {
            count += 1;
        }
    }
    Ok(count)
}

/// One row of the inbox sidebar.
#[derive(Clone, Debug)]
pub struct ConversationPreview {
    pub id: i32,
    /// Everyone but the viewer, comma separated.
    pub title: String,
    pub other_url: Option<String>,
    pub other_picture_url: Option<String>,
    pub last_message: String,
    pub lastmessage_created: chrono::NaiveDateTime,
    pub unseen: bool,
}

fn snippet(body: &str, max: usize) -> String {
    if body.chars().count() > max {
        let mut cut: String = body.chars().take(max).collect();
        cut.push('…');
        cut
    } else {
        body.to_owned()
    }
}

async fn other_participants<C>(db: &C, conversation_id: i32, viewer: i32) -> Result<Vec<profiles::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = conversation_participants::Entity::find()
        .filter(conversation_participants::Column::ConversationId.eq(conversation_id))
        .filter(conversation_participants::Column::ProfileId.ne(viewer))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.profile_id)
        .collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    profiles::Entity::find()
        .filter(profiles::Column::Id.is_in(ids))
        .order_by_asc(profiles::Column::DisplayName)
        .all(db)
        .await
}

/// The viewer's conversations, most recent activity first.
pub async fn list_for<C>(db: &C, profile_id: i32) -> Result<Vec<ConversationPreview>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = conversation_ids_of(db, profile_id).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = conversations::Entity::find()
        .filter(conversations::Column::Id.is_in(ids))
        .order_by_desc(conversations::Column::LastmessageCreated)
        .order_by_desc(conversations::Column::Id)
        .all(db)
        .await?;

    let mut previews = Vec::with_capacity(rows.len());
    for conversation in rows {
        let others = other_participants(db, conversation.id, profile_id).await?;
        let latest = latest_message(db, conversation.id).await?;
        previews.push(ConversationPreview {
            id: conversation.id,
            title: others
                .iter()
                .map(|p| p.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            other_url: others.first().map(|p| p.get_url()),
            other_picture_url: others
                .first()
                .and_then(|p| p.profile_picture.as_deref())
                .map(crate::storage::media_url),
            last_message: latest
                .as_ref()
                .map(|m| snippet(&m.body, 60))
                .unwrap_or_default(),
            lastmessage_created: conversation.lastmessage_created,
            unseen: unseen_by(&conversation, latest.as_ref(), profile_id),
        });
    }
    Ok(previews)
}

#[derive(Clone, Debug)]
pub struct MessageDisplay {
    pub id: i32,
    pub sender_id: i32,
    pub sender_name: String,
    pub sender_url: String,
    pub body: String,
    pub created: chrono::NaiveDateTime,
}

impl MessageDisplay {
    pub fn is_from(&self, profile_id: Option<i32>) -> bool {
        profile_id == Some(self.sender_id)
    }
}

/// Messages newest first.
pub async fn messages<C>(db: &C, conversation_id: i32) -> Result<Vec<MessageDisplay>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = inbox_messages::Entity::find()
        .filter(inbox_messages::Column::ConversationId.eq(conversation_id))
        .order_by_desc(inbox_messages::Column::Created)
        .order_by_desc(inbox_messages::Column::Id)
        .all(db)
        .await?;

    let sender_ids: Vec<i32> = rows.iter().map(|m| m.sender_id).collect();
    let senders: HashMap<i32, profiles::Model> = if sender_ids.is_empty() {
        HashMap::new()
    } else {
        profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(sender_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    Ok(rows
        .into_iter()
        .map(|message| {
            let sender = senders.get(&message.sender_id);
            MessageDisplay {
                id: message.id,
                sender_id: message.sender_id,
                sender_name: sender.map(|p| p.display_name.clone()).unwrap_or_default(),
                sender_url: sender.map(|p| p.get_url()).unwrap_or_default(),
                body: message.body,
                created: message.created,
            }
        })
        .collect())
}

/// The open conversation with its participants and messages.
#[derive(Clone, Debug)]
pub struct ConversationDetail {
    pub conversation: conversations::Model,
    pub others: Vec<profiles::Model>,
    pub messages: Vec<MessageDisplay>,
}

impl ConversationDetail {
    pub fn title(&self) -> String {
        self.others
            .iter()
            .map(|p| p.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Loads a conversation for `viewer` and marks it seen. Non-participants
/// get `NotParticipant`.
pub async fn open<C>(db: &C, conversation_id: i32, viewer: i32) -> Result<ConversationDetail, ConversationError>
where
    C: ConnectionTrait,
{
    let conversation = conversations::Entity::find_by_id(conversation_id)
        .one(db)
        .await?
        .ok_or(ConversationError::NotFound)?;
    if !is_participant(db, conversation_id, viewer).await? {
        return Err(ConversationError::NotParticipant);
    }

    mark_seen(db, conversation_id, viewer).await?;
    let conversation = conversations::Entity::find_by_id(conversation_id)
        .one(db)
        .await?
        .unwrap_or(conversation);

    Ok(ConversationDetail {
        others: other_participants(db, conversation_id, viewer).await?,
        messages: messages(db, conversation_id).await?,
        conversation,
    })
}

/// Display names of every participant, keyed by conversation id.
pub async fn participant_names<C>(db: &C, conversation_ids: &[i32]) -> Result<HashMap<i32, Vec<String>>, DbErr>
where
    C: ConnectionTrait,
{
    if conversation_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = conversation_participants::Entity::find()
        .filter(conversation_participants::Column::ConversationId.is_in(conversation_ids.to_vec()))
        .find_also_related(profiles::Entity)
        .all(db)
        .await?;

    let mut names: HashMap<i32, Vec<String>> = HashMap::new();
    for (participant, profile) in rows {
        if let Some(profile) = profile {
            names
                .entry(participant.conversation_id)
                .or_default()
                .push(profile.display_name);
        }
    }
    for list in names.values_mut() {
        list.sort();
    }
    Ok(names)
}

/// Removes a conversation with its messages and participants.
pub async fn delete_conversation<C>(db: &C, conversation_id: i32) -> Result<bool, DbErr>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;
    inbox_messages::Entity::delete_many()
        .filter(inbox_messages::Column::ConversationId.eq(conversation_id))
        .exec(&txn)
        .await?;
    conversation_participants::Entity::delete_many()
        .filter(conversation_participants::Column::ConversationId.eq(conversation_id))
        .exec(&txn)
        .await?;
    let result = conversations::Entity::delete_by_id(conversation_id)
        .exec(&txn)
        .await?;
    txn.commit().await?;

    log::info!("Deleted conversation {}", conversation_id);
    Ok(result.rows_affected > 0)
}

/// Recipient search for a new message: display name contains `query`,
/// the searcher excluded.
pub async fn search_profiles<C>(
    db: &C,
    viewer: i32,
    query: &str,
    limit: u64,
) -> Result<Vec<profiles::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    profiles::Entity::find()
        .filter(crate::listing::icontains("profiles", "display_name", query))
        .filter(profiles::Column::Id.ne(viewer))
        .order_by_asc(profiles::Column::DisplayName)
        .limit(limit)
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(is_seen: bool) -> conversations::Model {
        conversations::Model {
            id: 1,
            lastmessage_created: chrono::Utc::now().naive_utc(),
            is_seen,
        }
    }

    fn message(sender_id: i32) -> inbox_messages::Model {
        inbox_messages::Model {
            id: 1,
            sender_id,
            conversation_id: 1,
            body: "hey".to_owned(),
            created: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_unseen_rules() {
        let from_two = message(2);
        assert!(unseen_by(&conversation(false), Some(&from_two), 1));
        assert!(!unseen_by(&conversation(false), Some(&from_two), 2));
        assert!(!unseen_by(&conversation(true), Some(&from_two), 1));
        assert!(!unseen_by(&conversation(false), None, 1));
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("abcdefghijk", 5), "abcde…");
    }

    #[test]
    fn test_validate_body() {
        assert!(validate_body("  ").is_err());
        assert_eq!(validate_body(" hi ").unwrap(), "hi");
    }
}
