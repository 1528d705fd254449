//! Two-party inbox: conversation list, detail, recipient search, message
//! and reply forms, and the unread indicators polled by htmx.

use super::db_error;
use crate::conversations::{self, ConversationDetail, ConversationError, ConversationPreview};
use crate::forms::FieldErrors;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::htmx::{self, require_htmx};
use crate::middleware::ClientCtx;
use crate::orm::profiles;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_inbox)
        .service(search_profiles)
        .service(view_create_message)
        .service(create_message)
        .service(view_create_reply)
        .service(create_reply)
        .service(notify_inbox)
        .service(notify_conversation)
        .service(view_conversation);
}

#[derive(Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search_profile: String,
}

#[derive(Template)]
#[template(path = "inbox/inbox.html")]
struct InboxTemplate {
    client: ClientCtx,
    conversations: Vec<ConversationPreview>,
    detail: Option<ConversationDetail>,
}

/// A recipient row in the search dropdown.
struct Recipient {
    display_name: String,
    slug: String,
    picture_url: Option<String>,
}

#[derive(Template)]
#[template(path = "inbox/search_results.html")]
struct SearchResultsTemplate {
    client: ClientCtx,
    recipients: Vec<Recipient>,
}

#[derive(Template)]
#[template(path = "inbox/create_message.html")]
struct CreateMessageTemplate {
    client: ClientCtx,
    recipient: profiles::Model,
    body: String,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "inbox/create_reply.html")]
struct CreateReplyTemplate {
    client: ClientCtx,
    conversation_id: i32,
    body: String,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "inbox/notify_icon.html")]
struct NotifyIconTemplate {
    client: ClientCtx,
    unseen: bool,
}

fn message_rate_limit(profile_id: i32) -> Result<(), Error> {
    crate::rate_limit::check_message_rate_limit(profile_id).map_err(|err| {
        error::ErrorTooManyRequests(format!(
            "You are sending messages too quickly. Please try again in {} seconds.",
            err.retry_after_seconds
        ))
    })
}

#[get("/inbox/")]
pub async fn view_inbox(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    let conversations = conversations::list_for(db.get_ref(), profile_id)
        .await
        .map_err(db_error)?;

    Ok(InboxTemplate {
        client,
        conversations,
        detail: None,
    }
    .to_response())
}

#[get("/inbox/{id}/")]
pub async fn view_conversation(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let profile_id = client.require_profile(&session)?.id;
    // Opening marks it seen, so the sidebar is loaded after.
    let detail = conversations::open(db.get_ref(), path.into_inner(), profile_id).await?;
    let conversations = conversations::list_for(db.get_ref(), profile_id)
        .await
        .map_err(db_error)?;

    Ok(InboxTemplate {
        client,
        conversations,
        detail: Some(detail),
    }
    .to_response())
}

#[get("/inbox/search-profiles/")]
pub async fn search_profiles(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;
    let profile_id = client.require_profile(&session)?.id;

    let limit = crate::app_config::limits().inbox_search_limit as u64;
    let recipients = conversations::search_profiles(db.get_ref(), profile_id, &query.search_profile, limit)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|profile| Recipient {
            picture_url: profile.profile_picture.as_deref().map(crate::storage::media_url),
            display_name: profile.display_name,
            slug: profile.slug,
        })
        .collect();

    Ok(SearchResultsTemplate { client, recipients }.to_response())
}

async fn recipient(db: &DatabaseConnection, slug: &str) -> Result<profiles::Model, Error> {
    crate::profiles::find_by_slug(db, slug)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Profile not found"))
}

#[get("/inbox/create-message/{slug}/")]
pub async fn view_create_message(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;
    client.require_profile(&session)?;

    Ok(CreateMessageTemplate {
        client,
        recipient: recipient(&db, &slug).await?,
        body: String::new(),
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/inbox/create-message/{slug}/")]
pub async fn create_message(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    slug: web::Path<String>,
    form: web::Form<MessageForm>,
) -> Result<impl Responder, Error> {
    let sender_id = client.require_profile(&session)?.id;
    validate_csrf_token(&session, &form.csrf_token)?;
    message_rate_limit(sender_id)?;

    let recipient = recipient(&db, &slug).await?;
    match conversations::message_profile(db.get_ref(), sender_id, recipient.id, &form.body).await {
        Ok(conversation_id) => Ok(htmx::redirect(&req, &format!("/inbox/{}/", conversation_id))),
        Err(ConversationError::Invalid(errors)) => Ok(CreateMessageTemplate {
            client,
            recipient,
            body: form.body.trim().to_owned(),
            errors,
        }
        .to_response()),
        Err(err) => Err(err.into()),
    }
}

/// 404 unless the viewer takes part in the conversation.
async fn require_participant(
    db: &DatabaseConnection,
    conversation_id: i32,
    profile_id: i32,
) -> Result<(), Error> {
    if conversations::is_participant(db, conversation_id, profile_id)
        .await
        .map_err(db_error)?
    {
        Ok(())
    } else {
        Err(ConversationError::NotParticipant.into())
    }
}

#[get("/inbox/create-reply/{id}/")]
pub async fn view_create_reply(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;
    let profile_id = client.require_profile(&session)?.id;
    let conversation_id = path.into_inner();
    require_participant(&db, conversation_id, profile_id).await?;

    Ok(CreateReplyTemplate {
        client,
        conversation_id,
        body: String::new(),
        errors: FieldErrors::new(),
    }
    .to_response())
}

#[post("/inbox/create-reply/{id}/")]
pub async fn create_reply(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<MessageForm>,
) -> Result<impl Responder, Error> {
    let sender_id = client.require_profile(&session)?.id;
    validate_csrf_token(&session, &form.csrf_token)?;
    message_rate_limit(sender_id)?;

    let conversation_id = path.into_inner();
    match conversations::send_message(db.get_ref(), conversation_id, sender_id, &form.body).await {
        Ok(_) => Ok(htmx::redirect(&req, &format!("/inbox/{}/", conversation_id))),
        Err(ConversationError::Invalid(errors)) => Ok(CreateReplyTemplate {
            client,
            conversation_id,
            body: form.body.trim().to_owned(),
            errors,
        }
        .to_response()),
        Err(err) => Err(err.into()),
    }
}

#[get("/inbox/notify/{id}/")]
pub async fn notify_conversation(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;
    let profile_id = client.require_profile(&session)?.id;
    let conversation_id = path.into_inner();
    require_participant(&db, conversation_id, profile_id).await?;

    let unseen = conversations::has_unseen(db.get_ref(), conversation_id, profile_id)
        .await
        .map_err(db_error)?;
    Ok(NotifyIconTemplate { client, unseen }.to_response())
}

#[get("/inbox/notify-inbox/")]
pub async fn notify_inbox(
    client: ClientCtx,
    session: Session,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_htmx(&req)?;
    let profile_id = client.require_profile(&session)?.id;

    let unseen = conversations::count_unseen(db.get_ref(), profile_id)
        .await
        .map_err(db_error)?
        > 0;
    Ok(NotifyIconTemplate { client, unseen }.to_response())
}
