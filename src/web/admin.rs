//! Staff screens
//!
//! Searchable, filterable lists over every table the site writes to, a
//! read-only report view, and delete actions. Deletes of profiles, ads and
//! open mics go through the same domain functions as the public pages so
//! bookmarks and reports are purged with them.
use super::db_error;
use crate::comments::{self, CommentParent};
use crate::content::{self, ContentKind};
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::orm::{
    advertisement_comments, advertisements, bookmarks, cities, conversation_participants,
    conversations, feedback, open_mic_comments, open_mics, profiles, reports,
};
use crate::session::{push_flash, FlashLevel};
use crate::taxonomy::{self, Choices, Facet};
use crate::template::{Paginator, PaginatorToHtml};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*, Condition, DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::Deserialize;
use std::collections::HashMap;

const ADMIN_PAGE_SIZE: u64 = 50;
const FACET_COLUMNS: &[&str] = &["Name"];
const CITY_COLUMNS: &[&str] = &["Name", "Region", "Country"];

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(view_profiles)
        .service(delete_profile)
        .service(view_ads)
        .service(delete_ad)
        .service(view_openmics)
        .service(delete_openmic)
        .service(view_comments)
        .service(delete_comment)
        .service(view_bookmarks)
        .service(delete_bookmark)
        .service(view_reports)
        .service(view_report)
        .service(delete_report)
        .service(view_conversations)
        .service(delete_conversation)
        .service(view_feedback)
        .service(delete_feedback)
        .service(view_taxonomy)
        .service(add_taxonomy);
}

#[derive(Deserialize, Default)]
struct AdminQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    filter: String,
    page: Option<String>,
}

impl AdminQuery {
    fn page(&self) -> Result<u64, Error> {
        crate::listing::parse_page(self.page.as_deref())
            .ok_or_else(|| error::ErrorNotFound("Invalid page."))
    }

    fn search(&self) -> &str {
        self.q.trim()
    }

    fn filter_id(&self) -> Option<i32> {
        self.filter.parse().ok()
    }

    /// List URL without the page, ready for `page=N`.
    fn base_url(&self, section: &str) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if !self.search().is_empty() {
            query.append_pair("q", self.search());
        }
        if !self.filter.is_empty() {
            query.append_pair("filter", &self.filter);
        }
        let query = query.finish();
        if query.is_empty() {
            format!("/admin/{}/?", section)
        } else {
            format!("/admin/{}/?{}&", section, query)
        }
    }
}

#[derive(Deserialize)]
struct CsrfForm {
    #[serde(default)]
    csrf_token: String,
}

struct AdminRow {
    id: i32,
    cells: Vec<String>,
    url: Option<String>,
    delete_url: Option<String>,
}

struct FilterOption {
    value: String,
    label: String,
    selected: bool,
}

struct AdminFilter {
    label: &'static str,
    options: Vec<FilterOption>,
}

impl AdminFilter {
    fn new(label: &'static str, current: &str, options: Vec<(String, String)>) -> Self {
        Self {
            label,
            options: options
                .into_iter()
                .map(|(value, label)| FilterOption {
                    selected: value == current,
                    value,
                    label,
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    client: ClientCtx,
    counts: Vec<(&'static str, &'static str, usize)>,
}

#[derive(Template)]
#[template(path = "admin/list.html")]
struct AdminListTemplate {
    client: ClientCtx,
    title: &'static str,
    section: &'static str,
    q: String,
    columns: &'static [&'static str],
    rows: Vec<AdminRow>,
    filter: Option<AdminFilter>,
    total: u64,
    paginator: Paginator,
    /// Shows the add form on the taxonomy screen.
    can_add: bool,
}

#[derive(Template)]
#[template(path = "admin/report.html")]
struct ReportTemplate {
    client: ClientCtx,
    report: reports::Model,
    reporter: Option<profiles::Model>,
    target: Option<content::ContentTarget>,
}

/// One page of `select`, plus the paginator for it.
async fn admin_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    query: &AdminQuery,
    section: &str,
) -> Result<(crate::listing::Page<E::Model>, Paginator), Error>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let page = crate::listing::fetch_page(db, select, query.page()?, ADMIN_PAGE_SIZE)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Invalid page."))?;
    let paginator = Paginator {
        base_url: query.base_url(section),
        this_page: page.number,
        page_count: page.num_pages,
    };
    Ok((page, paginator))
}

async fn profile_names(db: &DatabaseConnection, ids: Vec<i32>) -> Result<HashMap<i32, String>, Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(profiles::Entity::find()
        .filter(profiles::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|p| (p.id, p.display_name))
        .collect())
}

fn deleted(session: &Session, what: &str, section: &str) -> impl Responder {
    push_flash(session, FlashLevel::Success, format!("Deleted {}.", what));
    super::redirect(&format!("/admin/{}/", section))
}

#[get("/admin/")]
async fn view_dashboard(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    let choices = super::load_choices(&db).await?;
    let taxonomy_count = choices.ad_types.len()
        + choices.profile_types.len()
        + choices.genres.len()
        + choices.skills.len()
        + choices.cities.len();
    let db = db.get_ref();

    let counts = vec![
        ("profiles", "Profiles", profiles::Entity::find().count(db).await.map_err(db_error)?),
        ("ads", "Ads", advertisements::Entity::find().count(db).await.map_err(db_error)?),
        ("openmics", "Open mics", open_mics::Entity::find().count(db).await.map_err(db_error)?),
        (
            "comments",
            "Comments",
            advertisement_comments::Entity::find().count(db).await.map_err(db_error)?
                + open_mic_comments::Entity::find().count(db).await.map_err(db_error)?,
        ),
        ("bookmarks", "Bookmarks", bookmarks::Entity::find().count(db).await.map_err(db_error)?),
        ("reports", "Reports", reports::Entity::find().count(db).await.map_err(db_error)?),
        (
            "conversations",
            "Conversations",
            conversations::Entity::find().count(db).await.map_err(db_error)?,
        ),
        ("feedback", "Feedback", feedback::Entity::find().count(db).await.map_err(db_error)?),
        ("taxonomy", "Taxonomy", taxonomy_count),
    ];

    Ok(DashboardTemplate { client, counts }.to_response())
}

#[get("/admin/profiles/")]
async fn view_profiles(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    let choices = super::load_choices(&db).await?;

    let mut select = profiles::Entity::find()
        .order_by_desc(profiles::Column::Created)
        .order_by_desc(profiles::Column::Id);
    if !query.search().is_empty() {
        select = select.filter(
            Condition::any()
                .add(profiles::Column::DisplayName.contains(query.search()))
                .add(profiles::Column::Slug.contains(query.search())),
        );
    }
    if let Some(type_id) = query.filter_id() {
        select = select.filter(profiles::Column::ProfileTypeId.eq(type_id));
    }

    let (page, paginator) = admin_page(&db, select, &query, "profiles").await?;
    let rows = page
        .items
        .into_iter()
        .map(|profile| AdminRow {
            id: profile.id,
            url: Some(profile.get_url()),
            delete_url: Some(format!("/admin/profiles/{}/delete/", profile.id)),
            cells: vec![
                profile.display_name.clone(),
                profile.slug.clone(),
                choices.profile_type_name(profile.profile_type_id),
                choices.city_label(profile.city_id),
                client.format_datetime(&profile.created),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: Some(AdminFilter::new(
            "Profile type",
            &query.filter,
            choices
                .profile_types
                .iter()
                .map(|t| (t.id.to_string(), t.name.clone()))
                .collect(),
        )),
        client,
        title: "Profiles",
        section: "profiles",
        q: query.q.clone(),
        columns: &["Display name", "Slug", "Type", "Location", "Created"],
        rows,
        total: page.total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[post("/admin/profiles/{id}/delete/")]
async fn delete_profile(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    if !crate::profiles::delete_profile(db.get_ref(), path.into_inner())
        .await
        .map_err(db_error)?
    {
        return Err(error::ErrorNotFound("Profile not found"));
    }
    Ok(deleted(&session, "profile", "profiles"))
}

#[get("/admin/ads/")]
async fn view_ads(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    let choices = super::load_choices(&db).await?;

    let mut select = advertisements::Entity::find()
        .order_by_desc(advertisements::Column::LastUpdated)
        .order_by_desc(advertisements::Column::Id);
    if !query.search().is_empty() {
        select = select.filter(
            Condition::any()
                .add(advertisements::Column::Title.contains(query.search()))
                .add(advertisements::Column::Description.contains(query.search())),
        );
    }
    if let Some(type_id) = query.filter_id() {
        select = select.filter(advertisements::Column::AdTypeId.eq(type_id));
    }

    let (page, paginator) = admin_page(&db, select, &query, "ads").await?;
    let authors = profile_names(&db, page.items.iter().map(|ad| ad.author_id).collect()).await?;
    let rows = page
        .items
        .into_iter()
        .map(|ad| AdminRow {
            id: ad.id,
            url: Some(format!("/ads/{}/", ad.id)),
            delete_url: Some(format!("/admin/ads/{}/delete/", ad.id)),
            cells: vec![
                ad.title.clone(),
                choices.ad_type_name(ad.ad_type_id),
                authors.get(&ad.author_id).cloned().unwrap_or_default(),
                choices.city_label(ad.city_id),
                client.format_datetime(&ad.last_updated),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: Some(AdminFilter::new(
            "Ad type",
            &query.filter,
            choices
                .ad_types
                .iter()
                .map(|t| (t.id.to_string(), t.name.clone()))
                .collect(),
        )),
        client,
        title: "Ads",
        section: "ads",
        q: query.q.clone(),
        columns: &["Title", "Type", "Author", "Location", "Last updated"],
        rows,
        total: page.total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[post("/admin/ads/{id}/delete/")]
async fn delete_ad(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    crate::advertisements::delete_advertisement(db.get_ref(), path.into_inner(), None).await?;
    Ok(deleted(&session, "ad", "ads"))
}

fn city_filter(choices: &Choices, current: &str) -> AdminFilter {
    AdminFilter::new(
        "Location",
        current,
        choices
            .cities
            .iter()
            .map(|c| (c.id.to_string(), c.label()))
            .collect(),
    )
}

#[get("/admin/openmics/")]
async fn view_openmics(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    let choices = super::load_choices(&db).await?;

    let mut select = open_mics::Entity::find()
        .order_by_desc(open_mics::Column::EventDate)
        .order_by_desc(open_mics::Column::Id);
    if !query.search().is_empty() {
        select = select.filter(
            Condition::any()
                .add(open_mics::Column::Title.contains(query.search()))
                .add(open_mics::Column::Address.contains(query.search())),
        );
    }
    if let Some(city_id) = query.filter_id() {
        select = select.filter(open_mics::Column::CityId.eq(city_id));
    }

    let (page, paginator) = admin_page(&db, select, &query, "openmics").await?;
    let authors = profile_names(&db, page.items.iter().map(|o| o.author_id).collect()).await?;
    let rows = page
        .items
        .into_iter()
        .map(|openmic| AdminRow {
            id: openmic.id,
            url: Some(format!("/openmics/{}/", openmic.id)),
            delete_url: Some(format!("/admin/openmics/{}/delete/", openmic.id)),
            cells: vec![
                openmic.title.clone(),
                choices.city_label(openmic.city_id),
                format!(
                    "{} {}-{}",
                    openmic.event_date.format("%b %-d, %Y"),
                    openmic.start_time.format("%-I:%M %p"),
                    openmic.end_time.format("%-I:%M %p")
                ),
                authors.get(&openmic.author_id).cloned().unwrap_or_default(),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: Some(city_filter(&choices, &query.filter)),
        client,
        title: "Open mics",
        section: "openmics",
        q: query.q.clone(),
        columns: &["Title", "Location", "When", "Author"],
        rows,
        total: page.total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[post("/admin/openmics/{id}/delete/")]
async fn delete_openmic(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    crate::openmics::delete_openmic(db.get_ref(), path.into_inner(), None).await?;
    Ok(deleted(&session, "open mic", "openmics"))
}

fn comment_parent(value: &str) -> Result<CommentParent, Error> {
    match value {
        "" | "ads" => Ok(CommentParent::Advertisement),
        "openmics" => Ok(CommentParent::OpenMic),
        _ => Err(error::ErrorNotFound("Unknown comment type.")),
    }
}

fn comment_parent_slug(parent: CommentParent) -> &'static str {
    match parent {
        CommentParent::Advertisement => "ads",
        CommentParent::OpenMic => "openmics",
    }
}

/// Comments on one parent type; `filter` picks ads (default) or open mics.
#[get("/admin/comments/")]
async fn view_comments(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    let parent = comment_parent(&query.filter)?;
    let slug = comment_parent_slug(parent);

    // (id, author, parent id, body, created)
    let (items, total, paginator): (Vec<(i32, Option<i32>, i32, String, chrono::NaiveDateTime)>, u64, Paginator) =
        match parent {
            CommentParent::Advertisement => {
                let mut select = advertisement_comments::Entity::find()
                    .order_by_desc(advertisement_comments::Column::Created)
                    .order_by_desc(advertisement_comments::Column::Id);
                if !query.search().is_empty() {
                    select = select.filter(advertisement_comments::Column::Body.contains(query.search()));
                }
                let (page, paginator) = admin_page(&db, select, &query, "comments").await?;
                let items = page
                    .items
                    .into_iter()
                    .map(|c| (c.id, c.author_id, c.advertisement_id, c.body, c.created))
                    .collect();
                (items, page.total, paginator)
            }
            CommentParent::OpenMic => {
                let mut select = open_mic_comments::Entity::find()
                    .order_by_desc(open_mic_comments::Column::Created)
                    .order_by_desc(open_mic_comments::Column::Id);
                if !query.search().is_empty() {
                    select = select.filter(open_mic_comments::Column::Body.contains(query.search()));
                }
                let (page, paginator) = admin_page(&db, select, &query, "comments").await?;
                let items = page
                    .items
                    .into_iter()
                    .map(|c| (c.id, c.author_id, c.open_mic_id, c.body, c.created))
                    .collect();
                (items, page.total, paginator)
            }
        };

    let authors = profile_names(&db, items.iter().filter_map(|row| row.1).collect()).await?;
    let rows = items
        .into_iter()
        .map(|(id, author_id, parent_id, body, created)| AdminRow {
            id,
            url: Some(format!("/{}/{}/", slug, parent_id)),
            delete_url: Some(format!("/admin/comments/{}/{}/delete/", slug, id)),
            cells: vec![
                author_id
                    .and_then(|author_id| authors.get(&author_id).cloned())
                    .unwrap_or_else(|| "(deleted)".to_owned()),
                body,
                client.format_datetime(&created),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: Some(AdminFilter::new(
            "On",
            slug,
            vec![
                ("ads".to_owned(), "Ads".to_owned()),
                ("openmics".to_owned(), "Open mics".to_owned()),
            ],
        )),
        client,
        title: "Comments",
        section: "comments",
        q: query.q.clone(),
        columns: &["Author", "Comment", "Created"],
        rows,
        total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[post("/admin/comments/{parent}/{id}/delete/")]
async fn delete_comment(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, i32)>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    let (parent, comment_id) = path.into_inner();
    let parent = comment_parent(&parent)?;
    if !comments::remove_comment(db.get_ref(), parent, comment_id)
        .await
        .map_err(db_error)?
    {
        return Err(error::ErrorNotFound("Comment not found"));
    }
    Ok(deleted(&session, "comment", "comments"))
}

fn kind_filter(current: &str) -> AdminFilter {
    AdminFilter::new(
        "Type",
        current,
        ContentKind::ALL
            .iter()
            .map(|kind| (kind.model_name().to_owned(), kind.verbose_name().to_owned()))
            .collect(),
    )
}

#[get("/admin/bookmarks/")]
async fn view_bookmarks(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let mut select = bookmarks::Entity::find()
        .order_by_desc(bookmarks::Column::Created)
        .order_by_desc(bookmarks::Column::Id);
    if let Some(kind) = ContentKind::from_model_name(&query.filter) {
        select = select.filter(bookmarks::Column::ContentType.eq(kind.model_name()));
    }
    if !query.search().is_empty() {
        let owners: Vec<i32> = profiles::Entity::find()
            .filter(profiles::Column::DisplayName.contains(query.search()))
            .all(db.get_ref())
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|p| p.id)
            .collect();
        select = select.filter(bookmarks::Column::ProfileId.is_in(owners));
    }

    let (page, paginator) = admin_page(&db, select, &query, "bookmarks").await?;
    let owners = profile_names(&db, page.items.iter().map(|b| b.profile_id).collect()).await?;
    let rows = page
        .items
        .into_iter()
        .map(|bookmark| AdminRow {
            id: bookmark.id,
            url: None,
            delete_url: Some(format!("/admin/bookmarks/{}/delete/", bookmark.id)),
            cells: vec![
                owners.get(&bookmark.profile_id).cloned().unwrap_or_default(),
                ContentKind::from_model_name(&bookmark.content_type)
                    .map(|kind| kind.verbose_name().to_owned())
                    .unwrap_or(bookmark.content_type),
                bookmark.object_id.to_string(),
                client.format_datetime(&bookmark.created),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: Some(kind_filter(&query.filter)),
        client,
        title: "Bookmarks",
        section: "bookmarks",
        q: query.q.clone(),
        columns: &["Profile", "Type", "Object id", "Created"],
        rows,
        total: page.total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[post("/admin/bookmarks/{id}/delete/")]
async fn delete_bookmark(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    let result = bookmarks::Entity::delete_by_id(path.into_inner())
        .exec(db.get_ref())
        .await
        .map_err(db_error)?;
    if result.rows_affected == 0 {
        return Err(error::ErrorNotFound("Bookmark not found"));
    }
    Ok(deleted(&session, "bookmark", "bookmarks"))
}

#[get("/admin/reports/")]
async fn view_reports(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let mut select = reports::Entity::find()
        .order_by_desc(reports::Column::Created)
        .order_by_desc(reports::Column::Id);
    if let Some(kind) = ContentKind::from_model_name(&query.filter) {
        select = select.filter(reports::Column::ObjectType.eq(kind.model_name()));
    }
    if !query.search().is_empty() {
        select = select.filter(
            Condition::any()
                .add(reports::Column::Description.contains(query.search()))
                .add(reports::Column::ObjectTitle.contains(query.search())),
        );
    }

    let (page, paginator) = admin_page(&db, select, &query, "reports").await?;
    let reporters = profile_names(&db, page.items.iter().map(|r| r.profile_id).collect()).await?;
    let rows = page
        .items
        .into_iter()
        .map(|report| AdminRow {
            id: report.id,
            url: Some(format!("/admin/reports/{}/", report.id)),
            delete_url: Some(format!("/admin/reports/{}/delete/", report.id)),
            cells: vec![
                reporters.get(&report.profile_id).cloned().unwrap_or_default(),
                ContentKind::from_model_name(&report.object_type)
                    .map(|kind| kind.verbose_name().to_owned())
                    .unwrap_or_else(|| report.object_type.clone()),
                report.object_title.clone(),
                client.format_datetime(&report.created),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: Some(kind_filter(&query.filter)),
        client,
        title: "Reports",
        section: "reports",
        q: query.q.clone(),
        columns: &["Reporter", "Type", "Object", "Created"],
        rows,
        total: page.total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[get("/admin/reports/{id}/")]
async fn view_report(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let report = reports::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Report not found"))?;
    let reporter = profiles::Entity::find_by_id(report.profile_id)
        .one(db.get_ref())
        .await
        .map_err(db_error)?;
    let target = match ContentKind::from_model_name(&report.content_type) {
        Some(kind) => content::resolve(db.get_ref(), kind, report.object_id)
            .await
            .map_err(db_error)?,
        None => None,
    };

    Ok(ReportTemplate {
        client,
        report,
        reporter,
        target,
    }
    .to_response())
}

#[post("/admin/reports/{id}/delete/")]
async fn delete_report(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    let result = reports::Entity::delete_by_id(path.into_inner())
        .exec(db.get_ref())
        .await
        .map_err(db_error)?;
    if result.rows_affected == 0 {
        return Err(error::ErrorNotFound("Report not found"));
    }
    Ok(deleted(&session, "report", "reports"))
}

/// `filter` is `seen` or `unseen`; `q` matches a participant's name.
#[get("/admin/conversations/")]
async fn view_conversations(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let mut select = conversations::Entity::find()
        .order_by_desc(conversations::Column::LastmessageCreated)
        .order_by_desc(conversations::Column::Id);
    match query.filter.as_str() {
        "seen" => select = select.filter(conversations::Column::IsSeen.eq(true)),
        "unseen" => select = select.filter(conversations::Column::IsSeen.eq(false)),
        _ => {}
    }
    if !query.search().is_empty() {
        let members: Vec<i32> = profiles::Entity::find()
            .filter(profiles::Column::DisplayName.contains(query.search()))
            .all(db.get_ref())
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let ids: Vec<i32> = conversation_participants::Entity::find()
            .filter(conversation_participants::Column::ProfileId.is_in(members))
            .all(db.get_ref())
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|p| p.conversation_id)
            .collect();
        select = select.filter(conversations::Column::Id.is_in(ids));
    }

    let (page, paginator) = admin_page(&db, select, &query, "conversations").await?;
    let ids: Vec<i32> = page.items.iter().map(|c| c.id).collect();
    let names = crate::conversations::participant_names(db.get_ref(), &ids)
        .await
        .map_err(db_error)?;
    let rows = page
        .items
        .into_iter()
        .map(|conversation| AdminRow {
            id: conversation.id,
            url: None,
            delete_url: Some(format!("/admin/conversations/{}/delete/", conversation.id)),
            cells: vec![
                names
                    .get(&conversation.id)
                    .map(|names| names.join(", "))
                    .unwrap_or_default(),
                client.format_datetime(&conversation.lastmessage_created),
                if conversation.is_seen { "Seen" } else { "Unseen" }.to_owned(),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: Some(AdminFilter::new(
            "Status",
            &query.filter,
            vec![
                ("seen".to_owned(), "Seen".to_owned()),
                ("unseen".to_owned(), "Unseen".to_owned()),
            ],
        )),
        client,
        title: "Conversations",
        section: "conversations",
        q: query.q.clone(),
        columns: &["Participants", "Last message", "Status"],
        rows,
        total: page.total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[post("/admin/conversations/{id}/delete/")]
async fn delete_conversation(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    if !crate::conversations::delete_conversation(db.get_ref(), path.into_inner())
        .await
        .map_err(db_error)?
    {
        return Err(error::ErrorNotFound("Conversation not found"));
    }
    Ok(deleted(&session, "conversation", "conversations"))
}

#[get("/admin/feedback/")]
async fn view_feedback(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let mut select = feedback::Entity::find()
        .order_by_desc(feedback::Column::Created)
        .order_by_desc(feedback::Column::Id);
    if !query.search().is_empty() {
        select = select.filter(
            Condition::any()
                .add(feedback::Column::Email.contains(query.search()))
                .add(feedback::Column::Subject.contains(query.search()))
                .add(feedback::Column::Message.contains(query.search())),
        );
    }

    let (page, paginator) = admin_page(&db, select, &query, "feedback").await?;
    let rows = page
        .items
        .into_iter()
        .map(|item| AdminRow {
            id: item.id,
            url: None,
            delete_url: Some(format!("/admin/feedback/{}/delete/", item.id)),
            cells: vec![
                item.email,
                item.subject,
                item.message,
                client.format_datetime(&item.created),
            ],
        })
        .collect();

    Ok(AdminListTemplate {
        filter: None,
        client,
        title: "Feedback",
        section: "feedback",
        q: query.q.clone(),
        columns: &["Email", "Subject", "Message", "Created"],
        rows,
        total: page.total,
        paginator,
        can_add: false,
    }
    .to_response())
}

#[post("/admin/feedback/{id}/delete/")]
async fn delete_feedback(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<CsrfForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    let result = feedback::Entity::delete_by_id(path.into_inner())
        .exec(db.get_ref())
        .await
        .map_err(db_error)?;
    if result.rows_affected == 0 {
        return Err(error::ErrorNotFound("Feedback not found"));
    }
    Ok(deleted(&session, "feedback", "feedback"))
}

/// Reference tables; `filter` picks the table and defaults to genres.
#[get("/admin/taxonomy/")]
async fn view_taxonomy(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<AdminQuery>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let table = if query.filter.is_empty() {
        Facet::Genre.slug()
    } else {
        query.filter.as_str()
    };

    let (columns, rows): (&'static [&'static str], Vec<AdminRow>) = match Facet::from_slug(table) {
        Some(facet) => {
            let rows = taxonomy::facet_rows(db.get_ref(), facet, query.search())
                .await
                .map_err(db_error)?
                .into_iter()
                .map(|(id, name)| AdminRow {
                    id,
                    url: None,
                    delete_url: None,
                    cells: vec![name],
                })
                .collect();
            (FACET_COLUMNS, rows)
        }
        None if table == "cities" => {
            let rows = cities::Entity::find()
                .filter(cities::Column::Name.contains(query.search()))
                .order_by_asc(cities::Column::Name)
                .all(db.get_ref())
                .await
                .map_err(db_error)?
                .into_iter()
                .map(|city| AdminRow {
                    id: city.id,
                    url: None,
                    delete_url: None,
                    cells: vec![city.name, city.region, city.country],
                })
                .collect();
            (CITY_COLUMNS, rows)
        }
        None => return Err(error::ErrorNotFound("Unknown table.")),
    };

    let mut tables: Vec<(String, String)> = Facet::ALL
        .iter()
        .map(|facet| (facet.slug().to_owned(), facet.label().to_owned()))
        .collect();
    tables.push(("cities".to_owned(), "Cities".to_owned()));

    Ok(AdminListTemplate {
        filter: Some(AdminFilter::new("Table", table, tables)),
        paginator: Paginator {
            base_url: query.base_url("taxonomy"),
            this_page: 1,
            page_count: 1,
        },
        total: rows.len() as u64,
        client,
        title: "Taxonomy",
        section: "taxonomy",
        q: query.q.clone(),
        columns,
        rows,
        can_add: true,
    }
    .to_response())
}

#[derive(Deserialize)]
struct TaxonomyForm {
    #[serde(default)]
    csrf_token: String,
    table: String,
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
}

#[post("/admin/taxonomy/add/")]
async fn add_taxonomy(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<TaxonomyForm>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;
    validate_csrf_token(&session, &form.csrf_token)?;

    let added = match Facet::from_slug(&form.table) {
        Some(facet) => taxonomy::add_facet(db.get_ref(), facet, &form.name).await,
        None if form.table == "cities" => {
            taxonomy::add_city(db.get_ref(), &form.name, &form.region, &form.country).await
        }
        None => return Err(error::ErrorNotFound("Unknown table.")),
    }
    .map_err(db_error)?;

    if added {
        push_flash(&session, FlashLevel::Success, format!("Added {}.", form.name.trim()));
    } else {
        push_flash(&session, FlashLevel::Info, "Nothing added: the entry is blank or already exists.");
    }
    Ok(super::redirect(&format!("/admin/taxonomy/?filter={}", form.table)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_search_and_filter() {
        let query = AdminQuery {
            q: " rock & roll ".to_owned(),
            filter: "2".to_owned(),
            page: Some("3".to_owned()),
        };
        assert_eq!(query.base_url("ads"), "/admin/ads/?q=rock+%26+roll&filter=2&");
        assert_eq!(AdminQuery::default().base_url("ads"), "/admin/ads/?");
    }

    #[test]
    fn test_comment_parent() {
        assert_eq!(comment_parent("").ok(), Some(CommentParent::Advertisement));
        assert_eq!(comment_parent("openmics").ok(), Some(CommentParent::OpenMic));
        assert!(comment_parent("profiles").is_err());
    }
}
