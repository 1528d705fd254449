//! Filtering and pagination shared by the ad, open mic, and profile lists.
//!
//! Each list renders page 1 in full and later pages as fragments. The filter
//! is re-parsed from the query string on every fetch, so `to_query` must
//! round-trip everything `from_fields` reads.

use crate::forms::FormFields;
use crate::orm::{
    advertisement_genres, advertisement_skills, advertisements, open_mic_genres, open_mics,
    profile_genres, profile_skills, profiles, users,
};
use sea_orm::sea_query::{Condition, Expr, Query};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Select,
};

/// One page of a listing.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn next_number(&self) -> u64 {
        self.number + 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Swaps the items for a display form, keeping the counters.
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

/// Reads `?page=`; missing means 1. Zero or garbage is rejected.
pub fn parse_page(raw: Option<&str>) -> Option<u64> {
    match raw {
        None => Some(1),
        Some(raw) if raw.trim().is_empty() => Some(1),
        Some(raw) => raw.trim().parse::<u64>().ok().filter(|n| *n >= 1),
    }
}

/// Fetches page `number`; `None` when it lies past the last page.
/// Page 1 of an empty result is an empty page, not `None`.
pub async fn fetch_page<'db, C, E>(
    db: &'db C,
    select: Select<E>,
    number: u64,
    page_size: u64,
) -> Result<Option<Page<E::Model>>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(db, page_size.max(1) as usize);
    let total = paginator.num_items().await? as u64;
    let num_pages = paginator.num_pages().await? as u64;

    if number > num_pages.max(1) {
        return Ok(None);
    }

    let items = paginator.fetch_page((number - 1) as usize).await?;
    Ok(Some(Page {
        items,
        number,
        num_pages,
        total,
    }))
}

/// Escape character for LIKE patterns built from user input.
const LIKE_ESCAPE: char = '!';

/// Makes `%`, `_` and the escape character match literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn lower_like(table: &str, column: &str, pattern: String) -> sea_orm::sea_query::SimpleExpr {
    Expr::cust_with_values(
        &format!(
            "LOWER(\"{}\".\"{}\") LIKE ? ESCAPE '{}'",
            table, column, LIKE_ESCAPE
        ),
        vec![pattern],
    )
}

/// Case-insensitive substring match on `table.column`.
pub fn icontains(table: &str, column: &str, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    lower_like(table, column, format!("%{}%", escape_like(&needle.to_lowercase())))
}

/// Case-insensitive prefix match on `table.column`.
pub fn istartswith(table: &str, column: &str, prefix: &str) -> sea_orm::sea_query::SimpleExpr {
    lower_like(table, column, format!("{}%", escape_like(&prefix.to_lowercase())))
}

fn query_string(pairs: Vec<(&str, String)>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

const AD_FILTER_KEYS: [&str; 5] = ["title", "ad_type", "location", "genres", "skills"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdvertisementFilter {
    pub title: String,
    pub ad_types: Vec<i32>,
    pub location: Option<i32>,
    pub genres: Vec<i32>,
    pub skills: Vec<i32>,
    /// Any filter key was present in the request, even with an empty value.
    pub has_filter: bool,
}

impl AdvertisementFilter {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            title: fields.text("title"),
            ad_types: fields.ids("ad_type"),
            location: fields.id("location"),
            genres: fields.ids("genres"),
            skills: fields.ids("skills"),
            has_filter: AD_FILTER_KEYS.iter().any(|key| fields.get(key).is_some()),
        }
    }

    pub fn has_ad_type(&self, id: &i32) -> bool {
        self.ad_types.contains(id)
    }

    pub fn has_genre(&self, id: &i32) -> bool {
        self.genres.contains(id)
    }

    pub fn has_skill(&self, id: &i32) -> bool {
        self.skills.contains(id)
    }

    pub fn has_location(&self, id: &i32) -> bool {
        self.location == Some(*id)
    }

    /// Query string without `page`, ready for `&page=N` to be appended.
    pub fn to_query(&self) -> String {
        let mut pairs = Vec::new();
        if !self.title.is_empty() {
            pairs.push(("title", self.title.clone()));
        }
        for id in &self.ad_types {
            pairs.push(("ad_type", id.to_string()));
        }
        if let Some(id) = self.location {
            pairs.push(("location", id.to_string()));
        }
        for id in &self.genres {
            pairs.push(("genres", id.to_string()));
        }
        for id in &self.skills {
            pairs.push(("skills", id.to_string()));
        }
        query_string(pairs)
    }

    /// Newest-updated first. Multi-select facets match any selected value.
    pub fn select(&self) -> Select<advertisements::Entity> {
        let mut select = advertisements::Entity::find();

        if !self.title.is_empty() {
            select = select.filter(icontains("advertisements", "title", &self.title));
        }
        if !self.ad_types.is_empty() {
            select = select.filter(advertisements::Column::AdTypeId.is_in(self.ad_types.clone()));
        }
        if let Some(city) = self.location {
            select = select.filter(advertisements::Column::CityId.eq(city));
        }
        if !self.genres.is_empty() {
            select = select.filter(
                advertisements::Column::Id.in_subquery(
                    Query::select()
                        .column(advertisement_genres::Column::AdvertisementId)
                        .from(advertisement_genres::Entity)
                        .and_where(advertisement_genres::Column::GenreId.is_in(self.genres.clone()))
                        .to_owned(),
                ),
            );
        }
        if !self.skills.is_empty() {
            select = select.filter(
                advertisements::Column::Id.in_subquery(
                    Query::select()
                        .column(advertisement_skills::Column::AdvertisementId)
                        .from(advertisement_skills::Entity)
                        .and_where(advertisement_skills::Column::SkillId.is_in(self.skills.clone()))
                        .to_owned(),
                ),
            );
        }

        select
            .order_by_desc(advertisements::Column::LastUpdated)
            .order_by_desc(advertisements::Column::Id)
    }
}

const OPENMIC_FILTER_KEYS: [&str; 3] = ["title", "location", "genres"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpenMicFilter {
    pub title: String,
    pub location: Option<i32>,
    pub genres: Vec<i32>,
    pub has_filter: bool,
}

impl OpenMicFilter {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            title: fields.text("title"),
            location: fields.id("location"),
            genres: fields.ids("genres"),
            has_filter: OPENMIC_FILTER_KEYS
                .iter()
                .any(|key| fields.get(key).is_some()),
        }
    }

    pub fn has_genre(&self, id: &i32) -> bool {
        self.genres.contains(id)
    }

    pub fn has_location(&self, id: &i32) -> bool {
        self.location == Some(*id)
    }

    pub fn to_query(&self) -> String {
        let mut pairs = Vec::new();
        if !self.title.is_empty() {
            pairs.push(("title", self.title.clone()));
        }
        if let Some(id) = self.location {
            pairs.push(("location", id.to_string()));
        }
        for id in &self.genres {
            pairs.push(("genres", id.to_string()));
        }
        query_string(pairs)
    }

    pub fn select(&self) -> Select<open_mics::Entity> {
        let mut select = open_mics::Entity::find();

        if !self.title.is_empty() {
            select = select.filter(icontains("open_mics", "title", &self.title));
        }
        if let Some(city) = self.location {
            select = select.filter(open_mics::Column::CityId.eq(city));
        }
        if !self.genres.is_empty() {
            select = select.filter(
                open_mics::Column::Id.in_subquery(
                    Query::select()
                        .column(open_mic_genres::Column::OpenMicId)
                        .from(open_mic_genres::Entity)
                        .and_where(open_mic_genres::Column::GenreId.is_in(self.genres.clone()))
                        .to_owned(),
                ),
            );
        }

        select
            .order_by_desc(open_mics::Column::LastUpdated)
            .order_by_desc(open_mics::Column::Id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileOrder {
    Created,
    LastLogin,
}

impl ProfileOrder {
    pub fn value(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::LastLogin => "last_login",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "Created Date",
            Self::LastLogin => "Last Login Date",
        }
    }
}

const PROFILE_FILTER_KEYS: [&str; 8] = [
    "display_name",
    "profile_type",
    "location",
    "genres",
    "skills",
    "has_youtube_video",
    "has_profile_picture",
    "order_by",
];

#[derive(Clone, Debug, PartialEq)]
pub struct ProfileFilter {
    pub display_name: String,
    pub profile_types: Vec<i32>,
    pub location: Option<i32>,
    pub genres: Vec<i32>,
    pub skills: Vec<i32>,
    pub has_youtube_video: bool,
    pub has_profile_picture: bool,
    pub order_by: ProfileOrder,
    pub has_filter: bool,
}

impl Default for ProfileFilter {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            profile_types: Vec::new(),
            location: None,
            genres: Vec::new(),
            skills: Vec::new(),
            has_youtube_video: false,
            has_profile_picture: false,
            order_by: ProfileOrder::Created,
            has_filter: false,
        }
    }
}

impl ProfileFilter {
    pub const ORDERS: [ProfileOrder; 2] = [ProfileOrder::Created, ProfileOrder::LastLogin];

    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            display_name: fields.text("display_name"),
            profile_types: fields.ids("profile_type"),
            location: fields.id("location"),
            genres: fields.ids("genres"),
            skills: fields.ids("skills"),
            has_youtube_video: fields.flag("has_youtube_video"),
            has_profile_picture: fields.flag("has_profile_picture"),
            order_by: match fields.get("order_by") {
                Some("last_login") => ProfileOrder::LastLogin,
                _ => ProfileOrder::Created,
            },
            has_filter: PROFILE_FILTER_KEYS
                .iter()
                .any(|key| fields.get(key).is_some()),
        }
    }

    pub fn has_profile_type(&self, id: &i32) -> bool {
        self.profile_types.contains(id)
    }

    pub fn has_genre(&self, id: &i32) -> bool {
        self.genres.contains(id)
    }

    pub fn has_skill(&self, id: &i32) -> bool {
        self.skills.contains(id)
    }

    pub fn has_location(&self, id: &i32) -> bool {
        self.location == Some(*id)
    }

    pub fn is_order(&self, order: &ProfileOrder) -> bool {
        self.order_by == *order
    }

    pub fn to_query(&self) -> String {
        let mut pairs = Vec::new();
        if !self.display_name.is_empty() {
            pairs.push(("display_name", self.display_name.clone()));
        }
        for id in &self.profile_types {
            pairs.push(("profile_type", id.to_string()));
        }
        if let Some(id) = self.location {
            pairs.push(("location", id.to_string()));
        }
        for id in &self.genres {
            pairs.push(("genres", id.to_string()));
        }
        for id in &self.skills {
            pairs.push(("skills", id.to_string()));
        }
        if self.has_youtube_video {
            pairs.push(("has_youtube_video", "on".to_owned()));
        }
        if self.has_profile_picture {
            pairs.push(("has_profile_picture", "on".to_owned()));
        }
        if self.order_by != ProfileOrder::Created {
            pairs.push(("order_by", self.order_by.value().to_owned()));
        }
        query_string(pairs)
    }

    pub fn select(&self) -> Select<profiles::Entity> {
        let mut select = profiles::Entity::find();

        if !self.display_name.is_empty() {
            select = select.filter(icontains("profiles", "display_name", &self.display_name));
        }
        if !self.profile_types.is_empty() {
            select = select.filter(profiles::Column::ProfileTypeId.is_in(self.profile_types.clone()));
        }
        if let Some(city) = self.location {
            select = select.filter(profiles::Column::CityId.eq(city));
        }
        if !self.genres.is_empty() {
            select = select.filter(
                profiles::Column::Id.in_subquery(
                    Query::select()
                        .column(profile_genres::Column::ProfileId)
                        .from(profile_genres::Entity)
                        .and_where(profile_genres::Column::GenreId.is_in(self.genres.clone()))
                        .to_owned(),
                ),
            );
        }
        if !self.skills.is_empty() {
            select = select.filter(
                profiles::Column::Id.in_subquery(
                    Query::select()
                        .column(profile_skills::Column::ProfileId)
                        .from(profile_skills::Entity)
                        .and_where(profile_skills::Column::SkillId.is_in(self.skills.clone()))
                        .to_owned(),
                ),
            );
        }
        if self.has_youtube_video {
            let mut any_video = Condition::any();
            for column in [
                profiles::Column::YoutubeLink1,
                profiles::Column::YoutubeLink2,
                profiles::Column::YoutubeLink3,
                profiles::Column::YoutubeLink4,
                profiles::Column::YoutubeLink5,
                profiles::Column::YoutubeLink6,
            ] {
                any_video = any_video.add(
                    Condition::all()
                        .add(column.is_not_null())
                        .add(column.ne("")),
                );
            }
            select = select.filter(any_video);
        }
        if self.has_profile_picture {
            select = select
                .filter(profiles::Column::ProfilePicture.is_not_null())
                .filter(profiles::Column::ProfilePicture.ne(""));
        }

        match self.order_by {
            ProfileOrder::Created => select.order_by_desc(profiles::Column::Created),
            ProfileOrder::LastLogin => select
                .join(JoinType::InnerJoin, profiles::Relation::User.def())
                .order_by_desc(users::Column::LastLogin),
        }
        .order_by_desc(profiles::Column::Id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
        assert_eq!(escape_like("drum n bass"), "drum n bass");
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), Some(1));
        assert_eq!(parse_page(Some("3")), Some(3));
        assert_eq!(parse_page(Some("0")), None);
        assert_eq!(parse_page(Some("two")), None);
    }

    #[test]
    fn test_ad_filter_query_round_trip() {
        let fields = FormFields::from_query("title=Drummer+wanted&ad_type=2&genres=4&genres=1&location=7");
        let filter = AdvertisementFilter::from_fields(&fields);
        assert!(filter.has_filter);
        assert_eq!(filter.genres, vec![1, 4]);

        let reparsed = AdvertisementFilter::from_fields(&FormFields::from_query(&filter.to_query()));
        assert_eq!(reparsed, filter);
    }

    #[test]
    fn test_empty_query_has_no_filter() {
        let filter = ProfileFilter::from_fields(&FormFields::from_query("page=2"));
        assert!(!filter.has_filter);
        assert_eq!(filter.order_by, ProfileOrder::Created);
        assert_eq!(filter.to_query(), "");
    }

    #[test]
    fn test_profile_filter_order() {
        let filter = ProfileFilter::from_fields(&FormFields::from_query(
            "order_by=last_login&has_youtube_video=on",
        ));
        assert!(filter.is_order(&ProfileOrder::LastLogin));
        assert!(filter.has_youtube_video);
        assert!(!filter.has_profile_picture);
        assert_eq!(filter.to_query(), "has_youtube_video=on&order_by=last_login");
    }
}
