//! Reference tables used as filter facets and form choices.

use crate::orm::{ad_types, cities, genres, profile_types, skills};
use sea_orm::{entity::*, query::*, ActiveValue::Set, ConnectionTrait, DbErr};

pub const DEFAULT_AD_TYPES: [&str; 2] = ["Looking for Band", "Looking for Musician"];

pub const DEFAULT_PROFILE_TYPES: [&str; 2] = ["Band", "Musician"];

pub const DEFAULT_GENRES: [&str; 25] = [
    "Alternative",
    "Blues",
    "Chill",
    "Christian",
    "Classical",
    "Country",
    "Cover",
    "Dance",
    "Electronic",
    "Experimental",
    "Folk",
    "Funk",
    "Hip Hop",
    "Indie",
    "Jazz",
    "Latino",
    "Metal",
    "Party",
    "Pop",
    "Punk",
    "R & B",
    "Reggae",
    "Rock",
    "Soul",
    "World",
];

pub const DEFAULT_SKILLS: [&str; 9] = [
    "Bass",
    "Brass",
    "Drums",
    "Guitar",
    "Percussion",
    "Piano",
    "Strings",
    "Vocals",
    "Woodwinds",
];

/// (name, region, country)
pub const DEFAULT_CITIES: [(&str, &str, &str); 12] = [
    ("Atlanta", "Georgia", "United States"),
    ("Austin", "Texas", "United States"),
    ("Boston", "Massachusetts", "United States"),
    ("Chicago", "Illinois", "United States"),
    ("Denver", "Colorado", "United States"),
    ("Los Angeles", "California", "United States"),
    ("Nashville", "Tennessee", "United States"),
    ("New Orleans", "Louisiana", "United States"),
    ("New York", "New York", "United States"),
    ("Portland", "Oregon", "United States"),
    ("Seattle", "Washington", "United States"),
    ("Toronto", "Ontario", "Canada"),
];

/// Every facet list, loaded once per form render.
#[derive(Clone, Debug, Default)]
pub struct Choices {
    pub ad_types: Vec<ad_types::Model>,
    pub profile_types: Vec<profile_types::Model>,
    pub genres: Vec<genres::Model>,
    pub skills: Vec<skills::Model>,
    pub cities: Vec<cities::Model>,
}

impl Choices {
    pub fn genre_names(&self, ids: &[i32]) -> Vec<String> {
        self.genres
            .iter()
            .filter(|g| ids.contains(&g.id))
            .map(|g| g.name.clone())
            .collect()
    }

    pub fn skill_names(&self, ids: &[i32]) -> Vec<String> {
        self.skills
            .iter()
            .filter(|s| ids.contains(&s.id))
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn city_label(&self, id: Option<i32>) -> String {
        id.and_then(|id| self.cities.iter().find(|c| c.id == id))
            .map(|c| c.label())
            .unwrap_or_default()
    }

    pub fn ad_type_name(&self, id: Option<i32>) -> String {
        id.and_then(|id| self.ad_types.iter().find(|t| t.id == id))
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }

    pub fn profile_type_name(&self, id: Option<i32>) -> String {
        id.and_then(|id| self.profile_types.iter().find(|t| t.id == id))
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }
}

pub async fn load_choices<C>(db: &C) -> Result<Choices, DbErr>
where
    C: ConnectionTrait,
{
    Ok(Choices {
        ad_types: ad_types::Entity::find()
            .order_by_asc(ad_types::Column::Name)
            .all(db)
            .await?,
        profile_types: profile_types::Entity::find()
            .order_by_asc(profile_types::Column::Name)
            .all(db)
            .await?,
        genres: genres::Entity::find()
            .order_by_asc(genres::Column::Name)
            .all(db)
            .await?,
        skills: skills::Entity::find()
            .order_by_asc(skills::Column::Name)
            .all(db)
            .await?,
        cities: cities::Entity::find()
            .order_by_asc(cities::Column::Name)
            .all(db)
            .await?,
    })
}

/// A single-name reference table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facet {
    AdType,
    ProfileType,
    Genre,
    Skill,
}

impl Facet {
    pub const ALL: [Facet; 4] = [Self::AdType, Self::ProfileType, Self::Genre, Self::Skill];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::AdType => "ad-types",
            Self::ProfileType => "profile-types",
            Self::Genre => "genres",
            Self::Skill => "skills",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AdType => "Ad types",
            Self::ProfileType => "Profile types",
            Self::Genre => "Genres",
            Self::Skill => "Skills",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|facet| facet.slug() == slug)
    }
}

/// `(id, name)` rows of one facet table whose name contains `query`.
pub async fn facet_rows<C>(db: &C, facet: Facet, query: &str) -> Result<Vec<(i32, String)>, DbErr>
where
    C: ConnectionTrait,
{
    let query = query.trim();
    let rows = match facet {
        Facet::AdType => ad_types::Entity::find()
            .filter(ad_types::Column::Name.contains(query))
            .order_by_asc(ad_types::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect(),
        Facet::ProfileType => profile_types::Entity::find()
            .filter(profile_types::Column::Name.contains(query))
            .order_by_asc(profile_types::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect(),
        Facet::Genre => genres::Entity::find()
            .filter(genres::Column::Name.contains(query))
            .order_by_asc(genres::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect(),
        Facet::Skill => skills::Entity::find()
            .filter(skills::Column::Name.contains(query))
            .order_by_asc(skills::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect(),
    };
    Ok(rows)
}

/// Inserts `name` unless the table already has it. Returns whether a row
/// was added.
pub async fn add_facet<C>(db: &C, facet: Facet, name: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Ok(false);
    }

    macro_rules! insert_unique {
        ($entity:ident) => {{
            if $entity::Entity::find()
                .filter($entity::Column::Name.eq(name))
                .one(db)
                .await?
                .is_some()
            {
                return Ok(false);
            }
            $entity::ActiveModel {
                name: Set(name.to_owned()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }};
    }

    match facet {
        Facet::AdType => insert_unique!(ad_types),
        Facet::ProfileType => insert_unique!(profile_types),
        Facet::Genre => insert_unique!(genres),
        Facet::Skill => insert_unique!(skills),
    }
    Ok(true)
}

/// Inserts a city unless one with the same name and region exists.
pub async fn add_city<C>(db: &C, name: &str, region: &str, country: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let (name, region, country) = (name.trim(), region.trim(), country.trim());
    if name.is_empty() || country.is_empty() {
        return Ok(false);
    }
    if cities::Entity::find()
        .filter(cities::Column::Name.eq(name))
        .filter(cities::Column::Region.eq(region))
        .one(db)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    cities::ActiveModel {
        name: Set(name.to_owned()),
        region: Set(region.to_owned()),
        country: Set(country.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(true)
}

/// Inserts the default facet values that are not present yet.
pub async fn seed_defaults<C>(db: &C) -> Result<usize, DbErr>
where
    C: ConnectionTrait,
{
    let defaults = DEFAULT_AD_TYPES
        .iter()
        .map(|name| (Facet::AdType, *name))
        .chain(DEFAULT_PROFILE_TYPES.iter().map(|name| (Facet::ProfileType, *name)))
        .chain(DEFAULT_GENRES.iter().map(|name| (Facet::Genre, *name)))
        .chain(DEFAULT_SKILLS.iter().map(|name| (Facet::Skill, *name)));

    let mut inserted = 0;
    for (facet, name) in defaults {
        if add_facet(db, facet, name).await? {
            inserted += 1;
        }
    }
    for (name, region, country) in DEFAULT_CITIES {
        if add_city(db, name, region, country).await? {
            inserted += 1;
        }
    }

    log::info!("Seeded {} reference rows", inserted);
    Ok(inserted)
}

/// Case-insensitive prefix search over city names for autocomplete.
pub async fn search_cities<C>(db: &C, query: &str, limit: u64) -> Result<Vec<cities::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    cities::Entity::find()
        .filter(crate::listing::istartswith("cities", "name", query))
        .order_by_asc(cities::Column::Name)
        .limit(limit)
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists() {
        assert_eq!(DEFAULT_GENRES.len(), 25);
        assert_eq!(DEFAULT_SKILLS.len(), 9);
        assert!(DEFAULT_GENRES.contains(&"R & B"));
    }

    #[test]
    fn test_facet_slugs() {
        for facet in Facet::ALL {
            assert_eq!(Facet::from_slug(facet.slug()), Some(facet));
        }
        assert_eq!(Facet::from_slug("cities"), None);
    }
}
