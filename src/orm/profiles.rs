//! SeaORM Entity for profiles table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub profile_type_id: Option<i32>,
    pub display_name: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub birthday: Option<Date>,
    pub city_id: Option<i32>,
    pub profile_picture: Option<String>,
    pub cover_picture: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub influences: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub created: DateTime,
    pub last_updated: DateTime,
    pub youtube_link_1: Option<String>,
    pub youtube_link_2: Option<String>,
    pub youtube_link_3: Option<String>,
    pub youtube_link_4: Option<String>,
    pub youtube_link_5: Option<String>,
    pub youtube_link_6: Option<String>,
    pub personal_website_social_link: Option<String>,
    pub facebook_social_link: Option<String>,
    pub youtube_social_link: Option<String>,
    pub instagram_social_link: Option<String>,
    pub soundcloud_social_link: Option<String>,
    pub gigs_played: Option<GigsPlayed>,
    pub practice_frequency: Option<PracticeFrequency>,
    pub nights_gig: Option<NightsGig>,
    pub availability: Option<Availability>,
    pub commitment: Option<Commitment>,
    pub timezone: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::profile_types::Entity",
        from = "Column::ProfileTypeId",
        to = "super::profile_types::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    ProfileType,
    #[sea_orm(
        belongs_to = "super::cities::Entity",
        from = "Column::CityId",
        to = "super::cities::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    City,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::profile_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfileType.def()
    }
}

impl Related<super::cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::City.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Embedded video links in slot order, skipping empty slots.
    pub fn youtube_links(&self) -> Vec<&str> {
        [
            &self.youtube_link_1,
            &self.youtube_link_2,
            &self.youtube_link_3,
            &self.youtube_link_4,
            &self.youtube_link_5,
            &self.youtube_link_6,
        ]
        .into_iter()
        .filter_map(|link| link.as_deref())
        .filter(|link| !link.is_empty())
        .collect()
    }

    pub fn get_url(&self) -> String {
        format!("/profiles/{}/about/", self.slug)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum GigsPlayed {
    #[sea_orm(string_value = "under_10")]
    Under10,
    #[sea_orm(string_value = "10_to_50")]
    From10To50,
    #[sea_orm(string_value = "50_to_100")]
    From50To100,
    #[sea_orm(string_value = "over_100")]
    Over100,
}

impl GigsPlayed {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Under10 => "Under 10",
            Self::From10To50 => "10 to 50",
            Self::From50To100 => "50 to 100",
            Self::Over100 => "Over 100",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum PracticeFrequency {
    #[sea_orm(string_value = "1_time_per_week")]
    OncePerWeek,
    #[sea_orm(string_value = "2_3_times_per_week")]
    TwoToThreePerWeek,
    #[sea_orm(string_value = "more_than_3_times_per_week")]
    MoreThanThreePerWeek,
}

impl PracticeFrequency {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OncePerWeek => "1 time per week",
            Self::TwoToThreePerWeek => "2-3 times per week",
            Self::MoreThanThreePerWeek => "More than 3 times per week",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum NightsGig {
    #[sea_orm(string_value = "1_night_a_week")]
    OneNight,
    #[sea_orm(string_value = "2_3_nights_a_week")]
    TwoToThreeNights,
    #[sea_orm(string_value = "4_5_nights_a_week")]
    FourToFiveNights,
    #[sea_orm(string_value = "6_7_nights_a_week")]
    SixToSevenNights,
}

impl NightsGig {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneNight => "1 night a week",
            Self::TwoToThreeNights => "2-3 nights a week",
            Self::FourToFiveNights => "4-5 nights a week",
            Self::SixToSevenNights => "6-7 nights a week",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Availability {
    #[sea_orm(string_value = "mornings")]
    Mornings,
    #[sea_orm(string_value = "days")]
    Days,
    #[sea_orm(string_value = "nights")]
    Nights,
}

impl Availability {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mornings => "Mornings",
            Self::Days => "Days",
            Self::Nights => "Nights",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Commitment {
    #[sea_orm(string_value = "just_for_fun")]
    JustForFun,
    #[sea_orm(string_value = "moderately_committed")]
    ModeratelyCommitted,
    #[sea_orm(string_value = "committed")]
    Committed,
}

impl Commitment {
    pub fn label(&self) -> &'static str {
        match self {
            Self::JustForFun => "Just for Fun",
            Self::ModeratelyCommitted => "Moderately committed",
            Self::Committed => "Committed",
        }
    }
}
