//! Join table linking open_mics to genres

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "open_mic_genres")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub open_mic_id: i32,
    pub genre_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::open_mics::Entity",
        from = "Column::OpenMicId",
        to = "super::open_mics::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    OpenMic,
    #[sea_orm(
        belongs_to = "super::genres::Entity",
        from = "Column::GenreId",
        to = "super::genres::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Genre,
}

impl Related<super::open_mics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OpenMic.def()
    }
}

impl Related<super::genres::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Genre.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
