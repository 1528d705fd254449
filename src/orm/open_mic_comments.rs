//! Comments left on open_mics

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "open_mic_comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub author_id: Option<i32>,
    pub open_mic_id: i32,
    pub body: String,
    pub created: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::AuthorId",
        to = "super::profiles::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::open_mics::Entity",
        from = "Column::OpenMicId",
        to = "super::open_mics::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    OpenMic,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::open_mics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OpenMic.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
