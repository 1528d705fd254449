//! Database connection and schema bootstrap.

use crate::orm::*;
use sea_orm::sea_query::{Index, TableCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::time::Duration;

/// Opens a pooled connection to `url`.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(20)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600));

    let db = Database::connect(opt).await?;
    log::info!("Connected to database ({:?})", db.get_database_backend());
    Ok(db)
}

/// Creates every table that does not exist yet, parents before children.
pub async fn create_schema<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let schema = Schema::new(db.get_database_backend());

    create_table(db, schema.create_table_from_entity(users::Entity)).await?;
    create_table(db, schema.create_table_from_entity(profile_types::Entity)).await?;
    create_table(db, schema.create_table_from_entity(genres::Entity)).await?;
    create_table(db, schema.create_table_from_entity(skills::Entity)).await?;
    create_table(db, schema.create_table_from_entity(ad_types::Entity)).await?;
    create_table(db, schema.create_table_from_entity(cities::Entity)).await?;
    create_table(db, schema.create_table_from_entity(profiles::Entity)).await?;
    create_table(
        db,
        with_unique_pair(
            schema.create_table_from_entity(profile_genres::Entity),
            profile_genres::Entity,
            profile_genres::Column::ProfileId,
            profile_genres::Column::GenreId,
        ),
    )
    .await?;
    create_table(
        db,
        with_unique_pair(
            schema.create_table_from_entity(profile_skills::Entity),
            profile_skills::Entity,
            profile_skills::Column::ProfileId,
            profile_skills::Column::SkillId,
        ),
    )
    .await?;
    create_table(db, schema.create_table_from_entity(advertisements::Entity)).await?;
    create_table(
        db,
        with_unique_pair(
            schema.create_table_from_entity(advertisement_genres::Entity),
            advertisement_genres::Entity,
            advertisement_genres::Column::AdvertisementId,
            advertisement_genres::Column::GenreId,
        ),
    )
    .await?;
    create_table(
        db,
        with_unique_pair(
            schema.create_table_from_entity(advertisement_skills::Entity),
            advertisement_skills::Entity,
            advertisement_skills::Column::AdvertisementId,
            advertisement_skills::Column::SkillId,
        ),
    )
    .await?;
    create_table(
        db,
        schema.create_table_from_entity(advertisement_comments::Entity),
    )
    .await?;
    create_table(db, schema.create_table_from_entity(open_mics::Entity)).await?;
    create_table(
        db,
        with_unique_pair(
            schema.create_table_from_entity(open_mic_genres::Entity),
            open_mic_genres::Entity,
            open_mic_genres::Column::OpenMicId,
            open_mic_genres::Column::GenreId,
        ),
    )
    .await?;
    create_table(db, schema.create_table_from_entity(open_mic_comments::Entity)).await?;

    // One bookmark per (profile, target).
    let mut bookmarks_table = schema.create_table_from_entity(bookmarks::Entity);
    bookmarks_table.index(
        Index::create()
            .name("uq_bookmarks_profile_target")
            .table(bookmarks::Entity)
            .col(bookmarks::Column::ProfileId)
            .col(bookmarks::Column::ContentType)
            .col(bookmarks::Column::ObjectId)
            .unique(),
    );
    create_table(db, bookmarks_table).await?;

    create_table(db, schema.create_table_from_entity(reports::Entity)).await?;
    create_table(db, schema.create_table_from_entity(conversations::Entity)).await?;
    create_table(
        db,
        with_unique_pair(
            schema.create_table_from_entity(conversation_participants::Entity),
            conversation_participants::Entity,
            conversation_participants::Column::ConversationId,
            conversation_participants::Column::ProfileId,
        ),
    )
    .await?;
    create_table(db, schema.create_table_from_entity(inbox_messages::Entity)).await?;
    create_table(db, schema.create_table_from_entity(feedback::Entity)).await?;

    Ok(())
}

async fn create_table<C>(db: &C, mut stmt: TableCreateStatement) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Adds a unique constraint over two columns of a join table.
fn with_unique_pair<E>(
    mut stmt: TableCreateStatement,
    entity: E,
    left: E::Column,
    right: E::Column,
) -> TableCreateStatement
where
    E: EntityTrait,
{
    let name = format!("uq_{}_pair", entity.table_name());
    stmt.index(
        Index::create()
            .name(&name)
            .table(entity)
            .col(left)
            .col(right)
            .unique(),
    );
    stmt
}
