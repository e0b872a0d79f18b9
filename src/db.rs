// connexion BD + création du schéma

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::models::{interactions, titles, users};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Crée les tables et les index uniques s'ils n'existent pas encore.
/// Ordre imposé par les clés étrangères: users, titles, interactions.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, titles::Entity).await?;
    create_table(db, &schema, interactions::Entity).await?;

    // Un seul titre par (catalog_id, kind)
    let title_key = Index::create()
        .name("idx_titles_catalog_kind")
        .table(titles::Entity)
        .col(titles::Column::CatalogId)
        .col(titles::Column::Kind)
        .unique()
        .if_not_exists()
        .to_owned();
    create_index(db, title_key).await?;

    // Une seule interaction par (user_id, title_id)
    let interaction_key = Index::create()
        .name("idx_interactions_user_title")
        .table(interactions::Entity)
        .col(interactions::Column::UserId)
        .col(interactions::Column::TitleId)
        .unique()
        .if_not_exists()
        .to_owned();
    create_index(db, interaction_key).await?;

    tracing::info!("database schema ready");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

async fn create_index(db: &DatabaseConnection, statement: IndexCreateStatement) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

/// Base SQLite en mémoire avec le schéma complet, pour les tests
#[cfg(test)]
pub async fn test_connection() -> DatabaseConnection {
    // Une seule connexion: chaque connexion SQLite mémoire a sa propre base
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    setup_schema(&db).await.expect("Failed to create schema");
    db
}
