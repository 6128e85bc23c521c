//! Schema bootstrap from the entity definitions.
//!
//! The benchmark targets a throwaway database, so tables and indexes are
//! derived straight from the entities instead of a migration history.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Schema, Set};

use crate::database::models::{account, blog, post};
use crate::database::DB;

/// Create the accounts, blogs and posts tables plus the index on `blogs.name`.
/// Idempotent: every statement carries IF NOT EXISTS.
pub async fn create_all(db: &DB) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut stmt = schema.create_table_from_entity(account::Entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;

    let mut stmt = schema.create_table_from_entity(blog::Entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;

    let mut stmt = schema.create_table_from_entity(post::Entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;

    for mut stmt in schema.create_index_from_entity(blog::Entity) {
        stmt.if_not_exists();
        db.execute(backend.build(&stmt)).await?;
    }

    Ok(())
}

/// Seed one non-premium account and one blog so the synthetic bulk insert
/// (which targets blog 1) has somewhere to land. Skipped when accounts exist.
pub async fn seed_baseline(db: &DB) -> Result<(), DbErr> {
    use sea_orm::ActiveModelTrait;

    if account::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    let account = account::ActiveModel {
        details: Set(serde_json::json!({ "is_premium": false })),
        ..Default::default()
    }
    .insert(db)
    .await?;

    blog::ActiveModel {
        name: Set("Benchmark Blog".to_string()),
        account_id: Set(account.id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Seeded baseline account and blog");
    Ok(())
}
