pub mod models;

use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::config::DatabaseConfig;
use crate::db::models::{BlogPost, Comment, StudyMaterial, User};

pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(&config.uri).await?;
    let db = client.database(&config.name);

    // Fail fast on an unreachable server instead of at the first request
    db.run_command(doc! { "ping": 1 }).await?;
    tracing::info!("Connected to database: {}", config.name);

    Ok(db)
}

pub fn blogs(db: &Database) -> Collection<BlogPost> {
    db.collection("blogs")
}

pub fn comments(db: &Database) -> Collection<Comment> {
    db.collection("comments")
}

pub fn users(db: &Database) -> Collection<User> {
    db.collection("users")
}

pub fn study_materials(db: &Database) -> Collection<StudyMaterial> {
    db.collection("studyMaterials")
}

/// Unique indexes on the user identity fields. The route handlers still do
/// an existence check first for a friendly error message; the index is what
/// makes the guarantee hold under concurrent requests.
pub async fn ensure_indexes(db: &Database) -> anyhow::Result<()> {
    let user_mail = IndexModel::builder()
        .keys(doc! { "userMail": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    let author_name = IndexModel::builder()
        .keys(doc! { "authorName": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    users(db).create_index(user_mail).await?;
    users(db).create_index(author_name).await?;

    tracing::info!("Database indexes ensured");
    Ok(())
}
