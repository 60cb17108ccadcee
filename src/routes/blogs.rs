use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::Serialize;

use crate::db;
use crate::db::models::{BlogPost, User};
use crate::error::{AppError, AppResult};
use crate::media;
use crate::routes::parse_object_id;
use crate::state::AppState;

const UNKNOWN_AUTHOR: &str = "Unknown Author";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list).post(create))
        .route("/blogs/{id}", get(get_by_id))
        .route("/blogs/blogsByUser/{userMail}", get(list_by_author))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlogResponse {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    content: String,
    user_mail: String,
    blog_img: String,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
}

impl BlogResponse {
    fn from_post(post: BlogPost, author_name: Option<String>) -> Self {
        Self {
            id: post.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: post.title,
            content: post.content,
            user_mail: post.user_mail,
            blog_img: post.blog_img,
            created_at: post.created_at,
            author_name,
        }
    }
}

/// POST /blogs — multipart form with `title`, `content`, `userMail` and an
/// optional `blogImg` file. The image is stored on the media host first;
/// without one the post gets the fixed placeholder URL.
async fn create(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<Response> {
    let mut title: Option<String> = None;
    let mut content: Option<String> = None;
    let mut user_mail: Option<String> = None;
    let mut image: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => title = Some(read_text(field).await?),
            "content" => content = Some(read_text(field).await?),
            "userMail" => user_mail = Some(read_text(field).await?),
            "blogImg" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read blogImg: {e}")))?;
                image = Some((filename, data));
            }
            _ => {}
        }
    }

    let title = require(title, "title")?;
    let content = require(content, "content")?;
    let user_mail = require(user_mail, "userMail")?;

    let blog_img = match image {
        Some((filename, data)) => state
            .media
            .upload_image(media::BLOG_FOLDER, &filename, data)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?,
        None => media::DEFAULT_BLOG_IMAGE.to_string(),
    };

    let mut post = BlogPost::new(title, content, user_mail, blog_img);
    let result = db::blogs(&state.db).insert_one(&post).await?;
    post.id = result.inserted_id.as_object_id();

    Ok((
        StatusCode::CREATED,
        Json(BlogResponse::from_post(post, None)),
    )
        .into_response())
}

/// GET /blogs — newest first. Author names are joined in with one batched
/// lookup over the distinct author mails; a missing user record yields the
/// sentinel name rather than a hole.
async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<BlogResponse>>> {
    let posts: Vec<BlogPost> = db::blogs(&state.db)
        .find(doc! {})
        .sort(doc! { "_id": -1 })
        .await?
        .try_collect()
        .await?;

    let mut mails: Vec<String> = posts.iter().map(|p| p.user_mail.clone()).collect();
    mails.sort();
    mails.dedup();

    let authors: HashMap<String, String> = if mails.is_empty() {
        HashMap::new()
    } else {
        db::users(&state.db)
            .find(doc! { "userMail": { "$in": mails } })
            .await?
            .try_collect::<Vec<User>>()
            .await?
            .into_iter()
            .map(|u| (u.user_mail, u.author_name))
            .collect()
    };

    let blogs = posts
        .into_iter()
        .map(|post| {
            let author_name = authors
                .get(&post.user_mail)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
            BlogResponse::from_post(post, Some(author_name))
        })
        .collect();

    Ok(Json(blogs))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BlogResponse>> {
    let id = parse_object_id(&id)?;
    let post = db::blogs(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;

    Ok(Json(BlogResponse::from_post(post, None)))
}

/// GET /blogs/blogsByUser/{userMail} — exact-match filter, no author join.
async fn list_by_author(
    State(state): State<AppState>,
    Path(user_mail): Path<String>,
) -> AppResult<Json<Vec<BlogResponse>>> {
    let posts: Vec<BlogPost> = db::blogs(&state.db)
        .find(doc! { "userMail": user_mail.as_str() })
        .await?
        .try_collect()
        .await?;

    Ok(Json(
        posts
            .into_iter()
            .map(|post| BlogResponse::from_post(post, None))
            .collect(),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field: {e}")))
}

fn require(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}
