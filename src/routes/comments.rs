use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::db::models::{Comment, Reply};
use crate::error::{AppError, AppResult};
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/comments/posts/{postId}/comments",
            post(create).get(list_for_post),
        )
        .route("/comments/commentReply/{commentId}/replies", post(add_reply))
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    text: Option<String>,
    author: Option<String>,
}

impl CommentBody {
    fn into_parts(self) -> Result<(String, String), AppError> {
        match (self.text, self.author) {
            (Some(text), Some(author)) if !text.is_empty() && !author.is_empty() => {
                Ok((text, author))
            }
            _ => Err(AppError::BadRequest("Text and author are required.".into())),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentResponse {
    #[serde(rename = "_id")]
    id: String,
    post_id: String,
    text: String,
    author: String,
    created_at: DateTime<Utc>,
    replies: Vec<ReplyResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyResponse {
    text: String,
    author: String,
    created_at: DateTime<Utc>,
}

impl CommentResponse {
    fn from_comment(comment: Comment) -> Self {
        Self {
            id: comment.id.map(|id| id.to_hex()).unwrap_or_default(),
            post_id: comment.post_id.to_hex(),
            text: comment.text,
            author: comment.author,
            created_at: comment.created_at,
            replies: comment
                .replies
                .into_iter()
                .map(|r| ReplyResponse {
                    text: r.text,
                    author: r.author,
                    created_at: r.created_at,
                })
                .collect(),
        }
    }
}

/// POST /comments/posts/{postId}/comments
async fn create(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> AppResult<Response> {
    let (text, author) = body.into_parts()?;
    let post_id = parse_object_id(&post_id)?;

    let comment = Comment::new(post_id, text, author);
    let result = db::comments(&state.db).insert_one(&comment).await?;
    let comment_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Internal("unexpected inserted id type".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Comment created successfully",
            "commentId": comment_id.to_hex(),
        })),
    )
        .into_response())
}

/// POST /comments/commentReply/{commentId}/replies — appends to the end of
/// the replies array; order is never rewritten afterwards.
async fn add_reply(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> AppResult<Response> {
    let (text, author) = body.into_parts()?;
    let comment_id = parse_object_id(&comment_id)?;

    let reply = Reply::new(text, author);
    let result = db::comments(&state.db)
        .update_one(
            doc! { "_id": comment_id },
            doc! { "$push": { "replies": to_bson(&reply)? } },
        )
        .await?;

    if result.modified_count == 0 {
        return Err(AppError::NotFound("Comment not found".into()));
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Reply added successfully" })),
    )
        .into_response())
}

/// GET /comments/posts/{postId}/comments — storage order, no sort applied.
async fn list_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    let post_id = parse_object_id(&post_id)?;

    let comments: Vec<Comment> = db::comments(&state.db)
        .find(doc! { "postId": post_id })
        .await?
        .try_collect()
        .await?;

    Ok(Json(
        comments
            .into_iter()
            .map(CommentResponse::from_comment)
            .collect(),
    ))
}
