use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use bytes::Bytes;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::media;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/storeUser", post(store_user))
        .route("/users/fetchUser", post(fetch_user))
        .route("/users/sendOTP", post(send_otp))
        .route("/users/updateAuthorName", put(update_author_name))
        .route("/users/updateAuthorImage", put(update_author_image))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreUserBody {
    user_mail: Option<String>,
    author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchUserBody {
    user_mail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendOtpBody {
    email: Option<String>,
    #[serde(rename = "OTP")]
    otp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    #[serde(rename = "_id")]
    id: String,
    user_mail: String,
    author_name: String,
    author_img: String,
}

impl UserResponse {
    fn from_user(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_mail: user.user_mail,
            author_name: user.author_name,
            author_img: user.author_img,
        }
    }
}

/// POST /users/storeUser — the existence check gives the friendly error;
/// the unique index on userMail closes the race window behind it.
async fn store_user(
    State(state): State<AppState>,
    Json(body): Json<StoreUserBody>,
) -> AppResult<Response> {
    let user_mail = require(body.user_mail, "userMail")?;
    let author_name = require(body.author_name, "authorName")?;

    let existing = db::users(&state.db)
        .find_one(doc! { "userMail": user_mail.as_str() })
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let mut user = User::new(user_mail, author_name, media::DEFAULT_AUTHOR_IMAGE.to_string());
    let result = db::users(&state.db).insert_one(&user).await?;
    user.id = result.inserted_id.as_object_id();

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(user))).into_response())
}

/// POST /users/fetchUser — lookup key travels in the body, not the path.
async fn fetch_user(
    State(state): State<AppState>,
    Json(body): Json<FetchUserBody>,
) -> AppResult<Json<UserResponse>> {
    let user_mail = require(body.user_mail, "userMail")?;

    let user = db::users(&state.db)
        .find_one(doc! { "userMail": user_mail.as_str() })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(UserResponse::from_user(user)))
}

/// POST /users/sendOTP — rate-limited per client address. The code is
/// delivered out-of-band only; the response confirms dispatch without
/// echoing the secret.
async fn send_otp(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<SendOtpBody>,
) -> AppResult<Json<serde_json::Value>> {
    state
        .otp_limiter
        .check(addr.ip())
        .await
        .map_err(|retry| AppError::RateLimited(retry.as_secs()))?;

    let email = require(body.email, "email")?;
    let otp = require(body.otp, "OTP")?;

    state
        .mailer
        .send_email(&email, "Your OTP Code", &format!("Your OTP code is {otp}"))
        .await
        .map_err(|e| AppError::Mail(e.to_string()))?;

    Ok(Json(json!({ "message": "OTP sent successfully" })))
}

/// PUT /users/updateAuthorName — rejects a name already held by a
/// different user; the unique index on authorName backs the check.
async fn update_author_name(
    State(state): State<AppState>,
    Json(body): Json<StoreUserBody>,
) -> AppResult<Json<UserResponse>> {
    let user_mail = require(body.user_mail, "userMail")?;
    let author_name = require(body.author_name, "authorName")?;

    let taken = db::users(&state.db)
        .find_one(doc! {
            "authorName": author_name.as_str(),
            "userMail": { "$ne": user_mail.as_str() },
        })
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Author name already taken".into()));
    }

    let user = db::users(&state.db)
        .find_one_and_update(
            doc! { "userMail": user_mail.as_str() },
            doc! { "$set": { "authorName": author_name.as_str() } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(UserResponse::from_user(user)))
}

/// PUT /users/updateAuthorImage — multipart with `userMail` and an
/// `authorImg` file. The upload happens before the user lookup; a missing
/// user answers 404 and the uploaded file is left orphaned.
async fn update_author_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut user_mail: Option<String> = None;
    let mut image: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "userMail" => {
                user_mail = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read userMail: {e}"))
                })?)
            }
            "authorImg" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read authorImg: {e}"))
                })?;
                image = Some((filename, data));
            }
            _ => {}
        }
    }

    let user_mail = require(user_mail, "userMail")?;
    let (filename, data) =
        image.ok_or_else(|| AppError::BadRequest("authorImg file is required".into()))?;

    let image_url = state
        .media
        .upload_image(media::PROFILE_FOLDER, &filename, data)
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;

    let user = db::users(&state.db)
        .find_one_and_update(
            doc! { "userMail": user_mail.as_str() },
            doc! { "$set": { "authorImg": image_url.as_str() } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "data": UserResponse::from_user(user),
        "message": "Profile photo updated successfully",
    }))
    .into_response())
}

fn require(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn require_rejects_missing_and_blank() {
        assert!(require(None, "userMail").is_err());
        assert!(require(Some(" ".into()), "userMail").is_err());
        assert!(require(Some("a@x.com".into()), "userMail").is_ok());
    }

    #[test]
    fn otp_body_reads_uppercase_field() {
        let body: SendOtpBody =
            serde_json::from_str(r#"{"email":"a@x.com","OTP":"123456"}"#).unwrap();
        assert_eq!(body.email.as_deref(), Some("a@x.com"));
        assert_eq!(body.otp.as_deref(), Some("123456"));
    }

    #[test]
    fn user_response_uses_wire_names() {
        let mut user = User::new(
            "a@x.com".into(),
            "Alice".into(),
            media::DEFAULT_AUTHOR_IMAGE.into(),
        );
        let oid = ObjectId::new();
        user.id = Some(oid);

        let value = serde_json::to_value(UserResponse::from_user(user)).unwrap();
        assert_eq!(value["_id"], oid.to_hex());
        assert_eq!(value["userMail"], "a@x.com");
        assert_eq!(value["authorName"], "Alice");
        assert_eq!(value["authorImg"], media::DEFAULT_AUTHOR_IMAGE);
    }
}
