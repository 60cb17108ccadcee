use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// A published blog post. Field names keep the original wire casing so the
/// stored documents and JSON bodies stay compatible with existing clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub content: String,
    /// Author reference by value; resolved to a display name on listing.
    pub user_mail: String,
    pub blog_img: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn new(title: String, content: String, user_mail: String, blog_img: String) -> Self {
        Self {
            id: None,
            title,
            content,
            user_mail,
            blog_img,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub post_id: ObjectId,
    pub text: String,
    pub author: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Append-only; order is insertion order.
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn new(post_id: ObjectId, text: String, author: String) -> Self {
        Self {
            id: None,
            post_id,
            text,
            author,
            created_at: Utc::now(),
            replies: Vec::new(),
        }
    }
}

/// Embedded in its parent comment; no identity of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub text: String,
    pub author: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(text: String, author: String) -> Self {
        Self {
            text,
            author,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterial {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub subject_name: String,
    pub subject_code: String,
    pub faculty_name: String,
    #[serde(rename = "type")]
    pub material_type: String,
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_mail: String,
    pub author_name: String,
    pub author_img: String,
}

impl User {
    pub fn new(user_mail: String, author_name: String, author_img: String) -> Self {
        Self {
            id: None,
            user_mail,
            author_name,
            author_img,
        }
    }
}
