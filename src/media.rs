use bytes::Bytes;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::MediaConfig;

/// Served when a blog post is created without an image.
pub const DEFAULT_BLOG_IMAGE: &str =
    "https://res.cloudinary.com/dbmiyxijh/image/upload/v1740252740/blog_images/t1fvjfhajumfcxqypzql.png";

/// Served when a user record is created, before any profile upload.
pub const DEFAULT_AUTHOR_IMAGE: &str =
    "https://res.cloudinary.com/dbmiyxijh/image/upload/v1740252740/profile_pictures/default_avatar.png";

pub const BLOG_FOLDER: &str = "blog_images";
pub const PROFILE_FOLDER: &str = "profile_pictures";

/// Media upload adapter: store a file on the media host, get back a public
/// URL. Invoked inline before the handler's document write; a write failure
/// after a successful upload orphans the uploaded file (known limitation,
/// not compensated).
pub struct MediaStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Upload an image into the given folder and return its public URL.
    pub async fn upload_image(
        &self,
        folder: &str,
        filename: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.api_secret,
        );

        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let file_part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime.as_ref())?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature);

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<UploadResponse>()
            .await?;

        tracing::debug!(folder, filename, url = %response.secure_url, "image uploaded");
        Ok(response.secure_url)
    }
}

/// Request signature: SHA-256 over the alphabetically sorted parameter
/// string with the API secret appended. The account's signature algorithm
/// is configured to SHA-256.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    let to_sign = format!("{}{}", pairs.join("&"), api_secret);
    hex::encode(Sha256::digest(to_sign.as_bytes()))
}
