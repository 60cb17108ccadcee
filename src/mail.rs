use anyhow::anyhow;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, RefreshToken, TokenResponse, TokenUrl};
use serde_json::json;

use crate::config::MailConfig;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Notification adapter over the Gmail REST API. Exposes a single
/// `send_email` operation; each send exchanges the long-lived refresh
/// token for a fresh access token.
pub struct Mailer {
    oauth: BasicClient,
    http: reqwest::Client,
    refresh_token: String,
    sender: String,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let oauth = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(AUTH_URL.to_string())?,
            Some(TokenUrl::new(TOKEN_URL.to_string())?),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_uri.clone())?);

        Ok(Self {
            oauth,
            http: reqwest::Client::new(),
            refresh_token: config.refresh_token.clone(),
            sender: config.sender.clone(),
        })
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        let token = self
            .oauth
            .exchange_refresh_token(&RefreshToken::new(self.refresh_token.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|e| anyhow!("token refresh failed: {e}"))?;

        Ok(token.access_token().secret().to_string())
    }

    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let access_token = self.access_token().await?;
        let raw = encode_message(&self.sender, to, subject, body);

        self.http
            .post(SEND_URL)
            .bearer_auth(access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(to, subject, "email dispatched");
        Ok(())
    }
}

/// Gmail expects the whole RFC 2822 message, base64url encoded without
/// padding, in the `raw` field.
fn encode_message(from: &str, to: &str, subject: &str, body: &str) -> String {
    let message = format!(
        "From: \"EduBlog\" <{from}>\r\nTo: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{body}"
    );
    URL_SAFE_NO_PAD.encode(message)
}
