use std::sync::Arc;

use mongodb::Database;

use crate::config::Config;
use crate::mail::Mailer;
use crate::media::MediaStore;
use crate::rate_limit::OtpRateLimiter;

/// Shared handles injected into every route group. The database handle is
/// pooled by the driver and safe to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub media: Arc<MediaStore>,
    pub mailer: Arc<Mailer>,
    pub otp_limiter: Arc<OtpRateLimiter>,
}
