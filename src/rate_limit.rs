use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Fixed-window request counter keyed by client address. Only the OTP
/// endpoint is limited; everything else is unthrottled.
pub struct OtpRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

struct Window {
    started: Instant,
    count: u32,
}

impl OtpRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject a request from `addr`. On rejection, returns how
    /// long until the window resets.
    pub async fn check(&self, addr: IpAddr) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        // Expired windows would never be read again; drop them here so the
        // map does not grow with one entry per client forever.
        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        let window = windows.entry(addr).or_insert(Window {
            started: now,
            count: 0,
        });

        if window.count >= self.max_requests {
            return Err(self
                .window
                .saturating_sub(now.duration_since(window.started)));
        }

        window.count += 1;
        Ok(())
    }
}
