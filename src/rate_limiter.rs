use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Tracked-client count above which expired windows are swept inline.
const SWEEP_THRESHOLD: usize = 1000;

/// Fixed-window admission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }
        if self.window.as_millis() == 0 {
            return Err("window must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// One client's current window. `reset_at` is epoch milliseconds and is the
/// sole expiry criterion.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: u64,
}

/// The governor's verdict on a single request, plus quota bookkeeping for
/// the caller to surface.
#[derive(Debug, Clone)]
pub struct Admission {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: u64,
}

/// Per-client fixed-window request counter.
///
/// All state lives in one mutex-guarded map, so the look-up/check/increment
/// sequence for a client is atomic; two concurrent requests at the edge of
/// the limit cannot both slip through.
///
/// Caveat of fixed windows: a burst straddling a window boundary can admit
/// up to twice `max_requests` in a short span.
pub struct RateLimiter {
    settings: RateLimitSettings,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Decides whether `client_id` may proceed. Never fails; a denial is a
    /// normal return carrying the retry metadata.
    pub fn admit(&self, client_id: &str) -> Admission {
        self.admit_at(client_id, now_millis())
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    /// Number of clients with a tracked window, expired or not.
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn admit_at(&self, client_id: &str, now: u64) -> Admission {
        let limit = self.settings.max_requests;
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        // Opportunistic sweep: once the map is large, drop every expired
        // window inline rather than waiting on a background timer.
        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, window| window.reset_at > now);
        }

        match windows.get_mut(client_id) {
            Some(window) if window.reset_at > now => {
                if window.count >= limit {
                    // Denials leave the counter untouched.
                    Admission {
                        admitted: false,
                        limit,
                        remaining: 0,
                        reset_at: window.reset_at,
                    }
                } else {
                    window.count += 1;
                    Admission {
                        admitted: true,
                        limit,
                        remaining: limit - window.count,
                        reset_at: window.reset_at,
                    }
                }
            }
            _ => {
                // First request, or the stored window has expired: start a
                // fresh one.
                let reset_at = now + self.settings.window.as_millis() as u64;
                windows.insert(client_id.to_string(), Window { count: 1, reset_at });
                Admission {
                    admitted: true,
                    limit,
                    remaining: limit.saturating_sub(1),
                    reset_at,
                }
            }
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
