//! Session usage accounting.
//!
//! The flow may be started at most a fixed number of times per browser
//! session. The counter lives in a session cookie (no `expires`, so it
//! dies with the session). Read or write problems must never break flow
//! initialization — they default to "not limited".

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

/// Name of the session cookie holding the usage counter.
pub const USAGE_COOKIE: &str = "ai-leads-usage";

/// Attributes applied to every session cookie write.
const SESSION_COOKIE_ATTRIBUTES: &str = "path=/; secure; samesite=strict";

/// Storage seam for session cookies.
pub trait CookieJar: Send + Sync {
    /// Read a cookie's value, if present.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a session cookie (no `expires` — cleared when the session
    /// ends) with `path=/; secure; samesite=strict`.
    fn set_session(&self, name: &str, value: &str);
}

/// In-memory jar scoped to the process, which is this flow's "session".
///
/// Stores the rendered cookie string, attributes included, and parses the
/// value back out on read — so the attribute handling is exercised rather
/// than bypassed.
#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, String>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.lock().ok()?;
        let raw = cookies.get(name)?;
        Some(raw.split(';').next().unwrap_or(raw).trim().to_string())
    }

    fn set_session(&self, name: &str, value: &str) {
        let rendered = format!("{value}; {SESSION_COOKIE_ATTRIBUTES}");
        match self.cookies.lock() {
            Ok(mut cookies) => {
                cookies.insert(name.to_string(), rendered);
            }
            Err(_) => tracing::warn!(cookie = name, "Cookie jar poisoned; write dropped"),
        }
    }
}

/// Extract one cookie's value from a `"a=1; b=2"` header string.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let pair = pair.trim();
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Caps how many times a session may start the flow.
pub struct UsageLimiter {
    jar: Arc<dyn CookieJar>,
    limit: u32,
}

impl UsageLimiter {
    pub fn new(jar: Arc<dyn CookieJar>, limit: u32) -> Self {
        Self { jar, limit }
    }

    /// Current usage count. Missing or unparseable cookies count as zero.
    pub fn count(&self) -> u32 {
        self.jar
            .get(USAGE_COOKIE)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Whether this session has exhausted its allowance.
    pub fn is_exhausted(&self) -> bool {
        self.count() >= self.limit
    }

    /// Count one flow start. Called exactly once per successful initial
    /// submission — never on retries or later steps. The current flow is
    /// allowed to finish even if this makes the session exhausted; the
    /// limit takes effect at the next initialization.
    pub fn record_use(&self) {
        let next = self.count().saturating_add(1);
        self.jar.set_session(USAGE_COOKIE, &next.to_string());
        tracing::debug!(count = next, limit = self.limit, "Recorded flow use");
    }
}
