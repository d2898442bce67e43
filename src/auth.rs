//! Request authorization for previews.
//!
//! Preview links carry a signed, time-bounded token scoped to one email type
//! (`preview_email_<key>`). A token issued for `new_order` cannot be replayed
//! to preview `customer_invoice`, and with one-time tokens enabled it cannot
//! be replayed at all.
//!
//! Token format: `<expires_unix>.<nonce>.<mac>`, where `mac` is the
//! base64url HMAC-SHA256 of `<scope>|<expires_unix>|<nonce>`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Capability required to preview store emails.
pub const MANAGE_STORE: &str = "manage_store";

/// Default token lifetime (one day).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Token scope for an email type key.
pub fn scope_for(email_type: &str) -> String {
    format!("preview_email_{}", email_type)
}

/// The authenticated admin user making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub capabilities: HashSet<String>,
}

impl Principal {
    /// A user without capabilities.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            capabilities: HashSet::new(),
        }
    }

    /// A user holding [`MANAGE_STORE`].
    pub fn store_manager(user_id: impl Into<String>) -> Self {
        Self::new(user_id).with_capability(MANAGE_STORE)
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn can(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn can_manage_store(&self) -> bool {
        self.can(MANAGE_STORE)
    }
}

/// Outcome of a token check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Denied(DenyReason),
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Why a token was refused. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Missing,
    Malformed,
    /// Signature does not match this scope (wrong type or forged).
    BadSignature,
    Expired,
    Replayed,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::Replayed => "replayed",
        })
    }
}

/// Issues and verifies preview tokens.
pub struct NonceAuthority {
    secret: Vec<u8>,
    ttl: Duration,
    one_time: bool,
    /// Consumed token nonces and their expiry (unix seconds).
    used: Mutex<HashMap<String, i64>>,
}

impl NonceAuthority {
    /// Create an authority signing with `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl: DEFAULT_TOKEN_TTL,
            one_time: true,
            used: Mutex::new(HashMap::new()),
        }
    }

    /// Set the token lifetime, clamped to [`MAX_TOKEN_TTL`].
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl.min(MAX_TOKEN_TTL);
        self
    }

    /// Refuse tokens that were already accepted once (default: true).
    pub fn one_time(mut self, one_time: bool) -> Self {
        self.one_time = one_time;
        self
    }

    /// Issue a token for `scope`.
    pub fn issue(&self, scope: &str) -> String {
        let now = Utc::now().timestamp();
        let expires = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .unwrap_or(i64::MAX);
        self.issue_until(scope, expires)
    }

    fn issue_until(&self, scope: &str, expires: i64) -> String {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let mac = self.sign(scope, expires, &nonce);
        format!("{}.{}.{}", expires, nonce, mac)
    }

    /// Check `token` against `scope`.
    pub fn authorize(&self, token: Option<&str>, scope: &str) -> Authorization {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Authorization::Denied(DenyReason::Missing),
        };

        let mut parts = token.splitn(3, '.');
        let (expires, nonce, mac) = match (parts.next(), parts.next(), parts.next()) {
            (Some(e), Some(n), Some(m)) if !n.is_empty() && !m.is_empty() => (e, n, m),
            _ => return Authorization::Denied(DenyReason::Malformed),
        };
        let Ok(expires) = expires.parse::<i64>() else {
            return Authorization::Denied(DenyReason::Malformed);
        };
        let Ok(mac) = URL_SAFE_NO_PAD.decode(mac) else {
            return Authorization::Denied(DenyReason::Malformed);
        };

        if !self.verify(scope, expires, nonce, &mac) {
            return Authorization::Denied(DenyReason::BadSignature);
        }

        let now = Utc::now().timestamp();
        if now > expires {
            return Authorization::Denied(DenyReason::Expired);
        }

        if self.one_time {
            let mut used = self.used.lock();
            used.retain(|_, exp| *exp >= now);
            if used.contains_key(nonce) {
                return Authorization::Denied(DenyReason::Replayed);
            }
            used.insert(nonce.to_string(), expires);
        }

        Authorization::Authorized
    }

    fn mac(&self, scope: &str, expires: i64, nonce: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(scope.as_bytes());
        mac.update(b"|");
        mac.update(expires.to_string().as_bytes());
        mac.update(b"|");
        mac.update(nonce.as_bytes());
        mac
    }

    fn sign(&self, scope: &str, expires: i64, nonce: &str) -> String {
        let result = self.mac(scope, expires, nonce).finalize();
        URL_SAFE_NO_PAD.encode(result.into_bytes())
    }

    fn verify(&self, scope: &str, expires: i64, nonce: &str, signature: &[u8]) -> bool {
        self.mac(scope, expires, nonce).verify_slice(signature).is_ok()
    }
}

impl fmt::Debug for NonceAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceAuthority")
            .field("ttl", &self.ttl)
            .field("one_time", &self.one_time)
            .finish_non_exhaustive()
    }
}
