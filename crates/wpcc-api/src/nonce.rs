//! Action nonces for the settings endpoints.
//!
//! A nonce is bound to an action name and a time tick. The tick advances
//! every half lifetime, and a nonce verifies during its own tick and the
//! one after it, so a token lives between half and one full lifetime.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use wpcc_core::WpccError;

const NONCE_LEN: usize = 10;

/// Which tick a verified nonce was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    Current,
    Previous,
}

#[derive(Clone)]
pub struct NonceAuthority {
    key: [u8; 32],
    lifetime: Duration,
}

impl NonceAuthority {
    pub fn new(key: [u8; 32], lifetime: Duration) -> Self {
        Self { key, lifetime }
    }

    pub fn create(&self, action: &str) -> String {
        self.create_at(action, unix_now())
    }

    pub fn verify(&self, nonce: &str, action: &str) -> Option<NonceAge> {
        self.verify_at(nonce, action, unix_now())
    }

    /// Like [`verify`](Self::verify), as a `Result` for callers that log the refusal
    pub fn check(&self, nonce: &str, action: &str) -> Result<NonceAge, WpccError> {
        self.verify(nonce, action)
            .ok_or_else(|| WpccError::Auth(format!("invalid nonce for action {}", action)))
    }

    pub fn create_at(&self, action: &str, now_secs: u64) -> String {
        self.token(self.tick(now_secs), action)
    }

    pub fn verify_at(&self, nonce: &str, action: &str, now_secs: u64) -> Option<NonceAge> {
        if nonce.is_empty() {
            return None;
        }
        let tick = self.tick(now_secs);
        if constant_time_eq(nonce, &self.token(tick, action)) {
            return Some(NonceAge::Current);
        }
        if tick > 0 && constant_time_eq(nonce, &self.token(tick - 1, action)) {
            return Some(NonceAge::Previous);
        }
        None
    }

    fn tick(&self, now_secs: u64) -> u64 {
        let half = (self.lifetime.as_secs() / 2).max(1);
        now_secs.div_ceil(half)
    }

    fn token(&self, tick: u64, action: &str) -> String {
        let message = format!("{}|{}", tick, action);
        let hash = blake3::keyed_hash(&self.key, message.as_bytes());
        hash.to_hex()[..NONCE_LEN].to_string()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;
    const NOW: u64 = 1_705_314_600;

    fn authority() -> NonceAuthority {
        NonceAuthority::new([7u8; 32], Duration::from_secs(DAY))
    }

    #[test]
    fn test_nonce_shape() {
        let nonce = authority().create_at("acj_wpcc_nonce_get", NOW);
        assert_eq!(nonce.len(), 10);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_current_and_previous_tick() {
        let a = authority();
        let nonce = a.create_at("save", NOW);
        assert_eq!(a.verify_at(&nonce, "save", NOW), Some(NonceAge::Current));
        assert_eq!(a.verify_at(&nonce, "save", NOW + DAY / 2), Some(NonceAge::Previous));
        assert_eq!(a.verify_at(&nonce, "save", NOW + DAY + 1), None);
    }

    #[test]
    fn test_bound_to_action_and_key() {
        let a = authority();
        let nonce = a.create_at("save", NOW);
        assert_eq!(a.verify_at(&nonce, "get", NOW), None);

        let other = NonceAuthority::new([8u8; 32], Duration::from_secs(DAY));
        assert_eq!(other.verify_at(&nonce, "save", NOW), None);
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        let a = authority();
        assert_eq!(a.verify_at("", "save", NOW), None);
        assert_eq!(a.verify_at("not-a-nonce", "save", NOW), None);
    }

    #[test]
    fn test_live_clock() {
        let a = authority();
        let nonce = a.create("get");
        assert!(a.verify(&nonce, "get").is_some());
        assert!(matches!(a.check("bogus", "get"), Err(WpccError::Auth(_))));
    }
}
