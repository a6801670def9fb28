use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::models::ContentItem;

/// Unlock grant length in minutes. Watching one ad unlocks audio for half an hour.
const GRANT_MINUTES: i64 = 30;

/// How long a single grant keeps locked items playable.
pub const GRANT_DURATION: StdDuration = StdDuration::from_secs(GRANT_MINUTES as u64 * 60);

/// In-memory unlock flag for the gated section.
///
/// Every grant bumps `generation`; a scheduled revert carries the generation
/// it was created for and only takes effect if no later grant happened.
#[derive(Debug, Clone, Default)]
pub struct UnlockGate {
    unlocked: bool,
    last_granted_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl UnlockGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Unlock (or extend) and return the generation the revert must match
    pub fn grant(&mut self, now: DateTime<Utc>) -> u64 {
        self.unlocked = true;
        self.last_granted_at = Some(now);
        self.generation += 1;
        self.generation
    }

    /// Lock again if `generation` is still the latest grant.
    /// Returns true if the gate actually flipped.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.unlocked {
            return false;
        }
        self.unlocked = false;
        true
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.unlocked {
            return None;
        }
        let expiry = self.last_granted_at? + Duration::minutes(GRANT_MINUTES);
        Some((expiry - now).max(Duration::zero()))
    }

    /// Get minutes remaining until the gate locks (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.time_until_expiry(now).map(|d| d.num_minutes())
    }
}

pub fn is_playable(item: &ContentItem, unlocked: bool) -> bool {
    !item.locked || unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fallback;
    use crate::models::Section;

    #[test]
    fn test_gate_starts_locked() {
        let gate = UnlockGate::new();
        assert!(!gate.is_unlocked());
        assert!(gate.time_until_expiry(Utc::now()).is_none());
    }

    #[test]
    fn test_expire_ignores_superseded_generation() {
        let mut gate = UnlockGate::new();
        let now = Utc::now();
        let first = gate.grant(now);
        let second = gate.grant(now + Duration::seconds(10));

        assert!(!gate.expire(first));
        assert!(gate.is_unlocked());
        assert!(gate.expire(second));
        assert!(!gate.is_unlocked());
        // Expiring twice is a no-op
        assert!(!gate.expire(second));
    }

    #[test]
    fn test_time_until_expiry() {
        let mut gate = UnlockGate::new();
        let now = Utc::now();
        gate.grant(now);

        assert_eq!(gate.minutes_until_expiry(now), Some(30));
        assert_eq!(gate.minutes_until_expiry(now + Duration::minutes(25)), Some(5));
        assert_eq!(gate.minutes_until_expiry(now + Duration::minutes(45)), Some(0));
    }

    #[test]
    fn test_is_playable() {
        let locked = fallback::items(Section::Spotify).remove(0);
        let open = fallback::items(Section::Horror).remove(0);

        assert!(!is_playable(&locked, false));
        assert!(is_playable(&locked, true));
        assert!(is_playable(&open, false));
        assert!(is_playable(&open, true));
    }
}
