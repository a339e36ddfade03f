use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::{EngineError, Result};

/// Logical time source shared by every component of the engine.
///
/// In live operation `now()` is wall-clock time. During replay, the driver
/// claims admin once and then pins fake time to each historical trade's
/// timestamp before dispatching it, so completion checks, risk windows and
/// order creation times are all computed against the trade's own time. This
/// is what makes live and replay runs produce bit-identical decisions.
///
/// At most one identity may ever hold admin; only that identity may switch
/// between real and fake time. All readers call `now()` without holding
/// admin. Create one `Arc<Clock>` per run and inject it everywhere —
/// independent tests get independent clocks.
#[derive(Debug, Default)]
pub struct Clock {
    inner: Mutex<ClockState>,
}

#[derive(Debug, Default)]
struct ClockState {
    fake_time: Option<DateTime<Utc>>,
    admin: Option<String>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to drive this clock.
    ///
    /// Fails if another identity already holds admin. Claiming twice under
    /// the same identity is a no-op.
    pub fn claim_admin(&self, identity: &str) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        match &state.admin {
            Some(holder) if holder != identity => Err(EngineError::ClockAlreadyClaimed {
                holder: holder.clone(),
                claimant: identity.to_string(),
            }),
            _ => {
                state.admin = Some(identity.to_string());
                Ok(())
            }
        }
    }

    /// Switch back to wall-clock time. Admin only.
    pub fn use_real_time(&self, identity: &str) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        Self::check_admin(&state, identity)?;
        state.fake_time = None;
        Ok(())
    }

    /// Pin `now()` to a fixed point in time. Admin only.
    pub fn use_fake_time(&self, identity: &str, time: DateTime<Utc>) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        Self::check_admin(&state, identity)?;
        state.fake_time = Some(time);
        Ok(())
    }

    /// Current logical time: the fake time if one is set, else wall-clock.
    pub fn now(&self) -> DateTime<Utc> {
        let state = self.inner.lock().unwrap();
        state.fake_time.unwrap_or_else(Utc::now)
    }

    /// Clear fake time and admin. Only meaningful between independent
    /// test or replay runs.
    pub fn reset(&self) {
        let mut state = self.inner.lock().unwrap();
        state.fake_time = None;
        state.admin = None;
    }

    fn check_admin(state: &ClockState, identity: &str) -> Result<()> {
        match &state.admin {
            Some(holder) if holder == identity => Ok(()),
            _ => Err(EngineError::NotClockAdmin {
                identity: identity.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_real_time_by_default() {
        let clock = Clock::new();
        let before = Utc::now();
        let now = clock.now();
        let after = Utc::now();
        assert!(now >= before && now <= after);
    }

    #[test]
    fn test_admin_claim_is_exclusive() {
        let clock = Clock::new();
        assert!(clock.claim_admin("replay").is_ok());
        // Re-claiming under the same identity is fine
        assert!(clock.claim_admin("replay").is_ok());

        let err = clock.claim_admin("live-feed").unwrap_err();
        assert!(matches!(err, EngineError::ClockAlreadyClaimed { .. }));
    }

    #[test]
    fn test_non_admin_cannot_set_time() {
        let clock = Clock::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        // No claim yet
        assert!(matches!(
            clock.use_fake_time("anyone", t),
            Err(EngineError::NotClockAdmin { .. })
        ));

        clock.claim_admin("replay").unwrap();
        assert!(matches!(
            clock.use_fake_time("intruder", t),
            Err(EngineError::NotClockAdmin { .. })
        ));
        assert!(matches!(
            clock.use_real_time("intruder"),
            Err(EngineError::NotClockAdmin { .. })
        ));
    }

    #[test]
    fn test_fake_time_round_trip() {
        let clock = Clock::new();
        clock.claim_admin("replay").unwrap();

        let t = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        clock.use_fake_time("replay", t).unwrap();
        assert_eq!(clock.now(), t);

        let later = t + chrono::Duration::seconds(30);
        clock.use_fake_time("replay", later).unwrap();
        assert_eq!(clock.now(), later);

        clock.use_real_time("replay").unwrap();
        assert!(clock.now() > later);
    }

    #[test]
    fn test_reset_clears_admin_and_fake_time() {
        let clock = Clock::new();
        clock.claim_admin("first-run").unwrap();
        clock
            .use_fake_time("first-run", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .unwrap();

        clock.reset();
        assert!(clock.claim_admin("second-run").is_ok());
    }

    #[test]
    fn test_independent_clocks_do_not_interfere() {
        let a = Clock::new();
        let b = Clock::new();
        a.claim_admin("run-a").unwrap();
        b.claim_admin("run-b").unwrap();

        let t = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        a.use_fake_time("run-a", t).unwrap();
        assert_eq!(a.now(), t);
        assert!(b.now() > t);
    }
}
