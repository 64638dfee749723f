use super::*;

/// A retarget is considered once this many shares have arrived since the
/// last change.
const RETARGET_MIN_SHARES: u32 = 4;
/// And at least this long has passed since the last change.
const RETARGET_MIN_INTERVAL: Duration = Duration::from_secs(60);
/// Per-retarget step bounds relative to the current difficulty.
const MAX_STEP_UP: f64 = 4.0;
const MAX_STEP_DOWN: f64 = 0.25;
/// Changes below this relative magnitude are not worth a notification.
const RETARGET_THRESHOLD: f64 = 0.1;

/// Per-connection difficulty controller. Estimates the miner's hashrate
/// from the shares accepted since the last retarget and steers the share
/// interval toward the configured target.
#[derive(Debug, Clone)]
pub(crate) struct Vardiff {
    target_share_time: Duration,
    min_difficulty: f64,
    max_difficulty: f64,
    current: Difficulty,
    shares_since_retarget: u32,
    last_retarget: Instant,
    suggested: Option<f64>,
}

impl Vardiff {
    pub(crate) fn new(
        start_diff: Difficulty,
        target_share_time: Duration,
        min_difficulty: f64,
        max_difficulty: f64,
    ) -> Self {
        Self {
            target_share_time,
            min_difficulty,
            max_difficulty,
            current: start_diff,
            shares_since_retarget: 0,
            last_retarget: Instant::now(),
            suggested: None,
        }
    }

    pub(crate) fn current(&self) -> Difficulty {
        self.current
    }

    /// A miner suggestion replaces the estimate at the next retarget
    /// opportunity, still subject to the step and absolute clamps.
    pub(crate) fn suggest(&mut self, difficulty: f64) {
        if difficulty.is_finite() && difficulty > 0.0 {
            self.suggested = Some(difficulty);
        }
    }

    /// Records an accepted share. Returns the new difficulty when a
    /// retarget fires.
    pub(crate) fn record_share(&mut self) -> Option<Difficulty> {
        self.record_share_at(Instant::now())
    }

    fn record_share_at(&mut self, now: Instant) -> Option<Difficulty> {
        self.shares_since_retarget += 1;

        if self.shares_since_retarget < RETARGET_MIN_SHARES {
            return None;
        }

        let elapsed = now.duration_since(self.last_retarget);
        if elapsed < RETARGET_MIN_INTERVAL {
            return None;
        }

        let current = self.current.as_f64();

        // hashrate ~ shares * diff * 2^32 / elapsed; the ideal difficulty
        // for the target interval cancels the 2^32.
        let ideal = match self.suggested.take() {
            Some(suggested) => suggested,
            None => {
                f64::from(self.shares_since_retarget) * current
                    * self.target_share_time.as_secs_f64()
                    / elapsed.as_secs_f64()
            }
        };

        let clamped = ideal
            .clamp(current * MAX_STEP_DOWN, current * MAX_STEP_UP)
            .clamp(self.min_difficulty, self.max_difficulty);

        if ((clamped - current) / current).abs() <= RETARGET_THRESHOLD {
            return None;
        }

        debug!(
            "Vardiff: {} -> {} after {} shares in {:.1}s",
            self.current,
            clamped,
            self.shares_since_retarget,
            elapsed.as_secs_f64()
        );

        self.current = Difficulty::from(clamped);
        self.shares_since_retarget = 0;
        self.last_retarget = now;

        Some(self.current)
    }
}
