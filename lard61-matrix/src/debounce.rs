//! Debounce logic.
//!
//! A raw scan only becomes the stable key state once the matrix has been
//! electrically quiet for longer than the debounce threshold. By default the
//! quiet timer is shared by the whole matrix: one bouncing key delays every
//! other key as well. `PerKeyDebouncer` keeps one timer per key instead.

use crate::config::{DebounceStrategy, ScanConfig};
use crate::keyset::KeySet;
use crate::layout::{KeyIndex, KEY_COUNT};

/// Microsecond timestamp, as produced by the RP2040 timer.
pub type Instant = fugit::TimerInstantU64<1_000_000>;
/// Microsecond duration.
pub type Duration = fugit::MicrosDurationU64;

/// Quiet time required before a new raw state is committed.
pub const DEBOUNCE_THRESHOLD: Duration = Duration::millis(4);

const BOOT: Instant = Instant::from_ticks(0);

pub trait Debounce {
    /// Feed one raw scan taken at `now` and get the current stable state.
    fn filter(&mut self, raw: KeySet, now: Instant) -> KeySet;

    /// Stable state after the last call to `filter`.
    fn stable(&self) -> KeySet;
}

fn elapsed(now: Instant, since: Instant) -> Duration {
    now.checked_duration_since(since)
        .unwrap_or(Duration::from_ticks(0))
}

/// Whole-matrix debouncer with a single change clock.
pub struct MatrixDebouncer {
    stable: KeySet,
    /// Raw state seen by the previous call, `None` before the first call.
    last_raw: Option<KeySet>,
    /// Last time any raw bit changed, or the last commit.
    changed_at: Instant,
    threshold: Duration,
}

impl MatrixDebouncer {
    pub const fn new(threshold: Duration) -> Self {
        Self {
            stable: KeySet::empty(),
            last_raw: None,
            changed_at: BOOT,
            threshold,
        }
    }

    pub fn changed_at(&self) -> Instant {
        self.changed_at
    }
}

impl Debounce for MatrixDebouncer {
    fn filter(&mut self, raw: KeySet, now: Instant) -> KeySet {
        if self.last_raw.is_some_and(|prev| prev != raw) {
            self.changed_at = now;
        }
        self.last_raw = Some(raw);

        if raw != self.stable && elapsed(now, self.changed_at) > self.threshold {
            #[cfg(feature = "defmt")]
            defmt::trace!("debounce: commit {} keys", raw.len());
            self.stable = raw;
            self.changed_at = now;
        }

        self.stable
    }

    fn stable(&self) -> KeySet {
        self.stable
    }
}

/// Per-key debouncer: each key keeps its own change clock.
pub struct PerKeyDebouncer {
    stable: KeySet,
    last_raw: Option<KeySet>,
    changed_at: [Instant; KEY_COUNT],
    threshold: Duration,
}

impl PerKeyDebouncer {
    pub const fn new(threshold: Duration) -> Self {
        Self {
            stable: KeySet::empty(),
            last_raw: None,
            changed_at: [BOOT; KEY_COUNT],
            threshold,
        }
    }
}

impl Debounce for PerKeyDebouncer {
    fn filter(&mut self, raw: KeySet, now: Instant) -> KeySet {
        for key in KeyIndex::all() {
            let pressed = raw.contains(key);
            let slot = &mut self.changed_at[key.index()];

            if self.last_raw.is_some_and(|prev| prev.contains(key) != pressed) {
                *slot = now;
            }

            if pressed != self.stable.contains(key) && elapsed(now, *slot) > self.threshold {
                self.stable.set(key, pressed);
                *slot = now;
            }
        }
        self.last_raw = Some(raw);

        self.stable
    }

    fn stable(&self) -> KeySet {
        self.stable
    }
}

/// Debouncer selected by `ScanConfig::debounce`.
pub enum Debouncer {
    WholeMatrix(MatrixDebouncer),
    PerKey(PerKeyDebouncer),
}

impl Debouncer {
    pub fn new(config: &ScanConfig) -> Self {
        match config.debounce {
            DebounceStrategy::WholeMatrix => {
                Debouncer::WholeMatrix(MatrixDebouncer::new(config.debounce_threshold))
            }
            DebounceStrategy::PerKey => {
                Debouncer::PerKey(PerKeyDebouncer::new(config.debounce_threshold))
            }
        }
    }
}

impl Debounce for Debouncer {
    fn filter(&mut self, raw: KeySet, now: Instant) -> KeySet {
        match self {
            Debouncer::WholeMatrix(d) => d.filter(raw, now),
            Debouncer::PerKey(d) => d.filter(raw, now),
        }
    }

    fn stable(&self) -> KeySet {
        match self {
            Debouncer::WholeMatrix(d) => d.stable(),
            Debouncer::PerKey(d) => d.stable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(t: u64) -> Instant {
        Instant::from_ticks(t * 1000)
    }

    fn keys(list: &[(usize, usize)]) -> KeySet {
        list.iter().map(|&(r, c)| KeyIndex::at(r, c)).collect()
    }

    /// Settle a debouncer on `state` well after boot.
    fn settled<D: Debounce>(mut d: D, state: KeySet, until: u64) -> D {
        for t in 10..until {
            d.filter(state, ms(t));
        }
        assert_eq!(d.stable(), state);
        d
    }

    #[test]
    fn commits_after_quiet_threshold() {
        let mut d = settled(MatrixDebouncer::new(DEBOUNCE_THRESHOLD), KeySet::empty(), 20);
        let pressed = keys(&[(0, 1)]);

        // First sample of the press at 100 ms, then every millisecond
        for t in 100..=104 {
            assert!(d.filter(pressed, ms(t)).is_empty(), "committed early at {t} ms");
        }
        assert_eq!(d.filter(pressed, ms(105)), pressed);
    }

    #[test]
    fn bounce_restarts_the_clock() {
        let mut d = settled(MatrixDebouncer::new(DEBOUNCE_THRESHOLD), KeySet::empty(), 20);
        let pressed = keys(&[(2, 5)]);

        d.filter(pressed, ms(100));
        d.filter(KeySet::empty(), ms(101));
        d.filter(pressed, ms(102));
        for t in 103..=106 {
            assert!(d.filter(pressed, ms(t)).is_empty());
        }
        assert_eq!(d.filter(pressed, ms(107)), pressed);
    }

    #[test]
    fn one_commit_per_change_episode() {
        let mut d = settled(MatrixDebouncer::new(DEBOUNCE_THRESHOLD), KeySet::empty(), 20);
        let pressed = keys(&[(1, 4), (3, 7)]);

        let mut commits = 0;
        let mut commit_clock = None;
        for t in 100..200 {
            let before = d.stable();
            let after = d.filter(pressed, ms(t));
            if before != after {
                commits += 1;
                commit_clock = Some(d.changed_at());
            }
        }
        assert_eq!(commits, 1);
        // The change clock is not moved again once the state is committed
        assert_eq!(d.changed_at(), commit_clock.unwrap());
    }

    #[test]
    fn converges_to_any_steady_input() {
        let start = keys(&[(0, 0), (4, 10), (2, 12)]);
        let target = keys(&[(2, 12), (3, 3)]);
        let mut d = settled(MatrixDebouncer::new(DEBOUNCE_THRESHOLD), start, 20);
        for t in 50..60 {
            d.filter(target, ms(t));
        }
        assert_eq!(d.stable(), target);
    }

    #[test]
    fn first_call_is_not_a_change() {
        let mut d = MatrixDebouncer::new(DEBOUNCE_THRESHOLD);
        let pressed = keys(&[(0, 3)]);
        // The initial clock is at boot, long enough ago to commit right away
        assert_eq!(d.filter(pressed, ms(50)), pressed);
        assert_eq!(d.changed_at(), ms(50));
    }

    #[test]
    fn whole_matrix_bounce_delays_other_keys() {
        let mut d = settled(MatrixDebouncer::new(DEBOUNCE_THRESHOLD), KeySet::empty(), 20);
        let steady = keys(&[(0, 1)]);
        let with_bounce = keys(&[(0, 1), (3, 3)]);

        // Key (3, 3) bounces every other millisecond, (0, 1) is held steadily
        for t in 100..120 {
            let raw = if t % 2 == 0 { with_bounce } else { steady };
            assert!(d.filter(raw, ms(t)).is_empty());
        }
    }

    #[test]
    fn per_key_settles_independently() {
        let mut d = settled(PerKeyDebouncer::new(DEBOUNCE_THRESHOLD), KeySet::empty(), 20);
        let steady = keys(&[(0, 1)]);
        let with_bounce = keys(&[(0, 1), (3, 3)]);

        for t in 100..=104 {
            let raw = if t % 2 == 0 { with_bounce } else { steady };
            assert!(d.filter(raw, ms(t)).is_empty());
        }
        assert_eq!(d.filter(steady, ms(105)), steady);
    }

    #[test]
    fn debouncer_follows_config() {
        let mut config = ScanConfig::default();
        assert!(matches!(Debouncer::new(&config), Debouncer::WholeMatrix(_)));
        config.debounce = DebounceStrategy::PerKey;
        assert!(matches!(Debouncer::new(&config), Debouncer::PerKey(_)));
    }
}
