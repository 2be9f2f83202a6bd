//! Optimum/maximum search deadlines. `spec.md` §4.9/C13.
//!
//! Grounded on `pleco_engine/src/time/time_management.rs`'s `TimeManager` shape
//! (an `Instant` start plus precomputed optimum/maximum millisecond budgets,
//! shared read-only once a search starts) but the formula itself is replaced
//! wholesale: the teacher's hypothetical-moves-to-go sampling loop and
//! `move_importance` curve is tuned to Stockfish-era parameters this spec does
//! not carry forward (`spec.md` §1 Non-goals: "bit-identical reproduction of
//! tuned parameter defaults"). `spec.md` §4.9 gives a closed-form formula
//! instead, which this implementation follows exactly. Lock-free: `start` is
//! stored as a nanosecond offset from a process-wide epoch so every field here
//! is a plain atomic, matching `spec.md` §5's "Stop flags ... a single atomic
//! boolean suffices" spirit for the time-keeping side of search state.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use minke_core::Player;

use super::limits::GoLimits;

fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// Deadlines for one search. Written once by the thread that starts the search
/// (`init`), then polled read-only by every worker thread.
pub struct TimeManager {
    start_nanos: AtomicU64,
    optimum_ms: AtomicI64,
    maximum_ms: AtomicI64,
    has_deadline: AtomicBool,
}

impl TimeManager {
    pub fn new() -> TimeManager {
        TimeManager {
            start_nanos: AtomicU64::new(0),
            optimum_ms: AtomicI64::new(i64::MAX),
            maximum_ms: AtomicI64::new(i64::MAX),
            has_deadline: AtomicBool::new(false),
        }
    }

    /// Computes and stores optimum/maximum deadlines per `spec.md` §4.9. `stm` is
    /// used only to pick which side's `wtime`/`winc` apply.
    pub fn init(&self, stm: Player, limits: &GoLimits) {
        let now = Instant::now();
        self.start_nanos.store(now.duration_since(epoch()).as_nanos() as u64, Ordering::Relaxed);

        let (time_ms, inc_ms) = match stm {
            Player::White => (limits.wtime_ms.unwrap_or(0), limits.winc_ms.unwrap_or(0)),
            Player::Black => (limits.btime_ms.unwrap_or(0), limits.binc_ms.unwrap_or(0)),
        };

        let all_zero = time_ms == 0 && inc_ms == 0 && limits.movestogo.is_none() && limits.movetime_ms.is_none();

        if limits.infinite || all_zero {
            self.has_deadline.store(false, Ordering::Relaxed);
            self.optimum_ms.store(i64::MAX, Ordering::Relaxed);
            self.maximum_ms.store(i64::MAX, Ordering::Relaxed);
            return;
        }

        let (optimum, maximum) = if let Some(mt) = limits.movetime_ms.filter(|&mt| mt > 0) {
            let budget = (mt - 50).max(mt / 2);
            (budget, budget)
        } else {
            let mtg = limits.movestogo.map(|m| m.clamp(1, 50)).unwrap_or(50) as f64;
            let base = 0.8 * time_ms as f64 / mtg + inc_ms as f64;
            let cap = 0.8 * time_ms as f64;
            (base.min(cap).max(0.0), (4.0 * base).min(cap).max(0.0))
        };

        self.has_deadline.store(true, Ordering::Relaxed);
        self.optimum_ms.store(optimum as i64, Ordering::Relaxed);
        self.maximum_ms.store(maximum as i64, Ordering::Relaxed);
    }

    #[inline]
    pub fn elapsed_ms(&self) -> i64 {
        let start = epoch() + std::time::Duration::from_nanos(self.start_nanos.load(Ordering::Relaxed));
        Instant::now().saturating_duration_since(start).as_millis() as i64
    }

    /// Past the hard deadline: the current search must abort immediately.
    /// `spec.md` §4.9: "hard (past maximum) aborts immediately".
    #[inline]
    pub fn hard_expired(&self) -> bool {
        self.has_deadline.load(Ordering::Relaxed) && self.elapsed_ms() >= self.maximum_ms.load(Ordering::Relaxed)
    }

    /// Past the soft deadline: the next iterative-deepening depth must not
    /// start. `spec.md` §4.9: "soft (past optimum and current depth completed)
    /// prevents starting the next depth".
    #[inline]
    pub fn soft_expired(&self) -> bool {
        self.has_deadline.load(Ordering::Relaxed) && self.elapsed_ms() >= self.optimum_ms.load(Ordering::Relaxed)
    }

    pub fn has_deadline(&self) -> bool {
        self.has_deadline.load(Ordering::Relaxed)
    }
}

impl Default for TimeManager {
    fn default() -> TimeManager {
        TimeManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_search_never_expires() {
        let tm = TimeManager::new();
        tm.init(Player::White, &GoLimits::infinite());
        assert!(!tm.hard_expired());
        assert!(!tm.soft_expired());
    }

    #[test]
    fn movetime_budget_uses_the_max_of_the_two_formulas() {
        let tm = TimeManager::new();
        let limits = GoLimits { movetime_ms: Some(1000), ..GoLimits::default() };
        tm.init(Player::White, &limits);
        // max(1000-50, 1000/2) = 950
        assert_eq!(tm.maximum_ms.load(Ordering::Relaxed), 950);
        assert_eq!(tm.optimum_ms.load(Ordering::Relaxed), 950);
    }

    #[test]
    fn time_control_budget_is_capped_at_80_percent_of_remaining_time() {
        let tm = TimeManager::new();
        let limits = GoLimits { wtime_ms: Some(1000), movestogo: Some(1), ..GoLimits::default() };
        tm.init(Player::White, &limits);
        // base = 0.8*1000/1 = 800, capped at 0.8*1000 = 800; maximum = min(3200, 800) = 800
        assert_eq!(tm.optimum_ms.load(Ordering::Relaxed), 800);
        assert_eq!(tm.maximum_ms.load(Ordering::Relaxed), 800);
    }
}
