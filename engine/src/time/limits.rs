//! Parsed `go` parameters. `spec.md` §6: "go [depth N | movetime N | wtime N btime
//! N winc N binc N movestogo N | infinite | nodes N]". Grounded on
//! `pleco_engine/src/time/uci_timer.rs`'s `PreLimits`/`Limits` split, narrowed to
//! the fields this spec's `go` actually recognizes (no `mate`/`ponder`, which
//! `spec.md` §6 does not list).

/// Raw `go` arguments as parsed off the wire, before they're resolved against a
/// side to move.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoLimits {
    pub depth: Option<u16>,
    pub movetime_ms: Option<i64>,
    pub nodes: Option<u64>,
    pub infinite: bool,
    pub wtime_ms: Option<i64>,
    pub btime_ms: Option<i64>,
    pub winc_ms: Option<i64>,
    pub binc_ms: Option<i64>,
    pub movestogo: Option<u32>,
}

impl GoLimits {
    pub fn infinite() -> GoLimits {
        GoLimits { infinite: true, ..GoLimits::default() }
    }
}
