//! Parses the `position` and `go` command bodies. `spec.md` §6: "position
//! [startpos | fen <FEN>] [moves m1 m2 ...]" and "go [depth N | movetime N |
//! wtime N btime N winc N binc N movestogo N | infinite | nodes N]". Grounded on
//! `pleco_engine/src/uci/parse.rs`'s token-walking shape (`position_parse_board`/
//! `parse_time`), rewritten against this crate's `Position`/`GoLimits` types and
//! narrowed to the exact `go` keywords `spec.md` §6 lists (no `mate`/`ponder`).

use minke_core::Position;

use crate::time::GoLimits;

fn is_keyword(arg: &str) -> bool {
    matches!(
        arg,
        "searchmoves" | "wtime" | "btime" | "winc" | "binc" | "movestogo" | "depth" | "nodes" | "movetime" | "infinite"
    )
}

/// Parses the arguments following `go` into a `GoLimits`. Unknown tokens are
/// ignored rather than rejected, matching the teacher's permissive style.
pub fn parse_go(args: &[&str]) -> GoLimits {
    let mut limits = GoLimits::default();
    let mut i = 0;
    while let Some(&token) = args.get(i) {
        match token {
            "infinite" => limits.infinite = true,
            "depth" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.depth = Some(v);
                    i += 1;
                }
            }
            "nodes" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.nodes = Some(v);
                    i += 1;
                }
            }
            "movetime" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.movetime_ms = Some(v);
                    i += 1;
                }
            }
            "wtime" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.wtime_ms = Some(v);
                    i += 1;
                }
            }
            "btime" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.btime_ms = Some(v);
                    i += 1;
                }
            }
            "winc" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.winc_ms = Some(v);
                    i += 1;
                }
            }
            "binc" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.binc_ms = Some(v);
                    i += 1;
                }
            }
            "movestogo" => {
                if let Some(v) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    limits.movestogo = Some(v);
                    i += 1;
                }
            }
            "searchmoves" => {
                while let Some(&next) = args.get(i + 1) {
                    if is_keyword(next) {
                        break;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    limits
}

/// Applies one legal move, identified by its long-algebraic wire string
/// (`spec.md` §6), to `pos`. Returns `false` (and leaves `pos` untouched) if no
/// legal move matches, e.g. on a malformed or illegal UCI move token.
fn apply_uci_move(pos: &mut Position, mov: &str) -> bool {
    let legal = pos.legal_moves();
    if let Some(&m) = legal.iter().find(|m| m.stringify() == mov) {
        pos.make_move(m);
        true
    } else {
        false
    }
}

/// Rebuilds `pos` from a `position ...` command's arguments (the tokens after
/// the literal word `position`).
pub fn apply_position(pos: &mut Position, args: &[&str]) {
    if args.is_empty() {
        return;
    }

    let moves_idx = args.iter().position(|&a| a == "moves");
    let board_args = moves_idx.map(|i| &args[..i]).unwrap_or(args);

    match board_args.first() {
        Some(&"startpos") => *pos = Position::start_pos(),
        Some(&"fen") => {
            let fen = board_args[1..].join(" ");
            if pos.set_fen(&fen).is_err() {
                log::warn!("rejecting malformed FEN: {fen}");
                return;
            }
        }
        _ => return,
    }

    if let Some(idx) = moves_idx {
        for &mov in &args[idx + 1..] {
            if !apply_uci_move(pos, mov) {
                log::warn!("ignoring unrecognized move in position command: {mov}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minke_core::init_globals;

    #[test]
    fn parses_wtime_btime_and_movestogo() {
        let args: Vec<&str> = "wtime 1000 btime 2000 winc 10 binc 20 movestogo 30".split_whitespace().collect();
        let limits = parse_go(&args);
        assert_eq!(limits.wtime_ms, Some(1000));
        assert_eq!(limits.btime_ms, Some(2000));
        assert_eq!(limits.winc_ms, Some(10));
        assert_eq!(limits.binc_ms, Some(20));
        assert_eq!(limits.movestogo, Some(30));
    }

    #[test]
    fn parses_depth_and_infinite() {
        let args: Vec<&str> = "depth 10 infinite".split_whitespace().collect();
        let limits = parse_go(&args);
        assert_eq!(limits.depth, Some(10));
        assert!(limits.infinite);
    }

    #[test]
    fn applies_startpos_and_moves() {
        init_globals();
        let mut pos = Position::start_pos();
        let args: Vec<&str> = "startpos moves e2e4 e7e5".split_whitespace().collect();
        apply_position(&mut pos, &args);
        assert_eq!(pos.ply(), 2);
    }

    #[test]
    fn applies_fen() {
        init_globals();
        let mut pos = Position::start_pos();
        let args: Vec<&str> = "fen 8/8/8/4k3/8/3K4/8/8 w - - 0 1".split_whitespace().collect();
        apply_position(&mut pos, &args);
        assert_eq!(pos.turn(), minke_core::Player::White);
    }
}
