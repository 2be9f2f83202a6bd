//! Iterative-deepening alpha-beta search. `spec.md` §4.8/C12.
//!
//! Grounded on `pleco_engine/src/search/mod.rs`'s overall loop shape (TT probe,
//! move-picker-driven move loop, PV propagation up through recursive calls) but
//! generalized to add the pruning and reduction techniques `spec.md` §4.8 requires
//! that the teacher's `Jamboree`-style plain alpha-beta predates entirely: null-move
//! pruning, reverse futility, late-move reductions/pruning, internal iterative
//! reduction and aspiration windows. The teacher's lookup-table reduction arrays
//! (`static mut REDUCTIONS`) are replaced with the closed-form `ln(d)*ln(i)` formula
//! `spec.md` §4.8 gives directly, computed once per node rather than precomputed —
//! this search does not run deep enough in a single-node budget (`spec.md` §4.10
//! datagen workers cap at 100k nodes) for that to matter.

use minke_core::core::score::{
    self, Value, INFINITE, MATE_FOUND, NEG_INFINITE, VALUE_NONE, ZERO,
};
use minke_core::core::{PieceType, Player, MAX_PLY};
use minke_core::tt::{Bound, TranspositionTable};
use minke_core::{BitMove, Position};

use crate::history::History;
use crate::movepick::MovePicker;
use crate::threadpool::ThreadData;
use crate::time::TimeManager;

/// Tunable search constants, surfaced to UCI as plain integer options (`spec.md`
/// §6 "optional tunable integers (see Glossary)"). Defaults are reasonable, not
/// tuned: `spec.md` §1 Non-goals disclaims "bit-identical reproduction of tuned
/// parameter defaults".
#[derive(Clone, Copy, Debug)]
pub struct SearchParams {
    pub max_search_depth: i32,
    pub aw_min_depth: i32,
    pub aw_first_window: i32,
    pub aw_widening_factor: i32,
    pub iir_min_depth: i32,
    pub iir_depth_reduction: i32,
    pub rfp_max_depth: i32,
    pub rfp_margin: i32,
    pub nmp_min_depth: i32,
    pub nmp_base_reduction: i32,
    pub nmp_depth_reduction_divisor: i32,
    pub lmp_base: i32,
    pub lmp_scale: i32,
    pub lmr_base: i32,
    pub lmr_divisor: i32,
}

impl Default for SearchParams {
    fn default() -> SearchParams {
        SearchParams {
            max_search_depth: 128,
            aw_min_depth: 4,
            aw_first_window: 25,
            aw_widening_factor: 50,
            iir_min_depth: 4,
            iir_depth_reduction: 1,
            rfp_max_depth: 8,
            rfp_margin: 75,
            nmp_min_depth: 3,
            nmp_base_reduction: 3,
            nmp_depth_reduction_divisor: 4,
            lmp_base: 3,
            lmp_scale: 2,
            lmr_base: 75,
            lmr_divisor: 195,
        }
    }
}

/// One `info depth ...` line's worth of data, handed to the caller-supplied
/// reporter so `minke_engine::uci` can format it without this module knowing
/// about stdout. `spec.md` §10.1: "a logging framework must never intermix with
/// the protocol stream" — keeping the print call out of `search` keeps that true.
pub struct SearchInfo<'a> {
    pub depth: i32,
    pub seldepth: usize,
    pub score: Value,
    pub nodes: u64,
    pub elapsed_ms: i64,
    pub pv: &'a [BitMove],
    pub hashfull: u32,
}

/// Runs iterative deepening from depth 1 up to `depth_limit` (or
/// `params.max_search_depth`), returning the best move found once time runs out
/// or the depth cap is reached. `spec.md` §4.8.
pub fn iterative_deepening(
    td: &mut ThreadData,
    tt: &TranspositionTable,
    tm: &TimeManager,
    params: &SearchParams,
    depth_limit: Option<u16>,
    mut report: impl FnMut(SearchInfo),
) -> BitMove {
    let max_depth = depth_limit
        .map(|d| (d as i32).min(params.max_search_depth))
        .unwrap_or(params.max_search_depth);

    let mut score = ZERO;
    let mut depth = 1;

    while depth <= max_depth {
        if depth > 1 && (tm.soft_expired() || td.is_stopped()) {
            break;
        }

        let mut pv = Vec::new();
        let iter_score = if depth >= params.aw_min_depth {
            aspiration_search(td, tt, tm, params, depth, score, &mut pv)
        } else {
            negamax(td, tt, tm, params, depth, 0, NEG_INFINITE, INFINITE, true, &mut pv)
        };

        if td.is_stopped() && depth > 1 {
            break;
        }

        score = iter_score;
        if let Some(&m) = pv.first() {
            td.best_move = m;
        }
        td.pv = pv;
        td.best_score = score;

        report(SearchInfo {
            depth,
            seldepth: td.seldepth,
            score,
            nodes: td.nodes,
            elapsed_ms: tm.elapsed_ms(),
            pv: &td.pv,
            hashfull: tt.hashfull(),
        });

        if td.best_move.is_null() {
            break;
        }
        depth += 1;
    }

    td.best_move
}

/// Narrows the window around the previous iteration's score, widening and
/// retrying on a fail-high/fail-low until the true score lands inside. `spec.md`
/// §4.8 "Aspiration windows".
fn aspiration_search(
    td: &mut ThreadData,
    tt: &TranspositionTable,
    tm: &TimeManager,
    params: &SearchParams,
    depth: i32,
    prev_score: Value,
    pv: &mut Vec<BitMove>,
) -> Value {
    let mut delta = params.aw_first_window;
    let mut alpha = (prev_score - delta).max(NEG_INFINITE);
    let mut beta = (prev_score + delta).min(INFINITE);

    loop {
        pv.clear();
        let score = negamax(td, tt, tm, params, depth, 0, alpha, beta, true, pv);

        if td.is_stopped() {
            return score;
        }
        if score <= alpha {
            beta = ((alpha as i64 + beta as i64) / 2) as Value;
            alpha = (alpha - delta).max(NEG_INFINITE);
        } else if score >= beta {
            beta = (beta + delta).min(INFINITE);
        } else {
            return score;
        }

        if alpha <= NEG_INFINITE && beta >= INFINITE {
            pv.clear();
            return negamax(td, tt, tm, params, depth, 0, NEG_INFINITE, INFINITE, true, pv);
        }
        delta += delta * params.aw_widening_factor / 100;
    }
}

/// Iterative deepening bounded by node counts instead of wall-clock time:
/// `spec.md` §4.10's verification search (depth ≤ 14, soft 80k / hard 500k
/// nodes) and per-ply search (depth = MAX, soft 25k / hard 100k nodes) both
/// call this. Shares `negamax`/`aspiration_search` with `iterative_deepening`;
/// only the between-depths stopping rule differs — node count rather than
/// `TimeManager::soft_expired`.
pub fn node_budgeted_search(
    td: &mut ThreadData,
    tt: &TranspositionTable,
    params: &SearchParams,
    max_depth: i32,
    soft_nodes: u64,
    hard_nodes: u64,
) -> Value {
    let tm = TimeManager::new();
    td.hard_stop = false;
    td.nodes = 0;
    td.seldepth = 0;
    td.node_limit = Some(hard_nodes);

    let mut score = ZERO;
    let mut depth = 1;
    let cap = max_depth.min(params.max_search_depth);

    while depth <= cap {
        if depth > 1 && (td.nodes >= soft_nodes || td.is_stopped()) {
            break;
        }

        let mut pv = Vec::new();
        let iter_score = if depth >= params.aw_min_depth {
            aspiration_search(td, tt, &tm, params, depth, score, &mut pv)
        } else {
            negamax(td, tt, &tm, params, depth, 0, NEG_INFINITE, INFINITE, true, &mut pv)
        };

        if td.is_stopped() && depth > 1 {
            break;
        }

        score = iter_score;
        if let Some(&m) = pv.first() {
            td.best_move = m;
        }
        td.pv = pv;
        td.best_score = score;

        if td.best_move.is_null() {
            break;
        }
        depth += 1;
    }

    score
}

fn has_non_pawn_material(pos: &Position, side: Player) -> bool {
    const PIECES: [PieceType; 4] = [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen];
    PIECES.iter().any(|&pt| pos.piece_bb(side, pt).is_not_empty())
}

/// The negamax alpha-beta recursion with `spec.md` §4.8's pruning/reduction
/// stack, executed at every non-leaf node in the exact order the spec lists.
#[allow(clippy::too_many_arguments)]
fn negamax(
    td: &mut ThreadData,
    tt: &TranspositionTable,
    tm: &TimeManager,
    params: &SearchParams,
    mut depth: i32,
    ply: i32,
    mut alpha: Value,
    beta: Value,
    is_pv: bool,
    pv: &mut Vec<BitMove>,
) -> Value {
    pv.clear();

    if td.is_stopped() {
        return ZERO;
    }
    td.nodes += 1;
    if td.nodes % 4096 == 0 && (tm.hard_expired() || td.node_limit.is_some_and(|n| td.nodes >= n)) {
        td.hard_stop = true;
        return ZERO;
    }
    td.seldepth = td.seldepth.max(ply as usize);

    if ply > 0 && td.position.draw() {
        return ZERO;
    }

    let hash = td.position.zobrist();
    let mut tt_move = BitMove::NULL;
    if let Some(entry) = tt.probe(hash) {
        tt_move = entry.best_move;
        if entry.depth as i32 >= depth && entry.score != VALUE_NONE {
            let score = score::value_from_tt(entry.score, ply);
            let cutoff = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => score >= beta,
                Bound::Upper => score <= alpha,
                Bound::None => false,
            };
            if cutoff && !is_pv {
                return score;
            }
        }
    }

    if depth <= 0 || ply as usize >= MAX_PLY {
        return quiescence(td, tt, alpha, beta, ply);
    }

    let in_check = td.position.in_check();
    let stm = td.position.turn();
    let static_eval = td.position.eval();

    // Internal iterative reduction: no TT move to trust, so shrink this node's
    // depth rather than spend a full-depth search ordering blind. `spec.md` §4.8.
    if depth >= params.iir_min_depth && tt_move.is_null() {
        depth -= params.iir_depth_reduction;
    }

    // Reverse futility pruning.
    if !is_pv && !in_check && depth <= params.rfp_max_depth && static_eval - params.rfp_margin * depth >= beta {
        return static_eval;
    }

    // Null-move pruning.
    if !is_pv
        && !in_check
        && depth >= params.nmp_min_depth
        && static_eval >= beta
        && has_non_pawn_material(&td.position, stm)
    {
        let r = params.nmp_base_reduction + depth / params.nmp_depth_reduction_divisor;
        td.position.make_null_move();
        let mut null_pv = Vec::new();
        let score = -negamax(td, tt, tm, params, depth - 1 - r, ply + 1, -beta, -beta + 1, false, &mut null_pv);
        td.position.unmake_null_move();
        if td.is_stopped() {
            return ZERO;
        }
        if score >= beta {
            return beta;
        }
    }

    let mut picker = MovePicker::new(tt_move, ply as usize, false);
    let mut move_count = 0i32;
    let mut best_score = NEG_INFINITE;
    let mut best_move = BitMove::NULL;
    let mut bound = Bound::Upper;
    let mut tried_quiets: Vec<BitMove> = Vec::new();
    let mut tried_captures: Vec<(BitMove, PieceType, PieceType)> = Vec::new();

    while let Some(m) = picker.next(&td.position, &td.history) {
        let is_quiet = !m.is_noisy();

        // Late-move pruning: skip late quiets outright at shallow depth.
        if !is_pv && is_quiet && move_count >= params.lmp_base + params.lmp_scale * depth * depth / 100 {
            continue;
        }

        let moved_pt = td.position.piece_type_at(m.get_src());
        let captured_pt = td.position.piece_type_at(m.get_dest());

        if !td.position.make_move(m) {
            continue;
        }
        move_count += 1;

        let mut child_pv = Vec::new();
        let score = if move_count >= 4 && is_quiet {
            let d = depth.max(1) as f64;
            let i = move_count as f64;
            let base = params.lmr_base as f64 / 100.0;
            let div = (params.lmr_divisor as f64 / 100.0).max(0.01);
            let mut r = base + d.ln() * i.ln() / div;
            if !is_pv {
                r += 1.0;
            }
            if td.history.is_killer(ply as usize, m) || td.history.butterfly_score(stm, m) > 8000 {
                r -= 1.0;
            }
            let r = (r.round() as i32).clamp(0, depth - 1);

            let mut s = -negamax(td, tt, tm, params, depth - 1 - r, ply + 1, -alpha - 1, -alpha, false, &mut child_pv);
            if s > alpha && r > 0 {
                s = -negamax(td, tt, tm, params, depth - 1, ply + 1, -alpha - 1, -alpha, false, &mut child_pv);
            }
            if s > alpha && is_pv {
                s = -negamax(td, tt, tm, params, depth - 1, ply + 1, -beta, -alpha, true, &mut child_pv);
            }
            s
        } else if move_count > 1 {
            let mut s = -negamax(td, tt, tm, params, depth - 1, ply + 1, -alpha - 1, -alpha, false, &mut child_pv);
            if s > alpha && s < beta {
                s = -negamax(td, tt, tm, params, depth - 1, ply + 1, -beta, -alpha, true, &mut child_pv);
            }
            s
        } else {
            -negamax(td, tt, tm, params, depth - 1, ply + 1, -beta, -alpha, true, &mut child_pv)
        };

        td.position.unmake_move();

        if is_quiet {
            tried_quiets.push(m);
        } else if let (Some(mpt), Some(cpt)) = (moved_pt, captured_pt) {
            tried_captures.push((m, mpt, cpt));
        }

        if td.is_stopped() {
            return ZERO;
        }

        if score > best_score {
            best_score = score;
            best_move = m;
            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
                pv.clear();
                pv.push(m);
                pv.extend_from_slice(&child_pv);
            }
        }

        if alpha >= beta {
            if is_quiet {
                td.history.update_quiet(stm, ply as usize, depth, m, &tried_quiets);
            }
            if !tried_captures.is_empty() {
                td.history.update_capture(depth, m, &tried_captures);
            }
            tt.store(hash, m, score::value_to_tt(beta, ply), depth as i8, Bound::Lower, is_pv);
            return beta;
        }
    }

    if move_count == 0 {
        return if in_check { score::mated_in(ply) } else { ZERO };
    }

    tt.store(hash, best_move, score::value_to_tt(best_score, ply), depth as i8, bound, is_pv);
    best_score
}

/// Quiescence search: resolves tactical tension by considering only noisy moves
/// that pass SEE, starting from a stand-pat bound. `spec.md` §4.8.
fn quiescence(td: &mut ThreadData, tt: &TranspositionTable, mut alpha: Value, beta: Value, ply: i32) -> Value {
    td.nodes += 1;
    td.seldepth = td.seldepth.max(ply as usize);

    if td.position.draw() {
        return ZERO;
    }

    let stand_pat = td.position.eval();
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut picker = MovePicker::new_qsearch(BitMove::NULL, ply as usize);
    let history = History::new();
    let mut best = stand_pat;

    while let Some(m) = picker.next(&td.position, &history) {
        if !td.position.make_move(m) {
            continue;
        }
        let score = -quiescence(td, tt, -beta, -alpha, ply + 1);
        td.position.unmake_move();

        if td.is_stopped() {
            return ZERO;
        }
        if score > best {
            best = score;
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    return beta;
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threadpool::ThreadData;
    use minke_core::tt::TranspositionTable;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn fresh_thread_data(pos: Position) -> ThreadData {
        minke_core::init_globals();
        ThreadData::new_for_test(pos, Arc::new(AtomicBool::new(false)), None)
    }

    #[test]
    fn negating_side_to_move_negates_the_score() {
        let tt = TranspositionTable::new(1);
        let tm = TimeManager::new();
        let params = SearchParams::default();

        let mut white_td = fresh_thread_data(Position::start_pos());
        let mut wpv = Vec::new();
        let white_score =
            negamax(&mut white_td, &tt, &tm, &params, 3, 0, NEG_INFINITE, INFINITE, true, &mut wpv);

        let mut black_pos = Position::start_pos();
        black_pos.make_null_move();
        let mut black_td = fresh_thread_data(black_pos);
        let tt2 = TranspositionTable::new(1);
        let mut bpv = Vec::new();
        let black_score =
            negamax(&mut black_td, &tt2, &tm, &params, 3, 0, NEG_INFINITE, INFINITE, true, &mut bpv);

        // The mirrored position (same pieces, opposite side to move, no prior
        // move played) must evaluate to the negated score from White's search.
        assert_eq!(white_score, black_score);
    }

    #[test]
    fn null_window_probe_never_lands_strictly_inside() {
        let tt = TranspositionTable::new(1);
        let tm = TimeManager::new();
        let params = SearchParams::default();
        let mut td = fresh_thread_data(Position::start_pos());
        let mut pv = Vec::new();
        let alpha = 10;
        let score = negamax(&mut td, &tt, &tm, &params, 4, 0, alpha, alpha + 1, false, &mut pv);
        assert!(score <= alpha || score >= alpha + 1);
    }

    #[test]
    fn finds_mate_in_one() {
        // Black to move is checkmated by a rook swing; search from the side
        // about to deliver it: Qh5-h7# against a king boxed in on h8.
        minke_core::init_globals();
        let mut pos = Position::blank();
        pos.set_fen("6k1/6pp/8/7Q/8/8/8/6K1 w - - 0 1").unwrap();
        let tt = TranspositionTable::new(1);
        let tm = TimeManager::new();
        let params = SearchParams::default();
        let mut td = ThreadData::new_for_test(pos, Arc::new(AtomicBool::new(false)), None);
        let mut pv = Vec::new();
        let score = negamax(&mut td, &tt, &tm, &params, 4, 0, NEG_INFINITE, INFINITE, true, &mut pv);
        assert!(score >= MATE_FOUND);
    }
}
