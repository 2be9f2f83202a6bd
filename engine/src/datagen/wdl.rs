//! Score normalization used only to decide when a game's evaluation has
//! settled enough to adjudicate a win/draw early (`spec.md` §4.10's score-based
//! termination rules). Grounded on `examples/original_source/src/wdl.h`'s
//! `wdl_params`/`normalize_score` — a degree-3 polynomial fit of the
//! win-rate model against a phase-scaled material count, carried over for
//! datagen adjudication only; no WDL-model-trained NNUE consumes this.

use minke_core::core::PieceType;
use minke_core::{Player, Position};

const AS: [f64; 4] = [-227.94583896, 747.68060207, -1001.65274826, 924.95005977];
const BS: [f64; 4] = [-199.22343617, 563.09782966, -384.92825183, 246.99147853];

/// Sum of standard piece-unit values (pawn=1, minor=3, rook=5, queen=9) across
/// both sides, excluding kings — the same unit scale `wdl.h` clamps to 17..78.
fn material_count(pos: &Position) -> i32 {
    const UNITS: [(PieceType, i32); 5] = [
        (PieceType::Pawn, 1),
        (PieceType::Knight, 3),
        (PieceType::Bishop, 3),
        (PieceType::Rook, 5),
        (PieceType::Queen, 9),
    ];
    let mut total = 0;
    for side in [Player::White, Player::Black] {
        for (pt, unit) in UNITS {
            total += pos.piece_bb(side, pt).count_bits() as i32 * unit;
        }
    }
    total
}

fn wdl_params(material: i32) -> (f64, f64) {
    let m = material.clamp(17, 78) as f64 / 58.0;
    let a = ((AS[0] * m + AS[1]) * m + AS[2]) * m + AS[3];
    let b = ((BS[0] * m + BS[1]) * m + BS[2]) * m + BS[3];
    (a, b)
}

/// Rescales `score` (White's perspective centipawns) onto a roughly
/// phase-independent axis, leaving mate scores untouched.
pub fn normalize_score(score: i32, pos: &Position, mate_found: i32) -> i32 {
    if score == 0 || score.abs() > mate_found {
        return score;
    }
    let (a, _b) = wdl_params(material_count(pos));
    (score as f64 * 100.0 / a).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use minke_core::init_globals;

    #[test]
    fn mate_scores_pass_through_unnormalized() {
        init_globals();
        let pos = Position::start_pos();
        assert_eq!(normalize_score(32000, &pos, 31872), 32000);
    }

    #[test]
    fn zero_score_stays_zero() {
        init_globals();
        let pos = Position::start_pos();
        assert_eq!(normalize_score(0, &pos, 31872), 0);
    }

    #[test]
    fn starting_position_has_full_material() {
        init_globals();
        let pos = Position::start_pos();
        assert_eq!(material_count(&pos), 78);
    }
}
