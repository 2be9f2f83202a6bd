//! `BoardState` — the per-ply undo record pushed by `make_move` and popped by
//! `unmake_move`. `spec.md` §3. Grounded on `pleco::board::board_state::BoardState`,
//! but rewritten from the teacher's `Arc<BoardState>` persistent-tree history (needed
//! there for cheap `Board::clone`) to a flat `Vec<BoardState>` stack living on
//! `Position` itself — `spec.md` §9's "Stacked undo state" design note calls for
//! exactly this, and nothing in this spec needs `Board::clone`.

use crate::core::piece_move::BitMove;
use crate::core::sq::SQ;
use crate::core::PieceType;

use super::castle_rights::Castling;

/// Per-ply undo information. Everything here is either copied forward from the
/// previous state or recomputed by `make_move`/`unmake_move`; nothing is derived
/// lazily. `spec.md` §3: "{captured piece, fifty-move-ply counter, ply-since-null,
/// castling mask, en-passant square}".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardState {
    pub castling: Castling,
    pub rule_50: u16,
    pub plies_from_null: u16,
    pub ep_square: SQ,
    pub zobrist: u64,
    pub captured_piece: Option<PieceType>,
    pub prev_move: BitMove,
}

impl BoardState {
    pub fn blank() -> BoardState {
        BoardState {
            castling: Castling::empty(),
            rule_50: 0,
            plies_from_null: 0,
            ep_square: SQ::NONE,
            zobrist: 0,
            captured_piece: None,
            prev_move: BitMove::NULL,
        }
    }
}
