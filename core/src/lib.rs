//! `minke_core` — bitboard position representation, magic-bitboard move generation,
//! static exchange evaluation, the NNUE accumulator and the transposition table.
//!
//! This crate owns no threads and performs no I/O; it is the leaf layer that
//! `minke_engine` builds its search, time management and datagen pipeline on top of.

pub mod core;
pub mod helper;
pub mod board;
pub mod nnue;
pub mod tt;

pub use crate::board::{Position, FenError};
pub use crate::core::bitboard::BitBoard;
pub use crate::core::piece_move::{BitMove, MoveFlag};
pub use crate::core::sq::SQ;
pub use crate::core::{Player, PieceType, Piece};

/// Runs the one-time global initialization (magic tables, attack tables, Zobrist keys).
///
/// Must be called once before any `Position` is constructed. Safe to call more than
/// once; later calls are no-ops.
pub fn init_globals() {
    helper::magic::init_magics();
    helper::boards::init_boards();
    helper::zobrist::init_zobrist();
}
