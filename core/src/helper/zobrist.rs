//! Zobrist keys: 12×64 piece-square, 16 castling-rights, 8 en-passant-file, one
//! side-to-move key, all drawn from a seeded PRNG. `spec.md` §3/C3. Grounded on
//! `pleco::helper::zobrist`, narrowed to the 12-piece (not 16-piece-slot) layout
//! this crate's `Piece::piece12_index` uses.

use std::sync::OnceLock;

use super::prng::PRNG;
use crate::core::sq::SQ;
use crate::core::Piece;

const ZOBRIST_SEED: u64 = 23_081;
const CASTLING_RIGHT_CNT: usize = 16;

struct ZobristKeys {
    piece_square: [[u64; 64]; 12],
    en_passant: [u64; 8],
    castle: [u64; CASTLING_RIGHT_CNT],
    side: u64,
}

static ZOBRIST: OnceLock<ZobristKeys> = OnceLock::new();

pub fn init_zobrist() {
    ZOBRIST.get_or_init(|| {
        let mut rng = PRNG::init(ZOBRIST_SEED);
        let mut piece_square = [[0u64; 64]; 12];
        for sq_keys in piece_square.iter_mut() {
            for key in sq_keys.iter_mut() {
                *key = rng.rand();
            }
        }

        let mut en_passant = [0u64; 8];
        for key in en_passant.iter_mut() {
            *key = rng.rand();
        }

        // Per-bit keys, XORed together for each of the 16 combined castling masks —
        // having all rights is the XOR of each individual right's key.
        let mut per_bit = [0u64; 4];
        for key in per_bit.iter_mut() {
            *key = rng.rand();
        }
        let mut castle = [0u64; CASTLING_RIGHT_CNT];
        for (cr, slot) in castle.iter_mut().enumerate() {
            let mut k = 0u64;
            for (bit, per) in per_bit.iter().enumerate() {
                if cr & (1 << bit) != 0 {
                    k ^= *per;
                }
            }
            *slot = k;
        }

        let side = rng.rand();
        ZobristKeys {
            piece_square,
            en_passant,
            castle,
            side,
        }
    });
}

fn keys() -> &'static ZobristKeys {
    ZOBRIST.get().expect("init_zobrist() must run before hashing")
}

#[inline(always)]
pub fn z_square(sq: SQ, piece: Piece) -> u64 {
    if piece.is_none() {
        return 0;
    }
    keys().piece_square[piece.piece12_index()][sq.0 as usize]
}

#[inline(always)]
pub fn z_ep(sq: SQ) -> u64 {
    keys().en_passant[sq.file_idx() as usize]
}

#[inline(always)]
pub fn z_castle(castle: u8) -> u64 {
    keys().castle[castle as usize]
}

#[inline(always)]
pub fn z_side() -> u64 {
    keys().side
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Player, PieceType};

    #[test]
    fn distinct_squares_give_distinct_keys() {
        init_zobrist();
        let p = Piece::Some(Player::White, PieceType::Pawn);
        assert_ne!(z_square(SQ::A1, p), z_square(SQ::A2, p));
    }

    #[test]
    fn empty_square_key_is_zero() {
        init_zobrist();
        assert_eq!(z_square(SQ::A1, Piece::None), 0);
    }

    #[test]
    fn all_rights_key_is_xor_of_individual_rights() {
        init_zobrist();
        assert_eq!(z_castle(0b1111), z_castle(0b0001) ^ z_castle(0b0010) ^ z_castle(0b0100) ^ z_castle(0b1000));
    }
}
