//! `Castling` — the 4-bit castling-rights mask `{WK=1, WQ=2, BK=4, BQ=8}`.
//! Grounded on `pleco::board::castle_rights::Castling` (a `bitflags` struct over a `u8`).

use bitflags::bitflags;

use crate::core::{
    Player, C_BLACK_K_MASK, C_BLACK_Q_MASK, C_WHITE_K_MASK, C_WHITE_Q_MASK,
};
use crate::core::sq::SQ;

bitflags! {
    #[derive(Default)]
    pub struct Castling: u8 {
        const WHITE_K = C_WHITE_K_MASK;
        const WHITE_Q = C_WHITE_Q_MASK;
        const BLACK_K = C_BLACK_K_MASK;
        const BLACK_Q = C_BLACK_Q_MASK;
        const WHITE_ALL = Self::WHITE_K.bits() | Self::WHITE_Q.bits();
        const BLACK_ALL = Self::BLACK_K.bits() | Self::BLACK_Q.bits();
        const ALL = Self::WHITE_ALL.bits() | Self::BLACK_ALL.bits();
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CastleType {
    KingSide,
    QueenSide,
}

impl Castling {
    #[inline]
    pub fn castle_rights(self, player: Player, side: CastleType) -> bool {
        match (player, side) {
            (Player::White, CastleType::KingSide) => self.contains(Castling::WHITE_K),
            (Player::White, CastleType::QueenSide) => self.contains(Castling::WHITE_Q),
            (Player::Black, CastleType::KingSide) => self.contains(Castling::BLACK_K),
            (Player::Black, CastleType::QueenSide) => self.contains(Castling::BLACK_Q),
        }
    }

    #[inline]
    pub fn no_castling(self) -> bool {
        self.is_empty()
    }

    /// Clears the bits affected by a piece moving to/from `to`/`from` (either
    /// endpoint might be a king start or a rook start square), returning the mask
    /// that was actually cleared — used to XOR the Zobrist castling key.
    #[inline]
    pub fn update_castling(&mut self, to: SQ, from: SQ) -> u8 {
        let mask_change = to.castle_rights_mask() | from.castle_rights_mask();
        let cleared = self.bits() & mask_change;
        self.remove(Castling::from_bits_truncate(mask_change));
        cleared
    }

    pub fn add_castling_char(&mut self, c: char) {
        let bit = match c {
            'K' => Castling::WHITE_K.bits(),
            'Q' => Castling::WHITE_Q.bits(),
            'k' => Castling::BLACK_K.bits(),
            'q' => Castling::BLACK_Q.bits(),
            '-' => 0,
            _ => panic!("illegal castling FEN character: {c}"),
        };
        *self = Castling::from_bits_truncate(self.bits() | bit);
    }

    pub fn pretty_string(self) -> String {
        if self.no_castling() {
            return "-".to_string();
        }
        let mut s = String::new();
        if self.contains(Castling::WHITE_K) {
            s.push('K');
        }
        if self.contains(Castling::WHITE_Q) {
            s.push('Q');
        }
        if self.contains(Castling::BLACK_K) {
            s.push('k');
        }
        if self.contains(Castling::BLACK_Q) {
            s.push('q');
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_castling_clears_affected_bits_only() {
        let mut c = Castling::ALL;
        let cleared = c.update_castling(SQ::H1, SQ::E1);
        // Moving the king clears both white rights (king start carries both masks).
        assert_eq!(cleared, Castling::WHITE_ALL.bits());
        assert!(!c.contains(Castling::WHITE_K));
        assert!(c.contains(Castling::BLACK_K));
    }
}
