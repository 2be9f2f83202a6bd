//! Static Exchange Evaluation (SEE). `spec.md` §4.4.
//!
//! The teacher (`pleco`) has no SEE at all — its move ordering is MVV-LVA only.
//! Grounded on `vaishakkmenon-Vantage/backend/src/search/see.rs` and
//! `menezesd-ChessEngine/src/see.rs` for the attacker-bitboard recomputation with
//! x-ray exposure, adapted to this crate's `Bitboard`/`Position` types and the
//! piece values `spec.md` §4.4 specifies (P=100, N=B=300, R=500, Q=1000, K=0).
//! Pin legality is not modeled: `spec.md` §4.4 describes a pure material swap-off,
//! not a legality oracle, and the move has already passed `make_move`'s king-safety
//! check by the time SEE is consulted.

use crate::core::bitboard::BitBoard;
use crate::core::piece_move::BitMove;
use crate::core::score::Value;
use crate::core::sq::SQ;
use crate::core::{Player, PieceType};
use crate::helper::magic;

use super::Position;

/// Order in which least-valuable-attacker search considers piece types.
const ATTACKER_ORDER: [PieceType; 6] = [
    PieceType::Pawn,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Rook,
    PieceType::Queen,
    PieceType::King,
];

impl Position {
    /// Does the static exchange on `m`'s destination square yield at least
    /// `threshold` centipawns for the side making `m`? `spec.md` §4.4.
    pub fn see_ge(&self, m: BitMove, threshold: Value) -> bool {
        let from = m.get_src();
        let to = m.get_dest();
        let mover = self.turn;

        let victim_value = if m.is_en_passant() {
            PieceType::Pawn.value()
        } else {
            self.piece_type_at(to).map(PieceType::value).unwrap_or(0)
        };

        let mut swap = victim_value - threshold;
        if swap < 0 {
            return false;
        }

        let attacker_pt = if m.is_castle() {
            PieceType::King
        } else {
            self.piece_type_at(from).expect("see_ge: no piece at src")
        };
        let attacker_value = m.promotion_piece().unwrap_or(attacker_pt).value();

        swap = attacker_value - swap;
        if swap <= 0 {
            return true;
        }

        let mut occupied = self.occupied().0 & !from.to_bb().0;
        if m.is_en_passant() {
            let cap_sq = SQ((to.0 as i8 - mover.pawn_push()) as u8);
            occupied &= !cap_sq.to_bb().0;
        }

        let mut attackers = self.attackers_to(to, BitBoard(occupied)).0;

        let mut stm = mover;
        let mut res = 1i32;

        loop {
            stm = stm.other();
            attackers &= occupied;
            let stm_attackers = attackers & self.occupied_by(stm).0;
            if stm_attackers == 0 {
                break;
            }

            res ^= 1;

            let (lva_sq, lva_pt) = match least_valuable_attacker(self, stm, stm_attackers) {
                Some(found) => found,
                None => break,
            };

            if lva_pt == PieceType::King {
                let opponent_attackers = attackers & !self.occupied_by(stm).0;
                return if opponent_attackers != 0 { res ^ 1 != 0 } else { res != 0 };
            }

            swap = lva_pt.value() - swap;
            if swap < res {
                break;
            }

            occupied &= !lva_sq.to_bb().0;

            if matches!(lva_pt, PieceType::Pawn | PieceType::Bishop | PieceType::Queen) {
                let diag = self.piece_bb(Player::White, PieceType::Bishop).0
                    | self.piece_bb(Player::Black, PieceType::Bishop).0
                    | self.piece_bb(Player::White, PieceType::Queen).0
                    | self.piece_bb(Player::Black, PieceType::Queen).0;
                attackers |= magic::bishop_attacks(occupied, to.0) & diag;
            }
            if matches!(lva_pt, PieceType::Rook | PieceType::Queen) {
                let straight = self.piece_bb(Player::White, PieceType::Rook).0
                    | self.piece_bb(Player::Black, PieceType::Rook).0
                    | self.piece_bb(Player::White, PieceType::Queen).0
                    | self.piece_bb(Player::Black, PieceType::Queen).0;
                attackers |= magic::rook_attacks(occupied, to.0) & straight;
            }
        }

        res != 0
    }
}

fn least_valuable_attacker(pos: &Position, stm: Player, stm_attackers: u64) -> Option<(SQ, PieceType)> {
    for &pt in ATTACKER_ORDER.iter() {
        let bb = stm_attackers & pos.piece_bb(stm, pt).0;
        if bb != 0 {
            return Some((BitBoard(bb).bit_scan_forward(), pt));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece_move::{MoveFlag, PreMoveInfo};
    use crate::init_globals;

    fn pos_from(fen: &str) -> Position {
        init_globals();
        let mut pos = Position::blank();
        pos.set_fen(fen).unwrap();
        pos
    }

    #[test]
    fn pawn_takes_undefended_knight_wins_material() {
        // White pawn on e4 can take a hanging black knight on d5.
        let pos = pos_from("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1");
        let m = BitMove::init(PreMoveInfo {
            src: SQ(28),
            dst: SQ(35),
            flags: MoveFlag::Capture { ep_capture: false },
        });
        assert!(pos.see_ge(m, 0));
        assert!(pos.see_ge(m, 200));
    }

    #[test]
    fn losing_capture_fails_positive_threshold() {
        // White queen captures a rook on d5 that is defended by a black pawn on
        // c6: the queen is recaptured, net loss of queen for rook.
        let pos = pos_from("4k3/8/2p5/3r4/8/8/3Q4/4K3 w - - 0 1");
        let m = BitMove::init(PreMoveInfo {
            src: SQ(11),
            dst: SQ(35),
            flags: MoveFlag::Capture { ep_capture: false },
        });
        assert!(!pos.see_ge(m, 0));
    }
}
