//! Pseudo-legal move generation, split into `Noisy`/`Quiet`/`All` per `spec.md`
//! §4.3. Grounded on `pleco::board::movegen`, rewritten from the teacher's
//! `GenTypeTrait`/`PlayerTrait` compile-time monomorphization into plain
//! runtime branches — this spec has no need for the extra specialization, and
//! a single readable code path is easier to keep correct.

use crate::core::bitboard::BitBoard;
use crate::core::move_list::MoveList;
use crate::core::piece_move::{BitMove, MoveFlag, PreMoveInfo};
use crate::core::sq::SQ;
use crate::core::{GenType, PieceType, Player, FILE_A, FILE_H, RANK_3, RANK_6, RANK_7, RANK_2};
use crate::helper::{boards, magic};

use super::castle_rights::CastleType;
use super::Position;

impl Position {
    /// Appends all pseudo-legal moves of `kind` to `out`. Moves are pseudo-legal:
    /// some may leave the mover's own king in check, which `make_move` rejects.
    pub fn movegen_into(&self, out: &mut MoveList, kind: GenType) {
        let us = self.turn;
        let them = us.other();
        let us_occ = self.occupied_by(us);
        let them_occ = self.occupied_by(them);
        let occ = self.occupied();

        let target = match kind {
            GenType::Noisy => them_occ,
            GenType::Quiet => !occ,
            GenType::All => !us_occ,
        };

        self.gen_pawn_moves(out, kind, us, them_occ, occ);

        for &pt in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen].iter() {
            let mut pieces = self.piece_bb(us, pt);
            while let Some(src) = pieces.pop_some_lsb() {
                let attacks = self.attacks_for(pt, src, occ) & !us_occ & target;
                self.append_moves_from_bb(out, attacks, src, them_occ);
            }
        }

        let king_sq = self.king_square(us);
        let king_attacks = BitBoard(boards::king_moves(king_sq)) & !us_occ & target;
        self.append_moves_from_bb(out, king_attacks, king_sq, them_occ);

        if kind != GenType::Noisy {
            self.gen_castling(out, us);
        }
    }

    fn attacks_for(&self, pt: PieceType, sq: SQ, occ: BitBoard) -> BitBoard {
        match pt {
            PieceType::Knight => BitBoard(boards::knight_moves(sq)),
            PieceType::Bishop => BitBoard(magic::bishop_attacks(occ.0, sq.0)),
            PieceType::Rook => BitBoard(magic::rook_attacks(occ.0, sq.0)),
            PieceType::Queen => BitBoard(magic::queen_attacks(occ.0, sq.0)),
            PieceType::Pawn | PieceType::King => unreachable!("handled separately"),
        }
    }

    fn append_moves_from_bb(&self, out: &mut MoveList, mut bb: BitBoard, src: SQ, them_occ: BitBoard) {
        while let Some(dst) = bb.pop_some_lsb() {
            let flags = if (them_occ & dst.to_bb()).is_not_empty() {
                MoveFlag::Capture { ep_capture: false }
            } else {
                MoveFlag::Quiet
            };
            out.push(BitMove::init(PreMoveInfo { src, dst, flags }));
        }
    }

    fn gen_pawn_moves(&self, out: &mut MoveList, kind: GenType, us: Player, them_occ: BitBoard, occ: BitBoard) {
        let push = us.pawn_push();
        let (rank_7, rank_3) = match us {
            Player::White => (RANK_7, RANK_3),
            Player::Black => (RANK_2, RANK_6),
        };
        let all_pawns = self.piece_bb(us, PieceType::Pawn);
        let pawns_rank_7 = BitBoard(all_pawns.0 & rank_7);
        let pawns_rest = BitBoard(all_pawns.0 & !rank_7);

        if kind != GenType::Noisy {
            let empty = !occ;
            let mut push_one = BitBoard(shift(pawns_rest.0, push)) & empty;
            let mut push_two = BitBoard(shift(push_one.0 & rank_3, push)) & empty;
            while let Some(dst) = push_one.pop_some_lsb() {
                let src = SQ((dst.0 as i16 - push as i16) as u8);
                out.push(BitMove::init(PreMoveInfo { src, dst, flags: MoveFlag::Quiet }));
            }
            while let Some(dst) = push_two.pop_some_lsb() {
                let src = SQ((dst.0 as i16 - 2 * push as i16) as u8);
                out.push(BitMove::init(PreMoveInfo { src, dst, flags: MoveFlag::DoublePawnPush }));
            }
        }

        if pawns_rank_7.is_not_empty() {
            let empty = !occ;
            let mut no_promo = BitBoard(shift(pawns_rank_7.0, push)) & empty;
            let mut left_cap = BitBoard(shift(pawns_rank_7.0 & !FILE_A, push - 1)) & them_occ;
            let mut right_cap = BitBoard(shift(pawns_rank_7.0 & !FILE_H, push + 1)) & them_occ;

            // A capturing promotion is noisy for every promotion piece (it is a
            // capture); a non-capturing promotion is noisy only to queen.
            while let Some(dst) = no_promo.pop_some_lsb() {
                let src = SQ((dst.0 as i16 - push as i16) as u8);
                self.push_promotions(out, kind, src, dst, false);
            }
            if kind != GenType::Quiet {
                while let Some(dst) = left_cap.pop_some_lsb() {
                    let src = SQ((dst.0 as i16 - (push - 1) as i16) as u8);
                    self.push_promotions(out, kind, src, dst, true);
                }
                while let Some(dst) = right_cap.pop_some_lsb() {
                    let src = SQ((dst.0 as i16 - (push + 1) as i16) as u8);
                    self.push_promotions(out, kind, src, dst, true);
                }
            }
        }

        if kind != GenType::Quiet {
            let mut left_cap = BitBoard(shift(pawns_rest.0 & !FILE_A, push - 1)) & them_occ;
            let mut right_cap = BitBoard(shift(pawns_rest.0 & !FILE_H, push + 1)) & them_occ;
            while let Some(dst) = left_cap.pop_some_lsb() {
                let src = SQ((dst.0 as i16 - (push - 1) as i16) as u8);
                out.push(BitMove::init(PreMoveInfo { src, dst, flags: MoveFlag::Capture { ep_capture: false } }));
            }
            while let Some(dst) = right_cap.pop_some_lsb() {
                let src = SQ((dst.0 as i16 - (push + 1) as i16) as u8);
                out.push(BitMove::init(PreMoveInfo { src, dst, flags: MoveFlag::Capture { ep_capture: false } }));
            }

            let ep = self.ep_square();
            if ep.is_okay() {
                let mut attackers = BitBoard(boards::pawn_attacks_from(ep, us.other())) & pawns_rest;
                while let Some(src) = attackers.pop_some_lsb() {
                    out.push(BitMove::init(PreMoveInfo {
                        src,
                        dst: ep,
                        flags: MoveFlag::Capture { ep_capture: true },
                    }));
                }
            }
        }
    }

    /// Pushes the promotion fan-out for a pawn reaching the last rank, filtered
    /// to the moves `kind` asks for. Capturing promotions are noisy regardless
    /// of the promoted piece; non-capturing promotions are noisy only to queen,
    /// quiet otherwise (`spec.md` §4.3).
    fn push_promotions(&self, out: &mut MoveList, kind: GenType, src: SQ, dst: SQ, capture: bool) {
        for &prom in [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight].iter() {
            let noisy = capture || prom == PieceType::Queen;
            let include = match kind {
                GenType::All => true,
                GenType::Noisy => noisy,
                GenType::Quiet => !noisy,
            };
            if include {
                out.push(BitMove::init(PreMoveInfo { src, dst, flags: MoveFlag::Promotion { capture, prom } }));
            }
        }
    }

    fn gen_castling(&self, out: &mut MoveList, us: Player) {
        for &(side, king_side) in &[(CastleType::KingSide, true), (CastleType::QueenSide, false)] {
            if !self.state_castling_allows(us, side) {
                continue;
            }
            let king_sq = self.king_square(us);
            let rook_sq = self.castling_rook_start(us, king_side);
            if self.piece_type_at(rook_sq) != Some(PieceType::Rook) {
                continue;
            }
            let king_to = Self::castle_king_dest(us, king_side);
            if (BitBoard(boards::between_bb(king_sq, rook_sq)) & self.occupied()).is_not_empty() {
                continue;
            }

            let them = us.other();
            let mut s = king_to;
            let step: i8 = if s.0 > king_sq.0 { -1 } else { 1 };
            let mut safe = true;
            loop {
                if self.is_attacked(s, them) {
                    safe = false;
                    break;
                }
                if s == king_sq {
                    break;
                }
                s = SQ((s.0 as i8 + step) as u8);
            }
            if safe {
                out.push(BitMove::init(PreMoveInfo {
                    src: king_sq,
                    dst: rook_sq,
                    flags: MoveFlag::Castle { king_side },
                }));
            }
        }
    }

    fn state_castling_allows(&self, us: Player, side: CastleType) -> bool {
        self.castling().castle_rights(us, side)
    }

    fn castling_rook_start(&self, us: Player, king_side: bool) -> SQ {
        match (us, king_side) {
            (Player::White, true) => SQ::H1,
            (Player::White, false) => SQ::A1,
            (Player::Black, true) => SQ::H8,
            (Player::Black, false) => SQ::A8,
        }
    }

    fn castle_king_dest(us: Player, king_side: bool) -> SQ {
        match (us, king_side) {
            (Player::White, true) => SQ::G1,
            (Player::White, false) => SQ::C1,
            (Player::Black, true) => SQ::G8,
            (Player::Black, false) => SQ::C8,
        }
    }

    /// All legal moves from this position: generates pseudo-legal moves, then
    /// filters with `make_move`/`unmake_move`. `spec.md` §4.2/§4.3.
    pub fn legal_moves(&mut self) -> MoveList {
        let mut pseudo = MoveList::new();
        self.movegen_into(&mut pseudo, GenType::All);
        let mut legal = MoveList::new();
        for &m in pseudo.iter() {
            if self.make_move(m) {
                self.unmake_move();
                legal.push(m);
            }
        }
        legal
    }
}

/// Shifts a bitboard by a signed delta (north is positive, south is negative),
/// masking off wraparound across the board edges.
#[inline]
fn shift(bb: u64, delta: i8) -> u64 {
    if delta > 0 {
        bb << delta
    } else {
        bb >> (-delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_globals;

    #[test]
    fn start_pos_has_twenty_legal_moves() {
        init_globals();
        let mut pos = Position::start_pos();
        assert_eq!(pos.legal_moves().len(), 20);
    }

    #[test]
    fn kiwipete_has_48_legal_moves() {
        init_globals();
        let mut pos = Position::blank();
        pos.set_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 10").unwrap();
        assert_eq!(pos.legal_moves().len(), 48);
    }
}
