//! `Position` — the bitboard chess position: piece placement, side to move,
//! castling/en-passant/halfmove state, incremental Zobrist hash and the NNUE
//! accumulator stack. `spec.md` §3/§4.2/C4. Grounded on `pleco::board::Board`,
//! restructured per `DESIGN.md`'s "Undo discipline" decision.

pub mod castle_rights;
pub mod state;
pub mod fen;
pub mod movegen;
pub mod perft;
pub mod see;

use std::fmt;

use crate::core::bitboard::BitBoard;
use crate::core::piece_move::BitMove;
use crate::core::sq::SQ;
use crate::core::{Piece, PieceType, Player, ALL_PIECE_TYPES};
use crate::helper::{boards, magic, zobrist};
use crate::nnue::AccumulatorStack;

pub use self::castle_rights::{CastleType, Castling};
pub use self::fen::FenError;
pub use self::state::BoardState;

/// A single position on the board. Owns its board array, bitboards, undo-state
/// stack and NNUE accumulator stack. `spec.md` §3 "Ownership".
#[derive(Clone)]
pub struct Position {
    board: [Piece; 64],
    piece_bb: [[BitBoard; 6]; 2],
    occ: [BitBoard; 2],
    turn: Player,
    state: BoardState,
    history: Vec<BoardState>,
    ply: u32,
    fullmove_number: u32,
    nnue: AccumulatorStack,
}

impl Position {
    /// An empty board with White to move. Use `set_fen` to populate it.
    pub fn blank() -> Position {
        Position {
            board: [Piece::None; 64],
            piece_bb: [[BitBoard::EMPTY; 6]; 2],
            occ: [BitBoard::EMPTY; 2],
            turn: Player::White,
            state: BoardState::blank(),
            history: Vec::with_capacity(256),
            ply: 0,
            fullmove_number: 1,
            nnue: AccumulatorStack::new(),
        }
    }

    pub fn start_pos() -> Position {
        let mut pos = Position::blank();
        pos.set_fen(STARTING_FEN).expect("starting FEN is well-formed");
        pos
    }

    #[inline(always)]
    pub fn turn(&self) -> Player {
        self.turn
    }

    #[inline(always)]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    #[inline(always)]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline(always)]
    pub fn zobrist(&self) -> u64 {
        self.state.zobrist
    }

    #[inline(always)]
    pub fn castling(&self) -> Castling {
        self.state.castling
    }

    #[inline(always)]
    pub fn ep_square(&self) -> SQ {
        self.state.ep_square
    }

    #[inline(always)]
    pub fn rule_50(&self) -> u16 {
        self.state.rule_50
    }

    #[inline(always)]
    pub fn piece_at(&self, sq: SQ) -> Piece {
        self.board[sq.0 as usize]
    }

    #[inline(always)]
    pub fn piece_type_at(&self, sq: SQ) -> Option<PieceType> {
        self.board[sq.0 as usize].piece_type()
    }

    #[inline(always)]
    pub fn piece_bb(&self, player: Player, pt: PieceType) -> BitBoard {
        self.piece_bb[player as usize][pt as usize]
    }

    #[inline(always)]
    pub fn occupied_by(&self, player: Player) -> BitBoard {
        self.occ[player as usize]
    }

    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.occ[0] | self.occ[1]
    }

    #[inline(always)]
    pub fn king_square(&self, player: Player) -> SQ {
        self.piece_bb[player as usize][PieceType::King as usize].bit_scan_forward()
    }

    #[inline(always)]
    pub fn nnue(&self) -> &AccumulatorStack {
        &self.nnue
    }

    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.is_attacked(self.king_square(self.turn), self.turn.other())
    }

    /// Is `sq` attacked by any piece of player `by`, given the current occupancy?
    /// `spec.md` §4.2.
    pub fn is_attacked(&self, sq: SQ, by: Player) -> bool {
        let occ = self.occupied().0;
        let their = &self.piece_bb[by as usize];

        if boards::pawn_attacks_from(sq, by.other()) & their[PieceType::Pawn as usize].0 != 0 {
            return true;
        }
        if boards::knight_moves(sq) & their[PieceType::Knight as usize].0 != 0 {
            return true;
        }
        if boards::king_moves(sq) & their[PieceType::King as usize].0 != 0 {
            return true;
        }
        let diagonal = their[PieceType::Bishop as usize].0 | their[PieceType::Queen as usize].0;
        if magic::bishop_attacks(occ, sq.0) & diagonal != 0 {
            return true;
        }
        let straight = their[PieceType::Rook as usize].0 | their[PieceType::Queen as usize].0;
        if magic::rook_attacks(occ, sq.0) & straight != 0 {
            return true;
        }
        false
    }

    /// All pieces of either color currently attacking `sq`, given `occupied`.
    pub fn attackers_to(&self, sq: SQ, occupied: BitBoard) -> BitBoard {
        let occ = occupied.0;
        let pawns_w = boards::pawn_attacks_from(sq, Player::Black)
            & self.piece_bb[Player::White as usize][PieceType::Pawn as usize].0;
        let pawns_b = boards::pawn_attacks_from(sq, Player::White)
            & self.piece_bb[Player::Black as usize][PieceType::Pawn as usize].0;
        let knights = boards::knight_moves(sq)
            & (self.piece_bb[0][PieceType::Knight as usize].0 | self.piece_bb[1][PieceType::Knight as usize].0);
        let kings = boards::king_moves(sq)
            & (self.piece_bb[0][PieceType::King as usize].0 | self.piece_bb[1][PieceType::King as usize].0);
        let diag = self.piece_bb[0][PieceType::Bishop as usize].0
            | self.piece_bb[1][PieceType::Bishop as usize].0
            | self.piece_bb[0][PieceType::Queen as usize].0
            | self.piece_bb[1][PieceType::Queen as usize].0;
        let straight = self.piece_bb[0][PieceType::Rook as usize].0
            | self.piece_bb[1][PieceType::Rook as usize].0
            | self.piece_bb[0][PieceType::Queen as usize].0
            | self.piece_bb[1][PieceType::Queen as usize].0;
        let sliders = (magic::bishop_attacks(occ, sq.0) & diag) | (magic::rook_attacks(occ, sq.0) & straight);
        BitBoard(pawns_w | pawns_b | knights | kings | sliders)
    }

    fn put_piece(&mut self, player: Player, pt: PieceType, sq: SQ) {
        let piece = Piece::Some(player, pt);
        debug_assert!(self.board[sq.0 as usize].is_none());
        self.board[sq.0 as usize] = piece;
        self.piece_bb[player as usize][pt as usize] |= sq.to_bb();
        self.occ[player as usize] |= sq.to_bb();
        self.state.zobrist ^= zobrist::z_square(sq, piece);
    }

    fn remove_piece(&mut self, player: Player, pt: PieceType, sq: SQ) {
        let piece = Piece::Some(player, pt);
        self.board[sq.0 as usize] = Piece::None;
        self.piece_bb[player as usize][pt as usize] &= !sq.to_bb();
        self.occ[player as usize] &= !sq.to_bb();
        self.state.zobrist ^= zobrist::z_square(sq, piece);
    }

    fn move_piece(&mut self, player: Player, pt: PieceType, from: SQ, to: SQ) {
        self.remove_piece(player, pt, from);
        self.put_piece(player, pt, to);
    }

    fn castle_squares(us: Player, king_side: bool) -> (SQ, SQ) {
        match (us, king_side) {
            (Player::White, true) => (SQ::G1, SQ::F1),
            (Player::White, false) => (SQ::C1, SQ::D1),
            (Player::Black, true) => (SQ::G8, SQ::F8),
            (Player::Black, false) => (SQ::C8, SQ::D8),
        }
    }

    /// Physically applies `m` to the board/bitboards/hash, returning the captured
    /// piece type (if any). Does not touch castling rights, ep square, side to
    /// move or the halfmove counters — `make_move` handles those.
    fn apply_move_to_board(&mut self, m: BitMove, us: Player) -> Option<PieceType> {
        let them = us.other();
        let src = m.get_src();

        if m.is_castle() {
            let king_side = m.is_king_castle();
            let rook_from = m.get_dest();
            let (king_to, rook_to) = Self::castle_squares(us, king_side);
            self.move_piece(us, PieceType::King, src, king_to);
            self.move_piece(us, PieceType::Rook, rook_from, rook_to);
            None
        } else if m.is_en_passant() {
            let dst = m.get_dest();
            let cap_sq = SQ((dst.0 as i8 - us.pawn_push()) as u8);
            self.remove_piece(them, PieceType::Pawn, cap_sq);
            self.move_piece(us, PieceType::Pawn, src, dst);
            Some(PieceType::Pawn)
        } else {
            let dst = m.get_dest();
            let captured = if m.is_capture() {
                let cap_pt = self.piece_type_at(dst).expect("capture onto empty square");
                self.remove_piece(them, cap_pt, dst);
                Some(cap_pt)
            } else {
                None
            };
            if let Some(promo) = m.promotion_piece() {
                self.remove_piece(us, PieceType::Pawn, src);
                self.put_piece(us, promo, dst);
            } else {
                let pt = self.piece_type_at(src).expect("make_move: no piece at src");
                self.move_piece(us, pt, src, dst);
            }
            captured
        }
    }

    /// Reverses `apply_move_to_board`. Used both for undoing a legal move and for
    /// rolling back a pseudo-legal move that turned out to leave the king attacked.
    fn unapply_move_to_board(&mut self, m: BitMove, us: Player, captured: Option<PieceType>) {
        let them = us.other();
        let src = m.get_src();

        if m.is_castle() {
            let king_side = m.is_king_castle();
            let rook_from = m.get_dest();
            let (king_to, rook_to) = Self::castle_squares(us, king_side);
            self.move_piece(us, PieceType::King, king_to, src);
            self.move_piece(us, PieceType::Rook, rook_to, rook_from);
        } else if m.is_en_passant() {
            let dst = m.get_dest();
            self.move_piece(us, PieceType::Pawn, dst, src);
            let cap_sq = SQ((dst.0 as i8 - us.pawn_push()) as u8);
            self.put_piece(them, PieceType::Pawn, cap_sq);
        } else {
            let dst = m.get_dest();
            if let Some(promo) = m.promotion_piece() {
                self.remove_piece(us, promo, dst);
                self.put_piece(us, PieceType::Pawn, src);
            } else {
                let pt = self.piece_type_at(dst).expect("unmake: missing piece at dst");
                self.move_piece(us, pt, dst, src);
            }
            if let Some(cap_pt) = captured {
                self.put_piece(them, cap_pt, dst);
            }
        }
    }

    /// Mutates the position to reflect `m`. Returns `false` (and restores the
    /// pre-call position exactly) if the move leaves the mover's king attacked.
    /// `spec.md` §4.2.
    pub fn make_move(&mut self, m: BitMove) -> bool {
        let us = self.turn;
        let them = us.other();
        let old_state = self.state.clone();
        self.history.push(old_state.clone());

        if old_state.ep_square.is_okay() {
            self.state.zobrist ^= zobrist::z_ep(old_state.ep_square);
        }
        self.state.zobrist ^= zobrist::z_castle(old_state.castling.bits());

        let moved_pt = if m.is_castle() {
            PieceType::King
        } else {
            self.piece_type_at(m.get_src()).expect("make_move: no piece at src")
        };
        let is_pawn_move = moved_pt == PieceType::Pawn;

        let captured = self.apply_move_to_board(m, us);

        self.state.castling.update_castling(m.get_dest(), m.get_src());
        self.state.zobrist ^= zobrist::z_castle(self.state.castling.bits());

        let new_ep = if m.is_double_pawn_push() {
            SQ(((m.get_src().0 as i16 + m.get_dest().0 as i16) / 2) as u8)
        } else {
            SQ::NONE
        };
        self.state.ep_square = new_ep;
        if new_ep.is_okay() {
            self.state.zobrist ^= zobrist::z_ep(new_ep);
        }

        self.state.zobrist ^= zobrist::z_side();
        self.state.rule_50 = if is_pawn_move || captured.is_some() {
            0
        } else {
            old_state.rule_50 + 1
        };
        self.state.plies_from_null = old_state.plies_from_null + 1;
        self.state.captured_piece = captured;
        self.state.prev_move = m;

        if self.is_attacked(self.king_square(us), them) {
            self.unapply_move_to_board(m, us, captured);
            self.state = self.history.pop().expect("just pushed");
            return false;
        }

        self.nnue.push();
        self.apply_nnue_delta(m, us, moved_pt, captured);
        self.turn = them;
        self.ply += 1;
        if us == Player::Black {
            self.fullmove_number += 1;
        }
        true
    }

    /// Mirrors `apply_move_to_board`'s branches against the freshly-pushed NNUE
    /// accumulator instead of the board arrays. Called once the move is known
    /// legal, so it never has to unwind.
    fn apply_nnue_delta(&mut self, m: BitMove, us: Player, moved_pt: PieceType, captured: Option<PieceType>) {
        let them = us.other();
        let src = m.get_src();

        if m.is_castle() {
            let king_side = m.is_king_castle();
            let rook_from = m.get_dest();
            let (king_to, rook_to) = Self::castle_squares(us, king_side);
            self.nnue.remove_feature(src, us, PieceType::King);
            self.nnue.add_feature(king_to, us, PieceType::King);
            self.nnue.remove_feature(rook_from, us, PieceType::Rook);
            self.nnue.add_feature(rook_to, us, PieceType::Rook);
        } else if m.is_en_passant() {
            let dst = m.get_dest();
            let cap_sq = SQ((dst.0 as i8 - us.pawn_push()) as u8);
            self.nnue.remove_feature(cap_sq, them, PieceType::Pawn);
            self.nnue.remove_feature(src, us, PieceType::Pawn);
            self.nnue.add_feature(dst, us, PieceType::Pawn);
        } else {
            let dst = m.get_dest();
            if let Some(cap_pt) = captured {
                self.nnue.remove_feature(dst, them, cap_pt);
            }
            if let Some(promo) = m.promotion_piece() {
                self.nnue.remove_feature(src, us, PieceType::Pawn);
                self.nnue.add_feature(dst, us, promo);
            } else {
                self.nnue.remove_feature(src, us, moved_pt);
                self.nnue.add_feature(dst, us, moved_pt);
            }
        }
    }

    /// Undoes the most recent `make_move`. Panics if there is no move to undo.
    pub fn unmake_move(&mut self) {
        let them = self.turn;
        let us = them.other();
        let m = self.state.prev_move;
        let captured = self.state.captured_piece;

        self.unapply_move_to_board(m, us, captured);
        self.turn = us;
        self.state = self.history.pop().expect("unmake_move: no history to pop");
        self.ply -= 1;
        if us == Player::Black {
            self.fullmove_number -= 1;
        }
        self.nnue.pop();
    }

    /// Makes a null move: flips the side to move without moving a piece. Used by
    /// the null-move-pruning search technique (`spec.md` §4.8).
    pub fn make_null_move(&mut self) {
        let old_state = self.state.clone();
        self.history.push(old_state.clone());
        if old_state.ep_square.is_okay() {
            self.state.zobrist ^= zobrist::z_ep(old_state.ep_square);
        }
        self.state.ep_square = SQ::NONE;
        self.state.zobrist ^= zobrist::z_side();
        self.state.plies_from_null = 0;
        self.state.captured_piece = None;
        self.state.prev_move = BitMove::NULL;
        self.turn = self.turn.other();
        self.ply += 1;
    }

    pub fn unmake_null_move(&mut self) {
        self.turn = self.turn.other();
        self.state = self.history.pop().expect("unmake_null_move: no history to pop");
        self.ply -= 1;
    }

    /// NNUE evaluation from the perspective of the side to move. `spec.md` §4.2.
    pub fn eval(&self) -> i32 {
        self.nnue.evaluate(self, self.turn)
    }

    /// True on threefold repetition, the fifty-move rule (when not immediately
    /// mated), or insufficient material. `spec.md` §4.2.
    pub fn draw(&mut self) -> bool {
        if self.insufficient_material() {
            return true;
        }
        if self.is_repetition() {
            return true;
        }
        if self.state.rule_50 >= 100 {
            return !self.in_check() || self.has_any_legal_move();
        }
        false
    }

    fn is_repetition(&self) -> bool {
        let target = self.state.zobrist;
        let limit = self.state.plies_from_null.min(self.state.rule_50) as usize;
        let hist_len = self.history.len();
        let mut count = 0;
        let mut i = 2usize;
        while i <= limit && i <= hist_len {
            if self.history[hist_len - i].zobrist == target {
                count += 1;
                if count >= 2 {
                    return true;
                }
            }
            i += 2;
        }
        false
    }

    /// The insufficient-material catalog from `spec.md` §4.2.
    fn insufficient_material(&self) -> bool {
        let w_cnt = self.occ[Player::White as usize].count_bits();
        let b_cnt = self.occ[Player::Black as usize].count_bits();
        if w_cnt == 1 && b_cnt == 1 {
            return true;
        }

        let lone_minor = |side: Player| -> Option<PieceType> {
            let pb = &self.piece_bb[side as usize];
            let mut found = None;
            for &pt in ALL_PIECE_TYPES.iter() {
                if pt == PieceType::King || pb[pt as usize].is_empty() {
                    continue;
                }
                if found.is_some() {
                    return None;
                }
                found = Some(pt);
            }
            match found {
                Some(pt @ (PieceType::Knight | PieceType::Bishop))
                    if pb[pt as usize].count_bits() == 1 =>
                {
                    Some(pt)
                }
                _ => None,
            }
        };

        let w_minor = lone_minor(Player::White);
        let b_minor = lone_minor(Player::Black);

        if w_cnt == 1 && b_minor.is_some() {
            return true;
        }
        if b_cnt == 1 && w_minor.is_some() {
            return true;
        }
        if w_cnt == 2 && b_cnt == 2 && w_minor == Some(PieceType::Bishop) && b_minor == Some(PieceType::Bishop) {
            let w_bishop = self.piece_bb[Player::White as usize][PieceType::Bishop as usize].bit_scan_forward();
            let b_bishop = self.piece_bb[Player::Black as usize][PieceType::Bishop as usize].bit_scan_forward();
            if w_bishop.on_dark_square() == b_bishop.on_dark_square() {
                return true;
            }
        }
        false
    }

    fn has_any_legal_move(&mut self) -> bool {
        let mut list = crate::core::move_list::MoveList::new();
        self.movegen_into(&mut list, crate::core::GenType::All);
        for &m in list.iter() {
            if self.make_move(m) {
                self.unmake_move();
                return true;
            }
        }
        false
    }
}

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let sq = SQ(rank * 8 + file);
                let c = match self.piece_at(sq) {
                    Piece::None => '.',
                    Piece::Some(Player::White, pt) => piece_char(pt).to_ascii_uppercase(),
                    Piece::Some(Player::Black, pt) => piece_char(pt),
                };
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

fn piece_char(pt: PieceType) -> char {
    match pt {
        PieceType::Pawn => 'p',
        PieceType::Knight => 'n',
        PieceType::Bishop => 'b',
        PieceType::Rook => 'r',
        PieceType::Queen => 'q',
        PieceType::King => 'k',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_globals;

    fn setup() -> Position {
        init_globals();
        Position::start_pos()
    }

    #[test]
    fn make_unmake_restores_hash_and_occupancy() {
        let mut pos = setup();
        let before_hash = pos.zobrist();
        let before_occ = pos.occupied();
        let m = BitMove::init(crate::core::piece_move::PreMoveInfo {
            src: SQ(12), // e2
            dst: SQ(28), // e4
            flags: crate::core::piece_move::MoveFlag::DoublePawnPush,
        });
        assert!(pos.make_move(m));
        assert_ne!(pos.zobrist(), before_hash);
        pos.unmake_move();
        assert_eq!(pos.zobrist(), before_hash);
        assert_eq!(pos.occupied(), before_occ);
    }

    #[test]
    fn bare_kings_is_insufficient_material() {
        let mut pos = Position::blank();
        pos.set_fen("8/8/8/4k3/8/3K4/8/8 w - - 0 1").unwrap();
        assert!(pos.draw());
    }

    #[test]
    fn piece_count_matches_occupancy() {
        let pos = setup();
        let mut total = 0u32;
        for player in [Player::White, Player::Black] {
            for &pt in ALL_PIECE_TYPES.iter() {
                total += pos.piece_bb(player, pt).count_bits();
            }
        }
        assert_eq!(total, pos.occupied().count_bits());
    }
}
