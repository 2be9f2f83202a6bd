//! FEN (Forsyth-Edwards Notation) parsing and printing. `spec.md` §6.
//! Grounded on `pleco::board::fen` / `Board::new_from_fen` / `Board::get_fen`.

use std::fmt;

use crate::core::piece_move::BitMove;
use crate::core::sq::{File, Rank, SQ};
use crate::core::{Piece, PieceType, Player};
use crate::helper::zobrist;

use super::castle_rights::Castling;
use super::state::BoardState;
use super::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    WrongSectionCount { sections: usize },
    WrongRankCount { ranks: usize },
    UnrecognizedPieceChar { c: char },
    RankTooLong { rank: String },
    UnrecognizedTurn { turn: String },
    EpSquareUnreadable { ep: String },
    BadHalfmoveClock,
    BadFullmoveNumber,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FenError::WrongSectionCount { sections } => {
                write!(f, "expected 6 whitespace-separated fields, got {sections}")
            }
            FenError::WrongRankCount { ranks } => write!(f, "expected 8 ranks, got {ranks}"),
            FenError::UnrecognizedPieceChar { c } => write!(f, "unrecognized piece character '{c}'"),
            FenError::RankTooLong { rank } => write!(f, "rank overflows 8 files: \"{rank}\""),
            FenError::UnrecognizedTurn { turn } => write!(f, "unrecognized side to move: \"{turn}\""),
            FenError::EpSquareUnreadable { ep } => write!(f, "unreadable en-passant square: \"{ep}\""),
            FenError::BadHalfmoveClock => write!(f, "halfmove clock is not a valid number"),
            FenError::BadFullmoveNumber => write!(f, "fullmove number is not a valid number"),
        }
    }
}

impl std::error::Error for FenError {}

impl Position {
    /// Resets `self` to the position described by `fen`. `spec.md` §6.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() != 6 {
            return Err(FenError::WrongSectionCount { sections: parts.len() });
        }

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongRankCount { ranks: ranks.len() });
        }

        *self = Position::blank();

        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                    continue;
                }
                if file >= 8 {
                    return Err(FenError::RankTooLong { rank: rank_str.to_string() });
                }
                let (player, pt) = char_to_piece(c).ok_or(FenError::UnrecognizedPieceChar { c })?;
                let sq = SQ::make(File::from_idx(file), Rank::from_idx(rank));
                self.put_piece(player, pt, sq);
                file += 1;
            }
        }

        self.turn = match parts[1].chars().next() {
            Some('w') => Player::White,
            Some('b') => Player::Black,
            _ => return Err(FenError::UnrecognizedTurn { turn: parts[1].to_string() }),
        };

        let mut castling = Castling::empty();
        for c in parts[2].chars() {
            castling.add_castling_char(c);
        }
        self.state.castling = castling;

        self.state.ep_square = parse_ep_square(parts[3])?;

        self.state.rule_50 = parts[4].parse().map_err(|_| FenError::BadHalfmoveClock)?;

        let fullmove: u32 = parts[5].parse().map_err(|_| FenError::BadFullmoveNumber)?;
        self.fullmove_number = fullmove.max(1);

        self.state.plies_from_null = 0;
        self.state.captured_piece = None;
        self.state.prev_move = BitMove::NULL;

        self.ply = (self.fullmove_number.saturating_sub(1)) * 2 + if self.turn == Player::Black { 1 } else { 0 };

        self.state.zobrist = self.compute_zobrist();
        self.nnue.reset(&self.board);

        Ok(())
    }

    fn compute_zobrist(&self) -> u64 {
        let mut hash = 0u64;
        for sq_idx in 0..64u8 {
            let sq = SQ(sq_idx);
            hash ^= zobrist::z_square(sq, self.piece_at(sq));
        }
        hash ^= zobrist::z_castle(self.state.castling.bits());
        if self.state.ep_square.is_okay() {
            hash ^= zobrist::z_ep(self.state.ep_square);
        }
        if self.turn == Player::Black {
            hash ^= zobrist::z_side();
        }
        hash
    }

    /// Renders `self` as a FEN string. `spec.md` §6.
    pub fn fen(&self) -> String {
        let mut s = String::new();
        for rank in (0..8u8).rev() {
            let mut blanks = 0u8;
            for file in 0..8u8 {
                let sq = SQ::make(File::from_idx(file), Rank::from_idx(rank));
                match self.piece_at(sq) {
                    Piece::None => blanks += 1,
                    Piece::Some(player, pt) => {
                        if blanks != 0 {
                            s.push(char::from_digit(blanks as u32, 10).unwrap());
                            blanks = 0;
                        }
                        s.push(piece_to_char(player, pt));
                    }
                }
            }
            if blanks != 0 {
                s.push(char::from_digit(blanks as u32, 10).unwrap());
            }
            if rank != 0 {
                s.push('/');
            }
        }

        s.push(' ');
        s.push(if self.turn == Player::White { 'w' } else { 'b' });
        s.push(' ');
        s.push_str(&self.state.castling.pretty_string());
        s.push(' ');
        s.push_str(&self.state.ep_square.to_string());
        s.push(' ');
        s.push_str(&self.state.rule_50.to_string());
        s.push(' ');
        s.push_str(&self.fullmove_number.to_string());
        s
    }
}

fn parse_ep_square(field: &str) -> Result<SQ, FenError> {
    if field == "-" {
        return Ok(SQ::NONE);
    }
    let mut chars = field.chars();
    let file_c = chars.next().ok_or(FenError::EpSquareUnreadable { ep: field.to_string() })?;
    let rank_c = chars.next().ok_or(FenError::EpSquareUnreadable { ep: field.to_string() })?;
    if chars.next().is_some() {
        return Err(FenError::EpSquareUnreadable { ep: field.to_string() });
    }
    if !('a'..='h').contains(&file_c) || !('1'..='8').contains(&rank_c) {
        return Err(FenError::EpSquareUnreadable { ep: field.to_string() });
    }
    let file = file_c as u8 - b'a';
    let rank = rank_c as u8 - b'1';
    Ok(SQ(rank * 8 + file))
}

fn char_to_piece(c: char) -> Option<(Player, PieceType)> {
    let player = if c.is_ascii_uppercase() { Player::White } else { Player::Black };
    let pt = match c.to_ascii_lowercase() {
        'p' => PieceType::Pawn,
        'n' => PieceType::Knight,
        'b' => PieceType::Bishop,
        'r' => PieceType::Rook,
        'q' => PieceType::Queen,
        'k' => PieceType::King,
        _ => return None,
    };
    Some((player, pt))
}

fn piece_to_char(player: Player, pt: PieceType) -> char {
    let c = match pt {
        PieceType::Pawn => 'p',
        PieceType::Knight => 'n',
        PieceType::Bishop => 'b',
        PieceType::Rook => 'r',
        PieceType::Queen => 'q',
        PieceType::King => 'k',
    };
    if player == Player::White {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::super::STARTING_FEN;
    use super::*;
    use crate::init_globals;

    #[test]
    fn starting_fen_round_trips() {
        init_globals();
        let mut pos = Position::blank();
        pos.set_fen(STARTING_FEN).unwrap();
        assert_eq!(pos.fen(), STARTING_FEN);
    }

    #[test]
    fn kiwipete_round_trips() {
        init_globals();
        let kiwipete = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 10";
        let mut pos = Position::blank();
        pos.set_fen(kiwipete).unwrap();
        assert_eq!(pos.fen(), kiwipete);
    }

    #[test]
    fn rejects_wrong_section_count() {
        init_globals();
        let mut pos = Position::blank();
        assert_eq!(
            pos.set_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"),
            Err(FenError::WrongSectionCount { sections: 5 })
        );
    }
}
