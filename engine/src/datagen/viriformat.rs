//! A Viriformat game record: one packed initial position followed by a tight
//! `{u16 packed_move, i16 score}` per ply, terminated by a zero record.
//! `spec.md` §3/§4.10. Grounded on
//! `examples/original_source/src/datagen/viriformat.h`'s `Viriformat` class —
//! same move-packing bit layout (4 bits for from, via `from | to<<6`, plus a
//! 2-bit special-move tag and, for promotions, a 2-bit promotion-piece field),
//! reimplemented as a `Vec<u8>` byte builder instead of a reinterpreted struct
//! array.

use minke_core::core::PieceType;
use minke_core::BitMove;

use super::packed::{GameResult, PackedPosition};

const SPECIAL_NONE: u16 = 0b00;
const SPECIAL_EN_PASSANT: u16 = 0b01;
const SPECIAL_CASTLE: u16 = 0b10;
const SPECIAL_PROMOTION: u16 = 0b11;

fn pack_move(m: BitMove) -> u16 {
    let mut packed = m.get_src().0 as u16 | ((m.get_dest().0 as u16) << 6);
    if m.is_en_passant() {
        packed |= SPECIAL_EN_PASSANT << 14;
    } else if m.is_castle() {
        packed |= SPECIAL_CASTLE << 14;
    } else if let Some(pt) = m.promotion_piece() {
        let promo_id = match pt {
            PieceType::Knight => 0,
            PieceType::Bishop => 1,
            PieceType::Rook => 2,
            PieceType::Queen => 3,
            _ => unreachable!("promotion_piece only returns minor/major piece types"),
        };
        packed |= promo_id << 12;
        packed |= SPECIAL_PROMOTION << 14;
    } else {
        packed |= SPECIAL_NONE << 14;
    }
    packed
}

/// Accumulates one game's worth of `(move, score)` records against a fixed
/// starting position, then serializes them as a single Viriformat blob.
pub struct Viriformat {
    initial: PackedPosition,
    records: Vec<(u16, i16)>,
}

impl Viriformat {
    pub fn new(initial: PackedPosition) -> Viriformat {
        Viriformat { initial, records: Vec::new() }
    }

    pub fn push(&mut self, mov: BitMove, score: i16) {
        self.records.push((pack_move(mov), score));
    }

    /// Serializes the packed header, every `(move, score)` record, and the
    /// 4-byte zero terminator, in that order.
    pub fn into_bytes(mut self, result: GameResult) -> Vec<u8> {
        self.initial.set_result(result);
        let mut out = Vec::with_capacity(32 + self.records.len() * 4 + 4);
        out.extend_from_slice(&self.initial.to_bytes());
        for (packed_move, score) in &self.records {
            out.extend_from_slice(&packed_move.to_le_bytes());
            out.extend_from_slice(&score.to_le_bytes());
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minke_core::core::piece_move::{MoveFlag, PreMoveInfo};
    use minke_core::init_globals;
    use minke_core::{Position, SQ};

    #[test]
    fn serialized_record_ends_with_a_zero_terminator() {
        init_globals();
        let pos = Position::start_pos();
        let mut vf = Viriformat::new(PackedPosition::pack(&pos, 0));
        let m = BitMove::init(PreMoveInfo { src: SQ(12), dst: SQ(28), flags: MoveFlag::DoublePawnPush });
        vf.push(m, 34);
        let bytes = vf.into_bytes(GameResult::Win);
        assert_eq!(bytes.len(), 32 + 4 + 4);
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn promotion_move_sets_the_special_and_promo_bits() {
        let flags = MoveFlag::Promotion { capture: false, prom: PieceType::Queen };
        let m = BitMove::init(PreMoveInfo { src: SQ(52), dst: SQ(60), flags });
        let packed = pack_move(m);
        assert_eq!(packed >> 14, SPECIAL_PROMOTION);
        assert_eq!((packed >> 12) & 0b11, 3);
    }
}
