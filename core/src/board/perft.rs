//! Perft ("performance test") node counting, used to validate move generation
//! against the literal-count fixtures in `spec.md` §8. Grounded on
//! `pleco::board::Board::perft`/`perft_bulk`.

use crate::core::GenType;

use super::Position;

impl Position {
    /// Counts the number of leaf positions reachable in exactly `depth` plies
    /// from `self`, generating and filtering pseudo-legal moves at every ply.
    /// `spec.md` §8's perft fixtures exercise this directly.
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let mut pseudo = crate::core::move_list::MoveList::new();
        self.movegen_into(&mut pseudo, GenType::All);

        if depth == 1 {
            let mut count = 0u64;
            for &m in pseudo.iter() {
                if self.make_move(m) {
                    self.unmake_move();
                    count += 1;
                }
            }
            return count;
        }

        let mut nodes = 0u64;
        for &m in pseudo.iter() {
            if self.make_move(m) {
                nodes += self.perft(depth - 1);
                self.unmake_move();
            }
        }
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::super::Position;
    use crate::init_globals;

    fn perft_of(fen: &str, depth: u32) -> u64 {
        init_globals();
        let mut pos = Position::blank();
        pos.set_fen(fen).unwrap();
        pos.perft(depth)
    }

    #[test]
    fn startpos_perft_1_through_4() {
        use super::super::STARTING_FEN;
        assert_eq!(perft_of(STARTING_FEN, 1), 20);
        assert_eq!(perft_of(STARTING_FEN, 2), 400);
        assert_eq!(perft_of(STARTING_FEN, 3), 8_902);
        assert_eq!(perft_of(STARTING_FEN, 4), 197_281);
    }

    #[test]
    fn kiwipete_perft_3() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(perft_of(fen, 3), 97_862);
    }

    #[test]
    fn position_3_perft_5() {
        let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
        assert_eq!(perft_of(fen, 5), 674_624);
    }
}
