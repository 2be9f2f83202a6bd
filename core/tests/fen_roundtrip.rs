//! FEN round-trip coverage for positions reached by actually playing moves,
//! not just literal FEN strings. `spec.md` §8: "parse_fen(to_fen(p)) == p for
//! any position reachable from startpos." Split into `core/tests/` alongside
//! `perft.rs` per `SPEC_FULL.md` §10.4.

use minke_core::core::GenType;
use minke_core::{init_globals, Position};

/// Plays the first legal move at every ply (deterministic, no RNG needed in a
/// dependency-free integration test) and checks the FEN round-trips at each
/// step, including through captures, castling and promotions.
fn assert_round_trips_along_first_legal_line(start_fen: &str, plies: u32) {
    init_globals();
    let mut pos = Position::blank();
    pos.set_fen(start_fen).unwrap();

    for _ in 0..plies {
        let fen = pos.fen();
        let mut reparsed = Position::blank();
        reparsed.set_fen(&fen).unwrap();
        assert_eq!(reparsed.fen(), fen);
        assert_eq!(reparsed.zobrist(), pos.zobrist());

        let mut moves = minke_core::core::move_list::MoveList::new();
        pos.movegen_into(&mut moves, GenType::All);
        let mut played = false;
        for &m in moves.iter() {
            if pos.make_move(m) {
                played = true;
                break;
            }
        }
        if !played {
            break;
        }
    }
}

#[test]
fn startpos_line_round_trips() {
    assert_round_trips_along_first_legal_line(minke_core::board::STARTING_FEN, 20);
}

#[test]
fn kiwipete_line_round_trips_through_castling_and_captures() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    assert_round_trips_along_first_legal_line(fen, 20);
}

#[test]
fn near_promotion_line_round_trips() {
    let fen = "8/P6k/8/8/8/8/p6K/8 w - - 0 1";
    assert_round_trips_along_first_legal_line(fen, 8);
}
