//! Deeper perft fixtures from `spec.md` §8, split into `core/tests/` per
//! `SPEC_FULL.md` §10.4 since these run long enough (millions of nodes) that
//! they don't belong in the fast inline unit-test pass alongside
//! `core/src/board/perft.rs`'s shallower depths.

use minke_core::init_globals;
use minke_core::Position;

fn perft_of(fen: &str, depth: u32) -> u64 {
    init_globals();
    let mut pos = Position::blank();
    pos.set_fen(fen).unwrap();
    pos.perft(depth)
}

#[test]
fn startpos_perft_5() {
    use minke_core::board::STARTING_FEN;
    assert_eq!(perft_of(STARTING_FEN, 5), 4_865_609);
}

#[test]
fn kiwipete_perft_4() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    assert_eq!(perft_of(fen, 4), 4_085_603);
}

#[test]
fn position_3_perft_6() {
    let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    assert_eq!(perft_of(fen, 6), 11_030_083);
}
