//! Magic-bitboard sliding-attack tables for bishops and rooks. `spec.md` §4.1.
//!
//! Grounded closely on `pleco::helper::magic`: for each square, a mask of "inner ray"
//! blocker squares is derived by sliding-attack generation with occupancy 0, then every
//! subset of that mask is enumerated by ripple-carry (`b = (b - mask) & mask`) and hashed
//! via `(blockers & mask).wrapping_mul(magic) >> shift` while probing sparse magic-number
//! candidates from a seeded PRNG. The teacher stores this behind `static mut` raw pointers
//! (pre-`OnceLock`); this is the same data laid out behind a `OnceLock`-guarded heap
//! allocation instead, which is the stable-Rust equivalent of "build once, read-only after".

use std::sync::OnceLock;

use super::prng::PRNG;
use crate::core::sq::SQ;
use crate::core::{popcount64, FILE_A, FILE_H, RANK_1, RANK_8};

const B_DELTAS: [i8; 4] = [7, 9, -9, -7];
const R_DELTAS: [i8; 4] = [8, 1, -8, -1];

/// Per-square seeds the teacher derives empirically to keep magic search fast;
/// carried over unchanged since nothing in this spec depends on particular magic
/// values, only on the perfect-hash property (`spec.md` §9: "implementers may
/// hard-code known-good magics ... either is acceptable").
const SEEDS: [[u64; 8]; 2] = [
    [8977, 44_560, 54_343, 38_998, 5731, 95_205, 104_912, 17_020],
    [728, 10_316, 55_013, 32_803, 12_281, 15_100, 16_645, 255],
];

#[derive(Clone, Copy)]
struct SMagic {
    offset: usize,
    mask: u64,
    magic: u64,
    shift: u32,
}

impl SMagic {
    const EMPTY: SMagic = SMagic {
        offset: 0,
        mask: 0,
        magic: 0,
        shift: 0,
    };
}

struct MagicTables {
    bishop_magics: [SMagic; 64],
    bishop_table: Vec<u64>,
    rook_magics: [SMagic; 64],
    rook_table: Vec<u64>,
}

static MAGICS: OnceLock<MagicTables> = OnceLock::new();

/// Builds the magic tables. Idempotent; cheap to call more than once.
pub fn init_magics() {
    MAGICS.get_or_init(|| {
        let (bishop_magics, bishop_table) = gen_magic_board(&B_DELTAS);
        let (rook_magics, rook_table) = gen_magic_board(&R_DELTAS);
        MagicTables {
            bishop_magics,
            bishop_table,
            rook_magics,
            rook_table,
        }
    });
    #[cfg(debug_assertions)]
    verify_magics();
}

fn tables() -> &'static MagicTables {
    MAGICS.get().expect("init_magics() must run before attack lookups")
}

#[inline]
pub fn bishop_attacks(occupied: u64, square: u8) -> u64 {
    let t = tables();
    let m = &t.bishop_magics[square as usize];
    let idx = ((occupied & m.mask).wrapping_mul(m.magic)) >> m.shift;
    t.bishop_table[m.offset + idx as usize]
}

#[inline]
pub fn rook_attacks(occupied: u64, square: u8) -> u64 {
    let t = tables();
    let m = &t.rook_magics[square as usize];
    let idx = ((occupied & m.mask).wrapping_mul(m.magic)) >> m.shift;
    t.rook_table[m.offset + idx as usize]
}

#[inline]
pub fn queen_attacks(occupied: u64, square: u8) -> u64 {
    bishop_attacks(occupied, square) | rook_attacks(occupied, square)
}

fn rank_bb_of(sq: u8) -> u64 {
    crate::core::RANK_BB[(sq >> 3) as usize]
}

fn file_bb_of(sq: u8) -> u64 {
    crate::core::FILE_BB[(sq & 7) as usize]
}

fn gen_magic_board(deltas: &[i8; 4]) -> ([SMagic; 64], Vec<u64>) {
    let mut magics = [SMagic::EMPTY; 64];
    let mut table: Vec<u64> = Vec::new();

    let mut occupancy = [0u64; 4096];
    let mut reference = [0u64; 4096];
    let mut age = [0i32; 4096];

    for s in 0u8..64 {
        let edges = ((RANK_1 | RANK_8) & !rank_bb_of(s)) | ((FILE_A | FILE_H) & !file_bb_of(s));
        let mask = sliding_attack(deltas, s, 0) & !edges;
        let shift = 64 - popcount64(mask);

        let mut size = 0usize;
        let mut b = 0u64;
        loop {
            occupancy[size] = b;
            reference[size] = sliding_attack(deltas, s, b);
            size += 1;
            b = b.wrapping_sub(mask) & mask;
            if b == 0 {
                break;
            }
        }

        let offset = table.len();
        table.resize(offset + size, 0);
        for slot in age.iter_mut().take(size) {
            *slot = 0;
        }

        let mut rng = PRNG::init(SEEDS[1][SQ(s).rank_idx() as usize]);
        let mut current: i32 = 0;
        let magic;
        'outer: loop {
            let mut candidate;
            loop {
                candidate = rng.sparse_rand();
                if popcount64(candidate.wrapping_mul(mask).wrapping_shr(56)) >= 6 {
                    break;
                }
            }
            current += 1;
            let mut i = 0usize;
            while i < size {
                let index = ((occupancy[i] & mask).wrapping_mul(candidate)) >> shift;
                let index = index as usize;
                if age[index] < current {
                    age[index] = current;
                    table[offset + index] = reference[i];
                } else if table[offset + index] != reference[i] {
                    break;
                }
                i += 1;
            }
            if i >= size {
                magic = candidate;
                break 'outer;
            }
        }

        magics[s as usize] = SMagic {
            offset,
            mask,
            magic,
            shift,
        };
    }

    (magics, table)
}

/// Ray-walks sliding attacks from `sq` given `occupied`, stopping at (and including)
/// the first blocker along each delta. Used both to build the magic tables and, in
/// debug builds, to verify them against the perfect-hash lookup.
fn sliding_attack(deltas: &[i8; 4], sq: u8, occupied: u64) -> u64 {
    let mut attack = 0u64;
    for &delta in deltas.iter() {
        let mut s = sq as i16;
        loop {
            let prev = s;
            s += delta as i16;
            if !(0..64).contains(&s) {
                break;
            }
            if SQ(s as u8).distance(SQ(prev as u8)) != 1 {
                break;
            }
            attack |= 1u64 << s;
            if occupied & (1u64 << s) != 0 {
                break;
            }
        }
    }
    attack
}

#[cfg(debug_assertions)]
fn verify_magics() {
    for s in 0u8..64 {
        // Spot-check a handful of occupancy subsets of the full board per square;
        // exhaustive subset enumeration is already exercised during table construction.
        for occ in [0u64, !0u64, 0xAAAA_AAAA_AAAA_AAAA, 0x5555_5555_5555_5555] {
            let expected_b = sliding_attack(&B_DELTAS, s, occ);
            let expected_r = sliding_attack(&R_DELTAS, s, occ);
            debug_assert_eq!(bishop_attacks(occ, s), expected_b, "bishop magic mismatch at {s}");
            debug_assert_eq!(rook_attacks(occ, s), expected_r, "rook magic mismatch at {s}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_attacks_match_ray_walk_on_empty_board() {
        init_magics();
        for s in 0u8..64 {
            assert_eq!(rook_attacks(0, s), sliding_attack(&R_DELTAS, s, 0));
            assert_eq!(bishop_attacks(0, s), sliding_attack(&B_DELTAS, s, 0));
        }
    }

    #[test]
    fn attacks_respect_blockers() {
        init_magics();
        // A rook on d4 (27) with a blocker on d6 (43) should not see past d6.
        let occ = 1u64 << 43;
        let attacks = rook_attacks(occ, 27);
        assert_ne!(attacks & (1u64 << 43), 0);
        assert_eq!(attacks & (1u64 << 51), 0);
    }
}
