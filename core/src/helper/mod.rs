//! Process-wide, immutable-after-init lookup tables: the magic-bitboard attack
//! oracle, non-sliding attack tables, and Zobrist keys. `SPEC_FULL.md` §9's
//! "Global mutable state" design note: these are built once via `init_globals()`
//! and read-only thereafter, indexed by square/piece rather than pointed into.

pub mod prng;
pub mod magic;
pub mod boards;
pub mod zobrist;
