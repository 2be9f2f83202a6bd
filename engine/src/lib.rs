//! Search driver, time management, datagen and the UCI front end for the
//! Minke chess engine. `spec.md` §1: "position state and move generation...
//! live in `minke_core`; this crate adds the threaded, I/O-facing layer on
//! top: history/move ordering, search, time management, the thread pool,
//! datagen, and the UCI front end."

pub mod datagen;
pub mod history;
pub mod movepick;
pub mod search;
pub mod threadpool;
pub mod time;
pub mod uci;
