//! One self-play datagen worker: plays games from randomized openings,
//! recording `(move, score)` pairs until the game reaches a verdict, then
//! flushes a Viriformat blob to its own output file. `spec.md` §4.10.
//! Grounded on `examples/original_source/src/datagen/datagen.h`'s
//! `DatagenThread::play_game`/`init_pos_randomly`, adapted to this crate's
//! `Position`/`ThreadData`/search entry points — the teacher's make/unmake
//! legality probe during opening randomization is replaced with a direct
//! `Position::legal_moves()` call, which this codebase's move generator
//! already filters to fully legal moves.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use minke_core::core::score::MATE_FOUND;
use minke_core::tt::TranspositionTable;
use minke_core::{BitMove, Position};

use crate::search::{self, SearchParams};
use crate::threadpool::ThreadData;

use super::packed::{GameResult, PackedPosition};
use super::viriformat::Viriformat;
use super::wdl::normalize_score;

const VERIFICATION_MAX_SCORE: i32 = 800;
const VERIFICATION_SOFT_NODES: u64 = 80_000;
const VERIFICATION_HARD_NODES: u64 = 500_000;
const VERIFICATION_MAX_DEPTH: i32 = 14;

const SOFT_NODES: u64 = 25_000;
const HARD_NODES: u64 = 100_000;

const WIN_ADJ_PLY: u32 = 4;
const DRAW_ADJ_PLY: u32 = 12;
const WIN_ADJ_SCORE: i32 = 2000;
const DRAW_ADJ_SCORE: i32 = 10;
const DRAW_ADJ_MIN_PLY: u32 = 60;

const FLUSH_EVERY: u64 = 10_000;
const TT_SIZE_MB: usize = 16;

/// One worker's running tally, polled by the master's `report` command.
pub struct WorkerStats {
    pub games: AtomicU64,
    pub positions: AtomicU64,
}

impl WorkerStats {
    fn new() -> WorkerStats {
        WorkerStats { games: AtomicU64::new(0), positions: AtomicU64::new(0) }
    }
}

pub struct DatagenWorker {
    id: usize,
    rng: StdRng,
    tt: TranspositionTable,
    params: SearchParams,
    stop: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    out: BufWriter<File>,
}

impl DatagenWorker {
    pub fn new(id: usize, seed: u64, output_dir: &Path, stop: Arc<AtomicBool>) -> std::io::Result<DatagenWorker> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("minke_data{id}.vf"));
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(DatagenWorker {
            id,
            rng: StdRng::seed_from_u64(seed),
            tt: TranspositionTable::new(TT_SIZE_MB),
            params: SearchParams::default(),
            stop,
            stats: Arc::new(WorkerStats::new()),
            out: BufWriter::new(file),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Plays games back to back until the shared stop flag is set, flushing
    /// output every `FLUSH_EVERY` recorded positions.
    pub fn run(&mut self) {
        while !self.stop.load(Ordering::Relaxed) {
            self.play_game();
            if self.stats.positions.load(Ordering::Relaxed) % FLUSH_EVERY == 0 {
                let _ = self.out.flush();
            }
        }
        let _ = self.out.flush();
    }

    fn play_game(&mut self) {
        let mut td = ThreadData::new_for_test(self.random_opening(), Arc::clone(&self.stop), None);
        self.tt.clear();

        let verification_score = search::node_budgeted_search(
            &mut td,
            &self.tt,
            &self.params,
            VERIFICATION_MAX_DEPTH,
            VERIFICATION_SOFT_NODES,
            VERIFICATION_HARD_NODES,
        );
        if verification_score.abs() > VERIFICATION_MAX_SCORE {
            return;
        }

        let mut game = Viriformat::new(PackedPosition::pack(&td.position, 0));

        let mut result = None;
        let mut win_streak = 0u32;
        let mut draw_streak = 0u32;
        let mut position_count = 0u64;

        while !self.stop.load(Ordering::Relaxed) {
            let score = search::node_budgeted_search(
                &mut td,
                &self.tt,
                &self.params,
                i32::MAX,
                SOFT_NODES,
                HARD_NODES,
            );
            position_count += 1;

            let mv = td.best_move;
            if mv.is_null() {
                result = Some(if td.position.in_check() { loss_for(td.position.turn()) } else { GameResult::Draw });
                break;
            }

            let white_score = if td.position.turn() == minke_core::Player::Black { -score } else { score };

            if white_score.abs() >= MATE_FOUND {
                result = Some(if white_score > 0 { GameResult::Win } else { GameResult::Loss });
            } else {
                let normalized = normalize_score(white_score, &td.position, MATE_FOUND);
                let game_ply = td.position.ply();
                if normalized.abs() > WIN_ADJ_SCORE {
                    win_streak += 1;
                    draw_streak = 0;
                } else if normalized.abs() < DRAW_ADJ_SCORE && game_ply >= DRAW_ADJ_MIN_PLY {
                    win_streak = 0;
                    draw_streak += 1;
                } else {
                    win_streak = 0;
                    draw_streak = 0;
                }

                if win_streak >= WIN_ADJ_PLY {
                    result = Some(if white_score > 0 { GameResult::Win } else { GameResult::Loss });
                } else if draw_streak >= DRAW_ADJ_PLY {
                    result = Some(GameResult::Draw);
                }
            }

            // Recorded scores are White-perspective throughout a game, matching
            // `PackedPosition`'s header fields (`spec.md` §3).
            let record_score = if td.position.draw() {
                result = Some(GameResult::Draw);
                0
            } else {
                white_score.clamp(i16::MIN as i32, i16::MAX as i32) as i16
            };

            game.push(mv, record_score);

            if result.is_some() {
                break;
            }

            td.position.make_move(mv);
        }

        if let Some(result) = result {
            let bytes = game.into_bytes(result);
            let _ = self.out.write_all(&bytes);
            self.stats.positions.fetch_add(position_count, Ordering::Relaxed);
            self.stats.games.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Plays `rand(8, 12)` uniformly-random legal half-moves from the start
    /// position, restarting from scratch if a line runs out of legal moves
    /// before reaching the target ply (impossible in practice this shallow,
    /// but mirrors the teacher's defensive retry).
    fn random_opening(&mut self) -> Position {
        loop {
            let mut pos = Position::start_pos();
            let target = self.rng.gen_range(8..=12);
            let mut ok = true;
            for _ in 0..target {
                let mut moves: Vec<BitMove> = pos.legal_moves().iter().copied().collect();
                if moves.is_empty() {
                    ok = false;
                    break;
                }
                moves.shuffle(&mut self.rng);
                pos.make_move(moves[0]);
            }
            if ok {
                return pos;
            }
        }
    }
}

fn loss_for(stm: minke_core::Player) -> GameResult {
    if stm == minke_core::Player::White {
        GameResult::Loss
    } else {
        GameResult::Win
    }
}
