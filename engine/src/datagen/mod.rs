//! Multi-threaded self-play datagen. `spec.md` §3/§4.10/C14: "N worker tasks
//! playing games from shuffled openings, writing packed records". Grounded in
//! shape on `examples/original_source/src/datagen/datagen.h`'s
//! `DatagenEngine::datagen_loop` master command loop and per-worker thread
//! pool (one OS thread per worker; no `rayon` work-stealing needed since each
//! worker's games are fully independent and long-running), rewritten around
//! `std::thread::scope` so `pause` can join every worker cleanly: each running
//! period gets its own `scope` call, and `resume` opens a fresh one over the
//! same `DatagenWorker`s rather than re-borrowing them inside a still-live
//! scope, without `unsafe` lifetime games.
//!
//! Invocation: `<bin> datagen <threads> <output_directory>` (`spec.md` §6).

mod packed;
mod viriformat;
mod wdl;
mod worker;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, SeedableRng};

use self::worker::{DatagenWorker, WorkerStats};

/// Runs the master loop: spawns `threads` workers writing into
/// `output_dir/minke_data<id>.vf`, then services `stop`/`pause`/`resume`/
/// `report`/`isalive` lines from stdin until `stop` or EOF.
pub fn run(threads: usize, output_dir: &str) {
    let threads = threads.max(1);
    let output_dir = Path::new(output_dir);

    let master_seed: u64 = rand::rngs::StdRng::from_entropy().gen();
    println!("Datagen started with {threads} thread(s) and {master_seed} seed");

    let mut seeder = rand::rngs::StdRng::seed_from_u64(master_seed);
    let stop = Arc::new(AtomicBool::new(false));

    let mut workers = Vec::with_capacity(threads);
    for id in 0..threads {
        let seed: u64 = seeder.gen();
        match DatagenWorker::new(id, seed, output_dir, Arc::clone(&stop)) {
            Ok(w) => workers.push(w),
            Err(e) => log::error!("worker {id} failed to open its output file: {e}"),
        }
    }
    let stats: Vec<Arc<WorkerStats>> = workers.iter().map(DatagenWorker::stats).collect();
    let start = Instant::now();

    let mut input = String::new();
    let mut quit = false;

    // Each `running` period gets its own `thread::scope` call, so
    // `workers.iter_mut()` is borrowed fresh every time a batch of worker
    // threads is spawned. Re-borrowing `workers` to respawn after `pause`
    // inside a single long-lived scope doesn't work: the first `iter_mut()`
    // borrow is pinned to that scope's lifetime for as long as the scope
    // body runs, joining its handles early doesn't release it. Ending the
    // scope (which joins every worker) and opening a new one on `resume`
    // releases the borrow cleanly instead.
    let mut paused = false;

    while !quit {
        std::thread::scope(|scope| {
            for w in workers.iter_mut() {
                scope.spawn(move || w.run());
            }

            loop {
                input.clear();
                if std::io::stdin().read_line(&mut input).unwrap_or(0) == 0 {
                    quit = true;
                    break;
                }
                match input.trim() {
                    "stop" => {
                        quit = true;
                        break;
                    }
                    "pause" => break,
                    "report" => report(&stats, start),
                    "isalive" => println!("alive"),
                    _ => {}
                }
            }

            stop.store(true, Ordering::Relaxed);
            // scope ends here: every worker thread is joined before `workers`
            // can be borrowed again.
        });

        if quit {
            break;
        }
        println!("Datagen paused");
        paused = true;

        while paused {
            input.clear();
            if std::io::stdin().read_line(&mut input).unwrap_or(0) == 0 {
                quit = true;
                break;
            }
            match input.trim() {
                "stop" => quit = true,
                "resume" => {
                    stop.store(false, Ordering::Relaxed);
                    println!("Datagen resumed");
                    paused = false;
                }
                "report" => report(&stats, start),
                "isalive" => println!("alive"),
                _ => {}
            }
            if quit || !paused {
                break;
            }
        }
    }

    report(&stats, start);
    println!("Datagen ran successfully!");
}

fn report(stats: &[Arc<WorkerStats>], start: Instant) {
    let elapsed_ms = (start.elapsed().as_millis() as u64).max(1);
    let line = "+------------+------------+------------+------------+------------+";

    let print_row = |id: &str, games: u64, positions: u64| {
        println!(
            "|{id:>11} |{games:>11} |{positions:>11} |{:>11} |{:>11} |",
            3600 * games * 1000 / elapsed_ms,
            3600 * positions * 1000 / elapsed_ms,
        );
    };

    println!("{line}");
    println!("| thread id  | game count | fen count  |  games/h   |   fens/h   |");
    println!("{line}");

    let mut total_games = 0u64;
    let mut total_positions = 0u64;
    for (id, s) in stats.iter().enumerate() {
        let games = s.games.load(Ordering::Relaxed);
        let positions = s.positions.load(Ordering::Relaxed);
        print_row(&id.to_string(), games, positions);
        total_games += games;
        total_positions += positions;
    }
    println!("{line}");
    print_row("total", total_games, total_positions);
    println!("{line}");
}
