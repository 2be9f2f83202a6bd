//! Binary entry point: `minke` runs the UCI loop on stdin/stdout by default,
//! or `minke datagen <threads> <output_directory>` runs the self-play
//! pipeline (`spec.md` §6). Grounded on `pleco_engine/src/main.rs`'s
//! `fn main` dispatch shape, narrowed to this crate's two actual modes.

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => {
            minke_engine::uci::Uci::new().run();
            ExitCode::SUCCESS
        }
        Some("datagen") => {
            let threads = match args.get(2).and_then(|s| s.parse::<usize>().ok()) {
                Some(t) => t,
                None => {
                    eprintln!("usage: minke datagen <threads> <output_directory>");
                    return ExitCode::FAILURE;
                }
            };
            let Some(output_dir) = args.get(3) else {
                eprintln!("usage: minke datagen <threads> <output_directory>");
                return ExitCode::FAILURE;
            };
            minke_engine::datagen::run(threads, output_dir);
            ExitCode::SUCCESS
        }
        Some(other) => {
            eprintln!("unrecognized subcommand: {other}");
            ExitCode::FAILURE
        }
    }
}
