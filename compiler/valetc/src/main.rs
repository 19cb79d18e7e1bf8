//! Valet CLI driver.

mod commands;

use commands::{check_file, explain_error, lex_file, run_file};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: valet run <file.ash>");
                std::process::exit(1);
            }
            run_file(&args[2]);
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: valet check <file.ash>");
                std::process::exit(1);
            }
            check_file(&args[2]);
        }
        "lex" => {
            if args.len() < 3 {
                eprintln!("Usage: valet lex <file.ash>");
                std::process::exit(1);
            }
            lex_file(&args[2]);
        }
        "--explain" | "explain" => {
            if args.len() < 3 {
                eprintln!("Usage: valet --explain <ERROR_CODE>");
                eprintln!("Example: valet --explain E2001");
                std::process::exit(1);
            }
            explain_error(&args[2]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("Valet {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // A bare script path runs it.
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ash"))
            {
                run_file(command);
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

/// Enable tracing when `RUST_LOG` is set (e.g. `RUST_LOG=valet_eval=trace`).
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .init();
    }
}

fn print_usage() {
    println!("Valet scripting engine");
    println!();
    println!("Usage: valet <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.ash>       Run a script");
    println!("  check <file.ash>     Lex, parse, and type check (no execution)");
    println!("  lex <file.ash>       Tokenize and display tokens");
    println!("  --explain <code>     Explain an error code (e.g., E2001)");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Examples:");
    println!("  valet run farm.ash");
    println!("  valet check lib.ash");
    println!("  valet --explain E6001");
}
