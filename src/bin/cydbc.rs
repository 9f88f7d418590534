//! # cydbc - CDB/SQLite Converter
//!
//! Command-line front-end for the cydb codec.
//!
//! ## Usage
//!
//! ```bash
//! # CDB file -> SQLite database file
//! cydbc decode ChampDBEx.cdb ChampDBEx.db
//!
//! # SQLite database file -> compressed CDB file
//! cydbc encode ChampDBEx.db ChampDBEx.cdb
//!
//! # Show version
//! cydbc --version
//!
//! # Show help
//! cydbc --help
//! ```
//!
//! `RUST_LOG` overrides the log filter; `-v`/`-vv` raise the default.

use eyre::{bail, Result, WrapErr};
use rusqlite::{Connection, OpenFlags};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

enum Mode {
    Decode,
    Encode,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut verbose = 0u8;
    let mut mode: Option<Mode> = None;
    let mut paths: Vec<PathBuf> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("cydbc {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "-v" => verbose += 1,
            "-vv" => verbose += 2,
            "decode" if mode.is_none() => mode = Some(Mode::Decode),
            "encode" if mode.is_none() => mode = Some(Mode::Encode),
            arg if arg.starts_with('-') => {
                bail!("unknown option: {} (try --help)", arg);
            }
            arg => paths.push(PathBuf::from(arg)),
        }
        i += 1;
    }

    init_logging(verbose);

    let Some(mode) = mode else {
        print_usage();
        bail!("missing subcommand");
    };
    if paths.len() != 2 {
        bail!("expected exactly one input and one output path (try --help)");
    }
    let (input, output) = (&paths[0], &paths[1]);

    match mode {
        Mode::Decode => decode_file(input, output),
        Mode::Encode => encode_file(input, output),
    }
}

fn decode_file(input: &Path, output: &Path) -> Result<()> {
    if output.exists() {
        bail!("output {} already exists", output.display());
    }

    let bytes = std::fs::read(input)
        .wrap_err_with(|| format!("failed to read {}", input.display()))?;

    let conn = Connection::open(output)
        .wrap_err_with(|| format!("failed to create {}", output.display()))?;
    cydb::decode_into(&bytes, &conn)
        .wrap_err_with(|| format!("failed to decode {}", input.display()))?;

    println!("{} -> {}", input.display(), output.display());
    Ok(())
}

fn encode_file(input: &Path, output: &Path) -> Result<()> {
    let conn = Connection::open_with_flags(input, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .wrap_err_with(|| format!("failed to open {}", input.display()))?;

    let bytes = cydb::encode(&conn)
        .wrap_err_with(|| format!("failed to encode {}", input.display()))?;
    std::fs::write(output, &bytes)
        .wrap_err_with(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} -> {} ({} bytes)",
        input.display(),
        output.display(),
        bytes.len()
    );
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn print_usage() {
    println!("cydbc - convert between Cyanide CDB files and SQLite databases");
    println!();
    println!("Usage:");
    println!("  cydbc decode <input.cdb> <output.db>   CDB file to SQLite database");
    println!("  cydbc encode <input.db> <output.cdb>   SQLite database to CDB file");
    println!();
    println!("Options:");
    println!("  -v, -vv       increase log verbosity (RUST_LOG overrides)");
    println!("  -h, --help    show this help");
    println!("  -V, --version show version");
}
