use std::io;
use std::path::PathBuf;

use clap::{App, Arg};

use solhex::htp::{HtpConfig, HtpEngine};

fn main() -> io::Result<()> {
    let matches = App::new("solhex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Exact Hex solver, driven over a GTP-style text protocol")
        .arg(
            Arg::with_name("logfile")
                .short("l")
                .long("logfile")
                .value_name("FILE")
                .help("Write a debug log to FILE")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("db")
                .long("db")
                .value_name("FILE")
                .help("Solved-position database file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("patterns")
                .long("patterns")
                .value_name("FILE")
                .help("Inferior-cell pattern file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("tt-bits")
                .long("tt-bits")
                .value_name("N")
                .help("Transposition table size as log2 of the entry count")
                .takes_value(true)
                .default_value("20"),
        )
        .get_matches();

    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{} [{}] {}",
            record.target(),
            record.level(),
            message
        ))
    });
    if let Some(log_file) = matches.value_of("logfile") {
        log_dispatcher
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Debug)
                    .chain(fern::log_file(log_file)?),
            )
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Warn)
                    .chain(io::stderr()),
            )
            .apply()
            .unwrap()
    } else {
        log_dispatcher
            .level(log::LevelFilter::Warn)
            .chain(io::stderr())
            .apply()
            .unwrap()
    }

    let tt_bits = matches
        .value_of("tt-bits")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(20)
        .min(30);

    let config = HtpConfig {
        tt_bits,
        db_path: matches.value_of("db").map(PathBuf::from),
        pattern_file: matches.value_of("patterns").map(PathBuf::from),
    };
    HtpEngine::new(config).run()
}
