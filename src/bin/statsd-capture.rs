#![allow(unknown_lints)]

extern crate chrono;
extern crate fern;
#[macro_use]
extern crate log;
extern crate statsd_capture;

use chrono::Utc;
use statsd_capture::capture::Hub;
use statsd_capture::config::{self, Format};
use statsd_capture::report;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process;

fn replay<R: BufRead>(hub: &Hub, source: &str, reader: R) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        for err in hub.ingest(&line) {
            debug!("{}: skipped line: {}", source, err);
        }
    }
    Ok(())
}

fn replay_path(hub: &Hub, path: &Path) -> io::Result<()> {
    let fp = File::open(path)?;
    replay(hub, &path.display().to_string(), BufReader::new(fp))
}

fn main() {
    let args = match config::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("statsd-capture: {}", e);
            process::exit(1);
        }
    };

    let level = match args.verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let logging = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}][{}] {}",
                record.module_path().unwrap_or("?"),
                record.line().unwrap_or(0),
                Utc::now().to_rfc3339(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply();
    if let Err(e) = logging {
        eprintln!("statsd-capture: could not set up logging: {}", e);
        process::exit(1);
    }

    let hub = Hub::default();
    let capture = hub.capture();

    if args.inputs.is_empty() {
        info!("replaying stdin");
        let stdin = io::stdin();
        if let Err(e) = replay(&hub, "stdin", stdin.lock()) {
            error!("could not read stdin: {}", e);
            process::exit(1);
        }
    } else {
        for path in &args.inputs {
            info!("replaying {}", path.display());
            if let Err(e) = replay_path(&hub, path) {
                error!("could not read {}: {}", path.display(), e);
                process::exit(1);
            }
        }
    }
    capture.close();
    info!(
        "replayed {} good lines, {} bad lines",
        hub.good_lines(),
        hub.bad_lines()
    );

    let summaries = match report::summarize(&capture, &args.split, &args.filter) {
        Ok(summaries) => summaries,
        Err(e) => {
            error!("could not summarize capture: {}", e);
            process::exit(1);
        }
    };

    match args.format {
        Format::Text => print!("{}", report::render_text(&summaries, &args.split)),
        Format::Json => match report::render_json(&summaries) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("could not render report: {}", e);
                process::exit(1);
            }
        },
    }
}
