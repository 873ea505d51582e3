//! Provides the CLI option parser
//!
//! Used to parse the argv/config file into a struct that the replay binary can
//! consume and use as configuration data.

use clap::{App, Arg};
use metric::Criteria;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use thiserror::Error;
use toml;

const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// Failure to assemble an `Args`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("could not read config file: {0}")]
    Io(#[from] io::Error),
    /// The config file is not TOML.
    #[error("could not parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    /// A key is present but holds the wrong kind of value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How the report is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One human readable line per metric and group.
    Text,
    /// A JSON array of summaries.
    Json,
}

/// Configuration for the replay binary
///
/// This struct is what we construct from parsing the configuration file and
/// the command line. Please see `parse_args` for details.
#[derive(Debug)]
pub struct Args {
    /// The verbosity setting. The higher the value the more chatty logging
    /// gets.
    pub verbose: u64,
    /// Report rendering.
    pub format: Format,
    /// Files of newline separated statsd lines. Empty means stdin.
    pub inputs: Vec<PathBuf>,
    /// Tag keys every metric is additionally broken down by.
    pub split: Vec<String>,
    /// Only entries matching these criteria are reported.
    pub filter: Criteria,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            verbose: 0,
            format: Format::Text,
            inputs: Vec::new(),
            split: Vec::new(),
            filter: Criteria::new(),
        }
    }
}

fn invalid<S: Into<String>>(msg: S) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn string_array(value: &toml::Value, key: &str) -> Result<Vec<String>, ConfigError> {
    let arr = value
        .as_array()
        .ok_or_else(|| invalid(format!("{} must be an array", key)))?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| invalid(format!("{} must hold only strings", key)))
        })
        .collect()
}

/// Parse the configuration file.
///
/// Every key is optional:
///
/// ```toml
/// verbose = 2
/// format = "json"
/// inputs = ["/tmp/dump.statsd"]
///
/// [report]
/// split = ["route"]
/// require = ["canary"]
///
/// [report.filter]
/// env = "test"
/// ```
pub fn parse_config_file(buffer: &str, verbosity: u64) -> Result<Args, ConfigError> {
    let mut args = Args::default();
    let value: toml::Value = toml::from_str(buffer)?;
    let table = value
        .as_table()
        .ok_or_else(|| invalid("config must be a table"))?;

    args.verbose = match table.get("verbose") {
        Some(v) => {
            let v = v.as_integer()
                .ok_or_else(|| invalid("verbose must be an integer"))?;
            if v < 0 {
                return Err(invalid("verbose must not be negative"));
            }
            (v as u64).max(verbosity)
        }
        None => verbosity,
    };

    if let Some(fmt) = table.get("format") {
        args.format = match fmt.as_str() {
            Some("text") => Format::Text,
            Some("json") => Format::Json,
            _ => return Err(invalid("format must be \"text\" or \"json\"")),
        };
    }

    if let Some(inputs) = table.get("inputs") {
        args.inputs = string_array(inputs, "inputs")?
            .into_iter()
            .map(PathBuf::from)
            .collect();
    }

    if let Some(report) = table.get("report") {
        let report = report
            .as_table()
            .ok_or_else(|| invalid("report must be a table"))?;
        if let Some(split) = report.get("split") {
            args.split = string_array(split, "report.split")?;
        }
        if let Some(require) = report.get("require") {
            args.filter = Criteria::tokens(string_array(require, "report.require")?);
        }
        if let Some(filter) = report.get("filter") {
            let filter = filter
                .as_table()
                .ok_or_else(|| invalid("report.filter must be a table"))?;
            for (k, v) in filter.iter() {
                let v = v.as_str()
                    .ok_or_else(|| invalid(format!("report.filter.{} must be a string", k)))?;
                args.filter = args.filter.pair(k.clone(), v);
            }
        }
    }

    Ok(args)
}

/// Parse the configuration arguments
///
/// This function reads the command line, loads the config file if `-C` was
/// given and lets the command line override it.
pub fn parse_args() -> Result<Args, ConfigError> {
    let matches = App::new("statsd-capture")
        .version(VERSION.unwrap_or("unknown"))
        .about("replay statsd lines into a capture and summarize them")
        .arg(
            Arg::with_name("config-file")
                .long("config")
                .short("C")
                .value_name("config")
                .help("The config file to feed in.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Turn on verbose output."),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Emit the report as JSON."),
        )
        .arg(
            Arg::with_name("split")
                .long("split")
                .value_name("key")
                .multiple(true)
                .number_of_values(1)
                .takes_value(true)
                .help("Break every metric down by this tag key."),
        )
        .arg(
            Arg::with_name("INPUT")
                .multiple(true)
                .help("Files of statsd lines. Reads stdin when absent."),
        )
        .get_matches();

    let verb = matches.occurrences_of("verbose");

    let mut args = match matches.value_of("config-file") {
        Some(filename) => {
            let mut fp = File::open(filename)?;
            let mut buffer = String::new();
            fp.read_to_string(&mut buffer)?;
            parse_config_file(&buffer, verb)?
        }
        None => {
            let mut args = Args::default();
            args.verbose = verb;
            args
        }
    };

    if matches.is_present("json") {
        args.format = Format::Json;
    }
    if let Some(split) = matches.values_of("split") {
        args.split = split.map(|s| s.to_string()).collect();
    }
    if let Some(inputs) = matches.values_of("INPUT") {
        args.inputs = inputs.map(PathBuf::from).collect();
    }
    Ok(args)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_file_empty() {
        let args = parse_config_file("", 0).unwrap();

        assert_eq!(args.verbose, 0);
        assert_eq!(args.format, Format::Text);
        assert!(args.inputs.is_empty());
        assert!(args.split.is_empty());
        assert!(args.filter.is_empty());
    }

    #[test]
    fn config_file_verbosity() {
        let config = r#"
verbose = 2
"#;
        assert_eq!(parse_config_file(config, 0).unwrap().verbose, 2);
        assert_eq!(parse_config_file(config, 4).unwrap().verbose, 4);
        assert_eq!(parse_config_file("", 3).unwrap().verbose, 3);
    }

    #[test]
    fn config_file_inputs_and_format() {
        let config = r#"
format = "json"
inputs = ["/tmp/a.statsd", "/tmp/b.statsd"]
"#;
        let args = parse_config_file(config, 0).unwrap();

        assert_eq!(args.format, Format::Json);
        assert_eq!(
            args.inputs,
            vec![PathBuf::from("/tmp/a.statsd"), PathBuf::from("/tmp/b.statsd")]
        );
    }

    #[test]
    fn config_file_report() {
        let config = r#"
[report]
split = ["tag1", "tag2"]
require = ["canary"]

[report.filter]
env = "test"
"#;
        let args = parse_config_file(config, 0).unwrap();

        assert_eq!(args.split, vec!["tag1".to_string(), "tag2".to_string()]);
        assert_eq!(
            args.filter,
            Criteria::new().token("canary").pair("env", "test")
        );
    }

    #[test]
    fn config_file_rejects_bad_values() {
        for config in &[
            "verbose = \"loud\"",
            "verbose = -1",
            "format = \"yaml\"",
            "inputs = \"one\"",
            "inputs = [1]",
            "report = 1",
            "[report]\nsplit = [true]",
            "[report.filter]\nenv = 1",
        ] {
            match parse_config_file(config, 0) {
                Err(ConfigError::Invalid(_)) => {}
                other => panic!("{:?} gave {:?}", config, other),
            }
        }
    }

    #[test]
    fn config_file_not_toml() {
        match parse_config_file("verbose = = 1", 0) {
            Err(ConfigError::Toml(_)) => {}
            other => panic!("{:?}", other),
        }
    }
}
