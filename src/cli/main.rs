use anyhow::{Result, bail};
use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::{Path, PathBuf};

use photo_mover::config::Config;
use photo_mover::pattern::{TOKENS, resolve_pattern};
use photo_mover::pipeline::{self, Organizer};

#[derive(Parser, Debug)]
#[command(
    name = "photo-mover",
    version,
    about = "Organize photos and videos into folders by capture date, camera and location"
)]
struct Cli {
    /// Directory to read photos and videos from
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// Directory to read from (alternative to the positional SOURCE)
    #[arg(long = "source", value_name = "PATH", conflicts_with = "source")]
    source_flag: Option<PathBuf>,

    /// Root directory of the organized tree
    #[arg(long, value_name = "PATH")]
    destination: Option<PathBuf>,

    /// Move files instead of copying them; only a case-insensitive `true` enables it
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = legacy_bool
    )]
    movefiles: Option<bool>,

    /// Destination pattern, relative to the destination root
    #[arg(long, value_name = "TEMPLATE")]
    pattern: Option<String>,

    /// Google Geocoding API key; enables {location}
    #[arg(long, value_name = "KEY")]
    apikey: Option<String>,

    /// Append diagnostic lines to this file
    #[arg(long, value_name = "PATH")]
    debugfile: Option<String>,

    /// Path to config file (default: photo-mover.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config file and exit
    #[arg(long)]
    init: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Print the metadata extracted from every file and exit without moving anything
    #[arg(long = "show-metadata")]
    show_metadata: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn source(&self) -> Option<&Path> {
        self.source.as_deref().or(self.source_flag.as_deref())
    }

    /// Apply command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if let Some(move_files) = self.movefiles {
            config.move_files = move_files;
        }
        if let Some(key) = &self.apikey {
            config.geocoding.api_key = key.clone();
        }
        if let Some(debug_file) = &self.debugfile {
            config.output.debug_file = Some(debug_file.clone());
        }
    }
}

/// `true` in any case is true; everything else, the empty string included, is false.
fn legacy_bool(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

/// Long flags that take a value.
const VALUE_FLAGS: &[&str] = &[
    "source",
    "destination",
    "movefiles",
    "pattern",
    "apikey",
    "debugfile",
    "config",
];

/// Long flags without a value.
const SWITCHES: &[&str] = &["init", "json", "show-metadata", "verbose", "help", "version"];

/// Rewrite `--Name:value` style arguments to `--name=value` and lowercase known flag names.
fn normalize_args<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 {
                return arg;
            }
            normalize_arg(&arg).unwrap_or(arg)
        })
        .collect()
}

fn normalize_arg(arg: &str) -> Option<String> {
    let body = arg.strip_prefix("--")?;
    let (name, value) = match body.find([':', '=']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let name = name.to_ascii_lowercase();

    match value {
        Some(value) if VALUE_FLAGS.contains(&name.as_str()) => Some(format!("--{name}={value}")),
        None if VALUE_FLAGS.contains(&name.as_str()) || SWITCHES.contains(&name.as_str()) => {
            Some(format!("--{name}"))
        }
        _ => None,
    }
}

/// Help section listing the pattern tokens.
fn tokens_help() -> String {
    let mut help = String::from("Pattern tokens:\n");
    for (token, meaning) in TOKENS {
        help.push_str(&format!("  {token:<14}{meaning}\n"));
    }
    help.push_str(&format!(
        "\nDefault pattern: {}\n\nLegacy syntax such as --destination:/photos is accepted.",
        photo_mover::pattern::DEFAULT_PATTERN
    ));
    help
}

fn parse_cli<I: IntoIterator<Item = String>>(args: I) -> Result<Cli, clap::Error> {
    let matches = Cli::command()
        .after_help(tokens_help())
        .try_get_matches_from(normalize_args(args))?;
    Cli::from_arg_matches(&matches)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli(std::env::args()).unwrap_or_else(|e| e.exit());

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let Some(source) = cli.source() else {
        bail!("No source directory specified. Use --help for usage.");
    };

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // Handle --show-metadata
    if cli.show_metadata {
        return show_metadata(source, &config);
    }

    let Some(destination) = cli.destination.as_deref() else {
        bail!("No destination directory specified. Use --destination <PATH>.");
    };

    log::info!("Pattern: {}", config.pattern);
    if config.geocoding.enabled() {
        log::info!("Geocoding enabled");
    }

    let mut organizer = Organizer::new(config);
    let summary = organizer.run(source, destination).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    log::info!("Done: {summary}");

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print the extracted fields of every file below `source`.
fn show_metadata(source: &Path, config: &Config) -> Result<()> {
    if !source.exists() {
        bail!("Source path does not exist: {}", source.display());
    }

    for path in pipeline::collect_files(source) {
        println!();
        println!("{BOLD}File:{RESET} {}", path.display());
        println!("{DIM}{}{RESET}", "─".repeat(72));

        match pipeline::inspect(&path, config) {
            Ok(Some(extracted)) => {
                let fields = &extracted.fields;
                print_row("Kind", &format!("{:?}", extracted.kind));
                print_row("Date", &format!("{}-{:02}", fields.year, fields.month));
                print_row("Date source", extracted.date_source);
                print_row("Camera", &fields.camera);
                if let Some(gps) = extracted.coordinate {
                    print_row("GPS", &format!("{:.6}, {:.6}", gps.latitude, gps.longitude));
                }
                print_row("Destination", &resolve_pattern(&config.pattern, fields));
            }
            Ok(None) => println!("  {DIM}(not an image or video){RESET}"),
            Err(e) => println!("  {DIM}(unreadable: {e:#}){RESET}"),
        }
    }
    println!();

    Ok(())
}

/// Print a single row of the metadata table; empty values are left out.
fn print_row(tag: &str, val: &str) {
    if !val.is_empty() {
        println!("  {tag:<14} : {val}");
    }
}
