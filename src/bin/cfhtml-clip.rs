//! cfhtml-clip CLI
//!
//! Reformat, save or inspect the `HTML Format` clipboard entry.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use cfhtml_clip::{commands, Encoder, RuleSet, SaveMode, SystemClipboard};
use clap::{ArgAction, Parser};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "cfhtml-clip")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Rewrite chat HTML on the Windows clipboard")]
struct Cli {
    /// List the formats currently on the clipboard
    #[arg(short = 's', conflicts_with = "output")]
    show_formats: bool,

    /// Write the clipboard HTML to a file instead of reformatting it
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// With -o, write only the fragment between the markers
    #[arg(long, requires = "output")]
    html: bool,

    /// With -o, write the HTML document without the CF_HTML header
    #[arg(long, requires = "output", conflicts_with = "html")]
    document: bool,

    /// Rule table to use instead of the built-in one
    #[arg(long, env = "CFHTML_RULES")]
    rules: Option<PathBuf>,

    /// Write the input-relative header offsets older versions produced
    #[arg(long)]
    legacy_offsets: bool,

    /// Log to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Accept the single-dash `-html` spelling; clap would read it as `-h -t -m -l`
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg.as_os_str() == "-html" { OsString::from("--html") } else { arg })
        .collect()
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("ERR:{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    // stdout is reserved for format listings and ERR: lines
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let mut clipboard = SystemClipboard::default();

    if cli.show_formats {
        return commands::list_formats(&mut clipboard, &mut io::stdout().lock());
    }

    if let Some(path) = cli.output {
        let mode = if cli.html {
            SaveMode::Fragment
        } else if cli.document {
            SaveMode::Document
        } else {
            SaveMode::Raw
        };
        return commands::save_html(&mut clipboard, &path, mode);
    }

    let rules = match &cli.rules {
        Some(path) => RuleSet::load(path).with_context(|| format!("Failed to load rules: {}", path.display()))?,
        None => RuleSet::builtin()?,
    };
    let encoder = Encoder::new().with_legacy_offsets(cli.legacy_offsets);

    commands::reformat_clipboard(&mut clipboard, &rules, &encoder)
}
