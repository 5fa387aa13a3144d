use std::process;

use notesgen::cli::{self, CliArgs, ConfigFile};
use notesgen::config::Config;
use notesgen::convert::{process_files, RenderOptions};
use notesgen::input::InputMode;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "NOTESGEN_LOG";

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("notesgen: {e}");
            eprintln!("{}", cli::USAGE);
            process::exit(1);
        }
    };
    if args.help {
        println!("{}", cli::USAGE);
        println!();
        println!("{}", cli::HELP);
        return;
    }

    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("notesgen: {e}");
        process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config);

    // ── Command line over config file ─────────────────────────────────────────
    let recursive = args.recursive || config.recursive;
    let options = RenderOptions {
        timeout: args.timeout.unwrap_or(config.timeout),
        template: config.template && !args.bare,
        ..RenderOptions::default()
    };
    tracing::debug!(?options, recursive, extension = %config.extension, "settings");

    let mode = InputMode::resolve(&args.inputs)?;
    let files = mode.input_files(recursive, args.output.as_deref(), &config.extension)?;
    if files.is_empty() {
        tracing::warn!(?mode, "no Markdown files found");
    }
    process_files(&files, &options)?;
    Ok(())
}

/// Read the selected config file.  Problems are warnings: the defaults (or
/// the lines that did parse) still apply.
fn load_config(choice: &ConfigFile) -> Config {
    let path = match choice {
        ConfigFile::Skip => return Config::default(),
        ConfigFile::Explicit(path) => path.clone(),
        ConfigFile::Search => match cli::find_user_config() {
            Some(path) => path,
            None => return Config::default(),
        },
    };
    match Config::load_file(&path) {
        Ok((config, errors)) => {
            for e in errors {
                eprintln!("notesgen: warning: {}: {e}", path.display());
            }
            config
        }
        Err(e) => {
            eprintln!("notesgen: warning: {}: {e}", path.display());
            Config::default()
        }
    }
}

/// Install the stderr log subscriber.
///
/// `NOTESGEN_LOG` takes a full filter directive; otherwise warnings and
/// snippet console output are shown, or everything from `debug` up with `-v`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "debug" } else { "warn,notesgen::console=info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}
