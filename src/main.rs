//! padcell - Enforce formatting step chains on a source tree

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use glob::Pattern;
use padcell::diff::annotations;
use padcell::files::{self, FileSelector};
use padcell::{
    parse_args, CliArgs, Config, FormatConfig, Glyphs, Mode, ReportLimits, Result, Settings,
    SourceFile, ViolationCollector,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

fn main() -> ExitCode {
    let args = parse_args();
    init_logging(args.verbose, args.debug);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

/// Returns whether the run passed. Errors are usage or configuration problems.
fn run(args: &CliArgs) -> Result<bool> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let root = std::fs::canonicalize(&root)
        .with_context(|| format!("root {} does not exist", root.display()))?;

    let config = build_config(args, &root)?;
    config.validate()?;
    if config.formats.is_empty() {
        bail!("no formats configured; add a [[format]] table to padcell.toml");
    }

    let formats: Vec<&FormatConfig> = if args.formats.is_empty() {
        config.formats.iter().collect()
    } else {
        args.formats
            .iter()
            .map(|name| config.format(name))
            .collect::<std::result::Result<_, _>>()?
    };

    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                warn!("failed to configure thread pool: {e}");
            }
        }
    }

    let exclude: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("ignoring invalid exclude pattern '{p}': {e}");
                None
            }
        })
        .collect();

    let diagnose_root = root.join(&config.diagnose_dir);
    let paths: Vec<PathBuf> = files::collect_files(&root, &args.paths, &exclude)
        .into_iter()
        .filter(|p| !p.starts_with(&diagnose_root))
        .collect();
    debug!("Collected {} files under {}", paths.len(), root.display());

    let mut passed = true;
    for format in formats {
        passed &= run_format(args, &config, format, &root, &paths)?;
    }
    Ok(passed)
}

/// Build configuration from CLI args and the config file(s)
fn build_config(args: &CliArgs, root: &Path) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        debug!("Using explicit config file: {}", config_path.display());
        Config::from_toml_file(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    } else {
        let discovered = Config::discover_config_files(root);
        if discovered.is_empty() {
            debug!("No config files discovered for: {}", root.display());
        }
        for f in &discovered {
            debug!("Discovered config file: {}", f.display());
        }
        Config::from_discovered_files(root)
    };

    if args.padded_cell {
        config.padded_cell = true;
    }
    if let Some(v) = args.max_iterations {
        config.max_iterations = v;
    }
    if let Some(v) = args.max_message_lines {
        config.max_message_lines = v;
    }
    if let Some(v) = args.max_files_to_list {
        config.max_files_to_list = v;
    }
    if let Some(dir) = &args.diagnose_dir {
        config.diagnose_dir.clone_from(dir);
    }

    debug!(
        "Config: max_iterations={} max_message_lines={} max_files_to_list={} padded_cell={}",
        config.max_iterations,
        config.max_message_lines,
        config.max_files_to_list,
        config.padded_cell
    );
    Ok(config)
}

/// Run one format over its share of the files. Returns whether it passed.
fn run_format(
    args: &CliArgs,
    config: &Config,
    format: &FormatConfig,
    root: &Path,
    paths: &[PathBuf],
) -> Result<bool> {
    let formatter = format.build(config.line_ending)?;
    let exemptions = format.exemptions()?;
    let selector = FileSelector::new(format.include_patterns()?, format.exclude_patterns()?);

    let selected: Vec<&PathBuf> = paths
        .iter()
        .filter(|p| {
            files::relative_path(root, p).is_some_and(|relative| selector.matches(&relative))
        })
        .collect();

    let mut passed = true;
    let sources: Vec<SourceFile> = selected
        .par_iter()
        .map(|path| files::read_source(root, path))
        .collect::<Vec<_>>()
        .into_iter()
        .filter_map(|read| match read {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("{e:#}");
                passed = false;
                None
            }
        })
        .collect();
    info!("format '{}': {} files", formatter.name(), sources.len());

    let diagnose_dir = root.join(&config.diagnose_dir).join(formatter.name());
    let workspace = annotations::workspace().filter(|_| args.mode == Mode::Check);
    let settings = Settings {
        max_iterations: config.max_iterations,
        padded_cell: config.padded_cell,
        limits: ReportLimits {
            max_message_lines: config.max_message_lines,
            max_files_to_list: config.max_files_to_list,
        },
        glyphs: Glyphs::detect(),
        annotations: workspace.map(|ws| annotations::workspace_prefix(root, &ws)),
        diagnose_dir: diagnose_dir.display().to_string(),
    };

    let collector = ViolationCollector::new(&formatter, settings).with_exemptions(exemptions);
    let outcome = collector.run(args.mode, &sources);

    for (relative, content) in &outcome.writes {
        let path = root.join(relative);
        match files::write_atomic(&path, content) {
            Ok(()) => info!("Fixed {relative}"),
            Err(e) => {
                warn!("{e:#}");
                passed = false;
            }
        }
    }
    if config.padded_cell || !outcome.diagnostics.is_empty() {
        let dumped = files::clear_dir(&diagnose_dir)
            .and_then(|()| files::write_diagnostics(&diagnose_dir, &outcome.diagnostics));
        match dumped {
            Ok(()) if config.padded_cell && !outcome.diagnostics.is_empty() => warn!(
                "format '{}' misbehaved; intermediate results are in {}",
                formatter.name(),
                diagnose_dir.display()
            ),
            Ok(()) => {}
            Err(e) => {
                warn!("{e:#}");
                passed = false;
            }
        }
    }

    for command in &outcome.annotations {
        println!("{command}");
    }
    if !args.silent {
        if let Some(report) = &outcome.report {
            print!("{report}");
        }
        if let Some(message) = &outcome.misbehaving {
            eprint!("{message}");
        }
    }

    let errors = outcome.errors().count();
    info!(
        "format '{}': {} written, {} errors",
        formatter.name(),
        outcome.writes.len(),
        errors
    );
    Ok(passed && !outcome.failed)
}
