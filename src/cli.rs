//! Command-line interface for padcell.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::process::Mode;

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Check (report only) or apply (write fixes)
    pub mode: Mode,

    /// Files or directories to process (default: the root)
    pub paths: Vec<PathBuf>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Project root that relative paths and globs are resolved against
    pub root: Option<PathBuf>,

    /// Only run these formats
    pub formats: Vec<String>,

    /// Tolerate misbehaving steps and dump their orbits
    pub padded_cell: bool,

    pub max_iterations: Option<usize>,

    pub max_message_lines: Option<usize>,

    pub max_files_to_list: Option<usize>,

    pub diagnose_dir: Option<PathBuf>,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Enable debug output
    pub debug: bool,

    /// Enable info output
    pub verbose: bool,

    /// Silent mode (no report output)
    pub silent: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("padcell")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Enforce formatting step chains, tolerating and diagnosing non-idempotent steps")
        .arg(
            Arg::new("mode")
                .help("check: report violations; apply: fix them in place")
                .value_name("MODE")
                .required(true)
                .value_parser(["check", "apply"]),
        )
        .arg(
            Arg::new("paths")
                .help("Files or directories to process (default: the root)")
                .value_name("PATH")
                .num_args(0..)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Use this config file instead of discovering padcell.toml")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .help("Project root (default: current directory)")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Only run the named format (can be repeated)")
                .value_name("NAME")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("padded-cell")
                .long("padded-cell")
                .help("Tolerate misbehaving steps and dump their intermediate results")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .help("Applications of a format before it is considered divergent")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("max-message-lines")
                .long("max-message-lines")
                .help("Diff lines shown across all files")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("max-files-to-list")
                .long("max-files-to-list")
                .help("Files shown with a diff before falling back to names")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("diagnose-dir")
                .long("diagnose-dir")
                .help("Where padded-cell mode writes intermediate results")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto, 1=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (per-file classification, config sources)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable informational output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Silent mode (no report, exit code only)")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    let mode = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("apply") => Mode::Apply,
        _ => Mode::Check,
    };

    CliArgs {
        mode,
        paths: matches
            .get_many::<PathBuf>("paths")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        root: matches.get_one::<PathBuf>("root").cloned(),
        formats: matches
            .get_many::<String>("format")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        padded_cell: matches.get_flag("padded-cell"),
        max_iterations: matches.get_one::<usize>("max-iterations").copied(),
        max_message_lines: matches.get_one::<usize>("max-message-lines").copied(),
        max_files_to_list: matches.get_one::<usize>("max-files-to-list").copied(),
        diagnose_dir: matches.get_one::<PathBuf>("diagnose-dir").cloned(),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        debug: matches.get_flag("debug"),
        verbose: matches.get_flag("verbose"),
        silent: matches.get_flag("silent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_builds() {
        let cmd = build_cli();
        assert_eq!(cmd.get_name(), "padcell");
        cmd.debug_assert();
    }

    #[test]
    fn test_mode_is_required() {
        assert!(build_cli().try_get_matches_from(["padcell"]).is_err());
        assert!(build_cli()
            .try_get_matches_from(["padcell", "fix"])
            .is_err());
    }

    #[test]
    fn test_defaults() {
        let args = parse_args_from(["padcell", "check"]);
        assert_eq!(args.mode, Mode::Check);
        assert!(args.paths.is_empty());
        assert!(!args.padded_cell);
        assert_eq!(args.max_iterations, None);
        assert_eq!(args.max_message_lines, None);
        assert!(args.formats.is_empty());
    }

    #[test]
    fn test_apply_with_paths() {
        let args = parse_args_from(["padcell", "apply", "src", "README.md"]);
        assert_eq!(args.mode, Mode::Apply);
        assert_eq!(args.paths, [PathBuf::from("src"), PathBuf::from("README.md")]);
    }

    #[test]
    fn test_limits_and_padded_cell() {
        let args = parse_args_from([
            "padcell",
            "--padded-cell",
            "--max-iterations",
            "4",
            "--max-message-lines=20",
            "--max-files-to-list",
            "3",
            "check",
        ]);
        assert!(args.padded_cell);
        assert_eq!(args.max_iterations, Some(4));
        assert_eq!(args.max_message_lines, Some(20));
        assert_eq!(args.max_files_to_list, Some(3));
    }

    #[test]
    fn test_repeatable_format_and_exclude() {
        let args = parse_args_from([
            "padcell", "check", "--format", "misc", "--format", "java", "-e", "*.gen", "--exclude",
            "build*",
        ]);
        assert_eq!(args.formats, ["misc", "java"]);
        assert_eq!(args.exclude, ["*.gen", "build*"]);
    }

    #[test]
    fn test_logging_flags() {
        let args = parse_args_from(["padcell", "-D", "-v", "-S", "check"]);
        assert!(args.debug);
        assert!(args.verbose);
        assert!(args.silent);
    }
}
