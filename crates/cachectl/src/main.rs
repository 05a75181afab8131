//! cachectl - inspect and administer a local resource cache

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use cachectl_core::{CacheManager, CoreError, PolicyRequest, Reporter};
use cachectl_storage::{LocalCache, StorageError};
use config::{Config, LoggingConfig};

/// cachectl - inspect and administer a local resource cache
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CACHECTL_CONFIG", default_value = "cachectl.toml")]
    config: String,

    /// Cache directory
    #[arg(long, visible_alias = "cache-directory", env = "CACHECTL_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the contents of the cache
    Show {
        /// A regular expression to filter the entries shown
        #[arg(short, long)]
        regex: Option<String>,
    },
    /// Inspect the cache policies
    Inspect,
    /// Create a new cache policy
    Create(PolicyArgs),
    /// Update a cache policy (it moves to the end of the list)
    Update(PolicyArgs),
    /// Delete a cache policy
    Delete {
        /// The URI regular expression pattern
        #[arg(long)]
        pattern: String,
    },
    /// Flush matching entries from the cache
    Flush {
        /// A regular expression to select the entries flushed
        #[arg(short, long)]
        regex: String,
    },
}

#[derive(clap::Args, Debug)]
struct PolicyArgs {
    /// The URI regular expression pattern
    #[arg(long)]
    pattern: String,

    /// Cache matching resources?
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    include: bool,

    /// The maximum number of entries allowed
    #[arg(long, allow_hyphen_values = true)]
    size: Option<String>,

    /// The maximum space the entries are allowed
    #[arg(long, allow_hyphen_values = true)]
    space: Option<String>,

    /// The maximum age each entry is allowed to be
    #[arg(long, allow_hyphen_values = true)]
    age: Option<String>,

    /// How long to wait before purging a deleted entry
    #[arg(long = "delete", allow_hyphen_values = true)]
    delete_wait: Option<String>,
}

impl From<PolicyArgs> for PolicyRequest {
    fn from(args: PolicyArgs) -> Self {
        PolicyRequest {
            pattern: args.pattern,
            include: args.include,
            size: args.size,
            space: args.space,
            age: args.age,
            delete_wait: args.delete_wait,
        }
    }
}

fn main() -> ExitCode {
    let mut args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let Some(command) = args.command.take() else {
        let _ = Args::command().print_help();
        return ExitCode::SUCCESS;
    };

    let result = Config::load(&args.config).and_then(|config| {
        init_logging(&config.logging);
        run(&args, &config, command)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("{}", error_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Text printed to stderr for a failed command
///
/// Parameter errors get a usage hint; anything else is a fatal error
/// shown with its cause chain.
fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<CoreError>() {
        Some(core) if core.is_parameter_error() => {
            format!("{}\nRun 'cachectl --help' for usage\n", core)
        }
        _ => format!("Error: {:#}\n", err),
    }
}

/// Open the cache directory; only a missing directory is an initialization error
fn open_cache(directory: &Path) -> Result<LocalCache, CoreError> {
    LocalCache::open(directory).map_err(|e| match e {
        StorageError::NotADirectory(path) => {
            warn!("Cannot open cache at {:?}", path);
            CoreError::StorageInit(Some(path))
        }
        other => CoreError::Storage(other),
    })
}

fn run(args: &Args, config: &Config, command: Command) -> Result<()> {
    let directory = config
        .cache_directory(args.cache_dir.clone())
        .ok_or(CoreError::StorageInit(None))?;
    let mut manager = CacheManager::new(open_cache(&directory)?)?;
    let mut reporter = Reporter::new(io::stdout().lock(), io::stderr().lock());

    debug!("Running {:?}", command);
    match command {
        Command::Show { regex } => {
            manager.show(regex.as_deref(), args.verbose, &mut reporter)?;
        }
        Command::Inspect => {
            manager.inspect(&mut reporter)?;
        }
        Command::Create(policy) => {
            let record = PolicyRequest::from(policy).resolve()?;
            manager.create(record, &mut reporter)?;
        }
        Command::Update(policy) => {
            let record = PolicyRequest::from(policy).resolve()?;
            manager.update(record, &mut reporter)?;
        }
        Command::Delete { pattern } => {
            manager.delete(&pattern, &mut reporter)?;
        }
        Command::Flush { regex } => {
            manager.flush(&regex, &mut reporter)?;
        }
    }
    Ok(())
}

/// Initialize logging on stderr
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> (Args, Command) {
        let mut args = Args::try_parse_from(argv).unwrap();
        let command = args.command.take().unwrap();
        (args, command)
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let args = Args::try_parse_from([
            "cachectl",
            "--cache-dir",
            "/cache",
            "create",
            "--pattern",
            "example\\.com",
            "--include",
            "false",
            "--size",
            "-1",
            "--delete",
            "1d",
        ])
        .unwrap();

        assert_eq!(args.cache_dir, Some(PathBuf::from("/cache")));
        let Some(Command::Create(policy)) = args.command else {
            panic!("expected create");
        };
        let request = PolicyRequest::from(policy);
        assert!(!request.include);
        assert_eq!(request.size.as_deref(), Some("-1"));
        assert_eq!(request.delete_wait.as_deref(), Some("1d"));
        assert!(request.space.is_none());
    }

    #[test]
    fn test_flush_requires_regex() {
        let err = Args::try_parse_from(["cachectl", "flush"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let args = Args::try_parse_from(["cachectl", "show", "--verbose", "-r", "dtd"]).unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Some(Command::Show { regex: Some(r) }) if r == "dtd"));
    }

    #[test]
    fn test_missing_cache_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let (args, command) = parse(&[
            "cachectl",
            "--cache-dir",
            missing.to_str().unwrap(),
            "inspect",
        ]);

        let err = run(&args, &Config::default(), command).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::StorageInit(Some(path))) if *path == missing
        ));
        assert_eq!(
            error_message(&err),
            format!(
                "Failed to initialize cache: {}\nRun 'cachectl --help' for usage\n",
                missing.display()
            )
        );
    }

    #[test]
    fn test_corrupt_policy_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cache.toml"), "[[policy]\n").unwrap();
        let (args, command) = parse(&[
            "cachectl",
            "--cache-dir",
            dir.path().to_str().unwrap(),
            "inspect",
        ]);

        let err = run(&args, &Config::default(), command).unwrap_err();
        let core = err.downcast_ref::<CoreError>().unwrap();
        assert!(matches!(
            core,
            CoreError::Storage(StorageError::PolicyFile { .. })
        ));
        assert!(!core.is_parameter_error());

        let message = error_message(&err);
        assert!(message.starts_with("Error: Storage error: Failed to parse policy file"));
        assert!(!message.contains("--help"));
    }

    #[test]
    fn test_parameter_errors_get_usage_hint() {
        let err = anyhow::Error::from(CoreError::DuplicatePolicy("example".to_string()));
        assert_eq!(
            error_message(&err),
            "Cannot create 'example', it already exists\nRun 'cachectl --help' for usage\n"
        );
    }

    #[test]
    fn test_invalid_cache_state_is_fatal() {
        let core = CoreError::InvalidCacheState("http://example.com/a.dtd".to_string());
        assert!(!core.is_parameter_error());

        let message = error_message(&anyhow::Error::from(core));
        assert_eq!(
            message,
            "Error: Cache is invalid: no caching policy matches http://example.com/a.dtd\n"
        );
    }
}
