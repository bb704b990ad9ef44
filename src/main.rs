use clap::Parser;
use site_export_fix::migrate::{self, MigrateError};
use site_export_fix::{config, scan::ScanError};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "site-export-fix")]
#[command(about = "Make a site builder export deployable from a plain file server")]
#[command(long_about = "\
Make a site builder export deployable from a plain file server

The export directory is migrated in place:

  1. Absolute CDN URLs for /js, /css and /images on trusted hosts become
     root-relative (\"https://static.tildacdn.com/js/a.js\" -> \"/js/a.js\").
  2. Every RewriteRule in the export's htaccess manifest is turned into a
     folder: \"RewriteRule /about/ page123.html\" copies page123.html to
     about/index.html and makes its links root-relative.

Run it once on a fresh export. Re-running over a migrated tree is unsupported.

Set RUST_LOG to control log output (default: info).
Run 'site-export-fix --print-config' for a documented config file.")]
#[command(version)]
struct Cli {
    /// Export directory to migrate (exactly one)
    #[arg(value_name = "EXPORT_DIR")]
    paths: Vec<PathBuf>,

    /// TOML config file overriding the defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a stock config file with all options documented
    #[arg(long)]
    print_config: bool,

    /// Log debug details (skipped rules and files)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    init_logging(cli.verbose);

    let Some(root) = export_dir(&cli.paths) else {
        error!("missing export directory path");
        return Ok(());
    };
    let config = config::load_config(cli.config.as_deref())?;

    match migrate::run(root, &config) {
        Ok(_) => Ok(()),
        Err(MigrateError::Scan(e @ (ScanError::NotFound(_) | ScanError::NotADirectory(_)))) => {
            error!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// The export directory, when exactly one was given.
fn export_dir(paths: &[PathBuf]) -> Option<&Path> {
    match paths {
        [path] => Some(path.as_path()),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
