/*!
 * Lotus Launcher - Main Entry Point
 *
 * Runs a Lotus application from its manifest:
 * - Locates and parses the application manifest
 * - Executes the entry point with trailing arguments as argv
 * - Drains queued timers before exiting
 */

use clap::Parser;
use lotus_runtime::{init_tracing, launch, HostStreams, LaunchOptions, LoaderConfigBuilder};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lotus", version)]
#[command(about = "Run a Lotus application from its manifest")]
struct Cli {
    /// Log where every import was requested and where it resolved to.
    #[arg(long)]
    print_imports: bool,
    /// Directory holding installed libraries (overrides LOTUS_LIBRARY_ROOT).
    #[arg(long, value_name = "DIR")]
    library_root: Option<PathBuf>,
    /// Print the entry point's export value as JSON after the run.
    #[arg(long)]
    dump_exports: bool,
    /// Application manifest, its directory, or a file beside it.
    #[arg(default_value = ".")]
    manifest: PathBuf,
    /// Arguments passed to the application as Context.argv.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut config = LoaderConfigBuilder::from_env();
    if cli.print_imports {
        config = config.with_print_imports(true);
    }
    if let Some(root) = cli.library_root {
        config = config.with_library_root(root);
    }

    let options = LaunchOptions::new(cli.manifest)
        .with_args(cli.args)
        .with_config(config);

    match launch(options, HostStreams::inherit()) {
        Ok(outcome) => {
            if cli.dump_exports {
                match serde_json::to_string_pretty(&outcome.exports.to_json()) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("could not render exports: {}", e),
                }
            }
            info!(cached = outcome.loader.cache_stats().modules, "Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err.exit_code();
            if !matches!(err, lotus_runtime::LoaderError::Exit { .. }) {
                eprintln!("{:?}", miette::Report::new(err));
            }
            ExitCode::from(status_byte(code))
        }
    }
}

/// Exit status as the host reports it: only the low byte survives
fn status_byte(code: i32) -> u8 {
    code as u8
}
