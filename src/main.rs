/*!
 * Command-line interface for protree
 */

use std::io;
use std::process;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use protree::config::{Args, Command, DecodeConfig, EncodeConfig};
use protree::project::{decode_files, encode_project};
use protree::report::Reporter;

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let reporter = Reporter::new(args.format);

    match args.command {
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "protree", &mut io::stdout());
        }
        Command::Encode(encode_args) => {
            let config = EncodeConfig::from_args(encode_args);
            config.validate()?;

            let progress = if args.quiet {
                ProgressBar::hidden()
            } else {
                let progress = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner()
                    .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos} files ⏱️  {elapsed_precise}")
                {
                    progress.set_style(style);
                }
                progress.enable_steady_tick(std::time::Duration::from_millis(100));
                progress.set_prefix("📊 Encoding");
                progress.set_message(format!(
                    "📂 Scanning directory: {}",
                    config.scan.target_dir.display()
                ));
                progress
            };

            let result = encode_project(&config, Arc::new(progress.clone()));
            progress.finish_and_clear();
            let report = result?;

            if !args.quiet {
                println!("\n{}", reporter.encode_summary(&report)?);
            }
        }
        Command::Decode(decode_args) => {
            let config = DecodeConfig::from_args(decode_args);
            config.validate()?;

            let report = decode_files(&config)?;
            let failed = report.issues.iter().any(|issue| issue.is_failure());

            if !args.quiet {
                println!("\n{}", reporter.decode_summary(&report)?);
            }
            if failed {
                process::exit(1);
            }
        }
    }

    Ok(())
}
