//! a library for simulating racetrack memory with processing in memory
//! extensions
pub mod cli;
pub mod mem;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;

use clap::Parser;
use eyre::Result;
use tracing::{info, metadata::LevelFilter};
use tracing_subscriber::fmt::MakeWriter;

use cli::{Cli, ConfigPreset, GenConfigArgs, RunArgs};
use mem::config::Config;
pub use mem::Simulator;

#[allow(dead_code)]
pub fn init_logger_info() {
    init_logger_with_ansi(LevelFilter::INFO, io::stderr, true);
}

#[allow(dead_code)]
pub fn init_logger_debug() {
    init_logger_with_ansi(LevelFilter::DEBUG, io::stderr, true);
}

#[allow(dead_code)]
pub fn init_logger_with_ansi(
    filter: LevelFilter,
    writter: impl for<'writer> MakeWriter<'writer> + 'static + Send + Sync,
    ansi: bool,
) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(filter.into())
                .from_env_lossy(),
        )
        .with_writer(writter)
        .with_ansi(ansi)
        .try_init()
        .unwrap_or_else(|e| {
            eprintln!("failed to init logger: {}", e);
        });
}

#[allow(dead_code)]
pub fn init_logger(
    filter: LevelFilter,
    writter: impl for<'writer> MakeWriter<'writer> + 'static + Send + Sync,
) {
    init_logger_with_ansi(filter, writter, false);
}

#[allow(dead_code)]
pub fn init_logger_stderr(filter: LevelFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(filter.into())
                .from_env_lossy(),
        )
        .with_ansi(true)
        .try_init()
        .unwrap_or_else(|e| {
            eprintln!("failed to init logger: {}", e);
        });
}

/// the main function of the simulator
pub fn main_inner<A, T>(args: A) -> Result<()>
where
    A: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.subcmd {
        cli::Operation::Run(RunArgs { config }) => {
            println!("run with config: {:?}", config);
            let config = Config::new(config)?;
            let output_dir = match config.output_path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            fs::create_dir_all(output_dir)?;
            let file_appender = tracing_appender::rolling::hourly(output_dir, "rtm_pim.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
            init_logger(LevelFilter::INFO, non_blocking);

            let current_time = std::time::Instant::now();
            info!("building simulator");
            let mut simulator = Simulator::new(&config);
            info!("start running simulator");
            let report = simulator.run(&config)?;

            serde_json::to_writer_pretty(
                BufWriter::new(File::create(&config.output_path)?),
                &report,
            )?;
            println!("the result is written to {:?}", config.output_path);
            println!(
                "time elapsed: {}",
                humantime::format_duration(current_time.elapsed())
            );
        }

        cli::Operation::GenConfig(GenConfigArgs { preset, output }) => {
            init_logger_stderr(LevelFilter::INFO);
            let config = match preset {
                ConfigPreset::Ddr4Rtm => Config::ddr4_rtm(),
                ConfigPreset::Tiny => Config::tiny(),
            };
            config.save_to_file(&output)?;
            println!("config written to {:?}", output);
        }
    }
    Ok(())
}
