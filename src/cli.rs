//! The command line interface of the simulator.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// the command line interface of the simulator
#[derive(Parser, Debug)]
#[command(author, about, version)]
pub struct Cli {
    /// subcommand
    #[clap(subcommand)]
    pub subcmd: Operation,
}

/// the subcommands of the simulator
#[derive(Debug, Subcommand)]
pub enum Operation {
    /// run the simulator
    Run(RunArgs),
    /// write a preset config file
    GenConfig(GenConfigArgs),
}

/// the arguments of the run subcommand
#[derive(Debug, Args)]
pub struct RunArgs {
    /// the config file path
    pub config: PathBuf,
}

/// the arguments of the gen-config subcommand
#[derive(Debug, Args)]
pub struct GenConfigArgs {
    /// the preset to write
    pub preset: ConfigPreset,
    /// the output path of the config file
    pub output: PathBuf,
}

/// the available config presets
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigPreset {
    /// a ddr4-like racetrack memory with pim extensions
    Ddr4Rtm,
    /// a tiny geometry for quick experiments
    Tiny,
}
