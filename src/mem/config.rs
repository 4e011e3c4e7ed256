//! the configuration surface of the simulator

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// the scheduling policy of the memory controller, selected at configuration
/// time
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPolicy {
    /// strict first come first serve
    Fcfs,
    /// first ready first come first serve with racetrack and pim support
    FrFcfsRtm,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    // controller
    #[serde(default = "default_controller")]
    pub controller: ControllerPolicy,
    /// cycles a request may be blocked by newer row hits before forced issue
    #[serde(default = "default_starvation_threshold")]
    pub starvation_threshold: u64,
    /// transaction queue capacity
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    // geometry
    pub channels: usize,
    pub ranks: usize,
    pub banks: usize,
    pub subarrays: usize,
    pub rows: u64,
    pub columns: u64,

    // timing, in cycles
    pub t_rcd: u64,
    pub t_ras: u64,
    pub t_rp: u64,
    pub t_cas: u64,
    pub t_burst: u64,
    pub t_rfc: u64,
    /// cycles per single domain shift
    pub t_shift: u64,
    /// iterations of one full cell write
    pub write_iterations: u64,
    /// cycles per write iteration
    pub write_iteration_cycles: u64,
    /// refresh all banks every this many cycles, 0 disables refresh
    #[serde(default)]
    pub refresh_interval: u64,

    // racetrack
    pub domains_per_dbc: u64,
    pub rtm_ports: usize,
    /// ports return to their initial position after every access
    #[serde(default)]
    pub static_port_access: bool,
    /// only move ports when an access actually needs them
    #[serde(default = "default_true")]
    pub lazy_port_update: bool,

    // write pausing policy
    #[serde(default = "default_true")]
    pub write_pausing: bool,
    /// progress fraction below which an interrupted write is cancelled
    /// instead of paused
    #[serde(default)]
    pub pause_threshold: f64,

    // driver
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,
    pub trace_path: PathBuf,
    pub output_path: PathBuf,
}

fn default_controller() -> ControllerPolicy {
    ControllerPolicy::FrFcfsRtm
}
fn default_starvation_threshold() -> u64 {
    4
}
fn default_queue_size() -> usize {
    32
}
fn default_true() -> bool {
    true
}
fn default_max_cycles() -> u64 {
    1_000_000_000
}

impl Config {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .wrap_err_with(|| format!("cannot read config {:?}", path.as_ref()))?;
        toml::from_str(&content).wrap_err("cannot parse config")
    }

    /// a ddr4-like racetrack geometry with pim extensions
    pub fn ddr4_rtm() -> Self {
        Self {
            controller: ControllerPolicy::FrFcfsRtm,
            starvation_threshold: 4,
            queue_size: 32,
            channels: 2,
            ranks: 2,
            banks: 16,
            subarrays: 16,
            rows: 32768,
            columns: 256,
            t_rcd: 14,
            t_ras: 33,
            t_rp: 14,
            t_cas: 14,
            t_burst: 4,
            t_rfc: 350,
            t_shift: 1,
            write_iterations: 8,
            write_iteration_cycles: 4,
            refresh_interval: 0,
            domains_per_dbc: 64,
            rtm_ports: 4,
            static_port_access: false,
            lazy_port_update: true,
            write_pausing: true,
            pause_threshold: 0.0,
            max_cycles: 1_000_000_000,
            trace_path: "traces/example.trace".into(),
            output_path: "output/stats.json".into(),
        }
    }

    /// a tiny geometry that keeps unit tests readable
    pub fn tiny() -> Self {
        Self {
            channels: 1,
            ranks: 1,
            banks: 2,
            subarrays: 2,
            rows: 64,
            columns: 8,
            t_rcd: 2,
            t_ras: 4,
            t_rp: 2,
            t_cas: 2,
            t_burst: 1,
            t_rfc: 8,
            t_shift: 1,
            write_iterations: 10,
            write_iteration_cycles: 1,
            domains_per_dbc: 1,
            rtm_ports: 1,
            ..Self::ddr4_rtm()
        }
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// subarrays per channel, the size of one controller's subarray arena
    pub fn subarrays_per_channel(&self) -> usize {
        self.ranks * self.banks * self.subarrays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_round_trip() {
        let config = Config::tiny();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.queue_size, config.queue_size);
        assert_eq!(parsed.domains_per_dbc, 1);
    }

    #[test]
    fn unknown_keys_are_ignored_and_defaults_apply() {
        let mut text = toml::to_string_pretty(&Config::tiny()).unwrap();
        // strip the optional keys, add an unknown one
        text = text
            .lines()
            .filter(|l| {
                !l.starts_with("starvation_threshold") && !l.starts_with("queue_size")
            })
            .collect::<Vec<_>>()
            .join("\n");
        text.push_str("\nsome_future_knob = 7\n");
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.starvation_threshold, 4);
        assert_eq!(parsed.queue_size, 32);
    }
}
