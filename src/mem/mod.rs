//! the memory subsystem model: transaction queues, controller policies, per
//! subarray timing and the trace driven simulator on top of them.

use eyre::{ensure, Result};
use serde::Serialize;
use tracing::{info, warn};

use self::config::Config;
use self::controller::{build_controller, ControllerStats, MemoryController};
use self::request::RequestBuilder;
use self::subarray::SubArrayStats;
use self::trace::Trace;

pub mod config;
pub mod controller;
pub mod endurance;
pub mod queue;
pub mod request;
pub mod subarray;
pub mod trace;

pub trait Component {
    /// the mutable context shared by all components.
    type SimContext;
    fn cycle(&mut self, context: &mut Self::SimContext, current_cycle: u64);
}

/// shared status for all components
#[derive(Debug, Default)]
pub struct SimulationContext {
    request_builder: RequestBuilder,
}

impl SimulationContext {
    pub fn new() -> Self {
        Default::default()
    }
}

/// fold `value` into a running mean without keeping the history around
pub fn running_mean(avg: &mut f64, count: &mut u64, value: f64) {
    *avg = (*avg * *count as f64 + value) / (*count + 1) as f64;
    *count += 1;
}

/// the per channel slice of the final report
#[derive(Debug, Serialize)]
pub struct ChannelReport {
    pub channel: usize,
    pub stats: ControllerStats,
    pub subarrays: Vec<SubArrayStats>,
}

/// everything the simulation run produced, serialized to the output path
#[derive(Debug, Serialize)]
pub struct SimReport {
    pub cycles: u64,
    pub completed_requests: u64,
    pub channels: Vec<ChannelReport>,
}

/// the simulator struct which drives all channels from a request trace.
pub struct Simulator {
    cycle: u64,
}

impl Simulator {
    pub fn new(_config: &Config) -> Self {
        Self { cycle: 0 }
    }

    /// replay the configured trace to completion and collect the statistics
    pub fn run(&mut self, config: &Config) -> Result<SimReport> {
        let trace = Trace::load(&config.trace_path)?;
        validate_trace(config, &trace)?;
        let mut context = SimulationContext::new();
        let mut channels: Vec<Box<dyn MemoryController>> = (0..config.channels)
            .map(|channel| build_controller(channel, config))
            .collect();
        info!(
            channels = channels.len(),
            entries = trace.entries.len(),
            "simulation start"
        );

        let mut next_entry = 0;
        let mut completed_requests = 0u64;
        while next_entry < trace.entries.len() || channels.iter().any(|c| c.pending() > 0) {
            if self.cycle >= config.max_cycles {
                warn!(cycle = self.cycle, "cycle limit reached, stopping early");
                break;
            }
            // admit due trace entries, stalling on backpressure
            while let Some(entry) = trace.entries.get(next_entry) {
                if entry.cycle > self.cycle {
                    break;
                }
                let controller = &mut channels[entry.addr.channel];
                let request = context.request_builder.gen_request(entry.op, entry.addr);
                if !controller.is_issuable(&request) {
                    break;
                }
                controller
                    .issue_command(request, self.cycle)
                    .map_err(|_| eyre::eyre!("admitted request was refused"))?;
                next_entry += 1;
            }
            for controller in channels.iter_mut() {
                controller.cycle(&mut context, self.cycle);
                completed_requests += controller.take_finished().len() as u64;
            }
            self.cycle += 1;
        }
        info!(
            cycles = self.cycle,
            completed_requests, "simulation finished"
        );
        Ok(SimReport {
            cycles: self.cycle,
            completed_requests,
            channels: channels
                .iter()
                .enumerate()
                .map(|(channel, controller)| ChannelReport {
                    channel,
                    stats: controller.stats().clone(),
                    subarrays: controller.subarray_stats(),
                })
                .collect(),
        })
    }
}

/// every trace address must fall inside the configured geometry, a bad entry
/// is a config/trace mismatch and not recoverable
fn validate_trace(config: &Config, trace: &Trace) -> Result<()> {
    for entry in &trace.entries {
        let addr = &entry.addr;
        ensure!(
            addr.channel < config.channels
                && addr.rank < config.ranks
                && addr.bank < config.banks
                && addr.subarray < config.subarrays
                && addr.row < config.rows
                && addr.col < config.columns,
            "trace address {:?} outside the configured geometry",
            addr
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn running_mean_matches_batch_mean() {
        let values = [3.0, 5.0, 7.0, 11.0];
        let mut avg = 0.0;
        let mut count = 0;
        for v in values {
            running_mean(&mut avg, &mut count, v);
        }
        let batch = values.iter().sum::<f64>() / values.len() as f64;
        assert!((avg - batch).abs() < 1e-12);
        assert_eq!(count, 4);
    }

    #[test]
    fn end_to_end_trace_replay() {
        let dir = std::env::temp_dir().join("rtm_pim_test_replay");
        std::fs::create_dir_all(&dir).unwrap();
        let trace_path = dir.join("small.trace");
        let mut file = std::fs::File::create(&trace_path).unwrap();
        writeln!(file, "# tiny smoke trace").unwrap();
        writeln!(file, "0 READ 0 0 0 0 1 0").unwrap();
        writeln!(file, "0 WRITE 0 0 1 0 2 0").unwrap();
        writeln!(file, "5 TRA 0 0 0 1 4 0").unwrap();
        writeln!(file, "9 READ 0 0 0 0 1 3").unwrap();
        drop(file);

        let mut config = Config::tiny();
        config.trace_path = trace_path;
        let report = Simulator::new(&config).run(&config).unwrap();
        assert_eq!(report.completed_requests, 4);
        assert!(report.cycles > 0);
        let stats = &report.channels[0].stats;
        assert_eq!(stats.mem_reads, 2);
        assert_eq!(stats.mem_writes, 1);
        assert_eq!(stats.mem_tras, 1);
        assert_eq!(stats.measured_latencies, 3);
    }

    #[test]
    fn out_of_geometry_trace_is_rejected() {
        let dir = std::env::temp_dir().join("rtm_pim_test_bad_trace");
        std::fs::create_dir_all(&dir).unwrap();
        let trace_path = dir.join("bad.trace");
        std::fs::write(&trace_path, "0 READ 0 0 9 0 1 0\n").unwrap();
        let mut config = Config::tiny();
        config.trace_path = trace_path;
        assert!(Simulator::new(&config).run(&config).is_err());
    }
}
