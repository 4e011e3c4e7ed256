//! memory controller policies.
//!
//! every policy implements the same capability surface: admission, enqueue,
//! completion and a once-per-cycle scheduling step. the concrete strategy is
//! chosen at configuration time.

use std::collections::VecDeque;

use serde::Serialize;

use super::config::{Config, ControllerPolicy};
use super::request::{MemAddr, OpKind, Request};
use super::running_mean;
use super::subarray::{Cmd, SubArray, SubArrayState, SubArrayStats};
use super::{Component, SimulationContext};

pub mod fcfs;
pub mod fr_fcfs;

/// the capability surface of a controller policy
pub trait MemoryController: Component<SimContext = SimulationContext> {
    /// the admission gate: false once the transaction queue is at capacity,
    /// the sole backpressure mechanism
    fn is_issuable(&self, request: &Request) -> bool;
    /// enqueue a request, handing it back untouched when not admissible
    fn issue_command(&mut self, request: Request, cycle: u64) -> Result<(), Request>;
    /// completion callback from the command execution layer
    fn request_complete(&mut self, request: Request, cycle: u64) -> bool;
    /// queued plus in flight requests, zero when fully drained
    fn pending(&self) -> usize;
    fn stats(&self) -> &ControllerStats;
    fn subarray_stats(&self) -> Vec<SubArrayStats>;
    /// completed requests observed since the last call
    fn take_finished(&mut self) -> Vec<Request>;
}

/// build the configured policy for one channel
pub fn build_controller(channel: usize, config: &Config) -> Box<dyn MemoryController> {
    match config.controller {
        ControllerPolicy::Fcfs => Box::new(fcfs::Fcfs::new(channel, config)),
        ControllerPolicy::FrFcfsRtm => Box::new(fr_fcfs::FrFcfsRtm::new(channel, config)),
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ControllerStats {
    pub mem_reads: u64,
    pub mem_writes: u64,
    pub mem_tras: u64,
    pub mem_dras: u64,
    pub mem_oas: u64,
    pub mem_sras: u64,
    pub mem_odras: u64,
    pub mem_otras: u64,
    pub rb_hits: u64,
    pub rb_miss: u64,
    pub starvation_precharges: u64,
    pub write_pauses: u64,
    pub average_latency: f64,
    pub measured_latencies: u64,
    pub average_queue_latency: f64,
    pub measured_queue_latencies: u64,
    pub average_total_latency: f64,
    pub measured_total_latencies: u64,
}

impl ControllerStats {
    pub(crate) fn count_admission(&mut self, op: OpKind) {
        match op {
            OpKind::Read | OpKind::ReadPrecharge => self.mem_reads += 1,
            OpKind::Write | OpKind::WritePrecharge => self.mem_writes += 1,
            OpKind::Tra => self.mem_tras += 1,
            OpKind::Dra => self.mem_dras += 1,
            OpKind::Oa => self.mem_oas += 1,
            OpKind::Sra => self.mem_sras += 1,
            OpKind::Odra => self.mem_odras += 1,
            OpKind::Otra => self.mem_otras += 1,
        }
    }

    /// fold one completed read/write into the three running latency means
    pub(crate) fn record_completion(&mut self, request: &Request) {
        running_mean(
            &mut self.average_latency,
            &mut self.measured_latencies,
            (request.completion_cycle - request.issue_cycle) as f64,
        );
        running_mean(
            &mut self.average_queue_latency,
            &mut self.measured_queue_latencies,
            (request.issue_cycle - request.arrival_cycle) as f64,
        );
        running_mean(
            &mut self.average_total_latency,
            &mut self.measured_total_latencies,
            (request.completion_cycle - request.arrival_cycle) as f64,
        );
    }
}

/// one bank's pending physical command sequence and the request it belongs to
#[derive(Debug, Default)]
pub(crate) struct CommandQueue {
    pub(crate) cmds: VecDeque<Cmd>,
    /// completion cycle of the command currently on the device
    pub(crate) active_done: Option<u64>,
    pub(crate) request: Option<Request>,
}

impl CommandQueue {
    /// a multi cycle command sequence for one request must finish before the
    /// bank accepts a new one
    pub(crate) fn busy(&self) -> bool {
        self.request.is_some() || self.active_done.is_some() || !self.cmds.is_empty()
    }
}

/// the flat subarray arena index of an address within one channel
pub(crate) fn flat_index(config_banks: usize, config_subarrays: usize, addr: &MemAddr) -> usize {
    (addr.rank * config_banks + addr.bank) * config_subarrays + addr.subarray
}

/// the racetrack decode of an address: one dbc per bit cell channel, the
/// domain selected by the row
pub(crate) fn decode_domain(domains_per_dbc: u64, addr: &MemAddr) -> (u64, u64) {
    (addr.col, addr.row % domains_per_dbc.max(1))
}

/// expand a conventional read/write into its physical command sequence
pub(crate) fn expand_mem(sa: &SubArray, request: &Request, domains_per_dbc: u64) -> VecDeque<Cmd> {
    let row = request.addr.row;
    let mut cmds = VecDeque::new();
    match sa.state() {
        SubArrayState::Open if sa.open_row() == Some(row) => {}
        SubArrayState::Open => {
            cmds.push_back(Cmd::Precharge);
            cmds.push_back(Cmd::Activate { row });
        }
        _ => cmds.push_back(Cmd::Activate { row }),
    }
    let (dbc, domain) = decode_domain(domains_per_dbc, &request.addr);
    if sa.shift_distance(dbc, domain) > 0 {
        cmds.push_back(Cmd::Shift { dbc, domain });
    }
    match request.op {
        OpKind::Read | OpKind::ReadPrecharge => cmds.push_back(Cmd::Read { row }),
        OpKind::Write | OpKind::WritePrecharge => cmds.push_back(Cmd::Write { row }),
        _ => unreachable!("pim kinds use the pim path"),
    }
    if matches!(request.op, OpKind::ReadPrecharge | OpKind::WritePrecharge) {
        cmds.push_back(Cmd::Precharge);
    }
    cmds
}

/// expand a pim operation into its activation sequence.
///
/// the multi row kinds need a closed bank; the overlapped kinds activate on
/// top of an open row and latch their result with a local write.
pub(crate) fn expand_pim(sa: &SubArray, request: &Request) -> VecDeque<Cmd> {
    let base_row = request.addr.row;
    let mut cmds = VecDeque::new();
    match request.op {
        OpKind::Tra | OpKind::Dra | OpKind::Sra => {
            let rows = match request.op {
                OpKind::Tra => 3,
                OpKind::Dra => 2,
                _ => 1,
            };
            if sa.state() == SubArrayState::Open {
                cmds.push_back(Cmd::Precharge);
            }
            cmds.push_back(Cmd::MultiRowActivate { base_row, rows });
        }
        OpKind::Oa | OpKind::Odra | OpKind::Otra => {
            let rows = match request.op {
                OpKind::Otra => 3,
                OpKind::Odra => 2,
                _ => 1,
            };
            if sa.state() != SubArrayState::Open {
                cmds.push_back(Cmd::Activate { row: base_row });
            }
            cmds.push_back(Cmd::OverlappedActivate { base_row, rows });
            cmds.push_back(Cmd::LocalWrite { row: base_row });
        }
        _ => unreachable!("conventional kinds use the memory path"),
    }
    cmds
}

/// issue at most one pending command per bank; bank level execution proceeds
/// independently of the top level cascade
pub(crate) fn drain_command_queues(
    subarrays: &mut [SubArray],
    cmd_queues: &mut [CommandQueue],
    cycle: u64,
) {
    for (flat, cq) in cmd_queues.iter_mut().enumerate() {
        if cq.active_done.is_some() {
            continue;
        }
        let Some(cmd) = cq.cmds.front().copied() else {
            continue;
        };
        let sa = &mut subarrays[flat];
        if !sa.is_issuable(&cmd, cycle) {
            continue;
        }
        cq.cmds.pop_front();
        let done = sa.issue(cq.request.as_mut(), &cmd, cycle);
        if cmd.as_write().is_some() {
            // the planned segment is credited up front, a pause takes the
            // unfinished part back
            if let Some(request) = cq.request.as_mut() {
                request.useful_write_cycles += done - cycle;
            }
        }
        cq.active_done = Some(done);
    }
}

/// retire finished device commands and collect requests whose whole command
/// sequence has drained
pub(crate) fn collect_completions(cmd_queues: &mut [CommandQueue], cycle: u64) -> Vec<Request> {
    let mut done = Vec::new();
    for cq in cmd_queues.iter_mut() {
        if let Some(active) = cq.active_done {
            if active <= cycle {
                cq.active_done = None;
            }
        }
        if cq.cmds.is_empty() && cq.active_done.is_none() {
            if let Some(request) = cq.request.take() {
                done.push(request);
            }
        }
    }
    done
}
