//! the per bank timing state machine.
//!
//! a subarray is the smallest independently timed storage unit: it owns the
//! row buffer state, the next-legal cycle for every command class, the write
//! in progress bookkeeping and the racetrack access ports. the controller
//! gates every command through [`SubArray::is_issuable`] before issuing it;
//! issuing an illegal command is a caller contract violation.

use std::collections::BTreeSet;

use derive_more::Display;
use enum_as_inner::EnumAsInner;
use hashbrown::HashMap;
use serde::Serialize;
use tracing::trace;

use super::config::Config;
use super::endurance::{count_transitions, EnduranceModel, RowWear};
use super::request::Request;
use super::running_mean;

/// no power down state: power down is managed per bank, not per subarray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SubArrayState {
    Unknown,
    Open,
    Closed,
    Precharging,
    Refreshing,
}

/// one physical device command
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumAsInner)]
pub enum Cmd {
    Activate { row: u64 },
    Read { row: u64 },
    Write { row: u64 },
    /// in subarray result write back used by the pim paths
    LocalWrite { row: u64 },
    Precharge,
    Refresh,
    /// align the closest access port of `dbc` with `domain`
    Shift { dbc: u64, domain: u64 },
    /// simultaneous activation of `rows` rows starting at `base_row`
    MultiRowActivate { base_row: u64, rows: u64 },
    /// activation overlapped with an already open row
    OverlappedActivate { base_row: u64, rows: u64 },
}

/// whether an interrupted write keeps its progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Paused,
    Cancelled,
}

/// the result handed back to the controller when a write is interrupted
#[derive(Debug, Clone, Copy)]
pub struct PauseResult {
    pub outcome: PauseOutcome,
    /// write cycles the controller must take back from the request's credit
    pub uncredited: u64,
}

#[derive(Debug, Clone, Copy)]
struct TimingSnapshot {
    next_activate: u64,
    next_precharge: u64,
    next_read: u64,
    next_write: u64,
}

#[derive(Debug)]
struct WriteInProgress {
    request_id: u64,
    /// start of the current segment
    start: u64,
    end: u64,
    /// iterations finished before this segment
    completed_at_start: u64,
    total_iterations: u64,
    /// every cycle a segment of this write started, the first entry is the
    /// original start, the rest are resumption points
    iteration_starts: BTreeSet<u64>,
    pauses: u64,
    pre: TimingSnapshot,
}

/// progress retained across a pause, keyed by request id
#[derive(Debug)]
struct PausedWrite {
    completed_iterations: u64,
    iteration_starts: BTreeSet<u64>,
    pauses: u64,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SubArrayStats {
    pub reads: u64,
    pub writes: u64,
    pub activates: u64,
    pub precharges: u64,
    pub refreshes: u64,
    pub local_writes: u64,
    pub single_row_activates: u64,
    pub double_row_activates: u64,
    pub triple_row_activates: u64,
    pub overlapped_activates: u64,
    pub overlapped_double_row_activates: u64,
    pub overlapped_triple_row_activates: u64,
    pub shift_commands: u64,
    pub total_shifts: u64,
    pub paused_writes: u64,
    pub cancelled_writes: u64,
    pub cancelled_write_time: u64,
    pub write_resumptions: u64,
    pub num_00_writes: u64,
    pub num_01_writes: u64,
    pub num_10_writes: u64,
    pub num_11_writes: u64,
    pub worst_case_write: u64,
    pub average_write_time: f64,
    pub measured_write_times: u64,
    pub average_pauses_per_request: f64,
    pub measured_pauses: u64,
    pub average_paused_progress: f64,
    pub measured_progresses: u64,
    pub worst_case_endurance: u64,
}

pub struct SubArray {
    id: usize,
    state: SubArrayState,
    open_row: Option<u64>,
    next_activate: u64,
    next_precharge: u64,
    next_read: u64,
    next_write: u64,
    /// cycle the current transient state (precharging/refreshing) retires
    state_end: u64,

    t_rcd: u64,
    t_ras: u64,
    t_rp: u64,
    t_cas: u64,
    t_burst: u64,
    t_rfc: u64,
    t_shift: u64,
    write_iterations: u64,
    write_iteration_cycles: u64,
    pause_threshold: f64,

    write: Option<WriteInProgress>,
    paused_writes: HashMap<u64, PausedWrite>,

    /// access port positions per dbc, one dbc per bit cell channel
    port_pos: Vec<Vec<i64>>,
    static_port_access: bool,
    lazy_port_update: bool,

    stats: SubArrayStats,
    endurance: Box<dyn EnduranceModel>,
}

impl SubArray {
    pub fn new(id: usize, config: &Config) -> Self {
        let ports = config.rtm_ports.max(1);
        let domains = config.domains_per_dbc.max(1);
        // ports spread evenly over the track, at segment midpoints
        let init: Vec<i64> = (0..ports)
            .map(|p| ((2 * p as u64 + 1) * domains / (2 * ports as u64)) as i64)
            .collect();
        Self {
            id,
            state: SubArrayState::Closed,
            open_row: None,
            next_activate: 0,
            next_precharge: 0,
            next_read: 0,
            next_write: 0,
            state_end: 0,
            t_rcd: config.t_rcd,
            t_ras: config.t_ras,
            t_rp: config.t_rp,
            t_cas: config.t_cas,
            t_burst: config.t_burst,
            t_rfc: config.t_rfc,
            t_shift: config.t_shift,
            write_iterations: config.write_iterations.max(1),
            write_iteration_cycles: config.write_iteration_cycles.max(1),
            pause_threshold: config.pause_threshold,
            write: None,
            paused_writes: HashMap::new(),
            port_pos: vec![init; config.columns as usize],
            static_port_access: config.static_port_access,
            lazy_port_update: config.lazy_port_update,
            stats: SubArrayStats::default(),
            endurance: Box::new(RowWear::default()),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> SubArrayState {
        self.state
    }

    pub fn open_row(&self) -> Option<u64> {
        self.open_row
    }

    pub fn is_writing(&self) -> bool {
        self.write.is_some()
    }

    pub fn stats(&self) -> &SubArrayStats {
        &self.stats
    }

    pub fn next_activate(&self) -> u64 {
        self.next_activate
    }

    pub fn next_precharge(&self) -> u64 {
        self.next_precharge
    }

    pub fn next_read(&self) -> u64 {
        self.next_read
    }

    pub fn next_write(&self) -> u64 {
        self.next_write
    }

    /// resumption points of the write currently in progress
    pub fn current_write_resumptions(&self) -> u64 {
        self.write
            .as_ref()
            .map(|w| w.iteration_starts.len() as u64 - 1)
            .unwrap_or(0)
    }

    /// retire transient states and finished writes whose end has passed.
    ///
    /// the lazy equivalent of completion events: called once per cycle by
    /// the controller before any scheduling decision.
    pub fn tick(&mut self, cycle: u64) {
        match self.state {
            SubArrayState::Precharging | SubArrayState::Refreshing if self.state_end <= cycle => {
                self.state = SubArrayState::Closed;
            }
            _ => {}
        }
        if let Some(w) = &self.write {
            if w.end <= cycle {
                let total_time = w.total_iterations * self.write_iteration_cycles;
                running_mean(
                    &mut self.stats.average_write_time,
                    &mut self.stats.measured_write_times,
                    total_time as f64,
                );
                running_mean(
                    &mut self.stats.average_pauses_per_request,
                    &mut self.stats.measured_pauses,
                    w.pauses as f64,
                );
                trace!(subarray = self.id, request = w.request_id, "write finished");
                self.write = None;
            }
        }
    }

    /// the timing and state legality gate, callers must pass it before
    /// [`SubArray::issue`]
    pub fn is_issuable(&self, cmd: &Cmd, cycle: u64) -> bool {
        match *cmd {
            Cmd::Activate { .. } | Cmd::MultiRowActivate { .. } => {
                self.state == SubArrayState::Closed && cycle >= self.next_activate
            }
            Cmd::OverlappedActivate { .. } => {
                self.state == SubArrayState::Open
                    && !self.is_writing()
                    && cycle >= self.next_activate
            }
            Cmd::Read { row } => {
                self.state == SubArrayState::Open
                    && self.open_row == Some(row)
                    && !self.is_writing()
                    && cycle >= self.next_read
            }
            Cmd::Write { row } => {
                self.state == SubArrayState::Open
                    && self.open_row == Some(row)
                    && !self.is_writing()
                    && cycle >= self.next_write
            }
            Cmd::LocalWrite { .. } => {
                self.state == SubArrayState::Open && !self.is_writing() && cycle >= self.next_write
            }
            Cmd::Precharge => {
                self.state == SubArrayState::Open
                    && !self.is_writing()
                    && cycle >= self.next_precharge
            }
            Cmd::Refresh => {
                matches!(self.state, SubArrayState::Open | SubArrayState::Closed)
                    && !self.is_writing()
                    && cycle >= self.next_activate
            }
            Cmd::Shift { .. } => {
                self.state == SubArrayState::Open && !self.is_writing() && cycle >= self.next_read
            }
        }
    }

    /// issue one command, returns the cycle it completes.
    ///
    /// `request` is required for writes, which carry the data and the
    /// pause/resume identity.
    pub fn issue(&mut self, request: Option<&mut Request>, cmd: &Cmd, cycle: u64) -> u64 {
        debug_assert!(self.is_issuable(cmd, cycle), "illegal command {:?}", cmd);
        match *cmd {
            Cmd::Activate { row } => self.activate(row, cycle),
            Cmd::Read { row } => self.read(row, cycle),
            Cmd::Write { row } => {
                let request = request.expect("a write command needs its request");
                self.write(request, row, cycle)
            }
            Cmd::LocalWrite { row } => self.local_write(row, cycle),
            Cmd::Precharge => self.precharge(cycle),
            Cmd::Refresh => self.refresh(cycle),
            Cmd::Shift { dbc, domain } => self.shift(dbc, domain, cycle),
            Cmd::MultiRowActivate { base_row, rows } => {
                self.multi_row_activate(base_row, rows, cycle)
            }
            Cmd::OverlappedActivate { base_row, rows } => {
                self.overlapped_activate(base_row, rows, cycle)
            }
        }
    }

    fn open(&mut self, row: u64, cycle: u64) -> u64 {
        self.state = SubArrayState::Open;
        self.open_row = Some(row);
        self.next_read = self.next_read.max(cycle + self.t_rcd);
        self.next_write = self.next_write.max(cycle + self.t_rcd);
        self.next_precharge = self.next_precharge.max(cycle + self.t_ras);
        self.next_activate = self.next_activate.max(cycle + self.t_ras + self.t_rp);
        cycle + self.t_rcd
    }

    fn activate(&mut self, row: u64, cycle: u64) -> u64 {
        self.stats.activates += 1;
        self.open(row, cycle)
    }

    fn multi_row_activate(&mut self, base_row: u64, rows: u64, cycle: u64) -> u64 {
        match rows {
            1 => self.stats.single_row_activates += 1,
            2 => self.stats.double_row_activates += 1,
            _ => self.stats.triple_row_activates += 1,
        }
        self.open(base_row, cycle)
    }

    fn overlapped_activate(&mut self, base_row: u64, rows: u64, cycle: u64) -> u64 {
        match rows {
            1 => self.stats.overlapped_activates += 1,
            2 => self.stats.overlapped_double_row_activates += 1,
            _ => self.stats.overlapped_triple_row_activates += 1,
        }
        self.open(base_row, cycle)
    }

    fn read(&mut self, _row: u64, cycle: u64) -> u64 {
        let done = cycle + self.t_cas + self.t_burst;
        self.next_read = self.next_read.max(cycle + self.t_burst);
        self.next_write = self.next_write.max(done);
        self.next_precharge = self.next_precharge.max(done);
        self.stats.reads += 1;
        done
    }

    fn write(&mut self, request: &mut Request, _row: u64, cycle: u64) -> u64 {
        let resumed = self.paused_writes.remove(&request.id);
        let fresh = resumed.is_none();
        let (completed, mut iteration_starts, pauses) = match resumed {
            Some(p) => {
                self.stats.write_resumptions += 1;
                (p.completed_iterations, p.iteration_starts, p.pauses)
            }
            None => (0, BTreeSet::new(), 0),
        };
        iteration_starts.insert(cycle);
        let remaining = self.write_iterations.saturating_sub(completed);
        let end = cycle + remaining * self.write_iteration_cycles;

        if fresh {
            if let Some(data) = request.data.as_ref() {
                let counts = count_transitions(data);
                self.stats.num_00_writes += counts.zero_to_zero;
                self.stats.num_01_writes += counts.zero_to_one;
                self.stats.num_10_writes += counts.one_to_zero;
                self.stats.num_11_writes += counts.one_to_one;
                let wear = self.endurance.update(&request.addr, data);
                self.stats.worst_case_endurance = self.stats.worst_case_endurance.max(wear);
            }
            self.stats.worst_case_write = self.stats.worst_case_write.max(end - cycle);
        }

        let pre = TimingSnapshot {
            next_activate: self.next_activate,
            next_precharge: self.next_precharge,
            next_read: self.next_read,
            next_write: self.next_write,
        };
        // the bank is busy until the write drains
        self.next_read = self.next_read.max(end);
        self.next_write = self.next_write.max(end);
        self.next_precharge = self.next_precharge.max(end);

        self.write = Some(WriteInProgress {
            request_id: request.id,
            start: cycle,
            end,
            completed_at_start: completed,
            total_iterations: self.write_iterations,
            iteration_starts,
            pauses,
            pre,
        });
        request.paused = false;
        request.cancelled = false;
        self.stats.writes += 1;
        end
    }

    fn local_write(&mut self, _row: u64, cycle: u64) -> u64 {
        let done = cycle + self.write_iteration_cycles;
        self.next_read = self.next_read.max(done);
        self.next_write = self.next_write.max(done);
        self.stats.local_writes += 1;
        done
    }

    fn precharge(&mut self, cycle: u64) -> u64 {
        self.state = SubArrayState::Precharging;
        self.open_row = None;
        self.state_end = cycle + self.t_rp;
        self.next_activate = self.next_activate.max(cycle + self.t_rp);
        self.stats.precharges += 1;
        self.state_end
    }

    fn refresh(&mut self, cycle: u64) -> u64 {
        self.state = SubArrayState::Refreshing;
        self.open_row = None;
        self.state_end = cycle + self.t_rfc;
        self.next_activate = self.next_activate.max(cycle + self.t_rfc);
        self.stats.refreshes += 1;
        self.state_end
    }

    fn shift(&mut self, dbc: u64, domain: u64, cycle: u64) -> u64 {
        let port = self.find_closest_port(dbc, domain);
        let pos = &mut self.port_pos[dbc as usize][port];
        let distance = (*pos - domain as i64).unsigned_abs();
        if self.static_port_access || !self.lazy_port_update {
            // the track (or the port) shifts back after the access
            self.stats.total_shifts += distance;
        } else {
            *pos = domain as i64;
        }
        self.stats.shift_commands += 1;
        self.stats.total_shifts += distance;
        let done = cycle + distance * self.t_shift;
        self.next_read = self.next_read.max(done);
        self.next_write = self.next_write.max(done);
        done
    }

    /// the access port of `dbc` closest to `domain`, ties break to the
    /// lowest port index
    pub fn find_closest_port(&self, dbc: u64, domain: u64) -> usize {
        self.port_pos[dbc as usize]
            .iter()
            .enumerate()
            .min_by_key(|(index, pos)| ((**pos - domain as i64).unsigned_abs(), *index))
            .map(|(index, _)| index)
            .expect("subarray has no access ports")
    }

    /// shift distance an access to (`dbc`, `domain`) would take right now
    pub fn shift_distance(&self, dbc: u64, domain: u64) -> u64 {
        let port = self.find_closest_port(dbc, domain);
        (self.port_pos[dbc as usize][port] - domain as i64).unsigned_abs()
    }

    /// true on an iteration boundary of the write in progress, the only
    /// points a write may be interrupted
    pub fn between_write_iterations(&self, cycle: u64) -> bool {
        match &self.write {
            Some(w) => {
                cycle > w.start
                    && cycle < w.end
                    && (cycle - w.start) % self.write_iteration_cycles == 0
            }
            None => false,
        }
    }

    /// interrupt the write in progress for a higher priority read.
    ///
    /// progress up to the last finished iteration is recorded; whether the
    /// write resumes from there or restarts is decided by the configured
    /// progress threshold. the pre write timing snapshot is restored so the
    /// read can proceed immediately.
    pub fn pause_write(&mut self, cycle: u64) -> PauseResult {
        let w = self.write.take().expect("no write in progress to pause");
        let elapsed = cycle - w.start;
        let completed = w.completed_at_start + elapsed / self.write_iteration_cycles;
        let progress = completed as f64 / w.total_iterations as f64;
        running_mean(
            &mut self.stats.average_paused_progress,
            &mut self.stats.measured_progresses,
            progress,
        );

        self.next_activate = w.pre.next_activate;
        self.next_precharge = w.pre.next_precharge;
        self.next_read = w.pre.next_read;
        self.next_write = w.pre.next_write;

        let cancelled = progress < self.pause_threshold;
        let result = if cancelled {
            self.stats.cancelled_writes += 1;
            self.stats.cancelled_write_time += elapsed;
            PauseResult {
                outcome: PauseOutcome::Cancelled,
                // the whole segment is taken back, the progress is lost
                uncredited: w.end - w.start,
            }
        } else {
            self.stats.paused_writes += 1;
            PauseResult {
                outcome: PauseOutcome::Paused,
                uncredited: w.end - cycle,
            }
        };
        self.paused_writes.insert(
            w.request_id,
            PausedWrite {
                completed_iterations: if cancelled { 0 } else { completed },
                iteration_starts: w.iteration_starts,
                pauses: w.pauses + 1,
            },
        );
        trace!(
            subarray = self.id,
            request = w.request_id,
            progress,
            cancelled,
            "write interrupted"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::request::{MemAddr, OpKind, RequestBuilder, WriteData};

    fn subarray() -> SubArray {
        SubArray::new(0, &Config::tiny())
    }

    #[test]
    fn activate_then_read_legality() {
        let mut sa = subarray();
        let read = Cmd::Read { row: 3 };
        assert!(!sa.is_issuable(&read, 0));
        let act = Cmd::Activate { row: 3 };
        assert!(sa.is_issuable(&act, 0));
        let done = sa.issue(None, &act, 0);
        assert_eq!(sa.state(), SubArrayState::Open);
        assert_eq!(sa.open_row(), Some(3));
        // t_rcd not elapsed yet
        assert!(!sa.is_issuable(&read, 1));
        assert!(sa.is_issuable(&read, done));
        // wrong row is never a hit
        assert!(!sa.is_issuable(&Cmd::Read { row: 4 }, done));
    }

    #[test]
    fn precharge_closes_after_t_rp() {
        let mut sa = subarray();
        sa.issue(None, &Cmd::Activate { row: 1 }, 0);
        let cycle = sa.next_precharge();
        let done = sa.issue(None, &Cmd::Precharge, cycle);
        assert_eq!(sa.state(), SubArrayState::Precharging);
        sa.tick(done - 1);
        assert_eq!(sa.state(), SubArrayState::Precharging);
        sa.tick(done);
        assert_eq!(sa.state(), SubArrayState::Closed);
        assert_eq!(sa.open_row(), None);
    }

    #[test]
    fn refresh_needs_idle_subarray() {
        let mut sa = subarray();
        assert!(sa.is_issuable(&Cmd::Refresh, 0));
        let done = sa.issue(None, &Cmd::Refresh, 0);
        assert_eq!(sa.state(), SubArrayState::Refreshing);
        sa.tick(done);
        assert_eq!(sa.state(), SubArrayState::Closed);
        assert_eq!(sa.stats().refreshes, 1);
    }

    #[test]
    fn next_legal_cycles_are_monotone() {
        let mut sa = subarray();
        let mut last = (0, 0, 0, 0);
        let mut cycle = 0;
        for _ in 0..4 {
            cycle = cycle.max(sa.next_activate());
            cycle = sa.issue(None, &Cmd::Activate { row: 1 }, cycle);
            cycle = cycle.max(sa.next_precharge());
            sa.issue(None, &Cmd::Precharge, cycle);
            sa.tick(cycle + 100);
            cycle += 100;
            let now = (
                sa.next_activate(),
                sa.next_precharge(),
                sa.next_read(),
                sa.next_write(),
            );
            assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2 && now.3 >= last.3);
            last = now;
        }
    }

    #[test]
    fn write_pause_resume_keeps_progress() {
        // ten iterations of one cycle each, paused after four
        let mut sa = subarray();
        let mut builder = RequestBuilder::new();
        let mut req = builder.gen_write(
            MemAddr {
                row: 2,
                ..Default::default()
            },
            WriteData {
                old: vec![0],
                new: vec![0xffff_ffff],
            },
        );
        sa.issue(None, &Cmd::Activate { row: 2 }, 0);
        let start = sa.next_write();
        let end = sa.issue(Some(&mut req), &Cmd::Write { row: 2 }, start);
        assert_eq!(end - start, 10);
        assert!(sa.is_writing());

        let pause_at = start + 4;
        assert!(sa.between_write_iterations(pause_at));
        let result = sa.pause_write(pause_at);
        assert_eq!(result.outcome, PauseOutcome::Paused);
        assert_eq!(result.uncredited, 6);
        assert!(!sa.is_writing());

        // resumes with six iterations left
        let resume_at = pause_at + 20;
        let end = sa.issue(Some(&mut req), &Cmd::Write { row: 2 }, resume_at);
        assert_eq!(end - resume_at, 6);
        assert_eq!(sa.current_write_resumptions(), 1);
        assert_eq!(sa.stats().paused_writes, 1);
        assert_eq!(sa.stats().write_resumptions, 1);
        sa.tick(end);
        assert!(!sa.is_writing());
        assert_eq!(sa.stats().measured_write_times, 1);
    }

    #[test]
    fn early_interrupt_cancels_below_threshold() {
        let mut config = Config::tiny();
        config.pause_threshold = 0.5;
        let mut sa = SubArray::new(0, &config);
        let mut builder = RequestBuilder::new();
        let mut req = builder.gen_request(
            OpKind::Write,
            MemAddr {
                row: 1,
                ..Default::default()
            },
        );
        sa.issue(None, &Cmd::Activate { row: 1 }, 0);
        let start = sa.next_write();
        sa.issue(Some(&mut req), &Cmd::Write { row: 1 }, start);
        // 3 of 10 iterations is below the 0.5 threshold
        let result = sa.pause_write(start + 3);
        assert_eq!(result.outcome, PauseOutcome::Cancelled);
        assert_eq!(result.uncredited, 10);
        assert_eq!(sa.stats().cancelled_writes, 1);
        assert_eq!(sa.stats().cancelled_write_time, 3);
        // the restarted write runs all ten iterations again
        let end = sa.issue(Some(&mut req), &Cmd::Write { row: 1 }, start + 5);
        assert_eq!(end - (start + 5), 10);
    }

    #[test]
    fn write_counts_mlc_transitions() {
        let mut sa = subarray();
        let mut builder = RequestBuilder::new();
        let mut req = builder.gen_write(
            MemAddr {
                row: 0,
                ..Default::default()
            },
            WriteData {
                old: vec![0b11],
                new: vec![0b01],
            },
        );
        sa.issue(None, &Cmd::Activate { row: 0 }, 0);
        let start = sa.next_write();
        sa.issue(Some(&mut req), &Cmd::Write { row: 0 }, start);
        assert_eq!(sa.stats().num_11_writes, 1);
        assert_eq!(sa.stats().num_10_writes, 1);
        assert_eq!(sa.stats().num_00_writes, 30);
        assert_eq!(sa.stats().worst_case_endurance, 1);
    }

    #[test]
    fn closest_port_minimizes_distance_with_low_index_ties() {
        let mut config = Config::tiny();
        config.domains_per_dbc = 8;
        config.rtm_ports = 2;
        let sa = SubArray::new(0, &config);
        // ports start at domains 2 and 6
        assert_eq!(sa.find_closest_port(0, 0), 0);
        assert_eq!(sa.find_closest_port(0, 7), 1);
        // domain 4 is distance 2 from both ports, the lowest index wins
        assert_eq!(sa.find_closest_port(0, 4), 0);
        assert_eq!(sa.shift_distance(0, 4), 2);
    }

    #[test]
    fn lazy_ports_move_static_ports_do_not() {
        let mut config = Config::tiny();
        config.domains_per_dbc = 8;
        config.rtm_ports = 1;
        let mut sa = SubArray::new(0, &config);
        sa.issue(None, &Cmd::Activate { row: 0 }, 0);
        let cycle = sa.next_read();
        sa.issue(None, &Cmd::Shift { dbc: 0, domain: 7 }, cycle);
        assert_eq!(sa.shift_distance(0, 7), 0);

        config.static_port_access = true;
        let mut sa = SubArray::new(0, &config);
        sa.issue(None, &Cmd::Activate { row: 0 }, 0);
        let cycle = sa.next_read();
        sa.issue(None, &Cmd::Shift { dbc: 0, domain: 7 }, cycle);
        // the port stays pinned, the return shifts are accounted
        assert_eq!(sa.shift_distance(0, 7), 3);
        assert_eq!(sa.stats().total_shifts, 6);
    }

    #[test]
    fn pim_activations_use_their_own_counters() {
        let mut sa = subarray();
        let cycle = sa.issue(
            None,
            &Cmd::MultiRowActivate {
                base_row: 0,
                rows: 3,
            },
            0,
        );
        assert_eq!(sa.stats().triple_row_activates, 1);
        assert_eq!(sa.stats().activates, 0);
        let cycle = cycle.max(sa.next_activate());
        sa.issue(
            None,
            &Cmd::OverlappedActivate {
                base_row: 1,
                rows: 2,
            },
            cycle,
        );
        assert_eq!(sa.stats().overlapped_double_row_activates, 1);
        assert_eq!(sa.state(), SubArrayState::Open);
    }
}
