//! the first ready, first come first serve policy with racetrack and pim
//! support.
//!
//! each cycle a multi tier priority cascade picks at most one request from
//! the transaction queue: starved requests, then row buffer hits, then
//! alternate address paths, then reads stalled behind a long write, then the
//! oldest ready request, then requests to closed banks. ties inside a tier
//! break by arrival age.

use tracing::{debug, trace};

use super::{
    collect_completions, drain_command_queues, expand_mem, expand_pim, flat_index, CommandQueue,
    ControllerStats, MemoryController,
};
use crate::mem::config::Config;
use crate::mem::queue::TransactionQueue;
use crate::mem::request::{MemAddr, Request, Status};
use crate::mem::subarray::{PauseOutcome, SubArray, SubArrayState, SubArrayStats};
use crate::mem::{Component, SimulationContext};

pub struct FrFcfsRtm {
    channel: usize,
    starvation_threshold: u64,
    write_pausing: bool,
    domains_per_dbc: u64,
    banks: usize,
    subarrays_per_bank: usize,
    refresh_interval: u64,

    queue: TransactionQueue,
    /// the subarray arena, indexed by the flattened (rank, bank, subarray)
    subarrays: Vec<SubArray>,
    cmd_queues: Vec<CommandQueue>,

    stats: ControllerStats,
    finished: Vec<Request>,
}

impl FrFcfsRtm {
    pub fn new(channel: usize, config: &Config) -> Self {
        let arena = config.subarrays_per_channel();
        debug!(channel, arena, "created a fr-fcfs rtm memory controller");
        Self {
            channel,
            starvation_threshold: config.starvation_threshold,
            write_pausing: config.write_pausing,
            domains_per_dbc: config.domains_per_dbc,
            banks: config.banks,
            subarrays_per_bank: config.subarrays,
            refresh_interval: config.refresh_interval,
            queue: TransactionQueue::new(config.queue_size),
            subarrays: (0..arena).map(|id| SubArray::new(id, config)).collect(),
            cmd_queues: (0..arena).map(|_| CommandQueue::default()).collect(),
            stats: ControllerStats::default(),
            finished: Vec::new(),
        }
    }

    fn flat(&self, addr: &MemAddr) -> usize {
        flat_index(self.banks, self.subarrays_per_bank, addr)
    }

    fn bank_free(&self, addr: &MemAddr) -> bool {
        !self.cmd_queues[self.flat(addr)].busy()
    }

    /// rule 1: a request blocked past the starvation threshold is forced out
    /// even at the price of a precharge
    fn find_starved_request(&self) -> Option<usize> {
        self.queue.oldest_where(|r| {
            r.starvation_counter >= self.starvation_threshold && self.bank_free(&r.addr)
        })
    }

    /// rule 2: requests targeting the currently open row of their subarray
    fn find_row_buffer_hit(&self) -> Option<usize> {
        self.queue.oldest_where(|r| {
            if r.op.is_pim() || !self.bank_free(&r.addr) {
                return false;
            }
            let sa = &self.subarrays[self.flat(&r.addr)];
            sa.state() == SubArrayState::Open
                && sa.open_row() == Some(r.addr.row)
                && !sa.is_writing()
        })
    }

    /// rule 3: addresses reachable through another path, e.g. a write back
    /// buffer. the lookup is a placeholder and never hits.
    fn find_cached_address(&self) -> Option<usize> {
        None
    }

    /// rule 4: the oldest read whose subarray is mid write and pausable
    fn find_write_stalled_read(&self, cycle: u64) -> Option<usize> {
        if !self.write_pausing {
            return None;
        }
        self.queue.oldest_where(|r| {
            if !r.op.is_read() {
                return false;
            }
            let sa = &self.subarrays[self.flat(&r.addr)];
            sa.is_writing() && sa.between_write_iterations(cycle)
        })
    }

    /// rule 5: the oldest request whose bank can take a command now
    fn find_oldest_ready_request(&self) -> Option<usize> {
        self.queue.oldest_where(|r| {
            self.bank_free(&r.addr)
                && self.subarrays[self.flat(&r.addr)].state() == SubArrayState::Open
        })
    }

    /// rule 6: requests to banks that are closed or on their way there
    fn find_closed_bank_request(&self) -> Option<usize> {
        self.queue.oldest_where(|r| {
            self.bank_free(&r.addr)
                && matches!(
                    self.subarrays[self.flat(&r.addr)].state(),
                    SubArrayState::Closed | SubArrayState::Precharging | SubArrayState::Refreshing
                )
        })
    }

    /// every request older than the favored row hit lost one more cycle to
    /// locality friendly traffic
    fn bump_starvation(&mut self, winner: usize) {
        let winner_key = self
            .queue
            .iter()
            .nth(winner)
            .expect("winner index out of queue")
            .age_key();
        for request in self.queue.iter_mut() {
            if request.age_key() < winner_key {
                request.starvation_counter += 1;
            }
        }
    }

    /// the ordered priority cascade, acting on the first rule that yields a
    /// candidate
    fn select(&mut self, cycle: u64) -> Option<usize> {
        if let Some(index) = self.find_starved_request() {
            self.stats.rb_miss += 1;
            self.stats.starvation_precharges += 1;
            return Some(index);
        }
        if let Some(index) = self.find_row_buffer_hit() {
            self.stats.rb_hits += 1;
            self.bump_starvation(index);
            return Some(index);
        }
        if let Some(index) = self.find_cached_address() {
            return Some(index);
        }
        if let Some(index) = self.find_write_stalled_read(cycle) {
            self.stats.write_pauses += 1;
            return Some(index);
        }
        if let Some(index) = self.find_oldest_ready_request() {
            self.stats.rb_miss += 1;
            return Some(index);
        }
        if let Some(index) = self.find_closed_bank_request() {
            self.stats.rb_miss += 1;
            return Some(index);
        }
        None
    }

    /// move the winner from the transaction queue into its bank's command
    /// queue, interrupting a write in progress first when rule 4 picked it
    fn dispatch(&mut self, index: usize, cycle: u64) {
        let mut request = self.queue.remove(index);
        request.status = Status::Issued;
        request.issue_cycle = cycle;
        request.starvation_counter = 0;
        let flat = self.flat(&request.addr);

        if self.subarrays[flat].is_writing() {
            self.interrupt_write(flat, cycle);
        }

        let cmds = if request.op.is_pim() {
            expand_pim(&self.subarrays[flat], &request)
        } else {
            expand_mem(&self.subarrays[flat], &request, self.domains_per_dbc)
        };
        trace!(
            channel = self.channel,
            request = request.id,
            op = %request.op,
            ?cmds,
            "dispatch"
        );
        let cq = &mut self.cmd_queues[flat];
        cq.cmds = cmds;
        cq.request = Some(request);
    }

    /// pause or cancel the write occupying `flat` and hand it back to the
    /// head of the transaction queue
    fn interrupt_write(&mut self, flat: usize, cycle: u64) {
        let result = self.subarrays[flat].pause_write(cycle);
        let cq = &mut self.cmd_queues[flat];
        cq.cmds.clear();
        cq.active_done = None;
        let mut write = cq.request.take().expect("paused bank holds no request");
        write.useful_write_cycles = write.useful_write_cycles.saturating_sub(result.uncredited);
        match result.outcome {
            PauseOutcome::Paused => write.paused = true,
            PauseOutcome::Cancelled => write.cancelled = true,
        }
        write.status = Status::Queued;
        self.request_complete(write, cycle);
    }

    /// inject a refresh into every idle bank at the configured interval
    fn inject_refreshes(&mut self, cycle: u64) {
        if self.refresh_interval == 0 || cycle == 0 || cycle % self.refresh_interval != 0 {
            return;
        }
        for cq in self.cmd_queues.iter_mut() {
            if !cq.busy() {
                cq.cmds.push_back(crate::mem::subarray::Cmd::Refresh);
            }
        }
    }
}

impl Component for FrFcfsRtm {
    type SimContext = SimulationContext;

    fn cycle(&mut self, _context: &mut Self::SimContext, current_cycle: u64) {
        for sa in self.subarrays.iter_mut() {
            sa.tick(current_cycle);
        }
        for request in collect_completions(&mut self.cmd_queues, current_cycle) {
            self.request_complete(request, current_cycle);
        }
        self.inject_refreshes(current_cycle);
        if let Some(index) = self.select(current_cycle) {
            self.dispatch(index, current_cycle);
        }
        drain_command_queues(&mut self.subarrays, &mut self.cmd_queues, current_cycle);
    }
}

impl MemoryController for FrFcfsRtm {
    fn is_issuable(&self, _request: &Request) -> bool {
        // limit the number of commands in the queue, this stalls the
        // producers
        !self.queue.is_full()
    }

    fn issue_command(&mut self, mut request: Request, cycle: u64) -> Result<(), Request> {
        if !MemoryController::is_issuable(self, &request) {
            return Err(request);
        }
        request.arrival_cycle = cycle;
        request.status = Status::Queued;
        self.stats.count_admission(request.op);
        self.queue.enqueue(request)
    }

    fn request_complete(&mut self, mut request: Request, cycle: u64) -> bool {
        if request.op.is_write() && (request.cancelled || request.paused) {
            // back to the head of the queue like nothing ever happened, a
            // paused write must not lose its place to newer traffic
            trace!(request = request.id, "paused write requeued at head");
            self.queue.prequeue(request);
            return true;
        }
        request.status = Status::Complete;
        request.completion_cycle = cycle;
        if request.op.is_accounted() {
            self.stats.record_completion(&request);
        }
        trace!(request = request.id, op = %request.op, cycle, "complete");
        self.finished.push(request);
        true
    }

    fn pending(&self) -> usize {
        self.queue.len() + self.cmd_queues.iter().filter(|cq| cq.busy()).count()
    }

    fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    fn subarray_stats(&self) -> Vec<SubArrayStats> {
        self.subarrays.iter().map(|sa| sa.stats().clone()).collect()
    }

    fn take_finished(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.finished)
    }
}
