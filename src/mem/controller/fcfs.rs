//! strict first come first serve scheduling, the baseline policy.
//!
//! only the head of the transaction queue is ever considered, so a single
//! row miss stalls everything behind it. useful as a lower bound when
//! evaluating the fr-fcfs cascade.

use tracing::debug;

use super::{
    collect_completions, drain_command_queues, expand_mem, expand_pim, flat_index, CommandQueue,
    ControllerStats, MemoryController,
};
use crate::mem::config::Config;
use crate::mem::queue::TransactionQueue;
use crate::mem::request::{Request, Status};
use crate::mem::subarray::{SubArray, SubArrayState, SubArrayStats};
use crate::mem::{Component, SimulationContext};

pub struct Fcfs {
    domains_per_dbc: u64,
    banks: usize,
    subarrays_per_bank: usize,

    queue: TransactionQueue,
    subarrays: Vec<SubArray>,
    cmd_queues: Vec<CommandQueue>,

    stats: ControllerStats,
    finished: Vec<Request>,
}

impl Fcfs {
    pub fn new(channel: usize, config: &Config) -> Self {
        let arena = config.subarrays_per_channel();
        debug!(channel, arena, "created a fcfs memory controller");
        Self {
            domains_per_dbc: config.domains_per_dbc,
            banks: config.banks,
            subarrays_per_bank: config.subarrays,
            queue: TransactionQueue::new(config.queue_size),
            subarrays: (0..arena).map(|id| SubArray::new(id, config)).collect(),
            cmd_queues: (0..arena).map(|_| CommandQueue::default()).collect(),
            stats: ControllerStats::default(),
            finished: Vec::new(),
        }
    }

    /// dispatch the queue head when its bank is idle, nothing else is ever
    /// looked at
    fn dispatch_head(&mut self, cycle: u64) {
        let Some(head) = self.queue.iter().next() else {
            return;
        };
        let flat = flat_index(self.banks, self.subarrays_per_bank, &head.addr);
        if self.cmd_queues[flat].busy() {
            return;
        }
        let sa = &self.subarrays[flat];
        if sa.state() == SubArrayState::Open && sa.open_row() == Some(head.addr.row) {
            self.stats.rb_hits += 1;
        } else {
            self.stats.rb_miss += 1;
        }
        let mut request = self.queue.remove(0);
        request.status = Status::Issued;
        request.issue_cycle = cycle;
        let cmds = if request.op.is_pim() {
            expand_pim(sa, &request)
        } else {
            expand_mem(sa, &request, self.domains_per_dbc)
        };
        let cq = &mut self.cmd_queues[flat];
        cq.cmds = cmds;
        cq.request = Some(request);
    }
}

impl Component for Fcfs {
    type SimContext = SimulationContext;

    fn cycle(&mut self, _context: &mut Self::SimContext, current_cycle: u64) {
        for sa in self.subarrays.iter_mut() {
            sa.tick(current_cycle);
        }
        for request in collect_completions(&mut self.cmd_queues, current_cycle) {
            self.request_complete(request, current_cycle);
        }
        self.dispatch_head(current_cycle);
        drain_command_queues(&mut self.subarrays, &mut self.cmd_queues, current_cycle);
    }
}

impl MemoryController for Fcfs {
    fn is_issuable(&self, _request: &Request) -> bool {
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
        request.status = Status::Complete;
        request.completion_cycle = cycle;
        if request.op.is_accounted() {
            self.stats.record_completion(&request);
        }
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
