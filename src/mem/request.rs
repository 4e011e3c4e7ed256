//! the request data model shared by the controller and the subarrays

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// the operation kind of a request.
///
/// the last six kinds are activation based pim operations, they share the
/// transaction queue with the conventional kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum OpKind {
    #[display(fmt = "READ")]
    Read,
    #[display(fmt = "WRITE")]
    Write,
    #[display(fmt = "READ_PRECHARGE")]
    ReadPrecharge,
    #[display(fmt = "WRITE_PRECHARGE")]
    WritePrecharge,
    /// triple row activate
    #[display(fmt = "TRA")]
    Tra,
    /// double row activate
    #[display(fmt = "DRA")]
    Dra,
    /// overlapped activate
    #[display(fmt = "OA")]
    Oa,
    /// single row activate
    #[display(fmt = "SRA")]
    Sra,
    /// overlapped double row activate
    #[display(fmt = "ODRA")]
    Odra,
    /// overlapped triple row activate
    #[display(fmt = "OTRA")]
    Otra,
}

impl OpKind {
    pub fn is_pim(&self) -> bool {
        matches!(
            self,
            OpKind::Tra | OpKind::Dra | OpKind::Oa | OpKind::Sra | OpKind::Odra | OpKind::Otra
        )
    }

    pub fn is_read(&self) -> bool {
        matches!(self, OpKind::Read | OpKind::ReadPrecharge)
    }

    pub fn is_write(&self) -> bool {
        matches!(self, OpKind::Write | OpKind::WritePrecharge)
    }

    /// the kinds that feed the latency averages
    pub fn is_accounted(&self) -> bool {
        self.is_read() || self.is_write()
    }
}

impl std::str::FromStr for OpKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_uppercase().as_str() {
            "READ" | "R" => OpKind::Read,
            "WRITE" | "W" => OpKind::Write,
            "READ_PRECHARGE" | "RP" => OpKind::ReadPrecharge,
            "WRITE_PRECHARGE" | "WP" => OpKind::WritePrecharge,
            "TRA" => OpKind::Tra,
            "DRA" => OpKind::Dra,
            "OA" => OpKind::Oa,
            "SRA" => OpKind::Sra,
            "ODRA" => OpKind::Odra,
            "OTRA" => OpKind::Otra,
            other => eyre::bail!("unknown operation kind {other:?}"),
        };
        Ok(kind)
    }
}

/// the decomposed target address of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MemAddr {
    pub channel: usize,
    pub rank: usize,
    pub bank: usize,
    pub subarray: usize,
    pub row: u64,
    pub col: u64,
}

/// the lifecycle status of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Status {
    Queued,
    Issued,
    Complete,
}

/// the data carried by a write, used for mlc transition counting and wear
#[derive(Debug, Clone)]
pub struct WriteData {
    pub old: Vec<u32>,
    pub new: Vec<u32>,
}

/// one in flight memory or pim operation
#[derive(Debug, Clone)]
pub struct Request {
    pub id: u64,
    pub op: OpKind,
    pub addr: MemAddr,
    pub status: Status,
    /// the write was interrupted before the progress threshold and restarts
    pub cancelled: bool,
    /// the write was interrupted past the threshold and resumes mid way
    pub paused: bool,
    pub arrival_cycle: u64,
    pub issue_cycle: u64,
    pub completion_cycle: u64,
    /// consecutive cycles this request was skipped for newer row hits
    pub starvation_counter: u64,
    /// write cycles credited across pause segments
    pub useful_write_cycles: u64,
    pub data: Option<WriteData>,
}

impl Request {
    /// the explicit age comparator: oldest arrival first, creation order as
    /// the stable tie break
    pub fn age_key(&self) -> (u64, u64) {
        (self.arrival_cycle, self.id)
    }
}

/// hands out unique request ids
#[derive(Debug, Default)]
pub struct RequestBuilder {
    current_id: u64,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn gen_request(&mut self, op: OpKind, addr: MemAddr) -> Request {
        let id = self.current_id;
        self.current_id += 1;
        Request {
            id,
            op,
            addr,
            status: Status::Queued,
            cancelled: false,
            paused: false,
            arrival_cycle: 0,
            issue_cycle: 0,
            completion_cycle: 0,
            starvation_counter: 0,
            useful_write_cycles: 0,
            data: None,
        }
    }

    pub fn gen_write(&mut self, addr: MemAddr, data: WriteData) -> Request {
        let mut request = self.gen_request(OpKind::Write, addr);
        request.data = Some(data);
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids() {
        let mut builder = RequestBuilder::new();
        let a = builder.gen_request(OpKind::Read, MemAddr::default());
        let b = builder.gen_request(OpKind::Tra, MemAddr::default());
        assert_ne!(a.id, b.id);
        assert!(b.op.is_pim());
        assert!(!b.op.is_accounted());
    }

    #[test]
    fn age_key_orders_by_arrival_then_id() {
        let mut builder = RequestBuilder::new();
        let mut a = builder.gen_request(OpKind::Read, MemAddr::default());
        let mut b = builder.gen_request(OpKind::Read, MemAddr::default());
        a.arrival_cycle = 5;
        b.arrival_cycle = 5;
        assert!(a.age_key() < b.age_key());
        b.arrival_cycle = 4;
        assert!(b.age_key() < a.age_key());
    }
}
