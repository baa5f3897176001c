use crate::exchange::communication::RingCommunicator;
use crate::exchange::error::{ExchangeError, Result};

/// Position of one participant in the ring. Rank and size are fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingTopology {
    rank: u32,
    size: u32,
}

impl RingTopology {
    pub fn new(rank: u32, size: u32) -> Result<Self> {
        if size < 1 || rank >= size {
            return Err(ExchangeError::InvalidTopology { rank, size });
        }
        Ok(RingTopology { rank, size })
    }

    pub fn of<C: RingCommunicator>(comm: &C) -> Result<Self> {
        Self::new(comm.rank(), comm.size())
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn successor(&self) -> u32 {
        (self.rank + 1) % self.size
    }

    pub fn predecessor(&self) -> u32 {
        (self.rank + self.size - 1) % self.size
    }

    /// Number of values sent and received in `round`. Rounds start at 1.
    pub fn message_size(&self, round: u32) -> usize {
        (self.size - round) as usize
    }

    /// The rank whose value for this participant completes its journey in `round`. A value from
    /// origin `o` travels `(rank - o) mod size` hops, so it arrives in exactly that round.
    pub fn origin(&self, round: u32) -> u32 {
        (self.size + self.rank - round) % self.size
    }

    /// Position of the arriving value inside the buffer received from the predecessor.
    ///
    /// The predecessor's buffer is ordered by destination with the predecessor's own slot removed.
    /// Origins at or below our rank have not yet passed the gap relative to our slot, so our value
    /// sits at `origin`. For origins above our rank the buffer has wrapped and our value is the
    /// first one left.
    pub fn data_index(&self, origin: u32) -> usize {
        if origin <= self.rank {
            origin as usize
        } else {
            0
        }
    }
}
