use mpi::collective::{CommunicatorCollectives, Root, SystemOperation};
use mpi::datatype::Equivalence;
use mpi::point_to_point::{Destination, Source};
use mpi::topology::{Communicator, SimpleCommunicator};
use mpi::{Rank, Tag};
use tracing::instrument;

use crate::exchange::communication::RingCommunicator;
use crate::exchange::error::Result;

pub struct MpiRingCommunicator {
    pub mpi_communicator: SimpleCommunicator,
}

impl MpiRingCommunicator {
    pub(crate) fn new(mpi_communicator: SimpleCommunicator) -> Self {
        MpiRingCommunicator { mpi_communicator }
    }
}

impl RingCommunicator for MpiRingCommunicator {
    fn send(&self, to: u32, tag: u32, values: &[i32]) -> Result<()> {
        self.mpi_communicator
            .process_at_rank(to as Rank)
            .send_with_tag(values, tag as Tag);
        Ok(())
    }

    fn receive_into(&self, from: u32, tag: u32, buffer: &mut [i32]) -> Result<usize> {
        let status = self
            .mpi_communicator
            .process_at_rank(from as Rank)
            .receive_into_with_tag(buffer, tag as Tag);
        Ok(status.count(i32::equivalent_datatype()) as usize)
    }

    #[instrument(level = "trace", skip(self, buffer), fields(rank = self.rank()))]
    fn send_receive(
        &self,
        to: u32,
        send_tag: u32,
        from: u32,
        receive_tag: u32,
        buffer: &mut [i32],
    ) -> Result<usize> {
        // Every rank sends to its successor at the same moment. With a plain MPI_Send all of them
        // may wait for a matching MPI_Recv which nobody has posted yet, if the implementation
        // switches to a rendezvous protocol. So the send is issued as MPI_Isend, then the blocking
        // receive provides the buffer for the predecessor, and only then we wait for our own send.
        //
        // The send needs its own copy, because the receive overwrites the buffer while the send
        // request may still be reading it.
        let outgoing = buffer.to_vec();
        let status = mpi::request::scope(|scope| {
            let request = self
                .mpi_communicator
                .process_at_rank(to as Rank)
                .immediate_send_with_tag(scope, &outgoing[..], send_tag as Tag);
            let status = self
                .mpi_communicator
                .process_at_rank(from as Rank)
                .receive_into_with_tag(buffer, receive_tag as Tag);
            request.wait();
            status
        });
        Ok(status.count(i32::equivalent_datatype()) as usize)
    }

    fn reduce_max(&self, value: f64) -> Result<Option<f64>> {
        let root = self.mpi_communicator.process_at_rank(0);
        if self.rank() == 0 {
            let mut max = 0.0f64;
            root.reduce_into_root(&value, &mut max, SystemOperation::max());
            Ok(Some(max))
        } else {
            root.reduce_into(&value, SystemOperation::max());
            Ok(None)
        }
    }

    fn barrier(&self) -> Result<()> {
        self.mpi_communicator.barrier();
        Ok(())
    }

    fn rank(&self) -> u32 {
        self.mpi_communicator.rank() as u32
    }

    fn size(&self) -> u32 {
        self.mpi_communicator.size() as u32
    }
}
