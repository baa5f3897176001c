use crate::exchange::error::Result;

pub mod local_communicator;

#[cfg(feature = "mpi")]
pub mod mpi_communicator;

/// Point-to-point transport between the ranks of a ring.
pub trait RingCommunicator {
    /// Blocking send of `values` to rank `to`.
    fn send(&self, to: u32, tag: u32, values: &[i32]) -> Result<()>;

    /// Blocks until a message from `from` with `tag` arrives and copies it into `buffer`. Returns
    /// the number of values received.
    fn receive_into(&self, from: u32, tag: u32, buffer: &mut [i32]) -> Result<usize>;

    /// Sends the content of `buffer` to `to` and then overwrites it with the message from `from`.
    fn send_receive(
        &self,
        to: u32,
        send_tag: u32,
        from: u32,
        receive_tag: u32,
        buffer: &mut [i32],
    ) -> Result<usize> {
        self.send(to, send_tag, buffer)?;
        self.receive_into(from, receive_tag, buffer)
    }

    /// Maximum of `value` over all ranks. Only rank 0 gets `Some`.
    fn reduce_max(&self, value: f64) -> Result<Option<f64>>;

    /// Blocks until every rank has called `barrier`.
    fn barrier(&self) -> Result<()>;

    fn rank(&self) -> u32;

    fn size(&self) -> u32;
}
