pub mod local_controller;
#[cfg(feature = "mpi")]
pub mod mpi_controller;

use std::mem::size_of;
use std::thread::{sleep, JoinHandle};
use std::time::Duration;

use derive_builder::Builder;
use nohash_hasher::IntMap;
use tracing::info;

use crate::exchange::communication::RingCommunicator;
use crate::exchange::config::Config;
use crate::exchange::data;
use crate::exchange::display::format_rank_row;
use crate::exchange::error::Result;
use crate::exchange::ring::RingExchange;
use crate::exchange::topology::RingTopology;

#[derive(Debug, Builder)]
#[builder(pattern = "owned")]
pub struct PartitionArguments<C: RingCommunicator> {
    communicator: C,
    config: Config,
    // If not set, the partition draws its own random messages.
    #[builder(setter(strip_option), default)]
    messages: Option<Vec<i32>>,
}

/// What one rank ends up with after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionReport {
    pub rank: u32,
    pub messages: Vec<i32>,
    pub received: Vec<i32>,
    pub communication_time: Duration,
    /// Maximum communication time over all ranks. Only known on rank 0.
    pub max_communication_time: Option<f64>,
}

pub fn execute_partition<C: RingCommunicator>(
    partition_arguments: PartitionArguments<C>,
) -> Result<PartitionReport> {
    let comm = partition_arguments.communicator;
    let config = partition_arguments.config;

    let topology = RingTopology::of(&comm)?;
    let rank = topology.rank();
    let size = topology.size();

    let messages = partition_arguments
        .messages
        .unwrap_or_else(|| data::create_messages(rank, size, config.data().seed));

    info!("Process #{rank} of {size} has started.");
    print_in_rank_order(&comm, &messages)?;

    let exchange = RingExchange::new(topology);
    comm.barrier()?;
    let outcome = exchange.run(&comm, &messages)?;
    comm.barrier()?;

    print_in_rank_order(&comm, &outcome.received)?;

    let max_communication_time = comm.reduce_max(outcome.communication_time.as_secs_f64())?;
    if let Some(total_time) = max_communication_time {
        info!(
            "The execution time is {:.6} seconds (only the all-to-all personalized communication, excluding all I/O time)",
            total_time
        );
        info!(
            "Theoretical time complexity = O({}(ts + {}tw))",
            size,
            size_of::<i32>() * size as usize / 2
        );
    }

    Ok(PartitionReport {
        rank,
        messages,
        received: outcome.received,
        communication_time: outcome.communication_time,
        max_communication_time,
    })
}

/// Logs `Rank r: ...` for every rank, one after another. The barrier after each rank's turn keeps
/// the lines of different processes from interleaving.
fn print_in_rank_order<C: RingCommunicator>(comm: &C, values: &[i32]) -> Result<()> {
    for turn in 0..comm.size() {
        if turn == comm.rank() {
            info!("{}", format_rank_row(comm.rank(), values));
        }
        comm.barrier()?;
    }
    Ok(())
}

/// Have this more complicated join logic, so that threads in the back of the handle vec can also
/// cause the main thread to panic.
pub fn try_join<T>(mut handles: IntMap<u32, JoinHandle<T>>) -> IntMap<u32, T> {
    let mut results = IntMap::default();
    while !handles.is_empty() {
        sleep(Duration::from_millis(20)); // test for finished threads regularly
        let finished: Vec<u32> = handles
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(rank, _)| *rank)
            .collect();
        for rank in finished {
            if let Some(handle) = handles.remove(&rank) {
                let name = handle
                    .thread()
                    .name()
                    .unwrap_or("unnamed_thread")
                    .to_string();
                let result = handle
                    .join()
                    .unwrap_or_else(|_| panic!("Error in partition thread {:?}", name));
                results.insert(rank, result);
            }
        }
    }
    results
}
