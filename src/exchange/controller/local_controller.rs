use std::thread;
use std::thread::JoinHandle;

use clap::Parser;
use nohash_hasher::IntMap;
use tracing::{error, info};

use crate::exchange::communication::local_communicator::ChannelRingCommunicator;
use crate::exchange::communication::RingCommunicator;
use crate::exchange::config::{CommandLineArgs, Config};
use crate::exchange::controller::{
    execute_partition, try_join, PartitionArgumentsBuilder, PartitionReport,
};
use crate::exchange::error::{ExchangeError, Result};
use crate::exchange::logging;

/// Starts one thread per partition. Partitions without an entry in `messages_per_partition` draw
/// random messages.
pub fn run_channel(
    config: &Config,
    mut messages_per_partition: IntMap<u32, Vec<i32>>,
) -> Result<IntMap<u32, JoinHandle<Result<PartitionReport>>>> {
    let num_parts = config.partitioning().num_parts;
    info!(
        "Starting multithreaded all-to-all exchange with {} partitions.",
        num_parts
    );
    check_messages(num_parts, &messages_per_partition)?;
    let comms = ChannelRingCommunicator::create_n_2_n(num_parts);

    let mut handles = IntMap::default();
    for comm in comms {
        let rank = comm.rank();
        let mut builder = PartitionArgumentsBuilder::default()
            .communicator(comm)
            .config(config.clone());
        if let Some(messages) = messages_per_partition.remove(&rank) {
            builder = builder.messages(messages);
        }
        let args = builder
            .build()
            .map_err(|e| ExchangeError::Config(e.to_string()))?;

        let handle = thread::Builder::new()
            .name(format!("ring-{}", rank))
            .spawn(move || execute_partition(args))?;
        handles.insert(rank, handle);
    }

    Ok(handles)
}

/// Supplied message vectors must fit the ring before any partition starts. A partition failing
/// on its own input would only make its peers give up.
fn check_messages(num_parts: u32, messages_per_partition: &IntMap<u32, Vec<i32>>) -> Result<()> {
    for (rank, messages) in messages_per_partition.iter() {
        if *rank >= num_parts {
            return Err(ExchangeError::InvalidTopology {
                rank: *rank,
                size: num_parts,
            });
        }
        if messages.len() != num_parts as usize {
            return Err(ExchangeError::MessageLength {
                expected: num_parts as usize,
                actual: messages.len(),
            });
        }
    }
    Ok(())
}

/// Runs all partitions and waits for them. Fails with the error of the lowest failing rank, where
/// ranks which only gave up because a peer left come last.
pub fn run_channel_and_join(
    config: &Config,
    messages_per_partition: IntMap<u32, Vec<i32>>,
) -> Result<Vec<PartitionReport>> {
    let handles = run_channel(config, messages_per_partition)?;
    collect_reports(try_join(handles))
}

fn collect_reports(results: IntMap<u32, Result<PartitionReport>>) -> Result<Vec<PartitionReport>> {
    let mut results: Vec<(u32, Result<PartitionReport>)> = results.into_iter().collect();
    results.sort_by_key(|(rank, _)| *rank);

    let mut reports = Vec::with_capacity(results.len());
    let mut gave_up = None;
    for (rank, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e @ ExchangeError::PeerLeft { .. }) => {
                gave_up.get_or_insert(e);
            }
            Err(e) => {
                error!("Partition #{} failed.", rank);
                return Err(e);
            }
        }
    }
    match gave_up {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}

pub fn run_channel_from_args() -> Result<()> {
    let args = CommandLineArgs::parse();
    let config = Config::from_args(&args)?;

    let _guards = logging::init_logging(&config, 0)?;

    match run_channel_and_join(&config, IntMap::default()) {
        Ok(reports) => {
            info!("All {} partitions have finished.", reports.len());
            Ok(())
        }
        Err(e) => {
            error!("Exchange failed: {}", e);
            Err(e)
        }
    }
}
