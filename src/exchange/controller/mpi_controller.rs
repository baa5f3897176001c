use clap::Parser;
use mpi::collective::CommunicatorCollectives;
use mpi::topology::{Communicator, SimpleCommunicator};
use tracing::{error, info};

use crate::exchange::communication::mpi_communicator::MpiRingCommunicator;
use crate::exchange::config::{CommandLineArgs, Config};
use crate::exchange::controller::{execute_partition, PartitionArgumentsBuilder};
use crate::exchange::error::{ExchangeError, Result};
use crate::exchange::logging;

pub fn run_mpi() -> Result<()> {
    let universe = mpi::initialize()
        .ok_or_else(|| ExchangeError::Transport(String::from("MPI was already initialized")))?;
    let world = universe.world();
    let size = world.size();
    let rank = world.rank();

    let mut args = CommandLineArgs::parse();
    // override the num part argument, with the number of processes mpi has started.
    args.num_parts = Some(size as u32);
    let config = Config::from_args(&args)?;

    let _guards = logging::init_logging(&config, rank as u32)?;

    info!(
        "Starting MPI all-to-all exchange with {} partitions",
        config.partitioning().num_parts
    );

    if let Err(e) = execute(world, config) {
        // The other processes would block forever on their next receive or barrier.
        error!("Process #{} failed: {}. Aborting all processes.", rank, e);
        universe.world().abort(1);
    }

    info!("#{} at barrier.", rank);
    universe.world().barrier();
    info!("Process #{} finishing.", rank);
    Ok(())
}

fn execute(world: SimpleCommunicator, config: Config) -> Result<()> {
    let comm = MpiRingCommunicator::new(world);
    let partition_arguments = PartitionArgumentsBuilder::default()
        .communicator(comm)
        .config(config)
        .build()
        .map_err(|e| ExchangeError::Config(e.to_string()))?;
    execute_partition(partition_arguments)?;
    Ok(())
}
