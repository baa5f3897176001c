#[cfg(feature = "mpi")]
use rust_ring_a2a::exchange::controller::mpi_controller;

#[cfg(feature = "mpi")]
fn main() {
    if let Err(e) = mpi_controller::run_mpi() {
        eprintln!("All-to-all exchange failed: {e}");
        std::process::exit(1);
    }
}
