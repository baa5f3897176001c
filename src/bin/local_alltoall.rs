use std::process::ExitCode;

use rust_ring_a2a::exchange::controller::local_controller;

fn main() -> ExitCode {
    match local_controller::run_channel_from_args() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("All-to-all exchange failed: {e}");
            ExitCode::FAILURE
        }
    }
}
