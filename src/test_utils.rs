use std::thread;

use crate::exchange::communication::local_communicator::ChannelRingCommunicator;
use crate::exchange::communication::RingCommunicator;
use crate::exchange::ring::{ExchangeOutcome, RingExchange};
use crate::exchange::topology::RingTopology;

/// Runs one exchange per entry of `messages` on its own thread. `messages[r]` is the message vector
/// of rank `r`; the outcomes are returned in rank order.
pub fn run_ring(messages: Vec<Vec<i32>>) -> Vec<ExchangeOutcome> {
    let comms = ChannelRingCommunicator::create_n_2_n(messages.len() as u32);
    let handles: Vec<_> = comms
        .into_iter()
        .zip(messages)
        .map(|(comm, msg)| {
            thread::Builder::new()
                .name(format!("ring-test-{}", comm.rank()))
                .spawn(move || {
                    let topology = RingTopology::of(&comm).unwrap();
                    RingExchange::new(topology).run(&comm, &msg).unwrap()
                })
                .unwrap()
        })
        .collect();
    handles
        .into_iter()
        .map(|handle| handle.join().expect("Error in a ring thread"))
        .collect()
}

/// Message vectors where every value is unique and encodes its route: `origin * 1000 + destination`.
pub fn create_traceable_messages(size: u32) -> Vec<Vec<i32>> {
    (0..size)
        .map(|origin| {
            (0..size)
                .map(|dest| (origin * 1000 + dest) as i32)
                .collect()
        })
        .collect()
}

pub fn transpose(matrix: &[Vec<i32>]) -> Vec<Vec<i32>> {
    let size = matrix.len();
    (0..size)
        .map(|col| matrix.iter().map(|row| row[col]).collect())
        .collect()
}
