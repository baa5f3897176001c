//! Personalized all-to-all exchange on a ring.
//!
//! Every rank starts with one value per destination. In round `i` each rank sends its circulating
//! buffer of `size - i` values to its successor and receives the buffer of its predecessor. Out of
//! the received buffer it takes the one value addressed to itself and forwards the rest in the
//! next round. After `size - 1` rounds all values have arrived.

use std::time::{Duration, Instant};

use tracing::{debug, span, Level};

use crate::exchange::buffer::CirculatingBuffer;
use crate::exchange::communication::RingCommunicator;
use crate::exchange::display::{format_hop, HopDirection};
use crate::exchange::error::{ExchangeError, Result};
use crate::exchange::topology::RingTopology;

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeOutcome {
    /// Indexed by origin rank: `received[k]` is the value rank `k` sent to this rank.
    pub received: Vec<i32>,
    /// Wall clock time spent inside send and receive calls.
    pub communication_time: Duration,
}

pub struct RingExchange {
    topology: RingTopology,
}

impl RingExchange {
    pub fn new(topology: RingTopology) -> Self {
        RingExchange { topology }
    }

    pub fn run<C: RingCommunicator>(&self, comm: &C, messages: &[i32]) -> Result<ExchangeOutcome> {
        self.check_communicator(comm)?;
        let rank = self.topology.rank();
        let size = self.topology.size();

        let (mut received, mut buffer) = self.init(messages)?;
        let send_to = self.topology.successor();
        let receive_from = self.topology.predecessor();
        let mut communication_time = Duration::ZERO;

        let exchange_span = span!(Level::TRACE, "send_receive_msgs", rank = rank);

        for round in 1..size {
            let message_size = self.topology.message_size(round);
            debug_assert_eq!(message_size, buffer.len());

            // capture the outgoing values before the receive overwrites them
            let outgoing = tracing::enabled!(Level::DEBUG).then(|| {
                format_hop(rank, send_to, buffer.as_slice(), HopDirection::Send)
            });

            let origin = self.topology.origin(round);

            let exchange_time = {
                let _exchange = exchange_span.enter();
                let start = Instant::now();
                let count = comm.send_receive(
                    send_to,
                    rank,
                    receive_from,
                    receive_from,
                    buffer.as_mut_slice(),
                )?;
                let elapsed = start.elapsed();
                if count != message_size {
                    return Err(ExchangeError::ShortReceive {
                        from: receive_from,
                        expected: message_size,
                        actual: count,
                    });
                }
                elapsed
            };
            communication_time += exchange_time;

            if let Some(outgoing) = outgoing {
                debug!("{}", outgoing);
                debug!(
                    "{}",
                    format_hop(rank, receive_from, buffer.as_slice(), HopDirection::Receive)
                );
            }

            let data_index = self.topology.data_index(origin);
            let value = buffer.remove_at(data_index);
            let slot = &mut received[origin as usize];
            assert!(
                slot.is_none(),
                "Process {} received a second value from process {} in round {}",
                rank,
                origin,
                round
            );
            *slot = Some(value);
        }

        debug_assert!(buffer.is_empty());

        let received = received
            .into_iter()
            .enumerate()
            .map(|(origin, value)| {
                value.unwrap_or_else(|| {
                    panic!(
                        "Process {} never received the value from process {}",
                        rank, origin
                    )
                })
            })
            .collect();

        Ok(ExchangeOutcome {
            received,
            communication_time,
        })
    }

    /// Sets up the result slots with the value a rank keeps for itself, and the first buffer to
    /// send.
    fn init(&self, messages: &[i32]) -> Result<(Vec<Option<i32>>, CirculatingBuffer)> {
        let size = self.topology.size() as usize;
        if messages.len() != size {
            return Err(ExchangeError::MessageLength {
                expected: size,
                actual: messages.len(),
            });
        }
        let rank = self.topology.rank() as usize;

        let mut received = vec![None; size];
        received[rank] = Some(messages[rank]);

        Ok((received, CirculatingBuffer::from_messages(messages, rank)))
    }

    fn check_communicator<C: RingCommunicator>(&self, comm: &C) -> Result<()> {
        if comm.rank() != self.topology.rank() || comm.size() != self.topology.size() {
            return Err(ExchangeError::CommunicatorMismatch {
                rank: self.topology.rank(),
                size: self.topology.size(),
                comm_rank: comm.rank(),
                comm_size: comm.size(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::exchange::communication::local_communicator::ChannelRingCommunicator;
    use crate::exchange::communication::RingCommunicator;
    use crate::exchange::error::{ExchangeError, Result};
    use crate::exchange::ring::RingExchange;
    use crate::exchange::topology::RingTopology;
    use crate::test_utils;

    /// Delivers one value less than requested on every receive.
    struct TruncatingCommunicator {
        rank: u32,
        size: u32,
    }

    impl RingCommunicator for TruncatingCommunicator {
        fn send(&self, _to: u32, _tag: u32, _values: &[i32]) -> Result<()> {
            Ok(())
        }

        fn receive_into(&self, _from: u32, _tag: u32, buffer: &mut [i32]) -> Result<usize> {
            Ok(buffer.len() - 1)
        }

        fn reduce_max(&self, _value: f64) -> Result<Option<f64>> {
            Ok(None)
        }

        fn barrier(&self) -> Result<()> {
            Ok(())
        }

        fn rank(&self) -> u32 {
            self.rank
        }

        fn size(&self) -> u32 {
            self.size
        }
    }

    fn run_ring(messages: Vec<Vec<i32>>) -> Vec<Vec<i32>> {
        test_utils::run_ring(messages)
            .into_iter()
            .map(|outcome| outcome.received)
            .collect()
    }

    #[test]
    fn self_value_is_kept() {
        let exchange = RingExchange::new(RingTopology::new(2, 4).unwrap());
        let (received, buffer) = exchange.init(&[1, 2, 3, 4]).unwrap();

        assert_eq!(vec![None, None, Some(3), None], received);
        assert_eq!(&[1, 2, 4], buffer.as_slice());
    }

    #[test]
    fn three_processes() {
        let result = run_ring(vec![vec![10, 20, 30], vec![40, 50, 60], vec![70, 80, 90]]);

        assert_eq!(
            vec![vec![10, 40, 70], vec![20, 50, 80], vec![30, 60, 90]],
            result
        );
    }

    #[test]
    fn single_process() {
        let comms = ChannelRingCommunicator::create_n_2_n(1);
        let exchange = RingExchange::new(RingTopology::new(0, 1).unwrap());

        let outcome = exchange.run(&comms[0], &[5]).unwrap();

        assert_eq!(vec![5], outcome.received);
        assert!(outcome.communication_time.is_zero());
    }

    #[test]
    fn two_processes_swap() {
        let result = run_ring(vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(vec![vec![1, 3], vec![2, 4]], result);
    }

    #[test]
    fn wrong_message_length() {
        let comms = ChannelRingCommunicator::create_n_2_n(1);
        let exchange = RingExchange::new(RingTopology::new(0, 1).unwrap());

        let result = exchange.run(&comms[0], &[1, 2]);
        assert!(matches!(
            result,
            Err(ExchangeError::MessageLength {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn communicator_of_other_rank() {
        let comms = ChannelRingCommunicator::create_n_2_n(2);
        let exchange = RingExchange::new(RingTopology::new(0, 2).unwrap());

        let result = exchange.run(&comms[1], &[1, 2]);
        assert!(matches!(
            result,
            Err(ExchangeError::CommunicatorMismatch { comm_rank: 1, .. })
        ));
    }

    #[test]
    fn short_receive_is_fatal() {
        let comm = TruncatingCommunicator { rank: 0, size: 3 };
        let exchange = RingExchange::new(RingTopology::new(0, 3).unwrap());

        let result = exchange.run(&comm, &[1, 2, 3]);
        assert!(matches!(
            result,
            Err(ExchangeError::ShortReceive {
                from: 2,
                expected: 2,
                actual: 1
            })
        ));
    }
}
