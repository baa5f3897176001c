use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{trace, warn};

use crate::exchange::communication::RingCommunicator;
use crate::exchange::error::{ExchangeError, Result};
use crate::exchange::messages::RingMessage;

// How often a blocked rank checks whether one of its peers has gone.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Transport for running all ranks as threads of one process.
///
/// A rank leaves the ring when its communicator is dropped, which also happens when its thread
/// returns an error or panics. From then on, blocking calls of the remaining ranks which can no
/// longer be satisfied fail with [`ExchangeError::PeerLeft`] instead of waiting forever.
pub struct ChannelRingCommunicator {
    receiver: Receiver<RingMessage>,
    senders: Vec<Sender<RingMessage>>,
    // messages which arrived before someone asked for them
    parked: RefCell<VecDeque<RingMessage>>,
    reduce_receiver: Receiver<f64>,
    reduce_root: Sender<f64>,
    rank: u32,
    ring: Arc<RingState>,
}

/// State shared by all communicators of one ring.
struct RingState {
    size: usize,
    departed: AtomicBool,
    barrier: Mutex<BarrierState>,
    barrier_released: Condvar,
}

#[derive(Default)]
struct BarrierState {
    waiting: usize,
    generation: u64,
}

impl RingState {
    fn has_departures(&self) -> bool {
        self.departed.load(Ordering::SeqCst)
    }

    fn barrier_wait(&self, rank: u32) -> Result<()> {
        let mut state = self.barrier.lock().map_err(|_| ExchangeError::PeerLeft { rank })?;
        let generation = state.generation;
        state.waiting += 1;
        if state.waiting == self.size {
            state.waiting = 0;
            state.generation += 1;
            self.barrier_released.notify_all();
            return Ok(());
        }

        // A released generation wins over a departure, so ranks which all made it through the
        // last barrier never fail because one of them has already left.
        while state.generation == generation {
            if self.has_departures() {
                state.waiting -= 1;
                return Err(ExchangeError::PeerLeft { rank });
            }
            state = self
                .barrier_released
                .wait_timeout(state, POLL_INTERVAL)
                .map_err(|_| ExchangeError::PeerLeft { rank })?
                .0;
        }
        Ok(())
    }
}

impl ChannelRingCommunicator {
    pub fn create_n_2_n(num_parts: u32) -> Vec<ChannelRingCommunicator> {
        let mut senders: Vec<_> = Vec::new();
        let mut reduce_senders: Vec<_> = Vec::new();
        let mut comms: Vec<_> = Vec::new();
        let ring = Arc::new(RingState {
            size: num_parts as usize,
            departed: AtomicBool::new(false),
            barrier: Mutex::new(BarrierState::default()),
            barrier_released: Condvar::new(),
        });

        for rank in 0..num_parts {
            let (sender, receiver) = channel();
            let (reduce_sender, reduce_receiver) = channel();
            senders.push(sender);
            reduce_senders.push(reduce_sender);
            comms.push((rank, receiver, reduce_receiver));
        }

        comms
            .into_iter()
            .map(|(rank, receiver, reduce_receiver)| ChannelRingCommunicator {
                receiver,
                senders: senders.clone(),
                parked: RefCell::new(VecDeque::new()),
                reduce_receiver,
                reduce_root: reduce_senders[0].clone(),
                rank,
                ring: ring.clone(),
            })
            .collect()
    }

    /// Blocks on `receiver` until a value arrives or a peer has left. Values sent before the
    /// peer left are still delivered.
    fn recv_or_departed<T>(&self, receiver: &Receiver<T>) -> Result<T> {
        loop {
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(value) => return Ok(value),
                Err(RecvTimeoutError::Timeout) => {
                    if self.ring.has_departures() {
                        return receiver
                            .try_recv()
                            .map_err(|_| ExchangeError::PeerLeft { rank: self.rank });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ExchangeError::Transport(format!(
                        "Channel of process {} is disconnected",
                        self.rank
                    )))
                }
            }
        }
    }

    fn take_matching(&self, from: u32, tag: u32) -> Result<RingMessage> {
        let mut parked = self.parked.borrow_mut();
        if let Some(message) = parked
            .iter()
            .position(|m| m.matches(from, tag))
            .and_then(|pos| parked.remove(pos))
        {
            return Ok(message);
        }

        loop {
            let message = self.recv_or_departed(&self.receiver)?;
            if message.matches(from, tag) {
                return Ok(message);
            }
            trace!(
                "Process {} parks message from {} with tag {}",
                self.rank,
                message.from,
                message.tag
            );
            parked.push_back(message);
        }
    }
}

impl Drop for ChannelRingCommunicator {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!("Process {} leaves the ring while panicking.", self.rank);
        }
        self.ring.departed.store(true, Ordering::SeqCst);
        self.ring.barrier_released.notify_all();
    }
}

impl RingCommunicator for ChannelRingCommunicator {
    fn send(&self, to: u32, tag: u32, values: &[i32]) -> Result<()> {
        let sender = self.senders.get(to as usize).ok_or_else(|| {
            ExchangeError::Transport(format!("There is no process with rank {}", to))
        })?;
        // the receiving end only goes away with the communicator of rank `to`
        sender
            .send(RingMessage::new(self.rank, tag, values))
            .map_err(|_| ExchangeError::PeerLeft { rank: self.rank })
    }

    fn receive_into(&self, from: u32, tag: u32, buffer: &mut [i32]) -> Result<usize> {
        let message = self.take_matching(from, tag)?;
        let count = message.payload.len();
        if count > buffer.len() {
            return Err(ExchangeError::Transport(format!(
                "Message from process {} with {} values does not fit into buffer of {}",
                from,
                count,
                buffer.len()
            )));
        }
        buffer[..count].copy_from_slice(&message.payload);
        Ok(count)
    }

    fn reduce_max(&self, value: f64) -> Result<Option<f64>> {
        self.reduce_root
            .send(value)
            .map_err(|_| ExchangeError::PeerLeft { rank: self.rank })?;

        let result = if self.rank == 0 {
            let mut max = f64::MIN;
            for _ in 0..self.size() {
                max = max.max(self.recv_or_departed(&self.reduce_receiver)?);
            }
            Some(max)
        } else {
            None
        };

        // Nobody may start the next reduction before the root has collected this one. Otherwise
        // values of two reductions could end up in the same round on the root.
        self.ring.barrier_wait(self.rank)?;
        Ok(result)
    }

    fn barrier(&self) -> Result<()> {
        self.ring.barrier_wait(self.rank)
    }

    fn rank(&self) -> u32 {
        self.rank
    }

    fn size(&self) -> u32 {
        self.senders.len() as u32
    }
}
