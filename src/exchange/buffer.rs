/// Values still in transit, ordered by destination rank with the holder's own slot left out.
///
/// The buffer only ever shrinks. At the start of round `i` it holds `size - i` values, and
/// [`CirculatingBuffer::remove_at`] takes one out before it is handed to the next rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CirculatingBuffer {
    values: Vec<i32>,
}

impl CirculatingBuffer {
    /// Builds the first outgoing buffer of `rank` from its message vector. The value for `rank`
    /// itself is skipped, every value after it moves one slot to the left.
    pub fn from_messages(messages: &[i32], rank: usize) -> Self {
        let values = messages
            .iter()
            .enumerate()
            .filter(|(dest, _)| *dest != rank)
            .map(|(_, value)| *value)
            .collect();
        CirculatingBuffer { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    /// Storage for an incoming message. The received values replace the current ones in place.
    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.values
    }

    /// Removes the value at `index` and shifts all later values one slot to the left.
    ///
    /// # Panics
    /// An index outside the buffer means the round arithmetic is broken, so this panics instead
    /// of returning an error.
    pub fn remove_at(&mut self, index: usize) -> i32 {
        assert!(
            index < self.values.len(),
            "Index {} is outside of circulating buffer with {} values",
            index,
            self.values.len()
        );
        self.values.remove(index)
    }
}

#[cfg(test)]
mod tests {
    use crate::exchange::buffer::CirculatingBuffer;

    #[test]
    fn skips_own_slot() {
        let messages = vec![10, 20, 30, 40];

        assert_eq!(
            &[20, 30, 40],
            CirculatingBuffer::from_messages(&messages, 0).as_slice()
        );
        assert_eq!(
            &[10, 20, 40],
            CirculatingBuffer::from_messages(&messages, 2).as_slice()
        );
        assert_eq!(
            &[10, 20, 30],
            CirculatingBuffer::from_messages(&messages, 3).as_slice()
        );
    }

    #[test]
    fn single_participant_starts_empty() {
        let buffer = CirculatingBuffer::from_messages(&[5], 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn remove_keeps_order_of_survivors() {
        let mut buffer = CirculatingBuffer::from_messages(&[1, 2, 3, 4, 5], 4);

        assert_eq!(2, buffer.remove_at(1));
        assert_eq!(&[1, 3, 4], buffer.as_slice());

        assert_eq!(1, buffer.remove_at(0));
        assert_eq!(&[3, 4], buffer.as_slice());

        assert_eq!(4, buffer.remove_at(1));
        assert_eq!(&[3], buffer.as_slice());
    }

    #[test]
    fn shrinks_by_one_per_round() {
        let size = 6;
        let messages: Vec<i32> = (0..size).collect();
        let mut buffer = CirculatingBuffer::from_messages(&messages, 2);

        for round in 1..size as usize {
            assert_eq!(size as usize - round, buffer.len());
            buffer.remove_at(0);
            assert_eq!(size as usize - round - 1, buffer.len());
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn receive_overwrites_in_place() {
        let mut buffer = CirculatingBuffer::from_messages(&[1, 2, 3], 0);
        buffer.as_mut_slice().copy_from_slice(&[7, 8]);
        assert_eq!(&[7, 8], buffer.as_slice());
    }

    #[test]
    #[should_panic]
    fn remove_outside_panics() {
        let mut buffer = CirculatingBuffer::from_messages(&[1, 2], 1);
        buffer.remove_at(1);
    }
}
