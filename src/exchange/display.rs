use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopDirection {
    Send,
    Receive,
}

pub fn format_values(values: &[i32]) -> String {
    format!("[{}]", values.iter().join(", "))
}

/// One line per hop, e.g. `Process 1 sent [4, 5] to process 2`.
pub fn format_hop(rank: u32, other_rank: u32, values: &[i32], direction: HopDirection) -> String {
    match direction {
        HopDirection::Send => format!(
            "Process {} sent {} to process {}",
            rank,
            format_values(values),
            other_rank
        ),
        HopDirection::Receive => format!(
            "Process {} received {} from process {}",
            rank,
            format_values(values),
            other_rank
        ),
    }
}

/// Row of the per-rank matrix printout, e.g. `Rank 2: 7 8 9`.
pub fn format_rank_row(rank: u32, values: &[i32]) -> String {
    format!("Rank {}: {}", rank, values.iter().join(" "))
}

#[cfg(test)]
mod tests {
    use crate::exchange::display::{format_hop, format_rank_row, format_values, HopDirection};

    #[test]
    fn values() {
        assert_eq!("[]", format_values(&[]));
        assert_eq!("[1, -2, 3]", format_values(&[1, -2, 3]));
    }

    #[test]
    fn hops() {
        assert_eq!(
            "Process 0 sent [20, 30] to process 1",
            format_hop(0, 1, &[20, 30], HopDirection::Send)
        );
        assert_eq!(
            "Process 1 received [30] from process 0",
            format_hop(1, 0, &[30], HopDirection::Receive)
        );
    }

    #[test]
    fn rank_row() {
        assert_eq!("Rank 2: 30 60 90", format_rank_row(2, &[30, 60, 90]));
    }
}
