/// A block of values travelling from one rank to a ring neighbour.
#[derive(Debug, Clone, PartialEq)]
pub struct RingMessage {
    pub from: u32,
    pub tag: u32,
    pub payload: Vec<i32>,
}

impl RingMessage {
    pub fn new(from: u32, tag: u32, payload: &[i32]) -> Self {
        RingMessage {
            from,
            tag,
            payload: payload.to_vec(),
        }
    }

    pub fn matches(&self, from: u32, tag: u32) -> bool {
        self.from == from && self.tag == tag
    }
}
