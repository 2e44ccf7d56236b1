use std::fmt;

/// Multiplier of the flat `producer * 1000 + seq` encoding.
pub const LEGACY_STRIDE: u64 = 1000;

/// One unit of work: which producer emitted it and at which position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskToken {
    producer: u32,
    seq: u32,
}

impl TaskToken {
    pub const fn new(producer: u32, seq: u32) -> Self {
        Self { producer, seq }
    }

    pub const fn producer(&self) -> u32 {
        self.producer
    }

    pub const fn seq(&self) -> u32 {
        self.seq
    }

    /// Flat integer id. Only unique while `seq < LEGACY_STRIDE`.
    pub const fn legacy_id(&self) -> u64 {
        self.producer as u64 * LEGACY_STRIDE + self.seq as u64
    }
}

impl fmt::Display for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}#{}", self.producer, self.seq)
    }
}
