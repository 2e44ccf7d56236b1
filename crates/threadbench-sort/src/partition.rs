use std::ops::Range;

use threadbench_core::{BenchError, Result};

/// How an array of `len` elements is cut into `chunk_count` equal contiguous chunks.
///
/// The trailing `len % chunk_count` elements belong to no chunk and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub len: usize,
    pub chunk_count: usize,
    pub chunk_size: usize,
}

impl Partition {
    pub fn plan(len: usize, chunk_count: usize) -> Result<Self> {
        if chunk_count == 0 {
            return Err(BenchError::InvalidConfig(
                "chunk count must be greater than zero".into(),
            ));
        }
        Ok(Self {
            len,
            chunk_count,
            chunk_size: len / chunk_count,
        })
    }

    /// Elements that take part in the result.
    pub fn covered(&self) -> usize {
        self.chunk_size * self.chunk_count
    }

    pub fn dropped(&self) -> usize {
        self.len - self.covered()
    }

    pub fn dropped_range(&self) -> Range<usize> {
        self.covered()..self.len
    }

    pub fn chunk_range(&self, index: usize) -> Range<usize> {
        let start = index * self.chunk_size;
        start..start + self.chunk_size
    }

    /// Copy every chunk into its own buffer, in chunk order.
    pub fn split(&self, data: &[i32]) -> Vec<Vec<i32>> {
        debug_assert_eq!(data.len(), self.len);
        (0..self.chunk_count)
            .map(|i| data[self.chunk_range(i)].to_vec())
            .collect()
    }
}
