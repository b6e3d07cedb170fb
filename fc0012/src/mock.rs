use crate::Transport;
use std::{collections::HashMap, io};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Write(u8, u8),
    Read(u8),
}

/// Records every register access. Reads answer from `values` (0 when
/// unset), writes do not change what is read back.
#[derive(Default)]
pub struct MockBus {
    pub ops: Vec<Op>,
    pub values: HashMap<u8, u8>,
    /// Index of the write that fails with a NAK, counting from 0
    pub fail_write: Option<usize>,
    pub fail_read: bool,
}

impl MockBus {
    pub fn with_value(addr: u8, value: u8) -> Self {
        Self {
            values: HashMap::from([(addr, value)]),
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Write(a, v) => Some((*a, *v)),
                Op::Read(_) => None,
            })
            .collect()
    }

    pub fn writes_to(&self, addr: u8) -> Vec<u8> {
        self.writes()
            .into_iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| v)
            .collect()
    }
}

impl Transport for MockBus {
    fn write(&mut self, addr: u8, value: u8) -> io::Result<()> {
        if self.fail_write == Some(self.writes().len()) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "NAK"));
        }
        self.ops.push(Op::Write(addr, value));
        Ok(())
    }

    fn read(&mut self, addr: u8) -> io::Result<u8> {
        if self.fail_read {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "NAK"));
        }
        self.ops.push(Op::Read(addr));
        Ok(self.values.get(&addr).copied().unwrap_or(0))
    }
}
