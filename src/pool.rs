//! Literal pool: deduplicated integer and byte-string constants.
//!
//! Offsets are assigned in insertion order and never change. The emitted
//! `intcblock`/`bytecblock` preamble lists entries in that same order.

use std::collections::HashMap;

/// Reference to a pool entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolRef {
    Int(usize),
    Bytes(usize),
}

impl PoolRef {
    /// The load instruction for this entry. Offsets below 4 have a
    /// dedicated single-byte opcode.
    pub fn load_op(&self) -> String {
        let (op, idx) = match self {
            PoolRef::Int(idx) => ("intc", *idx),
            PoolRef::Bytes(idx) => ("bytec", *idx),
        };
        if idx < 4 {
            format!("{}_{}", op, idx)
        } else {
            format!("{} {}", op, idx)
        }
    }
}

#[derive(Clone, Debug)]
pub struct LiteralPool {
    ints: Vec<u64>,
    int_offsets: HashMap<u64, usize>,
    bytes: Vec<Vec<u8>>,
    byte_offsets: HashMap<Vec<u8>, usize>,
}

impl Default for LiteralPool {
    fn default() -> Self {
        Self::new()
    }
}

impl LiteralPool {
    /// A pool with the boolean constants 0 and 1 reserved at offsets 0 and 1.
    pub fn new() -> Self {
        let mut pool = Self {
            ints: Vec::new(),
            int_offsets: HashMap::new(),
            bytes: Vec::new(),
            byte_offsets: HashMap::new(),
        };
        pool.intern_int(0);
        pool.intern_int(1);
        pool
    }

    pub fn intern_int(&mut self, value: u64) -> PoolRef {
        if let Some(&idx) = self.int_offsets.get(&value) {
            return PoolRef::Int(idx);
        }
        let idx = self.ints.len();
        self.ints.push(value);
        self.int_offsets.insert(value, idx);
        PoolRef::Int(idx)
    }

    pub fn intern_bytes(&mut self, value: &[u8]) -> PoolRef {
        if let Some(&idx) = self.byte_offsets.get(value) {
            return PoolRef::Bytes(idx);
        }
        let idx = self.bytes.len();
        self.bytes.push(value.to_vec());
        self.byte_offsets.insert(value.to_vec(), idx);
        PoolRef::Bytes(idx)
    }

    pub fn ints(&self) -> &[u64] {
        &self.ints
    }

    pub fn bytes(&self) -> &[Vec<u8>] {
        &self.bytes
    }

    /// Constant-block directives, one per populated pool.
    pub fn preamble(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.ints.is_empty() {
            let values: Vec<String> = self.ints.iter().map(|v| v.to_string()).collect();
            lines.push(format!("intcblock {}", values.join(" ")));
        }
        if !self.bytes.is_empty() {
            let values: Vec<String> = self
                .bytes
                .iter()
                .map(|b| format!("0x{}", hex::encode(b)))
                .collect();
            lines.push(format!("bytecblock {}", values.join(" ")));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_booleans() {
        let pool = LiteralPool::new();
        assert_eq!(pool.ints(), &[0, 1]);
        assert!(pool.bytes().is_empty());
    }

    #[test]
    fn test_dedup_by_value() {
        let mut pool = LiteralPool::new();
        let a = pool.intern_int(5);
        let b = pool.intern_int(6);
        let c = pool.intern_int(5);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.intern_int(1), PoolRef::Int(1));
        assert_eq!(pool.ints(), &[0, 1, 5, 6]);

        let x = pool.intern_bytes(b"123");
        let y = pool.intern_bytes(b"123");
        assert_eq!(x, y);
        assert_eq!(pool.bytes().len(), 1);
    }

    #[test]
    fn test_preamble() {
        let mut pool = LiteralPool::new();
        pool.intern_int(5);
        pool.intern_bytes(b"123");
        pool.intern_bytes(b"");
        assert_eq!(
            pool.preamble(),
            vec!["intcblock 0 1 5".to_string(), "bytecblock 0x313233 0x".to_string()]
        );
    }

    #[test]
    fn test_load_ops() {
        assert_eq!(PoolRef::Int(0).load_op(), "intc_0");
        assert_eq!(PoolRef::Int(3).load_op(), "intc_3");
        assert_eq!(PoolRef::Int(4).load_op(), "intc 4");
        assert_eq!(PoolRef::Bytes(1).load_op(), "bytec_1");
        assert_eq!(PoolRef::Bytes(12).load_op(), "bytec 12");
    }
}
