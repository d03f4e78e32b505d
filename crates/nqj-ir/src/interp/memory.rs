//! Byte-addressed memory for the reference interpreter.
//!
//! Every `alloc`/`alloca` creates an allocation of a fixed byte size. Values
//! are stored whole at the byte offset their address points to; loads must
//! read the exact offset a previous store wrote.

use nqj_core::RuntimeError;
use rustc_hash::FxHashMap;

/// A runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Bool(bool),
    /// `None` is the null pointer.
    Pointer(Option<Address>),
}

/// A location inside an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub allocation: u32,
    pub offset: u32,
}

#[derive(Debug, Default)]
struct Allocation {
    size: u32,
    cells: FxHashMap<u32, Value>,
}

#[derive(Debug, Default)]
pub struct Memory {
    allocations: Vec<Allocation>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `size` bytes. Nothing is ever freed.
    pub fn allocate(&mut self, size: u32) -> Address {
        let allocation = self.allocations.len() as u32;
        self.allocations.push(Allocation {
            size,
            cells: FxHashMap::default(),
        });
        Address {
            allocation,
            offset: 0,
        }
    }

    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    pub fn load(&self, address: Option<Address>) -> Result<Value, RuntimeError> {
        let (allocation, address) = self.resolve(address)?;
        allocation
            .cells
            .get(&address.offset)
            .copied()
            .ok_or(RuntimeError::UninitializedRead {
                offset: address.offset,
            })
    }

    pub fn store(&mut self, address: Option<Address>, value: Value) -> Result<(), RuntimeError> {
        let (_, address) = self.resolve(address)?;
        let allocation = &mut self.allocations[address.allocation as usize];
        allocation.cells.insert(address.offset, value);
        Ok(())
    }

    fn resolve(&self, address: Option<Address>) -> Result<(&Allocation, Address), RuntimeError> {
        let address = address.ok_or_else(|| RuntimeError::InvalidMemoryAccess {
            message: "null pointer dereference".into(),
        })?;
        let allocation = self
            .allocations
            .get(address.allocation as usize)
            .ok_or_else(|| RuntimeError::InvalidMemoryAccess {
                message: format!("unknown allocation {}", address.allocation),
            })?;
        if address.offset >= allocation.size {
            return Err(RuntimeError::InvalidMemoryAccess {
                message: format!(
                    "offset {} outside allocation of {} bytes",
                    address.offset, allocation.size
                ),
            });
        }
        Ok((allocation, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_load() {
        let mut memory = Memory::new();
        let base = memory.allocate(8);
        let second = Address { offset: 4, ..base };
        memory.store(Some(second), Value::Int(9)).unwrap();
        assert_eq!(memory.load(Some(second)), Ok(Value::Int(9)));
        assert_eq!(
            memory.load(Some(base)),
            Err(RuntimeError::UninitializedRead { offset: 0 })
        );
    }

    #[test]
    fn out_of_bounds_and_null() {
        let mut memory = Memory::new();
        let base = memory.allocate(4);
        let past = Address { offset: 4, ..base };
        assert!(matches!(
            memory.store(Some(past), Value::Int(1)),
            Err(RuntimeError::InvalidMemoryAccess { .. })
        ));
        assert!(matches!(
            memory.load(None),
            Err(RuntimeError::InvalidMemoryAccess { .. })
        ));
    }
}
