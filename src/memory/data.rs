//! Data memory.
//!
//! A linear byte store of 512 cells split into two pages:
//! - the I/O page (0-255), reached directly by OUT/IN, where the port
//!   registers PINB, DDRB and PORTB live
//! - the extended page (256-511), reached only by STS/LDS through the
//!   +256 offset

use serde::{Serialize, Deserialize};

/// Size of the directly addressable I/O page.
pub const IO_PAGE_SIZE: usize = 256;

/// Total number of data memory cells.
pub const DATA_MEMORY_SIZE: usize = 2 * IO_PAGE_SIZE;

/// Pin input register for port B.
pub const PINB: u8 = 0x03;
/// Data direction register for port B.
pub const DDRB: u8 = 0x04;
/// Data register for port B.
pub const PORTB: u8 = 0x05;

pub const PORTB0: u8 = 0;
pub const PORTB1: u8 = 1;
pub const PORTB2: u8 = 2;

/// I/O registers shown in the diagnostic report.
pub const REPORTED_IO: [(&str, u8); 3] = [("DDRB", DDRB), ("PORTB", PORTB), ("PINB", PINB)];

/// Byte-addressable data memory.
#[derive(Clone, Serialize, Deserialize)]
pub struct DataMemory {
    cells: Vec<u8>,
}

impl DataMemory {
    /// Create a new data memory with all cells zeroed.
    pub fn new() -> Self {
        Self { cells: vec![0; DATA_MEMORY_SIZE] }
    }

    /// Read a cell. Addresses outside the memory read as zero.
    #[inline]
    pub fn read(&self, address: u16) -> u8 {
        match self.cells.get(address as usize) {
            Some(&value) => value,
            None => {
                log::warn!("data memory read out of range: {:#05x}", address);
                0
            }
        }
    }

    /// Write a cell. Writes outside the memory are dropped.
    #[inline]
    pub fn write(&mut self, address: u16, value: u8) {
        match self.cells.get_mut(address as usize) {
            Some(cell) => *cell = value,
            None => log::warn!("data memory write out of range: {:#05x}", address),
        }
    }

    /// Clear all cells to zero.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    /// Dump a range of cells (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let end = (start + count).min(DATA_MEMORY_SIZE);
        (start.min(end)..end).map(|i| (i, self.cells[i])).collect()
    }
}

impl Default for DataMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DataMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&c| c != 0).count();
        f.debug_struct("DataMemory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &DATA_MEMORY_SIZE)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut mem = DataMemory::new();
        mem.write(u16::from(DDRB), 0b0000_0111);
        assert_eq!(mem.read(u16::from(DDRB)), 0b0000_0111);
        assert_eq!(mem.read(u16::from(PORTB)), 0);
    }

    #[test]
    fn test_pages_are_distinct() {
        let mut mem = DataMemory::new();
        mem.write(0x10, 1);
        mem.write(0x10 + 256, 2);
        assert_eq!(mem.read(0x10), 1);
        assert_eq!(mem.read(0x110), 2);
    }

    #[test]
    fn test_out_of_range_is_benign() {
        let mut mem = DataMemory::new();
        mem.write(DATA_MEMORY_SIZE as u16, 0xAA);
        assert_eq!(mem.read(DATA_MEMORY_SIZE as u16), 0);
        assert_eq!(mem.read(u16::MAX), 0);
    }

    #[test]
    fn test_reset_clears() {
        let mut mem = DataMemory::new();
        mem.write(511, 0xFF);
        mem.reset();
        assert_eq!(mem.read(511), 0);
    }

    #[test]
    fn test_dump_is_clamped() {
        let mem = DataMemory::new();
        assert_eq!(mem.dump(510, 10).len(), 2);
        assert!(mem.dump(600, 4).is_empty());
    }
}
