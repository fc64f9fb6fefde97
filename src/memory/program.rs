//! Program memory.
//!
//! Holds up to 256 instruction words (0.75 kB of 24-bit instructions) and a
//! table of named subroutine ranges used to label addresses in diagnostics.

use crate::cpu::decode::InstructionWord;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of instruction words the program memory can hold.
pub const PROGRAM_MEMORY_SIZE: usize = 256;

/// Label returned for addresses outside every subroutine.
pub const UNKNOWN_SUBROUTINE: &str = "Unknown";

/// A named, half-open address range `[start, end)` in program memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subroutine {
    pub name: String,
    pub start: u16,
    pub end: u16,
}

impl Subroutine {
    pub fn new(name: impl Into<String>, start: u16, end: u16) -> Self {
        Self { name: name.into(), start, end }
    }

    pub fn contains(&self, address: u16) -> bool {
        address >= self.start && address < self.end
    }
}

/// A program image: instruction words starting at address 0, plus the
/// subroutine table describing them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub words: Vec<InstructionWord>,
    pub subroutines: Vec<Subroutine>,
}

impl Program {
    /// Create a program without subroutine labels.
    pub fn new(words: Vec<InstructionWord>) -> Self {
        Self { words, subroutines: Vec::new() }
    }

    /// Add a subroutine range.
    pub fn with_subroutine(mut self, name: impl Into<String>, start: u16, end: u16) -> Self {
        self.subroutines.push(Subroutine::new(name, start, end));
        self
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Name of the subroutine containing `address`, or "Unknown".
    pub fn subroutine_name(&self, address: u16) -> &str {
        self.subroutines
            .iter()
            .find(|s| s.contains(address))
            .map(|s| s.name.as_str())
            .unwrap_or(UNKNOWN_SUBROUTINE)
    }

    /// Check that the image fits in program memory and that its subroutine
    /// ranges are non-empty, in bounds and non-overlapping.
    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.words.len() > PROGRAM_MEMORY_SIZE {
            return Err(ProgramError::TooLarge {
                size: self.words.len(),
                available: PROGRAM_MEMORY_SIZE,
            });
        }

        for (i, sub) in self.subroutines.iter().enumerate() {
            if sub.start >= sub.end || sub.end as usize > PROGRAM_MEMORY_SIZE {
                return Err(ProgramError::InvalidRange {
                    name: sub.name.clone(),
                    start: sub.start,
                    end: sub.end,
                });
            }
            let overlap = self.subroutines[..i]
                .iter()
                .find(|other| sub.start < other.end && other.start < sub.end);
            if let Some(other) = overlap {
                return Err(ProgramError::OverlappingRanges {
                    first: other.name.clone(),
                    second: sub.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Program memory backed by a fixed program image.
///
/// The image is copied into the cells by [`ProgramMemory::load`], which only
/// has an effect the first time it is called.
#[derive(Clone)]
pub struct ProgramMemory {
    image: Program,
    cells: Vec<InstructionWord>,
    loaded: bool,
}

impl ProgramMemory {
    /// Create program memory for an image. The cells stay zeroed until
    /// [`load`](Self::load) is called.
    pub fn new(image: Program) -> Result<Self, ProgramError> {
        image.validate()?;
        Ok(Self {
            image,
            cells: vec![0; PROGRAM_MEMORY_SIZE],
            loaded: false,
        })
    }

    /// Write the image into memory. Idempotent.
    pub fn load(&mut self) {
        if self.loaded {
            return;
        }
        self.cells[..self.image.words.len()].copy_from_slice(&self.image.words);
        self.loaded = true;
        log::debug!("program memory loaded with {} words", self.image.len());
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Read the instruction at `address`. Addresses outside the memory read
    /// as the all-zero NOP word.
    #[inline]
    pub fn read(&self, address: u8) -> InstructionWord {
        self.cells.get(address as usize).copied().unwrap_or(0)
    }

    /// Name of the subroutine containing `address`.
    pub fn subroutine_name(&self, address: u8) -> &str {
        self.image.subroutine_name(u16::from(address))
    }

    /// The image this memory was created from.
    pub fn image(&self) -> &Program {
        &self.image
    }
}

impl std::fmt::Debug for ProgramMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramMemory")
            .field("words", &self.image.len())
            .field("subroutines", &self.image.subroutines.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

/// Errors raised when building program memory from an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("program size {size} exceeds available space {available}")]
    TooLarge { size: usize, available: usize },

    #[error("subroutine `{name}` has invalid range {start}..{end}")]
    InvalidRange { name: String, start: u16, end: u16 },

    #[error("subroutines `{first}` and `{second}` overlap")]
    OverlappingRanges { first: String, second: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled() -> Program {
        Program::new(vec![0x07_02_00, 0, 0x09_00_00])
            .with_subroutine("RESET_vect", 0, 2)
            .with_subroutine("main", 2, 3)
    }

    #[test]
    fn test_read_before_load_is_zero() {
        let mem = ProgramMemory::new(labelled()).unwrap();
        assert!(!mem.is_loaded());
        assert_eq!(mem.read(0), 0);
    }

    #[test]
    fn test_load_and_read() {
        let mut mem = ProgramMemory::new(labelled()).unwrap();
        mem.load();
        assert_eq!(mem.read(0), 0x07_02_00);
        assert_eq!(mem.read(2), 0x09_00_00);
        assert_eq!(mem.read(200), 0);
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut mem = ProgramMemory::new(labelled()).unwrap();
        mem.load();
        mem.cells[0] = 0x01_01_01;
        mem.load();
        assert_eq!(mem.read(0), 0x01_01_01);
    }

    #[test]
    fn test_image_is_kept_for_listing() {
        let mut mem = ProgramMemory::new(labelled()).unwrap();
        mem.load();
        assert_eq!(mem.image(), &labelled());
    }

    #[test]
    fn test_subroutine_name() {
        let mem = ProgramMemory::new(labelled()).unwrap();
        assert_eq!(mem.subroutine_name(0), "RESET_vect");
        assert_eq!(mem.subroutine_name(1), "RESET_vect");
        assert_eq!(mem.subroutine_name(2), "main");
        assert_eq!(mem.subroutine_name(3), UNKNOWN_SUBROUTINE);
    }

    #[test]
    fn test_program_too_large() {
        let program = Program::new(vec![0; PROGRAM_MEMORY_SIZE + 1]);
        assert!(matches!(
            ProgramMemory::new(program),
            Err(ProgramError::TooLarge { size: 257, .. })
        ));
    }

    #[test]
    fn test_full_program_fits() {
        let program = Program::new(vec![0x01_00_01; PROGRAM_MEMORY_SIZE]);
        let mut mem = ProgramMemory::new(program).unwrap();
        mem.load();
        assert_eq!(mem.read(255), 0x01_00_01);
    }

    #[test]
    fn test_overlapping_subroutines_rejected() {
        let program = Program::new(vec![0; 8])
            .with_subroutine("a", 0, 4)
            .with_subroutine("b", 3, 6);
        assert_eq!(
            program.validate(),
            Err(ProgramError::OverlappingRanges { first: "a".into(), second: "b".into() })
        );
    }

    #[test]
    fn test_empty_range_rejected() {
        let program = Program::new(vec![]).with_subroutine("a", 4, 4);
        assert!(matches!(program.validate(), Err(ProgramError::InvalidRange { .. })));
    }
}
