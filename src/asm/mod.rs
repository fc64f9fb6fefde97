//! Assembler, disassembler and image format for cu8 programs.
//!
//! This module provides:
//! - A two-pass assembler (text → program image)
//! - A disassembler (program image → readable text)
//! - The `.hex` program image file format

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use image::{load_image, save_image, parse_image, render_image, image_path_for, ImageError};
