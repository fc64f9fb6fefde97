//! Program image file format.
//!
//! A `.hex` image is a simple text format:
//! - One instruction word per line, as six hex digits
//! - `@name start end` lines declare a subroutine range
//! - Text after `;` is a comment
//! - Blank lines are ignored

use crate::memory::program::{Program, ProgramError, Subroutine};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Parse image text.
pub fn parse_image(text: &str) -> Result<Program, ImageError> {
    let mut program = Program::default();

    for (line_num, line) in text.lines().enumerate() {
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() {
            continue;
        }

        if let Some(decl) = trimmed.strip_prefix('@') {
            program.subroutines.push(parse_subroutine(decl, line_num + 1)?);
            continue;
        }

        let word = u32::from_str_radix(trimmed, 16)
            .ok()
            .filter(|w| trimmed.len() <= 6 && *w <= 0xFF_FFFF)
            .ok_or_else(|| ImageError::ParseError {
                line: line_num + 1,
                message: format!("expected a 24-bit hex word, found `{}`", trimmed),
            })?;
        program.words.push(word);
    }

    program.validate()?;
    Ok(program)
}

fn parse_subroutine(decl: &str, line: usize) -> Result<Subroutine, ImageError> {
    let parts: Vec<&str> = decl.split_whitespace().collect();
    let parse_addr = |s: &str| {
        s.parse::<u16>().map_err(|_| ImageError::ParseError {
            line,
            message: format!("invalid address `{}`", s),
        })
    };
    match parts.as_slice() {
        [name, start, end] => Ok(Subroutine::new(*name, parse_addr(start)?, parse_addr(end)?)),
        _ => Err(ImageError::ParseError {
            line,
            message: "expected `@name start end`".into(),
        }),
    }
}

/// Render a program as image text.
pub fn render_image(program: &Program) -> String {
    let mut out = String::new();
    out.push_str("; cu8 program image\n");
    out.push_str(&format!("; {} words\n", program.len()));
    for sub in &program.subroutines {
        out.push_str(&format!("@{} {} {}\n", sub.name, sub.start, sub.end));
    }
    out.push('\n');
    for (i, word) in program.words.iter().enumerate() {
        out.push_str(&format!("{:06x} ; {:03}\n", word & 0xFF_FFFF, i));
    }
    out
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Program, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_image(&text)
}

/// Save a program to an image file.
pub fn save_image<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), render_image(program))?;
    Ok(())
}

/// Pick where to write the image assembled from `source`.
///
/// Without an explicit `output` the source path gets a `.hex` extension.
/// A target equal to the source is refused.
pub fn image_path_for(source: &Path, output: Option<&Path>) -> Result<PathBuf, ImageError> {
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => source.with_extension("hex"),
    };
    if target == source {
        return Err(ImageError::WouldOverwriteSource(target));
    }
    Ok(target)
}

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error("refusing to overwrite source file {}", .0.display())]
    WouldOverwriteSource(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::sample;

    #[test]
    fn test_parse_image() {
        let text = "; demo\n@main 0 2\n010f07\n090000 ; ret\n";
        let program = parse_image(text).unwrap();
        assert_eq!(program.words, vec![0x01_0F_07, 0x09_00_00]);
        assert_eq!(program.subroutine_name(1), "main");
    }

    #[test]
    fn test_sample_survives_rendering() {
        let program = sample::blink();
        assert_eq!(parse_image(&render_image(&program)).unwrap(), program);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_image("zzz"), Err(ImageError::ParseError { line: 1, .. })));
        assert!(matches!(parse_image("\n1000000"), Err(ImageError::ParseError { line: 2, .. })));
        assert!(matches!(parse_image("@main 0"), Err(ImageError::ParseError { .. })));
        assert!(matches!(parse_image("@a 0 4\n@b 2 6"), Err(ImageError::Program(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("cu8-image-{}.hex", std::process::id()));
        save_image(&path, &Program::new(vec![0x08_02_00, 0, 0x09_00_00])).unwrap();
        let program = load_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(program.words, vec![0x08_02_00, 0, 0x09_00_00]);
    }

    #[test]
    fn test_image_path_defaults_to_hex_extension() {
        let path = image_path_for(Path::new("demos/blink.asm"), None).unwrap();
        assert_eq!(path, PathBuf::from("demos/blink.hex"));

        let path = image_path_for(Path::new("p/blink.s"), None).unwrap();
        assert_eq!(path, PathBuf::from("p/blink.hex"));

        let path = image_path_for(Path::new("blink"), None).unwrap();
        assert_eq!(path, PathBuf::from("blink.hex"));
    }

    #[test]
    fn test_image_path_explicit_output() {
        let path = image_path_for(Path::new("blink.s"), Some(Path::new("out/led.hex"))).unwrap();
        assert_eq!(path, PathBuf::from("out/led.hex"));
    }

    #[test]
    fn test_image_path_never_overwrites_source() {
        assert!(matches!(
            image_path_for(Path::new("prog.hex"), None),
            Err(ImageError::WouldOverwriteSource(_))
        ));
        assert!(matches!(
            image_path_for(Path::new("prog.s"), Some(Path::new("prog.s"))),
            Err(ImageError::WouldOverwriteSource(_))
        ));
    }
}
