//! External SSDV image decoder.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ImageDecodeError;

/// Turns a file of concatenated SSDV packets into a JPEG.
pub trait ImageDecoder: Send {
    fn decode(&self, input: &Path, output: &Path) -> Result<(), ImageDecodeError>;
}

impl<D: ImageDecoder + Sync + ?Sized> ImageDecoder for &D {
    fn decode(&self, input: &Path, output: &Path) -> Result<(), ImageDecodeError> {
        (**self).decode(input, output)
    }
}

impl<D: ImageDecoder + ?Sized> ImageDecoder for Box<D> {
    fn decode(&self, input: &Path, output: &Path) -> Result<(), ImageDecodeError> {
        (**self).decode(input, output)
    }
}

/// Runs `<program> -d <input> <output>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdvCommand {
    program: PathBuf,
}

impl SsdvCommand {
    pub const DEFAULT_PROGRAM: &'static str = "ssdv";

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for SsdvCommand {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl ImageDecoder for SsdvCommand {
    fn decode(&self, input: &Path, output: &Path) -> Result<(), ImageDecodeError> {
        tracing::debug!(
            program = %self.program.display(),
            input = %input.display(),
            output = %output.display(),
            "running image decoder"
        );

        let status = Command::new(&self.program)
            .arg("-d")
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ImageDecodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ImageDecodeError::Failed {
                program: self.program.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = SsdvCommand::new(dir.path().join("no-such-ssdv"));
        let err = decoder
            .decode(&dir.path().join("in.bin"), &dir.path().join("out.jpg"))
            .unwrap_err();
        assert!(matches!(err, ImageDecodeError::Spawn { .. }));
        assert!(err.to_string().contains("no-such-ssdv"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = SsdvCommand::new("false");
        let err = decoder
            .decode(&dir.path().join("in.bin"), &dir.path().join("out.jpg"))
            .unwrap_err();
        assert!(matches!(err, ImageDecodeError::Failed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = SsdvCommand::new("true");
        decoder
            .decode(&dir.path().join("in.bin"), &dir.path().join("out.jpg"))
            .unwrap();
    }

    #[test]
    fn default_program() {
        assert_eq!(SsdvCommand::default().program(), Path::new("ssdv"));
    }
}
