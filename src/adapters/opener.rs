use crate::domain::ports::UriOpener;
use crate::utils::error::Result;
use std::process::{Command, Stdio};

/// Opens URIs with the desktop's default handler.
#[derive(Debug, Clone)]
pub struct SystemOpener {
    program: String,
    args: Vec<String>,
}

impl Default for SystemOpener {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::with_program("open", &[])
        } else if cfg!(target_os = "windows") {
            Self::with_program("cmd", &["/C", "start", ""])
        } else {
            Self::with_program("xdg-open", &[])
        }
    }
}

impl SystemOpener {
    /// Runs `program [args..] <uri>` instead of the platform handler.
    pub fn with_program(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl UriOpener for SystemOpener {
    fn open(&self, uri: &str) -> Result<()> {
        tracing::debug!("🔗 Handing mailto link to {}", self.program);
        Command::new(&self.program)
            .args(&self.args)
            .arg(uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

/// Headless hosts: print the URI so the user can open it themselves.
#[derive(Debug, Clone, Default)]
pub struct StdoutOpener;

impl UriOpener for StdoutOpener {
    fn open(&self, uri: &str) -> Result<()> {
        println!("✉️  Open this link to send your details by email:\n{}", uri);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::RelayError;

    #[test]
    fn test_platform_default_program() {
        let opener = SystemOpener::default();
        if cfg!(target_os = "linux") {
            assert_eq!(opener.program(), "xdg-open");
        }
        assert!(!opener.program().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_opener_spawns_program() {
        let opener = SystemOpener::with_program("true", &[]);
        assert!(opener.open("mailto:ops@finaforte.nl").is_ok());
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let opener = SystemOpener::with_program("lead-relay-no-such-opener", &[]);
        let err = opener.open("mailto:ops@finaforte.nl").unwrap_err();
        assert!(matches!(err, RelayError::IoError(_)));
    }
}
