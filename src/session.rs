//! Remote session abstraction
//!
//! A session is the borrowed, externally owned channel to one host. The
//! staging core only ever runs commands and uploads files through it; opening,
//! authenticating and closing belong to the [`SessionProvider`].

use crate::error::TransportError;
use std::path::Path;
use std::sync::Arc;

/// Decoded result of a command run through a [`Session`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout split on `\n`, lossily decoded
    pub lines: Vec<String>,
    /// stderr, lossily decoded
    pub stderr: String,
    /// Exit status; `-1` when the process was killed by a signal
    pub exit_code: i32,
}

impl CommandOutput {
    /// Build from raw process output
    ///
    /// Undecodable bytes become U+FFFD instead of failing the call. A trailing
    /// newline does not yield an empty last line.
    pub fn from_raw(stdout: &[u8], stderr: &[u8], exit_code: i32) -> Self {
        Self {
            lines: decode_lines(stdout),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            exit_code,
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Lossily decode `raw` and split into lines, dropping trailing empty lines
pub fn decode_lines(raw: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(raw);
    let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Quote `s` for a POSIX shell
pub fn shell_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Command execution and file upload on one remote host
///
/// Implementations must be shareable: the same session may be borrowed by
/// several staged files, possibly from several threads.
pub trait Session: Send + Sync {
    /// Host this session talks to (for diagnostics)
    fn host(&self) -> &str;

    /// Run `command` through the remote shell
    ///
    /// A non-zero exit status is reported in [`CommandOutput::exit_code`],
    /// not as an error. Errors mean the command could not be run at all.
    fn run(&self, command: &str) -> Result<CommandOutput, TransportError>;

    /// Run `command`, failing on non-zero exit
    fn run_checked(&self, command: &str) -> Result<CommandOutput, TransportError> {
        let output = self.run(command)?;
        if output.success() {
            Ok(output)
        } else {
            Err(TransportError::CommandFailed {
                command: command.to_string(),
                code: output.exit_code,
                stderr: output.stderr.trim_end().to_string(),
            })
        }
    }

    /// Upload `local` so that it ends up at `remote`
    fn put_file(&self, local: &Path, remote: &str) -> Result<(), TransportError>;
}

/// Source of sessions keyed by host
pub trait SessionProvider {
    /// Obtain a session to `host`, reusing an existing one if possible
    fn open(&self, host: &str) -> Result<Arc<dyn Session>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"a\nb\n", &["a", "b"])]
    #[case(b"a\nb", &["a", "b"])]
    #[case(b"a\n\n\n", &["a"])]
    #[case(b"", &[])]
    #[case(b"\na", &["", "a"])]
    fn test_decode_lines(#[case] raw: &[u8], #[case] expected: &[&str]) {
        assert_eq!(decode_lines(raw), expected);
    }

    #[test]
    fn test_decode_lines_is_lossy() {
        let lines = decode_lines(b"name=\xff\xfe.bin\n");
        assert_eq!(lines, vec!["name=\u{fffd}\u{fffd}.bin".to_string()]);
    }

    #[rstest]
    #[case("/data/a.bin", "'/data/a.bin'")]
    #[case("/data/with space", "'/data/with space'")]
    #[case("it's", "'it'\\''s'")]
    #[case("$(rm -rf /)", "'$(rm -rf /)'")]
    fn test_shell_quote(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(shell_quote(input), expected);
    }

    struct ExitSession(i32);

    impl Session for ExitSession {
        fn host(&self) -> &str {
            "fake"
        }

        fn run(&self, _command: &str) -> Result<CommandOutput, TransportError> {
            Ok(CommandOutput::from_raw(b"", b"boom\n", self.0))
        }

        fn put_file(&self, _local: &Path, _remote: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn test_run_checked_fails_on_nonzero_exit() {
        let err = ExitSession(2).run_checked("false").unwrap_err();
        match err {
            TransportError::CommandFailed {
                command,
                code,
                stderr,
            } => {
                assert_eq!(command, "false");
                assert_eq!(code, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ExitSession(0).run_checked("true").is_ok());
    }
}
