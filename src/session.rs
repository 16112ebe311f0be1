//! Interactive line-oriented session
//!
//! Reads one utterance per line, routes it, and writes the result. `exit` and
//! `quit` (any case, surrounding whitespace ignored) end the session without
//! touching the router, as does end of input. A failed request never ends the
//! session, and neither does a line that is not valid UTF-8: invalid bytes are
//! replaced with U+FFFD and the line is routed as usual.

use crate::routing::RequestRouter;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

const BANNER: &str = "MultiMind Agent is ready!\nType something (or type 'exit' to quit):\n";
const PROMPT: &str = "\nYou: ";
const GOODBYE: &str = "Goodbye! MultiMind Agent shutting down.\n";

/// How the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    ExitCommand,
    EndOfInput,
}

/// Summary returned when the session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub requests_routed: usize,
    pub requests_failed: usize,
    pub ended_by: SessionEnd,
}

/// True for the literal exit keywords, case-insensitive, ignoring surrounding whitespace
pub fn is_exit_command(line: &str) -> bool {
    let normalized = line.trim().to_lowercase();
    EXIT_COMMANDS.contains(&normalized.as_str())
}

/// Run the read-route-print loop until an exit command or end of input.
///
/// Only I/O errors on `reader` or `writer` are returned.
pub async fn run_session<R, W>(
    router: &RequestRouter,
    mut reader: R,
    writer: &mut W,
) -> std::io::Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(BANNER.as_bytes()).await?;

    let mut buf = Vec::new();
    let mut requests_routed = 0;
    let mut requests_failed = 0;

    let ended_by = loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let Some(line) = read_line_lossy(&mut reader, &mut buf).await? else {
            debug!("input closed");
            writer.write_all(b"\n").await?;
            break SessionEnd::EndOfInput;
        };

        if is_exit_command(&line) {
            break SessionEnd::ExitCommand;
        }
        if line.trim().is_empty() {
            continue;
        }

        let result = router.route(&line).await;
        requests_routed += 1;
        if !result.is_success() {
            requests_failed += 1;
        }

        writer
            .write_all(format!("Agent: {result}\n").as_bytes())
            .await?;
    };

    writer.write_all(GOODBYE.as_bytes()).await?;
    writer.flush().await?;

    info!(
        requests_routed,
        requests_failed,
        ended_by = ?ended_by,
        "session finished"
    );

    Ok(SessionSummary {
        requests_routed,
        requests_failed,
        ended_by,
    })
}

/// Read one line without its terminator, decoding invalid UTF-8 lossily.
/// Returns `None` at end of input.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    let line = match String::from_utf8(std::mem::take(buf)) {
        Ok(line) => line,
        Err(e) => {
            warn!("input line is not valid UTF-8, invalid bytes replaced");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("quit"));
        assert!(is_exit_command("  EXIT  "));
        assert!(is_exit_command("Quit\n"));
        assert!(is_exit_command("\teXiT"));
    }

    #[test]
    fn test_non_exit_commands() {
        assert!(!is_exit_command(""));
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command("please quit"));
        assert!(!is_exit_command("exits"));
        assert!(!is_exit_command("q"));
    }
}
