//! Scanner session: decoded QR codes arrive as lines on an input stream.
//!
//! Plain lines are codes. Lines starting with `:` are console commands.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::{CheckinBackend, CheckinConsole};
use crate::models::MealField;

const HELP: &str = "\
Scan a code, or use:
  :search <email>   look up by email
  :toggle <field>   flip a meal checkbox (d1Snack, d1Dinner, d1Cookies, d2Breakfast, d2Lunch, d2Dinner)
  :submit           save the checkboxes
  :show             show the current record
  :pause / :resume  stop or restart accepting scans
  :quit             leave";

/// One line of scanner input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Code(String),
    Search(String),
    Toggle(MealField),
    Submit,
    Show,
    Pause,
    Resume,
    Help,
    Quit,
}

impl WatchCommand {
    /// Parse a line; blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(command) = line.strip_prefix(':') else {
            return Ok(Some(WatchCommand::Code(line.to_string())));
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        let parsed = match name {
            "search" if !arg.is_empty() => WatchCommand::Search(arg.to_string()),
            "search" => return Err("Usage: :search <email>".to_string()),
            "toggle" => WatchCommand::Toggle(arg.parse()?),
            "submit" => WatchCommand::Submit,
            "show" => WatchCommand::Show,
            "pause" => WatchCommand::Pause,
            "resume" => WatchCommand::Resume,
            "help" => WatchCommand::Help,
            "quit" | "exit" => WatchCommand::Quit,
            other => return Err(format!("Unknown command :{}", other)),
        };
        Ok(Some(parsed))
    }
}

/// Pause state of the scanner. Every accepted scan pauses it.
#[derive(Debug, Default)]
pub struct ScanSession {
    paused: bool,
}

impl ScanSession {
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Accept a code unless paused; accepting pauses.
    pub fn accept(&mut self) -> bool {
        if self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}

/// Drive the console from `input` until it ends or `:quit`, writing every
/// message to `output`. The input is consumed and dropped on return.
pub async fn run_watch<B, R, W>(
    console: &mut CheckinConsole<B>,
    input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    B: CheckinBackend,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = ScanSession::default();
    let mut lines = input.lines();

    writeln!(output, "Scanner ready. Type :help for commands.")?;
    tracing::info!("Scanner session started");

    while let Some(line) = lines.next_line().await? {
        let command = match WatchCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(output, "{}", msg)?;
                continue;
            }
        };

        match command {
            WatchCommand::Code(code) => {
                if !session.accept() {
                    writeln!(output, "Scanner paused, :resume to scan again")?;
                    continue;
                }
                writeln!(output, "Scanned {}", code)?;
                let outcome = console.lookup_scanned(&code).await;
                writeln!(output, "{}", outcome.message())?;
                if let Some(current) = console.current() {
                    write!(output, "{}", current.render())?;
                }
            }
            WatchCommand::Search(email) => {
                let outcome = console.lookup_email(&email).await;
                match console.error() {
                    Some(err) => writeln!(output, "Error: {}", err)?,
                    None => writeln!(output, "{}", outcome.message())?,
                }
                if let Some(current) = console.current() {
                    write!(output, "{}", current.render())?;
                }
            }
            WatchCommand::Toggle(field) => match console.toggle(field) {
                Some(value) => writeln!(output, "{} {}", field.label(), value)?,
                None => writeln!(output, "No user info")?,
            },
            WatchCommand::Submit => {
                let outcome = console.submit().await;
                writeln!(output, "{}", outcome.message())?;
            }
            WatchCommand::Show => match console.current() {
                Some(current) => write!(output, "{}", current.render())?,
                None => writeln!(output, "No user info")?,
            },
            WatchCommand::Pause => {
                session.pause();
                writeln!(output, "Scanner paused")?;
            }
            WatchCommand::Resume => {
                session.resume();
                writeln!(output, "Scanner resumed")?;
            }
            WatchCommand::Help => writeln!(output, "{}", HELP)?,
            WatchCommand::Quit => break,
        }
    }

    tracing::info!(paused = session.is_paused(), "Scanner session released");
    writeln!(output, "Scanner closed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::{record, FakeBackend};
    use super::*;
    use crate::models::AppStatus;

    #[test]
    fn test_parse_lines() {
        assert_eq!(WatchCommand::parse("   "), Ok(None));
        assert_eq!(
            WatchCommand::parse(" uid-123 "),
            Ok(Some(WatchCommand::Code("uid-123".to_string())))
        );
        assert_eq!(
            WatchCommand::parse(":search  ada@uic.edu"),
            Ok(Some(WatchCommand::Search("ada@uic.edu".to_string())))
        );
        assert_eq!(
            WatchCommand::parse(":toggle d2Breakfast"),
            Ok(Some(WatchCommand::Toggle(MealField::D2Breakfast)))
        );
        assert_eq!(WatchCommand::parse(":exit"), Ok(Some(WatchCommand::Quit)));
        assert!(WatchCommand::parse(":search").is_err());
        assert!(WatchCommand::parse(":toggle lunch").is_err());
        assert!(WatchCommand::parse(":dance").is_err());
    }

    #[test]
    fn test_scan_pauses_until_resume() {
        let mut session = ScanSession::default();
        assert!(session.accept());
        assert!(session.is_paused());
        assert!(!session.accept());
        session.resume();
        assert!(session.accept());
    }

    #[tokio::test]
    async fn test_watch_session_flow() {
        let backend = FakeBackend::with_record(
            "uid-1",
            record("ada@uic.edu", AppStatus::FullyAccepted),
        );
        let mut console = CheckinConsole::new(backend);
        let input: &[u8] = b"uid-1\nuid-1\n:toggle d1Snack\n:submit\n:search ada@purdue.edu\n:resume\nnobody\n:quit\nuid-1\n";
        let mut output = Vec::new();

        run_watch(&mut console, input, &mut output).await.unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("Scanned uid-1\nada@uic.edu: fullyAccepted\nName: Ada Lovelace"));
        assert!(output.contains("Scanner paused, :resume to scan again"));
        assert!(output.contains("Day 1: Ate Snack? true"));
        assert!(output.contains("Updated Food data!"));
        assert!(output.contains("Error: Please enter full uic.edu email or gmail.com email"));
        assert!(output.contains("Scanned nobody\nUser does not exist"));
        assert!(output.ends_with("Scanner closed\n"));
        // nothing after :quit is read
        assert_eq!(output.matches("Scanned uid-1").count(), 1);
        assert!(console.current().is_none());
    }
}
