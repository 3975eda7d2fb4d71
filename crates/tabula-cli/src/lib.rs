pub mod command;
pub mod config;
pub mod error;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use tabula_sheet::Sheet;

use crate::command::Command;
use crate::config::Config;
use crate::error::CommandError;

/// Line-oriented shell driving a single sheet
#[derive(Debug, Default)]
pub struct Shell {
    sheet: Sheet,
    echo: bool,
    failed: usize,
}

impl Shell {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            ..Self::default()
        }
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Number of commands rejected so far
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Run one line of input
    ///
    /// A rejected command is reported on `out` as `error: <message>`; only failures to
    /// write output are returned.
    pub fn run_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<()> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            return Ok(());
        }

        if self.echo {
            writeln!(out, "> {}", line)?;
        }

        let result = line
            .parse::<Command>()
            .and_then(|command| command.execute(&mut self.sheet, out));

        match result {
            Ok(()) => Ok(()),
            Err(CommandError::Io(e)) => Err(e),
            Err(e) => {
                self.failed += 1;
                tracing::warn!("Command failed: {}: {}", line, e);
                writeln!(out, "error: {}", e)
            }
        }
    }

    /// Run every line of `input`, returning the number of commands processed
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<usize> {
        let mut processed = 0;
        for line in input.lines() {
            let line = line?;
            self.run_line(&line, out)?;
            processed += 1;
        }
        out.flush()?;
        Ok(processed)
    }
}

/// Run the shell with the given configuration
pub fn run(config: &Config) -> anyhow::Result<()> {
    let mut shell = Shell::new(config.echo);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let processed = match &config.script {
        Some(path) => {
            tracing::info!("Reading commands from {}", path.display());
            let file = File::open(path)?;
            shell.run(BufReader::new(file), &mut out)?
        }
        None => {
            tracing::info!("Reading commands from stdin");
            shell.run(io::stdin().lock(), &mut out)?
        }
    };

    tracing::info!(
        "Processed {} lines, {} commands failed",
        processed,
        shell.failed()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::Size;

    fn session(script: &str) -> (Shell, String) {
        let mut shell = Shell::new(false);
        let mut out = Vec::new();
        shell.run(script.as_bytes(), &mut out).unwrap();
        (shell, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_scripted_session() {
        let script = "\
# prices
set A1 10
set A2 =A1*1.5
set B1 'total
set B2 =A1+A2

values
texts
size
";
        let (shell, out) = session(script);

        assert_eq!(
            out,
            "10\ttotal\n15\t25\n10\t'total\n=A1*1.5\t=A1+A2\n2 2\n"
        );
        assert_eq!(shell.failed(), 0);
    }

    #[test]
    fn test_errors_do_not_stop_the_shell() {
        let script = "\
set A1 =B1
set B1 =A1
set C1 =1+
bogus
get B1
";
        let (shell, out) = session(script);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("error: Circular dependency"));
        assert!(lines[1].starts_with("error: Formula error"));
        assert_eq!(lines[2], "error: Unknown command: bogus");
        assert_eq!(
            lines[3],
            r#"{"position":"B1","text":"","value":"0","references":[]}"#
        );
        assert_eq!(shell.failed(), 3);
        assert_eq!(shell.sheet().printable_size(), Size::new(1, 3));
    }

    #[test]
    fn test_indented_comments_are_skipped() {
        let (shell, out) = session("  # note\n\t# tabbed\nset A1 =1+1\nvalues\n");
        assert_eq!(out, "2\n");
        assert_eq!(shell.failed(), 0);
    }

    #[test]
    fn test_writer_failure_stops_the_shell() {
        struct ClosedPipe;

        impl Write for ClosedPipe {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut shell = Shell::new(false);
        let err = shell.run_line("get A1", &mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(shell.failed(), 0);
    }

    #[test]
    fn test_echo() {
        let mut shell = Shell::new(true);
        let mut out = Vec::new();
        shell.run("size\n".as_bytes(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "> size\n0 0\n");
    }

    #[test]
    fn test_clear_shrinks_printed_grid() {
        let (_, out) = session("set A1 x\nset C3 y\nclear C3\nvalues\n");
        assert_eq!(out, "x\n");
    }
}
