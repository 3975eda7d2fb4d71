use std::io::Write;
use std::str::FromStr;

use tabula_core::Position;
use tabula_sheet::Sheet;

use crate::error::CommandError;

/// One line of shell input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Write raw text into a cell; the text is everything after the position
    Set { pos: Position, text: String },
    /// Print a cell snapshot as JSON, or `null`
    Get(Position),
    Clear(Position),
    /// Print the printable size as `rows cols`
    Size,
    Values,
    Texts,
}

impl Command {
    /// Run the command against `sheet`, writing any output to `out`
    pub fn execute<W: Write>(&self, sheet: &mut Sheet, out: &mut W) -> Result<(), CommandError> {
        match self {
            Command::Set { pos, text } => sheet.set_cell(*pos, text.as_str())?,
            Command::Get(pos) => {
                let snapshot = sheet.get_cell(*pos)?.map(|cell| cell.snapshot());
                serde_json::to_writer(&mut *out, &snapshot)?;
                writeln!(out)?;
            }
            Command::Clear(pos) => sheet.clear_cell(*pos)?,
            Command::Size => {
                let size = sheet.printable_size();
                writeln!(out, "{} {}", size.rows, size.cols)?;
            }
            Command::Values => sheet.print_values(out)?,
            Command::Texts => sheet.print_texts(out)?,
        }
        Ok(())
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));

        match name {
            "set" => {
                let (pos, text) = rest.split_once(' ').unwrap_or((rest, ""));
                Ok(Command::Set {
                    pos: position_argument("set", pos)?,
                    text: text.to_string(),
                })
            }
            "get" => Ok(Command::Get(position_argument("get", rest.trim())?)),
            "clear" => Ok(Command::Clear(position_argument("clear", rest.trim())?)),
            "size" => no_argument("size", rest).map(|_| Command::Size),
            "values" => no_argument("values", rest).map(|_| Command::Values),
            "texts" => no_argument("texts", rest).map(|_| Command::Texts),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn position_argument(command: &'static str, arg: &str) -> Result<Position, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            expected: "a position",
        });
    }
    Ok(arg.parse()?)
}

fn no_argument(command: &'static str, rest: &str) -> Result<(), CommandError> {
    let rest = rest.trim();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CommandError::UnexpectedArgument {
            command,
            argument: rest.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_parse_set_keeps_text_verbatim() {
        assert_eq!(
            parse("set B2 = 1 +  A1 ").unwrap(),
            Command::Set {
                pos: Position::new(1, 1),
                text: "= 1 +  A1 ".to_string(),
            }
        );
        assert_eq!(
            parse("set A1").unwrap(),
            Command::Set {
                pos: Position::new(0, 0),
                text: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("get C3").unwrap(), Command::Get(Position::new(2, 2)));
        assert_eq!(parse("clear A1 ").unwrap(), Command::Clear(Position::new(0, 0)));
        assert_eq!(parse("size").unwrap(), Command::Size);
        assert_eq!(parse("values").unwrap(), Command::Values);
        assert_eq!(parse("texts").unwrap(), Command::Texts);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("frobnicate"), Err(CommandError::Unknown(name)) if name == "frobnicate"));
        assert!(matches!(parse("get"), Err(CommandError::MissingArgument { command: "get", .. })));
        assert!(matches!(parse("set a1 5"), Err(CommandError::Position(_))));
        assert!(matches!(parse("size 3"), Err(CommandError::UnexpectedArgument { .. })));
    }

    #[test]
    fn test_execute_get_and_size() {
        let mut sheet = Sheet::new();
        let mut out = Vec::new();

        parse("get A1").unwrap().execute(&mut sheet, &mut out).unwrap();
        parse("set B1 =A1+2").unwrap().execute(&mut sheet, &mut out).unwrap();
        parse("get B1").unwrap().execute(&mut sheet, &mut out).unwrap();
        parse("size").unwrap().execute(&mut sheet, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "null\n{\"position\":\"B1\",\"text\":\"=A1+2\",\"value\":\"2\",\"references\":[\"A1\"]}\n1 2\n"
        );
    }

    #[test]
    fn test_execute_surfaces_sheet_errors() {
        let mut sheet = Sheet::new();
        let mut out = Vec::new();

        let result = parse("set A1 =A1").unwrap().execute(&mut sheet, &mut out);
        assert!(matches!(result, Err(CommandError::Sheet(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_execute_get_reports_writer_failure_as_io() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "x").unwrap();

        for line in ["get A1", "get B1"] {
            let result = parse(line).unwrap().execute(&mut sheet, &mut ClosedPipe);
            assert!(
                matches!(&result, Err(CommandError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe),
                "{:?}",
                result
            );
        }
    }
}
