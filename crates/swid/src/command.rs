//! Line grammar for the UART: `KEYDOWN<c>`, `KEYUP<c>`, `DEBUG<text>`,
//! `PINPUT<...>`, one per newline-terminated line. Grounded on the
//! original `swid.c`'s `strstr`-based dispatch in its serial read loop,
//! reworked into a single parse function returning a typed command instead
//! of re-scanning the line four times.

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    KeyDown(u8),
    KeyUp(u8),
    Debug(&'a str),
    PInput(&'a str),
}

const KEYDOWN: &str = "KEYDOWN";
const KEYUP: &str = "KEYUP";
const DEBUG: &str = "DEBUG";
const PINPUT: &str = "PINPUT";

/// Parse one already newline-stripped line. Unrecognised lines are `None`,
/// matching the original's silent drop of anything that doesn't match one
/// of the four known prefixes.
pub fn parse(line: &str) -> Option<Command<'_>> {
    if let Some(rest) = line.strip_prefix(KEYDOWN) {
        return Some(Command::KeyDown(*rest.as_bytes().first()?));
    }
    if let Some(rest) = line.strip_prefix(KEYUP) {
        return Some(Command::KeyUp(*rest.as_bytes().first()?));
    }
    if let Some(rest) = line.strip_prefix(DEBUG) {
        return Some(Command::Debug(rest));
    }
    if let Some(rest) = line.strip_prefix(PINPUT) {
        return Some(Command::PInput(rest));
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_keydown_with_its_key_byte() {
        assert_eq!(parse("KEYDOWNA"), Some(Command::KeyDown(b'A')));
    }

    #[test]
    fn parses_keyup_with_its_key_byte() {
        assert_eq!(parse("KEYUPA"), Some(Command::KeyUp(b'A')));
    }

    #[test]
    fn parses_debug_text() {
        assert_eq!(parse("DEBUGhello world"), Some(Command::Debug("hello world")));
    }

    #[test]
    fn parses_pinput_payload() {
        assert_eq!(parse("PINPUT01020304"), Some(Command::PInput("01020304")));
    }

    #[test]
    fn truncated_keydown_with_no_key_byte_is_unrecognised() {
        assert_eq!(parse("KEYDOWN"), None);
    }

    #[test]
    fn unrecognised_line_is_none() {
        assert_eq!(parse("GARBAGE"), None);
    }
}
