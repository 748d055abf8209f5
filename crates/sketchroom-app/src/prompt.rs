//! Interactive room selection.

use sketchroom_core::room::RoomName;
use std::io::{self, BufRead, Write};

/// Ask for a room name until a non-empty one is entered.
///
/// Returns `None` when the input ends first.
pub fn prompt_room(mut input: impl BufRead, mut output: impl Write) -> io::Result<Option<RoomName>> {
    let mut line = String::new();
    loop {
        write!(output, "Room name: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match RoomName::parse(&line) {
            Ok(room) => return Ok(Some(room)),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}
