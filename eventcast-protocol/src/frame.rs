//! SSE record encoding

use crate::command::Command;

/// Comment frame written on each sweep tick
///
/// Comment lines start with `:`, so intermediaries and consumers can tell
/// this apart from any data-bearing record.
pub const KEEPALIVE_FRAME: &[u8] = b": keepalive\n\n";

/// Encode a command as one SSE record
///
/// Multi-line `data` payloads become one `data:` line per source line, so the
/// consumer reassembles the original text. A command with none of the
/// optional fields set encodes to a single blank line; that degenerate record
/// is valid on the wire and delivered like any other.
pub fn encode(command: &Command) -> Vec<u8> {
    let mut frame = String::new();

    if let Some(event) = &command.event {
        frame.push_str("event: ");
        frame.push_str(event);
        frame.push('\n');
    }

    if let Some(data) = &command.data {
        for line in data.split('\n') {
            frame.push_str("data: ");
            frame.push_str(line);
            frame.push('\n');
        }
    }

    if let Some(id) = &command.id {
        frame.push_str("id: ");
        frame.push_str(id);
        frame.push('\n');
    }

    // Record separator
    frame.push('\n');
    frame.into_bytes()
}
