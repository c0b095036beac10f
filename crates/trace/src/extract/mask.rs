/// Replace `//` and `/* */` comments in C/C++ source with spaces, keeping
/// newlines and byte offsets. String and character literals are skipped over
/// but left intact, since quoted includes live inside them.
pub(crate) fn mask_comments(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let mut i = 0;
    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match (bytes[i], next) {
            (b'/', Some(b'/')) => {
                let end = line_end(&bytes, i);
                blank(&mut bytes, i, end);
                i = end;
            }
            (b'/', Some(b'*')) => {
                let end = find(&bytes, i + 2, b"*/").map_or(bytes.len(), |pos| pos + 2);
                blank(&mut bytes, i, end);
                i = end;
            }
            (b'"', _) => i = skip_string(&bytes, i, b'"'),
            (b'\'', _) => i = skip_string(&bytes, i, b'\''),
            _ => i += 1,
        }
    }
    // Only whole ASCII-delimited ranges are blanked, so this never fails.
    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}

fn blank(bytes: &mut [u8], start: usize, end: usize) {
    for b in &mut bytes[start..end] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |pos| from + pos)
}

/// Index just past the closing quote of the literal opened at `start`; an
/// unterminated literal ends at the line break.
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}
