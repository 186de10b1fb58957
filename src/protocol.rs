use std::path::Path;

use crate::{Error, SourceItem};

/// Parses an ASVspoof-style protocol listing.
///
/// Each non-blank line is whitespace separated: the second column names the
/// audio file (without extension) and the last column is its label.
pub fn parse_protocol(
    text: &str,
    audio_dir: &Path,
    extension: &str,
) -> Result<Vec<SourceItem>, Error> {
    let mut items = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            [_] => {
                return Err(Error::Protocol {
                    line: n + 1,
                    reason: format!("expected at least two columns, got {line:?}"),
                })
            }
            [_, file_id, rest @ ..] => {
                let label = rest.last().copied().unwrap_or(*file_id);
                let name = if extension.is_empty() {
                    file_id.to_string()
                } else {
                    format!("{file_id}.{extension}")
                };
                items.push(SourceItem::new(audio_dir.join(name), label));
            }
        }
    }
    Ok(items)
}

/// Reads and parses a protocol file from disk.
pub fn read_protocol<P: AsRef<Path>>(
    path: P,
    audio_dir: &Path,
    extension: &str,
) -> Result<Vec<SourceItem>, Error> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let items = parse_protocol(&text, audio_dir, extension)?;
    log::info!("{}: {} audio files", path.as_ref().display(), items.len());
    Ok(items)
}
