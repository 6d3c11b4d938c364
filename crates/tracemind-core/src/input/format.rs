//! Coarse classification of raw input bytes.

use crate::config::InputFormat;

/// Header keywords that mark a delimited first line as a log export.
const HEADER_KEYWORDS: &[&str] = &["timestamp", "severity", "message", "textpayload"];

/// Classify raw input by its first significant byte and first-line shape.
///
/// Deterministic in its input: the same bytes always give the same format.
pub fn detect_input_format(content: &[u8]) -> InputFormat {
    let start = match content.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(i) => i,
        None => return InputFormat::Raw,
    };
    let content = &content[start..];

    match content[0] {
        b'[' => return InputFormat::JsonArray,
        b'{' => return InputFormat::Json,
        _ => {}
    }

    let Some(newline) = content.iter().position(|&b| b == b'\n') else {
        return InputFormat::Raw;
    };
    let first_line = &content[..newline];

    let tabs = first_line.iter().filter(|&&b| b == b'\t').count();
    let commas = first_line.iter().filter(|&&b| b == b',').count();
    let has_header = has_header_keyword(first_line);

    if (tabs >= 2 || (tabs > 0 && tabs >= commas)) && has_header {
        InputFormat::Tsv
    } else if commas >= 2 && has_header {
        InputFormat::Csv
    } else {
        InputFormat::Raw
    }
}

fn has_header_keyword(line: &[u8]) -> bool {
    let lower = String::from_utf8_lossy(line).to_ascii_lowercase();
    HEADER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Whether a format carries records rather than free text.
pub fn is_structured(format: InputFormat) -> bool {
    matches!(
        format,
        InputFormat::Json | InputFormat::JsonArray | InputFormat::Csv | InputFormat::Tsv
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shapes() {
        assert_eq!(detect_input_format(b"  \n[{\"a\":1}]"), InputFormat::JsonArray);
        assert_eq!(detect_input_format(b"{\"a\":1}\n{\"a\":2}\n"), InputFormat::Json);
    }

    #[test]
    fn delimited_needs_header_keyword() {
        assert_eq!(
            detect_input_format(b"timestamp,severity,textPayload\n1,ERROR,boom\n"),
            InputFormat::Csv
        );
        assert_eq!(
            detect_input_format(b"timestamp\tseverity\tmessage\nx\ty\tz\n"),
            InputFormat::Tsv
        );
        assert_eq!(
            detect_input_format(b"Well, this is prose, with commas.\nMore.\n"),
            InputFormat::Raw
        );
    }

    #[test]
    fn single_tab_beats_fewer_commas() {
        assert_eq!(detect_input_format(b"Timestamp\tMessage\n"), InputFormat::Tsv);
    }

    #[test]
    fn unterminated_first_line_is_raw() {
        assert_eq!(detect_input_format(b"timestamp,severity,message"), InputFormat::Raw);
        assert_eq!(detect_input_format(b""), InputFormat::Raw);
        assert_eq!(detect_input_format(b"   "), InputFormat::Raw);
    }

    #[test]
    fn deterministic() {
        let input = b"timestamp,severity,message\na,b,c\n";
        assert_eq!(detect_input_format(input), detect_input_format(input));
    }

    #[test]
    fn structured_formats() {
        assert!(is_structured(InputFormat::Csv));
        assert!(!is_structured(InputFormat::Raw));
        assert!(!is_structured(InputFormat::Auto));
    }
}
