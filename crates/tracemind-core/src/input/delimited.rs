//! Quote-aware CSV/TSV record splitting.
//!
//! Follows RFC 4180 quoting: a doubled `""` inside a quoted field is a
//! literal quote, and quoted fields may contain the delimiter and newlines.
//! Both `\n` and `\r\n` terminate records. Blank lines yield no record.

/// Split `content` into records of fields.
pub fn parse_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                finish_record(&mut records, &mut record);
            }
            c if c == delimiter => record.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        finish_record(&mut records, &mut record);
    }
    records
}

fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>) {
    let record = std::mem::take(record);
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}

/// Index of the first header whose name equals one of `names`, tried in
/// priority order and compared case-insensitively.
pub fn find_column(header: &[String], names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_delimiter_and_doubled_quote() {
        let records = parse_records("text\n\"a,b\"\"c\"\n", ',');
        assert_eq!(records, vec![vec!["text"], vec!["a,b\"c"]]);
    }

    #[test]
    fn quoted_newlines_stay_in_field() {
        let records = parse_records("id,msg\r\n1,\"line one\nline two\"\r\n", ',');
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][1], "line one\nline two");
    }

    #[test]
    fn tabs_and_blank_lines() {
        let records = parse_records("a\tb\n\n1\t2", '\t');
        assert_eq!(records, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn empty_fields_are_kept() {
        let records = parse_records("a,,c\n", ',');
        assert_eq!(records[0], vec!["a", "", "c"]);
    }

    #[test]
    fn column_lookup_uses_priority_order() {
        let header: Vec<String> = ["Message", "textPayload", "Severity"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_column(&header, &["textPayload", "message"]), Some(1));
        assert_eq!(find_column(&header, &["severity"]), Some(2));
        assert_eq!(find_column(&header, &["timestamp"]), None);
    }
}
