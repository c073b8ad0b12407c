//! CSV rendering for artifacts.
//!
//! Header line first, `\n` line terminators, trailing newline. Fields
//! containing a comma, quote or line break are quoted with quotes doubled.

use crate::sync::project::Row;

/// Escape a value for CSV output.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render a header and rows into CSV text.
///
/// Rows shorter than the header are padded with empty fields so every line
/// carries every declared column.
#[must_use]
pub fn render(columns: &[&str], rows: &[Row]) -> String {
    let mut out = String::new();
    out.push_str(&columns.join(","));
    out.push('\n');

    for row in rows {
        let mut fields = row.fields();
        fields.resize(columns.len(), String::new());
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::dataset::{EMPLOYEE_COLUMNS, SUBMISSION_COLUMNS};
    use crate::sync::project::SubmissionRow;

    /// Minimal RFC 4180 reader, enough to check that escaping round-trips.
    fn parse(text: &str) -> Vec<Vec<String>> {
        let mut records = Vec::new();
        let mut record = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, in_quotes) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                ('"', true) => in_quotes = false,
                ('"', false) if field.is_empty() => in_quotes = true,
                (',', false) => record.push(std::mem::take(&mut field)),
                ('\n', false) => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                (c, _) => field.push(c),
            }
        }
        records
    }

    fn memo_row(memo: &str) -> Row {
        Row::Submission(SubmissionRow {
            submission_id: 1,
            year_month: "2026-03".to_string(),
            employee_id: 2,
            employee_name: "Aiko".to_string(),
            target_date: "2026-03-04".to_string(),
            availability: "tentative".to_string(),
            time_range: memo.to_string(),
        })
    }

    #[test]
    fn test_csv_escape_plain() {
        assert_eq!(csv_escape("09:00-13:00"), "09:00-13:00");
        assert_eq!(csv_escape(""), "");
    }

    #[test]
    fn test_csv_escape_comma_and_quote() {
        assert_eq!(csv_escape(r#"Mon, "AM" only"#), r#""Mon, ""AM"" only""#);
    }

    #[test]
    fn test_csv_escape_newline() {
        assert_eq!(csv_escape("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_render_empty_has_header_only() {
        assert_eq!(
            render(EMPLOYEE_COLUMNS, &[]),
            "employee_id,employee_code,display_name,department,is_active\n"
        );
    }

    #[test]
    fn test_render_escaped_memo_parses_back() {
        let memo = r#"Mon, "AM" only"#;
        let text = render(SUBMISSION_COLUMNS, &[memo_row(memo)]);

        assert!(text.ends_with('\n'));
        assert!(text.contains(r#","Mon, ""AM"" only""#));

        let records = parse(&text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], SUBMISSION_COLUMNS);
        assert_eq!(records[1][6], memo);
        assert_eq!(records[1].len(), SUBMISSION_COLUMNS.len());
    }

    #[test]
    fn test_render_multiline_memo_parses_back() {
        let memo = "early\nlate, maybe";
        let records = parse(&render(SUBMISSION_COLUMNS, &[memo_row(memo)]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][6], memo);
    }
}
