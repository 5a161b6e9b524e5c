//! Seed match output for the match-finding surface.
//!
//! Per-query headers followed by one row per match: three columns
//! (reference position, query position, length) against a
//! single-record reference, four columns naming the reference record
//! otherwise or on request. Reverse matches can report their
//! positions relative to the original query, and the matching
//! substring can be echoed below each row.

use std::io::Write;

use crate::error::Result;
use crate::sequence::{Sequence, locate_record};
use crate::suffix_array::Match;

/// Formatting switches for match rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchFormat {
    /// Force four-column output even for a single-record reference
    pub four_column: bool,
    /// Show sequence lengths on the query headers
    pub show_lengths: bool,
    /// Echo the matching substring under each row
    pub print_substring: bool,
    /// Report reverse-strand positions relative to the original query
    pub rev_comp_coords: bool,
}

/// Write the header for one query's matches: `> id`, a `Reverse` tag
/// for the reverse-complement strand, and the length on request.
pub fn write_query_header(
    out: &mut dyn Write,
    id: &str,
    reverse: bool,
    len: usize,
    fmt: &MatchFormat,
) -> Result<()> {
    write!(out, "> {id}")?;
    if reverse {
        write!(out, " Reverse")?;
    }
    if fmt.show_lengths {
        write!(out, "  Len = {len}")?;
    }
    writeln!(out)?;
    Ok(())
}

/// Write the match rows of one query against the concatenated
/// reference. Match coordinates are 0-based in the concatenated
/// reference and in the query's current strand frame; rows print
/// them 1-based.
pub fn write_matches(
    out: &mut dyn Write,
    matches: &[Match],
    refs: &[Sequence],
    ref_starts: &[usize],
    query: &[u8],
    reverse: bool,
    fmt: &MatchFormat,
) -> Result<()> {
    let four_column = fmt.four_column || refs.len() > 1;
    let max_id_len = refs.iter().map(|r| r.id.len()).max().unwrap_or(0);

    for m in matches {
        let (rec, offset) = locate_record(ref_starts, m.ref_pos as usize);
        if four_column {
            write!(out, "  {:<width$}  {:>8}  ", refs[rec].id, offset + 1, width = max_id_len)?;
        } else {
            write!(out, "{:>8}  ", offset + 1)?;
        }
        if reverse && fmt.rev_comp_coords {
            write!(out, "{:>8}  ", query.len() as i64 - m.query_pos)?;
        } else {
            write!(out, "{:>8}  ", m.query_pos + 1)?;
        }
        writeln!(out, "{:>8}", m.len)?;

        if fmt.print_substring {
            let start = m.query_pos as usize;
            let end = start + m.len as usize;
            writeln!(out, "{}", String::from_utf8_lossy(&query[start..end]))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::concat_records;

    fn refs() -> (Vec<Sequence>, Vec<usize>) {
        let records = vec![
            Sequence::new("chr1", b"ACGTACGTTT".to_vec()),
            Sequence::new("chr2", b"GGGGCCCC".to_vec()),
        ];
        let (_, starts) = concat_records(&records);
        (records, starts)
    }

    #[test]
    fn test_three_column_rows() {
        let records = vec![Sequence::new("chr1", b"ACGTACGTTT".to_vec())];
        let (_, starts) = concat_records(&records);
        let mut out = Vec::new();
        let matches = vec![Match::new(4, 2, 6)];
        write_matches(&mut out, &matches, &records, &starts, b"GGACGTTTGG", false, &MatchFormat::default())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let cols: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(cols, vec!["5", "3", "6"]);
    }

    #[test]
    fn test_four_column_rows_for_multi_record_reference() {
        let (records, starts) = refs();
        let mut out = Vec::new();
        // position 11 in the joined text is chr2 offset 0
        let matches = vec![Match::new(11, 0, 4)];
        write_matches(&mut out, &matches, &records, &starts, b"GGGG", false, &MatchFormat::default())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let cols: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(cols, vec!["chr2", "1", "1", "4"]);
    }

    #[test]
    fn test_reverse_coordinates_relative_to_original() {
        let records = vec![Sequence::new("chr1", b"ACGTACGTTT".to_vec())];
        let (_, starts) = concat_records(&records);
        let fmt = MatchFormat { rev_comp_coords: true, ..Default::default() };
        let mut out = Vec::new();
        // match at reverse-frame position 2 of a 10 base query
        let matches = vec![Match::new(0, 2, 4)];
        write_matches(&mut out, &matches, &records, &starts, b"AAAAACGTAC", true, &fmt).unwrap();
        let text = String::from_utf8(out).unwrap();
        let cols: Vec<&str> = text.split_whitespace().collect();
        // 10 - 2 = 8: the 1-based start in original coordinates
        assert_eq!(cols, vec!["1", "8", "4"]);
    }

    #[test]
    fn test_header_variants() {
        let fmt = MatchFormat { show_lengths: true, ..Default::default() };
        let mut out = Vec::new();
        write_query_header(&mut out, "q1", false, 42, &fmt).unwrap();
        write_query_header(&mut out, "q1", true, 42, &MatchFormat::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("> q1  Len = 42"));
        assert_eq!(lines.next(), Some("> q1 Reverse"));
    }

    #[test]
    fn test_substring_echo() {
        let records = vec![Sequence::new("chr1", b"ACGTACGTTT".to_vec())];
        let (_, starts) = concat_records(&records);
        let fmt = MatchFormat { print_substring: true, ..Default::default() };
        let mut out = Vec::new();
        let matches = vec![Match::new(4, 2, 6)];
        write_matches(&mut out, &matches, &records, &starts, b"GGACGTTTGG", false, &fmt).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1) == Some("ACGTTT"));
    }
}
