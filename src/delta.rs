//! Delta alignment file serialization.
//!
//! The canonical exchange format: a header naming the two input
//! paths and the program, then per (reference, query) pair a `>`
//! line with ids and lengths followed by one block per alignment:
//! start/end coordinates in both sequences, the three error
//! counters, and the signed edit distances terminated by a zero.
//! Reverse-strand alignments carry their query coordinates flipped
//! (`sB > eB`).

use std::io::{BufRead, Write};

use crate::error::{Error, Result};
use crate::postnuc::{Alignment, FORWARD_CHAR, REVERSE_CHAR, rev_coord};

pub const NUCMER_TAG: &str = "NUCMER";
pub const PROMER_TAG: &str = "PROMER";

/// All alignments of one (reference, query) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaRecord {
    pub ref_id: String,
    pub qry_id: String,
    pub ref_len: i64,
    pub qry_len: i64,
    pub alignments: Vec<Alignment>,
}

/// A parsed delta file.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaFile {
    pub ref_path: String,
    pub qry_path: String,
    pub program: String,
    pub records: Vec<DeltaRecord>,
}

/// Write the two-line file header.
pub fn write_header(
    out: &mut dyn Write,
    ref_path: &str,
    qry_path: &str,
    program: &str,
) -> Result<()> {
    writeln!(out, "{ref_path} {qry_path}")?;
    writeln!(out, "{program}")?;
    Ok(())
}

/// Write one record: the pair header and each alignment's
/// coordinates, error counters and zero-terminated delta. Alignments
/// spanning less than `min_len` in both sequences are dropped;
/// nothing is written when none survive.
pub fn write_record(
    out: &mut dyn Write,
    ref_id: &str,
    ref_len: i64,
    qry_id: &str,
    qry_len: i64,
    alignments: &[Alignment],
    min_len: i64,
) -> Result<()> {
    let kept: Vec<&Alignment> = alignments
        .iter()
        .filter(|al| {
            (al.e_a - al.s_a).abs() + 1 >= min_len || (al.e_b - al.s_b).abs() + 1 >= min_len
        })
        .collect();
    if kept.is_empty() {
        return Ok(());
    }

    writeln!(out, ">{ref_id} {qry_id} {ref_len} {qry_len}")?;
    for al in kept {
        let (s_b, e_b) = if al.dir_b == FORWARD_CHAR {
            (al.s_b, al.e_b)
        } else {
            (rev_coord(al.s_b, qry_len), rev_coord(al.e_b, qry_len))
        };
        writeln!(
            out,
            "{} {} {} {} {} {} {}",
            al.s_a, al.e_a, s_b, e_b, al.errors, al.sim_errors, al.non_alphas
        )?;
        for d in &al.delta {
            writeln!(out, "{d}")?;
        }
        writeln!(out, "0")?;
    }
    Ok(())
}

/// Parse a delta file back into records. I/O errors propagate
/// verbatim; structural problems surface as malformed-input errors.
pub fn read_delta(input: &mut dyn BufRead) -> Result<DeltaFile> {
    let mut lines = input.lines();

    let header = lines
        .next()
        .ok_or_else(|| Error::malformed("delta file: missing path header"))??;
    let mut parts = header.split_whitespace();
    let ref_path = parts
        .next()
        .ok_or_else(|| Error::malformed("delta file: empty path header"))?
        .to_string();
    let qry_path = parts
        .next()
        .ok_or_else(|| Error::malformed("delta file: missing query path"))?
        .to_string();

    let program = lines
        .next()
        .ok_or_else(|| Error::malformed("delta file: missing program line"))??;
    if program != NUCMER_TAG && program != PROMER_TAG {
        return Err(Error::malformed(format!(
            "delta file: unknown program tag '{program}'"
        )));
    }

    let mut records: Vec<DeltaRecord> = Vec::new();
    let mut pending: Option<(i64, i64, i64, i64, i64, i64, i64)> = None;
    let mut deltas: Vec<i64> = Vec::new();

    for line in lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('>') {
            if pending.is_some() {
                return Err(Error::malformed("delta file: record header inside alignment"));
            }
            let fields: Vec<&str> = rest.split_whitespace().collect();
            if fields.len() != 4 {
                return Err(Error::malformed(format!(
                    "delta file: bad record header '{trimmed}'"
                )));
            }
            let ref_len = parse_int(fields[2])?;
            let qry_len = parse_int(fields[3])?;
            records.push(DeltaRecord {
                ref_id: fields[0].to_string(),
                qry_id: fields[1].to_string(),
                ref_len,
                qry_len,
                alignments: Vec::new(),
            });
            continue;
        }

        let record = records
            .last_mut()
            .ok_or_else(|| Error::malformed("delta file: alignment before record header"))?;

        match pending {
            None => {
                let fields: Vec<&str> = trimmed.split_whitespace().collect();
                if fields.len() != 7 {
                    return Err(Error::malformed(format!(
                        "delta file: bad alignment line '{trimmed}'"
                    )));
                }
                let mut v = [0i64; 7];
                for (slot, f) in v.iter_mut().zip(fields.iter()) {
                    *slot = parse_int(f)?;
                }
                pending = Some((v[0], v[1], v[2], v[3], v[4], v[5], v[6]));
                deltas.clear();
            }
            Some((s_a, e_a, s_b, e_b, errors, sim_errors, non_alphas)) => {
                let d = parse_int(trimmed)?;
                if d == 0 {
                    let dir = if s_b <= e_b { FORWARD_CHAR } else { REVERSE_CHAR };
                    let (s_b, e_b) = if dir == FORWARD_CHAR {
                        (s_b, e_b)
                    } else {
                        (rev_coord(s_b, record.qry_len), rev_coord(e_b, record.qry_len))
                    };
                    let delta = std::mem::take(&mut deltas);
                    let delta_apos = delta.iter().map(|d| d.abs()).sum::<i64>()
                        - delta.iter().filter(|&&d| d < 0).count() as i64;
                    record.alignments.push(Alignment {
                        dir_b: dir,
                        s_a,
                        s_b,
                        e_a,
                        e_b,
                        delta,
                        delta_apos,
                        errors,
                        sim_errors,
                        non_alphas,
                    });
                    pending = None;
                } else {
                    deltas.push(d);
                }
            }
        }
    }

    if pending.is_some() {
        return Err(Error::malformed("delta file: unterminated alignment"));
    }

    Ok(DeltaFile { ref_path, qry_path, program, records })
}

fn parse_int(s: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|_| Error::malformed(format!("delta file: expected an integer, got '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alignment(dir: i8) -> Alignment {
        let delta: Vec<i64> = vec![16, -3, 4];
        let delta_apos =
            delta.iter().map(|d| d.abs()).sum::<i64>() - delta.iter().filter(|&&d| d < 0).count() as i64;
        Alignment {
            dir_b: dir,
            s_a: 11,
            s_b: 5,
            e_a: 52,
            e_b: 47,
            delta,
            delta_apos,
            errors: 4,
            sim_errors: 4,
            non_alphas: 0,
        }
    }

    #[test]
    fn test_roundtrip_forward_and_reverse() {
        let mut buf = Vec::new();
        write_header(&mut buf, "ref.fa", "qry.fa", NUCMER_TAG).unwrap();
        let als = vec![sample_alignment(FORWARD_CHAR), sample_alignment(REVERSE_CHAR)];
        write_record(&mut buf, "chr1", 1000, "ctgA", 800, &als, 0).unwrap();

        let parsed = read_delta(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed.ref_path, "ref.fa");
        assert_eq!(parsed.qry_path, "qry.fa");
        assert_eq!(parsed.program, NUCMER_TAG);
        assert_eq!(parsed.records.len(), 1);
        let rec = &parsed.records[0];
        assert_eq!(rec.ref_id, "chr1");
        assert_eq!(rec.qry_id, "ctgA");
        assert_eq!((rec.ref_len, rec.qry_len), (1000, 800));
        assert_eq!(rec.alignments, als);
    }

    #[test]
    fn test_reverse_alignment_encodes_flipped_coordinates() {
        let mut buf = Vec::new();
        write_header(&mut buf, "r", "q", NUCMER_TAG).unwrap();
        write_record(&mut buf, "chr1", 100, "ctgA", 80, &[sample_alignment(REVERSE_CHAR)], 0)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        // strand frame 5..47 of an 80 base query flips to 76..34
        let stats_line = text.lines().nth(3).unwrap();
        assert_eq!(stats_line, "11 52 76 34 4 4 0");
    }

    #[test]
    fn test_empty_record_writes_nothing() {
        let mut buf = Vec::new();
        write_record(&mut buf, "chr1", 100, "ctgA", 80, &[], 0).unwrap();
        assert!(buf.is_empty());
        // all alignments below the length cutoff
        let mut buf = Vec::new();
        write_record(&mut buf, "chr1", 100, "ctgA", 80, &[sample_alignment(FORWARD_CHAR)], 500)
            .unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_malformed_inputs_are_rejected() {
        assert!(read_delta(&mut &b""[..]).is_err());
        assert!(read_delta(&mut &b"a b\nWRONG\n"[..]).is_err());
        assert!(read_delta(&mut &b"a b\nNUCMER\n1 2 3\n"[..]).is_err());
        // unterminated delta block
        let text = b"a b\nNUCMER\n>r q 10 10\n1 5 1 5 0 0 0\n2\n";
        assert!(read_delta(&mut &text[..]).is_err());
    }
}
