//! Command line surfaces for the alignment toolkit.
//!
//! One multicall binary: invoked as (or told to run) `nucmer` or
//! `mgaps` it runs those tools with their own argument sets;
//! otherwise it runs the classic match finder, whose single-dash
//! long options predate current conventions and are parsed by hand.

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;

use mumalign::algorithms::{IndexKind, MatchType, SuffixIndex, run_match_finder};
use mumalign::cluster::{
    ClusterParams, DEFAULT_FIXED_DIAG_DIFF, DEFAULT_MAX_SEPARATION, DEFAULT_MIN_OUTPUT_SCORE,
    DEFAULT_SEPARATION_FACTOR, cluster_stream,
};
use mumalign::nucmer::{NucmerAligner, NucmerOptions};
use mumalign::output_format::{MatchFormat, write_matches, write_query_header};
use mumalign::sequence::{concat_records, mask_non_nucleotides, read_fasta};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program = args
        .first()
        .map(|a| {
            Path::new(a)
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let (tool, rest): (&str, Vec<String>) = if program.contains("nucmer") {
        ("nucmer", args[1..].to_vec())
    } else if program.contains("mgaps") {
        ("mgaps", args[1..].to_vec())
    } else {
        match args.get(1).map(String::as_str) {
            Some("nucmer") => ("nucmer", args[2..].to_vec()),
            Some("mgaps") => ("mgaps", args[2..].to_vec()),
            Some("mummer") => ("mummer", args[2..].to_vec()),
            _ => ("mummer", args[1..].to_vec()),
        }
    };

    let outcome = match tool {
        "nucmer" => run_nucmer(rest),
        "mgaps" => run_mgaps(rest),
        _ => run_mummer(&args[0], rest),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{tool}: {e:#}");
            ExitCode::FAILURE
        }
    }
}

//------------------------------------------------------------- mummer ----//

struct MummerArgs {
    kind: MatchType,
    min_len: usize,
    nucleotides_only: bool,
    both_strands: bool,
    reverse_only: bool,
    fmt: MatchFormat,
    subject: String,
    queries: Vec<String>,
}

fn parse_mummer_args(argv: &[String]) -> Option<MummerArgs> {
    let mut kind = MatchType::MAM; // -mumreference is the default
    let mut min_len = 20usize;
    let mut nucleotides_only = false;
    let mut both_strands = false;
    let mut reverse_only = false;
    let mut fmt = MatchFormat::default();
    let mut files: Vec<String> = Vec::new();

    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "-mum" => kind = MatchType::MUM,
            "-mumreference" | "-mumcand" => kind = MatchType::MAM,
            "-maxmatch" => kind = MatchType::MEM,
            "-n" => nucleotides_only = true,
            "-l" => {
                i += 1;
                let value = argv.get(i)?;
                match value.parse::<usize>() {
                    Ok(v) if v > 0 => min_len = v,
                    _ => {
                        eprintln!("mummer: invalid minimum match length '{value}'");
                        return None;
                    }
                }
            }
            "-b" => both_strands = true,
            "-r" => reverse_only = true,
            "-s" => fmt.print_substring = true,
            "-c" => fmt.rev_comp_coords = true,
            "-F" => fmt.four_column = true,
            "-L" => fmt.show_lengths = true,
            arg if !arg.starts_with('-') => files.push(arg.to_string()),
            arg => {
                eprintln!("mummer: unknown option: {arg}");
                return None;
            }
        }
        i += 1;
    }

    if files.len() < 2 {
        eprintln!("mummer: need a subject file and at least one query file");
        return None;
    }
    let subject = files.remove(0);
    Some(MummerArgs {
        kind,
        min_len,
        nucleotides_only,
        both_strands,
        reverse_only,
        fmt,
        subject,
        queries: files,
    })
}

fn run_mummer(program: &str, argv: Vec<String>) -> Result<ExitCode> {
    let args = match parse_mummer_args(&argv) {
        Some(a) => a,
        None => {
            print_mummer_usage(program);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut subject = read_fasta(&args.subject).context("reading subject")?;
    if args.nucleotides_only {
        for rec in subject.iter_mut() {
            mask_non_nucleotides(&mut rec.seq, b'#');
        }
    }
    let (joined, starts) = concat_records(&subject);
    let index = SuffixIndex::build(IndexKind::SuffixTree, &joined, 1).context("building suffix index")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for qfile in &args.queries {
        let queries = read_fasta(qfile).context("reading query")?;
        for query in &queries {
            let mut strand_seq = query.seq.clone();
            if args.nucleotides_only {
                mask_non_nucleotides(&mut strand_seq, b'%');
            }

            if !args.reverse_only {
                write_query_header(&mut out, &query.id, false, query.len(), &args.fmt)?;
                let matches = run_match_finder(&index, &strand_seq, args.kind, args.min_len);
                write_matches(&mut out, &matches, &subject, &starts, &query.seq, false, &args.fmt)?;
            }
            if args.both_strands || args.reverse_only {
                let rc = query.reverse_complement();
                let mut rc_seq = rc.seq.clone();
                if args.nucleotides_only {
                    mask_non_nucleotides(&mut rc_seq, b'%');
                }
                write_query_header(&mut out, &query.id, true, query.len(), &args.fmt)?;
                let matches = run_match_finder(&index, &rc_seq, args.kind, args.min_len);
                write_matches(&mut out, &matches, &subject, &starts, &rc.seq, true, &args.fmt)?;
            }
        }
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn print_mummer_usage(program: &str) {
    println!("Usage: {program} [options] <subject-file> <query-file1> [query-file2 ...]");
    println!("Options:");
    println!("  -mum           compute maximal matches that are unique in both sequences");
    println!("  -mumreference  compute maximal matches that are unique in the reference (default)");
    println!("  -mumcand       same as -mumreference");
    println!("  -maxmatch      compute all maximal matches regardless of their uniqueness");
    println!("  -n             match only the characters a, c, g, or t");
    println!("  -l <n>         set the minimum length of a match (default: 20)");
    println!("  -b             compute both forward and reverse complement matches");
    println!("  -r             only compute reverse complement matches");
    println!("  -s             print the matching substring under each match");
    println!("  -c             report reverse complement positions relative to the original query");
    println!("  -F             force four-column output with the reference sequence name");
    println!("  -L             show the length of the query sequence on the header line");
}

//------------------------------------------------------------- nucmer ----//

/// Whole-genome alignment of a query multi-FASTA against a reference
#[derive(Parser, Debug)]
#[command(name = "nucmer", version, about)]
struct NucmerCli {
    /// Reference multi-FASTA file
    ref_file: PathBuf,

    /// Query multi-FASTA file
    qry_file: PathBuf,

    /// Use anchor matches that are unique in both sequences
    #[arg(long, conflicts_with_all = ["mumreference", "maxmatch"])]
    mum: bool,

    /// Use anchor matches that are unique in the reference (default)
    #[arg(long)]
    mumreference: bool,

    /// Use all anchor matches regardless of their uniqueness
    #[arg(long, conflicts_with = "mumreference")]
    maxmatch: bool,

    /// Minimum length of a single exact match
    #[arg(short = 'l', long, default_value_t = 20)]
    minmatch: usize,

    /// Distance an alignment extension will attempt to extend poor
    /// scoring regions before giving up
    #[arg(short = 'b', long, default_value_t = 200)]
    breaklen: i64,

    /// Minimum cluster length
    #[arg(short = 'c', long, default_value_t = 65)]
    mincluster: i64,

    /// Maximum diagonal difference between two adjacent anchors in a
    /// cluster
    #[arg(short = 'D', long, default_value_t = 5)]
    diagdiff: i64,

    /// Maximum diagonal difference as a differential fraction of the
    /// gap length
    #[arg(short = 'd', long, default_value_t = 0.12)]
    diagfactor: f64,

    /// Maximum gap between two adjacent matches in a cluster
    #[arg(short = 'g', long, default_value_t = 90)]
    maxgap: i64,

    /// Do not perform cluster extension
    #[arg(long)]
    noextend: bool,

    /// Do not optimize alignment scores at alignment ends
    #[arg(long)]
    nooptimize: bool,

    /// Do not simplify alignments by removing shadowed clusters
    #[arg(long)]
    nosimplify: bool,

    /// Use only the forward strand of the query sequences
    #[arg(short = 'f', long, conflicts_with = "reverse")]
    forward: bool,

    /// Use only the reverse complement of the query sequences
    #[arg(short = 'r', long)]
    reverse: bool,

    /// Enforce absolute banding of the dynamic programming matrix
    /// based on the diagdiff parameter
    #[arg(long)]
    banded: bool,

    /// Write the cluster file instead of the delta file
    #[arg(long)]
    nodelta: bool,

    /// Back the seed search with the sparse suffix tree instead of
    /// the suffix array
    #[arg(long)]
    tree: bool,

    /// Number of worker threads (default: all available cores)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Prefix of the output file
    #[arg(short = 'p', long, default_value = "out")]
    prefix: String,
}

fn run_nucmer(argv: Vec<String>) -> Result<ExitCode> {
    let cli = NucmerCli::parse_from(std::iter::once("nucmer".to_string()).chain(argv));

    let match_kind = if cli.mum {
        MatchType::MUM
    } else if cli.maxmatch {
        MatchType::MEM
    } else {
        MatchType::MAM
    };

    let options = NucmerOptions {
        match_kind,
        min_len: cli.minmatch,
        forward_only: cli.forward,
        reverse_only: cli.reverse,
        break_len: cli.breaklen,
        min_cluster: cli.mincluster,
        diag_diff: cli.diagdiff,
        diag_factor: cli.diagfactor,
        max_gap: cli.maxgap,
        extend: !cli.noextend,
        optimize: !cli.nooptimize,
        simplify: !cli.nosimplify,
        banding: cli.banded,
        do_delta: !cli.nodelta,
        index_kind: if cli.tree { IndexKind::SuffixTree } else { IndexKind::SuffixArray },
        ..Default::default()
    };

    let references = read_fasta(&cli.ref_file).context("reading reference")?;
    let queries = read_fasta(&cli.qry_file).context("reading query")?;
    if references.is_empty() {
        bail!("reference file contains no sequences");
    }

    let aligner = NucmerAligner::new(references, options)?;
    let results = aligner.align_parallel(&queries, cli.threads)?;

    if cli.nodelta {
        let path = format!("{}.cluster", cli.prefix);
        let mut out = BufWriter::new(File::create(&path).with_context(|| format!("creating {path}"))?);
        aligner.write_clusters(&mut out, &results)?;
        out.flush()?;
    } else {
        let path = format!("{}.delta", cli.prefix);
        let mut out = BufWriter::new(File::create(&path).with_context(|| format!("creating {path}"))?);
        aligner.write_delta(
            &mut out,
            &cli.ref_file.display().to_string(),
            &cli.qry_file.display().to_string(),
            &results,
        )?;
        out.flush()?;
    }
    Ok(ExitCode::SUCCESS)
}

//-------------------------------------------------------------- mgaps ----//

/// Cluster matches based on diagonals and separation. Input is read
/// from stdin in the format produced by the match finder; output goes
/// to stdout.
#[derive(Parser, Debug)]
#[command(name = "mgaps", version, about)]
struct MgapsCli {
    /// Check that fasta header labels alternately have "Reverse"
    #[arg(short = 'C')]
    check_labels: bool,

    /// Fixed diagonal difference to join matches
    #[arg(short = 'd', default_value_t = DEFAULT_FIXED_DIAG_DIFF)]
    diagdiff: i64,

    /// Use the extent of a match (end - start) rather than the sum of
    /// piece lengths to score a cluster
    #[arg(short = 'e')]
    extents: bool,

    /// Fraction of the separation allowed as diagonal difference
    #[arg(short = 'f', default_value_t = DEFAULT_SEPARATION_FACTOR)]
    fraction: f64,

    /// Minimum score of a cluster to be reported
    #[arg(short = 'l', default_value_t = DEFAULT_MIN_OUTPUT_SCORE)]
    min_score: i64,

    /// Maximum separation between matches in a cluster
    #[arg(short = 's', default_value_t = DEFAULT_MAX_SEPARATION)]
    max_separation: i64,
}

fn run_mgaps(argv: Vec<String>) -> Result<ExitCode> {
    let cli = MgapsCli::parse_from(std::iter::once("mgaps".to_string()).chain(argv));
    let params = ClusterParams {
        fixed_diag_diff: cli.diagdiff,
        max_separation: cli.max_separation,
        min_output_score: cli.min_score,
        separation_factor: cli.fraction,
        use_extents: cli.extents,
        check_labels: cli.check_labels,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut output = BufWriter::new(stdout.lock());
    cluster_stream(&mut input, &mut output, &params)?;
    output.flush()?;
    Ok(ExitCode::SUCCESS)
}
