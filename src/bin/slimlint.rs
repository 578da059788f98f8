//! slimlint: parse, check and re-encode XML files with slimxml.
//!
//! An `xmllint`-style driver over the public API: every input is loaded with
//! encoding detection, recovered problems are reported on stderr, and the
//! tree is written back out in the requested encoding.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use slimxml::error::ErrorSeverity;
use slimxml::parser::{self, ParseOptions};
use slimxml::serial::{self, SerializeOptions};
use slimxml::{Document, Encode, NodeKind};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// slimlint -- parse, check and re-encode XML files.
#[derive(Parser, Debug)]
#[command(name = "slimlint", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Output encoding. Defaults to the encoding the input was read in.
    #[arg(long, value_enum, value_name = "ENCODING")]
    encode: Option<EncodeArg>,

    /// Save output to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Do not output the result tree.
    #[arg(long)]
    noout: bool,

    /// Write without indentation or line breaks.
    #[arg(long)]
    compact: bool,

    /// Keep character references as-is on input and output.
    #[arg(long)]
    raw: bool,

    /// Print node, attribute and depth counts for each file.
    #[arg(long)]
    stats: bool,

    /// Print timing information for parsing and serializing.
    #[arg(long)]
    timing: bool,
}

/// Encodings accepted by `--encode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EncodeArg {
    Ansi,
    Utf8,
    #[value(name = "utf8-nomark")]
    Utf8NoMark,
    Utf16,
    #[value(name = "utf16be")]
    Utf16BigEndian,
}

impl From<EncodeArg> for Encode {
    fn from(arg: EncodeArg) -> Self {
        match arg {
            EncodeArg::Ansi => Self::Ansi,
            EncodeArg::Utf8 => Self::Utf8,
            EncodeArg::Utf8NoMark => Self::Utf8NoMark,
            EncodeArg::Utf16 => Self::Utf16,
            EncodeArg::Utf16BigEndian => Self::Utf16BigEndian,
        }
    }
}

// ---------------------------------------------------------------------------
// Exit codes (matching xmllint conventions)
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_WRITE_ERROR: u8 = 6;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut worst_exit: u8 = EXIT_SUCCESS;

    for file in &cli.files {
        let exit = process_file(&cli, file);
        if exit > worst_exit {
            worst_exit = exit;
        }
    }

    ExitCode::from(worst_exit)
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, filename: &str) -> u8 {
    let start_read = Instant::now();
    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        let elapsed = start_read.elapsed();
        eprintln!("Reading file {filename} took {elapsed:?}");
    }

    let start_parse = Instant::now();
    let options = ParseOptions::default().transfer_characters(!cli.raw);
    let doc = match parser::parse_bytes_with_options(&input, None, &options) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            for diag in &e.diagnostics {
                eprintln!("{filename}: {diag}");
            }
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        let elapsed = start_parse.elapsed();
        eprintln!("Parsing took {elapsed:?}");
    }

    let mut exit_code = EXIT_SUCCESS;
    for diag in &doc.diagnostics {
        eprintln!("{filename}: {diag}");
        if diag.severity == ErrorSeverity::Error {
            exit_code = EXIT_PARSE_ERROR;
        }
    }

    if cli.stats {
        eprint!("{}", format_stats(filename, &doc));
    }

    if !cli.noout {
        let start_serial = Instant::now();
        let encode = cli
            .encode
            .map(Encode::from)
            .or(doc.source_encode)
            .unwrap_or_default();
        let options = SerializeOptions::default()
            .indent(!cli.compact)
            .transfer_characters(!cli.raw);
        let bytes = serial::to_bytes(&doc, encode, &options);
        if let Err(e) = write_output(cli, &bytes) {
            eprintln!("{}: failed to write: {e}", cli.output.as_deref().unwrap_or("-"));
            return EXIT_WRITE_ERROR;
        }
        if cli.timing {
            let elapsed = start_serial.elapsed();
            eprintln!("Serializing took {elapsed:?}");
        }
    }

    exit_code
}

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

/// Summarizes the shape of a document.
fn format_stats(filename: &str, doc: &Document) -> String {
    let mut elements = 0usize;
    let mut comments = 0usize;
    let mut declarations = 0usize;
    let mut attributes = 0usize;
    let mut max_depth = 0usize;
    for id in doc.descendants(doc.root()) {
        match doc.kind(id) {
            NodeKind::Element => elements += 1,
            NodeKind::Comment => comments += 1,
            NodeKind::Declaration => declarations += 1,
            NodeKind::Document => {}
        }
        attributes += doc.node(id).attributes().len();
        max_depth = max_depth.max(doc.depth(id));
    }

    let mut out = String::new();
    let encode = doc
        .source_encode
        .map_or_else(|| "unknown".to_string(), |e| e.to_string());
    let _ = writeln!(out, "{filename}: encoding {encode}");
    let _ = writeln!(
        out,
        "{filename}: {elements} elements, {comments} comments, {declarations} declarations"
    );
    let _ = writeln!(
        out,
        "{filename}: {attributes} attributes, max depth {max_depth}"
    );
    out
}

/// Writes output to stdout or to the file specified by --output.
fn write_output(cli: &Cli, content: &[u8]) -> io::Result<()> {
    if let Some(ref output_file) = cli.output {
        fs::write(output_file, content)
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content)?;
        stdout.flush()
    }
}
