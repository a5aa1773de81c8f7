//! Command-line front end: parse XML files, report errors, and write them
//! back out unchanged or reformatted.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use domtrip::serial;
use domtrip::{Config, Document, NodeId, NodeKind};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// domtrip -- parse XML files and write them back losslessly.
///
/// Without formatting options the output is byte-identical to the input.
#[derive(Parser, Debug)]
#[command(name = "domtrip", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Print parser warnings and other details.
    #[arg(long)]
    verbose: bool,

    // -- Parsing options ---------------------------------------------------
    /// Accept a bare `&` in text and similar sloppiness.
    #[arg(long, conflicts_with = "strict")]
    lenient: bool,

    /// Validate element and attribute names strictly.
    #[arg(long)]
    strict: bool,

    /// Decode input with this encoding instead of detecting it.
    #[arg(long, value_name = "ENCODING")]
    encoding: Option<String>,

    /// Check that the document parses and writes back byte for byte; do not
    /// output it.
    #[arg(long)]
    check: bool,

    // -- Output options ----------------------------------------------------
    /// Re-indent the document.
    #[arg(long, conflicts_with_all = ["minimal", "raw"])]
    pretty: bool,

    /// Drop comments, processing instructions and the declaration.
    #[arg(long, conflicts_with = "raw")]
    minimal: bool,

    /// Strip all formatting whitespace between elements.
    #[arg(long)]
    raw: bool,

    /// Indentation used by --pretty.
    #[arg(long, value_name = "STRING")]
    indent: Option<String>,

    /// Leave out the XML declaration.
    #[arg(long)]
    omit_declaration: bool,

    /// Save output to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    // -- Debug options -----------------------------------------------------
    /// Print the node tree instead of the document.
    #[arg(long)]
    debug: bool,

    /// Print timing information for parsing and serializing.
    #[arg(long)]
    timing: bool,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_OUTPUT_ERROR: u8 = 2;
const EXIT_ROUNDTRIP_MISMATCH: u8 = 3;

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

/// Builds the configuration selected by the command-line flags.
fn build_config(cli: &Cli) -> Config {
    let mut config = if cli.pretty {
        Config::pretty_print()
    } else if cli.minimal {
        Config::minimal()
    } else if cli.raw {
        Config::raw()
    } else {
        Config::defaults()
    };
    if let Some(indent) = &cli.indent {
        config = config.with_indent_string(indent.as_str());
    }
    if cli.omit_declaration {
        config = config.with_omit_xml_declaration(true);
    }
    config.with_lenient(cli.lenient).with_strict_names(cli.strict)
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
        eprintln!("Reading file {filename} took {:?}", start_read.elapsed());
    }

    let config = build_config(cli);
    let start_parse = Instant::now();
    let doc = match Document::parse_bytes_with_config(&input, cli.encoding.as_deref(), &config) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        eprintln!("Parsing took {:?}", start_parse.elapsed());
    }

    if cli.verbose {
        for diag in &doc.diagnostics {
            eprintln!("{filename}: {diag}");
        }
        eprintln!(
            "{filename}: {} nodes, encoding {}",
            doc.node_count(),
            doc.output_encoding()
        );
    }

    if cli.debug {
        return write_output(cli, format_debug_tree(&doc).as_bytes());
    }
    if cli.check {
        return check_roundtrip(&doc, &input, filename);
    }

    let start_serial = Instant::now();
    let bytes = match serial::to_bytes(&doc, &config) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_OUTPUT_ERROR;
        }
    };
    if cli.timing {
        eprintln!("Serializing took {:?}", start_serial.elapsed());
    }
    write_output(cli, &bytes)
}

/// Writes the document back unformatted and compares it with the input.
fn check_roundtrip(doc: &Document, input: &[u8], filename: &str) -> u8 {
    let bytes = match serial::to_bytes(doc, &Config::defaults()) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_OUTPUT_ERROR;
        }
    };
    if bytes == input {
        return EXIT_SUCCESS;
    }
    let offset = bytes
        .iter()
        .zip(input)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| bytes.len().min(input.len()));
    eprintln!("{filename}: output differs from input at byte {offset}");
    EXIT_ROUNDTRIP_MISMATCH
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

// ---------------------------------------------------------------------------
// Debug tree dump
// ---------------------------------------------------------------------------

/// Formats the node tree, one node per line, indented by depth.
fn format_debug_tree(doc: &Document) -> String {
    let mut output = String::new();
    output.push_str("DOCUMENT\n");
    if let Some(doctype) = doc.doctype() {
        let _ = writeln!(output, "  DOCTYPE {}", doctype.name());
    }
    for &child in doc.children(doc.root()) {
        format_debug_node(doc, child, 1, &mut output);
    }
    output
}

fn format_debug_node(doc: &Document, id: NodeId, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let modified = if doc.is_modified(id) { " *" } else { "" };
    match doc.kind(id) {
        NodeKind::Element(element) => {
            let _ = write!(out, "{indent}ELEMENT {}", element.name());
            if let Some(ns) = doc.namespace_uri(id) {
                let _ = write!(out, " ns={ns}");
            }
            let _ = writeln!(out, "{modified}");
            for attr in element.attributes() {
                let _ = writeln!(out, "{indent}  ATTRIBUTE {}={}", attr.name(), attr.value());
            }
            for &child in doc.children(id) {
                format_debug_node(doc, child, depth + 1, out);
            }
        }
        NodeKind::Text(text) => {
            let label = if text.is_cdata() { "CDATA" } else { "TEXT" };
            let display = text.content().replace('\n', "\\n");
            let _ = writeln!(out, "{indent}{label} {display}{modified}");
        }
        NodeKind::Comment(comment) => {
            let _ = writeln!(out, "{indent}COMMENT {}{modified}", comment.content());
        }
        NodeKind::ProcessingInstruction(pi) => {
            let _ = writeln!(out, "{indent}PI {} {}{modified}", pi.target(), pi.data());
        }
        NodeKind::Document(_) => {
            let _ = writeln!(out, "{indent}DOCUMENT");
        }
    }
}

/// Writes output to stdout or to the file specified by --output.
fn write_output(cli: &Cli, content: &[u8]) -> u8 {
    let result = match &cli.output {
        Some(output_file) => fs::write(output_file, content),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content).and_then(|()| stdout.flush())
        }
    };
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{}: failed to write: {e}", cli.output.as_deref().unwrap_or("stdout"));
            EXIT_OUTPUT_ERROR
        }
    }
}
