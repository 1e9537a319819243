use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use wring::{Options, TextScope, minify_with_options};

#[derive(Parser)]
#[command(name = "wring")]
#[command(about = "Wrings needless bytes out of XML", long_about = None)]
struct Cli {
    /// Input file (use - for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Keep comments
    #[arg(long)]
    keep_comments: bool,

    /// Keep the standalone declaration in the prolog
    #[arg(long)]
    keep_standalone: bool,

    /// Keep prolog and DOCTYPE whitespace
    #[arg(long)]
    keep_declaration_whitespace: bool,

    /// Keep empty open/close pairs instead of collapsing to self-closing
    #[arg(long)]
    keep_empty_elements: bool,

    /// Disable namespace removal and shortening
    #[arg(long)]
    no_namespaces: bool,

    /// Strip xsi:schemaLocation attributes
    #[arg(long)]
    remove_schema_locations: bool,

    /// Rewrite inside CDATA sections as well
    #[arg(long)]
    no_cdata_guard: bool,

    /// Whitespace between tags: true, false or strict
    #[arg(long, value_name = "MODE", default_value = "true")]
    whitespace_between_tags: TextScope,

    /// Trim whitespace at text node edges: true, false or strict
    #[arg(long, value_name = "MODE", default_value = "false")]
    trim_texts: TextScope,

    /// Collapse whitespace runs in text nodes: true, false or strict
    #[arg(long, value_name = "MODE", default_value = "false")]
    collapse_texts: TextScope,

    /// Print size comparison
    #[arg(short, long)]
    stats: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Read input
    let input = if cli.input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&cli.input)?
    };

    let input_len = input.len();

    // Build options
    let namespaces = !cli.no_namespaces;
    let options = Options {
        remove_comments: !cli.keep_comments,
        remove_whitespace_between_tags: cli.whitespace_between_tags,
        collapse_empty_elements: !cli.keep_empty_elements,
        trim_whitespace_from_texts: cli.trim_texts,
        collapse_whitespace_in_texts: cli.collapse_texts,
        collapse_whitespace_in_prolog: !cli.keep_declaration_whitespace,
        collapse_whitespace_in_doc_type: !cli.keep_declaration_whitespace,
        remove_schema_location_attributes: cli.remove_schema_locations,
        remove_unnecessary_standalone_declaration: !cli.keep_standalone,
        remove_unused_namespaces: namespaces,
        remove_unused_default_namespace: namespaces,
        shorten_namespaces: namespaces,
        ignore_cdata: !cli.no_cdata_guard,
        ..Options::default()
    };

    // Minify
    let output = minify_with_options(&input, &options)?;
    let output_len = output.len();

    // Write output
    if cli.output.as_os_str() == "-" {
        io::stdout().write_all(output.as_bytes())?;
    } else {
        fs::write(&cli.output, &output)?;
    }

    // Print stats if requested
    if cli.stats {
        let saved = input_len.saturating_sub(output_len);
        let percent = if input_len > 0 {
            (saved as f64 / input_len as f64) * 100.0
        } else {
            0.0
        };
        eprintln!(
            "{} -> {} bytes ({:.1}% smaller)",
            input_len, output_len, percent
        );
    }

    Ok(())
}
