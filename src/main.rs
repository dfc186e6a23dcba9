//! gffmerge CLI entry point
//!
//! Merges flat GFF3/GTF annotation records into transcript models and
//! serializes them for track rendering.

use clap::{Parser, Subcommand, ValueEnum};
use gffmerge::core::{CombinedFeature, FeatureCombiner, GffMergeError, SchemaFormat};
use gffmerge::formats;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Schema format (CLI enum)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    /// GFF3: explicit parent/child hierarchy
    #[value(name = "gff3")]
    Gff3,
    /// GTF: implicit grouping by shared identifier
    #[value(name = "gtf")]
    Gtf,
}

impl From<FormatArg> for SchemaFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Gff3 => SchemaFormat::Gff3,
            FormatArg::Gtf => SchemaFormat::Gtf,
        }
    }
}

#[derive(Parser)]
#[command(name = "gffmerge")]
#[command(about = "Assemble flat GFF3/GTF records into transcript models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine an annotation file and write the merged features as BED
    Combine {
        /// Input GFF3/GTF file (optionally .gz or .bz2)
        input: PathBuf,
        /// Output BED file (stdout if not specified)
        output: Option<PathBuf>,
        /// Schema format (default: detect from file extension)
        #[arg(short = 'f', long)]
        format: Option<FormatArg>,
        /// Feature types to drop before combining
        #[arg(long = "filter-type", default_value = "chromosome")]
        filter_types: Vec<String>,
        /// Number of parsing threads
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
    },
    /// Combine, then print the popup projection for one position
    Popup {
        /// Input GFF3/GTF file (optionally .gz or .bz2)
        input: PathBuf,
        /// Genomic position, e.g. chr1:1,234,567 (1-based)
        #[arg(long = "at")]
        position: String,
        /// Schema format (default: detect from file extension)
        #[arg(short = 'f', long)]
        format: Option<FormatArg>,
        /// Number of parsing threads
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
    },
}

/// Detect the schema format from the file extension, looking through a
/// trailing compression suffix.
fn detect_format(path: &Path) -> anyhow::Result<SchemaFormat> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let name = name
        .strip_suffix(".gz")
        .or_else(|| name.strip_suffix(".bz2"))
        .unwrap_or(&name);
    if name.ends_with(".gff") || name.ends_with(".gff3") {
        Ok(SchemaFormat::Gff3)
    } else if name.ends_with(".gtf") {
        Ok(SchemaFormat::Gtf)
    } else {
        Err(anyhow::anyhow!(
            "unable to detect annotation format of {:?}; pass --format",
            path
        ))
    }
}

fn resolve_format(arg: Option<FormatArg>, input: &Path) -> anyhow::Result<SchemaFormat> {
    match arg {
        Some(arg) => Ok(arg.into()),
        None => detect_format(input),
    }
}

/// Parse a `chrom:position` query; thousands separators are tolerated.
/// The position is 1-based on the command line, 0-based internally.
fn parse_position(value: &str) -> Result<(String, u64), GffMergeError> {
    let (chrom, pos) = value
        .split_once(':')
        .ok_or_else(|| GffMergeError::InvalidPosition(value.to_string()))?;
    let digits: String = pos.chars().filter(|c| *c != ',').collect();
    let position: u64 = digits
        .parse()
        .map_err(|_| GffMergeError::InvalidPosition(value.to_string()))?;
    if chrom.is_empty() || position == 0 {
        return Err(GffMergeError::InvalidPosition(value.to_string()));
    }
    Ok((chrom.to_string(), position - 1))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Combine {
            input,
            output,
            format,
            filter_types,
            threads,
        } => {
            let format = resolve_format(format, &input)?;
            eprintln!("Loading annotation file: {:?}", input);
            let (records, load_stats) = formats::load_features(&input, format, threads)?;

            let combiner = FeatureCombiner::with_filter_types(format, filter_types);
            let (combined, stats) = combiner.combine_with_stats(records);

            match &output {
                Some(path) => {
                    let mut writer = BufWriter::new(std::fs::File::create(path)?);
                    formats::write_bed(&combined, &mut writer)?;
                    writer.flush()?;
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut writer = BufWriter::new(stdout.lock());
                    formats::write_bed(&combined, &mut writer)?;
                    writer.flush()?;
                }
            }

            eprintln!("\n=== Combine Statistics ===");
            eprintln!("Lines read:      {}", load_stats.lines);
            eprintln!("Comments:        {}", load_stats.comments);
            eprintln!("Skipped lines:   {}", load_stats.skipped);
            eprintln!("Records:         {}", stats.total);
            eprintln!("Dropped:         {}", stats.dropped);
            eprintln!("Transcripts:     {}", stats.transcripts);
            eprintln!("Consumed:        {}", stats.consumed);
            eprintln!("Pass-through:    {}", stats.passthrough);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Popup {
            input,
            position,
            format,
            threads,
        } => {
            let format = resolve_format(format, &input)?;
            let (chrom, position) = parse_position(&position)?;

            let (records, _) = formats::load_features(&input, format, threads)?;
            let combiner = FeatureCombiner::new(format);
            let combined = combiner.combine(records);

            let mut hits = 0;
            for feature in combined
                .iter()
                .filter(|f| f.chrom() == chrom && f.contains(position))
            {
                if hits > 0 {
                    println!("==========");
                }
                hits += 1;
                print_popup(feature, position);
            }
            if hits == 0 {
                eprintln!("No feature covers {}:{}", chrom, position + 1);
            }
        }
    }

    Ok(())
}

fn print_popup(feature: &CombinedFeature, position: u64) {
    use gffmerge::core::PopupEntry;
    for entry in feature.popup_data(position) {
        match entry {
            PopupEntry::Field { name, value } => println!("{}: {}", name, value),
            PopupEntry::Divider => println!("----------"),
        }
    }
}
