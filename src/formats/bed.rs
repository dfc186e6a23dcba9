//! BED serialization of combined features
//!
//! The track-rendering side of the system consumes BED: assembled
//! transcript models as BED12 (thickStart/thickEnd carry the coding
//! span, blocks carry the child exon list) and pass-through records as
//! BED6.

use crate::core::{CombinedFeature, FeatureRecord, TranscriptModel};
use std::io::{self, Write};

/// Write the combined sequence as BED lines, one feature per line
pub fn write_bed<W: Write>(features: &[CombinedFeature], out: &mut W) -> io::Result<()> {
    for feature in features {
        match feature {
            CombinedFeature::Record(record) => writeln!(out, "{}", bed6_line(record))?,
            CombinedFeature::Transcript(transcript) => {
                writeln!(out, "{}", bed12_line(transcript))?
            }
        }
    }
    Ok(())
}

fn display_name(record: &FeatureRecord) -> &str {
    record
        .name
        .as_deref()
        .or(record.id.as_deref())
        .unwrap_or(".")
}

fn strand_char(record: &FeatureRecord) -> char {
    record.strand.map_or('.', |s| s.to_char())
}

/// BED6: chrom, start, end, name, score, strand
fn bed6_line(record: &FeatureRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}\t0\t{}",
        record.chrom,
        record.start,
        record.end,
        display_name(record),
        strand_char(record)
    )
}

/// BED12: BED6 plus thickStart, thickEnd, itemRgb, blockCount,
/// blockSizes, blockStarts. A transcript without a coding span gets a
/// zero-width thick interval at its start.
fn bed12_line(transcript: &TranscriptModel) -> String {
    let record = transcript.record();
    let thick_start = transcript.cd_start().unwrap_or(record.start);
    let thick_end = transcript.cd_end().unwrap_or(record.start);

    let (block_sizes, block_starts) = if transcript.exons().is_empty() {
        // Block-less transcripts still need one block covering the span
        (
            format!("{},", record.end - record.start),
            "0,".to_string(),
        )
    } else {
        let mut sizes = String::new();
        let mut starts = String::new();
        for exon in transcript.exons() {
            sizes.push_str(&format!("{},", exon.end.saturating_sub(exon.start)));
            starts.push_str(&format!("{},", exon.start.saturating_sub(record.start)));
        }
        (sizes, starts)
    };
    let block_count = transcript.exons().len().max(1);

    format!(
        "{}\t{}\t{}\t{}\t0\t{}\t{}\t{}\t0\t{}\t{}\t{}",
        record.chrom,
        record.start,
        record.end,
        display_name(record),
        strand_char(record),
        thick_start,
        thick_end,
        block_count,
        block_sizes,
        block_starts
    )
}
