//! Whole-file loading
//!
//! Reads an annotation file into feature records: transparent gzip/bzip2
//! decompression, memory mapping for large plain files, and optional
//! rayon-chunked parallel parsing. Input order is always preserved so
//! the combiner's stable sort stays deterministic.

use crate::core::{FeatureRecord, GffMergeError, Result, SchemaFormat};
use crate::formats::gff::{is_comment, parse_record};
use log::{debug, warn};
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

/// Threshold for memory-mapping plain files (100MB)
const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Chunk size for parallel parsing
const CHUNK_SIZE: usize = 10000;

/// Compression format of an annotation file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text (uncompressed)
    Plain,
    /// Gzip compressed (.gz)
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

/// Detect compression format from file path and/or content
pub fn detect_compression(path: &Path) -> Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    // First check by extension
    if extension == "gz" {
        return Ok(CompressionFormat::Gzip);
    }
    if extension == "bz2" {
        return Ok(CompressionFormat::Bzip2);
    }

    // Then check by magic bytes
    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;

    if bytes_read >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        return Ok(CompressionFormat::Gzip);
    }
    if bytes_read >= 3 && magic[0] == 0x42 && magic[1] == 0x5a && magic[2] == 0x68 {
        return Ok(CompressionFormat::Bzip2);
    }

    Ok(CompressionFormat::Plain)
}

/// Open an annotation file as a buffered reader, decompressing if needed.
/// Large plain files are memory-mapped.
pub fn open_annotation_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let format = detect_compression(path)?;
    let file = File::open(path)?;

    match format {
        CompressionFormat::Gzip => {
            let decoder = flate2::read::GzDecoder::new(file);
            Ok(Box::new(BufReader::with_capacity(128 * 1024, decoder)))
        }
        CompressionFormat::Bzip2 => {
            let decoder = bzip2::read::BzDecoder::new(file);
            Ok(Box::new(BufReader::with_capacity(128 * 1024, decoder)))
        }
        CompressionFormat::Plain => {
            if file.metadata()?.len() >= MMAP_THRESHOLD {
                // SAFETY: we assume the file is not modified while mapped
                let mmap = unsafe { Mmap::map(&file)? };
                Ok(Box::new(Cursor::new(mmap)))
            } else {
                Ok(Box::new(BufReader::with_capacity(128 * 1024, file)))
            }
        }
    }
}

/// Loading statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-empty lines seen
    pub lines: usize,
    /// Records parsed
    pub records: usize,
    /// Comment/directive lines
    pub comments: usize,
    /// Data lines skipped because they failed to parse
    pub skipped: usize,
}

/// Load all feature records from a GFF3/GTF file.
///
/// Dirty data lines are skipped with a warning, never fatal. With
/// `threads > 1`, data lines are parsed in rayon chunks; the collected
/// order equals input order either way.
pub fn load_features<P: AsRef<Path>>(
    path: P,
    format: SchemaFormat,
    threads: usize,
) -> Result<(Vec<FeatureRecord>, LoadStats)> {
    let reader = open_annotation_file(path.as_ref())?;
    load_features_from_reader(reader, format, threads)
}

/// Load feature records from any buffered reader (used directly by tests)
pub fn load_features_from_reader<R: BufRead>(
    reader: R,
    format: SchemaFormat,
    threads: usize,
) -> Result<(Vec<FeatureRecord>, LoadStats)> {
    let mut stats = LoadStats::default();
    let mut data_lines: Vec<String> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;
        if is_comment(line.as_bytes()) {
            stats.comments += 1;
            continue;
        }
        data_lines.push(line);
    }

    let parsed: Vec<std::result::Result<FeatureRecord, crate::core::RecordParseError>> =
        if threads <= 1 {
            data_lines
                .iter()
                .map(|line| parse_record(line.as_bytes(), format))
                .collect()
        } else {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| {
                    GffMergeError::Io(std::io::Error::other(format!(
                        "failed to build thread pool: {e}"
                    )))
                })?
                .install(|| {
                    data_lines
                        .par_chunks(CHUNK_SIZE)
                        .flat_map(|chunk| {
                            chunk
                                .iter()
                                .map(|line| parse_record(line.as_bytes(), format))
                                .collect::<Vec<_>>()
                        })
                        .collect()
                })
        };

    let mut records = Vec::with_capacity(parsed.len());
    for (result, line) in parsed.into_iter().zip(&data_lines) {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                stats.skipped += 1;
                warn!("skipping unparseable line ({e}): {line}");
            }
        }
    }
    stats.records = records.len();
    debug!(
        "loaded {} records ({} comments, {} skipped)",
        stats.records, stats.comments, stats.skipped
    );
    Ok((records, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const GTF: &str = "\
#comment line
chr1\thavana\ttranscript\t101\t500\t.\t+\t.\tgene_id \"g1\"; transcript_id \"tx1\";
chr1\thavana\texon\t101\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"tx1\";
not a gff line
chr1\thavana\texon\t301\t500\t.\t+\t.\tgene_id \"g1\"; transcript_id \"tx1\";
";

    #[test]
    fn test_load_counts_and_order() {
        let (records, stats) =
            load_features_from_reader(GTF.as_bytes(), SchemaFormat::Gtf, 1).unwrap();
        assert_eq!(stats.comments, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.records, 3);
        assert_eq!(records[0].ty, "transcript");
        assert_eq!(records[1].start, 100);
        assert_eq!(records[2].start, 300);
    }

    #[test]
    fn test_parallel_load_matches_sequential() {
        let (seq, _) = load_features_from_reader(GTF.as_bytes(), SchemaFormat::Gtf, 1).unwrap();
        let (par, _) = load_features_from_reader(GTF.as_bytes(), SchemaFormat::Gtf, 4).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_detect_compression_plain() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "chr1\t.\tgene\t1\t10\t.\t+\t.\t.").unwrap();
        temp.flush().unwrap();
        assert_eq!(
            detect_compression(temp.path()).unwrap(),
            CompressionFormat::Plain
        );
    }

    #[test]
    fn test_detect_compression_gzip_magic() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&[0x1f, 0x8b, 0x08, 0x00]).unwrap();
        temp.flush().unwrap();
        assert_eq!(
            detect_compression(temp.path()).unwrap(),
            CompressionFormat::Gzip
        );
    }

    #[test]
    fn test_load_gzip_file_matches_plain() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut plain = NamedTempFile::new().unwrap();
        plain.write_all(GTF.as_bytes()).unwrap();
        plain.flush().unwrap();

        let gz_path = plain.path().with_extension("gtf.gz");
        let gz_file = File::create(&gz_path).unwrap();
        let mut encoder = GzEncoder::new(gz_file, Compression::default());
        encoder.write_all(GTF.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let (from_plain, _) = load_features(plain.path(), SchemaFormat::Gtf, 1).unwrap();
        let (from_gz, _) = load_features(&gz_path, SchemaFormat::Gtf, 1).unwrap();
        assert_eq!(from_plain, from_gz);

        let _ = std::fs::remove_file(&gz_path);
    }
}
