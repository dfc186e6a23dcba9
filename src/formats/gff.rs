//! GFF3/GTF line parsing
//!
//! Converts raw annotation lines into `FeatureRecord`s with minimal
//! allocation. GFF uses 1-based closed coordinates on disk; records are
//! converted to the 0-based half-open convention the combiner works in.

use crate::core::{
    AttributeStyle, FeatureRecord, ParseResult, RecordParseError, SchemaFormat, Strand,
    attribute_pairs,
};
use memchr::memchr;

/// Attribute keys probed (lowercased, in priority order) for a record's
/// display name.
const DEFAULT_NAME_FIELDS: &[&str] = &["name", "alias", "id", "gene", "locus", "gene_name"];

/// Zero-copy view over one GFF3/GTF line
///
/// GFF format: seqname, source, feature, start, end, score, strand,
/// frame, attributes — exactly 9 tab-separated fields, coordinates
/// 1-based closed `[start, end]`.
pub struct GffLineView<'a> {
    /// Sequence name (chromosome)
    pub seqname: &'a str,
    /// Source field
    pub source: &'a str,
    /// Feature type
    pub feature: &'a str,
    /// Start position (1-based)
    pub start: u64,
    /// End position (1-based, inclusive)
    pub end: u64,
    /// Score field (as string, may be ".")
    pub score: &'a str,
    /// Strand
    pub strand: Option<Strand>,
    /// Frame field
    pub frame: &'a str,
    /// Attributes field
    pub attributes: &'a str,
}

impl<'a> GffLineView<'a> {
    /// Parse a GFF/GTF line with minimal allocation
    pub fn parse(line: &'a [u8]) -> ParseResult<Self> {
        if line.is_empty() {
            return Err(RecordParseError::EmptyLine);
        }

        // Find field boundaries using memchr for tab characters
        let mut field_bounds = Vec::with_capacity(9);
        let mut start_pos = 0;
        let mut pos = 0;

        while pos < line.len() {
            if let Some(tab_pos) = memchr(b'\t', &line[pos..]) {
                let end_pos = pos + tab_pos;
                field_bounds.push((start_pos, end_pos));
                start_pos = end_pos + 1;
                pos = start_pos;
            } else {
                // Last field
                field_bounds.push((start_pos, line.len()));
                break;
            }
        }

        if field_bounds.len() < 9 {
            return Err(RecordParseError::TooFewFields {
                expected: 9,
                found: field_bounds.len(),
            });
        }

        let get_field = |idx: usize, name: &'static str| -> ParseResult<&'a str> {
            let (start, end) = field_bounds[idx];
            std::str::from_utf8(&line[start..end]).map_err(|_| RecordParseError::InvalidUtf8(name))
        };

        let seqname = get_field(0, "seqname")?;
        let source = get_field(1, "source")?;
        let feature = get_field(2, "feature")?;

        let start_str = get_field(3, "start")?;
        let start: u64 = start_str
            .parse()
            .map_err(|_| RecordParseError::InvalidNumber("start", start_str.to_string()))?;

        let end_str = get_field(4, "end")?;
        let end: u64 = end_str
            .parse()
            .map_err(|_| RecordParseError::InvalidNumber("end", end_str.to_string()))?;

        let score = get_field(5, "score")?;
        let strand_str = get_field(6, "strand")?;
        let frame = get_field(7, "frame")?;
        let attributes = get_field(8, "attributes")?;

        let strand = match strand_str {
            "+" => Some(Strand::Plus),
            "-" => Some(Strand::Minus),
            "." | "?" => None,
            _ => return Err(RecordParseError::InvalidStrand(strand_str.to_string())),
        };

        Ok(Self {
            seqname,
            source,
            feature,
            start,
            end,
            score,
            strand,
            frame,
            attributes,
        })
    }
}

/// Parse one data line into a `FeatureRecord` under the given schema.
///
/// Identifier and parent extraction differ per schema: GFF3 reads the
/// `ID` and `Parent` attributes; GTF reads `transcript_id` (the implicit
/// grouping key) and `gene_id`. The display name comes from the first
/// conventional name key present.
pub fn parse_record(line: &[u8], format: SchemaFormat) -> ParseResult<FeatureRecord> {
    let view = GffLineView::parse(line)?;
    let style = match format {
        SchemaFormat::Gff3 => AttributeStyle::KeyValue,
        SchemaFormat::Gtf => AttributeStyle::KeyQuoted,
    };

    let pairs = attribute_pairs(view.attributes, style);
    let lookup = |key: &str| -> Option<&str> {
        pairs
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    };
    // Name keys are matched case-insensitively; ID/Parent keys are not.
    let lookup_ci = |key: &str| -> Option<&str> {
        pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    };

    let (id, parent) = match format {
        SchemaFormat::Gff3 => (lookup("ID"), lookup("Parent")),
        SchemaFormat::Gtf => (lookup("transcript_id"), lookup("gene_id")),
    };
    let name = DEFAULT_NAME_FIELDS.iter().find_map(|key| lookup_ci(key));

    let mut record = FeatureRecord::new(
        view.seqname,
        view.feature,
        // 1-based closed -> 0-based half-open
        view.start.saturating_sub(1),
        view.end,
    );
    record.strand = view.strand;
    record.style = style;
    record.id = id.map(str::to_string);
    record.parent = parent.map(str::to_string);
    record.name = name.map(str::to_string);
    record.attributes = Some(view.attributes.to_string());
    Ok(record)
}

/// True for comment and directive lines (`#...`, `##gff-version`, ...)
pub fn is_comment(line: &[u8]) -> bool {
    line.first() == Some(&b'#')
}
