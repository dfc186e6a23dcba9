//! gffmerge - Transcript model assembly for genome browsers
//!
//! Assembles flat GFF3/GTF annotation records into hierarchical
//! transcript models: exon/CDS/UTR records belonging to the same
//! transcript are merged into one composite feature carrying an ordered
//! child list, and unrelated records pass through unchanged.
//!
//! # Features
//!
//! - GTF identifier grouping and GFF3 parent/child resolution
//! - Deterministic output: stable sort by start position
//! - Transparent gzip/bzip2 input, parallel parsing with rayon
//! - Popup projections for interactive tooltips
//!
//! # Example
//!
//! ```ignore
//! use gffmerge::core::{FeatureCombiner, SchemaFormat};
//! use gffmerge::formats::load_features;
//!
//! let (records, _) = load_features("annotation.gtf.gz", SchemaFormat::Gtf, 1)?;
//! let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
//! let combined = combiner.combine(records);
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use crate::core::{
    AttributeStyle, CombineStats, CombinedFeature, FeatureClass, FeatureCombiner, FeatureRecord,
    GffMergeError, PopupEntry, RecordParseError, Result, SchemaFormat, Strand, TranscriptModel,
};
pub use crate::formats::{load_features, write_bed, LoadStats};
