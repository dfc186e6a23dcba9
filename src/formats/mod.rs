//! Input/output format adapters
//!
//! GFF3/GTF line parsing and file loading on the way in, BED
//! serialization on the way out.

pub mod bed;
pub mod gff;
pub mod load;

pub use bed::write_bed;
pub use gff::{parse_record, GffLineView};
pub use load::{
    detect_compression, load_features, load_features_from_reader, CompressionFormat, LoadStats,
};
