//! Core transcript assembly functionality
//!
//! This module contains the feature record model, the type-synonym
//! classifier, the transcript model, and the feature combiner.

mod classify;
mod combiner;
mod error;
mod feature;
pub mod numfmt;
mod transcript;

pub use classify::FeatureClass;
pub use combiner::{
    combine_features_by_id, CombineStats, CombinedFeature, FeatureCombiner, SchemaFormat,
};
pub use error::{GffMergeError, ParseResult, RecordParseError, Result};
pub use feature::{attribute_pairs, AttributeStyle, FeatureRecord, PopupEntry, Strand};
pub use transcript::TranscriptModel;
