//! Feature type classification
//!
//! GFF3/GTF files spell the same logical feature type many ways
//! (`mRNA`, `transcript`, `primary_transcript`, ...). The synonym sets
//! collapse to a closed enumeration computed once per record, so the
//! combiner dispatches on an enum instead of repeating string-set
//! membership checks at every call site.

/// Classification of a record's type column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureClass {
    /// Transcript-level container (`mRNA`, `transcript`, ...)
    Transcript,
    /// Exon block (`exon`, `coding-exon`)
    Exon,
    /// Coding sequence fragment (`CDS`, `cds`)
    Cds,
    /// Untranslated region (`UTR`, `five_prime_UTR`, ...)
    Utr,
    /// Start/stop codon marker; recognized but never attached
    Codon,
    /// Intron; consumed when its parent transcript is known, never attached
    Intron,
    /// Anything else passes through the combiner untouched
    Other,
}

impl FeatureClass {
    /// Classify a raw type string. The synonym sets are allow-lists:
    /// unknown type names map to `Other`, never to an error.
    pub fn of(ty: &str) -> Self {
        match ty {
            "transcript" | "primary_transcript" | "processed_transcript" | "mRNA" | "mrna" => {
                FeatureClass::Transcript
            }
            "exon" | "coding-exon" => FeatureClass::Exon,
            "CDS" | "cds" => FeatureClass::Cds,
            "5UTR" | "3UTR" | "UTR" | "five_prime_UTR" | "three_prime_UTR" | "3'-UTR"
            | "5'-UTR" => FeatureClass::Utr,
            "start_codon" | "stop_codon" => FeatureClass::Codon,
            "intron" => FeatureClass::Intron,
            _ => FeatureClass::Other,
        }
    }
}
