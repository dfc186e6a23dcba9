//! Feature combining
//!
//! Turns the flat record list from the parser into a reduced list where
//! exon/CDS/UTR/codon records are folded into transcript models and
//! everything else passes through. Two schema conventions are supported:
//! GTF groups related records by a shared identifier, GFF3 declares
//! explicit parent/child references (and occasionally splits one logical
//! feature across lines sharing an id, handled by a pre-merge pass).
//!
//! The whole combine step is a pure function of its input plus the
//! configuration: no global state, strictly sequential mutation, and a
//! stable final sort so equal-start records keep their input order.

use crate::core::classify::FeatureClass;
use crate::core::feature::{FeatureRecord, PopupEntry};
use crate::core::transcript::TranscriptModel;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Schema convention of the input records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaFormat {
    /// Explicit parent/child hierarchy, by-id pre-merge applies
    Gff3,
    /// Implicit grouping by shared identifier
    #[default]
    Gtf,
}

impl SchemaFormat {
    /// `"gff3"` selects the parent/child path; any other value selects
    /// the identifier-grouping GTF path.
    pub fn from_name(name: &str) -> Self {
        if name == "gff3" {
            SchemaFormat::Gff3
        } else {
            SchemaFormat::Gtf
        }
    }
}

/// One item of the combined output: either an untouched pass-through
/// record or an assembled transcript model.
#[derive(Debug, Clone, PartialEq)]
pub enum CombinedFeature {
    Record(FeatureRecord),
    Transcript(TranscriptModel),
}

impl CombinedFeature {
    pub fn start(&self) -> u64 {
        match self {
            CombinedFeature::Record(f) => f.start,
            CombinedFeature::Transcript(t) => t.start(),
        }
    }

    pub fn end(&self) -> u64 {
        match self {
            CombinedFeature::Record(f) => f.end,
            CombinedFeature::Transcript(t) => t.end(),
        }
    }

    pub fn chrom(&self) -> &str {
        match self {
            CombinedFeature::Record(f) => &f.chrom,
            CombinedFeature::Transcript(t) => &t.record().chrom,
        }
    }

    /// True if the half-open span contains the position
    pub fn contains(&self, position: u64) -> bool {
        position >= self.start() && position < self.end()
    }

    /// Popup projection for one genomic coordinate
    pub fn popup_data(&self, genomic_location: u64) -> Vec<PopupEntry> {
        match self {
            CombinedFeature::Record(f) => f.popup_data(),
            CombinedFeature::Transcript(t) => t.popup_data(genomic_location),
        }
    }

    pub fn as_transcript(&self) -> Option<&TranscriptModel> {
        match self {
            CombinedFeature::Transcript(t) => Some(t),
            CombinedFeature::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&FeatureRecord> {
        match self {
            CombinedFeature::Record(f) => Some(f),
            CombinedFeature::Transcript(_) => None,
        }
    }
}

/// Counters reported by a combine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineStats {
    /// Records received
    pub total: usize,
    /// Records removed by the drop-type filter
    pub dropped: usize,
    /// Transcript models assembled
    pub transcripts: usize,
    /// Records folded into a model (or consumed outright, e.g. introns)
    pub consumed: usize,
    /// Records passed through unchanged
    pub passthrough: usize,
}

/// Assembles transcript models from flat feature records
///
/// Constructed with a schema format and a set of type names dropped
/// unconditionally before processing (default: `{chromosome}`).
#[derive(Debug, Clone)]
pub struct FeatureCombiner {
    format: SchemaFormat,
    filter_types: HashSet<String>,
}

impl FeatureCombiner {
    /// Combiner with the default drop set
    pub fn new(format: SchemaFormat) -> Self {
        Self {
            format,
            filter_types: HashSet::from(["chromosome".to_string()]),
        }
    }

    /// Combiner with an explicit drop set
    pub fn with_filter_types<I, S>(format: SchemaFormat, filter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format,
            filter_types: filter_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Combine a flat record list into the reduced, sorted output
    pub fn combine(&self, features: Vec<FeatureRecord>) -> Vec<CombinedFeature> {
        self.combine_with_stats(features).0
    }

    /// Combine and report counters
    pub fn combine_with_stats(
        &self,
        features: Vec<FeatureRecord>,
    ) -> (Vec<CombinedFeature>, CombineStats) {
        let mut stats = CombineStats {
            total: features.len(),
            ..CombineStats::default()
        };
        let mut combined = match self.format {
            SchemaFormat::Gff3 => {
                let premerged = combine_features_by_id(features);
                self.combine_gff3(premerged, &mut stats)
            }
            SchemaFormat::Gtf => self.combine_gtf(features, &mut stats),
        };
        // Stable by construction: equal starts keep accumulator order.
        combined.sort_by_key(|f| f.start());
        (combined, stats)
    }

    /// GTF path: group by shared identifier across three type passes,
    /// lazily creating transcripts the file never declares explicitly.
    fn combine_gtf(
        &self,
        features: Vec<FeatureRecord>,
        stats: &mut CombineStats,
    ) -> Vec<CombinedFeature> {
        let features = self.drop_filtered(features, stats);
        let mut consumed = vec![false; features.len()];
        let mut transcripts: HashMap<String, TranscriptModel> = HashMap::new();
        // Creation order doubles as output order for the tie-breaking sort.
        let mut order: Vec<String> = Vec::new();

        // Pass 1: explicit transcript records seed the dictionary.
        for (i, f) in features.iter().enumerate() {
            if FeatureClass::of(&f.ty) != FeatureClass::Transcript {
                continue;
            }
            if let Some(id) = nonempty(&f.id) {
                if !transcripts.contains_key(id) {
                    order.push(id.to_string());
                }
                transcripts.insert(id.to_string(), TranscriptModel::from_seed(f.clone()));
                consumed[i] = true;
            }
        }

        // Pass 2: exons, creating implicit transcripts on demand.
        for (i, f) in features.iter().enumerate() {
            if FeatureClass::of(&f.ty) != FeatureClass::Exon {
                continue;
            }
            if let Some(id) = nonempty(&f.id) {
                let transcript = transcripts.entry(id.to_string()).or_insert_with(|| {
                    order.push(id.to_string());
                    TranscriptModel::from_seed(f.clone())
                });
                transcript.add_exon(f.clone());
                consumed[i] = true;
            }
        }

        // Pass 3: CDS and UTR fragments; codon records are recognized and
        // consumed but deliberately never attached.
        for (i, f) in features.iter().enumerate() {
            let class = FeatureClass::of(&f.ty);
            if !matches!(
                class,
                FeatureClass::Cds | FeatureClass::Utr | FeatureClass::Codon
            ) {
                continue;
            }
            if let Some(id) = nonempty(&f.id) {
                let transcript = transcripts.entry(id.to_string()).or_insert_with(|| {
                    order.push(id.to_string());
                    TranscriptModel::from_seed(f.clone())
                });
                match class {
                    FeatureClass::Utr => transcript.add_utr(f.clone()),
                    FeatureClass::Cds => transcript.add_cds(f.clone()),
                    _ => {}
                }
                consumed[i] = true;
            }
        }

        self.assemble(features, consumed, transcripts, order, stats)
    }

    /// GFF3 path: resolve explicit parent references. Runs after the
    /// by-id pre-merge. Transcripts with a parent matching a known gene
    /// record take it as their gene back-reference, consuming the gene.
    fn combine_gff3(
        &self,
        features: Vec<FeatureRecord>,
        stats: &mut CombineStats,
    ) -> Vec<CombinedFeature> {
        let features = self.drop_filtered(features, stats);
        let mut consumed = vec![false; features.len()];

        let gene_map: HashMap<&str, usize> = features
            .iter()
            .enumerate()
            .filter(|(_, f)| f.ty == "gene")
            .filter_map(|(i, f)| f.id.as_deref().map(|id| (id, i)))
            .collect();

        let mut transcripts: HashMap<String, TranscriptModel> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut consumed_genes: Vec<usize> = Vec::new();

        // Pass 1: transcript records, with gene attachment.
        for (i, f) in features.iter().enumerate() {
            if FeatureClass::of(&f.ty) != FeatureClass::Transcript {
                continue;
            }
            if let Some(id) = nonempty(&f.id) {
                let mut transcript = TranscriptModel::from_seed(f.clone());
                if let Some(parent) = nonempty(&f.parent) {
                    if let Some(&gi) = gene_map.get(parent) {
                        transcript.set_gene(features[gi].clone());
                        consumed_genes.push(gi);
                    }
                }
                if !transcripts.contains_key(id) {
                    order.push(id.to_string());
                }
                transcripts.insert(id.to_string(), transcript);
                consumed[i] = true;
            }
        }
        for gi in consumed_genes {
            consumed[gi] = true;
        }

        // Pass 2: exons fan out over every declared parent. An exon with
        // several parents is attached independently to each transcript.
        for (i, f) in features.iter().enumerate() {
            if FeatureClass::of(&f.ty) != FeatureClass::Exon {
                continue;
            }
            for id in parent_ids(&f.parent) {
                if let Some(transcript) = transcripts.get_mut(id) {
                    transcript.add_exon(f.clone());
                    consumed[i] = true;
                }
            }
        }

        // Pass 3: CDS/UTR fragments, same fan-out; codons consumed only.
        for (i, f) in features.iter().enumerate() {
            let class = FeatureClass::of(&f.ty);
            if !matches!(
                class,
                FeatureClass::Cds | FeatureClass::Utr | FeatureClass::Codon
            ) {
                continue;
            }
            for id in parent_ids(&f.parent) {
                if let Some(transcript) = transcripts.get_mut(id) {
                    match class {
                        FeatureClass::Utr => transcript.add_utr(f.clone()),
                        FeatureClass::Cds => transcript.add_cds(f.clone()),
                        _ => {}
                    }
                    consumed[i] = true;
                }
            }
        }

        // Introns whose parent resolves are discarded information: marked
        // consumed, never attached.
        for (i, f) in features.iter().enumerate() {
            if FeatureClass::of(&f.ty) != FeatureClass::Intron {
                continue;
            }
            if parent_ids(&f.parent).any(|id| transcripts.contains_key(id)) {
                consumed[i] = true;
            }
        }

        self.assemble(features, consumed, transcripts, order, stats)
    }

    fn drop_filtered(
        &self,
        features: Vec<FeatureRecord>,
        stats: &mut CombineStats,
    ) -> Vec<FeatureRecord> {
        let before = features.len();
        let kept: Vec<FeatureRecord> = features
            .into_iter()
            .filter(|f| !self.filter_types.contains(&f.ty))
            .collect();
        stats.dropped += before - kept.len();
        kept
    }

    /// Finish every model, then emit models in creation order followed by
    /// unconsumed records in input order. The caller's stable sort turns
    /// this accumulator order into the tie-breaking order.
    fn assemble(
        &self,
        features: Vec<FeatureRecord>,
        consumed: Vec<bool>,
        mut transcripts: HashMap<String, TranscriptModel>,
        order: Vec<String>,
        stats: &mut CombineStats,
    ) -> Vec<CombinedFeature> {
        stats.transcripts = order.len();
        stats.consumed = consumed.iter().filter(|&&c| c).count();

        let mut combined: Vec<CombinedFeature> = Vec::with_capacity(features.len());
        for id in order {
            let mut transcript = transcripts
                .remove(&id)
                .unwrap_or_else(|| unreachable!("transcript {id} created but not stored"));
            transcript.finish();
            combined.push(CombinedFeature::Transcript(transcript));
        }
        for (f, was_consumed) in features.into_iter().zip(consumed) {
            if !was_consumed {
                stats.passthrough += 1;
                combined.push(CombinedFeature::Record(f));
            }
        }
        combined
    }
}

/// Collapse records sharing an identifier and chromosome into one
/// composite record with an `exons` list. GFF3 occasionally splits one
/// logical feature across multiple lines sharing an id with no hierarchy
/// marker; this pre-merge reunites them before parent resolution runs.
pub fn combine_features_by_id(features: Vec<FeatureRecord>) -> Vec<FeatureRecord> {
    let mut without_id: Vec<FeatureRecord> = Vec::new();
    let mut by_chr_id: HashMap<(String, String), FeatureRecord> = HashMap::new();
    let mut order: Vec<(String, String)> = Vec::new();

    for f in features {
        let Some(id) = f.id.clone() else {
            without_id.push(f);
            continue;
        };
        let key = (f.chrom.clone(), id);
        match by_chr_id.entry(key) {
            Entry::Vacant(slot) => {
                order.push(slot.key().clone());
                slot.insert(f);
            }
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                if !stored.exons.is_empty() {
                    // Already a composite: widen and append.
                    stored.start = stored.start.min(f.start);
                    stored.end = stored.end.max(f.end);
                    stored.exons.push(f);
                } else {
                    // Second occurrence: promote both into a composite.
                    let mut composite = FeatureRecord::new(
                        f.chrom.clone(),
                        f.ty.clone(),
                        f.start.min(stored.start),
                        f.end.max(stored.end),
                    );
                    composite.id = f.id.clone();
                    composite.strand = f.strand;
                    composite.style = f.style;
                    if let Some(parent) = nonempty(&f.parent) {
                        composite.parent = Some(parent.to_string());
                    }
                    let first = std::mem::replace(stored, composite);
                    stored.exons = vec![first, f];
                }
            }
        }
    }

    for key in order {
        if let Some(f) = by_chr_id.remove(&key) {
            without_id.push(f);
        }
    }
    without_id
}

/// Non-empty (after trimming) optional string
fn nonempty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Iterate the comma-separated parent list of a record
fn parent_ids(parent: &Option<String>) -> impl Iterator<Item = &str> {
    nonempty(parent).into_iter().flat_map(|p| p.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ty: &str, start: u64, end: u64, id: Option<&str>) -> FeatureRecord {
        let mut f = FeatureRecord::new("chr1", ty, start, end);
        f.id = id.map(str::to_string);
        f
    }

    fn with_parent(mut f: FeatureRecord, parent: &str) -> FeatureRecord {
        f.parent = Some(parent.to_string());
        f
    }

    #[test]
    fn test_gtf_groups_by_shared_id() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
        let out = combiner.combine(vec![
            record("transcript", 100, 500, Some("tx1")),
            record("exon", 100, 200, Some("tx1")),
            record("exon", 300, 500, Some("tx1")),
            record("CDS", 150, 200, Some("tx1")),
        ]);
        assert_eq!(out.len(), 1);
        let tx = out[0].as_transcript().unwrap();
        assert_eq!(tx.exons().len(), 2);
        assert_eq!(tx.cd_start(), Some(150));
    }

    #[test]
    fn test_gtf_implicit_transcript_from_exon() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
        let out = combiner.combine(vec![
            record("exon", 100, 200, Some("tx1")),
            record("CDS", 120, 180, Some("tx1")),
        ]);
        assert_eq!(out.len(), 1);
        let tx = out[0].as_transcript().unwrap();
        assert_eq!(tx.record().ty, "exon");
        assert_eq!(tx.exons().len(), 1);
        assert_eq!(tx.exons()[0].cd_start, Some(120));
    }

    #[test]
    fn test_gtf_orphans_pass_through() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
        let out = combiner.combine(vec![
            record("exon", 100, 200, None),
            record("repeat_region", 300, 400, None),
        ]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|f| f.as_record().is_some()));
    }

    #[test]
    fn test_codons_consumed_but_not_attached() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
        let (out, stats) = combiner.combine_with_stats(vec![
            record("exon", 100, 500, Some("tx1")),
            record("start_codon", 100, 103, Some("tx1")),
        ]);
        assert_eq!(out.len(), 1);
        let tx = out[0].as_transcript().unwrap();
        assert_eq!(tx.exons().len(), 1);
        assert_eq!(stats.consumed, 2);
        assert_eq!(stats.passthrough, 0);
    }

    #[test]
    fn test_drop_set_removes_records() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
        let (out, stats) = combiner.combine_with_stats(vec![
            record("chromosome", 0, 1000, None),
            record("exon", 100, 200, Some("tx1")),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_gff3_multi_parent_exon() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gff3);
        let out = combiner.combine(vec![
            record("mRNA", 100, 500, Some("tx1")),
            record("mRNA", 100, 600, Some("tx2")),
            with_parent(record("exon", 100, 200, None), "tx1,tx2"),
        ]);
        assert_eq!(out.len(), 2);
        for f in &out {
            let tx = f.as_transcript().unwrap();
            assert_eq!(tx.exons().len(), 1);
        }
    }

    #[test]
    fn test_gff3_gene_attachment_consumes_gene() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gff3);
        let mut gene = record("gene", 100, 900, Some("g1"));
        gene.name = Some("Alpha".to_string());
        let out = combiner.combine(vec![
            gene,
            with_parent(record("mRNA", 100, 500, Some("tx1")), "g1"),
        ]);
        assert_eq!(out.len(), 1);
        let tx = out[0].as_transcript().unwrap();
        assert_eq!(tx.gene().unwrap().name.as_deref(), Some("Alpha"));
    }

    #[test]
    fn test_gff3_gene_backs_multiple_transcripts() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gff3);
        let out = combiner.combine(vec![
            record("gene", 100, 900, Some("g1")),
            with_parent(record("mRNA", 100, 500, Some("tx1")), "g1"),
            with_parent(record("mRNA", 200, 900, Some("tx2")), "g1"),
        ]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|f| f
            .as_transcript()
            .is_some_and(|t| t.gene().is_some())));
    }

    #[test]
    fn test_gff3_intron_consumed_without_attachment() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gff3);
        let (out, _) = combiner.combine_with_stats(vec![
            record("mRNA", 100, 500, Some("tx1")),
            with_parent(record("intron", 200, 300, None), "tx1"),
        ]);
        assert_eq!(out.len(), 1);
        assert!(out[0].as_transcript().unwrap().exons().is_empty());
    }

    #[test]
    fn test_gff3_unresolvable_parent_passes_through() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gff3);
        let out = combiner.combine(vec![with_parent(
            record("exon", 100, 200, None),
            "nosuch",
        )]);
        assert_eq!(out.len(), 1);
        assert!(out[0].as_record().is_some());
    }

    #[test]
    fn test_output_sorted_by_start() {
        let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
        let out = combiner.combine(vec![
            record("misc", 900, 950, None),
            record("exon", 100, 200, Some("tx1")),
            record("misc", 50, 80, None),
        ]);
        let starts: Vec<u64> = out.iter().map(|f| f.start()).collect();
        assert_eq!(starts, vec![50, 100, 900]);
    }

    #[test]
    fn test_combine_by_id_promotes_to_composite() {
        let out = combine_features_by_id(vec![
            record("match", 100, 200, Some("m1")),
            record("match", 300, 400, Some("m1")),
            record("match", 500, 600, Some("m1")),
        ]);
        assert_eq!(out.len(), 1);
        let composite = &out[0];
        assert_eq!(composite.start, 100);
        assert_eq!(composite.end, 600);
        assert_eq!(composite.exons.len(), 3);
    }

    #[test]
    fn test_combine_by_id_keeps_distinct_chroms_apart() {
        let mut other = record("match", 100, 200, Some("m1"));
        other.chrom = "chr2".to_string();
        let out = combine_features_by_id(vec![record("match", 100, 200, Some("m1")), other]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|f| f.exons.is_empty()));
    }

    #[test]
    fn test_combine_by_id_passes_unidentified_records() {
        let out = combine_features_by_id(vec![
            record("misc", 10, 20, None),
            record("match", 100, 200, Some("m1")),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].ty, "misc");
    }
}
