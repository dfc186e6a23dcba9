//! Transcript model assembly
//!
//! A `TranscriptModel` is one transcript under construction: a deep copy
//! of its seed record plus an ordered list of exon-like children. Every
//! attached record widens the model's genomic span; CDS fragments also
//! widen its coding span. `finish` reconciles implicit UTR status once
//! all passes are done.

use crate::core::feature::{FeatureRecord, PopupEntry};

/// Mutable aggregate for one transcript
///
/// Lifecycle: `from_seed` → any number of `add_*` calls in any order →
/// `finish` exactly once. Only `popup_data` is valid afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptModel {
    /// Seed copy; carries the widened span and coding span
    record: FeatureRecord,
    /// Ordered mixed list of exon, CDS and UTR records
    exons: Vec<FeatureRecord>,
    /// Associated gene record, used only for popup attribute lookup
    gene: Option<FeatureRecord>,
    finished: bool,
}

impl TranscriptModel {
    /// Build a model from a seed record. All seed fields are copied;
    /// any `exons` carried over from the by-id pre-merge are discarded
    /// because the model accumulates its own child list.
    pub fn from_seed(mut seed: FeatureRecord) -> Self {
        seed.exons.clear();
        Self {
            record: seed,
            exons: Vec::new(),
            gene: None,
            finished: false,
        }
    }

    pub fn start(&self) -> u64 {
        self.record.start
    }

    pub fn end(&self) -> u64 {
        self.record.end
    }

    pub fn cd_start(&self) -> Option<u64> {
        self.record.cd_start
    }

    pub fn cd_end(&self) -> Option<u64> {
        self.record.cd_end
    }

    /// The seed-derived record carrying the widened spans
    pub fn record(&self) -> &FeatureRecord {
        &self.record
    }

    /// Ordered child list; sorted by start once `finish` has run
    pub fn exons(&self) -> &[FeatureRecord] {
        &self.exons
    }

    pub fn gene(&self) -> Option<&FeatureRecord> {
        self.gene.as_ref()
    }

    /// Attach the gene record this transcript belongs to
    pub fn set_gene(&mut self, gene: FeatureRecord) {
        self.gene = Some(gene);
    }

    /// Append an exon and widen the transcript span. The span expansion
    /// covers transcripts not explicitly represented in the file.
    pub fn add_exon(&mut self, exon: FeatureRecord) {
        debug_assert!(!self.finished, "add_exon called after finish");
        self.record.start = self.record.start.min(exon.start);
        self.record.end = self.record.end.max(exon.end);
        self.exons.push(exon);
    }

    /// Fold a CDS fragment into the first exon that fully contains it,
    /// widening that exon's coding span. A CDS with no containing exon is
    /// promoted to act as its own exon (GTF files may omit exon lines).
    /// Always widens both the transcript span and its coding span.
    pub fn add_cds(&mut self, cds: FeatureRecord) {
        debug_assert!(!self.finished, "add_cds called after finish");
        self.record.start = self.record.start.min(cds.start);
        self.record.end = self.record.end.max(cds.end);
        self.record.cd_start = Some(match self.record.cd_start {
            Some(v) => v.min(cds.start),
            None => cds.start,
        });
        self.record.cd_end = Some(match self.record.cd_end {
            Some(v) => v.max(cds.end),
            None => cds.end,
        });

        match self.containing_exon(cds.start, cds.end) {
            Some(i) => {
                let exon = &mut self.exons[i];
                exon.cd_start = Some(match exon.cd_start {
                    Some(v) => v.min(cds.start),
                    None => cds.start,
                });
                exon.cd_end = Some(match exon.cd_end {
                    Some(v) => v.max(cds.end),
                    None => cds.end,
                });
                // An exon may carry several coding fragments (e.g. split
                // around a stop codon) without being duplicated.
                exon.children.push(cds);
            }
            None => {
                let mut cds = cds;
                cds.cd_start = Some(cds.start);
                cds.cd_end = Some(cds.end);
                self.exons.push(cds);
            }
        }
    }

    /// Fold a UTR fragment into the first exon that fully contains it.
    /// An exact span match flags the exon wholly untranslated; a partial
    /// overlap clips the exon's coding boundary inward on the overlapping
    /// side. A UTR with no containing exon joins the exon list directly,
    /// flagged wholly UTR. Widens the transcript span only.
    pub fn add_utr(&mut self, utr: FeatureRecord) {
        debug_assert!(!self.finished, "add_utr called after finish");
        self.record.start = self.record.start.min(utr.start);
        self.record.end = self.record.end.max(utr.end);

        match self.containing_exon(utr.start, utr.end) {
            Some(i) => {
                let exon = &mut self.exons[i];
                if utr.start == exon.start && utr.end == exon.end {
                    exon.utr = true;
                } else {
                    if utr.end < exon.end {
                        exon.cd_start = Some(utr.end);
                    }
                    if utr.start > exon.start {
                        exon.cd_end = Some(utr.start);
                    }
                }
                exon.children.push(utr);
            }
            None => {
                let mut utr = utr;
                utr.utr = true;
                self.exons.push(utr);
            }
        }
    }

    /// Sort the child list by start (records arrive out of genomic order
    /// across the scattered passes) and recover untagged UTR exons: any
    /// exon lying entirely outside the coding span is flagged wholly UTR.
    /// Sources like GTF mark CDS explicitly but never mark UTR.
    pub fn finish(&mut self) {
        self.exons.sort_by_key(|e| e.start);
        if let (Some(cd_start), Some(cd_end)) = (self.record.cd_start, self.record.cd_end) {
            for exon in &mut self.exons {
                if exon.end < cd_start || exon.start > cd_end {
                    exon.utr = true;
                }
            }
        }
        self.finished = true;
    }

    /// Read-only projection for one genomic coordinate: the gene's own
    /// projection first when present, then the transcript's fields, then
    /// the projection of every child exon containing the coordinate along
    /// with that exon's nested fragments.
    pub fn popup_data(&self, genomic_location: u64) -> Vec<PopupEntry> {
        let mut pd = Vec::new();
        if let Some(gene) = &self.gene {
            pd.extend(gene.popup_data());
            pd.push(PopupEntry::Divider);
        }
        pd.extend(self.record.popup_data());
        for exon in &self.exons {
            if exon.contains(genomic_location) {
                pd.push(PopupEntry::Divider);
                pd.extend(exon.popup_data());
                for child in &exon.children {
                    pd.push(PopupEntry::Divider);
                    pd.extend(child.popup_data());
                }
            }
        }
        pd
    }

    /// First exon in insertion order whose span fully contains [start, end)
    fn containing_exon(&self, start: u64, end: u64) -> Option<usize> {
        self.exons
            .iter()
            .position(|e| e.start <= start && e.end >= end)
    }
}
