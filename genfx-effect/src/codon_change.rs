//!
//! Codon level consequences of a variant on one transcript.
//!
//! Substitutions and insertions are analysed exon by exon, walking the
//! transcript in transcription order and counting coding bases. Deletions,
//! duplications, inversions and MIXED variants may span several exons; their
//! codons come from applying the variant to the whole coding sequence.
//!
use genfx_core::codon_table::{CODON_SIZE, CodonTable};
use genfx_core::models::{Located, Marker, MarkerId, Pos, TranscriptView, Variant, VariantType};
use genfx_core::utils::{common_prefix_len, common_suffix_len, complement, reverse_complement};

use crate::effect_type::{EffectImpact, EffectType, ErrorWarningType};
use crate::errors::{EffectError, EffectResult};
use crate::variant_effect::{VariantEffect, VariantEffects};

///
/// Genomic position of every coding base, in transcription order.
///
#[derive(Debug, Clone)]
pub struct CdsMap {
    minus: bool,
    positions: Vec<Pos>,
}

impl CdsMap {
    pub fn new(tr: &TranscriptView<'_>) -> Self {
        let minus = tr.is_minus();
        let mut positions = Vec::new();
        for exon in tr.transcription_order() {
            if let Some((start, end)) = tr.coding_range(exon) {
                if minus {
                    positions.extend((start..=end).rev());
                } else {
                    positions.extend(start..=end);
                }
            }
        }
        CdsMap { minus, positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// CDS base number of a genomic position, `None` outside coding bases.
    pub fn index_of(&self, pos: Pos) -> Option<usize> {
        let found = if self.minus {
            self.positions.binary_search_by(|p| pos.cmp(p))
        } else {
            self.positions.binary_search(&pos)
        };
        found.ok()
    }

    /// First and last CDS base inside `[start, end]`.
    pub fn covered(&self, start: Pos, end: Pos) -> Option<(usize, usize)> {
        let mut hits = self
            .positions
            .iter()
            .enumerate()
            .filter(|&(_, &p)| start <= p && p <= end)
            .map(|(i, _)| i);
        let first = hits.next()?;
        let last = hits.last().unwrap_or(first);
        Some((first, last))
    }

    ///
    /// Coding sequence after applying `variant`, or `None` when the variant
    /// touches no coding base or the sequence does not match the map.
    ///
    pub fn apply(&self, variant: &Variant, cds: &str) -> Option<String> {
        if cds.len() != self.positions.len() {
            return None;
        }
        let (first, last) = self.covered(variant.start, variant.end)?;

        let replacement = match variant.variant_type {
            VariantType::Ins => {
                // inserted before `start` on the genome, after it on a minus strand CDS
                let at = if self.minus { first + 1 } else { first };
                let inserted = variant.net_change(self.minus);
                return Some(format!("{}{}{}", cds.get(..at)?, inserted, cds.get(at..)?));
            }
            VariantType::Snp | VariantType::Mnp => {
                let mut bases = cds.as_bytes().to_vec();
                for (i, base) in variant.alt.chars().enumerate() {
                    if let Some(idx) = self.index_of(variant.start + i as Pos) {
                        let base = if self.minus { complement(base) } else { base };
                        bases[idx] = base as u8;
                    }
                }
                return String::from_utf8(bases).ok();
            }
            VariantType::Del => String::new(),
            VariantType::Dup => cds.get(first..=last)?.repeat(2),
            VariantType::Inv => reverse_complement(cds.get(first..=last)?),
            VariantType::Mixed => variant.net_change(self.minus),
            _ => return None,
        };

        Some(format!("{}{}{}", cds.get(..first)?, replacement, cds.get(last + 1..)?))
    }
}

/// Smallest run of whole codons covering the difference between two coding sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct CodonWindow {
    pub codon_num: usize,
    pub codon_index: usize,
    pub codons_ref: String,
    pub codons_alt: String,
    /// Alternative minus reference length
    pub len_diff: i64,
}

impl CodonWindow {
    pub fn new(cds_ref: &str, cds_alt: &str) -> Option<CodonWindow> {
        let (r, a) = (cds_ref.as_bytes(), cds_alt.as_bytes());
        let prefix = common_prefix_len(r, a);
        if prefix == r.len() && prefix == a.len() {
            return None;
        }
        let suffix = common_suffix_len(r, a, prefix);

        let start = prefix / CODON_SIZE * CODON_SIZE;
        let codon_end = |len: usize| ((len - suffix).div_ceil(CODON_SIZE) * CODON_SIZE).clamp(start, len);
        let ref_end = codon_end(r.len());
        let alt_end = codon_end(a.len());

        Some(CodonWindow {
            codon_num: prefix / CODON_SIZE,
            codon_index: prefix % CODON_SIZE,
            codons_ref: cds_ref.get(start..ref_end)?.to_string(),
            codons_alt: cds_alt.get(start..alt_end)?.to_string(),
            len_diff: a.len() as i64 - r.len() as i64,
        })
    }
}

/// Lower case codons with the bases at `changed` in upper case.
fn mark_changed(codons: &str, changed: impl Fn(usize) -> bool) -> String {
    codons
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if changed(i) {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

///
/// Add the codon level effects of `variant` on `tr` to `effects`.
///
pub fn codon_change<'g>(variant: &Variant, tr: TranscriptView<'g>, effects: &mut VariantEffects<'g>) -> EffectResult<()> {
    CodonChange::new(variant, tr, effects).run()
}

pub struct CodonChange<'a, 'g> {
    variant: &'a Variant,
    tr: TranscriptView<'g>,
    table: &'static CodonTable,
    effects: &'a mut VariantEffects<'g>,
    codon_start_num: usize,
    codon_start_index: usize,
    net_cds_change: String,
}

impl<'a, 'g> CodonChange<'a, 'g> {
    pub fn new(variant: &'a Variant, tr: TranscriptView<'g>, effects: &'a mut VariantEffects<'g>) -> Self {
        CodonChange {
            variant,
            tr,
            table: tr.codon_table(),
            effects,
            codon_start_num: 0,
            codon_start_index: 0,
            net_cds_change: String::new(),
        }
    }

    pub fn run(mut self) -> EffectResult<()> {
        if !self.tr.marker.intersects(self.variant) {
            return Ok(());
        }

        match self.variant.variant_type {
            VariantType::Snp => self.exon_loop(),
            VariantType::Ins if self.variant.start == self.tr.cds_min() || self.variant.start == self.tr.cds_max() => {
                self.insertion_at_cds_edge();
                Ok(())
            }
            VariantType::Ins => self.exon_loop(),
            VariantType::Mnp => {
                self.mnp();
                Ok(())
            }
            VariantType::Mixed => {
                self.mixed();
                Ok(())
            }
            VariantType::Del | VariantType::Dup | VariantType::Inv => self.structural(),
            VariantType::Interval => {
                self.interval();
                Ok(())
            }
            VariantType::Bnd | VariantType::None => Ok(()),
        }
    }

    fn minus(&self) -> bool {
        self.tr.is_minus()
    }

    fn exons(&self) -> Vec<(MarkerId, &'g Marker)> {
        let genome = self.tr.genome;
        let mut exons: Vec<(MarkerId, &'g Marker)> = self
            .tr
            .exon_ids()
            .iter()
            .filter_map(|&id| genome.get(id).map(|m| (id, m)))
            .collect();
        if self.minus() {
            exons.reverse();
        }
        exons
    }

    /// First exon (genomic order) touched by the variant.
    fn first_exon_hit(&self) -> Option<MarkerId> {
        let genome = self.tr.genome;
        self.tr
            .exon_ids()
            .iter()
            .copied()
            .find(|&id| genome.get(id).is_some_and(|e| e.intersects(self.variant)))
    }

    ///
    /// Walk exons in transcription order, locating the first affected codon
    /// and handing every hit exon to the per type analysis.
    ///
    fn exon_loop(&mut self) -> EffectResult<()> {
        let minus = self.minus();
        let cds_start = self.tr.cds_start();
        let v = self.variant;

        let mut first_cds_base_in_exon: Pos = 0;
        let mut codon_set = false;
        for (id, exon) in self.exons() {
            if exon.intersects(v) {
                let cds_base_in_exon = if minus {
                    exon.end.min(cds_start) - v.end.min(exon.end).min(cds_start)
                } else {
                    v.start.max(exon.start).max(cds_start) - exon.start.max(cds_start)
                };

                if !codon_set {
                    let base = (first_cds_base_in_exon + cds_base_in_exon.max(0)) as usize;
                    self.codon_start_num = base / CODON_SIZE;
                    self.codon_start_index = base % CODON_SIZE;
                    codon_set = true;
                }

                let done = match v.variant_type {
                    VariantType::Snp => {
                        self.snp(id);
                        true
                    }
                    VariantType::Ins => {
                        self.insertion(id);
                        true
                    }
                    VariantType::Del => self.deletion_in_exon(id)?,
                    _ => true,
                };
                if done {
                    return Ok(());
                }
            }

            let coding = if minus {
                cds_start.min(exon.end) - exon.start + 1
            } else {
                exon.end - exon.start.max(cds_start) + 1
            };
            first_cds_base_in_exon += coding.max(0);
        }
        Ok(())
    }

    /// `count` codons starting at the current codon, padded with `N`.
    fn codons_ref(&self, count: usize) -> String {
        let cds = self.tr.cds();
        let start = self.codon_start_num * CODON_SIZE;
        let end = (start + count * CODON_SIZE).min(cds.len());
        let mut codons = cds.get(start..end).unwrap_or_default().to_string();
        if !codons.is_empty() {
            while codons.len() % CODON_SIZE != 0 {
                codons.push('N');
            }
        }
        codons
    }

    fn snp(&mut self, exon: MarkerId) {
        let codon = self.codons_ref(1);
        if codon.is_empty() {
            let mut effect = VariantEffect::new(self.variant, Some(exon), EffectType::CodonChange);
            effect.add_error_warning(ErrorWarningType::ErrorMissingCdsSequence);
            self.effects.add(effect);
            return;
        }

        let idx = self.codon_start_index;
        let alt_base = self.variant.net_change(self.minus()).chars().next().unwrap_or('N');
        let codons_ref = mark_changed(&codon, |i| i == idx);
        let codons_alt: String = codons_ref
            .chars()
            .enumerate()
            .map(|(i, c)| if i == idx { alt_base.to_ascii_uppercase() } else { c })
            .collect();

        self.effect(Some(exon), EffectType::CodonChange, &codons_ref, &codons_alt, true);
    }

    fn insertion(&mut self, exon: MarkerId) {
        let net_change = self.variant.net_change(self.minus());
        let codons_ref = self.codons_ref(1);

        let idx = (self.codon_start_index + usize::from(self.minus())).min(codons_ref.len());
        let codons_alt = format!("{}{}{}", &codons_ref[..idx], net_change, &codons_ref[idx..]);

        let effect_type = if net_change.len() % CODON_SIZE != 0 {
            EffectType::FrameShift
        } else if self.codon_start_index == 0 {
            EffectType::CodonInsertion
        } else if codons_alt.to_uppercase().starts_with(&codons_ref.to_uppercase()) {
            EffectType::CodonInsertion
        } else {
            EffectType::CodonChangePlusCodonInsertion
        };

        self.effect(Some(exon), effect_type, &codons_ref, &codons_alt, false);
    }

    /// Insertion at the first or last coding base (genomic order).
    fn insertion_at_cds_edge(&mut self) {
        let exon = self.tr.find_exon_id(self.variant.start);
        let at_left = self.variant.start == self.tr.cds_min();
        let (effect_type, codon_num) = if at_left != self.minus() {
            (EffectType::FrameShiftBeforeCdsStart, 0)
        } else {
            (EffectType::FrameShiftAfterCdsEnd, self.tr.protein().chars().count())
        };
        self.codon_start_num = codon_num;
        self.codon_start_index = 0;
        self.effect(exon, effect_type, "", "", false);
    }

    fn mnp(&mut self) {
        let cds = self.tr.cds();
        let map = CdsMap::new(&self.tr);
        let Some((first, last)) = map.covered(self.variant.start, self.variant.end) else {
            return;
        };
        let exon = map.positions.get(first).and_then(|&p| self.tr.find_exon_id(p));

        let Some(cds_alt) = map.apply(self.variant, cds) else {
            let mut effect = VariantEffect::new(self.variant, exon, EffectType::CodonChange);
            effect.add_error_warning(ErrorWarningType::ErrorMissingCdsSequence);
            self.effects.add(effect);
            return;
        };

        self.codon_start_num = first / CODON_SIZE;
        self.codon_start_index = first % CODON_SIZE;
        let start = self.codon_start_num * CODON_SIZE;
        let end = ((last / CODON_SIZE + 1) * CODON_SIZE).min(cds.len());

        let (r, a) = (&cds[start..end], &cds_alt[start..end]);
        let changed = |i: usize| r.as_bytes()[i] != a.as_bytes()[i];
        let codons_ref = mark_changed(r, changed);
        let codons_alt = mark_changed(a, changed);

        self.effect(exon, EffectType::CodonChange, &codons_ref, &codons_alt, true);
    }

    fn mixed(&mut self) {
        let Some(window) = self.cds_window() else {
            return;
        };
        let effect_type = if window.len_diff % CODON_SIZE as i64 != 0 {
            EffectType::FrameShift
        } else if window.len_diff > 0 {
            EffectType::CodonChangePlusCodonInsertion
        } else if window.len_diff < 0 {
            EffectType::CodonChangePlusCodonDeletion
        } else {
            EffectType::CodonChange
        };
        self.codon_start_num = window.codon_num;
        self.codon_start_index = window.codon_index;
        self.effect(
            self.first_exon_hit(),
            effect_type,
            &window.codons_ref,
            &window.codons_alt,
            false,
        );
    }

    fn interval(&mut self) {
        for (id, exon) in self.exons() {
            if !exon.intersects(self.variant) {
                continue;
            }
            let coding = self
                .tr
                .coding_range(exon)
                .is_some_and(|(s, e)| self.variant.intersects_range(s, e));
            let effect_type = if coding { EffectType::Cds } else { EffectType::Exon };
            self.effect_no_codon(Some(id), effect_type, None);
        }
    }

    fn cds_window(&self) -> Option<CodonWindow> {
        let cds = self.tr.cds();
        if cds.is_empty() {
            return None;
        }
        let cds_alt = CdsMap::new(&self.tr).apply(self.variant, cds)?;
        CodonWindow::new(cds, &cds_alt)
    }

    ///
    /// DEL, DUP and INV: whole transcript, whole exons, partial exons or
    /// only an intron.
    ///
    fn structural(&mut self) -> EffectResult<()> {
        let v = self.variant;
        if v.includes(self.tr.marker) {
            let (effect_type, impact) = match v.variant_type {
                VariantType::Del => (EffectType::TranscriptDeleted, None),
                VariantType::Dup => (EffectType::TranscriptDuplication, Some(EffectImpact::Low)),
                _ => (EffectType::TranscriptInversion, None),
            };
            self.effect_no_codon(Some(self.tr.id), effect_type, impact);
            return Ok(());
        }

        let (mut full, mut partial) = (0, 0);
        for (_, exon) in self.exons() {
            if v.includes(exon) {
                full += 1;
            } else if v.intersects(exon) {
                partial += 1;
            }
        }

        if full == 0 && partial == 0 {
            self.effect_no_codon(Some(self.tr.id), EffectType::Intron, None);
            return Ok(());
        }

        let (exon_full, exon_partial) = match v.variant_type {
            VariantType::Del => (EffectType::ExonDeleted, EffectType::ExonDeletedPartial),
            VariantType::Dup => (EffectType::ExonDuplication, EffectType::ExonDuplicationPartial),
            _ => (EffectType::ExonInversion, EffectType::ExonInversionPartial),
        };

        if !self.tr.is_protein_coding() {
            if full > 0 {
                self.effect_no_codon(Some(self.tr.id), exon_full, Some(EffectImpact::Modifier));
            }
            if partial > 0 {
                self.effect_no_codon(Some(self.tr.id), exon_partial, Some(EffectImpact::Modifier));
            }
            return Ok(());
        }

        match v.variant_type {
            VariantType::Del => self.deletion(full, partial),
            _ => {
                self.rearrangement(full, partial, exon_full, exon_partial);
                Ok(())
            }
        }
    }

    /// Deleted bases inside exons, in transcription order.
    fn deletion_net_cds_change(&self) -> String {
        if self.variant.size() > 1 {
            self.exons()
                .iter()
                .map(|(_, exon)| self.variant.net_change_in(*exon))
                .collect()
        } else {
            self.variant.net_change(self.minus())
        }
    }

    fn deletion(&mut self, full: usize, partial: usize) -> EffectResult<()> {
        if full == 0 && partial == 1 {
            self.net_cds_change = self.deletion_net_cds_change();
            return self.exon_loop();
        }

        if full > 0 {
            for (id, exon) in self.exons() {
                if self.variant.includes(exon) {
                    self.effect_no_codon(Some(id), EffectType::ExonDeleted, None);
                }
            }
            if partial == 0 {
                return Ok(());
            }
        }

        let Some(window) = self.cds_window() else {
            return Ok(());
        };
        let effect_type = if window.len_diff % CODON_SIZE as i64 != 0 {
            EffectType::FrameShift
        } else if window.codon_index == 0
            || window.codons_alt.is_empty()
            || window.codons_ref.starts_with(&window.codons_alt)
        {
            EffectType::CodonDeletion
        } else {
            EffectType::CodonChangePlusCodonDeletion
        };
        self.codon_start_num = window.codon_num;
        self.codon_start_index = window.codon_index;
        self.effect(
            self.first_exon_hit(),
            effect_type,
            &window.codons_ref,
            &window.codons_alt,
            false,
        );
        Ok(())
    }

    /// CDS base number of `pos`, clamped to the CDS.
    fn cds_base_number(&self, pos: Pos) -> usize {
        if let Some(base) = self.tr.base_number_cds(pos, true) {
            return base;
        }
        let last = self.tr.cds().len().saturating_sub(1);
        let before_min = pos < self.tr.cds_min();
        if before_min != self.minus() { 0 } else { last }
    }

    fn deletion_codons_ref(&self) -> EffectResult<String> {
        let mut min = self.cds_base_number(self.variant.start);
        let mut max = self.cds_base_number(self.variant.end);
        if self.minus() {
            std::mem::swap(&mut min, &mut max);
        }
        if max < min {
            return Err(EffectError::InvertedCdsRange {
                variant: self.variant.to_string(),
                transcript: self.tr.transcript_id().to_string(),
                start: min,
                end: max,
            });
        }

        let cds = self.tr.cds();
        let start = min / CODON_SIZE * CODON_SIZE;
        let end = ((max / CODON_SIZE + 1) * CODON_SIZE).min(cds.len());
        Ok(cds.get(start..end).unwrap_or_default().to_string())
    }

    /// Deletion restricted to a single exon. Returns whether the walk can stop.
    fn deletion_in_exon(&mut self, exon_id: MarkerId) -> EffectResult<bool> {
        if self.net_cds_change.is_empty() {
            return Ok(false);
        }
        let genome = self.tr.genome;
        if self.variant.includes(&genome[exon_id]) {
            self.effect_no_codon(Some(exon_id), EffectType::ExonDeleted, None);
            return Ok(false);
        }

        let net_len = self.net_cds_change.len();
        let idx = self.codon_start_index;
        let codons_ref = self.deletion_codons_ref()?;
        let (effect_type, codons_alt) = if net_len % CODON_SIZE != 0 {
            (EffectType::FrameShift, String::new())
        } else if idx == 0 {
            (EffectType::CodonDeletion, String::new())
        } else {
            let prefix = codons_ref.get(..idx).unwrap_or(&codons_ref);
            let suffix = codons_ref.get(idx + net_len..).unwrap_or_default();
            let codons_alt = format!("{}{}", prefix, suffix);
            if codons_alt.is_empty() || codons_ref.starts_with(&codons_alt) {
                (EffectType::CodonDeletion, codons_alt)
            } else {
                (EffectType::CodonChangePlusCodonDeletion, codons_alt)
            }
        };

        self.effect(Some(exon_id), effect_type, &codons_ref, &codons_alt, false);
        Ok(false)
    }

    /// Duplications and inversions of exonic bases.
    fn rearrangement(&mut self, full: usize, partial: usize, exon_full: EffectType, exon_partial: EffectType) {
        let main = if full > 0 { exon_full } else { exon_partial };
        let marker = self.first_exon_hit();

        let Some(window) = self.cds_window() else {
            // only UTR bases, or an inversion of a reverse complement palindrome
            let mut effect = VariantEffect::with_impact(self.variant, marker, main, EffectImpact::Low);
            if full > 0 && partial > 0 {
                effect.add_effect_with_impact(exon_partial, EffectImpact::Low);
            }
            self.effects.add(effect);
            return;
        };

        self.codon_start_num = window.codon_num;
        self.codon_start_index = window.codon_index;
        let mut effect = self.codon_effect(marker, main, &window.codons_ref, &window.codons_alt, false);
        if full > 0 && partial > 0 {
            effect.add_effect(exon_partial);
        }
        if window.len_diff % CODON_SIZE as i64 != 0 {
            effect.add_effect(EffectType::FrameShift);
        }
        self.effects.add(effect);
    }

    fn effect_no_codon(&mut self, marker: Option<MarkerId>, effect_type: EffectType, impact: Option<EffectImpact>) {
        let effect = match impact {
            Some(impact) => VariantEffect::with_impact(self.variant, marker, effect_type, impact),
            None => VariantEffect::new(self.variant, marker, effect_type),
        };
        self.effects.add(effect);
    }

    fn effect(
        &mut self,
        marker: Option<MarkerId>,
        effect_type: EffectType,
        codons_ref: &str,
        codons_alt: &str,
        allow_replace: bool,
    ) {
        let effect = self.codon_effect(marker, effect_type, codons_ref, codons_alt, allow_replace);
        self.effects.add(effect);
    }

    ///
    /// Effect carrying the current codon change. Start and stop codon
    /// changes are added on top of `effect_type`, or replace it when
    /// `allow_replace` is set and they rank higher.
    ///
    fn codon_effect(
        &self,
        marker: Option<MarkerId>,
        effect_type: EffectType,
        codons_ref: &str,
        codons_alt: &str,
        allow_replace: bool,
    ) -> VariantEffect {
        let mut effect = VariantEffect::new(self.variant, marker, effect_type);
        effect.set_codons(
            codons_ref,
            codons_alt,
            self.codon_start_num,
            self.codon_start_index,
            self.table,
        );
        effect.cdna_pos = self.tr.base_number_mrna(self.variant.start);

        if !codons_ref.is_empty() {
            if let Some(extra) = self.additional_effect(codons_ref, codons_alt) {
                if extra != effect_type {
                    if allow_replace && extra < effect_type {
                        effect.set_effect(extra);
                    } else {
                        effect.add_effect(extra);
                    }
                }
            }
        }
        effect
    }

    /// Start/stop gains and losses, and synonymous/non-synonymous for substitutions.
    fn additional_effect(&self, codons_old: &str, codons_new: &str) -> Option<EffectType> {
        let table = self.table;
        let first_codon = self.codon_start_num == 0;
        let start_old = first_codon && table.is_start_first(codons_old);
        let (stop_old, stop_new) = (table.is_stop(codons_old), table.is_stop(codons_new));

        if self.variant.is_snp() || self.variant.is_mnp() {
            let same_aa = table.aa(codons_old) == table.aa(codons_new);
            let effect_type = match (start_old, stop_old) {
                (true, _) if table.is_start_first(codons_new) => {
                    if same_aa {
                        EffectType::SynonymousStart
                    } else {
                        EffectType::NonSynonymousStart
                    }
                }
                (true, _) => EffectType::StartLost,
                (false, true) if stop_new => {
                    if same_aa {
                        EffectType::SynonymousStop
                    } else {
                        EffectType::NonSynonymousStop
                    }
                }
                (false, true) => EffectType::StopLost,
                (false, false) if same_aa => EffectType::SynonymousCoding,
                (false, false) if stop_new => EffectType::StopGained,
                (false, false) => EffectType::NonSynonymousCoding,
            };
            return Some(effect_type);
        }

        if start_old && !table.is_start_first(codons_new) {
            Some(EffectType::StartLost)
        } else if stop_old && !stop_new {
            Some(EffectType::StopLost)
        } else if !stop_old && stop_new {
            Some(EffectType::StopGained)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genfx_core::config::Config;
    use genfx_core::models::{Genome, GenomeBuilder, Strand};
    use pretty_assertions::assert_eq;
    use rstest::*;

    //                0         1         2         3         4         5
    //                012345678901234567890123456789012345678901234567890123456789
    const SEQ: &str = "GCTAAAGACAATTACATAACATACACGTCATGAAACCCGGGTTTACGTGCGTGTGAATCG\
                       CTTAAGGGTTAAGTAAGTAGAAGCTGGATCATTCGGCAACCTGGTAACACCCCATCGGAC\
                       TGGCATTTTTATTACACTCAGAAACAGAACCTAGGTCCAATGTTCTGGGAAGCCTTTAGC\
                       CATCCCTCCTGAAGTGCGTGGACACTCGCTATGAATCTCTGATTTACCCACTCTGCCAAA\
                       CTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATAATGCGTTCGCTCTATTGACT";

    ///
    /// T1 (plus): exons [20, 49] [80, 120], CDS [29, 49] [80, 106]
    ///   ATG AAA CCC GGG TTT ACG TGC | AAG CTG GAT CAT TCG GCA ACC TGG TAA
    /// T2 (minus): exon [140, 190], CDS [150, 182]
    ///   ATG GCT AAA GGC TTC CCA GAA CAT TGG ACC TAG
    ///
    #[fixture]
    fn genome() -> Genome {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome("chr1", SEQ, false).unwrap();

        let g1 = b.add_gene("chr1", 20, 120, Strand::Plus, "G1", "GENE1").unwrap();
        let t1 = b.add_transcript(g1, 20, 120, "T1").unwrap();
        b.add_exon(t1, 20, 49).unwrap();
        b.add_exon(t1, 80, 120).unwrap();
        b.add_cds(t1, 29, 49).unwrap();
        b.add_cds(t1, 80, 106).unwrap();

        let g2 = b.add_gene("chr1", 140, 190, Strand::Minus, "G2", "GENE2").unwrap();
        let t2 = b.add_transcript(g2, 140, 190, "T2").unwrap();
        b.add_exon(t2, 140, 190).unwrap();
        b.add_cds(t2, 150, 182).unwrap();

        b.build(&Config::default()).unwrap()
    }

    fn transcript<'g>(genome: &'g Genome, id: &str) -> TranscriptView<'g> {
        genome
            .transcripts()
            .filter_map(|t| genome.transcript(t))
            .find(|t| t.transcript_id() == id)
            .unwrap()
    }

    fn run(genome: &Genome, tr: &str, variant: &Variant) -> Vec<VariantEffect> {
        let mut effects = VariantEffects::new(genome);
        codon_change(variant, transcript(genome, tr), &mut effects).unwrap();
        effects.into_vec()
    }

    #[rstest]
    fn test_fixture_cds(genome: Genome) {
        assert_eq!(transcript(&genome, "T1").protein(), "MKPGFTCKLDHSATW*");
        assert_eq!(transcript(&genome, "T2").protein(), "MAKGFPEHWT*");
    }

    #[rstest]
    #[case(34, "A", "G", EffectType::SynonymousCoding, "aaA/aaG", "K2")]
    #[case(32, "A", "C", EffectType::NonSynonymousCoding, "Aaa/Caa", "K2Q")]
    #[case(32, "A", "T", EffectType::StopGained, "Aaa/Taa", "K2*")]
    #[case(30, "T", "C", EffectType::StartLost, "aTg/aCg", "M1T")]
    #[case(104, "T", "C", EffectType::StopLost, "Taa/Caa", "*16Q")]
    #[case(106, "A", "G", EffectType::SynonymousStop, "taA/taG", "*16")]
    #[case(80, "A", "G", EffectType::NonSynonymousCoding, "Aag/Gag", "K8E")]
    fn test_snp(
        genome: Genome,
        #[case] pos: Pos,
        #[case] reference: &str,
        #[case] alt: &str,
        #[case] expected: EffectType,
        #[case] codons: &str,
        #[case] aa: &str,
    ) {
        let effects = run(&genome, "T1", &Variant::new("chr1", pos, reference, alt));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_types(), vec![expected]);
        assert_eq!(effects[0].codon_change(), codons);
        assert_eq!(effects[0].aa_change(), aa);
    }

    #[rstest]
    fn test_snp_minus_strand(genome: Genome) {
        let effects = run(&genome, "T2", &Variant::new("chr1", 179, "C", "A"));
        assert_eq!(effects[0].effect_type(), EffectType::NonSynonymousCoding);
        assert_eq!(effects[0].codon_change(), "Gct/Tct");
        assert_eq!(effects[0].aa_change(), "A2S");
    }

    #[rstest]
    #[case(33, "G", EffectType::FrameShift)]
    #[case(35, "GGG", EffectType::CodonInsertion)]
    #[case(33, "AAA", EffectType::CodonInsertion)]
    #[case(33, "TGC", EffectType::CodonChangePlusCodonInsertion)]
    fn test_insertion(genome: Genome, #[case] pos: Pos, #[case] alt: &str, #[case] expected: EffectType) {
        let effects = run(&genome, "T1", &Variant::new("chr1", pos, "", alt));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_type(), expected);
    }

    #[rstest]
    fn test_insertion_gaining_stop(genome: Genome) {
        let effects = run(&genome, "T1", &Variant::new("chr1", 32, "", "TAA"));
        assert_eq!(
            effects[0].effect_types(),
            vec![EffectType::StopGained, EffectType::CodonInsertion]
        );
        assert_eq!(effects[0].codon_change(), "AAA/TAAAAA");
    }

    #[rstest]
    #[case("T1", 29, EffectType::FrameShiftBeforeCdsStart, 0)]
    #[case("T1", 106, EffectType::FrameShiftAfterCdsEnd, 16)]
    #[case("T2", 150, EffectType::FrameShiftAfterCdsEnd, 11)]
    #[case("T2", 182, EffectType::FrameShiftBeforeCdsStart, 0)]
    fn test_insertion_at_cds_edge(
        genome: Genome,
        #[case] tr: &str,
        #[case] pos: Pos,
        #[case] expected: EffectType,
        #[case] codon_num: usize,
    ) {
        let effects = run(&genome, tr, &Variant::new("chr1", pos, "", "A"));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_types(), vec![expected]);
        assert_eq!(effects[0].codon_num, Some(codon_num));
        assert_eq!(effects[0].impact(), EffectImpact::Modifier);
    }

    #[rstest]
    #[case(33, "A", EffectType::FrameShift, "AAA/")]
    #[case(35, "CCC", EffectType::CodonDeletion, "CCC/")]
    #[case(33, "AAC", EffectType::CodonChangePlusCodonDeletion, "AAACCC/ACC")]
    #[case(32, "AAACCC", EffectType::CodonDeletion, "AAACCC/")]
    fn test_deletion(genome: Genome, #[case] pos: Pos, #[case] reference: &str, #[case] expected: EffectType, #[case] codons: &str) {
        let effects = run(&genome, "T1", &Variant::new("chr1", pos, reference, ""));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_type(), expected);
        assert_eq!(effects[0].codon_change(), codons);
    }

    #[rstest]
    fn test_deletion_of_whole_exon(genome: Genome) {
        let effects = run(&genome, "T1", &Variant::structural("chr1", 15, 55, VariantType::Del));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_type(), EffectType::ExonDeleted);
        assert_eq!(effects[0].impact(), EffectImpact::High);
    }

    #[rstest]
    fn test_deletion_across_intron(genome: Genome) {
        // TGC AAG -> T AG: last 2 coding bases of exon 1 and first base of exon 2
        let effects = run(&genome, "T1", &Variant::structural("chr1", 48, 80, VariantType::Del));
        assert_eq!(effects.len(), 1);
        assert_eq!(
            effects[0].effect_types(),
            vec![EffectType::StopGained, EffectType::CodonChangePlusCodonDeletion]
        );
        assert_eq!(effects[0].codon_num, Some(6));
        assert_eq!(effects[0].codon_change(), "TGCAAG/TAG");
    }

    #[rstest]
    #[case(VariantType::Del, EffectType::TranscriptDeleted, EffectImpact::High)]
    #[case(VariantType::Dup, EffectType::TranscriptDuplication, EffectImpact::Low)]
    #[case(VariantType::Inv, EffectType::TranscriptInversion, EffectImpact::Moderate)]
    fn test_whole_transcript(
        genome: Genome,
        #[case] variant_type: VariantType,
        #[case] expected: EffectType,
        #[case] impact: EffectImpact,
    ) {
        let effects = run(&genome, "T1", &Variant::structural("chr1", 10, 130, variant_type));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_type(), expected);
        assert_eq!(effects[0].impact(), impact);
    }

    #[rstest]
    fn test_duplication_out_of_frame(genome: Genome) {
        let effects = run(&genome, "T1", &Variant::structural("chr1", 75, 90, VariantType::Dup));
        assert_eq!(
            effects[0].effect_types(),
            vec![EffectType::FrameShift, EffectType::ExonDuplicationPartial]
        );
        assert_eq!(effects[0].impact(), EffectImpact::High);
    }

    #[rstest]
    fn test_duplication_of_utr_is_low(genome: Genome) {
        let effects = run(&genome, "T1", &Variant::structural("chr1", 108, 125, VariantType::Dup));
        assert_eq!(effects[0].effect_type(), EffectType::ExonDuplicationPartial);
        assert_eq!(effects[0].impact(), EffectImpact::Low);
    }

    #[rstest]
    fn test_inversion_of_coding_exon(genome: Genome) {
        let effects = run(&genome, "T1", &Variant::structural("chr1", 75, 125, VariantType::Inv));
        assert_eq!(
            effects[0].effect_types(),
            vec![EffectType::StopLost, EffectType::ExonInversion]
        );
        assert_eq!(effects[0].impact(), EffectImpact::High);
    }

    #[rstest]
    fn test_structural_in_intron(genome: Genome) {
        let effects = run(&genome, "T1", &Variant::structural("chr1", 55, 70, VariantType::Dup));
        assert_eq!(effects[0].effect_type(), EffectType::Intron);
    }

    #[rstest]
    fn test_mnp(genome: Genome) {
        // AAA CCC -> AAT GCC
        let effects = run(&genome, "T1", &Variant::new("chr1", 34, "AC", "TG"));
        assert_eq!(effects[0].effect_type(), EffectType::NonSynonymousCoding);
        assert_eq!(effects[0].codon_change(), "aaAccc/aaTGcc");
        assert_eq!(effects[0].aa_change(), "KP2NA");
    }

    #[rstest]
    fn test_mixed(genome: Genome) {
        // AAA CCC GGG -> AAT TGG G
        let effects = run(&genome, "T1", &Variant::new("chr1", 34, "ACCC", "TT"));
        assert_eq!(effects[0].effect_type(), EffectType::FrameShift);
        assert_eq!(effects[0].codon_num, Some(1));
    }

    #[rstest]
    fn test_interval(genome: Genome) {
        let effects = run(&genome, "T1", &Variant::structural("chr1", 100, 115, VariantType::Interval));
        assert_eq!(types_of(&effects), vec![vec![EffectType::Cds]]);
        assert_eq!(effects[0].impact(), EffectImpact::Modifier);

        let effects = run(&genome, "T1", &Variant::structural("chr1", 20, 25, VariantType::Interval));
        assert_eq!(types_of(&effects), vec![vec![EffectType::Exon]]);
    }

    fn types_of(effects: &[VariantEffect]) -> Vec<Vec<EffectType>> {
        effects.iter().map(|e| e.effect_types()).collect()
    }

    #[rstest]
    fn test_cds_map(genome: Genome) {
        let map = CdsMap::new(&transcript(&genome, "T1"));
        assert_eq!(map.len(), 48);
        assert_eq!(map.index_of(29), Some(0));
        assert_eq!(map.index_of(80), Some(21));
        assert_eq!(map.index_of(60), None);
        assert_eq!(map.covered(45, 85), Some((16, 26)));

        let map = CdsMap::new(&transcript(&genome, "T2"));
        assert_eq!(map.index_of(182), Some(0));
        assert_eq!(map.index_of(150), Some(32));
    }

    #[rstest]
    fn test_cds_map_apply_insertion(genome: Genome) {
        let tr = transcript(&genome, "T1");
        let cds_alt = CdsMap::new(&tr).apply(&Variant::new("chr1", 32, "", "C"), tr.cds()).unwrap();
        assert_eq!(cds_alt, format!("{}C{}", &tr.cds()[..3], &tr.cds()[3..]));

        let tr = transcript(&genome, "T2");
        let cds_alt = CdsMap::new(&tr).apply(&Variant::new("chr1", 182, "", "G"), tr.cds()).unwrap();
        assert_eq!(cds_alt, format!("{}C{}", &tr.cds()[..1], &tr.cds()[1..]));
    }

    #[rstest]
    #[case("AAACCCGGG", "AAAGGG", Some((1, 0, "CCC", "")))]
    #[case("AAACCCGGG", "AAACCCGGG", None)]
    #[case("ATGAAATAA", "ATGAAGTAA", Some((1, 2, "AAA", "AAG")))]
    fn test_codon_window(#[case] r: &str, #[case] a: &str, #[case] expected: Option<(usize, usize, &str, &str)>) {
        let window = CodonWindow::new(r, a);
        let got = window
            .as_ref()
            .map(|w| (w.codon_num, w.codon_index, w.codons_ref.as_str(), w.codons_alt.as_str()));
        assert_eq!(got, expected);
    }
}
