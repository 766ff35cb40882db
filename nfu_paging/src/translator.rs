/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use log::{debug, info, trace};

use crate::{
    config::{ConfigError, PagingConfig},
    modules::{
        replacement::{EvictedPage, NfuReplacementModule, ReplacementModule},
        trace_source::{TraceError, TraceSourceModule},
    },
    page_table::PageTable,
};

/// What happened during a single access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum AccessOutcome {
    /// The page was already mapped
    Hit,

    /// The page was mapped to a frame that was never used before
    MissFree,

    /// The page took over the frame of another page
    MissEvict(EvictedPage),
}

/// Result of translating one virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TranslationRecord {
    pub virtual_address: u32,
    pub vpn: u32,
    pub frame: Option<u32>,
    pub physical_address: Option<u32>,
    pub outcome: AccessOutcome,
}

impl TranslationRecord {
    pub fn is_hit(&self) -> bool {
        self.outcome == AccessOutcome::Hit
    }

    /// The page that lost its frame during this access (bitstring as it was before the frame got reused)
    pub fn evicted(&self) -> Option<EvictedPage> {
        match self.outcome {
            AccessOutcome::MissEvict(evicted) => Some(evicted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TranslationStats {
    pub addresses_processed: u64,
    pub hits: u64,
    pub misses: u64,
    pub page_replacements: u64,

    /// Frames that were handed out for the first time
    pub frames_allocated: u64,
}

/// Everything that is reported at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Summary {
    pub page_size: u64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub stats: TranslationStats,
    pub page_table_entries: u64,
}

impl Summary {
    /// Share of hits in percent (0 if nothing was processed)
    pub fn hit_percentage(&self) -> f64 {
        percentage(self.stats.hits, self.stats.addresses_processed)
    }

    pub fn miss_percentage(&self) -> f64 {
        percentage(self.stats.misses, self.stats.addresses_processed)
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// Translates virtual addresses one at a time.
///
/// Owns the page table and the replacement module and keeps both consistent:
/// whenever a frame changes its page, the mapping of the old page is invalidated
/// before the new one is inserted.
pub struct Translator<R: ReplacementModule = NfuReplacementModule> {
    page_table: PageTable,
    replacement: R,

    /// Next frame that was never used before
    next_free_frame: u32,

    max_accesses: Option<u64>,
    stats: TranslationStats,
}

impl Translator<NfuReplacementModule> {
    /// Creates a translator that uses NFU replacement
    pub fn new(config: &PagingConfig) -> Result<Self, ConfigError> {
        Self::with_module(config)
    }
}

impl<R: ReplacementModule> Translator<R> {
    /// Creates a translator with a custom replacement module
    pub fn with_module(config: &PagingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let page_table = PageTable::new(&config.level_bits);
        info!(
            "Created translator: levels={:?}, offset bits={}, frames={}, aging interval={}",
            config.level_bits,
            page_table.offset_bits(),
            config.frame_capacity,
            config.aging_interval
        );

        Ok(Self {
            page_table,
            replacement: R::new(config.frame_capacity, config.aging_interval),
            next_free_frame: 0,
            max_accesses: config.max_accesses,
            stats: TranslationStats::default(),
        })
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn replacement(&self) -> &R {
        &self.replacement
    }

    pub fn stats(&self) -> TranslationStats {
        self.stats
    }

    pub fn summary(&self) -> Summary {
        Summary {
            page_size: self.page_table.page_size(),
            stats: self.stats,
            page_table_entries: self.page_table.count_entries(),
        }
    }

    /// Translates a single address and updates all state accordingly
    pub fn translate(&mut self, vaddr: u32) -> TranslationRecord {
        self.replacement.before_access();

        let vpn = self.page_table.vpn_of(vaddr);

        let outcome = match self.page_table.lookup(vaddr) {
            Some(_) => {
                self.replacement.on_hit(vpn);
                AccessOutcome::Hit
            }
            None if !self.replacement.is_full() => {
                let frame = self.next_free_frame;
                self.next_free_frame += 1;

                self.page_table.insert(vaddr, frame);
                self.replacement.on_miss(vpn, frame);
                AccessOutcome::MissFree
            }
            None => self.replace_page(vaddr, vpn),
        };

        self.stats.addresses_processed += 1;
        match outcome {
            AccessOutcome::Hit => self.stats.hits += 1,
            AccessOutcome::MissFree => {
                self.stats.misses += 1;
                self.stats.frames_allocated += 1;
            }
            AccessOutcome::MissEvict(_) => {
                self.stats.misses += 1;
                self.stats.page_replacements += 1;
            }
        }

        // frames never outnumber virtual pages, so the frame always fits above the offset
        let frame = self.page_table.lookup(vaddr).map(|mapping| mapping.frame);
        let physical_address = frame.map(|frame| {
            (frame << self.page_table.offset_bits()) | self.page_table.offset_of(vaddr)
        });

        trace!(
            "Translate {:#010x} (vpn {:#x}): {:?} -> {:?}",
            vaddr,
            vpn,
            outcome,
            physical_address
        );

        TranslationRecord {
            virtual_address: vaddr,
            vpn,
            frame,
            physical_address,
            outcome,
        }
    }

    /// Drains `source` (or stops once the configured maximum is reached) and passes every record to `sink`.
    ///
    /// The maximum covers every address this translator processed so far, across calls.
    /// The first error of `source` or `sink` stops the run.
    /// Returns the number of addresses processed during this call.
    pub fn run<T, F, E>(&mut self, mut source: T, mut sink: F) -> Result<u64, E>
    where
        T: TraceSourceModule,
        F: FnMut(&TranslationRecord) -> Result<(), E>,
        E: From<TraceError>,
    {
        let mut processed = 0u64;

        while self
            .max_accesses
            .map_or(true, |max| self.stats.addresses_processed < max)
        {
            let Some(vaddr) = source.next_address()? else {
                break;
            };

            let record = self.translate(vaddr);
            processed += 1;
            sink(&record)?;
        }

        debug!("Processed {} address(es)", processed);
        Ok(processed)
    }

    fn replace_page(&mut self, vaddr: u32, vpn: u32) -> AccessOutcome {
        let victim_index = self.replacement.select_victim();
        let victim_frame = self.replacement.loaded_frame(victim_index).frame;

        let evicted = self.replacement.reuse_slot(victim_index, vpn);

        // eviction works on whole pages, so any offset addresses the old page
        let old_vaddr = self.page_table.vaddr_of_vpn(evicted.vpn);
        if let Some(mapping) = self.page_table.lookup_mut(old_vaddr) {
            mapping.invalidate();
        }

        self.page_table.insert(vaddr, victim_frame);
        AccessOutcome::MissEvict(evicted)
    }
}
