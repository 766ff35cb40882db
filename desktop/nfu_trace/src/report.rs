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

use std::io::{self, Write};

use nfu_paging::{LevelLayout, Summary, TranslationRecord};

use crate::cli::LogMode;

/// Formats translation results for one log mode
pub(crate) struct Reporter<W: Write> {
    out: W,
    mode: LogMode,
    levels: Vec<LevelLayout>,
}

impl<W: Write> Reporter<W> {
    pub(crate) fn new(out: W, mode: LogMode, levels: &[LevelLayout]) -> Self {
        Self {
            out,
            mode,
            levels: levels.to_vec(),
        }
    }

    pub(crate) fn bitmasks(&mut self) -> io::Result<()> {
        writeln!(self.out, "Bitmasks")?;
        for (level, layout) in self.levels.iter().enumerate() {
            writeln!(self.out, "level {} mask {:08X}", level, layout.mask)?;
        }
        Ok(())
    }

    pub(crate) fn offset(&mut self, offset: u32) -> io::Result<()> {
        writeln!(self.out, "{:08X}", offset)
    }

    /// Writes one line per translated access, modes without per access output write nothing
    pub(crate) fn record(&mut self, record: &TranslationRecord) -> io::Result<()> {
        match self.mode {
            LogMode::Va2pa => match record.physical_address {
                Some(paddr) => writeln!(
                    self.out,
                    "{:08X} -> {:08X}",
                    record.virtual_address, paddr
                ),
                None => writeln!(self.out, "{:08X} -> unmapped", record.virtual_address),
            },
            LogMode::VpnsPfn => {
                for layout in self.levels.iter() {
                    write!(self.out, "{:X} ", layout.index_of(record.virtual_address))?;
                }
                match record.frame {
                    Some(frame) => writeln!(self.out, "-> {:X}", frame),
                    None => writeln!(self.out, "-> unmapped"),
                }
            }
            LogMode::Vpn2pfnPr => {
                write!(self.out, "{:X} -> ", record.vpn)?;
                match record.frame {
                    Some(frame) => write!(self.out, "{:X}", frame)?,
                    None => write!(self.out, "unmapped")?,
                }
                let outcome = if record.is_hit() { "hit" } else { "miss" };
                write!(self.out, ", pagetable {}", outcome)?;
                if let Some(evicted) = record.evicted() {
                    write!(
                        self.out,
                        ", replaced {:X}, bitstring {:016b}",
                        evicted.vpn, evicted.bitstring
                    )?;
                }
                writeln!(self.out)
            }
            LogMode::Json => {
                serde_json::to_writer(&mut self.out, record)?;
                writeln!(self.out)
            }
            LogMode::Bitmasks | LogMode::Offset | LogMode::Summary => Ok(()),
        }
    }

    pub(crate) fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        match self.mode {
            LogMode::Summary => {
                let stats = &summary.stats;
                writeln!(self.out, "Page size: {} bytes", summary.page_size)?;
                writeln!(
                    self.out,
                    "Addresses processed: {}",
                    stats.addresses_processed
                )?;
                writeln!(
                    self.out,
                    "Page hits: {}, Misses: {}, Page replacements: {}",
                    stats.hits, stats.misses, stats.page_replacements
                )?;
                writeln!(
                    self.out,
                    "Page hit percentage: {:.2}%, miss percentage: {:.2}%",
                    summary.hit_percentage(),
                    summary.miss_percentage()
                )?;
                writeln!(self.out, "Frames allocated: {}", stats.frames_allocated)?;
                writeln!(
                    self.out,
                    "Number of page table entries: {}",
                    summary.page_table_entries
                )
            }
            LogMode::Json => {
                serde_json::to_writer(&mut self.out, summary)?;
                writeln!(self.out)
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}
