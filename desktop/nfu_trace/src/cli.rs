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

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use nfu_paging::{PagingConfig, DEFAULT_AGING_INTERVAL, DEFAULT_FRAME_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogMode {
    /// Bitmask of every page table level
    Bitmasks,
    /// Virtual to physical address of every access
    Va2pa,
    /// Level indices and frame of every access
    #[value(name = "vpns_pfn")]
    VpnsPfn,
    /// Page offset of every address
    Offset,
    /// Statistics of the whole run
    Summary,
    /// Page to frame mapping of every access, including replaced pages
    #[value(name = "vpn2pfn_pr")]
    Vpn2pfnPr,
    /// Every record and the summary as JSON lines
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "nfu_trace")]
#[command(about = "Multi-level page table simulation with NFU page replacement")]
#[command(version)]
pub(crate) struct Cli {
    /// Process only the first N memory accesses
    #[arg(short = 'n', long = "accesses")]
    pub(crate) accesses: Option<u64>,

    /// Number of available physical frames
    #[arg(short = 'f', long = "frames", default_value_t = DEFAULT_FRAME_CAPACITY)]
    pub(crate) frames: usize,

    /// Accesses between two bitstring updates
    #[arg(short = 'b', long = "interval", default_value_t = DEFAULT_AGING_INTERVAL)]
    pub(crate) interval: u32,

    /// What to print
    #[arg(short = 'l', long = "log-mode", value_enum, default_value_t = LogMode::Summary)]
    pub(crate) log_mode: LogMode,

    /// Binary trace file
    pub(crate) trace: PathBuf,

    /// Number of bits of every page table level, most significant level first
    #[arg(required = true)]
    pub(crate) level_bits: Vec<u32>,
}

impl Cli {
    pub(crate) fn paging_config(&self) -> PagingConfig {
        PagingConfig::new(self.level_bits.clone())
            .with_frame_capacity(self.frames)
            .with_aging_interval(self.interval)
            .with_max_accesses(self.accesses)
    }
}
