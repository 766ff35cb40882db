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

use static_assertions::const_assert;
use thiserror::Error;

/// Width of a simulated virtual address in bits
pub const ADDRESS_BITS: u32 = 32;

/// Maximum number of bits all page table levels may use together.
///
/// At least `ADDRESS_BITS - MAX_PAGE_TABLE_BITS` bits are always left for the page offset.
pub const MAX_PAGE_TABLE_BITS: u32 = 28;

pub const DEFAULT_FRAME_CAPACITY: usize = 999_999;
pub const DEFAULT_AGING_INTERVAL: u32 = 10;

const_assert!(MAX_PAGE_TABLE_BITS < ADDRESS_BITS);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one page table level is required")]
    NoLevels,

    #[error("level {level} page table must be at least 1 bit")]
    LevelTooNarrow { level: usize },

    #[error("too many bits used in page tables ({total} > {max})", max = MAX_PAGE_TABLE_BITS)]
    TooManyBits { total: u32 },

    #[error("number of available frames must be greater than 0")]
    ZeroCapacity,

    #[error("bit string update interval must be greater than 0")]
    ZeroAgingInterval,

    #[error("number of memory accesses must be greater than 0")]
    ZeroAccessLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingConfig {
    /// Bit width of every page table level, most significant level first
    pub level_bits: Vec<u32>,

    /// How many physical frames can be resident before pages get replaced
    pub frame_capacity: usize,

    /// Number of accesses between two aging ticks
    pub aging_interval: u32,

    /// Stop after this many accesses, `None` processes the whole trace
    pub max_accesses: Option<u64>,
}

impl PagingConfig {
    pub fn new(level_bits: Vec<u32>) -> Self {
        Self {
            level_bits,
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            aging_interval: DEFAULT_AGING_INTERVAL,
            max_accesses: None,
        }
    }

    pub fn with_frame_capacity(mut self, frame_capacity: usize) -> Self {
        self.frame_capacity = frame_capacity;
        self
    }

    pub fn with_aging_interval(mut self, aging_interval: u32) -> Self {
        self.aging_interval = aging_interval;
        self
    }

    pub fn with_max_accesses(mut self, max_accesses: Option<u64>) -> Self {
        self.max_accesses = max_accesses;
        self
    }

    /// Checks every constraint that has to hold before a trace is processed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level_bits.is_empty() {
            return Err(ConfigError::NoLevels);
        }

        if let Some(level) = self.level_bits.iter().position(|bits| *bits < 1) {
            return Err(ConfigError::LevelTooNarrow { level });
        }

        let total = self.total_level_bits();
        if total > MAX_PAGE_TABLE_BITS {
            return Err(ConfigError::TooManyBits { total });
        }

        if self.frame_capacity < 1 {
            return Err(ConfigError::ZeroCapacity);
        }

        if self.aging_interval < 1 {
            return Err(ConfigError::ZeroAgingInterval);
        }

        if self.max_accesses == Some(0) {
            return Err(ConfigError::ZeroAccessLimit);
        }

        Ok(())
    }

    /// Bits left for the page offset once all levels took theirs
    pub fn offset_bits(&self) -> u32 {
        ADDRESS_BITS.saturating_sub(self.total_level_bits())
    }

    /// Saturates, so absurd widths cannot wrap around the validation
    fn total_level_bits(&self) -> u32 {
        self.level_bits
            .iter()
            .fold(0u32, |acc, bits| acc.saturating_add(*bits))
    }
}
