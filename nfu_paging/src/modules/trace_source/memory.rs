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

use super::{TraceError, TraceSourceModule};

/// Serves addresses from memory, mostly useful for tests and generated traces
#[derive(Debug, Clone, Default)]
pub struct MemoryTraceSourceModule {
    addresses: Vec<u32>,
    position: usize,
}

impl MemoryTraceSourceModule {
    pub fn new(addresses: Vec<u32>) -> Self {
        Self {
            addresses,
            position: 0,
        }
    }

    /// Number of addresses that were not handed out yet
    pub fn remaining(&self) -> usize {
        self.addresses.len() - self.position
    }
}

impl TraceSourceModule for MemoryTraceSourceModule {
    fn next_address(&mut self) -> Result<Option<u32>, TraceError> {
        let addr = self.addresses.get(self.position).copied();
        if addr.is_some() {
            self.position += 1;
        }
        Ok(addr)
    }
}
