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

mod binary;
mod memory;

pub use binary::*;
pub use memory::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("could not read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace ends inside a record ({read} of {expected} bytes)")]
    Truncated { read: usize, expected: usize },
}

/// One-pass source of virtual addresses
pub trait TraceSourceModule {
    /// Returns the next virtual address or `Ok(None)` once the trace is exhausted
    fn next_address(&mut self) -> Result<Option<u32>, TraceError>;
}

impl<T: TraceSourceModule + ?Sized> TraceSourceModule for &mut T {
    fn next_address(&mut self) -> Result<Option<u32>, TraceError> {
        (**self).next_address()
    }
}
