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

mod nfu;
pub use nfu::*;

/// A physical frame that currently holds a virtual page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedFrame {
    pub frame: u32,
    pub vpn: u32,

    /// 16 bit aging register, the most significant bit represents the most recent interval
    pub bitstring: u16,

    /// Time of the last access, used for breaking ties
    pub last_access_time: u64,
}

/// State of a page right before its frame was handed to another page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EvictedPage {
    pub vpn: u32,
    pub bitstring: u16,
}

/// Decides which resident page has to give up its frame once all frames are in use.
///
/// Every method that starts with a requirement panics if that requirement is violated.
/// A violation always means that the caller lost track of the state, so continuing is pointless.
pub trait ReplacementModule {
    /// Creates an empty module that manages up to `capacity` frames
    fn new(capacity: usize, aging_interval: u32) -> Self
    where
        Self: Sized;

    /// Has to be called exactly once at the start of every access
    fn before_access(&mut self);

    /// The page `vpn` was accessed and is resident.
    ///
    /// Requires `vpn` to be resident.
    fn on_hit(&mut self, vpn: u32);

    /// The page `vpn` was loaded into the unused frame `frame`.
    ///
    /// Requires `!self.is_full()`.
    fn on_miss(&mut self, vpn: u32, frame: u32);

    /// Are all frames in use?
    fn is_full(&self) -> bool;

    /// Returns the index of the frame that should be replaced next.
    ///
    /// Requires at least one loaded frame.
    fn select_victim(&self) -> usize;

    /// Hands the frame at `victim_index` over to `new_vpn` and returns the state of the old page.
    ///
    /// Requires `victim_index < self.loaded_frames().len()`.
    fn reuse_slot(&mut self, victim_index: usize, new_vpn: u32) -> EvictedPage;

    /// All loaded frames, in the order they were filled
    fn loaded_frames(&self) -> &[LoadedFrame];

    fn loaded_frame(&self, index: usize) -> &LoadedFrame {
        &self.loaded_frames()[index]
    }
}
