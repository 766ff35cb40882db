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

use log::trace;

use crate::{
    config::{ADDRESS_BITS, MAX_PAGE_TABLE_BITS},
    util::{extract_bits, low_mask},
};

mod level;

use level::{LevelNode, NodeId};

/// Translation of a single virtual page to a physical frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mapping {
    pub frame: u32,
    pub valid: bool,
}

impl Mapping {
    /// Marks this slot as unused, the frame number stays until the slot is reused
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// How a single level extracts its index from a virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LevelLayout {
    pub bits: u32,
    pub shift: u32,
    pub mask: u32,
    pub entry_count: usize,
}

impl LevelLayout {
    #[inline]
    pub fn index_of(&self, vaddr: u32) -> u32 {
        extract_bits(vaddr, self.mask, self.shift)
    }
}

/// Sparse multi-level page table.
///
/// All levels are stored inside a single arena and reference each other by [`NodeId`].
/// The root is always the first node. Child and mapping arrays are only allocated
/// when an entry inside them is populated for the first time.
#[derive(Debug)]
pub struct PageTable {
    levels: Vec<LevelLayout>,
    offset_bits: u32,
    offset_mask: u32,
    nodes: Vec<LevelNode>,
}

impl PageTable {
    /// Builds an empty page table for the given level widths.
    ///
    /// The widths have to be validated by the caller (see [`crate::PagingConfig::validate`]).
    /// Without any level, `lookup` and `insert` do nothing.
    pub fn new(level_bits: &[u32]) -> Self {
        debug_assert!(
            level_bits.iter().all(|bits| *bits >= 1),
            "every level needs at least one bit: {:?}",
            level_bits
        );
        debug_assert!(
            level_bits.iter().sum::<u32>() <= MAX_PAGE_TABLE_BITS,
            "too many page table bits: {:?}",
            level_bits
        );

        let offset_bits = ADDRESS_BITS - level_bits.iter().sum::<u32>();

        // shifts are calculated from the least significant level upwards
        let mut levels = Vec::with_capacity(level_bits.len());
        let mut shift = offset_bits;
        for bits in level_bits.iter().rev() {
            levels.push(LevelLayout {
                bits: *bits,
                shift,
                mask: low_mask(*bits) << shift,
                entry_count: 1usize << bits,
            });
            shift += bits;
        }
        levels.reverse();

        let mut nodes = Vec::new();
        if !levels.is_empty() {
            nodes.push(LevelNode::new(levels.len() == 1));
        }

        PageTable {
            levels,
            offset_bits,
            offset_mask: low_mask(offset_bits),
            nodes,
        }
    }

    /// Per level mask, shift and entry count, most significant level first
    pub fn levels(&self) -> &[LevelLayout] {
        &self.levels
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn offset_mask(&self) -> u32 {
        self.offset_mask
    }

    /// Size of a page in bytes
    pub fn page_size(&self) -> u64 {
        1u64 << self.offset_bits
    }

    #[inline]
    pub fn offset_of(&self, vaddr: u32) -> u32 {
        vaddr & self.offset_mask
    }

    /// Virtual page number, i.e. all bits above the offset
    #[inline]
    pub fn vpn_of(&self, vaddr: u32) -> u32 {
        vaddr.checked_shr(self.offset_bits).unwrap_or(0)
    }

    /// First address of the page `vpn`
    #[inline]
    pub fn vaddr_of_vpn(&self, vpn: u32) -> u32 {
        vpn.checked_shl(self.offset_bits).unwrap_or(0)
    }

    /// Index used by `level` for the given address
    pub fn fragment(&self, vaddr: u32, level: usize) -> u32 {
        self.levels[level].index_of(vaddr)
    }

    /// Indices of every level for the given address, most significant level first
    pub fn fragments(&self, vaddr: u32) -> impl Iterator<Item = u32> + '_ {
        self.levels.iter().map(move |level| level.index_of(vaddr))
    }

    /// Returns the valid mapping for `vaddr`, if there is one
    pub fn lookup(&self, vaddr: u32) -> Option<&Mapping> {
        let (leaf, index) = self.find_slot(vaddr)?;
        self.nodes[leaf.index()]
            .mapping(index)
            .filter(|mapping| mapping.valid)
    }

    /// Mutable version of [`PageTable::lookup`]
    pub fn lookup_mut(&mut self, vaddr: u32) -> Option<&mut Mapping> {
        let (leaf, index) = self.find_slot(vaddr)?;
        self.nodes[leaf.index()]
            .mapping_mut(index)
            .filter(|mapping| mapping.valid)
    }

    /// Maps the page of `vaddr` to `frame`.
    ///
    /// Missing levels are allocated on the way down. Whatever was stored in the
    /// target slot before is overwritten. Other pages that still map to `frame`
    /// are not touched.
    pub fn insert(&mut self, vaddr: u32, frame: u32) {
        let Some(leaf_depth) = self.levels.len().checked_sub(1) else {
            return;
        };

        let mut node = NodeId::ROOT;
        for depth in 0..leaf_depth {
            let layout = self.levels[depth];
            node = self.ensure_child(
                node,
                layout.index_of(vaddr) as usize,
                layout.entry_count,
                depth + 1 == leaf_depth,
            );
        }

        let leaf = self.levels[leaf_depth];
        let mapping = self.nodes[node.index()]
            .ensure_mapping(leaf.index_of(vaddr) as usize, leaf.entry_count);
        mapping.frame = frame;
        mapping.valid = true;
    }

    /// Total size of all allocated child and mapping arrays
    pub fn count_entries(&self) -> u64 {
        if self.nodes.is_empty() {
            return 0;
        }
        self.count_node_entries(NodeId::ROOT)
    }

    /// Number of level nodes that exist, including the root
    pub fn allocated_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn count_node_entries(&self, node: NodeId) -> u64 {
        let node = &self.nodes[node.index()];
        node.allocated_len() as u64
            + node
                .children()
                .map(|child| self.count_node_entries(child))
                .sum::<u64>()
    }

    /// Walks down to the leaf responsible for `vaddr` without allocating anything
    fn find_slot(&self, vaddr: u32) -> Option<(NodeId, usize)> {
        let (leaf, interior) = self.levels.split_last()?;

        let mut node = NodeId::ROOT;
        for layout in interior {
            node = self.nodes[node.index()].child(layout.index_of(vaddr) as usize)?;
        }

        debug_assert!(self.nodes[node.index()].is_leaf());
        Some((node, leaf.index_of(vaddr) as usize))
    }

    fn ensure_child(
        &mut self,
        parent: NodeId,
        index: usize,
        entry_count: usize,
        child_is_leaf: bool,
    ) -> NodeId {
        if let Some(child) = self.nodes[parent.index()].child(index) {
            return child;
        }

        let child = NodeId::new(self.nodes.len());
        trace!(
            "Allocate {} node #{} below node #{} (index {})",
            if child_is_leaf { "leaf" } else { "interior" },
            child.index(),
            parent.index(),
            index
        );

        self.nodes.push(LevelNode::new(child_is_leaf));
        self.nodes[parent.index()].set_child(index, child, entry_count);
        child
    }
}
