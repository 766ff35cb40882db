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

use super::Mapping;

/// Stable index of a node inside the page table arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A single level of the page table.
///
/// Both variants start without any backing array. The array is allocated
/// the first time an entry of this node gets populated.
#[derive(Debug)]
pub(crate) enum LevelNode {
    Interior {
        children: Option<Box<[Option<NodeId>]>>,
    },
    Leaf {
        mappings: Option<Box<[Mapping]>>,
    },
}

impl LevelNode {
    pub(crate) fn new(is_leaf: bool) -> Self {
        if is_leaf {
            LevelNode::Leaf { mappings: None }
        } else {
            LevelNode::Interior { children: None }
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, LevelNode::Leaf { .. })
    }

    /// Returns the child at `index`, if the child array exists and the slot is populated
    pub(crate) fn child(&self, index: usize) -> Option<NodeId> {
        match self {
            LevelNode::Interior {
                children: Some(children),
            } => children[index],
            _ => None,
        }
    }

    /// Stores `child` at `index`, allocating the child array with `entry_count` slots if necessary
    pub(crate) fn set_child(&mut self, index: usize, child: NodeId, entry_count: usize) {
        match self {
            LevelNode::Interior { children } => {
                let children =
                    children.get_or_insert_with(|| vec![None; entry_count].into_boxed_slice());
                children[index] = Some(child);
            }
            LevelNode::Leaf { .. } => panic!("leaf nodes cannot hold child nodes"),
        }
    }

    /// Returns the mapping slot at `index` if the mapping array was allocated already
    pub(crate) fn mapping(&self, index: usize) -> Option<&Mapping> {
        match self {
            LevelNode::Leaf {
                mappings: Some(mappings),
            } => Some(&mappings[index]),
            _ => None,
        }
    }

    pub(crate) fn mapping_mut(&mut self, index: usize) -> Option<&mut Mapping> {
        match self {
            LevelNode::Leaf {
                mappings: Some(mappings),
            } => Some(&mut mappings[index]),
            _ => None,
        }
    }

    /// Returns the mapping slot at `index`, allocating the mapping array with `entry_count` slots if necessary
    pub(crate) fn ensure_mapping(&mut self, index: usize, entry_count: usize) -> &mut Mapping {
        match self {
            LevelNode::Leaf { mappings } => {
                let mappings = mappings.get_or_insert_with(|| {
                    vec![Mapping::default(); entry_count].into_boxed_slice()
                });
                &mut mappings[index]
            }
            LevelNode::Interior { .. } => panic!("interior nodes cannot hold mappings"),
        }
    }

    /// Length of the allocated child or mapping array (0 if unallocated)
    pub(crate) fn allocated_len(&self) -> usize {
        match self {
            LevelNode::Interior { children } => children.as_ref().map_or(0, |c| c.len()),
            LevelNode::Leaf { mappings } => mappings.as_ref().map_or(0, |m| m.len()),
        }
    }

    /// Iterates over all populated children (empty for leaves)
    pub(crate) fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        let children: &[Option<NodeId>] = match self {
            LevelNode::Interior {
                children: Some(children),
            } => children,
            _ => &[],
        };
        children.iter().flatten().copied()
    }
}
