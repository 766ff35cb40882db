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

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use static_assertions::const_assert_eq;

use super::{EvictedPage, LoadedFrame, ReplacementModule};

/// Value of a fresh bitstring and the bit that is set for accessed pages on every tick
pub const BITSTRING_MSB: u16 = 0x8000;

const_assert_eq!(BITSTRING_MSB, 1u16 << (u16::BITS - 1));

/// "Not frequently used" replacement with aging bitstrings.
///
/// Every `aging_interval` accesses, all bitstrings are shifted right by one bit and
/// pages that were accessed during the interval get their most significant bit set.
/// The page with the smallest bitstring is replaced; ties are broken by the
/// oldest access time first and the lowest frame number second.
pub struct NfuReplacementModule {
    loaded_frames: Vec<LoadedFrame>,

    /// Position of every resident vpn inside `loaded_frames`
    vpn_index: HashMap<u32, usize>,

    /// Pages accessed since the last aging tick
    accessed_since_tick: HashSet<u32>,

    current_time: u64,
    ticks_since_last_age: u32,
    aging_ticks: u64,

    capacity: usize,
    aging_interval: u32,
}

impl NfuReplacementModule {
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    #[cfg(test)]
    fn aging_ticks(&self) -> u64 {
        self.aging_ticks
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn aging_interval(&self) -> u32 {
        self.aging_interval
    }

    pub fn len(&self) -> usize {
        self.loaded_frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded_frames.is_empty()
    }

    /// Index of the frame that holds `vpn`, if it is resident
    pub fn index_of(&self, vpn: u32) -> Option<usize> {
        self.vpn_index.get(&vpn).copied()
    }

    fn age(&mut self) {
        for page in self.loaded_frames.iter_mut() {
            page.bitstring >>= 1;
            if self.accessed_since_tick.contains(&page.vpn) {
                page.bitstring |= BITSTRING_MSB;
            }
        }

        self.aging_ticks += 1;
        trace!(
            "Aging tick {} at time {} ({} of {} frame(s) accessed)",
            self.aging_ticks,
            self.current_time,
            self.accessed_since_tick.len(),
            self.loaded_frames.len()
        );

        self.accessed_since_tick.clear();
        self.ticks_since_last_age = 0;
    }

    /// Accesses that fall exactly on a tick boundary are not recorded for the next tick
    fn record_access(&mut self, vpn: u32) {
        if self.current_time % u64::from(self.aging_interval) != 0 {
            self.accessed_since_tick.insert(vpn);
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        assert!(self.loaded_frames.len() <= self.capacity);
        assert_eq!(self.vpn_index.len(), self.loaded_frames.len());
        for (index, page) in self.loaded_frames.iter().enumerate() {
            assert_eq!(self.vpn_index.get(&page.vpn), Some(&index));
        }
    }
}

impl ReplacementModule for NfuReplacementModule {
    fn new(capacity: usize, aging_interval: u32) -> Self {
        assert!(capacity > 0, "at least one frame is required");
        assert!(aging_interval > 0, "aging interval has to be positive");

        Self {
            loaded_frames: Vec::new(),
            vpn_index: HashMap::new(),
            accessed_since_tick: HashSet::new(),
            current_time: 0,
            ticks_since_last_age: 0,
            aging_ticks: 0,
            capacity,
            aging_interval,
        }
    }

    fn before_access(&mut self) {
        self.current_time += 1;
        self.ticks_since_last_age += 1;

        if self.ticks_since_last_age >= self.aging_interval {
            self.age();
        }
    }

    fn on_hit(&mut self, vpn: u32) {
        let index = match self.vpn_index.get(&vpn) {
            Some(index) => *index,
            None => panic!("hit on vpn {:#x} which is not resident", vpn),
        };

        self.loaded_frames[index].last_access_time = self.current_time;
        self.record_access(vpn);
    }

    fn on_miss(&mut self, vpn: u32, frame: u32) {
        assert!(
            !self.is_full(),
            "no free frame left for vpn {:#x} (capacity: {})",
            vpn,
            self.capacity
        );
        debug_assert!(
            !self.vpn_index.contains_key(&vpn),
            "vpn {:#x} is already resident",
            vpn
        );

        self.loaded_frames.push(LoadedFrame {
            frame,
            vpn,
            bitstring: BITSTRING_MSB,
            last_access_time: self.current_time,
        });
        self.vpn_index.insert(vpn, self.loaded_frames.len() - 1);
        self.record_access(vpn);
    }

    fn is_full(&self) -> bool {
        self.loaded_frames.len() >= self.capacity
    }

    fn select_victim(&self) -> usize {
        assert!(
            !self.loaded_frames.is_empty(),
            "cannot select a victim without loaded frames"
        );

        let key = |page: &LoadedFrame| (page.bitstring, page.last_access_time, page.frame);

        let mut victim = 0;
        for (index, page) in self.loaded_frames.iter().enumerate().skip(1) {
            if key(page) < key(&self.loaded_frames[victim]) {
                victim = index;
            }
        }

        victim
    }

    fn reuse_slot(&mut self, victim_index: usize, new_vpn: u32) -> EvictedPage {
        assert!(
            victim_index < self.loaded_frames.len(),
            "victim index {} out of range ({} frame(s) loaded)",
            victim_index,
            self.loaded_frames.len()
        );

        let page = &mut self.loaded_frames[victim_index];
        let evicted = EvictedPage {
            vpn: page.vpn,
            bitstring: page.bitstring,
        };

        debug!(
            "Replace vpn {:#x} (bitstring {:#06x}) in frame {} with vpn {:#x}",
            evicted.vpn, evicted.bitstring, page.frame, new_vpn
        );

        page.vpn = new_vpn;
        page.bitstring = BITSTRING_MSB;
        page.last_access_time = self.current_time;

        self.vpn_index.remove(&evicted.vpn);
        self.accessed_since_tick.remove(&evicted.vpn);
        self.vpn_index.insert(new_vpn, victim_index);
        self.record_access(new_vpn);

        evicted
    }

    fn loaded_frames(&self) -> &[LoadedFrame] {
        &self.loaded_frames
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::{NfuReplacementModule, BITSTRING_MSB};
    use crate::modules::replacement::{EvictedPage, LoadedFrame, ReplacementModule};

    fn bitstrings(module: &NfuReplacementModule) -> Vec<u16> {
        module.loaded_frames().iter().map(|page| page.bitstring).collect()
    }

    #[test]
    fn test_aging_tick_once_per_interval() {
        const INTERVAL: u32 = 4;
        let mut module = NfuReplacementModule::new(8, INTERVAL);

        for i in 1..=(INTERVAL as u64 * 5) {
            module.before_access();
            assert_eq!(module.aging_ticks(), i / INTERVAL as u64);
        }
        assert_eq!(module.current_time(), 20);
    }

    #[test]
    fn test_unaccessed_bitstrings_decay() {
        let mut module = NfuReplacementModule::new(2, 2);

        // time 1: load, recorded since 1 % 2 != 0
        module.before_access();
        module.on_miss(0x10, 0);
        assert_eq!(bitstrings(&module), vec![BITSTRING_MSB]);

        // time 2: tick restamps the recorded page
        module.before_access();
        assert_eq!(bitstrings(&module), vec![0xC000]);

        let mut previous = 0xC000;
        for _ in 0..10 {
            module.before_access();
            module.before_access();

            let current = module.loaded_frame(0).bitstring;
            assert!(current < previous || current == 0);
            assert_eq!(current, previous >> 1);
            previous = current;
        }

        module.assert_consistent();
    }

    #[test]
    fn test_accessed_pages_keep_msb() {
        let mut module = NfuReplacementModule::new(2, 2);

        module.before_access(); // 1
        module.on_miss(1, 0);
        module.before_access(); // 2, tick
        module.on_miss(2, 1);

        module.before_access(); // 3
        module.on_hit(2);
        module.before_access(); // 4, tick

        // vpn 1: 0xC000 >> 1, vpn 2: not recorded on load at time 2, recorded on hit at time 3
        assert_eq!(bitstrings(&module), vec![0x6000, 0xC000]);
        assert_eq!(module.loaded_frame(1).last_access_time, 3);
    }

    #[test]
    fn test_tick_boundary_accesses_are_not_recorded() {
        // with an interval of 1 every access falls on a tick boundary
        let mut module = NfuReplacementModule::new(1, 1);

        module.before_access();
        module.on_miss(7, 0);
        assert_eq!(module.loaded_frame(0).bitstring, 0x8000);

        module.before_access();
        module.on_hit(7);
        assert_eq!(module.loaded_frame(0).bitstring, 0x4000);

        module.before_access();
        module.on_hit(7);
        assert_eq!(module.loaded_frame(0).bitstring, 0x2000);
        assert_eq!(module.loaded_frame(0).last_access_time, 3);

        // with an interval of 3, only the access at time 3 is skipped
        let mut module = NfuReplacementModule::new(1, 3);
        module.before_access(); // 1
        module.on_miss(7, 0);
        module.before_access(); // 2
        module.on_hit(7);
        module.before_access(); // 3, tick
        assert_eq!(module.loaded_frame(0).bitstring, 0xC000);

        module.on_hit(7);
        module.before_access(); // 4
        module.before_access(); // 5
        module.before_access(); // 6, tick
        assert_eq!(module.loaded_frame(0).bitstring, 0x6000);
    }

    #[test]
    fn test_select_victim_tie_breaks() {
        let mut module = NfuReplacementModule::new(4, 100);
        module.loaded_frames = vec![
            LoadedFrame { frame: 3, vpn: 30, bitstring: 0x4000, last_access_time: 9 },
            LoadedFrame { frame: 1, vpn: 10, bitstring: 0x2000, last_access_time: 5 },
            LoadedFrame { frame: 0, vpn: 0, bitstring: 0x2000, last_access_time: 5 },
            LoadedFrame { frame: 2, vpn: 20, bitstring: 0x2000, last_access_time: 4 },
        ];

        // lowest bitstring, then oldest access
        assert_eq!(module.select_victim(), 3);

        module.loaded_frames[3].last_access_time = 5;
        // all tied on bitstring and time: lowest frame number
        assert_eq!(module.select_victim(), 2);

        module.loaded_frames[0].bitstring = 0x0001;
        assert_eq!(module.select_victim(), 0);
    }

    #[test]
    fn test_select_victim_matches_minimum() {
        let mut rand = SmallRng::seed_from_u64(0x5EED_1234);

        for _ in 0..200 {
            let count = rand.gen_range(1..32usize);
            let mut module = NfuReplacementModule::new(count, 1);

            // unique frame numbers, small value ranges to provoke ties
            let mut frames: Vec<u32> = (0..count as u32).collect();
            for i in (1..frames.len()).rev() {
                frames.swap(i, rand.gen_range(0..=i));
            }

            for (vpn, frame) in frames.into_iter().enumerate() {
                module.loaded_frames.push(LoadedFrame {
                    frame,
                    vpn: vpn as u32,
                    bitstring: rand.gen_range(0..4u16) << 14,
                    last_access_time: rand.gen_range(0..4),
                });
            }

            let expected = module
                .loaded_frames()
                .iter()
                .enumerate()
                .min_by_key(|(_, page)| (page.bitstring, page.last_access_time, page.frame))
                .map(|(index, _)| index)
                .unwrap();

            assert_eq!(module.select_victim(), expected);
        }
    }

    #[test]
    fn test_reuse_slot() {
        let mut module = NfuReplacementModule::new(2, 4);

        module.before_access(); // 1
        module.on_miss(0xA, 0);
        module.before_access(); // 2
        module.on_miss(0xB, 1);
        assert!(module.is_full());

        module.before_access(); // 3
        let victim = module.select_victim();
        assert_eq!(victim, 0);

        let evicted = module.reuse_slot(victim, 0xC);
        assert_eq!(evicted, EvictedPage { vpn: 0xA, bitstring: 0x8000 });

        assert_eq!(
            module.loaded_frame(0),
            &LoadedFrame { frame: 0, vpn: 0xC, bitstring: BITSTRING_MSB, last_access_time: 3 }
        );
        assert_eq!(module.index_of(0xA), None);
        assert_eq!(module.index_of(0xC), Some(0));
        assert!(!module.accessed_since_tick.contains(&0xA));
        assert!(module.accessed_since_tick.contains(&0xC));
        assert_eq!(module.len(), 2);

        module.assert_consistent();
    }

    #[test]
    #[should_panic]
    fn test_on_miss_while_full() {
        let mut module = NfuReplacementModule::new(1, 1);
        module.before_access();
        module.on_miss(1, 0);
        module.before_access();
        module.on_miss(2, 1);
    }

    #[test]
    #[should_panic]
    fn test_select_victim_without_frames() {
        let module = NfuReplacementModule::new(1, 1);
        module.select_victim();
    }

    #[test]
    #[should_panic]
    fn test_hit_on_unknown_vpn() {
        let mut module = NfuReplacementModule::new(1, 1);
        module.before_access();
        module.on_hit(1);
    }

    #[test]
    #[should_panic]
    fn test_reuse_slot_out_of_range() {
        let mut module = NfuReplacementModule::new(2, 1);
        module.before_access();
        module.on_miss(1, 0);
        module.reuse_slot(1, 2);
    }
}
