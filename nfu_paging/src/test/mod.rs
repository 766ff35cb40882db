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

use crate::{
    modules::replacement::{EvictedPage, NfuReplacementModule, ReplacementModule},
    AccessOutcome, PagingConfig, TranslationRecord, Translator,
};


pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn get_test_translator(
    level_bits: &[u32],
    frame_capacity: usize,
    aging_interval: u32,
) -> Translator {
    init_test_logger();

    let config = PagingConfig::new(level_bits.to_vec())
        .with_frame_capacity(frame_capacity)
        .with_aging_interval(aging_interval);
    Translator::new(&config).unwrap()
}

pub(crate) fn translate_all(translator: &mut Translator, addresses: &[u32]) -> Vec<TranslationRecord> {
    addresses
        .iter()
        .map(|vaddr| translator.translate(*vaddr))
        .collect()
}

/// Every resident page has a valid mapping to its frame and no other page maps to a resident frame
pub(crate) fn assert_consistent(translator: &Translator<NfuReplacementModule>) {
    let table = translator.page_table();
    let replacement = translator.replacement();

    assert!(replacement.len() <= replacement.capacity());

    for (index, page) in replacement.loaded_frames().iter().enumerate() {
        assert_eq!(replacement.index_of(page.vpn), Some(index));

        let mapping = table
            .lookup(table.vaddr_of_vpn(page.vpn))
            .unwrap_or_else(|| panic!("resident vpn {:#x} is not mapped", page.vpn));
        assert_eq!(mapping.frame, page.frame);
    }
}

pub(crate) fn evicted(vpn: u32, bitstring: u16) -> AccessOutcome {
    AccessOutcome::MissEvict(EvictedPage { vpn, bitstring })
}
