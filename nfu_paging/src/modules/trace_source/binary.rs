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

use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::Path,
};

use log::debug;

use super::{TraceError, TraceSourceModule};

/// Size of a single record inside a binary trace file
pub const TRACE_RECORD_SIZE: usize = 12;

/// A single record of a binary trace.
///
/// Stored as little endian: `addr: u32, reqtype: u8, size: u8, attr: u8, proc: u8, time: u32`.
/// Only the address is used by the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceRecord {
    pub addr: u32,
    pub reqtype: u8,
    pub size: u8,
    pub attr: u8,
    pub proc: u8,
    pub time: u32,
}

impl TraceRecord {
    pub fn from_bytes(bytes: &[u8; TRACE_RECORD_SIZE]) -> Self {
        Self {
            addr: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            reqtype: bytes[4],
            size: bytes[5],
            attr: bytes[6],
            proc: bytes[7],
            time: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; TRACE_RECORD_SIZE] {
        let mut bytes = [0u8; TRACE_RECORD_SIZE];
        bytes[0..4].copy_from_slice(&self.addr.to_le_bytes());
        bytes[4] = self.reqtype;
        bytes[5] = self.size;
        bytes[6] = self.attr;
        bytes[7] = self.proc;
        bytes[8..12].copy_from_slice(&self.time.to_le_bytes());
        bytes
    }
}

/// Reads fixed size trace records from any byte stream
pub struct BinaryTraceSourceModule<R: Read> {
    reader: R,
    records_read: u64,
}

impl BinaryTraceSourceModule<BufReader<File>> {
    /// Opens a trace file
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> BinaryTraceSourceModule<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            records_read: 0,
        }
    }

    #[cfg(test)]
    fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Reads the next complete record, `Ok(None)` on a clean end of the stream
    pub fn next_record(&mut self) -> Result<Option<TraceRecord>, TraceError> {
        let mut buffer = [0u8; TRACE_RECORD_SIZE];
        let mut filled = 0;

        while filled < TRACE_RECORD_SIZE {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }

        match filled {
            0 => {
                debug!("Trace ended after {} record(s)", self.records_read);
                Ok(None)
            }
            TRACE_RECORD_SIZE => {
                self.records_read += 1;
                Ok(Some(TraceRecord::from_bytes(&buffer)))
            }
            read => Err(TraceError::Truncated {
                read,
                expected: TRACE_RECORD_SIZE,
            }),
        }
    }
}

impl<R: Read> TraceSourceModule for BinaryTraceSourceModule<R> {
    fn next_address(&mut self) -> Result<Option<u32>, TraceError> {
        Ok(self.next_record()?.map(|record| record.addr))
    }
}
