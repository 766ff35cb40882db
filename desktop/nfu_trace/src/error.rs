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

use std::{io, path::PathBuf, process::ExitCode};

use nfu_paging::{modules::trace_source::TraceError, ConfigError};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Unable to open {}: {source}", .path.display())]
    OpenTrace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed trace: {0}")]
    Trace(#[from] TraceError),

    #[error("Could not write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::from(2),
            Self::OpenTrace { .. } => ExitCode::from(3),
            Self::Trace(_) => ExitCode::from(4),
            Self::Output(_) => ExitCode::from(5),
        }
    }
}
