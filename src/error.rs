/*
 * This file is part of moeselect.
 * Copyright (C) 2021 fence.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */
use crate::config::Scheme;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The candidate source or config file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("could not parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid color for {role:?}: {value}")]
    InvalidColor { role: Scheme, value: String },

    /// The color table has no entry for this role.
    #[error("no color pair configured for {0:?}")]
    MissingColor(Scheme),

    #[error("invalid font specification '{0}'")]
    InvalidFont(String),

    #[error("none of the configured fonts is usable")]
    NoUsableFont,

    #[error("unknown position '{0}', expected 'top' or 'bottom'")]
    InvalidPosition(String),
}
