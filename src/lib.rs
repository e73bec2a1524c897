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
//! The filter-and-select core of moeselect: candidates come in, the user
//! narrows them down by typing, one string comes out.

pub mod config;
mod defaults;
pub mod draw;
pub mod error;
pub mod items;
pub mod keys;
pub mod menu;
pub mod search;
#[cfg(feature = "xorg")]
pub mod xorg;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::items::{Candidate, CandidateStore};
pub use crate::menu::{Action, Menu, Outcome, Selection, Status};

/// A window system front end that feeds key presses into a [`Menu`] and
/// paints what [`draw::render`] produces.
pub trait UserInterface {
    /// Runs until the menu finishes. Selections emitted along the way are
    /// handed to `emit` as they happen.
    fn run(
        &mut self,
        menu: &mut Menu,
        emit: &mut dyn FnMut(&Selection),
    ) -> std::result::Result<Outcome, Box<dyn std::error::Error>>;
}
