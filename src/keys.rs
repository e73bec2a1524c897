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
use crate::menu::{Action, Menu, Status};

/// A key press, already translated from whatever the window system sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Return,
    Escape,
    Tab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// The default dmenu-like bindings.
pub fn action_for(key: Key, mods: Modifiers) -> Option<Action> {
    if mods.ctrl {
        return ctrl_binding(key, mods);
    }
    if mods.alt {
        return alt_binding(key);
    }

    let action = match key {
        Key::Char(c) => Action::Insert(c),
        Key::Return if mods.shift => Action::ConfirmQuery,
        Key::Return => Action::Confirm,
        Key::Escape => Action::Cancel,
        Key::Tab => Action::Complete,
        Key::Backspace => Action::DeleteBackward,
        Key::Delete => Action::DeleteForward,
        Key::Left => Action::Left,
        Key::Right => Action::Right,
        Key::Up => Action::Previous,
        Key::Down => Action::Next,
        Key::Home => Action::Home,
        Key::End => Action::End,
        Key::PageUp => Action::PagePrevious,
        Key::PageDown => Action::PageNext,
    };
    Some(action)
}

/// Feeds one key press through the bindings into the menu.
pub fn dispatch(menu: &mut Menu, key: Key, mods: Modifiers) -> Status {
    match action_for(key, mods) {
        Some(action) => menu.handle(action),
        None => Status::Running,
    }
}

fn ctrl_binding(key: Key, mods: Modifiers) -> Option<Action> {
    let action = match key {
        Key::Char('U') => Action::Clear,
        Key::Char(c) => match c.to_ascii_lowercase() {
            'a' => Action::Home,
            'b' => Action::Left,
            'c' | 'g' | '[' => Action::Cancel,
            'd' => Action::DeleteForward,
            'e' => Action::End,
            'f' => Action::Right,
            'h' => Action::DeleteBackward,
            'i' => Action::Complete,
            'j' | 'm' if mods.shift => Action::ConfirmQuery,
            'j' | 'm' => Action::Confirm,
            'k' => Action::KillToEnd,
            'n' => Action::Next,
            'p' => Action::Previous,
            'u' => Action::KillToStart,
            'w' => Action::DeleteWordBackward,
            'y' => Action::Paste,
            _ => return None,
        },
        Key::Return => Action::Emit,
        Key::Backspace => Action::DeleteWordBackward,
        Key::Left => Action::WordLeft,
        Key::Right => Action::WordRight,
        Key::Home => Action::First,
        Key::End => Action::Last,
        _ => return None,
    };
    Some(action)
}

fn alt_binding(key: Key) -> Option<Action> {
    let action = match key {
        Key::Char('b') => Action::WordLeft,
        Key::Char('f') => Action::WordRight,
        Key::Char('g') => Action::First,
        Key::Char('G') => Action::Last,
        Key::Char('h') => Action::Previous,
        Key::Char('j') => Action::PageNext,
        Key::Char('k') => Action::PagePrevious,
        Key::Char('l') => Action::Next,
        _ => return None,
    };
    Some(action)
}
