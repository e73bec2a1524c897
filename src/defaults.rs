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
use crate::config::{ColorPair, Position, Scheme};
use rgb::RGB8;

const FG: RGB8 = RGB8::new(0xbb, 0xc2, 0xcf);
const BG: RGB8 = RGB8::new(0x0e, 0x0e, 0x0e);
const BLUE: RGB8 = RGB8::new(0x22, 0x57, 0xa0);
const PURPLE: RGB8 = RGB8::new(0xc6, 0x78, 0xdd);
const NAVY: RGB8 = RGB8::new(0x09, 0x16, 0x33);
const GREY: RGB8 = RGB8::new(0x1c, 0x1f, 0x24);
const CYAN: RGB8 = RGB8::new(0x00, 0xff, 0xff);
const SKY: RGB8 = RGB8::new(0x51, 0xaf, 0xef);

pub const DEFAULT_POSITION: Position = Position::Bottom;

/// The first font that parses wins.
pub const DEFAULT_FONTS: &[&str] = &["fira mono:size=10", "JoyPixels:size=8"];

pub const DEFAULT_PROMPT: Option<&str> = None;

/// Zero means the single-line bar.
pub const DEFAULT_LINES: u32 = 16;

/// Characters not considered part of a word while deleting words,
/// for example " /?\"&[]". Also used to split the query into tokens.
pub const DEFAULT_WORD_DELIMITERS: &str = " ";

pub const DEFAULT_COLORS: [(Scheme, ColorPair); Scheme::COUNT] = [
    (Scheme::Norm, ColorPair { fg: FG, bg: BG }),
    (Scheme::Sel, ColorPair { fg: FG, bg: BLUE }),
    (Scheme::SelHighlight, ColorPair { fg: PURPLE, bg: NAVY }),
    (Scheme::NormHighlight, ColorPair { fg: PURPLE, bg: GREY }),
    (Scheme::Out, ColorPair { fg: BG, bg: CYAN }),
    (Scheme::Input, ColorPair { fg: FG, bg: BG }),
    (Scheme::Cursor, ColorPair { fg: SKY, bg: BG }),
    (Scheme::Prompt, ColorPair { fg: SKY, bg: BG }),
];
