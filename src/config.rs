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
use crate::defaults::*;
use crate::error::{Error, Result};
use rgb::RGB8;
use std::ops::Index;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Top,
    Bottom,
}

impl std::str::FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Position::Top),
            "bottom" => Ok(Position::Bottom),
            _ => Err(Error::InvalidPosition(s.to_string())),
        }
    }
}

/// Visual roles that get their own color pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Norm,
    Sel,
    NormHighlight,
    SelHighlight,
    /// Items already written out with emit-and-continue.
    Out,
    Input,
    Cursor,
    Prompt,
}

impl Scheme {
    pub const COUNT: usize = 8;

    pub const ALL: [Scheme; Scheme::COUNT] = [
        Scheme::Norm,
        Scheme::Sel,
        Scheme::NormHighlight,
        Scheme::SelHighlight,
        Scheme::Out,
        Scheme::Input,
        Scheme::Cursor,
        Scheme::Prompt,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorPair {
    pub fg: RGB8,
    pub bg: RGB8,
}

/// A complete color table, one pair per [`Scheme`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colors {
    pairs: [ColorPair; Scheme::COUNT],
}

impl Colors {
    /// Builds a table from `(role, pair)` entries. Later entries for the same
    /// role replace earlier ones; a role without any entry is an error.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Scheme, ColorPair)>,
    {
        let mut table: [Option<ColorPair>; Scheme::COUNT] = [None; Scheme::COUNT];
        for (scheme, pair) in pairs {
            table[scheme.slot()] = Some(pair);
        }

        let mut out = [ColorPair::default(); Scheme::COUNT];
        for scheme in Scheme::ALL.iter().copied() {
            out[scheme.slot()] = table[scheme.slot()].ok_or(Error::MissingColor(scheme))?;
        }
        Ok(Colors { pairs: out })
    }

    pub fn get(&self, scheme: Scheme) -> ColorPair {
        self.pairs[scheme.slot()]
    }

    pub fn set(&mut self, scheme: Scheme, pair: ColorPair) {
        self.pairs[scheme.slot()] = pair;
    }
}

impl Default for Colors {
    fn default() -> Self {
        Colors::from_pairs(DEFAULT_COLORS.iter().copied())
            .expect("default color table covers every scheme")
    }
}

impl Index<Scheme> for Colors {
    type Output = ColorPair;

    fn index(&self, scheme: Scheme) -> &ColorPair {
        &self.pairs[scheme.slot()]
    }
}

/// A parsed `family:size=N` font specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    /// Size in points.
    pub size: f64,
}

impl Font {
    const DEFAULT_SIZE: f64 = 10.0;

    pub fn parse(spec: &str) -> Result<Font> {
        let mut parts = spec.split(':');
        let family = parts.next().unwrap_or_default().trim();
        if family.is_empty() {
            return Err(Error::InvalidFont(spec.to_string()));
        }

        let mut size = Font::DEFAULT_SIZE;
        for option in parts {
            let mut kv = option.splitn(2, '=');
            let key = kv.next().unwrap_or_default().trim();
            let value = kv.next().map(str::trim);
            if key == "size" {
                size = value
                    .and_then(|v| v.parse::<f64>().ok())
                    .filter(|s| *s > 0.0)
                    .ok_or_else(|| Error::InvalidFont(spec.to_string()))?;
            }
        }

        Ok(Font {
            family: family.to_string(),
            size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub position: Position,
    pub fonts: Vec<String>,
    pub prompt: Option<String>,
    /// Number of list rows; zero selects the single-line bar.
    pub lines: u32,
    pub word_delimiters: String,
    pub colors: Colors,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            position: DEFAULT_POSITION,
            fonts: DEFAULT_FONTS.iter().map(|f| f.to_string()).collect(),
            prompt: DEFAULT_PROMPT.map(String::from),
            lines: DEFAULT_LINES,
            word_delimiters: DEFAULT_WORD_DELIMITERS.to_string(),
            colors: Colors::default(),
        }
    }
}

impl Config {
    /// Returns the first font in the list that parses.
    pub fn font(&self) -> Result<Font> {
        self.fonts
            .iter()
            .find_map(|spec| match Font::parse(spec) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!("skipping font: {}", e);
                    None
                }
            })
            .ok_or(Error::NoUsableFont)
    }

    pub fn is_vertical(&self) -> bool {
        self.lines > 0
    }

    /// Loads `$XDG_CONFIG_HOME/moeselect/config.toml` on top of the defaults.
    #[cfg(feature = "config")]
    pub fn load() -> Result<Self> {
        let dirs = xdg::BaseDirectories::with_prefix("moeselect")
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;
        match dirs.find_config_file("config.toml") {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                let text = std::fs::read_to_string(&path)?;
                Config::from_toml_str(&text)
            }
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    #[cfg(not(feature = "config"))]
    pub fn load() -> Result<Self> {
        Ok(Config::default())
    }

    #[cfg(feature = "config")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: file::RawConfig = toml::from_str(text)?;
        let mut config = Config::default();
        raw.apply(&mut config)?;
        config.font()?;
        Ok(config)
    }
}

#[cfg(feature = "config")]
mod file {
    use super::{ColorPair, Config, Scheme};
    use crate::error::{Error, Result};
    use css_color_parser::Color;
    use rgb::RGB8;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub(super) struct RawConfig {
        position: Option<String>,
        fonts: Option<Vec<String>>,
        prompt: Option<String>,
        lines: Option<u32>,
        word_delimiters: Option<String>,
        colors: RawColors,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct RawColors {
        norm: Option<RawPair>,
        sel: Option<RawPair>,
        norm_highlight: Option<RawPair>,
        sel_highlight: Option<RawPair>,
        out: Option<RawPair>,
        input: Option<RawPair>,
        cursor: Option<RawPair>,
        prompt: Option<RawPair>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct RawPair {
        fg: Option<String>,
        bg: Option<String>,
    }

    fn parse_color(scheme: Scheme, value: &str) -> Result<RGB8> {
        value
            .trim()
            .parse::<Color>()
            .map(|c| RGB8::new(c.r, c.g, c.b))
            .map_err(|_| Error::InvalidColor {
                role: scheme,
                value: value.to_string(),
            })
    }

    impl RawConfig {
        pub(super) fn apply(self, config: &mut Config) -> Result<()> {
            if let Some(position) = self.position {
                config.position = position.parse()?;
            }
            if let Some(fonts) = self.fonts {
                config.fonts = fonts;
            }
            if let Some(prompt) = self.prompt {
                config.prompt = Some(prompt).filter(|p| !p.is_empty());
            }
            if let Some(lines) = self.lines {
                config.lines = lines;
            }
            if let Some(delimiters) = self.word_delimiters {
                config.word_delimiters = delimiters;
            }

            let c = self.colors;
            let overrides = vec![
                (Scheme::Norm, c.norm),
                (Scheme::Sel, c.sel),
                (Scheme::NormHighlight, c.norm_highlight),
                (Scheme::SelHighlight, c.sel_highlight),
                (Scheme::Out, c.out),
                (Scheme::Input, c.input),
                (Scheme::Cursor, c.cursor),
                (Scheme::Prompt, c.prompt),
            ];
            for (scheme, raw) in overrides {
                let raw = match raw {
                    Some(raw) => raw,
                    None => continue,
                };
                let current = config.colors.get(scheme);
                let pair = ColorPair {
                    fg: match raw.fg {
                        Some(fg) => parse_color(scheme, &fg)?,
                        None => current.fg,
                    },
                    bg: match raw.bg {
                        Some(bg) => parse_color(scheme, &bg)?,
                        None => current.bg,
                    },
                };
                config.colors.set(scheme, pair);
            }
            Ok(())
        }
    }
}
