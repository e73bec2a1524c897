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
use crate::config::{ColorPair, Config, Scheme};
use crate::items::Candidate;
use crate::menu::Menu;
use rgb::RGB8;
use std::ops::Range;

const ELLIPSIS: &str = "...";
const LEFT_ARROW: &str = "<";
const RIGHT_ARROW: &str = ">";
const CURSOR_WIDTH: f64 = 2.0;

/// Font metrics, supplied by whoever paints the frame.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f64;
    fn line_height(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: RGB8,
    },
    /// `y` is the top of the row; painters center the baseline themselves.
    Text {
        x: f64,
        y: f64,
        text: String,
        color: RGB8,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub row_height: f64,
    pub commands: Vec<DrawCommand>,
    /// Indices into the filtered items that made it on screen.
    pub visible: Range<usize>,
}

pub fn row_height(measure: &impl TextMeasure) -> f64 {
    measure.line_height() + 2.0
}

/// Height of the whole window for this configuration.
pub fn frame_height(config: &Config, measure: &impl TextMeasure) -> f64 {
    row_height(measure) * (config.lines as f64 + 1.0)
}

struct Painter<'a, M> {
    measure: &'a M,
    config: &'a Config,
    pad: f64,
    row_height: f64,
    commands: Vec<DrawCommand>,
}

impl<'a, M: TextMeasure> Painter<'a, M> {
    fn pair(&self, scheme: Scheme) -> ColorPair {
        self.config.colors[scheme]
    }

    /// Width of `text` including horizontal padding.
    fn text_w(&self, text: &str) -> f64 {
        self.measure.text_width(text) + self.pad
    }

    fn fill(&mut self, x: f64, y: f64, width: f64, height: f64, color: RGB8) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, color: RGB8) {
        if text.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            color,
        });
    }

    /// Cuts `text` down to `max` pixels, ending in an ellipsis when it had to
    /// be cut. Returns the string to draw and how many bytes of `text` it kept.
    fn fit(&self, text: &str, max: f64) -> (String, usize) {
        if self.measure.text_width(text) <= max {
            return (text.to_string(), text.len());
        }
        let room = max - self.measure.text_width(ELLIPSIS);
        if room < 0.0 {
            return (String::new(), 0);
        }
        let mut used = 0.0;
        let mut kept = 0;
        for (at, c) in text.char_indices() {
            let end = at + c.len_utf8();
            used += self.measure.text_width(&text[at..end]);
            if used > room {
                break;
            }
            kept = end;
        }
        (format!("{}{}", &text[..kept], ELLIPSIS), kept)
    }

    /// A padded cell with background, returning the x after it.
    fn cell(&mut self, x: f64, y: f64, width: f64, text: &str, pair: ColorPair) -> f64 {
        self.fill(x, y, width, self.row_height, pair.bg);
        let (shown, _) = self.fit(text, width - self.pad);
        self.text(x + self.pad / 2.0, y, &shown, pair.fg);
        x + width
    }

    /// The query with its cursor. Text scrolls off to the left so the cursor
    /// always stays inside the cell.
    fn query(&mut self, x: f64, width: f64, query: &str, cursor: usize) {
        let pair = self.pair(Scheme::Input);
        self.fill(x, 0.0, width, self.row_height, pair.bg);
        let room = width - self.pad;

        let mut start = cursor;
        let mut caret = 0.0;
        for (at, c) in query[..cursor].char_indices().rev() {
            let w = self.measure.text_width(&query[at..at + c.len_utf8()]);
            if caret + w + CURSOR_WIDTH > room {
                break;
            }
            caret += w;
            start = at;
        }

        let tx = x + self.pad / 2.0;
        let (shown, _) = self.fit(&query[start..], room);
        self.text(tx, 0.0, &shown, pair.fg);
        if caret + self.pad / 2.0 < width {
            let color = self.pair(Scheme::Cursor).fg;
            self.fill(tx + caret, 1.0, CURSOR_WIDTH, self.row_height - 2.0, color);
        }
    }

    fn item(&mut self, menu: &Menu, x: f64, y: f64, width: f64, candidate: &Candidate, index: usize, selected: bool) {
        let (scheme, highlight) = if selected {
            (Scheme::Sel, Scheme::SelHighlight)
        } else if menu.is_emitted(index) {
            (Scheme::Out, Scheme::NormHighlight)
        } else {
            (Scheme::Norm, Scheme::NormHighlight)
        };
        let pair = self.pair(scheme);
        let highlight = self.pair(highlight);

        self.fill(x, y, width, self.row_height, pair.bg);
        let tx = x + self.pad / 2.0;
        let text = candidate.text();
        let (shown, kept) = self.fit(text, width - self.pad);
        self.text(tx, y, &shown, pair.fg);

        for span in menu.spans(text) {
            if span.start >= kept {
                continue;
            }
            let span = span.start..span.end.min(kept);
            let sx = tx + self.measure.text_width(&text[..span.start]);
            let sw = self.measure.text_width(&text[span.clone()]);
            self.fill(sx, y, sw, self.row_height, highlight.bg);
            self.text(sx, y, &text[span], highlight.fg);
        }

        if let Some(label) = candidate.label() {
            let lx = tx + self.measure.text_width(&shown) + self.pad;
            let room = x + width - self.pad / 2.0 - lx;
            if room > 0.0 {
                let (label, _) = self.fit(label, room);
                self.text(lx, y, &label, pair.fg);
            }
        }
    }

    fn item_width(&self, candidate: &Candidate) -> f64 {
        let label = candidate.label().map_or(0.0, |l| self.text_w(l));
        self.text_w(candidate.text()) + label
    }
}

/// Lays out the prompt, query and visible items for a window `width` wide.
pub fn render(menu: &Menu, config: &Config, measure: &impl TextMeasure, width: f64) -> Frame {
    let row_height = row_height(measure);
    let mut p = Painter {
        measure,
        config,
        pad: measure.line_height(),
        row_height,
        commands: Vec::new(),
    };

    let norm = p.pair(Scheme::Norm);
    let height = frame_height(config, measure);
    p.fill(0.0, 0.0, width, height, norm.bg);

    let mut x = 0.0;
    if let Some(prompt) = &config.prompt {
        let w = p.text_w(prompt);
        x = p.cell(x, 0.0, w, prompt, p.pair(Scheme::Prompt));
    }

    let items: Vec<&Candidate> = menu.filtered().collect();
    let input_w = if menu.is_vertical() || items.is_empty() {
        width - x
    } else {
        width / 3.0
    };
    p.query(x, input_w, menu.query(), menu.cursor());

    let selection = menu.selection();
    let visible = if menu.is_vertical() {
        let visible = menu.viewport().range(items.len());
        for (row, i) in visible.clone().enumerate() {
            let y = (row as f64 + 1.0) * row_height;
            let index = menu.items()[i].index;
            p.item(menu, x, y, width - x, items[i], index, selection == Some(i));
        }
        visible
    } else {
        x += input_w;
        let left_w = p.text_w(LEFT_ARROW);
        let right_w = p.text_w(RIGHT_ARROW);
        let avail = width - x - left_w - right_w;
        let mut widths = Vec::new();
        let page = page_of(items.len(), avail, selection.unwrap_or(0), |i| {
            let w = p.item_width(items[i]).min(avail);
            widths.push(w);
            w
        });

        if page.start > 0 {
            p.cell(x, 0.0, left_w, LEFT_ARROW, norm);
        }
        x += left_w;
        for i in page.clone() {
            let index = menu.items()[i].index;
            p.item(menu, x, 0.0, widths[i], items[i], index, selection == Some(i));
            x += widths[i];
        }
        if page.end < items.len() {
            p.cell(width - right_w, 0.0, right_w, RIGHT_ARROW, norm);
        }
        page
    };

    Frame {
        width,
        height,
        row_height,
        commands: p.commands,
        visible,
    }
}

/// Packs `len` items greedily into pages of `avail` pixels and returns the
/// page holding `target`. `width` is called once per item, in order, and no
/// further than the item after that page.
fn page_of(len: usize, avail: f64, target: usize, mut width: impl FnMut(usize) -> f64) -> Range<usize> {
    let mut start = 0;
    let mut used = 0.0;
    for i in 0..len {
        let w = width(i);
        if i > start && used + w > avail {
            if target < i {
                return start..i;
            }
            start = i;
            used = 0.0;
        }
        used += w;
    }
    start..len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::CandidateStore;
    use crate::menu::Action;

    /// Every char is one unit wide.
    struct Mono;

    impl TextMeasure for Mono {
        fn text_width(&self, text: &str) -> f64 {
            text.chars().count() as f64
        }

        fn line_height(&self) -> f64 {
            1.0
        }
    }

    fn config(lines: u32) -> Config {
        Config {
            lines,
            ..Config::default()
        }
    }

    fn texts(frame: &Frame) -> Vec<(&str, RGB8)> {
        frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, color, .. } => Some((text.as_str(), *color)),
                _ => None,
            })
            .collect()
    }

    fn text_at(frame: &Frame, wanted: &str) -> (f64, f64, RGB8) {
        frame
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Text { x, y, text, color } if text == wanted => Some((*x, *y, *color)),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no text {:?} in frame", wanted))
    }

    fn row_fill(frame: &Frame, y: f64) -> RGB8 {
        frame
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Rect {
                    y: ry,
                    height,
                    color,
                    ..
                } if *ry == y && *height == frame.row_height => Some(*color),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no row at {}", y))
    }

    #[test]
    fn vertical_list_shows_capacity_rows() {
        let config = config(2);
        let menu = Menu::new(
            CandidateStore::from_lines(&["alpha", "beta", "gamma"]),
            &config,
        );
        let frame = render(&menu, &config, &Mono, 40.0);

        assert_eq!(frame.row_height, 3.0);
        assert_eq!(frame.height, 9.0);
        assert_eq!(frame.visible, 0..2);
        let shown: Vec<&str> = texts(&frame).into_iter().map(|(t, _)| t).collect();
        assert_eq!(shown, ["alpha", "beta"]);
        assert_eq!(row_fill(&frame, 3.0), config.colors[Scheme::Sel].bg);
        assert_eq!(row_fill(&frame, 6.0), config.colors[Scheme::Norm].bg);
    }

    #[test]
    fn vertical_list_follows_the_highlight() {
        let config = config(2);
        let mut menu = Menu::new(
            CandidateStore::from_lines(&["alpha", "beta", "gamma"]),
            &config,
        );
        menu.handle(Action::Last);
        let frame = render(&menu, &config, &Mono, 40.0);
        assert_eq!(frame.visible, 1..3);
        assert_eq!(text_at(&frame, "gamma").1, 6.0);
        assert_eq!(row_fill(&frame, 6.0), config.colors[Scheme::Sel].bg);
    }

    #[test]
    fn prompt_query_and_cursor() {
        let mut config = config(1);
        config.prompt = Some("run".to_string());
        let mut menu = Menu::new(CandidateStore::from_lines(&["xyz"]), &config);
        menu.handle(Action::Insert('a'));
        menu.handle(Action::Insert('b'));
        let frame = render(&menu, &config, &Mono, 40.0);

        assert_eq!(
            text_at(&frame, "run"),
            (0.5, 0.0, config.colors[Scheme::Prompt].fg)
        );
        // prompt cell is 4 wide, text starts half a pad in
        assert_eq!(text_at(&frame, "ab"), (4.5, 0.0, config.colors[Scheme::Input].fg));
        let cursor = DrawCommand::Rect {
            x: 6.5,
            y: 1.0,
            width: CURSOR_WIDTH,
            height: 1.0,
            color: config.colors[Scheme::Cursor].fg,
        };
        assert!(frame.commands.contains(&cursor));
        assert_eq!(frame.visible, 0..0);
    }

    #[test]
    fn matched_spans_get_highlight_colors() {
        let config = config(3);
        let mut menu = Menu::new(CandidateStore::from_lines(&["alpha", "graph"]), &config);
        menu.handle(Action::Insert('p'));
        menu.handle(Action::Insert('h'));
        let frame = render(&menu, &config, &Mono, 40.0);

        let spans: Vec<(f64, f64, RGB8)> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { x, y, text, color } if text == "ph" && *y > 0.0 => {
                    Some((*x, *y, *color))
                }
                _ => None,
            })
            .collect();
        // "al" and "gra" precede the span in each row
        assert_eq!(
            spans,
            [
                (2.5, 3.0, config.colors[Scheme::SelHighlight].fg),
                (3.5, 6.0, config.colors[Scheme::NormHighlight].fg)
            ]
        );
    }

    #[test]
    fn long_items_are_truncated() {
        let config = config(1);
        let menu = Menu::new(
            CandidateStore::from_lines(&["abcdefghijklmnop"]),
            &config,
        );
        let frame = render(&menu, &config, &Mono, 10.0);
        text_at(&frame, "abcdef...");
    }

    #[test]
    fn labels_follow_the_text() {
        let config = config(1);
        let menu = Menu::new(CandidateStore::from_lines(&["vim\teditor"]), &config);
        let frame = render(&menu, &config, &Mono, 40.0);
        assert_eq!(text_at(&frame, "vim").0, 0.5);
        assert_eq!(text_at(&frame, "editor").0, 4.5);
    }

    #[test]
    fn emitted_rows_use_the_out_scheme() {
        let config = config(2);
        let mut menu = Menu::new(CandidateStore::from_lines(&["a", "b"]), &config);
        menu.handle(Action::Emit);
        menu.handle(Action::Next);
        let frame = render(&menu, &config, &Mono, 20.0);
        assert_eq!(row_fill(&frame, 3.0), config.colors[Scheme::Out].bg);
    }

    #[test]
    fn single_line_pages_with_arrows() {
        let config = config(0);
        let lines: Vec<String> = (0..10).map(|i| format!("aaa{}", i)).collect();
        let mut menu = Menu::new(CandidateStore::from_lines(&lines), &config);

        // input takes a third of 42, arrows 2 each, leaving 24: four 5-wide items
        let frame = render(&menu, &config, &Mono, 42.0);
        assert_eq!(frame.height, 3.0);
        assert_eq!(frame.visible, 0..4);
        let shown: Vec<&str> = texts(&frame).into_iter().map(|(t, _)| t).collect();
        assert_eq!(shown, ["aaa0", "aaa1", "aaa2", "aaa3", ">"]);
        assert_eq!(text_at(&frame, "aaa0").0, 14.0 + 2.0 + 0.5);

        menu.set_page_len(frame.visible.len());
        menu.handle(Action::PageNext);
        menu.handle(Action::Next);
        let frame = render(&menu, &config, &Mono, 42.0);
        assert_eq!(frame.visible, 4..8);
        let shown: Vec<&str> = texts(&frame).into_iter().map(|(t, _)| t).collect();
        assert_eq!(shown, ["<", "aaa4", "aaa5", "aaa6", "aaa7", ">"]);
    }

    #[test]
    fn pages_pack_greedily() {
        assert_eq!(page_of(4, 7.0, 0, |_| 3.0), 0..2);
        assert_eq!(page_of(4, 7.0, 3, |_| 3.0), 2..4);
        assert_eq!(page_of(2, 7.0, 1, |_| 9.0), 1..2);
        assert_eq!(page_of(0, 7.0, 0, |_| 3.0), 0..0);
    }

    #[test]
    fn paging_stops_measuring_after_the_target_page() {
        let mut measured = Vec::new();
        let page = page_of(1000, 7.0, 2, |i| {
            measured.push(i);
            3.0
        });
        assert_eq!(page, 2..4);
        assert_eq!(measured, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn long_query_scrolls_to_keep_the_cursor() {
        let config = config(1);
        let mut menu = Menu::new(CandidateStore::from_lines(&["0"]), &config);
        for c in 'a'..='z' {
            menu.handle(Action::Insert(c));
        }
        let cursor_color = config.colors[Scheme::Cursor].fg;
        let cursor_x = |frame: &Frame| {
            frame.commands.iter().find_map(|c| match c {
                DrawCommand::Rect { x, color, width, .. }
                    if *color == cursor_color && *width == CURSOR_WIDTH =>
                {
                    Some(*x)
                }
                _ => None,
            })
        };

        // 19 units of room, 2 of them for the cursor
        let frame = render(&menu, &config, &Mono, 20.0);
        assert_eq!(text_at(&frame, "jklmnopqrstuvwxyz").0, 0.5);
        assert_eq!(cursor_x(&frame), Some(17.5));

        menu.handle(Action::Home);
        let frame = render(&menu, &config, &Mono, 20.0);
        text_at(&frame, "abcdefghijklmnop...");
        assert_eq!(cursor_x(&frame), Some(0.5));
    }
}
