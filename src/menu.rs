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
use crate::config::Config;
use crate::items::{sanitize, Candidate, CandidateStore};
use crate::search::{ContainsEngine, Match, SearchEngine};
use std::ops::Range;

/// Everything the user can ask the menu to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Insert(char),
    /// Inserts the kill buffer at the cursor.
    Paste,
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,
    KillToStart,
    KillToEnd,
    Clear,
    Left,
    Right,
    WordLeft,
    WordRight,
    Home,
    End,
    Next,
    Previous,
    PageNext,
    PagePrevious,
    First,
    Last,
    /// Replaces the query with the highlighted item.
    Complete,
    Confirm,
    /// Confirms the typed text even if an item is highlighted.
    ConfirmQuery,
    /// Writes out the current selection and keeps running.
    Emit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Candidate { index: usize, text: String },
    Query(String),
}

impl Selection {
    pub fn text(&self) -> &str {
        match self {
            Selection::Candidate { text, .. } => text,
            Selection::Query(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed(Selection),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Running,
    Emit(Selection),
    Finished(Outcome),
}

/// The visible window into the filtered items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    capacity: usize,
    offset: usize,
}

impl Viewport {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn range(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        start..(start + self.capacity).min(len)
    }

    /// Moves the window as little as possible so `selection` is visible.
    fn follow(&mut self, selection: Option<usize>) {
        let capacity = self.capacity.max(1);
        match selection {
            None => self.offset = 0,
            Some(sel) if sel < self.offset => self.offset = sel,
            Some(sel) if sel >= self.offset + capacity => self.offset = sel + 1 - capacity,
            Some(_) => {}
        }
    }
}

/// Manages the whole state of the program
pub struct Menu {
    store: CandidateStore,
    engine: Box<dyn SearchEngine>,
    delimiters: String,
    vertical: bool,
    query: String,
    /// Byte offset into `query`, always on a char boundary.
    cursor: usize,
    items: Vec<Match>,
    selection: Option<usize>,
    viewport: Viewport,
    kill_buffer: String,
    emitted: Vec<bool>,
}

impl Menu {
    pub fn new(store: CandidateStore, config: &Config) -> Self {
        let engine = ContainsEngine::new(config.word_delimiters.clone());
        Menu::with_engine(store, config, Box::new(engine))
    }

    pub fn with_engine(store: CandidateStore, config: &Config, engine: Box<dyn SearchEngine>) -> Self {
        let items = engine.search("", &store);
        let selection = if items.is_empty() { None } else { Some(0) };
        let emitted = vec![false; store.len()];
        Menu {
            store,
            engine,
            delimiters: config.word_delimiters.clone(),
            vertical: config.is_vertical(),
            query: String::new(),
            cursor: 0,
            items,
            selection,
            viewport: Viewport {
                capacity: config.lines.max(1) as usize,
                offset: 0,
            },
            kill_buffer: String::new(),
            emitted,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn items(&self) -> &[Match] {
        &self.items
    }

    /// The filtered candidates, best match first.
    pub fn filtered(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.items.iter().filter_map(move |m| self.store.get(m.index))
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.selection
            .and_then(|sel| self.items.get(sel))
            .and_then(|m| self.store.get(m.index))
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn kill_buffer(&self) -> &str {
        &self.kill_buffer
    }

    pub fn is_emitted(&self, index: usize) -> bool {
        self.emitted.get(index).copied().unwrap_or(false)
    }

    /// Matched byte ranges of `text` under the current query.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        self.engine.spans(&self.query, text)
    }

    /// In single-line mode the page length depends on text widths, so the
    /// front end reports it after each layout.
    pub fn set_page_len(&mut self, len: usize) {
        if !self.vertical {
            self.viewport.capacity = len.max(1);
        }
    }

    /// Replaces the query, keeping the highlight where it was if possible.
    pub fn set_query(&mut self, query: &str) {
        self.query = sanitize(query);
        self.cursor = self.query.len();
        self.refilter(false);
        self.viewport.follow(self.selection);
    }

    pub fn insert_str(&mut self, text: &str) {
        let text = sanitize(text);
        self.query.insert_str(self.cursor, &text);
        self.cursor += text.len();
        self.refilter(true);
        self.viewport.follow(self.selection);
    }

    pub fn handle(&mut self, action: Action) -> Status {
        tracing::trace!(?action, query = %self.query, "handling action");
        let status = match action {
            Action::Insert(c) => {
                if !c.is_control() {
                    self.query.insert(self.cursor, c);
                    self.cursor += c.len_utf8();
                    self.refilter(true);
                }
                Status::Running
            }
            Action::Paste => {
                let text = self.kill_buffer.clone();
                self.insert_str(&text);
                Status::Running
            }
            Action::DeleteBackward => {
                if let Some(start) = self.prev_boundary(self.cursor) {
                    self.query.replace_range(start..self.cursor, "");
                    self.cursor = start;
                    self.refilter(false);
                }
                Status::Running
            }
            Action::DeleteForward => {
                if let Some(end) = self.next_boundary(self.cursor) {
                    self.query.replace_range(self.cursor..end, "");
                    self.refilter(false);
                }
                Status::Running
            }
            Action::DeleteWordBackward => {
                let start = self.word_start(self.cursor);
                if start < self.cursor {
                    self.kill_buffer = self.query.drain(start..self.cursor).collect();
                    self.cursor = start;
                    self.refilter(false);
                }
                Status::Running
            }
            Action::KillToStart => {
                if self.cursor > 0 {
                    self.kill_buffer = self.query.drain(..self.cursor).collect();
                    self.cursor = 0;
                    self.refilter(false);
                }
                Status::Running
            }
            Action::KillToEnd => {
                if self.cursor < self.query.len() {
                    self.kill_buffer = self.query.split_off(self.cursor);
                    self.refilter(false);
                }
                Status::Running
            }
            Action::Clear => {
                if !self.query.is_empty() {
                    self.query.clear();
                    self.cursor = 0;
                    self.refilter(false);
                }
                Status::Running
            }
            Action::Left => {
                match self.prev_boundary(self.cursor) {
                    Some(at) => self.cursor = at,
                    None if !self.vertical => self.move_selection(|sel, _, _| sel.saturating_sub(1)),
                    None => {}
                }
                Status::Running
            }
            Action::Right => {
                match self.next_boundary(self.cursor) {
                    Some(at) => self.cursor = at,
                    None if !self.vertical => self.move_selection(|sel, _, _| sel + 1),
                    None => {}
                }
                Status::Running
            }
            Action::WordLeft => {
                self.cursor = self.word_start(self.cursor);
                Status::Running
            }
            Action::WordRight => {
                self.cursor = self.word_end(self.cursor);
                Status::Running
            }
            Action::Home => {
                self.cursor = 0;
                Status::Running
            }
            Action::End => {
                self.cursor = self.query.len();
                Status::Running
            }
            Action::Next => {
                self.move_selection(|sel, _, _| sel + 1);
                Status::Running
            }
            Action::Previous => {
                self.move_selection(|sel, _, _| sel.saturating_sub(1));
                Status::Running
            }
            Action::PageNext => {
                self.move_selection(|sel, _, page| sel + page);
                Status::Running
            }
            Action::PagePrevious => {
                self.move_selection(|sel, _, page| sel.saturating_sub(page));
                Status::Running
            }
            Action::First => {
                self.move_selection(|_, _, _| 0);
                Status::Running
            }
            Action::Last => {
                self.move_selection(|_, last, _| last);
                Status::Running
            }
            Action::Complete => {
                if let Some(text) = self.selected().map(|c| c.text().to_string()) {
                    self.query = text;
                    self.cursor = self.query.len();
                    self.refilter(true);
                }
                Status::Running
            }
            Action::Confirm => Status::Finished(Outcome::Confirmed(self.current())),
            Action::ConfirmQuery => {
                Status::Finished(Outcome::Confirmed(Selection::Query(self.query.clone())))
            }
            Action::Emit => {
                let selection = self.current();
                if let Selection::Candidate { index, .. } = selection {
                    if let Some(flag) = self.emitted.get_mut(index) {
                        *flag = true;
                    }
                }
                Status::Emit(selection)
            }
            Action::Cancel => Status::Finished(Outcome::Cancelled),
        };

        debug_assert!(self.query.is_char_boundary(self.cursor));
        debug_assert!(match self.selection {
            Some(sel) => sel < self.items.len(),
            None => self.items.is_empty(),
        });
        self.viewport.follow(self.selection);

        if let Status::Finished(outcome) = &status {
            tracing::debug!(?outcome, "menu finished");
        }
        status
    }

    /// The highlighted candidate, or the typed text when nothing matches.
    fn current(&self) -> Selection {
        let highlighted = self
            .selection
            .and_then(|sel| self.items.get(sel))
            .and_then(|m| self.store.get(m.index).map(|c| (m.index, c)));
        match highlighted {
            Some((index, candidate)) => Selection::Candidate {
                index,
                text: candidate.text().to_string(),
            },
            None => Selection::Query(self.query.clone()),
        }
    }

    fn refilter(&mut self, reset: bool) {
        let previous = self.selection;
        self.items = self.engine.search(&self.query, &self.store);
        self.selection = match self.items.len() {
            0 => None,
            _ if reset => {
                self.viewport.offset = 0;
                Some(0)
            }
            len => Some(previous.unwrap_or(0).min(len - 1)),
        };
        tracing::trace!(matches = self.items.len(), "refiltered");
    }

    /// Applies `step(selection, last_index, page_len)` and clamps the result.
    fn move_selection<F>(&mut self, step: F)
    where
        F: FnOnce(usize, usize, usize) -> usize,
    {
        if let Some(sel) = self.selection {
            let last = self.items.len().saturating_sub(1);
            self.selection = Some(step(sel, last, self.viewport.capacity.max(1)).min(last));
        }
    }

    fn prev_boundary(&self, at: usize) -> Option<usize> {
        self.query[..at]
            .chars()
            .next_back()
            .map(|c| at - c.len_utf8())
    }

    fn next_boundary(&self, at: usize) -> Option<usize> {
        self.query[at..].chars().next().map(|c| at + c.len_utf8())
    }

    fn is_delimiter(&self, c: char) -> bool {
        self.delimiters.contains(c)
    }

    fn word_start(&self, at: usize) -> usize {
        let mut start = at;
        let mut chars = self.query[..at].chars().rev().peekable();
        while let Some(c) = chars.next_if(|c| self.is_delimiter(*c)) {
            start -= c.len_utf8();
        }
        while let Some(c) = chars.next_if(|c| !self.is_delimiter(*c)) {
            start -= c.len_utf8();
        }
        start
    }

    fn word_end(&self, at: usize) -> usize {
        let mut end = at;
        let mut chars = self.query[at..].chars().peekable();
        while let Some(c) = chars.next_if(|c| self.is_delimiter(*c)) {
            end += c.len_utf8();
        }
        while let Some(c) = chars.next_if(|c| !self.is_delimiter(*c)) {
            end += c.len_utf8();
        }
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lines: u32) -> Config {
        Config {
            lines,
            ..Config::default()
        }
    }

    fn menu(lines: &[&str]) -> Menu {
        Menu::new(CandidateStore::from_lines(lines), &config(3))
    }

    fn type_str(menu: &mut Menu, text: &str) {
        for c in text.chars() {
            assert_eq!(menu.handle(Action::Insert(c)), Status::Running);
        }
    }

    fn shown(menu: &Menu) -> Vec<&str> {
        menu.filtered().map(Candidate::text).collect()
    }

    #[test]
    fn typing_filters_and_resets_highlight() {
        let mut m = menu(&["alpha", "beta", "alphabet"]);
        m.handle(Action::Next);
        assert_eq!(m.selection(), Some(1));
        type_str(&mut m, "alp");
        assert_eq!(shown(&m), ["alpha", "alphabet"]);
        assert_eq!(m.selection(), Some(0));
        assert_eq!(m.query(), "alp");
        assert_eq!(m.cursor(), 3);
    }

    #[test]
    fn highlight_clamps_when_view_shrinks() {
        let mut m = menu(&["ab", "abc", "abcd", "abcde"]);
        m.handle(Action::Last);
        assert_eq!(m.selection(), Some(3));
        m.set_query("abc");
        assert_eq!(m.items().len(), 3);
        assert_eq!(m.selection(), Some(2));
        m.set_query("abcde");
        assert_eq!(m.selection(), Some(0));
        m.set_query("zzz");
        assert_eq!(m.selection(), None);
    }

    #[test]
    fn navigation_stops_at_both_ends() {
        let mut m = menu(&["a", "b", "c"]);
        m.handle(Action::Previous);
        assert_eq!(m.selection(), Some(0));
        m.handle(Action::Last);
        m.handle(Action::Next);
        assert_eq!(m.selection(), Some(2));
        m.handle(Action::PagePrevious);
        assert_eq!(m.selection(), Some(0));
        m.handle(Action::PageNext);
        assert_eq!(m.selection(), Some(2));
    }

    #[test]
    fn viewport_scrolls_minimally() {
        let lines: Vec<String> = (0..10).map(|i| format!("item{}", i)).collect();
        let mut m = Menu::new(CandidateStore::from_lines(&lines), &config(3));
        assert_eq!(m.viewport().range(10), 0..3);
        m.handle(Action::Next);
        m.handle(Action::Next);
        assert_eq!(m.viewport().offset(), 0);
        m.handle(Action::Next);
        assert_eq!(m.viewport().offset(), 1);
        m.handle(Action::PageNext);
        assert_eq!(m.selection(), Some(6));
        assert_eq!(m.viewport().range(10), 4..7);
        m.handle(Action::Previous);
        m.handle(Action::Previous);
        m.handle(Action::Previous);
        assert_eq!(m.viewport().offset(), 3);
        m.handle(Action::Last);
        assert_eq!(m.viewport().range(10), 7..10);
        m.handle(Action::First);
        assert_eq!(m.viewport().offset(), 0);
    }

    #[test]
    fn confirm_returns_highlighted_candidate() {
        let mut m = menu(&["firefox", "foot"]);
        type_str(&mut m, "FOO");
        assert_eq!(
            m.handle(Action::Confirm),
            Status::Finished(Outcome::Confirmed(Selection::Candidate {
                index: 1,
                text: "foot".to_string(),
            }))
        );
    }

    #[test]
    fn confirm_without_matches_returns_raw_query() {
        let mut m = menu(&["firefox", "foot"]);
        type_str(&mut m, "Füü bar");
        assert!(m.items().is_empty());
        assert_eq!(
            m.handle(Action::Confirm),
            Status::Finished(Outcome::Confirmed(Selection::Query("Füü bar".to_string())))
        );
    }

    #[test]
    fn empty_store_confirms_query() {
        let mut m = menu(&[]);
        assert_eq!(m.selection(), None);
        type_str(&mut m, "ls");
        match m.handle(Action::Confirm) {
            Status::Finished(Outcome::Confirmed(sel)) => assert_eq!(sel.text(), "ls"),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn cancel_differs_from_confirming_empty_text() {
        let mut m = menu(&[]);
        assert_eq!(m.handle(Action::Cancel), Status::Finished(Outcome::Cancelled));
        assert_eq!(
            m.handle(Action::Confirm),
            Status::Finished(Outcome::Confirmed(Selection::Query(String::new())))
        );
    }

    #[test]
    fn confirm_query_ignores_highlight() {
        let mut m = menu(&["foobar"]);
        type_str(&mut m, "foo");
        assert_eq!(
            m.handle(Action::ConfirmQuery),
            Status::Finished(Outcome::Confirmed(Selection::Query("foo".to_string())))
        );
    }

    #[test]
    fn cursor_edits_respect_multibyte_chars() {
        let mut m = menu(&[]);
        type_str(&mut m, "aéz");
        m.handle(Action::Left);
        m.handle(Action::DeleteBackward);
        assert_eq!(m.query(), "az");
        assert_eq!(m.cursor(), 1);
        m.handle(Action::DeleteForward);
        assert_eq!(m.query(), "a");
        m.handle(Action::DeleteForward);
        assert_eq!(m.query(), "a");
        m.handle(Action::Home);
        m.handle(Action::DeleteBackward);
        assert_eq!(m.query(), "a");
        m.handle(Action::Insert('ß'));
        assert_eq!(m.query(), "ßa");
        m.handle(Action::End);
        assert_eq!(m.cursor(), 3);
    }

    #[test]
    fn control_chars_are_not_inserted() {
        let mut m = menu(&[]);
        m.handle(Action::Insert('\u{1b}'));
        m.insert_str("a\tb\n");
        assert_eq!(m.query(), "ab");
    }

    #[test]
    fn delete_word_stops_at_delimiter() {
        let mut m = menu(&[]);
        type_str(&mut m, "git commit  ");
        m.handle(Action::DeleteWordBackward);
        assert_eq!(m.query(), "git ");
        assert_eq!(m.kill_buffer(), "commit  ");
        m.handle(Action::DeleteWordBackward);
        assert_eq!(m.query(), "");
        m.handle(Action::DeleteWordBackward);
        assert_eq!(m.kill_buffer(), "git ");
    }

    #[test]
    fn kill_and_paste_round_the_cursor() {
        let mut m = menu(&[]);
        type_str(&mut m, "hello world");
        m.handle(Action::WordLeft);
        assert_eq!(m.cursor(), 6);
        m.handle(Action::KillToEnd);
        assert_eq!(m.query(), "hello ");
        m.handle(Action::Home);
        m.handle(Action::Paste);
        assert_eq!(m.query(), "worldhello ");
        assert_eq!(m.cursor(), 5);
        m.handle(Action::WordRight);
        assert_eq!(m.cursor(), 10);
        m.handle(Action::KillToStart);
        assert_eq!(m.query(), " ");
        assert_eq!(m.kill_buffer(), "worldhello");
        m.handle(Action::Clear);
        assert_eq!(m.query(), "");
    }

    #[test]
    fn tab_completes_the_highlighted_item() {
        let mut m = menu(&["Firefox", "files"]);
        type_str(&mut m, "fi");
        m.handle(Action::Complete);
        assert_eq!(m.query(), "Firefox");
        assert_eq!(m.cursor(), 7);
        assert_eq!(shown(&m), ["Firefox"]);
    }

    #[test]
    fn emit_marks_and_keeps_running() {
        let mut m = menu(&["a", "b"]);
        m.handle(Action::Next);
        assert_eq!(
            m.handle(Action::Emit),
            Status::Emit(Selection::Candidate {
                index: 1,
                text: "b".to_string()
            })
        );
        assert!(m.is_emitted(1));
        assert!(!m.is_emitted(0));
        assert_eq!(m.handle(Action::Next), Status::Running);
    }

    #[test]
    fn single_line_arrows_walk_items_at_query_edges() {
        let mut m = Menu::new(CandidateStore::from_lines(&["a", "b", "c"]), &config(0));
        m.set_page_len(2);
        m.handle(Action::Right);
        assert_eq!(m.selection(), Some(1));
        m.handle(Action::PageNext);
        assert_eq!(m.selection(), Some(2));
        m.handle(Action::Left);
        assert_eq!(m.selection(), Some(1));
    }

    #[test]
    fn page_len_only_resizes_single_line_pages() {
        let lines = ["a", "b", "c"];
        let mut m = Menu::new(CandidateStore::from_lines(&lines), &config(0));
        assert_eq!(m.viewport().capacity(), 1);
        m.set_page_len(2);
        assert_eq!(m.viewport().capacity(), 2);
        m.set_page_len(0);
        assert_eq!(m.viewport().capacity(), 1);

        let mut m = Menu::new(CandidateStore::from_lines(&lines), &config(3));
        m.set_page_len(1);
        assert_eq!(m.viewport().capacity(), 3);
    }

    #[test]
    fn vertical_arrows_only_move_the_cursor() {
        let mut m = menu(&["a", "b"]);
        m.handle(Action::Right);
        m.handle(Action::Left);
        assert_eq!(m.selection(), Some(0));
    }
}
