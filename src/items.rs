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
use crate::error::Result;
use std::io::BufRead;

/// Separates an item's text from its display label on input lines.
pub const LABEL_SEPARATOR: char = '\t';

/// One selectable line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    text: String,
    label: Option<String>,
    folded: String,
}

impl Candidate {
    /// Builds a candidate from a raw input line (without its newline).
    pub fn from_line(line: &str) -> Self {
        let (text, label) = match line.find(LABEL_SEPARATOR) {
            Some(at) => (&line[..at], Some(&line[at + LABEL_SEPARATOR.len_utf8()..])),
            None => (line, None),
        };
        let text = sanitize(text);
        let label = label.map(sanitize).filter(|l| !l.is_empty());
        Candidate {
            folded: fold(&text),
            text,
            label,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Lower-cased text used for matching.
    pub fn folded(&self) -> &str {
        &self.folded
    }
}

/// Lower-cases one char at a time. Unlike `str::to_lowercase` this ignores
/// word context, so a longer query never folds differently from its prefix.
pub fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Drops control characters so a stray escape sequence cannot break the
/// session.
pub fn sanitize(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

/// The full list of candidates, in input order. Never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct CandidateStore {
    candidates: Vec<Candidate>,
}

impl CandidateStore {
    /// Reads newline-delimited candidates until EOF. Invalid UTF-8 is
    /// replaced rather than rejected; any read error aborts the load.
    pub fn load<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut candidates = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            candidates.push(Candidate::from_line(&String::from_utf8_lossy(&buf)));
        }
        tracing::info!("loaded {} candidates", candidates.len());
        Ok(CandidateStore { candidates })
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CandidateStore {
            candidates: lines
                .into_iter()
                .map(|l| Candidate::from_line(l.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::{self, Cursor, Read};

    #[test]
    fn one_candidate_per_line() {
        let store = CandidateStore::load(Cursor::new("firefox\nfoot\r\nmpv")).unwrap();
        let texts: Vec<_> = store.iter().map(Candidate::text).collect();
        assert_eq!(texts, ["firefox", "foot", "mpv"]);
    }

    #[test]
    fn empty_input_is_an_empty_store() {
        let store = CandidateStore::load(Cursor::new("")).unwrap();
        assert!(store.is_empty());
        assert!(store.get(0).is_none());
    }

    #[test]
    fn blank_lines_are_kept_as_items() {
        let store = CandidateStore::load(Cursor::new("a\n\nb\n")).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).unwrap().text(), "");
    }

    #[test]
    fn tab_splits_off_a_label() {
        let store = CandidateStore::from_lines(vec!["vim\tText Editor", "top\t", "a\tb\tc"]);
        assert_eq!(store.get(0).unwrap().text(), "vim");
        assert_eq!(store.get(0).unwrap().label(), Some("Text Editor"));
        assert_eq!(store.get(1).unwrap().label(), None);
        assert_eq!(store.get(2).unwrap().label(), Some("bc"));
    }

    #[test]
    fn control_characters_are_stripped() {
        let store = CandidateStore::load(Cursor::new(&b"be\x1b[1mep\x07\nok\xff\n"[..])).unwrap();
        assert_eq!(store.get(0).unwrap().text(), "be[1mep");
        assert_eq!(store.get(1).unwrap().text(), "ok\u{fffd}");
    }

    #[test]
    fn folded_text_keeps_display_casing_separate() {
        let c = Candidate::from_line("LibreOffice");
        assert_eq!(c.text(), "LibreOffice");
        assert_eq!(c.folded(), "libreoffice");
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"))
        }
    }

    #[test]
    fn read_errors_propagate() {
        let result = CandidateStore::load(io::BufReader::new(Broken));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
