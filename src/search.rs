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
use crate::items::{fold, CandidateStore};
use std::ops::Range;

/// How well a candidate matched, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Exact,
    Prefix,
    Substring,
}

/// A reference into the candidate store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub index: usize,
    pub tier: Tier,
}

pub trait SearchEngine {
    /// Filters and orders the store for `query`. Must be pure.
    fn search(&self, query: &str, store: &CandidateStore) -> Vec<Match>;

    /// Byte ranges of `text` that matched, for highlighting.
    fn spans(&self, query: &str, text: &str) -> Vec<Range<usize>>;
}

// simple engine based on str::contains, one pass per keystroke
pub struct ContainsEngine {
    delimiters: String,
}

impl ContainsEngine {
    pub fn new<S: Into<String>>(delimiters: S) -> Self {
        ContainsEngine {
            delimiters: delimiters.into(),
        }
    }

    fn tokens<'q>(&self, folded: &'q str) -> Vec<&'q str> {
        folded
            .split(|c: char| self.delimiters.contains(c))
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl SearchEngine for ContainsEngine {
    fn search(&self, query: &str, store: &CandidateStore) -> Vec<Match> {
        let folded = fold(query);
        let tokens = self.tokens(&folded);
        if tokens.is_empty() {
            return (0..store.len())
                .map(|index| Match {
                    index,
                    tier: Tier::Substring,
                })
                .collect();
        }

        let mut exact = Vec::new();
        let mut prefix = Vec::new();
        let mut rest = Vec::new();
        for (index, candidate) in store.iter().enumerate() {
            let haystack = candidate.folded();
            if !tokens.iter().all(|t| haystack.contains(t)) {
                continue;
            }
            if haystack == folded {
                exact.push(Match {
                    index,
                    tier: Tier::Exact,
                });
            } else if haystack.starts_with(&folded) {
                prefix.push(Match {
                    index,
                    tier: Tier::Prefix,
                });
            } else {
                rest.push(Match {
                    index,
                    tier: Tier::Substring,
                });
            }
        }

        exact.append(&mut prefix);
        exact.append(&mut rest);
        exact
    }

    fn spans(&self, query: &str, text: &str) -> Vec<Range<usize>> {
        let folded = fold(query);
        let mut spans: Vec<Range<usize>> = self
            .tokens(&folded)
            .into_iter()
            .filter_map(|token| {
                let needle: Vec<char> = token.chars().collect();
                find_folded(text, &needle)
            })
            .collect();
        merge(&mut spans);
        spans
    }
}

/// Finds the first case-insensitive occurrence of an already lower-cased
/// `needle` in `text`, returning a byte range of the original text.
fn find_folded(text: &str, needle: &[char]) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    for (start, _) in text.char_indices() {
        let mut matched = 0;
        for (offset, c) in text[start..].char_indices() {
            let mut ok = true;
            for lower in c.to_lowercase() {
                if matched == needle.len() {
                    break;
                }
                if lower != needle[matched] {
                    ok = false;
                    break;
                }
                matched += 1;
            }
            if !ok {
                break;
            }
            if matched == needle.len() {
                return Some(start..start + offset + c.len_utf8());
            }
        }
    }
    None
}

fn merge(spans: &mut Vec<Range<usize>>) {
    spans.sort_by_key(|s| s.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans.drain(..) {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    *spans = merged;
}
