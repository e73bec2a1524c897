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
use moeselect::xorg::XorgUserInterface;
use moeselect::{CandidateStore, Config, Menu, Outcome, Selection, UserInterface};
use std::io::{self, Write};
use std::process;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MOESELECT_LOG";

/// Logs go to stderr; stdout belongs to the selection.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print(selection: &Selection) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", selection.text())?;
    out.flush()
}

/// Returns whether something was selected.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("ignoring config file: {}", e);
        Config::default()
    });

    let stdin = io::stdin();
    let store = CandidateStore::load(stdin.lock())?;
    let mut menu = Menu::new(store, &config);

    let mut ui = XorgUserInterface::new(&config)?;
    let mut emit = |selection: &Selection| {
        if let Err(e) = print(selection) {
            tracing::warn!("cannot write selection: {}", e);
        }
    };

    match ui.run(&mut menu, &mut emit)? {
        Outcome::Confirmed(selection) => {
            print(&selection)?;
            Ok(true)
        }
        Outcome::Cancelled => Ok(false),
    }
}

fn main() {
    init_logging();
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("moeselect: {}", e);
            process::exit(1);
        }
    }
}
