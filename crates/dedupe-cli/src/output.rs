// dedupe-cli — shared output formatting
// Copyright (C) 2026  dedupe contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Small, consistent colored output helpers shared by every subcommand.

use console::style;

pub fn success(msg: &str) {
    println!("{} {}", style("done").green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("error").red().bold(), msg);
}

pub fn detail(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}
