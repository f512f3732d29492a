//! Terminal output: rich markdown via termimad, plain text, or JSON.

use anyhow::Result;
use serde::Serialize;
use termimad::{crossterm::style::Color, MadSkin};

/// How command results reach the terminal.
pub struct TerminalRenderer {
    rich_enabled: bool,
    json: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool, json: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_fg(Color::Cyan);
        skin.inline_code.set_bg(Color::AnsiValue(236));

        Self {
            rich_enabled,
            json,
            skin,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Prints `value` as markdown, or as JSON when `--json` was given.
    pub fn show<T: Serialize + std::fmt::Display>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
            return Ok(());
        }
        self.render(&value.to_string());
        Ok(())
    }

    /// Render markdown text to terminal
    pub fn render(&self, markdown: &str) {
        if !self.rich_enabled {
            print!("{markdown}");
            if !markdown.ends_with('\n') {
                println!();
            }
            return;
        }
        for line in markdown.lines() {
            if line.starts_with('#') {
                println!("\x1b[34m{line}\x1b[0m");
            } else {
                self.skin.print_inline(line);
                println!();
            }
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true, false)
    }
}
