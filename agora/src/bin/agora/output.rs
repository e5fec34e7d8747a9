use anyhow::Result;
use clap::ValueEnum;
use colored::{Color as ThemeColor, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table, presets};
use serde::Serialize;
use std::io::{self, Write};

use crate::theme::{ICONS, THEME};

const PROGRESS_WIDTH: usize = 80;

#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// One summary line per command
    Compact,
}

/// Flags shared by every subcommand.
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that can be rendered as a table or a single summary line.
pub trait TableDisplay {
    fn to_table(&self, output: &OutputManager) -> Table;
    fn to_compact(&self) -> String;
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        if options.no_color {
            colored::control::set_override(false);
        }
        Self { options }
    }

    /// Prints `data` in the selected format. Nothing is printed with `--quiet`.
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }
        let rendered = match self.options.output_format {
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::Table => data.to_table(self).to_string(),
            OutputFormat::Compact => data.to_compact(),
        };
        println!("{rendered}");
        Ok(())
    }

    /// True when human-oriented decoration (headings, notes) should be printed.
    pub fn is_human(&self) -> bool {
        !self.options.quiet && self.options.output_format != OutputFormat::Json
    }

    /// `icon message`, colored unless `--no-color` is set.
    fn decorate(&self, icon: &str, message: &str, color: ThemeColor) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }

    pub fn success(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.decorate(ICONS.success, message, THEME.success));
        }
    }

    /// Errors go to stderr even with `--quiet`.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.decorate(ICONS.error, message, THEME.error));
    }

    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            eprintln!("{}", self.decorate(ICONS.warning, message, THEME.warning));
        }
    }

    /// Only printed with `--verbose`.
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.decorate(ICONS.arrow, message, THEME.muted));
        }
    }

    pub fn info(&self, message: &str) {
        if self.is_human() {
            println!("{}", self.decorate(ICONS.info, message, THEME.info));
        }
    }

    pub fn heading(&self, text: &str) {
        if !self.is_human() {
            return;
        }
        if self.options.no_color {
            println!("\n{text}\n{}", "-".repeat(text.chars().count()));
        } else {
            println!("\n{}", text.color(THEME.primary).bold().underline());
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if !self.is_human() {
            return;
        }
        if self.options.no_color {
            println!("  {key:<10} {value}");
        } else {
            println!("  {:<10} {}", key.color(THEME.key).bold(), value.color(THEME.value));
        }
    }

    pub fn bullet(&self, text: &str) {
        if self.is_human() {
            let icon = if self.options.no_color {
                ICONS.bullet.normal()
            } else {
                ICONS.bullet.color(THEME.muted)
            };
            println!("  {icon} {text}");
        }
    }

    pub fn create_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(if self.options.no_color {
            presets::ASCII_MARKDOWN
        } else {
            presets::UTF8_FULL_CONDENSED
        });
        table
    }

    /// Bold header row; cyan when colors are enabled.
    pub fn add_table_header(&self, table: &mut Table, headers: &[&str]) {
        table.set_header(headers.iter().map(|title| {
            let cell = Cell::new(title).add_attribute(Attribute::Bold);
            if self.options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        }));
    }

    /// Transient status line, overwritten by the next `clear_line`.
    pub fn progress(&self, message: &str) {
        if self.is_human() {
            let line = self.decorate(ICONS.loading, &format!("{message}..."), THEME.highlight);
            let mut stdout = io::stdout();
            let _ = write!(stdout, "\r{line}");
            let _ = stdout.flush();
        }
    }

    pub fn clear_line(&self) {
        if self.is_human() {
            let mut stdout = io::stdout();
            let _ = write!(stdout, "\r{:width$}\r", "", width = PROGRESS_WIDTH);
            let _ = stdout.flush();
        }
    }
}
