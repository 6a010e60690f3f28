use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;

use crate::theme::{ICONS, THEME, paint};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that can be shown as a table or a single line
pub trait TableDisplay {
    fn to_table(&self, output: &OutputManager) -> Table;
    fn to_compact(&self) -> String;
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    pub fn is_json(&self) -> bool {
        self.options.output_format == OutputFormat::Json
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(self);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    /// Print a document body as is; never colored, never suppressed by `--quiet`.
    pub fn raw(&self, text: &str) {
        print!("{text}");
    }

    fn use_color(&self) -> bool {
        !self.options.no_color
    }

    /// Structural lines go to stdout, except in quiet or JSON mode.
    fn decorates(&self) -> bool {
        !self.options.quiet && !self.is_json()
    }

    fn status(&self, icon: &str, message: &str, color: colored::Color) {
        let color_on = self.use_color();
        eprintln!("{} {}", paint(icon, color, false, color_on), paint(message, color, false, color_on));
    }

    pub fn success(&self, message: &str) {
        if !self.options.quiet {
            self.status(ICONS.success, message, THEME.success);
        }
    }

    pub fn error(&self, message: &str) {
        self.status(ICONS.error, message, THEME.error);
    }

    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            self.status(ICONS.warning, message, THEME.warning);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.options.quiet {
            self.status(ICONS.info, message, THEME.info);
        }
    }

    /// Only shown with `--verbose`.
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            self.status(ICONS.arrow, message, THEME.muted);
        }
    }

    pub fn heading(&self, text: &str) {
        if !self.decorates() {
            return;
        }
        if self.use_color() {
            println!("\n{}", paint(text, THEME.accent, true, true));
        } else {
            println!("\n{text}\n{}", "=".repeat(text.chars().count()));
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if self.decorates() {
            let color_on = self.use_color();
            println!("{}: {}", paint(key, THEME.key, true, color_on), paint(value, THEME.value, false, color_on));
        }
    }

    pub fn bullet(&self, text: &str) {
        if self.decorates() {
            println!("  {} {text}", paint(ICONS.bullet, THEME.muted, false, self.use_color()));
        }
    }

    /// Create a themed table with a bold header row
    pub fn create_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();

        if self.options.no_color {
            table.load_preset(comfy_table::presets::ASCII_FULL);
        } else {
            table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        }

        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|h| {
                let cell = Cell::new(h).add_attribute(Attribute::Bold);
                if self.options.no_color { cell } else { cell.fg(TableColor::Cyan) }
            })
            .collect();
        table.set_header(header_cells);
        table
    }
}
