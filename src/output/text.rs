//! Human-readable scan report.

use std::fmt::Display;
use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use crate::duplicates::ScanReport;

/// Number of hex digits of the digest shown per group.
const SHORT_HASH_LEN: usize = 12;

/// Plain-text renderer for a [`ScanReport`].
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    report: &'a ScanReport,
    show_unique: bool,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Render duplicate groups only, in colour.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self {
            report,
            show_unique: false,
            color: true,
        }
    }

    /// Also list files whose content is unique.
    #[must_use]
    pub fn with_unique(mut self, show: bool) -> Self {
        self.show_unique = show;
        self
    }

    /// Enable or disable ANSI styling.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint<T: Display>(&self, value: T, style: Style) -> String {
        if self.color {
            value.paint(style).to_string()
        } else {
            value.to_string()
        }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let map = &self.report.duplicates;
        let summary = &self.report.summary;

        for (index, (hash, files)) in map.duplicate_groups().enumerate() {
            let hex = crate::scanner::hash_to_hex(hash);
            writeln!(
                writer,
                "{} ({} files) {}",
                self.paint(format!("Group {}", index + 1), Style::new().bold()),
                files.len(),
                self.paint(&hex[..SHORT_HASH_LEN], Style::new().dim())
            )?;
            for path in files {
                writeln!(writer, "  {}", path.display())?;
            }
            writeln!(writer)?;
        }

        if self.show_unique {
            let unique: Vec<_> = map.iter().filter(|(_, files)| files.len() == 1).collect();
            if !unique.is_empty() {
                writeln!(writer, "{}", self.paint("Unique files", Style::new().bold()))?;
                for (_, files) in unique {
                    writeln!(writer, "  {}", files[0].display())?;
                }
                writeln!(writer)?;
            }
        }

        writeln!(
            writer,
            "{} of {} files processed, {} hashed in {:.2}s",
            summary.processed_files,
            summary.total_files,
            ByteSize::b(summary.bytes_hashed),
            summary.duration.as_secs_f64()
        )?;

        let groups = map.duplicate_group_count();
        let line = if groups == 0 {
            "No duplicates found".to_string()
        } else {
            format!(
                "{} duplicate group{}, {} redundant cop{}",
                groups,
                if groups == 1 { "" } else { "s" },
                map.duplicate_file_count(),
                if map.duplicate_file_count() == 1 { "y" } else { "ies" }
            )
        };
        writeln!(writer, "{}", self.paint(line, Style::new().green().bold()))?;

        if summary.has_errors() {
            writeln!(
                writer,
                "{}",
                self.paint(
                    format!(
                        "{} unreadable files and {} unreadable directories skipped",
                        summary.skipped_files, summary.walk_errors
                    ),
                    Style::new().yellow()
                )
            )?;
        }
        if summary.is_cancelled() {
            writeln!(
                writer,
                "{}",
                self.paint("Scan cancelled: results are partial", Style::new().red().bold())
            )?;
        }

        Ok(())
    }

    /// Render into a string.
    ///
    /// # Errors
    ///
    /// Propagates any formatting error from [`TextOutput::write_to`].
    pub fn render(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
