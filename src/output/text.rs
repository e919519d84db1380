//! Human-readable listing of a comparison.
//!
//! ```text
//! Equal files:
//!     /left/a.bin /right/a.bin
//! Similar files:
//!     /left/draft /right/final (similarity=0.9000)
//! Unique files in /left:
//!     /left/lonely
//! Unique files in /right:
//! ```
//!
//! Entries are tab-indented. Headers are coloured with yansi when enabled.

use std::io::{self, Write};
use std::path::Path;

use yansi::{Paint, Style};

use crate::compare::ComparisonOutcome;

/// Text output formatter.
pub struct TextOutput<'a> {
    outcome: &'a ComparisonOutcome,
    color: bool,
    summary: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a plain formatter without summary footer.
    #[must_use]
    pub fn new(outcome: &'a ComparisonOutcome) -> Self {
        Self {
            outcome,
            color: false,
            summary: false,
        }
    }

    /// Colour the section headers.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Append counters and skipped files after the listing.
    #[must_use]
    pub fn with_summary(mut self, summary: bool) -> Self {
        self.summary = summary;
        self
    }

    fn header(&self, text: &str, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the listing to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let outcome = self.outcome;

        writeln!(writer, "{}", self.header("Equal files:", Style::new().green().bold()))?;
        for pair in &outcome.equal_pairs {
            writeln!(writer, "\t{} {}", pair.a.path.display(), pair.b.path.display())?;
        }

        writeln!(writer, "{}", self.header("Similar files:", Style::new().yellow().bold()))?;
        for pair in &outcome.similar_pairs {
            writeln!(
                writer,
                "\t{} {} (similarity={:.4})",
                pair.a.path.display(),
                pair.b.path.display(),
                pair.similarity
            )?;
        }

        for (root, uniques) in [
            (&outcome.root_a, &outcome.unique_a),
            (&outcome.root_b, &outcome.unique_b),
        ] {
            writeln!(writer, "{}", self.unique_header(root))?;
            for record in uniques {
                writeln!(writer, "\t{}", record.path.display())?;
            }
        }

        if self.summary {
            self.write_summary(writer)?;
        }
        Ok(())
    }

    fn unique_header(&self, root: &Path) -> String {
        self.header(
            &format!("Unique files in {}:", root.display()),
            Style::new().cyan().bold(),
        )
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let summary = &self.outcome.summary;
        writeln!(writer)?;
        writeln!(
            writer,
            "{} files vs {} files ({} hashed): {} equal, {} similar, {} + {} unique",
            summary.files_a,
            summary.files_b,
            summary.bytes_hashed_display(),
            summary.equal_pairs,
            summary.similar_pairs,
            summary.unique_a,
            summary.unique_b
        )?;
        if summary.displaced_files > 0 {
            writeln!(
                writer,
                "{} files were replaced by a later file with the same name",
                summary.displaced_files
            )?;
        }
        if !summary.errors.is_empty() {
            writeln!(writer, "{}", self.header("Skipped files:", Style::new().red().bold()))?;
            for error in &summary.errors {
                writeln!(writer, "\t{error}")?;
            }
        }
        Ok(())
    }

    /// Render the listing into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
