//! Rendering policies, entries and flush results

use cachectl_storage::CacheEntry;
use regex::Regex;
use std::io::{self, Write};
use std::path::Path;

use crate::cache::{Classification, FlushReport};
use crate::policy::CachePolicy;
use crate::units::{format_duration, format_space, format_time};

/// Counts from one `show` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowSummary {
    pub total: u64,
    pub matched: u64,
}

/// Writes command output to `out` and per-entry failures to `err`
///
/// The cache directory banner is printed at most once per reporter, so
/// a mutation followed by its inspect report only shows it once.
pub struct Reporter<O, E> {
    out: O,
    err: E,
    directory_shown: bool,
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            directory_shown: false,
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    pub fn cache_directory(&mut self, directory: &Path) -> io::Result<()> {
        if self.directory_shown {
            return Ok(());
        }
        self.directory_shown = true;
        writeln!(self.out, "Cache directory: {}", directory.display())
    }

    /// One block per policy, in effective-list order
    pub fn inspect(
        &mut self,
        policies: &[CachePolicy],
        classification: &Classification,
    ) -> io::Result<()> {
        for policy in policies {
            writeln!(self.out, "{}", policy)?;
            if !policy.caches() {
                continue;
            }

            let stats = classification
                .get(policy.pattern())
                .copied()
                .unwrap_or_default();
            writeln!(
                self.out,
                "  Files: {} in {} {}",
                format_space(stats.space as i64),
                stats.count,
                entries_word(stats.count)
            )?;

            let space = match policy.max_space() {
                Some(bytes) => format_space(bytes as i64),
                None => "unlimited space".to_string(),
            };
            let count = match policy.max_entries() {
                Some(n) => format!("{} {}", n, entries_word(n)),
                None => "unlimited entries".to_string(),
            };
            write!(
                self.out,
                "  Limits: {}, {}, delete wait {}",
                space,
                count,
                format_duration(policy.delete_wait())
            )?;
            if let Some(age) = policy.max_age() {
                write!(self.out, ", max age: {}", format_duration(age as i64))?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// List entries whose display key matches `filter` (all entries when `None`)
    pub fn show(
        &mut self,
        entries: &[CacheEntry],
        filter: Option<&Regex>,
        verbose: bool,
    ) -> io::Result<ShowSummary> {
        if let Some(filter) = filter {
            writeln!(self.out, "Showing cache entries matching '{}'", filter.as_str())?;
        }

        let mut summary = ShowSummary {
            total: 0,
            matched: 0,
        };
        for entry in entries {
            summary.total += 1;
            let key = entry.display_key();
            if filter.is_some_and(|f| !f.is_match(&key)) {
                continue;
            }
            summary.matched += 1;

            if !verbose {
                writeln!(self.out, "{}", key)?;
                continue;
            }

            writeln!(self.out, "{}", entry)?;
            writeln!(self.out, "  {}", key)?;
            if entry.expired {
                writeln!(self.out, "  EXPIRED (cached {})", format_time(&entry.cached_at))?;
            } else {
                writeln!(self.out, "  Cached {}", format_time(&entry.cached_at))?;
            }
            if let Some(content_type) = &entry.content_type {
                writeln!(self.out, "  Content-type: {}", content_type)?;
            }
        }

        if summary.matched == summary.total {
            writeln!(self.out, "{} {}", summary.total, entries_word(summary.total))?;
        } else {
            writeln!(
                self.out,
                "{} of {} entries match",
                summary.matched, summary.total
            )?;
        }
        Ok(summary)
    }

    pub fn flush(&mut self, report: &FlushReport) -> io::Result<()> {
        for failure in &report.failures {
            writeln!(self.err, "{}", failure)?;
        }
        writeln!(self.out, "Flushed {} entries", report.flushed)
    }
}

fn entries_word(count: u64) -> &'static str {
    if count == 1 { "entry" } else { "entries" }
}
