//! # Reports
//!
//! Renders sampled primes plus a closing summary in one of four formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::config::Bound;
use crate::error::{Result, SieveError};
use crate::sampling::PrimeSample;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
    #[serde(rename = "md")]
    Markdown,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = SieveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            other => Err(SieveError::UnknownFormat(other.to_string())),
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub bound: Bound,
    /// Primes discovered
    pub total_primes: usize,
    /// Primes reported
    pub sampled: usize,
    pub sampling_percent: f64,
    pub largest_prime: Option<u64>,
    /// Filter stages spliced during the run
    pub stages: usize,
}

impl RunSummary {
    /// Closing sentence of the text and Markdown reports
    pub fn sentence(&self) -> String {
        let percent = format_percent(self.sampling_percent);
        match self.bound {
            Bound::Count(_) => format!(
                "That was {}% of the first {} prime numbers.",
                percent, self.total_primes
            ),
            Bound::MaxValue(max) => format!(
                "That was {}% of the {} prime numbers up to {}.",
                percent, self.total_primes, max
            ),
        }
    }
}

fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{:.0}", percent)
    } else {
        format!("{}", percent)
    }
}

fn digits(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    samples: &'a [PrimeSample],
    summary: &'a RunSummary,
}

/// Write a full report to `out`
pub fn render<W: Write>(
    format: OutputFormat,
    samples: &[PrimeSample],
    summary: &RunSummary,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let width = digits(summary.total_primes);
            for sample in samples {
                writeln!(out, " {:>width$} : {}", sample.index, sample.prime)?;
            }
            writeln!(out, "{}", summary.sentence())?;
        }
        OutputFormat::Csv => {
            writeln!(out, "index,prime")?;
            for sample in samples {
                writeln!(out, "{},{}", sample.index, sample.prime)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &JsonReport { samples, summary })?;
            writeln!(out)?;
        }
        OutputFormat::Markdown => {
            writeln!(out, "| index | prime |")?;
            writeln!(out, "|------:|------:|")?;
            for sample in samples {
                writeln!(out, "| {} | {} |", sample.index, sample.prime)?;
            }
            writeln!(out)?;
            writeln!(out, "{}", summary.sentence())?;
        }
    }
    Ok(())
}

/// Render into a `String`
pub fn render_to_string(
    format: OutputFormat,
    samples: &[PrimeSample],
    summary: &RunSummary,
) -> Result<String> {
    let mut buf = Vec::new();
    render(format, samples, summary, &mut buf)?;
    String::from_utf8(buf).map_err(|e| {
        SieveError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
