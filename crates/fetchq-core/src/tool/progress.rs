//! Parse the tool's stdout lines.
//!
//! Two shapes matter: `[download]  42.3% of 10.00MiB at 1.20MiB/s ETA 00:05`
//! and `[info] <title>`. Everything else is ignored.

use regex::Regex;
use std::sync::LazyLock;

static PROGRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%(?:.*?\bat\s+(\S+/s))?")
        .expect("static progress pattern")
});

/// `[info] <id>: Downloading ...`-style chatter the tool prints about itself.
static INFO_CHATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+: (?:Downloading|Writing|Extracting|Available)")
        .expect("static info pattern")
});

#[derive(Debug, Clone, PartialEq)]
pub enum ToolLine {
    Progress { percent: f64, rate: Option<String> },
    Title(String),
    Other,
}

pub fn parse_line(line: &str) -> ToolLine {
    let line = line.trim();
    if let Some(caps) = PROGRESS.captures(line) {
        let Ok(percent) = caps[1].parse::<f64>() else {
            return ToolLine::Other;
        };
        let rate = caps.get(2).map(|m| m.as_str().to_string());
        return ToolLine::Progress { percent, rate };
    }
    if let Some(rest) = line.strip_prefix("[info]") {
        let title = rest.trim();
        if !title.is_empty() && !INFO_CHATTER.is_match(title) {
            return ToolLine::Title(title.to_string());
        }
    }
    ToolLine::Other
}
