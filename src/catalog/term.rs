//! Semester labels as reported by the LMS, normalized to [`Term`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::util::compile_static_regex;

static TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^(20\d{2})년 (1|2|(여름|겨울)(계절)?)학기$"));

const TERM_SUFFIX: &str = "학기";

/// Recognized academic periods, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TermPeriod {
    /// Spring semester.
    First,
    /// Summer session.
    Summer,
    /// Fall semester.
    Second,
    /// Winter session.
    Winter,
}

impl TermPeriod {
    /// Korean label used as the period key.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::First => "1학기",
            Self::Summer => "여름계절학기",
            Self::Second => "2학기",
            Self::Winter => "겨울계절학기",
        }
    }
}

/// A year plus a recognized period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    /// Academic year.
    pub year: u16,
    /// Period within the year.
    pub period: TermPeriod,
}

impl Term {
    /// Creates a term.
    #[must_use]
    pub fn new(year: u16, period: TermPeriod) -> Self {
        Self { year, period }
    }

    /// Normalizes an LMS term name such as `2024년 2학기 (학부)`.
    ///
    /// Anything after the first `학기` is ignored. Returns `None` for names
    /// outside the recognized pattern, e.g. special sessions.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (head, _) = name.split_once(TERM_SUFFIX)?;
        let candidate = format!("{}{TERM_SUFFIX}", head.trim());
        let caps = TERM_RE.captures(&candidate)?;
        let year = caps.get(1)?.as_str().parse().ok()?;
        let period = match caps.get(2)?.as_str() {
            "1" => TermPeriod::First,
            "2" => TermPeriod::Second,
            _ => match caps.get(3)?.as_str() {
                "여름" => TermPeriod::Summer,
                _ => TermPeriod::Winter,
            },
        };
        Some(Self { year, period })
    }

    /// Period key without the year (`"2학기"`).
    #[must_use]
    pub fn period_label(&self) -> &'static str {
        self.period.label()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}년 {}", self.year, self.period.label())
    }
}
