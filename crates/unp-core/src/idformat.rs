//! Moment-style note ID formats.
//!
//! The companion unique-note tool stores its ID pattern in moment.js
//! token syntax (`YYYYMMDDHHmm`). [`IdFormat`] compiles such a pattern
//! once into chrono format pieces and renders timestamps with it.
//!
//! Supported tokens:
//!
//! | Token | Output | Token | Output |
//! |-------|--------|-------|--------|
//! | `YYYY`, `Y` | 2024 | `YY` | 24 |
//! | `Q` | 1..4 | `MMMM` | January |
//! | `MMM` | Jan | `MM` / `M` | 01 / 1 |
//! | `DDDD` | 015 (day of year) | `DD` / `D` | 05 / 5 |
//! | `Do` | 5th | `dddd` / `ddd` | Monday / Mon |
//! | `d` | 0..6 | `E` | 1..7 |
//! | `WW` / `W` | ISO week | `HH` / `H` | 24-hour clock |
//! | `hh` / `h` | 12-hour clock | `mm` / `m` | minutes |
//! | `kk` / `k` | 1..24 hour clock | `DDD` | 15 (day of year) |
//! | `ss` / `s` | seconds | `SSS` / `SS` / `S` | millis / centis / decis |
//! | `GGGG` / `GG` | ISO week year | `ww` / `w` | Sunday-based week |
//! | `gggg` / `gg` | Sunday-based week year | | |
//! | `A` / `a` | AM / am | `X` / `x` | unix seconds / millis |
//! | `ZZ` / `Z` | +0100 / +01:00 | `[text]` | literal text |
//!
//! Any other character is copied to the output unchanged.

use std::fmt::Display;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Timelike};

/// The companion tool's default pattern: minute precision, 12 digits.
pub const DEFAULT_ID_FORMAT: &str = "YYYYMMDDHHmm";

/// Tokens in longest-first order so greedy matching picks `YYYY` over `YY`.
const TOKENS: &[(&str, Token)] = &[
    ("YYYY", Token::Spec("%Y")),
    ("GGGG", Token::Spec("%G")),
    ("gggg", Token::WeekYear { full: true }),
    ("MMMM", Token::Spec("%B")),
    ("DDDD", Token::Spec("%j")),
    ("dddd", Token::Spec("%A")),
    ("SSS", Token::Fraction(3)),
    ("DDD", Token::Spec("%-j")),
    ("MMM", Token::Spec("%b")),
    ("ddd", Token::Spec("%a")),
    ("YY", Token::Spec("%y")),
    ("GG", Token::Spec("%g")),
    ("gg", Token::WeekYear { full: false }),
    ("MM", Token::Spec("%m")),
    ("Do", Token::Ordinal),
    ("DD", Token::Spec("%d")),
    ("WW", Token::Spec("%V")),
    ("ww", Token::Week { padded: true }),
    ("HH", Token::Spec("%H")),
    ("hh", Token::Spec("%I")),
    ("kk", Token::Hour24 { padded: true }),
    ("mm", Token::Spec("%M")),
    ("ss", Token::Spec("%S")),
    ("SS", Token::Fraction(2)),
    ("ZZ", Token::Spec("%z")),
    ("Y", Token::Spec("%Y")),
    ("Q", Token::Quarter),
    ("M", Token::Spec("%-m")),
    ("D", Token::Spec("%-d")),
    ("d", Token::Spec("%w")),
    ("E", Token::Spec("%u")),
    ("W", Token::Spec("%-V")),
    ("w", Token::Week { padded: false }),
    ("H", Token::Spec("%-H")),
    ("h", Token::Spec("%-I")),
    ("k", Token::Hour24 { padded: false }),
    ("m", Token::Spec("%-M")),
    ("s", Token::Spec("%-S")),
    ("S", Token::Fraction(1)),
    ("A", Token::Spec("%p")),
    ("a", Token::Spec("%P")),
    ("X", Token::Spec("%s")),
    ("x", Token::Spec("%s%3f")),
    ("Z", Token::Spec("%:z")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// A chrono strftime specifier.
    Spec(&'static str),
    /// Day of month with an English ordinal suffix.
    Ordinal,
    /// Quarter of the year.
    Quarter,
    /// Hour of the day counted 1..=24.
    Hour24 { padded: bool },
    /// Leading digits of the fractional second.
    Fraction(u32),
    /// Sunday-based week of the year; week 1 holds January 1st.
    Week { padded: bool },
    /// Year that the Sunday-based week belongs to.
    WeekYear { full: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Token(Token),
    Literal(String),
}

/// A compiled note ID pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFormat {
    pattern: String,
    pieces: Vec<Piece>,
}

impl IdFormat {
    /// Compile a moment-style pattern. Compilation never fails: anything
    /// that is not a token is treated as literal text.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let mut pieces: Vec<Piece> = Vec::new();
        let mut rest = pattern;

        while let Some(c) = rest.chars().next() {
            if c == '[' {
                if let Some(close) = rest.find(']') {
                    push_literal(&mut pieces, &rest[1..close]);
                    rest = &rest[close + 1..];
                    continue;
                }
            }

            if let Some((text, token)) = TOKENS.iter().find(|(t, _)| rest.starts_with(t)) {
                pieces.push(Piece::Token(*token));
                rest = &rest[text.len()..];
                continue;
            }

            push_literal(&mut pieces, &rest[..c.len_utf8()]);
            rest = &rest[c.len_utf8()..];
        }

        Self {
            pattern: pattern.to_string(),
            pieces,
        }
    }

    /// The pattern this format was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a timestamp with this format.
    #[must_use]
    pub fn render<Tz>(&self, ts: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Token(token) => render_token(&mut out, *token, ts),
                Piece::Literal(text) => out.push_str(text),
            }
        }
        out
    }
}

fn render_token<Tz>(out: &mut String, token: Token, ts: &DateTime<Tz>)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match token {
        Token::Spec(spec) => out.push_str(&ts.format(spec).to_string()),
        Token::Ordinal => out.push_str(&ordinal(ts.day())),
        Token::Quarter => out.push_str(&((ts.month() - 1) / 3 + 1).to_string()),
        Token::Hour24 { padded } => {
            let hour = if ts.hour() == 0 { 24 } else { ts.hour() };
            push_number(out, hour, padded);
        }
        Token::Fraction(digits) => {
            // Leap seconds report nanos past 1e9
            let nanos = ts.nanosecond() % 1_000_000_000;
            let value = nanos / 10u32.pow(9 - digits);
            out.push_str(&format!("{value:0width$}", width = digits as usize));
        }
        Token::Week { padded } => {
            let (_, week) = sunday_week(ts.date_naive());
            push_number(out, week, padded);
        }
        Token::WeekYear { full } => {
            let (year, _) = sunday_week(ts.date_naive());
            if full {
                out.push_str(&format!("{year:04}"));
            } else {
                out.push_str(&format!("{:02}", year.rem_euclid(100)));
            }
        }
    }
}

fn push_number(out: &mut String, value: u32, padded: bool) {
    if padded {
        out.push_str(&format!("{value:02}"));
    } else {
        out.push_str(&value.to_string());
    }
}

/// Week-year and week number for weeks running Sunday to Saturday, where
/// week 1 is the week containing January 1st. Each week belongs to the
/// year its Saturday falls in.
fn sunday_week(date: NaiveDate) -> (i32, u32) {
    let to_saturday = 6 - date.weekday().num_days_from_sunday();
    let saturday = date
        .checked_add_days(Days::new(u64::from(to_saturday)))
        .unwrap_or(date);
    (saturday.year(), (saturday.ordinal() - 1) / 7 + 1)
}

impl Default for IdFormat {
    fn default() -> Self {
        Self::parse(DEFAULT_ID_FORMAT)
    }
}

fn push_literal(pieces: &mut Vec<Piece>, text: &str) {
    if let Some(Piece::Literal(last)) = pieces.last_mut() {
        last.push_str(text);
    } else if !text.is_empty() {
        pieces.push(Piece::Literal(text.to_string()));
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}
