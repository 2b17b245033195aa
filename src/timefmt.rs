use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Which of the two display formats to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStyle {
    /// `DD.MM @ HH:MM:SS`, used for events within a round
    Short,
    /// `DD.MM.YY @ HH:MM:SS`, used for round start/end
    Full,
}

impl TimeStyle {
    fn pattern(self) -> &'static str {
        match self {
            TimeStyle::Short => "%d.%m @ %H:%M:%S",
            TimeStyle::Full => "%d.%m.%y @ %H:%M:%S",
        }
    }
}

/// Time zone timestamps are rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn utc() -> Self {
        DisplayZone::Fixed(Utc.fix())
    }

    /// Parses `Z`, `UTC`, `+03:00`, `-0500` or `+3`.
    pub fn parse_offset(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
            return Some(Self::utc());
        }

        let (sign, rest) = match text.as_bytes().first()? {
            b'+' => (1, &text[1..]),
            b'-' => (-1, &text[1..]),
            _ => return None,
        };
        let (hours, minutes) = match rest.split_once(':') {
            Some((h, m)) => (h, m),
            None if rest.len() == 4 => match (rest.get(..2), rest.get(2..)) {
                (Some(h), Some(m)) => (h, m),
                _ => return None,
            },
            None => (rest, "0"),
        };
        let hours: i32 = hours.parse().ok()?;
        let minutes: i32 = minutes.parse().ok()?;
        if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
            return None;
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(DisplayZone::Fixed)
    }

    /// Renders unix seconds. `None` when the timestamp is outside chrono's range.
    pub fn format(&self, unix: i64, style: TimeStyle) -> Option<String> {
        let utc = DateTime::<Utc>::from_timestamp(unix, 0)?;
        let rendered = match self {
            DisplayZone::Local => utc
                .with_timezone(&chrono::Local)
                .format(style.pattern())
                .to_string(),
            DisplayZone::Fixed(offset) => utc
                .with_timezone(offset)
                .format(style.pattern())
                .to_string(),
        };
        Some(rendered)
    }
}
