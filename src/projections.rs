use crate::dictionary::Dictionary;
use crate::error::EventError;
use crate::models::{EventEntry, RenderedLogEntry, RoundRecord, RoundSummary};
use crate::placeholders::Placeholders;
use crate::timefmt::{DisplayZone, TimeStyle};

/// Display name for a round's map, or empty when the dictionary has none
fn map_display_name(dictionary: &Dictionary, record: &RoundRecord) -> String {
    match dictionary.map_name(&record.map) {
        Some(name) => name.to_string(),
        None => {
            tracing::warn!(round_id = %record.id, map = %record.map, "no dictionary name for map");
            String::new()
        }
    }
}

/// Round-level placeholder context: the record itself, with `id` and `map` pinned
fn round_placeholders<'r>(record: &'r RoundRecord, map_name: &str) -> Placeholders<'r> {
    Placeholders::new(record.context())
        .with_override("id", record.id.as_str())
        .with_override("map", map_name)
}

/// Renders a round's event log through the dictionary templates
pub struct RoundDecoder<'d> {
    dictionary: &'d Dictionary,
    zone: DisplayZone,
}

impl<'d> RoundDecoder<'d> {
    pub fn new(dictionary: &'d Dictionary, zone: DisplayZone) -> Self {
        Self { dictionary, zone }
    }

    /// Rendered entries in logged order. Unmapped and malformed entries are skipped.
    pub fn decode(&self, record: &RoundRecord) -> Vec<RenderedLogEntry> {
        let map_name = map_display_name(self.dictionary, record);
        let mut logs = Vec::with_capacity(record.events().len());

        for (index, raw) in record.events().iter().enumerate() {
            let entry = match EventEntry::from_value(raw) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(round_id = %record.id, index, error = %err, "skipping malformed event entry");
                    continue;
                }
            };

            let Some(template) = self.dictionary.event_template(entry.e_type) else {
                tracing::warn!(round_id = %record.id, event_type = entry.e_type, "no dictionary template for event type");
                continue;
            };

            let time = match self.zone.format(entry.ts, TimeStyle::Short) {
                Some(time) => time,
                None => {
                    let err = EventError::TimestampOutOfRange(entry.ts);
                    tracing::warn!(round_id = %record.id, index, error = %err, "skipping malformed event entry");
                    continue;
                }
            };

            let ctx = round_placeholders(record, &map_name).with_fallback(entry.data);
            let render = |field: &Option<String>| match field.as_deref() {
                Some(text) if !text.is_empty() => ctx.render(text),
                _ => String::new(),
            };

            logs.push(RenderedLogEntry {
                title: render(&template.title),
                desc: render(&template.desc),
                event: entry.e_type.to_string(),
                time,
            });
        }

        logs
    }
}

/// Turns round records into one-line index entries
pub struct RoundIndexSummarizer<'d> {
    dictionary: &'d Dictionary,
    zone: DisplayZone,
    template: Option<&'d str>,
}

impl<'d> RoundIndexSummarizer<'d> {
    pub fn new(dictionary: &'d Dictionary, zone: DisplayZone) -> Self {
        Self {
            dictionary,
            zone,
            template: None,
        }
    }

    /// Render `roundData` from a template instead of `"{map}, {start} - {end}"`.
    /// The template sees the round record plus `{start}` and `{end}`.
    pub fn with_template(mut self, template: Option<&'d str>) -> Self {
        self.template = template;
        self
    }

    /// One summary per record, in input order
    pub fn summarize(&self, records: &[RoundRecord]) -> Vec<RoundSummary> {
        records
            .iter()
            .filter_map(|record| self.summarize_one(record))
            .collect()
    }

    fn summarize_one(&self, record: &RoundRecord) -> Option<RoundSummary> {
        let (Some(st), Some(end)) = (record.st, record.end) else {
            tracing::warn!(round_id = %record.id, "round has no start/end time, skipping");
            return None;
        };
        let (Some(start), Some(end)) = (
            self.zone.format(st, TimeStyle::Full),
            self.zone.format(end, TimeStyle::Full),
        ) else {
            tracing::warn!(round_id = %record.id, st, end, "round time out of range, skipping");
            return None;
        };

        let map_name = map_display_name(self.dictionary, record);
        let round_data = match self.template {
            Some(template) => round_placeholders(record, &map_name)
                .with_override("start", start)
                .with_override("end", end)
                .render(template),
            None => format!("{}, {} - {}", map_name, start, end),
        };

        Some(RoundSummary {
            round_id: record.id.clone(),
            round_data,
        })
    }
}
