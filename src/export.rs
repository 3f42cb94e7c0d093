use crate::duration::{parse_date, parse_time_of_day, round2, sleep_duration};
use crate::errors::SleepError;
use crate::estimator::split_stages;
use crate::models::{NewSleepEntry, SleepEntry, SleepStages};
use csv::{ReaderBuilder, StringRecord, Trim, Writer};

pub const HEADERS: [&str; 11] = [
    "Date",
    "Bedtime",
    "Waketime",
    "Sleep Quality",
    "Interruptions",
    "Fell Asleep Quickly",
    "Woke Up Refreshed",
    "Notes",
    "Deep Sleep",
    "Light Sleep",
    "REM Sleep",
];

const REQUIRED_COLUMNS: usize = 8;

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub entries: Vec<NewSleepEntry>,
    pub skipped: usize,
}

pub fn export_csv(entries: &[SleepEntry]) -> Result<String, SleepError> {
    if entries.is_empty() {
        return Ok(String::new());
    }

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(HEADERS).map_err(export_error)?;

    for entry in entries {
        let hours = round2(sleep_duration(&entry.bedtime, &entry.waketime)?);
        let stages = split_stages(hours, entry.fell_asleep_quickly, entry.woke_up_refreshed);
        writer
            .write_record([
                entry.date.to_string(),
                entry.bedtime.clone(),
                entry.waketime.clone(),
                entry.sleep_quality.to_string(),
                entry.interruptions.to_string(),
                yes_no(entry.fell_asleep_quickly).to_string(),
                yes_no(entry.woke_up_refreshed).to_string(),
                entry.notes.clone().unwrap_or_default(),
                stages.deep_sleep.to_string(),
                stages.light_sleep.to_string(),
                stages.rem_sleep.to_string(),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| SleepError::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| SleepError::Export(err.to_string()))
}

pub fn import_csv(content: &str) -> Result<ParsedImport, SleepError> {
    if content.trim().is_empty() {
        return Err(SleepError::ImportFormat("CSV file is empty".into()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| SleepError::ImportFormat(err.to_string()))?
        .clone();
    if headers.len() < REQUIRED_COLUMNS {
        return Err(SleepError::ImportFormat(format!(
            "header has {} columns, expected at least {REQUIRED_COLUMNS}",
            headers.len()
        )));
    }
    let stage_columns = StageColumns::locate(&headers);

    let mut parsed = ParsedImport::default();
    for record in reader.records() {
        let row = record
            .map_err(|err| SleepError::ImportFormat(err.to_string()))
            .and_then(|record| parse_row(&record, stage_columns));
        match row {
            Ok(entry) => parsed.entries.push(entry),
            Err(_) => parsed.skipped += 1,
        }
    }

    if parsed.entries.is_empty() && parsed.skipped == 0 {
        return Err(SleepError::ImportFormat("CSV file has no data rows".into()));
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy)]
struct StageColumns {
    deep: usize,
    light: usize,
    rem: usize,
}

impl StageColumns {
    fn locate(headers: &StringRecord) -> Option<Self> {
        let position = |name: &str| headers.iter().position(|header| header == name);
        Some(Self {
            deep: position("Deep Sleep")?,
            light: position("Light Sleep")?,
            rem: position("REM Sleep")?,
        })
    }

    fn read(&self, record: &StringRecord) -> Option<SleepStages> {
        let hours = |index: usize| record.get(index)?.parse::<f64>().ok();
        Some(SleepStages {
            deep_sleep: hours(self.deep)?,
            light_sleep: hours(self.light)?,
            rem_sleep: hours(self.rem)?,
        })
    }
}

fn parse_row(
    record: &StringRecord,
    stage_columns: Option<StageColumns>,
) -> Result<NewSleepEntry, SleepError> {
    if record.len() < REQUIRED_COLUMNS {
        return Err(SleepError::ImportFormat(format!(
            "row has {} columns, expected at least {REQUIRED_COLUMNS}",
            record.len()
        )));
    }
    let field = |index: usize| record.get(index).unwrap_or_default();

    let date = parse_date("date", field(0))?;
    parse_time_of_day("bedtime", field(1))?;
    parse_time_of_day("waketime", field(2))?;

    let sleep_quality = field(3)
        .parse::<u8>()
        .ok()
        .filter(|quality| *quality <= 100)
        .ok_or_else(|| SleepError::validation("sleep_quality", format!("'{}'", field(3))))?;
    let interruptions = field(4)
        .parse::<u32>()
        .map_err(|_| SleepError::validation("interruptions", format!("'{}'", field(4))))?;
    let notes = Some(field(7).to_string()).filter(|notes| !notes.is_empty());

    Ok(NewSleepEntry {
        date,
        bedtime: field(1).to_string(),
        waketime: field(2).to_string(),
        sleep_quality,
        interruptions,
        fell_asleep_quickly: is_yes(field(5)),
        woke_up_refreshed: is_yes(field(6)),
        notes,
        sleep_stages: stage_columns.and_then(|columns| columns.read(record)),
    })
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn is_yes(value: &str) -> bool {
    value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true")
}

fn export_error(err: csv::Error) -> SleepError {
    SleepError::Export(err.to_string())
}
