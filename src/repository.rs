use crate::duration::parse_time_of_day;
use crate::errors::SleepError;
use crate::estimator::{EffectiveSleepPolicy, estimate};
use crate::export::{export_csv, import_csv};
use crate::models::{ImportReport, NewSleepEntry, SleepEntry, SleepStages};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub trait SleepRepository {
    fn list(&self) -> &[SleepEntry];

    fn upsert(
        &mut self,
        draft: NewSleepEntry,
        policy: EffectiveSleepPolicy,
    ) -> Result<SleepEntry, SleepError>;

    fn update(
        &mut self,
        id: Uuid,
        draft: NewSleepEntry,
        policy: EffectiveSleepPolicy,
    ) -> Result<Option<SleepEntry>, SleepError>;

    fn delete(&mut self, id: Uuid) -> bool;

    fn export_all(&self) -> Result<String, SleepError>;

    fn import_all(&mut self, content: &str) -> Result<ImportReport, SleepError>;

    fn recompute_all(&mut self, policy: EffectiveSleepPolicy) -> Result<usize, SleepError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct SleepLog {
    entries: Vec<SleepEntry>,
}

impl SleepLog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&SleepEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn in_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<SleepEntry> {
        self.entries
            .iter()
            .filter(|entry| start.is_none_or(|start| entry.date >= start))
            .filter(|entry| end.is_none_or(|end| entry.date <= end))
            .cloned()
            .collect()
    }

    fn upsert_with_snapshot(&mut self, draft: NewSleepEntry) -> Result<SleepEntry, SleepError> {
        validate(&draft)?;
        let snapshot = draft.sleep_stages;
        Ok(self.store(draft, snapshot, None))
    }

    fn store(
        &mut self,
        draft: NewSleepEntry,
        snapshot: Option<SleepStages>,
        logged_at: Option<DateTime<Utc>>,
    ) -> SleepEntry {
        let existing = self
            .entries
            .iter()
            .position(|entry| same_session(entry, &draft));
        let entry = match existing {
            Some(index) => {
                let entry = entry_from(self.entries[index].id, draft, snapshot, logged_at);
                self.entries[index] = entry.clone();
                entry
            }
            None => {
                let entry = entry_from(Uuid::new_v4(), draft, snapshot, logged_at);
                self.entries.push(entry.clone());
                entry
            }
        };
        sort_entries(&mut self.entries);
        entry
    }
}

impl SleepRepository for SleepLog {
    fn list(&self) -> &[SleepEntry] {
        &self.entries
    }

    fn upsert(
        &mut self,
        draft: NewSleepEntry,
        policy: EffectiveSleepPolicy,
    ) -> Result<SleepEntry, SleepError> {
        validate(&draft)?;
        let estimate = estimate(&draft.bedtime, &draft.waketime, &draft.factors(), policy)?;
        Ok(self.store(draft, Some(estimate.stages), Some(Utc::now())))
    }

    fn update(
        &mut self,
        id: Uuid,
        draft: NewSleepEntry,
        policy: EffectiveSleepPolicy,
    ) -> Result<Option<SleepEntry>, SleepError> {
        validate(&draft)?;
        let estimate = estimate(&draft.bedtime, &draft.waketime, &draft.factors(), policy)?;

        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(None);
        };
        if self
            .entries
            .iter()
            .any(|entry| entry.id != id && same_session(entry, &draft))
        {
            return Err(SleepError::validation(
                "date",
                format!(
                    "another entry already covers {} {}-{}",
                    draft.date, draft.bedtime, draft.waketime
                ),
            ));
        }

        let updated = entry_from(id, draft, Some(estimate.stages), Some(Utc::now()));
        self.entries[index] = updated.clone();
        sort_entries(&mut self.entries);
        Ok(Some(updated))
    }

    fn delete(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    fn export_all(&self) -> Result<String, SleepError> {
        export_csv(&self.entries)
    }

    fn import_all(&mut self, content: &str) -> Result<ImportReport, SleepError> {
        let parsed = import_csv(content)?;
        let mut report = ImportReport {
            imported: 0,
            skipped: parsed.skipped,
        };
        for draft in parsed.entries {
            match self.upsert_with_snapshot(draft) {
                Ok(_) => report.imported += 1,
                Err(_) => report.skipped += 1,
            }
        }
        Ok(report)
    }

    fn recompute_all(&mut self, policy: EffectiveSleepPolicy) -> Result<usize, SleepError> {
        for entry in &mut self.entries {
            let estimate = estimate(&entry.bedtime, &entry.waketime, &entry.factors(), policy)?;
            entry.sleep_stages = Some(estimate.stages);
        }
        Ok(self.entries.len())
    }
}

fn validate(draft: &NewSleepEntry) -> Result<(), SleepError> {
    parse_time_of_day("bedtime", &draft.bedtime)?;
    parse_time_of_day("waketime", &draft.waketime)?;
    if draft.sleep_quality > 100 {
        return Err(SleepError::validation(
            "sleep_quality",
            format!("{} is outside 0-100", draft.sleep_quality),
        ));
    }
    Ok(())
}

fn same_session(entry: &SleepEntry, draft: &NewSleepEntry) -> bool {
    entry.date == draft.date && entry.bedtime == draft.bedtime && entry.waketime == draft.waketime
}

fn entry_from(
    id: Uuid,
    draft: NewSleepEntry,
    snapshot: Option<SleepStages>,
    logged_at: Option<DateTime<Utc>>,
) -> SleepEntry {
    SleepEntry {
        id,
        date: draft.date,
        bedtime: draft.bedtime,
        waketime: draft.waketime,
        sleep_quality: draft.sleep_quality,
        interruptions: draft.interruptions,
        fell_asleep_quickly: draft.fell_asleep_quickly,
        woke_up_refreshed: draft.woke_up_refreshed,
        notes: draft.notes.filter(|notes| !notes.trim().is_empty()),
        sleep_stages: snapshot,
        logged_at,
    }
}

fn sort_entries(entries: &mut [SleepEntry]) {
    entries.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.bedtime.cmp(&b.bedtime))
            .then_with(|| a.waketime.cmp(&b.waketime))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(date: &str, bedtime: &str, waketime: &str, quality: u8) -> NewSleepEntry {
        NewSleepEntry {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            bedtime: bedtime.to_string(),
            waketime: waketime.to_string(),
            sleep_quality: quality,
            interruptions: 1,
            fell_asleep_quickly: true,
            woke_up_refreshed: false,
            notes: None,
            sleep_stages: None,
        }
    }

    #[test]
    fn upsert_replaces_matching_session() {
        let mut log = SleepLog::default();
        let first = log
            .upsert(draft("2024-01-01", "23:00", "07:00", 60), EffectiveSleepPolicy::None)
            .unwrap();
        let second = log
            .upsert(draft("2024-01-01", "23:00", "07:00", 85), EffectiveSleepPolicy::None)
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(log.list()[0].sleep_quality, 85);
        assert_eq!(log.get(first.id).unwrap().sleep_quality, 85);

        let edited = log
            .update(first.id, draft("2024-01-01", "23:00", "07:30", 90), EffectiveSleepPolicy::None)
            .unwrap();
        assert_eq!(edited.unwrap().id, first.id);
    }

    #[test]
    fn upsert_keeps_entries_sorted() {
        let mut log = SleepLog::default();
        for (date, bed) in [("2024-01-03", "22:00"), ("2024-01-01", "23:30"), ("2024-01-01", "21:00")] {
            log.upsert(draft(date, bed, "07:00", 70), EffectiveSleepPolicy::None)
                .unwrap();
        }

        let order: Vec<(String, String)> = log
            .list()
            .iter()
            .map(|entry| (entry.date.to_string(), entry.bedtime.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2024-01-01".to_string(), "21:00".to_string()),
                ("2024-01-01".to_string(), "23:30".to_string()),
                ("2024-01-03".to_string(), "22:00".to_string()),
            ]
        );
    }

    #[test]
    fn upsert_caches_stages_with_policy() {
        let mut log = SleepLog::default();
        let entry = log
            .upsert(draft("2024-01-01", "23:00", "07:00", 70), EffectiveSleepPolicy::None)
            .unwrap();
        let stages = entry.sleep_stages.unwrap();
        assert_eq!(stages.deep_sleep, 1.6);
        assert_eq!(stages.rem_sleep, 1.6);
        assert_eq!(stages.light_sleep, 4.8);
        assert!(entry.logged_at.is_some());
    }

    #[test]
    fn upsert_rejects_bad_input() {
        let mut log = SleepLog::default();
        let err = log
            .upsert(draft("2024-01-01", "23:00", "7am", 70), EffectiveSleepPolicy::None)
            .unwrap_err();
        assert!(matches!(err, SleepError::Validation { ref field, .. } if field == "waketime"));

        let err = log
            .upsert(draft("2024-01-01", "23:00", "07:00", 101), EffectiveSleepPolicy::None)
            .unwrap_err();
        assert!(matches!(err, SleepError::Validation { ref field, .. } if field == "sleep_quality"));
        assert!(log.is_empty());
    }

    #[test]
    fn update_keeps_id_and_refreshes_cache() {
        let mut log = SleepLog::default();
        let entry = log
            .upsert(draft("2024-01-01", "23:00", "07:00", 70), EffectiveSleepPolicy::None)
            .unwrap();

        let mut changes = draft("2024-01-02", "22:00", "07:00", 90);
        changes.notes = Some("late coffee".into());
        let updated = log
            .update(entry.id, changes, EffectiveSleepPolicy::None)
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.sleep_quality, 90);
        assert_eq!(updated.notes.as_deref(), Some("late coffee"));
        assert_eq!(updated.sleep_stages.unwrap().deep_sleep, 1.8);
        assert_eq!(log.get(entry.id).unwrap().date.to_string(), "2024-01-02");

        let missing = log
            .update(Uuid::new_v4(), draft("2024-01-02", "22:00", "07:00", 90), EffectiveSleepPolicy::None)
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn update_refuses_to_take_another_entrys_session() {
        let mut log = SleepLog::default();
        let first = log
            .upsert(draft("2024-01-01", "23:00", "07:00", 70), EffectiveSleepPolicy::None)
            .unwrap();
        let second = log
            .upsert(draft("2024-01-02", "23:00", "07:00", 80), EffectiveSleepPolicy::None)
            .unwrap();

        let err = log
            .update(first.id, draft("2024-01-02", "23:00", "07:00", 90), EffectiveSleepPolicy::None)
            .unwrap_err();
        assert!(matches!(err, SleepError::Validation { ref field, .. } if field == "date"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(first.id).unwrap().date.to_string(), "2024-01-01");
        assert_eq!(log.get(second.id).unwrap().sleep_quality, 80);

        let same = log
            .update(second.id, draft("2024-01-02", "23:00", "07:00", 95), EffectiveSleepPolicy::None)
            .unwrap()
            .unwrap();
        assert_eq!(same.sleep_quality, 95);
    }

    #[test]
    fn delete_removes_only_the_target() {
        let mut log = SleepLog::default();
        let keep = log
            .upsert(draft("2024-01-01", "23:00", "07:00", 70), EffectiveSleepPolicy::None)
            .unwrap();
        let drop = log
            .upsert(draft("2024-01-02", "23:00", "07:00", 70), EffectiveSleepPolicy::None)
            .unwrap();

        assert!(log.delete(drop.id));
        assert!(!log.delete(drop.id));
        assert_eq!(log.len(), 1);
        assert_eq!(log.list()[0].id, keep.id);
    }

    #[test]
    fn range_query_is_inclusive() {
        let mut log = SleepLog::default();
        for date in ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"] {
            log.upsert(draft(date, "23:00", "07:00", 70), EffectiveSleepPolicy::None)
                .unwrap();
        }
        let start = NaiveDate::from_ymd_opt(2024, 1, 2);
        let end = NaiveDate::from_ymd_opt(2024, 1, 3);
        assert_eq!(log.in_range(start, end).len(), 2);
        assert_eq!(log.in_range(start, None).len(), 3);
        assert_eq!(log.in_range(None, None).len(), 4);
    }

    #[test]
    fn recompute_all_overwrites_stale_snapshots() {
        let mut log = SleepLog::default();
        let mut imported = draft("2024-01-01", "23:00", "07:00", 70);
        imported.sleep_stages = Some(SleepStages {
            deep_sleep: 9.0,
            light_sleep: 9.0,
            rem_sleep: 9.0,
        });
        log.upsert_with_snapshot(imported).unwrap();

        let updated = log.recompute_all(EffectiveSleepPolicy::None).unwrap();
        assert_eq!(updated, 1);
        let stages = log.list()[0].sleep_stages.unwrap();
        assert_eq!(stages.deep_sleep, 1.6);
        assert!((stages.total() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn export_then_import_reproduces_entries() {
        let mut source = SleepLog::default();
        let mut noted = draft("2024-02-01", "22:45", "06:15", 65);
        noted.notes = Some("woke at 3, then again".into());
        source.upsert(noted, EffectiveSleepPolicy::None).unwrap();
        source
            .upsert(draft("2024-02-02", "23:00", "07:00", 80), EffectiveSleepPolicy::None)
            .unwrap();

        let csv = source.export_all().unwrap();
        let mut target = SleepLog::default();
        let report = target.import_all(&csv).unwrap();

        assert_eq!(report, ImportReport { imported: 2, skipped: 0 });
        assert!(target.list().iter().all(|entry| entry.logged_at.is_none()));
        for (left, right) in source.list().iter().zip(target.list()) {
            assert_eq!(left.date, right.date);
            assert_eq!(left.bedtime, right.bedtime);
            assert_eq!(left.waketime, right.waketime);
            assert_eq!(left.sleep_quality, right.sleep_quality);
            assert_eq!(left.interruptions, right.interruptions);
            assert_eq!(left.fell_asleep_quickly, right.fell_asleep_quickly);
            assert_eq!(left.woke_up_refreshed, right.woke_up_refreshed);
            assert_eq!(left.notes, right.notes);
        }
    }
}
