//! Классификация и ремонт длительности события
//!
//! Ремонт идёт слоями в фиксированном порядке: нет конца → конец раньше
//! начала → «rogue» NA → неисправимо. Каждый слой — тотальная функция над
//! [`DurationDraft`] и трогает только ещё не решённые строки.

use chrono::{NaiveDateTime, TimeDelta, Timelike};

use crate::types::{ClassificationFlags, DurationRecord, MISSING_END_MINUTES, UNFIXABLE_MINUTES};

/// Сдвиг обеих меток при ремонте «rogue» NA
pub const ROGUE_NUDGE_SECONDS: i64 = 1;

/// Промежуточное состояние записи между слоями ремонта
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationDraft {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    /// `None` — длительность не определена
    pub minutes: Option<i64>,
    pub flags: ClassificationFlags,
}

impl DurationDraft {
    pub fn measure<F>(start: NaiveDateTime, end: Option<NaiveDateTime>, minutes: &F) -> Self
    where
        F: Fn(&NaiveDateTime, &NaiveDateTime) -> Option<i64>,
    {
        Self {
            start,
            end,
            minutes: end.as_ref().and_then(|end| minutes(&start, end)),
            flags: ClassificationFlags::default(),
        }
    }

    pub fn finish(self) -> DurationRecord {
        DurationRecord {
            start: self.start,
            duration_minutes: self.minutes.unwrap_or(UNFIXABLE_MINUTES),
            flags: self.flags,
            end_present: self.end.is_some(),
        }
    }
}

/// Метка внутри секунды координации (`:60`)
fn is_leap_second(timestamp: &NaiveDateTime) -> bool {
    timestamp.nanosecond() >= 1_000_000_000
}

/// Целые минуты от `start` до `end`, с отсечением к нулю.
///
/// Минутная арифметика через секунду координации не определена: `None`.
pub fn minutes_between(start: &NaiveDateTime, end: &NaiveDateTime) -> Option<i64> {
    if is_leap_second(start) || is_leap_second(end) {
        return None;
    }
    Some(end.signed_duration_since(*start).num_minutes())
}

/// Нет конца: событие известно с точностью до минуты начала
pub fn repair_missing_end(mut draft: DurationDraft) -> DurationDraft {
    if draft.end.is_none() {
        draft.minutes = Some(MISSING_END_MINUTES);
        draft.flags.missing_end = true;
    }
    draft
}

/// Отрицательная длительность сохраняется как есть
pub fn flag_logic_error(mut draft: DurationDraft) -> DurationDraft {
    if matches!(draft.minutes, Some(m) if m < 0) {
        draft.flags.logic_error = true;
    }
    draft
}

/// Обе метки есть, а длительность не определена: сдвигаем обе на секунду
/// и считаем ещё один раз. Только для этого случая. Сдвинутые метки
/// остаются в записи.
pub fn repair_rogue_na<F>(mut draft: DurationDraft, minutes: &F) -> DurationDraft
where
    F: Fn(&NaiveDateTime, &NaiveDateTime) -> Option<i64>,
{
    let Some(end) = draft.end else {
        return draft;
    };
    if draft.minutes.is_some() {
        return draft;
    }

    draft.flags.rogue_na = true;
    let nudge = TimeDelta::seconds(ROGUE_NUDGE_SECONDS);
    if let (Some(start), Some(end)) = (
        draft.start.checked_add_signed(nudge),
        end.checked_add_signed(nudge),
    ) {
        draft.start = start;
        draft.end = Some(end);
        draft.minutes = minutes(&start, &end);
    }
    draft
}

pub fn mark_unfixable(mut draft: DurationDraft) -> DurationDraft {
    if draft.minutes.is_none() {
        draft.flags.unfixable = true;
        draft.minutes = Some(UNFIXABLE_MINUTES);
    }
    draft
}

pub fn classify(start: &NaiveDateTime, end: Option<&NaiveDateTime>) -> DurationRecord {
    classify_with(start, end, minutes_between)
}

/// Полный конвейер ремонта с подменяемым расчётом минут
pub fn classify_with<F>(start: &NaiveDateTime, end: Option<&NaiveDateTime>, minutes: F) -> DurationRecord
where
    F: Fn(&NaiveDateTime, &NaiveDateTime) -> Option<i64>,
{
    let draft = DurationDraft::measure(*start, end.copied(), &minutes);
    let draft = repair_missing_end(draft);
    let draft = flag_logic_error(draft);
    let draft = repair_rogue_na(draft, &minutes);
    mark_unfixable(draft).finish()
}
