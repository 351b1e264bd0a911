/// Типы данных для аористического взвешивания

use std::ops::Add;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Количество часовых корзин в неделе (24 × 7)
pub const BUCKETS: usize = 168;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_WEEK: u32 = 7;
pub const MINUTES_PER_HOUR: i64 = 60;
/// Длительность, начиная с которой событие размазывается по всей неделе
pub const MINUTES_PER_WEEK: i64 = 10_080;
/// Длительность для событий без времени окончания
pub const MISSING_END_MINUTES: i64 = 1;
/// Длительность, которую получает неисправимая запись
pub const UNFIXABLE_MINUTES: i64 = -1;

/// Номер часовой корзины недели, 1..=168.
///
/// `24 * (day_of_week - 1) + hour_of_day + 1`, где воскресенье = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct WeeklyBucketIndex(pub(crate) u16);

impl TryFrom<u16> for WeeklyBucketIndex {
    type Error = String;

    fn try_from(index: u16) -> Result<Self, Self::Error> {
        Self::new(index).ok_or_else(|| format!("bucket index {index} is outside 1..={BUCKETS}"))
    }
}

impl From<WeeklyBucketIndex> for u16 {
    fn from(bucket: WeeklyBucketIndex) -> u16 {
        bucket.0
    }
}

impl WeeklyBucketIndex {
    pub const FIRST: WeeklyBucketIndex = WeeklyBucketIndex(1);
    pub const LAST: WeeklyBucketIndex = WeeklyBucketIndex(BUCKETS as u16);

    pub fn new(index: u16) -> Option<Self> {
        (1..=BUCKETS as u16).contains(&index).then_some(Self(index))
    }

    /// `day_of_week` с 1 (воскресенье), `hour_of_day` с 0
    pub fn from_day_hour(day_of_week: u32, hour_of_day: u32) -> Option<Self> {
        if !(1..=DAYS_PER_WEEK).contains(&day_of_week) || hour_of_day >= HOURS_PER_DAY {
            return None;
        }
        Some(Self((HOURS_PER_DAY * (day_of_week - 1) + hour_of_day + 1) as u16))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Индекс в векторе весов (с нуля)
    pub fn slot(self) -> usize {
        self.0 as usize - 1
    }

    pub fn day_of_week(self) -> u32 {
        (self.0 as u32 - 1) / HOURS_PER_DAY + 1
    }

    pub fn hour_of_day(self) -> u32 {
        (self.0 as u32 - 1) % HOURS_PER_DAY
    }

    /// Следующая корзина; после 168 идёт 1
    pub fn next(self) -> Self {
        if self == Self::LAST {
            Self::FIRST
        } else {
            Self(self.0 + 1)
        }
    }

    /// Имя выходной колонки: `hour1` … `hour168`
    pub fn column_name(self) -> String {
        format!("hour{}", self.0)
    }

    pub fn all() -> impl Iterator<Item = WeeklyBucketIndex> {
        (1..=BUCKETS as u16).map(WeeklyBucketIndex)
    }
}

/// Положение временной метки внутри недели
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPosition {
    pub day_of_week: u32,
    pub hour_of_day: u32,
    pub minute_of_hour: u32,
    pub bucket: WeeklyBucketIndex,
}

impl BucketPosition {
    /// Сколько минут осталось до конца часа стартовой корзины
    pub fn left_in_hour(&self) -> i64 {
        MINUTES_PER_HOUR - self.minute_of_hour as i64
    }
}

/// Одна входная строка.
///
/// Все входные колонки (включая x/y) лежат в `fields` и не читаются движком.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub row: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub fields: Map<String, Value>,
}

/// Категории ремонта длительности
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    MissingEnd,
    LogicError,
    RogueNa,
    Unfixable,
    Normal,
}

/// Флаги не исключают друг друга: строка может быть и rogue, и unfixable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationFlags {
    pub missing_end: bool,
    pub logic_error: bool,
    pub rogue_na: bool,
    pub unfixable: bool,
}

impl ClassificationFlags {
    /// Итоговая категория: побеждает самый поздний сработавший слой
    pub fn primary(&self) -> Classification {
        if self.unfixable {
            Classification::Unfixable
        } else if self.rogue_na {
            Classification::RogueNa
        } else if self.logic_error {
            Classification::LogicError
        } else if self.missing_end {
            Classification::MissingEnd
        } else {
            Classification::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRecord {
    /// Начало после ремонта; от него считается стартовая корзина
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
    pub flags: ClassificationFlags,
    pub end_present: bool,
}

impl DurationRecord {
    pub fn classification(&self) -> Classification {
        self.flags.primary()
    }
}

/// 168 неотрицательных весов, индексированных корзинами недели
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    pub fn zeros() -> Self {
        Self(vec![0.0; BUCKETS])
    }

    pub fn add(&mut self, bucket: WeeklyBucketIndex, weight: f64) {
        self.0[bucket.slot()] += weight;
    }

    /// Добавляет одинаковый вес во все корзины
    pub fn add_flat(&mut self, weight: f64) {
        for value in self.0.iter_mut() {
            *value += weight;
        }
    }

    pub fn get(&self, bucket: WeeklyBucketIndex) -> f64 {
        self.0[bucket.slot()]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Корзины с ненулевым весом
    pub fn non_zero(&self) -> impl Iterator<Item = (WeeklyBucketIndex, f64)> + '_ {
        WeeklyBucketIndex::all()
            .zip(self.0.iter().copied())
            .filter(|(_, w)| *w != 0.0)
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Выходная строка: входные поля + длительность + 168 весов
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub row: usize,
    pub fields: Map<String, Value>,
    /// `None` для пропущенных строк (нет времени начала)
    pub duration_minutes: Option<i64>,
    pub classification: Option<Classification>,
    pub weights: WeightVector,
}

impl OutputRow {
    pub fn skipped(&self) -> bool {
        self.duration_minutes.is_none()
    }

    /// Плоская запись: входные колонки, затем `duration` и `hour1..hour168`
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = self.fields.clone();
        record.insert(
            "duration".to_string(),
            self.duration_minutes.map(Value::from).unwrap_or(Value::Null),
        );
        for (bucket, weight) in WeeklyBucketIndex::all().zip(self.weights.as_slice()) {
            record.insert(bucket.column_name(), Value::from(*weight));
        }
        record
    }
}

/// Счётчики диагностики пакета. Это независимые подсчёты, а не разбиение.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub missing_end: usize,
    pub logic_error: usize,
    pub rogue_na: usize,
    pub unfixable: usize,
    pub skipped: usize,
}

impl Diagnostics {
    pub fn from_flags(flags: &ClassificationFlags) -> Self {
        Self {
            missing_end: flags.missing_end as usize,
            logic_error: flags.logic_error as usize,
            rogue_na: flags.rogue_na as usize,
            unfixable: flags.unfixable as usize,
            skipped: 0,
        }
    }

    pub fn skipped_row() -> Self {
        Self {
            skipped: 1,
            ..Self::default()
        }
    }
}

impl Add for Diagnostics {
    type Output = Diagnostics;

    fn add(self, other: Diagnostics) -> Diagnostics {
        Diagnostics {
            missing_end: self.missing_end + other.missing_end,
            logic_error: self.logic_error + other.logic_error,
            rogue_na: self.rogue_na + other.rogue_na,
            unfixable: self.unfixable + other.unfixable,
            skipped: self.skipped + other.skipped,
        }
    }
}

impl std::iter::Sum for Diagnostics {
    fn sum<I: Iterator<Item = Diagnostics>>(iter: I) -> Self {
        iter.fold(Diagnostics::default(), |acc, d| acc + d)
    }
}

/// Имена колонок, переданные вызывающей стороной
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub x_col: String,
    pub y_col: String,
    pub start_col: String,
    pub end_col: String,
}

/// Настройки пакетной обработки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool { true }

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoristicRequest {
    pub rows: Vec<Value>,
    #[serde(flatten)]
    pub columns: ColumnSpec,
    #[serde(default)]
    pub options: Option<BatchOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoristicResponse {
    pub rows: Vec<Map<String, Value>>,
    pub diagnostics: Diagnostics,
    pub skipped_rows: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketTotal {
    pub bucket: WeeklyBucketIndex,
    pub day_of_week: u32,
    pub hour_of_day: u32,
    pub weight: f64,
}

/// Агрегированные веса по всем событиям пакета
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoristicSummary {
    pub events: usize,
    pub total_weight: f64,
    pub by_bucket: Vec<BucketTotal>,
    /// 7 значений, воскресенье первым
    pub by_day: Vec<f64>,
    /// 24 значения, с полуночи
    pub by_hour: Vec<f64>,
    pub diagnostics: Diagnostics,
}
