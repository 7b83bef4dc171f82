// src/common/date_ranges.rs

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Janelas de tempo canônicas usadas por todas as métricas de vendas.
/// Comparações são sempre no intervalo semiaberto `[início, fim)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRanges {
    pub now: DateTime<Utc>,
    pub today_start: DateTime<Utc>,
    pub yesterday_start: DateTime<Utc>,
    // hoje - 7 dias
    pub week_start: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
    pub last_month_start: DateTime<Utc>,
    // início do mês atual - 1 dia (limite exclusivo)
    pub last_month_end: DateTime<Utc>,
}

impl DateRanges {
    pub fn now() -> Self {
        Self::from_now(Utc::now())
    }

    pub fn from_now(now: DateTime<Utc>) -> Self {
        let today_start = start_of_day(now.date_naive());
        let yesterday_start = today_start - Duration::days(1);
        let week_start = today_start - Duration::days(7);

        let month_start = start_of_day(first_day_of_month(now.date_naive()));
        let last_month_end = month_start - Duration::days(1);
        let last_month_start = start_of_day(first_day_of_month(last_month_end.date_naive()));

        Self {
            now,
            today_start,
            yesterday_start,
            week_start,
            month_start,
            last_month_start,
            last_month_end,
        }
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    // dia 1 sempre existe
    date.with_day(1).unwrap_or(date)
}
