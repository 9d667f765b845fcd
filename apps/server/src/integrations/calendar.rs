use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::{FetchCache, FetchResult, Sourced};

const SOURCE_NAME: &str = "liturgical_calendar";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChristianEvent {
    /// `MM-DD`
    pub date: String,
    pub name: String,
    pub description: String,
}

impl ChristianEvent {
    fn on(date: NaiveDate, name: &str, description: &str) -> Self {
        Self {
            date: date.format("%m-%d").to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Feasts with the same date every year: (month, day, name, description)
const FIXED_FEASTS: &[(u32, u32, &str, &str)] = &[
    (1, 6, "Epiphany", "Celebration of the visit of the Magi"),
    (11, 1, "All Saints Day", "Commemoration of all saints"),
    (12, 24, "Christmas Eve", "Vigil and preparation for Christmas"),
    (12, 25, "Christmas Day", "Celebration of the birth of Jesus Christ"),
];

/// Western Easter Sunday (anonymous Gregorian algorithm)
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Every feast of `year`, in date order
pub fn feasts_for_year(year: i32) -> Vec<(NaiveDate, ChristianEvent)> {
    let mut feasts: Vec<(NaiveDate, ChristianEvent)> = FIXED_FEASTS
        .iter()
        .filter_map(|(month, day, name, description)| {
            let date = NaiveDate::from_ymd_opt(year, *month, *day)?;
            Some((date, ChristianEvent::on(date, name, description)))
        })
        .collect();

    if let Some(easter) = easter_sunday(year) {
        let movable = [
            (0, "Easter Sunday", "Resurrection of Jesus Christ"),
            (1, "Easter Monday", "Day after Easter Sunday"),
            (39, "Ascension Day", "Ascension of Jesus into heaven"),
            (49, "Pentecost", "Descent of the Holy Spirit"),
        ];
        for (offset, name, description) in movable {
            if let Some(date) = easter.checked_add_days(Days::new(offset)) {
                feasts.push((date, ChristianEvent::on(date, name, description)));
            }
        }
    }

    feasts.sort_by_key(|(date, _)| *date);
    feasts
}

pub struct CalendarService {
    cache: FetchCache<Vec<ChristianEvent>>,
}

impl CalendarService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: FetchCache::new(ttl),
        }
    }

    /// Feasts falling in `month` (1-12) of `year`
    pub async fn events(&self, month: u32, year: i32) -> Sourced<Vec<ChristianEvent>> {
        let key = format!("calendar:{}-{:02}", year, month);

        let computed = self
            .cache
            .get_or_fetch(&key, || async move {
                FetchResult::Ok(Sourced::live(events_in_month(month, year), SOURCE_NAME))
            })
            .await;

        computed.unwrap_or_else(|_| Sourced::fallback(events_in_month(month, year)))
    }
}

pub fn events_in_month(month: u32, year: i32) -> Vec<ChristianEvent> {
    feasts_for_year(year)
        .into_iter()
        .filter(|(date, _)| date.month() == month)
        .map(|(_, event)| event)
        .collect()
}
