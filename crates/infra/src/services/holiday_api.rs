use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use todo_reminder_domain::{date::parse_date, HolidayDay};
use tracing::{error, warn};

/// Source of public holiday data
#[async_trait::async_trait]
pub trait IHolidayProvider: Send + Sync {
    /// The days of `year` that differ from a regular week: public holidays
    /// and make-up working days
    async fn fetch_year(&self, year: i32) -> anyhow::Result<Vec<HolidayDay>>;
}

#[derive(Debug, Deserialize)]
struct TimorHolidayResponse {
    code: i64,
    #[serde(default)]
    holiday: Option<HashMap<String, TimorHolidayInfo>>,
}

#[derive(Debug, Deserialize)]
struct TimorHolidayInfo {
    holiday: bool,
    #[serde(default)]
    name: String,
    date: String,
}

/// Holiday provider backed by the public timor.tech holiday api
pub struct TimorHolidayProvider {
    client: Client,
    base_url: String,
}

impl TimorHolidayProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn parse_holiday_response(res: TimorHolidayResponse) -> anyhow::Result<Vec<HolidayDay>> {
    if res.code != 0 {
        return Err(anyhow::Error::msg(format!(
            "Holiday api responded with code: {}",
            res.code
        )));
    }
    let mut days = res
        .holiday
        .unwrap_or_default()
        .into_values()
        .filter_map(|info| match parse_date(&info.date) {
            Ok(date) => Some(HolidayDay {
                date,
                is_working_day: !info.holiday,
            }),
            Err(_) => {
                warn!("Skipping holiday: {} with invalid date: {}", info.name, info.date);
                None
            }
        })
        .collect::<Vec<_>>();
    days.sort_by_key(|day| day.date);
    Ok(days)
}

#[async_trait::async_trait]
impl IHolidayProvider for TimorHolidayProvider {
    async fn fetch_year(&self, year: i32) -> anyhow::Result<Vec<HolidayDay>> {
        let res = match self
            .client
            .get(&format!("{}/{}/", self.base_url, year))
            .send()
            .await
        {
            Ok(res) => res.json::<TimorHolidayResponse>().await.map_err(|e| {
                error!(
                    "[Unexpected Response] Holiday api GET error. Error message: {:?}",
                    e
                );
                anyhow::Error::new(e)
            })?,
            Err(e) => {
                error!("[Network Error] Holiday api GET error. Error message: {:?}", e);
                return Err(anyhow::Error::new(e));
            }
        };
        parse_holiday_response(res)
    }
}

/// Holiday provider returning a fixed list of days, without any network access
pub struct StaticHolidayProvider {
    days: Vec<HolidayDay>,
}

impl StaticHolidayProvider {
    pub fn new(days: Vec<HolidayDay>) -> Self {
        Self { days }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait::async_trait]
impl IHolidayProvider for StaticHolidayProvider {
    async fn fetch_year(&self, year: i32) -> anyhow::Result<Vec<HolidayDay>> {
        Ok(self
            .days
            .iter()
            .filter(|day| day.date >= first_day(year) && day.date < first_day(year + 1))
            .cloned()
            .collect())
    }
}

fn first_day(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}
