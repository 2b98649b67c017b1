//! Store Config Model
//!
//! Per-tenant storefront settings: presentation, contact info, opening
//! hours and checkout rules. Singleton per store.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Default offset for new stores: UTC-03:00 (Brasília)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

/// One opening window. `weekday` is 0 = Sunday .. 6 = Saturday.
///
/// A window whose `close` is not after `open` runs past midnight into the
/// next day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub weekday: u8,
    /// "HH:MM"
    pub open: String,
    /// "HH:MM"
    pub close: String,
}

impl OpeningHours {
    pub fn new(weekday: u8, open: &str, close: &str) -> Self {
        Self {
            weekday,
            open: open.to_string(),
            close: close.to_string(),
        }
    }

    fn covers(&self, weekday: u8, yesterday: u8, minute: u32) -> bool {
        let (Some(open), Some(close)) = (parse_hhmm(&self.open), parse_hhmm(&self.close)) else {
            return false;
        };
        if close > open {
            self.weekday == weekday && (open..close).contains(&minute)
        } else {
            (self.weekday == weekday && minute >= open)
                || (self.weekday == yesterday && minute < close)
        }
    }
}

/// Parse "HH:MM" into minutes since midnight.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h < 24 && m < 60).then_some(h * 60 + m)
}

/// Store configuration entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub store_id: i64,
    pub display_name: String,
    /// CSS color, e.g. "#6B21A8"
    pub theme_color: String,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub instagram: Option<String>,
    #[serde(default)]
    pub opening_hours: Vec<OpeningHours>,
    #[serde(default = "default_offset")]
    pub utc_offset_minutes: i32,
    /// Manual open/closed switch; `None` follows the opening hours
    pub open_override: Option<bool>,
    pub accepts_delivery: bool,
    pub accepts_pickup: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_order_value: Decimal,
    pub updated_at: i64,
}

fn default_offset() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

/// Update store config payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfigUpdate {
    pub display_name: Option<String>,
    pub theme_color: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub instagram: Option<String>,
    pub opening_hours: Option<Vec<OpeningHours>>,
    pub utc_offset_minutes: Option<i32>,
    /// `Some(None)` clears the override
    #[serde(
        default,
        with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub open_override: Option<Option<bool>>,
    pub accepts_delivery: Option<bool>,
    pub accepts_pickup: Option<bool>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub delivery_fee: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub min_order_value: Option<Decimal>,
}

impl StoreConfig {
    /// Defaults for a freshly registered store: open every day 14:00–23:00.
    pub fn default_for(store_id: i64, display_name: &str, now: i64) -> Self {
        Self {
            store_id,
            display_name: display_name.to_string(),
            theme_color: "#6B21A8".to_string(),
            logo_url: None,
            banner_url: None,
            phone: None,
            whatsapp: None,
            email: None,
            address: None,
            instagram: None,
            opening_hours: (0..7).map(|d| OpeningHours::new(d, "14:00", "23:00")).collect(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            open_override: None,
            accepts_delivery: true,
            accepts_pickup: true,
            delivery_fee: Decimal::new(500, 2),
            min_order_value: Decimal::ZERO,
            updated_at: now,
        }
    }

    /// Whether the storefront takes orders at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        if let Some(forced) = self.open_override {
            return forced;
        }
        let offset =
            FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        let local = now.with_timezone(&offset);
        let weekday = local.weekday().num_days_from_sunday() as u8;
        let yesterday = (weekday + 6) % 7;
        let minute = local.hour() * 60 + local.minute();
        self.opening_hours
            .iter()
            .any(|h| h.covers(weekday, yesterday, minute))
    }

    /// Merge a partial update in place.
    pub fn apply(&mut self, update: StoreConfigUpdate, now: i64) -> AppResult<()> {
        if let Some(hours) = &update.opening_hours {
            validate_hours(hours)?;
        }
        if let Some(offset) = update.utc_offset_minutes
            && !(-720..=840).contains(&offset)
        {
            return Err(AppError::validation("utc_offset_minutes out of range"));
        }
        if update.delivery_fee.is_some_and(|v| v.is_sign_negative())
            || update.min_order_value.is_some_and(|v| v.is_sign_negative())
        {
            return Err(AppError::validation("Amounts must not be negative"));
        }
        if let Some(name) = &update.display_name
            && name.trim().is_empty()
        {
            return Err(AppError::validation("display_name must not be empty"));
        }

        let StoreConfigUpdate {
            display_name,
            theme_color,
            logo_url,
            banner_url,
            phone,
            whatsapp,
            email,
            address,
            instagram,
            opening_hours,
            utc_offset_minutes,
            open_override,
            accepts_delivery,
            accepts_pickup,
            delivery_fee,
            min_order_value,
        } = update;

        if let Some(v) = display_name {
            self.display_name = v.trim().to_string();
        }
        if let Some(v) = theme_color {
            self.theme_color = v;
        }
        if logo_url.is_some() {
            self.logo_url = logo_url;
        }
        if banner_url.is_some() {
            self.banner_url = banner_url;
        }
        if phone.is_some() {
            self.phone = phone;
        }
        if whatsapp.is_some() {
            self.whatsapp = whatsapp;
        }
        if email.is_some() {
            self.email = email;
        }
        if address.is_some() {
            self.address = address;
        }
        if instagram.is_some() {
            self.instagram = instagram;
        }
        if let Some(v) = opening_hours {
            self.opening_hours = v;
        }
        if let Some(v) = utc_offset_minutes {
            self.utc_offset_minutes = v;
        }
        if let Some(v) = open_override {
            self.open_override = v;
        }
        if let Some(v) = accepts_delivery {
            self.accepts_delivery = v;
        }
        if let Some(v) = accepts_pickup {
            self.accepts_pickup = v;
        }
        if let Some(v) = delivery_fee {
            self.delivery_fee = v;
        }
        if let Some(v) = min_order_value {
            self.min_order_value = v;
        }
        self.updated_at = now;
        Ok(())
    }
}

fn validate_hours(hours: &[OpeningHours]) -> AppResult<()> {
    for h in hours {
        if h.weekday > 6 {
            return Err(AppError::validation("weekday must be 0..=6").with_detail("weekday", h.weekday));
        }
        if parse_hhmm(&h.open).is_none() || parse_hhmm(&h.close).is_none() {
            return Err(AppError::validation("Opening hours must use HH:MM")
                .with_detail("open", h.open.clone())
                .with_detail("close", h.close.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(hours: Vec<OpeningHours>) -> StoreConfig {
        let mut c = StoreConfig::default_for(1, "Açaí", 0);
        c.opening_hours = hours;
        c
    }

    /// 2026-10-19 is a Monday. Local offset -03:00.
    fn local(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, day, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("14:30"), Some(870));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("9:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }

    #[test]
    fn test_open_within_same_day_window() {
        let c = config(vec![OpeningHours::new(1, "14:00", "23:00")]);
        assert!(c.is_open_at(local(19, 14, 0)));
        assert!(c.is_open_at(local(19, 22, 59)));
        assert!(!c.is_open_at(local(19, 23, 0)));
        assert!(!c.is_open_at(local(19, 13, 59)));
        // Tuesday has no window
        assert!(!c.is_open_at(local(20, 15, 0)));
    }

    #[test]
    fn test_window_past_midnight_belongs_to_previous_day() {
        // Saturday 18:00 -> Sunday 02:00
        let c = config(vec![OpeningHours::new(6, "18:00", "02:00")]);
        // 2026-10-24 is Saturday, 2026-10-25 Sunday
        assert!(c.is_open_at(local(24, 23, 30)));
        assert!(c.is_open_at(local(25, 1, 59)));
        assert!(!c.is_open_at(local(25, 2, 0)));
        assert!(!c.is_open_at(local(25, 18, 30)));
    }

    #[test]
    fn test_override_wins() {
        let mut c = config(vec![]);
        assert!(!c.is_open_at(local(19, 15, 0)));
        c.open_override = Some(true);
        assert!(c.is_open_at(local(19, 15, 0)));

        let mut c = config(vec![OpeningHours::new(1, "00:00", "23:59")]);
        c.open_override = Some(false);
        assert!(!c.is_open_at(local(19, 15, 0)));
    }

    #[test]
    fn test_offset_is_applied() {
        let c = config(vec![OpeningHours::new(1, "14:00", "15:00")]);
        // 17:30 UTC Monday == 14:30 in -03:00
        let utc = Utc.with_ymd_and_hms(2026, 10, 19, 17, 30, 0).unwrap();
        assert!(c.is_open_at(utc));
    }

    #[test]
    fn test_malformed_window_is_ignored() {
        let c = config(vec![OpeningHours::new(1, "2pm", "23:00")]);
        assert!(!c.is_open_at(local(19, 15, 0)));
    }

    #[test]
    fn test_apply_partial_update() {
        let mut c = StoreConfig::default_for(7, "Açaí", 0);
        let update: StoreConfigUpdate = serde_json::from_value(serde_json::json!({
            "display_name": "  Açaí do Porto ",
            "delivery_fee": 7.5,
            "open_override": null
        }))
        .unwrap();
        c.open_override = Some(true);
        c.apply(update, 99).unwrap();
        assert_eq!(c.display_name, "Açaí do Porto");
        assert_eq!(c.delivery_fee, Decimal::new(75, 1));
        assert_eq!(c.open_override, None);
        assert_eq!(c.theme_color, "#6B21A8");
        assert_eq!(c.updated_at, 99);
    }

    #[test]
    fn test_apply_missing_override_keeps_value() {
        let mut c = StoreConfig::default_for(7, "Açaí", 0);
        c.open_override = Some(false);
        let update: StoreConfigUpdate =
            serde_json::from_value(serde_json::json!({ "phone": "+55 11 99999-0000" })).unwrap();
        c.apply(update, 1).unwrap();
        assert_eq!(c.open_override, Some(false));
        assert_eq!(c.phone.as_deref(), Some("+55 11 99999-0000"));
    }

    #[test]
    fn test_apply_rejects_bad_hours() {
        let mut c = StoreConfig::default_for(7, "Açaí", 0);
        let update = StoreConfigUpdate {
            opening_hours: Some(vec![OpeningHours::new(7, "10:00", "12:00")]),
            ..Default::default()
        };
        assert!(c.apply(update, 1).is_err());

        let update = StoreConfigUpdate {
            opening_hours: Some(vec![OpeningHours::new(2, "10h", "12:00")]),
            ..Default::default()
        };
        assert!(c.apply(update, 1).is_err());
    }

    #[test]
    fn test_apply_rejects_negative_fee() {
        let mut c = StoreConfig::default_for(7, "Açaí", 0);
        let update = StoreConfigUpdate {
            delivery_fee: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(c.apply(update, 1).is_err());
    }
}
