use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Backend view of a driving license. Fetched, formatted and dropped per request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LicenseRecord {
    pub license_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_make: Option<String>,
    pub issue_date: Option<String>,
    pub expiration_date: Option<String>,
    pub address: Option<String>,
    pub license_status: Option<String>,
}

impl LicenseRecord {
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        format!("{first} {last}").trim().to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
    Pending,
    Submitted,
    Printed,
    Dispatched,
    Delivered,
    Cancelled,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 6] = [
        Self::Pending,
        Self::Submitted,
        Self::Printed,
        Self::Dispatched,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Submitted => "SUBMITTED",
            Self::Printed => "PRINTED",
            Self::Dispatched => "DISPATCHED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Application is being processed",
            Self::Submitted => "Application has been submitted",
            Self::Printed => "License has been printed",
            Self::Dispatched => "License has been dispatched",
            Self::Delivered => "License has been delivered",
            Self::Cancelled => "Application has been cancelled",
        }
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LicenseStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DomainError::UnsupportedStatus(value.to_string()))
    }
}

/// Validity of a license judged only by its expiration date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpiryStatus {
    Active { expiry_date: String },
    Expired { expiry_date: String },
    Unknown,
}

impl ExpiryStatus {
    /// Compares `expiration` against `now`. The expiry date is rendered in the
    /// timestamp's own offset; no timezone conversion is applied.
    pub fn derive(expiration: &str, now: DateTime<Utc>) -> Self {
        let expiration = expiration.trim();

        let parsed = DateTime::parse_from_rfc3339(expiration)
            .map(|moment| (moment.with_timezone(&Utc), moment.format("%Y-%m-%d").to_string()))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(expiration, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| (naive.and_utc(), naive.format("%Y-%m-%d").to_string()))
            })
            .or_else(|| {
                NaiveDate::parse_from_str(expiration, "%Y-%m-%d").ok().and_then(|date| {
                    let midnight = date.and_hms_opt(0, 0, 0)?;
                    Some((midnight.and_utc(), date.format("%Y-%m-%d").to_string()))
                })
            });

        match parsed {
            Some((moment, expiry_date)) if moment > now => Self::Active { expiry_date },
            Some((_, expiry_date)) => Self::Expired { expiry_date },
            None => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active { .. } => "active",
            Self::Expired { .. } => "expired",
            Self::Unknown => "unknown",
        }
    }
}
