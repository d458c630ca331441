use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Annual nominal rates, expressed as percentages (5.0 = 5%).
pub type RatePct = Decimal;

/// Periodic rates expressed as decimals (0.004166.. = 5% / 12).
pub type Rate = Decimal;

/// Parameters of the single loan a schedule is built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Money,
    /// Nominal annual rate in percent.
    #[serde(alias = "interestRate", alias = "annualRatePct")]
    pub annual_rate_pct: RatePct,
    /// Term in whole years; the schedule has `term_years * 12` payments.
    #[serde(alias = "termYears", alias = "loanTerm")]
    pub term_years: u32,
    #[serde(alias = "startDate", with = "day_date")]
    pub start_date: NaiveDate,
}

/// One ledger entry in an amortization schedule.
///
/// Regular scheduled payments carry a 1-based `month`; extra-principal
/// events do not, and always have zero interest with `payment == principal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(with = "day_date")]
    pub date: NaiveDate,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    #[serde(alias = "remainingBalance")]
    pub remaining_balance: Money,
}

impl PaymentRecord {
    pub fn is_regular(&self) -> bool {
        self.month.is_some()
    }

    pub fn is_extra(&self) -> bool {
        self.month.is_none()
    }
}

/// Serde adapter for day-granularity dates.
///
/// Serializes as `YYYY-MM-DD`. Also accepts RFC 3339 timestamps and naive
/// date-times on input, truncated to the calendar day.
pub mod day_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::error::LoanScheduleError;

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveDate, LoanScheduleError> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Ok(date);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.date_naive());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|dt| dt.date())
            .map_err(|_| LoanScheduleError::DateError(format!("unrecognised date '{raw}'")))
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_date_accepts_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(day_date::parse("2024-12-01").unwrap(), expected);
        assert_eq!(day_date::parse("2024-12-01T00:00:00.000Z").unwrap(), expected);
        assert_eq!(day_date::parse("2024-12-01T18:30:00+02:00").unwrap(), expected);
        assert_eq!(day_date::parse("2024-12-01T09:15:00").unwrap(), expected);
        assert!(day_date::parse("12/01/2024").is_err());
    }

    #[test]
    fn test_extra_record_omits_month() {
        let rec = PaymentRecord {
            month: None,
            date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            payment: Decimal::from(500),
            interest: Decimal::ZERO,
            principal: Decimal::from(500),
            remaining_balance: Decimal::from(1000),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("month").is_none());
        assert_eq!(json["date"], "2024-12-01");
        let back: PaymentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}
