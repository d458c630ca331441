use chrono::NaiveDate;
use loan_schedule_core::session::{LoanSession, SESSION_VERSION};
use loan_schedule_core::{LoanParameters, LoanScheduleError, LoanUpdate, UpdateType};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_session() -> LoanSession {
    let mut session = LoanSession::new(LoanParameters {
        principal: dec!(100000),
        annual_rate_pct: dec!(5.0),
        term_years: 30,
        start_date: date(2024, 1, 1),
    });
    session
        .add_update(LoanUpdate::new(
            "first",
            dec!(10000),
            dec!(4.5),
            date(2024, 12, 1),
            UpdateType::RetainPayment,
        ))
        .unwrap();
    session
}

#[test]
fn test_round_trip_preserves_parameters_and_updates() {
    let session = sample_session();
    let json = session.to_json().unwrap();
    let loaded = LoanSession::from_json(&json).unwrap();
    assert_eq!(loaded, session);
    assert_eq!(loaded.version, SESSION_VERSION);
}

#[test]
fn test_loaded_session_replays_to_same_schedule() {
    let session = sample_session();
    let loaded = LoanSession::from_json(&session.to_json().unwrap()).unwrap();
    let a = session.schedule().unwrap().result.schedule;
    let b = loaded.schedule().unwrap().result.schedule;
    assert_eq!(a, b);
    assert_eq!(a.iter().filter(|r| r.is_extra()).count(), 1);
}

#[test]
fn test_accepts_camel_case_envelope_with_timestamps() {
    let json = r#"{
        "version": 1,
        "loan": {
            "principal": "100000",
            "interestRate": "5",
            "termYears": 30,
            "startDate": "2024-01-01T00:00:00.000Z"
        },
        "updates": [
            {
                "id": "1718000000000",
                "principalPayment": "10000",
                "newInterestRate": "4.5",
                "date": "2024-12-01T00:00:00.000Z",
                "updateType": "retain-term"
            }
        ]
    }"#;
    let session = LoanSession::from_json(json).unwrap();
    assert_eq!(session.loan.start_date, date(2024, 1, 1));
    assert_eq!(session.updates[0].date, date(2024, 12, 1));
    assert_eq!(session.updates[0].update_type, UpdateType::RetainTerm);
    assert_eq!(session.updates[0].principal_payment, dec!(10000));
}

#[test]
fn test_rejects_invalid_loan() {
    let json = r#"{
        "version": 1,
        "loan": { "principal": "-5", "annual_rate_pct": "5", "term_years": 30, "start_date": "2024-01-01" },
        "updates": []
    }"#;
    assert!(matches!(
        LoanSession::from_json(json),
        Err(LoanScheduleError::InvalidInput { .. })
    ));
}

#[test]
fn test_rejects_malformed_json() {
    assert!(matches!(
        LoanSession::from_json("{ not json"),
        Err(LoanScheduleError::SerializationError(_))
    ));
}

#[test]
fn test_clearing_updates_restores_baseline() {
    let mut session = sample_session();
    session.clear_updates();
    let out = session.schedule().unwrap().result;
    assert_eq!(out.schedule.len(), 360);
    assert_eq!(out.summary, out.baseline_summary);
}
