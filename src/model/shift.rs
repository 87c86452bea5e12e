use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::error::ApiError;

/// English weekday names accepted by shift lookups (exact, case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Weekly shift: one optional (in, out) pair per weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShiftSchedule {
    pub id: u64,
    pub name: String,
    pub monday_in: Option<NaiveTime>,
    pub monday_out: Option<NaiveTime>,
    pub tuesday_in: Option<NaiveTime>,
    pub tuesday_out: Option<NaiveTime>,
    pub wednesday_in: Option<NaiveTime>,
    pub wednesday_out: Option<NaiveTime>,
    pub thursday_in: Option<NaiveTime>,
    pub thursday_out: Option<NaiveTime>,
    pub friday_in: Option<NaiveTime>,
    pub friday_out: Option<NaiveTime>,
    pub saturday_in: Option<NaiveTime>,
    pub saturday_out: Option<NaiveTime>,
    pub sunday_in: Option<NaiveTime>,
    pub sunday_out: Option<NaiveTime>,
}

impl ShiftSchedule {
    /// Scheduled (in, out) for `day`. Empty times mean no expectation that day.
    pub fn times_for(&self, day: &str) -> Result<(Option<NaiveTime>, Option<NaiveTime>), ApiError> {
        let day = DayName::from_str(day)
            .map_err(|_| ApiError::BadRequest(format!("invalid day: {}", day)))?;

        Ok(match day {
            DayName::Monday => (self.monday_in, self.monday_out),
            DayName::Tuesday => (self.tuesday_in, self.tuesday_out),
            DayName::Wednesday => (self.wednesday_in, self.wednesday_out),
            DayName::Thursday => (self.thursday_in, self.thursday_out),
            DayName::Friday => (self.friday_in, self.friday_out),
            DayName::Saturday => (self.saturday_in, self.saturday_out),
            DayName::Sunday => (self.sunday_in, self.sunday_out),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{hm, office_shift};
    use crate::error::ApiError;
    use rstest::rstest;

    #[rstest]
    #[case("Monday", Some(hm(9, 0)), Some(hm(17, 0)))]
    #[case("Friday", Some(hm(9, 0)), Some(hm(17, 0)))]
    #[case("Saturday", Some(hm(10, 0)), Some(hm(14, 0)))]
    #[case("Sunday", None, None)]
    fn times_for_selects_the_weekday_pair(
        #[case] day: &str,
        #[case] want_in: Option<chrono::NaiveTime>,
        #[case] want_out: Option<chrono::NaiveTime>,
    ) {
        assert_eq!(office_shift(1).times_for(day).unwrap(), (want_in, want_out));
    }

    #[rstest]
    #[case("monday")]
    #[case("MONDAY")]
    #[case("Funday")]
    #[case("")]
    fn unknown_day_names_are_rejected(#[case] day: &str) {
        match office_shift(1).times_for(day) {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, format!("invalid day: {}", day)),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }
}
