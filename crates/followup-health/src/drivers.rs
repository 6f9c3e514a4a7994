//! Leakage-driver copy for the results panel and the report email.
//!
//! Each scored dimension maps every one of its enum values directly to a
//! `{title, description}` pair. The selector always yields exactly three
//! drivers in speed/persistence/coverage order; nothing is weighted,
//! sorted, or deduplicated. The best value of a dimension carries a
//! "(Working)" title to signal that the dimension poses no risk.

use crate::scoring::{AfterHoursCoverage, CalculatorInputs, FollowUpDepth, ResponseTime};
use serde::{Deserialize, Serialize};

/// Stable code stored in the submissions table's `drivers` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DriverCode {
    SlowResponse,
    FollowUpEarly,
    AfterHoursGaps,
}

impl DriverCode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SlowResponse => "slowResponse",
            Self::FollowUpEarly => "followUpEarly",
            Self::AfterHoursGaps => "afterHoursGaps",
        }
    }
}

/// Human-readable insight keyed to one scored dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Driver {
    pub code: DriverCode,
    pub title: &'static str,
    pub description: &'static str,
}

/// The three drivers for one calculator run, fixed order, never fewer.
pub fn top_drivers(inputs: &CalculatorInputs) -> [Driver; 3] {
    [
        speed_driver(inputs.response_time),
        persistence_driver(inputs.follow_up_depth),
        coverage_driver(inputs.after_hours),
    ]
}

/// Codes only, the exact shape persisted with a submission.
pub fn top_driver_codes(inputs: &CalculatorInputs) -> [DriverCode; 3] {
    top_drivers(inputs).map(|driver| driver.code)
}

fn speed_driver(response_time: ResponseTime) -> Driver {
    let (title, description) = match response_time {
        ResponseTime::Under5Min => (
            "Speed-to-Lead (Working)",
            "Replying inside five minutes keeps you first in line for every inquiry.",
        ),
        ResponseTime::Within30Min => (
            "Slow Response Window",
            "A 5-30 minute window is workable, but the first minutes still decide who gets the patient.",
        ),
        ResponseTime::WithinTwoHours => (
            "Slow Response Window",
            "Responses after 30 minutes lose attention fast.",
        ),
        ResponseTime::SameDay => (
            "Slow Response Window",
            "Same-day replies land after most patients have already called the next clinic.",
        ),
        ResponseTime::NextDay => (
            "Slow Response Window",
            "Next-day responses reach inquiries that have long gone cold.",
        ),
    };

    Driver {
        code: DriverCode::SlowResponse,
        title,
        description,
    }
}

fn persistence_driver(follow_up_depth: FollowUpDepth) -> Driver {
    let (title, description) = match follow_up_depth {
        FollowUpDepth::FourToSix => (
            "Persistent Follow-Up (Working)",
            "4-6 touches per inquiry covers the window most patients need to convert.",
        ),
        FollowUpDepth::TwoToThree => (
            "Follow-Up Ends Too Early",
            "Most inquiries need 2-6 touches to convert; stopping at two or three leaves conversions behind.",
        ),
        FollowUpDepth::One => (
            "Follow-Up Ends Too Early",
            "A single attempt only reaches the patients who were already sold.",
        ),
        FollowUpDepth::NotSure => (
            "Follow-Up Ends Too Early",
            "When follow-up isn't tracked, leakage becomes invisible.",
        ),
    };

    Driver {
        code: DriverCode::FollowUpEarly,
        title,
        description,
    }
}

fn coverage_driver(after_hours: AfterHoursCoverage) -> Driver {
    let (title, description) = match after_hours {
        AfterHoursCoverage::Yes => (
            "After-Hours Coverage (Working)",
            "Evening and weekend coverage captures the inquiries competitors miss.",
        ),
        AfterHoursCoverage::Sometimes => (
            "After-Hours Coverage Gaps",
            "Partial evening and weekend coverage still lets inquiries slip through quietly.",
        ),
        AfterHoursCoverage::No => (
            "After-Hours Coverage Gaps",
            "Missed evenings and weekends create silent drop-off.",
        ),
    };

    Driver {
        code: DriverCode::AfterHoursGaps,
        title,
        description,
    }
}
