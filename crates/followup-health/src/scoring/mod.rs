//! Deterministic scoring engine for the Follow-Up Health calculator.
//!
//! Every categorical input is a closed enum carrying its own multiplier
//! and deduction tables, so the compiler enforces exhaustiveness whenever
//! a table gains or loses an entry. All functions here are total over the
//! input domain; validation of raw request payloads happens at the edge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Baseline share of inquiries lost before the multipliers apply.
const BASE_LOSS_RATE: f64 = 0.08;

/// Loss rate never leaves this band regardless of multiplier product.
const LOSS_RATE_FLOOR: f64 = 0.05;
const LOSS_RATE_CEILING: f64 = 0.25;

/// How quickly the clinic answers a new inquiry, fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseTime {
    #[serde(rename = "under5")]
    Under5Min,
    #[serde(rename = "5-30")]
    Within30Min,
    #[serde(rename = "30-2h")]
    WithinTwoHours,
    #[serde(rename = "sameday")]
    SameDay,
    #[serde(rename = "nextday")]
    NextDay,
}

impl ResponseTime {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Under5Min,
            Self::Within30Min,
            Self::WithinTwoHours,
            Self::SameDay,
            Self::NextDay,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Under5Min => "Under 5 minutes",
            Self::Within30Min => "5-30 minutes",
            Self::WithinTwoHours => "30 minutes to 2 hours",
            Self::SameDay => "Same day",
            Self::NextDay => "Next day",
        }
    }

    pub(crate) const fn loss_multiplier(self) -> f64 {
        match self {
            Self::Under5Min => 0.9,
            Self::Within30Min => 1.0,
            Self::WithinTwoHours => 1.1,
            Self::SameDay => 1.25,
            Self::NextDay => 1.45,
        }
    }

    pub(crate) const fn speed_deduction(self) -> u8 {
        match self {
            Self::Under5Min => 0,
            Self::Within30Min => 5,
            Self::WithinTwoHours => 12,
            Self::SameDay => 20,
            Self::NextDay => 30,
        }
    }
}

/// How many follow-up touches an unanswered inquiry receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowUpDepth {
    #[serde(rename = "4-6")]
    FourToSix,
    #[serde(rename = "2-3")]
    TwoToThree,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "notsure")]
    NotSure,
}

impl FollowUpDepth {
    pub const fn ordered() -> [Self; 4] {
        [Self::FourToSix, Self::TwoToThree, Self::One, Self::NotSure]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FourToSix => "4-6 touches",
            Self::TwoToThree => "2-3 touches",
            Self::One => "1 touch",
            Self::NotSure => "Not sure",
        }
    }

    pub(crate) const fn loss_multiplier(self) -> f64 {
        match self {
            Self::FourToSix => 0.9,
            Self::TwoToThree => 1.0,
            Self::One => 1.25,
            Self::NotSure => 1.35,
        }
    }

    pub(crate) const fn persistence_deduction(self) -> u8 {
        match self {
            Self::FourToSix => 0,
            Self::TwoToThree => 8,
            Self::One => 18,
            Self::NotSure => 22,
        }
    }
}

/// Lifetime value bracket for a converted patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientValue {
    #[serde(rename = "under250")]
    Under250,
    #[serde(rename = "250-500")]
    From250To500,
    #[serde(rename = "500-1000")]
    From500To1000,
    #[serde(rename = "1000+")]
    Over1000,
}

impl PatientValue {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Under250,
            Self::From250To500,
            Self::From500To1000,
            Self::Over1000,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Under250 => "Under $250",
            Self::From250To500 => "$250-$500",
            Self::From500To1000 => "$500-$1,000",
            Self::Over1000 => "$1,000+",
        }
    }

    pub(crate) const fn midpoint(self) -> f64 {
        match self {
            Self::Under250 => 200.0,
            Self::From250To500 => 375.0,
            Self::From500To1000 => 750.0,
            Self::Over1000 => 1500.0,
        }
    }
}

/// Whether anyone answers evenings and weekends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AfterHoursCoverage {
    Yes,
    Sometimes,
    No,
}

impl AfterHoursCoverage {
    pub const fn ordered() -> [Self; 3] {
        [Self::Yes, Self::Sometimes, Self::No]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::Sometimes => "Sometimes",
            Self::No => "No",
        }
    }

    pub(crate) const fn loss_multiplier(self) -> f64 {
        match self {
            Self::Yes => 1.0,
            Self::Sometimes => 1.1,
            Self::No => 1.2,
        }
    }

    pub(crate) const fn coverage_deduction(self) -> u8 {
        match self {
            Self::Yes => 0,
            Self::Sometimes => 6,
            Self::No => 10,
        }
    }
}

/// One calculator run as collected from the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculatorInputs {
    pub monthly_inquiries: u32,
    pub response_time: ResponseTime,
    pub follow_up_depth: FollowUpDepth,
    pub patient_value: PatientValue,
    pub after_hours: AfterHoursCoverage,
}

/// Thirteen-step letter ladder, A+ down to F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D-")]
    DMinus,
    #[serde(rename = "F")]
    F,
}

impl LetterGrade {
    /// Exact integer cutoffs; a boundary score belongs to the higher grade.
    pub fn from_score(score: u8) -> Self {
        match score {
            97..=u8::MAX => Self::APlus,
            93..=96 => Self::A,
            90..=92 => Self::AMinus,
            87..=89 => Self::BPlus,
            83..=86 => Self::B,
            80..=82 => Self::BMinus,
            77..=79 => Self::CPlus,
            73..=76 => Self::C,
            70..=72 => Self::CMinus,
            67..=69 => Self::DPlus,
            63..=66 => Self::D,
            60..=62 => Self::DMinus,
            _ => Self::F,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::DPlus => "D+",
            Self::D => "D",
            Self::DMinus => "D-",
            Self::F => "F",
        }
    }

    /// Bucket used to pick the admin email template.
    pub const fn range(self) -> GradeRange {
        match self {
            Self::APlus | Self::A | Self::AMinus => GradeRange::A,
            Self::BPlus
            | Self::B
            | Self::BMinus
            | Self::CPlus
            | Self::C
            | Self::CMinus => GradeRange::Bc,
            Self::DPlus | Self::D | Self::DMinus | Self::F => GradeRange::Df,
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Template bucket: A grades, B/C grades, everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeRange {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "BC")]
    Bc,
    #[serde(rename = "DF")]
    Df,
}

impl GradeRange {
    pub const fn ordered() -> [Self; 3] {
        [Self::A, Self::Bc, Self::Df]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Bc => "BC",
            Self::Df => "DF",
        }
    }
}

impl fmt::Display for GradeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity classification derived from the drop-off percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "Quiet Leak")]
    QuietLeak,
    #[serde(rename = "Slow Leak")]
    SlowLeak,
    #[serde(rename = "Active Leak")]
    ActiveLeak,
}

impl Severity {
    pub fn from_dropoff(dropoff_percent: u8) -> Self {
        match dropoff_percent {
            0..=7 => Self::QuietLeak,
            8..=12 => Self::SlowLeak,
            _ => Self::ActiveLeak,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::QuietLeak => "Quiet Leak",
            Self::SlowLeak => "Slow Leak",
            Self::ActiveLeak => "Active Leak",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Estimated monthly revenue band walking out the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueAtRisk {
    pub low: u64,
    pub high: u64,
}

/// Per-dimension 0-100 scores, a linear rescale of each deduction.
///
/// These are display aids independent of the letter grade; they can
/// disagree with the grade's implied severity and that is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub speed: u8,
    pub persistence: u8,
    pub coverage: u8,
}

/// Everything the dashboard and the report email need, freshly derived
/// from one set of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationResults {
    pub grade: LetterGrade,
    pub grade_score: u8,
    pub revenue_at_risk: RevenueAtRisk,
    pub severity: Severity,
    pub dropoff_percent: u8,
    pub loss_rate: f64,
    pub scores: ComponentScores,
}

/// Main entry point: map one set of inputs to the full result set.
pub fn calculate_results(inputs: &CalculatorInputs) -> CalculationResults {
    let loss_rate = loss_rate(inputs);
    let (grade, grade_score) = grade(inputs);
    let revenue_at_risk = revenue_at_risk(inputs.monthly_inquiries, loss_rate, inputs.patient_value);
    let dropoff_percent = (loss_rate * 100.0).round() as u8;
    let severity = Severity::from_dropoff(dropoff_percent);
    let scores = component_scores(inputs);

    CalculationResults {
        grade,
        grade_score,
        revenue_at_risk,
        severity,
        dropoff_percent,
        loss_rate,
        scores,
    }
}

fn loss_rate(inputs: &CalculatorInputs) -> f64 {
    let raw = BASE_LOSS_RATE
        * inputs.response_time.loss_multiplier()
        * inputs.follow_up_depth.loss_multiplier()
        * inputs.after_hours.loss_multiplier();

    raw.clamp(LOSS_RATE_FLOOR, LOSS_RATE_CEILING)
}

fn revenue_at_risk(monthly_inquiries: u32, loss_rate: f64, patient_value: PatientValue) -> RevenueAtRisk {
    let lost_patients = f64::from(monthly_inquiries) * loss_rate;
    let midpoint = lost_patients * patient_value.midpoint();

    RevenueAtRisk {
        low: (midpoint * 0.7).round() as u64,
        high: (midpoint * 1.3).round() as u64,
    }
}

fn grade(inputs: &CalculatorInputs) -> (LetterGrade, u8) {
    let total_deductions = inputs.response_time.speed_deduction()
        + inputs.follow_up_depth.persistence_deduction()
        + inputs.after_hours.coverage_deduction();

    let score = 100u8.saturating_sub(total_deductions);
    (LetterGrade::from_score(score), score)
}

fn component_scores(inputs: &CalculatorInputs) -> ComponentScores {
    ComponentScores {
        speed: rescale(inputs.response_time.speed_deduction(), 30),
        persistence: rescale(inputs.follow_up_depth.persistence_deduction(), 22),
        coverage: rescale(inputs.after_hours.coverage_deduction(), 10),
    }
}

/// Project a deduction onto 0-100, where the maximum deduction maps to 0.
fn rescale(deduction: u8, max_deduction: u8) -> u8 {
    let score = 100.0 - f64::from(deduction) * (100.0 / f64::from(max_deduction));
    score.clamp(0.0, 100.0).round() as u8
}
