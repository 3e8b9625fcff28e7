//! Applicant record model matching the stored `Forms` document shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Application status of an applicant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppStatus {
    #[default]
    Waiting,
    Declined,
    Waitlist,
    Accepted,
    UserAccepted,
    FullyAccepted,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Waiting => "waiting",
            AppStatus::Declined => "declined",
            AppStatus::Waitlist => "waitlist",
            AppStatus::Accepted => "accepted",
            AppStatus::UserAccepted => "userAccepted",
            AppStatus::FullyAccepted => "fullyAccepted",
        }
    }

    /// Only fully accepted applicants may have meals recorded.
    pub fn allows_meal_edits(&self) -> bool {
        matches!(self, AppStatus::FullyAccepted)
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(AppStatus::Waiting),
            "declined" => Ok(AppStatus::Declined),
            "waitlist" => Ok(AppStatus::Waitlist),
            "accepted" => Ok(AppStatus::Accepted),
            "userAccepted" => Ok(AppStatus::UserAccepted),
            "fullyAccepted" => Ok(AppStatus::FullyAccepted),
            other => Err(format!("unknown application status: {}", other)),
        }
    }
}

/// One applicant's stored form, keyed by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRecord {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub uin: i64,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_availability: Option<String>,
    #[serde(default)]
    pub dietary_restriction: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_dietary_restriction: Option<String>,
    #[serde(default)]
    pub shirt_size: String,
    #[serde(default)]
    pub team_plan: String,
    #[serde(default)]
    pub pre_workshops: Vec<String>,
    #[serde(default)]
    pub job_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_link: Option<String>,
    #[serde(default)]
    pub app_status: AppStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub checkin1: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub d1_snack: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub d1_dinner: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub d1_cookies: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub checkin2: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub d2_breakfast: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub d2_lunch: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub d2_dinner: bool,
    /// Document fields this service does not model, kept as stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicantRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// `"<email>: <status>"`, the line shown for every lookup result.
    pub fn status_line(&self) -> String {
        format!("{}: {}", self.email, self.app_status)
    }

    pub fn meals(&self) -> MealFlags {
        MealFlags {
            d1_snack: self.d1_snack,
            d1_dinner: self.d1_dinner,
            d1_cookies: self.d1_cookies,
            d2_breakfast: self.d2_breakfast,
            d2_lunch: self.d2_lunch,
            d2_dinner: self.d2_dinner,
        }
    }

    pub fn set_meals(&mut self, meals: &MealFlags) {
        self.d1_snack = meals.d1_snack;
        self.d1_dinner = meals.d1_dinner;
        self.d1_cookies = meals.d1_cookies;
        self.d2_breakfast = meals.d2_breakfast;
        self.d2_lunch = meals.d2_lunch;
        self.d2_dinner = meals.d2_dinner;
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// The six meal-attendance checkboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealFlags {
    #[serde(default)]
    pub d1_snack: bool,
    #[serde(default)]
    pub d1_dinner: bool,
    #[serde(default)]
    pub d1_cookies: bool,
    #[serde(default)]
    pub d2_breakfast: bool,
    #[serde(default)]
    pub d2_lunch: bool,
    #[serde(default)]
    pub d2_dinner: bool,
}

/// Identifies a single meal checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealField {
    D1Snack,
    D1Dinner,
    D1Cookies,
    D2Breakfast,
    D2Lunch,
    D2Dinner,
}

impl MealField {
    pub const ALL: [MealField; 6] = [
        MealField::D1Snack,
        MealField::D1Dinner,
        MealField::D1Cookies,
        MealField::D2Breakfast,
        MealField::D2Lunch,
        MealField::D2Dinner,
    ];

    /// Field name as used in the stored document and request bodies.
    pub fn name(&self) -> &'static str {
        match self {
            MealField::D1Snack => "d1Snack",
            MealField::D1Dinner => "d1Dinner",
            MealField::D1Cookies => "d1Cookies",
            MealField::D2Breakfast => "d2Breakfast",
            MealField::D2Lunch => "d2Lunch",
            MealField::D2Dinner => "d2Dinner",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MealField::D1Snack => "Day 1: Ate Snack?",
            MealField::D1Dinner => "Day 1: Ate Dinner?",
            MealField::D1Cookies => "Day 1: Ate Cookies?",
            MealField::D2Breakfast => "Day 2: Ate Breakfast?",
            MealField::D2Lunch => "Day 2: Ate Lunch?",
            MealField::D2Dinner => "Day 2: Ate Dinner?",
        }
    }
}

impl FromStr for MealField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealField::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown meal field: {}", s))
    }
}

impl MealFlags {
    pub fn get(&self, field: MealField) -> bool {
        match field {
            MealField::D1Snack => self.d1_snack,
            MealField::D1Dinner => self.d1_dinner,
            MealField::D1Cookies => self.d1_cookies,
            MealField::D2Breakfast => self.d2_breakfast,
            MealField::D2Lunch => self.d2_lunch,
            MealField::D2Dinner => self.d2_dinner,
        }
    }

    pub fn set(&mut self, field: MealField, value: bool) {
        let slot = match field {
            MealField::D1Snack => &mut self.d1_snack,
            MealField::D1Dinner => &mut self.d1_dinner,
            MealField::D1Cookies => &mut self.d1_cookies,
            MealField::D2Breakfast => &mut self.d2_breakfast,
            MealField::D2Lunch => &mut self.d2_lunch,
            MealField::D2Dinner => &mut self.d2_dinner,
        };
        *slot = value;
    }

    pub fn toggle(&mut self, field: MealField) {
        self.set(field, !self.get(field));
    }
}

/// Request body for `POST /api/auth/update-food`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFoodRequest {
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub meals: MealFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin1: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin2: Option<bool>,
}
