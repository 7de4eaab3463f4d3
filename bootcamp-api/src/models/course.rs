use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, timestamp, Violations};
use crate::{
    error::{Error, Result},
    repository::Document,
};

/// Minimum skill a student needs before enrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// A course offered by one bootcamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub weeks: u32,
    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    #[serde(default)]
    pub scholarship_available: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Key of the owning bootcamp
    pub bootcamp: String,
}

impl Document for Course {
    type Patch = CoursePatch;

    const TABLE: &'static str = "course";
    const ENTITY: &'static str = "Course";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Create payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weeks: Option<u32>,
    pub tuition: Option<f64>,
    pub minimum_skill: Option<SkillLevel>,
    #[serde(default)]
    pub scholarship_available: bool,
    pub bootcamp: Option<String>,
}

impl NewCourse {
    /// Validate and turn into a storable course.
    ///
    /// Whether the parent bootcamp exists is checked by the caller.
    pub fn build(self, id: String, created_at: DateTime<Utc>) -> Result<Course> {
        let mut violations = Violations::default();

        violations.check(!is_blank(self.title.as_deref()), "Please add a course title");
        violations.check(!is_blank(self.description.as_deref()), "Please add a description");
        violations.check(self.weeks.is_some(), "Please add number of weeks");
        violations.check(self.tuition.is_some(), "Please add a tuition cost");
        violations.check(self.minimum_skill.is_some(), "Please add a minimum skill");
        violations.check(!is_blank(self.bootcamp.as_deref()), "Please add a bootcamp");
        check_ranges(&mut violations, self.weeks, self.tuition);
        violations.into_result()?;

        let (Some(title), Some(description), Some(weeks), Some(tuition), Some(minimum_skill), Some(bootcamp)) = (
            self.title,
            self.description,
            self.weeks,
            self.tuition,
            self.minimum_skill,
            self.bootcamp,
        ) else {
            return Err(Error::BadRequest("Please add all required course fields".into()));
        };

        Ok(Course {
            id,
            title: title.trim().to_string(),
            description,
            weeks,
            tuition,
            minimum_skill,
            scholarship_available: self.scholarship_available,
            created_at,
            bootcamp,
        })
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuition: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_skill: Option<SkillLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_available: Option<bool>,
    /// Moving a course re-parents it; both bootcamps get recomputed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootcamp: Option<String>,
}

impl CoursePatch {
    /// Validate the supplied fields
    pub fn prepare(mut self) -> Result<Self> {
        let mut violations = Violations::default();

        if self.title.is_some() {
            violations.check(!is_blank(self.title.as_deref()), "Please add a course title");
        }
        if self.description.is_some() {
            violations.check(!is_blank(self.description.as_deref()), "Please add a description");
        }
        if self.bootcamp.is_some() {
            violations.check(!is_blank(self.bootcamp.as_deref()), "Please add a bootcamp");
        }
        check_ranges(&mut violations, self.weeks, self.tuition);
        violations.into_result()?;

        if let Some(title) = self.title.as_mut() {
            *title = title.trim().to_string();
        }
        Ok(self)
    }
}

fn check_ranges(violations: &mut Violations, weeks: Option<u32>, tuition: Option<f64>) {
    if let Some(weeks) = weeks {
        violations.check(weeks > 0, "Number of weeks must be at least 1");
    }
    if let Some(tuition) = tuition {
        violations.check(
            tuition.is_finite() && tuition >= 0.0,
            "Tuition can not be negative",
        );
    }
}
