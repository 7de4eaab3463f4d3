use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{is_blank, timestamp, Violations};
use crate::{error::Result, geo::GeoPoint, repository::Document};

/// Career tags a bootcamp may advertise
pub const CAREERS: &[&str] = &[
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

/// Photo reference for bootcamps that never had one uploaded
pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)$",
    )
    .expect("valid url pattern")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("valid email pattern")
});

/// GeoJSON-style point plus the address parts a geocoder resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,

    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],

    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

fn point_type() -> String {
    "Point".to_string()
}

impl Location {
    /// Bare point with no address details
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: point_type(),
            coordinates: [longitude, latitude],
            formatted_address: None,
            street: None,
            city: None,
            state: None,
            zipcode: None,
            country: None,
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude(), self.longitude())
    }

    fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude()) && (-90.0..=90.0).contains(&self.latitude())
    }
}

/// A bootcamp listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub careers: Vec<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// Written only by the average cost maintainer
    #[serde(default)]
    pub average_cost: Option<f64>,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

impl Document for Bootcamp {
    type Patch = BootcampPatch;

    const TABLE: &'static str = "bootcamp";
    const ENTITY: &'static str = "Bootcamp";
    const ARRAY_FIELDS: &'static [&'static str] = &["careers"];

    fn id(&self) -> &str {
        &self.id
    }
}

/// Parent details embedded in course responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootcampSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&Bootcamp> for BootcampSummary {
    fn from(bootcamp: &Bootcamp) -> Self {
        Self {
            id: bootcamp.id.clone(),
            name: bootcamp.name.clone(),
            description: bootcamp.description.clone(),
        }
    }
}

/// URL-friendly form of a bootcamp name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut gap = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.push(ch);
        } else {
            gap = true;
        }
    }

    slug
}

/// Create payload; client-controlled fields only
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBootcamp {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub location: Option<Location>,
    #[serde(default)]
    pub careers: Vec<String>,
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

impl NewBootcamp {
    /// Validate and turn into a storable bootcamp
    pub fn build(self, id: String, created_at: DateTime<Utc>) -> Result<Bootcamp> {
        let mut violations = Violations::default();

        violations.check(!is_blank(self.name.as_deref()), "Please add a name");
        violations.check(!is_blank(self.description.as_deref()), "Please add a description");
        violations.check(!is_blank(self.address.as_deref()), "Please add an address");
        violations.check(!self.careers.is_empty(), "Please add at least one career");
        check_common(
            &mut violations,
            CommonFields {
                name: self.name.as_deref(),
                description: self.description.as_deref(),
                website: self.website.as_deref(),
                phone: self.phone.as_deref(),
                email: self.email.as_deref(),
                location: self.location.as_ref(),
                careers: Some(self.careers.as_slice()),
                average_rating: self.average_rating,
            },
        );
        violations.into_result()?;

        let name = self.name.unwrap_or_default().trim().to_string();
        Ok(Bootcamp {
            id,
            slug: slugify(&name),
            name,
            description: self.description.unwrap_or_default(),
            website: self.website,
            phone: self.phone,
            email: self.email,
            address: self.address.unwrap_or_default(),
            location: self.location,
            careers: self.careers,
            average_rating: self.average_rating,
            average_cost: None,
            photo: default_photo(),
            housing: self.housing,
            job_assistance: self.job_assistance,
            job_guarantee: self.job_guarantee,
            accept_gi: self.accept_gi,
            created_at,
        })
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootcampPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub careers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_assistance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_guarantee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_gi: Option<bool>,
}

impl BootcampPatch {
    /// Validate the supplied fields and derive the slug from a new name
    pub fn prepare(mut self) -> Result<Self> {
        let mut violations = Violations::default();

        if self.name.is_some() {
            violations.check(!is_blank(self.name.as_deref()), "Please add a name");
        }
        if self.description.is_some() {
            violations.check(!is_blank(self.description.as_deref()), "Please add a description");
        }
        if self.address.is_some() {
            violations.check(!is_blank(self.address.as_deref()), "Please add an address");
        }
        if let Some(careers) = &self.careers {
            violations.check(!careers.is_empty(), "Please add at least one career");
        }
        check_common(
            &mut violations,
            CommonFields {
                name: self.name.as_deref(),
                description: self.description.as_deref(),
                website: self.website.as_deref(),
                phone: self.phone.as_deref(),
                email: self.email.as_deref(),
                location: self.location.as_ref(),
                careers: self.careers.as_deref(),
                average_rating: self.average_rating,
            },
        );
        violations.into_result()?;

        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
            self.slug = Some(slugify(name));
        }
        Ok(self)
    }
}

struct CommonFields<'a> {
    name: Option<&'a str>,
    description: Option<&'a str>,
    website: Option<&'a str>,
    phone: Option<&'a str>,
    email: Option<&'a str>,
    location: Option<&'a Location>,
    careers: Option<&'a [String]>,
    average_rating: Option<f64>,
}

fn check_common(violations: &mut Violations, fields: CommonFields<'_>) {
    if let Some(name) = fields.name {
        violations.check(
            name.trim().chars().count() <= 50,
            "Name can not be more than 50 characters",
        );
    }
    if let Some(description) = fields.description {
        violations.check(
            description.chars().count() <= 500,
            "Description can not be more than 500 characters",
        );
    }
    if let Some(website) = fields.website {
        violations.check(
            URL_PATTERN.is_match(website),
            "Please use a valid URL with HTTP or HTTPS",
        );
    }
    if let Some(phone) = fields.phone {
        violations.check(
            phone.chars().count() <= 20,
            "Phone number can not be longer than 20 characters",
        );
    }
    if let Some(email) = fields.email {
        violations.check(EMAIL_PATTERN.is_match(email), "Please add a valid email");
    }
    if let Some(location) = fields.location {
        violations.check(location.is_valid(), "Please add valid coordinates");
    }
    for career in fields.careers.unwrap_or_default() {
        violations.check(
            CAREERS.contains(&career.as_str()),
            format!("`{career}` is not a valid career"),
        );
    }
    if let Some(rating) = fields.average_rating {
        violations.check(rating >= 1.0, "Rating must be at least 1");
        violations.check(rating <= 10.0, "Rating can not be more than 10");
    }
}
