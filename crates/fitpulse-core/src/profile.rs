//! User profile and its persistence.
//!
//! The profile is filled in from the identity provider on login and edited
//! locally afterwards. It is stored as one JSON blob next to the step
//! history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::storage::KvSlot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub height_feet: u32,
    pub height_inches: u32,
    pub weight_lbs: f64,
    #[serde(default)]
    pub gender: Option<String>,
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Guest".to_string(),
            age: 0,
            height_feet: 0,
            height_inches: 0,
            weight_lbs: 0.0,
            gender: None,
            date_joined: Utc::now(),
            goal: None,
            picture_url: None,
        }
    }
}

impl UserProfile {
    pub fn total_height_inches(&self) -> f64 {
        f64::from(self.height_feet) * 12.0 + f64::from(self.height_inches)
    }

    /// Body mass index from imperial units. `None` until a height is set.
    pub fn bmi(&self) -> Option<f64> {
        let height = self.total_height_inches();
        if height <= 0.0 {
            return None;
        }
        Some(self.weight_lbs / (height * height) * 703.0)
    }

    /// Set one field from text, as typed into an edit form.
    ///
    /// # Errors
    /// Rejects unknown fields and values that don't parse.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        fn parse<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ValidationError> {
            value
                .trim()
                .parse()
                .map_err(|_| ValidationError::invalid(field, format!("cannot parse '{value}'")))
        }
        fn optional(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        match field {
            "name" => self.name = value.trim().to_string(),
            "age" => self.age = parse(field, value)?,
            "heightFeet" | "height_feet" => self.height_feet = parse(field, value)?,
            "heightInches" | "height_inches" => {
                let inches: u32 = parse(field, value)?;
                if inches >= 12 {
                    return Err(ValidationError::invalid(field, "must be below 12"));
                }
                self.height_inches = inches;
            }
            "weightLbs" | "weight_lbs" => {
                let weight: f64 = parse(field, value)?;
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ValidationError::invalid(field, "must be a non-negative number"));
                }
                self.weight_lbs = weight;
            }
            "gender" => self.gender = optional(value),
            "goal" => self.goal = optional(value),
            "pictureUrl" | "picture_url" => self.picture_url = optional(value),
            _ => return Err(ValidationError::invalid(field, "unknown profile field")),
        }
        Ok(())
    }
}

/// Loads and saves the profile through a key-value slot.
pub struct ProfileStore {
    slot: Box<dyn KvSlot>,
}

impl ProfileStore {
    pub fn new(slot: impl KvSlot + 'static) -> Self {
        Self {
            slot: Box::new(slot),
        }
    }

    /// The saved profile, or the default when none is saved or it is corrupt.
    pub fn load_or_default(&self) -> UserProfile {
        match self.slot.read() {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "user profile is corrupt, using default");
                UserProfile::default()
            }),
            Ok(None) => UserProfile::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read user profile, using default");
                UserProfile::default()
            }
        }
    }

    /// # Errors
    /// Propagates serialization or write failures.
    pub fn save(&self, profile: &UserProfile) -> Result<()> {
        let blob = serde_json::to_string(profile)?;
        self.slot.write(&blob)
    }

    /// Forget the saved profile (logout).
    ///
    /// # Errors
    /// Propagates slot failures.
    pub fn reset(&self) -> Result<UserProfile> {
        self.slot.clear()?;
        Ok(UserProfile::default())
    }
}
