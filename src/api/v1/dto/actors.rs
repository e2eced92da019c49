/*
 * Responsibility
 * - Actors request/response DTOs
 * - validate() checks shape only (lengths match the column sizes)
 */
use serde::{Deserialize, Serialize};

use crate::repos::actor_repo::ActorRow;

const MAX_NAME_LEN: usize = 120;
const MAX_GENDER_LEN: usize = 20;
const MAX_AGE: i32 = 150;

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("name cannot be empty");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("name must be <= 120 chars");
    }
    Ok(())
}

fn validate_age(age: i32) -> Result<(), &'static str> {
    if !(0..=MAX_AGE).contains(&age) {
        return Err("age must be between 0 and 150");
    }
    Ok(())
}

fn validate_gender(gender: &str) -> Result<(), &'static str> {
    if gender.trim().is_empty() {
        return Err("gender cannot be empty");
    }
    if gender.chars().count() > MAX_GENDER_LEN {
        return Err("gender must be <= 20 chars");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateActorRequest {
    pub name: String,
    pub age: i32,
    pub gender: String,
}

impl CreateActorRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_name(&self.name)?;
        validate_age(self.age)?;
        validate_gender(&self.gender)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateActorRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl UpdateActorRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.is_none() && self.age.is_none() && self.gender.is_none() {
            return Err("nothing to update");
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        if let Some(gender) = &self.gender {
            validate_gender(gender)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ActorResponse {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

impl From<ActorRow> for ActorResponse {
    fn from(row: ActorRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
        }
    }
}
