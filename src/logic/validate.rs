use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{ServiceError, ServiceResult};
use crate::model::{Horse, HorseCreate, HorseUpdate, Id, OwnerCreate, Sex};

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 4095;
pub const MAX_OWNER_FIELD_LENGTH: usize = 255;

/// Checks horse input in two passes. Field problems are reported as a validation
/// failure; only if the fields are clean are the proposed parents checked, and any
/// problems there are reported as a conflict. Each pass collects every violation.
pub struct HorseValidator;

impl HorseValidator {
    pub fn validate_for_insert(
        horse: &HorseCreate,
        father: Option<&Horse>,
        mother: Option<&Horse>,
    ) -> ServiceResult<()> {
        log::trace!("validate_for_insert({:?})", horse);
        let mut errors = Vec::new();

        Self::validate_description(&mut errors, horse.description.as_deref());
        Self::validate_sex(&mut errors, horse.sex);
        match horse.name.as_deref() {
            Some(name) => Self::validate_name(&mut errors, name),
            None => errors.push("No name given".to_string()),
        }
        Self::validate_birth(&mut errors, horse.date_of_birth);
        ServiceError::validation("Validation of horse for create failed", errors)?;

        let mut conflicts = Vec::new();
        if let Some(date_of_birth) = horse.date_of_birth {
            Self::validate_parents(&mut conflicts, father, mother, date_of_birth, None);
        }
        ServiceError::conflict("Data of horse for create has conflicts", conflicts)
    }

    pub fn validate_for_update(
        horse: &HorseUpdate,
        father: Option<&Horse>,
        mother: Option<&Horse>,
    ) -> ServiceResult<()> {
        log::trace!("validate_for_update({:?})", horse);
        let mut errors = Vec::new();

        if horse.id.is_none() {
            errors.push("No ID given".to_string());
        }
        Self::validate_description(&mut errors, horse.description.as_deref());
        Self::validate_sex(&mut errors, horse.sex);
        // the name is optional on update; a supplied one obeys the create rules
        if let Some(name) = horse.name.as_deref() {
            Self::validate_name(&mut errors, name);
        }
        Self::validate_birth(&mut errors, horse.date_of_birth);
        ServiceError::validation("Validation of horse for update failed", errors)?;

        let mut conflicts = Vec::new();
        if let Some(date_of_birth) = horse.date_of_birth {
            Self::validate_parents(&mut conflicts, father, mother, date_of_birth, horse.id);
        }
        ServiceError::conflict("Data of horse for update has conflicts", conflicts)
    }

    /// A horse that is already recorded as somebody's parent may not change sex.
    pub fn validate_sex_change(
        previous: Sex,
        next: Sex,
        has_dependents: bool,
    ) -> ServiceResult<()> {
        let mut conflicts = Vec::new();
        Self::check_sex_change(&mut conflicts, previous, next, has_dependents);
        ServiceError::conflict("Data of horse for update has conflicts", conflicts)
    }

    pub(crate) fn check_sex_change(
        conflicts: &mut Vec<String>,
        previous: Sex,
        next: Sex,
        has_dependents: bool,
    ) {
        if previous != next && has_dependents {
            conflicts.push(format!(
                "Horse is a parent of other horses and cannot change sex from {} to {}",
                previous, next
            ));
        }
    }

    fn validate_sex(errors: &mut Vec<String>, sex: Option<Sex>) {
        if sex.is_none() {
            errors.push("No sex given".to_string());
        }
    }

    fn validate_name(errors: &mut Vec<String>, name: &str) {
        if name.trim().is_empty() {
            errors.push("Horse name is given but blank".to_string());
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(format!(
                "Horse name too long: longer than {} characters",
                MAX_NAME_LENGTH
            ));
        }
    }

    fn validate_description(errors: &mut Vec<String>, description: Option<&str>) {
        let Some(description) = description else {
            return;
        };
        if description.trim().is_empty() {
            errors.push("Horse description is given but blank".to_string());
        }
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.push(format!(
                "Horse description too long: longer than {} characters",
                MAX_DESCRIPTION_LENGTH
            ));
        }
    }

    fn validate_birth(errors: &mut Vec<String>, date_of_birth: Option<NaiveDate>) {
        match date_of_birth {
            None => errors.push("No date of birth given".to_string()),
            Some(date) if date > Local::now().date_naive() => {
                errors.push("Horse birth is in the future".to_string())
            }
            Some(_) => {}
        }
    }

    fn validate_parents(
        conflicts: &mut Vec<String>,
        father: Option<&Horse>,
        mother: Option<&Horse>,
        child_birth: NaiveDate,
        child_id: Option<Id>,
    ) {
        if let Some(mother) = mother {
            if child_id == Some(mother.id) {
                conflicts.push("Mother horse is the same as child".to_string());
            }
        }
        if let Some(father) = father {
            if child_id == Some(father.id) {
                conflicts.push("Father horse is the same as child".to_string());
            }
        }
        if let Some(mother) = mother {
            if mother.sex != Sex::Female {
                conflicts.push("Mother horse is not female".to_string());
            }
        }
        if let Some(father) = father {
            if father.sex != Sex::Male {
                conflicts.push("Father horse is not male".to_string());
            }
        }
        if let Some(mother) = mother {
            if mother.date_of_birth > child_birth {
                conflicts.push("Mother horse is younger than child".to_string());
            }
        }
        if let Some(father) = father {
            if father.date_of_birth > child_birth {
                conflicts.push("Father horse is younger than child".to_string());
            }
        }
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|e| panic!("invalid email pattern: {}", e))
    })
}

pub struct OwnerValidator;

impl OwnerValidator {
    pub fn validate_for_insert(owner: &OwnerCreate) -> ServiceResult<()> {
        log::trace!("validate_for_insert({:?})", owner);
        let mut errors = Vec::new();

        Self::validate_name(&mut errors, owner.first_name.as_deref(), "first name");
        Self::validate_name(&mut errors, owner.last_name.as_deref(), "last name");
        Self::validate_email(&mut errors, owner.email.as_deref());

        ServiceError::validation("Validation of owner for create failed", errors)
    }

    fn validate_name(errors: &mut Vec<String>, name: Option<&str>, field: &str) {
        let Some(name) = name else {
            errors.push(format!("Owner {} is not set", field));
            return;
        };
        if name.trim().is_empty() {
            errors.push(format!("Owner {} is given but blank", field));
        }
        if name.chars().count() > MAX_OWNER_FIELD_LENGTH {
            errors.push(format!(
                "Owner {} too long: longer than {} characters",
                field, MAX_OWNER_FIELD_LENGTH
            ));
        }
    }

    fn validate_email(errors: &mut Vec<String>, email: Option<&str>) {
        let Some(email) = email else {
            return;
        };
        if email.trim().is_empty() {
            errors.push("Owner email is given but blank".to_string());
            return;
        }
        if email.chars().count() > MAX_OWNER_FIELD_LENGTH {
            errors.push(format!(
                "Owner email too long: longer than {} characters",
                MAX_OWNER_FIELD_LENGTH
            ));
        }
        if !email_pattern().is_match(email) {
            errors.push("Owner email is not in a valid format".to_string());
        }
    }
}
