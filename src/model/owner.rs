use serde::{Deserialize, Serialize};

use crate::model::{contains_ignore_case, Id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl Owner {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Request body for creating an owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerCreate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl OwnerCreate {
    pub fn to_new_owner(&self) -> Option<NewOwner> {
        Some(NewOwner {
            first_name: self.first_name.clone()?,
            last_name: self.last_name.clone()?,
            email: self.email.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOwner {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl NewOwner {
    pub fn into_owner(self, id: Id) -> Owner {
        Owner {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

/// An owner matches when `name` is a substring of "first last".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSearch {
    pub name: Option<String>,
    pub max_amount: Option<u32>,
}

impl OwnerSearch {
    pub fn matches(&self, owner: &Owner) -> bool {
        match &self.name {
            Some(name) => contains_ignore_case(&owner.full_name(), name),
            None => true,
        }
    }
}
