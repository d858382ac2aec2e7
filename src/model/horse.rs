use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{contains_ignore_case, Id, Owner, Sex};

/// A persisted horse record. Parents are plain id references into the same store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Horse {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    pub owner_id: Option<Id>,
    pub father_id: Option<Id>,
    pub mother_id: Option<Id>,
}

impl Horse {
    pub fn parent_ids(&self) -> impl Iterator<Item = Id> {
        self.father_id.into_iter().chain(self.mother_id)
    }
}

/// A horse that passed validation and is ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHorse {
    pub name: String,
    pub description: Option<String>,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    pub owner_id: Option<Id>,
    pub father_id: Option<Id>,
    pub mother_id: Option<Id>,
}

impl NewHorse {
    pub fn into_horse(self, id: Id) -> Horse {
        Horse {
            id,
            name: self.name,
            description: self.description,
            date_of_birth: self.date_of_birth,
            sex: self.sex,
            owner_id: self.owner_id,
            father_id: self.father_id,
            mother_id: self.mother_id,
        }
    }
}

/// Request body for creating a horse. Everything is optional on the wire so that
/// missing fields surface as validation messages instead of decode errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorseCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub owner_id: Option<Id>,
    pub father_id: Option<Id>,
    pub mother_id: Option<Id>,
}

impl HorseCreate {
    /// Returns `None` if a required field is missing.
    pub fn to_new_horse(&self) -> Option<NewHorse> {
        Some(NewHorse {
            name: self.name.clone()?,
            description: self.description.clone(),
            date_of_birth: self.date_of_birth?,
            sex: self.sex?,
            owner_id: self.owner_id,
            father_id: self.father_id,
            mother_id: self.mother_id,
        })
    }
}

/// Request body for updating a horse. The id from the request path wins over the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorseUpdate {
    pub id: Option<Id>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub owner_id: Option<Id>,
    pub father_id: Option<Id>,
    pub mother_id: Option<Id>,
}

impl HorseUpdate {
    pub fn with_id(self, id: Id) -> Self {
        Self { id: Some(id), ..self }
    }

    /// Merge this update onto the persisted record. An absent name keeps the stored one;
    /// every other field replaces the stored value. Returns `None` if a required field
    /// is missing.
    pub fn apply_to(&self, previous: &Horse) -> Option<Horse> {
        Some(Horse {
            id: self.id?,
            name: self.name.clone().unwrap_or_else(|| previous.name.clone()),
            description: self.description.clone(),
            date_of_birth: self.date_of_birth?,
            sex: self.sex?,
            owner_id: self.owner_id,
            father_id: self.father_id,
            mother_id: self.mother_id,
        })
    }
}

/// Query parameters for horse search. Each unset field is not filtered by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorseSearch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub born_before: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub owner_name: Option<String>,
    pub limit: Option<u32>,
}

impl HorseSearch {
    pub fn matches(&self, horse: &Horse, owner: Option<&Owner>) -> bool {
        if let Some(name) = &self.name {
            if !contains_ignore_case(&horse.name, name) {
                return false;
            }
        }
        if let Some(description) = &self.description {
            match &horse.description {
                Some(text) if contains_ignore_case(text, description) => {}
                _ => return false,
            }
        }
        if let Some(sex) = self.sex {
            if horse.sex != sex {
                return false;
            }
        }
        if let Some(born_before) = self.born_before {
            if horse.date_of_birth > born_before {
                return false;
            }
        }
        if let Some(owner_name) = &self.owner_name {
            match owner {
                Some(owner) if contains_ignore_case(&owner.full_name(), owner_name) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Query parameters for the ancestry endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HorseGenerations {
    pub generations: Option<i64>,
}

/// Horse projection used in search results and as the parents of a detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorseListItem {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    pub owner: Option<Owner>,
}

impl HorseListItem {
    pub fn new(horse: &Horse, owner: Option<Owner>) -> Self {
        Self {
            id: horse.id,
            name: horse.name.clone(),
            description: horse.description.clone(),
            date_of_birth: horse.date_of_birth,
            sex: horse.sex,
            owner,
        }
    }
}

/// Full horse view including its parents, but not the parents' parents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorseDetail {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    pub owner: Option<Owner>,
    pub father: Option<HorseListItem>,
    pub mother: Option<HorseListItem>,
}

/// One node of an ancestry tree. The same ancestor may show up on several lineage paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorseTree {
    pub id: Id,
    pub name: String,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    pub father: Option<Box<HorseTree>>,
    pub mother: Option<Box<HorseTree>>,
}

impl HorseTree {
    pub fn leaf(horse: &Horse) -> Self {
        Self {
            id: horse.id,
            name: horse.name.clone(),
            sex: horse.sex,
            date_of_birth: horse.date_of_birth,
            father: None,
            mother: None,
        }
    }
}

#[cfg(test)]
impl HorseTree {
    /// Number of parent hops from this node to its farthest resolved ancestor.
    pub fn depth(&self) -> usize {
        let father = self.father.as_ref().map_or(0, |f| 1 + f.depth());
        let mother = self.mother.as_ref().map_or(0, |m| 1 + m.depth());
        father.max(mother)
    }

    pub fn node_count(&self) -> usize {
        1 + self.father.as_ref().map_or(0, |f| f.node_count())
            + self.mother.as_ref().map_or(0, |m| m.node_count())
    }
}
