use anyhow::Result;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::model::{Horse, HorseSearch, Id, NewHorse, NewOwner, Owner, OwnerSearch};
use crate::store::traits::{HorseStore, OwnerStore};

#[derive(Debug, Default)]
struct Tables {
    horses: BTreeMap<Id, Horse>,
    owners: BTreeMap<Id, Owner>,
    last_horse_id: Id,
    last_owner_id: Id,
}

/// Store kept entirely in process memory. Used for development runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Fixture helpers: rows with caller-chosen ids, bypassing validation.
#[cfg(test)]
impl MemoryStore {
    /// Ids handed out by `create_horse` continue after the largest id inserted here.
    pub fn insert_horse(&self, horse: Horse) {
        let mut tables = self.tables.write();
        tables.last_horse_id = tables.last_horse_id.max(horse.id);
        tables.horses.insert(horse.id, horse);
    }

    pub fn insert_owner(&self, owner: Owner) {
        let mut tables = self.tables.write();
        tables.last_owner_id = tables.last_owner_id.max(owner.id);
        tables.owners.insert(owner.id, owner);
    }

    pub fn horse_count(&self) -> usize {
        self.tables.read().horses.len()
    }
}

#[async_trait::async_trait]
impl HorseStore for MemoryStore {
    async fn get_horse(&self, id: Id) -> Result<Option<Horse>> {
        Ok(self.tables.read().horses.get(&id).cloned())
    }

    async fn search_horses(&self, search: &HorseSearch) -> Result<Vec<Horse>> {
        let tables = self.tables.read();
        let limit = search.limit.map_or(usize::MAX, |l| l as usize);

        let horses = tables
            .horses
            .values()
            .filter(|horse| {
                let owner = horse.owner_id.and_then(|id| tables.owners.get(&id));
                search.matches(horse, owner)
            })
            .take(limit)
            .cloned()
            .collect();

        Ok(horses)
    }

    async fn get_ancestors(&self, root_id: Id, max_generations: u32) -> Result<Option<Vec<Horse>>> {
        let tables = self.tables.read();
        let Some(root) = tables.horses.get(&root_id) else {
            return Ok(None);
        };

        let mut seen: HashSet<Id> = HashSet::from([root_id]);
        let mut closure = vec![root.clone()];
        let mut queue = VecDeque::from([(root, 0u32)]);

        while let Some((horse, generation)) = queue.pop_front() {
            if generation >= max_generations {
                continue;
            }
            for parent_id in horse.parent_ids() {
                if !seen.insert(parent_id) {
                    continue;
                }
                // dangling references are skipped, not reported
                if let Some(parent) = tables.horses.get(&parent_id) {
                    closure.push(parent.clone());
                    queue.push_back((parent, generation + 1));
                }
            }
        }

        Ok(Some(closure))
    }

    async fn is_in_lineage(&self, id: Id, ancestor_id: Id) -> Result<bool> {
        let tables = self.tables.read();
        let mut seen: HashSet<Id> = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            if current == ancestor_id {
                return Ok(true);
            }
            let Some(horse) = tables.horses.get(&current) else {
                continue;
            };
            queue.extend(horse.parent_ids().filter(|parent_id| seen.insert(*parent_id)));
        }

        Ok(false)
    }

    async fn is_referenced_as_parent(&self, id: Id) -> Result<bool> {
        let tables = self.tables.read();
        let referenced = tables
            .horses
            .values()
            .any(|child| child.parent_ids().any(|parent_id| parent_id == id));
        Ok(referenced)
    }

    async fn create_horse(&self, horse: NewHorse) -> Result<Horse> {
        let mut tables = self.tables.write();
        tables.last_horse_id += 1;
        let horse = horse.into_horse(tables.last_horse_id);
        tables.horses.insert(horse.id, horse.clone());
        Ok(horse)
    }

    async fn update_horse(&self, horse: Horse) -> Result<Option<Horse>> {
        let mut tables = self.tables.write();
        match tables.horses.get_mut(&horse.id) {
            Some(stored) => {
                *stored = horse.clone();
                Ok(Some(horse))
            }
            None => Ok(None),
        }
    }

    async fn delete_horse(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.horses.remove(&id).is_none() {
            return Ok(false);
        }
        for child in tables.horses.values_mut() {
            if child.father_id == Some(id) {
                child.father_id = None;
            }
            if child.mother_id == Some(id) {
                child.mother_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait::async_trait]
impl OwnerStore for MemoryStore {
    async fn get_owner(&self, id: Id) -> Result<Option<Owner>> {
        Ok(self.tables.read().owners.get(&id).cloned())
    }

    async fn get_owners_by_ids(&self, ids: &[Id]) -> Result<Vec<Owner>> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.owners.get(id).cloned())
            .collect())
    }

    async fn search_owners(&self, search: &OwnerSearch) -> Result<Vec<Owner>> {
        let tables = self.tables.read();
        let limit = search.max_amount.map_or(usize::MAX, |l| l as usize);
        Ok(tables
            .owners
            .values()
            .filter(|owner| search.matches(owner))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner> {
        let mut tables = self.tables.write();
        tables.last_owner_id += 1;
        let owner = owner.into_owner(tables.last_owner_id);
        tables.owners.insert(owner.id, owner.clone());
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sex;
    use chrono::NaiveDate;

    fn horse(id: Id, sex: Sex, year: i32, father_id: Option<Id>, mother_id: Option<Id>) -> Horse {
        Horse {
            id,
            name: format!("Horse {}", id),
            description: None,
            date_of_birth: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            sex,
            owner_id: None,
            father_id,
            mother_id,
        }
    }

    /// 1 <- (2, 3), 2 <- (4, 5), 4 <- (6, _)
    fn line() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_horse(horse(6, Sex::Male, 1990, None, None));
        store.insert_horse(horse(4, Sex::Male, 2000, Some(6), None));
        store.insert_horse(horse(5, Sex::Female, 2000, None, None));
        store.insert_horse(horse(2, Sex::Male, 2005, Some(4), Some(5)));
        store.insert_horse(horse(3, Sex::Female, 2005, None, None));
        store.insert_horse(horse(1, Sex::Female, 2010, Some(2), Some(3)));
        store
    }

    fn ids(horses: &[Horse]) -> Vec<Id> {
        let mut ids: Vec<Id> = horses.iter().map(|h| h.id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn ancestor_closure_respects_generation_bound() {
        let store = line();

        let zero = store.get_ancestors(1, 0).await.unwrap().unwrap();
        assert_eq!(ids(&zero), vec![1]);

        let one = store.get_ancestors(1, 1).await.unwrap().unwrap();
        assert_eq!(ids(&one), vec![1, 2, 3]);

        let two = store.get_ancestors(1, 2).await.unwrap().unwrap();
        assert_eq!(ids(&two), vec![1, 2, 3, 4, 5]);

        let all = store.get_ancestors(1, 10).await.unwrap().unwrap();
        assert_eq!(ids(&all), vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn ancestor_closure_of_missing_root_is_none() {
        let store = line();
        assert!(store.get_ancestors(99, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lineage_follows_every_parent_path() {
        let store = line();
        assert!(store.is_in_lineage(1, 1).await.unwrap());
        assert!(store.is_in_lineage(1, 6).await.unwrap());
        assert!(store.is_in_lineage(2, 5).await.unwrap());
        assert!(!store.is_in_lineage(2, 3).await.unwrap());
        assert!(!store.is_in_lineage(6, 1).await.unwrap());
    }

    #[tokio::test]
    async fn lineage_walk_terminates_on_cycles() {
        let store = MemoryStore::new();
        store.insert_horse(horse(1, Sex::Male, 2010, Some(2), None));
        store.insert_horse(horse(2, Sex::Male, 2010, Some(1), None));

        assert!(store.is_in_lineage(1, 2).await.unwrap());
        assert!(!store.is_in_lineage(1, 3).await.unwrap());

        let closure = store.get_ancestors(1, u32::MAX).await.unwrap().unwrap();
        assert_eq!(ids(&closure), vec![1, 2]);
    }

    #[tokio::test]
    async fn delete_clears_parent_references() {
        let store = line();
        assert!(store.is_referenced_as_parent(2).await.unwrap());

        assert!(store.delete_horse(2).await.unwrap());
        assert!(!store.delete_horse(2).await.unwrap());

        let child = store.get_horse(1).await.unwrap().unwrap();
        assert_eq!(child.father_id, None);
        assert_eq!(child.mother_id, Some(3));
        assert!(!store.is_referenced_as_parent(2).await.unwrap());
    }

    #[tokio::test]
    async fn created_ids_continue_after_seeded_ones() {
        let store = line();
        let created = store
            .create_horse(NewHorse {
                name: "Foal".to_string(),
                description: None,
                date_of_birth: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
                sex: Sex::Male,
                owner_id: None,
                father_id: Some(2),
                mother_id: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(store.horse_count(), 7);
    }

    #[tokio::test]
    async fn search_applies_filters_and_row_cap() {
        let store = line();
        let search = HorseSearch {
            sex: Some(Sex::Male),
            ..HorseSearch::default()
        };
        assert_eq!(ids(&store.search_horses(&search).await.unwrap()), vec![2, 4, 6]);

        let capped = HorseSearch {
            limit: Some(2),
            ..HorseSearch::default()
        };
        assert_eq!(ids(&store.search_horses(&capped).await.unwrap()), vec![1, 2]);
    }
}
