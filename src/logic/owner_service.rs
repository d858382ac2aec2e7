use std::collections::HashMap;

use itertools::Itertools;

use crate::error::{ServiceError, ServiceResult};
use crate::logic::validate::OwnerValidator;
use crate::model::{Id, Owner, OwnerCreate, OwnerSearch};
use crate::store::traits::OwnerStore;

pub struct OwnerService;

impl OwnerService {
    pub async fn get_by_id<S: OwnerStore + ?Sized>(store: &S, id: Id) -> ServiceResult<Owner> {
        store
            .get_owner(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("No owner with ID {} found", id)))
    }

    /// All owners for `ids`, keyed by id. Fails on the first id that has no owner.
    pub async fn get_all_by_id<S: OwnerStore + ?Sized>(
        store: &S,
        ids: &[Id],
    ) -> ServiceResult<HashMap<Id, Owner>> {
        let ids = ids.iter().copied().unique().collect_vec();
        let owners: HashMap<Id, Owner> = store
            .get_owners_by_ids(&ids)
            .await?
            .into_iter()
            .map(|owner| (owner.id, owner))
            .collect();

        if let Some(missing) = ids.iter().find(|id| !owners.contains_key(id)) {
            return Err(ServiceError::not_found(format!(
                "No owner with ID {} found",
                missing
            )));
        }
        Ok(owners)
    }

    pub async fn search<S: OwnerStore + ?Sized>(
        store: &S,
        search: &OwnerSearch,
    ) -> ServiceResult<Vec<Owner>> {
        log::debug!("search owners: {:?}", search);
        Ok(store.search_owners(search).await?)
    }

    pub async fn create<S: OwnerStore + ?Sized>(
        store: &S,
        owner: &OwnerCreate,
    ) -> ServiceResult<Owner> {
        OwnerValidator::validate_for_insert(owner)?;
        let new_owner = owner
            .to_new_owner()
            .ok_or_else(|| ServiceError::fatal("Validated owner is missing required fields"))?;

        let created = store.create_owner(new_owner).await?;
        log::info!("Created owner {} ({})", created.id, created.full_name());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn owner(id: Id, first_name: &str, last_name: &str) -> Owner {
        Owner {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: None,
        }
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_owner(owner(1, "Anna", "Huber"));
        store.insert_owner(owner(2, "Johann", "Gruber"));
        store.insert_owner(owner(3, "Annika", "Berger"));
        store
    }

    #[tokio::test]
    async fn get_all_by_id_names_the_first_missing_owner() {
        let store = store();

        let owners = OwnerService::get_all_by_id(&store, &[2, 1, 2]).await.unwrap();
        assert_eq!(owners.len(), 2);

        let err = OwnerService::get_all_by_id(&store, &[1, 7, 9]).await.unwrap_err();
        assert_eq!(err.to_string(), "No owner with ID 7 found");
    }

    #[tokio::test]
    async fn search_matches_full_name_and_caps_rows() {
        let store = store();
        let search = OwnerSearch {
            name: Some("ann".to_string()),
            max_amount: None,
        };
        let found = OwnerService::search(&store, &search).await.unwrap();
        // "Johann" matches as well
        assert_eq!(found.iter().map(|o| o.id).collect_vec(), vec![1, 2, 3]);

        let capped = OwnerSearch {
            max_amount: Some(1),
            ..search
        };
        assert_eq!(OwnerService::search(&store, &capped).await.unwrap().len(), 1);

        let across_names = OwnerSearch {
            name: Some("a hub".to_string()),
            max_amount: None,
        };
        assert_eq!(OwnerService::search(&store, &across_names).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_assigns_next_id_and_rejects_invalid_input() {
        let store = store();
        let created = OwnerService::create(
            &store,
            &OwnerCreate {
                first_name: Some("Maria".to_string()),
                last_name: Some("Steiner".to_string()),
                email: Some("maria@steiner.at".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.id, 4);
        assert_eq!(OwnerService::get_by_id(&store, 4).await.unwrap(), created);

        let err = OwnerService::create(&store, &OwnerCreate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        assert!(matches!(
            OwnerService::get_by_id(&store, 5).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
