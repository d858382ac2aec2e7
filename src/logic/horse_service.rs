use std::collections::HashMap;

use itertools::Itertools;

use crate::error::{ServiceError, ServiceResult};
use crate::logic::ancestry::AncestorResolver;
use crate::logic::owner_service::OwnerService;
use crate::logic::validate::HorseValidator;
use crate::model::{
    Horse, HorseCreate, HorseDetail, HorseListItem, HorseSearch, HorseTree, HorseUpdate, Id,
    Owner,
};
use crate::store::traits::Store;

pub struct HorseService;

impl HorseService {
    pub async fn search<S: Store + ?Sized>(
        store: &S,
        search: &HorseSearch,
    ) -> ServiceResult<Vec<HorseListItem>> {
        log::debug!("search horses: {:?}", search);
        let horses = store.search_horses(search).await?;
        let owners = Self::owners_of(store, &horses).await?;

        horses
            .iter()
            .map(|horse| Self::owner_for(&owners, horse).map(|owner| HorseListItem::new(horse, owner)))
            .collect()
    }

    pub async fn get_by_id<S: Store + ?Sized>(store: &S, id: Id) -> ServiceResult<HorseDetail> {
        let horse = Self::fetch(store, id).await?;
        Self::detail(store, horse).await
    }

    pub async fn create<S: Store + ?Sized>(
        store: &S,
        horse: &HorseCreate,
    ) -> ServiceResult<HorseDetail> {
        let (father, mother) = Self::fetch_parents(store, horse.father_id, horse.mother_id).await?;
        if let Some(owner_id) = horse.owner_id {
            OwnerService::get_by_id(store, owner_id).await?;
        }

        HorseValidator::validate_for_insert(horse, father.as_ref(), mother.as_ref())?;
        let new_horse = horse
            .to_new_horse()
            .ok_or_else(|| ServiceError::fatal("Validated horse is missing required fields"))?;

        let created = store.create_horse(new_horse).await?;
        log::info!("Created horse {} ({})", created.id, created.name);
        Self::detail(store, created).await
    }

    /// Replace horse `id` with `update`. Relationship conflicts and a forbidden sex change
    /// are reported together.
    pub async fn update<S: Store + ?Sized>(
        store: &S,
        id: Id,
        update: HorseUpdate,
    ) -> ServiceResult<HorseDetail> {
        let update = update.with_id(id);
        let previous = Self::fetch(store, id).await?;
        let (father, mother) =
            Self::fetch_parents(store, update.father_id, update.mother_id).await?;
        if let Some(owner_id) = update.owner_id {
            OwnerService::get_by_id(store, owner_id).await?;
        }

        let mut conflicts =
            match HorseValidator::validate_for_update(&update, father.as_ref(), mother.as_ref()) {
                Ok(()) => Vec::new(),
                Err(ServiceError::Conflict { errors, .. }) => errors,
                Err(other) => return Err(other),
            };
        for (parent, role) in [(&father, "Father"), (&mother, "Mother")] {
            let Some(parent) = parent.as_ref().filter(|parent| parent.id != id) else {
                continue;
            };
            // the horse may not become its own ancestor
            if store.is_in_lineage(parent.id, id).await? {
                conflicts.push(format!("{} horse is a descendant of child", role));
            }
        }
        if let Some(sex) = update.sex.filter(|sex| *sex != previous.sex) {
            let has_dependents = store.is_referenced_as_parent(id).await?;
            HorseValidator::check_sex_change(&mut conflicts, previous.sex, sex, has_dependents);
        }
        ServiceError::conflict("Data of horse for update has conflicts", conflicts)?;

        let horse = update
            .apply_to(&previous)
            .ok_or_else(|| ServiceError::fatal("Validated horse is missing required fields"))?;
        let updated = store
            .update_horse(horse)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("No horse with ID {} found", id)))?;

        log::info!("Updated horse {} ({})", updated.id, updated.name);
        Self::detail(store, updated).await
    }

    pub async fn delete<S: Store + ?Sized>(store: &S, id: Id) -> ServiceResult<()> {
        if !store.delete_horse(id).await? {
            return Err(ServiceError::not_found(format!("No horse with ID {} found", id)));
        }
        log::info!("Deleted horse {}", id);
        Ok(())
    }

    pub async fn ancestors<S: Store + ?Sized>(
        store: &S,
        id: Id,
        generations: i64,
    ) -> ServiceResult<HorseTree> {
        AncestorResolver::resolve(store, id, generations).await
    }

    async fn fetch<S: Store + ?Sized>(store: &S, id: Id) -> ServiceResult<Horse> {
        store
            .get_horse(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("No horse with ID {} found", id)))
    }

    async fn fetch_parent<S: Store + ?Sized>(
        store: &S,
        id: Option<Id>,
        role: &str,
    ) -> ServiceResult<Option<Horse>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let horse = store.get_horse(id).await?.ok_or_else(|| {
            ServiceError::not_found(format!("No {} horse with ID {} found", role, id))
        })?;
        Ok(Some(horse))
    }

    async fn fetch_parents<S: Store + ?Sized>(
        store: &S,
        father_id: Option<Id>,
        mother_id: Option<Id>,
    ) -> ServiceResult<(Option<Horse>, Option<Horse>)> {
        tokio::try_join!(
            Self::fetch_parent(store, father_id, "father"),
            Self::fetch_parent(store, mother_id, "mother"),
        )
    }

    /// Owners of `horses` in one bulk fetch. Every referenced owner must exist.
    async fn owners_of<S: Store + ?Sized>(
        store: &S,
        horses: &[Horse],
    ) -> ServiceResult<HashMap<Id, Owner>> {
        let ids = horses.iter().filter_map(|h| h.owner_id).collect_vec();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        OwnerService::get_all_by_id(store, &ids)
            .await
            .map_err(|err| match err {
                ServiceError::NotFound(message) => ServiceError::fatal(format!(
                    "Horse references an owner that does not exist: {}",
                    message
                )),
                other => other,
            })
    }

    fn owner_for(owners: &HashMap<Id, Owner>, horse: &Horse) -> ServiceResult<Option<Owner>> {
        match horse.owner_id {
            None => Ok(None),
            Some(owner_id) => owners.get(&owner_id).cloned().map(Some).ok_or_else(|| {
                ServiceError::fatal(format!(
                    "Owner {} of horse {} is missing from the store",
                    owner_id, horse.id
                ))
            }),
        }
    }

    async fn detail<S: Store + ?Sized>(store: &S, horse: Horse) -> ServiceResult<HorseDetail> {
        // dangling parent references show up as absent parents
        let (father, mother) = tokio::try_join!(
            Self::optional(store, horse.father_id),
            Self::optional(store, horse.mother_id),
        )?;

        let related = std::iter::once(&horse)
            .chain(father.iter())
            .chain(mother.iter())
            .cloned()
            .collect_vec();
        let owners = Self::owners_of(store, &related).await?;
        log::debug!(
            "horse {} detail with owners [{}]",
            horse.id,
            owners.keys().sorted().join(", ")
        );

        let project = |parent: Option<Horse>| -> ServiceResult<Option<HorseListItem>> {
            parent
                .map(|p| Self::owner_for(&owners, &p).map(|owner| HorseListItem::new(&p, owner)))
                .transpose()
        };

        Ok(HorseDetail {
            owner: Self::owner_for(&owners, &horse)?,
            father: project(father)?,
            mother: project(mother)?,
            id: horse.id,
            name: horse.name,
            description: horse.description,
            date_of_birth: horse.date_of_birth,
            sex: horse.sex,
        })
    }

    async fn optional<S: Store + ?Sized>(store: &S, id: Option<Id>) -> ServiceResult<Option<Horse>> {
        match id {
            Some(id) => Ok(store.get_horse(id).await?),
            None => Ok(None),
        }
    }
}
