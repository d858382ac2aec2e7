use crate::model::{Horse, HorseSearch, Id, NewHorse, NewOwner, Owner, OwnerSearch};
use anyhow::Result;

#[async_trait::async_trait]
pub trait HorseStore: Send + Sync {
    async fn get_horse(&self, id: Id) -> Result<Option<Horse>>;
    /// Search horses; `limit` caps the number of rows, results ordered by id
    async fn search_horses(&self, search: &HorseSearch) -> Result<Vec<Horse>>;
    /// Bounded ancestor closure of `root_id`, root included: every horse reachable by
    /// following father/mother references at most `max_generations` hops.
    /// Returns `None` if the root does not exist.
    async fn get_ancestors(&self, root_id: Id, max_generations: u32) -> Result<Option<Vec<Horse>>>;
    /// Whether `ancestor_id` is `id` itself or reachable from it through any number of
    /// father/mother references
    async fn is_in_lineage(&self, id: Id, ancestor_id: Id) -> Result<bool>;
    /// Whether any horse names `id` as its father or mother
    async fn is_referenced_as_parent(&self, id: Id) -> Result<bool>;
    async fn create_horse(&self, horse: NewHorse) -> Result<Horse>;
    /// Replace the stored record with the same id; `None` if there is none
    async fn update_horse(&self, horse: Horse) -> Result<Option<Horse>>;
    /// Delete a horse and clear the parent references that pointed at it
    async fn delete_horse(&self, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait OwnerStore: Send + Sync {
    async fn get_owner(&self, id: Id) -> Result<Option<Owner>>;
    /// Owners for the given ids; ids without an owner are silently skipped
    async fn get_owners_by_ids(&self, ids: &[Id]) -> Result<Vec<Owner>>;
    async fn search_owners(&self, search: &OwnerSearch) -> Result<Vec<Owner>>;
    async fn create_owner(&self, owner: NewOwner) -> Result<Owner>;
}

pub trait Store: HorseStore + OwnerStore + Send + Sync {}
impl<T: HorseStore + OwnerStore + Send + Sync> Store for T {}
