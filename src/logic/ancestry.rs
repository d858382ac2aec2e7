use std::collections::HashMap;

use crate::error::{ServiceError, ServiceResult};
use crate::model::{Horse, HorseTree, Id};
use crate::store::traits::HorseStore;

/// The bounded ancestor closure of one horse, indexed by id.
///
/// Lookups never consume entries: a horse that is an ancestor along several lineage
/// paths (half-sibling matings and the like) is found again on every path.
#[derive(Debug, Clone)]
pub struct AncestorPool {
    horses: HashMap<Id, Horse>,
}

impl AncestorPool {
    pub fn new(horses: Vec<Horse>) -> Self {
        Self {
            horses: horses.into_iter().map(|horse| (horse.id, horse)).collect(),
        }
    }

    pub fn get(&self, id: Option<Id>) -> Option<&Horse> {
        id.and_then(|id| self.horses.get(&id))
    }

    pub fn len(&self) -> usize {
        self.horses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horses.is_empty()
    }

    /// Assemble the tree below `root`, descending at most `generations` parent hops.
    /// Parents missing from the pool end their branch, as does a parent that already
    /// appears further down the same lineage path.
    pub fn build_tree(&self, root: &Horse, generations: u32) -> HorseTree {
        let mut path = Vec::new();
        self.build_node(root, generations, &mut path)
    }

    fn build_node(&self, horse: &Horse, generations: u32, path: &mut Vec<Id>) -> HorseTree {
        let mut node = HorseTree::leaf(horse);
        if generations == 0 {
            return node;
        }

        path.push(horse.id);
        node.father = self
            .parent_on_path(horse.father_id, path)
            .map(|father| Box::new(self.build_node(father, generations - 1, path)));
        node.mother = self
            .parent_on_path(horse.mother_id, path)
            .map(|mother| Box::new(self.build_node(mother, generations - 1, path)));
        path.pop();
        node
    }

    fn parent_on_path(&self, id: Option<Id>, path: &[Id]) -> Option<&Horse> {
        let parent = self.get(id)?;
        if path.contains(&parent.id) {
            log::warn!("Horse {} is its own ancestor; lineage cut", parent.id);
            return None;
        }
        Some(parent)
    }
}

pub struct AncestorResolver;

impl AncestorResolver {
    /// Family tree of `root_id` reaching back `max_generations` generations
    /// (0 yields the root alone).
    pub async fn resolve<S: HorseStore + ?Sized>(
        store: &S,
        root_id: Id,
        max_generations: i64,
    ) -> ServiceResult<HorseTree> {
        if max_generations < 0 {
            return Err(ServiceError::InvalidArgument(format!(
                "Generations must be a non-negative number, got {}",
                max_generations
            )));
        }
        let generations = u32::try_from(max_generations).map_err(|_| {
            ServiceError::InvalidArgument(format!(
                "Generations must be at most {}, got {}",
                u32::MAX,
                max_generations
            ))
        })?;

        let closure = store
            .get_ancestors(root_id, generations)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("No horse with ID {} found", root_id)))?;

        let pool = AncestorPool::new(closure);
        log::debug!(
            "Resolved {} ancestor records for horse {} over {} generations",
            pool.len(),
            root_id,
            generations
        );

        let root = pool.get(Some(root_id)).ok_or_else(|| {
            ServiceError::fatal(format!(
                "Ancestor closure of horse {} does not include the horse itself",
                root_id
            ))
        })?;

        Ok(pool.build_tree(root, generations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sex;
    use crate::store::MemoryStore;
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

    /// Five generations: 1 is the youngest, 10 the oldest. Horse 8 is both the father
    /// of 6 and of 7, so it appears twice in the tree of 1.
    fn pedigree() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_horse(horse(10, Sex::Male, 1980, None, None));
        store.insert_horse(horse(9, Sex::Female, 1985, None, None));
        store.insert_horse(horse(8, Sex::Male, 1990, Some(10), Some(9)));
        store.insert_horse(horse(7, Sex::Female, 1995, Some(8), None));
        store.insert_horse(horse(6, Sex::Male, 1995, Some(8), None));
        store.insert_horse(horse(5, Sex::Female, 2000, Some(6), Some(7)));
        store.insert_horse(horse(4, Sex::Male, 2000, None, None));
        store.insert_horse(horse(3, Sex::Female, 2005, None, Some(5)));
        store.insert_horse(horse(2, Sex::Male, 2005, Some(4), None));
        store.insert_horse(horse(1, Sex::Female, 2010, Some(2), Some(3)));
        store
    }

    fn contains(tree: &HorseTree, id: Id) -> bool {
        tree.id == id
            || tree.father.as_deref().is_some_and(|f| contains(f, id))
            || tree.mother.as_deref().is_some_and(|m| contains(m, id))
    }

    fn count(tree: &HorseTree, id: Id) -> usize {
        usize::from(tree.id == id)
            + tree.father.as_deref().map_or(0, |f| count(f, id))
            + tree.mother.as_deref().map_or(0, |m| count(m, id))
    }

    #[tokio::test]
    async fn zero_generations_yields_the_root_alone() {
        let store = pedigree();
        let tree = AncestorResolver::resolve(&store, 1, 0).await.unwrap();

        assert_eq!(tree.id, 1);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.father.is_none());
        assert!(tree.mother.is_none());
    }

    #[tokio::test]
    async fn tree_never_exceeds_the_generation_bound() {
        let store = pedigree();
        for generations in 0..8 {
            let tree = AncestorResolver::resolve(&store, 1, generations).await.unwrap();
            assert_eq!(tree.id, 1);
            assert!(tree.depth() <= generations as usize);
        }
    }

    #[tokio::test]
    async fn generation_bound_cuts_the_tree() {
        let store = pedigree();

        let two = AncestorResolver::resolve(&store, 1, 2).await.unwrap();
        assert_eq!(two.depth(), 2);
        assert!(contains(&two, 5));
        assert!(!contains(&two, 6));

        let all = AncestorResolver::resolve(&store, 1, 10).await.unwrap();
        assert_eq!(all.depth(), 5);
        assert!(contains(&all, 10));
    }

    #[tokio::test]
    async fn shared_ancestor_appears_on_every_lineage_path() {
        let store = pedigree();
        let tree = AncestorResolver::resolve(&store, 5, 3).await.unwrap();

        assert_eq!(count(&tree, 8), 2);
        assert_eq!(count(&tree, 10), 2);
        assert_eq!(count(&tree, 9), 2);
    }

    #[tokio::test]
    async fn larger_bound_than_pedigree_depth_changes_nothing() {
        let store = MemoryStore::new();
        store.insert_horse(horse(2, Sex::Male, 2000, None, None));
        store.insert_horse(horse(3, Sex::Female, 2000, None, None));
        store.insert_horse(horse(1, Sex::Male, 2010, Some(2), Some(3)));

        let five = AncestorResolver::resolve(&store, 1, 5).await.unwrap();
        let two = AncestorResolver::resolve(&store, 1, 2).await.unwrap();
        assert_eq!(five, two);
        assert_eq!(five.node_count(), 3);
    }

    #[tokio::test]
    async fn dangling_parent_reference_ends_the_branch() {
        let store = MemoryStore::new();
        store.insert_horse(horse(3, Sex::Female, 2000, None, None));
        store.insert_horse(horse(1, Sex::Male, 2010, Some(42), Some(3)));

        let tree = AncestorResolver::resolve(&store, 1, 3).await.unwrap();
        assert!(tree.father.is_none());
        assert_eq!(tree.mother.as_ref().map(|m| m.id), Some(3));
    }

    #[tokio::test]
    async fn unknown_root_is_not_found() {
        let store = pedigree();
        let err = AncestorResolver::resolve(&store, 404, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn negative_generations_are_rejected() {
        let store = pedigree();
        let err = AncestorResolver::resolve(&store, 1, -1).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
        assert!(err.to_string().contains("non-negative"));
    }

    #[tokio::test]
    async fn oversized_generations_are_rejected_as_too_large() {
        let store = pedigree();
        let err = AncestorResolver::resolve(&store, 1, i64::from(u32::MAX) + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
        assert!(err.to_string().contains("at most 4294967295"));

        let tree = AncestorResolver::resolve(&store, 1, i64::from(u32::MAX)).await.unwrap();
        assert_eq!(tree.depth(), 5);
    }

    #[tokio::test]
    async fn cyclic_lineage_ends_instead_of_recursing() {
        let store = MemoryStore::new();
        store.insert_horse(horse(1, Sex::Male, 2010, Some(2), None));
        store.insert_horse(horse(2, Sex::Male, 2010, Some(1), None));

        let tree = AncestorResolver::resolve(&store, 1, 5_000_000).await.unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.father.as_ref().map(|f| f.id), Some(2));
        assert!(tree.father.as_deref().is_some_and(|f| f.father.is_none()));
    }

    #[tokio::test]
    async fn deep_line_with_huge_bound_resolves_every_generation() {
        let store = MemoryStore::new();
        store.insert_horse(horse(1, Sex::Male, 1000, None, None));
        for id in 2..=1000 {
            store.insert_horse(horse(id, Sex::Male, 1000 + id as i32, Some(id - 1), None));
        }

        let tree = AncestorResolver::resolve(&store, 1000, 5_000_000).await.unwrap();
        assert_eq!(tree.depth(), 999);
        assert_eq!(tree.node_count(), 1000);
    }

    #[test]
    fn pool_lookup_is_not_consuming() {
        let pool = AncestorPool::new(vec![horse(1, Sex::Male, 2000, None, None)]);
        assert!(pool.get(Some(1)).is_some());
        assert!(pool.get(Some(1)).is_some());
        assert!(pool.get(None).is_none());
        assert_eq!(pool.len(), 1);
        assert!(!pool.is_empty());
    }
}
