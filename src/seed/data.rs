use crate::model::{Horse, Id, NewHorse, NewOwner, Owner, Sex};
use crate::store::traits::Store;
use anyhow::{Context, Result};
use chrono::NaiveDate;

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("Invalid seed date {}-{}-{}", year, month, day))
}

fn id_of(horse: Option<&Horse>) -> Option<Id> {
    horse.map(|h| h.id)
}

async fn create_owner<S: Store>(
    store: &S,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
) -> Result<Owner> {
    store
        .create_owner(NewOwner {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.map(str::to_string),
        })
        .await
}

/// Seed row for one horse; parents and owner refer to records created earlier.
struct SeedHorse<'a> {
    name: &'a str,
    description: Option<&'a str>,
    born: (i32, u32, u32),
    sex: Sex,
    owner: Option<&'a Owner>,
    father: Option<&'a Horse>,
    mother: Option<&'a Horse>,
}

async fn create_horse<S: Store>(store: &S, seed: SeedHorse<'_>) -> Result<Horse> {
    let (year, month, day) = seed.born;
    store
        .create_horse(NewHorse {
            name: seed.name.to_string(),
            description: seed.description.map(str::to_string),
            date_of_birth: date(year, month, day)?,
            sex: seed.sex,
            owner_id: seed.owner.map(|o| o.id),
            father_id: id_of(seed.father),
            mother_id: id_of(seed.mother),
        })
        .await
}

/// Load a demo stud book: three owners and four generations of horses. Maestoso Basilica
/// sires both parents of Mercurio Bella, so he appears twice in her pedigree.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    let huber = create_owner(store, "Anna", "Huber", Some("anna.huber@example.at")).await?;
    let gruber = create_owner(store, "Johann", "Gruber", Some("j.gruber@example.at")).await?;
    let steiner = create_owner(store, "Maria", "Steiner", None).await?;

    let primo = create_horse(
        store,
        SeedHorse {
            name: "Conversano Primo",
            description: Some("Foundation sire of the line"),
            born: (1994, 4, 12),
            sex: Sex::Male,
            owner: None,
            father: None,
            mother: None,
        },
    )
    .await?;
    let bona = create_horse(
        store,
        SeedHorse {
            name: "Bona",
            description: None,
            born: (1995, 5, 3),
            sex: Sex::Female,
            owner: None,
            father: None,
            mother: None,
        },
    )
    .await?;
    let allegro = create_horse(
        store,
        SeedHorse {
            name: "Neapolitano Allegro",
            description: None,
            born: (1996, 3, 21),
            sex: Sex::Male,
            owner: Some(&gruber),
            father: None,
            mother: None,
        },
    )
    .await?;
    let capriola = create_horse(
        store,
        SeedHorse {
            name: "Siglavy Capriola",
            description: Some("Grey mare, excellent temperament"),
            born: (1997, 6, 30),
            sex: Sex::Female,
            owner: Some(&gruber),
            father: None,
            mother: None,
        },
    )
    .await?;

    let basilica = create_horse(
        store,
        SeedHorse {
            name: "Maestoso Basilica",
            description: Some("Stallion shared by two breeding lines"),
            born: (2001, 4, 2),
            sex: Sex::Male,
            owner: Some(&huber),
            father: Some(&primo),
            mother: Some(&bona),
        },
    )
    .await?;
    let gratia = create_horse(
        store,
        SeedHorse {
            name: "Favory Gratia",
            description: None,
            born: (2002, 5, 17),
            sex: Sex::Female,
            owner: Some(&huber),
            father: Some(&allegro),
            mother: Some(&capriola),
        },
    )
    .await?;
    let theodorosta = create_horse(
        store,
        SeedHorse {
            name: "Pluto Theodorosta",
            description: None,
            born: (2004, 4, 9),
            sex: Sex::Female,
            owner: Some(&steiner),
            father: None,
            mother: Some(&capriola),
        },
    )
    .await?;

    let bella = create_horse(
        store,
        SeedHorse {
            name: "Maestoso Bella",
            description: None,
            born: (2006, 3, 28),
            sex: Sex::Female,
            owner: Some(&huber),
            father: Some(&basilica),
            mother: Some(&gratia),
        },
    )
    .await?;
    let mercurio = create_horse(
        store,
        SeedHorse {
            name: "Conversano Mercurio",
            description: Some("Dressage champion"),
            born: (2007, 5, 5),
            sex: Sex::Male,
            owner: Some(&steiner),
            father: Some(&basilica),
            mother: Some(&theodorosta),
        },
    )
    .await?;

    let foal = create_horse(
        store,
        SeedHorse {
            name: "Mercurio Bella",
            description: Some("Youngest of the line"),
            born: (2013, 4, 20),
            sex: Sex::Female,
            owner: Some(&huber),
            father: Some(&mercurio),
            mother: Some(&bella),
        },
    )
    .await?;

    log::info!("Seeded demo stud book up to {} (ID {})", foal.name, foal.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::HorseService;
    use crate::model::{HorseSearch, HorseTree};
    use crate::store::MemoryStore;

    fn count(tree: &HorseTree, name: &str) -> usize {
        usize::from(tree.name == name)
            + tree.father.as_deref().map_or(0, |f| count(f, name))
            + tree.mother.as_deref().map_or(0, |m| count(m, name))
    }

    #[tokio::test]
    async fn seeded_pedigree_shares_an_ancestor() {
        let store = MemoryStore::new();
        load_seed_data(&store).await.unwrap();
        assert_eq!(store.horse_count(), 10);

        let search = HorseSearch {
            name: Some("mercurio bella".to_string()),
            ..HorseSearch::default()
        };
        let found = HorseService::search(&store, &search).await.unwrap();
        assert_eq!(found.len(), 1);

        let tree = HorseService::ancestors(&store, found[0].id, 4).await.unwrap();
        assert_eq!(tree.depth(), 3);
        assert_eq!(count(&tree, "Maestoso Basilica"), 2);
        assert_eq!(count(&tree, "Siglavy Capriola"), 2);
    }
}
