use anyhow::{Context, Result};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, QueryBuilder, Row,
};

use crate::model::{Horse, HorseSearch, Id, NewHorse, NewOwner, Owner, OwnerSearch, Sex};
use crate::store::traits::{HorseStore, OwnerStore};

const HORSE_COLUMNS: &str =
    "id, name, description, date_of_birth, sex, owner_id, father_id, mother_id";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

fn horse_from_row(row: &PgRow) -> Result<Horse> {
    let sex: String = row.try_get("sex")?;
    Ok(Horse {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        date_of_birth: row.try_get("date_of_birth")?,
        sex: sex.parse::<Sex>()?,
        owner_id: row.try_get("owner_id")?,
        father_id: row.try_get("father_id")?,
        mother_id: row.try_get("mother_id")?,
    })
}

fn owner_from_row(row: &PgRow) -> Result<Owner> {
    Ok(Owner {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
    })
}

/// Substring pattern for `ILIKE .. ESCAPE '\'`; wildcards in `value` match literally.
fn like(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait::async_trait]
impl HorseStore for PostgresStore {
    async fn get_horse(&self, id: Id) -> Result<Option<Horse>> {
        let row = sqlx::query(&format!("SELECT {} FROM horse WHERE id = $1", HORSE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch horse")?;

        row.as_ref().map(horse_from_row).transpose()
    }

    async fn search_horses(&self, search: &HorseSearch) -> Result<Vec<Horse>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM horse WHERE 1 = 1", HORSE_COLUMNS));

        if let Some(name) = &search.name {
            query
                .push(" AND name ILIKE ")
                .push_bind(like(name))
                .push(" ESCAPE '\\'");
        }
        if let Some(description) = &search.description {
            query
                .push(" AND description ILIKE ")
                .push_bind(like(description))
                .push(" ESCAPE '\\'");
        }
        if let Some(sex) = search.sex {
            query.push(" AND sex = ").push_bind(sex.as_str());
        }
        if let Some(born_before) = search.born_before {
            query.push(" AND date_of_birth <= ").push_bind(born_before);
        }
        if let Some(owner_name) = &search.owner_name {
            query
                .push(" AND owner_id IN (SELECT id FROM owner WHERE (first_name || ' ' || last_name) ILIKE ")
                .push_bind(like(owner_name))
                .push(" ESCAPE '\\')");
        }
        query.push(" ORDER BY id");
        if let Some(limit) = search.limit {
            query.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to search horses")?;

        rows.iter().map(horse_from_row).collect()
    }

    async fn get_ancestors(&self, root_id: Id, max_generations: u32) -> Result<Option<Vec<Horse>>> {
        let rows = sqlx::query(&format!(
            r#"
            WITH RECURSIVE ancestors (id, generation, path) AS (
                SELECT id, 0, ARRAY[id] FROM horse WHERE id = $1
                UNION ALL
                SELECT parent.id, ancestors.generation + 1, ancestors.path || parent.id
                FROM ancestors
                JOIN horse child ON child.id = ancestors.id
                JOIN horse parent ON parent.id = child.father_id OR parent.id = child.mother_id
                WHERE ancestors.generation < $2
                  AND NOT parent.id = ANY(ancestors.path)
            )
            SELECT {} FROM horse
            WHERE id IN (SELECT id FROM ancestors)
            "#,
            HORSE_COLUMNS
        ))
        .bind(root_id)
        .bind(i64::from(max_generations))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch ancestors")?;

        if rows.is_empty() {
            return Ok(None);
        }

        let horses = rows.iter().map(horse_from_row).collect::<Result<Vec<_>>>()?;
        Ok(Some(horses))
    }

    async fn is_in_lineage(&self, id: Id, ancestor_id: Id) -> Result<bool> {
        // UNION over the id alone keeps the walk finite even over cyclic data
        let found: bool = sqlx::query_scalar(
            r#"
            WITH RECURSIVE lineage (id) AS (
                SELECT id FROM horse WHERE id = $1
                UNION
                SELECT parent.id
                FROM lineage
                JOIN horse child ON child.id = lineage.id
                JOIN horse parent ON parent.id = child.father_id OR parent.id = child.mother_id
            )
            SELECT EXISTS (SELECT 1 FROM lineage WHERE id = $2)
            "#,
        )
        .bind(id)
        .bind(ancestor_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to walk horse lineage")?;

        Ok(found)
    }

    async fn is_referenced_as_parent(&self, id: Id) -> Result<bool> {
        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM horse WHERE father_id = $1 OR mother_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check parent references")?;

        Ok(referenced)
    }

    async fn create_horse(&self, horse: NewHorse) -> Result<Horse> {
        let id: Id = sqlx::query_scalar(
            r#"
            INSERT INTO horse (name, description, date_of_birth, sex, owner_id, father_id, mother_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&horse.name)
        .bind(&horse.description)
        .bind(horse.date_of_birth)
        .bind(horse.sex.as_str())
        .bind(horse.owner_id)
        .bind(horse.father_id)
        .bind(horse.mother_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create horse")?;

        Ok(horse.into_horse(id))
    }

    async fn update_horse(&self, horse: Horse) -> Result<Option<Horse>> {
        let result = sqlx::query(
            r#"
            UPDATE horse SET
                name = $1,
                description = $2,
                date_of_birth = $3,
                sex = $4,
                owner_id = $5,
                father_id = $6,
                mother_id = $7
            WHERE id = $8
            "#,
        )
        .bind(&horse.name)
        .bind(&horse.description)
        .bind(horse.date_of_birth)
        .bind(horse.sex.as_str())
        .bind(horse.owner_id)
        .bind(horse.father_id)
        .bind(horse.mother_id)
        .bind(horse.id)
        .execute(&self.pool)
        .await
        .context("Failed to update horse")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(horse))
    }

    async fn delete_horse(&self, id: Id) -> Result<bool> {
        // parent references are cleared by ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM horse WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete horse")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl OwnerStore for PostgresStore {
    async fn get_owner(&self, id: Id) -> Result<Option<Owner>> {
        let row = sqlx::query("SELECT id, first_name, last_name, email FROM owner WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch owner")?;

        row.as_ref().map(owner_from_row).transpose()
    }

    async fn get_owners_by_ids(&self, ids: &[Id]) -> Result<Vec<Owner>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, first_name, last_name, email FROM owner WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch owners")?;

        rows.iter().map(owner_from_row).collect()
    }

    async fn search_owners(&self, search: &OwnerSearch) -> Result<Vec<Owner>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, first_name, last_name, email FROM owner WHERE (first_name || ' ' || last_name) ILIKE ",
        );
        query.push_bind(like(search.name.as_deref().unwrap_or("")));
        query.push(" ESCAPE '\\'");
        query.push(" ORDER BY id");
        if let Some(max_amount) = search.max_amount {
            query.push(" LIMIT ").push_bind(i64::from(max_amount));
        }

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to search owners")?;

        rows.iter().map(owner_from_row).collect()
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner> {
        let id: Id = sqlx::query_scalar(
            "INSERT INTO owner (first_name, last_name, email) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&owner.first_name)
        .bind(&owner.last_name)
        .bind(&owner.email)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create owner")?;

        Ok(owner.into_owner(id))
    }
}
