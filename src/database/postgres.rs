use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::profile::ProfileRow;
use crate::database::models::{Client, ClientPatch, ClientSummary, NewClient, Profile, ProfilePatch};
use crate::database::store::{ClientStore, ProfileStore};

const PROFILE_COLUMNS: &str =
    "id, full_name, email, role, active, must_change_password, created_at";

const CLIENT_COLUMNS: &str = "id, owner_id, user_id, full_name, email, phone, cpf, cep, street, \
     number, neighborhood, city, state, companion_name, companion_phone, situation, dpp, \
     baby_names, plan, amount, payment_method, payment_type, notes, status, created_at";

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Profile>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC",
            PROFILE_COLUMNS
        );
        let rows: Vec<ProfileRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;
        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn update(&self, id: Uuid, patch: &ProfilePatch) -> Result<Option<Profile>, DatabaseError> {
        let query = format!(
            "UPDATE profiles SET \
                role = COALESCE($2, role), \
                active = COALESCE($3, active), \
                must_change_password = COALESCE($4, must_change_password) \
             WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        );
        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(patch.role.map(|r| r.as_str()))
            .bind(patch.active)
            .bind(patch.must_change_password)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Profile::try_from).transpose()
    }
}

pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique/foreign-key/not-null violations to `Constraint`
fn classify(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.code().as_deref(), Some("23505") | Some("23503") | Some("23502")) {
            return DatabaseError::Constraint(db.message().to_string());
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn list_with_email(&self) -> Result<Vec<ClientSummary>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClientSummary>(
            "SELECT c.id, c.created_at, c.full_name, c.dpp, c.status, COALESCE(p.email, '') AS email \
             FROM clients c LEFT JOIN profiles p ON p.id = c.user_id \
             ORDER BY c.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_owned(&self, owner: Uuid) -> Result<Vec<Client>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM clients WHERE owner_id = $1 ORDER BY created_at DESC",
            CLIENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Client>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> Result<Option<Client>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM clients WHERE owner_id = $1 AND id = $2",
            CLIENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Client>(&query)
            .bind(owner)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_linked(&self, user_id: Uuid) -> Result<Option<Client>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM clients WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
            CLIENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Client>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, new: &NewClient) -> Result<Client, DatabaseError> {
        let f = &new.fields;
        let full_name = f
            .full_name
            .as_deref()
            .ok_or_else(|| DatabaseError::Constraint("full_name is required".to_string()))?;

        let query = format!(
            "INSERT INTO clients (owner_id, user_id, full_name, email, phone, cpf, cep, street, \
                number, neighborhood, city, state, companion_name, companion_phone, situation, \
                dpp, baby_names, plan, amount, payment_method, payment_type, notes, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                $17, $18, $19, $20, $21, $22, $23) \
             RETURNING {}",
            CLIENT_COLUMNS
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(new.owner_id)
            .bind(new.user_id)
            .bind(full_name)
            .bind(&f.email)
            .bind(&f.phone)
            .bind(&f.cpf)
            .bind(&f.cep)
            .bind(&f.street)
            .bind(&f.number)
            .bind(&f.neighborhood)
            .bind(&f.city)
            .bind(&f.state)
            .bind(&f.companion_name)
            .bind(&f.companion_phone)
            .bind(&f.situation)
            .bind(f.dpp)
            .bind(&f.baby_names)
            .bind(&f.plan)
            .bind(f.amount)
            .bind(&f.payment_method)
            .bind(&f.payment_type)
            .bind(&f.notes)
            .bind(new.status())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &ClientPatch,
    ) -> Result<Option<Client>, DatabaseError> {
        if patch.is_empty() {
            return self.find_owned(owner, id).await;
        }

        // Only the columns the patch carries; `Some(None)` binds NULL
        let mut query = QueryBuilder::<Postgres>::new("UPDATE clients SET ");
        {
            let mut set = query.separated(", ");
            macro_rules! assign {
                ($($field:ident),*) => {
                    $( if let Some(v) = &patch.$field {
                        set.push(concat!(stringify!($field), " = ")).push_bind_unseparated(v);
                    } )*
                };
            }
            assign!(
                full_name, email, phone, cpf, cep, street, number, neighborhood, city, state,
                companion_name, companion_phone, situation, dpp, baby_names, plan, amount,
                payment_method, payment_type, notes, status
            );
        }
        query
            .push(" WHERE owner_id = ")
            .push_bind(owner)
            .push(" AND id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(CLIENT_COLUMNS);

        query
            .build_query_as::<Client>()
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM clients WHERE owner_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
