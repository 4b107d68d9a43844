use entity::employees;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, Statement, TryIntoModel,
};

use crate::DbPool;

/// Employee fields ahead of persistence. A draft without an id inserts and lets the
/// store assign one; a draft with an id overwrites that row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl EmployeeDraft {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }
}

impl From<employees::Model> for EmployeeDraft {
    fn from(model: employees::Model) -> Self {
        Self {
            id: Some(model.id),
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
        }
    }
}

/// Persistence interface for employee rows. The service takes an implementation at
/// construction, so tests can substitute an in-memory store.
///
/// The name lookups return the first match in ascending id order, or `None` when
/// nothing matches. `find_by_name` goes through the query builder;
/// `find_by_name_sql` issues the equivalent parametrized raw SQL.
pub trait EmployeeStore {
    fn save(
        &self,
        draft: EmployeeDraft,
    ) -> impl Future<Output = Result<employees::Model, DbErr>> + Send;
    fn find_all(&self) -> impl Future<Output = Result<Vec<employees::Model>, DbErr>> + Send;
    fn find_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<employees::Model>, DbErr>> + Send;
    fn delete_by_id(&self, id: i64) -> impl Future<Output = Result<(), DbErr>> + Send;
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<employees::Model>, DbErr>> + Send;
    fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> impl Future<Output = Result<Option<employees::Model>, DbErr>> + Send;
    fn find_by_name_sql(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> impl Future<Output = Result<Option<employees::Model>, DbErr>> + Send;
}

/// SeaORM-backed employee store.
#[derive(Clone)]
pub struct DbEmployeeStore {
    pool: DbPool,
}

impl DbEmployeeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EmployeeStore for DbEmployeeStore {
    async fn save(&self, draft: EmployeeDraft) -> Result<employees::Model, DbErr> {
        let model = employees::ActiveModel {
            id: draft.id.map_or(NotSet, Set),
            first_name: Set(draft.first_name),
            last_name: Set(draft.last_name),
            email: Set(draft.email),
        };
        // Inserts when the id is unset, updates that row otherwise.
        model.save(&self.pool).await?.try_into_model()
    }

    async fn find_all(&self) -> Result<Vec<employees::Model>, DbErr> {
        employees::Entity::find()
            .order_by_asc(employees::Column::Id)
            .all(&self.pool)
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<employees::Model>, DbErr> {
        employees::Entity::find_by_id(id).one(&self.pool).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DbErr> {
        employees::Entity::delete_by_id(id)
            .exec(&self.pool)
            .await
            .map(|_| ())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<employees::Model>, DbErr> {
        employees::Entity::find()
            .filter(employees::Column::Email.eq(email))
            .one(&self.pool)
            .await
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<employees::Model>, DbErr> {
        employees::Entity::find()
            .filter(employees::Column::FirstName.eq(first_name))
            .filter(employees::Column::LastName.eq(last_name))
            .order_by_asc(employees::Column::Id)
            .one(&self.pool)
            .await
    }

    async fn find_by_name_sql(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<employees::Model>, DbErr> {
        let backend = self.pool.get_database_backend();
        let sql = match backend {
            DatabaseBackend::Postgres => {
                "SELECT id, first_name, last_name, email FROM employees \
                 WHERE first_name = $1 AND last_name = $2 ORDER BY id"
            }
            _ => {
                "SELECT id, first_name, last_name, email FROM employees \
                 WHERE first_name = ? AND last_name = ? ORDER BY id"
            }
        };
        employees::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                backend,
                sql,
                [first_name.into(), last_name.into()],
            ))
            .one(&self.pool)
            .await
    }
}
