use entity::employees;
use platform_db::{EmployeeDraft, EmployeeStore};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmployeeError {
    #[error("Employee already exists!!")]
    DuplicateEmail,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Business rules over the employee store. Holds no state beyond the store handle
/// injected at construction.
#[derive(Clone)]
pub struct EmployeeService<S> {
    store: S,
}

impl<S: EmployeeStore> EmployeeService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a new employee. Fails with [`EmployeeError::DuplicateEmail`] when the
    /// email is already taken, without writing anything. The check-then-write is
    /// not atomic; a racing create can still hit the unique index, and that
    /// conflict maps onto the same error.
    pub async fn create(&self, draft: EmployeeDraft) -> Result<employees::Model, EmployeeError> {
        if self.store.find_by_email(&draft.email).await?.is_some() {
            return Err(EmployeeError::DuplicateEmail);
        }
        self.store.save(draft).await.map_err(|err| {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                EmployeeError::DuplicateEmail
            } else {
                EmployeeError::Db(err)
            }
        })
    }

    pub async fn list_all(&self) -> Result<Vec<employees::Model>, EmployeeError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<employees::Model>, EmployeeError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Overwrite an existing row. No duplicate-email re-check happens here; the
    /// HTTP layer merges the payload onto a row it fetched first, so the id is
    /// already known to be valid.
    pub async fn update(
        &self,
        employee: employees::Model,
    ) -> Result<employees::Model, EmployeeError> {
        Ok(self.store.save(EmployeeDraft::from(employee)).await?)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), EmployeeError> {
        Ok(self.store.delete_by_id(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicI64, AtomicU32, Ordering},
    };

    use super::*;

    /// In-memory store double. Counts `save` calls so tests can assert that a
    /// rejected create never wrote.
    #[derive(Default)]
    struct MemStore {
        rows: Mutex<Vec<employees::Model>>,
        next_id: AtomicI64,
        save_calls: AtomicU32,
    }

    impl MemStore {
        fn with_rows(rows: Vec<employees::Model>) -> Self {
            let next_id = rows.iter().map(|row| row.id).max().unwrap_or(0);
            Self {
                rows: Mutex::new(rows),
                next_id: AtomicI64::new(next_id),
                save_calls: AtomicU32::new(0),
            }
        }

        fn saves(&self) -> u32 {
            self.save_calls.load(Ordering::SeqCst)
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    fn row(id: i64, first: &str, last: &str, email: &str) -> employees::Model {
        employees::Model {
            id,
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
        }
    }

    impl EmployeeStore for &MemStore {
        async fn save(&self, draft: EmployeeDraft) -> Result<employees::Model, DbErr> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            let model = match draft.id {
                Some(id) => {
                    let model = row(id, &draft.first_name, &draft.last_name, &draft.email);
                    match rows.iter_mut().find(|existing| existing.id == id) {
                        Some(existing) => *existing = model.clone(),
                        None => rows.push(model.clone()),
                    }
                    model
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                    let model = row(id, &draft.first_name, &draft.last_name, &draft.email);
                    rows.push(model.clone());
                    model
                }
            };
            Ok(model)
        }

        async fn find_all(&self) -> Result<Vec<employees::Model>, DbErr> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<employees::Model>, DbErr> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|row| row.id == id)
                .cloned())
        }

        async fn delete_by_id(&self, id: i64) -> Result<(), DbErr> {
            self.rows.lock().unwrap().retain(|row| row.id != id);
            Ok(())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<employees::Model>, DbErr> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|row| row.email == email)
                .cloned())
        }

        async fn find_by_name(
            &self,
            first_name: &str,
            last_name: &str,
        ) -> Result<Option<employees::Model>, DbErr> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|row| row.first_name == first_name && row.last_name == last_name)
                .min_by_key(|row| row.id)
                .cloned())
        }

        async fn find_by_name_sql(
            &self,
            first_name: &str,
            last_name: &str,
        ) -> Result<Option<employees::Model>, DbErr> {
            self.find_by_name(first_name, last_name).await
        }
    }

    #[tokio::test]
    async fn create_returns_saved_employee_with_id() {
        let store = MemStore::default();
        let service = EmployeeService::new(&store);

        let created = service
            .create(EmployeeDraft::new("Ashwin", "Singh", "ashwin@example.com"))
            .await
            .unwrap();

        assert!(created.id > 0);
        assert_eq!(created.email, "ashwin@example.com");
    }

    #[tokio::test]
    async fn create_with_taken_email_fails_without_saving() {
        let store = MemStore::with_rows(vec![row(1, "Ashwin", "Singh", "ashwin@example.com")]);
        let service = EmployeeService::new(&store);

        let err = service
            .create(EmployeeDraft::new("Impostor", "Singh", "ashwin@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, EmployeeError::DuplicateEmail));
        assert_eq!(err.to_string(), "Employee already exists!!");
        assert_eq!(store.saves(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn list_all_returns_every_row() {
        let store = MemStore::with_rows(vec![
            row(1, "Ashwin", "Singh", "ashwin@example.com"),
            row(2, "Rahul", "Kumar", "rahul@example.com"),
        ]);
        let service = EmployeeService::new(&store);

        let all = service.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn list_all_on_empty_store_returns_empty_vec() {
        let store = MemStore::default();
        let service = EmployeeService::new(&store);

        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_by_id_returns_row_or_none() {
        let store = MemStore::with_rows(vec![row(1, "Ashwin", "Singh", "ashwin@example.com")]);
        let service = EmployeeService::new(&store);

        assert_eq!(service.get_by_id(1).await.unwrap().unwrap().id, 1);
        assert!(service.get_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_keeps_id_and_applies_fields() {
        let store = MemStore::with_rows(vec![row(1, "Ashwin", "Singh", "ashwin@example.com")]);
        let service = EmployeeService::new(&store);

        let updated = service
            .update(row(1, "Ashwin", "Rathore", "ashwin@gmail.com"))
            .await
            .unwrap();

        assert_eq!(updated.id, 1);
        assert_eq!(updated.last_name, "Rathore");
        assert_eq!(updated.email, "ashwin@gmail.com");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_delegates_to_store() {
        let store = MemStore::with_rows(vec![row(1, "Ashwin", "Singh", "ashwin@example.com")]);
        let service = EmployeeService::new(&store);

        service.delete_by_id(1).await.unwrap();
        assert_eq!(store.len(), 0);

        // Absent ids delete without error.
        service.delete_by_id(1).await.unwrap();
    }
}
