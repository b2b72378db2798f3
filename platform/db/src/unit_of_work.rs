use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use tracing::{debug, warn};

use crate::{
    catalogs::{DepartmentRepository, JobTitleRepository},
    employees::EmployeeRepository,
    repository::PendingChange,
};

/// Groups repository writes into one atomic save.
///
/// Repositories are created on demand and share the unit's connection and
/// change list. [`save_changes`](Self::save_changes) opens a database
/// transaction, stamps audit timestamps, applies every staged write and
/// commits; any failure rolls the whole batch back and surfaces the native
/// [`DbErr`].
///
/// [`begin_transaction`](Self::begin_transaction) widens the boundary for
/// multi-step operations: saves made afterwards are held until
/// [`commit_transaction`](Self::commit_transaction) applies them together, or
/// [`rollback_transaction`](Self::rollback_transaction) drops them.
pub struct UnitOfWork {
    db: DatabaseConnection,
    pending: Vec<PendingChange>,
    held: Option<Vec<PendingChange>>,
}

impl UnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            pending: Vec::new(),
            held: None,
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn employees(&mut self) -> EmployeeRepository<'_> {
        EmployeeRepository::new(&self.db, &mut self.pending)
    }

    pub fn departments(&mut self) -> DepartmentRepository<'_> {
        DepartmentRepository::new(&self.db, &mut self.pending)
    }

    pub fn job_titles(&mut self) -> JobTitleRepository<'_> {
        JobTitleRepository::new(&self.db, &mut self.pending)
    }

    pub fn pending_changes(&self) -> usize {
        self.pending.len() + self.held.as_ref().map_or(0, Vec::len)
    }

    pub fn in_transaction(&self) -> bool {
        self.held.is_some()
    }

    /// Persists staged changes and returns the number of affected rows.
    ///
    /// Inside an explicit transaction the changes are handed to the
    /// transaction instead and the number of accepted changes is returned.
    pub async fn save_changes(&mut self) -> Result<u64, DbErr> {
        let changes = std::mem::take(&mut self.pending);
        if let Some(held) = self.held.as_mut() {
            let accepted = changes.len() as u64;
            held.extend(changes);
            return Ok(accepted);
        }
        apply_all(&self.db, changes).await
    }

    pub fn begin_transaction(&mut self) -> Result<(), DbErr> {
        if self.held.is_some() {
            return Err(DbErr::Custom("transaction already in progress".into()));
        }
        self.held = Some(Vec::new());
        Ok(())
    }

    /// Applies everything saved since [`begin_transaction`](Self::begin_transaction)
    /// plus anything still staged, atomically.
    pub async fn commit_transaction(&mut self) -> Result<u64, DbErr> {
        let Some(mut held) = self.held.take() else {
            return Err(DbErr::Custom("no transaction in progress".into()));
        };
        held.append(&mut self.pending);
        apply_all(&self.db, held).await
    }

    pub fn rollback_transaction(&mut self) {
        let dropped = self.pending.len() + self.held.take().map_or(0, |held| held.len());
        self.pending.clear();
        if dropped > 0 {
            warn!(dropped, "unit of work rolled back");
        }
    }
}

async fn apply_all(db: &DatabaseConnection, changes: Vec<PendingChange>) -> Result<u64, DbErr> {
    if changes.is_empty() {
        return Ok(0);
    }
    let now = Utc::now().fixed_offset();
    let total = changes.len();
    let txn = db.begin().await?;
    let mut affected = 0;
    for change in changes {
        affected += change.apply(&txn, now).await?;
    }
    txn.commit().await?;
    debug!(changes = total, affected, "unit of work saved");
    Ok(affected)
}
