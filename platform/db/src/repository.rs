use async_trait::async_trait;
use entity::{Audited, department, employee, job_title};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, PrimaryKeyTrait, QueryFilter,
    prelude::DateTimeWithTimeZone,
};

/// Data access shared by every entity repository.
///
/// Reads hit the database immediately. Writes are staged on the owning
/// [`UnitOfWork`](crate::UnitOfWork) and only reach the database when it saves.
#[async_trait]
pub trait Repository {
    type Model: Send;
    type ActiveModel: Send;

    async fn get_by_id(&self, id: i32) -> Result<Option<Self::Model>, DbErr>;
    async fn get_all(&self) -> Result<Vec<Self::Model>, DbErr>;
    async fn exists(&self, condition: Condition) -> Result<bool, DbErr>;
    async fn count(&self) -> Result<u64, DbErr>;

    fn add(&mut self, model: Self::ActiveModel);
    fn update(&mut self, model: Self::ActiveModel);
    fn delete(&mut self, id: i32);
}

#[derive(Clone, Debug)]
pub enum Change<A> {
    Insert(A),
    Update(A),
    Delete(i32),
}

/// A staged write waiting for [`UnitOfWork::save_changes`](crate::UnitOfWork::save_changes).
#[derive(Clone, Debug)]
pub enum PendingChange {
    Employee(Change<employee::ActiveModel>),
    Department(Change<department::ActiveModel>),
    JobTitle(Change<job_title::ActiveModel>),
}

impl PendingChange {
    pub(crate) async fn apply(
        self,
        txn: &DatabaseTransaction,
        now: DateTimeWithTimeZone,
    ) -> Result<u64, DbErr> {
        match self {
            PendingChange::Employee(change) => {
                apply_change::<employee::Entity, _>(txn, change, now).await
            }
            PendingChange::Department(change) => {
                apply_change::<department::Entity, _>(txn, change, now).await
            }
            PendingChange::JobTitle(change) => {
                apply_change::<job_title::Entity, _>(txn, change, now).await
            }
        }
    }
}

async fn apply_change<E, A>(
    txn: &DatabaseTransaction,
    change: Change<A>,
    now: DateTimeWithTimeZone,
) -> Result<u64, DbErr>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Audited + Send,
    E::Model: IntoActiveModel<A>,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    match change {
        Change::Insert(mut model) => {
            model.stamp_created(now);
            model.insert(txn).await?;
            Ok(1)
        }
        Change::Update(mut model) => {
            model.stamp_updated(now);
            model.update(txn).await?;
            Ok(1)
        }
        Change::Delete(id) => {
            let result = E::delete_by_id(id).exec(txn).await?;
            Ok(result.rows_affected)
        }
    }
}

pub(crate) async fn exists_where<E, C>(db: &C, condition: Condition) -> Result<bool, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let matches = E::find().filter(condition).count(db).await?;
    Ok(matches > 0)
}
