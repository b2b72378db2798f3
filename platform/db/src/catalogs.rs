use async_trait::async_trait;
use entity::{department, employee, job_title};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    sea_query::{Expr, Func},
};

use crate::repository::{Change, PendingChange, Repository, exists_where};

/// A catalog entry with the number of employees referencing it.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult)]
pub struct CatalogCount {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub employee_count: i64,
}

pub struct DepartmentRepository<'a> {
    db: &'a DatabaseConnection,
    pending: &'a mut Vec<PendingChange>,
}

impl<'a> DepartmentRepository<'a> {
    pub(crate) fn new(db: &'a DatabaseConnection, pending: &'a mut Vec<PendingChange>) -> Self {
        Self { db, pending }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<department::Model>, DbErr> {
        department::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(department::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(self.db)
            .await
    }

    /// All departments ordered by name, each with its employee count.
    pub async fn get_all_with_employee_count(&self) -> Result<Vec<CatalogCount>, DbErr> {
        department::Entity::find()
            .select_only()
            .column(department::Column::Id)
            .column(department::Column::Name)
            .column(department::Column::Description)
            .column_as(employee::Column::Id.count(), "employee_count")
            .join(JoinType::LeftJoin, department::Relation::Employees.def())
            .group_by(department::Column::Id)
            .group_by(department::Column::Name)
            .group_by(department::Column::Description)
            .order_by_asc(department::Column::Name)
            .into_model::<CatalogCount>()
            .all(self.db)
            .await
    }

    pub async fn get_with_employee_count(&self, id: i32) -> Result<Option<CatalogCount>, DbErr> {
        department::Entity::find()
            .select_only()
            .column(department::Column::Id)
            .column(department::Column::Name)
            .column(department::Column::Description)
            .column_as(employee::Column::Id.count(), "employee_count")
            .join(JoinType::LeftJoin, department::Relation::Employees.def())
            .filter(department::Column::Id.eq(id))
            .group_by(department::Column::Id)
            .group_by(department::Column::Name)
            .group_by(department::Column::Description)
            .into_model::<CatalogCount>()
            .one(self.db)
            .await
    }
}

#[async_trait]
impl Repository for DepartmentRepository<'_> {
    type Model = department::Model;
    type ActiveModel = department::ActiveModel;

    async fn get_by_id(&self, id: i32) -> Result<Option<department::Model>, DbErr> {
        department::Entity::find_by_id(id).one(self.db).await
    }

    async fn get_all(&self) -> Result<Vec<department::Model>, DbErr> {
        department::Entity::find()
            .order_by_asc(department::Column::Name)
            .all(self.db)
            .await
    }

    async fn exists(&self, condition: Condition) -> Result<bool, DbErr> {
        exists_where::<department::Entity, _>(self.db, condition).await
    }

    async fn count(&self) -> Result<u64, DbErr> {
        department::Entity::find().count(self.db).await
    }

    fn add(&mut self, model: department::ActiveModel) {
        self.pending
            .push(PendingChange::Department(Change::Insert(model)));
    }

    fn update(&mut self, model: department::ActiveModel) {
        self.pending
            .push(PendingChange::Department(Change::Update(model)));
    }

    fn delete(&mut self, id: i32) {
        self.pending
            .push(PendingChange::Department(Change::Delete(id)));
    }
}

pub struct JobTitleRepository<'a> {
    db: &'a DatabaseConnection,
    pending: &'a mut Vec<PendingChange>,
}

impl<'a> JobTitleRepository<'a> {
    pub(crate) fn new(db: &'a DatabaseConnection, pending: &'a mut Vec<PendingChange>) -> Self {
        Self { db, pending }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<job_title::Model>, DbErr> {
        job_title::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(job_title::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(self.db)
            .await
    }

    pub async fn get_all_with_employee_count(&self) -> Result<Vec<CatalogCount>, DbErr> {
        job_title::Entity::find()
            .select_only()
            .column(job_title::Column::Id)
            .column(job_title::Column::Name)
            .column(job_title::Column::Description)
            .column_as(employee::Column::Id.count(), "employee_count")
            .join(JoinType::LeftJoin, job_title::Relation::Employees.def())
            .group_by(job_title::Column::Id)
            .group_by(job_title::Column::Name)
            .group_by(job_title::Column::Description)
            .order_by_asc(job_title::Column::Name)
            .into_model::<CatalogCount>()
            .all(self.db)
            .await
    }
}

#[async_trait]
impl Repository for JobTitleRepository<'_> {
    type Model = job_title::Model;
    type ActiveModel = job_title::ActiveModel;

    async fn get_by_id(&self, id: i32) -> Result<Option<job_title::Model>, DbErr> {
        job_title::Entity::find_by_id(id).one(self.db).await
    }

    async fn get_all(&self) -> Result<Vec<job_title::Model>, DbErr> {
        job_title::Entity::find()
            .order_by_asc(job_title::Column::Name)
            .all(self.db)
            .await
    }

    async fn exists(&self, condition: Condition) -> Result<bool, DbErr> {
        exists_where::<job_title::Entity, _>(self.db, condition).await
    }

    async fn count(&self) -> Result<u64, DbErr> {
        job_title::Entity::find().count(self.db).await
    }

    fn add(&mut self, model: job_title::ActiveModel) {
        self.pending
            .push(PendingChange::JobTitle(Change::Insert(model)));
    }

    fn update(&mut self, model: job_title::ActiveModel) {
        self.pending
            .push(PendingChange::JobTitle(Change::Update(model)));
    }

    fn delete(&mut self, id: i32) {
        self.pending.push(PendingChange::JobTitle(Change::Delete(id)));
    }
}
