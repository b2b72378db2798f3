use std::collections::HashMap;

use async_trait::async_trait;
use entity::{EmployeeStatus, department, employee, job_title};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    sea_query::{Expr, Func},
};

use crate::repository::{Change, PendingChange, Repository, exists_where};

/// An employee together with its catalog entries.
#[derive(Clone, Debug, PartialEq)]
pub struct EmployeeDetails {
    pub employee: employee::Model,
    pub department: Option<department::Model>,
    pub job_title: Option<job_title::Model>,
}

impl EmployeeDetails {
    pub fn department_name(&self) -> &str {
        self.department.as_ref().map(|d| d.name.as_str()).unwrap_or("")
    }

    pub fn job_title_name(&self) -> &str {
        self.job_title.as_ref().map(|j| j.name.as_str()).unwrap_or("")
    }
}

/// Employee head count for one catalog entry, by name.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

pub struct EmployeeRepository<'a> {
    db: &'a DatabaseConnection,
    pending: &'a mut Vec<PendingChange>,
}

impl<'a> EmployeeRepository<'a> {
    pub(crate) fn new(db: &'a DatabaseConnection, pending: &'a mut Vec<PendingChange>) -> Self {
        Self { db, pending }
    }

    pub async fn get_by_document(&self, document: &str) -> Result<Option<employee::Model>, DbErr> {
        employee::Entity::find()
            .filter(employee::Column::Document.eq(document.trim()))
            .one(self.db)
            .await
    }

    /// Email lookups ignore case.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<employee::Model>, DbErr> {
        employee::Entity::find()
            .filter(email_matches(email))
            .one(self.db)
            .await
    }

    pub async fn get_by_document_and_email(
        &self,
        document: &str,
        email: &str,
    ) -> Result<Option<employee::Model>, DbErr> {
        employee::Entity::find()
            .filter(
                Condition::all()
                    .add(employee::Column::Document.eq(document.trim()))
                    .add(email_matches(email)),
            )
            .one(self.db)
            .await
    }

    pub async fn get_by_department(
        &self,
        department_id: i32,
    ) -> Result<Vec<employee::Model>, DbErr> {
        employee::Entity::find()
            .filter(employee::Column::DepartmentId.eq(department_id))
            .order_by_asc(employee::Column::LastNames)
            .all(self.db)
            .await
    }

    pub async fn get_by_job_title(&self, job_title_id: i32) -> Result<Vec<employee::Model>, DbErr> {
        employee::Entity::find()
            .filter(employee::Column::JobTitleId.eq(job_title_id))
            .order_by_asc(employee::Column::LastNames)
            .all(self.db)
            .await
    }

    pub async fn get_by_status(
        &self,
        status: EmployeeStatus,
    ) -> Result<Vec<employee::Model>, DbErr> {
        employee::Entity::find()
            .filter(employee::Column::Status.eq(status))
            .order_by_asc(employee::Column::LastNames)
            .all(self.db)
            .await
    }

    pub async fn get_with_details(&self, id: i32) -> Result<Option<EmployeeDetails>, DbErr> {
        match employee::Entity::find_by_id(id).one(self.db).await? {
            Some(model) => Ok(self.attach_details(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn get_by_document_with_details(
        &self,
        document: &str,
    ) -> Result<Option<EmployeeDetails>, DbErr> {
        match self.get_by_document(document).await? {
            Some(model) => Ok(self.attach_details(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Every employee ordered by last names, then first names.
    pub async fn get_all_with_details(&self) -> Result<Vec<EmployeeDetails>, DbErr> {
        let employees = employee::Entity::find()
            .order_by_asc(employee::Column::LastNames)
            .order_by_asc(employee::Column::FirstNames)
            .all(self.db)
            .await?;
        self.attach_details(employees).await
    }

    pub async fn most_recent_hires(&self, limit: u64) -> Result<Vec<EmployeeDetails>, DbErr> {
        let employees = employee::Entity::find()
            .order_by_desc(employee::Column::HireDate)
            .order_by_desc(employee::Column::Id)
            .limit(limit)
            .all(self.db)
            .await?;
        self.attach_details(employees).await
    }

    pub async fn count_by_status(&self, status: EmployeeStatus) -> Result<u64, DbErr> {
        employee::Entity::find()
            .filter(employee::Column::Status.eq(status))
            .count(self.db)
            .await
    }

    /// Employees per department name, largest first.
    pub async fn count_by_department(&self) -> Result<Vec<NamedCount>, DbErr> {
        employee::Entity::find()
            .select_only()
            .column_as(department::Column::Name, "name")
            .column_as(employee::Column::Id.count(), "count")
            .join(JoinType::InnerJoin, employee::Relation::Department.def())
            .group_by(department::Column::Name)
            .order_by_desc(employee::Column::Id.count())
            .order_by_asc(department::Column::Name)
            .into_model::<NamedCount>()
            .all(self.db)
            .await
    }

    /// Employees per job title name, largest first.
    pub async fn count_by_job_title(&self) -> Result<Vec<NamedCount>, DbErr> {
        employee::Entity::find()
            .select_only()
            .column_as(job_title::Column::Name, "name")
            .column_as(employee::Column::Id.count(), "count")
            .join(JoinType::InnerJoin, employee::Relation::JobTitle.def())
            .group_by(job_title::Column::Name)
            .order_by_desc(employee::Column::Id.count())
            .order_by_asc(job_title::Column::Name)
            .into_model::<NamedCount>()
            .all(self.db)
            .await
    }

    async fn attach_details(
        &self,
        employees: Vec<employee::Model>,
    ) -> Result<Vec<EmployeeDetails>, DbErr> {
        if employees.is_empty() {
            return Ok(Vec::new());
        }
        let departments: HashMap<i32, department::Model> = department::Entity::find()
            .all(self.db)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        let job_titles: HashMap<i32, job_title::Model> = job_title::Entity::find()
            .all(self.db)
            .await?
            .into_iter()
            .map(|j| (j.id, j))
            .collect();
        Ok(employees
            .into_iter()
            .map(|employee| EmployeeDetails {
                department: departments.get(&employee.department_id).cloned(),
                job_title: job_titles.get(&employee.job_title_id).cloned(),
                employee,
            })
            .collect())
    }
}

#[async_trait]
impl Repository for EmployeeRepository<'_> {
    type Model = employee::Model;
    type ActiveModel = employee::ActiveModel;

    async fn get_by_id(&self, id: i32) -> Result<Option<employee::Model>, DbErr> {
        employee::Entity::find_by_id(id).one(self.db).await
    }

    async fn get_all(&self) -> Result<Vec<employee::Model>, DbErr> {
        employee::Entity::find()
            .order_by_asc(employee::Column::Id)
            .all(self.db)
            .await
    }

    async fn exists(&self, condition: Condition) -> Result<bool, DbErr> {
        exists_where::<employee::Entity, _>(self.db, condition).await
    }

    async fn count(&self) -> Result<u64, DbErr> {
        employee::Entity::find().count(self.db).await
    }

    fn add(&mut self, model: employee::ActiveModel) {
        self.pending
            .push(PendingChange::Employee(Change::Insert(model)));
    }

    fn update(&mut self, model: employee::ActiveModel) {
        self.pending
            .push(PendingChange::Employee(Change::Update(model)));
    }

    fn delete(&mut self, id: i32) {
        self.pending.push(PendingChange::Employee(Change::Delete(id)));
    }
}

/// Case-insensitive email comparison usable in any employee filter.
pub fn email_matches(email: &str) -> Condition {
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col(employee::Column::Email)))
            .eq(email.trim().to_lowercase()),
    )
}
