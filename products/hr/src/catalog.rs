use platform_db::{DbPool, Repository, UnitOfWork};

use crate::{
    dto::{CatalogOptions, DepartmentView, JobTitleView},
    error::ServiceResult,
};

pub const DEPARTMENT_NOT_FOUND: &str = "Departamento no encontrado";

/// Read access to departments and job titles.
#[derive(Clone)]
pub struct CatalogService {
    db: DbPool,
}

impl CatalogService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    fn uow(&self) -> UnitOfWork {
        UnitOfWork::new(self.db.clone())
    }

    /// Departments ordered by name, each with its head count.
    pub async fn departments(&self) -> ServiceResult<Vec<DepartmentView>> {
        let mut uow = self.uow();
        let rows = uow.departments().get_all_with_employee_count().await?;
        Ok(rows.into_iter().map(DepartmentView::from).collect())
    }

    pub async fn department(&self, id: i32) -> ServiceResult<Option<DepartmentView>> {
        let mut uow = self.uow();
        let row = uow.departments().get_with_employee_count(id).await?;
        Ok(row.map(DepartmentView::from))
    }

    pub async fn job_titles(&self) -> ServiceResult<Vec<JobTitleView>> {
        let mut uow = self.uow();
        let rows = uow.job_titles().get_all().await?;
        Ok(rows.into_iter().map(JobTitleView::from).collect())
    }

    pub async fn job_title(&self, id: i32) -> ServiceResult<Option<JobTitleView>> {
        let mut uow = self.uow();
        Ok(uow.job_titles().get_by_id(id).await?.map(JobTitleView::from))
    }

    pub async fn options(&self) -> ServiceResult<CatalogOptions> {
        Ok(CatalogOptions {
            departments: self.departments().await?,
            job_titles: self.job_titles().await?,
        })
    }
}
