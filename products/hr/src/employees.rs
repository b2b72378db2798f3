use std::collections::HashMap;

use entity::{EmployeeStatus, employee};
use platform_db::{DbPool, EmployeeDetails, Repository, UnitOfWork, email_matches};
use sea_orm::{ActiveValue::Set, ColumnTrait, Condition};
use tracing::{info, info_span, Instrument};

use crate::{
    dto::{CatalogStat, DashboardStats, EmployeeFilter, EmployeeInput, EmployeeView},
    error::{ServiceError, ServiceResult},
    validation::{Violations, normalize_email, optional_text},
};

pub const EMPLOYEE_NOT_FOUND: &str = "Empleado no encontrado";
pub const DEPARTMENT_MISSING: &str = "El departamento seleccionado no existe";
pub const JOB_TITLE_MISSING: &str = "El cargo seleccionado no existe";

/// Employee use cases shared by the public API and the admin console.
///
/// Every call works on a fresh [`UnitOfWork`] bound to the shared pool.
#[derive(Clone)]
pub struct EmployeeService {
    db: DbPool,
}

impl EmployeeService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    fn uow(&self) -> UnitOfWork {
        UnitOfWork::new(self.db.clone())
    }

    pub async fn get_all(&self) -> ServiceResult<Vec<EmployeeView>> {
        let mut uow = self.uow();
        let rows = uow.employees().get_all_with_details().await?;
        Ok(rows.into_iter().map(EmployeeView::from).collect())
    }

    /// Full list narrowed by any combination of status, department and job title.
    pub async fn search(&self, filter: &EmployeeFilter) -> ServiceResult<Vec<EmployeeView>> {
        let rows = self.get_all().await?;
        Ok(rows
            .into_iter()
            .filter(|e| filter.status.is_none_or(|status| e.status == status))
            .filter(|e| filter.department_id.is_none_or(|id| e.department_id == id))
            .filter(|e| filter.job_title_id.is_none_or(|id| e.job_title_id == id))
            .collect())
    }

    pub async fn get_by_id(&self, id: i32) -> ServiceResult<Option<EmployeeView>> {
        Ok(self.get_details(id).await?.map(EmployeeView::from))
    }

    pub async fn get_details(&self, id: i32) -> ServiceResult<Option<EmployeeDetails>> {
        let mut uow = self.uow();
        Ok(uow.employees().get_with_details(id).await?)
    }

    pub async fn get_by_document(&self, document: &str) -> ServiceResult<Option<EmployeeView>> {
        Ok(self
            .get_details_by_document(document)
            .await?
            .map(EmployeeView::from))
    }

    pub async fn get_details_by_document(
        &self,
        document: &str,
    ) -> ServiceResult<Option<EmployeeDetails>> {
        let mut uow = self.uow();
        Ok(uow.employees().get_by_document_with_details(document).await?)
    }

    pub async fn get_by_email(&self, email: &str) -> ServiceResult<Option<EmployeeView>> {
        let mut uow = self.uow();
        let Some(found) = uow.employees().get_by_email(email).await? else {
            return Ok(None);
        };
        Ok(uow
            .employees()
            .get_with_details(found.id)
            .await?
            .map(EmployeeView::from))
    }

    pub async fn create(&self, input: EmployeeInput) -> ServiceResult<EmployeeView> {
        validate_input(&input)?;
        let span = info_span!("employee.create", document = %input.document.trim());
        async move {
            let mut uow = self.uow();
            ensure_unique(&mut uow, &input, None).await?;
            ensure_catalogs(&mut uow, input.department_id, input.job_title_id).await?;

            let document = input.document.trim().to_string();
            let mut model = employee::ActiveModel {
                password_hash: Set(None),
                ..Default::default()
            };
            apply_input(&mut model, input);
            uow.employees().add(model);
            uow.save_changes().await?;

            let created = uow
                .employees()
                .get_by_document_with_details(&document)
                .await?
                .ok_or_else(|| ServiceError::NotFound(EMPLOYEE_NOT_FOUND.into()))?;
            info!(id = created.employee.id, "employee created");
            Ok(EmployeeView::from(created))
        }
        .instrument(span)
        .await
    }

    /// Replaces every editable field of an existing employee.
    pub async fn update(&self, id: i32, input: EmployeeInput) -> ServiceResult<EmployeeView> {
        validate_input(&input)?;
        let span = info_span!("employee.update", id);
        async move {
            let mut uow = self.uow();
            let existing = uow
                .employees()
                .get_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(EMPLOYEE_NOT_FOUND.into()))?;
            ensure_unique(&mut uow, &input, Some(id)).await?;
            ensure_catalogs(&mut uow, input.department_id, input.job_title_id).await?;

            let mut model: employee::ActiveModel = existing.into();
            apply_input(&mut model, input);
            uow.employees().update(model);
            uow.save_changes().await?;

            let updated = uow
                .employees()
                .get_with_details(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(EMPLOYEE_NOT_FOUND.into()))?;
            info!("employee updated");
            Ok(EmployeeView::from(updated))
        }
        .instrument(span)
        .await
    }

    /// Returns `false` when nothing matched `id`.
    pub async fn delete(&self, id: i32) -> ServiceResult<bool> {
        let mut uow = self.uow();
        if uow.employees().get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        uow.employees().delete(id);
        let affected = uow.save_changes().await?;
        info!(id, "employee deleted");
        Ok(affected > 0)
    }

    pub async fn exists_by_document(&self, document: &str) -> ServiceResult<bool> {
        let mut uow = self.uow();
        Ok(uow
            .employees()
            .exists(Condition::all().add(employee::Column::Document.eq(document.trim())))
            .await?)
    }

    pub async fn exists_by_email(&self, email: &str) -> ServiceResult<bool> {
        let mut uow = self.uow();
        Ok(uow.employees().exists(email_matches(email)).await?)
    }

    pub async fn count_by_status(&self, status: EmployeeStatus) -> ServiceResult<u64> {
        let mut uow = self.uow();
        Ok(uow.employees().count_by_status(status).await?)
    }

    pub async fn count_total(&self) -> ServiceResult<u64> {
        let mut uow = self.uow();
        Ok(uow.employees().count().await?)
    }

    pub async fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        let mut uow = self.uow();
        let rows = uow.employees().get_all_with_details().await?;
        Ok(summarize(&rows))
    }
}

/// Aggregates one pass over the loaded employees.
pub(crate) fn summarize(rows: &[EmployeeDetails]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_employees: rows.len() as u64,
        active: 0,
        inactive: 0,
        on_vacation: 0,
        by_department: Vec::new(),
        by_job_title: Vec::new(),
    };
    let mut departments: HashMap<&str, u64> = HashMap::new();
    let mut job_titles: HashMap<&str, u64> = HashMap::new();
    for row in rows {
        match row.employee.status {
            EmployeeStatus::Active => stats.active += 1,
            EmployeeStatus::Inactive => stats.inactive += 1,
            EmployeeStatus::OnVacation => stats.on_vacation += 1,
        }
        *departments.entry(row.department_name()).or_default() += 1;
        *job_titles.entry(row.job_title_name()).or_default() += 1;
    }
    stats.by_department = ranked(departments);
    stats.by_job_title = ranked(job_titles);
    stats
}

fn ranked(counts: HashMap<&str, u64>) -> Vec<CatalogStat> {
    let mut stats: Vec<CatalogStat> = counts
        .into_iter()
        .map(|(name, count)| CatalogStat {
            name: name.to_string(),
            count,
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    stats
}

fn validate_input(input: &EmployeeInput) -> ServiceResult<()> {
    let salary_ok = input.salary >= rust_decimal::Decimal::ZERO;
    Violations::new()
        .required(&input.document, "El documento es requerido")
        .max_length(&input.document, 20, "El documento no puede exceder 20 caracteres")
        .required(&input.first_names, "Los nombres son requeridos")
        .max_length(&input.first_names, 100, "Los nombres no pueden exceder 100 caracteres")
        .required(&input.last_names, "Los apellidos son requeridos")
        .max_length(&input.last_names, 100, "Los apellidos no pueden exceder 100 caracteres")
        .required(&input.address, "La dirección es requerida")
        .max_length(&input.address, 200, "La dirección no puede exceder 200 caracteres")
        .required(&input.phone, "El teléfono es requerido")
        .max_length(&input.phone, 20, "El teléfono no puede exceder 20 caracteres")
        .required(&input.email, "El email es requerido")
        .max_length(&input.email, 150, "El email no puede exceder 150 caracteres")
        .email(&input.email, "El email no es válido")
        .check(salary_ok, "El salario no puede ser negativo")
        .max_length(
            input.profile.as_deref().unwrap_or_default(),
            500,
            "El perfil profesional no puede exceder 500 caracteres",
        )
        .finish("Datos del empleado inválidos")
}

async fn ensure_unique(
    uow: &mut UnitOfWork,
    input: &EmployeeInput,
    own_id: Option<i32>,
) -> ServiceResult<()> {
    let (document_taken, email_taken) = match own_id {
        None => (
            "Ya existe un empleado con este documento",
            "Ya existe un empleado con este email",
        ),
        Some(_) => (
            "Ya existe otro empleado con este documento",
            "Ya existe otro empleado con este email",
        ),
    };
    let not_self = |condition: Condition| match own_id {
        Some(id) => condition.add(employee::Column::Id.ne(id)),
        None => condition,
    };

    let by_document = not_self(
        Condition::all().add(employee::Column::Document.eq(input.document.trim())),
    );
    if uow.employees().exists(by_document).await? {
        return Err(ServiceError::Duplicate(document_taken.into()));
    }
    let by_email = not_self(email_matches(&input.email));
    if uow.employees().exists(by_email).await? {
        return Err(ServiceError::Duplicate(email_taken.into()));
    }
    Ok(())
}

async fn ensure_catalogs(
    uow: &mut UnitOfWork,
    department_id: i32,
    job_title_id: i32,
) -> ServiceResult<()> {
    if uow.departments().get_by_id(department_id).await?.is_none() {
        return Err(ServiceError::rule(DEPARTMENT_MISSING));
    }
    if uow.job_titles().get_by_id(job_title_id).await?.is_none() {
        return Err(ServiceError::rule(JOB_TITLE_MISSING));
    }
    Ok(())
}

fn apply_input(model: &mut employee::ActiveModel, input: EmployeeInput) {
    model.document = Set(input.document.trim().to_string());
    model.first_names = Set(input.first_names.trim().to_string());
    model.last_names = Set(input.last_names.trim().to_string());
    model.birth_date = Set(input.birth_date);
    model.address = Set(input.address.trim().to_string());
    model.phone = Set(input.phone.trim().to_string());
    model.email = Set(normalize_email(&input.email));
    model.salary = Set(input.salary);
    model.hire_date = Set(input.hire_date);
    model.status = Set(input.status);
    model.education_level = Set(input.education_level);
    model.profile = Set(optional_text(input.profile));
    model.department_id = Set(input.department_id);
    model.job_title_id = Set(input.job_title_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use entity::{EducationLevel, department, job_title};
    use rust_decimal::Decimal;

    fn details(id: i32, status: EmployeeStatus, department: &str, job_title: &str) -> EmployeeDetails {
        EmployeeDetails {
            employee: employee::Model {
                id,
                document: format!("10{id}"),
                first_names: "Ana".into(),
                last_names: "Gómez".into(),
                birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                address: "Calle 1".into(),
                phone: "300".into(),
                email: format!("ana{id}@example.com"),
                salary: Decimal::new(1_000_000, 0),
                hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                status,
                education_level: EducationLevel::Professional,
                profile: None,
                department_id: 1,
                job_title_id: 1,
                password_hash: None,
                created_at: None,
                updated_at: None,
            },
            department: Some(department::Model {
                id: 1,
                name: department.into(),
                description: None,
                created_at: None,
                updated_at: None,
            }),
            job_title: Some(job_title::Model {
                id: 1,
                name: job_title.into(),
                description: None,
                created_at: None,
                updated_at: None,
            }),
        }
    }

    #[test]
    fn status_counts_add_up_to_total() {
        let rows = vec![
            details(1, EmployeeStatus::Active, "Ventas", "Analista"),
            details(2, EmployeeStatus::Inactive, "Ventas", "Auxiliar"),
            details(3, EmployeeStatus::OnVacation, "Marketing", "Analista"),
            details(4, EmployeeStatus::Active, "Tecnología", "Analista"),
        ];
        let stats = summarize(&rows);
        assert_eq!(stats.total_employees, 4);
        assert_eq!(stats.active + stats.inactive + stats.on_vacation, stats.total_employees);
        assert_eq!(stats.by_department[0], CatalogStat { name: "Ventas".into(), count: 2 });
        assert_eq!(stats.by_job_title[0], CatalogStat { name: "Analista".into(), count: 3 });
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let rows = vec![
            details(1, EmployeeStatus::Active, "Ventas", "Analista"),
            details(2, EmployeeStatus::Active, "Marketing", "Analista"),
        ];
        let names: Vec<_> = summarize(&rows)
            .by_department
            .into_iter()
            .map(|stat| stat.name)
            .collect();
        assert_eq!(names, ["Marketing", "Ventas"]);
    }

    #[test]
    fn empty_set_has_zero_counts() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_employees, 0);
        assert!(stats.by_department.is_empty());
    }
}
