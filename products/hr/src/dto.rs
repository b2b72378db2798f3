use chrono::{DateTime, NaiveDate, Utc};
use entity::{EducationLevel, EmployeeStatus};
use platform_db::{CatalogCount, EmployeeDetails};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full employee record as shown in the admin console.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    pub id: i32,
    pub document: String,
    pub first_names: String,
    pub last_names: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub age: i32,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
    pub tenure_years: i32,
    pub status: EmployeeStatus,
    pub education_level: EducationLevel,
    pub profile: Option<String>,
    pub department_id: i32,
    pub department_name: String,
    pub job_title_id: i32,
    pub job_title_name: String,
}

impl From<EmployeeDetails> for EmployeeView {
    fn from(details: EmployeeDetails) -> Self {
        let department_name = details.department_name().to_string();
        let job_title_name = details.job_title_name().to_string();
        let employee = details.employee;
        Self {
            id: employee.id,
            full_name: employee.full_name(),
            age: employee.age(),
            tenure_years: employee.tenure_years(),
            document: employee.document,
            first_names: employee.first_names,
            last_names: employee.last_names,
            birth_date: employee.birth_date,
            address: employee.address,
            phone: employee.phone,
            email: employee.email,
            salary: employee.salary,
            hire_date: employee.hire_date,
            status: employee.status,
            education_level: employee.education_level,
            profile: employee.profile,
            department_id: employee.department_id,
            department_name,
            job_title_id: employee.job_title_id,
            job_title_name,
        }
    }
}

/// Employee record exposed through the public API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeApiView {
    pub id: i32,
    pub document: String,
    pub first_names: String,
    pub last_names: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
    pub status: String,
    pub education_level: String,
    pub profile: Option<String>,
    pub department: String,
    pub job_title: String,
}

impl From<EmployeeDetails> for EmployeeApiView {
    fn from(details: EmployeeDetails) -> Self {
        let department = details.department_name().to_string();
        let job_title = details.job_title_name().to_string();
        let employee = details.employee;
        Self {
            id: employee.id,
            full_name: employee.full_name(),
            document: employee.document,
            first_names: employee.first_names,
            last_names: employee.last_names,
            birth_date: employee.birth_date,
            address: employee.address,
            phone: employee.phone,
            email: employee.email,
            salary: employee.salary,
            hire_date: employee.hire_date,
            status: employee.status.as_str().to_string(),
            education_level: employee.education_level.as_str().to_string(),
            profile: employee.profile,
            department,
            job_title,
        }
    }
}

/// Create or full-replacement payload for the admin console.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub document: String,
    pub first_names: String,
    pub last_names: String,
    pub birth_date: NaiveDate,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
    #[serde(default = "default_status")]
    pub status: EmployeeStatus,
    pub education_level: EducationLevel,
    #[serde(default)]
    pub profile: Option<String>,
    pub department_id: i32,
    pub job_title_id: i32,
}

fn default_status() -> EmployeeStatus {
    EmployeeStatus::Active
}

/// Public self-registration payload. Missing fields deserialize as blanks so
/// validation can report them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationInput {
    pub document: String,
    pub first_names: String,
    pub last_names: String,
    pub birth_date: Option<NaiveDate>,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub department_id: Option<i32>,
    pub profile: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeLoginInput {
    pub document: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub expiration: DateTime<Utc>,
    pub document: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub employee_count: i64,
}

impl From<CatalogCount> for DepartmentView {
    fn from(row: CatalogCount) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            employee_count: row.employee_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTitleView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<entity::job_title::Model> for JobTitleView {
    fn from(model: entity::job_title::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

/// Options for the employee form selects.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOptions {
    pub departments: Vec<DepartmentView>,
    pub job_titles: Vec<JobTitleView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStat {
    pub name: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: u64,
    pub active: u64,
    pub inactive: u64,
    pub on_vacation: u64,
    pub by_department: Vec<CatalogStat>,
    pub by_job_title: Vec<CatalogStat>,
}

/// Optional filters for the admin employee list.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub status: Option<EmployeeStatus>,
    pub department_id: Option<i32>,
    pub job_title_id: Option<i32>,
}
