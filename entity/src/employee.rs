use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use crate::Audited;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub document: String,
    pub first_names: String,
    pub last_names: String,
    pub birth_date: Date,
    pub address: String,
    pub phone: String,
    #[sea_orm(unique)]
    pub email: String,
    pub salary: Decimal,
    pub hire_date: Date,
    pub status: EmployeeStatus,
    pub education_level: EducationLevel,
    pub profile: Option<String>,
    #[sea_orm(indexed)]
    pub department_id: i32,
    #[sea_orm(indexed)]
    pub job_title_id: i32,
    pub password_hash: Option<String>,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_delete = "Restrict"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::job_title::Entity",
        from = "Column::JobTitleId",
        to = "super::job_title::Column::Id",
        on_delete = "Restrict"
    )]
    JobTitle,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::job_title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobTitle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Audited for ActiveModel {
    fn stamp_created(&mut self, at: DateTimeWithTimeZone) {
        self.created_at = Set(Some(at));
    }

    fn stamp_updated(&mut self, at: DateTimeWithTimeZone) {
        self.updated_at = Set(Some(at));
    }
}

/// Lifecycle state. Only `Active` and `OnVacation` employees may sign in to the API.
#[derive(
    Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum EmployeeStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "OnVacation")]
    OnVacation,
}

impl EmployeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeStatus::Active => "Active",
            EmployeeStatus::Inactive => "Inactive",
            EmployeeStatus::OnVacation => "OnVacation",
        }
    }

    pub fn can_sign_in(self) -> bool {
        matches!(self, EmployeeStatus::Active | EmployeeStatus::OnVacation)
    }
}

/// Highest education level reached, ordered from lowest to highest.
#[derive(
    Copy,
    Clone,
    Debug,
    EnumIter,
    DeriveActiveEnum,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(24))")]
pub enum EducationLevel {
    #[sea_orm(string_value = "Technician")]
    Technician,
    #[sea_orm(string_value = "Technologist")]
    Technologist,
    #[sea_orm(string_value = "Professional")]
    Professional,
    #[sea_orm(string_value = "Specialization")]
    Specialization,
    #[sea_orm(string_value = "Masters")]
    Masters,
}

impl EducationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EducationLevel::Technician => "Technician",
            EducationLevel::Technologist => "Technologist",
            EducationLevel::Professional => "Professional",
            EducationLevel::Specialization => "Specialization",
            EducationLevel::Masters => "Masters",
        }
    }

    /// Spanish label used on printed documents.
    pub fn display_name(self) -> &'static str {
        match self {
            EducationLevel::Technician => "Técnico",
            EducationLevel::Technologist => "Tecnólogo",
            EducationLevel::Professional => "Profesional",
            EducationLevel::Specialization => "Especialización",
            EducationLevel::Masters => "Maestría",
        }
    }
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_names)
    }

    pub fn age(&self) -> i32 {
        self.age_on(Utc::now().date_naive())
    }

    pub fn tenure_years(&self) -> i32 {
        self.tenure_years_on(Utc::now().date_naive())
    }

    pub fn age_on(&self, today: NaiveDate) -> i32 {
        whole_years_between(self.birth_date, today)
    }

    pub fn tenure_years_on(&self, today: NaiveDate) -> i32 {
        whole_years_between(self.hire_date, today)
    }
}

/// Completed years from `start` to `today`; the current year only counts once
/// the anniversary has passed.
fn whole_years_between(start: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - start.year();
    if (today.month(), today.day()) < (start.month(), start.day()) {
        years -= 1;
    }
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::prelude::Decimal;

    fn sample() -> Model {
        Model {
            id: 1,
            document: "1020304050".into(),
            first_names: "Ana María".into(),
            last_names: "Gómez Ruiz".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            address: "Calle 10 # 20-30".into(),
            phone: "3001234567".into(),
            email: "ana@example.com".into(),
            salary: Decimal::new(3_500_000, 0),
            hire_date: NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(),
            status: EmployeeStatus::Active,
            education_level: EducationLevel::Professional,
            profile: None,
            department_id: 1,
            job_title_id: 2,
            password_hash: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn full_name_joins_name_parts() {
        assert_eq!(sample().full_name(), "Ana María Gómez Ruiz");
    }

    #[test]
    fn age_waits_for_birthday() {
        let employee = sample();
        let before = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(employee.age_on(before), 33);
        assert_eq!(employee.age_on(on), 34);
    }

    #[test]
    fn tenure_counts_completed_years() {
        let employee = sample();
        assert_eq!(
            employee.tenure_years_on(NaiveDate::from_ymd_opt(2018, 12, 31).unwrap()),
            0
        );
        assert_eq!(
            employee.tenure_years_on(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()),
            5
        );
    }

    #[test]
    fn only_active_or_vacation_can_sign_in() {
        assert!(EmployeeStatus::Active.can_sign_in());
        assert!(EmployeeStatus::OnVacation.can_sign_in());
        assert!(!EmployeeStatus::Inactive.can_sign_in());
    }
}
