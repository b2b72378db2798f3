//! Bulk employee import from the first worksheet of an Excel workbook.
//!
//! Rows are validated one at a time; a bad row is reported and skipped while
//! the rest of the file keeps going. Accepted rows are staged on a single
//! unit of work and committed together at the end.

use std::{collections::HashMap, io::Cursor};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use entity::{EducationLevel, EmployeeStatus, department, employee, job_title};
use platform_db::{DbPool, Repository, UnitOfWork};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};

use crate::validation::{normalize_email, optional_text};

pub const COLUMN_COUNT: usize = 14;
pub const NOT_EXCEL: &str = "El archivo debe ser un Excel (.xlsx o .xls)";
pub const NO_FILE: &str = "Por favor seleccione un archivo Excel";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0}")]
    Workbook(#[from] calamine::Error),
    #[error("el libro no contiene hojas")]
    NoWorksheet,
}

/// A cell value reduced to what the importer cares about.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.trim().to_string(),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Cell::Number(value) => value.to_string(),
            Cell::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(date) => Some(*date),
            Cell::Number(serial) => from_serial(*serial),
            Cell::Text(value) => parse_date(value),
            Cell::Empty => None,
        }
    }

    /// Unparsable or missing salaries count as zero.
    pub fn decimal(&self) -> Decimal {
        match self {
            Cell::Number(value) => Decimal::try_from(*value)
                .map(|d| d.round_dp(2))
                .unwrap_or(Decimal::ZERO),
            Cell::Text(value) => value
                .trim()
                .trim_start_matches('$')
                .trim()
                .parse::<Decimal>()
                .unwrap_or(Decimal::ZERO),
            Cell::Date(_) | Cell::Empty => Decimal::ZERO,
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(v) => Cell::Text(v.clone()),
            Data::Bool(v) => Cell::Text(v.to_string()),
            Data::DateTime(v) => v
                .as_datetime()
                .map(|dt| Cell::Date(dt.date()))
                .unwrap_or(Cell::Empty),
            Data::DateTimeIso(v) | Data::DurationIso(v) => Cell::Text(v.clone()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// One data row with its 1-based position in the worksheet.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<Cell>,
}

impl SheetRow {
    pub fn new(number: usize, cells: Vec<Cell>) -> Self {
        Self { number, cells }
    }

    fn cell(&self, column: usize) -> &Cell {
        self.cells.get(column).unwrap_or(&Cell::Empty)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_rows: u32,
    pub inserted: u32,
    pub updated: u32,
    pub errors: u32,
    pub messages: Vec<String>,
}

/// Reads every row after the header from the first worksheet.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<SheetRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoWorksheet)??;
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for row in (start.0 + 1)..=end.0 {
        let cells = (0..COLUMN_COUNT as u32)
            .map(|column| {
                range
                    .get_value((row, column))
                    .map(Cell::from)
                    .unwrap_or(Cell::Empty)
            })
            .collect();
        rows.push(SheetRow::new(row as usize + 1, cells));
    }
    Ok(rows)
}

/// Checks the uploaded file name before any parsing happens.
pub fn check_upload(file_name: Option<&str>, size: usize) -> Result<(), &'static str> {
    let Some(name) = file_name.filter(|name| !name.trim().is_empty()) else {
        return Err(NO_FILE);
    };
    if size == 0 {
        return Err(NO_FILE);
    }
    let lower = name.trim().to_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Ok(())
    } else {
        Err(NOT_EXCEL)
    }
}

#[derive(Clone)]
pub struct EmployeeImporter {
    db: DbPool,
}

impl EmployeeImporter {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn import_workbook(&self, bytes: &[u8]) -> ImportReport {
        match read_workbook(bytes) {
            Ok(rows) => self.import_rows(rows).await,
            Err(err) => {
                warn!(error = %err, "workbook could not be read");
                ImportReport {
                    errors: 1,
                    messages: vec![format!("Error general al procesar el archivo: {err}")],
                    ..Default::default()
                }
            }
        }
    }

    pub async fn import_rows(&self, rows: Vec<SheetRow>) -> ImportReport {
        let span = info_span!("employee.import", rows = rows.len());
        self.apply_rows(rows).instrument(span).await
    }

    async fn apply_rows(&self, rows: Vec<SheetRow>) -> ImportReport {
        let mut report = ImportReport::default();
        let mut uow = UnitOfWork::new(self.db.clone());

        let catalogs = async {
            let departments = uow.departments().get_all().await?;
            let job_titles = uow.job_titles().get_all().await?;
            Ok::<_, sea_orm::DbErr>((departments, job_titles))
        }
        .await;
        let (departments, job_titles) = match catalogs {
            Ok(catalogs) => catalogs,
            Err(err) => {
                report.errors += 1;
                report
                    .messages
                    .push(format!("Error general al procesar el archivo: {err}"));
                return report;
            }
        };

        if let Err(err) = uow.begin_transaction() {
            report.errors += 1;
            report
                .messages
                .push(format!("Error general al procesar el archivo: {err}"));
            return report;
        }

        let mut new_rows: HashMap<String, employee::ActiveModel> = HashMap::new();
        let mut insert_order: Vec<String> = Vec::new();

        for row in &rows {
            report.total_rows += 1;
            let document = row.cell(0).text();
            if document.is_empty() {
                continue;
            }
            let parsed = match parse_row(row, &document, &departments, &job_titles) {
                Ok(parsed) => parsed,
                Err(message) => {
                    report.errors += 1;
                    report.messages.push(format!("Fila {}: {message}", row.number));
                    continue;
                }
            };

            if let Some(staged) = new_rows.get_mut(&document) {
                parsed.apply(staged);
                report.updated += 1;
                continue;
            }
            match uow.employees().get_by_document(&document).await {
                Ok(Some(existing)) => {
                    let mut active: employee::ActiveModel = existing.into();
                    parsed.apply(&mut active);
                    uow.employees().update(active);
                    report.updated += 1;
                }
                Ok(None) => {
                    let mut active = employee::ActiveModel {
                        password_hash: Set(None),
                        ..Default::default()
                    };
                    parsed.apply(&mut active);
                    new_rows.insert(document.clone(), active);
                    insert_order.push(document);
                    report.inserted += 1;
                }
                Err(err) => {
                    report.errors += 1;
                    report
                        .messages
                        .push(format!("Fila {}: Error - {err}", row.number));
                }
            }
        }

        for document in insert_order {
            if let Some(model) = new_rows.remove(&document) {
                uow.employees().add(model);
            }
        }

        let committed = match uow.save_changes().await {
            Ok(_) => uow.commit_transaction().await,
            Err(err) => Err(err),
        };
        match committed {
            Ok(affected) => {
                info!(
                    affected,
                    inserted = report.inserted,
                    updated = report.updated,
                    errors = report.errors,
                    "import committed"
                );
                report.messages.insert(
                    0,
                    format!(
                        "Importación completada: {} insertados, {} actualizados, {} errores",
                        report.inserted, report.updated, report.errors
                    ),
                );
            }
            Err(err) => {
                uow.rollback_transaction();
                warn!(error = %err, "import rolled back");
                report.inserted = 0;
                report.updated = 0;
                report.errors += 1;
                report
                    .messages
                    .insert(0, format!("Error al guardar la importación: {err}"));
            }
        }
        report
    }
}

struct ParsedRow {
    document: String,
    first_names: String,
    last_names: String,
    birth_date: NaiveDate,
    address: String,
    phone: String,
    email: String,
    job_title_id: i32,
    salary: Decimal,
    hire_date: NaiveDate,
    status: EmployeeStatus,
    education_level: EducationLevel,
    profile: Option<String>,
    department_id: i32,
}

impl ParsedRow {
    fn apply(&self, model: &mut employee::ActiveModel) {
        model.document = Set(self.document.clone());
        model.first_names = Set(self.first_names.clone());
        model.last_names = Set(self.last_names.clone());
        model.birth_date = Set(self.birth_date);
        model.address = Set(self.address.clone());
        model.phone = Set(self.phone.clone());
        model.email = Set(self.email.clone());
        model.salary = Set(self.salary);
        model.hire_date = Set(self.hire_date);
        model.status = Set(self.status);
        model.education_level = Set(self.education_level);
        model.profile = Set(self.profile.clone());
        model.department_id = Set(self.department_id);
        model.job_title_id = Set(self.job_title_id);
    }
}

fn parse_row(
    row: &SheetRow,
    document: &str,
    departments: &[department::Model],
    job_titles: &[job_title::Model],
) -> Result<ParsedRow, String> {
    let birth_date = row
        .cell(3)
        .date()
        .ok_or_else(|| format!("Fecha de nacimiento inválida para documento {document}"))?;
    let hire_date = row
        .cell(9)
        .date()
        .ok_or_else(|| format!("Fecha de ingreso inválida para documento {document}"))?;

    let department_name = row.cell(13).text();
    let department = departments
        .iter()
        .find(|d| d.name.to_lowercase() == department_name.to_lowercase())
        .ok_or_else(|| {
            format!("Departamento '{department_name}' no encontrado para documento {document}")
        })?;
    let job_title_name = row.cell(7).text();
    let job_title = job_titles
        .iter()
        .find(|j| j.name.to_lowercase() == job_title_name.to_lowercase())
        .ok_or_else(|| format!("Cargo '{job_title_name}' no encontrado para documento {document}"))?;

    Ok(ParsedRow {
        document: document.to_string(),
        first_names: row.cell(1).text(),
        last_names: row.cell(2).text(),
        birth_date,
        address: row.cell(4).text(),
        phone: row.cell(5).text(),
        email: normalize_email(&row.cell(6).text()),
        job_title_id: job_title.id,
        salary: row.cell(8).decimal(),
        hire_date,
        status: parse_status(&row.cell(10).text()),
        education_level: parse_education(&row.cell(11).text()),
        profile: optional_text(Some(row.cell(12).text())),
        department_id: department.id,
    })
}

/// Unknown labels fall back to `Active`.
pub fn parse_status(value: &str) -> EmployeeStatus {
    match value.trim().to_lowercase().as_str() {
        "inactivo" | "inactive" => EmployeeStatus::Inactive,
        "vacaciones" | "onvacation" => EmployeeStatus::OnVacation,
        _ => EmployeeStatus::Active,
    }
}

/// Unknown labels fall back to `Technician`.
pub fn parse_education(value: &str) -> EducationLevel {
    match value.trim().to_lowercase().as_str() {
        "tecnólogo" | "tecnologo" | "technologist" => EducationLevel::Technologist,
        "profesional" | "professional" => EducationLevel::Professional,
        "especialización" | "especializacion" | "specialization" => {
            EducationLevel::Specialization
        }
        "maestría" | "maestria" | "masters" => EducationLevel::Masters,
        _ => EducationLevel::Technician,
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(moment) = NaiveDateTime::parse_from_str(value, format) {
            return Some(moment.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|moment| moment.date_naive())
}

/// Spreadsheet serial day numbers count from 1899-12-30.
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_accept_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(1990, 6, 15);
        assert_eq!(parse_date("1990-06-15"), expected);
        assert_eq!(parse_date("15/06/1990"), expected);
        assert_eq!(parse_date("1990/06/15"), expected);
        assert_eq!(parse_date("1990-06-15T08:30:00-05:00"), expected);
        assert_eq!(parse_date("no es fecha"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn serial_numbers_are_dates() {
        assert_eq!(
            Cell::Number(45292.0).date(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(Cell::Number(-3.0).date(), None);
    }

    #[test]
    fn status_labels_in_both_languages() {
        assert_eq!(parse_status("Activo"), EmployeeStatus::Active);
        assert_eq!(parse_status("INACTIVE"), EmployeeStatus::Inactive);
        assert_eq!(parse_status("vacaciones"), EmployeeStatus::OnVacation);
        assert_eq!(parse_status("OnVacation"), EmployeeStatus::OnVacation);
        assert_eq!(parse_status("retirado"), EmployeeStatus::Active);
    }

    #[test]
    fn education_labels_with_or_without_accents() {
        assert_eq!(parse_education("Maestría"), EducationLevel::Masters);
        assert_eq!(parse_education("maestria"), EducationLevel::Masters);
        assert_eq!(parse_education("Especialización"), EducationLevel::Specialization);
        assert_eq!(parse_education("Technologist"), EducationLevel::Technologist);
        assert_eq!(parse_education("Doctorado"), EducationLevel::Technician);
    }

    #[test]
    fn salary_falls_back_to_zero() {
        assert_eq!(Cell::Text("abc".into()).decimal(), Decimal::ZERO);
        assert_eq!(Cell::Text("$ 2500000".into()).decimal(), Decimal::new(2_500_000, 0));
        assert_eq!(Cell::Number(1800000.5).decimal(), Decimal::new(18_000_005, 1));
    }

    #[test]
    fn numeric_documents_render_without_decimals() {
        assert_eq!(Cell::Number(1020304050.0).text(), "1020304050");
    }

    #[test]
    fn upload_must_be_excel() {
        assert_eq!(check_upload(None, 10), Err(NO_FILE));
        assert_eq!(check_upload(Some("datos.xlsx"), 0), Err(NO_FILE));
        assert_eq!(check_upload(Some("datos.csv"), 10), Err(NOT_EXCEL));
        assert!(check_upload(Some("Empleados.XLSX"), 10).is_ok());
        assert!(check_upload(Some("viejo.xls"), 10).is_ok());
    }

    #[test]
    fn garbage_bytes_are_not_a_workbook() {
        assert!(read_workbook(b"not a spreadsheet").is_err());
    }
}
