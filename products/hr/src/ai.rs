//! Natural-language questions about the workforce, answered by an external
//! model from a full snapshot of the current data.

use std::time::Duration;

use chrono::NaiveDate;
use platform_db::{CatalogCount, DbPool, EmployeeDetails, UnitOfWork};
use reqwest::Client;
use rust_decimal::Decimal;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const NOT_CONFIGURED: &str = "La API Key de Gemini no está configurada.";
pub const NO_RESPONSE: &str = "No se pudo obtener respuesta de Gemini.";
pub const EMPTY_QUESTION: &str = "La pregunta no puede estar vacía.";
const RECENT_HIRES: u64 = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug)]
pub struct AiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl AiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiAnswer {
    pub success: bool,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl AiAnswer {
    fn answered(text: String) -> Self {
        Self {
            success: true,
            response: Some(text),
            error: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
enum AskError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("reply carried no text")]
    EmptyReply,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub total_employees: usize,
    pub active_employees: usize,
    pub inactive_employees: usize,
    pub on_vacation_employees: usize,
    pub average_salary: Decimal,
    pub max_salary: Decimal,
    pub min_salary: Decimal,
    pub salary_total: Decimal,
    pub departments: Vec<CatalogHeadcount>,
    pub job_titles: Vec<CatalogHeadcount>,
    pub employees_by_education: Vec<EducationHeadcount>,
    pub recent_hires: Vec<RecentHire>,
    pub employees: Vec<EmployeeSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogHeadcount {
    pub id: i32,
    pub name: String,
    pub employee_count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EducationHeadcount {
    pub level: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentHire {
    pub name: String,
    pub department: String,
    pub job_title: String,
    pub hire_date: NaiveDate,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub id: i32,
    pub document: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub job_title: String,
    pub salary: Decimal,
    pub hire_date: NaiveDate,
    pub status: String,
    pub education_level: String,
}

#[derive(Clone)]
pub struct AiAssistant {
    db: DbPool,
    settings: AiSettings,
    client: Client,
}

impl AiAssistant {
    pub fn new(db: DbPool, settings: AiSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            db,
            settings,
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.settings.api_key.trim().is_empty()
    }

    /// Answers `query` from the live data. Never fails; problems come back in
    /// the answer's `error`.
    pub async fn ask(&self, query: &str) -> AiAnswer {
        if query.trim().is_empty() {
            return AiAnswer::failed(EMPTY_QUESTION);
        }
        if !self.is_configured() {
            return AiAnswer::failed(NOT_CONFIGURED);
        }
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(error = %err, "could not build assistant context");
                return AiAnswer::failed(format!("Error al procesar la consulta: {err}"));
            }
        };
        let prompt = match build_prompt(query.trim(), &snapshot) {
            Ok(prompt) => prompt,
            Err(err) => {
                error!(error = %err, "could not serialize assistant context");
                return AiAnswer::failed(format!("Error al procesar la consulta: {err}"));
            }
        };
        match self.generate(&prompt).await {
            Ok(text) => {
                info!(chars = text.len(), "assistant answered");
                AiAnswer::answered(text)
            }
            Err(err) => {
                error!(error = %err, "assistant call failed");
                AiAnswer::failed(NO_RESPONSE)
            }
        }
    }

    pub async fn snapshot(&self) -> Result<SystemSnapshot, DbErr> {
        let mut uow = UnitOfWork::new(self.db.clone());
        let employees = uow.employees().get_all_with_details().await?;
        let recent = uow.employees().most_recent_hires(RECENT_HIRES).await?;
        let departments = uow.departments().get_all_with_employee_count().await?;
        let job_titles = uow.job_titles().get_all_with_employee_count().await?;
        Ok(build_snapshot(&employees, &recent, departments, job_titles))
    }

    async fn generate(&self, prompt: &str) -> Result<String, AskError> {
        let response = self
            .client
            .post(self.settings.endpoint())
            .json(&request_body(prompt))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AskError::Status { status, body });
        }
        let reply: Value = response.json().await?;
        reply_text(&reply).ok_or(AskError::EmptyReply)
    }
}

pub fn build_snapshot(
    employees: &[EmployeeDetails],
    recent: &[EmployeeDetails],
    departments: Vec<CatalogCount>,
    job_titles: Vec<CatalogCount>,
) -> SystemSnapshot {
    use entity::{EducationLevel, EmployeeStatus};
    use sea_orm::Iterable;

    let count_status = |status: EmployeeStatus| {
        employees
            .iter()
            .filter(|row| row.employee.status == status)
            .count()
    };
    let salaries: Vec<Decimal> = employees.iter().map(|row| row.employee.salary).collect();
    let salary_total: Decimal = salaries.iter().copied().sum();
    let average_salary = if salaries.is_empty() {
        Decimal::ZERO
    } else {
        (salary_total / Decimal::from(salaries.len())).round_dp(2)
    };

    let employees_by_education = EducationLevel::iter()
        .filter_map(|level| {
            let count = employees
                .iter()
                .filter(|row| row.employee.education_level == level)
                .count();
            (count > 0).then(|| EducationHeadcount {
                level: level.as_str().to_string(),
                count,
            })
        })
        .collect();

    SystemSnapshot {
        total_employees: employees.len(),
        active_employees: count_status(EmployeeStatus::Active),
        inactive_employees: count_status(EmployeeStatus::Inactive),
        on_vacation_employees: count_status(EmployeeStatus::OnVacation),
        average_salary,
        max_salary: salaries.iter().copied().max().unwrap_or(Decimal::ZERO),
        min_salary: salaries.iter().copied().min().unwrap_or(Decimal::ZERO),
        salary_total,
        departments: departments.into_iter().map(CatalogHeadcount::from).collect(),
        job_titles: job_titles.into_iter().map(CatalogHeadcount::from).collect(),
        employees_by_education,
        recent_hires: recent
            .iter()
            .map(|row| RecentHire {
                name: row.employee.full_name(),
                department: department_label(row),
                job_title: job_title_label(row),
                hire_date: row.employee.hire_date,
                status: row.employee.status.as_str().to_string(),
            })
            .collect(),
        employees: employees
            .iter()
            .map(|row| EmployeeSummary {
                id: row.employee.id,
                document: row.employee.document.clone(),
                full_name: row.employee.full_name(),
                email: row.employee.email.clone(),
                department: department_label(row),
                job_title: job_title_label(row),
                salary: row.employee.salary,
                hire_date: row.employee.hire_date,
                status: row.employee.status.as_str().to_string(),
                education_level: row.employee.education_level.as_str().to_string(),
            })
            .collect(),
    }
}

impl From<CatalogCount> for CatalogHeadcount {
    fn from(row: CatalogCount) -> Self {
        Self {
            id: row.id,
            name: row.name,
            employee_count: row.employee_count,
        }
    }
}

fn department_label(row: &EmployeeDetails) -> String {
    row.department
        .as_ref()
        .map(|d| d.name.clone())
        .unwrap_or_else(|| "Sin departamento".to_string())
}

fn job_title_label(row: &EmployeeDetails) -> String {
    row.job_title
        .as_ref()
        .map(|j| j.name.clone())
        .unwrap_or_else(|| "Sin cargo".to_string())
}

pub fn build_prompt(query: &str, snapshot: &SystemSnapshot) -> Result<String, serde_json::Error> {
    let context = serde_json::to_string_pretty(snapshot)?;
    Ok(format!(
        "Eres un asistente de RRHH para la empresa TalentoPlus S.A.S. Tu trabajo es responder preguntas sobre los empleados y la organización basándote ÚNICAMENTE en los datos reales del sistema que te proporciono.

REGLAS IMPORTANTES:
1. NUNCA inventes datos. Solo usa la información que te proporciono.
2. Si no tienes información suficiente para responder, dilo claramente.
3. Responde de manera clara y concisa en español.
4. Si te preguntan por empleados específicos, busca en la lista de empleados.
5. Proporciona números exactos cuando sea posible.
6. Si te preguntan algo que no está en los datos (como predicciones futuras o datos personales sensibles), indica que no tienes esa información.

DATOS ACTUALES DEL SISTEMA:
{context}

PREGUNTA DEL USUARIO:
{query}

Responde de manera profesional y útil, basándote SOLO en los datos proporcionados."
    ))
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": 0.3,
            "topP": 0.8,
            "topK": 40,
            "maxOutputTokens": 1024
        }
    })
}

fn reply_text(reply: &Value) -> Option<String> {
    reply["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
}
