//! One-page A4 resume ("hoja de vida") for an employee.

use chrono::{DateTime, Local, NaiveDate};
use entity::EmployeeStatus;
use platform_db::EmployeeDetails;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 30.0;
const PROFILE_WIDTH: usize = 90;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("{0}")]
    Render(#[from] printpdf::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Title,
    Subtitle,
    Heading,
    Strong,
    Body,
    Small,
    Gap,
}

impl Style {
    fn size(self) -> f32 {
        match self {
            Style::Title => 22.0,
            Style::Subtitle => 12.0,
            Style::Heading => 13.0,
            Style::Strong | Style::Body => 10.5,
            Style::Small | Style::Gap => 9.0,
        }
    }

    fn advance(self) -> f32 {
        match self {
            Style::Title => 10.0,
            Style::Heading => 8.0,
            Style::Gap => 6.0,
            _ => 6.0,
        }
    }

    fn bold(self) -> bool {
        matches!(self, Style::Title | Style::Heading | Style::Strong)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub style: Style,
    pub text: String,
}

impl Line {
    fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    fn gap() -> Self {
        Self::new(Style::Gap, "")
    }
}

/// Resume content in reading order, independent of layout.
pub fn resume_lines(details: &EmployeeDetails, today: NaiveDate, generated_at: &str) -> Vec<Line> {
    let employee = &details.employee;
    let full_name = employee.full_name();
    let mut lines = vec![
        Line::new(Style::Title, "HOJA DE VIDA"),
        Line::new(Style::Subtitle, "TalentoPlus S.A.S."),
        Line::gap(),
        Line::new(Style::Heading, "DATOS PERSONALES"),
        Line::new(Style::Strong, format!("Nombre Completo: {full_name}")),
        Line::new(Style::Body, format!("Documento: {}", employee.document)),
        Line::new(
            Style::Body,
            format!("Fecha de Nacimiento: {}", employee.birth_date.format("%d/%m/%Y")),
        ),
        Line::new(Style::Body, format!("Dirección: {}", employee.address)),
        Line::new(Style::Body, format!("Teléfono: {}", employee.phone)),
        Line::new(Style::Body, format!("Email: {}", employee.email)),
        Line::gap(),
        Line::new(Style::Heading, "INFORMACIÓN LABORAL"),
        Line::new(
            Style::Strong,
            format!("Departamento: {}", or_na(details.department_name())),
        ),
        Line::new(Style::Body, format!("Cargo: {}", or_na(details.job_title_name()))),
        Line::new(
            Style::Body,
            format!("Fecha de Ingreso: {}", employee.hire_date.format("%d/%m/%Y")),
        ),
        Line::new(Style::Body, format!("Salario: {}", format_currency(employee.salary))),
        Line::new(Style::Body, format!("Estado: {}", status_label(employee.status))),
        Line::new(
            Style::Body,
            format!("Antigüedad: {} años", employee.tenure_years_on(today)),
        ),
        Line::gap(),
        Line::new(Style::Heading, "NIVEL EDUCATIVO"),
        Line::new(
            Style::Strong,
            format!("Nivel alcanzado: {}", employee.education_level.display_name()),
        ),
    ];

    if let Some(profile) = employee.profile.as_deref().filter(|p| !p.trim().is_empty()) {
        lines.push(Line::gap());
        lines.push(Line::new(Style::Heading, "PERFIL PROFESIONAL"));
        lines.extend(
            wrap_text(profile.trim(), PROFILE_WIDTH)
                .into_iter()
                .map(|text| Line::new(Style::Body, text)),
        );
    }

    lines.extend([
        Line::gap(),
        Line::gap(),
        Line::new(Style::Body, "______________________________"),
        Line::new(Style::Body, full_name),
        Line::new(Style::Small, format!("C.C. {}", employee.document)),
        Line::gap(),
        Line::new(Style::Small, format!("Documento generado el {generated_at}")),
        Line::new(Style::Small, "TalentoPlus S.A.S. - Sistema de Gestión de RRHH"),
    ]);
    lines
}

pub fn render_resume(details: &EmployeeDetails) -> Result<Vec<u8>, PdfError> {
    let now: DateTime<Local> = Local::now();
    let stamp = now.format("%d/%m/%Y %H:%M").to_string();
    let lines = resume_lines(details, now.date_naive(), &stamp);
    render(&format!("Hoja de vida {}", details.employee.full_name()), &lines)
}

/// Lays lines top to bottom, starting a new page when the current one fills.
pub fn render(title: &str, lines: &[Line]) -> Result<Vec<u8>, PdfError> {
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut current: PdfLayerReference = doc.get_page(page).get_layer(layer);
    let mut y = TOP;
    for line in lines {
        if y < BOTTOM {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            current = doc.get_page(page).get_layer(layer);
            y = TOP;
        }
        if !line.text.is_empty() {
            let font: &IndirectFontRef = if line.style.bold() { &bold } else { &regular };
            current.use_text(line.text.clone(), line.style.size(), Mm(MARGIN), Mm(y), font);
        }
        y -= line.style.advance();
    }
    Ok(doc.save_to_bytes()?)
}

pub fn file_name(document: &str, date: NaiveDate) -> String {
    format!("HojaVida_{}_{}.pdf", document, date.format("%Y%m%d"))
}

/// Whole pesos with `.` thousands separators, e.g. `$1.234.567 COP`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped} COP")
}

/// Greedy word wrap at `width` characters.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn status_label(status: EmployeeStatus) -> &'static str {
    match status {
        EmployeeStatus::Active => "Activo",
        EmployeeStatus::Inactive => "Inactivo",
        EmployeeStatus::OnVacation => "Vacaciones",
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::{EducationLevel, department, employee};

    fn details(profile: Option<&str>) -> EmployeeDetails {
        EmployeeDetails {
            employee: employee::Model {
                id: 1,
                document: "1020304050".into(),
                first_names: "Ana".into(),
                last_names: "Gómez".into(),
                birth_date: NaiveDate::from_ymd_opt(1990, 6, 5).unwrap(),
                address: "Calle 10".into(),
                phone: "3001234567".into(),
                email: "ana@example.com".into(),
                salary: Decimal::new(1_234_567, 0),
                hire_date: NaiveDate::from_ymd_opt(2019, 2, 1).unwrap(),
                status: EmployeeStatus::Active,
                education_level: EducationLevel::Specialization,
                profile: profile.map(str::to_string),
                department_id: 1,
                job_title_id: 1,
                password_hash: None,
                created_at: None,
                updated_at: None,
            },
            department: Some(department::Model {
                id: 1,
                name: "Tecnología".into(),
                description: None,
                created_at: None,
                updated_at: None,
            }),
            job_title: None,
        }
    }

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|line| line.text.as_str()).collect()
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(Decimal::new(1_234_567, 0)), "$1.234.567 COP");
        assert_eq!(format_currency(Decimal::new(999, 0)), "$999 COP");
        assert_eq!(format_currency(Decimal::new(1_000_000_50, 2)), "$1.000.001 COP");
        assert_eq!(format_currency(Decimal::ZERO), "$0 COP");
    }

    #[test]
    fn file_name_uses_document_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(file_name("123", date), "HojaVida_123_20240309.pdf");
    }

    #[test]
    fn wrap_respects_width() {
        let wrapped = wrap_text("uno dos tres cuatro cinco", 9);
        assert_eq!(wrapped, ["uno dos", "tres", "cuatro", "cinco"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn resume_sections_in_order() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let lines = resume_lines(&details(None), today, "01/03/2024 10:00");
        let text = texts(&lines);
        assert_eq!(text[0], "HOJA DE VIDA");
        assert!(text.contains(&"Fecha de Nacimiento: 05/06/1990"));
        assert!(text.contains(&"Salario: $1.234.567 COP"));
        assert!(text.contains(&"Antigüedad: 5 años"));
        assert!(text.contains(&"Cargo: N/A"));
        assert!(text.contains(&"Nivel alcanzado: Especialización"));
        assert!(text.contains(&"C.C. 1020304050"));
        assert!(!text.contains(&"PERFIL PROFESIONAL"));
    }

    #[test]
    fn profile_section_only_when_present() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let lines = resume_lines(&details(Some("Ingeniera de datos")), today, "x");
        let text = texts(&lines);
        assert!(text.contains(&"PERFIL PROFESIONAL"));
        assert!(text.contains(&"Ingeniera de datos"));
    }

    #[test]
    fn render_produces_pdf_bytes() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let lines = resume_lines(&details(Some("Perfil")), today, "x");
        let bytes = render("Hoja de vida", &lines).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
