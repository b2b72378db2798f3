use anyhow::Result;
use products_hr::{
    EmployeeImporter, EmployeeService,
    import::{Cell, SheetRow},
};
use rust_decimal::Decimal;
use talento_tests::{employee_input, memory_db, sheet_row};

#[tokio::test]
async fn bad_rows_are_reported_and_the_rest_continue() -> Result<()> {
    let db = memory_db().await?;
    let importer = EmployeeImporter::new(db.clone());
    let rows = vec![
        sheet_row(2, "9001", "1990-03-05", "uno@example.com"),
        sheet_row(3, "9002", "no-es-fecha", "dos@example.com"),
        sheet_row(4, "9003", "05/11/1985", "tres@example.com"),
    ];

    let report = importer.import_rows(rows).await;
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.updated, 0);
    assert_eq!(report.errors, 1);
    assert_eq!(
        report.messages[0],
        "Importación completada: 2 insertados, 0 actualizados, 1 errores"
    );
    assert_eq!(
        report.messages[1],
        "Fila 3: Fecha de nacimiento inválida para documento 9002"
    );

    let service = EmployeeService::new(db);
    assert_eq!(service.count_total().await?, 2);
    Ok(())
}

#[tokio::test]
async fn existing_documents_are_updated_in_place() -> Result<()> {
    let db = memory_db().await?;
    let service = EmployeeService::new(db.clone());
    let existing = service
        .create(employee_input("9101", "antes@example.com"))
        .await?;

    let rows = vec![
        sheet_row(2, "9101", "1990-03-05", "despues@example.com"),
        sheet_row(3, "9102", "1992-01-20", "nueva@example.com"),
        sheet_row(4, "9102", "1992-01-20", "nueva@example.com"),
    ];
    let report = EmployeeImporter::new(db).import_rows(rows).await;
    assert_eq!(report.inserted, 1);
    assert_eq!(report.updated, 2);
    assert_eq!(report.errors, 0);

    let updated = service.get_by_id(existing.id).await?.unwrap();
    assert_eq!(updated.email, "despues@example.com");
    assert_eq!(updated.full_name, "Lucía Martínez");
    assert_eq!(updated.department_name, "Ventas");
    assert_eq!(updated.job_title_name, "Analista");
    assert_eq!(updated.salary, Decimal::new(4_200_000, 0));
    assert_eq!(service.count_total().await?, 2);
    Ok(())
}

#[tokio::test]
async fn blank_documents_are_skipped() -> Result<()> {
    let db = memory_db().await?;
    let rows = vec![
        sheet_row(2, "", "1990-03-05", "vacio@example.com"),
        sheet_row(3, "9201", "1990-03-05", "lleno@example.com"),
    ];
    let report = EmployeeImporter::new(db).import_rows(rows).await;
    assert_eq!(report.total_rows, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.errors, 0);
    Ok(())
}

#[tokio::test]
async fn unknown_departments_are_reported_per_row() -> Result<()> {
    let db = memory_db().await?;
    let mut row = sheet_row(2, "9301", "1990-03-05", "depto@example.com");
    row.cells[13] = Cell::Text("Finanzas".to_string());
    let report = EmployeeImporter::new(db.clone()).import_rows(vec![row]).await;
    assert_eq!(report.inserted, 0);
    assert_eq!(report.errors, 1);
    assert_eq!(
        report.messages[1],
        "Fila 2: Departamento 'Finanzas' no encontrado para documento 9301"
    );
    assert_eq!(EmployeeService::new(db).count_total().await?, 0);
    Ok(())
}

#[tokio::test]
async fn excel_serial_dates_and_numeric_documents_are_read() -> Result<()> {
    let db = memory_db().await?;
    let mut row = sheet_row(2, "", "", "serial@example.com");
    row.cells[0] = Cell::Number(1_020_304.0);
    // 1990-03-05
    row.cells[3] = Cell::Number(32_937.0);
    let report = EmployeeImporter::new(db.clone())
        .import_rows(vec![row])
        .await;
    assert_eq!(report.inserted, 1);

    let service = EmployeeService::new(db);
    let found = service.search(&Default::default()).await?;
    assert_eq!(found[0].document, "1020304");
    assert_eq!(found[0].birth_date, talento_tests::date(1990, 3, 5));
    Ok(())
}

#[tokio::test]
async fn a_failed_commit_keeps_nothing() -> Result<()> {
    let db = memory_db().await?;
    let rows: Vec<SheetRow> = vec![
        sheet_row(2, "9401", "1990-03-05", "igual@example.com"),
        sheet_row(3, "9402", "1991-04-06", "igual@example.com"),
    ];
    let report = EmployeeImporter::new(db.clone()).import_rows(rows).await;
    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, 0);
    assert_eq!(report.errors, 1);
    assert!(report.messages[0].starts_with("Error al guardar la importación"));
    assert_eq!(EmployeeService::new(db).count_total().await?, 0);
    Ok(())
}
