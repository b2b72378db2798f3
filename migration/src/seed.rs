use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

use crate::m20240101_000001_catalogs::{Department, JobTitle};

pub const DEPARTMENT_NAMES: [&str; 7] = [
    "Contabilidad",
    "Logística",
    "Marketing",
    "Operaciones",
    "Recursos Humanos",
    "Tecnología",
    "Ventas",
];

pub const JOB_TITLE_NAMES: [&str; 7] = [
    "Administrador",
    "Analista",
    "Auxiliar",
    "Coordinador",
    "Desarrollador",
    "Ingeniero",
    "Soporte Técnico",
];

/// Inserts the department and job title catalogs, skipping names that already exist.
pub async fn seed_catalogs<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    let mut inserted = 0;
    inserted += insert_names(db, Department::Table, Department::Name, &DEPARTMENT_NAMES).await?;
    inserted += insert_names(db, JobTitle::Table, JobTitle::Name, &JOB_TITLE_NAMES).await?;
    Ok(inserted)
}

async fn insert_names<C, T, N>(db: &C, table: T, name: N, names: &[&str]) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
    T: Iden + Copy + 'static,
    N: Iden + Copy + 'static,
{
    let mut insert = Query::insert();
    insert
        .into_table(table)
        .columns([name])
        .on_conflict(OnConflict::column(name).do_nothing().to_owned());
    for value in names {
        insert
            .values([(*value).into()])
            .map_err(|err| DbErr::Custom(format!("invalid seed row: {err}")))?;
    }
    let statement = db.get_database_backend().build(&insert);
    let result = db.execute(statement).await?;
    Ok(result.rows_affected())
}
