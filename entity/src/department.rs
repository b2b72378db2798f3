use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::Audited;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Employees,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Employees => Entity::has_many(super::employee::Entity).into(),
        }
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
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
