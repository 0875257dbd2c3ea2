//! Physical cash cases ("maletines"). A case belongs to one branch and
//! carries at most one open register at a time.

use sea_orm::{ActiveValue, entity::prelude::*};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    pub id: i32,
    pub branch_id: i32,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "cases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub branch_id: i32,
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branches::Entity",
        from = "Column::BranchId",
        to = "super::branches::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Branches,
    #[sea_orm(has_many = "super::cajas::Entity")]
    Cajas,
}

impl Related<super::branches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branches.def()
    }
}

impl Related<super::cajas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cajas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn in_branch(branch_id: i32, code: String) -> Self {
        Self {
            id: ActiveValue::NotSet,
            branch_id: ActiveValue::Set(branch_id),
            code: ActiveValue::Set(code),
        }
    }
}

impl From<Model> for Case {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            branch_id: model.branch_id,
            code: model.code,
        }
    }
}
