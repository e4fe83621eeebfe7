//! The module contains `Account` struct and its table.

use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::entity::prelude::*;

use crate::Money;

/// Number of digits of a generated [`Account::id_number`].
pub const ID_NUMBER_LEN: usize = 12;

/// A bank account.
///
/// Accounts are looked up from the outside by `id_number`, a stable display
/// identifier assigned once at creation. `id` is the internal key used by
/// foreign references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub id_number: String,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

/// Generates a random, zero padded, numeric ID number.
///
/// Uniqueness is not guaranteed here; callers must check the store (and the
/// unique index stays the authoritative guard).
pub(crate) fn generate_id_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let upper = 10u64.pow(ID_NUMBER_LEN as u32);
    format!("{:0width$}", rng.gen_range(0..upper), width = ID_NUMBER_LEN)
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(unique)]
    pub id_number: String,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            id_number: model.id_number,
            balance: Money::new(model.balance_minor),
            created_at: model.created_at,
        }
    }
}
