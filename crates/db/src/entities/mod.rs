//! `SeaORM` entity definitions.

pub mod accounts;
pub mod ledger_entries;
pub mod purchases;
pub mod sea_orm_active_enums;
pub mod videos;

pub mod prelude {
    //! Entity aliases.

    pub use super::accounts::Entity as Accounts;
    pub use super::ledger_entries::Entity as LedgerEntries;
    pub use super::purchases::Entity as Purchases;
    pub use super::videos::Entity as Videos;
}
