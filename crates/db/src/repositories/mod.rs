//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod access;
pub mod account;
pub mod history;
pub mod video;
pub mod wallet;

pub use access::{AccessRepository, PurchaseStatus};
pub use account::{AccountError, AccountRepository};
pub use history::{
    AuditTotals, EntryView, GiftDirection, GiftView, HistoryRepository, PurchaseView,
    WalletSummary,
};
pub use video::{VideoError, VideoRepository, video_info};
pub use wallet::WalletRepository;
