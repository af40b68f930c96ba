pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod finalize;
pub mod notify;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Competition, CompetitionId, CompetitionResult, IncomeRecord, Membership, Money, PayoutShare,
    Team, TeamId, UserId, WinnerKind,
};
pub use error::AppError;
pub use finalize::Finalizer;
pub use notify::{NotificationSink, StoreSink};
