//! Domain types for the competition engine.
//!
//! This module provides:
//! - Lossless currency handling via the Money wrapper
//! - Domain primitives: UserId, CompetitionId, TeamId
//! - Competition, membership, team, income, and result records
//! - The qualifying-platform allow-list filter

pub mod competition;
pub mod income;
pub mod money;
pub mod notification;
pub mod outcome;
pub mod platform;
pub mod primitives;

pub use competition::{hash_join_password, Competition, GoalKind, MemberRole, Membership, Team};
pub use income::{IncomeRecord, Profile};
pub use money::Money;
pub use notification::{Notification, NotificationDraft, NotificationKind};
pub use outcome::{CompetitionResult, PayoutShare, WinnerKind};
pub use platform::{is_qualifying, QualifyingPlatform};
pub use primitives::{CompetitionId, TeamId, UserId};
