//! Use cases - one struct per player or staff story.
//!
//! Each module groups the use cases for one area and exposes a container of
//! `Arc`s that the [`App`](crate::app::App) wires up once at startup.

pub mod admin;
pub mod approval;
pub mod error;
pub mod prayer;
pub mod punishment;
pub mod roleplay;
pub(crate) mod shared;
pub mod skill_cast;
pub mod submission;
pub mod sweep;

pub use admin::AdminUseCases;
pub use approval::ApprovalUseCases;
pub use error::UseCaseError;
pub use prayer::SubmitPrayer;
pub use punishment::PunishmentUseCases;
pub use roleplay::RoleplayUseCases;
pub use skill_cast::SkillCastUseCases;
pub use submission::SubmissionUseCases;
pub use sweep::SweepUseCases;
