//! Analysis modules.
//!
//! Aggregation over the archive plus the counting, ranking and bucketing
//! routines the subcommands are built from.

pub mod aggregator;
pub mod group_chat;
pub mod interaction;
pub mod ranking;
pub mod timeline;
pub mod window;

pub use aggregator::{Aggregator, SkippedContact};
pub use group_chat::{group_chat_stats, GroupChatStats};
pub use interaction::{interaction_factors, InteractionFactor};
pub use ranking::{
    top_n, window_leaders, year_span, yearly_evolution, RankChange, TopN, WindowLeader, YearRanking,
};
pub use timeline::{activity_series, day_schedules, Activity, DaySchedule};
pub use window::{DateWindow, TimeBasis, THIRTY_DAYS_MS};
