//! # System Constants
//!
//! Status, classification and station enums shared by the repository, the pipeline and
//! the trigger surface, plus the fixed defaults of the batch-and-checkpoint pipeline.
//!
//! The numeric discriminants match the values stored in the order tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline defaults used when configuration does not override them
pub mod pipeline {
    /// Number of items that make a sheet "full"
    pub const DEFAULT_BATCH_SIZE: usize = 15;
    /// Sheets rendered and delivered before each checkpoint
    pub const DEFAULT_SHEET_CHUNK_SIZE: usize = 2;
    /// Labels rendered and delivered before each checkpoint
    pub const DEFAULT_LABEL_CHUNK_SIZE: usize = 2;
    /// Production URLs probed before each readiness update
    pub const DEFAULT_URL_CHECK_CHUNK_SIZE: usize = 30;
    /// Seconds subtracted from a token's lifetime before it is refreshed
    pub const DEFAULT_TOKEN_EXPIRATION_BUFFER_SECONDS: i64 = 600;
    /// User name recorded on station history rows written by the pipeline
    pub const STATION_HISTORY_USER: &str = "admin";
    /// Print jobs that may wait behind the running one
    pub const JOB_QUEUE_CAPACITY: usize = 32;
    /// Finished job records kept for status lookups; older ones are evicted
    pub const JOB_HISTORY_LIMIT: usize = 256;
}

/// Label option types rendered as selectable options
pub const SELECTABLE_OPTION_TYPES: &[&str] = &["dropdown", "swatch"];
/// Label option types rendered as free text
pub const TEXT_OPTION_TYPES: &[&str] = &["text input"];

/// Lifecycle status of an order custom item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum OrderCustomStatus {
    #[default]
    New = 1,
    ForcePrint = 2,
    Reprint = 3,
    CopyRejected = 4,
    CopyApproved = 5,
    Printed = 6,
    LabelPrinted = 7,
}

impl OrderCustomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderCustomStatus::New => "new",
            OrderCustomStatus::ForcePrint => "force_print",
            OrderCustomStatus::Reprint => "reprint",
            OrderCustomStatus::CopyRejected => "copy_rejected",
            OrderCustomStatus::CopyApproved => "copy_approved",
            OrderCustomStatus::Printed => "printed",
            OrderCustomStatus::LabelPrinted => "label_printed",
        }
    }

    /// Statuses an item may only reach after a confirmed delivery
    pub fn is_printed(&self) -> bool {
        matches!(
            self,
            OrderCustomStatus::Printed
                | OrderCustomStatus::LabelPrinted
                | OrderCustomStatus::Reprint
        )
    }
}

impl fmt::Display for OrderCustomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Product classification of an order custom item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum OrderCustomType {
    #[default]
    Image = 1,
    Tag = 2,
    Engrave = 3,
    Ring = 4,
}

/// Physical processing stage an item currently occupies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    #[default]
    Station1 = 1,
    Station2 = 2,
    Station3 = 3,
    Station4 = 4,
    Station5 = 5,
}
