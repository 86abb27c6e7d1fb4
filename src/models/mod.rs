//! # Data Models
//!
//! Order items as read from the repository, the render payloads built from them, and the
//! rows written when delivered items are checkpointed.

pub mod attributes;
pub mod history;
pub mod order_item;
pub mod render;
pub mod requests;

pub use attributes::OrderAttributes;
pub use history::{BatchDocumentUpdate, BatchHistoryRecord, ImageItemUpdate, StationHistoryRecord};
pub use order_item::{BatchKey, OrderItem, ProductionUrlCheck};
pub use render::{
    DeliveryReceipt, DeliveryTarget, LabelOption, LabelPayload, LabelUnit, RenderResponse,
    RenderUnit, RenderedDocument, SheetItemPayload, SheetPayload, SheetUnit,
};
pub use requests::{ReprintSheetLabelRequest, ReprintSheetRequest, ReprintSingleLabelRequest};
