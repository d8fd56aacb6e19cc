//! Services over the pool: catalog-driven CRUD, request validation, and tab tree sync.

mod crud;
mod tree;
mod validation;
pub use crud::{row_id, CrudService};
pub use tree::{
    classify, FilePayload, PlannedFile, PlannedSection, ReceivedAttachment, SectionPayload, SyncOutcome, SyncPlan,
    Tab, TabFile, TabIdRef, TabPayload, TabSection, TabTarget, TreeService, MAX_ROW_ID_DIGITS,
};
pub use validation::{parse_date, RequestValidator};
