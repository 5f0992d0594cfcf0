//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_ELEMENT_ID: &str = "element_id";
pub const FIELD_PARENT_ID: &str = "parent_id";
pub const FIELD_COLLECTION_ID: &str = "collection_id";
pub const FIELD_CONTENT_ID: &str = "content_id";
pub const FIELD_GROUP: &str = "group";

// Collection sizes
pub const FIELD_ELEMENT_COUNT: &str = "element_count";
pub const FIELD_GROUP_COUNT: &str = "group_count";
pub const FIELD_ACTION_COUNT: &str = "action_count";
pub const FIELD_ISSUE_COUNT: &str = "issue_count";
pub const FIELD_COLLECTION_COUNT: &str = "collection_count";
pub const FIELD_SKIPPED_COUNT: &str = "skipped_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
