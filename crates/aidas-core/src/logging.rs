//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values |

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "extract", "turn"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "orchestrator", "eviction", "openai"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "submit_turn", "evict_oldest", "embed_text"
pub const OPERATION: &str = "op";

/// Conversation being operated on.
pub const CONVERSATION_ID: &str = "conversation_id";

/// Owning user UUID.
pub const USER_UUID: &str = "user_uuid";

/// Message being operated on.
pub const MESSAGE_ID: &str = "message_id";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";
