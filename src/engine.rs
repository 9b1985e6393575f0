//! Matching and reply engine.
//!
//! This module holds everything between "the brain is loaded" and "here is
//! your reply". It is split into focused submodules under `src/engine/`:
//!
//! ## How the parts work together
//!
//! At a high level, answering a message is a pipeline:
//!
//! ```text
//! loaded brain ──┐
//!               │  sort_replies()               (sorting.rs)
//!               └───────────────┬──────────────
//!                               │  per-topic sort buffers
//! message ── format_message ────┼─ normalize     (pattern.rs)
//!                               │
//!                               ▼
//!                     get_reply (reply.rs)
//!                       - %Previous scan against the last bot reply
//!                       - walk the sort buffer, first match wins
//!                       - trigger_regexp per candidate (pattern.rs)
//!                       - conditions / weighted random / redirects
//!                               │
//!                               ▼
//!                     process_tags (tags.rs)
//!                       - star/history/variable insertion
//!                       - string transforms, {random}, <call>
//!                               │
//!                               ▼
//!                          final reply
//! ```
//!
//! The sort buffers are rebuilt from scratch by every `sort_replies()` call
//! and are read-only during reply generation; only the per-user session
//! mutates while replying (plus the brain itself if a reply uses `{!...}`).
//!
//! ## Responsibilities by module
//!
//! - `sorting.rs`: topic closure over includes/inherits, the weight/kind/
//!   word-count priority order, and the substitution key lists.
//! - `pattern.rs`: message normalization and trigger→regex compilation.
//! - `reply.rs`: the matcher and the reply selection pipeline.
//! - `tags.rs`: tag expansion inside replies and condition operands.

#[path = "engine/pattern.rs"]
mod pattern;
#[path = "engine/reply.rs"]
mod reply;
#[path = "engine/sorting.rs"]
mod sorting;
#[path = "engine/tags.rs"]
mod tags;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub(crate) use sorting::SortBuffer;
