//! PlanStore - append-only versioned document storage
//!
//! Stores structured documents as an immutable sequence of full-content
//! snapshots. Every accepted change appends a new version; nothing is ever
//! rewritten or deleted. Restoring an old version appends a fresh version
//! carrying the old content, so history stays strictly additive.
//!
//! # Architecture
//!
//! ```text
//! plans.db (SQLite, WAL)
//! ├── documents   # one row per parent document, scoped by owner
//! └── versions    # append-only snapshots, UNIQUE(document_id, version_number)
//! ```
//!
//! Version numbers for a document are assigned inside an immediate
//! transaction (`max + 1`), backed by a unique constraint with bounded
//! retry, so two concurrent appends can never be handed the same number.
//!
//! # Example
//!
//! ```ignore
//! use planstore::PlanStore;
//!
//! let mut store = PlanStore::open("plans.db")?;
//! let (doc, v1) = store.create_document("owner", "Bakery plan", &content, "Initial plan")?;
//! let v2 = store.append_version("owner", &doc.id, &updated, "Sharpened objectives", None)?;
//! let v3 = store.restore("owner", &doc.id, &v1.id)?;
//! assert_eq!(v3.version_number, 3);
//! ```

mod error;
mod store;

pub use error::{StoreError, StoreResult};
pub use store::{Document, PlanStore, Version};

/// Maximum attempts when a version-number conflict is detected on append
pub const MAX_APPEND_ATTEMPTS: u32 = 4;
