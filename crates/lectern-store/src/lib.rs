//! Storage collaborators for the synthesis engine.
//!
//! - `store`: the `DocumentStore` / `BlobStore` trait seams.
//! - `memory`: in-memory backends for tests and single-process use.
//! - `record`: the per-document audio record and its status machine.
//! - `marks`: the NDJSON speech-mark codec.
//! - `output`: inline data-URI vs. stored-URL delivery forms.
//! - `persist`: the begin/complete/fail bracket around a synthesis run.

pub mod error;
pub mod marks;
pub mod memory;
pub mod output;
pub mod persist;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use marks::{decode_marks, encode_marks};
pub use memory::{MemoryBlobStore, MemoryDocumentStore};
pub use output::{audio_data_uri, AudioOutput, AUDIO_CONTENT_TYPE, MARKS_CONTENT_TYPE};
pub use persist::{begin_generation, complete_generation, deliver, fail_generation, inline_output};
pub use record::DocumentRecord;
pub use store::{BlobStore, DocumentStore};
