mod backup_record;
mod document_key;
mod options;
mod quota_state;

pub use backup_record::{BackupRecord, RecordSource};
pub use document_key::DocumentKey;
pub use options::{SaveOptions, SetOptions};
pub use quota_state::QuotaState;
