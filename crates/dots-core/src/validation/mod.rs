//! Validation modules

pub mod submission;

pub use submission::{
    demo_file_path, demo_id, has_mp3_extension, is_valid_demo_path, is_valid_email,
    metadata_path, missing_fields, non_blank, sanitize_name, submission_timestamp,
    FORBIDDEN_FILENAME_CHARS, MAX_NAME_LENGTH,
};
