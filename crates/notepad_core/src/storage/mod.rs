//! Blob storage for note attachments.

pub mod blob;

pub use blob::{
    image_object_key, upload_note_image, BlobError, BlobResult, BlobStore, FsBlobStore,
    NOTE_IMAGES_BUCKET,
};
