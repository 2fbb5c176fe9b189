//! Bus consumers that maintain the shared note state.

mod length;
mod volume;

pub use length::NoteLengthConsumer;
pub use volume::NoteVolumeConsumer;
