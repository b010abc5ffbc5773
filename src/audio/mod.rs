// Audio module - source detection, metadata reading and cover art

pub mod artwork;
pub mod detection;
pub mod metadata;

pub use artwork::{embed_artwork, ArtworkOutcome, ArtworkSource};
pub use detection::has_extension;
pub use metadata::{
    describe_output, read_artwork, read_bitrate, read_title, save_artwork_preview, Lookup,
};
