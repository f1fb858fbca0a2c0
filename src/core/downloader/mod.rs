mod checksum;
mod client;
mod fetcher;

pub use checksum::{md5_file, md5_hex, parse_checksum};
pub use client::{HttpTransport, Transport};
pub use fetcher::{Artifact, ArtifactFetcher};
