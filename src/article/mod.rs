mod download;
mod layout;

pub use download::{DOWNLOAD_CHUNK_SIZE, DownloadOutcome, download_audio};
pub use layout::{
    ArticleDir, PARTIAL_SUFFIX, TRANSCRIPT_FILENAME, audio_file_name, partial_path,
    sanitize_dirname,
};
