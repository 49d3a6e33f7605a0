mod extract;
mod filename;
mod rules;

pub use extract::{extract_audio_references, reference_lines};
pub use filename::{
    AUDIO_EXTENSIONS, AudioFilename, AudioReferenceSet, DEFAULT_EXTENSION, has_audio_extension,
    strip_namespace,
};
pub use rules::ReferenceRule;
