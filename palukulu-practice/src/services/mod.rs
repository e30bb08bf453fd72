//! External collaborators: speech recognition, text classification and
//! speech synthesis. Each sits behind a trait so sessions and handlers can be
//! driven by fakes.

pub mod classifier;
pub mod synthesis;
pub mod transcription;

pub use classifier::{ClassifierService, HuggingFaceClassifier, LabelScore, DEFAULT_LABELS};
pub use synthesis::{GoogleTranslateTts, SynthesisService};
pub use transcription::{
    GoogleSpeechClient, Transcription, TranscriptionError, TranscriptionService,
};
