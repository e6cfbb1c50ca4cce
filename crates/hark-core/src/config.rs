use serde::{Deserialize, Serialize};

/// Recognition surface sent to the backend when a stream opens.
///
/// Fixed per deployment, not per request: one recognizer identity, one
/// language, one model, input format auto-detected by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerConfig {
    pub recognizer: String,
    pub language_codes: Vec<String>,
    pub model: String,
    pub auto_decoding: bool,
}

impl RecognizerConfig {
    pub fn new(recognizer: &str) -> Self {
        Self {
            recognizer: recognizer.into(),
            ..Self::default()
        }
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            recognizer: "recognizers/_".into(),
            language_codes: vec!["en-US".into()],
            model: "short".into(),
            auto_decoding: true,
        }
    }
}
