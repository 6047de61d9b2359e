//! Text processing for the hospital kiosk
//!
//! - **Normalization**: strips transcription annotations from recognizer output
//! - **Menu intent**: keyword routing of the idle menu and termination phrases
//!
//! # Example
//!
//! ```
//! use kiosk_text_processing::{normalize_transcript, DualForm};
//!
//! let text = normalize_transcript("n/ (2시)/(두 시)에 [noise] 예약+", DualForm::Right);
//! assert_eq!(text, "두 시에 예약");
//! ```

pub mod intent;
pub mod normalize;

pub use intent::{MenuIntent, MenuIntentDetector};
pub use normalize::{normalize_transcript, DualForm};
