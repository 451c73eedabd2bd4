//! Dots Services
//!
//! Clients for the third-party services behind the label site (CAPTCHA,
//! catalog, preview fallback, video feed, mail) and the demo submission
//! pipeline that ties them to the file store.

pub mod captcha;
pub mod catalog;
pub mod label_store;
pub mod mailer;
pub mod preview;
pub mod submission;
pub mod videos;

pub use captcha::{CaptchaVerification, CaptchaVerifier, TurnstileVerifier};
pub use catalog::{CatalogClient, SpotifyClient};
pub use label_store::LabelStore;
pub use mailer::{GmailCredentials, GmailMailer, Mailer, TokenCache};
pub use preview::{DeezerClient, PreviewFallbackClient};
pub use submission::DemoSubmissionPipeline;
pub use videos::{VideoFeedClient, YouTubeClient, DEFAULT_MAX_RESULTS};
