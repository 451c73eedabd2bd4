//! Data models for the application

pub mod catalog;
pub mod demo;
pub mod video;

pub use catalog::{
    ArtistProfile, CatalogImage, EventRecord, PlaylistData, PlaylistInfo, PlaylistItem,
    PlaylistOwner, PlaylistTrack, PreviewLookup, RosterEntry, TrackAlbum, TrackArtist,
};
pub use demo::{
    ConfirmUploadRequest, DemoFile, DemoMetadata, DemoSubmission, EmailStatus, RelayForm,
    SubmissionOutcome, SubmissionResponse, UploadLink, UploadLinkRequest, UploadLinkResponse,
};
pub use video::{ChannelVideo, VideoFeed};
