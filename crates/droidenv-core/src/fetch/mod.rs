//! APK acquisition through an ordered chain of resolvers.

pub mod acquire;
pub mod fdroid;
pub mod github;
pub mod resolver;
pub mod verify;

pub use acquire::{
    AcquireError, AcquiredArtifact, Acquirer, AcquisitionRequest, AttemptStage, ResolverFailure,
};
pub use fdroid::{FdroidApi, FdroidHtml};
pub use github::GithubRelease;
pub use resolver::{DirectUrl, ResolveError, ResolvedAsset, Resolver};
pub use verify::{ApkInspector, ContentInspector, VerificationGate, VerifyError};
