#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod counts;
pub mod diagnostics;
pub mod discovery;
pub mod endpoints;
pub mod error;
pub mod hydration;
pub mod identity;
pub mod normalize;
pub mod session;
pub mod shape;
pub mod transport;
pub mod view;

pub use mentornet_core::Clock;

pub use app_services::AppServices;
pub use config::MentorNetConfig;
pub use counts::{CourseCount, EnrollmentCounts};
pub use diagnostics::{CandidateAttempt, Diagnostics, Stage};
pub use discovery::{CourseDiscovery, DiscoveredCourse, DiscoveryOutcome, DiscoverySource};
pub use error::{AppServicesError, CandidateMissReason, ConfigError, TransportError};
pub use hydration::ProgressHydrator;
pub use identity::{IdentityResolution, IdentityResolver, IdentitySource};
pub use session::{EnrollmentSession, LoadOutcome, LoadPhase, Notice, SessionSnapshot, ViewState};
pub use transport::{FixtureTransport, HttpResponse, ReqwestTransport, Transport};
pub use view::{EnrollmentRow, EnrollmentView};
