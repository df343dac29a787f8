pub mod address;
pub mod error;
pub mod job;
pub mod progress;
pub mod result;

pub use address::{AddressResolver, Desktop, Mobile, NetworkEnvironment, UserAgent};
pub use error::{ParseOptionError, RequestError};
pub use job::{
    AdvancedOptions, CameraMovement, CharacterType, Emotion, Endpoint, JobRequest,
    JobSpecification, Mode, PhysicsOptions, Quality, Style, VideoType,
};
pub use progress::{ProgressEvent, ProgressState, Stage, StepStatus};
pub use result::GenerationResult;
