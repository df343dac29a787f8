//! Generation requests: the option domains exposed to the user, the
//! normalized [`JobSpecification`] sent to the service and the
//! [`JobRequest::normalize`] step that maps one onto the other.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{ParseOptionError, RequestError};

/// Allowed clip length for advanced generations, in seconds.
pub const ADVANCED_DURATION: RangeInclusive<f64> = 3.0..=60.0;
/// Allowed clip length for physics simulations, in seconds.
pub const PHYSICS_DURATION: RangeInclusive<f64> = 3.0..=10.0;
/// Allowed frame rate for physics simulations.
pub const PHYSICS_FPS: RangeInclusive<u32> = 15..=60;

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($id:literal, $label:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Identifier used on the wire and on the command line
            pub fn id(&self) -> &'static str {
                match self {
                    $(Self::$variant => $id),+
                }
            }

            /// Name for display
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.id())
            }
        }

        impl FromStr for $name {
            type Err = ParseOptionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase().replace('-', "_");
                Self::all()
                    .iter()
                    .copied()
                    .find(|option| option.id() == needle)
                    .ok_or_else(|| ParseOptionError {
                        kind: stringify!($name),
                        value: s.to_string(),
                        expected: Self::all()
                            .iter()
                            .map(|option| option.id())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.id())
            }
        }
    };
}

option_enum! {
    /// Overall composition of an advanced generation
    VideoType {
        Cinematic => ("cinematic", "Cinematic"),
        Character => ("character", "Character Animation"),
        Hybrid => ("hybrid", "Hybrid (Character + Background)"),
    }
}

impl VideoType {
    /// Whether the character options mean anything for this composition
    pub fn has_character(&self) -> bool {
        matches!(self, Self::Character | Self::Hybrid)
    }
}

option_enum! {
    Style {
        Cinematic => ("cinematic", "Cinematic"),
        Anime => ("anime", "Anime"),
        Realistic => ("realistic", "Realistic"),
        Abstract => ("abstract", "Abstract"),
        Vintage => ("vintage", "Vintage"),
        Neon => ("neon", "Neon"),
        Noir => ("noir", "Noir"),
        Watercolor => ("watercolor", "Watercolor"),
    }
}

option_enum! {
    CharacterType {
        Person => ("person", "Person"),
        Animal => ("animal", "Animal"),
        Cartoon => ("cartoon", "Cartoon"),
        Robot => ("robot", "Robot"),
        Fantasy => ("fantasy", "Fantasy"),
    }
}

option_enum! {
    Emotion {
        Neutral => ("neutral", "Neutral"),
        Happy => ("happy", "Happy"),
        Sad => ("sad", "Sad"),
        Angry => ("angry", "Angry"),
        Surprised => ("surprised", "Surprised"),
        Excited => ("excited", "Excited"),
        Calm => ("calm", "Calm"),
        Confident => ("confident", "Confident"),
    }
}

option_enum! {
    /// Render quality tier, slowest last
    Quality {
        Speed => ("speed", "Speed"),
        Balanced => ("balanced", "Balanced"),
        Quality => ("quality", "Quality"),
        High => ("high", "High"),
        Ultra => ("ultra", "Ultra"),
    }
}

option_enum! {
    CameraMovement {
        Static => ("static", "Static"),
        SlowZoomIn => ("slow_zoom_in", "Slow Zoom In"),
        SlowZoomOut => ("slow_zoom_out", "Slow Zoom Out"),
        PanLeft => ("pan_left", "Pan Left"),
        PanRight => ("pan_right", "Pan Right"),
        TiltUp => ("tilt_up", "Tilt Up"),
        TiltDown => ("tilt_down", "Tilt Down"),
        OrbitLeft => ("orbit_left", "Orbit Left"),
        OrbitRight => ("orbit_right", "Orbit Right"),
    }
}

/// Service endpoint a job is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GenerateVideo,
    GenerateAdvancedVideo,
    GeneratePhysicsVideo,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::GenerateVideo => "/generate-video",
            Self::GenerateAdvancedVideo => "/generate-advanced-video",
            Self::GeneratePhysicsVideo => "/generate-physics-video",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvancedOptions {
    pub video_type: VideoType,
    pub style: Style,
    pub character_type: CharacterType,
    pub emotion: Emotion,
    pub quality: Quality,
    pub camera_movement: CameraMovement,
    pub duration: f64,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            video_type: VideoType::Cinematic,
            style: Style::Cinematic,
            character_type: CharacterType::Person,
            emotion: Emotion::Neutral,
            quality: Quality::Balanced,
            camera_movement: CameraMovement::Static,
            duration: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsOptions {
    pub enable_physics: bool,
    pub enable_fluid: bool,
    pub enable_particles: bool,
    pub duration: f64,
    pub fps: u32,
}

impl Default for PhysicsOptions {
    fn default() -> Self {
        Self {
            enable_physics: true,
            enable_fluid: true,
            enable_particles: true,
            duration: 5.0,
            fps: 30,
        }
    }
}

/// Which generator the user picked, with its options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// The service writes the script from a topic.
    Topic,
    /// The text is used verbatim as the script.
    CustomScript,
    Advanced(AdvancedOptions),
    Physics(PhysicsOptions),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Topic => "AI Topic",
            Self::CustomScript => "Script to Video",
            Self::Advanced(_) => "Advanced AI",
            Self::Physics(_) => "Physics",
        }
    }
}

/// Raw form input: free text plus the active mode
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub text: String,
    pub mode: Mode,
}

impl JobRequest {
    pub fn new(text: impl Into<String>, mode: Mode) -> Self {
        Self { text: text.into(), mode }
    }

    /// Builds the job to send and the endpoint to send it to.
    ///
    /// Returns `Ok(None)` when the text is empty after trimming: there is
    /// nothing to submit and the caller must not touch any state.
    pub fn normalize(&self) -> Result<Option<(Endpoint, JobSpecification)>, RequestError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let text = text.to_string();

        let job = match self.mode {
            Mode::Topic => JobSpecification::Script(ScriptJob { text, is_custom: false }),
            Mode::CustomScript => JobSpecification::Advanced(AdvancedJob::custom_script(text)),
            Mode::Advanced(options) => {
                check_range("duration", options.duration, &ADVANCED_DURATION)?;
                JobSpecification::Advanced(AdvancedJob::from_options(text, &options))
            }
            Mode::Physics(options) => {
                check_range("duration", options.duration, &PHYSICS_DURATION)?;
                if !PHYSICS_FPS.contains(&options.fps) {
                    return Err(RequestError::OutOfRange {
                        field: "fps",
                        min: f64::from(*PHYSICS_FPS.start()),
                        max: f64::from(*PHYSICS_FPS.end()),
                        value: f64::from(options.fps),
                    });
                }
                JobSpecification::Physics(PhysicsJob {
                    text,
                    enable_physics: options.enable_physics,
                    enable_fluid: options.enable_fluid,
                    enable_particles: options.enable_particles,
                    duration: options.duration,
                    fps: options.fps,
                })
            }
        };

        Ok(Some((job.endpoint(), job)))
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), RequestError> {
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(RequestError::OutOfRange { field, min: *range.start(), max: *range.end(), value })
    }
}

/// Normalized job, serialized as the request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobSpecification {
    Script(ScriptJob),
    Advanced(AdvancedJob),
    Physics(PhysicsJob),
}

impl JobSpecification {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Script(_) => Endpoint::GenerateVideo,
            Self::Advanced(_) => Endpoint::GenerateAdvancedVideo,
            Self::Physics(_) => Endpoint::GeneratePhysicsVideo,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Script(job) => &job.text,
            Self::Advanced(job) => &job.text,
            Self::Physics(job) => &job.text,
        }
    }

    pub fn is_custom_script(&self) -> bool {
        match self {
            Self::Script(job) => job.is_custom,
            Self::Advanced(job) => job.is_custom,
            Self::Physics(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptJob {
    pub text: String,
    pub is_custom: bool,
}

/// Advanced job body.
///
/// `character_type` and `emotion` are only sent for compositions that have a
/// character; the service falls back to its own defaults otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedJob {
    pub text: String,
    pub is_custom: bool,
    pub video_type: VideoType,
    pub style: Style,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_type: Option<CharacterType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
    pub quality: Quality,
    pub camera_movement: CameraMovement,
    pub duration: f64,
}

impl AdvancedJob {
    fn custom_script(text: String) -> Self {
        Self {
            text,
            is_custom: true,
            video_type: VideoType::Cinematic,
            style: Style::Cinematic,
            character_type: None,
            emotion: None,
            quality: Quality::High,
            camera_movement: CameraMovement::SlowZoomIn,
            duration: 10.0,
        }
    }

    fn from_options(text: String, options: &AdvancedOptions) -> Self {
        let with_character = options.video_type.has_character();
        Self {
            text,
            is_custom: true,
            video_type: options.video_type,
            style: options.style,
            character_type: with_character.then_some(options.character_type),
            emotion: with_character.then_some(options.emotion),
            quality: options.quality,
            camera_movement: options.camera_movement,
            duration: options.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicsJob {
    pub text: String,
    pub enable_physics: bool,
    pub enable_fluid: bool,
    pub enable_particles: bool,
    pub duration: f64,
    pub fps: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn body(job: &JobSpecification) -> Value {
        serde_json::to_value(job).unwrap()
    }

    fn normalized(text: &str, mode: Mode) -> (Endpoint, JobSpecification) {
        JobRequest::new(text, mode).normalize().unwrap().unwrap()
    }

    #[test]
    fn test_topic_routes_to_basic_endpoint() {
        let (endpoint, job) = normalized("5 productivity hacks", Mode::Topic);
        assert_eq!(endpoint, Endpoint::GenerateVideo);
        assert_eq!(endpoint.path(), "/generate-video");
        assert_eq!(body(&job), json!({"text": "5 productivity hacks", "is_custom": false}));
    }

    #[test]
    fn test_custom_script_sends_fixed_defaults() {
        let (endpoint, job) = normalized("  my own script  ", Mode::CustomScript);
        assert_eq!(endpoint, Endpoint::GenerateAdvancedVideo);
        assert!(job.is_custom_script());
        assert_eq!(
            body(&job),
            json!({
                "text": "my own script",
                "is_custom": true,
                "video_type": "cinematic",
                "style": "cinematic",
                "quality": "high",
                "camera_movement": "slow_zoom_in",
                "duration": 10.0
            })
        );
    }

    #[test]
    fn test_physics_boundaries() {
        let options = PhysicsOptions { duration: 10.0, fps: 60, ..PhysicsOptions::default() };
        let (endpoint, job) = normalized("water on a leaf", Mode::Physics(options));
        assert_eq!(endpoint.path(), "/generate-physics-video");
        assert!(!job.is_custom_script());
        assert_eq!(
            body(&job),
            json!({
                "text": "water on a leaf",
                "enable_physics": true,
                "enable_fluid": true,
                "enable_particles": true,
                "duration": 10.0,
                "fps": 60
            })
        );
    }

    #[test]
    fn test_physics_text_is_trimmed() {
        let (_, job) = normalized("\n smoke rising \t", Mode::Physics(PhysicsOptions::default()));
        assert_eq!(job.text(), "smoke rising");
    }

    #[test]
    fn test_character_fields_follow_video_type() {
        for video_type in VideoType::all() {
            let options = AdvancedOptions {
                video_type: *video_type,
                character_type: CharacterType::Robot,
                emotion: Emotion::Excited,
                ..AdvancedOptions::default()
            };
            let (endpoint, job) = normalized("a robot dancing", Mode::Advanced(options));
            assert_eq!(endpoint, Endpoint::GenerateAdvancedVideo);

            let value = body(&job);
            let fields = value.as_object().unwrap();
            if video_type.has_character() {
                assert_eq!(fields["character_type"], "robot");
                assert_eq!(fields["emotion"], "excited");
            } else {
                assert!(!fields.contains_key("character_type"));
                assert!(!fields.contains_key("emotion"));
            }
        }
    }

    #[test]
    fn test_advanced_body_fields_stay_in_domain() {
        let options = AdvancedOptions {
            video_type: VideoType::Hybrid,
            style: Style::Watercolor,
            quality: Quality::Ultra,
            camera_movement: CameraMovement::OrbitRight,
            duration: 60.0,
            ..AdvancedOptions::default()
        };
        let (_, job) = normalized("a fox in the snow", Mode::Advanced(options));
        let value = body(&job);

        let ids = |all: Vec<&str>, key: &str| {
            assert!(all.iter().any(|id| value[key] == *id), "{key} out of domain");
        };
        ids(VideoType::all().iter().map(|v| v.id()).collect(), "video_type");
        ids(Style::all().iter().map(|v| v.id()).collect(), "style");
        ids(CharacterType::all().iter().map(|v| v.id()).collect(), "character_type");
        ids(Emotion::all().iter().map(|v| v.id()).collect(), "emotion");
        ids(Quality::all().iter().map(|v| v.id()).collect(), "quality");
        ids(CameraMovement::all().iter().map(|v| v.id()).collect(), "camera_movement");
        assert_eq!(value["duration"], 60.0);
        assert_eq!(value["is_custom"], true);
    }

    #[test]
    fn test_blank_text_is_skipped() {
        for text in ["", "   ", "\n\t "] {
            for mode in [
                Mode::Topic,
                Mode::CustomScript,
                Mode::Advanced(AdvancedOptions::default()),
                Mode::Physics(PhysicsOptions::default()),
            ] {
                assert_eq!(JobRequest::new(text, mode).normalize(), Ok(None));
            }
        }
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let too_long = AdvancedOptions { duration: 60.5, ..AdvancedOptions::default() };
        assert!(matches!(
            JobRequest::new("x", Mode::Advanced(too_long)).normalize(),
            Err(RequestError::OutOfRange { field: "duration", .. })
        ));

        let not_a_number = AdvancedOptions { duration: f64::NAN, ..AdvancedOptions::default() };
        assert!(JobRequest::new("x", Mode::Advanced(not_a_number)).normalize().is_err());

        let slow = PhysicsOptions { fps: 14, ..PhysicsOptions::default() };
        assert!(matches!(
            JobRequest::new("x", Mode::Physics(slow)).normalize(),
            Err(RequestError::OutOfRange { field: "fps", .. })
        ));

        let long = PhysicsOptions { duration: 10.5, ..PhysicsOptions::default() };
        assert!(JobRequest::new("x", Mode::Physics(long)).normalize().is_err());
    }

    #[test]
    fn test_blank_text_wins_over_range_errors() {
        let slow = PhysicsOptions { fps: 1, ..PhysicsOptions::default() };
        assert_eq!(JobRequest::new(" ", Mode::Physics(slow)).normalize(), Ok(None));
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!("slow-zoom-in".parse::<CameraMovement>(), Ok(CameraMovement::SlowZoomIn));
        assert_eq!("NOIR".parse::<Style>(), Ok(Style::Noir));
        assert_eq!(" hybrid ".parse::<VideoType>(), Ok(VideoType::Hybrid));

        let err = "medium".parse::<Quality>().unwrap_err();
        assert_eq!(err.kind, "Quality");
        assert!(err.expected.contains("balanced"));
    }

    #[test]
    fn test_option_domains() {
        assert_eq!(VideoType::all().len(), 3);
        assert_eq!(Style::all().len(), 8);
        assert_eq!(CharacterType::all().len(), 5);
        assert_eq!(Emotion::all().len(), 8);
        assert_eq!(Quality::all().len(), 5);
        assert_eq!(CameraMovement::all().len(), 9);
    }
}
