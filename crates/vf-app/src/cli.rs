use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vf_core::job::{ADVANCED_DURATION, PHYSICS_DURATION};
use vf_core::{
    AdvancedOptions, CameraMovement, CharacterType, Desktop, Emotion, JobRequest, Mobile, Mode,
    NetworkEnvironment, PhysicsOptions, Quality, Style, UserAgent, VideoType,
};

#[derive(Parser, Debug)]
#[command(name = "vf-app", version)]
#[command(about = "Turn a prompt into a short video using a remote generation service")]
pub struct Cli {
    /// Service address, overrides VIDFORGE_API_URL and device detection
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Device identifier used to pick the service address
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Treat this device as a handset on the local network
    #[arg(long, global = true, conflicts_with = "user_agent")]
    pub mobile: bool,

    /// Client-side timeout in seconds, 0 waits forever
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Let the service write a script about a topic
    Topic(SubmitArgs),
    /// Use the text verbatim as the video script
    Script(SubmitArgs),
    /// Cinematic and character generation with full control
    Advanced {
        #[command(flatten)]
        submit: SubmitArgs,
        #[arg(long, default_value_t = VideoType::Cinematic)]
        video_type: VideoType,
        #[arg(long, default_value_t = Style::Cinematic)]
        style: Style,
        /// Only sent for character and hybrid videos
        #[arg(long, default_value_t = CharacterType::Person)]
        character: CharacterType,
        /// Only sent for character and hybrid videos
        #[arg(long, default_value_t = Emotion::Neutral)]
        emotion: Emotion,
        #[arg(long, default_value_t = Quality::Balanced)]
        quality: Quality,
        #[arg(long, default_value_t = CameraMovement::Static)]
        camera: CameraMovement,
        #[arg(long, default_value_t = 5.0, help = duration_help(&ADVANCED_DURATION))]
        duration: f64,
    },
    /// Physics simulation with fluids and particles
    Physics {
        #[command(flatten)]
        submit: SubmitArgs,
        #[arg(long)]
        no_physics: bool,
        #[arg(long)]
        no_fluid: bool,
        #[arg(long)]
        no_particles: bool,
        #[arg(long, default_value_t = 5.0, help = duration_help(&PHYSICS_DURATION))]
        duration: f64,
        /// Frames per second, 15 to 60
        #[arg(long, default_value_t = 30)]
        fps: u32,
    },
    /// Check that the service is up
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Topic, script or scene description
    pub text: String,

    /// Save the finished video here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a share message for the finished video
    #[arg(long)]
    pub share: bool,
}

fn duration_help(range: &std::ops::RangeInclusive<f64>) -> String {
    format!("Length in seconds, {} to {}", range.start(), range.end())
}

impl Cli {
    pub fn environment(&self) -> Box<dyn NetworkEnvironment> {
        match (&self.user_agent, self.mobile) {
            (_, true) => Box::new(Mobile),
            (Some(agent), false) => Box::new(UserAgent::new(agent.clone())),
            (None, false) => Box::new(Desktop),
        }
    }

    /// The generation to run, or `None` for commands that do not submit
    pub fn submission(&self) -> Option<(JobRequest, &SubmitArgs)> {
        let (submit, mode) = match &self.command {
            Command::Topic(submit) => (submit, Mode::Topic),
            Command::Script(submit) => (submit, Mode::CustomScript),
            Command::Advanced {
                submit,
                video_type,
                style,
                character,
                emotion,
                quality,
                camera,
                duration,
            } => (
                submit,
                Mode::Advanced(AdvancedOptions {
                    video_type: *video_type,
                    style: *style,
                    character_type: *character,
                    emotion: *emotion,
                    quality: *quality,
                    camera_movement: *camera,
                    duration: *duration,
                }),
            ),
            Command::Physics { submit, no_physics, no_fluid, no_particles, duration, fps } => (
                submit,
                Mode::Physics(PhysicsOptions {
                    enable_physics: !no_physics,
                    enable_fluid: !no_fluid,
                    enable_particles: !no_particles,
                    duration: *duration,
                    fps: *fps,
                }),
            ),
            Command::Health => return None,
        };
        Some((JobRequest::new(submit.text.clone(), mode), submit))
    }
}
