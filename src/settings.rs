use anyhow::Result;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;

/// Length of one forward step along a ray, in geometry units. This fixes
/// the spatial resolution of a cast: faces thinner than one step can be
/// missed entirely.
pub const STEP_LENGTH: f32 = 0.01;
/// Scale factor applied to the forward step during backward refinement.
pub const REFINE_SCALE: f32 = 0.1;
/// Maximum number of backward sub-steps before a refinement is considered
/// diverged.
pub const REFINE_LIMIT: usize = 10_000;
/// Minimum vector length (in geometry units) to be considered non-degenerate.
pub const VEC_LENGTH_THRESHOLD: f32 = 1e-6;

/// Tunable parameters of a single cast.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct CastParams {
    /// Forward step length. Defaults to [`STEP_LENGTH`].
    #[serde(default = "default_step_length")]
    pub step_length: f32,
    /// Backward refinement scale. Defaults to [`REFINE_SCALE`].
    #[serde(default = "default_refine_scale")]
    pub refine_scale: f32,
    /// Backward refinement bound. Defaults to [`REFINE_LIMIT`].
    #[serde(default = "default_refine_limit")]
    pub refine_limit: usize,
}

fn default_step_length() -> f32 {
    STEP_LENGTH
}

fn default_refine_scale() -> f32 {
    REFINE_SCALE
}

fn default_refine_limit() -> usize {
    REFINE_LIMIT
}

impl Default for CastParams {
    fn default() -> Self {
        Self {
            step_length: STEP_LENGTH,
            refine_scale: REFINE_SCALE,
            refine_limit: REFINE_LIMIT,
        }
    }
}

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub geom_name: String,
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub max_distance: f32,
    #[serde(default)]
    pub cast: CastParams,
    #[serde(default)]
    pub probes: Vec<[f32; 3]>,
    pub seed: Option<u64>,
}

pub fn load_default_config() -> Result<Settings> {
    let root_dir = retrieve_project_root();
    let default_config_file = root_dir.join("config/default.toml");

    let settings: Config = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    validate_config(&config);

    Ok(config)
}

pub fn load_config() -> Result<Settings> {
    let root_dir = retrieve_project_root();

    let default_config_file = root_dir.join("config/default.toml");
    let local_config = root_dir.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        println!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        println!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings: Config = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("meshcast"))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let mut config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    // Parse command-line arguments and override values
    let args = CliArgs::parse();

    if let Some(geo) = args.geo {
        config.geom_name = geo;
    }
    if let Some(origin) = args.origin {
        config.origin = origin;
    }
    if let Some(direction) = args.direction {
        config.direction = direction;
    }
    if let Some(dist) = args.dist {
        config.max_distance = dist;
    }
    if let Some(step) = args.step {
        config.cast.step_length = step;
    }
    if let Some(probes) = args.probe {
        config.probes = probes;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    validate_config(&config);

    println!("{}", config);

    Ok(config)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the MESHCAST_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
/// If none of these methods work, the function will panic.
fn retrieve_project_root() -> std::path::PathBuf {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        std::path::PathBuf::from(manifest_dir)
    } else if let Ok(path) = env::var("MESHCAST_ROOT_DIR") {
        // Allow explicit configuration via environment variable
        std::path::PathBuf::from(path)
    } else {
        // Fallback: walk upward from the executable directory until a
        // "config" subdirectory is found
        let exe_path = env::current_exe().expect("Failed to get current executable path");
        let mut current_dir = exe_path
            .parent()
            .expect("Failed to get executable directory")
            .to_path_buf();
        let mut found = false;

        while !found && current_dir.parent().is_some() {
            if current_dir.join("config").is_dir() {
                found = true;
            } else {
                current_dir = current_dir.parent().unwrap().to_path_buf();
            }
        }

        if found {
            current_dir
        } else {
            panic!("Could not find project root directory");
        }
    }
}

fn validate_config(config: &Settings) {
    assert!(
        config.max_distance > 0.0,
        "Maximum cast distance must be greater than 0"
    );
    assert!(
        config.cast.step_length > 0.0,
        "Step length must be greater than 0"
    );
    assert!(
        config.cast.refine_scale > 0.0 && config.cast.refine_scale <= 1.0,
        "Refinement scale must lie in (0, 1]"
    );
    assert!(
        config.cast.refine_limit > 0,
        "Refinement bound must be greater than 0"
    );
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "meshcast - cast rays through OBJ meshes and classify inside/outside crossings"
)]
pub struct CliArgs {
    /// File path to the input geometry.
    /// Currently, only the Wavefront .obj format is supported.
    #[arg(short, long)]
    geo: Option<String>,

    /// Ray origin in the format "x,y,z".
    #[arg(short, long, value_parser = parse_point)]
    origin: Option<[f32; 3]>,

    /// Ray direction in the format "x,y,z". Need not be unit length.
    #[arg(short, long, value_parser = parse_point)]
    direction: Option<[f32; 3]>,

    /// Maximum cast distance from the origin.
    #[arg(long)]
    dist: Option<f32>,

    /// Forward step length of the cast.
    #[arg(long)]
    step: Option<f32>,

    /// Containment probe points, separated by spaces.
    /// Format: x1,y1,z1 x2,y2,z2 ...
    #[arg(short, long, value_parser = parse_point, num_args = 1.., value_delimiter = ' ')]
    probe: Option<Vec<[f32; 3]>>,

    /// Random seed for probe cast directions.
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Parse a point or vector in the format "x,y,z"
fn parse_point(s: &str) -> Result<[f32; 3], String> {
    let components: Vec<&str> = s.split(',').collect();
    if components.len() != 3 {
        return Err(format!(
            "Invalid point format: '{}'. Expected 'x,y,z'",
            s
        ));
    }

    let x = components[0]
        .parse::<f32>()
        .map_err(|_| format!("Failed to parse x component: {}", components[0]))?;
    let y = components[1]
        .parse::<f32>()
        .map_err(|_| format!("Failed to parse y component: {}", components[1]))?;
    let z = components[2]
        .parse::<f32>()
        .map_err(|_| format!("Failed to parse z component: {}", components[2]))?;

    Ok([x, y, z])
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Geometry: {}
  - Origin: {:?}
  - Direction: {:?}
  - Max Distance: {:.6}
  - Step Length: {:.6}
  - Probes: {}
  ",
            self.geom_name,
            self.origin,
            self.direction,
            self.max_distance,
            self.cast.step_length,
            self.probes.len(),
        )
    }
}
