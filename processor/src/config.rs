use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(name = "demo-processor", version, about = "Round timelines and team voice exports for CS2 demos")]
pub struct Cli {
    /// Demo files to process, each in its own worker
    #[arg(long = "demo", env = "DEMO_PATH", value_delimiter = ',', required = true)]
    pub demos: Vec<PathBuf>,

    /// Root folder for exported voice clips
    #[arg(long, env = "VOICES_DIR", default_value = "assets/output/voices")]
    pub output: PathBuf,

    /// Folder with `<steamid>.<ext>` voice clips of the demo
    #[arg(long, env = "DEMO_VOICE_DIR")]
    pub voice_dir: Option<PathBuf>,

    /// Session id to use instead of the demo's file name
    #[arg(long, conflicts_with = "generate_id")]
    pub session_id: Option<String>,

    /// Give every session a freshly generated id
    #[arg(long)]
    pub generate_id: bool,

    /// Remove previous exports before running
    #[arg(long)]
    pub clear_output: bool,

    #[arg(long, default_value_t = analysis::rounds::ROUND_START_MIN_GAP)]
    pub min_gap: u32,

    #[arg(long, value_enum, default_value_t = Collision::Overwrite)]
    pub collision: Collision,

    #[arg(long, value_enum, default_value_t = TeamOrder::FirstSeen)]
    pub team_order: TeamOrder,

    #[command(flatten)]
    pub s3: S3Args,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Args)]
pub struct S3Args {
    /// Upload clips to this bucket instead of the output folder
    #[arg(long = "s3-bucket", env = "S3_BUCKET")]
    pub bucket: Option<String>,
    #[arg(long = "s3-region", env = "S3_REGION", default_value = "us-east-1")]
    pub region: String,
    /// Key prefix of every exported object, clearing only touches objects below it
    #[arg(long = "s3-prefix", env = "S3_PREFIX", default_value = "voices")]
    pub prefix: String,
    #[arg(long = "s3-endpoint", env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,
    #[arg(long = "s3-access-key", env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,
    #[arg(long = "s3-secret-key", env = "S3_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,
}

impl S3Args {
    pub fn region(&self) -> s3::region::Region {
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.region));

        s3::region::Region::Custom {
            region: self.region.clone(),
            endpoint,
        }
    }

    pub fn credentials(&self) -> anyhow::Result<s3::creds::Credentials> {
        let credentials = s3::creds::Credentials::new(
            self.access_key.as_deref(),
            self.secret_key.as_deref(),
            None,
            None,
            None,
        )?;
        Ok(credentials)
    }
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Round start/end ticks and the rounds paired from them
    Rounds,
    /// Every tick of one round
    RoundTicks {
        #[arg(long)]
        round: usize,
    },
    /// Display name of a player
    PlayerName { steamid: u64 },
    /// Players of both teams
    Teams,
    /// Event names the demo can be queried for
    Events,
    /// Export voice clips partitioned by team
    ExportVoices,
    /// Player fields at a tick or at the end of a round
    Scoreboard {
        #[command(flatten)]
        at: ScoreboardAt,
        /// Fields to read, defaults to kills, deaths, assists and MVPs
        #[arg(long = "field")]
        fields: Vec<String>,
    },
}

#[derive(Debug, Clone, clap::Args)]
#[group(required = true, multiple = false)]
pub struct ScoreboardAt {
    #[arg(long)]
    pub round: Option<usize>,
    #[arg(long)]
    pub tick: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Collision {
    Overwrite,
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TeamOrder {
    FirstSeen,
    Numeric,
}

impl Cli {
    pub fn analysis_config(&self) -> analysis::Config {
        let mut config = analysis::Config {
            round_start_min_gap: self.min_gap,
            ..Default::default()
        };
        config.voice.collision = match self.collision {
            Collision::Overwrite => analysis::voice::CollisionPolicy::Overwrite,
            Collision::Suffix => analysis::voice::CollisionPolicy::SuffixSteamId,
        };
        config.teams.ordering = match self.team_order {
            TeamOrder::FirstSeen => analysis::teams::TeamOrdering::FirstSeen,
            TeamOrder::Numeric => analysis::teams::TeamOrdering::Numeric,
        };
        config
    }

    pub fn job(&self) -> crate::jobs::Job {
        crate::jobs::Job {
            command: self.command.clone(),
            config: self.analysis_config(),
            session_id: self.session_id.clone(),
            generate_id: self.generate_id,
            voice_dir: self.voice_dir.clone(),
        }
    }
}
