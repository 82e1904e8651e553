use serde::Deserialize;
use uuid::Uuid;

/// Config, from a TOML file named as the first CLI arg.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the AlumniConnect REST API.
    pub api_base_url: String,

    /// Websocket URL of the post-broadcast channel.
    pub push_url: String,

    /// Bearer credential presented on every outgoing call.
    pub auth_token: String,

    /// The user whose feed this daemon mirrors.
    pub user_id: Uuid,

    /// <address>:<port> to serve the synchronized feed on
    pub feed_listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Seconds before an outgoing API call is abandoned
    #[serde(default = "request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Seconds to wait before reopening a dropped push channel
    #[serde(default = "reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Max HTTP body size the composer endpoint accepts
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,
}

impl Config {
    /// Will crash if file isn't found or config is invalid.
    pub fn from_file(filepath: &str) -> Self {
        let contents = std::fs::read_to_string(filepath).expect("Couldn't read from config file");
        toml::from_str(&contents).expect("couldn't parse config file")
    }
}

fn request_timeout_secs() -> u64 {
    10
}

fn reconnect_delay_secs() -> u64 {
    5
}

fn max_body_size() -> usize {
    65536
}
