#[derive(Debug)]
pub enum Error {
    AlreadySimulating,
    Stopped,
    InvalidConfig(String),
    Spawn(std::io::Error),
    TimerPanicked,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AlreadySimulating => write!(f, "AlreadySimulating: timer is already running"),
            Error::Stopped => write!(f, "Stopped: traffic light has been shut down"),
            Error::InvalidConfig(message) => write!(f, "InvalidConfig: {}", message),
            Error::Spawn(e) => write!(f, "Failed to spawn timer thread: {}", e),
            Error::TimerPanicked => write!(f, "TimerPanicked"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
