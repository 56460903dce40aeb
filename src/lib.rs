pub mod config;
pub mod error;
pub mod mailbox;
pub mod phase;
pub mod traffic_light;

pub use config::LightConfig;
pub use error::Error;
pub use mailbox::Mailbox;
pub use phase::Phase;
pub use traffic_light::TrafficLight;
