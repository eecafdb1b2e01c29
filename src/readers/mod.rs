pub mod gateway;
pub mod healthcheck;

pub use gateway::GatewayServer;
pub use healthcheck::HealthcheckServer;
