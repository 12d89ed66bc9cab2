use crate::domains::ring::RingConfig;
use crate::env_var;
use std::sync::LazyLock;
use std::time::Duration;

pub struct Environment {
    pub dir: String,
    pub ht_mills: u64,
    pub poll_mills: u64,
    pub report_mills: u64,
    pub log_level: tracing::Level,
}

impl Environment {
    pub fn init() -> Self {
        env_var!(
            defaults: {
                dir: String = "./coordination".to_string(),
                ht: u64 = 60000,
                poll: u64 = 1000,
                report: u64 = 15000,
                log_level: tracing::Level = tracing::Level::INFO,
            }
        );

        Self { dir, ht_mills: ht, poll_mills: poll, report_mills: report, log_level }
    }

    pub fn ring_config(&self) -> RingConfig {
        RingConfig { heartbeat_timeout: Duration::from_millis(self.ht_mills) }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_mills)
    }

    pub fn report_interval(&self) -> Duration {
        // a zero period would make tokio's interval panic
        Duration::from_millis(self.report_mills.max(1))
    }
}

pub static ENV: LazyLock<Environment> = LazyLock::new(Environment::init);
