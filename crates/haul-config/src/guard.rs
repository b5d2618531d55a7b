//! Route guard configuration.

use serde::{Deserialize, Serialize};

fn default_public_route() -> String {
    "/".into()
}

fn default_dashboard_route() -> String {
    "/dashboard".into()
}

const fn default_redirect_delay_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuardConfig {
    /// Where signed-out visitors are sent.
    #[serde(default = "default_public_route")]
    pub public_route: String,

    /// Where signed-in users without the required role are sent.
    #[serde(default = "default_dashboard_route")]
    pub dashboard_route: String,

    /// How long a denial notice stays visible before navigating.
    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            public_route: default_public_route(),
            dashboard_route: default_dashboard_route(),
            redirect_delay_ms: default_redirect_delay_ms(),
        }
    }
}
