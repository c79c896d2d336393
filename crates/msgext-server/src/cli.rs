use std::net::SocketAddr;

use clap::Parser;
use msgext_core::AppConfig;
use msgext_core::config::DEFAULT_AUTHORITY_HOST;
use msgext_graph::DEFAULT_GRAPH_BASE;

#[derive(Debug, Parser)]
#[command(name = "msgext-server")]
#[command(about = "Serves stock search messaging extension queries", long_about = None)]
pub struct Cli {
    /// Entra ID authority host
    #[arg(long, env = "M365_AUTHORITY_HOST", default_value = DEFAULT_AUTHORITY_HOST)]
    pub authority_host: String,

    /// App registration (client) ID
    #[arg(long, env = "M365_CLIENT_ID")]
    pub client_id: String,

    /// Directory (tenant) ID
    #[arg(long, env = "M365_TENANT_ID")]
    pub tenant_id: String,

    /// App registration client secret
    #[arg(long, env = "M365_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Public host name of the bot, used for the sign-in page URL
    #[arg(long, env = "BOT_DOMAIN")]
    pub bot_domain: String,

    #[arg(long, env = "GRAPH_BASE_URL", default_value = DEFAULT_GRAPH_BASE)]
    pub graph_base_url: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3978)]
    pub port: u16,
}

impl Cli {
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            authority_host: self.authority_host.clone(),
            client_id: self.client_id.clone(),
            tenant_id: self.tenant_id.clone(),
            client_secret: self.client_secret.clone(),
            bot_domain: self.bot_domain.clone(),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
