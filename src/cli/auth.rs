//! `missions login`.

use crate::auth::{LoginFlow, TokenManager};
use crate::config::MissionsConfig;
use crate::error::Result;

/// Handle `missions login`.
pub async fn handle_login(config: &MissionsConfig, tokens: TokenManager) -> Result<()> {
    let flow = LoginFlow::new(config, tokens);
    flow.run(&mut std::io::stdout()).await?;
    Ok(())
}
