pub mod cli;
pub mod client;
pub mod config;
pub mod llm;
pub mod models;
pub mod server;

use cli::Args;
use config::prompt::resolve_system_prompt;
use llm::LlmConfig;
use log::info;
use server::Server;
use server::api::AppState;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!(
        "System Prompt: {}",
        args.system_prompt_path.as_deref().unwrap_or("built-in")
    );
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let system_prompt = resolve_system_prompt(args.system_prompt_path.as_deref())?;

    let llm_config = LlmConfig {
        api_key: args.openai_api_key.clone(),
        completion_model: Some(args.chat_model.clone()),
        base_url: Some(args.chat_base_url.clone()),
    };
    let chat_client = llm::chat::new_client(&llm_config)?;

    let state = AppState::new(chat_client, system_prompt);
    let server = Server::new(args.server_addr.clone(), state, args);
    server.run().await?;

    Ok(())
}
