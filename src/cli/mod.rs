use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    // --- Chat LLM Provider Args ---
    /// API Key for the OpenAI chat completion API.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Model name for chat completion (e.g., gpt-4o, gpt-4o-mini)
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o")]
    pub chat_model: String,

    /// Base URL for an OpenAI-compatible API (the `/chat/completions` route is appended).
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub chat_base_url: String,

    /// Optional file whose contents replace the built-in system prompt.
    #[arg(long, env = "SYSTEM_PROMPT_PATH")]
    pub system_prompt_path: Option<String>,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Optional path to the TLS certificate file (PEM format) for serving HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for serving HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_key_given() {
        let args = Args::try_parse_from(["soccer-chat", "--openai-api-key", "sk-test"]).unwrap();
        assert_eq!(args.openai_api_key, "sk-test");
        assert_eq!(args.chat_model, "gpt-4o");
        assert_eq!(args.chat_base_url, "https://api.openai.com/v1");
        assert!(!args.enable_tls);
        assert!(args.system_prompt_path.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let args = Args::try_parse_from([
            "soccer-chat",
            "--openai-api-key",
            "sk-test",
            "--server-addr",
            "0.0.0.0:8080",
            "--chat-model",
            "gpt-4o-mini",
            "--debug",
        ]).unwrap();
        assert_eq!(args.server_addr, "0.0.0.0:8080");
        assert_eq!(args.chat_model, "gpt-4o-mini");
        assert!(args.debug);
    }
}
