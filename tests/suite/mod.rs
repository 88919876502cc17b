mod ollama_session;
mod session_flow;
mod settings_flow;
