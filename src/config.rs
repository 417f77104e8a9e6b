use std::time::Duration;

use tracing::warn;

const DEFAULT_REVEAL_TICK_MS: u64 = 8;
const DEFAULT_COMMIT_DELAY_MS: u64 = 150;
const DEFAULT_MAX_MESSAGE_LENGTH: usize = 8000;
const DEFAULT_ECHO_LATENCY_MS: u64 = 0;
const DEFAULT_ERROR_MESSAGE: &str = "⚠️ Erro ao enviar mensagem. Tente novamente.";

/// How committed replies are printed by the host binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Interval between revealed characters.
    pub reveal_tick: Duration,
    /// Pause between the last revealed character and the commit.
    pub commit_delay: Duration,
    pub max_message_length: usize,
    /// Content of the assistant message committed when the transport fails.
    pub error_message: String,
    pub output: OutputFormat,
    /// Simulated round trip of the offline echo transport.
    pub echo_latency: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reveal_tick: Duration::from_millis(DEFAULT_REVEAL_TICK_MS),
            commit_delay: Duration::from_millis(DEFAULT_COMMIT_DELAY_MS),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            output: OutputFormat::Html,
            echo_latency: Duration::from_millis(DEFAULT_ECHO_LATENCY_MS),
        }
    }
}

impl ChatConfig {
    /// Reads `CHAT_*` variables, falling back to defaults for anything
    /// missing or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let reveal_tick = parse_or(&lookup, "CHAT_REVEAL_TICK_MS", DEFAULT_REVEAL_TICK_MS);
        let commit_delay = parse_or(&lookup, "CHAT_COMMIT_DELAY_MS", DEFAULT_COMMIT_DELAY_MS);
        let max_message_length =
            parse_or(&lookup, "CHAT_MAX_MESSAGE_LENGTH", DEFAULT_MAX_MESSAGE_LENGTH);
        let echo_latency = parse_or(&lookup, "CHAT_ECHO_LATENCY_MS", DEFAULT_ECHO_LATENCY_MS);

        let output = match lookup("CHAT_OUTPUT").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("html") => OutputFormat::Html,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                warn!("Ignoring unknown CHAT_OUTPUT '{other}', using html");
                OutputFormat::Html
            }
        };

        Self {
            // A zero tick would spin the scheduler.
            reveal_tick: Duration::from_millis(reveal_tick.max(1)),
            commit_delay: Duration::from_millis(commit_delay),
            max_message_length,
            error_message: lookup("CHAT_ERROR_MESSAGE")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.error_message),
            output,
            echo_latency: Duration::from_millis(echo_latency),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {key}='{raw}', using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ChatConfig {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ChatConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), ChatConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("CHAT_REVEAL_TICK_MS", "20"),
            ("CHAT_COMMIT_DELAY_MS", "0"),
            ("CHAT_OUTPUT", "JSON"),
            ("CHAT_ERROR_MESSAGE", "falhou"),
            ("CHAT_ECHO_LATENCY_MS", "400"),
        ]);
        assert_eq!(config.reveal_tick, Duration::from_millis(20));
        assert_eq!(config.commit_delay, Duration::ZERO);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.error_message, "falhou");
        assert_eq!(config.echo_latency, Duration::from_millis(400));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[("CHAT_REVEAL_TICK_MS", "rápido"), ("CHAT_OUTPUT", "pdf")]);
        assert_eq!(config.reveal_tick, Duration::from_millis(DEFAULT_REVEAL_TICK_MS));
        assert_eq!(config.output, OutputFormat::Html);

        let config = config_from(&[("CHAT_REVEAL_TICK_MS", "0")]);
        assert_eq!(config.reveal_tick, Duration::from_millis(1));
    }
}
