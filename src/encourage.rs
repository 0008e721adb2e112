// Encouragement comments from a pluggable text generator

use crate::config::EncourageConfig;
use crate::models::ClassRecord;
use eyre::{Context, Result, eyre};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

pub const DEFAULT_FALLBACK: &str = "You're doing great. Keep it up in this class!";

/// Anything that turns a prompt into text
pub trait CommentGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Fixed prompt for a short, upbeat comment about one class
pub fn build_prompt(class: &ClassRecord) -> String {
    format!(
        "Write one short, friendly sentence encouraging a student who is taking \"{}\" \
         (day: {}, period: {}). Reply with the sentence only.",
        class.name, class.day, class.period
    )
}

/// Generate an encouragement comment, falling back to `fallback` on any failure or empty output
pub fn encourage<G: CommentGenerator + ?Sized>(generator: &G, class: &ClassRecord, fallback: &str) -> String {
    match generator.generate(&build_prompt(class)) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!(class_id = class.id, "Generator returned empty text, using fallback");
            fallback.to_string()
        }
        Err(e) => {
            warn!(class_id = class.id, error = %e, "Generator failed, using fallback");
            fallback.to_string()
        }
    }
}

/// Generator used when nothing is configured; always fails so callers get the fallback
pub struct Unavailable;

impl CommentGenerator for Unavailable {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Err(eyre!("No comment generator configured"))
    }
}

/// Runs an external program, writing the prompt to its stdin and reading the reply from stdout
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &EncourageConfig) -> Option<Self> {
        config
            .command
            .as_ref()
            .map(|program| Self::new(program.clone(), config.args.clone()))
    }
}

impl CommentGenerator for CommandGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!(program = %self.program, "Running comment generator");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start generator {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(eyre!("Generator {} exited with {}", self.program, output.status));
        }

        String::from_utf8(output.stdout).context("Generator output is not UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl CommentGenerator for Fixed {
        fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn algebra() -> ClassRecord {
        ClassRecord {
            id: 1,
            name: "Algebra".to_string(),
            day: "Mon".to_string(),
            period: 2,
            term: 1,
        }
    }

    #[test]
    fn test_prompt_mentions_class() {
        let prompt = build_prompt(&algebra());
        assert!(prompt.contains("\"Algebra\""));
        assert!(prompt.contains("day: Mon"));
        assert!(prompt.contains("period: 2"));
    }

    #[test]
    fn test_generated_text_is_trimmed() {
        let text = encourage(&Fixed("  Nice work!\n"), &algebra(), DEFAULT_FALLBACK);
        assert_eq!(text, "Nice work!");
    }

    #[test]
    fn test_fallback_on_failure_or_empty_output() {
        assert_eq!(encourage(&Unavailable, &algebra(), "fallback"), "fallback");
        assert_eq!(encourage(&Fixed("   "), &algebra(), "fallback"), "fallback");
    }

    #[test]
    fn test_from_config() {
        assert!(CommandGenerator::from_config(&EncourageConfig::default()).is_none());

        let config = EncourageConfig {
            command: Some("llm".to_string()),
            args: vec!["-q".to_string()],
            ..Default::default()
        };
        let generator = CommandGenerator::from_config(&config).unwrap();
        assert_eq!(generator.program, "llm");
        assert_eq!(generator.args, vec!["-q"]);
    }

    #[test]
    fn test_missing_program_falls_back() {
        let generator = CommandGenerator::new("coursestore-no-such-generator", Vec::new());
        assert_eq!(encourage(&generator, &algebra(), "fallback"), "fallback");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_generator_reads_stdout() {
        let generator = CommandGenerator::new("sh", vec!["-c".to_string(), "cat > /dev/null; echo 'Go for it'".to_string()]);
        assert_eq!(encourage(&generator, &algebra(), "fallback"), "Go for it");
    }
}
