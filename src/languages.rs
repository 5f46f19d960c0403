//! Language adapters
//!
//! One adapter per supported language, loaded from the embedded
//! `files/languages.toml`. The adapter is the single source of the
//! compiled-vs-interpreted distinction: a language with a compile command
//! goes through the compile stage, one without runs its source directly
//! under the interpreter named in the run command.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{EngineError, Result};

/// Configuration for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Canonical language name (e.g. "c", "python")
    pub name: String,
    /// Name the submission source takes inside the workspace (e.g. "main.c")
    pub source_file: String,
    /// Compile command (None for interpreted languages)
    pub compile_command: Option<Vec<String>>,
    /// Run command
    pub run_command: Vec<String>,
}

impl LanguageConfig {
    /// Whether this language needs a compile stage
    pub fn is_compiled(&self) -> bool {
        self.compile_command.is_some()
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    source_file: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Global language configurations
static LANGUAGES: OnceLock<HashMap<String, LanguageConfig>> = OnceLock::new();

fn load_languages() -> HashMap<String, LanguageConfig> {
    let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
    parse_languages(content).expect("embedded languages.toml is valid")
}

fn parse_languages(
    content: &str,
) -> std::result::Result<HashMap<String, LanguageConfig>, toml::de::Error> {
    let raw_configs: HashMap<String, RawLanguageConfig> = toml::from_str(content)?;

    let mut languages = HashMap::new();
    for (name, raw) in raw_configs {
        let config = LanguageConfig {
            name: name.to_lowercase(),
            source_file: raw.source_file,
            compile_command: raw.compile_command.as_deref().map(into_command),
            run_command: into_command(&raw.run_command),
        };

        for alias in &raw.aliases {
            languages.insert(alias.to_lowercase(), config.clone());
        }
        languages.insert(name.to_lowercase(), config);
    }

    Ok(languages)
}

/// Look up the adapter for a declared language name or alias
pub fn get_language_config(language: &str) -> Result<LanguageConfig> {
    LANGUAGES
        .get_or_init(load_languages)
        .get(&language.to_lowercase())
        .cloned()
        .ok_or_else(|| EngineError::UnsupportedLanguage(language.to_string()))
}

/// All supported language names, including aliases
pub fn supported_languages() -> Vec<String> {
    LANGUAGES.get_or_init(load_languages).keys().cloned().collect()
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_is_compiled() {
        let config = get_language_config("c").unwrap();
        assert!(config.is_compiled());
        assert_eq!(config.source_file, "main.c");
        assert_eq!(config.run_command, vec!["./main"]);
    }

    #[test]
    fn python_is_interpreted() {
        let config = get_language_config("python").unwrap();
        assert!(!config.is_compiled());
        assert_eq!(config.run_command, vec!["python3", "main.py"]);
    }

    #[test]
    fn aliases_resolve() {
        let config = get_language_config("py").unwrap();
        assert_eq!(config.name, "python");
        let config = get_language_config("Python3").unwrap();
        assert_eq!(config.name, "python");
    }

    #[test]
    fn supported_languages_cover_names_and_aliases() {
        let names = supported_languages();
        for expected in ["c", "python", "py", "python3", "gcc"] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(matches!(
            get_language_config("cobol"),
            Err(EngineError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn commands_are_argument_lists() {
        let parsed = parse_languages(
            r#"
[c]
source_file = "main.c"
compile_command = "gcc main.c -o main -O2 -w"
run_command = "./main"
"#,
        )
        .unwrap();
        let compile = parsed["c"].compile_command.as_ref().unwrap();
        assert_eq!(compile[0], "gcc");
        assert_eq!(compile.len(), 6);
    }
}
