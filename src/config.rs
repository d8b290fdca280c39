//! Application-level configuration loading, including the default question
//! deck used when a room is created without custom questions.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::ChoiceEntity;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/questions.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_HUNT_BACK_CONFIG_PATH";

/// A question template from the deck: the trivia part plus the scavenger
/// challenge tied to it. Room creation stamps these with ids and positions.
#[derive(Debug, Clone)]
pub struct DeckQuestion {
    /// Question text.
    pub stem: String,
    /// Ordered answer choices; exactly one is correct.
    pub choices: Vec<ChoiceEntity>,
    /// Physical challenge tied to the question.
    pub scavenger_instruction: String,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    deck: Vec<DeckQuestion>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in default deck.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    if config.deck.is_empty() {
                        warn!(
                            path = %path.display(),
                            "config contains no questions; using built-in deck"
                        );
                        return Self::default();
                    }
                    info!(
                        path = %path.display(),
                        count = config.deck.len(),
                        "loaded question deck from config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to the default deck"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in question deck"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to the default deck"
                );
                Self::default()
            }
        }
    }

    /// Deck entry for the given 0-based slot, cycling when a game needs more
    /// questions than the deck holds.
    pub fn deck_question(&self, index: usize) -> &DeckQuestion {
        &self.deck[index % self.deck.len()]
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deck: default_deck(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file.
struct RawConfig {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of one deck entry.
struct RawQuestion {
    stem: String,
    choices: Vec<RawChoice>,
    scavenger: String,
}

#[derive(Debug, Deserialize)]
/// JSON representation of an answer choice.
struct RawChoice {
    id: String,
    label: String,
    #[serde(default)]
    is_correct: bool,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let deck = value
            .questions
            .into_iter()
            .map(|question| DeckQuestion {
                stem: question.stem,
                choices: question
                    .choices
                    .into_iter()
                    .map(|choice| ChoiceEntity {
                        id: choice.id,
                        label: choice.label,
                        is_correct: choice.is_correct,
                    })
                    .collect(),
                scavenger_instruction: question.scavenger,
            })
            .collect();
        Self { deck }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn choices(labels: [(&str, &str); 4], correct: &str) -> Vec<ChoiceEntity> {
    labels
        .into_iter()
        .map(|(id, label)| ChoiceEntity {
            id: id.to_string(),
            label: label.to_string(),
            is_correct: id == correct,
        })
        .collect()
}

/// Built-in question deck shipped with the binary.
fn default_deck() -> Vec<DeckQuestion> {
    vec![
        DeckQuestion {
            stem: "What color do you get when you mix blue and yellow?".into(),
            choices: choices(
                [
                    ("a", "Red"),
                    ("b", "Green"),
                    ("c", "Orange"),
                    ("d", "Purple"),
                ],
                "b",
            ),
            scavenger_instruction: "Find something or someone wearing the color green!".into(),
        },
        DeckQuestion {
            stem: "What do bees make?".into(),
            choices: choices(
                [
                    ("a", "Wax"),
                    ("b", "Pollen"),
                    ("c", "Honey"),
                    ("d", "Nectar"),
                ],
                "c",
            ),
            scavenger_instruction:
                "Find something that's as sweet as honey! A snack, a drink, or a cheerful teammate."
                    .into(),
        },
        DeckQuestion {
            stem: "Which part of your body lets you smell?".into(),
            choices: choices(
                [
                    ("a", "Nose"),
                    ("b", "Eyes"),
                    ("c", "Mouth"),
                    ("d", "Hands"),
                ],
                "a",
            ),
            scavenger_instruction:
                "Find something that smells good! Perfume, food, or an air freshener.".into(),
        },
        DeckQuestion {
            stem: "What do you call a baby cat?".into(),
            choices: choices(
                [("a", "Cub"), ("b", "Kitten"), ("c", "Pup"), ("d", "Calf")],
                "b",
            ),
            scavenger_instruction:
                "Find something small and cute! A stuffed toy or the smallest item on your desk."
                    .into(),
        },
        DeckQuestion {
            stem: "How many days are there in a leap year?".into(),
            choices: choices(
                [("a", "365"), ("b", "364"), ("c", "366"), ("d", "367")],
                "c",
            ),
            scavenger_instruction:
                "Find something that represents the number 366. A calendar counts; so does a calculator."
                    .into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deck_is_well_formed() {
        let config = AppConfig::default();
        for index in 0..5 {
            let question = config.deck_question(index);
            let correct = question
                .choices
                .iter()
                .filter(|choice| choice.is_correct)
                .count();
            assert_eq!(correct, 1, "{} lacks a unique answer", question.stem);
        }
    }

    #[test]
    fn deck_cycles_past_its_length() {
        let config = AppConfig::default();
        assert_eq!(config.deck_question(0).stem, config.deck_question(5).stem);
        assert_eq!(config.deck_question(2).stem, config.deck_question(12).stem);
    }

    #[test]
    fn raw_config_parses_into_a_deck() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "questions": [{
                    "stem": "Two plus two?",
                    "choices": [
                        {"id": "a", "label": "3"},
                        {"id": "b", "label": "4", "is_correct": true}
                    ],
                    "scavenger": "Find four of anything."
                }]
            }"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        let question = config.deck_question(0);
        assert_eq!(question.stem, "Two plus two?");
        assert!(question.choices[1].is_correct);
    }
}
