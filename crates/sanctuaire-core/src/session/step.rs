use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::Preferences;

/// Step id that switches a step to showing a random reading instead of its content.
pub const READING_STEP_ID: &str = "reading";

/// How the host should present a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Show the step's own content.
    Text,
    /// Show a randomly chosen reading.
    Reading,
}

/// A step as configured, before per-user duration overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub default_duration_secs: u64,
    /// Cues played when this step's countdown runs out.
    #[serde(default = "default_cue_count")]
    pub cue_count: u32,
}

fn default_cue_count() -> u32 {
    1
}

/// One resolved phase of a guided session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    pub content: String,
    pub duration_secs: u64,
    pub cue_count: u32,
}

impl Step {
    pub fn display_mode(&self) -> DisplayMode {
        if self.id == READING_STEP_ID {
            DisplayMode::Reading
        } else {
            DisplayMode::Text
        }
    }
}

/// The built-in guided sequence.
pub fn default_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition {
            id: "corps".into(),
            title: "Prise de conscience du corps en vue de la prière".into(),
            content: "Je suis dans un endroit propice à la prière, retiré, silencieux.\n\
                      Mon corps est détendu, éveillé, immobile.\n\
                      Je respire paisiblement."
                .into(),
            default_duration_secs: 30,
            cue_count: 2,
        },
        StepDefinition {
            id: "entrée".into(),
            title: "Entrée en oraison".into(),
            content: "Allons à la rencontre de Dieu qui nous attend,\n\
                      faisons un beau et lent signe de croix et disons :\n\n\
                      « Ô Toi, qui es chez Toi dans le fond de mon cœur,\n\
                      je crois que Tu es là, que Tu m’attends, dans le fond de mon cœur »\n\
                      (... acte personnel de foi, d’adoration, de confiance …)\n\n\
                      « Ô Toi, qui es chez Toi dans le fond de mon cœur,\n\
                      prends pitié de moi dans le fond de mon cœur »\n\
                      (... un acte personnel de dépendance, de repentance …)\n\n\
                      « Ô Toi, qui es chez Toi dans le fond de mon cœur,\n\
                      (.... acte personnel d’appel de l’Esprit-Saint …) »\n\
                      (... viens Esprit Saint …)\n\n\
                      « Ô Toi, qui es chez Toi dans le fond de mon cœur,\n\
                      je veux ce que tu veux dans le fond de mon cœur »\n\
                      (... acte personnel d’abandon à la Volonté divine …)"
                .into(),
            default_duration_secs: 180,
            cue_count: 3,
        },
        StepDefinition {
            id: "rencontre".into(),
            title: "A la rencontre du Christ (Cœur à cœur)".into(),
            content: "C'est le temps de l'échange silencieux. Parlez à Dieu comme à un ami, \
                      ou restez simplement dans sa présence amoureuse."
                .into(),
            default_duration_secs: 600,
            cue_count: 2,
        },
        StepDefinition {
            id: "resolution".into(),
            title: "Conclusion & Résolution".into(),
            content: "Terminez par une action de grâce. Prenez une petite résolution \
                      concrète pour votre journée."
                .into(),
            default_duration_secs: 180,
            cue_count: 1,
        },
    ]
}

/// Ordered, immutable list of steps for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSequence {
    steps: Vec<Step>,
}

impl StepSequence {
    /// Build a sequence from resolved steps.
    ///
    /// # Errors
    /// Fails on an empty list, a zero duration, or a repeated id.
    pub fn new(steps: Vec<Step>) -> Result<Self, ValidationError> {
        if steps.is_empty() {
            return Err(ValidationError::EmptyCollection("steps".into()));
        }
        let mut seen = HashSet::new();
        for step in &steps {
            if step.duration_secs == 0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("steps.{}.duration_secs", step.id),
                    message: "duration must be positive".into(),
                });
            }
            if !seen.insert(step.id.as_str()) {
                return Err(ValidationError::DuplicateId(step.id.clone()));
            }
        }
        Ok(Self { steps })
    }

    /// Apply persisted duration overrides to `definitions`.
    ///
    /// Durations are copied here once; later preference changes do not reach
    /// a sequence that has already been built.
    pub fn resolve(
        definitions: &[StepDefinition],
        preferences: &Preferences,
    ) -> Result<Self, ValidationError> {
        let steps = definitions
            .iter()
            .map(|def| Step {
                id: def.id.clone(),
                title: def.title.clone(),
                content: def.content.clone(),
                duration_secs: preferences
                    .duration_override(&def.id)
                    .unwrap_or(def.default_duration_secs),
                cue_count: def.cue_count,
            })
            .collect();
        Self::new(steps)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed sequence; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.steps.len()
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_secs).sum()
    }
}
