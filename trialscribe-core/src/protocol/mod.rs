//! Protocol domain types
//!
//! A [`ProtocolRequest`] describes the trial to draft; a [`Protocol`] is the
//! structured result, always carrying every [`ProtocolSection`].

pub mod structurer;

pub use structurer::{StructuringFailure, structure};

use crate::error::AssistantError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Clinical trial phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StudyPhase {
    Phase1,
    Phase2,
    Phase3,
    Phase4,
}

impl StudyPhase {
    pub const ALL: [StudyPhase; 4] = [
        StudyPhase::Phase1,
        StudyPhase::Phase2,
        StudyPhase::Phase3,
        StudyPhase::Phase4,
    ];

    /// Numeric phase value as rendered in prompts
    pub fn number(self) -> u8 {
        match self {
            StudyPhase::Phase1 => 1,
            StudyPhase::Phase2 => 2,
            StudyPhase::Phase3 => 3,
            StudyPhase::Phase4 => 4,
        }
    }
}

impl TryFrom<u8> for StudyPhase {
    type Error = AssistantError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(StudyPhase::Phase1),
            2 => Ok(StudyPhase::Phase2),
            3 => Ok(StudyPhase::Phase3),
            4 => Ok(StudyPhase::Phase4),
            other => Err(AssistantError::InvalidRequest(format!(
                "study phase must be 1-4, got {other}"
            ))),
        }
    }
}

impl From<StudyPhase> for u8 {
    fn from(phase: StudyPhase) -> Self {
        phase.number()
    }
}

impl fmt::Display for StudyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Fixed set of sections every structured protocol carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolSection {
    Overview,
    Objectives,
    Endpoints,
    Inclusion,
    Exclusion,
    Procedures,
    Safety,
}

impl ProtocolSection {
    pub const ALL: [ProtocolSection; 7] = [
        ProtocolSection::Overview,
        ProtocolSection::Objectives,
        ProtocolSection::Endpoints,
        ProtocolSection::Inclusion,
        ProtocolSection::Exclusion,
        ProtocolSection::Procedures,
        ProtocolSection::Safety,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolSection::Overview => "overview",
            ProtocolSection::Objectives => "objectives",
            ProtocolSection::Endpoints => "endpoints",
            ProtocolSection::Inclusion => "inclusion",
            ProtocolSection::Exclusion => "exclusion",
            ProtocolSection::Procedures => "procedures",
            ProtocolSection::Safety => "safety",
        }
    }
}

impl fmt::Display for ProtocolSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied extra criteria, rendered in insertion order
pub type AdditionalCriteria = IndexMap<String, Value>;

/// Parameters for a single protocol generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRequest {
    pub disease_type: String,
    pub phase: StudyPhase,
    pub population_size: u32,
    pub duration_weeks: u32,
    /// Primary endpoints; `None` or empty falls back to the disease template
    #[serde(default)]
    pub endpoints: Option<Vec<String>>,
    #[serde(default)]
    pub additional_criteria: Option<AdditionalCriteria>,
}

impl ProtocolRequest {
    pub fn new(
        disease_type: impl Into<String>,
        phase: StudyPhase,
        population_size: u32,
        duration_weeks: u32,
    ) -> Self {
        Self {
            disease_type: disease_type.into(),
            phase,
            population_size,
            duration_weeks,
            endpoints: None,
            additional_criteria: None,
        }
    }

    pub fn with_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = Some(endpoints.into_iter().map(Into::into).collect());
        self
    }

    /// Append one additional criterion, keeping insertion order
    pub fn with_criterion(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_criteria
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_additional_criteria(mut self, criteria: AdditionalCriteria) -> Self {
        self.additional_criteria = Some(criteria);
        self
    }

    /// Check caller preconditions before the request enters the pipeline
    pub fn validate(&self) -> Result<(), AssistantError> {
        if self.disease_type.trim().is_empty() {
            return Err(AssistantError::InvalidRequest(
                "disease type cannot be empty".to_string(),
            ));
        }
        if self.population_size == 0 {
            return Err(AssistantError::InvalidRequest(
                "population size must be positive".to_string(),
            ));
        }
        if self.duration_weeks == 0 {
            return Err(AssistantError::InvalidRequest(
                "duration in weeks must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Structured clinical trial protocol
///
/// Every [`ProtocolSection`] is present; bodies may be empty. Serialized as a
/// JSON object keyed by section identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<ProtocolSection, String>",
    into = "IndexMap<ProtocolSection, String>"
)]
pub struct Protocol {
    sections: IndexMap<ProtocolSection, String>,
}

impl Protocol {
    /// A protocol with every section present and empty
    pub fn empty() -> Self {
        Self {
            sections: ProtocolSection::ALL
                .iter()
                .map(|section| (*section, String::new()))
                .collect(),
        }
    }

    pub fn get(&self, section: ProtocolSection) -> &str {
        self.sections
            .get(&section)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub(crate) fn body_mut(&mut self, section: ProtocolSection) -> &mut String {
        self.sections.entry(section).or_default()
    }

    /// Sections in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (ProtocolSection, &str)> {
        ProtocolSection::ALL
            .into_iter()
            .map(move |section| (section, self.get(section)))
    }

    /// True when no section has any content
    pub fn is_blank(&self) -> bool {
        self.sections.values().all(|body| body.trim().is_empty())
    }

    /// Pretty JSON rendering used as query context
    pub fn to_context_string(&self) -> String {
        let map: IndexMap<&str, &str> = self
            .iter()
            .map(|(section, body)| (section.as_str(), body))
            .collect();
        serde_json::to_string_pretty(&map).unwrap_or_default()
    }
}

impl TryFrom<IndexMap<ProtocolSection, String>> for Protocol {
    type Error = StructuringFailure;

    fn try_from(mut map: IndexMap<ProtocolSection, String>) -> Result<Self, Self::Error> {
        let missing: Vec<ProtocolSection> = ProtocolSection::ALL
            .into_iter()
            .filter(|section| !map.contains_key(section))
            .collect();
        if !missing.is_empty() {
            return Err(StructuringFailure::MissingSections(missing));
        }

        let sections = ProtocolSection::ALL
            .into_iter()
            .map(|section| {
                let body = map.swap_remove(&section).unwrap_or_default();
                (section, body)
            })
            .collect();
        Ok(Self { sections })
    }
}

impl From<Protocol> for IndexMap<ProtocolSection, String> {
    fn from(protocol: Protocol) -> Self {
        protocol.sections
    }
}
