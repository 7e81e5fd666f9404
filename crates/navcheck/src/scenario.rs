//! Declarative YAML navigation scenarios

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NavError, NavResult};
use crate::locator::Locator;
use crate::pattern::UrlPattern;

const BUILTIN_SCENARIOS: &str = include_str!("../scenarios/navigation.yaml");

/// One navigation test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Path loaded before the first click
    #[serde(default = "default_start_path", alias = "startPath")]
    pub start_path: String,

    /// Clicks to perform in order
    pub steps: Vec<Hop>,
}

fn default_start_path() -> String {
    "/".to_string()
}

/// A single click on an anchor, optionally followed by a location assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    /// Exact `href` of the anchor to click
    #[serde(alias = "linkSelector")]
    pub href: Locator,

    /// Pattern the settled location must match
    #[serde(default, alias = "expectedUrlPattern", skip_serializing_if = "Option::is_none")]
    pub expect: Option<UrlPattern>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Many { scenarios: Vec<Scenario> },
    One(Scenario),
}

impl Scenario {
    /// Single-click scenario starting at `/`
    pub fn single(name: &str, href: &str, expect: UrlPattern) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            tags: Vec::new(),
            start_path: default_start_path(),
            steps: vec![Hop {
                href: Locator::href(href),
                expect: Some(expect),
            }],
        }
    }

    /// Parse every scenario in a YAML document
    pub fn from_yaml(yaml: &str) -> NavResult<Vec<Self>> {
        let file: ScenarioFile =
            serde_yaml::from_str(yaml).map_err(|e| NavError::ScenarioParse(e.to_string()))?;
        let scenarios = match file {
            ScenarioFile::Many { scenarios } => scenarios,
            ScenarioFile::One(scenario) => vec![scenario],
        };
        for scenario in &scenarios {
            scenario.validate()?;
        }
        Ok(scenarios)
    }

    /// Parse scenarios from a YAML file
    pub fn from_file(path: &Path) -> NavResult<Vec<Self>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            NavError::ScenarioParse(msg) => {
                NavError::ScenarioParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load all scenarios from a directory, in path order
    pub fn load_all(dir: &Path) -> NavResult<Vec<Self>> {
        let mut scenarios = Vec::new();
        for path in scenario_files(dir)? {
            scenarios.extend(Self::from_file(&path)?);
        }

        check_unique_names(&scenarios)?;
        Ok(scenarios)
    }

    /// The scenarios shipped with navcheck
    pub fn builtin() -> NavResult<Vec<Self>> {
        Self::from_yaml(BUILTIN_SCENARIOS)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Pick scenarios by name, else by tag, else all of them.
    ///
    /// An unknown name is an error; a tag nothing carries selects nothing.
    pub fn select(scenarios: &[Self], name: Option<&str>, tag: Option<&str>) -> NavResult<Vec<Self>> {
        if let Some(name) = name {
            let scenario = scenarios
                .iter()
                .find(|s| s.name == name)
                .cloned()
                .ok_or_else(|| NavError::ScenarioParse(format!("Scenario not found: {}", name)))?;
            return Ok(vec![scenario]);
        }

        Ok(match tag {
            Some(tag) => Self::filter_by_tag(scenarios, tag).into_iter().cloned().collect(),
            None => scenarios.to_vec(),
        })
    }

    /// Check the structural invariants of a scenario
    pub fn validate(&self) -> NavResult<()> {
        let invalid = |reason: &str| NavError::InvalidScenario {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !self.start_path.starts_with('/') {
            return Err(invalid("start_path must begin with '/'"));
        }
        if self.steps.is_empty() {
            return Err(invalid("at least one step is required"));
        }
        if self.steps.iter().any(|h| h.href.href_value().is_empty()) {
            return Err(invalid("href must not be empty"));
        }
        if self.steps.last().map(|h| h.expect.is_none()).unwrap_or(true) {
            return Err(invalid("the last step must have an expect pattern"));
        }
        Ok(())
    }

    /// The pattern the final location is checked against
    pub fn final_expectation(&self) -> Option<&UrlPattern> {
        self.steps.last().and_then(|h| h.expect.as_ref())
    }
}

/// YAML files under `dir`, recursively, in path order
pub fn scenario_files(dir: &Path) -> NavResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(NavError::ScenarioParse(format!(
            "Scenario directory not found: {}",
            dir.display()
        )));
    }

    Ok(walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect())
}

/// Reject catalogs where two scenarios share a name
pub fn check_unique_names(scenarios: &[Scenario]) -> NavResult<()> {
    let mut seen = HashSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.name.as_str()) {
            return Err(NavError::InvalidScenario {
                name: scenario.name.clone(),
                reason: "duplicate scenario name".to_string(),
            });
        }
    }
    Ok(())
}
