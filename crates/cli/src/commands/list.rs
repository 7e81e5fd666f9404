//! List the scenario catalog

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use navcheck::config::NavcheckConfig;
use navcheck::Scenario;
use serde::Serialize;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Path to scenario directory (built-in scenarios when omitted)
    #[arg(short, long)]
    pub scenarios: Option<PathBuf>,

    /// Only list scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioRow {
    pub name: String,
    pub start_path: String,
    pub clicks: Vec<String>,
    pub expect: String,
    pub tags: Vec<String>,
}

impl From<&Scenario> for ScenarioRow {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            start_path: scenario.start_path.clone(),
            clicks: scenario.steps.iter().map(|h| h.href.selector()).collect(),
            expect: scenario
                .final_expectation()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            tags: scenario.tags.clone(),
        }
    }
}

impl TableDisplay for ScenarioRow {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Start", "Clicks", "Expect", "Tags"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.start_path.clone(),
            self.clicks.join(" → "),
            self.expect.clone(),
            self.tags.join(", "),
        ]
    }
}

pub fn execute(args: ListArgs, config: &NavcheckConfig, format: OutputFormat) -> Result<()> {
    let dir = args.scenarios.as_deref().or(config.scenarios_dir.as_deref());
    let scenarios = super::load_scenarios(dir)?;

    let rows: Vec<ScenarioRow> = match &args.tag {
        Some(tag) => Scenario::filter_by_tag(&scenarios, tag)
            .into_iter()
            .map(ScenarioRow::from)
            .collect(),
        None => scenarios.iter().map(ScenarioRow::from).collect(),
    };

    print_list(&rows, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_hop_row() {
        let scenarios = Scenario::builtin().unwrap();
        let row = ScenarioRow::from(&scenarios[3]);
        assert_eq!(
            row.row()[2],
            r#"a[href="/settings"] → a[href="/library"]"#
        );
        assert_eq!(row.expect, "/.*library/");
    }
}
