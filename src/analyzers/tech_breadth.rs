//! Tech breadth: distinct stack categories touched, and the developer profile
//! they suggest

use std::collections::BTreeSet;
use std::fmt;

use crate::analyzers::{Analyzer, FactTables};
use crate::data::records::{DeveloperIdentity, Dimension, DimensionScore, StatValue};
use crate::rules::{classify_extensions, TechCategory};
use crate::settings::TechBreadthConfig;

const STAT_COLUMNS: &[&str] = &["file_count", "tech_count", "tech_stacks", "extensions", "developer_type"];

/// Profile derived from the categories a developer touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeveloperType {
    FullStack,
    DevOps,
    Frontend,
    Backend,
    General,
    Unknown,
}

impl DeveloperType {
    /// Priority order: full-stack, DevOps, frontend, backend, general
    pub fn from_categories(categories: &BTreeSet<TechCategory>) -> Self {
        let frontend = categories.contains(&TechCategory::Frontend);
        let backend = categories.contains(&TechCategory::Backend);
        if frontend && backend {
            DeveloperType::FullStack
        } else if categories.contains(&TechCategory::Devops) {
            DeveloperType::DevOps
        } else if frontend {
            DeveloperType::Frontend
        } else if backend {
            DeveloperType::Backend
        } else {
            DeveloperType::General
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeveloperType::FullStack => "Full-stack Developer",
            DeveloperType::DevOps => "DevOps/SRE",
            DeveloperType::Frontend => "Frontend Developer",
            DeveloperType::Backend => "Backend Developer",
            DeveloperType::General => "General Developer",
            DeveloperType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DeveloperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct TechBreadthAnalyzer {
    excellent: usize,
    fullstack: usize,
}

impl TechBreadthAnalyzer {
    pub fn new(config: &TechBreadthConfig) -> Self {
        Self { excellent: config.excellent, fullstack: config.fullstack }
    }

    pub fn step_score(&self, tech_count: usize) -> f64 {
        if tech_count >= self.excellent {
            10.0
        } else if tech_count >= self.fullstack {
            8.0
        } else {
            6.0
        }
    }
}

impl Analyzer for TechBreadthAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::TechBreadth
    }

    fn stat_columns(&self) -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn empty_score(&self, email: &str) -> DimensionScore {
        let stats = vec![
            ("file_count", StatValue::Count(0)),
            ("tech_count", StatValue::Count(0)),
            ("tech_stacks", StatValue::Text(String::new())),
            ("extensions", StatValue::Text(String::new())),
            ("developer_type", StatValue::Text(DeveloperType::Unknown.label().to_string())),
        ];
        DimensionScore::new(email, Dimension::TechBreadth, 0.0, 0, stats)
    }

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore {
        let changes = facts.file_changes_for(&identity.email);
        if changes.is_empty() {
            return self.empty_score(&identity.email);
        }

        let extensions: BTreeSet<&str> = changes
            .iter()
            .map(|c| c.file_extension.as_str())
            .filter(|e| !e.is_empty())
            .collect();
        let categories = classify_extensions(extensions.iter().copied());
        let developer_type = DeveloperType::from_categories(&categories);

        let stacks = categories.iter().map(TechCategory::name).collect::<Vec<_>>().join(",");
        let extension_list = extensions.into_iter().collect::<Vec<_>>().join(",");

        let stats = vec![
            ("file_count", StatValue::Count(changes.len() as u64)),
            ("tech_count", StatValue::Count(categories.len() as u64)),
            ("tech_stacks", StatValue::Text(stacks)),
            ("extensions", StatValue::Text(extension_list)),
            ("developer_type", StatValue::Text(developer_type.label().to_string())),
        ];
        DimensionScore::new(
            &identity.email,
            Dimension::TechBreadth,
            self.step_score(categories.len()),
            changes.len() as u64,
            stats,
        )
    }
}
