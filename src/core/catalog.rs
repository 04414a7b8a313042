//! Engine and propeller catalogs: comma-joined lines, first field is the display name.
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Engine,
    Propeller,
}

impl CatalogKind {
    /// Placeholder shown when the catalog file does not exist.
    pub fn sentinel(self) -> &'static str {
        match self {
            CatalogKind::Engine => "No Engines Available",
            CatalogKind::Propeller => "No Propellers Available",
        }
    }

    /// Label of the fourth field: engines record power, propellers diameter.
    pub fn spec_label(self) -> &'static str {
        match self {
            CatalogKind::Engine => "Power",
            CatalogKind::Propeller => "Diameter",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    pub name: String,
    pub brand: String,
    pub model: String,
    pub spec_value: String,
    pub weight: String,
    pub other: String,
}

impl CatalogRecord {
    /// Missing trailing fields are left empty; extra fields fold into `other`.
    pub fn parse_line(line: &str) -> Self {
        let mut fields = line.trim_end_matches(['\r', '\n']).splitn(6, ',');
        let mut next = || fields.next().unwrap_or_default().to_string();
        Self {
            name: next(),
            brand: next(),
            model: next(),
            spec_value: next(),
            weight: next(),
            other: next(),
        }
    }

    pub fn to_line(&self) -> String {
        [
            self.name.as_str(),
            self.brand.as_str(),
            self.model.as_str(),
            self.spec_value.as_str(),
            self.weight.as_str(),
            self.other.as_str(),
        ]
        .join(",")
    }
}

/// Selection-list contents for one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "names", rename_all = "snake_case")]
pub enum Choices {
    Available(Vec<String>),
    None,
}

impl Choices {
    pub fn entries(&self, kind: CatalogKind) -> Vec<String> {
        match self {
            Choices::Available(names) => names.clone(),
            Choices::None => vec![kind.sentinel().to_string()],
        }
    }
}

pub struct CatalogStore {
    engine_file: PathBuf,
    propeller_file: PathBuf,
}

impl CatalogStore {
    pub fn new(engine_file: impl Into<PathBuf>, propeller_file: impl Into<PathBuf>) -> Self {
        Self {
            engine_file: engine_file.into(),
            propeller_file: propeller_file.into(),
        }
    }

    pub fn path(&self, kind: CatalogKind) -> &Path {
        match kind {
            CatalogKind::Engine => &self.engine_file,
            CatalogKind::Propeller => &self.propeller_file,
        }
    }

    /// All records, or `None` when the catalog file does not exist.
    pub fn records(&self, kind: CatalogKind) -> Result<Option<Vec<CatalogRecord>>> {
        let path = self.path(kind);
        let body = match fs::read_to_string(path) {
            Ok(body) => body,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        Ok(Some(
            body.lines()
                .filter(|line| !line.trim().is_empty())
                .map(CatalogRecord::parse_line)
                .collect(),
        ))
    }

    pub fn names(&self, kind: CatalogKind) -> Result<Choices> {
        Ok(match self.records(kind)? {
            Some(records) => Choices::Available(records.into_iter().map(|r| r.name).collect()),
            None => Choices::None,
        })
    }

    /// Append one record as a single write so watchers never see a torn line.
    pub fn append(&self, kind: CatalogKind, record: &CatalogRecord) -> Result<()> {
        let path = self.path(kind);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.write_all(format!("{}\n", record.to_line()).as_bytes())
            .with_context(|| format!("Failed to append to {}", path.display()))?;
        log::info!("added {:?} '{}' to {}", kind, record.name, path.display());
        Ok(())
    }
}
