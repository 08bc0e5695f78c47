//! Loading command inputs from local files

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tmpl_reconcile::{ReconcileConfig, StaticCategoryGraph, StaticPageDirectory};
use tmpl_schema::{Schema, TemplateDataDocument};

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Read a file, or stdin for `-`
pub(crate) fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read page text from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// TemplateData document (JSON, or YAML by extension) as the schema of `title`
pub(crate) fn load_schema(path: &Path, title: &str) -> Result<Schema> {
    let raw = read_text(path)?;
    if is_yaml(path) {
        let document: TemplateDataDocument =
            serde_yaml::from_str(&raw).with_context(|| format!("invalid TemplateData in {}", path.display()))?;
        return document
            .into_schema(title)
            .with_context(|| format!("invalid schema in {}", path.display()));
    }
    Schema::from_templatedata_json(title, &raw).with_context(|| format!("invalid schema in {}", path.display()))
}

/// Non-empty trimmed lines; `#` starts a comment line
pub(crate) fn load_lines(path: &Path) -> Result<Vec<String>> {
    Ok(read_text(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Category graph from a `{category: [parents]}` map (JSON or YAML)
pub(crate) fn load_parents(path: &Path) -> Result<StaticCategoryGraph> {
    let raw = read_text(path)?;
    let table: BTreeMap<String, Vec<String>> = if is_yaml(path) {
        serde_yaml::from_str(&raw).with_context(|| format!("invalid parent table in {}", path.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("invalid parent table in {}", path.display()))?
    };
    let mut graph = StaticCategoryGraph::new();
    for (category, parents) in &table {
        graph.insert(category, parents);
    }
    Ok(graph)
}

/// Existing page titles, one per line
pub(crate) fn load_pages(path: &Path) -> Result<StaticPageDirectory> {
    Ok(StaticPageDirectory::new().with_pages(load_lines(path)?))
}

/// Reconciliation settings from TOML
pub(crate) fn load_config(path: &Path) -> Result<ReconcileConfig> {
    let raw = read_text(path)?;
    toml::from_str(&raw).with_context(|| format!("invalid configuration in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tmpl_reconcile::CategoryGraph;

    fn file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn schema_from_json_and_yaml() {
        let json = file(".json", r#"{"params": {"title": {"required": true, "aliases": ["name"]}}}"#);
        let schema = load_schema(json.path(), "Infobox journal").unwrap();
        assert_eq!(schema.canonicalize("name").as_str(), "title");

        let yaml = file(".yaml", "params:\n  title:\n    required: true\n    aliases: [name]\n");
        let schema = load_schema(yaml.path(), "Infobox journal").unwrap();
        assert_eq!(schema.canonicalize("name").as_str(), "title");
    }

    #[test]
    fn lines_skip_blanks_and_comments() {
        let list = file(".txt", "# categories\nMonthly journals\n\n  Chemistry journals  \n");
        assert_eq!(
            load_lines(list.path()).unwrap(),
            vec!["Monthly journals".to_string(), "Chemistry journals".to_string()]
        );
    }

    #[tokio::test]
    async fn parent_table() {
        let table = file(".json", r#"{"Chemistry journals": ["Academic journals by subject area"]}"#);
        let graph = load_parents(table.path()).unwrap();
        assert_eq!(
            graph.parent_categories("Chemistry journals").await.unwrap(),
            vec!["Academic journals by subject area".to_string()]
        );
    }

    #[test]
    fn config_from_toml() {
        let toml = file(".toml", "max_external_calls = 5\n[fields]\nwebsite = \"url\"\n");
        let config = load_config(toml.path()).unwrap();
        assert_eq!(config.max_external_calls, 5);
        assert_eq!(config.fields.website, "url");
    }

    #[test]
    fn malformed_config_names_the_file() {
        let toml = file(".toml", "max_external_calls = \"many\"\n");
        let err = load_config(toml.path()).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
