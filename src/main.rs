use anyhow::{anyhow, bail, Context, Result};
use ethiopulse::{
    config::Settings,
    enrich, guide::DataSourceGuide,
    process::{load_optional_table, load_unified_data, save_enriched_data},
    query, quantify_dataset_composition,
    schema::{ImpactDirection, Pillar, RecordId, UnifiedSchemaValidator, UnifiedTable},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "\
usage: ethiopulse <command> [args]

  summary [FILE]                                   dataset composition
  validate [FILE]                                  link and column checks
  impacts [FILE]                                   event → indicator summary
  series <access|usage> [FILE]                     mean value per year
  timeline [FILE]                                  events by year
  forecasts                                        externally produced tables
  lookup <NAME> [SHEET]                            data source guide entry
  add-event <YEAR> <NAME> <TYPE> <SOURCE> <CONF>
  add-observation <YEAR> <VALUE> <PILLAR> <SOURCE> <CONF>
  add-link <EVENT_ID> <OBSERVATION_ID> <DIRECTION> <CONF>

FILE defaults to the enriched dataset if it exists, else the unified one.
Add commands write to the enriched dataset.";

fn main() -> Result<()> {
    // ─── 1) configuration ────────────────────────────────────────────
    let settings = Settings::load(None).context("loading settings")?;

    // ─── 2) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ─── 3) dispatch ─────────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((cmd, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        bail!("no command given");
    };

    match cmd.as_str() {
        "summary" => {
            let table = load(&settings, rest.first())?;
            UnifiedSchemaValidator::validate_impact_links(&table);
            print_json(&quantify_dataset_composition(&table))
        }
        "validate" => {
            let table = load(&settings, rest.first())?;
            let links = UnifiedSchemaValidator::check_impact_links(&table);
            UnifiedSchemaValidator::validate_impact_links(&table);
            print_json(&serde_json::json!({
                "records": table.len(),
                "record_types": table.kind_counts(),
                "missing_required_columns": UnifiedSchemaValidator::missing_required_columns(&table),
                "impact_links": links,
            }))
        }
        "impacts" => {
            let table = load(&settings, rest.first())?;
            print_json(&query::get_events_with_impacts(&table))
        }
        "series" => {
            let pillar: Pillar = arg(rest, 0, "PILLAR")?.parse()?;
            let table = load(&settings, rest.get(1))?;
            print_json(&query::pillar_series(&table, pillar))
        }
        "timeline" => {
            let table = load(&settings, rest.first())?;
            print_json(&query::event_timeline(&table))
        }
        "forecasts" => {
            let mut out = serde_json::Map::new();
            for path in [settings.forecast_table_path(), settings.forecast_scenarios_path()] {
                let table = load_optional_table(&path)?;
                out.insert(
                    path.display().to_string(),
                    serde_json::json!({ "rows": table.len(), "columns": table.columns() }),
                );
            }
            print_json(&out)
        }
        "lookup" => {
            let name = arg(rest, 0, "NAME")?;
            let guide = DataSourceGuide::open(settings.data_source_guide_path())
                .ok_or_else(|| anyhow!("data source guide is unavailable"))?;
            let hit = match rest.get(1) {
                Some(sheet) => guide.lookup(sheet, name).map(|h| (sheet.clone(), h)),
                None => guide.lookup_any(name),
            };
            match hit {
                Some((sheet, fields)) => {
                    print_json(&serde_json::json!({ "sheet": sheet, "fields": fields }))
                }
                None => {
                    info!("no guide entry matches `{}`", name);
                    Ok(())
                }
            }
        }
        "add-event" => append(&settings, |table| {
            Ok(enrich::add_event(
                table,
                parse(rest, 0, "YEAR")?,
                arg(rest, 1, "NAME")?,
                arg(rest, 2, "TYPE")?,
                arg(rest, 3, "SOURCE")?,
                arg(rest, 4, "CONF")?,
                None,
            )?)
        }),
        "add-observation" => append(&settings, |table| {
            Ok(enrich::add_observation(
                table,
                parse(rest, 0, "YEAR")?,
                parse(rest, 1, "VALUE")?,
                arg(rest, 2, "PILLAR")?,
                arg(rest, 3, "SOURCE")?,
                arg(rest, 4, "CONF")?,
                None,
            )?)
        }),
        "add-link" => append(&settings, |table| {
            let direction: ImpactDirection = arg(rest, 2, "DIRECTION")?.parse()?;
            Ok(enrich::add_impact_link(
                table,
                parse(rest, 0, "EVENT_ID")?,
                parse(rest, 1, "OBSERVATION_ID")?,
                direction,
                arg(rest, 3, "CONF")?,
                None,
            )?)
        }),
        "help" | "-h" | "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("{}", USAGE);
            bail!("unknown command `{}`", other)
        }
    }
}

/// Explicit file, else the enriched dataset if present, else the raw one.
fn input_path(settings: &Settings, explicit: Option<&String>) -> PathBuf {
    match explicit {
        Some(p) => PathBuf::from(p),
        None => {
            let enriched = settings.enriched_data_path();
            if enriched.is_file() {
                enriched
            } else {
                settings.unified_data_path()
            }
        }
    }
}

fn load(settings: &Settings, explicit: Option<&String>) -> Result<UnifiedTable> {
    load_unified_data(input_path(settings, explicit))
}

fn append<F>(settings: &Settings, add: F) -> Result<()>
where
    F: FnOnce(&mut UnifiedTable) -> Result<RecordId>,
{
    let mut table = open_store(&input_path(settings, None))?;
    let id = add(&mut table)?;
    save_enriched_data(&table, settings.enriched_data_path())?;
    println!("{}", id);
    Ok(())
}

/// The existing dataset, or an empty table when there is none yet.
fn open_store(path: &Path) -> Result<UnifiedTable> {
    if path.is_file() {
        return load_unified_data(path);
    }
    info!("{} not found; starting an empty store", path.display());
    Ok(UnifiedTable::new())
}

fn arg<'a>(rest: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    rest.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{}>\n\n{}", name, USAGE))
}

fn parse<T>(rest: &[String], idx: usize, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = arg(rest, idx, name)?;
    raw.parse()
        .with_context(|| format!("<{}> is not valid: `{}`", name, raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn add_starts_from_empty_when_nothing_exists() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("raw").join("unified.csv");

        let mut table = open_store(&path)?;
        assert!(table.is_empty());
        let id = enrich::add_event(&mut table, 2025, "Fayda", "infrastructure", "gov", "high", None)?;
        assert_eq!(id, 0);

        let enriched = dir.path().join("processed").join("enriched.csv");
        save_enriched_data(&table, &enriched)?;
        let reopened = open_store(&enriched)?;
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.next_id(), 1);
        Ok(())
    }

    #[test]
    fn existing_store_is_validated() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "record_type,year
alien,2020
")?;
        assert!(open_store(&path).is_err());
        Ok(())
    }
}
