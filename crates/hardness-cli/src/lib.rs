//! Command implementations for the `hardness-kb` binary
//!
//! Each command renders to a `String`; the binary decides where it goes.

use std::path::PathBuf;

use clap::ValueEnum;
use hardness_core::report::{
    AssumptionEntry, AttackEntry, Level, Report, Reporter, SchemeEntry, SecurityReport, TRIVIAL_ATTACK_ID,
};
use hardness_core::{AttackView, Error, KbConfig, KnowledgeBase, NodeKind, Result, UnknownPolicy};

/// Output format for `report`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Knowledge-base location and policy as given on the command line
#[derive(Debug, Clone, Default)]
pub struct Source {
    pub data_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub allow_unknown: bool,
}

impl Source {
    /// Resolve the effective configuration
    ///
    /// `--data-dir` replaces the table paths of `--config`, and
    /// `--allow-unknown` forces the unbounded policy.
    pub fn config(&self) -> Result<KbConfig> {
        let config = match &self.config {
            Some(path) => KbConfig::load(path)?,
            None => KbConfig::default(),
        };
        let config = match &self.data_dir {
            Some(dir) => KbConfig::from_base_dir(dir).with_unknown_policy(config.unknown_policy),
            None => config,
        };
        if self.allow_unknown {
            Ok(config.with_unknown_policy(UnknownPolicy::Unbounded))
        } else {
            Ok(config)
        }
    }
}

/// A queried node: assumptions shadow schemes with the same longid
enum Target {
    Assumption(hardness_core::AssumptionId),
    Scheme(hardness_core::SchemeId),
}

fn target(kb: &KnowledgeBase, longid: &str) -> Result<Target> {
    if let Some(id) = kb.assumption_by_longid(longid) {
        return Ok(Target::Assumption(id));
    }
    if let Some(id) = kb.scheme_by_longid(longid) {
        return Ok(Target::Scheme(id));
    }
    Err(Error::UnknownNode {
        kind: NodeKind::Assumption,
        id: longid.to_string(),
    })
}

/// Link the knowledge base and resolve every node under `policy`
pub fn check(kb: &KnowledgeBase, policy: UnknownPolicy) -> Result<String> {
    let report = Report::build(kb, policy)?;
    let stats = kb.link_stats();
    Ok(format!(
        "[OK] {} attacks, {} assumptions, {} schemes, {} edges ({} top-level assumptions resolved)\n",
        kb.attacks().len(),
        kb.assumptions().len(),
        kb.schemes().len(),
        stats.total(),
        report.assumptions.len(),
    ))
}

pub fn report(kb: &KnowledgeBase, policy: UnknownPolicy, format: Format) -> Result<String> {
    let report = Report::build(kb, policy)?;
    match format {
        Format::Json => Ok(report.to_json()? + "\n"),
        Format::Text => Ok(render_report(&report)),
    }
}

/// Best attack on one node under one threat model
pub fn query(kb: &KnowledgeBase, longid: &str, quantum: bool, policy: UnknownPolicy) -> Result<String> {
    let reporter = Reporter::new(kb, policy);
    let view = match target(kb, longid)? {
        Target::Assumption(id) => reporter.best_attack(id, quantum)?,
        Target::Scheme(id) => reporter.scheme_best_attack(id, quantum)?,
    };
    if view.id() == TRIVIAL_ATTACK_ID {
        return Ok(format!("{longid}: unbounded (no known attack)\n"));
    }
    Ok(format!(
        "{longid}: {} ({}) via {}{}\n",
        view.complexity(),
        Level::of(&view.complexity()),
        view.longid(),
        if view.quantum() { " [quantum]" } else { "" },
    ))
}

/// Every applicable attack on one node, in resolution order
///
/// For a scheme this is the best attack on each required assumption.
pub fn attacks(kb: &KnowledgeBase, longid: &str, quantum: bool) -> Result<String> {
    let resolver = kb.resolver();
    let views = match target(kb, longid)? {
        Target::Assumption(id) => resolver.attacks(id, quantum),
        Target::Scheme(id) => resolver.scheme_candidates(id, quantum)?,
    };
    if views.is_empty() {
        return Ok(format!("{longid}: no applicable attacks\n"));
    }
    let rows = views.iter().map(attack_row).collect();
    Ok(render_table(&["attack", "complexity", "class", "model"], rows))
}

fn attack_row(view: &AttackView<'_>) -> Vec<String> {
    vec![
        view.longid().to_string(),
        view.complexity().to_string(),
        Level::of(&view.complexity()).to_string(),
        if view.quantum() { "quantum" } else { "classical" }.to_string(),
    ]
}

/// Plain-text rendering: one table per kind, variants indented
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    let mut rows = Vec::new();
    for entry in &report.schemes {
        scheme_rows(entry, 0, &mut rows);
    }
    section(&mut out, "Schemes", &["scheme", "name", "classical", "quantum"], rows);

    let mut rows = Vec::new();
    for entry in &report.assumptions {
        assumption_rows(entry, 0, &mut rows);
    }
    section(&mut out, "Assumptions", &["assumption", "name", "classical", "quantum"], rows);

    let mut rows = Vec::new();
    for entry in &report.attacks {
        attack_entry_rows(entry, 0, &mut rows);
    }
    section(&mut out, "Attacks", &["attack", "name", "complexity", "model"], rows);

    out
}

fn section(out: &mut String, title: &str, header: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(title);
    out.push('\n');
    out.push_str(&render_table(header, rows));
}

fn security_cell(report: &SecurityReport) -> String {
    format!("{} via {}", report.complexity, report.attack)
}

fn indented(depth: usize, id: &str) -> String {
    format!("{}{}", "  ".repeat(depth), id)
}

fn scheme_rows(entry: &SchemeEntry, depth: usize, rows: &mut Vec<Vec<String>>) {
    rows.push(vec![
        indented(depth, &entry.summary.longid),
        entry.summary.name.clone(),
        security_cell(&entry.classical),
        security_cell(&entry.quantum),
    ]);
    for variant in &entry.variants {
        scheme_rows(variant, depth + 1, rows);
    }
}

fn assumption_rows(entry: &AssumptionEntry, depth: usize, rows: &mut Vec<Vec<String>>) {
    rows.push(vec![
        indented(depth, &entry.summary.longid),
        entry.summary.name.clone(),
        security_cell(&entry.classical),
        security_cell(&entry.quantum),
    ]);
    for variant in &entry.variants {
        assumption_rows(variant, depth + 1, rows);
    }
}

fn attack_entry_rows(entry: &AttackEntry, depth: usize, rows: &mut Vec<Vec<String>>) {
    rows.push(vec![
        indented(depth, &entry.summary.longid),
        entry.summary.name.clone(),
        entry.complexity.clone(),
        if entry.quantum { "quantum" } else { "classical" }.to_string(),
    ]);
    for variant in &entry.variants {
        attack_entry_rows(variant, depth + 1, rows);
    }
}

/// Left-aligned columns separated by two spaces
fn render_table(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        padded.join("  ").trim_end().to_string() + "\n"
    };

    let mut out = line(header.to_vec());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in &rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTACKS: &str = r#"
bsgs:
  name: {short: BSGS, long: Baby-step giant-step}
  complexity: exp(1/2)
shor:
  name: {short: Shor}
  complexity: poly(3)
  quantum: true
"#;

    const ASSUMPTIONS: &str = r#"
dlog:
  name: {short: DLOG}
  attacks: [bsgs, shor]
  variants:
    ec:
      name: {short: ECDLP}
cdh:
  reduces_to: [dlog]
open: {}
"#;

    const SCHEMES: &str = r#"
dh:
  name: {short: DH}
  type: key exchange
  assumptions: [cdh]
mixed:
  assumptions: [open, cdh]
"#;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_yaml_strs(ATTACKS, ASSUMPTIONS, SCHEMES).unwrap()
    }

    #[test]
    fn test_query_both_threat_models() {
        let kb = kb();
        let classical = query(&kb, "dlog.ec", false, UnknownPolicy::Fail).unwrap();
        assert_eq!(classical, "dlog.ec: exp(1/2) (exp) via bsgs\n");
        let quantum = query(&kb, "dh", true, UnknownPolicy::Fail).unwrap();
        assert_eq!(quantum, "dh: poly(3) (poly) via shor [quantum]\n");
    }

    #[test]
    fn test_query_unknown_policy() {
        let kb = kb();
        assert!(matches!(
            query(&kb, "open", false, UnknownPolicy::Fail),
            Err(Error::NoKnownAttack { .. })
        ));
        assert_eq!(
            query(&kb, "open", false, UnknownPolicy::Unbounded).unwrap(),
            "open: unbounded (no known attack)\n"
        );
        assert!(matches!(
            query(&kb, "nope", false, UnknownPolicy::Unbounded),
            Err(Error::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_query_scheme_with_unknown_assumption() {
        let kb = kb();
        assert!(matches!(
            query(&kb, "mixed", false, UnknownPolicy::Fail),
            Err(Error::NoKnownAttack { ref node, .. }) if node == "open"
        ));
        assert_eq!(
            query(&kb, "mixed", false, UnknownPolicy::Unbounded).unwrap(),
            "mixed: exp(1/2) (exp) via bsgs\n"
        );
        assert!(matches!(
            attacks(&kb, "mixed", true),
            Err(Error::NoKnownAttack { ref node, quantum: true }) if node == "open"
        ));
    }

    #[test]
    fn test_attacks_listing() {
        let kb = kb();
        let out = attacks(&kb, "cdh", true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("attack"));
        assert!(lines[2].starts_with("bsgs"));
        assert!(lines[3].starts_with("shor"));
        assert!(lines[3].ends_with("quantum"));

        assert_eq!(attacks(&kb, "open", true).unwrap(), "open: no applicable attacks\n");
    }

    #[test]
    fn test_text_report() {
        let kb = kb();
        let out = report(&kb, UnknownPolicy::Unbounded, Format::Text).unwrap();
        assert!(out.starts_with("Schemes\n"));
        assert!(out.contains("\nAssumptions\n"));
        assert!(out.contains("\n  dlog.ec "));
        assert!(out.contains("unbounded via trivial"));
        assert!(out.lines().all(|line| line == line.trim_end()));
    }

    #[test]
    fn test_json_report_and_check() {
        let kb = kb();
        assert!(check(&kb, UnknownPolicy::Fail).is_err());
        assert!(check(&kb, UnknownPolicy::Unbounded).unwrap().starts_with("[OK] 2 attacks, 4 assumptions, 2 schemes"));

        let json: serde_json::Value =
            serde_json::from_str(&report(&kb, UnknownPolicy::Unbounded, Format::Json).unwrap()).unwrap();
        assert_eq!(json["schemes"][0]["classical"]["attack"], "bsgs");
    }

    #[test]
    fn test_source_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        KbConfig::from_base_dir("tables")
            .with_unknown_policy(UnknownPolicy::Unbounded)
            .save(&path)
            .unwrap();

        let from_file = Source {
            config: Some(path.clone()),
            ..Default::default()
        }
        .config()
        .unwrap();
        assert_eq!(from_file.attacks, dir.path().join("tables").join("attacks.yml"));
        assert_eq!(from_file.unknown_policy, UnknownPolicy::Unbounded);

        let overridden = Source {
            config: Some(path),
            data_dir: Some(PathBuf::from("/srv/kb")),
            allow_unknown: false,
        }
        .config()
        .unwrap();
        assert_eq!(overridden.schemes, PathBuf::from("/srv/kb/schemes.yml"));
        assert_eq!(overridden.unknown_policy, UnknownPolicy::Unbounded);

        let forced = Source {
            allow_unknown: true,
            ..Default::default()
        }
        .config()
        .unwrap();
        assert_eq!(forced.unknown_policy, UnknownPolicy::Unbounded);
    }
}
