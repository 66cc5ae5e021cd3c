//! End-to-end tests for the knowledge base
//!
//! Tests the full pipeline: YAML on disk -> load -> link -> resolve -> report

use std::path::{Path, PathBuf};

use hardness_cli::{Format, Source};
use hardness_core::report::Level;
use hardness_core::{ComplexityClass, Error, KbConfig, KnowledgeBase, Report, UnknownPolicy};

fn sample_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn c(text: &str) -> ComplexityClass {
    ComplexityClass::parse(text).unwrap()
}

fn write_tables(dir: &Path, attacks: &str, assumptions: &str, schemes: &str) {
    std::fs::write(dir.join("attacks.yml"), attacks).unwrap();
    std::fs::write(dir.join("assumptions.yml"), assumptions).unwrap();
    std::fs::write(dir.join("schemes.yml"), schemes).unwrap();
}

/// The shipped sample resolves completely under the strict policy
#[test]
fn test_sample_knowledge_base_resolves() -> anyhow::Result<()> {
    let kb = KnowledgeBase::load(&KbConfig::from_base_dir(sample_dir()))?;
    let report = Report::build(&kb, UnknownPolicy::Fail)?;

    let sidh = report.scheme("sidh").unwrap();
    assert_eq!(sidh.classical.level, Level::Poly);
    assert_eq!(sidh.classical.attack, "castryck-decru");

    // own attacks come first, so GPST wins the tie with the inherited torsion attack
    let static_key = report.assumption("ssdh.static").unwrap();
    assert_eq!(static_key.classical.attack, "gpst");

    let ecdh = report.scheme("ecdh").unwrap();
    assert_eq!(ecdh.classical.level, Level::Exp);
    assert_eq!(ecdh.quantum.attack, "shor");
    assert!(ecdh.quantum.quantum);
    Ok(())
}

#[test]
fn test_sample_reductions_and_overrides() -> anyhow::Result<()> {
    let kb = KnowledgeBase::load(&KbConfig::from_base_dir(sample_dir()))?;
    let resolver = kb.resolver();

    // ssi <-> endring form a cycle; both see the same attacks
    let ssi = kb.assumption("ssi")?;
    let endring = kb.assumption("endring")?;
    assert_eq!(resolver.security(ssi, false)?, c("exp(1/4)"));
    assert_eq!(resolver.security(endring, false)?, c("exp(1/4)"));
    assert_eq!(resolver.security(endring, true)?, c("exp(1/6)"));

    // the oriented variant of ssi inherits Kuperberg from endring.oriented
    let oriented = kb.assumption_by_longid("ssi.oriented").unwrap();
    assert_eq!(resolver.best_attack(oriented, true)?.id(), "kuperberg");
    assert_eq!(resolver.security(oriented, false)?, c("exp(1/4)"));

    // ddh-ga reaches gaip both classically (via cdh-ga) and through a quantum-only edge
    let ddh = kb.assumption("ddh-ga")?;
    let quantum: Vec<(String, bool)> = resolver
        .attacks(ddh, true)
        .iter()
        .map(|v| (v.id().to_string(), v.quantum()))
        .collect();
    assert_eq!(
        quantum,
        vec![
            ("mitm-ga".to_string(), false),
            ("kuperberg".to_string(), true),
            ("mitm-ga".to_string(), true),
        ]
    );
    Ok(())
}

#[test]
fn test_cli_commands_on_sample() -> anyhow::Result<()> {
    let source = Source {
        data_dir: Some(sample_dir()),
        ..Default::default()
    };
    let config = source.config()?;
    let kb = KnowledgeBase::load(&config)?;

    assert!(hardness_cli::check(&kb, config.unknown_policy)?.starts_with("[OK]"));
    assert_eq!(
        hardness_cli::query(&kb, "csidh.ctidh", true, config.unknown_policy)?,
        "csidh.ctidh: L(1/2) (subexp) via kuperberg [quantum]\n"
    );

    let json: serde_json::Value =
        serde_json::from_str(&hardness_cli::report(&kb, config.unknown_policy, Format::Json)?)?;
    assert_eq!(json["schemes"][1]["types"][1], "non-interactive key exchange");
    assert_eq!(json["schemes"][1]["variants"][0]["longid"], "csidh.ctidh");
    Ok(())
}

#[test]
fn test_config_file_roundtrip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let tables = dir.path().join("tables");
    std::fs::create_dir(&tables).unwrap();
    write_tables(
        &tables,
        "x: {complexity: 'L(1/3)'}\n",
        "a: {attacks: [x]}\nopen: {}\n",
        "s: {assumptions: [a, open]}\n",
    );

    let config_path = dir.path().join("kb.json");
    KbConfig::from_base_dir("tables")
        .with_unknown_policy(UnknownPolicy::Unbounded)
        .save(&config_path)
        .unwrap();
    let config = KbConfig::load(&config_path).unwrap();
    assert_eq!(config.unknown_policy, UnknownPolicy::Unbounded);

    let kb = KnowledgeBase::load(&config).unwrap();
    let report = Report::build(&kb, config.unknown_policy).unwrap();
    assert_eq!(report.assumption("open").unwrap().classical.level, Level::Unbounded);
    // the unstudied assumption only contributes the sentinel
    assert_eq!(report.scheme("s").unwrap().classical.complexity, "L(1/3)");

    assert!(matches!(
        Report::build(&kb, UnknownPolicy::Fail),
        Err(Error::NoKnownAttack { ref node, .. }) if node == "open"
    ));
}

#[test]
fn test_load_errors_abort() {
    let dir = tempfile::tempdir().unwrap();
    let config = KbConfig::from_base_dir(dir.path());

    assert!(matches!(KnowledgeBase::load(&config), Err(Error::Io(_))));

    write_tables(dir.path(), "x: {complexity: 'L(3/2)'}\n", "", "");
    assert!(matches!(KnowledgeBase::load(&config), Err(Error::MalformedComplexity { .. })));

    write_tables(dir.path(), "x: {complexity: poly}\n", "a: {reduces_to: [b]}\n", "");
    assert!(matches!(KnowledgeBase::load(&config), Err(Error::UnresolvedReference { .. })));

    write_tables(dir.path(), "x: {complexity: poly, colour: red}\n", "", "");
    assert!(matches!(KnowledgeBase::load(&config), Err(Error::Yaml(_))));
}
