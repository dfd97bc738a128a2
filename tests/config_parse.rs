use gnre_tables::{
    browser::Locator,
    config::{Action, Config, ExtractionMode},
};

#[test]
fn parse_example_config() {
    let raw = include_str!("../gnre-tables.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.categories.labels.len(), 5);
    assert_eq!(cfg.extraction.mode, ExtractionMode::Mapped);
    assert_eq!(
        cfg.locators.get(Action::JurisdictionSelect),
        &Locator::Id("cmbUF".into())
    );
    assert!(!cfg.output.path.is_empty());
}

#[test]
fn missing_sections_fall_back_to_portal_defaults() {
    let cfg: Config = toml::from_str("[portal]\nurl = \"http://localhost/x\"\n").unwrap();
    assert_eq!(cfg.portal.url, "http://localhost/x");
    assert_eq!(cfg.jurisdictions.all_sentinel, "Todas as Receitas");
    assert_eq!(
        cfg.locators.get(Action::PrintPreview),
        &Locator::ButtonText("Visualizar impressão".into())
    );
    assert_eq!(cfg.timeouts.results_table, 20_000);
}
