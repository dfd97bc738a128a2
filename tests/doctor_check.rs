mod common;

use common::{FakePortal, fast_config};
use gnre_tables::cli::check_categories;

#[test]
fn reports_present_and_missing_category_links() {
    let cfg = fast_config(&["Receitas", "Produtos"]);
    let mut portal = FakePortal::new(&["Receitas", "Documentos de Origem"], &["PE"]);
    let report = check_categories(&mut portal, &cfg).unwrap();

    assert_eq!(report["categories_present"], serde_json::json!(["Receitas"]));
    assert_eq!(report["categories_missing"], serde_json::json!(["Produtos"]));
    assert_eq!(
        report["page_links"],
        serde_json::json!(["Receitas", "Documentos de Origem"])
    );
}
