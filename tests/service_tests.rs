//! LCA service tests against a mock HTTP server

use std::time::Duration;

use lca::core::{
    BomEditor, CancelToken, CategorizationForm, CategoryTaxonomy, EntryMode, GenerateOutcome,
    ProcessPlanEditor,
};
use lca::entities::material::{MaterialClass, MaterialLine};
use lca::entities::process::{ManufacturingProcess, ProcessAssignment};
use lca::entities::product::{ProductCategoryInfo, ProductDraft, ProductInfo};
use lca::service::{
    BomClassificationRequest, HttpLcaService, LcaService, ProcessClassificationRequest,
    ProductClassificationRequest, ProductPayload, ServiceError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chair_draft() -> ProductDraft {
    ProductDraft {
        info: ProductInfo::new("P1", "Chair", "Wood chair"),
        ..Default::default()
    }
}

fn oak() -> MaterialLine {
    MaterialLine::new(MaterialClass::Wood, Some("Oak"), "2.5").unwrap()
}

fn editor_with_oak() -> BomEditor {
    BomEditor::with_materials(EntryMode::Assisted, vec![oak()])
}

#[tokio::test]
async fn test_classify_bom_replaces_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-bom"))
        .and(body_partial_json(json!({"productCode": "P1", "name": "Chair"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"materialClass": "Metal", "specificMaterial": "Aluminium", "weight": 0.4},
            {"materialClass": "Plastic", "specificMaterial": "Polypropylene", "weight": "1.2"}
        ])))
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let mut editor = editor_with_oak();
    let request = BomClassificationRequest::from_draft(&chair_draft());

    let outcome = editor
        .generate(&service, &request, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, GenerateOutcome::Replaced(2));
    assert_eq!(editor.materials()[0].material_class, MaterialClass::Metal);
    assert_eq!(editor.materials()[0].weight, "0.4");
    assert_eq!(editor.materials()[1].weight, "1.2");
}

#[tokio::test]
async fn test_classify_bom_error_status_keeps_list() {
    lca::logging::init_test();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-bom"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let mut editor = editor_with_oak();
    let request = BomClassificationRequest::from_draft(&chair_draft());

    let err = editor
        .generate(&service, &request, &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Status { status: 500, .. }));
    assert_eq!(editor.materials(), &[oak()]);
}

#[tokio::test]
async fn test_classify_bom_rejects_unknown_class() {
    lca::logging::init_test();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-bom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"materialClass": "Wood", "specificMaterial": "Oak", "weight": 1},
            {"materialClass": "Glass", "weight": 2}
        ])))
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let mut editor = editor_with_oak();
    let request = BomClassificationRequest::from_draft(&chair_draft());

    let err = editor
        .generate(&service, &request, &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidResponse { .. }));
    assert_eq!(editor.materials().len(), 1);
}

#[tokio::test]
async fn test_cancelled_generation_discards_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-bom"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"materialClass": "Metal", "weight": 1}]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let mut editor = editor_with_oak();
    let request = BomClassificationRequest::from_draft(&chair_draft());
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = editor.generate(&service, &request, &cancel).await.unwrap();

    assert_eq!(outcome, GenerateOutcome::Cancelled);
    assert_eq!(editor.materials(), &[oak()]);
}

#[tokio::test]
async fn test_manual_mode_never_calls_classifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-bom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let mut editor = BomEditor::new(EntryMode::Manual);
    let request = BomClassificationRequest::from_draft(&chair_draft());

    let outcome = editor
        .generate(&service, &request, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, GenerateOutcome::Disabled);
}

#[tokio::test]
async fn test_product_categories_and_suggestion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/productCategories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Furniture": ["Chairs", "Tables"],
            "Lighting": ["Lamps"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/classify-product"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"category": "Furniture", "subcategory": "Chairs"})),
        )
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let taxonomy = service.product_categories().await.unwrap();
    assert_eq!(taxonomy.sub_categories("Furniture"), vec!["Chairs", "Tables"]);

    let mut form = CategorizationForm::new(taxonomy, ProductCategoryInfo::default());
    let request = ProductClassificationRequest::from_draft(&chair_draft());
    assert!(form.suggest(&service, &request, &CancelToken::new()).await);
    assert_eq!(form.data().category, "Furniture");
    assert_eq!(form.data().sub_category, "Chairs");
}

#[tokio::test]
async fn test_suggestion_outside_taxonomy_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-product"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"category": "Toys", "subcategory": "Dolls"})),
        )
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let taxonomy: CategoryTaxonomy =
        serde_json::from_value(json!({"Furniture": ["Chairs"]})).unwrap();
    let mut form = CategorizationForm::new(taxonomy, ProductCategoryInfo::default());
    let request = ProductClassificationRequest::from_draft(&chair_draft());

    assert!(!form.suggest(&service, &request, &CancelToken::new()).await);
    assert!(form.data().category.is_empty());
}

#[tokio::test]
async fn test_process_suggestions_attach_by_class() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-manufacturing-process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "materialClass": "Wood",
                "manufacturingProcesses": [
                    {"category": "Machining", "processes": ["CNC Milling", "Turning"]}
                ]
            }
        ])))
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let steel = MaterialLine::new(MaterialClass::Metal, Some("Stainless Steel"), "1").unwrap();
    let mut draft = chair_draft();
    draft.materials = vec![oak(), steel, oak()];
    let mut plan = ProcessPlanEditor::new(draft.materials.clone(), Default::default());
    let request = ProcessClassificationRequest::from_draft(&draft);
    assert_eq!(request.bom.len(), 3);

    let attached = plan
        .generate(&service, &request, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(attached, Some(2));
    assert_eq!(plan.assignments(0)[0].sub_processes, vec!["CNC Milling", "Turning"]);
    assert!(plan.assignments(1).is_empty());
    assert_eq!(plan.assignments(2).len(), 1);
}

#[tokio::test]
async fn test_submit_product_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(body_partial_json(json!({
            "code": "P1",
            "name": "Chair",
            "productManufacturingProcess": [{
                "materialClass": "Wood",
                "specificMaterial": "Oak",
                "manufacturingProcesses": [{"category": "Machining", "processes": ["CNC Milling"]}]
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let mut draft = chair_draft();
    draft.materials = vec![oak()];
    draft.processes_by_material_index.insert(
        0,
        vec![ProcessAssignment::new(ManufacturingProcess::Machining, ["CNC Milling"]).unwrap()],
    );

    let created = service
        .submit_product(&ProductPayload::from_draft(&draft))
        .await
        .unwrap();
    assert_eq!(created["id"], 42);
}

#[tokio::test]
async fn test_cancelled_token_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(cancel.is_cancelled());

    let mut editor = editor_with_oak();
    let request = BomClassificationRequest::from_draft(&chair_draft());
    let outcome = editor.generate(&service, &request, &cancel).await.unwrap();
    assert_eq!(outcome, GenerateOutcome::Cancelled);
    assert_eq!(editor.materials(), &[oak()]);

    let mut draft = chair_draft();
    draft.materials = vec![oak()];
    let mut plan = ProcessPlanEditor::new(draft.materials.clone(), Default::default());
    let request = ProcessClassificationRequest::from_draft(&draft);
    assert_eq!(plan.generate(&service, &request, &cancel).await.unwrap(), None);

    let mut form = CategorizationForm::new(CategoryTaxonomy::default(), ProductCategoryInfo::default());
    let request = ProductClassificationRequest::from_draft(&chair_draft());
    assert!(!form.suggest(&service, &request, &cancel).await);
}

#[tokio::test]
async fn test_list_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"productCode": "P1", "name": "Chair", "category": "Furniture", "weight": 2.5}
        ])))
        .mount(&server)
        .await;

    let service = HttpLcaService::new(server.uri());
    let products = service.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].code(), "P1");
    assert_eq!(products[0].weight, "2.5");
    assert!(products[0].co2_emission.is_empty());
}
