//! Integration tests for the CRUD controller using wiremock
//!
//! These tests drive `CrudController` against a mocked backend, checking the
//! exact requests it sends and the state it is left in after each outcome.

use serde_json::{json, Value};
use sygt::api::{ApiClient, ApiError, DEFAULT_TIMEOUT};
use sygt::controller::{ControllerError, CrudController, EditTarget, LoadState, ModalState};
use sygt::resource::{RecordId, ResourceKind, ResourceRegistry, ValidationError};
use sygt::view::{table_rows, DetailState, ListView, TableRow};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn controller(server: &MockServer, kind: ResourceKind) -> CrudController {
    let registry = ResourceRegistry::new(&server.uri()).expect("valid base URL");
    let api = ApiClient::new(DEFAULT_TIMEOUT).expect("client builds");
    CrudController::new(&registry, kind, api)
}

fn cajero_ana() -> Value {
    json!({
        "nombres": "Ana",
        "apellidos": "Lee",
        "dni": "12345678",
        "cod_acceso": "A1",
        "numeracion_inicial_recibo": 1,
        "numeracion_actual_recibo": 1,
        "estado": "ACTIVO"
    })
}

/// Type the Ana cajero into an open form the way the UI does
fn fill_cajero_ana(c: &mut CrudController) {
    c.set_input("nombres", "Ana").unwrap();
    c.set_input("apellidos", "Lee").unwrap();
    c.set_input("dni", "12345678").unwrap();
    c.set_input("cod_acceso", "A1").unwrap();
    c.set_input("numeracion_inicial_recibo", "1").unwrap();
    c.set_input("numeracion_actual_recibo", "1").unwrap();
}

mod load_tests {
    use super::*;

    /// Items are replaced with the response array in received order
    #[tokio::test]
    async fn test_load_keeps_server_order() {
        let server = MockServer::start().await;
        let body = json!([
            {"id": 3, "descripcion": "Licencia", "monto": 50.5},
            {"id": 1, "descripcion": "Arbitrios", "monto": 12},
            {"id": 2, "descripcion": "Predial", "monto": 100}
        ]);

        Mock::given(method("GET"))
            .and(path("/conceptos-pago"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::ConceptosPago);
        let count = c.load().await.expect("load succeeds");

        assert_eq!(count, 3);
        assert_eq!(c.items(), body.as_array().unwrap().as_slice());
        assert_eq!(c.load_state(), &LoadState::Loaded);
        assert!(!c.loading());
    }

    /// A failed load keeps the previous list and records the failure
    #[tokio::test]
    async fn test_failed_load_keeps_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Cajeros);
        c.load().await.unwrap();

        let err = c.load().await.unwrap_err();
        assert_eq!(
            err,
            ControllerError::Api(ApiError::Status {
                status: 500,
                body: "boom".to_string()
            })
        );
        assert_eq!(c.items(), &[json!({"id": 1})]);
        assert!(matches!(c.load_state(), LoadState::Failed(_)));
        assert!(!c.loading());
    }

    /// A 2xx body that is not an array is a decode failure
    #[tokio::test]
    async fn test_non_array_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pagos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Pagos);
        match c.load().await {
            Err(ControllerError::Api(e)) => assert!(e.is_decode()),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    /// Invalid JSON is a decode failure too
    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/recibos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Recibos);
        match c.load().await {
            Err(ControllerError::Api(e)) => assert!(e.is_decode()),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    /// Extornos have no list endpoint; nothing is requested
    #[tokio::test]
    async fn test_load_unsupported_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Extornos);
        assert!(matches!(
            c.load().await,
            Err(ControllerError::Unsupported { .. })
        ));
    }

    /// Empty recibos list renders the placeholder row
    #[tokio::test]
    async fn test_empty_recibos_render_placeholder() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/recibos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Recibos);
        c.load().await.unwrap();

        let rows = table_rows(c.def(), c.items());
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0], TableRow::Placeholder(m) if m == "No hay recibos registrados"));
    }
}

mod submit_tests {
    use super::*;

    /// Create a cajero: POST with the typed body, then reload
    #[tokio::test]
    async fn test_create_cajero_posts_and_reloads() {
        let server = MockServer::start().await;
        let mut created = cajero_ana();
        created["id"] = json!(42);

        Mock::given(method("POST"))
            .and(path("/cajeros"))
            .and(body_json(cajero_ana()))
            .respond_with(ResponseTemplate::new(200).set_body_json(&created))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([created.clone()])))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Cajeros);
        c.open_create().unwrap();
        fill_cajero_ana(&mut c);

        let outcome = c.submit().await.expect("submit succeeds");

        assert!(outcome.reloaded);
        assert_eq!(outcome.response, created);
        assert_eq!(c.modal(), &ModalState::Closed);
        assert_eq!(c.items().len(), 1);
        assert_eq!(c.items()[0]["id"], 42);
    }

    /// Edit id 7 changing only estado: PUT with the full form body
    #[tokio::test]
    async fn test_edit_cajero_puts_full_body() {
        let server = MockServer::start().await;
        let mut record = cajero_ana();
        record["id"] = json!(7);

        let mut expected = cajero_ana();
        expected["estado"] = json!("INACTIVO");

        Mock::given(method("PUT"))
            .and(path("/cajeros/7"))
            .and(body_json(&expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Cajeros);
        c.open_edit(&record).unwrap();
        assert_eq!(c.editing_id(), Some(&RecordId::from(7)));

        c.set_input("estado", "INACTIVO").unwrap();
        c.submit().await.expect("submit succeeds");
        assert!(!c.modal_open());
    }

    /// Unmodified edit sends the record minus its id
    #[tokio::test]
    async fn test_unmodified_edit_body_is_record_without_id() {
        let server = MockServer::start().await;
        let record = json!({
            "id": 9,
            "descripcion": "Licencia de funcionamiento",
            "monto": 150.75,
            "creado_en": "2024-01-02T10:00:00.000Z"
        });

        Mock::given(method("PUT"))
            .and(path("/conceptos-pago/9"))
            .and(body_json(json!({
                "descripcion": "Licencia de funcionamiento",
                "monto": 150.75,
                "creado_en": "2024-01-02T10:00:00.000Z"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conceptos-pago"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([record.clone()])))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::ConceptosPago);
        c.open_edit(&record).unwrap();
        let outcome = c.submit().await.unwrap();
        assert_eq!(outcome.response, Value::Null);
    }

    /// Extorno with a two-character motivo sends nothing and stays editing
    #[tokio::test]
    async fn test_short_extorno_motivo_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Extornos);
        c.open_create().unwrap();
        c.set_input("id_recibo", "15").unwrap();
        c.set_input("motivo", "ok").unwrap();

        let err = c.submit().await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Validation(ValidationError::TooShort { min: 5, actual: 2, .. })
        ));
        assert_eq!(c.modal(), &ModalState::Editing(EditTarget::Create));
    }

    /// Extorno without id_recibo sends nothing
    #[tokio::test]
    async fn test_extorno_without_recibo_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Extornos);
        c.open_create().unwrap();
        c.set_input("motivo", "Pago duplicado").unwrap();

        assert!(matches!(
            c.submit().await,
            Err(ControllerError::Validation(ValidationError::Required { .. }))
        ));
        assert!(c.modal_open());
    }

    /// Valid extorno: trimmed motivo posted, no reload since there is no list
    #[tokio::test]
    async fn test_valid_extorno_posts_without_reload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extornos"))
            .and(body_json(json!({"id_recibo": 15, "motivo": "Pago duplicado"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Extornos);
        c.open_create().unwrap();
        c.set_input("id_recibo", "15").unwrap();
        c.set_input("motivo", "  Pago duplicado  ").unwrap();

        let outcome = c.submit().await.unwrap();
        assert!(!outcome.reloaded);
        assert_eq!(c.modal(), &ModalState::Closed);
    }

    /// Pago failure keeps the form open for a retry, and the resource asks for an alert
    #[tokio::test]
    async fn test_pago_failure_keeps_modal_editing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pagos"))
            .respond_with(ResponseTemplate::new(422).set_body_string("total requerido"))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Pagos);
        c.open_create().unwrap();
        c.set_input("total", "25.5").unwrap();

        let err = c.submit().await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Api(ApiError::Status { status: 422, .. })
        ));
        assert_eq!(c.modal(), &ModalState::Editing(EditTarget::Create));
        assert!(c.def().alert_on_submit_error());
        assert_eq!(c.last_error(), Some(&err));
        assert_eq!(c.form().get("total"), Some(&json!(25.5)));
    }

    /// Unset pago ids are absent from the body; the date becomes an instant
    #[tokio::test]
    async fn test_pago_body_omits_unset_ids() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pagos"))
            .and(body_json(json!({
                "id_cajero": 4,
                "fecha_pago": "2024-05-01T00:00:00.000Z",
                "total": 30,
                "observaciones": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 11})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pagos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Pagos);
        c.open_create().unwrap();
        c.set_input("id_cajero", "4").unwrap();
        c.set_input("fecha_pago", "2024-05-01").unwrap();
        c.set_input("total", "30").unwrap();

        c.submit().await.expect("submit succeeds");
    }

    /// Submitting without an open form is an error and sends nothing
    #[tokio::test]
    async fn test_submit_without_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Cajeros);
        assert_eq!(c.submit().await.unwrap_err(), ControllerError::NotEditing);
    }

    /// A failing reload after a successful save is reported in the outcome
    #[tokio::test]
    async fn test_reload_failure_after_save() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Cajeros);
        c.open_create().unwrap();
        let outcome = c.submit().await.expect("save itself succeeded");
        assert!(!outcome.reloaded);
        assert!(!c.modal_open());
    }
}

mod delete_tests {
    use super::*;

    /// Declined confirmation sends nothing
    #[tokio::test]
    async fn test_cancel_delete_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Cajeros);
        c.request_delete(RecordId::from(5)).unwrap();
        assert_eq!(c.pending_delete(), Some(&RecordId::from(5)));

        c.cancel_delete();
        assert_eq!(c.pending_delete(), None);
        assert_eq!(
            c.confirm_delete().await.unwrap_err(),
            ControllerError::NothingPending
        );
    }

    /// Confirmed delete: exactly one DELETE followed by one list GET
    #[tokio::test]
    async fn test_confirm_delete_then_reload() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/cajeros/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 6}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Cajeros);
        c.request_delete(RecordId::from(5)).unwrap();
        c.confirm_delete().await.unwrap();

        assert_eq!(c.pending_delete(), None);
        assert_eq!(c.items(), &[json!({"id": 6})]);

        let requests = server.received_requests().await.unwrap();
        let order: Vec<String> = requests.iter().map(|r: &Request| r.method.to_string()).collect();
        assert_eq!(order, vec!["DELETE", "GET"]);
    }

    /// A failed DELETE still reloads and reports the failure
    #[tokio::test]
    async fn test_failed_delete_still_reloads() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/pagos/8"))
            .respond_with(ResponseTemplate::new(409).set_body_string("has receipts"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pagos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 8}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Pagos);
        c.request_delete(RecordId::from(8)).unwrap();

        let err = c.confirm_delete().await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Api(ApiError::Status { status: 409, .. })
        ));
        assert_eq!(c.items().len(), 1);
    }

    /// Recibos cannot be deleted
    #[tokio::test]
    async fn test_delete_unsupported() {
        let server = MockServer::start().await;
        let mut c = controller(&server, ResourceKind::Recibos);
        assert!(matches!(
            c.request_delete(RecordId::from(1)),
            Err(ControllerError::Unsupported { .. })
        ));
        assert_eq!(c.pending_delete(), None);
    }
}

mod detail_tests {
    use super::*;

    /// Detail fetch follows the selected id
    #[tokio::test]
    async fn test_recibo_detail_fetch() {
        let server = MockServer::start().await;
        let recibo = json!({
            "id": 3,
            "numero_recibo": "R-0003",
            "fecha_emision": "2024-05-01",
            "total": 80,
            "estado": "EMITIDO"
        });

        Mock::given(method("GET"))
            .and(path("/recibos/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&recibo))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Recibos);
        let mut view = ListView::new();

        // No selection: nothing fetched
        view.refresh_detail(&mut c).await;
        assert_eq!(view.detail, DetailState::Empty);

        assert!(view.select_for_detail(Some(RecordId::from(3))));
        view.refresh_detail(&mut c).await;
        assert_eq!(view.detail, DetailState::Loaded(recibo));

        // Same id again does not ask for a refetch
        assert!(!view.select_for_detail(Some(RecordId::from(3))));
    }

    /// Failed detail fetch shows a message instead of data
    #[tokio::test]
    async fn test_detail_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contribuyentes/99"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut c = controller(&server, ResourceKind::Contribuyentes);
        let mut view = ListView::new();
        view.select_for_detail(Some(RecordId::from(99)));
        view.refresh_detail(&mut c).await;

        assert_eq!(
            view.detail,
            DetailState::Failed("Registro no encontrado.".to_string())
        );
    }

    /// Network failures are classified as such
    #[tokio::test]
    async fn test_network_error() {
        let registry = ResourceRegistry::new("http://127.0.0.1:9").unwrap();
        let api = ApiClient::new(std::time::Duration::from_secs(2)).unwrap();
        let mut c = CrudController::new(&registry, ResourceKind::Cajeros, api);

        match c.load().await {
            Err(ControllerError::Api(e)) => assert!(e.is_network()),
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
